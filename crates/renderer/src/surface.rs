use std::ops::{Deref, DerefMut};
use std::time::Instant;

use image::RgbaImage;
use okcolor::{normalize_hue, Colorspace, GamutCusp, Rgb};
use scheduler::{FrameScheduler, FrameStats, RefreshSignal};

use crate::backend::{BufferHandle, ProgramHandle, RenderBackend};
use crate::error::RenderError;
use crate::gpu::KernelUniforms;
use crate::kernel::{cpu, KernelSource, QUAD_VERTICES};
use crate::types::{
    RenderParameters, RingAppearance, SurfaceKind, SurfaceOptions, SurfaceState, MAX_CANVAS_EDGE,
};

/// One picker canvas: a backend, a compiled kernel and its quad.
///
/// Setters only touch the parameter set. Nothing reaches the backend until
/// [`paint`](Self::paint) has been called and the host services the frame
/// with [`service_frame`](Self::service_frame); the draw then reads a copy of
/// the parameters as they are at that moment.
pub struct RenderSurface<B: RenderBackend> {
    kind: SurfaceKind,
    backend: B,
    state: SurfaceState,
    program: Option<ProgramHandle>,
    quad: Option<BufferHandle>,
    params: RenderParameters,
    ring: RingAppearance,
    max_chroma: f32,
    scheduler: FrameScheduler,
    draws: u64,
}

impl<B: RenderBackend> RenderSurface<B> {
    fn new(kind: SurfaceKind, backend: B, options: SurfaceOptions) -> Result<Self, RenderError> {
        options.validate(kind)?;
        let scheduler = FrameScheduler::with_fps(options.fps.unwrap_or(0.0))
            .map_err(|err| RenderError::configuration(err.to_string()))?;

        let mut surface = Self {
            kind,
            backend,
            state: SurfaceState::Uninitialized,
            program: None,
            quad: None,
            params: RenderParameters {
                hue: normalize_hue(options.hue.unwrap_or(0.0)),
                colorspace: options.colorspace,
                width_px: options.width,
                height_px: options.height,
                device_pixel_ratio: options.device_pixel_ratio,
            },
            ring: options.ring,
            max_chroma: options.max_chroma,
            scheduler,
            draws: 0,
        };

        surface.state = SurfaceState::Compiling;
        let program = surface.backend.compile(&KernelSource::for_kind(kind))?;
        surface.program = Some(program);
        surface.quad = Some(surface.backend.create_quad(&QUAD_VERTICES)?);
        let (width, height) = surface.params.physical_size();
        surface.backend.resize(width, height)?;
        surface.state = SurfaceState::Ready;

        tracing::debug!(
            surface = %kind,
            backend = surface.backend.label(),
            width,
            height,
            colorspace = %surface.params.colorspace,
            "surface ready"
        );
        Ok(surface)
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn parameters(&self) -> RenderParameters {
        self.params
    }

    pub fn colorspace(&self) -> Colorspace {
        self.params.colorspace
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn set_colorspace(&mut self, colorspace: Colorspace) {
        self.params.colorspace = colorspace;
    }

    /// Resizes the logical canvas; the backing store follows the pixel ratio.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.ensure_live()?;
        let next = RenderParameters {
            width_px: width,
            height_px: height,
            ..self.params
        };
        self.apply_extent(next)
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) -> Result<(), RenderError> {
        self.ensure_live()?;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(RenderError::configuration(format!(
                "device pixel ratio {ratio} must be greater than zero"
            )));
        }
        let next = RenderParameters {
            device_pixel_ratio: ratio,
            ..self.params
        };
        self.apply_extent(next)
    }

    fn apply_extent(&mut self, next: RenderParameters) -> Result<(), RenderError> {
        if next.width_px == 0 || next.height_px == 0 {
            return Err(RenderError::configuration(format!(
                "{} size {}x{} must be positive",
                self.kind, next.width_px, next.height_px
            )));
        }
        let (width, height) = next.physical_size();
        if width > MAX_CANVAS_EDGE || height > MAX_CANVAS_EDGE {
            return Err(RenderError::configuration(format!(
                "{} backing store {width}x{height} exceeds {MAX_CANVAS_EDGE} pixels",
                self.kind
            )));
        }
        self.backend.resize(width, height)?;
        self.params = next;
        Ok(())
    }

    /// Requests a redraw. Calls before the next refresh collapse into one draw.
    pub fn paint(&mut self) {
        if self.state != SurfaceState::Ready {
            tracing::debug!(surface = %self.kind, state = ?self.state, "paint ignored");
            return;
        }
        let token = self.scheduler.request(Instant::now());
        tracing::trace!(surface = %self.kind, token = token.id(), "paint requested");
    }

    /// Hooks the scheduler up to the host's refresh request.
    pub fn set_refresh_signal(&mut self, signal: Box<dyn RefreshSignal>) {
        self.scheduler.set_signal(signal);
    }

    pub fn is_frame_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// When the pending frame may be serviced, for hosts that sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.state != SurfaceState::Ready {
            return None;
        }
        self.scheduler.next_deadline()
    }

    /// Display-refresh callback. Draws the pending frame if it is due and
    /// returns whether a draw happened. Draw failures are logged, not
    /// returned: a bad frame must not take the host down.
    pub fn service_frame(&mut self, now: Instant) -> bool {
        if self.state != SurfaceState::Ready {
            return false;
        }
        let Some(token) = self.scheduler.poll(now) else {
            return false;
        };
        match self.draw_now() {
            Ok(()) => {
                tracing::trace!(surface = %self.kind, token = token.id(), "frame drawn");
                true
            }
            Err(err) => {
                tracing::warn!(surface = %self.kind, error = %err, "draw failed");
                false
            }
        }
    }

    /// Draws immediately with the current parameters, bypassing the scheduler.
    pub fn draw_now(&mut self) -> Result<(), RenderError> {
        self.ensure_live()?;
        let (Some(program), Some(quad)) = (self.program, self.quad) else {
            return Err(RenderError::Draw("surface has no program".into()));
        };
        let snapshot = self.params;
        let uniforms = KernelUniforms::new(&snapshot, self.ring, self.max_chroma);
        self.backend.draw(program, quad, &uniforms)?;
        self.draws += 1;
        Ok(())
    }

    /// The last drawn canvas, rows top to bottom.
    pub fn read_pixels(&mut self) -> Result<RgbaImage, RenderError> {
        self.ensure_live()?;
        self.backend.read_pixels()
    }

    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.scheduler.stats()
    }

    /// Releases the program and quad and cancels any pending frame.
    /// Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.state == SurfaceState::Disposed {
            return;
        }
        let cancelled = self.scheduler.cancel();
        if let Some(quad) = self.quad.take() {
            self.backend.release_buffer(quad);
        }
        if let Some(program) = self.program.take() {
            self.backend.release_program(program);
        }
        self.state = SurfaceState::Disposed;
        tracing::debug!(
            surface = %self.kind,
            draws = self.draws,
            cancelled_pending = cancelled.is_some(),
            "surface disposed"
        );
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        match self.state {
            SurfaceState::Disposed => Err(RenderError::Disposed),
            _ => Ok(()),
        }
    }
}

impl<B: RenderBackend> Drop for RenderSurface<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn check_unit(operation: &'static str, x: f32, y: f32) -> Result<(), RenderError> {
    let inside = |v: f32| (0.0..=1.0).contains(&v);
    if inside(x) && inside(y) {
        Ok(())
    } else {
        Err(RenderError::Domain { operation, x, y })
    }
}

/// Horizontal strip sweeping the hue circle at fixed lightness and chroma.
pub struct HueRingSurface<B: RenderBackend> {
    surface: RenderSurface<B>,
}

impl<B: RenderBackend> HueRingSurface<B> {
    pub fn new(backend: B, options: SurfaceOptions) -> Result<Self, RenderError> {
        Ok(Self {
            surface: RenderSurface::new(SurfaceKind::HueRing, backend, options)?,
        })
    }

    pub fn appearance(&self) -> RingAppearance {
        self.surface.ring
    }

    /// Hue under a normalized horizontal position.
    pub fn hue_at(&self, nx: f32) -> Result<f32, RenderError> {
        check_unit("hue_at", nx, 0.0)?;
        Ok(normalize_hue(cpu::ring_hue(nx)))
    }

    pub fn get_color_at(&self, nx: f32) -> Result<Rgb, RenderError> {
        check_unit("get_color_at", nx, 0.0)?;
        Ok(cpu::hue_ring_pixel(
            nx,
            self.surface.ring,
            self.surface.params.colorspace,
        ))
    }
}

impl<B: RenderBackend> Deref for HueRingSurface<B> {
    type Target = RenderSurface<B>;

    fn deref(&self) -> &Self::Target {
        &self.surface
    }
}

impl<B: RenderBackend> DerefMut for HueRingSurface<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.surface
    }
}

/// Lightness (x) against chroma or saturation (y) at one hue.
pub struct GamutSquareSurface<B: RenderBackend> {
    surface: RenderSurface<B>,
}

impl<B: RenderBackend> GamutSquareSurface<B> {
    pub fn new(backend: B, options: SurfaceOptions) -> Result<Self, RenderError> {
        Ok(Self {
            surface: RenderSurface::new(SurfaceKind::GamutSquare, backend, options)?,
        })
    }

    pub fn hue(&self) -> f32 {
        self.surface.params.hue
    }

    pub fn set_hue(&mut self, hue: f32) -> Result<(), RenderError> {
        if !hue.is_finite() {
            return Err(RenderError::configuration(format!("hue {hue} is not finite")));
        }
        self.surface.params.hue = normalize_hue(hue);
        Ok(())
    }

    pub fn max_chroma(&self) -> f32 {
        self.surface.max_chroma
    }

    /// Cusp of the gamut the current colorspace renders against.
    pub fn cusp(&self) -> GamutCusp {
        cpu::square_cusp(self.surface.params.hue, self.surface.params.colorspace)
    }

    /// Color at a normalized position (`ny = 0` is the bottom edge), white
    /// where the square is out of gamut.
    pub fn get_color_at(&self, nx: f32, ny: f32) -> Result<Rgb, RenderError> {
        check_unit("get_color_at", nx, ny)?;
        let params = &self.surface.params;
        Ok(cpu::gamut_square_pixel(
            nx,
            ny,
            params.hue,
            params.colorspace,
            self.surface.max_chroma,
            self.cusp(),
        ))
    }
}

impl<B: RenderBackend> Deref for GamutSquareSurface<B> {
    type Target = RenderSurface<B>;

    fn deref(&self) -> &Self::Target {
        &self.surface
    }
}

impl<B: RenderBackend> DerefMut for GamutSquareSurface<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::cpu::CpuBackend;
    use okcolor::{linear_to_oklab, oklab_to_oklch, srgb_to_linear};

    #[derive(Default)]
    struct Log {
        draws: Vec<KernelUniforms>,
        released_buffers: usize,
        released_programs: usize,
    }

    /// Records calls instead of drawing.
    struct RecordingBackend {
        log: Rc<RefCell<Log>>,
        fail_compile: bool,
        fail_draw: bool,
    }

    impl RecordingBackend {
        fn new() -> (Self, Rc<RefCell<Log>>) {
            let log = Rc::new(RefCell::new(Log::default()));
            let backend = Self {
                log: log.clone(),
                fail_compile: false,
                fail_draw: false,
            };
            (backend, log)
        }
    }

    impl RenderBackend for RecordingBackend {
        fn label(&self) -> &str {
            "recording"
        }

        fn compile(&mut self, source: &KernelSource) -> Result<ProgramHandle, RenderError> {
            if self.fail_compile {
                return Err(RenderError::Compile {
                    program: source.kind,
                    stage: crate::error::ShaderStageKind::Fragment,
                    message: "injected".into(),
                });
            }
            Ok(ProgramHandle(1))
        }

        fn create_quad(&mut self, vertices: &[[f32; 2]]) -> Result<BufferHandle, RenderError> {
            assert_eq!(vertices.len(), 6);
            Ok(BufferHandle(2))
        }

        fn resize(&mut self, _width: u32, _height: u32) -> Result<(), RenderError> {
            Ok(())
        }

        fn draw(
            &mut self,
            _program: ProgramHandle,
            _quad: BufferHandle,
            uniforms: &KernelUniforms,
        ) -> Result<(), RenderError> {
            if self.fail_draw {
                return Err(RenderError::Draw("injected".into()));
            }
            self.log.borrow_mut().draws.push(*uniforms);
            Ok(())
        }

        fn read_pixels(&mut self) -> Result<RgbaImage, RenderError> {
            Ok(RgbaImage::new(1, 1))
        }

        fn release_buffer(&mut self, _buffer: BufferHandle) {
            self.log.borrow_mut().released_buffers += 1;
        }

        fn release_program(&mut self, _program: ProgramHandle) {
            self.log.borrow_mut().released_programs += 1;
        }
    }

    fn square_options() -> SurfaceOptions {
        SurfaceOptions::new(48, 48).with_hue(30.0)
    }

    #[test]
    fn five_paints_yield_one_draw_with_latest_parameters() {
        let (backend, log) = RecordingBackend::new();
        let mut square = GamutSquareSurface::new(backend, square_options()).unwrap();
        for hue in [10.0, 20.0, 30.0, 40.0, 50.0] {
            square.set_hue(hue).unwrap();
            square.paint();
        }
        square.set_colorspace(Colorspace::DisplayP3);
        assert!(square.service_frame(Instant::now()));
        assert!(!square.service_frame(Instant::now()));

        let log = log.borrow();
        assert_eq!(log.draws.len(), 1);
        assert_eq!(log.draws[0].hue, 50.0);
        assert_eq!(log.draws[0].colorspace(), Colorspace::DisplayP3);
        assert_eq!(square.frame_stats().cancelled, 4);
    }

    #[test]
    fn dispose_cancels_pending_frame_and_releases_resources() {
        let (backend, log) = RecordingBackend::new();
        let mut ring = HueRingSurface::new(backend, SurfaceOptions::new(360, 20)).unwrap();
        ring.paint();
        ring.dispose();
        ring.dispose();
        assert_eq!(ring.state(), SurfaceState::Disposed);
        assert!(!ring.is_frame_pending());
        assert!(!ring.service_frame(Instant::now()));
        ring.paint();
        assert!(!ring.service_frame(Instant::now()));
        assert!(matches!(ring.draw_now(), Err(RenderError::Disposed)));

        let log = log.borrow();
        assert!(log.draws.is_empty());
        assert_eq!((log.released_buffers, log.released_programs), (1, 1));
    }

    #[test]
    fn drop_releases_resources() {
        let (backend, log) = RecordingBackend::new();
        drop(HueRingSurface::new(backend, SurfaceOptions::new(10, 10)).unwrap());
        assert_eq!(log.borrow().released_buffers, 1);
    }

    #[test]
    fn compile_failure_is_fatal_at_construction() {
        let (mut backend, _) = RecordingBackend::new();
        backend.fail_compile = true;
        let err = GamutSquareSurface::new(backend, square_options())
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Compile { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn draw_failures_stay_on_the_paint_path() {
        let (mut backend, log) = RecordingBackend::new();
        backend.fail_draw = true;
        let mut square = GamutSquareSurface::new(backend, square_options()).unwrap();
        square.paint();
        assert!(!square.service_frame(Instant::now()));
        assert_eq!(square.state(), SurfaceState::Ready);
        assert!(log.borrow().draws.is_empty());
    }

    #[test]
    fn square_without_hue_is_a_configuration_error() {
        let (backend, _) = RecordingBackend::new();
        let err = GamutSquareSurface::new(backend, SurfaceOptions::new(10, 10))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Configuration(_)));
    }

    #[test]
    fn get_color_at_rejects_out_of_range() {
        let (backend, _) = RecordingBackend::new();
        let square = GamutSquareSurface::new(backend, square_options()).unwrap();
        for (x, y) in [(-0.1, 0.5), (0.5, 1.1), (f32::NAN, 0.5), (0.5, f32::INFINITY)] {
            assert!(matches!(
                square.get_color_at(x, y),
                Err(RenderError::Domain { .. })
            ));
        }
        assert!(square.get_color_at(0.0, 1.0).is_ok());
    }

    #[test]
    fn resize_rejects_zero_and_applies_pixel_ratio() {
        let mut square = GamutSquareSurface::new(CpuBackend::new(), square_options()).unwrap();
        assert!(matches!(
            square.resize(0, 10),
            Err(RenderError::Configuration(_))
        ));
        square.set_device_pixel_ratio(2.0).unwrap();
        square.resize(20, 10).unwrap();
        square.draw_now().unwrap();
        assert_eq!(square.read_pixels().unwrap().dimensions(), (40, 20));
    }

    #[test]
    fn ring_hues_survive_the_canvas() {
        let mut ring = HueRingSurface::new(CpuBackend::new(), SurfaceOptions::new(360, 4)).unwrap();
        ring.paint();
        assert!(ring.service_frame(Instant::now()));
        let image = ring.read_pixels().unwrap();
        for column in [0u32, 120, 240] {
            let [r, g, b, _] = image.get_pixel(column, 2).0;
            let rgb = Rgb::from_rgba8([r, g, b, 255]);
            let hue = oklab_to_oklch(linear_to_oklab(srgb_to_linear(rgb))).h;
            let expected = ring.hue_at((column as f32 + 0.5) / 360.0).unwrap();
            let d = (hue - expected).rem_euclid(360.0);
            assert!(d.min(360.0 - d) < 2.0, "column {column}: {hue} vs {expected}");
        }
    }

    #[test]
    fn square_pixels_match_cpu_lookup() {
        let mut square = GamutSquareSurface::new(CpuBackend::new(), square_options()).unwrap();
        square.set_hue(145.0).unwrap();
        square.paint();
        assert!(square.service_frame(Instant::now()));
        let image = square.read_pixels().unwrap();
        let (width, height) = image.dimensions();
        for (px, py) in [(0, 0), (10, 40), (30, 20), (47, 47), (24, 3)] {
            let (x, y) = cpu::pixel_center(px, py, width, height);
            let expected = square.get_color_at(x, y).unwrap().to_rgba8();
            assert_eq!(image.get_pixel(px, py).0, expected, "pixel ({px}, {py})");
        }
    }
}
