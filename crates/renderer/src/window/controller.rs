use std::time::Instant;

use okcolor::{okhsl_to_oklch, oklch_to_srgb, Colorspace, Okhsl, Oklch, Rgb};

use crate::backend::RenderBackend;
use crate::error::RenderError;
use crate::surface::{GamutSquareSurface, HueRingSurface};

use super::layout::Hit;

/// A color chosen on the square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickedColor {
    pub rgb: Rgb,
    pub lch: Oklch,
    pub colorspace: Colorspace,
    pub in_gamut: bool,
}

impl PickedColor {
    /// sRGB hex of the pick. In display-P3 mode `rgb` holds P3-encoded
    /// values, so the color is re-encoded from `lch` and clamped to sRGB.
    pub fn srgb_hex(&self) -> String {
        match self.colorspace {
            Colorspace::DisplayP3 => oklch_to_srgb(self.lch, true).to_hex(),
            Colorspace::Oklch | Colorspace::Okhsl => self.rgb.to_hex(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    Idle,
    Ring,
    Square,
}

/// Turns pointer gestures and keys into surface updates.
pub struct PickerController<B: RenderBackend> {
    ring: HueRingSurface<B>,
    square: GamutSquareSurface<B>,
    drag: Drag,
    picked: Option<PickedColor>,
}

impl<B: RenderBackend> PickerController<B> {
    pub fn new(ring: HueRingSurface<B>, square: GamutSquareSurface<B>) -> Self {
        let mut controller = Self {
            ring,
            square,
            drag: Drag::Idle,
            picked: None,
        };
        controller.ring.paint();
        controller.square.paint();
        controller
    }

    pub fn ring(&self) -> &HueRingSurface<B> {
        &self.ring
    }

    pub fn square(&self) -> &GamutSquareSurface<B> {
        &self.square
    }

    pub fn hue(&self) -> f32 {
        self.square.hue()
    }

    pub fn colorspace(&self) -> Colorspace {
        self.square.colorspace()
    }

    pub fn picked(&self) -> Option<PickedColor> {
        self.picked
    }

    pub fn set_hue(&mut self, hue: f32) -> Result<(), RenderError> {
        self.square.set_hue(hue)?;
        self.square.paint();
        Ok(())
    }

    pub fn nudge_hue(&mut self, delta: f32) -> Result<(), RenderError> {
        self.set_hue(self.hue() + delta)
    }

    pub fn set_colorspace(&mut self, colorspace: Colorspace) {
        self.ring.set_colorspace(colorspace);
        self.square.set_colorspace(colorspace);
        self.ring.paint();
        self.square.paint();
        tracing::info!(%colorspace, "colorspace changed");
    }

    pub fn cycle_colorspace(&mut self) -> Colorspace {
        let next = self.colorspace().next();
        self.set_colorspace(next);
        next
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) -> Result<(), RenderError> {
        self.ring.set_device_pixel_ratio(ratio)?;
        self.square.set_device_pixel_ratio(ratio)?;
        self.ring.paint();
        self.square.paint();
        Ok(())
    }

    /// Press: a ring press starts a hue drag, a square press picks.
    pub fn pointer_down(&mut self, hit: Option<Hit>) -> Result<Option<PickedColor>, RenderError> {
        match hit {
            Some(Hit::Ring { nx }) => {
                self.drag = Drag::Ring;
                self.set_hue(self.ring.hue_at(nx)?)?;
                Ok(None)
            }
            Some(Hit::Square { nx, ny }) => {
                self.drag = Drag::Square;
                self.pick(nx, ny).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Move while pressed. `ring_nx` is the clamped ring position so a hue
    /// drag keeps tracking outside the strip.
    pub fn pointer_moved(
        &mut self,
        hit: Option<Hit>,
        ring_nx: f32,
    ) -> Result<Option<PickedColor>, RenderError> {
        match (self.drag, hit) {
            (Drag::Ring, _) => {
                self.set_hue(self.ring.hue_at(ring_nx)?)?;
                Ok(None)
            }
            (Drag::Square, Some(Hit::Square { nx, ny })) => self.pick(nx, ny).map(Some),
            _ => Ok(None),
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = Drag::Idle;
    }

    fn pick(&mut self, nx: f32, ny: f32) -> Result<PickedColor, RenderError> {
        let rgb = self.square.get_color_at(nx, ny)?;
        let colorspace = self.square.colorspace();
        let hue = self.square.hue();
        let lch = match colorspace {
            Colorspace::Okhsl => okhsl_to_oklch(Okhsl::new(hue, ny, nx)),
            _ => Oklch::new(nx, ny * self.square.max_chroma(), hue),
        };
        let picked = PickedColor {
            rgb,
            lch,
            colorspace,
            in_gamut: rgb != Rgb::WHITE,
        };
        self.picked = Some(picked);
        Ok(picked)
    }

    /// Services both surfaces; true when either drew.
    pub fn service(&mut self, now: Instant) -> bool {
        let ring = self.ring.service_frame(now);
        let square = self.square.service_frame(now);
        ring || square
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.ring.next_deadline(), self.square.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub(crate) fn surfaces_mut(&mut self) -> (&mut HueRingSurface<B>, &mut GamutSquareSurface<B>) {
        (&mut self.ring, &mut self.square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuBackend;
    use crate::types::SurfaceOptions;
    use okcolor::{linear_to_oklab, oklab_to_oklch, oklch_to_rgb, srgb_to_linear, Gamut};

    fn controller() -> PickerController<CpuBackend> {
        let ring = HueRingSurface::new(CpuBackend::new(), SurfaceOptions::new(36, 2)).unwrap();
        let square = GamutSquareSurface::new(
            CpuBackend::new(),
            SurfaceOptions::new(16, 16).with_hue(264.0),
        )
        .unwrap();
        PickerController::new(ring, square)
    }

    #[test]
    fn p3_pick_reports_srgb_hex() {
        let lch = oklab_to_oklch(linear_to_oklab(srgb_to_linear(Rgb::new(1.0, 0.0, 0.0))));
        let picked = PickedColor {
            rgb: oklch_to_rgb(lch, Gamut::DisplayP3, false),
            lch,
            colorspace: Colorspace::DisplayP3,
            in_gamut: true,
        };
        assert_eq!(picked.srgb_hex(), "#ff0000");
        assert_ne!(picked.rgb.to_hex(), "#ff0000");

        let srgb = PickedColor {
            rgb: Rgb::new(0.2, 0.4, 1.0),
            colorspace: Colorspace::Oklch,
            ..picked
        };
        assert_eq!(srgb.srgb_hex(), srgb.rgb.to_hex());
    }

    #[test]
    fn initial_frames_are_pending_and_drawn_once() {
        let mut controller = controller();
        assert!(controller.next_deadline().is_some());
        assert!(controller.service(Instant::now()));
        assert!(!controller.service(Instant::now()));
        assert_eq!(controller.ring().draw_count(), 1);
        assert_eq!(controller.square().draw_count(), 1);
    }

    #[test]
    fn ring_drag_updates_square_hue() {
        let mut controller = controller();
        controller.service(Instant::now());
        controller
            .pointer_down(Some(Hit::Ring { nx: 0.25 }))
            .unwrap();
        assert!((controller.hue() - 90.0).abs() < 1e-4);
        controller.pointer_moved(None, 0.5).unwrap();
        assert!((controller.hue() - 180.0).abs() < 1e-4);
        controller.pointer_up();
        controller.pointer_moved(None, 0.75).unwrap();
        assert!((controller.hue() - 180.0).abs() < 1e-4);

        controller.service(Instant::now());
        assert_eq!(controller.ring().draw_count(), 1);
        assert_eq!(controller.square().draw_count(), 2);
    }

    #[test]
    fn square_press_picks_color() {
        let mut controller = controller();
        let picked = controller
            .pointer_down(Some(Hit::Square { nx: 0.6, ny: 0.1 }))
            .unwrap()
            .unwrap();
        assert!(picked.in_gamut);
        assert!((picked.lch.l - 0.6).abs() < 1e-6);
        assert!((picked.lch.c - 0.04).abs() < 1e-6);
        assert_eq!(controller.picked(), Some(picked));

        let outside = controller
            .pointer_down(Some(Hit::Square { nx: 0.1, ny: 0.9 }))
            .unwrap()
            .unwrap();
        assert_eq!(outside.rgb, Rgb::WHITE);
        assert!(!outside.in_gamut);
    }

    #[test]
    fn colorspace_cycles_both_surfaces() {
        let mut controller = controller();
        assert_eq!(controller.cycle_colorspace(), Colorspace::Okhsl);
        assert_eq!(controller.ring().colorspace(), Colorspace::Okhsl);
        assert_eq!(controller.square().colorspace(), Colorspace::Okhsl);
    }
}
