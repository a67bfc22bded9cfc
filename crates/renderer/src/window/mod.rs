//! Desktop host: one window showing the gamut square above the hue ring.
//!
//! ```text
//!   winit events ──▶ PickerController ──▶ surfaces (params + paint)
//!                                             │ request_redraw
//!   RedrawRequested ──▶ service_frame ──▶ WgpuBackend canvas ──▶ blit ──▶ swapchain
//! ```
//!
//! The surfaces draw into their own offscreen canvases; the window only
//! composites them, so a resize of the window never recompiles a kernel.

mod controller;
mod layout;

pub use controller::{PickedColor, PickerController};
pub use layout::{Hit, PickerLayout, Rect};

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use okcolor::Colorspace;
use pickerconfig::PickerConfig;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::{BlitPipeline, GpuContext, WgpuBackend};
use crate::surface::{GamutSquareSurface, HueRingSurface};
use crate::types::SurfaceOptions;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.08,
    b: 0.09,
    a: 1.0,
};

const HUE_STEP: f32 = 1.0;

/// Swapchain plus the blit that places the canvases in it.
struct Presenter {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    context: Arc<GpuContext>,
    config: wgpu::SurfaceConfiguration,
    blit: BlitPipeline,
}

impl Presenter {
    fn new(
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        context: Arc<GpuContext>,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(&context.adapter);
        // Kernels write encoded values; an sRGB swapchain would encode twice.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no texture formats"))?;
        if format.is_srgb() {
            tracing::warn!(?format, "no non-sRGB surface format; colors will be too light");
        }
        let present_mode = caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .or_else(|| caps.present_modes.first().copied())
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &config);
        tracing::debug!(?format, ?present_mode, "configured window surface");

        let blit = BlitPipeline::new(&context.device, format);
        Ok(Self {
            window,
            surface,
            context,
            config,
            blit,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.context.device, &self.config);
    }

    fn present(
        &mut self,
        layout: &PickerLayout,
        controller: &mut PickerController<WgpuBackend>,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let device = &self.context.device;
        let scale = self.window.scale_factor() as f32;
        let target = (self.config.width, self.config.height);

        let (ring, square) = controller.surfaces_mut();
        let placements = [
            (layout.square, square.backend().canvas().map(|c| &c.view)),
            (layout.ring, ring.backend().canvas().map(|c| &c.view)),
        ];
        let bind_groups: Vec<_> = placements
            .iter()
            .filter_map(|(rect, canvas)| {
                let viewport = rect.to_viewport(scale, target)?;
                Some((viewport, self.blit.bind(device, (*canvas)?)))
            })
            .collect();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("window encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("window pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.blit.pipeline);
            for ([x, y, width, height], bind_group) in &bind_groups {
                pass.set_viewport(*x, *y, *width, *height, 0.0, 1.0);
                pass.set_bind_group(0, bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}

fn log_pick(picked: &PickedColor) {
    if !picked.in_gamut {
        tracing::info!(
            l = picked.lch.l,
            c = picked.lch.c,
            h = picked.lch.h,
            "position is outside the gamut"
        );
    } else if picked.colorspace == Colorspace::DisplayP3 {
        tracing::info!(
            p3 = %picked.rgb.to_hex(),
            srgb_clamped = %picked.srgb_hex(),
            l = picked.lch.l,
            c = picked.lch.c,
            h = picked.lch.h,
            colorspace = %picked.colorspace,
            "picked color"
        );
    } else {
        tracing::info!(
            hex = %picked.srgb_hex(),
            l = picked.lch.l,
            c = picked.lch.c,
            h = picked.lch.h,
            colorspace = %picked.colorspace,
            "picked color"
        );
    }
}

/// Opens the picker window and blocks until it is closed.
pub fn run_picker_window(config: &PickerConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let layout = PickerLayout::new(
        (config.square.width, config.square.height),
        (config.ring.width, config.ring.height),
    );
    let (width, height) = layout.window_size();
    let window = WindowBuilder::new()
        .with_title("okpicker")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create picker window: {err}"))?;
    let window = Arc::new(window);

    let instance = GpuContext::create_instance();
    let surface = instance
        .create_surface(window.clone())
        .context("failed to create rendering surface")?;
    let context = Arc::new(
        GpuContext::new(instance, Some(&surface)).context("failed to initialise GPU context")?,
    );
    if context.profile.is_software() {
        tracing::warn!(
            adapter = %context.profile.name,
            "software rasterizer detected; picking will feel sluggish"
        );
    }

    let fixed_ratio = config.device_pixel_ratio.is_some();
    let ratio = config
        .device_pixel_ratio
        .unwrap_or(window.scale_factor() as f32);
    let ring = HueRingSurface::new(
        WgpuBackend::new(context.clone()),
        SurfaceOptions::ring_from_config(config).with_device_pixel_ratio(ratio),
    )
    .context("failed to create hue ring")?;
    let square = GamutSquareSurface::new(
        WgpuBackend::new(context.clone()),
        SurfaceOptions::square_from_config(config).with_device_pixel_ratio(ratio),
    )
    .context("failed to create gamut square")?;
    let mut controller = PickerController::new(ring, square);
    {
        let (ring, square) = controller.surfaces_mut();
        let redraw = window.clone();
        ring.set_refresh_signal(Box::new(move || redraw.request_redraw()));
        let redraw = window.clone();
        square.set_refresh_signal(Box::new(move || redraw.request_redraw()));
    }

    let mut presenter = Presenter::new(window.clone(), surface, context)?;
    let mut cursor: Option<PhysicalPosition<f64>> = None;
    tracing::info!(
        colorspace = %controller.colorspace(),
        hue = controller.hue(),
        "picker ready; drag the ring to change hue, click the square to pick, 'c' cycles colorspace"
    );
    window.request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
            WindowEvent::Resized(size) => {
                presenter.resize(size);
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if fixed_ratio {
                    return;
                }
                if let Err(err) = controller.set_device_pixel_ratio(scale_factor as f32) {
                    tracing::warn!(error = %err, "failed to apply new scale factor");
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                cursor = Some(position);
                let logical = position.to_logical::<f32>(window.scale_factor());
                let hit = layout.hit(logical.x, logical.y);
                match controller.pointer_moved(hit, layout.ring_drag(logical.x)) {
                    Ok(Some(picked)) => log_pick(&picked),
                    Ok(None) => {}
                    Err(err) => tracing::warn!(error = %err, "pointer move rejected"),
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let hit = cursor.and_then(|position| {
                        let logical = position.to_logical::<f32>(window.scale_factor());
                        layout.hit(logical.x, logical.y)
                    });
                    match controller.pointer_down(hit) {
                        Ok(Some(picked)) => log_pick(&picked),
                        Ok(None) => {}
                        Err(err) => tracing::warn!(error = %err, "pointer press rejected"),
                    }
                }
                ElementState::Released => controller.pointer_up(),
            },
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let result = match event.logical_key {
                    Key::Named(NamedKey::Escape) => {
                        elwt.exit();
                        Ok(())
                    }
                    Key::Named(NamedKey::ArrowLeft) => controller.nudge_hue(-HUE_STEP),
                    Key::Named(NamedKey::ArrowRight) => controller.nudge_hue(HUE_STEP),
                    Key::Character(ref text) => match text.as_str() {
                        "c" | "C" => {
                            controller.cycle_colorspace();
                            Ok(())
                        }
                        "1" => {
                            controller.set_colorspace(Colorspace::Oklch);
                            Ok(())
                        }
                        "2" => {
                            controller.set_colorspace(Colorspace::Okhsl);
                            Ok(())
                        }
                        "3" => {
                            controller.set_colorspace(Colorspace::DisplayP3);
                            Ok(())
                        }
                        "q" => {
                            elwt.exit();
                            Ok(())
                        }
                        _ => Ok(()),
                    },
                    _ => Ok(()),
                };
                if let Err(err) = result {
                    tracing::warn!(error = %err, "key ignored");
                }
            }
            WindowEvent::RedrawRequested => {
                controller.service(Instant::now());
                match presenter.present(&layout, &mut controller) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        presenter.resize(window.inner_size());
                        window.request_redraw();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("surface out of memory; closing picker");
                        elwt.exit();
                    }
                    Err(other) => {
                        tracing::warn!(error = ?other, "surface error; retrying next frame");
                    }
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            match controller.next_deadline() {
                Some(deadline) if deadline <= now => {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                }
                Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
                None => elwt.set_control_flow(ControlFlow::Wait),
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
