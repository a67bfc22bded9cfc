//! Color math for the okpicker surfaces.
//!
//! Everything here is a pure function over `f32` so the CPU evaluator produces
//! the same numbers as the GLSL kernel (`highp float`). The conversion chain
//! used by both picker surfaces is:
//!
//! ```text
//!   Oklch ──▶ Oklab ──▶ LMS' ──cube──▶ LMS ──▶ linear RGB (sRGB | P3) ──▶ encoded RGB
//!                                                          │
//!                            cusp / intersection search ◀──┘ (gamut boundary)
//! ```
//!
//! Gamut boundaries are located with Björn Ottosson's cusp approximation for
//! sRGB and a fixed-budget bisection for display-P3; the upper half of the
//! gamut triangle is refined with Halley steps for both gamuts.

mod cusp;
mod gamut;
mod okhsl;
mod oklab;
mod transfer;
mod types;

pub use cusp::{
    compute_max_saturation, find_cusp, find_cusp_numeric, find_gamut_cusp,
    find_gamut_intersection, find_gamut_intersection_in, max_chroma, max_chroma_in,
    CUSP_BISECTION_STEPS, CUSP_HUE_SPREAD, HALLEY_STEPS,
};
pub use gamut::{
    in_gamut, linear_p3_to_srgb, linear_srgb_to_p3, oklab_to_linear_in, oklch_to_rgb,
    oklch_to_srgb, OUT_OF_GAMUT_THRESHOLD, SQUARE_THRESHOLD_TOLERANCE,
};
pub use okhsl::{okhsl_to_oklch, oklch_to_okhsl};
pub use oklab::{linear_to_oklab, normalize_hue, oklab_to_linear, oklab_to_oklch, oklch_to_oklab};
pub use transfer::{linear_to_srgb, srgb_to_linear, srgb_transfer, srgb_transfer_inv};
pub use types::{
    Colorspace, Gamut, GamutCusp, LinearRgb, Okhsl, Oklab, Oklch, ParseColorspaceError, Rgb,
};
