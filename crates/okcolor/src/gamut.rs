use crate::oklab::{mul, oklab_to_linear, oklab_to_lms, oklch_to_oklab};
use crate::transfer::linear_to_srgb;
use crate::types::{Gamut, LinearRgb, Oklab, Oklch, Rgb};

/// Channels above this value mark a pixel as outside the display range.
pub const OUT_OF_GAMUT_THRESHOLD: f32 = 1.001;

/// Relative slack on the gamut square's cusp line. Colors with a channel at
/// exactly zero sit on that line and f32 rounding puts them a few ulps over.
pub const SQUARE_THRESHOLD_TOLERANCE: f32 = 1e-4;

const SRGB_TO_P3: [[f32; 3]; 3] = [
    [0.822_462_1, 0.177_538, 0.0],
    [0.033_194_1, 0.966_805_8, 0.0],
    [0.017_082_7, 0.072_397_4, 0.910_519_9],
];

const P3_TO_SRGB: [[f32; 3]; 3] = [
    [1.224_940_1, -0.224_940_4, 0.0],
    [-0.042_056_9, 1.042_057_1, 0.0],
    [-0.019_637_6, -0.078_636_1, 1.098_273_5],
];

// LMS -> linear display-P3, the product SRGB_TO_P3 * M1_INV.
pub(crate) const LMS_TO_P3: [[f32; 3]; 3] = [
    [3.127_769_562_1, -2.257_136_312_1, 0.129_366_850_0],
    [-1.091_009_449_4, 2.413_332_082_6, -0.322_322_733_3],
    [-0.026_010_478_9, -0.508_041_641_0, 1.534_052_119_9],
];

pub fn linear_srgb_to_p3(c: LinearRgb) -> LinearRgb {
    let [r, g, b] = mul(&SRGB_TO_P3, [c.r, c.g, c.b]);
    LinearRgb { r, g, b }
}

pub fn linear_p3_to_srgb(c: LinearRgb) -> LinearRgb {
    let [r, g, b] = mul(&P3_TO_SRGB, [c.r, c.g, c.b]);
    LinearRgb { r, g, b }
}

impl Gamut {
    /// Rows map cone response (LMS) to linear RGB in this gamut's primaries.
    pub(crate) fn lms_matrix(self) -> &'static [[f32; 3]; 3] {
        match self {
            Gamut::Srgb => &crate::oklab::M1_INV,
            Gamut::DisplayP3 => &LMS_TO_P3,
        }
    }
}

/// Oklab to linear RGB in the primaries of `gamut`.
pub fn oklab_to_linear_in(lab: Oklab, gamut: Gamut) -> LinearRgb {
    match gamut {
        Gamut::Srgb => oklab_to_linear(lab),
        Gamut::DisplayP3 => {
            let [r, g, b] = mul(&LMS_TO_P3, oklab_to_lms(lab));
            LinearRgb { r, g, b }
        }
    }
}

/// Full OKLCH to encoded RGB pipeline for `gamut`.
///
/// Unclamped output keeps raw channels so callers can detect overflow against
/// [`OUT_OF_GAMUT_THRESHOLD`]; clamped output is limited to `[0, 1]`.
pub fn oklch_to_rgb(lch: Oklch, gamut: Gamut, clamp_out_of_gamut: bool) -> Rgb {
    let rgb = linear_to_srgb(oklab_to_linear_in(oklch_to_oklab(lch), gamut));
    if clamp_out_of_gamut {
        rgb.clamped()
    } else {
        rgb
    }
}

pub fn oklch_to_srgb(lch: Oklch, clamp_out_of_gamut: bool) -> Rgb {
    oklch_to_rgb(lch, Gamut::Srgb, clamp_out_of_gamut)
}

/// True when every linear channel lies in `[-eps, 1 + eps]`.
pub fn in_gamut(lch: Oklch, gamut: Gamut, eps: f32) -> bool {
    let rgb = oklab_to_linear_in(oklch_to_oklab(lch), gamut);
    rgb.min_channel() >= -eps && rgb.max_channel() <= 1.0 + eps
}
