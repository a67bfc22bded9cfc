use crate::types::{LinearRgb, Rgb};

/// sRGB encoding curve, mirrored for negative input.
pub fn srgb_transfer(x: f32) -> f32 {
    let a = x.abs();
    let y = if a <= 0.003_130_8 {
        12.92 * a
    } else {
        1.055 * a.powf(1.0 / 2.4) - 0.055
    };
    y.copysign(x)
}

pub fn srgb_transfer_inv(x: f32) -> f32 {
    let a = x.abs();
    let y = if a <= 0.040_45 {
        a / 12.92
    } else {
        ((a + 0.055) / 1.055).powf(2.4)
    };
    y.copysign(x)
}

pub fn linear_to_srgb(c: LinearRgb) -> Rgb {
    Rgb {
        r: srgb_transfer(c.r),
        g: srgb_transfer(c.g),
        b: srgb_transfer(c.b),
    }
}

pub fn srgb_to_linear(c: Rgb) -> LinearRgb {
    LinearRgb {
        r: srgb_transfer_inv(c.r),
        g: srgb_transfer_inv(c.g),
        b: srgb_transfer_inv(c.b),
    }
}
