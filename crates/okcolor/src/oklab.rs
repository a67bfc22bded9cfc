use crate::types::{LinearRgb, Oklab, Oklch};

// Linear sRGB -> LMS
const M1: [[f32; 3]; 3] = [
    [0.412_221_470_8, 0.536_332_536_3, 0.051_445_992_9],
    [0.211_903_498_2, 0.680_699_545_1, 0.107_396_956_6],
    [0.088_302_461_9, 0.281_718_837_6, 0.629_978_700_5],
];

// LMS' -> Oklab
const M2: [[f32; 3]; 3] = [
    [0.210_454_255_3, 0.793_617_785_0, -0.004_072_046_8],
    [1.977_998_495_1, -2.428_592_205_0, 0.450_593_709_9],
    [0.025_904_037_1, 0.782_771_766_2, -0.808_675_766_0],
];

// Oklab -> LMS'
pub(crate) const M2_INV: [[f32; 3]; 3] = [
    [1.0, 0.396_337_777_4, 0.215_803_757_3],
    [1.0, -0.105_561_345_8, -0.063_854_172_8],
    [1.0, -0.089_484_177_5, -1.291_485_548_0],
];

// LMS -> linear sRGB
pub(crate) const M1_INV: [[f32; 3]; 3] = [
    [4.076_741_662_1, -3.307_711_591_3, 0.230_969_929_2],
    [-1.268_438_004_6, 2.609_757_401_1, -0.341_319_396_5],
    [-0.004_196_086_3, -0.703_418_614_7, 1.707_614_701_0],
];

pub(crate) fn mul(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

pub fn linear_to_oklab(c: LinearRgb) -> Oklab {
    let lms = mul(&M1, [c.r, c.g, c.b]);
    let [l, a, b] = mul(&M2, lms.map(f32::cbrt));
    Oklab { l, a, b }
}

/// Oklab to the cone response (LMS) space, before the RGB matrix.
pub(crate) fn oklab_to_lms(c: Oklab) -> [f32; 3] {
    mul(&M2_INV, [c.l, c.a, c.b]).map(|v| v * v * v)
}

pub fn oklab_to_linear(c: Oklab) -> LinearRgb {
    let [r, g, b] = mul(&M1_INV, oklab_to_lms(c));
    LinearRgb { r, g, b }
}

/// Wraps any finite angle into `[0, 360)`.
pub fn normalize_hue(h: f32) -> f32 {
    let wrapped = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative input
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub fn oklab_to_oklch(c: Oklab) -> Oklch {
    Oklch {
        l: c.l,
        c: c.a.hypot(c.b),
        h: normalize_hue(c.b.atan2(c.a).to_degrees()),
    }
}

pub fn oklch_to_oklab(c: Oklch) -> Oklab {
    debug_assert!(c.c >= 0.0 || c.c.is_nan(), "negative chroma {}", c.c);
    let (sin, cos) = c.h.to_radians().sin_cos();
    Oklab {
        l: c.l,
        a: c.c * cos,
        b: c.c * sin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn white_maps_to_unit_lightness() {
        let lab = linear_to_oklab(LinearRgb::new(1.0, 1.0, 1.0));
        assert!((lab.l - 1.0).abs() < 1e-4);
        assert!(lab.a.abs() < 1e-4 && lab.b.abs() < 1e-4);
    }

    #[test]
    fn linear_round_trip_over_extended_cube() {
        let mut rng = StdRng::seed_from_u64(0x0c01_0b);
        for _ in 0..10_000 {
            let rgb = LinearRgb::new(
                rng.gen_range(-0.5..1.5),
                rng.gen_range(-0.5..1.5),
                rng.gen_range(-0.5..1.5),
            );
            let back = oklab_to_linear(linear_to_oklab(rgb));
            for (x, y) in [(rgb.r, back.r), (rgb.g, back.g), (rgb.b, back.b)] {
                assert!((x - y).abs() < 1e-5, "{rgb:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn polar_round_trip_keeps_hue_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let lab = Oklab {
                l: rng.gen_range(0.0..1.0),
                a: rng.gen_range(-0.4..0.4),
                b: rng.gen_range(-0.4..0.4),
            };
            let lch = oklab_to_oklch(lab);
            assert!((0.0..360.0).contains(&lch.h), "hue {}", lch.h);
            assert!(lch.c >= 0.0);
            let back = oklch_to_oklab(lch);
            assert!((back.a - lab.a).abs() < 1e-6 && (back.b - lab.b).abs() < 1e-6);
        }
    }

    #[test]
    fn hue_normalization_wraps_both_directions() {
        assert_eq!(normalize_hue(360.0), 0.0);
        assert_eq!(normalize_hue(-90.0), 270.0);
        assert_eq!(normalize_hue(725.0), 5.0);
        assert!(normalize_hue(-1e-9) < 360.0);
    }
}
