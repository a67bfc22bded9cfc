use crate::cusp::max_chroma;
use crate::oklab::normalize_hue;
use crate::types::{Okhsl, Oklch};

// Saturation is chroma relative to the sRGB boundary at the same lightness
// and hue. Lightness is plain OKLab L; no toe is applied.

pub fn oklch_to_okhsl(lch: Oklch) -> Okhsl {
    let h = normalize_hue(lch.h);
    let (sin, cos) = h.to_radians().sin_cos();
    let limit = max_chroma(lch.l, cos, sin);
    let s = if limit > 0.0 { lch.c / limit } else { 0.0 };
    Okhsl { h, s, l: lch.l }
}

pub fn okhsl_to_oklch(hsl: Okhsl) -> Oklch {
    let h = normalize_hue(hsl.h);
    let (sin, cos) = h.to_radians().sin_cos();
    let limit = max_chroma(hsl.l, cos, sin);
    Oklch {
        l: hsl.l,
        c: (hsl.s.max(0.0) * limit).max(0.0),
        h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamut::{in_gamut, oklch_to_srgb};
    use crate::oklab::{linear_to_oklab, oklab_to_oklch};
    use crate::transfer::srgb_to_linear;
    use crate::types::{Gamut, Rgb};
    use rand::prelude::*;

    #[test]
    fn in_gamut_colors_have_unit_saturation_or_less() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..2_000 {
            let rgb = Rgb::new(rng.gen(), rng.gen(), rng.gen());
            let lch = oklab_to_oklch(linear_to_oklab(srgb_to_linear(rgb)));
            let hsl = oklch_to_okhsl(lch);
            assert!(hsl.s >= 0.0 && hsl.s <= 1.0 + 1e-3, "{rgb:?} -> {hsl:?}");
        }
    }

    #[test]
    fn blue_ramp_is_fully_saturated() {
        for i in 1..=40 {
            let rgb = Rgb::new(0.0, 0.0, i as f32 / 40.0);
            let lch = oklab_to_oklch(linear_to_oklab(srgb_to_linear(rgb)));
            let hsl = oklch_to_okhsl(lch);
            assert!((hsl.s - 1.0).abs() < 1e-3, "{rgb:?} -> {hsl:?}");
        }
    }

    #[test]
    fn full_saturation_sits_on_boundary() {
        for step in 0..24 {
            let hue = step as f32 * 15.0;
            let lch = okhsl_to_oklch(Okhsl::new(hue, 1.0, 0.55));
            assert!(in_gamut(lch, Gamut::Srgb, 1e-3), "hue {hue}: {lch:?}");
            let beyond = Oklch { c: lch.c + 0.01, ..lch };
            assert!(!in_gamut(beyond, Gamut::Srgb, 0.0), "hue {hue}");
        }
    }

    #[test]
    fn okhsl_round_trip_preserves_components() {
        let hsl = Okhsl::new(200.0, 0.4, 0.6);
        let back = oklch_to_okhsl(okhsl_to_oklch(hsl));
        assert!((back.h - hsl.h).abs() < 1e-3);
        assert!((back.s - hsl.s).abs() < 1e-4);
        assert_eq!(back.l, hsl.l);
    }

    #[test]
    fn degenerate_lightness_has_zero_saturation() {
        assert_eq!(oklch_to_okhsl(Oklch::new(0.0, 0.1, 30.0)).s, 0.0);
        assert_eq!(oklch_to_okhsl(Oklch::new(1.0, 0.1, 30.0)).s, 0.0);
        let black = oklch_to_srgb(okhsl_to_oklch(Okhsl::new(30.0, 1.0, 0.0)), true);
        assert_eq!(black, Rgb::BLACK);
    }
}
