use okcolor::{
    find_gamut_cusp, max_chroma_in, okhsl_to_oklch, oklch_to_rgb, Colorspace, Gamut, GamutCusp,
    Okhsl, Oklch, Rgb, OUT_OF_GAMUT_THRESHOLD, SQUARE_THRESHOLD_TOLERANCE,
};

use crate::types::RingAppearance;

/// Normalized coordinate of a pixel center, origin bottom-left.
pub fn pixel_center(px: u32, py: u32, width: u32, height: u32) -> (f32, f32) {
    let x = (px as f32 + 0.5) / width as f32;
    let y = (height as f32 - (py as f32 + 0.5)) / height as f32;
    (x, y)
}

pub fn ring_hue(x: f32) -> f32 {
    360.0 * x
}

pub fn hue_ring_pixel(x: f32, ring: RingAppearance, colorspace: Colorspace) -> Rgb {
    let gamut = colorspace.gamut();
    let hue = ring_hue(x);
    let (sin, cos) = hue.to_radians().sin_cos();
    // Cap at the boundary so clamping cannot rotate the hue.
    let chroma = ring
        .chroma
        .min(max_chroma_in(gamut, ring.lightness, cos, sin));
    oklch_to_rgb(Oklch::new(ring.lightness, chroma, hue), gamut, true)
}

pub fn square_cusp(hue: f32, colorspace: Colorspace) -> GamutCusp {
    let (sin, cos) = hue.to_radians().sin_cos();
    find_gamut_cusp(colorspace.gamut(), cos, sin)
}

/// Evaluates one gamut-square pixel; out-of-gamut pixels come back as
/// [`Rgb::WHITE`].
pub fn gamut_square_pixel(
    x: f32,
    y: f32,
    hue: f32,
    colorspace: Colorspace,
    max_chroma: f32,
    cusp: GamutCusp,
) -> Rgb {
    if colorspace == Colorspace::Okhsl {
        let lch = okhsl_to_oklch(Okhsl::new(hue, y, x));
        let rgb = oklch_to_rgb(lch, Gamut::Srgb, false);
        if rgb.max_channel() > OUT_OF_GAMUT_THRESHOLD {
            return Rgb::WHITE;
        }
        return rgb.clamped();
    }

    let gamut = colorspace.gamut();
    let l = x;
    let c = y * max_chroma;
    let c_range = cusp.chroma / max_chroma;
    let y_threshold = c_range * l / cusp.lightness * (1.0 + SQUARE_THRESHOLD_TOLERANCE);
    let rgb = oklch_to_rgb(Oklch::new(l, c, hue), gamut, false);
    if y > y_threshold || rgb.max_channel() > OUT_OF_GAMUT_THRESHOLD {
        return Rgb::WHITE;
    }
    Rgb::new(rgb.r.max(0.0), rgb.g.max(0.0), rgb.b.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use okcolor::{in_gamut, linear_to_oklab, oklab_to_oklch, srgb_to_linear};

    fn angular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    fn recovered_hue(rgb: Rgb) -> f32 {
        oklab_to_oklch(linear_to_oklab(srgb_to_linear(rgb))).h
    }

    #[test]
    fn ring_preserves_hue_everywhere() {
        for step in 0..72 {
            let x = step as f32 / 72.0;
            let rgb = hue_ring_pixel(x, RingAppearance::default(), Colorspace::Oklch);
            let hue = recovered_hue(rgb);
            assert!(
                angular_distance(hue, ring_hue(x)) < 2.0,
                "x {x}: expected {} got {hue}",
                ring_hue(x)
            );
        }
    }

    #[test]
    fn square_is_white_above_cusp_line() {
        let hue = 150.0;
        let cusp = square_cusp(hue, Colorspace::Oklch);
        let x = cusp.lightness * 0.5;
        let limit = cusp.chroma / 0.4 * 0.5;
        let above = gamut_square_pixel(x, limit + 0.05, hue, Colorspace::Oklch, 0.4, cusp);
        assert_eq!(above, Rgb::WHITE);
        let below = gamut_square_pixel(x, limit * 0.5, hue, Colorspace::Oklch, 0.4, cusp);
        assert_ne!(below, Rgb::WHITE);
    }

    #[test]
    fn unpainted_square_pixels_are_in_gamut() {
        for hue in [0.0f32, 45.0, 110.0, 200.0, 264.0, 320.0] {
            let cusp = square_cusp(hue, Colorspace::Oklch);
            for i in 0..40 {
                for j in 0..40 {
                    let (x, y) = pixel_center(i, j, 40, 40);
                    let rgb = gamut_square_pixel(x, y, hue, Colorspace::Oklch, 0.4, cusp);
                    if rgb != Rgb::WHITE {
                        let lch = Oklch::new(x, y * 0.4, hue);
                        assert!(in_gamut(lch, Gamut::Srgb, 3e-3), "hue {hue} {lch:?}");
                    }
                }
            }
        }
    }

    fn srgb_walk() -> Vec<Rgb> {
        let mut colors = vec![
            Rgb::new(1.0, 0.0, 0.0),
            Rgb::new(0.0, 1.0, 0.0),
            Rgb::new(0.0, 0.0, 1.0),
            Rgb::new(0.0, 1.0, 1.0),
            Rgb::new(1.0, 0.0, 1.0),
            Rgb::new(1.0, 1.0, 0.0),
            Rgb::new(0.0, 0.0, 0.675),
            Rgb::new(0.0, 0.0, 0.55),
        ];
        for i in 0..=20 {
            for j in 0..=20 {
                let (u, v) = (i as f32 / 20.0, j as f32 / 20.0);
                colors.push(Rgb::new(0.0, u, v));
                colors.push(Rgb::new(u, 0.0, v));
                colors.push(Rgb::new(u, v, 0.0));
            }
        }
        for r in 0..=10 {
            for g in 0..=10 {
                for b in 0..=10 {
                    colors.push(Rgb::new(r as f32 / 10.0, g as f32 / 10.0, b as f32 / 10.0));
                }
            }
        }
        colors
    }

    #[test]
    fn srgb_colors_are_never_painted_white() {
        for rgb in srgb_walk() {
            let lch = oklab_to_oklch(linear_to_oklab(srgb_to_linear(rgb)));
            let cusp = square_cusp(lch.h, Colorspace::Oklch);
            let painted =
                gamut_square_pixel(lch.l, lch.c / 0.4, lch.h, Colorspace::Oklch, 0.4, cusp);
            assert_ne!(painted, Rgb::WHITE, "{rgb:?} at {lch:?} under {cusp:?}");
        }
    }

    #[test]
    fn blue_ramp_stays_inside_square() {
        for i in 1..=64 {
            let rgb = Rgb::new(0.0, 0.0, i as f32 / 64.0);
            let lch = oklab_to_oklch(linear_to_oklab(srgb_to_linear(rgb)));
            let cusp = square_cusp(lch.h, Colorspace::Oklch);
            let painted =
                gamut_square_pixel(lch.l, lch.c / 0.4, lch.h, Colorspace::Oklch, 0.4, cusp);
            assert_ne!(painted, Rgb::WHITE, "{rgb:?} at {lch:?}");
            assert!(cusp.chroma + 1e-3 >= lch.c * cusp.lightness / lch.l);
        }
    }

    #[test]
    fn okhsl_square_is_fully_populated() {
        let hue = 30.0;
        let cusp = square_cusp(hue, Colorspace::Okhsl);
        for i in 1..20 {
            let (x, y) = pixel_center(i, 10, 20, 20);
            let rgb = gamut_square_pixel(x, y, hue, Colorspace::Okhsl, 0.4, cusp);
            assert_ne!(rgb, Rgb::WHITE, "x {x} y {y}");
        }
    }

    #[test]
    fn p3_square_extends_past_srgb() {
        let hue = 145.0;
        let srgb = square_cusp(hue, Colorspace::Oklch);
        let p3 = square_cusp(hue, Colorspace::DisplayP3);
        assert!(p3.chroma > srgb.chroma);
        let x = srgb.lightness;
        let (sin, cos) = hue.to_radians().sin_cos();
        let p3_limit = okcolor::max_chroma_in(Gamut::DisplayP3, x, cos, sin);
        let y = 0.5 * (srgb.chroma + p3_limit) / 0.4;
        let in_p3 = gamut_square_pixel(x, y, hue, Colorspace::DisplayP3, 0.4, p3);
        let in_srgb = gamut_square_pixel(x, y, hue, Colorspace::Oklch, 0.4, srgb);
        assert_ne!(in_p3, Rgb::WHITE);
        assert_eq!(in_srgb, Rgb::WHITE);
    }

    #[test]
    fn pixel_centers_flip_vertically() {
        assert_eq!(pixel_center(0, 0, 2, 2), (0.25, 0.75));
        assert_eq!(pixel_center(1, 1, 2, 2), (0.75, 0.25));
    }
}
