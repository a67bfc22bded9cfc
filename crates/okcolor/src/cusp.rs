use crate::gamut::oklab_to_linear_in;
use crate::oklab::M2_INV;
use crate::types::{Gamut, GamutCusp, Oklab};

/// Halley refinements applied after the polynomial or triangle estimate.
/// One step leaves errors around 4e-4 for blue hues; two are below 1e-5.
pub const HALLEY_STEPS: usize = 2;

/// Bisection steps used when a gamut has no fitted saturation polynomial.
pub const CUSP_BISECTION_STEPS: usize = 24;

// Derivatives of LMS' with respect to chroma along the hue direction.
fn lms_slopes(a: f32, b: f32) -> [f32; 3] {
    [
        M2_INV[0][1] * a + M2_INV[0][2] * b,
        M2_INV[1][1] * a + M2_INV[1][2] * b,
        M2_INV[2][1] * a + M2_INV[2][2] * b,
    ]
}

/// Largest saturation `S = C / L` that stays inside sRGB for the normalized
/// hue direction `(a, b)`.
pub fn compute_max_saturation(a: f32, b: f32) -> f32 {
    // Pick the channel that clips first and its fitted polynomial.
    let (k, w) = if -1.881_703_28 * a - 0.809_364_93 * b > 1.0 {
        (
            [1.190_862_77, 1.765_767_28, 0.596_626_41, 0.755_151_97, 0.567_712_45],
            [4.076_741_662_1, -3.307_711_591_3, 0.230_969_929_2],
        )
    } else if 1.814_441_04 * a - 1.194_452_76 * b > 1.0 {
        (
            [0.739_565_15, -0.459_544_04, 0.082_854_27, 0.125_410_70, 0.145_032_04],
            [-1.268_438_004_6, 2.609_757_401_1, -0.341_319_396_5],
        )
    } else {
        (
            [1.357_336_52, -0.009_157_99, -1.151_302_10, -0.505_596_06, 0.006_921_67],
            [-0.004_196_086_3, -0.703_418_614_7, 1.707_614_701_0],
        )
    };

    let mut saturation = k[0] + k[1] * a + k[2] * b + k[3] * a * a + k[4] * a * b;

    let [k_l, k_m, k_s] = lms_slopes(a, b);
    for _ in 0..HALLEY_STEPS {
        let l_ = 1.0 + saturation * k_l;
        let m_ = 1.0 + saturation * k_m;
        let s_ = 1.0 + saturation * k_s;

        let l = l_ * l_ * l_;
        let m = m_ * m_ * m_;
        let s = s_ * s_ * s_;

        let l_ds = 3.0 * k_l * l_ * l_;
        let m_ds = 3.0 * k_m * m_ * m_;
        let s_ds = 3.0 * k_s * s_ * s_;

        let l_ds2 = 6.0 * k_l * k_l * l_;
        let m_ds2 = 6.0 * k_m * k_m * m_;
        let s_ds2 = 6.0 * k_s * k_s * s_;

        let f = w[0] * l + w[1] * m + w[2] * s;
        let f1 = w[0] * l_ds + w[1] * m_ds + w[2] * s_ds;
        let f2 = w[0] * l_ds2 + w[1] * m_ds2 + w[2] * s_ds2;

        saturation -= f * f1 / (f1 * f1 - 0.5 * f * f2);
    }

    saturation
}

fn cusp_from_saturation(gamut: Gamut, a: f32, b: f32, saturation: f32) -> GamutCusp {
    let rgb = oklab_to_linear_in(
        Oklab {
            l: 1.0,
            a: saturation * a,
            b: saturation * b,
        },
        gamut,
    );
    let lightness = (1.0 / rgb.max_channel()).cbrt();
    GamutCusp {
        lightness,
        chroma: lightness * saturation,
    }
}

/// Hue spread, in radians (1e-3 degrees), over which cusps are widened.
///
/// The cusp jumps where the hue crosses a gamut primary that is also a
/// chroma maximum, blue in both sRGB and P3. Hue noise from f32 round trips
/// must not land on the short side of that jump.
pub const CUSP_HUE_SPREAD: f32 = 1.745_329_3e-5;

// Saturations past this cannot be inside either gamut on the `L = 1` plane.
const CUSP_SEARCH_LIMIT: f32 = 2.0;

// Channels this far below zero still count as touching the gamut.
const CUSP_CHANNEL_SLACK: f32 = 1e-5;

/// Widest cusp among `(hue_cos, hue_sin)` and its rotations by
/// `±CUSP_HUE_SPREAD`.
fn widest_cusp(
    hue_cos: f32,
    hue_sin: f32,
    cusp_at: impl Fn(f32, f32) -> GamutCusp,
) -> GamutCusp {
    let (sin, cos) = CUSP_HUE_SPREAD.sin_cos();
    [
        (hue_cos * cos - hue_sin * sin, hue_cos * sin + hue_sin * cos),
        (hue_cos * cos + hue_sin * sin, hue_sin * cos - hue_cos * sin),
    ]
    .into_iter()
    .map(|(a, b)| cusp_at(a, b))
    .fold(cusp_at(hue_cos, hue_sin), |best, cusp| {
        if cusp.chroma > best.chroma {
            cusp
        } else {
            best
        }
    })
}

/// sRGB cusp for the normalized hue direction `(hue_cos, hue_sin)`.
pub fn find_cusp(hue_cos: f32, hue_sin: f32) -> GamutCusp {
    widest_cusp(hue_cos, hue_sin, |a, b| {
        cusp_from_saturation(Gamut::Srgb, a, b, compute_max_saturation(a, b))
    })
}

// Each linear channel on the `L = 1` plane is a cubic in saturation:
// `sum_j w_j (1 + s k_j)^3`. Coefficients are lowest order first.
fn channel_cubics(gamut: Gamut, a: f32, b: f32) -> [[f32; 4]; 3] {
    let k = lms_slopes(a, b);
    (*gamut.lms_matrix()).map(|w| {
        let mut cubic = [0.0f32; 4];
        for j in 0..3 {
            cubic[0] += w[j];
            cubic[1] += 3.0 * w[j] * k[j];
            cubic[2] += 3.0 * w[j] * k[j] * k[j];
            cubic[3] += w[j] * k[j] * k[j] * k[j];
        }
        cubic
    })
}

fn eval_cubic(cubic: [f32; 4], s: f32) -> f32 {
    ((cubic[3] * s + cubic[2]) * s + cubic[1]) * s + cubic[0]
}

// Splits `[0, CUSP_SEARCH_LIMIT]` at the cubic's turning points so that it is
// monotone between consecutive entries.
fn monotone_breaks(cubic: [f32; 4]) -> [f32; 4] {
    let (qa, qb, qc) = (3.0 * cubic[3], 2.0 * cubic[2], cubic[1]);
    let (mut first, mut second) = (0.0f32, 0.0f32);
    if qa.abs() < 1e-12 {
        if qb != 0.0 {
            first = -qc / qb;
        }
    } else {
        let disc = qb * qb - 4.0 * qa * qc;
        if disc >= 0.0 {
            let root = disc.sqrt();
            first = (-qb - root) / (2.0 * qa);
            second = (-qb + root) / (2.0 * qa);
        }
    }
    let first = first.clamp(0.0, CUSP_SEARCH_LIMIT);
    let second = second.clamp(0.0, CUSP_SEARCH_LIMIT);
    [0.0, first.min(second), first.max(second), CUSP_SEARCH_LIMIT]
}

/// Cusp for any gamut without a fitted polynomial.
///
/// Every saturation where a channel leaves `[0, inf)` on the `L = 1` plane is
/// a candidate; the candidate with every other channel still in gamut and
/// the largest chroma after scaling the brightest channel to one wins. The
/// cross-section is not convex near blue, so the first exit is not always
/// the cusp.
pub fn find_cusp_numeric(gamut: Gamut, hue_cos: f32, hue_sin: f32) -> GamutCusp {
    widest_cusp(hue_cos, hue_sin, |a, b| cusp_by_roots(gamut, a, b))
}

fn cusp_by_roots(gamut: Gamut, a: f32, b: f32) -> GamutCusp {
    let cubics = channel_cubics(gamut, a, b);
    let mut best = GamutCusp {
        lightness: 1.0,
        chroma: 0.0,
    };

    for cubic in cubics {
        let breaks = monotone_breaks(cubic);
        for span in breaks.windows(2) {
            let (mut lo, mut hi) = (span[0], span[1]);
            if eval_cubic(cubic, lo) < 0.0 || eval_cubic(cubic, hi) >= 0.0 {
                continue;
            }
            for _ in 0..CUSP_BISECTION_STEPS {
                let mid = 0.5 * (lo + hi);
                if eval_cubic(cubic, mid) >= 0.0 {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            if cubics
                .iter()
                .any(|other| eval_cubic(*other, lo) < -CUSP_CHANNEL_SLACK)
            {
                continue;
            }
            let cusp = cusp_from_saturation(gamut, a, b, lo);
            if cusp.chroma > best.chroma {
                best = cusp;
            }
        }
    }

    best
}

pub fn find_gamut_cusp(gamut: Gamut, hue_cos: f32, hue_sin: f32) -> GamutCusp {
    match gamut {
        Gamut::Srgb => find_cusp(hue_cos, hue_sin),
        Gamut::DisplayP3 => find_cusp_numeric(gamut, hue_cos, hue_sin),
    }
}

/// Finds `t` where the line `L = L0 * (1 - t) + t * L1`, `C = t * C1` leaves
/// the sRGB gamut. `(a, b)` must be a unit hue direction.
pub fn find_gamut_intersection(
    a: f32,
    b: f32,
    l1: f32,
    c1: f32,
    l0: f32,
    cusp: GamutCusp,
) -> f32 {
    find_gamut_intersection_in(Gamut::Srgb, a, b, l1, c1, l0, cusp)
}

#[allow(clippy::too_many_arguments)]
pub fn find_gamut_intersection_in(
    gamut: Gamut,
    a: f32,
    b: f32,
    l1: f32,
    c1: f32,
    l0: f32,
    cusp: GamutCusp,
) -> f32 {
    let (cusp_l, cusp_c) = (cusp.lightness, cusp.chroma);

    if (l1 - l0) * cusp_c - (cusp_l - l0) * c1 <= 0.0 {
        // Lower half: the triangle edge is exact.
        return cusp_c * l0 / (c1 * cusp_l + cusp_c * (l0 - l1));
    }

    // Upper half: start on the triangle, then refine against the real boundary.
    let mut t = cusp_c * (l0 - 1.0) / (c1 * (cusp_l - 1.0) + cusp_c * (l0 - l1));

    let d_l = l1 - l0;
    let [k_l, k_m, k_s] = lms_slopes(a, b);
    let l_dt = d_l + c1 * k_l;
    let m_dt = d_l + c1 * k_m;
    let s_dt = d_l + c1 * k_s;
    let rows = gamut.lms_matrix();

    for _ in 0..HALLEY_STEPS {
        let lightness = l0 * (1.0 - t) + t * l1;
        let chroma = t * c1;

        let l_ = lightness + chroma * k_l;
        let m_ = lightness + chroma * k_m;
        let s_ = lightness + chroma * k_s;

        let lms = [l_ * l_ * l_, m_ * m_ * m_, s_ * s_ * s_];
        let d1 = [
            3.0 * l_dt * l_ * l_,
            3.0 * m_dt * m_ * m_,
            3.0 * s_dt * s_ * s_,
        ];
        let d2 = [
            6.0 * l_dt * l_dt * l_,
            6.0 * m_dt * m_dt * m_,
            6.0 * s_dt * s_dt * s_,
        ];

        let mut step = f32::MAX;
        for w in rows {
            let dot = |v: [f32; 3]| w[0] * v[0] + w[1] * v[1] + w[2] * v[2];
            let f = dot(lms) - 1.0;
            let f1 = dot(d1);
            let f2 = dot(d2);
            let u = f1 / (f1 * f1 - 0.5 * f * f2);
            if u >= 0.0 {
                step = step.min(-f * u);
            }
        }
        t += step;
    }

    t
}

/// Maximum in-gamut sRGB chroma at lightness `l` along `(a, b)`.
pub fn max_chroma(l: f32, a: f32, b: f32) -> f32 {
    max_chroma_in(Gamut::Srgb, l, a, b)
}

pub fn max_chroma_in(gamut: Gamut, l: f32, a: f32, b: f32) -> f32 {
    if l <= 0.0 || l >= 1.0 {
        return 0.0;
    }
    let cusp = find_gamut_cusp(gamut, a, b);
    find_gamut_intersection_in(gamut, a, b, l, 1.0, l, cusp).max(0.0)
}
