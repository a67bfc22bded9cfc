/// Bumped whenever a function in [`KERNEL_LIBRARY`] changes behaviour.
pub const KERNEL_LIBRARY_VERSION: u32 = 2;

/// GLSL shared by every picker kernel. Mirrors `okcolor` operation for
/// operation so CPU lookups agree with what the GPU drew.
pub const KERNEL_LIBRARY: &str = r"// okpicker kernel library v2
const float OK_OUT_OF_GAMUT = 1.001;
const float OK_SQUARE_THRESHOLD_TOLERANCE = 1e-4;
const float OK_FLT_MAX = 3.4028235e38;
const int OK_HALLEY_STEPS = 2;
const int OK_CUSP_BISECTION_STEPS = 24;
const float OK_CUSP_HUE_SPREAD = 1.7453293e-5;
const float OK_CUSP_SEARCH_LIMIT = 2.0;
const float OK_CUSP_CHANNEL_SLACK = 1e-5;

const int COLORSPACE_OKLCH = 0;
const int COLORSPACE_OKHSL = 1;
const int COLORSPACE_DISPLAY_P3 = 2;

const int GAMUT_SRGB = 0;
const int GAMUT_DISPLAY_P3 = 1;

int ok_gamut_for(int colorspace) {
    return colorspace == COLORSPACE_DISPLAY_P3 ? GAMUT_DISPLAY_P3 : GAMUT_SRGB;
}

float ok_srgb_transfer(float x) {
    float a = abs(x);
    float y = a <= 0.0031308 ? 12.92 * a : 1.055 * pow(a, 1.0 / 2.4) - 0.055;
    return x < 0.0 ? -y : y;
}

vec3 ok_srgb_transfer3(vec3 c) {
    return vec3(ok_srgb_transfer(c.x), ok_srgb_transfer(c.y), ok_srgb_transfer(c.z));
}

float ok_max3(vec3 v) {
    return max(v.x, max(v.y, v.z));
}

float ok_min3(vec3 v) {
    return min(v.x, min(v.y, v.z));
}

vec3 ok_lab_to_lms(vec3 lab) {
    float l_ = lab.x + 0.3963377774 * lab.y + 0.2158037573 * lab.z;
    float m_ = lab.x - 0.1055613458 * lab.y - 0.0638541728 * lab.z;
    float s_ = lab.x - 0.0894841775 * lab.y - 1.2914855480 * lab.z;
    return vec3(l_ * l_ * l_, m_ * m_ * m_, s_ * s_ * s_);
}

// Linear in `lms`, so it also maps derivatives.
vec3 ok_lms_to_linear(vec3 lms, int gamut) {
    if (gamut == GAMUT_DISPLAY_P3) {
        return vec3(
            3.1277695621 * lms.x - 2.2571363121 * lms.y + 0.1293668500 * lms.z,
            -1.0910094494 * lms.x + 2.4133320826 * lms.y - 0.3223227333 * lms.z,
            -0.0260104789 * lms.x - 0.5080416410 * lms.y + 1.5340521199 * lms.z
        );
    }
    return vec3(
        4.0767416621 * lms.x - 3.3077115913 * lms.y + 0.2309699292 * lms.z,
        -1.2684380046 * lms.x + 2.6097574011 * lms.y - 0.3413193965 * lms.z,
        -0.0041960863 * lms.x - 0.7034186147 * lms.y + 1.7076147010 * lms.z
    );
}

vec3 ok_lab_to_linear(vec3 lab, int gamut) {
    return ok_lms_to_linear(ok_lab_to_lms(lab), gamut);
}

vec3 ok_lch_to_lab(vec3 lch) {
    float h = radians(lch.z);
    return vec3(lch.x, lch.y * cos(h), lch.y * sin(h));
}

vec3 ok_lch_to_rgb(vec3 lch, int gamut, bool clamp_out_of_gamut) {
    vec3 rgb = ok_srgb_transfer3(ok_lab_to_linear(ok_lch_to_lab(lch), gamut));
    if (clamp_out_of_gamut) {
        return clamp(rgb, vec3(0.0), vec3(1.0));
    }
    return rgb;
}

vec3 ok_lms_slopes(float a, float b) {
    return vec3(
        0.3963377774 * a + 0.2158037573 * b,
        -0.1055613458 * a - 0.0638541728 * b,
        -0.0894841775 * a - 1.2914855480 * b
    );
}

float ok_compute_max_saturation(float a, float b) {
    float k0;
    float k1;
    float k2;
    float k3;
    float k4;
    vec3 w;
    if (-1.88170328 * a - 0.80936493 * b > 1.0) {
        k0 = 1.19086277; k1 = 1.76576728; k2 = 0.59662641; k3 = 0.75515197; k4 = 0.56771245;
        w = vec3(4.0767416621, -3.3077115913, 0.2309699292);
    } else if (1.81444104 * a - 1.19445276 * b > 1.0) {
        k0 = 0.73956515; k1 = -0.45954404; k2 = 0.08285427; k3 = 0.12541070; k4 = 0.14503204;
        w = vec3(-1.2684380046, 2.6097574011, -0.3413193965);
    } else {
        k0 = 1.35733652; k1 = -0.00915799; k2 = -1.15130210; k3 = -0.50559606; k4 = 0.00692167;
        w = vec3(-0.0041960863, -0.7034186147, 1.7076147010);
    }

    float saturation = k0 + k1 * a + k2 * b + k3 * a * a + k4 * a * b;
    vec3 k = ok_lms_slopes(a, b);
    for (int i = 0; i < OK_HALLEY_STEPS; i++) {
        vec3 p = vec3(1.0) + saturation * k;
        vec3 lms = p * p * p;
        vec3 d1 = 3.0 * k * p * p;
        vec3 d2 = 6.0 * k * k * p;
        float f = dot(w, lms);
        float f1 = dot(w, d1);
        float f2 = dot(w, d2);
        saturation = saturation - f * f1 / (f1 * f1 - 0.5 * f * f2);
    }
    return saturation;
}

vec2 ok_cusp_from_saturation(float a, float b, float saturation, int gamut) {
    vec3 rgb = ok_lab_to_linear(vec3(1.0, saturation * a, saturation * b), gamut);
    float lightness = pow(1.0 / ok_max3(rgb), 1.0 / 3.0);
    return vec2(lightness, lightness * saturation);
}

// Channels on the L = 1 plane are cubics in saturation; c0..c3 hold the
// coefficients of all three, lowest order first.
vec3 ok_eval_cubics(vec3 c0, vec3 c1, vec3 c2, vec3 c3, float s) {
    return ((c3 * s + c2) * s + c1) * s + c0;
}

float ok_eval_cubic(vec4 cubic, float s) {
    return ((cubic.w * s + cubic.z) * s + cubic.y) * s + cubic.x;
}

vec2 ok_cusp_by_roots(float a, float b, int gamut) {
    vec3 k = ok_lms_slopes(a, b);
    vec3 c0 = ok_lms_to_linear(vec3(1.0), gamut);
    vec3 c1 = ok_lms_to_linear(3.0 * k, gamut);
    vec3 c2 = ok_lms_to_linear(3.0 * k * k, gamut);
    vec3 c3 = ok_lms_to_linear(k * k * k, gamut);
    vec2 best = vec2(1.0, 0.0);

    for (int channel = 0; channel < 3; channel++) {
        vec4 cubic = vec4(c0[channel], c1[channel], c2[channel], c3[channel]);
        float qa = 3.0 * cubic.w;
        float qb = 2.0 * cubic.z;
        float qc = cubic.y;
        float first = 0.0;
        float second = 0.0;
        if (abs(qa) < 1e-12) {
            if (qb != 0.0) {
                first = -qc / qb;
            }
        } else {
            float disc = qb * qb - 4.0 * qa * qc;
            if (disc >= 0.0) {
                float root = sqrt(disc);
                first = (-qb - root) / (2.0 * qa);
                second = (-qb + root) / (2.0 * qa);
            }
        }
        first = clamp(first, 0.0, OK_CUSP_SEARCH_LIMIT);
        second = clamp(second, 0.0, OK_CUSP_SEARCH_LIMIT);
        float turn_lo = min(first, second);
        float turn_hi = max(first, second);

        // The cubic is monotone on each span; look for exits from [0, inf).
        for (int span = 0; span < 3; span++) {
            float lo = span == 0 ? 0.0 : (span == 1 ? turn_lo : turn_hi);
            float hi = span == 0 ? turn_lo : (span == 1 ? turn_hi : OK_CUSP_SEARCH_LIMIT);
            if (ok_eval_cubic(cubic, lo) < 0.0 || ok_eval_cubic(cubic, hi) >= 0.0) {
                continue;
            }
            for (int i = 0; i < OK_CUSP_BISECTION_STEPS; i++) {
                float mid = 0.5 * (lo + hi);
                if (ok_eval_cubic(cubic, mid) >= 0.0) {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            if (ok_min3(ok_eval_cubics(c0, c1, c2, c3, lo)) < -OK_CUSP_CHANNEL_SLACK) {
                continue;
            }
            vec2 cusp = ok_cusp_from_saturation(a, b, lo, gamut);
            if (cusp.y > best.y) {
                best = cusp;
            }
        }
    }
    return best;
}

vec2 ok_cusp_at(float a, float b, int gamut) {
    if (gamut == GAMUT_DISPLAY_P3) {
        return ok_cusp_by_roots(a, b, gamut);
    }
    return ok_cusp_from_saturation(a, b, ok_compute_max_saturation(a, b), GAMUT_SRGB);
}

// x = lightness, y = chroma of the cusp. Widest over a tiny hue spread so
// that the jump at the blue primary is never undershot.
vec2 ok_find_gamut_cusp(float a, float b, int gamut) {
    float sn = sin(OK_CUSP_HUE_SPREAD);
    float cs = cos(OK_CUSP_HUE_SPREAD);
    vec2 best = ok_cusp_at(a, b, gamut);
    vec2 up = ok_cusp_at(a * cs - b * sn, a * sn + b * cs, gamut);
    vec2 down = ok_cusp_at(a * cs + b * sn, b * cs - a * sn, gamut);
    if (up.y > best.y) {
        best = up;
    }
    if (down.y > best.y) {
        best = down;
    }
    return best;
}

float ok_find_gamut_intersection(float a, float b, float l1, float c1, float l0, vec2 cusp, int gamut) {
    if ((l1 - l0) * cusp.y - (cusp.x - l0) * c1 <= 0.0) {
        return cusp.y * l0 / (c1 * cusp.x + cusp.y * (l0 - l1));
    }

    float t = cusp.y * (l0 - 1.0) / (c1 * (cusp.x - 1.0) + cusp.y * (l0 - l1));
    vec3 k = ok_lms_slopes(a, b);
    vec3 dt = vec3(l1 - l0) + c1 * k;
    for (int i = 0; i < OK_HALLEY_STEPS; i++) {
        float lightness = l0 * (1.0 - t) + t * l1;
        float chroma = t * c1;
        vec3 p = vec3(lightness) + chroma * k;
        vec3 f = ok_lms_to_linear(p * p * p, gamut) - vec3(1.0);
        vec3 f1 = ok_lms_to_linear(3.0 * dt * p * p, gamut);
        vec3 f2 = ok_lms_to_linear(6.0 * dt * dt * p, gamut);
        vec3 u = f1 / (f1 * f1 - 0.5 * f * f2);
        vec3 step_t = -f * u;
        float tr = u.x >= 0.0 ? step_t.x : OK_FLT_MAX;
        float tg = u.y >= 0.0 ? step_t.y : OK_FLT_MAX;
        float tb = u.z >= 0.0 ? step_t.z : OK_FLT_MAX;
        t = t + min(tr, min(tg, tb));
    }
    return t;
}

float ok_max_chroma(float lightness, float a, float b, int gamut) {
    if (lightness <= 0.0 || lightness >= 1.0) {
        return 0.0;
    }
    vec2 cusp = ok_find_gamut_cusp(a, b, gamut);
    return max(ok_find_gamut_intersection(a, b, lightness, 1.0, lightness, cusp, gamut), 0.0);
}

vec3 ok_okhsl_to_lch(float hue, float saturation, float lightness) {
    float h = radians(hue);
    float limit = ok_max_chroma(lightness, cos(h), sin(h), GAMUT_SRGB);
    return vec3(lightness, max(max(saturation, 0.0) * limit, 0.0), hue);
}

// Hue ring: x in [0, 1] sweeps the full hue circle at a fixed L and C.
vec3 hue_ring_pixel(float x, float lightness, float chroma, int colorspace) {
    int gamut = ok_gamut_for(colorspace);
    float hue = 360.0 * x;
    float h = radians(hue);
    float c = min(chroma, ok_max_chroma(lightness, cos(h), sin(h), gamut));
    return ok_lch_to_rgb(vec3(lightness, c, hue), gamut, true);
}

// Gamut square: x is lightness, y is chroma (or OKHSL saturation), origin bottom-left.
vec3 gamut_square_pixel(vec2 xy, float hue, int colorspace, float max_chroma, vec2 cusp) {
    vec3 white = vec3(1.0);
    if (colorspace == COLORSPACE_OKHSL) {
        vec3 hsl = ok_lch_to_rgb(ok_okhsl_to_lch(hue, xy.y, xy.x), GAMUT_SRGB, false);
        if (ok_max3(hsl) > OK_OUT_OF_GAMUT) {
            return white;
        }
        return clamp(hsl, vec3(0.0), vec3(1.0));
    }

    int gamut = ok_gamut_for(colorspace);
    float l = xy.x;
    float c = xy.y * max_chroma;
    float c_range = cusp.y / max_chroma;
    float y_threshold = c_range * l / cusp.x;
    vec3 rgb = ok_lch_to_rgb(vec3(l, c, hue), gamut, false);
    if (xy.y > y_threshold * (1.0 + OK_SQUARE_THRESHOLD_TOLERANCE) || ok_max3(rgb) > OK_OUT_OF_GAMUT) {
        return white;
    }
    return max(rgb, vec3(0.0));
}
";
