//! Per-pixel picker kernels.
//!
//! Both kernels are assembled from three pieces:
//!
//! ```text
//!   HEADER (uniform block + varyings) ─┐
//!   KERNEL_LIBRARY (shared color math) ├─▶ vertex / fragment GLSL ─▶ naga ─▶ wgpu
//!   stage body (per kernel)           ─┘
//! ```
//!
//! `cpu` evaluates the same library in Rust for pixel lookups and the
//! software backend.

pub mod cpu;
mod library;

pub use library::{KERNEL_LIBRARY, KERNEL_LIBRARY_VERSION};

use crate::types::SurfaceKind;

/// Composed GLSL for one kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSource {
    pub kind: SurfaceKind,
    pub vertex: String,
    pub fragment: String,
}

impl KernelSource {
    pub fn for_kind(kind: SurfaceKind) -> Self {
        let (vertex_body, fragment_body) = match kind {
            SurfaceKind::HueRing => (RING_VERTEX_BODY, RING_FRAGMENT_BODY),
            SurfaceKind::GamutSquare => (SQUARE_VERTEX_BODY, SQUARE_FRAGMENT_BODY),
        };
        Self {
            kind,
            vertex: compose(VERTEX_HEADER, vertex_body),
            fragment: compose(FRAGMENT_HEADER, fragment_body),
        }
    }
}

fn compose(header: &str, body: &str) -> String {
    format!("{PRELUDE}{header}\n{KERNEL_LIBRARY}\n{body}")
}

/// Uniform block layout must match [`crate::gpu::KernelUniforms`].
const PRELUDE: &str = r"#version 450
layout(std140, set = 0, binding = 0) uniform KernelParams {
    vec2 resolution;
    float hue;
    int colorspace;
    float ring_lightness;
    float ring_chroma;
    float max_chroma;
    float _padding;
} ubo;
";

const VERTEX_HEADER: &str = r"layout(location = 0) in vec2 a_position;
layout(location = 0) out vec2 v_uv;
layout(location = 1) flat out vec2 v_cusp;
";

const FRAGMENT_HEADER: &str = r"layout(location = 0) in vec2 v_uv;
layout(location = 1) flat in vec2 v_cusp;
layout(location = 0) out vec4 outColor;
";

const RING_VERTEX_BODY: &str = r"void main() {
    v_uv = a_position * 0.5 + vec2(0.5);
    v_cusp = vec2(0.0);
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

// The cusp only depends on hue, so it is solved once per vertex.
const SQUARE_VERTEX_BODY: &str = r"void main() {
    float h = radians(ubo.hue);
    v_cusp = ok_find_gamut_cusp(cos(h), sin(h), ok_gamut_for(ubo.colorspace));
    v_uv = a_position * 0.5 + vec2(0.5);
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

const RING_FRAGMENT_BODY: &str = r"void main() {
    float x = gl_FragCoord.x / ubo.resolution.x;
    vec3 rgb = hue_ring_pixel(x, ubo.ring_lightness, ubo.ring_chroma, ubo.colorspace);
    outColor = vec4(rgb, 1.0);
}
";

const SQUARE_FRAGMENT_BODY: &str = r"void main() {
    vec2 xy = vec2(gl_FragCoord.x, ubo.resolution.y - gl_FragCoord.y) / ubo.resolution;
    vec3 rgb = gamut_square_pixel(xy, ubo.hue, ubo.colorspace, ubo.max_chroma, v_cusp);
    outColor = vec4(rgb, 1.0);
}
";

/// Two triangles covering clip space, six vertices.
pub const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_stages_share_library_and_uniforms() {
        for kind in [SurfaceKind::HueRing, SurfaceKind::GamutSquare] {
            let source = KernelSource::for_kind(kind);
            for stage in [&source.vertex, &source.fragment] {
                assert!(stage.starts_with("#version 450"));
                assert!(stage.contains("uniform KernelParams"));
                assert!(stage.contains(&format!(
                    "okpicker kernel library v{KERNEL_LIBRARY_VERSION}"
                )));
            }
        }
    }

    #[test]
    fn square_vertex_stage_solves_cusp() {
        let source = KernelSource::for_kind(SurfaceKind::GamutSquare);
        assert!(source.vertex.contains("v_cusp = ok_find_gamut_cusp"));
        assert!(source.fragment.contains("gamut_square_pixel(xy"));
    }

    #[test]
    fn library_widens_cusp_and_threshold() {
        assert!(KERNEL_LIBRARY.contains("ok_cusp_at(a * cs - b * sn"));
        assert!(KERNEL_LIBRARY.contains("y_threshold * (1.0 + OK_SQUARE_THRESHOLD_TOLERANCE)"));
    }

    #[test]
    fn library_version_matches_banner() {
        assert!(KERNEL_LIBRARY.starts_with(&format!(
            "// okpicker kernel library v{KERNEL_LIBRARY_VERSION}"
        )));
    }
}
