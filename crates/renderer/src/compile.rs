use std::borrow::Cow;

use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{Module, ShaderStage};

use crate::error::{RenderError, ShaderStageKind};
use crate::kernel::KernelSource;
use crate::types::SurfaceKind;

/// Parses and validates picker kernels before they reach a device.
///
/// `wgpu` only reports GLSL problems through its uncaptured-error handler, so
/// every kernel is run through the naga front end and validator first. That
/// turns a bad kernel into a [`RenderError::Compile`] carrying the annotated
/// source location instead of a panic on pipeline creation.
#[derive(Debug, Default)]
pub struct ShaderProgramBuilder {
    frontend: Frontend,
}

/// Both stages of one kernel, validated.
#[derive(Debug)]
pub struct ValidatedProgram {
    pub kind: SurfaceKind,
    pub vertex: Module,
    pub fragment: Module,
}

impl ShaderProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&mut self, source: &KernelSource) -> Result<ValidatedProgram, RenderError> {
        let vertex = self.validate_stage(source.kind, ShaderStageKind::Vertex, &source.vertex)?;
        let fragment =
            self.validate_stage(source.kind, ShaderStageKind::Fragment, &source.fragment)?;
        link_check(source.kind, &vertex, &fragment)?;
        tracing::debug!(
            program = %source.kind,
            vertex_functions = vertex.functions.len(),
            fragment_functions = fragment.functions.len(),
            "validated picker kernel"
        );
        Ok(ValidatedProgram {
            kind: source.kind,
            vertex,
            fragment,
        })
    }

    fn validate_stage(
        &mut self,
        program: SurfaceKind,
        stage: ShaderStageKind,
        source: &str,
    ) -> Result<Module, RenderError> {
        let naga_stage = match stage {
            ShaderStageKind::Fragment => ShaderStage::Fragment,
            _ => ShaderStage::Vertex,
        };
        let module = self
            .frontend
            .parse(&Options::from(naga_stage), source)
            .map_err(|err| RenderError::Compile {
                program,
                stage,
                message: err.emit_to_string(source),
            })?;
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|err| RenderError::Compile {
                program,
                stage,
                message: err.emit_to_string(source),
            })?;
        Ok(module)
    }
}

/// Every fragment input location must be written by the vertex stage.
fn link_check(program: SurfaceKind, vertex: &Module, fragment: &Module) -> Result<(), RenderError> {
    let outputs = stage_locations(vertex, true);
    for location in stage_locations(fragment, false) {
        if !outputs.contains(&location) {
            return Err(RenderError::Compile {
                program,
                stage: ShaderStageKind::Link,
                message: format!("fragment input at location {location} has no vertex output"),
            });
        }
    }
    Ok(())
}

fn stage_locations(module: &Module, outputs: bool) -> Vec<u32> {
    use wgpu::naga::{Binding, TypeInner};

    let Some(entry) = module.entry_points.first() else {
        return Vec::new();
    };
    let mut bindings = Vec::new();
    if outputs {
        if let Some(result) = entry.function.result.as_ref() {
            match (&result.binding, &module.types[result.ty].inner) {
                (Some(binding), _) => bindings.push(binding.clone()),
                (None, TypeInner::Struct { members, .. }) => {
                    bindings.extend(members.iter().filter_map(|member| member.binding.clone()));
                }
                _ => {}
            }
        }
    } else {
        for argument in &entry.function.arguments {
            match (&argument.binding, &module.types[argument.ty].inner) {
                (Some(binding), _) => bindings.push(binding.clone()),
                (None, TypeInner::Struct { members, .. }) => {
                    bindings.extend(members.iter().filter_map(|member| member.binding.clone()));
                }
                _ => {}
            }
        }
    }
    bindings
        .into_iter()
        .filter_map(|binding| match binding {
            Binding::Location { location, .. } => Some(location),
            Binding::BuiltIn(_) => None,
        })
        .collect()
}

pub(crate) fn create_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: ShaderStage,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage,
            defines: &[],
        },
    })
}

/// Full-screen triangle; the host narrows it to a canvas with the viewport.
pub(crate) const BLIT_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

pub(crate) const BLIT_FRAGMENT_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D canvas_texture;
layout(set = 0, binding = 1) uniform sampler canvas_sampler;

void main() {
    outColor = texture(sampler2D(canvas_texture, canvas_sampler), v_uv);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_kernels_validate() {
        let mut builder = ShaderProgramBuilder::new();
        for kind in [SurfaceKind::HueRing, SurfaceKind::GamutSquare] {
            let program = builder.validate(&KernelSource::for_kind(kind)).unwrap();
            assert_eq!(program.kind, kind);
            assert_eq!(program.vertex.entry_points.len(), 1);
            assert_eq!(program.fragment.entry_points.len(), 1);
        }
    }

    #[test]
    fn syntax_error_reports_stage() {
        let mut source = KernelSource::for_kind(SurfaceKind::HueRing);
        source.fragment = source.fragment.replace("outColor = vec4(rgb, 1.0);", "outColor = ;");
        let err = ShaderProgramBuilder::new().validate(&source).unwrap_err();
        match err {
            RenderError::Compile { program, stage, .. } => {
                assert_eq!(program, SurfaceKind::HueRing);
                assert_eq!(stage, ShaderStageKind::Fragment);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ShaderProgramBuilder::new()
            .validate(&source)
            .unwrap_err()
            .is_fatal());
    }

    #[test]
    fn missing_varying_fails_link() {
        let mut source = KernelSource::for_kind(SurfaceKind::GamutSquare);
        source.fragment = source.fragment.replace(
            "layout(location = 1) flat in vec2 v_cusp;",
            "layout(location = 3) flat in vec2 v_cusp;",
        );
        let err = ShaderProgramBuilder::new().validate(&source).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Compile {
                stage: ShaderStageKind::Link,
                ..
            }
        ));
    }

    #[test]
    fn blit_shaders_validate() {
        let mut frontend = Frontend::default();
        for (stage, source) in [
            (ShaderStage::Vertex, BLIT_VERTEX_GLSL),
            (ShaderStage::Fragment, BLIT_FRAGMENT_GLSL),
        ] {
            let module = frontend.parse(&Options::from(stage), source).unwrap();
            Validator::new(ValidationFlags::all(), Capabilities::all())
                .validate(&module)
                .unwrap();
        }
    }
}
