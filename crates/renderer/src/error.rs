use std::fmt;

use crate::types::SurfaceKind;

/// Shader stage a compile diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
    Link,
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStageKind::Vertex => f.write_str("vertex"),
            ShaderStageKind::Fragment => f.write_str("fragment"),
            ShaderStageKind::Link => f.write_str("link"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid surface configuration: {0}")]
    Configuration(String),
    #[error("failed to compile {program} {stage} shader: {message}")]
    Compile {
        program: SurfaceKind,
        stage: ShaderStageKind,
        message: String,
    },
    #[error("{operation} expects normalized coordinates in [0, 1], got ({x}, {y})")]
    Domain {
        operation: &'static str,
        x: f32,
        y: f32,
    },
    #[error("failed to acquire GPU context: {0}")]
    Context(String),
    #[error("draw failed: {0}")]
    Draw(String),
    #[error("surface has been disposed")]
    Disposed,
}

impl RenderError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        RenderError::Configuration(message.into())
    }

    /// True for errors that leave the surface unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RenderError::Configuration(_)
                | RenderError::Compile { .. }
                | RenderError::Context(_)
                | RenderError::Disposed
        )
    }
}
