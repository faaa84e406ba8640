//! Setup error types
//!
//! Every failure while creating the manual pass's GPU resources is fatal:
//! the coordinator never starts drawing with half-built handles.

use std::fmt;

/// Error raised while setting up GPU resources for the manual pass
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// No usable GPU context (no adapter, device request failed, surface creation failed)
    ContextUnavailable(String),
    /// A buffer could not be created or filled
    BufferCreation {
        label: String,
        reason: String,
    },
    /// A shader stage failed to compile
    ShaderCompile {
        label: String,
        log: String,
    },
    /// The compiled stages could not be linked into a program
    ProgramLink {
        label: String,
        log: String,
    },
    /// A uniform or attribute the pass needs does not exist in the linked program
    MissingBinding(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::ContextUnavailable(msg) => write!(f, "GPU context unavailable: {}", msg),
            SetupError::BufferCreation { label, reason } => {
                write!(f, "Failed to create buffer '{}': {}", label, reason)
            }
            SetupError::ShaderCompile { label, log } => {
                write!(f, "Shader compile failed for '{}': {}", label, log)
            }
            SetupError::ProgramLink { label, log } => {
                write!(f, "Program link failed for '{}': {}", label, log)
            }
            SetupError::MissingBinding(name) => write!(f, "Program has no binding named '{}'", name),
        }
    }
}

impl std::error::Error for SetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_unavailable_display() {
        let err = SetupError::ContextUnavailable("no adapter".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("unavailable"));
        assert!(msg.contains("no adapter"));
    }

    #[test]
    fn test_buffer_creation_display() {
        let err = SetupError::BufferCreation {
            label: "cube indices".to_string(),
            reason: "out of memory".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("cube indices"));
        assert!(msg.contains("out of memory"));
    }

    #[test]
    fn test_shader_errors_display() {
        let compile = SetupError::ShaderCompile {
            label: "cube".to_string(),
            log: "expected ';'".to_string(),
        };
        assert!(format!("{}", compile).contains("compile failed"));

        let link = SetupError::ProgramLink {
            label: "cube".to_string(),
            log: "entry point missing".to_string(),
        };
        assert!(format!("{}", link).contains("link failed"));
    }

    #[test]
    fn test_missing_binding_display() {
        let err = SetupError::MissingBinding("Pmatrix".to_string());
        assert_eq!(format!("{}", err), "Program has no binding named 'Pmatrix'");
    }

    #[test]
    fn test_error_trait_object() {
        let err: Box<dyn std::error::Error> = Box::new(SetupError::MissingBinding("color".into()));
        assert!(err.source().is_none());
    }
}
