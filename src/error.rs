//! Error types for the field host.
//!
//! Only two failure families are errors at all: a lifecycle step rejected by
//! the SDK, and a rejected tokenization. A continuation resolving after its
//! generation was cancelled is silently discarded, and a guarded submit
//! (no ready instance, or one already in flight) is an expected transient
//! state, not an error.

use thiserror::Error;

use crate::config::ConfigError;
use crate::sdk::SdkError;

/// Lifecycle step that rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    Create,
    Attach,
    Focus,
    Configure,
}

impl SetupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupStage::Create => "create",
            SetupStage::Attach => "attach",
            SetupStage::Focus => "focus",
            SetupStage::Configure => "configure",
        }
    }
}

impl std::fmt::Display for SetupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the field host.
#[derive(Debug, Error)]
pub enum FieldError {
    /// A create/attach/focus/configure call rejected. The generation's
    /// initialization is aborted and the submit control stays disabled.
    #[error("field {stage} failed: {source}")]
    Setup {
        stage: SetupStage,
        #[source]
        source: SdkError,
    },

    /// The tokenize call rejected. Absorbed locally; the external callback
    /// is never invoked with a failed result.
    #[error("tokenization failed: {0}")]
    Tokenization(#[source] SdkError),

    /// Host configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl FieldError {
    pub fn setup(stage: SetupStage, source: SdkError) -> Self {
        FieldError::Setup { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_error_names_its_stage() {
        let err = FieldError::setup(SetupStage::Attach, SdkError::new("mount missing"));
        assert_eq!(err.to_string(), "field attach failed: mount missing");
    }

    #[test]
    fn tokenization_error_message() {
        let err = FieldError::Tokenization(SdkError::new("card declined"));
        assert_eq!(err.to_string(), "tokenization failed: card declined");
    }
}
