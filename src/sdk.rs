//! Boundary traits for the third-party tokenization SDK.
//!
//! The SDK is opaque to this crate: the coordinator, controller, and event
//! bridge only ever see the narrow capability surface defined here, so tests
//! (and alternative SDKs) can substitute fakes behind `Arc<dyn CardField>`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Opaque failure reported by the SDK.
///
/// The SDK's own error shape is not part of this crate's contract; only the
/// message survives the boundary.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SdkError {
    message: String,
}

impl SdkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sub-field of the payment entry that can receive input focus.
///
/// Wire names follow the SDK's field identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusTarget {
    CardNumber,
    ExpirationDate,
    Cvv,
    PostalCode,
}

impl FocusTarget {
    /// The designated primary field.
    pub const PRIMARY: FocusTarget = FocusTarget::CardNumber;

    pub fn as_str(&self) -> &'static str {
        match self {
            FocusTarget::CardNumber => "cardNumber",
            FocusTarget::ExpirationDate => "expirationDate",
            FocusTarget::Cvv => "cvv",
            FocusTarget::PostalCode => "postalCode",
        }
    }
}

/// Result of a successful tokenization.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenResult {
    /// The opaque, single-use payment token.
    pub token: String,
    /// Verification details about the buyer, when the SDK supplies them.
    pub buyer_details: Option<Value>,
}

/// Handler invoked by the SDK when a field event fires.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// The live, SDK-managed payment field.
///
/// Exactly one live instance exists per host at any time; the lifecycle
/// coordinator owns creation and destruction, everyone else only calls the
/// operations below.
#[async_trait]
pub trait CardField: Send + Sync {
    /// Attach the field to the DOM node named by `mount_selector` (`#<id>`).
    async fn attach(&self, mount_selector: &str) -> Result<(), SdkError>;

    /// Move input focus to a sub-field.
    async fn focus(&self, target: FocusTarget) -> Result<(), SdkError>;

    /// Push a configuration map to the live field.
    async fn configure(&self, options: Map<String, Value>) -> Result<(), SdkError>;

    /// Convert the entered payment details into a single-use token.
    async fn tokenize(&self) -> Result<TokenResult, SdkError>;

    /// Tear the field down. No operation may be issued after this.
    async fn destroy(&self) -> Result<(), SdkError>;

    /// Subscribe a handler to a native field event.
    fn add_event_listener(&self, event_type: &str, handler: EventHandler);

    /// Ask the field to re-measure itself. Exposed to the collaborator; the
    /// core never calls this itself.
    fn recalculate_size(&self);
}

/// Produces card field instances. Supplied by the enclosing payment context.
#[async_trait]
pub trait PaymentsClient: Send + Sync {
    async fn create_card_field(
        &self,
        options: Map<String, Value>,
    ) -> Result<Box<dyn CardField>, SdkError>;
}

/// CSS selector for a mount id.
pub fn mount_selector(mount_id: &str) -> String {
    format!("#{mount_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_target_wire_names() {
        assert_eq!(FocusTarget::CardNumber.as_str(), "cardNumber");
        assert_eq!(FocusTarget::ExpirationDate.as_str(), "expirationDate");
        assert_eq!(FocusTarget::Cvv.as_str(), "cvv");
        assert_eq!(FocusTarget::PostalCode.as_str(), "postalCode");
        assert_eq!(FocusTarget::PRIMARY, FocusTarget::CardNumber);
    }

    #[test]
    fn focus_target_serde_round_trip() {
        let json = serde_json::to_string(&FocusTarget::PostalCode).unwrap();
        assert_eq!(json, "\"postalCode\"");
        let parsed: FocusTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, FocusTarget::PostalCode);
    }

    #[test]
    fn mount_selector_prefixes_hash() {
        assert_eq!(mount_selector("payfield-card"), "#payfield-card");
    }
}
