//! Headless host for a tokenization-SDK payment entry field.
//!
//! The third-party SDK hands out an opaque field object that must be
//! created, attached to a mount point, configured, and focused before it is
//! usable — four asynchronous calls whose ordering matters and whose
//! results may arrive after the surrounding context has already moved on.
//! This crate owns that handshake:
//!
//! - [`lifecycle`] sequences create → attach → focus under per-generation
//!   cancellation tokens, so a stale continuation can never overwrite the
//!   state of the generation that superseded it.
//! - [`options`] derives the field configuration from raw props and only
//!   pushes it to the live instance when its identity actually changed.
//! - [`tokenize`] guards the submit action against re-entry and premature
//!   invocation.
//! - [`events`] registers caller handlers on the live instance exactly once
//!   per (instance, event type).
//! - [`render`] models the submit control whose enabled state tracks the
//!   lifecycle, with a render-function escape hatch for custom controls.
//! - [`host`] ties it all together as a reactive effect keyed on the
//!   payments client identity and the mount id.
//!
//! The SDK itself is only ever seen through the traits in [`sdk`], so tests
//! drive the whole machine with fakes.

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod options;
pub mod render;
pub mod sdk;
pub mod tokenize;

pub use config::{ConfigError, HostConfig};
pub use error::{FieldError, SetupStage};
pub use events::{EventBridge, EventSubscriptionMap};
pub use host::{CardFieldHost, CardFieldProps, RecalculateSizeHook};
pub use lifecycle::{FieldHandle, FieldLifecycleCoordinator, GenerationToken, LifecyclePhase};
pub use options::{FieldOptions, OptionsReconciler};
pub use render::{ButtonProps, ButtonView, RenderFn, RenderSlot, SubmitControl};
pub use sdk::{CardField, EventHandler, FocusTarget, PaymentsClient, SdkError, TokenResult};
pub use tokenize::{TokenCallback, TokenizationController};
