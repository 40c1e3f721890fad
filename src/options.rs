//! Derivation and reconciliation of the field configuration.
//!
//! Raw props carry every knob as an `Option`; the configuration pushed to
//! the SDK must contain exactly the present keys. Absence and an explicit
//! null are different things to the SDK, so the map is built by iterating
//! the declared keys rather than serializing whatever happens to be there.

use serde_json::{Map, Value};

/// Derived field configuration. Value equality drives reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub include_input_labels: Option<bool>,
    pub postal_code: Option<String>,
    pub style: Option<Value>,
}

impl FieldOptions {
    pub fn new(
        include_input_labels: Option<bool>,
        postal_code: Option<String>,
        style: Option<Value>,
    ) -> Self {
        Self {
            include_input_labels,
            postal_code,
            style,
        }
    }

    /// True when no knob is set; an empty configuration is never pushed.
    pub fn is_empty(&self) -> bool {
        self.include_input_labels.is_none() && self.postal_code.is_none() && self.style.is_none()
    }

    /// The wire map handed to the SDK: exactly the present keys, no nulls.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(labels) = self.include_input_labels {
            map.insert("includeInputLabels".to_string(), Value::Bool(labels));
        }
        if let Some(postal_code) = &self.postal_code {
            map.insert(
                "postalCode".to_string(),
                Value::String(postal_code.clone()),
            );
        }
        if let Some(style) = &self.style {
            map.insert("style".to_string(), style.clone());
        }
        map
    }
}

/// Decides when a derived configuration should be pushed to the live field.
///
/// Hands out a configuration only when its value identity differs from the
/// last one it handed out, so repeated reconciliations with unchanged props
/// never produce spurious `configure` calls.
#[derive(Debug, Default)]
pub struct OptionsReconciler {
    last: Option<FieldOptions>,
}

impl OptionsReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configuration when it changed since the last call,
    /// `None` otherwise.
    pub fn changed(&mut self, next: &FieldOptions) -> Option<FieldOptions> {
        if self.last.as_ref() == Some(next) {
            return None;
        }
        self.last = Some(next.clone());
        Some(next.clone())
    }

    /// Marks a configuration as already applied without handing it out.
    ///
    /// Used when a new generation is created with these options, so the
    /// next reconciliation does not re-push what creation already applied.
    pub fn mark_applied(&mut self, applied: &FieldOptions) {
        self.last = Some(applied.clone());
    }
}
