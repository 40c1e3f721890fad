//! View models for the submit control and the mount container.
//!
//! The host is headless; what it renders is data. The default control is a
//! button whose disabled state tracks the lifecycle, and callers may
//! substitute their own control by supplying a render function that
//! receives the same bound state. Exactly one of the two is active per
//! render.

/// Marker attribute carried by the mount container, observable by tests and
/// the enclosing context.
pub const MOUNT_MARKER_ATTR: &str = "data-payfield-mount";

/// Default DOM id of the submit button.
pub const DEFAULT_BUTTON_ID: &str = "payfield-submit";

/// Bound control state handed to whichever control renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmitControl {
    /// False whenever no instance is ready or a submission is in flight.
    pub enabled: bool,
}

/// Caller overrides for the default button.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonProps {
    pub id: Option<String>,
    pub label: Option<String>,
}

/// The rendered submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub id: String,
    pub label: String,
    pub disabled: bool,
}

/// Caller-supplied control constructor, replacing the default button.
pub type RenderFn = Box<dyn Fn(SubmitControl) -> ButtonView + Send + Sync>;

/// Selects between the default button and a caller-supplied control.
#[derive(Default)]
pub struct RenderSlot {
    children: Option<RenderFn>,
    button_props: ButtonProps,
    default_label: String,
}

impl RenderSlot {
    pub fn new(
        children: Option<RenderFn>,
        button_props: Option<ButtonProps>,
        default_label: &str,
    ) -> Self {
        Self {
            children,
            button_props: button_props.unwrap_or_default(),
            default_label: default_label.to_string(),
        }
    }

    /// Renders the active control for the given bound state.
    pub fn render(&self, control: SubmitControl) -> ButtonView {
        match &self.children {
            Some(children) => children(control),
            None => ButtonView {
                id: self
                    .button_props
                    .id
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BUTTON_ID.to_string()),
                label: self
                    .button_props
                    .label
                    .clone()
                    .unwrap_or_else(|| self.default_label.clone()),
                disabled: !control.enabled,
            },
        }
    }
}

/// Attributes of the mount container: a stable DOM id plus the marker.
pub fn container_attributes(mount_id: &str) -> Vec<(String, String)> {
    vec![
        ("id".to_string(), mount_id.to_string()),
        (MOUNT_MARKER_ATTR.to_string(), "true".to_string()),
    ]
}
