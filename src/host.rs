//! The composite card field host.
//!
//! `CardFieldHost` wires the options reconciler, lifecycle coordinator,
//! tokenization controller, event bridge, and render slot together and
//! drives them as a reactive effect: every [`update`](CardFieldHost::update)
//! hands in the current payments client and props, and the host decides
//! whether that means a fresh lifecycle generation (client identity or
//! mount id changed) or an in-place reconciliation of the live instance.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::HostConfig;
use crate::error::FieldError;
use crate::events::{EventBridge, EventSubscriptionMap};
use crate::lifecycle::{FieldHandle, FieldLifecycleCoordinator, LifecyclePhase};
use crate::options::{FieldOptions, OptionsReconciler};
use crate::render::{container_attributes, ButtonProps, ButtonView, RenderFn, RenderSlot, SubmitControl};
use crate::sdk::{FocusTarget, PaymentsClient};
use crate::tokenize::{TokenCallback, TokenizationController};

/// Hook receiving the live instance's re-measure capability once it exists.
pub type RecalculateSizeHook = Arc<dyn Fn(FieldHandle) + Send + Sync>;

/// Props accepted by the host. One value per update; the host derives the
/// configuration and decides what actually changed.
#[derive(Default)]
pub struct CardFieldProps {
    /// Sub-field to focus after attach. `None` means no forced focus.
    pub focus: Option<FocusTarget>,
    /// Mount container id; falls back to the configured default.
    pub id: Option<String>,
    pub include_input_labels: Option<bool>,
    pub postal_code: Option<String>,
    pub style: Option<Value>,
    /// Receives the re-measure hook once an instance is live. The core
    /// exposes the hook but never invokes it.
    pub recalculate_size: Option<RecalculateSizeHook>,
    pub button_props: Option<ButtonProps>,
    pub callbacks: EventSubscriptionMap,
    /// Custom control constructor replacing the default button.
    pub children: Option<RenderFn>,
}

impl CardFieldProps {
    /// Props pre-filled with the configured defaults.
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            focus: config.default_focus,
            include_input_labels: config.include_input_labels.then_some(true),
            ..Self::default()
        }
    }
}

struct HostState {
    client: Option<Arc<dyn PaymentsClient>>,
    mount_id: Option<String>,
    reconciler: OptionsReconciler,
    /// Most recently derived configuration, so a handshake that settles
    /// after further prop changes can catch up.
    latest_options: FieldOptions,
    latest_callbacks: EventSubscriptionMap,
    focus: Option<FocusTarget>,
    /// Last (instance, target) pair a focus request was issued for.
    last_focus: Option<(Uuid, FocusTarget)>,
    slot: RenderSlot,
}

/// Headless host for one SDK-bound payment entry field.
pub struct CardFieldHost {
    config: HostConfig,
    coordinator: FieldLifecycleCoordinator,
    controller: TokenizationController,
    bridge: Arc<EventBridge>,
    state: Arc<Mutex<HostState>>,
}

impl CardFieldHost {
    pub fn new(on_token: TokenCallback, config: HostConfig) -> Self {
        let coordinator = FieldLifecycleCoordinator::new();
        let controller = TokenizationController::new(coordinator.clone(), on_token);
        let state = HostState {
            client: None,
            mount_id: None,
            reconciler: OptionsReconciler::new(),
            latest_options: FieldOptions::default(),
            latest_callbacks: EventSubscriptionMap::new(),
            focus: None,
            last_focus: None,
            slot: RenderSlot::new(None, None, &config.button_label),
        };
        Self {
            config,
            coordinator,
            controller,
            bridge: Arc::new(EventBridge::new()),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Builds a host with configuration from the default config file.
    pub fn with_default_config(on_token: TokenCallback) -> Result<Self, FieldError> {
        Ok(Self::new(on_token, HostConfig::load()?))
    }

    /// The reactive effect. Call with the current client and props whenever
    /// either may have changed.
    ///
    /// A changed client identity or mount id cancels the previous
    /// generation (destroying its instance before anything else happens)
    /// and spawns the next handshake; the returned join handle settles when
    /// that handshake does. Any other change reconciles the live instance
    /// in place: configuration is pushed only when its identity changed,
    /// focus is re-requested when the target or instance changed, and event
    /// handlers are synced idempotently.
    pub async fn update(
        &self,
        client: Arc<dyn PaymentsClient>,
        props: CardFieldProps,
    ) -> Option<JoinHandle<()>> {
        let CardFieldProps {
            focus,
            id,
            include_input_labels,
            postal_code,
            style,
            recalculate_size,
            button_props,
            callbacks,
            children,
        } = props;

        let mount_id = id.unwrap_or_else(|| self.config.default_mount_id.clone());
        let options = FieldOptions::new(include_input_labels, postal_code, style);

        let restart = {
            let mut state = self.state.lock();
            let client_changed = match &state.client {
                Some(current) => !Arc::ptr_eq(current, &client),
                None => true,
            };
            let mount_changed = state.mount_id.as_deref() != Some(mount_id.as_str());

            state.slot = RenderSlot::new(children, button_props, &self.config.button_label);
            state.focus = focus;
            state.latest_options = options.clone();
            state.latest_callbacks = callbacks.clone();

            if client_changed || mount_changed {
                state.client = Some(Arc::clone(&client));
                state.mount_id = Some(mount_id.clone());
                state.reconciler = OptionsReconciler::new();
                // Creation applies these options; don't re-push them.
                state.reconciler.mark_applied(&options);
                state.last_focus = None;
                true
            } else {
                false
            }
        };

        if restart {
            if let Some(stale) = self.coordinator.retire().await {
                self.bridge.release(stale);
            }
            let token = self.coordinator.begin();

            let coordinator = self.coordinator.clone();
            let bridge = Arc::clone(&self.bridge);
            let state = Arc::clone(&self.state);
            let handle = tokio::spawn(async move {
                let published = match coordinator
                    .start(&token, client.as_ref(), &mount_id, &options, focus)
                    .await
                {
                    Ok(Some(published)) => published,
                    // Cancelled mid-flight, or the setup failure was already
                    // logged by the coordinator; either way this generation
                    // is over and the control stays disabled.
                    Ok(None) | Err(_) => return,
                };

                // Props may have moved on while the handshake was in
                // flight; catch the instance up to the latest state.
                let (pending_options, pending_focus, callbacks) = {
                    let mut state = state.lock();
                    let latest = state.latest_options.clone();
                    let pending_options = state.reconciler.changed(&latest);
                    let pending_focus = match state.focus {
                        Some(target) => {
                            state.last_focus = Some((published.instance_id(), target));
                            (Some(target) != focus).then_some(target)
                        }
                        None => {
                            state.last_focus = None;
                            None
                        }
                    };
                    (pending_options, pending_focus, state.latest_callbacks.clone())
                };

                bridge.sync(Some(&published), &callbacks);
                if let Some(hook) = recalculate_size {
                    hook(published.clone());
                }
                if let Some(options) = pending_options {
                    if let Err(err) = coordinator.reconfigure(&options).await {
                        tracing::warn!(error = %err, "post-ready reconfigure failed");
                    }
                }
                if let Some(target) = pending_focus {
                    if let Err(err) = coordinator.refocus(target).await {
                        tracing::warn!(error = %err, "post-ready refocus failed");
                    }
                }
            });
            return Some(handle);
        }

        let field = self.coordinator.field();
        let (changed_options, refocus_target) = {
            let mut state = self.state.lock();
            let changed_options = if field.is_some() {
                state.reconciler.changed(&options)
            } else {
                // No instance yet; leave the change pending so the
                // handshake task or a later update pushes it.
                None
            };
            let refocus_target = match (field.as_ref(), focus) {
                (Some(handle), Some(target)) => {
                    let pair = (handle.instance_id(), target);
                    if state.last_focus != Some(pair) {
                        state.last_focus = Some(pair);
                        Some(target)
                    } else {
                        None
                    }
                }
                _ => None,
            };
            (changed_options, refocus_target)
        };

        if let Some(changed) = changed_options {
            if let Err(err) = self.coordinator.reconfigure(&changed).await {
                tracing::warn!(error = %err, "reconfigure failed");
            }
        }
        if let Some(target) = refocus_target {
            if let Err(err) = self.coordinator.refocus(target).await {
                tracing::warn!(error = %err, "refocus failed");
            }
        }
        self.bridge.sync(field.as_ref(), &callbacks);
        None
    }

    /// Cancels the current generation and destroys its instance.
    pub async fn unmount(&self) {
        if let Some(stale) = self.coordinator.retire().await {
            self.bridge.release(stale);
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.coordinator.phase()
    }

    /// The currently published instance, if any.
    pub fn field(&self) -> Option<FieldHandle> {
        self.coordinator.field()
    }

    /// Bound control state: enabled only with a ready instance and no
    /// submission in flight.
    pub fn control(&self) -> SubmitControl {
        SubmitControl {
            enabled: self.coordinator.phase() == LifecyclePhase::Ready
                && !self.controller.is_submitting(),
        }
    }

    /// Renders the submit control (default button or caller-supplied).
    pub fn button(&self) -> ButtonView {
        let control = self.control();
        self.state.lock().slot.render(control)
    }

    /// Attributes of the mount container, including the marker attribute.
    pub fn container_attributes(&self) -> Vec<(String, String)> {
        let state = self.state.lock();
        let mount_id = state
            .mount_id
            .as_deref()
            .unwrap_or(&self.config.default_mount_id);
        container_attributes(mount_id)
    }

    /// Tokenizes the entered details and forwards the result to the
    /// external callback. Guarded: a call with no ready instance or with a
    /// submission in flight is a silent no-op.
    pub async fn submit(&self) -> bool {
        self.controller.submit().await
    }

    /// Re-measure hook pass-through for the enclosing context.
    pub fn recalculate_size(&self) {
        if let Some(handle) = self.coordinator.field() {
            handle.recalculate_size();
        }
    }
}
