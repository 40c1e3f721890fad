//! Lifecycle coordination for the card field.
//!
//! One *generation* is one attempt at the create → attach → focus handshake.
//! Every asynchronous continuation carries a [`GenerationToken`] and checks
//! it before each side effect: a cancelled token means the continuation must
//! discard its result and destroy anything it produced, never touch shared
//! state. Cancellation is cooperative; an in-flight SDK call is not aborted,
//! its result is thrown away when it finally resolves.
//!
//! At most one live field instance exists per coordinator at any time. Only
//! the coordinator creates and destroys instances; everyone else reads the
//! published handle.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{FieldError, SetupStage};
use crate::options::FieldOptions;
use crate::sdk::{mount_selector, CardField, FocusTarget, PaymentsClient};

/// Phase of the current lifecycle generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecyclePhase {
    /// No handshake started for the current generation.
    Idle = 0,
    /// The create → attach → focus sequence is in flight.
    Initializing = 1,
    /// A live instance is published; the submit control may enable.
    Ready = 2,
    /// The generation was cancelled. Terminal until a new generation begins.
    Destroyed = 3,
}

/// Cancellation token scoped to one lifecycle generation.
///
/// Cloneable so the spawned handshake task and the coordinator share the
/// same flag. Cancelling is idempotent.
#[derive(Clone)]
pub struct GenerationToken {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl GenerationToken {
    fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!(generation = self.id, "generation cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Published handle to the live field instance.
///
/// Carries a per-instance identity so collaborators (the event bridge in
/// particular) can tell a replacement instance from the one they already
/// acted on.
#[derive(Clone)]
pub struct FieldHandle {
    instance_id: Uuid,
    generation: u64,
    field: Arc<dyn CardField>,
}

impl FieldHandle {
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn field(&self) -> &Arc<dyn CardField> {
        &self.field
    }

    /// Re-measure hook, exposed for the enclosing context. Never invoked by
    /// the core itself.
    pub fn recalculate_size(&self) {
        self.field.recalculate_size();
    }
}

/// Owns the create → attach → focus sequence and the published instance.
#[derive(Clone)]
pub struct FieldLifecycleCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    phase: AtomicU8,
    next_generation: AtomicU64,
    /// Token of the generation currently allowed to mutate shared state.
    active: Mutex<Option<GenerationToken>>,
    /// The published instance. Written only by the coordinator.
    slot: RwLock<Option<FieldHandle>>,
}

impl FieldLifecycleCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                phase: AtomicU8::new(LifecyclePhase::Idle as u8),
                next_generation: AtomicU64::new(0),
                active: Mutex::new(None),
                slot: RwLock::new(None),
            }),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        match self.inner.phase.load(Ordering::SeqCst) {
            0 => LifecyclePhase::Idle,
            1 => LifecyclePhase::Initializing,
            2 => LifecyclePhase::Ready,
            _ => LifecyclePhase::Destroyed,
        }
    }

    fn set_phase(&self, phase: LifecyclePhase) {
        self.inner.phase.store(phase as u8, Ordering::SeqCst);
        tracing::debug!(?phase, "lifecycle phase");
    }

    /// The currently published instance, if any.
    pub fn field(&self) -> Option<FieldHandle> {
        self.inner.slot.read().clone()
    }

    /// Begins a new generation, cancelling the previous one first.
    ///
    /// The caller is expected to have called [`retire`](Self::retire)
    /// beforehand so the previous instance is already destroyed; cancelling
    /// again here is a harmless no-op.
    pub fn begin(&self) -> GenerationToken {
        let mut active = self.inner.active.lock();
        if let Some(prev) = active.as_ref() {
            prev.cancel();
        }
        let id = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = GenerationToken::new(id);
        *active = Some(token.clone());
        self.set_phase(LifecyclePhase::Idle);
        token
    }

    /// Cancels the active generation and detaches the published instance,
    /// without destroying it. Safe to call when nothing is active.
    pub fn cancel_active(&self) -> Option<FieldHandle> {
        let mut active = self.inner.active.lock();
        let token = active.take()?;
        token.cancel();
        self.set_phase(LifecyclePhase::Destroyed);
        self.inner.slot.write().take()
    }

    /// Cancels the active generation and destroys the published instance.
    ///
    /// Returns the destroyed instance's identity so callers can release
    /// per-instance bookkeeping. An in-flight handshake that has not yet
    /// published observes the cancellation at its next checkpoint and
    /// destroys its own instance there.
    pub async fn retire(&self) -> Option<Uuid> {
        let handle = self.cancel_active()?;
        let instance_id = handle.instance_id();
        destroy_quietly(handle.field()).await;
        Some(instance_id)
    }

    /// Runs the create → attach → focus handshake for one generation.
    ///
    /// Returns the published handle on success, `Ok(None)` when the
    /// generation was cancelled along the way (never an error), and
    /// `Err` when an SDK call rejected. On rejection no half-initialized
    /// instance is retained: anything created is destroyed and the phase
    /// stays at a non-Ready value.
    pub async fn start(
        &self,
        token: &GenerationToken,
        client: &dyn PaymentsClient,
        mount_id: &str,
        options: &FieldOptions,
        focus: Option<FocusTarget>,
    ) -> Result<Option<FieldHandle>, FieldError> {
        if token.is_cancelled() {
            return Ok(None);
        }
        self.set_phase(LifecyclePhase::Initializing);

        let field: Arc<dyn CardField> = match client.create_card_field(options.to_map()).await {
            Ok(field) => Arc::from(field),
            Err(err) => {
                tracing::warn!(generation = token.id(), error = %err, "field create failed");
                return Err(FieldError::setup(SetupStage::Create, err));
            }
        };

        // Cancelled while creation was in flight: the result is discarded,
        // never attached.
        if token.is_cancelled() {
            destroy_quietly(&field).await;
            return Ok(None);
        }

        if let Err(err) = field.attach(&mount_selector(mount_id)).await {
            tracing::warn!(generation = token.id(), error = %err, "field attach failed");
            destroy_quietly(&field).await;
            return Err(FieldError::setup(SetupStage::Attach, err));
        }

        if token.is_cancelled() {
            destroy_quietly(&field).await;
            return Ok(None);
        }

        if let Some(target) = focus {
            if let Err(err) = field.focus(target).await {
                tracing::warn!(generation = token.id(), error = %err, "field focus failed");
                destroy_quietly(&field).await;
                return Err(FieldError::setup(SetupStage::Focus, err));
            }

            if token.is_cancelled() {
                destroy_quietly(&field).await;
                return Ok(None);
            }
        }

        let handle = FieldHandle {
            instance_id: Uuid::new_v4(),
            generation: token.id(),
            field,
        };

        // Publish under the active lock: a stale generation must never
        // overwrite the state of the one that superseded it.
        let published = {
            let active = self.inner.active.lock();
            let still_active = active
                .as_ref()
                .map(|current| current.id() == token.id())
                .unwrap_or(false);
            if still_active && !token.is_cancelled() {
                *self.inner.slot.write() = Some(handle.clone());
                true
            } else {
                false
            }
        };

        if !published {
            destroy_quietly(handle.field()).await;
            return Ok(None);
        }

        self.set_phase(LifecyclePhase::Ready);
        tracing::info!(
            generation = token.id(),
            instance = %handle.instance_id(),
            "field ready"
        );
        Ok(Some(handle))
    }

    /// Pushes a configuration to the live instance.
    ///
    /// No instance or an empty configuration is a no-op. Callers gate this
    /// through [`OptionsReconciler`](crate::options::OptionsReconciler) so
    /// it only fires when the configuration identity actually changed.
    pub async fn reconfigure(&self, options: &FieldOptions) -> Result<(), FieldError> {
        let Some(handle) = self.field() else {
            return Ok(());
        };
        if options.is_empty() {
            return Ok(());
        }
        handle.field().configure(options.to_map()).await.map_err(|err| {
            tracing::warn!(instance = %handle.instance_id(), error = %err, "field configure failed");
            FieldError::setup(SetupStage::Configure, err)
        })
    }

    /// Requests focus on the live instance.
    pub async fn refocus(&self, target: FocusTarget) -> Result<(), FieldError> {
        let Some(handle) = self.field() else {
            return Ok(());
        };
        handle.field().focus(target).await.map_err(|err| {
            tracing::warn!(instance = %handle.instance_id(), error = %err, "field focus failed");
            FieldError::setup(SetupStage::Focus, err)
        })
    }
}

impl Default for FieldLifecycleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Destruction of a discarded instance must never fail the caller.
async fn destroy_quietly(field: &Arc<dyn CardField>) {
    if let Err(err) = field.destroy().await {
        tracing::debug!(error = %err, "discarded field destroy failed");
    }
}
