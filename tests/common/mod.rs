//! Shared test utilities and the fake SDK.

#![allow(dead_code, unused_imports)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::Notify;

use payfield::sdk::{CardField, EventHandler, FocusTarget, PaymentsClient, SdkError, TokenResult};
use payfield::tokenize::TokenCallback;

/// Chronological record of every call the fakes receive.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count_of(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Index of the first call starting with `prefix`.
    pub fn position_of(&self, prefix: &str) -> Option<usize> {
        self.calls
            .lock()
            .iter()
            .position(|call| call.starts_with(prefix))
    }
}

/// Holds an async fake operation until opened, once per `open_one` call.
#[derive(Clone, Default)]
pub struct Gate {
    notify: Arc<Notify>,
}

impl Gate {
    pub fn open_one(&self) {
        self.notify.notify_one();
    }

    pub async fn pass(&self) {
        self.notify.notified().await;
    }
}

#[derive(Clone, Default)]
struct FakeSettings {
    create_gate: Option<Gate>,
    focus_gate: Option<Gate>,
    tokenize_gate: Option<Gate>,
    fail_create: bool,
    fail_attach: bool,
    fail_focus: bool,
    fail_tokenize: bool,
}

/// Builder for a fake payments client with scriptable gates and failures.
#[derive(Default)]
pub struct FakeSdkBuilder {
    settings: FakeSettings,
}

impl FakeSdkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `create_card_field` until the gate is opened.
    pub fn gate_create(mut self, gate: Gate) -> Self {
        self.settings.create_gate = Some(gate);
        self
    }

    /// Hold `focus` until the gate is opened.
    pub fn gate_focus(mut self, gate: Gate) -> Self {
        self.settings.focus_gate = Some(gate);
        self
    }

    /// Hold `tokenize` until the gate is opened. The call is recorded
    /// before the gate so in-flight submissions are observable.
    pub fn gate_tokenize(mut self, gate: Gate) -> Self {
        self.settings.tokenize_gate = Some(gate);
        self
    }

    pub fn fail_create(mut self) -> Self {
        self.settings.fail_create = true;
        self
    }

    pub fn fail_attach(mut self) -> Self {
        self.settings.fail_attach = true;
        self
    }

    pub fn fail_focus(mut self) -> Self {
        self.settings.fail_focus = true;
        self
    }

    pub fn fail_tokenize(mut self) -> Self {
        self.settings.fail_tokenize = true;
        self
    }

    pub fn build(self) -> (Arc<FakeClient>, CallLog) {
        let log = CallLog::default();
        let client = Arc::new(FakeClient {
            log: log.clone(),
            settings: self.settings,
        });
        (client, log)
    }
}

pub struct FakeClient {
    log: CallLog,
    settings: FakeSettings,
}

#[async_trait]
impl PaymentsClient for FakeClient {
    async fn create_card_field(
        &self,
        options: Map<String, Value>,
    ) -> Result<Box<dyn CardField>, SdkError> {
        if let Some(gate) = &self.settings.create_gate {
            gate.pass().await;
        }
        self.log.record(format!("create {}", Value::Object(options)));
        if self.settings.fail_create {
            return Err(SdkError::new("create rejected"));
        }
        Ok(Box::new(FakeField {
            log: self.log.clone(),
            settings: self.settings.clone(),
            destroyed: AtomicBool::new(false),
        }))
    }
}

pub struct FakeField {
    log: CallLog,
    settings: FakeSettings,
    destroyed: AtomicBool,
}

impl FakeField {
    fn assert_live(&self, op: &str) {
        assert!(
            !self.destroyed.load(Ordering::SeqCst),
            "{op} called on a destroyed field"
        );
    }
}

#[async_trait]
impl CardField for FakeField {
    async fn attach(&self, mount_selector: &str) -> Result<(), SdkError> {
        self.assert_live("attach");
        self.log.record(format!("attach {mount_selector}"));
        if self.settings.fail_attach {
            return Err(SdkError::new("attach rejected"));
        }
        Ok(())
    }

    async fn focus(&self, target: FocusTarget) -> Result<(), SdkError> {
        self.assert_live("focus");
        if let Some(gate) = &self.settings.focus_gate {
            gate.pass().await;
        }
        self.log.record(format!("focus {}", target.as_str()));
        if self.settings.fail_focus {
            return Err(SdkError::new("focus rejected"));
        }
        Ok(())
    }

    async fn configure(&self, options: Map<String, Value>) -> Result<(), SdkError> {
        self.assert_live("configure");
        self.log
            .record(format!("configure {}", Value::Object(options)));
        Ok(())
    }

    async fn tokenize(&self) -> Result<TokenResult, SdkError> {
        self.assert_live("tokenize");
        self.log.record("tokenize");
        if let Some(gate) = &self.settings.tokenize_gate {
            gate.pass().await;
        }
        if self.settings.fail_tokenize {
            return Err(SdkError::new("tokenize rejected"));
        }
        Ok(TokenResult {
            token: "tok-fake-1".to_string(),
            buyer_details: None,
        })
    }

    async fn destroy(&self) -> Result<(), SdkError> {
        self.destroyed.store(true, Ordering::SeqCst);
        self.log.record("destroy");
        Ok(())
    }

    fn add_event_listener(&self, event_type: &str, _handler: EventHandler) {
        self.assert_live("add_event_listener");
        self.log.record(format!("listen {event_type}"));
    }

    fn recalculate_size(&self) {
        self.assert_live("recalculate_size");
        self.log.record("recalculate_size");
    }
}

/// Callback that stores every forwarded tokenization result.
pub fn token_sink() -> (TokenCallback, Arc<Mutex<Vec<TokenResult>>>) {
    let store: Arc<Mutex<Vec<TokenResult>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = store.clone();
    let callback: TokenCallback = Arc::new(move |result| {
        sink.lock().push(result);
    });
    (callback, store)
}

/// Let spawned tasks make progress up to their next gate.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
