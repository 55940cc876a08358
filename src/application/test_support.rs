// In-memory collaborators shared by the application tests
use crate::application::variable_provider::VariableProvider;
use crate::application::visual_binding::{StatusSink, VisualHandle, VisualHandleFactory};
use crate::domain::status::StatusReport;
use crate::domain::variable::{Variable, VariableValue};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum HandleEvent {
    Created { name: String, color: &'static str },
    Sample { name: String, formatted: String },
    Append { name: String, sample: VariableValue },
    Reset { name: String },
    Disposed { name: String },
}

#[derive(Clone, Default)]
pub struct RecordingFactory {
    events: Arc<Mutex<Vec<HandleEvent>>>,
}

impl RecordingFactory {
    pub fn events(&self) -> Vec<HandleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn created(&self) -> usize {
        self.count(|e| matches!(e, HandleEvent::Created { .. }))
    }

    pub fn disposed(&self) -> usize {
        self.count(|e| matches!(e, HandleEvent::Disposed { .. }))
    }

    pub fn appended_for(&self, name: &str) -> Vec<VariableValue> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HandleEvent::Append { name: n, sample } if n == name => Some(sample),
                _ => None,
            })
            .collect()
    }

    pub fn samples_for(&self, name: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HandleEvent::Sample { name: n, formatted } if n == name => Some(formatted),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&HandleEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

struct RecordingHandle {
    name: String,
    events: Arc<Mutex<Vec<HandleEvent>>>,
}

impl RecordingHandle {
    fn log(&self, event: HandleEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl VisualHandle for RecordingHandle {
    fn on_sample(&mut self, formatted: &str) {
        self.log(HandleEvent::Sample {
            name: self.name.clone(),
            formatted: formatted.to_string(),
        });
    }

    fn append(&mut self, sample: VariableValue) {
        self.log(HandleEvent::Append {
            name: self.name.clone(),
            sample,
        });
    }

    fn reset(&mut self) {
        self.log(HandleEvent::Reset {
            name: self.name.clone(),
        });
    }

    fn dispose(&mut self) {
        self.log(HandleEvent::Disposed {
            name: self.name.clone(),
        });
    }
}

impl VisualHandleFactory for RecordingFactory {
    fn create(&self, variable: &Variable, color: &'static str) -> Box<dyn VisualHandle> {
        self.events.lock().unwrap().push(HandleEvent::Created {
            name: variable.name.clone(),
            color,
        });
        Box::new(RecordingHandle {
            name: variable.name.clone(),
            events: self.events.clone(),
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<StatusReport>>,
    placeholder: Mutex<Vec<bool>>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<StatusReport> {
        self.reports.lock().unwrap().last().cloned()
    }

    pub fn placeholder_changes(&self) -> Vec<bool> {
        self.placeholder.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, status: &StatusReport) {
        self.reports.lock().unwrap().push(status.clone());
    }

    fn placeholder_changed(&self, visible: bool) {
        self.placeholder.lock().unwrap().push(visible);
    }
}

/// One scripted response. A gated response waits for the gate before
/// returning, which lets a test hold a fetch in flight.
pub struct Scripted {
    pub snapshot: anyhow::Result<Vec<Variable>>,
    pub gate: Option<Arc<Notify>>,
}

impl Scripted {
    pub fn ok(snapshot: Vec<Variable>) -> Self {
        Self {
            snapshot: Ok(snapshot),
            gate: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            snapshot: Err(anyhow::anyhow!(message.to_string())),
            gate: None,
        }
    }

    pub fn gated(snapshot: Vec<Variable>, gate: Arc<Notify>) -> Self {
        Self {
            snapshot: Ok(snapshot),
            gate: Some(gate),
        }
    }
}

/// Serves queued responses in call order, then falls back to `fallback`.
#[derive(Default)]
pub struct ScriptedProvider {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Vec<Variable>>,
    detect: Mutex<Option<anyhow::Result<u64>>>,
    fetches: AtomicUsize,
}

impl ScriptedProvider {
    pub fn with_fallback(snapshot: Vec<Variable>) -> Self {
        Self {
            fallback: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    pub fn push(&self, response: Scripted) {
        self.queue.lock().unwrap().push_back(response);
    }

    pub fn set_fallback(&self, snapshot: Vec<Variable>) {
        *self.fallback.lock().unwrap() = snapshot;
    }

    pub fn set_detect(&self, result: anyhow::Result<u64>) {
        *self.detect.lock().unwrap() = Some(result);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VariableProvider for ScriptedProvider {
    async fn fetch_snapshot(&self) -> anyhow::Result<Vec<Variable>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(Scripted { snapshot, gate }) => {
                if let Some(gate) = gate {
                    gate.notified().await;
                }
                snapshot
            }
            None => Ok(self.fallback.lock().unwrap().clone()),
        }
    }

    async fn detect_variables(&self) -> anyhow::Result<u64> {
        match self.detect.lock().unwrap().take() {
            Some(result) => result,
            None => Ok(self.fallback.lock().unwrap().len() as u64),
        }
    }
}

pub fn real(name: &str, value: f64) -> Variable {
    Variable::new(name, "REAL", VariableValue::Numeric(value))
}

pub fn int(name: &str, value: f64) -> Variable {
    Variable::new(name, "INT", VariableValue::Numeric(value))
}

pub fn boolean(name: &str, value: bool) -> Variable {
    Variable::new(name, "BOOL", VariableValue::Boolean(value))
}
