// Dashboard service - Process-wide catalog, charts and status
use crate::application::binding_registry::{BindOutcome, BindingRegistry};
use crate::application::error::DashboardError;
use crate::application::snapshot_applier::{ApplyReport, SnapshotApplier, VariableCatalog};
use crate::application::tick_fence::{TickFence, TickTicket};
use crate::application::variable_provider::VariableProvider;
use crate::application::visual_binding::{StatusSink, VisualHandleFactory};
use crate::domain::status::{StatusReport, TickRateMeter};
use crate::domain::time_series::SeriesStats;
use crate::domain::variable::{Variable, VariableValue};
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

#[derive(Debug)]
pub enum TickOutcome {
    Applied(ApplyReport),
    Failed(DashboardError),
    /// Response belonged to an older generation or an older tick
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub detected: u64,
    pub refreshed: ApplyReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableView {
    pub name: String,
    pub address: String,
    pub data_type: String,
    pub value: VariableValue,
    pub display: Option<String>,
    pub response_code: String,
    pub valid: bool,
    pub bound: bool,
    pub active: bool,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingView {
    pub name: String,
    pub active: bool,
    pub color: &'static str,
    pub samples: Vec<Option<f64>>,
    pub stats: SeriesStats,
    pub average: Option<f64>,
}

struct DashboardState {
    catalog: VariableCatalog,
    registry: BindingRegistry,
    fence: TickFence,
    status: StatusReport,
    meter: TickRateMeter,
    last_tick_at: Option<Instant>,
}

pub struct DashboardService {
    provider: Arc<dyn VariableProvider>,
    factory: Arc<dyn VisualHandleFactory>,
    sink: Arc<dyn StatusSink>,
    state: Mutex<DashboardState>,
}

impl DashboardService {
    pub fn new(
        provider: Arc<dyn VariableProvider>,
        factory: Arc<dyn VisualHandleFactory>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        let state = DashboardState {
            catalog: VariableCatalog::new(),
            registry: BindingRegistry::new(),
            fence: TickFence::default(),
            status: StatusReport::default(),
            meter: TickRateMeter::new(Instant::now().into_std()),
            last_tick_at: None,
        };
        Self {
            provider,
            factory,
            sink,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &mut DashboardState) {
        state.status.updated_at = Utc::now();
        self.sink.publish(&state.status);
    }

    // Scheduler hooks

    /// Start a new generation; responses from earlier ticks are then discarded.
    pub fn advance_generation(&self) -> u64 {
        self.state().fence.advance()
    }

    pub fn issue_ticket(&self) -> TickTicket {
        let mut state = self.state();
        state.last_tick_at = Some(Instant::now());
        state.fence.issue()
    }

    pub fn last_tick_at(&self) -> Option<Instant> {
        self.state().last_tick_at
    }

    /// Fetch one snapshot and apply it if `ticket` is still current.
    pub async fn run_tick(&self, ticket: TickTicket) -> TickOutcome {
        let started = Instant::now();
        let result = self.provider.fetch_snapshot().await;
        let finished = Instant::now();

        let mut state = self.state();
        match result {
            Ok(snapshot) => {
                if !state.fence.admit(ticket) {
                    tracing::debug!(
                        "Discarding stale tick {:?} (current generation {})",
                        ticket,
                        state.fence.generation()
                    );
                    return TickOutcome::Stale;
                }

                let DashboardState {
                    catalog, registry, ..
                } = &mut *state;
                let report = SnapshotApplier::apply_tick(catalog, registry, snapshot);

                state.status.connected = true;
                state.status.valid_variables = report.valid_count;
                state.status.latency_ms = Some(finished.duration_since(started).as_millis() as u64);
                if let Some(rate) = state.meter.record(finished.into_std()) {
                    state.status.ticks_per_second = Some(rate);
                }
                self.publish(&mut state);

                tracing::debug!(
                    "Tick {} applied: {} updated, {} valid",
                    ticket.sequence,
                    report.updated.len(),
                    report.valid_count
                );
                TickOutcome::Applied(report)
            }
            Err(e) => {
                // A current failure also fences off older ticks still in flight
                if !state.fence.admit(ticket) {
                    tracing::debug!("Ignoring failure from stale tick {:?}: {}", ticket, e);
                    return TickOutcome::Stale;
                }

                tracing::warn!("Tick {} failed: {:#}", ticket.sequence, e);
                state.status.connected = false;
                state.status.message = Some(format!("Error: {}", e));
                self.publish(&mut state);
                TickOutcome::Failed(DashboardError::FetchFailure(e.to_string()))
            }
        }
    }

    // Catalog

    /// Reload the complete variable list from the provider.
    pub async fn refresh_catalog(&self) -> Result<ApplyReport, DashboardError> {
        let ticket = self.state().fence.issue();
        let result = self.provider.fetch_snapshot().await;

        let mut state = self.state();
        match result {
            Ok(snapshot) => {
                if !state.fence.admit_refresh(ticket) {
                    tracing::debug!("Discarding refresh {:?}, a newer tick already applied", ticket);
                    return Ok(ApplyReport {
                        updated: Vec::new(),
                        valid_count: state.catalog.valid_count(),
                    });
                }

                let DashboardState {
                    catalog, registry, ..
                } = &mut *state;
                let report = SnapshotApplier::apply_full(catalog, registry, snapshot);

                let total = state.catalog.len();
                state.status.connected = true;
                state.status.valid_variables = report.valid_count;
                state.status.message = Some(format!("Connected with {} variables", total));
                self.publish(&mut state);

                tracing::info!("Catalog refreshed: {} variables, {} valid", total, report.valid_count);
                Ok(report)
            }
            Err(e) => {
                tracing::warn!("Catalog refresh failed: {:#}", e);
                if !state.fence.admit_refresh(ticket) {
                    return Err(DashboardError::FetchFailure(e.to_string()));
                }
                state.status.connected = false;
                state.status.message = Some(format!("Error: {}", e));
                self.publish(&mut state);
                Err(DashboardError::FetchFailure(e.to_string()))
            }
        }
    }

    /// Trigger detection on the provider, then reload the catalog.
    pub async fn detect_variables(&self) -> Result<DetectionReport, DashboardError> {
        self.set_message("Detecting variables...");

        let detected = match self.provider.detect_variables().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Variable detection failed: {:#}", e);
                self.set_message(&format!("Detection failed: {}", e));
                return Err(DashboardError::DetectFailure(e.to_string()));
            }
        };

        let refreshed = self.refresh_catalog().await?;
        self.set_message(&format!("Detection complete. Found {} variables.", detected));
        tracing::info!("Detection found {} variables", detected);

        Ok(DetectionReport {
            detected,
            refreshed,
        })
    }

    fn set_message(&self, message: &str) {
        let mut state = self.state();
        state.status.message = Some(message.to_string());
        self.publish(&mut state);
    }

    pub fn variables(&self) -> Vec<VariableView> {
        let state = self.state();
        state
            .catalog
            .iter()
            .map(|v| Self::view(&state.registry, v))
            .collect()
    }

    pub fn variable(&self, name: &str) -> Option<VariableView> {
        let state = self.state();
        state
            .catalog
            .get(name)
            .map(|v| Self::view(&state.registry, v))
    }

    fn view(registry: &BindingRegistry, variable: &Variable) -> VariableView {
        let binding = registry.get(&variable.name);
        VariableView {
            name: variable.name.clone(),
            address: variable.address.clone(),
            data_type: variable.data_type.clone(),
            value: variable.last_value,
            display: variable.display_value(),
            response_code: variable.response_code.clone(),
            valid: variable.is_valid(),
            bound: binding.is_some(),
            active: binding.map(|b| b.is_active()).unwrap_or(false),
            summary: binding.and_then(|b| b.buffer().summary()),
        }
    }

    pub fn status(&self) -> StatusReport {
        self.state().status.clone()
    }

    // Bindings

    pub fn bind(&self, name: &str) -> Result<BindOutcome, DashboardError> {
        let mut state = self.state();
        let DashboardState {
            catalog, registry, ..
        } = &mut *state;

        let (position, variable) = catalog
            .iter()
            .enumerate()
            .find(|(_, v)| v.name == name)
            .ok_or_else(|| DashboardError::UnknownVariable(name.to_string()))?;

        let before = registry.count();
        let outcome = registry.bind(variable, position, self.factory.as_ref());
        if before == 0 && registry.count() > 0 {
            self.sink.placeholder_changed(false);
        }
        Ok(outcome)
    }

    pub fn unbind(&self, name: &str) -> bool {
        let mut state = self.state();
        let removed = state.registry.unbind(name);
        if removed && state.registry.count() == 0 {
            self.sink.placeholder_changed(true);
        }
        removed
    }

    pub fn set_active(&self, name: &str, active: bool) -> Result<(), DashboardError> {
        if self.state().registry.set_active(name, active) {
            tracing::debug!("{} {}", if active { "Resumed" } else { "Paused" }, name);
            Ok(())
        } else {
            Err(DashboardError::UnknownVariable(name.to_string()))
        }
    }

    pub fn clear_data(&self, name: &str) -> Result<(), DashboardError> {
        if self.state().registry.clear_data(name) {
            Ok(())
        } else {
            Err(DashboardError::UnknownVariable(name.to_string()))
        }
    }

    pub fn clear_all(&self) {
        let mut state = self.state();
        let had_bindings = state.registry.count() > 0;
        state.registry.clear_all();
        if had_bindings {
            self.sink.placeholder_changed(true);
        }
    }

    /// Close every chart, then open one per currently valid variable.
    pub fn show_all(&self) -> usize {
        self.clear_all();

        let mut state = self.state();
        let DashboardState {
            catalog, registry, ..
        } = &mut *state;
        for (index, variable) in catalog.valid().enumerate() {
            registry.bind(variable, index, self.factory.as_ref());
        }

        let count = registry.count();
        if count > 0 {
            self.sink.placeholder_changed(false);
        }
        tracing::info!("Opened {} charts", count);
        count
    }

    pub fn binding(&self, name: &str) -> Option<BindingView> {
        let state = self.state();
        state.registry.get(name).map(|b| BindingView {
            name: name.to_string(),
            active: b.is_active(),
            color: b.color(),
            samples: b.buffer().numeric_samples(),
            stats: *b.buffer().stats(),
            average: b.buffer().average(),
        })
    }

    pub fn binding_count(&self) -> usize {
        self.state().registry.count()
    }

    pub fn has_active_bindings(&self) -> bool {
        self.state().registry.has_active()
    }
}
