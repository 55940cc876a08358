// Applies fetched snapshots to the variable catalog and open charts
use crate::application::binding_registry::BindingRegistry;
use crate::domain::variable::Variable;
use serde::Serialize;
use std::collections::HashMap;

/// Ordered list of known variables with lookup by name.
#[derive(Debug, Clone, Default)]
pub struct VariableCatalog {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl VariableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole list. A name repeated in `variables` keeps its last record.
    pub fn replace_all(&mut self, variables: Vec<Variable>) {
        self.variables.clear();
        self.index.clear();
        for variable in variables {
            self.upsert(variable);
        }
    }

    /// Replace the stored record for this name, appending unseen names.
    pub fn upsert(&mut self, variable: Variable) {
        match self.index.get(&variable.name) {
            Some(&pos) => self.variables[pos] = variable,
            None => {
                self.index.insert(variable.name.clone(), self.variables.len());
                self.variables.push(variable);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&pos| &self.variables[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn valid(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub updated: Vec<String>,
    pub valid_count: usize,
}

pub struct SnapshotApplier;

impl SnapshotApplier {
    /// Periodic path: valid records replace stored state in place, invalid
    /// ones are skipped and leave the previous state alone.
    pub fn apply_tick(
        catalog: &mut VariableCatalog,
        registry: &mut BindingRegistry,
        snapshot: Vec<Variable>,
    ) -> ApplyReport {
        let mut updated = Vec::new();

        for variable in snapshot {
            if !variable.is_valid() {
                tracing::debug!(
                    "Skipping {} (responseCode={}, value={:?})",
                    variable.name,
                    variable.response_code,
                    variable.last_value
                );
                continue;
            }
            Self::forward(registry, &variable);
            updated.push(variable.name.clone());
            catalog.upsert(variable);
        }

        ApplyReport {
            updated,
            valid_count: catalog.valid_count(),
        }
    }

    /// Catalog refresh: the snapshot becomes the complete list, then valid
    /// records are forwarded to their charts as on a tick.
    pub fn apply_full(
        catalog: &mut VariableCatalog,
        registry: &mut BindingRegistry,
        snapshot: Vec<Variable>,
    ) -> ApplyReport {
        catalog.replace_all(snapshot);

        let mut updated = Vec::new();
        for variable in catalog.valid() {
            Self::forward(registry, variable);
            updated.push(variable.name.clone());
        }

        ApplyReport {
            valid_count: updated.len(),
            updated,
        }
    }

    fn forward(registry: &mut BindingRegistry, variable: &Variable) {
        if let Some(formatted) = variable.display_value() {
            registry.record(&variable.name, &formatted, variable.last_value);
        }
    }
}
