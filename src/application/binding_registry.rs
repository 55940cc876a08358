// Registry of open charts, at most one per variable
use crate::application::visual_binding::{chart_color, VisualHandle, VisualHandleFactory};
use crate::domain::time_series::{SeriesStats, TimeSeriesBuffer};
use crate::domain::variable::{Variable, VariableValue};
use std::collections::HashMap;

pub struct Binding {
    active: bool,
    color: &'static str,
    buffer: TimeSeriesBuffer,
    handle: Box<dyn VisualHandle>,
}

impl Binding {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn color(&self) -> &'static str {
        self.color
    }

    pub fn buffer(&self) -> &TimeSeriesBuffer {
        &self.buffer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    Created,
    Existing,
}

#[derive(Default)]
pub struct BindingRegistry {
    bindings: HashMap<String, Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a chart for `variable`. Binding an already-bound variable leaves
    /// the existing binding untouched and builds no new handle.
    pub fn bind(
        &mut self,
        variable: &Variable,
        color_index: usize,
        factory: &dyn VisualHandleFactory,
    ) -> BindOutcome {
        if self.bindings.contains_key(&variable.name) {
            return BindOutcome::Existing;
        }

        let stats = match variable.last_value {
            VariableValue::Numeric(_) => SeriesStats::seeded(variable.min, variable.max),
            _ => SeriesStats::default(),
        };
        let color = chart_color(color_index);
        let binding = Binding {
            active: true,
            color,
            buffer: TimeSeriesBuffer::with_stats(stats),
            handle: factory.create(variable, color),
        };

        tracing::debug!("Bound {} (color {})", variable.name, color);
        self.bindings.insert(variable.name.clone(), binding);
        BindOutcome::Created
    }

    /// Returns false when nothing was bound under `name`.
    pub fn unbind(&mut self, name: &str) -> bool {
        match self.bindings.remove(name) {
            Some(mut binding) => {
                binding.handle.dispose();
                tracing::debug!("Unbound {}", name);
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, name: &str, active: bool) -> bool {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                binding.active = active;
                true
            }
            None => false,
        }
    }

    /// Wipe the buffered history of one chart, keeping the binding open.
    pub fn clear_data(&mut self, name: &str) -> bool {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                binding.buffer.reset();
                binding.handle.reset();
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        for (name, mut binding) in self.bindings.drain() {
            binding.handle.dispose();
            tracing::debug!("Unbound {}", name);
        }
    }

    /// Forward one accepted sample to an active binding. Paused or missing
    /// bindings drop it and return false.
    pub fn record(&mut self, name: &str, formatted: &str, raw: VariableValue) -> bool {
        match self.bindings.get_mut(name) {
            Some(binding) if binding.active => {
                binding.handle.on_sample(formatted);
                binding.buffer.push(raw);
                binding.handle.append(raw);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn count(&self) -> usize {
        self.bindings.len()
    }

    pub fn has_active(&self) -> bool {
        self.bindings.values().any(Binding::is_active)
    }
}
