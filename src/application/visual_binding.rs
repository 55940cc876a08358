// Capabilities the core needs from rendering and status collaborators
use crate::domain::status::StatusReport;
use crate::domain::variable::{Variable, VariableValue};

/// Palette cycled across opened charts.
pub const CHART_COLORS: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

pub fn chart_color(index: usize) -> &'static str {
    CHART_COLORS[index % CHART_COLORS.len()]
}

/// One live chart for one variable.
pub trait VisualHandle: Send {
    /// Formatted value for display, sent on every accepted tick
    fn on_sample(&mut self, formatted: &str);

    /// Raw value; the chart appends it and evicts its oldest point
    fn append(&mut self, sample: VariableValue);

    fn reset(&mut self);

    /// Release any rendering resources. Called exactly once, on unbind.
    fn dispose(&mut self);
}

pub trait VisualHandleFactory: Send + Sync {
    fn create(&self, variable: &Variable, color: &'static str) -> Box<dyn VisualHandle>;
}

pub trait StatusSink: Send + Sync {
    fn publish(&self, status: &StatusReport);

    /// The "nothing selected" placeholder becomes visible or hidden
    fn placeholder_changed(&self, visible: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_color_cycles() {
        assert_eq!(chart_color(0), "#4e79a7");
        assert_eq!(chart_color(9), "#bab0ab");
        assert_eq!(chart_color(10), chart_color(0));
        assert_eq!(chart_color(23), chart_color(3));
    }
}
