// Broadcast feed of status and chart events for connected viewers
use crate::application::visual_binding::{StatusSink, VisualHandle, VisualHandleFactory};
use crate::domain::status::StatusReport;
use crate::domain::variable::{Variable, VariableValue};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DashboardEvent {
    Status(StatusReport),
    Placeholder { visible: bool },
    ChartOpened {
        name: String,
        #[serde(rename = "dataType")]
        data_type: String,
        color: &'static str,
    },
    Sample { name: String, display: String },
    RawSample { name: String, value: VariableValue },
    ChartReset { name: String },
    ChartClosed { name: String },
}

impl DashboardEvent {
    /// SSE event name
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardEvent::Status(_) => "status",
            DashboardEvent::Placeholder { .. } => "placeholder",
            DashboardEvent::ChartOpened { .. } => "chartOpened",
            DashboardEvent::Sample { .. } => "sample",
            DashboardEvent::RawSample { .. } => "rawSample",
            DashboardEvent::ChartReset { .. } => "chartReset",
            DashboardEvent::ChartClosed { .. } => "chartClosed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventFeed {
    tx: broadcast::Sender<DashboardEvent>,
}

impl EventFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: DashboardEvent) {
        // No subscribers is the normal idle state.
        let _ = self.tx.send(event);
    }
}

impl StatusSink for EventFeed {
    fn publish(&self, status: &StatusReport) {
        self.send(DashboardEvent::Status(status.clone()));
    }

    fn placeholder_changed(&self, visible: bool) {
        self.send(DashboardEvent::Placeholder { visible });
    }
}

impl VisualHandleFactory for EventFeed {
    fn create(&self, variable: &Variable, color: &'static str) -> Box<dyn VisualHandle> {
        self.send(DashboardEvent::ChartOpened {
            name: variable.name.clone(),
            data_type: variable.data_type.clone(),
            color,
        });
        Box::new(FeedChart {
            name: variable.name.clone(),
            feed: self.clone(),
        })
    }
}

/// Chart rendered by whoever listens on the feed.
struct FeedChart {
    name: String,
    feed: EventFeed,
}

impl VisualHandle for FeedChart {
    fn on_sample(&mut self, formatted: &str) {
        self.feed.send(DashboardEvent::Sample {
            name: self.name.clone(),
            display: formatted.to_string(),
        });
    }

    fn append(&mut self, sample: VariableValue) {
        self.feed.send(DashboardEvent::RawSample {
            name: self.name.clone(),
            value: sample,
        });
    }

    fn reset(&mut self) {
        self.feed.send(DashboardEvent::ChartReset {
            name: self.name.clone(),
        });
    }

    fn dispose(&mut self) {
        self.feed.send(DashboardEvent::ChartClosed {
            name: self.name.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_lifecycle_events() {
        let feed = EventFeed::new(16);
        let mut rx = feed.subscribe();
        let variable = Variable::new("T1", "REAL", VariableValue::Numeric(1.5));

        let mut chart = feed.create(&variable, "#4e79a7");
        chart.on_sample("1.50");
        chart.append(VariableValue::Numeric(1.5));
        chart.reset();
        chart.dispose();

        let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind())
            .collect();
        assert_eq!(
            kinds,
            vec!["chartOpened", "sample", "rawSample", "chartReset", "chartClosed"]
        );
    }

    #[test]
    fn test_send_without_subscribers() {
        let feed = EventFeed::new(4);
        feed.placeholder_changed(true);

        let mut rx = feed.subscribe();
        feed.placeholder_changed(false);
        assert_eq!(rx.try_recv().unwrap(), DashboardEvent::Placeholder { visible: false });
    }

    #[test]
    fn test_event_serialization() {
        let event = DashboardEvent::RawSample {
            name: "B1".to_string(),
            value: VariableValue::Boolean(true),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "rawSample");
        assert_eq!(json["value"], true);
    }
}
