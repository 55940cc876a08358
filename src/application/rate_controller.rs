// Rate controller - Validates user rate changes before they reach the scheduler
use crate::application::error::DashboardError;
use crate::application::scheduler::{Strategy, UpdateScheduler, MAX_RATE_MS, MIN_RATE_MS};
use serde::Serialize;

/// Rates below this still work but may swamp the provider or the charts.
pub const WARN_BELOW_MS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateChange {
    pub rate_ms: u32,
    pub strategy: Strategy,
    pub warning: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RateController {
    min_ms: u32,
    max_ms: u32,
    warn_below_ms: u32,
}

impl Default for RateController {
    fn default() -> Self {
        Self {
            min_ms: MIN_RATE_MS,
            max_ms: MAX_RATE_MS,
            warn_below_ms: WARN_BELOW_MS,
        }
    }
}

impl RateController {
    /// Parse and bounds-check a rate. Out-of-range input is rejected, never clamped.
    pub fn validate(&self, raw: &str) -> Result<u32, DashboardError> {
        let invalid = || DashboardError::InvalidRate {
            input: raw.to_string(),
            min: self.min_ms,
            max: self.max_ms,
        };

        let value: i64 = raw.trim().parse().map_err(|_| invalid())?;
        if value < self.min_ms as i64 || value > self.max_ms as i64 {
            return Err(invalid());
        }
        Ok(value as u32)
    }

    pub fn is_aggressive(&self, rate_ms: u32) -> bool {
        rate_ms < self.warn_below_ms
    }

    /// Validate `raw` and reconfigure the scheduler. On rejection the
    /// scheduler keeps its previous rate and strategy.
    pub fn request_rate_change(
        &self,
        scheduler: &mut UpdateScheduler,
        raw: &str,
    ) -> Result<RateChange, DashboardError> {
        let rate_ms = match self.validate(raw) {
            Ok(rate) => rate,
            Err(e) => {
                tracing::warn!("Rejected rate change: {}", e);
                return Err(e);
            }
        };

        let strategy = scheduler.set_rate(rate_ms);
        let warning = self.is_aggressive(rate_ms);
        if warning {
            tracing::warn!("Update rate {}ms is below {}ms", rate_ms, self.warn_below_ms);
        }
        tracing::info!("Update rate changed to {}ms ({:?})", rate_ms, strategy);

        Ok(RateChange {
            rate_ms,
            strategy,
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::scheduler::SchedulerSettings;
    use crate::application::test_support::{RecordingFactory, RecordingSink, ScriptedProvider};
    use std::sync::Arc;

    fn scheduler() -> UpdateScheduler {
        let dashboard = Arc::new(DashboardService::new(
            Arc::new(ScriptedProvider::default()),
            Arc::new(RecordingFactory::default()),
            Arc::new(RecordingSink::default()),
        ));
        UpdateScheduler::new(dashboard, SchedulerSettings::default(), 100)
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let controller = RateController::default();
        let mut scheduler = scheduler();

        for raw in ["0", "5001", "abc", "", "-5", "12.5", "99999999999999999999"] {
            let result = controller.request_rate_change(&mut scheduler, raw);
            assert!(
                matches!(result, Err(DashboardError::InvalidRate { .. })),
                "{raw:?} should be rejected"
            );
        }

        assert_eq!(scheduler.rate_ms(), 100);
        assert_eq!(scheduler.strategy(), Strategy::FixedInterval);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let controller = RateController::default();
        assert_eq!(controller.validate("1").unwrap(), 1);
        assert_eq!(controller.validate(" 5000 ").unwrap(), 5000);
    }

    #[test]
    fn test_slow_rate_uses_fixed_interval() {
        let controller = RateController::default();
        let mut scheduler = scheduler();

        let change = controller.request_rate_change(&mut scheduler, "2500").unwrap();
        assert_eq!(change.rate_ms, 2500);
        assert_eq!(change.strategy, Strategy::FixedInterval);
        assert!(!change.warning);
        assert_eq!(scheduler.rate_ms(), 2500);
    }

    #[test]
    fn test_fast_rate_uses_frame_loop() {
        let controller = RateController::default();
        let mut scheduler = scheduler();

        let change = controller.request_rate_change(&mut scheduler, "10").unwrap();
        assert_eq!(change.strategy, Strategy::FrameSynced);
        assert!(change.warning);
        assert_eq!(scheduler.strategy(), Strategy::FrameSynced);
    }

    #[test]
    fn test_warning_threshold() {
        let controller = RateController::default();
        let mut scheduler = scheduler();

        assert!(controller.request_rate_change(&mut scheduler, "30").unwrap().warning);
        assert!(!controller.request_rate_change(&mut scheduler, "200").unwrap().warning);
        assert!(!controller.request_rate_change(&mut scheduler, "50").unwrap().warning);
        assert!(controller.request_rate_change(&mut scheduler, "49").unwrap().warning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_change_restarts_running_scheduler() {
        let controller = RateController::default();
        let mut scheduler = scheduler();
        scheduler.start();

        let change = controller.request_rate_change(&mut scheduler, "5").unwrap();
        assert_eq!(change.strategy, Strategy::FrameSynced);
        assert!(scheduler.is_running());

        assert!(controller.request_rate_change(&mut scheduler, "nope").is_err());
        assert_eq!(scheduler.rate_ms(), 5);
        assert!(scheduler.is_running());
    }
}
