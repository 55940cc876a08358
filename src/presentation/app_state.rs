// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::rate_controller::RateController;
use crate::application::scheduler::UpdateScheduler;
use crate::infrastructure::event_feed::EventFeed;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    pub scheduler: Mutex<UpdateScheduler>,
    pub rate_controller: RateController,
    pub feed: EventFeed,
}
