// Presentation layer - HTTP control API
pub mod app_state;
pub mod handlers;
