// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod event_feed;
pub mod http_provider;
