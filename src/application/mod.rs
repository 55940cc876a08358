// Application layer - Use cases and the seams to external collaborators
pub mod binding_registry;
pub mod dashboard_service;
pub mod error;
pub mod rate_controller;
pub mod scheduler;
pub mod snapshot_applier;
pub mod tick_fence;
pub mod variable_provider;
pub mod visual_binding;

#[cfg(test)]
pub mod test_support;
