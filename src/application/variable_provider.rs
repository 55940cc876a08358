// Provider trait for the remote variable source
use crate::domain::variable::Variable;
use async_trait::async_trait;

#[async_trait]
pub trait VariableProvider: Send + Sync {
    /// Fetch the current state of every variable the provider knows about
    async fn fetch_snapshot(&self) -> anyhow::Result<Vec<Variable>>;

    /// Ask the provider to re-detect its variables, returning how many it found
    async fn detect_variables(&self) -> anyhow::Result<u64>;
}
