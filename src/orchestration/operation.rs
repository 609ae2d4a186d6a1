use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A unit of work scheduled as one node of a dependency graph.
///
/// Returning an error marks the node as failed. Failure still counts as
/// settlement, so dependents run regardless.
#[async_trait]
pub trait Operation: Send + Sync {
    async fn execute(&self) -> anyhow::Result<()>;
}

/// Adapter turning an async closure into an [`Operation`]
pub struct FnOperation<F> {
    work: F,
}

#[async_trait]
impl<F, Fut> Operation for FnOperation<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn execute(&self) -> anyhow::Result<()> {
        (self.work)().await
    }
}

/// Wrap an async closure as a shareable operation.
pub fn operation_fn<F, Fut>(work: F) -> Arc<dyn Operation>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnOperation { work })
}
