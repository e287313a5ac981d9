//! Enrichment pipeline
//!
//! Runs an ordered list of operations over a read model, feeding each
//! operation's output into the next. A failing operation is recorded and
//! skipped: the data it was given passes through unchanged, earlier
//! successes are kept, and later operations still run.

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

/// What an operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentStep<T> {
    /// New data to hand to the next operation
    Enriched(T),
    /// Operation declined; the message is recorded
    Failed(String),
}

/// One enrichment over data of type `T`, with shared context `C`.
#[async_trait]
pub trait Enrichment<C, T>: Send + Sync
where
    C: Sync + ?Sized,
    T: Send + Sync,
{
    /// Operation identity, recorded on failure
    fn name(&self) -> &'static str;

    /// Produce enriched data from `data`.
    ///
    /// `Err` is an unexpected fault; [`EnrichmentStep::Failed`] is an
    /// expected, reported failure. Both are tolerated by [`enrich`].
    async fn apply(&self, ctx: &C, data: &T) -> anyhow::Result<EnrichmentStep<T>>;
}

/// A recorded operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentError {
    /// Failing operation
    pub operation: String,
    /// What went wrong
    pub message: String,
    /// The operation faulted rather than reporting failure
    pub raised: bool,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult<T> {
    /// Every operation succeeded
    pub success: bool,
    /// Output of the last successful operation
    pub data: T,
    /// One entry per failing operation, in order
    pub errors: Vec<EnrichmentError>,
}

impl<T> EnrichmentResult<T> {
    /// First failure, for callers that only show one.
    pub fn error(&self) -> Option<&EnrichmentError> {
        self.errors.first()
    }
}

/// Run `operations` in order over `data`.
pub async fn enrich<C, T>(
    ctx: &C,
    data: T,
    operations: &[Box<dyn Enrichment<C, T>>],
) -> EnrichmentResult<T>
where
    C: Sync + ?Sized,
    T: Send + Sync,
{
    let mut current = data;
    let mut errors = Vec::new();

    for operation in operations {
        match operation.apply(ctx, &current).await {
            Ok(EnrichmentStep::Enriched(next)) => current = next,
            Ok(EnrichmentStep::Failed(message)) => {
                warn!(operation = operation.name(), error = %message, "Enrichment failed");
                errors.push(EnrichmentError {
                    operation: operation.name().to_string(),
                    message,
                    raised: false,
                });
            }
            Err(err) => {
                warn!(operation = operation.name(), error = %err, "Enrichment raised an error");
                errors.push(EnrichmentError {
                    operation: operation.name().to_string(),
                    message: format!("{err:#}"),
                    raised: true,
                });
            }
        }
    }

    EnrichmentResult {
        success: errors.is_empty(),
        data: current,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    enum Behaviour {
        Push(u32),
        Decline,
        Raise,
    }

    struct Op(&'static str, Behaviour);

    #[async_trait]
    impl Enrichment<(), Vec<u32>> for Op {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn apply(&self, _ctx: &(), data: &Vec<u32>) -> anyhow::Result<EnrichmentStep<Vec<u32>>> {
            match self.1 {
                Behaviour::Push(n) => {
                    let mut next = data.clone();
                    next.push(n);
                    Ok(EnrichmentStep::Enriched(next))
                }
                Behaviour::Decline => Ok(EnrichmentStep::Failed("declined".into())),
                Behaviour::Raise => bail!("exploded"),
            }
        }
    }

    fn ops(list: Vec<Op>) -> Vec<Box<dyn Enrichment<(), Vec<u32>>>> {
        list.into_iter()
            .map(|op| Box::new(op) as Box<dyn Enrichment<(), Vec<u32>>>)
            .collect()
    }

    #[tokio::test]
    async fn all_successes_chain_output() {
        let result = enrich(
            &(),
            vec![],
            &ops(vec![Op("a", Behaviour::Push(1)), Op("b", Behaviour::Push(2))]),
        )
        .await;
        assert!(result.success);
        assert_eq!(result.data, vec![1, 2]);
        assert!(result.error().is_none());
    }

    #[tokio::test]
    async fn failures_keep_prior_data_and_later_operations_still_run() {
        let result = enrich(
            &(),
            vec![0],
            &ops(vec![
                Op("first", Behaviour::Push(1)),
                Op("declines", Behaviour::Decline),
                Op("second", Behaviour::Push(2)),
                Op("raises", Behaviour::Raise),
            ]),
        )
        .await;

        assert!(!result.success);
        assert_eq!(result.data, vec![0, 1, 2]);
        assert_eq!(result.errors.len(), 2);

        let first = result.error().expect("first error");
        assert_eq!(first.operation, "declines");
        assert!(!first.raised);
        assert_eq!(result.errors[1].operation, "raises");
        assert!(result.errors[1].raised);
        assert!(result.errors[1].message.contains("exploded"));
    }

    #[tokio::test]
    async fn trailing_failure_returns_last_successful_output() {
        let result = enrich(
            &(),
            vec![],
            &ops(vec![Op("only", Behaviour::Push(9)), Op("fails", Behaviour::Raise)]),
        )
        .await;
        assert_eq!(result.data, vec![9]);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn no_operations_is_success() {
        let result = enrich(&(), vec![7u32], &ops(vec![])).await;
        assert!(result.success);
        assert_eq!(result.data, vec![7]);
    }
}
