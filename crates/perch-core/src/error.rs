use thiserror::Error;

/// Invariant violations surfaced to the caller.
///
/// These are programming errors, never retried or swallowed internally.
/// Async rejections are not errors at this level; they go through the
/// configured error projection on the value itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("wait_finish called without a matching wait_start")]
    UnmatchedWaitFinish,
    #[error("state update contains no writes")]
    EmptyUpdate,
    #[error("value resolver returned another resolver")]
    NestedResolver,
    #[error("behavior declares no render hook")]
    MissingRender,
    #[error("component is disconnected")]
    Disconnected,
}
