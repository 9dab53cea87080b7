use std::time::Duration;

use thiserror::Error;

/// Failure to execute a submission on one test case
///
/// A `RunError` is recorded on the affected case as its error message and the
/// case counts as failed; the run itself carries on.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("empty command template")]
    EmptyCommand,

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while talking to the program: {0}")]
    Io(#[from] std::io::Error),

    #[error("program did not finish within {} ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("pipe task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
