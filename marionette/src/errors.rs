use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Multiple components found matching {matcher}: {matches:?}")]
    MultipleComponentsFound {
        matcher: String,
        matches: Vec<String>,
    },

    #[error("Wait timed out after {elapsed:?} (timeout: {timeout:?}): {condition}")]
    WaitTimedOut {
        condition: String,
        timeout: Duration,
        elapsed: Duration,
    },

    #[error("Screen is busy: display lock held by '{held_by}', requested by '{requested_by}'")]
    ScreenBusy {
        held_by: String,
        requested_by: String,
    },

    #[error("Component is disposed: {0}")]
    ComponentDisposed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
