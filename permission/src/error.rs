use thiserror::Error;

/// Domain tag attached to every error reported by the coordinator.
pub const ERROR_DOMAIN: &str = "permkit.permission";

/// Errors that can occur when checking or requesting permissions.
///
/// None of these are fatal: state is left untouched and the caller may retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// Another batch request is still waiting for its results.
    #[error(
        "a request for permissions is already running, wait for it to finish before starting another (several groups can be requested at once)"
    )]
    RequestInProgress,

    /// No foreground activity is available to host a dialog or settings screen.
    #[error("unable to detect the current Android activity")]
    NoActivity,

    /// A call into the platform failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// A settings screen could not be started.
    #[error("failed to launch settings screen: {0}")]
    Launch(String),

    /// The coordinator went away before the request resolved.
    #[error("permission request was abandoned before completing")]
    Cancelled,
}

impl PermissionError {
    /// The fixed domain tag for the error channel.
    #[must_use]
    pub const fn domain(&self) -> &'static str {
        ERROR_DOMAIN
    }
}
