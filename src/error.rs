//! Error and control-transfer types for render passes.

use std::fmt;
use std::sync::Arc;

/// Pass errors, including the rerun control signal and user errors.
///
/// User errors can be propagated with the `?` operator, which automatically
/// converts any `Into<anyhow::Error>` type into `PassError::UserError`.
#[derive(Debug, Clone)]
pub enum PassError {
    /// The script requested an immediate extra render pass.
    ///
    /// This is a control primitive, not a failure: the remainder of the
    /// current pass is discarded and [`Session::run`](crate::Session::run)
    /// starts a new pass. Scripts obtain this variant from
    /// [`PassContext::request_rerun`](crate::PassContext::request_rerun) and
    /// propagate it with `?`.
    Rerun,

    /// The script requested more consecutive reruns than the session allows.
    ///
    /// A script whose rerun condition never converges would otherwise loop
    /// forever. The bound is configurable via
    /// [`SessionBuilder::max_reruns`](crate::SessionBuilder::max_reruns).
    RerunLimit {
        /// The configured bound that was exceeded.
        limit: u32,
    },

    /// User-defined error raised inside the script.
    ///
    /// Any type implementing `Into<anyhow::Error>` can be converted into this
    /// variant, so widget code can use `?` on its own error types.
    UserError(Arc<anyhow::Error>),
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassError::Rerun => write!(f, "rerun requested"),
            PassError::RerunLimit { limit } => {
                write!(f, "rerun limit exceeded: more than {} consecutive reruns", limit)
            }
            PassError::UserError(e) => write!(f, "user error: {}", e),
        }
    }
}

impl<T: Into<anyhow::Error>> From<T> for PassError {
    fn from(err: T) -> Self {
        PassError::UserError(Arc::new(err.into()))
    }
}

impl PassError {
    /// Returns true if this is the rerun control signal.
    pub fn is_rerun(&self) -> bool {
        matches!(self, PassError::Rerun)
    }

    /// Returns a reference to the inner user error if this is a `UserError`.
    pub fn user_error(&self) -> Option<&Arc<anyhow::Error>> {
        match self {
            PassError::UserError(e) => Some(e),
            _ => None,
        }
    }

    /// Attempts to downcast the user error to a specific type.
    ///
    /// Returns `Some(&E)` if this is a `UserError` containing an error of
    /// type `E`, otherwise `None`.
    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.user_error().and_then(|e| e.downcast_ref::<E>())
    }

    /// Returns true if this is a `UserError` containing an error of type `E`.
    pub fn is<E: std::error::Error + Send + Sync + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }
}
