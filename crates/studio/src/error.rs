use dreamcanvas_core::error::CoreError;

/// Errors surfaced by the studio controllers.
///
/// The message-carrying variants hold the text meant for display: the
/// service's own message when it sent one, else a per-operation fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudioError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Generation(String),

    #[error("{0}")]
    Fetch(String),

    #[error("{0}")]
    Feedback(String),

    #[error("{0}")]
    Training(String),

    /// A newer request of the same kind was issued while this one was in
    /// flight; its response was discarded.
    #[error("Request superseded by a newer one")]
    Superseded,

    /// The operation is refused while another one is active.
    #[error("Another operation is already in progress")]
    Busy,

    /// The controller has been torn down.
    #[error("Controller has been torn down")]
    Disposed,
}

impl StudioError {
    /// Whether the error came from the network boundary.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Generation(_) | Self::Fetch(_) | Self::Feedback(_) | Self::Training(_)
        )
    }
}

impl From<CoreError> for StudioError {
    fn from(err: CoreError) -> Self {
        let CoreError::Validation(msg) = err;
        Self::Validation(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_validation_keeps_bare_message() {
        let err: StudioError = CoreError::Validation("empty prompt".into()).into();
        assert_eq!(err, StudioError::Validation("empty prompt".into()));
        assert_eq!(err.to_string(), "empty prompt");
    }

    #[test]
    fn network_classification() {
        assert!(StudioError::Fetch("x".into()).is_network());
        assert!(!StudioError::Validation("x".into()).is_network());
        assert!(!StudioError::Superseded.is_network());
    }
}
