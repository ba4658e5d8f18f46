/// Failures a caller of the prediction pipeline can see and react to.
#[derive(Debug, thiserror::Error)]
pub enum PropError {
    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailure(String),

    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("model output invalid: {0}")]
    ModelOutputInvalid(String),

    #[error("upgrade required: this account is not entitled to run the model")]
    EntitlementDenied,

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UpstreamFetchFailure,
    MissingConfiguration,
    ModelOutputInvalid,
    EntitlementDenied,
    InvalidState,
    InvalidInput,
}

impl PropError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PropError::UpstreamFetchFailure(_) => ErrorKind::UpstreamFetchFailure,
            PropError::MissingConfiguration(_) => ErrorKind::MissingConfiguration,
            PropError::ModelOutputInvalid(_) => ErrorKind::ModelOutputInvalid,
            PropError::EntitlementDenied => ErrorKind::EntitlementDenied,
            PropError::InvalidState(_) => ErrorKind::InvalidState,
            PropError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    pub(crate) fn invalid_output(msg: impl Into<String>) -> Self {
        PropError::ModelOutputInvalid(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PropError>;
