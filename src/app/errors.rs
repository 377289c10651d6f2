use crate::transaction::Address;
use crate::transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Deploy-time control requested, but {placeholder} is not present in the program")]
    MissingDeployControl { placeholder: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateDecodeError {
    #[error("Unknown state value type {value_type} for key {key}")]
    UnknownStateValueType { key: String, value_type: u64 },

    #[error("Invalid base64 in state entry {key}: {message}")]
    InvalidBase64 { key: String, message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("State decode error: {0}")]
    StateDecode(#[from] StateDecodeError),

    #[error("Account {address} has no local state for application {app_id}")]
    LocalStateNotFound { address: Address, app_id: u64 },

    /// The node returned a compile result that is not valid base64
    #[error("Invalid compiled program: {0}")]
    InvalidProgram(String),
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Template(_) => "template",
            Self::StateDecode(_) => "state_decode",
            Self::LocalStateNotFound { .. } => "local_state_not_found",
            Self::InvalidProgram(_) => "invalid_program",
        }
    }
}
