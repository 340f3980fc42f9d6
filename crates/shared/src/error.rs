use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Network,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failure of an account recovery call or of the input feeding it.
///
/// `NotFound` sends the flow to manual display-name entry, `Validation` leaves
/// the phase untouched, anything else sends the user back to phrase entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("no display name found for recovery phrase")]
    NotFound,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("{code:?}: {message}")]
    Other { code: ErrorCode, message: String },
}

impl RecoveryError {
    pub fn other(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Other {
            code,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::other(ErrorCode::Network, message)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound => ErrorCode::NotFound,
            Self::Validation(_) => ErrorCode::Validation,
            Self::Other { code, .. } => *code,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<RecoveryError> for ApiError {
    fn from(value: RecoveryError) -> Self {
        let code = value.code();
        match value {
            RecoveryError::Validation(message) | RecoveryError::Other { message, .. } => {
                Self { code, message }
            }
            RecoveryError::NotFound => Self::new(code, RecoveryError::NotFound.to_string()),
        }
    }
}

impl From<ApiError> for RecoveryError {
    fn from(value: ApiError) -> Self {
        match value.code {
            ErrorCode::NotFound => Self::NotFound,
            ErrorCode::Validation => Self::Validation(value.message),
            code => Self::Other {
                code,
                message: value.message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_survives_api_round_trip() {
        let api: ApiError = RecoveryError::NotFound.into();
        assert_eq!(api.code, ErrorCode::NotFound);
        assert!(RecoveryError::from(api).is_not_found());
    }

    #[test]
    fn unknown_server_codes_collapse_into_other() {
        let err = RecoveryError::from(ApiError::new(ErrorCode::Internal, "swarm unreachable"));
        assert_eq!(
            err,
            RecoveryError::other(ErrorCode::Internal, "swarm unreachable")
        );
        assert_eq!(err.to_string(), "Internal: swarm unreachable");
    }

    #[test]
    fn api_error_serializes_snake_case_code() {
        let json = serde_json::to_value(ApiError::from(RecoveryError::network("timed out")))
            .expect("serialize");
        assert_eq!(json["code"], "network");
        assert_eq!(json["message"], "timed out");
    }
}
