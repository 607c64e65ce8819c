// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

pub const NO_FILE_SELECTED: &str = "Please select a file first";
pub const UPLOAD_FAILED: &str = "Failed to process file";
pub const CHAT_FAILED: &str = "Failed to get response";

/// Why an upload or chat flow did not produce a result. `Display` is the
/// message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Rejected before any request was made.
    #[error("{0}")]
    Validation(String),
    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),
    /// A response arrived but its body was not the expected JSON.
    #[error("Invalid server response")]
    InvalidResponse,
    /// The service answered with a failure status or `success: false`.
    #[error("{0}")]
    Server(String),
}

impl FlowError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(_) => "transport",
            Self::InvalidResponse => "invalid_response",
            Self::Server(_) => "server",
        }
    }

    /// Server error carrying the body's message, or `fallback` when the
    /// body had none.
    pub fn server(message: Option<&str>, fallback: &str) -> Self {
        match message.map(str::trim) {
            Some(message) if !message.is_empty() => Self::Server(message.to_owned()),
            _ => Self::Server(fallback.to_owned()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("decode chart payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("chart payload is not a PNG image")]
    NotPng,
}

#[cfg(test)]
mod tests {
    use super::{FlowError, UPLOAD_FAILED};

    #[test]
    fn server_error_falls_back_when_message_missing_or_blank() {
        assert_eq!(
            FlowError::server(None, UPLOAD_FAILED),
            FlowError::Server(UPLOAD_FAILED.to_owned())
        );
        assert_eq!(
            FlowError::server(Some("   "), UPLOAD_FAILED),
            FlowError::Server(UPLOAD_FAILED.to_owned())
        );
        assert_eq!(
            FlowError::server(Some("Missing required columns: ltp"), UPLOAD_FAILED)
                .to_string(),
            "Missing required columns: ltp"
        );
    }

    #[test]
    fn invalid_response_has_fixed_message() {
        assert_eq!(
            FlowError::InvalidResponse.to_string(),
            "Invalid server response"
        );
        assert_eq!(FlowError::InvalidResponse.kind(), "invalid_response");
    }
}
