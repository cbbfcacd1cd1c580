use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    IllegalPath,
    CriticalStep,
    HandoffFailed,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IllegalPath => "illegal_path",
            Self::CriticalStep => "critical_step",
            Self::HandoffFailed => "handoff_failed",
            Self::Internal => "internal_error",
        }
    }
}

/// Failures that end a launcher run. Every code maps to exit status 1.
#[derive(Clone, Debug)]
pub struct BootstrapError {
    code: ErrorCode,
    message: String,
}

impl BootstrapError {
    pub fn illegal_path(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::IllegalPath,
            message: message.into(),
        }
    }

    pub fn critical_step(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::CriticalStep,
            message: message.into(),
        }
    }

    pub fn handoff_failed(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::HandoffFailed,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for BootstrapError {}

impl From<anyhow::Error> for BootstrapError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(format!("{error:#}"))
    }
}
