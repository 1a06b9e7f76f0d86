use crate::bridge::CallError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FfiError {
    #[error("Failed to load library '{path}': {source}")]
    LibraryLoadError {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("Symbol '{name}' not found in library: {source}")]
    MissingSymbolError {
        name: String,
        #[source]
        source: libloading::Error,
    },

    #[error("Library spec '{spec}' declares no exports")]
    EmptySpecError { spec: &'static str },

    #[error("ABI version mismatch: expected {expected}, library reports {found}")]
    AbiMismatchError { expected: u32, found: u32 },

    #[error("Deferred call failed: {0}")]
    CallError(#[from] CallError),

    #[error("Native function '{function}' returned status {code}")]
    NativeStatusError { function: &'static str, code: i32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgumentError { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Library,
    Call,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FfiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FfiError::ConfigError { .. } | FfiError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            FfiError::LibraryLoadError { .. }
            | FfiError::MissingSymbolError { .. }
            | FfiError::EmptySpecError { .. }
            | FfiError::AbiMismatchError { .. } => ErrorCategory::Library,
            FfiError::CallError(_)
            | FfiError::NativeStatusError { .. }
            | FfiError::InvalidArgumentError { .. } => ErrorCategory::Call,
            FfiError::IoError(_) | FfiError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FfiError::NativeStatusError { .. } => ErrorSeverity::Low,
            FfiError::CallError(CallError::Closed) => ErrorSeverity::Medium,
            FfiError::CallError(CallError::Panicked { .. }) => ErrorSeverity::Critical,
            FfiError::ConfigError { .. }
            | FfiError::InvalidConfigValueError { .. }
            | FfiError::InvalidArgumentError { .. }
            | FfiError::EmptySpecError { .. } => ErrorSeverity::High,
            FfiError::LibraryLoadError { .. }
            | FfiError::MissingSymbolError { .. }
            | FfiError::AbiMismatchError { .. } => ErrorSeverity::Critical,
            FfiError::IoError(_) | FfiError::SerializationError(_) => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FfiError::LibraryLoadError { .. } => {
                "Build the shared library with `cargo build --release` and point --library at target/release"
            }
            FfiError::MissingSymbolError { .. } => {
                "Make sure the library was built from this crate and exports the declared functions"
            }
            FfiError::EmptySpecError { .. } => "Declare at least one export in the library spec",
            FfiError::AbiMismatchError { .. } => {
                "Rebuild the shared library from the same version of this crate"
            }
            FfiError::CallError(CallError::Closed) => {
                "The worker thread was shut down; create a new caller and retry"
            }
            FfiError::CallError(CallError::Panicked { .. }) => {
                "The native call panicked; check the logs for the panic message"
            }
            FfiError::NativeStatusError { .. } | FfiError::InvalidArgumentError { .. } => {
                "Pass a non-negative delay that fits in a C int"
            }
            FfiError::ConfigError { .. } | FfiError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line flags"
            }
            FfiError::IoError(_) => "Check that the file exists and is readable",
            FfiError::SerializationError(_) => "Report this as a bug",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Library => format!("Could not use the native library: {}", self),
            ErrorCategory::Call => format!("Native call failed: {}", self),
            ErrorCategory::Io => format!("I/O problem: {}", self),
        }
    }
}

impl From<toml::de::Error> for FfiError {
    fn from(err: toml::de::Error) -> Self {
        FfiError::ConfigError {
            message: format!("TOML parsing error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, FfiError>;
