use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "functions.chat.variants")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "http_gateway")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the TensorZero client.
#[derive(Debug, Error)]
pub enum Error {
    /// Discriminator missing or not registered for a strict family.
    #[error("Unknown {family} variant: {}", .found.as_deref().unwrap_or("<missing type>"))]
    UnknownVariant {
        family: &'static str,
        found: Option<String>,
    },

    /// A variant payload is missing a mandatory field or has the wrong shape.
    #[error("Malformed {family} `{variant}`: {message}")]
    MalformedContent {
        family: &'static str,
        variant: String,
        message: String,
    },

    /// The gateway answered, but reported a failure.
    #[error("TensorZeroError (status code {status}): {message}")]
    Gateway { status: u16, message: String },

    /// Client-side invariant violation. Always a bug.
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn unknown_variant(family: &'static str, found: Option<&str>) -> Self {
        Error::UnknownVariant {
            family,
            found: found.map(str::to_string),
        }
    }

    pub fn malformed(
        family: &'static str,
        variant: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::MalformedContent {
            family,
            variant: variant.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// HTTP status reported by the gateway, if this is a gateway error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Gateway { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller-side retry is reasonable (5xx or 429).
    ///
    /// The client never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Gateway { status, .. } if *status >= 500 || *status == 429)
    }
}
