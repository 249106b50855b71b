use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The arguments provided to the tool were invalid.
    InvalidInput,
    /// The model asked for a tool that does not exist.
    UnknownTool,
    /// Credentials for an upstream service are missing or were rejected.
    AuthConfiguration,
    /// The upstream service could not be reached or failed to respond.
    Transport,
    /// The upstream service answered with an unexpected payload.
    UpstreamSchema,
    /// A calculation divided by zero.
    DivisionByZero,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "Invalid input"),
            ErrorKind::UnknownTool => write!(f, "Unknown tool"),
            ErrorKind::AuthConfiguration => {
                write!(f, "Authentication is not configured")
            }
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::UpstreamSchema => write!(f, "Unexpected upstream response"),
            ErrorKind::DivisionByZero => write!(f, "Division by zero"),
        }
    }
}

/// Describes a tool call error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    #[inline]
    fn new(kind: ErrorKind) -> Self {
        Self { kind, reason: None }
    }

    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new error with the `UnknownTool` kind.
    #[inline]
    pub fn unknown_tool() -> Self {
        Self::new(ErrorKind::UnknownTool)
    }

    /// Creates a new error with the `AuthConfiguration` kind.
    #[inline]
    pub fn auth_configuration() -> Self {
        Self::new(ErrorKind::AuthConfiguration)
    }

    /// Creates a new error with the `Transport` kind.
    #[inline]
    pub fn transport() -> Self {
        Self::new(ErrorKind::Transport)
    }

    /// Creates a new error with the `UpstreamSchema` kind.
    #[inline]
    pub fn upstream_schema() -> Self {
        Self::new(ErrorKind::UpstreamSchema)
    }

    /// Creates a new error with the `DivisionByZero` kind.
    #[inline]
    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero)
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }

    /// Returns `true` if this error must end the agent run.
    ///
    /// Other errors are reported back to the model as the tool result, so
    /// it gets a chance to fix its call.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind, ErrorKind::InvalidInput | ErrorKind::UnknownTool)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(!Error::invalid_input().is_fatal());
        assert!(!Error::unknown_tool().is_fatal());
        assert!(Error::auth_configuration().is_fatal());
        assert!(Error::transport().is_fatal());
        assert!(Error::upstream_schema().is_fatal());
        assert!(Error::division_by_zero().is_fatal());
    }

    #[test]
    fn test_reason() {
        let err = Error::division_by_zero();
        assert_eq!(err.reason(), "Division by zero");
        assert_eq!(err.to_string(), "Division by zero");

        let err = Error::transport().with_reason("connection reset");
        assert_eq!(err.reason(), "connection reset");
        assert_eq!(err.to_string(), "Transport error: connection reset");
    }
}
