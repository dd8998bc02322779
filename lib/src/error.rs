/// All possible reportmail library errors.
///
/// Each variant carries a message for logging purposes. "No matching
/// report found" is not an error; the locator returns `Ok(None)` for
/// that case.
#[derive(Clone, Debug)]
pub enum Error {
    /// Missing or invalid settings. Raised before any I/O.
    Configuration(String),
    /// Credential provider setup or token retrieval failure.
    Authentication(String),
    /// Secret store rejected the identifier, or the payload did not
    /// decode to valid UTF-8.
    SecretUnavailable(String),
    /// The remote store reported a missing object key.
    ObjectNotFound(String),
    /// Any other remote-call failure, including timeouts.
    Transport(String),
    /// SMTP session failure at any step.
    Dispatch(String),
    /// Sent-ledger persistence failure.
    Ledger(String),
}

impl Error {
    /// Stable classification string, surfaced in the handler's result
    /// payload.
    pub fn error_type(&self) -> &'static str {
        match *self {
            Error::Configuration(_) => "ConfigurationError",
            Error::Authentication(_) => "AuthenticationError",
            Error::SecretUnavailable(_) => "SecretUnavailable",
            Error::ObjectNotFound(_) => "ObjectNotFound",
            Error::Transport(_) => "TransportError",
            Error::Dispatch(_) => "DispatchError",
            Error::Ledger(_) => "LedgerError",
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Configuration(ref msg) => write!(f, "Configuration: {}", msg),
            Error::Authentication(ref msg) => write!(f, "Authentication: {}", msg),
            Error::SecretUnavailable(ref msg) => write!(f, "SecretUnavailable: {}", msg),
            Error::ObjectNotFound(ref msg) => write!(f, "ObjectNotFound: {}", msg),
            Error::Transport(ref msg) => write!(f, "Transport: {}", msg),
            Error::Dispatch(ref msg) => write!(f, "Dispatch: {}", msg),
            Error::Ledger(ref msg) => write!(f, "Ledger: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport("request timed out".to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::error::Error> for Error {
    fn from(err: serde_json::error::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<lettre::smtp::error::Error> for Error {
    fn from(err: lettre::smtp::error::Error) -> Self {
        Self::Dispatch(err.to_string())
    }
}

impl From<native_tls::Error> for Error {
    fn from(err: native_tls::Error) -> Self {
        Self::Dispatch(err.to_string())
    }
}

impl From<lettre_email::error::Error> for Error {
    fn from(err: lettre_email::error::Error) -> Self {
        Self::Dispatch(err.to_string())
    }
}
