use std::fmt;
use thiserror::Error;

/// HTTP statuses worth retrying: request timeout, payload too large (the node
/// returns it transiently under load), rate limiting and gateway/server errors.
pub const RETRYABLE_STATUS_CODES: [u16; 7] = [408, 413, 429, 500, 502, 503, 504];

/// Connection-level failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionErrorKind {
    TimedOut,
    ConnectionReset,
    AddressInUse,
    ConnectionRefused,
    BrokenPipe,
    HostNotFound,
    NetworkUnreachable,
    DnsTemporaryFailure,
    Protocol,
    /// Anything not in the retryable set
    Other,
}

impl ConnectionErrorKind {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ConnectionErrorKind::Other)
    }

    pub fn from_io_kind(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;
        match kind {
            ErrorKind::TimedOut => Self::TimedOut,
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => Self::ConnectionReset,
            ErrorKind::AddrInUse => Self::AddressInUse,
            ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            ErrorKind::BrokenPipe => Self::BrokenPipe,
            ErrorKind::NotFound => Self::HostNotFound,
            ErrorKind::AddrNotAvailable => Self::NetworkUnreachable,
            ErrorKind::UnexpectedEof | ErrorKind::InvalidData => Self::Protocol,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TimedOut => "timed out",
            Self::ConnectionReset => "connection reset",
            Self::AddressInUse => "address in use",
            Self::ConnectionRefused => "connection refused",
            Self::BrokenPipe => "broken pipe",
            Self::HostNotFound => "host not found",
            Self::NetworkUnreachable => "network unreachable",
            Self::DnsTemporaryFailure => "dns temporary failure",
            Self::Protocol => "protocol error",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the node transport
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The node answered with a non-success status
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response
    #[error("Connection error ({kind}) calling {url}: {message}")]
    Connection {
        url: String,
        kind: ConnectionErrorKind,
        message: String,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Retry eligibility: a status in [`RETRYABLE_STATUS_CODES`] or a
    /// connection failure of a known transient kind.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
            Self::Connection { kind, .. } => kind.is_retryable(),
            Self::Decode { .. } => false,
            Self::InvalidRequest(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Connection { .. } => "connection",
            Self::Decode { .. } => "decode",
            Self::InvalidRequest(_) => "request",
        }
    }

    /// Classify a reqwest failure, walking the source chain for the
    /// underlying io error.
    pub fn from_reqwest(err: &reqwest::Error, url: &str) -> Self {
        if err.is_decode() {
            return Self::Decode {
                url: url.to_string(),
                message: err.to_string(),
            };
        }
        if err.is_builder() {
            return Self::InvalidRequest(err.to_string());
        }

        let kind = if err.is_timeout() {
            ConnectionErrorKind::TimedOut
        } else if let Some(io) = find_io_error(err) {
            ConnectionErrorKind::from_io_kind(io.kind())
        } else if err.is_connect() {
            ConnectionErrorKind::ConnectionRefused
        } else {
            classify_message(&err.to_string())
        };

        Self::Connection {
            url: url.to_string(),
            kind,
            message: err.to_string(),
        }
    }
}

fn find_io_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a std::io::Error> {
    let mut source = err.source();
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            return Some(io);
        }
        source = current.source();
    }
    None
}

fn classify_message(message: &str) -> ConnectionErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("dns") || lower.contains("lookup") {
        ConnectionErrorKind::DnsTemporaryFailure
    } else if lower.contains("unreachable") {
        ConnectionErrorKind::NetworkUnreachable
    } else if lower.contains("reset") {
        ConnectionErrorKind::ConnectionReset
    } else {
        ConnectionErrorKind::Other
    }
}
