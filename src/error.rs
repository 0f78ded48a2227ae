use serde::Serialize;
use std::fmt;

/// Failure classes surfaced by the bridge. Callers can branch on the kind:
/// `Process` and `Io` are worth retrying, `Precondition` is a caller error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The external command exited non-zero (or died on a signal).
    Process,
    /// A mandatory argument was missing or blank.
    Precondition,
    /// Spawning the command or reading back a pulled artifact failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Process => "process",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeError {
    pub kind: ErrorKind,
    pub error: String,
    pub trace_id: String,
}

impl BridgeError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            error: message.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn process(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ErrorKind::Process, message, trace_id)
    }

    pub fn precondition(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ErrorKind::Precondition, message, trace_id)
    }

    pub fn io(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message, trace_id)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Process | ErrorKind::Io)
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.kind)
    }
}

impl std::error::Error for BridgeError {}
