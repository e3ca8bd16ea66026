use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Client-side error codes carried by [`Error::Operational`] when the
/// failure originates in this library rather than the operating system.
pub const CR_CONN_HOST_ERROR: u16 = 2003;
pub const CR_SERVER_GONE_ERROR: u16 = 2006;
pub const CR_SERVER_LOST: u16 = 2013;

#[derive(Debug, Error)]
pub enum Error {
    /// Library misuse, missing transport, or client-side detection of a
    /// corrupted frame stream.
    #[error("InterfaceError: {0}")]
    Interface(String),

    /// Transport-level failure: connect refused, TLS failure, I/O error
    /// mid-frame. Fatal to the session.
    #[error("OperationalError {code}: {message}")]
    Operational { code: u16, message: String },

    /// An authentication plugin or protocol feature this client does not
    /// implement.
    #[error("NotSupportedError: {0}")]
    NotSupported(String),

    /// An ERR packet decoded from the server, classified by SQLSTATE.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// The DB-API class an ERR packet maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorKind {
    Warning,
    Data,
    Operational,
    Integrity,
    Internal,
    Programming,
    NotSupported,
    Database,
}

impl ServerErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Data => "DataError",
            Self::Operational => "OperationalError",
            Self::Integrity => "IntegrityError",
            Self::Internal => "InternalError",
            Self::Programming => "ProgrammingError",
            Self::NotSupported => "NotSupportedError",
            Self::Database => "DatabaseError",
        }
    }
}

/// A decoded server ERR packet. The connection stays usable after one of
/// these; only transport and framing failures poison the session.
#[derive(Debug, Clone)]
pub struct ServerError {
    pub kind: ServerErrorKind,
    pub code: u16,
    pub sql_state: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sql_state {
            Some(state) => write!(
                f,
                "{} {} ({}): {}",
                self.kind.as_str(),
                self.code,
                state,
                self.message
            ),
            None => write!(f, "{} {}: {}", self.kind.as_str(), self.code, self.message),
        }
    }
}

impl std::error::Error for ServerError {}

/// MySQL error codes that predate SQLSTATE and signal constraint violations.
const LEGACY_INTEGRITY_CODES: &[u16] = &[
    1022, // ER_DUP_KEY
    1048, // ER_BAD_NULL_ERROR
    1062, // ER_DUP_ENTRY
    1169, // ER_DUP_UNIQUE
    1215, // ER_CANNOT_ADD_FOREIGN
    1216, // ER_NO_REFERENCED_ROW
    1217, // ER_ROW_IS_REFERENCED
    1364, // ER_NO_DEFAULT_FOR_FIELD
    1451, // ER_ROW_IS_REFERENCED_2
    1452, // ER_NO_REFERENCED_ROW_2
    1557, // ER_FOREIGN_DUPLICATE_KEY
];

impl ServerError {
    /// Classify by SQLSTATE class when the server supplied one, falling back
    /// to the legacy integrity-code table and then to `DatabaseError`.
    pub fn new(code: u16, sql_state: Option<String>, message: String) -> Self {
        let kind = match sql_state.as_deref().and_then(|s| s.get(..2)) {
            Some("01") => ServerErrorKind::Warning,
            Some("08") | Some("40") => ServerErrorKind::Operational,
            Some("0A") => ServerErrorKind::NotSupported,
            Some("22") => ServerErrorKind::Data,
            Some("23") | Some("XA") => ServerErrorKind::Integrity,
            Some("42") => ServerErrorKind::Programming,
            Some("XE") => ServerErrorKind::Internal,
            _ if LEGACY_INTEGRITY_CODES.contains(&code) => ServerErrorKind::Integrity,
            _ => ServerErrorKind::Database,
        };
        Self {
            kind,
            code,
            sql_state,
            message,
        }
    }
}

impl From<core::convert::Infallible> for Error {
    fn from(err: core::convert::Infallible) -> Self {
        match err {}
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = err
            .raw_os_error()
            .and_then(|n| u16::try_from(n).ok())
            .unwrap_or(CR_SERVER_LOST);
        Error::Operational {
            code,
            message: err.to_string(),
        }
    }
}

impl Error {
    /// `ProgrammingError` raised before any network I/O happens.
    pub fn programming(message: impl Into<String>) -> Self {
        Error::Server(ServerError {
            kind: ServerErrorKind::Programming,
            code: 0,
            sql_state: None,
            message: message.into(),
        })
    }

    /// The DB-API class name of this error.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Interface(_) => "InterfaceError",
            Error::Operational { .. } => "OperationalError",
            Error::NotSupported(_) => "NotSupportedError",
            Error::Server(e) => e.kind.as_str(),
        }
    }

    /// The server (or client) error code, if one applies.
    pub fn code(&self) -> Option<u16> {
        match self {
            Error::Operational { code, .. } => Some(*code),
            Error::Server(e) => Some(e.code),
            _ => None,
        }
    }

    /// Transport and framing errors are fatal: the session is poisoned and
    /// every later command fails fast until the connection is closed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Interface(_) | Error::Operational { .. })
    }
}
