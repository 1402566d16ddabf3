use std::fmt;

/// Main error type for the gateway file transfer tool
#[derive(Debug)]
pub enum FtsError {
    // Connection Errors
    ConnectionRefused(String),
    ConnectionTimeout(String),
    ConnectionLost(String),
    NotConnected(String),
    InvalidHost(String),

    // Protocol reply errors
    InvalidCredentials { code: u16, message: String },
    PermissionDenied { code: u16, message: String },
    FileNotFound { code: u16, message: String },
    InsufficientStorage { code: u16, message: String },
    TransferFailed { code: u16, message: String },
    DataConnectionFailed(String),
    ProtocolViolation { code: u16, message: String },
    CommandNotSupported { code: u16, message: String },
    UnexpectedResponse { expected: String, received: String },
    ResponseParseError(String),

    // Configuration Errors
    ConfigMissing(String),
    ConfigInvalid(String),
    Settings(config::ConfigError),

    // Run-level outcomes
    UserQuit,
    GatewayConnection {
        gateway: String,
        location: String,
        reason: String,
    },
    RemoteHostAuth { user: String, host: String },
    DirectoryNotFound(String),
    LocalFileMissing { file: String, directory: String },
    NothingToTransfer,
    FilesFailed { failed: usize, total: usize },

    // IO Errors
    Io(std::io::Error),
}

impl fmt::Display for FtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Connection Errors
            Self::ConnectionRefused(msg) => write!(f, "Connection refused: {}", msg),
            Self::ConnectionTimeout(msg) => write!(f, "Connection timeout: {}", msg),
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::NotConnected(msg) => write!(f, "Not connected: {}", msg),
            Self::InvalidHost(msg) => write!(f, "Invalid host: {}", msg),

            // Protocol reply errors
            Self::InvalidCredentials { code, message } => {
                write!(f, "Invalid credentials ({}): {}", code, message)
            }
            Self::PermissionDenied { code, message } => {
                write!(f, "Permission denied ({}): {}", code, message)
            }
            Self::FileNotFound { code, message } => {
                write!(f, "File not found ({}): {}", code, message)
            }
            Self::InsufficientStorage { code, message } => {
                write!(f, "Insufficient storage ({}): {}", code, message)
            }
            Self::TransferFailed { code, message } => {
                write!(f, "Transfer failed ({}): {}", code, message)
            }
            Self::DataConnectionFailed(msg) => write!(f, "Data connection failed: {}", msg),
            Self::ProtocolViolation { code, message } => {
                write!(f, "Protocol violation ({}): {}", code, message)
            }
            Self::CommandNotSupported { code, message } => {
                write!(f, "Command not supported ({}): {}", code, message)
            }
            Self::UnexpectedResponse { expected, received } => write!(
                f,
                "Unexpected response: expected '{}', got '{}'",
                expected, received
            ),
            Self::ResponseParseError(msg) => write!(f, "Response parse error: {}", msg),

            // Configuration Errors
            Self::ConfigMissing(what) => write!(f, "{} does not exist!", what),
            Self::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Settings(err) => write!(f, "Settings error: {}", err),

            // Run-level outcomes
            Self::UserQuit => write!(f, "Ladies and gentlemen, we got ourselves a quitter!!!"),
            Self::GatewayConnection {
                gateway,
                location,
                reason,
            } => write!(
                f,
                "Error connecting to the {} gate ({}): {}",
                location, gateway, reason
            ),
            Self::RemoteHostAuth { user, host } => {
                write!(f, "Host login incorrect! {}@{}", user, host)
            }
            Self::DirectoryNotFound(dir) => {
                write!(f, "{} does not exist in the remote host!", dir)
            }
            Self::LocalFileMissing { file, directory } => {
                write!(f, "{} does not exist in {}", file, directory)
            }
            Self::NothingToTransfer => write!(f, "No file left to transfer"),
            Self::FilesFailed { failed, total } => {
                write!(f, "{} of {} file(s) failed to transfer", failed, total)
            }

            // IO Errors
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for FtsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Settings(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FtsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<config::ConfigError> for FtsError {
    fn from(err: config::ConfigError) -> Self {
        Self::Settings(err)
    }
}

impl FtsError {
    /// Map a negative FTP reply to a typed error
    pub fn from_ftp_response(code: u16, message: String) -> Self {
        match code {
            530 => Self::InvalidCredentials { code, message },
            532 => Self::PermissionDenied { code, message },

            // File/transfer related errors
            450 | 550 => Self::FileNotFound { code, message },
            452 | 552 => Self::InsufficientStorage { code, message },
            426 | 451 | 551 | 553 => Self::TransferFailed { code, message },
            425 => Self::DataConnectionFailed(format!("{} {}", code, message)),

            500 | 502 | 504 => Self::CommandNotSupported { code, message },

            _ if code >= 400 => Self::ProtocolViolation { code, message },

            _ => Self::UnexpectedResponse {
                expected: "error response".to_string(),
                received: format!("{} {}", code, message),
            },
        }
    }

    /// Faults on the control connection itself; nothing further can be sent
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused(_)
                | Self::ConnectionTimeout(_)
                | Self::ConnectionLost(_)
                | Self::NotConnected(_)
                | Self::InvalidHost(_)
        )
    }

    /// Likely causes shown to the user when the run terminates
    pub fn guidance(&self) -> &'static [&'static str] {
        match self {
            Self::GatewayConnection { .. } => &[
                "Possible causes:",
                "1. Incorrect gateway credentials (username and/or password)",
                "2. You're out of the company's network (check VPN)",
                "3. The sign-in approval request timed out",
            ],
            Self::RemoteHostAuth { .. } => {
                &["Please double check your credentials (username and/or password)..."]
            }
            Self::DirectoryNotFound(_) => {
                &["Check the remote directory; it is not created for you"]
            }
            Self::ConfigMissing(_) | Self::ConfigInvalid(_) | Self::Settings(_) => {
                &["Check the settings file and the tables directory"]
            }
            Self::UserQuit => &["Quitter!! quitter! quitter... *fades in the background*"],
            _ => &[],
        }
    }

    /// Process exit code for a run that ended with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigMissing(_) | Self::ConfigInvalid(_) | Self::Settings(_) => 2,
            Self::GatewayConnection { .. } => 3,
            Self::RemoteHostAuth { .. } => 4,
            Self::DirectoryNotFound(_) => 5,
            Self::LocalFileMissing { .. } | Self::NothingToTransfer | Self::FilesFailed { .. } => 6,
            _ => 1,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FtsError>;
