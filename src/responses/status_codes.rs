//! FTP status code definitions

// Preliminary codes (1xx)
pub const DATA_CONNECTION_ALREADY_OPEN: u16 = 125;
pub const OPENING_DATA_CONNECTION: u16 = 150;

// Success codes (2xx)
pub const COMMAND_OKAY: u16 = 200;
pub const FILE_STATUS: u16 = 213;
pub const SERVICE_READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const PASSIVE_MODE: u16 = 227;
pub const USER_LOGGED_IN: u16 = 230;
pub const FILE_ACTION_OKAY: u16 = 250;
pub const CURRENT_DIRECTORY: u16 = 257;

// Intermediate codes (3xx)
pub const USER_NAME_OKAY_NEED_PASSWORD: u16 = 331;

/// Check if status code indicates error
pub fn is_error(code: u16) -> bool {
    code >= 400
}

/// Check if status code indicates need for password
pub fn is_need_password(code: u16) -> bool {
    code == USER_NAME_OKAY_NEED_PASSWORD
}
