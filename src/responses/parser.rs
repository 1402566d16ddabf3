//! FTP reply parsing functionality

use log::debug;
use std::net::Ipv4Addr;

use crate::error::{FtsError, Result};
use crate::responses::status_codes::is_error;

/// Parsed FTP reply from server
#[derive(Debug, Clone, PartialEq)]
pub struct FtpResponse {
    /// Reply code (e.g., 230, 530, 331)
    pub code: u16,

    /// Reply text; multi-line replies keep their inner lines
    pub message: String,
}

impl FtpResponse {
    /// Create a new FTP reply
    pub fn new(code: u16, message: String) -> Self {
        Self { code, message }
    }

    /// Turn a negative reply into the matching error
    pub fn into_result(self) -> Result<Self> {
        if is_error(self.code) {
            Err(FtsError::from_ftp_response(self.code, self.message))
        } else {
            Ok(self)
        }
    }

    /// Require one of the given codes
    pub fn expect(self, codes: &[u16]) -> Result<Self> {
        let response = self.into_result()?;
        if codes.contains(&response.code) {
            Ok(response)
        } else {
            Err(FtsError::UnexpectedResponse {
                expected: codes
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join("/"),
                received: response.to_string(),
            })
        }
    }
}

impl std::fmt::Display for FtpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// Parse a raw reply (one or more CRLF terminated lines) into a structured reply
pub fn parse_response(response: &str) -> Result<FtpResponse> {
    let response = response.trim();

    if response.is_empty() {
        return Err(FtsError::ResponseParseError("Empty response".to_string()));
    }

    // Replies start with a 3-digit code followed by space or dash
    if response.len() < 3 || !response.is_char_boundary(3) {
        return Err(FtsError::ResponseParseError(format!(
            "Response too short: '{}'",
            response
        )));
    }

    let code_str = &response[0..3];
    let code = code_str
        .parse::<u16>()
        .map_err(|_| FtsError::ResponseParseError(format!("Invalid response code: {}", code_str)))?;

    let separator = response[3..].chars().next().unwrap_or(' ');
    if separator != ' ' && separator != '-' {
        return Err(FtsError::ResponseParseError(
            "Invalid response format: missing separator after code".to_string(),
        ));
    }

    let message = response.get(4..).unwrap_or("").to_string();

    debug!("Parsed FTP reply: code={}, message='{}'", code, message);

    Ok(FtpResponse::new(code, message))
}

/// Extract the data address from a 227 reply text
///
/// Accepts both `Entering Passive Mode (h1,h2,h3,h4,p1,p2).` and the
/// bare `h1,h2,h3,h4,p1,p2` form some gateways send.
pub fn parse_pasv_address(message: &str) -> Option<(Ipv4Addr, u16)> {
    let start = message.find(|c: char| c.is_ascii_digit())?;
    let numbers: Vec<u8> = message[start..]
        .split(|c: char| !(c.is_ascii_digit() || c == ','))
        .next()?
        .split(',')
        .map(|part| part.parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;

    if numbers.len() != 6 {
        debug!("PASV reply carried {} numbers, expected 6", numbers.len());
        return None;
    }

    let ip = Ipv4Addr::new(numbers[0], numbers[1], numbers[2], numbers[3]);
    let port = u16::from(numbers[4]) << 8 | u16::from(numbers[5]);
    Some((ip, port))
}

/// Extract the quoted path of a 257 reply, undoubling embedded quotes
pub fn parse_quoted_path(message: &str) -> Option<String> {
    let start = message.find('"')?;
    let mut path = String::new();
    let mut chars = message[start + 1..].chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Some(path);
            }
        } else {
            path.push(c);
        }
    }
    None
}
