//! Control connection management
//!
//! Handles the TCP connection for the FTP command channel.

use log::{debug, info, warn};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{FtsError, Result};

/// Manages the FTP control channel
pub struct CommandConnection {
    reader: Option<BufReader<TcpStream>>,
    writer: Option<TcpStream>,
    default_port: u16,
    timeout: u64,
    address: String,
}

impl CommandConnection {
    /// Create a new, unconnected control channel
    pub fn new(default_port: u16, timeout: u64) -> Self {
        Self {
            reader: None,
            writer: None,
            default_port,
            timeout,
            address: String::new(),
        }
    }

    /// Connect to `address` (host or host:port) and return the greeting reply
    pub fn connect(&mut self, address: &str) -> Result<String> {
        let candidates = resolve_address(address, self.default_port)?;
        let timeout = Duration::from_secs(self.timeout);
        let mut last_error = None;

        for candidate in candidates {
            debug!("Trying {}", candidate);
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    let writer = stream.try_clone()?;
                    self.reader = Some(BufReader::new(stream));
                    self.writer = Some(writer);
                    self.address = candidate.to_string();
                    info!("Connected to FTP server at {}", candidate);

                    return self.read_response();
                }
                Err(e) => {
                    warn!("Connection to {} failed: {}", candidate, e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) if e.kind() == io::ErrorKind::TimedOut => {
                FtsError::ConnectionTimeout(format!("Connection to {} timed out", address))
            }
            Some(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                FtsError::ConnectionRefused(format!("Connection refused to {}", address))
            }
            Some(e) => FtsError::ConnectionLost(format!("Cannot reach {}: {}", address, e)),
            None => FtsError::InvalidHost(format!("{} resolved to no address", address)),
        })
    }

    /// Check if the connection is active
    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// IP address of the server end of the control channel
    pub fn peer_ip(&self) -> Result<IpAddr> {
        let writer = self
            .writer
            .as_ref()
            .ok_or_else(|| FtsError::NotConnected("Not connected".to_string()))?;
        Ok(writer.peer_addr()?.ip())
    }

    /// Send an FTP command (adds CRLF automatically)
    pub fn send_command(&mut self, command: &str) -> Result<()> {
        let formatted_command = if command.ends_with("\r\n") {
            command.to_string()
        } else {
            format!("{}\r\n", command)
        };

        debug!("Sending command: {}", redact(command));

        let Some(writer) = self.writer.as_mut() else {
            return Err(FtsError::NotConnected("Not connected".to_string()));
        };

        let result = writer
            .write_all(formatted_command.as_bytes())
            .and_then(|_| writer.flush());

        if let Err(e) = result {
            self.drop_stream();
            return Err(FtsError::ConnectionLost(format!(
                "Connection lost while sending: {}",
                e
            )));
        }
        Ok(())
    }

    /// Read a line from the control channel
    fn read_line(&mut self) -> Result<String> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(FtsError::NotConnected("Not connected".to_string()));
        };

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                self.drop_stream();
                Err(FtsError::ConnectionLost(
                    "Server closed the control connection".to_string(),
                ))
            }
            Ok(_) => {
                debug!("Read line: {}", line.trim_end());
                Ok(line)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                Err(FtsError::ConnectionTimeout(
                    "No reply from server before timeout".to_string(),
                ))
            }
            Err(e) => {
                self.drop_stream();
                Err(FtsError::ConnectionLost(format!(
                    "Connection lost while reading: {}",
                    e
                )))
            }
        }
    }

    /// Read an FTP reply (handles multi-line replies)
    pub fn read_response(&mut self) -> Result<String> {
        let mut response = String::new();
        let mut first_line = true;
        let mut expected_code = None;

        loop {
            let line = self.read_line()?;
            response.push_str(&line);

            if first_line {
                first_line = false;
                if line.len() >= 4 && line.as_bytes()[3] == b'-' && line.is_char_boundary(3) {
                    expected_code = Some(line[0..3].to_string());
                } else {
                    break;
                }
            } else if let Some(ref code) = expected_code {
                // End of multi-line reply is "<code> "
                if line.len() >= 4 && line.starts_with(code.as_str()) && line.as_bytes()[3] == b' ' {
                    break;
                }
            }
        }

        debug!("Received response: {}", response.trim());
        Ok(response)
    }

    /// Disconnect from the server
    pub fn disconnect(&mut self) -> Result<()> {
        if let Some(stream) = self.writer.take() {
            info!("Disconnecting from {}", self.address);
            self.reader = None;
            if let Err(e) = stream.shutdown(std::net::Shutdown::Both) {
                // The peer may already have closed after QUIT
                debug!("Socket shutdown: {}", e);
            }
        }
        Ok(())
    }

    fn drop_stream(&mut self) {
        self.reader = None;
        self.writer = None;
    }
}

impl Drop for CommandConnection {
    fn drop(&mut self) {
        if self.is_connected() {
            let _ = self.disconnect();
        }
    }
}

/// Resolve `host`, `host:port`, `ip` or `ip:port` into socket addresses
pub fn resolve_address(address: &str, default_port: u16) -> Result<Vec<SocketAddr>> {
    let address = address.trim();
    if address.is_empty() {
        return Err(FtsError::InvalidHost("Empty address".to_string()));
    }

    let resolved = match address.to_socket_addrs() {
        Ok(addrs) => addrs.collect::<Vec<_>>(),
        Err(_) => (address, default_port)
            .to_socket_addrs()
            .map_err(|e| FtsError::InvalidHost(format!("Cannot resolve {}: {}", address, e)))?
            .collect(),
    };

    if resolved.is_empty() {
        return Err(FtsError::InvalidHost(format!(
            "{} resolved to no address",
            address
        )));
    }
    Ok(resolved)
}

/// Hide the argument of PASS commands in logs
fn redact(command: &str) -> String {
    let trimmed = command.trim_end();
    match trimmed.split_once(' ') {
        Some((verb, _)) if verb.eq_ignore_ascii_case("PASS") => format!("{} ****", verb),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_resolve_address_uses_default_port() {
        let addrs = resolve_address("127.0.0.1", 2121).unwrap();
        assert_eq!(addrs[0], "127.0.0.1:2121".parse::<SocketAddr>().unwrap());

        let addrs = resolve_address("127.0.0.1:21", 2121).unwrap();
        assert_eq!(addrs[0].port(), 21);

        assert!(resolve_address("   ", 21).is_err());
    }

    #[test]
    fn test_redact_hides_password() {
        assert_eq!(redact("PASS hunter2"), "PASS ****");
        assert_eq!(redact("USER jdoe@host"), "USER jdoe@host");
    }

    #[test]
    fn test_reads_greeting_and_multi_line_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            writer
                .write_all(b"220-Gate ready\r\n Authorized use only\r\n220 Go ahead\r\n")
                .unwrap();
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "NOOP\r\n");
            writer.write_all(b"200 OK\r\n").unwrap();
        });

        let mut connection = CommandConnection::new(21, 5);
        let greeting = connection.connect(&addr.to_string()).unwrap();
        assert!(greeting.starts_with("220-Gate ready"));
        assert!(greeting.ends_with("220 Go ahead\r\n"));

        connection.send_command("NOOP").unwrap();
        assert_eq!(connection.read_response().unwrap(), "200 OK\r\n");

        server.join().unwrap();
        connection.disconnect().unwrap();
        assert!(!connection.is_connected());
    }

    #[test]
    fn test_send_without_connection_fails() {
        let mut connection = CommandConnection::new(21, 5);
        assert!(matches!(
            connection.send_command("NOOP"),
            Err(FtsError::NotConnected(_))
        ));
    }
}
