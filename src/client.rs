use log::{debug, info, warn};
use std::io::{Read, Write};
use std::time::Duration;

use crate::connection::{CommandConnection, DataConnection};
use crate::error::{FtsError, Result};
use crate::responses::{
    COMMAND_OKAY, CURRENT_DIRECTORY, DATA_CONNECTION_ALREADY_OPEN, FILE_ACTION_OKAY, FILE_STATUS,
    FtpResponse, GOODBYE, OPENING_DATA_CONNECTION, PASSIVE_MODE, SERVICE_READY,
    TRANSFER_COMPLETE, USER_LOGGED_IN, is_need_password, parse_pasv_address, parse_quoted_path,
    parse_response,
};
use crate::transfer::{receive_into, send_from};

/// The file-transfer collaborator a transfer session drives
pub trait FtpTransport {
    /// Open the control connection; returns the server greeting
    fn connect(&mut self, address: &str) -> Result<String>;

    /// USER/PASS login
    fn login(&mut self, user: &str, password: &str) -> Result<()>;

    /// Send a raw command; negative replies become errors
    fn send_raw(&mut self, command: &str) -> Result<FtpResponse>;

    fn pwd(&mut self) -> Result<String>;

    fn cwd(&mut self, path: &str) -> Result<()>;

    fn size(&mut self, filename: &str) -> Result<u64>;

    /// RETR `filename` into `sink`, returning the byte count
    fn retrieve(&mut self, filename: &str, sink: &mut dyn Write) -> Result<u64>;

    /// STOR `source` as `filename`, returning the byte count
    fn store(
        &mut self,
        filename: &str,
        source: &mut dyn Read,
        size_hint: Option<u64>,
    ) -> Result<u64>;

    fn close(&mut self) -> Result<()>;
}

/// FTP client over a plain TCP control channel with passive data channels
pub struct FtpClient {
    connection: CommandConnection,
    timeout: Duration,
}

impl FtpClient {
    pub fn new(default_port: u16, timeout_secs: u64) -> Self {
        debug!(
            "Creating FTP client (default port {}, timeout {}s)",
            default_port, timeout_secs
        );

        Self {
            connection: CommandConnection::new(default_port, timeout_secs),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Send a command and read its reply without judging the code
    fn exchange(&mut self, command: &str) -> Result<FtpResponse> {
        self.connection.send_command(command)?;
        self.read_reply()
    }

    fn read_reply(&mut self) -> Result<FtpResponse> {
        let raw = self.connection.read_response()?;
        parse_response(&raw)
    }

    /// Ask for a passive data address and open the data channel to it
    fn open_data_connection(&mut self) -> Result<DataConnection> {
        let reply = self.exchange("PASV")?.expect(&[PASSIVE_MODE])?;
        let (advertised_ip, port) = parse_pasv_address(&reply.message).ok_or_else(|| {
            FtsError::DataConnectionFailed(format!("Failed to parse PASV reply: {}", reply))
        })?;

        // Gateways often advertise an inside address; reuse the control peer instead
        let host = self.connection.peer_ip()?;
        if host.to_string() != advertised_ip.to_string() {
            debug!(
                "PASV advertised {}, connecting to control peer {}",
                advertised_ip, host
            );
        }

        DataConnection::connect(host, port, self.timeout)
    }

    /// Issue RETR/STOR and wait for the preliminary reply
    fn start_transfer(&mut self, command: &str) -> Result<()> {
        self.exchange(command)?
            .expect(&[OPENING_DATA_CONNECTION, DATA_CONNECTION_ALREADY_OPEN])?;
        Ok(())
    }

    /// Read the completion reply once the data channel is closed
    fn finish_transfer(&mut self) -> Result<()> {
        self.read_reply()?
            .expect(&[TRANSFER_COMPLETE, FILE_ACTION_OKAY])?;
        Ok(())
    }
}

impl FtpTransport for FtpClient {
    fn connect(&mut self, address: &str) -> Result<String> {
        let raw = self.connection.connect(address)?;
        match parse_response(&raw).and_then(|reply| reply.expect(&[SERVICE_READY])) {
            Ok(greeting) => Ok(greeting.message),
            Err(e) => {
                warn!("Gateway refused the session: {}", e);
                self.connection.disconnect()?;
                Err(e)
            }
        }
    }

    fn login(&mut self, user: &str, password: &str) -> Result<()> {
        let reply = self.exchange(&format!("USER {}", user))?.into_result()?;
        if is_need_password(reply.code) {
            self.exchange(&format!("PASS {}", password))?
                .expect(&[USER_LOGGED_IN, 202])?;
        } else if reply.code != USER_LOGGED_IN {
            return Err(FtsError::UnexpectedResponse {
                expected: "230 or 331".to_string(),
                received: reply.to_string(),
            });
        }
        info!("User {} logged in", user);
        Ok(())
    }

    fn send_raw(&mut self, command: &str) -> Result<FtpResponse> {
        self.exchange(command)?.into_result()
    }

    fn pwd(&mut self) -> Result<String> {
        let reply = self.exchange("PWD")?.expect(&[CURRENT_DIRECTORY])?;
        parse_quoted_path(&reply.message).ok_or_else(|| {
            FtsError::ResponseParseError(format!("No quoted path in PWD reply: {}", reply))
        })
    }

    fn cwd(&mut self, path: &str) -> Result<()> {
        self.exchange(&format!("CWD {}", path))?
            .expect(&[FILE_ACTION_OKAY, COMMAND_OKAY])?;
        Ok(())
    }

    fn size(&mut self, filename: &str) -> Result<u64> {
        let reply = self
            .exchange(&format!("SIZE {}", filename))?
            .expect(&[FILE_STATUS])?;
        reply.message.trim().parse::<u64>().map_err(|_| {
            FtsError::ResponseParseError(format!("Invalid SIZE reply: {}", reply))
        })
    }

    fn retrieve(&mut self, filename: &str, sink: &mut dyn Write) -> Result<u64> {
        let mut data = self.open_data_connection()?;
        self.start_transfer(&format!("RETR {}", filename))?;

        match receive_into(&mut data, sink, filename) {
            Ok(bytes) => {
                data.close()?;
                self.finish_transfer()?;
                Ok(bytes)
            }
            Err(e) => {
                data.close()?;
                // Drain the server's verdict so the control channel stays in step
                if let Err(reply_error) = self.read_reply() {
                    warn!("No completion reply after failed download: {}", reply_error);
                }
                Err(e)
            }
        }
    }

    fn store(
        &mut self,
        filename: &str,
        source: &mut dyn Read,
        size_hint: Option<u64>,
    ) -> Result<u64> {
        let mut data = self.open_data_connection()?;
        self.start_transfer(&format!("STOR {}", filename))?;

        let sent = send_from(&mut data, source, filename, size_hint);
        data.close()?;
        match sent {
            Ok(bytes) => {
                self.finish_transfer()?;
                Ok(bytes)
            }
            Err(e) => {
                if let Err(reply_error) = self.read_reply() {
                    warn!("No completion reply after failed upload: {}", reply_error);
                }
                Err(e)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.connection.is_connected() {
            if let Err(e) = self.exchange("QUIT").and_then(|reply| reply.expect(&[GOODBYE])) {
                debug!("QUIT failed: {}", e);
            }
        }
        self.connection.disconnect()
    }
}
