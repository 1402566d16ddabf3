//! Passive-mode data connection for FTP transfers

use log::{debug, error, info};
use std::io::{Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::{FtsError, Result};

/// One data channel opened for a single RETR or STOR
pub struct DataConnection {
    stream: Option<TcpStream>,
    peer: SocketAddr,
}

impl DataConnection {
    fn data_error(msg: String) -> FtsError {
        FtsError::DataConnectionFailed(msg)
    }

    /// Open the data channel to the address advertised by a PASV reply
    pub fn connect(host: IpAddr, port: u16, timeout: Duration) -> Result<Self> {
        let peer = SocketAddr::new(host, port);
        info!("Opening passive data connection to {}", peer);

        let stream = TcpStream::connect_timeout(&peer, timeout).map_err(|e| {
            error!("Failed to open data connection to {}: {}", peer, e);
            Self::data_error(format!("Failed to connect to {}: {}", peer, e))
        })?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        Ok(Self {
            stream: Some(stream),
            peer,
        })
    }

    /// Send data over the connection
    pub fn send_data(&mut self, data: &[u8]) -> Result<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Self::data_error("No data connection established".to_string()))?;

        stream
            .write(data)
            .map_err(|e| Self::data_error(format!("Failed to send data: {}", e)))
    }

    /// Receive data from the connection; 0 means the server finished sending
    pub fn receive_data(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Self::data_error("No data connection established".to_string()))?;

        stream
            .read(buffer)
            .map_err(|e| Self::data_error(format!("Failed to receive data: {}", e)))
    }

    /// Close the data connection; for uploads this signals end of file
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush();
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("Data socket shutdown: {}", e);
            }
            info!("Data connection to {} closed", self.peer);
        }
        Ok(())
    }
}

impl Drop for DataConnection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
