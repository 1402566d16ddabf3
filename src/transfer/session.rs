//! One gateway session: connect, log in twice, change directory, move files

use log::{debug, error, info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::client::FtpTransport;
use crate::error::{FtsError, Result};
use crate::logging::section_rule;
use crate::params::{Action, ServerGroup, TransferParameters};
use crate::responses::USER_LOGGED_IN;
use crate::transfer::download::remove_partial;

/// Where a session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Disconnected,
    GatewayConnected,
    GatewayAuthenticated,
    HostAuthenticated,
    DirectoryChanged,
    Transferring,
    Closed,
    Failed,
}

/// Per-file results of a session
#[derive(Debug, Default, PartialEq)]
pub struct TransferReport {
    /// File name and byte count reported by the server
    pub completed: Vec<(String, u64)>,
    /// File name and the reason it failed
    pub failed: Vec<(String, String)>,
}

impl TransferReport {
    /// A report with any failed file becomes `FilesFailed`
    pub fn into_result(self) -> Result<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(FtsError::FilesFailed {
                failed: self.failed.len(),
                total: self.failed.len() + self.completed.len(),
            })
        }
    }
}

/// Drives a transport through the gateway login sequence and the file loop
pub struct TransferSession<'a, T: FtpTransport + ?Sized> {
    transport: &'a mut T,
    params: &'a TransferParameters,
    local_dir: PathBuf,
    state: SessionState,
}

impl<'a, T: FtpTransport + ?Sized> TransferSession<'a, T> {
    pub fn new(transport: &'a mut T, params: &'a TransferParameters, local_dir: &Path) -> Self {
        Self {
            transport,
            params,
            local_dir: local_dir.to_path_buf(),
            state: SessionState::Disconnected,
        }
    }

    /// Run the whole session; the connection is closed on every exit path
    pub fn run(&mut self) -> Result<TransferReport> {
        let outcome = self.connect_and_transfer();
        let opened = self.state != SessionState::Disconnected;
        if outcome.is_err() {
            self.state = SessionState::Failed;
        }

        if opened {
            match self.transport.close() {
                Ok(()) => info!("FTP connection closed"),
                Err(e) => warn!("Error while closing the connection: {}", e),
            }
            info!("Disconnected from server");
        }

        if outcome.is_ok() {
            self.state = SessionState::Closed;
        }
        debug!("Session ended in state {:?}", self.state);
        outcome
    }

    fn connect_and_transfer(&mut self) -> Result<TransferReport> {
        let params = self.params;
        info!(
            "Connecting to the {} gate ({})...",
            params.gateway_location, params.gateway
        );

        let welcome = self
            .transport
            .connect(&params.gateway)
            .map_err(|e| gateway_error(params, e))?;
        self.state = SessionState::GatewayConnected;
        info!("Connection established!");
        if !welcome.trim().is_empty() {
            info!("A message from the server:\n{}", welcome.trim());
        }

        info!("When prompted, please approve the sign-in request in your authenticator app...");
        self.transport
            .login(&params.gateway_user, &params.gateway_password)
            .map_err(|e| gateway_error(params, e))?;
        self.state = SessionState::GatewayAuthenticated;

        self.login_to_remote_host()?;
        self.change_directory()?;
        self.transfer_files()
    }

    /// Compound login: the gateway relays `USER user@host` to the destination
    fn login_to_remote_host(&mut self) -> Result<()> {
        let params = self.params;
        let host_kind = match params.server_group {
            ServerGroup::Managed => "managed services host",
            ServerGroup::Other => "non-managed host",
        };
        info!("Logging in to the {}...", host_kind);

        let remote_error = |e: FtsError| {
            debug!("Remote host login failed: {}", e);
            FtsError::RemoteHostAuth {
                user: params.remote_user.clone(),
                host: params.remote_host.clone(),
            }
        };

        let reply = self
            .transport
            .send_raw(&format!("USER {}@{}", params.remote_user, params.remote_host))
            .map_err(remote_error)?;
        if reply.code != USER_LOGGED_IN {
            self.transport
                .send_raw(&format!("PASS {}", params.remote_password))
                .map_err(remote_error)?;
        }

        self.state = SessionState::HostAuthenticated;
        info!("Logged in: {}@{}", params.remote_user, params.remote_host);
        Ok(())
    }

    fn change_directory(&mut self) -> Result<()> {
        let directory = &self.params.remote_directory;
        if self.params.server_group == ServerGroup::Managed {
            info!("By default, transferring files to/from {}", directory);
        }

        match self.transport.pwd() {
            Ok(current) => info!("Currently in {}", current),
            Err(e) if e.is_connection_level() => return Err(e),
            Err(e) => debug!("PWD not available: {}", e),
        }

        info!("Changing directory to: {}", directory);
        match self.transport.cwd(directory) {
            Ok(()) => {
                self.state = SessionState::DirectoryChanged;
                Ok(())
            }
            Err(e) if e.is_connection_level() => Err(e),
            Err(e) => {
                debug!("CWD refused: {}", e);
                Err(FtsError::DirectoryNotFound(directory.clone()))
            }
        }
    }

    fn transfer_files(&mut self) -> Result<TransferReport> {
        info!("Switching to Binary mode.");
        self.transport.send_raw("TYPE I")?;
        self.state = SessionState::Transferring;

        let params = self.params;
        let mut report = TransferReport::default();

        for file in &params.files {
            info!("{}", section_rule());
            info!("Starting {} of {}...", params.action, file);

            let result = match params.action {
                Action::Download => self.download(file),
                Action::Upload => self.upload(file),
            };

            match result {
                Ok(counted) => {
                    let transferred = match self.transport.size(file) {
                        Ok(size) => size,
                        Err(e) => {
                            debug!("SIZE {} unavailable ({}), using local count", file, e);
                            counted
                        }
                    };
                    info!("File transfer successful, transferred {} bytes", transferred);
                    report.completed.push((file.clone(), transferred));
                }
                Err(e) if e.is_connection_level() => {
                    error!("{} of {} aborted: {}", params.action, file, e);
                    return Err(e);
                }
                Err(e) => {
                    match params.action {
                        Action::Download => error!(
                            "{} could not be downloaded from {}: {}",
                            file, params.remote_directory, e
                        ),
                        Action::Upload => error!(
                            "{} could not be uploaded to {}: {}",
                            file, params.remote_directory, e
                        ),
                    }
                    report.failed.push((file.clone(), e.to_string()));
                }
            }
        }

        info!("{}", section_rule());
        Ok(report)
    }

    fn download(&mut self, file: &str) -> Result<u64> {
        let local_path = self.local_dir.join(file);
        let mut local = File::create(&local_path).map_err(|e| FtsError::TransferFailed {
            code: 550,
            message: format!("Cannot create local file '{}': {}", local_path.display(), e),
        })?;

        let result = self.transport.retrieve(file, &mut local);
        drop(local);

        if result.is_err() {
            remove_partial(&local_path);
        }
        result
    }

    fn upload(&mut self, file: &str) -> Result<u64> {
        let local_path = self.local_dir.join(file);
        let mut source = File::open(&local_path).map_err(|e| FtsError::FileNotFound {
            code: 550,
            message: format!("Cannot open local file '{}': {}", local_path.display(), e),
        })?;
        let size = source.metadata().ok().map(|metadata| metadata.len());

        self.transport.store(file, &mut source, size)
    }
}

fn gateway_error(params: &TransferParameters, e: FtsError) -> FtsError {
    debug!("Gateway failure: {}", e);
    FtsError::GatewayConnection {
        gateway: params.gateway.clone(),
        location: params.gateway_location.clone(),
        reason: e.to_string(),
    }
}
