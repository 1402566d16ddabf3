//! Resolve every value a transfer needs, from flags, settings, tables or prompts
//!
//! Order: gateway, gateway username, gateway password, server group, then
//! either a managed instance (host, user, password and directory all derive
//! from it) or a non-managed host with typed credentials and directory,
//! then the action and the file list.

use clap::ValueEnum;
use log::{debug, info, warn};
use std::fmt;
use std::path::Path;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::{FtsError, Result};
use crate::logging::mask;
use crate::prompt::{Console, Question, Resolver, ResponseType};
use crate::tables::{
    ClientInstanceEntry, GatewayEntry, HostEntry, Menu, ServerGroupEntry, Tables,
};
use crate::transfer::validate_upload_file;

const CHOICE_PROMPT: &str = "\n\nYour choice";
const USERNAME_PROMPT: &str = "Enter username";
const PASSCODE_PROMPT: &str = "Enter gateway password";
const PASSWORD_PROMPT: &str = "Enter password";
const INSTANCE_COLUMNS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Download,
    Upload,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Upload => "upload",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "download" => Some(Self::Download),
            "upload" => Some(Self::Upload),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerGroup {
    /// Hosts whose details come from the managed client table
    Managed,
    /// Hosts picked from the non-managed table with typed credentials
    Other,
}

/// Everything one transfer session needs
#[derive(Debug, Clone, PartialEq)]
pub struct TransferParameters {
    pub gateway: String,
    pub gateway_location: String,
    pub gateway_user: String,
    pub gateway_password: String,
    pub server_group: ServerGroup,
    pub instance: Option<String>,
    pub remote_host: String,
    pub remote_user: String,
    pub remote_password: String,
    pub remote_directory: String,
    pub action: Action,
    pub files: Vec<String>,
}

struct RemoteTarget {
    instance: Option<String>,
    host: String,
    user: String,
    password: String,
    directory: String,
}

/// Builds `TransferParameters` by asking for whatever the flags leave out
pub struct Assembler<'a, C: Console> {
    settings: &'a Settings,
    tables: &'a Tables,
    resolver: Resolver<'a, C>,
}

impl<'a, C: Console> Assembler<'a, C> {
    pub fn new(settings: &'a Settings, tables: &'a Tables, console: &'a mut C) -> Self {
        Self {
            settings,
            tables,
            resolver: Resolver::new(console),
        }
    }

    pub fn assemble(&mut self, cli: &Cli) -> Result<TransferParameters> {
        if cli.gateway.is_some()
            || cli.username.is_some()
            || cli.passcode.is_some()
            || cli.server.is_some()
            || cli.action.is_some()
            || !cli.file.is_empty()
        {
            info!("Checking for validity of arguments passed...");
        }

        let gateway = self.resolver.resolve(
            &Question::select("Gateway", CHOICE_PROMPT, &self.tables.gateways),
            cli.gateway.as_deref(),
        )?;
        let gateway = gateway
            .row
            .as_deref()
            .and_then(GatewayEntry::from_row)
            .ok_or_else(|| FtsError::ConfigInvalid("gateway row without an address".to_string()))?;

        let (gateway_user, gateway_password) = self.gateway_credentials(cli)?;

        let group = self.server_group(cli)?;
        let remote = match group {
            ServerGroup::Managed => self.managed_target(cli, &gateway_user)?,
            ServerGroup::Other => self.other_target()?,
        };
        info!("Credentials to use: {}@{}", remote.user, remote.host);

        let action = self.action(cli)?;
        let files = self.files(cli, action)?;

        Ok(TransferParameters {
            gateway: gateway.address,
            gateway_location: gateway.name,
            gateway_user,
            gateway_password,
            server_group: group,
            instance: remote.instance,
            remote_host: remote.host,
            remote_user: remote.user,
            remote_password: remote.password,
            remote_directory: remote.directory,
            action,
            files,
        })
    }

    fn gateway_credentials(&mut self, cli: &Cli) -> Result<(String, String)> {
        let settings: &'a Settings = self.settings;
        let gateway = &settings.gateway;
        let mut settings_password = gateway.password.as_deref();

        let user = match (cli.username.as_deref(), gateway.username.as_deref()) {
            (Some(user), _) => {
                // A user passed on the command line never pairs with a stored password
                settings_password = None;
                self.ask_text(
                    Question::new("Gateway username", USERNAME_PROMPT).no_quit(),
                    Some(user),
                )?
            }
            (None, Some(user)) => {
                info!("Gateway user ({}) taken from settings", user);
                user.to_string()
            }
            (None, None) => self.ask_text(
                Question::new("Gateway username", USERNAME_PROMPT).no_quit(),
                None,
            )?,
        };

        let password = match (cli.passcode.as_deref(), settings_password) {
            (None, Some(password)) => {
                info!("Gateway password ({}) taken from settings", mask(password));
                password.to_string()
            }
            (passed, _) => self.ask_text(
                Question::new("Gateway password", PASSCODE_PROMPT)
                    .masked()
                    .no_quit(),
                passed,
            )?,
        };

        Ok((user, password))
    }

    fn server_group(&mut self, cli: &Cli) -> Result<ServerGroup> {
        let resolution = self.resolver.resolve(
            &Question::select("Server group", CHOICE_PROMPT, &self.tables.server_groups),
            cli.server.as_deref(),
        )?;

        let entry = resolution
            .row
            .as_deref()
            .and_then(ServerGroupEntry::from_row)
            .ok_or_else(|| FtsError::ConfigInvalid("server group row without a code".to_string()))?;

        let group = if entry.code == self.settings.transfer.managed_code.to_lowercase() {
            ServerGroup::Managed
        } else {
            ServerGroup::Other
        };

        let all_passed = cli.gateway.is_some()
            && cli.username.is_some()
            && cli.passcode.is_some()
            && cli.action.is_some()
            && !cli.file.is_empty();
        match group {
            ServerGroup::Other if cli.instance.is_some() => warn!(
                "Non-managed connection doesn't need an instance ({}) parameter...",
                cli.instance.as_deref().unwrap_or_default()
            ),
            ServerGroup::Managed if all_passed && cli.instance.is_some() => {
                info!("All required arguments passed")
            }
            ServerGroup::Other if all_passed => info!("All required arguments passed"),
            _ => {}
        }

        Ok(group)
    }

    fn managed_target(&mut self, cli: &Cli, gateway_user: &str) -> Result<RemoteTarget> {
        let passed = cli.instance.as_deref().and_then(|instance| {
            let entry = self
                .tables
                .clients
                .get(instance)
                .and_then(ClientInstanceEntry::from_row);
            if entry.is_none() {
                warn!(
                    "Managed services instance passed as an argument ({}) is unrecognized...",
                    instance
                );
            }
            entry
        });

        let entry = match passed {
            Some(entry) => entry,
            None => self.select_instance()?,
        };

        let transfer = &self.settings.transfer;
        let directory = managed_directory(
            &transfer.directory_prefix,
            &entry.client_id,
            &transfer.directory_infix,
            gateway_user,
        );

        Ok(RemoteTarget {
            instance: Some(entry.instance_id),
            host: entry.remote_host,
            user: entry.remote_user,
            password: entry.remote_password,
            directory,
        })
    }

    /// Pick a client id, then one of that client's instances
    fn select_instance(&mut self) -> Result<ClientInstanceEntry> {
        info!("User prompted to select a managed services client ID from the list...");

        let mut client_ids: Vec<String> = self
            .tables
            .client_instances()
            .map(|entry| entry.client_id)
            .collect();
        client_ids.sort();
        client_ids.dedup();
        let client_menu = Menu::from_keys(client_ids);

        let client = self.resolver.ask(
            &Question::new("Client ID", CHOICE_PROMPT)
                .response(ResponseType::Index)
                .menu(&client_menu),
        )?;
        let client_id = client.key.unwrap_or_default();

        let instance_menu = Menu::from_keys(
            self.tables
                .client_instances()
                .filter(|entry| entry.client_id == client_id)
                .map(|entry| entry.instance_id.to_lowercase()),
        );

        let instance = self.resolver.ask(
            &Question::new("Managed Services Instance", CHOICE_PROMPT)
                .response(ResponseType::Index)
                .table(&self.tables.clients)
                .menu(&instance_menu)
                .columns(INSTANCE_COLUMNS),
        )?;

        instance
            .row
            .as_deref()
            .and_then(ClientInstanceEntry::from_row)
            .ok_or_else(|| FtsError::ConfigInvalid("client row without 4 columns".to_string()))
    }

    fn other_target(&mut self) -> Result<RemoteTarget> {
        let host = self
            .resolver
            .ask(&Question::select(
                "Non-managed host",
                "\n\nTransfer files to/from",
                &self.tables.hosts,
            ))?
            .row
            .as_deref()
            .and_then(HostEntry::from_row)
            .map(|entry| entry.address)
            .ok_or_else(|| FtsError::ConfigInvalid("host row without an address".to_string()))?;

        info!("User prompted to enter credentials for remote host and file location");
        let user = self.ask_text(
            Question::new(&format!("Credentials for {}", host), USERNAME_PROMPT).no_quit(),
            None,
        )?;
        let password = self.ask_text(
            Question::new("Remote password", PASSWORD_PROMPT)
                .masked()
                .no_quit(),
            None,
        )?;
        let directory = self.ask_text(
            Question::new(
                "Remote directory",
                "Enter directory (absolute path) on remote host",
            ),
            None,
        )?;

        Ok(RemoteTarget {
            instance: None,
            host,
            user,
            password,
            directory,
        })
    }

    fn action(&mut self, cli: &Cli) -> Result<Action> {
        if let Some(action) = cli.action {
            info!("Action accepted");
            return Ok(action);
        }

        let menu = Menu::from_keys([Action::Download.as_str(), Action::Upload.as_str()]);
        let resolution = self.resolver.ask(
            &Question::new("Action", CHOICE_PROMPT)
                .response(ResponseType::Index)
                .menu(&menu),
        )?;

        resolution
            .key
            .as_deref()
            .and_then(Action::from_key)
            .ok_or_else(|| FtsError::ConfigInvalid("unknown action selected".to_string()))
    }

    fn files(&mut self, cli: &Cli, action: Action) -> Result<Vec<String>> {
        let question = Question::new(
            &format!("Files to {}", action),
            "Please specify filename(s) separated by a space",
        )
        .response(ResponseType::List);
        let files = self.resolver.resolve_list(&question, &cli.file)?.tokens;

        match action {
            Action::Upload => check_upload_files(
                files,
                self.settings.local_directory(),
                self.settings.transfer.strict_upload,
            ),
            Action::Download => Ok(files),
        }
    }

    fn ask_text(&mut self, question: Question, candidate: Option<&str>) -> Result<String> {
        let resolution = self.resolver.resolve(&question, candidate)?;
        Ok(resolution.value().unwrap_or_default().to_string())
    }
}

/// `<prefix><client id>/<infix>/<gateway user>`
pub fn managed_directory(prefix: &str, client_id: &str, infix: &str, gateway_user: &str) -> String {
    format!("{}{}/{}/{}", prefix, client_id, infix, gateway_user)
}

/// Keep the files that exist under `local_dir`
///
/// Missing files are skipped, or fail the run when `strict` is set. Nothing
/// left to send is an error either way.
pub fn check_upload_files(
    files: Vec<String>,
    local_dir: &Path,
    strict: bool,
) -> Result<Vec<String>> {
    info!("Validating if upload file(s) exists...");

    let mut present = Vec::with_capacity(files.len());
    for file in files {
        match validate_upload_file(&local_dir.join(&file)) {
            Ok(()) => present.push(file),
            Err(e) => {
                warn!("{} does not exist in {}", file, local_dir.display());
                if strict {
                    debug!("Upload check failed: {}", e);
                    return Err(FtsError::LocalFileMissing {
                        file,
                        directory: local_dir.display().to_string(),
                    });
                }
            }
        }
    }

    if present.is_empty() {
        return Err(FtsError::NothingToTransfer);
    }
    info!("All file(s) to upload confirmed to exist");
    Ok(present)
}
