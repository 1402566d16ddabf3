//! Fakes shared by the unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Read, Write};

use crate::client::FtpTransport;
use crate::error::{FtsError, Result};
use crate::params::{Action, ServerGroup, TransferParameters};
use crate::prompt::Console;
use crate::responses::FtpResponse;

/// Console fed from a queue of answers; an empty queue reads as end of input
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    pub output: String,
    pub prompts: Vec<String>,
    pub secret_prompts: usize,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.secret_prompts += 1;
        self.read_line(prompt)
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }
}

/// In-memory transport recording every call it receives
#[derive(Debug, Default)]
pub struct StubTransport {
    pub calls: Vec<String>,
    pub fail_connect: bool,
    pub fail_login: bool,
    pub fail_host_login: bool,
    pub missing_directory: bool,
    pub remote_files: HashMap<String, Vec<u8>>,
    /// Downloads that write half the file and then fail
    pub broken_downloads: HashSet<String>,
    /// Transfer of this file drops the control connection
    pub drop_connection_on: Option<String>,
    pub uploads: HashMap<String, Vec<u8>>,
}

impl StubTransport {
    pub fn with_remote_file(name: &str, content: &[u8]) -> Self {
        let mut stub = Self::default();
        stub.remote_files.insert(name.to_string(), content.to_vec());
        stub
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    pub fn transfer_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| c.starts_with("retrieve ") || c.starts_with("store "))
            .count()
    }

    fn check_dropped(&self, filename: &str) -> Result<()> {
        if self.drop_connection_on.as_deref() == Some(filename) {
            return Err(FtsError::ConnectionLost("stub dropped the line".to_string()));
        }
        Ok(())
    }
}

impl FtpTransport for StubTransport {
    fn connect(&mut self, address: &str) -> Result<String> {
        self.calls.push(format!("connect {}", address));
        if self.fail_connect {
            return Err(FtsError::ConnectionRefused(address.to_string()));
        }
        Ok("Stub gate ready".to_string())
    }

    fn login(&mut self, user: &str, _password: &str) -> Result<()> {
        self.calls.push(format!("login {}", user));
        if self.fail_login {
            return Err(FtsError::InvalidCredentials {
                code: 530,
                message: "Login incorrect.".to_string(),
            });
        }
        Ok(())
    }

    fn send_raw(&mut self, command: &str) -> Result<FtpResponse> {
        let verb = command.split_whitespace().next().unwrap_or_default();
        if verb == "PASS" {
            self.calls.push("PASS ****".to_string());
        } else {
            self.calls.push(command.to_string());
        }

        match verb {
            "USER" if self.fail_host_login => Err(FtsError::InvalidCredentials {
                code: 530,
                message: "Login incorrect.".to_string(),
            }),
            "USER" => Ok(FtpResponse::new(331, "Password required".to_string())),
            "PASS" => Ok(FtpResponse::new(230, "Logged in".to_string())),
            _ => Ok(FtpResponse::new(200, "OK".to_string())),
        }
    }

    fn pwd(&mut self) -> Result<String> {
        self.calls.push("pwd".to_string());
        Ok("/".to_string())
    }

    fn cwd(&mut self, path: &str) -> Result<()> {
        self.calls.push(format!("cwd {}", path));
        if self.missing_directory {
            return Err(FtsError::FileNotFound {
                code: 550,
                message: "Failed to change directory.".to_string(),
            });
        }
        Ok(())
    }

    fn size(&mut self, filename: &str) -> Result<u64> {
        self.calls.push(format!("size {}", filename));
        self.remote_files
            .get(filename)
            .or_else(|| self.uploads.get(filename))
            .map(|content| content.len() as u64)
            .ok_or_else(|| FtsError::FileNotFound {
                code: 550,
                message: "No such file".to_string(),
            })
    }

    fn retrieve(&mut self, filename: &str, sink: &mut dyn Write) -> Result<u64> {
        self.calls.push(format!("retrieve {}", filename));
        self.check_dropped(filename)?;

        let Some(content) = self.remote_files.get(filename) else {
            return Err(FtsError::FileNotFound {
                code: 550,
                message: "No such file".to_string(),
            });
        };

        if self.broken_downloads.contains(filename) {
            sink.write_all(&content[..content.len() / 2])?;
            return Err(FtsError::TransferFailed {
                code: 426,
                message: "Connection closed; transfer aborted.".to_string(),
            });
        }

        sink.write_all(content)?;
        Ok(content.len() as u64)
    }

    fn store(
        &mut self,
        filename: &str,
        source: &mut dyn Read,
        _size_hint: Option<u64>,
    ) -> Result<u64> {
        self.calls.push(format!("store {}", filename));
        self.check_dropped(filename)?;

        let mut content = Vec::new();
        source.read_to_end(&mut content)?;
        let len = content.len() as u64;
        self.uploads.insert(filename.to_string(), content);
        Ok(len)
    }

    fn close(&mut self) -> Result<()> {
        self.calls.push("close".to_string());
        Ok(())
    }
}

/// Parameters for a managed-service session with client ABCDE
pub fn sample_parameters(action: Action, files: &[&str]) -> TransferParameters {
    TransferParameters {
        gateway: "gw1.example.net".to_string(),
        gateway_location: "primary".to_string(),
        gateway_user: "jdoe".to_string(),
        gateway_password: "passcode".to_string(),
        server_group: ServerGroup::Managed,
        instance: Some("id1".to_string()),
        remote_host: "nipon01.internal.net".to_string(),
        remote_user: "id1".to_string(),
        remote_password: "abc123".to_string(),
        remote_directory: "aiprodABCDE/implementor/jdoe".to_string(),
        action,
        files: files.iter().map(|f| f.to_string()).collect(),
    }
}
