use log::{debug, info, warn};

use crate::error::{FtsError, Result};
use crate::logging::mask;
use crate::prompt::QUIT_TOKEN;
use crate::prompt::console::Console;
use crate::prompt::menu::{render_header, render_menu};
use crate::tables::{Menu, Table};

const DEFAULT_COLUMNS: usize = 4;

/// How an answer is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Ordinal into the menu
    Index,
    /// Free text, or a key/value of the table when one is given
    Text,
    /// Whitespace-separated tokens
    List,
}

/// Everything a prompt can resolve to; fields that do not apply stay empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Case-folded table or menu key
    pub key: Option<String>,
    /// Full table row of the key
    pub row: Option<Vec<String>>,
    /// Answer as typed (trimmed)
    pub text: Option<String>,
    pub tokens: Vec<String>,
}

impl Resolution {
    fn from_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn from_key(key: &str, table: Option<&Table>) -> Self {
        Self {
            key: Some(key.to_string()),
            row: table.and_then(|t| t.get(key)).map(<[String]>::to_vec),
            ..Self::default()
        }
    }

    /// Second column of the row, else the typed text, else the key
    pub fn value(&self) -> Option<&str> {
        self.row
            .as_ref()
            .and_then(|row| row.get(1))
            .or(self.text.as_ref())
            .or(self.key.as_ref())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    Empty,
    Invalid,
}

impl RetryReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "!!! Can't be empty. Please enter a valid value...",
            Self::Invalid => "!!! Invalid selection...",
        }
    }
}

/// Outcome of checking one answer
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Accept(Resolution),
    Retry(RetryReason),
    Abort,
}

/// One parameter to resolve
#[derive(Debug, Clone)]
pub struct Question<'t> {
    header: String,
    prompt: String,
    response: ResponseType,
    table: Option<&'t Table>,
    menu: Option<&'t Menu>,
    masked: bool,
    allow_quit: bool,
    columns: usize,
}

impl<'t> Question<'t> {
    pub fn new(header: &str, prompt: &str) -> Self {
        Self {
            header: header.to_string(),
            prompt: prompt.to_string(),
            response: ResponseType::Text,
            table: None,
            menu: None,
            masked: false,
            allow_quit: true,
            columns: DEFAULT_COLUMNS,
        }
    }

    /// Numbered selection over a table's own menu
    pub fn select(header: &str, prompt: &str, table: &'t Table) -> Self {
        Self::new(header, prompt)
            .response(ResponseType::Index)
            .table(table)
            .menu(table.menu())
    }

    pub fn response(mut self, response: ResponseType) -> Self {
        self.response = response;
        self
    }

    pub fn table(mut self, table: &'t Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn menu(mut self, menu: &'t Menu) -> Self {
        self.menu = Some(menu);
        self
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn no_quit(mut self) -> Self {
        self.allow_quit = false;
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    fn prompt_line(&self) -> String {
        if self.allow_quit {
            format!("{} ([Q/q] to quit): ", self.prompt)
        } else {
            format!("{}: ", self.prompt)
        }
    }

    fn shown(&self, value: &str) -> String {
        if self.masked {
            mask(value)
        } else {
            value.to_string()
        }
    }

    /// Key of the table or menu matching `value` by key, or by table value
    fn lookup(&self, value: &str) -> Option<Resolution> {
        if let Some(table) = self.table {
            if table.contains_key(value) {
                return Some(Resolution::from_key(&value.to_lowercase(), Some(table)));
            }
            return table
                .find_key_by_value(value)
                .map(|key| Resolution::from_key(key, Some(table)));
        }

        let menu = self.menu?;
        menu.iter()
            .map(|(_, key)| key)
            .find(|key| key.eq_ignore_ascii_case(value))
            .map(|key| Resolution::from_key(key, None))
    }
}

/// Check one typed answer against a question
pub fn validate(question: &Question, raw: &str) -> Validation {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Validation::Retry(RetryReason::Empty);
    }
    if question.allow_quit && trimmed.eq_ignore_ascii_case(QUIT_TOKEN) {
        return Validation::Abort;
    }
    // Secrets are taken exactly as typed
    let answer = if question.masked { raw } else { trimmed };

    match question.response {
        ResponseType::Index => {
            let Some(menu) = question.menu else {
                return Validation::Retry(RetryReason::Invalid);
            };
            let Some(key) = answer.parse::<usize>().ok().and_then(|n| menu.get(n)) else {
                return Validation::Retry(RetryReason::Invalid);
            };
            match question.table {
                Some(table) if !table.contains_key(key) => Validation::Retry(RetryReason::Invalid),
                table => Validation::Accept(Resolution::from_key(key, table)),
            }
        }
        ResponseType::Text => {
            if question.table.is_none() && question.menu.is_none() {
                return Validation::Accept(Resolution::from_text(answer));
            }
            match question.lookup(answer) {
                Some(resolution) => Validation::Accept(resolution),
                None => Validation::Retry(RetryReason::Invalid),
            }
        }
        ResponseType::List => Validation::Accept(Resolution {
            text: Some(answer.to_string()),
            tokens: answer.split_whitespace().map(str::to_string).collect(),
            ..Resolution::default()
        }),
    }
}

/// Prompt loop over a `Console`
pub struct Resolver<'c, C: Console> {
    console: &'c mut C,
}

impl<'c, C: Console> Resolver<'c, C> {
    pub fn new(console: &'c mut C) -> Self {
        Self { console }
    }

    /// Accept `candidate` when the question's table knows it, else prompt
    pub fn resolve(&mut self, question: &Question, candidate: Option<&str>) -> Result<Resolution> {
        let candidate = candidate
            .filter(|c| !c.trim().is_empty())
            .map(|c| if question.masked { c } else { c.trim() });

        if let Some(value) = candidate {
            let accepted = if question.table.is_some() || question.menu.is_some() {
                question.lookup(value)
            } else {
                Some(Resolution::from_text(value))
            };

            match accepted {
                Some(resolution) => {
                    info!("{} accepted", question.header);
                    return Ok(resolution);
                }
                None => warn!(
                    "{} passed ({}) is invalid...",
                    question.header,
                    question.shown(value)
                ),
            }
        }

        self.ask(question)
    }

    /// Accept a non-empty list of tokens as given, else prompt for one
    pub fn resolve_list(
        &mut self,
        question: &Question,
        candidates: &[String],
    ) -> Result<Resolution> {
        if candidates.is_empty() {
            return self.ask(question);
        }

        info!("{} accepted", question.header);
        Ok(Resolution {
            text: Some(candidates.join(" ")),
            tokens: candidates.to_vec(),
            ..Resolution::default()
        })
    }

    /// Prompt until the answer validates; quitting or end of input is `UserQuit`
    pub fn ask(&mut self, question: &Question) -> Result<Resolution> {
        if question.menu.is_some_and(Menu::is_empty) {
            return Err(FtsError::ConfigInvalid(format!(
                "No {} to choose from",
                question.header.to_lowercase()
            )));
        }
        info!("User prompted for {}", question.header.to_lowercase());

        let prompt = question.prompt_line();
        loop {
            self.console.write(&render_header(&question.header))?;
            if let Some(menu) = question.menu {
                self.console
                    .write(&render_menu(menu, question.table, question.columns))?;
            }

            let answer = if question.masked {
                self.console.read_secret(&prompt)?
            } else {
                self.console.read_line(&prompt)?
            };

            let Some(answer) = answer else {
                debug!("End of input at the {} prompt", question.header.to_lowercase());
                return Err(FtsError::UserQuit);
            };

            match validate(question, &answer) {
                Validation::Accept(resolution) => {
                    let verb = match question.response {
                        ResponseType::Index => "selected",
                        ResponseType::Text | ResponseType::List => "entered",
                    };
                    let shown = resolution
                        .key
                        .as_deref()
                        .or(resolution.text.as_deref())
                        .unwrap_or_default();
                    info!("{} ({}) {}", question.header, question.shown(shown), verb);
                    return Ok(resolution);
                }
                Validation::Retry(reason) => {
                    debug!("{}: {:?} answer rejected", question.header, reason);
                    self.console.write(&format!("{}\n", reason.message()))?;
                }
                Validation::Abort => {
                    info!("User quit at the {} prompt", question.header.to_lowercase());
                    return Err(FtsError::UserQuit);
                }
            }
        }
    }
}
