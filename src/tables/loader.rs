//! Delimited table files: a header row, then one entry per row

use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{FtsError, Result};

/// Display ordinal (1..N) to primary key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    entries: BTreeMap<usize, String>,
}

impl Menu {
    /// Number the keys 1..N in the order given, skipping repeats
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = BTreeMap::new();
        let mut seen = Vec::new();
        for key in keys {
            let key = key.into();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key.clone());
            entries.insert(entries.len() + 1, key);
        }
        Self { entries }
    }

    pub fn get(&self, ordinal: usize) -> Option<&str> {
        self.entries.get(&ordinal).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|(ordinal, key)| (*ordinal, key.as_str()))
    }
}

/// Primary mapping (case-folded first column to full row) plus its menu
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: HashMap<String, Vec<String>>,
    menu: Menu,
}

impl Table {
    /// Read and parse a table file
    pub fn load(path: &Path, delimiter: char, min_columns: usize, sort: bool) -> Result<Self> {
        if !path.is_file() {
            return Err(FtsError::ConfigMissing(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let table = Self::parse(&name, &content, delimiter, min_columns, sort)?;
        debug!("{}: {} entries", name, table.len());
        info!("{} successfully loaded...", name);
        Ok(table)
    }

    /// Parse table text; the first non-blank line is the header
    pub fn parse(
        name: &str,
        content: &str,
        delimiter: char,
        min_columns: usize,
        sort: bool,
    ) -> Result<Self> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        match lines.next() {
            Some((_, header)) => {
                debug!("{} columns: {}", name, split_row(header, delimiter).join(", "))
            }
            None => {
                return Err(FtsError::ConfigInvalid(format!("{} is empty", name)));
            }
        }

        let mut rows = HashMap::new();
        let mut order = Vec::new();

        for (index, line) in lines {
            let row = split_row(line, delimiter);
            if row.len() < min_columns || row[0].is_empty() {
                return Err(FtsError::ConfigInvalid(format!(
                    "{} line {}: expected at least {} columns, found {}",
                    name,
                    index + 1,
                    min_columns,
                    row.len()
                )));
            }

            let key = row[0].to_lowercase();
            if rows.insert(key.clone(), row).is_some() {
                warn!(
                    "{} line {}: duplicate entry '{}' replaces the earlier one",
                    name,
                    index + 1,
                    key
                );
            } else {
                order.push(key);
            }
        }

        if rows.is_empty() {
            debug!("{} has no entries", name);
        }

        if sort {
            order.sort();
        }

        Ok(Self {
            rows,
            menu: Menu::from_keys(order),
        })
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Row for a key, matched case-insensitively
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.rows.get(&key.to_lowercase()).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Key of the first row (in menu order) whose second column equals `value`
    pub fn find_key_by_value(&self, value: &str) -> Option<&str> {
        self.menu.iter().map(|(_, key)| key).find(|key| {
            self.rows
                .get(*key)
                .and_then(|row| row.get(1))
                .is_some_and(|v| v.eq_ignore_ascii_case(value))
        })
    }

    /// Rows in menu order
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.menu
            .iter()
            .filter_map(|(_, key)| self.rows.get(key).map(Vec::as_slice))
    }
}

/// Split one line into trimmed fields, honouring double-quoted fields
fn split_row(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}
