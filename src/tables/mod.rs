//! Connection details loaded from delimited table files

pub mod entries;
pub mod loader;

use log::info;
use std::path::Path;

use crate::config::TableSettings;
use crate::error::{FtsError, Result};

pub use entries::{ClientInstanceEntry, GatewayEntry, HostEntry, ServerGroupEntry};
pub use loader::{Menu, Table};

/// Every table a run needs
#[derive(Debug, Clone)]
pub struct Tables {
    pub gateways: Table,
    pub server_groups: Table,
    pub hosts: Table,
    pub clients: Table,
}

impl Tables {
    /// Check that the directory and all files exist, then load each table
    pub fn load(settings: &TableSettings) -> Result<Self> {
        info!("Checking configurations...");

        let directory = Path::new(&settings.directory);
        if !directory.is_dir() {
            return Err(FtsError::ConfigMissing(format!(
                "{} directory",
                directory.display()
            )));
        }

        let files = [
            &settings.gateways,
            &settings.server_groups,
            &settings.hosts,
            &settings.clients,
        ];
        for file in files {
            let path = directory.join(file);
            if !path.is_file() {
                return Err(FtsError::ConfigMissing(path.display().to_string()));
            }
        }
        info!("Configurations validated...");

        let delimiter = settings.delimiter;
        Ok(Self {
            gateways: Table::load(&directory.join(&settings.gateways), delimiter, 2, false)?,
            server_groups: Table::load(
                &directory.join(&settings.server_groups),
                delimiter,
                2,
                false,
            )?,
            hosts: Table::load(&directory.join(&settings.hosts), delimiter, 2, false)?,
            clients: Table::load(&directory.join(&settings.clients), delimiter, 4, true)?,
        })
    }

    pub fn client_instances(&self) -> impl Iterator<Item = ClientInstanceEntry> + '_ {
        self.clients.rows().filter_map(ClientInstanceEntry::from_row)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    use crate::config::TableSettings;

    /// Write a full set of tables into `dir` and return settings pointing at them
    pub fn write_tables(dir: &Path) -> TableSettings {
        fs::write(
            dir.join("gateways.csv"),
            "Name,Address\nprimary,gw1.example.net\nbackup,gw2.example.net\n",
        )
        .unwrap();
        fs::write(
            dir.join("server_groups.csv"),
            "Label,Code\nManaged Services,ms\nOther Hosts,nonms\n",
        )
        .unwrap();
        fs::write(
            dir.join("non_ms_hosts.csv"),
            "Label,Address\nbuild,build01.internal.net\nreports,rpt01.internal.net\n",
        )
        .unwrap();
        fs::write(
            dir.join("ms_client_accounts.csv"),
            "Instance,Hostname,FTP Password,Client ID\n\
             id2,hague01.internal.net,59K>oSgs,MSXYZ\n\
             id1,nipon01.internal.net,abc123,ABCDE\n\
             id3,nipon02.internal.net,xyz789,ABCDE\n",
        )
        .unwrap();

        TableSettings {
            directory: dir.display().to_string(),
            ..TableSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let settings = fixtures::write_tables(dir.path());

        let tables = Tables::load(&settings).unwrap();
        assert_eq!(tables.gateways.get("primary").unwrap()[1], "gw1.example.net");
        assert_eq!(tables.clients.menu().get(1), Some("id1"));

        let ids: Vec<_> = tables
            .client_instances()
            .map(|entry| entry.instance_id)
            .collect();
        assert_eq!(ids, vec!["id1", "id2", "id3"]);
    }

    #[test]
    fn test_missing_gateway_table_is_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = fixtures::write_tables(dir.path());
        fs::remove_file(dir.path().join("gateways.csv")).unwrap();

        match Tables::load(&settings) {
            Err(FtsError::ConfigMissing(what)) => assert!(what.ends_with("gateways.csv")),
            other => panic!("expected ConfigMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_header_only_table_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let settings = fixtures::write_tables(dir.path());
        fs::write(dir.path().join("non_ms_hosts.csv"), "Label,Address\n").unwrap();

        let tables = Tables::load(&settings).unwrap();
        assert_eq!(tables.hosts.len(), 0);
        assert_eq!(tables.gateways.len(), 2);
    }

    #[test]
    fn test_missing_directory_is_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TableSettings {
            directory: dir.path().join("nope").display().to_string(),
            ..TableSettings::default()
        };
        assert!(matches!(
            Tables::load(&settings),
            Err(FtsError::ConfigMissing(_))
        ));
    }
}
