//! Typed views over table rows

/// Gateway table row: display name and network address
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayEntry {
    pub name: String,
    pub address: String,
}

impl GatewayEntry {
    pub fn from_row(row: &[String]) -> Option<Self> {
        Some(Self {
            name: row.first()?.clone(),
            address: row.get(1)?.clone(),
        })
    }
}

/// Server-group table row: label shown to the user and its internal code
#[derive(Debug, Clone, PartialEq)]
pub struct ServerGroupEntry {
    pub label: String,
    pub code: String,
}

impl ServerGroupEntry {
    pub fn from_row(row: &[String]) -> Option<Self> {
        Some(Self {
            label: row.first()?.clone(),
            code: row.get(1)?.to_lowercase(),
        })
    }
}

/// Non-managed host table row
#[derive(Debug, Clone, PartialEq)]
pub struct HostEntry {
    pub label: String,
    pub address: String,
}

impl HostEntry {
    pub fn from_row(row: &[String]) -> Option<Self> {
        Some(Self {
            label: row.first()?.clone(),
            address: row.get(1)?.clone(),
        })
    }
}

/// Managed-service client instance
///
/// Rows are `instance id, remote host, remote password, client id`; the
/// instance id doubles as the login name on the remote host.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInstanceEntry {
    pub instance_id: String,
    pub remote_host: String,
    pub remote_user: String,
    pub remote_password: String,
    pub client_id: String,
}

impl ClientInstanceEntry {
    pub fn from_row(row: &[String]) -> Option<Self> {
        let instance_id = row.first()?.clone();
        Some(Self {
            remote_user: instance_id.clone(),
            instance_id,
            remote_host: row.get(1)?.clone(),
            remote_password: row.get(2)?.clone(),
            client_id: row.get(3)?.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_client_instance_from_row() {
        let entry = ClientInstanceEntry::from_row(&row(&[
            "id1",
            "nipon01.internal.net",
            "abc123",
            "XRADI",
        ]))
        .unwrap();
        assert_eq!(entry.remote_user, "id1");
        assert_eq!(entry.remote_host, "nipon01.internal.net");
        assert_eq!(entry.client_id, "XRADI");

        assert!(ClientInstanceEntry::from_row(&row(&["id1", "host"])).is_none());
    }

    #[test]
    fn test_server_group_code_is_folded() {
        let entry = ServerGroupEntry::from_row(&row(&["Managed Services", "MS"])).unwrap();
        assert_eq!(entry.code, "ms");
    }
}
