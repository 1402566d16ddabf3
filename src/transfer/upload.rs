//! File upload functionality

use log::{debug, error, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::connection::DataConnection;
use crate::error::{FtsError, Result};
use crate::transfer::progress::{TransferProgress, format_bytes};

/// Stream `source` to the server over `data_connection`
pub fn send_from(
    data_connection: &mut DataConnection,
    source: &mut dyn Read,
    filename: &str,
    total_bytes: Option<u64>,
) -> Result<u64> {
    info!("Sending '{filename}'");

    let mut progress = TransferProgress::new(total_bytes);
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = source.read(&mut buffer).map_err(|e| {
            error!("Failed to read from local file: {e}");
            FtsError::TransferFailed {
                code: 550,
                message: format!("Failed to read local file: {e}"),
            }
        })?;
        if bytes_read == 0 {
            debug!("Reached end of file, {} bytes sent", progress.transferred_bytes());
            break;
        }

        let mut offset = 0;
        while offset < bytes_read {
            let bytes_sent = data_connection.send_data(&buffer[offset..bytes_read])?;
            if bytes_sent == 0 {
                return Err(FtsError::DataConnectionFailed(
                    "Server stopped accepting data".to_string(),
                ));
            }
            offset += bytes_sent;
        }
        progress.add_bytes(bytes_read as u64);

        if progress.transferred_bytes() % 65536 < bytes_read as u64 {
            progress.display(filename);
        }
    }

    progress.finish(filename);
    info!(
        "Upload completed: {} in {:?}",
        format_bytes(progress.transferred_bytes()),
        progress.elapsed()
    );
    Ok(progress.transferred_bytes())
}

/// Validate that a file can be uploaded
pub fn validate_upload_file(local_path: &Path) -> Result<()> {
    if !local_path.exists() {
        return Err(FtsError::FileNotFound {
            code: 550,
            message: format!("Local file '{}' does not exist", local_path.display()),
        });
    }

    if !local_path.is_file() {
        return Err(FtsError::TransferFailed {
            code: 550,
            message: format!("'{}' is not a file", local_path.display()),
        });
    }

    match File::open(local_path) {
        Ok(_) => Ok(()),
        Err(e) => Err(FtsError::PermissionDenied {
            code: 550,
            message: format!("Cannot read file '{}': {}", local_path.display(), e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_upload_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payload.dat");
        fs::write(&file, b"data").unwrap();

        assert!(validate_upload_file(&file).is_ok());
        assert!(matches!(
            validate_upload_file(&dir.path().join("absent.dat")),
            Err(FtsError::FileNotFound { .. })
        ));
        assert!(matches!(
            validate_upload_file(dir.path()),
            Err(FtsError::TransferFailed { .. })
        ));
    }
}
