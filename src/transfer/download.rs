//! File download functionality

use log::{debug, error, info, warn};
use std::io::Write;
use std::path::Path;

use crate::connection::DataConnection;
use crate::error::{FtsError, Result};
use crate::transfer::progress::{TransferProgress, format_bytes};

/// Stream everything the server sends on `data_connection` into `sink`
pub fn receive_into(
    data_connection: &mut DataConnection,
    sink: &mut dyn Write,
    filename: &str,
) -> Result<u64> {
    info!("Receiving '{filename}'");

    let mut buffer = [0u8; 8192];
    let mut progress = TransferProgress::new(None);

    loop {
        let bytes_received = data_connection.receive_data(&mut buffer)?;
        if bytes_received == 0 {
            debug!(
                "Reached end of file, {} bytes received",
                progress.transferred_bytes()
            );
            break;
        }

        sink.write_all(&buffer[..bytes_received]).map_err(|e| {
            error!("Failed to write to local file: {e}");
            FtsError::TransferFailed {
                code: 550,
                message: format!("Failed to write to local file: {e}"),
            }
        })?;
        progress.add_bytes(bytes_received as u64);

        if progress.transferred_bytes() % 65536 < bytes_received as u64 {
            progress.display(filename);
        }
    }

    sink.flush().map_err(|e| FtsError::TransferFailed {
        code: 550,
        message: format!("Failed to flush local file: {e}"),
    })?;
    progress.finish(filename);

    info!(
        "Download completed: {} in {:?}",
        format_bytes(progress.transferred_bytes()),
        progress.elapsed()
    );
    Ok(progress.transferred_bytes())
}

/// Delete a partially written download so no truncated file is left behind
pub fn remove_partial(local_path: &Path) {
    if local_path.exists() {
        info!("Download failed. Deleting local copy...");
        if let Err(e) = std::fs::remove_file(local_path) {
            warn!("Could not delete {}: {}", local_path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_remove_partial_deletes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(&path, b"half a rep").unwrap();

        remove_partial(&path);
        assert!(!path.exists());

        // Missing file is not an error
        remove_partial(&path);
    }
}
