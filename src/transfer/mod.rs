//! Streaming RETR/STOR and the per-run transfer session

pub mod download;
pub mod progress;
pub mod session;
pub mod upload;

pub use download::receive_into;
pub use session::{TransferReport, TransferSession};
pub use upload::{send_from, validate_upload_file};
