//! Transfer progress tracking and display

use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Progress tracker for file transfers
pub struct TransferProgress {
    total_bytes: Option<u64>,
    transferred_bytes: u64,
    start_time: Instant,
}

impl TransferProgress {
    /// Create a new progress tracker; downloads start with an unknown total
    pub fn new(total_bytes: Option<u64>) -> Self {
        Self {
            total_bytes,
            transferred_bytes: 0,
            start_time: Instant::now(),
        }
    }

    /// Add bytes to current progress
    pub fn add_bytes(&mut self, bytes: u64) {
        self.transferred_bytes += bytes;
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    /// Get current progress percentage, if the total is known
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(100.0),
            Some(total) => Some((self.transferred_bytes as f64 / total as f64 * 100.0).min(100.0)),
            None => None,
        }
    }

    /// Get transfer speed in bytes per second
    pub fn speed_bps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transferred_bytes as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Redraw the progress line in place
    pub fn display(&self, filename: &str) {
        let line = match self.percentage() {
            Some(percentage) => {
                // 50 chars = 100%
                let filled = (percentage / 2.0) as usize;
                let bar = "#".repeat(filled) + &" ".repeat(50 - filled.min(50));
                format!(
                    "\r{}: [{}] {:.1}% ({}) {}",
                    filename,
                    bar,
                    percentage,
                    format_bytes(self.transferred_bytes),
                    format_speed(self.speed_bps())
                )
            }
            None => format!(
                "\r{}: {} {}",
                filename,
                format_bytes(self.transferred_bytes),
                format_speed(self.speed_bps())
            ),
        };

        print!("{}", line);
        if let Err(e) = io::stdout().flush() {
            eprintln!("\nError flushing stdout: {}", e);
        }
    }

    /// Move to the next line after the progress bar
    pub fn finish(&self, filename: &str) {
        self.display(filename);
        println!();
    }
}

/// Format bytes as human readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format speed as human readable string
pub fn format_speed(bps: f64) -> String {
    format!("{}/s", format_bytes(bps as u64))
}
