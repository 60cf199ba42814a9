//! Progress reporting for reads and writes.

/// Progress information for a transfer.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub done: u64,
    /// Total bytes, when known up front (writes stream and learn it at the end)
    pub total: Option<u64>,
    /// Virtual path being transferred
    pub path: String,
}

impl TransferProgress {
    /// Create a new progress report.
    pub fn new(done: u64, total: Option<u64>, path: impl Into<String>) -> Self {
        Self {
            done,
            total,
            path: path.into(),
        }
    }

    /// Progress as a percentage (0.0 to 100.0), when the total is known.
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some((self.done as f64 / total as f64) * 100.0),
            None => None,
        }
    }

    /// Check if transfer is complete.
    pub fn is_complete(&self) -> bool {
        self.total.is_some_and(|total| self.done >= total)
    }
}

/// Type alias for progress callback function.
///
/// The callback receives progress information and can return `false` to cancel the transfer.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) -> bool + Send>;

/// Create a simple progress callback that prints to stdout.
///
/// # Example
/// ```no_run
/// use dropbox_fs::progress::make_progress_bar;
///
/// let callback = make_progress_bar();
/// ```
pub fn make_progress_bar() -> ProgressCallback {
    Box::new(|progress: &TransferProgress| {
        match progress.percent() {
            Some(percent) => {
                let bar_width = 40;
                let filled = ((percent / 100.0 * bar_width as f64) as usize).min(bar_width);
                let empty = bar_width - filled;
                print!(
                    "\r[{}{}] {:.1}% {} - {} bytes",
                    "=".repeat(filled),
                    " ".repeat(empty),
                    percent,
                    progress.path,
                    progress.done
                );
            }
            None => print!("\r{} - {} bytes", progress.path, progress.done),
        }

        if progress.is_complete() {
            println!();
        }

        use std::io::Write;
        let _ = std::io::stdout().flush();

        true // Continue transfer
    })
}
