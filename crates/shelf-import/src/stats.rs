//! Import run statistics.

use std::time::Instant;

/// Counters accumulated over one import run.
#[derive(Debug, Clone)]
pub struct ImportStats {
    /// Rows read from the source, importable or not.
    pub received: usize,
    /// Records fully committed.
    pub imported: usize,
    /// Records skipped after an error.
    pub failed: usize,
    /// Association rows written across both link tables.
    pub links_written: usize,
    started_at: Instant,
}

impl ImportStats {
    pub fn new() -> Self {
        Self {
            received: 0,
            imported: 0,
            failed: 0,
            links_written: 0,
            started_at: Instant::now(),
        }
    }

    /// Wall-clock time since the run started.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Records per second since the run started.
    pub fn rate(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.received as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Share of received rows that imported, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.received == 0 {
            100.0
        } else {
            (self.imported as f64 / self.received as f64) * 100.0
        }
    }
}

impl Default for ImportStats {
    fn default() -> Self {
        Self::new()
    }
}
