// src/state.rs
// Two persisted scalars, both plain text files under one state directory:
// an all-time-high per metal and the last-notified calendar date.
// Read-then-write with no locking; overlapping runs are the scheduler's
// problem, not ours.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::instruments::Metal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighWaterMark {
    pub is_new_high: bool,
    /// The record before this run (seed value when no file existed).
    pub previous: i64,
}

pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn high_path(&self, metal: Metal) -> PathBuf {
        self.dir.join(format!("ath_{}.txt", metal.id()))
    }

    pub fn last_sent_path(&self) -> PathBuf {
        self.dir.join("last_notified.txt")
    }

    /// Compare `price` against the persisted record and move the record up
    /// when exceeded. A price equal to the record is not a new high and leaves
    /// the file untouched. The record never decreases.
    pub fn check_and_update_high(&self, metal: Metal, price: i64) -> Result<HighWaterMark> {
        let previous = self.read_high(metal);
        let is_new_high = price > previous;
        if is_new_high {
            self.write_high(metal, price)?;
        }
        Ok(HighWaterMark {
            is_new_high,
            previous,
        })
    }

    /// True iff a notification already went out today.
    pub fn should_skip_duplicate(&self, today: NaiveDate) -> bool {
        match fs::read_to_string(self.last_sent_path()) {
            Ok(s) => s.trim().parse::<NaiveDate>().map(|d| d == today).unwrap_or(false),
            Err(_) => false,
        }
    }

    pub fn record_notification_sent(&self, today: NaiveDate) -> Result<()> {
        self.ensure_dir()?;
        let path = self.last_sent_path();
        fs::write(&path, format!("{today}\n"))
            .with_context(|| format!("writing {}", path.display()))
    }

    fn read_high(&self, metal: Metal) -> i64 {
        let path = self.high_path(metal);
        match fs::read_to_string(&path) {
            Ok(s) => match parse_recorded_high(&s) {
                Some(v) => v,
                None => {
                    // Corrupt record: fall back to the seed, but say so;
                    // this is the one case that deserves a look.
                    warn!(
                        file = %path.display(),
                        seed = metal.seed_high(),
                        "all-time-high file unparsable, using seed"
                    );
                    metal.seed_high()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    file = %path.display(),
                    seed = metal.seed_high(),
                    "no all-time-high record yet, using seed"
                );
                metal.seed_high()
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "all-time-high file unreadable, using seed");
                metal.seed_high()
            }
        }
    }

    fn write_high(&self, metal: Metal, price: i64) -> Result<()> {
        self.ensure_dir()?;
        let path = self.high_path(metal);
        // No thousands separators on write; tolerated on read.
        fs::write(&path, format!("{price}\n"))
            .with_context(|| format!("writing {}", path.display()))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating state dir {}", self.dir.display()))
    }
}

fn parse_recorded_high(s: &str) -> Option<i64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '，'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_high_tolerates_separators() {
        assert_eq!(parse_recorded_high("25051\n"), Some(25_051));
        assert_eq!(parse_recorded_high(" 25,051 "), Some(25_051));
        assert_eq!(parse_recorded_high("２５０５１"), None); // full-width not written by us
        assert_eq!(parse_recorded_high("garbage"), None);
        assert_eq!(parse_recorded_high(""), None);
    }
}
