// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod extract;
pub mod fetch;
pub mod instruments;
pub mod notify;
pub mod state;
pub mod watch;

// ---- Re-exports for stable public API ----
pub use crate::config::WatchConfig;
pub use crate::extract::{Extraction, ExtractorConfig, PriceReading};
pub use crate::instruments::Metal;
pub use crate::notify::{DiscordNotifier, Notifier};
pub use crate::state::StateStore;

use chrono::{DateTime, FixedOffset, Utc};

/// The source publishes prices in Japan Standard Time; all calendar-day
/// decisions (staleness, weekend skip, duplicate suppression) use JST.
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("static JST offset")
}

pub fn jst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}
