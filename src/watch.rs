// src/watch.rs
// One run of the pipeline: fetch → extract → state comparison → notify,
// per instrument, inside a bounded retry loop. Everything that can go wrong
// after configuration is handled here and reported through the webhook, so
// the process exits 0 on every handled path.

use anyhow::Result;
use chrono::{DateTime, Datelike, FixedOffset, Weekday};
use tracing::{info, warn};

use crate::config::WatchConfig;
use crate::extract::{extract_reading, Extraction, ExtractorConfig};
use crate::fetch::PageSource;
use crate::instruments::Metal;
use crate::notify::{format_failure_message, format_message, Notifier};
use crate::state::StateStore;

/// One instrument plus where its page comes from. Production wires an
/// `HttpPageSource` per metal; tests plug in canned pages.
pub struct InstrumentFeed {
    pub metal: Metal,
    pub source: Box<dyn PageSource>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RunSummary {
    SkippedWeekend,
    SkippedDuplicateDay,
    Completed(Vec<InstrumentReport>),
}

#[derive(Debug, PartialEq, Eq)]
pub struct InstrumentReport {
    pub metal: Metal,
    pub outcome: InstrumentOutcome,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InstrumentOutcome {
    Notified { new_high: bool, delivered: bool },
    /// Page still shows an earlier date, nothing new to report today.
    SkippedStale,
    /// Retry budget exhausted; one failure notification attempted.
    FailedAfterRetries,
}

pub async fn run_once(
    cfg: &WatchConfig,
    feeds: &[InstrumentFeed],
    notifier: &dyn Notifier,
    store: &StateStore,
    now: DateTime<FixedOffset>,
) -> Result<RunSummary> {
    let today = now.date_naive();

    if cfg.skip_weekends && matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        info!("weekend, source does not publish; skipping run");
        return Ok(RunSummary::SkippedWeekend);
    }

    if cfg.once_per_day && store.should_skip_duplicate(today) {
        info!(%today, "already notified today; skipping run");
        return Ok(RunSummary::SkippedDuplicateDay);
    }

    let mut reports = Vec::with_capacity(feeds.len());
    let mut date_recorded = false;

    for feed in feeds {
        let outcome = run_instrument(cfg, feed, notifier, store, now, &mut date_recorded).await?;
        reports.push(InstrumentReport {
            metal: feed.metal,
            outcome,
        });
    }

    Ok(RunSummary::Completed(reports))
}

async fn run_instrument(
    cfg: &WatchConfig,
    feed: &InstrumentFeed,
    notifier: &dyn Notifier,
    store: &StateStore,
    now: DateTime<FixedOffset>,
    date_recorded: &mut bool,
) -> Result<InstrumentOutcome> {
    let metal = feed.metal;
    let ex_cfg = ExtractorConfig::for_metal(metal, cfg.change_limit);

    let mut reading = None;
    for attempt in 1..=cfg.max_attempts {
        match feed.source.fetch_page().await {
            Ok(page) => match extract_reading(&page, &ex_cfg, now) {
                Extraction::Found(r) => {
                    reading = Some(r);
                    break;
                }
                Extraction::Stale { page_date } => {
                    // The page will not change again today; retrying is pointless.
                    info!(metal = metal.id(), %page_date, "page date is not today, no new data");
                    return Ok(InstrumentOutcome::SkippedStale);
                }
                Extraction::NotFound(reason) => {
                    warn!(metal = metal.id(), attempt, %reason, "extraction found nothing");
                }
            },
            Err(e) => {
                warn!(metal = metal.id(), attempt, error = ?e, "fetch failed");
            }
        }
        if attempt < cfg.max_attempts {
            tokio::time::sleep(cfg.retry_delay).await;
        }
    }

    let Some(reading) = reading else {
        // Budget exhausted: report through the same channel as success.
        // Best-effort; a failed failure-notification is only logged.
        let msg = format_failure_message(metal, feed.source.name(), cfg.max_attempts);
        if let Err(e) = notifier.send(&msg).await {
            warn!(metal = metal.id(), error = ?e, "failure notification not delivered");
        }
        return Ok(InstrumentOutcome::FailedAfterRetries);
    };

    let high = store.check_and_update_high(metal, reading.price)?;
    if high.is_new_high {
        info!(
            metal = metal.id(),
            price = reading.price,
            previous = high.previous,
            "new all-time high"
        );
    }

    let msg = format_message(&reading, high, metal, feed.source.name());
    let delivered = match notifier.send(&msg).await {
        Ok(()) => {
            if cfg.once_per_day && !*date_recorded {
                store.record_notification_sent(now.date_naive())?;
                *date_recorded = true;
            }
            true
        }
        Err(e) => {
            warn!(metal = metal.id(), error = ?e, "webhook delivery failed");
            false
        }
    };

    Ok(InstrumentOutcome::Notified {
        new_high: high.is_new_high,
        delivered,
    })
}
