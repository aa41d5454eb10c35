//! goldwatch - Binary Entrypoint
//! One run per invocation: fetch the daily price pages, extract readings,
//! update the all-time-high records, post to the Discord webhook, exit.
//! Scheduling (cron/CI) lives outside this process.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use goldwatch::fetch::HttpPageSource;
use goldwatch::watch::{self, InstrumentFeed, RunSummary};
use goldwatch::{instruments, jst_now, DiscordNotifier, StateStore, WatchConfig};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("goldwatch=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the vars come from the scheduler.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatchConfig::from_env()?;
    let watchlist = instruments::load_watchlist_default()?;

    let store = StateStore::new(cfg.state_dir.clone());
    let notifier = DiscordNotifier::new(cfg.webhook_url.clone(), cfg.mention_user_id.clone())
        .with_timeout(cfg.timeout);

    let feeds: Vec<InstrumentFeed> = watchlist
        .iter()
        .map(|&metal| InstrumentFeed {
            metal,
            source: Box::new(
                HttpPageSource::new(cfg.page_url(metal), cfg.timeout, cfg.user_agent.clone())
                    .with_charset_override(cfg.charset_override.clone()),
            ),
        })
        .collect();

    let summary = watch::run_once(&cfg, &feeds, &notifier, &store, jst_now()).await?;

    match &summary {
        RunSummary::SkippedWeekend => info!("run skipped: weekend"),
        RunSummary::SkippedDuplicateDay => info!("run skipped: already notified today"),
        RunSummary::Completed(reports) => {
            for r in reports {
                info!(metal = r.metal.id(), outcome = ?r.outcome, "instrument done");
            }
        }
    }

    Ok(())
}
