//! Demo that pushes one sample message through the Discord notifier.
//! Needs DISCORD_WEBHOOK_URL (and optionally MENTION_USER_ID) in the env.

use goldwatch::notify::format_message;
use goldwatch::state::HighWaterMark;
use goldwatch::{jst_now, DiscordNotifier, Metal, Notifier, PriceReading};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let Ok(webhook) = std::env::var("DISCORD_WEBHOOK_URL") else {
        eprintln!("DISCORD_WEBHOOK_URL not set, nothing to demo");
        return;
    };
    let mention = std::env::var("MENTION_USER_ID").ok();
    let notifier = DiscordNotifier::new(webhook, mention);

    let reading = PriceReading {
        price: 25_998,
        change: "-53円".to_string(),
        observed_at: jst_now(),
    };
    let msg = format_message(
        &reading,
        HighWaterMark {
            is_new_high: true,
            previous: 25_051,
        },
        Metal::Gold,
        "https://gold.tanaka.co.jp/commodity/souba/d-gold.php",
    );

    match notifier.send(&msg).await {
        Ok(()) => println!("notify-demo sent"),
        Err(e) => eprintln!("notify-demo failed: {e:#}"),
    }
}
