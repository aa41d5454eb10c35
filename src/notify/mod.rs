// src/notify/mod.rs
pub mod discord;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Weekday};

use crate::extract::PriceReading;
use crate::instruments::Metal;
use crate::state::HighWaterMark;

pub use discord::DiscordNotifier;

/// Webhook sink. One POST per call, no internal retries; call sites decide
/// what is best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Deterministic message template. The change text is relayed verbatim (it
/// carries its own sign glyph and unit), the price is re-rendered from the
/// parsed integer with thousands separators.
pub fn format_message(
    reading: &PriceReading,
    high: HighWaterMark,
    metal: Metal,
    source_url: &str,
) -> String {
    let date = reading.observed_at;
    let mut lines = Vec::new();

    if high.is_new_high {
        lines.push(format!(
            "🎉 **【{}】史上最高値を更新！**（これまでの最高値: {}円）",
            metal.label_ja(),
            format_thousands(high.previous)
        ));
    }
    lines.push(format!(
        "📅 {:04}/{:02}/{:02}（{}）",
        date.year(),
        date.month(),
        date.day(),
        weekday_ja(date.weekday())
    ));
    lines.push(format!("💰 **{} 店頭小売価格（税込）**", metal.label_ja()));
    lines.push(format!("{}円", format_thousands(reading.price)));
    lines.push("📊 **小売価格 前日比**".to_string());
    lines.push(format!("{} {}", reading.change, change_arrow(&reading.change)));
    lines.push(format!("🔗 {source_url}"));

    lines.join("\n")
}

/// Sent once when every fetch/extract attempt is exhausted.
pub fn format_failure_message(metal: Metal, source_url: &str, attempts: u32) -> String {
    format!(
        "⚠️ **【{}】価格情報を取得できませんでした**\n全{}回の試行がすべて失敗しました。\n🔗 {}",
        metal.label_ja(),
        attempts,
        source_url
    )
}

pub(crate) fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let first = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - first) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn weekday_ja(w: Weekday) -> &'static str {
    match w {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

fn change_arrow(change: &str) -> &'static str {
    if change.contains('+') || change.contains('＋') {
        "📈"
    } else if change.contains('-') || change.contains('−') || change.contains('▲') {
        "📉"
    } else {
        "➡️"
    }
}
