// src/extract/mod.rs
// Price extraction from the source page. Absence of the expected structure is
// an expected outcome here, carried in `Extraction`, never an error.

pub mod date;
pub mod strategies;

use chrono::{DateTime, FixedOffset, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::fmt;

use crate::config::DEFAULT_PLAUSIBLE_CHANGE_LIMIT;
use crate::instruments::Metal;

/// A day-over-day change plausibly has at most this many digits; anything
/// longer is assumed to be a price cell sitting at the wrong offset.
pub const MAX_CHANGE_DIGITS: usize = 4;

/// One observation of the retail price, produced once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceReading {
    /// Whole yen, digits-only parse of the displayed value.
    pub price: i64,
    /// Raw trimmed cell text, sign glyph and unit suffix preserved.
    pub change: String,
    pub observed_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    PriceMissing,
    ChangeMissing,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::PriceMissing => write!(f, "retail price not found on page"),
            NotFoundReason::ChangeMissing => write!(f, "day-over-day change not found on page"),
        }
    }
}

/// Extraction outcome. `Stale` means the page's own date differs from today
/// (weekends/holidays keep the previous value up): "no new data", not a defect.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Found(PriceReading),
    NotFound(NotFoundReason),
    Stale { page_date: NaiveDate },
}

/// Per-instrument extraction knobs. Each strategy can be disabled on its own;
/// the chain was tuned reactively against real page changes, so keep them
/// decoupled.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub retail_label: String,
    pub change_label: String,
    pub row_keyword: String,
    pub change_limit: i64,
    pub use_label_pairs: bool,
    pub use_row_scan: bool,
    pub use_class_attr: bool,
    pub date_gate: bool,
}

impl ExtractorConfig {
    pub fn for_metal(metal: Metal, change_limit: i64) -> Self {
        Self {
            retail_label: "店頭小売価格".to_string(),
            change_label: "小売価格前日比".to_string(),
            row_keyword: metal.row_keyword().to_string(),
            change_limit,
            use_label_pairs: true,
            use_row_scan: true,
            use_class_attr: true,
            date_gate: true,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::for_metal(Metal::Gold, DEFAULT_PLAUSIBLE_CHANGE_LIMIT)
    }
}

/// Run the strategy chain over one fetched page.
///
/// Priority: label/value pairs, then row scan for whichever part is still
/// missing, then the class-attribute fallback for the change only.
pub fn extract_reading(
    page: &str,
    cfg: &ExtractorConfig,
    now: DateTime<FixedOffset>,
) -> Extraction {
    if cfg.date_gate {
        if let Some(page_date) = date::page_date(page) {
            if page_date != now.date_naive() {
                return Extraction::Stale { page_date };
            }
        }
    }

    let doc = Html::parse_document(page);

    let mut price: Option<i64> = None;
    let mut change: Option<String> = None;

    if cfg.use_label_pairs {
        let (p, c) = strategies::label_value_pairs(&doc, cfg);
        price = p.as_deref().and_then(parse_price);
        change = c;
    }
    if cfg.use_row_scan && (price.is_none() || change.is_none()) {
        let (p, c) = strategies::row_scan(&doc, cfg);
        if price.is_none() {
            price = p.as_deref().and_then(parse_price);
        }
        if change.is_none() {
            change = c;
        }
    }
    if cfg.use_class_attr && change.is_none() {
        change = strategies::class_attr_change(&doc);
    }

    match (price, change) {
        (Some(price), Some(change)) => Extraction::Found(PriceReading {
            price,
            change,
            observed_at: now,
        }),
        (None, _) => Extraction::NotFound(NotFoundReason::PriceMissing),
        (_, None) => Extraction::NotFound(NotFoundReason::ChangeMissing),
    }
}

/// Fold full-width digits and punctuation to their ASCII counterparts so the
/// digit filter and sign detection work on either glyph set.
pub(crate) fn fold_fullwidth(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            '＋' => '+',
            '－' | '−' => '-',
            '，' => ',',
            '．' => '.',
            '　' => ' ',
            '（' => '(',
            '）' => ')',
            _ => c,
        })
        .collect()
}

/// Digits-only integer parse: "25,998円" → 25998. Zero digits → None.
pub fn parse_price(text: &str) -> Option<i64> {
    let folded = fold_fullwidth(text);
    let digits: String = folded.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Collapse runs of whitespace and trim; cell text comes with layout noise.
pub(crate) fn clean_text(s: &str) -> String {
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// A cell is a believable day-over-day change when its digits-only magnitude
/// stays inside the configured limit and its digit count is short enough.
pub(crate) fn is_plausible_change(text: &str, limit: i64) -> bool {
    let folded = fold_fullwidth(text);
    let digits: String = folded.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > MAX_CHANGE_DIGITS {
        return false;
    }
    match digits.parse::<i64>() {
        Ok(m) => m <= limit,
        Err(_) => false,
    }
}
