// src/extract/date.rs
// The source stamps each page with its publication date. On weekends and
// holidays the page keeps the previous value, so a date that is not "today"
// means there is no new data to report.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::fold_fullwidth;

static DATE_KANJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").unwrap());
static DATE_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})/(\d{1,2})/(\d{1,2})").unwrap());

/// First publication date found on the page, if any. Kanji format wins over
/// the slash format to avoid picking up dates embedded in URLs.
pub fn page_date(page: &str) -> Option<NaiveDate> {
    let folded = fold_fullwidth(page);
    for re in [&*DATE_KANJI, &*DATE_SLASH] {
        if let Some(cap) = re.captures(&folded) {
            let y: i32 = cap[1].parse().ok()?;
            let m: u32 = cap[2].parse().ok()?;
            let d: u32 = cap[3].parse().ok()?;
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return Some(date);
            }
        }
    }
    None
}
