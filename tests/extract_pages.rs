// tests/extract_pages.rs
// Extraction against captured page layouts: the label/value layout, the
// positional row layout, the class-marked change, a stale page, and a page
// with nothing usable on it.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use goldwatch::extract::{extract_reading, NotFoundReason};
use goldwatch::{jst, Extraction, ExtractorConfig, Metal};

const LABELS: &str = include_str!("fixtures/d_gold_labels.html");
const ROWS: &str = include_str!("fixtures/souba_rows.html");
const CLASS: &str = include_str!("fixtures/class_change.html");
const STALE: &str = include_str!("fixtures/stale_page.html");
const MAINTENANCE: &str = include_str!("fixtures/maintenance.html");

fn publication_day() -> DateTime<FixedOffset> {
    jst().with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap()
}

fn gold() -> ExtractorConfig {
    ExtractorConfig::default()
}

#[test]
fn label_layout_yields_price_and_trimmed_change() {
    let out = extract_reading(LABELS, &gold(), publication_day());
    let Extraction::Found(reading) = out else {
        panic!("expected Found, got {out:?}");
    };
    assert_eq!(reading.price, 25_998);
    assert_eq!(reading.change, "-53円");
}

#[test]
fn row_layout_works_for_every_metal() {
    for (metal, price, change) in [
        (Metal::Gold, 25_998, "-53円"),
        (Metal::Platinum, 7_321, "+12円"),
        (Metal::Silver, 198, "-2円"),
    ] {
        let cfg = ExtractorConfig::for_metal(metal, 2000);
        let out = extract_reading(ROWS, &cfg, publication_day());
        let Extraction::Found(reading) = out else {
            panic!("{}: expected Found, got {out:?}", metal.id());
        };
        assert_eq!(reading.price, price, "{}", metal.id());
        assert_eq!(reading.change, change, "{}", metal.id());
    }
}

#[test]
fn class_marked_change_fills_in_when_label_is_missing() {
    let out = extract_reading(CLASS, &gold(), publication_day());
    let Extraction::Found(reading) = out else {
        panic!("expected Found, got {out:?}");
    };
    assert_eq!(reading.price, 25_998);
    assert_eq!(reading.change, "+120円");
}

#[test]
fn stale_page_is_no_new_data_not_an_error() {
    let out = extract_reading(STALE, &gold(), publication_day());
    assert_eq!(
        out,
        Extraction::Stale {
            page_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()
        }
    );
}

#[test]
fn date_gate_can_be_disabled_independently() {
    let mut cfg = gold();
    cfg.date_gate = false;
    let out = extract_reading(STALE, &cfg, publication_day());
    let Extraction::Found(reading) = out else {
        panic!("expected Found, got {out:?}");
    };
    assert_eq!(reading.price, 25_910);
}

#[test]
fn disabling_label_pairs_leaves_other_strategies_untouched() {
    let mut cfg = gold();
    cfg.use_label_pairs = false;
    // The label layout has no instrument-name rows and no class markers,
    // so nothing else can find the price.
    assert_eq!(
        extract_reading(LABELS, &cfg, publication_day()),
        Extraction::NotFound(NotFoundReason::PriceMissing)
    );

    // The row layout never needed labels in the first place.
    let out = extract_reading(ROWS, &cfg, publication_day());
    assert!(matches!(out, Extraction::Found(_)));
}

#[test]
fn unusable_page_reports_not_found_without_panicking() {
    assert_eq!(
        extract_reading(MAINTENANCE, &gold(), publication_day()),
        Extraction::NotFound(NotFoundReason::PriceMissing)
    );
}

#[test]
fn fullwidth_digits_parse_like_ascii() {
    let html = r#"
        <div>２０２６年８月７日</div>
        <table>
          <tr><th>店頭小売価格（税込）</th><td>２５，９９８円</td></tr>
          <tr><th>小売価格前日比</th><td>－５３円</td></tr>
        </table>"#;
    let out = extract_reading(html, &gold(), publication_day());
    let Extraction::Found(reading) = out else {
        panic!("expected Found, got {out:?}");
    };
    assert_eq!(reading.price, 25_998);
}
