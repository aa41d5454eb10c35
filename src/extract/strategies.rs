// src/extract/strategies.rs
// The three extraction strategies, kept independent so any one can be turned
// off when the source layout shifts again.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{clean_text, is_plausible_change, ExtractorConfig};

static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").unwrap());
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());
static CLASSED: Lazy<Selector> = Lazy::new(|| Selector::parse("[class]").unwrap());

/// Class names the source has used for its up/down/flat change indicator.
static CHANGE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(up|down|flat|plus|minus)\b").unwrap());

fn cell_text(el: &ElementRef) -> String {
    clean_text(&el.text().collect::<String>())
}

/// Strategy a: `<th>label</th><td>value</td>` rows, the layout the source has
/// kept longest. Returns raw candidate texts; the caller does the parsing.
pub(crate) fn label_value_pairs(
    doc: &Html,
    cfg: &ExtractorConfig,
) -> (Option<String>, Option<String>) {
    let mut price = None;
    let mut change = None;

    for tr in doc.select(&TR) {
        let Some(th) = tr.select(&TH).next() else {
            continue;
        };
        let Some(td) = tr.select(&TD).next() else {
            continue;
        };

        let label = cell_text(&th);
        // The change label contains "小売価格" too, so test it first.
        if label.contains(&cfg.change_label) {
            change.get_or_insert_with(|| cell_text(&td));
        } else if label.contains(&cfg.retail_label) {
            price.get_or_insert_with(|| cell_text(&td));
        }
    }

    (price, change)
}

/// Strategy b: positional row scan. A row whose first cell names the
/// instrument carries the price at offset 1 and the change at offset 2,
/// unless offset 2 holds another price, in which case the first plausible
/// later cell wins.
pub(crate) fn row_scan(doc: &Html, cfg: &ExtractorConfig) -> (Option<String>, Option<String>) {
    for tr in doc.select(&TR) {
        let cells: Vec<String> = tr.select(&CELL).map(|c| cell_text(&c)).collect();
        if cells.is_empty() {
            continue;
        }
        let first = cells[0].as_str();
        if !(first == cfg.row_keyword || first.contains(&cfg.row_keyword)) {
            continue;
        }

        let price = cells.get(1).cloned().filter(|s| !s.is_empty());
        let change = cells
            .iter()
            .skip(2)
            .find(|c| is_plausible_change(c, cfg.change_limit))
            .cloned();
        return (price, change);
    }
    (None, None)
}

/// Strategy c: change only. Some layouts mark the change cell with an
/// up/down/flat class instead of a label.
pub(crate) fn class_attr_change(doc: &Html) -> Option<String> {
    for el in doc.select(&CLASSED) {
        let Some(class) = el.value().attr("class") else {
            continue;
        };
        if !CHANGE_CLASS.is_match(class) {
            continue;
        }
        let text = cell_text(&el);
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::parse_price;

    fn gold_cfg() -> ExtractorConfig {
        ExtractorConfig::default()
    }

    #[test]
    fn label_pairs_read_adjacent_td() {
        let html = r#"
            <table>
              <tr><th>店頭小売価格(税込)</th><td> 25,998円 </td></tr>
              <tr><th>小売価格前日比</th><td>-53円</td></tr>
            </table>"#;
        let doc = Html::parse_document(html);
        let (p, c) = label_value_pairs(&doc, &gold_cfg());
        assert_eq!(p.as_deref().and_then(parse_price), Some(25_998));
        assert_eq!(c.as_deref(), Some("-53円"));
    }

    #[test]
    fn row_scan_skips_implausible_change_cell() {
        // Offset 2 is the wholesale price, not the change; offset 3 is.
        let html = r#"
            <table>
              <tr><td>金</td><td>25,998円</td><td>25,856円</td><td>-53円</td></tr>
              <tr><td>プラチナ</td><td>7,321円</td><td>+12円</td></tr>
            </table>"#;
        let doc = Html::parse_document(html);
        let (p, c) = row_scan(&doc, &gold_cfg());
        assert_eq!(p.as_deref().and_then(parse_price), Some(25_998));
        assert_eq!(c.as_deref(), Some("-53円"));
    }

    #[test]
    fn class_fallback_finds_marked_change() {
        let html = r#"<div><span class="price down">-53円</span></div>"#;
        let doc = Html::parse_document(html);
        assert_eq!(class_attr_change(&doc).as_deref(), Some("-53円"));
    }

    #[test]
    fn absent_structures_return_none() {
        let doc = Html::parse_document("<p>メンテナンス中です</p>");
        assert_eq!(label_value_pairs(&doc, &gold_cfg()), (None, None));
        assert_eq!(row_scan(&doc, &gold_cfg()), (None, None));
        assert_eq!(class_attr_change(&doc), None);
    }
}
