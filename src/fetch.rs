// src/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

/// One page fetch, no retries; the watch loop owns the retry budget.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self) -> Result<String>;
    fn name(&self) -> &str;
}

pub struct HttpPageSource {
    url: String,
    client: Client,
    timeout: Duration,
    user_agent: Option<String>,
    charset_override: Option<String>,
}

impl HttpPageSource {
    pub fn new(url: String, timeout: Duration, user_agent: Option<String>) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout,
            user_agent,
            charset_override: None,
        }
    }

    /// Force the response charset instead of trusting the header/meta
    /// declaration.
    pub fn with_charset_override(mut self, charset: Option<String>) -> Self {
        self.charset_override = charset;
        self
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self) -> Result<String> {
        let mut req = self.client.get(&self.url).timeout(self.timeout);
        if let Some(ua) = &self.user_agent {
            req = req.header(USER_AGENT, ua);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("non-2xx from {}", self.url))?;

        // The source serves Shift_JIS/EUC-JP on some pages. reqwest's .text()
        // would assume UTF-8 without a header charset, so decode the raw
        // bytes ourselves from the declared or sniffed encoding.
        let declared = self
            .charset_override
            .clone()
            .or_else(|| charset_from_headers(resp.headers()));
        let bytes = resp.bytes().await.context("reading response body")?;
        Ok(decode_body(&bytes, declared.as_deref()))
    }

    fn name(&self) -> &str {
        &self.url
    }
}

fn charset_from_headers(headers: &HeaderMap) -> Option<String> {
    let ct = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    charset_from_content_type(ct)
}

fn charset_from_content_type(ct: &str) -> Option<String> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?i)charset\s*=\s*"?([A-Za-z0-9_\-]+)"#).unwrap());
    RE.captures(ct).map(|c| c[1].to_string())
}

/// Look for `<meta charset=...>` or the http-equiv Content-Type variant in the
/// first chunk of the document.
fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_\-]+)"#).unwrap());
    let head = &bytes[..bytes.len().min(1024)];
    let ascii = String::from_utf8_lossy(head);
    RE.captures(&ascii).map(|c| c[1].to_string())
}

pub(crate) fn decode_body(bytes: &[u8], declared: Option<&str>) -> String {
    let enc: &'static Encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            sniff_meta_charset(bytes).and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or(UTF_8);
    let (text, _, _) = enc.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_token_parses_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/html; charset=Shift_JIS").as_deref(),
            Some("Shift_JIS")
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[test]
    fn shift_jis_body_decodes_via_declared_charset() {
        // 「金」 in Shift_JIS
        let body = [0x8B, 0xE0];
        assert_eq!(decode_body(&body, Some("shift_jis")), "金");
    }

    #[test]
    fn meta_sniff_kicks_in_without_header() {
        let mut body = Vec::new();
        body.extend_from_slice(br#"<html><head><meta charset="euc-jp"></head><body>"#);
        body.extend_from_slice(&[0xB6, 0xE2]); // 「金」 in EUC-JP
        body.extend_from_slice(b"</body></html>");
        let text = decode_body(&body, None);
        assert!(text.contains('金'));
    }

    #[test]
    fn utf8_fallback_when_nothing_declared() {
        assert_eq!(decode_body("金".as_bytes(), None), "金");
    }
}
