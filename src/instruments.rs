// src/instruments.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "INSTRUMENTS_PATH";

/// A tracked commodity. Each metal has its own daily page on the source site
/// and its own all-time-high record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    Gold,
    Platinum,
    Silver,
}

impl Metal {
    pub fn id(&self) -> &'static str {
        match self {
            Metal::Gold => "gold",
            Metal::Platinum => "platinum",
            Metal::Silver => "silver",
        }
    }

    /// Display label, as the source site prints it.
    pub fn label_ja(&self) -> &'static str {
        match self {
            Metal::Gold => "金",
            Metal::Platinum => "プラチナ",
            Metal::Silver => "銀",
        }
    }

    /// First-cell keyword used by the row-scan extraction fallback.
    pub fn row_keyword(&self) -> &'static str {
        self.label_ja()
    }

    pub fn page_slug(&self) -> &'static str {
        match self {
            Metal::Gold => "d-gold.php",
            Metal::Platinum => "d-platina.php",
            Metal::Silver => "d-silver.php",
        }
    }

    /// Bootstrap all-time-high (yen per gram) used when no record file exists
    /// yet. Deliberately below any plausible current price so the first real
    /// reading establishes the record.
    pub fn seed_high(&self) -> i64 {
        match self {
            Metal::Gold => 13_000,
            Metal::Platinum => 7_000,
            Metal::Silver => 150,
        }
    }

    pub fn from_id(s: &str) -> Option<Metal> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gold" => Some(Metal::Gold),
            "platinum" => Some(Metal::Platinum),
            "silver" => Some(Metal::Silver),
            _ => None,
        }
    }
}

/// Load the watch-list from an explicit path. Supports TOML or JSON formats.
pub fn load_watchlist_from(path: &Path) -> Result<Vec<Metal>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watch-list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_watchlist(&content, ext.as_str())
}

/// Load the watch-list using env var + fallbacks:
/// 1) $INSTRUMENTS_PATH
/// 2) config/instruments.toml
/// 3) config/instruments.json
/// 4) default: gold only
pub fn load_watchlist_default() -> Result<Vec<Metal>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_watchlist_from(&pb);
        } else {
            return Err(anyhow!("INSTRUMENTS_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/instruments.toml");
    if toml_p.exists() {
        return load_watchlist_from(&toml_p);
    }
    let json_p = PathBuf::from("config/instruments.json");
    if json_p.exists() {
        return load_watchlist_from(&json_p);
    }
    Ok(vec![Metal::Gold])
}

fn parse_watchlist(s: &str, hint_ext: &str) -> Result<Vec<Metal>> {
    let try_toml = hint_ext == "toml" || s.contains("instruments");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return resolve_ids(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return resolve_ids(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return resolve_ids(v);
        }
    }
    Err(anyhow!("unsupported watch-list format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlList {
        instruments: Vec<String>,
    }
    let v: TomlList = toml::from_str(s)?;
    Ok(v.instruments)
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(v)
}

fn resolve_ids(ids: Vec<String>) -> Result<Vec<Metal>> {
    let mut out = Vec::new();
    for id in ids {
        let t = id.trim();
        if t.is_empty() {
            continue;
        }
        let m = Metal::from_id(t).ok_or_else(|| anyhow!("unknown instrument id: {t:?}"))?;
        if !out.contains(&m) {
            out.push(m);
        }
    }
    if out.is_empty() {
        out.push(Metal::Gold);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn toml_and_json_formats_resolve_and_dedup() {
        let toml = r#"instruments = ["gold", " platinum ", "gold"]"#;
        assert_eq!(
            parse_watchlist(toml, "toml").unwrap(),
            vec![Metal::Gold, Metal::Platinum]
        );
        let json = r#"["silver", "gold"]"#;
        assert_eq!(
            parse_watchlist(json, "json").unwrap(),
            vec![Metal::Silver, Metal::Gold]
        );
    }

    #[test]
    fn unknown_id_is_rejected() {
        let toml = r#"instruments = ["palladium"]"#;
        assert!(parse_watchlist(toml, "toml").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD in a temp dir so a real config/ in the repo can't interfere
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_PATH);

        // No files in temp CWD → gold only
        let v = load_watchlist_default().unwrap();
        assert_eq!(v, vec![Metal::Gold]);

        // Env takes precedence
        let p_json = tmp.path().join("instruments.json");
        fs::write(&p_json, r#"["platinum"]"#).unwrap();
        env::set_var(ENV_PATH, p_json.display().to_string());
        let v2 = load_watchlist_default().unwrap();
        assert_eq!(v2, vec![Metal::Platinum]);
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
