//! Split panel settings: schema, normalization and storage.
//!
//! Settings are stored as a JSON object under [`STORAGE_KEY`]. Whatever is
//! read back is migrated to [`SETTINGS_VERSION`] and normalized before use,
//! so hand-edited or outdated files never produce out-of-range widths.
//!
//! # Example
//!
//! ```rust
//! use splitview_core::settings::{MemoryStore, SettingsStore};
//!
//! let mut store = MemoryStore::default();
//! let settings = store.get().unwrap();
//!
//! assert_eq!(settings.global.default_width_pct, 40);
//! assert_eq!(settings.panel_width_pct("news.example.com"), 40);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, SplitViewError};

/// Key the settings object is stored under.
pub const STORAGE_KEY: &str = "splitViewSettings";

/// Current settings schema version.
pub const SETTINGS_VERSION: u32 = 2;

static VALID_DOMAIN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)+$").ok());

/// Panel widths shared by every site, in percent of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub default_width_pct: u32,
    pub min_width_pct: u32,
    pub max_width_pct: u32,
    pub step_pct: u32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self { default_width_pct: 40, min_width_pct: 20, max_width_pct: 60, step_pct: 1 }
    }
}

/// Domains the split view is offered on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistSettings {
    pub enabled: bool,
    pub domains: Vec<String>,
}

impl Default for WhitelistSettings {
    fn default() -> Self {
        Self { enabled: true, domains: Vec::new() }
    }
}

/// Per-domain panel width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteOverride {
    pub width_pct: u32,
}

/// Normalized split view settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub version: u32,
    pub global: GlobalSettings,
    pub whitelist: WhitelistSettings,
    /// Keyed by normalized domain
    pub site_overrides: BTreeMap<String, SiteOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            global: GlobalSettings::default(),
            whitelist: WhitelistSettings::default(),
            site_overrides: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Migrates and normalizes an arbitrary stored value.
    ///
    /// Missing sections keep their defaults. Inside a present `global`
    /// section, missing or non-numeric widths clamp to their lower bound.
    pub fn normalize(raw: &Value) -> Self {
        let migrated = migrate(raw);
        let mut settings = Self::default();

        if let Some(global) = migrated.get("global").filter(|v| v.is_object()) {
            let min = clamp_width(number(global.get("minWidthPct")), 10, 90);
            let max = clamp_width(number(global.get("maxWidthPct")), min, 90);
            settings.global = GlobalSettings {
                min_width_pct: min,
                max_width_pct: max,
                default_width_pct: clamp_width(number(global.get("defaultWidthPct")), min, max),
                step_pct: clamp_width(number(global.get("stepPct")), 1, 10),
            };
        }

        if let Some(whitelist) = migrated.get("whitelist").filter(|v| v.is_object()) {
            settings.whitelist.enabled = whitelist.get("enabled") != Some(&Value::Bool(false));
            if let Some(domains) = whitelist.get("domains").and_then(Value::as_array) {
                let mut normalized: Vec<String> = Vec::new();
                for domain in domains.iter().filter_map(value_text).map(|d| normalize_domain(&d)) {
                    if !domain.is_empty() && !normalized.contains(&domain) {
                        normalized.push(domain);
                    }
                }
                settings.whitelist.domains = normalized;
            }
        }

        if let Some(overrides) = migrated.get("siteOverrides").and_then(Value::as_object) {
            let GlobalSettings { min_width_pct, max_width_pct, .. } = settings.global;
            for (raw_domain, config) in overrides {
                let domain = normalize_domain(raw_domain);
                if domain.is_empty() || !config.is_object() {
                    continue;
                }
                let width_pct = clamp_width(number(config.get("widthPct")), min_width_pct, max_width_pct);
                settings.site_overrides.insert(domain, SiteOverride { width_pct });
            }
        }

        settings
    }

    /// Parses and normalizes a settings document.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json).map_err(|e| SplitViewError::SettingsError(e.to_string()))?;
        Ok(Self::normalize(&raw))
    }

    /// Re-normalizes settings built or edited in code.
    pub fn normalized(&self) -> Result<Self> {
        Ok(Self::normalize(&serde_json::to_value(self)?))
    }

    /// Panel width for `hostname`: the matching site override, else the global default.
    pub fn panel_width_pct(&self, hostname: &str) -> u32 {
        match_domain_rule(hostname, self.site_overrides.keys())
            .and_then(|domain| self.site_overrides.get(&domain))
            .map_or(self.global.default_width_pct, |o| o.width_pct)
    }

    /// Whitelisted domain covering `hostname`, if the whitelist is enabled.
    pub fn whitelist_match(&self, hostname: &str) -> Option<String> {
        if !self.whitelist.enabled {
            return None;
        }
        match_domain_rule(hostname, &self.whitelist.domains)
    }

    /// Sets the width override of the domain of `input`, clamped to the global range.
    pub fn set_site_width(&mut self, input: &str, width_pct: f64) -> Option<String> {
        let domain = normalize_domain(input);
        if !is_valid_domain(&domain) {
            return None;
        }
        let width_pct = clamp_width(width_pct, self.global.min_width_pct, self.global.max_width_pct);
        self.site_overrides.insert(domain.clone(), SiteOverride { width_pct });
        Some(domain)
    }
}

/// Rounds `value` and clamps it to `min..=max`; non-finite values give `min`.
pub fn clamp_width(value: f64, min: u32, max: u32) -> u32 {
    if !value.is_finite() {
        return min;
    }
    value.round().min(f64::from(max)).max(f64::from(min)) as u32
}

/// Reduces a URL, host or domain as typed by a user to a bare domain.
///
/// `https://www.Example.com:8080/path` becomes `example.com`.
pub fn normalize_domain(input: &str) -> String {
    let domain = input.trim().to_lowercase();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(&domain);
    let domain = domain.split('/').next().unwrap_or_default();
    let domain = match domain.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => domain,
    };
    let domain = domain.trim_matches('.');
    domain.strip_prefix("www.").unwrap_or(domain).to_string()
}

/// Whether `domain` has at least two dot-separated labels of `[a-z0-9-]`.
pub fn is_valid_domain(domain: &str) -> bool {
    VALID_DOMAIN.as_ref().is_some_and(|re| re.is_match(domain))
}

/// Registrable part of a hostname: its last two labels.
pub fn domain_key(hostname: &str) -> String {
    let normalized = normalize_domain(hostname);
    let parts: Vec<&str> = normalized.split('.').filter(|p| !p.is_empty()).collect();
    if parts.len() > 2 { parts[parts.len() - 2..].join(".") } else { normalized }
}

/// First domain of `domains` equal to `hostname` or a parent of it.
pub fn match_domain_rule<I, S>(hostname: &str, domains: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let host = normalize_domain(hostname);
    domains
        .into_iter()
        .map(|d| normalize_domain(d.as_ref()))
        .filter(|d| !d.is_empty())
        .find(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

fn migrate(raw: &Value) -> Value {
    let mut current = match raw {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    // version 1 documents carry the same fields; only the stamp changes
    current.insert("version".to_string(), Value::from(SETTINGS_VERSION));
    Value::Object(current)
}

/// Numeric reading of a stored value; anything unreadable is NaN.
fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) if s.trim().is_empty() => 0.0,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) => 0.0,
        _ => f64::NAN,
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Storage area holding the settings document.
///
/// Implementors provide raw access; [`SettingsStore::get`] and
/// [`SettingsStore::set`] always go through normalization.
pub trait SettingsStore {
    /// Stored value, `None` when nothing was stored yet.
    fn read(&self) -> Result<Option<Value>>;

    fn write(&mut self, settings: &Settings) -> Result<()>;

    /// Loads normalized settings, persisting them when the stored value differs.
    fn get(&mut self) -> Result<Settings> {
        let raw = self.read()?;
        let settings = Settings::normalize(raw.as_ref().unwrap_or(&Value::Null));

        let stale = match &raw {
            Some(value @ Value::Object(_)) => *value != serde_json::to_value(&settings)?,
            _ => true,
        };
        if stale {
            tracing::debug!("persisting normalized settings");
            self.write(&settings)?;
        }

        Ok(settings)
    }

    /// Normalizes and stores `settings`, returning what was stored.
    fn set(&mut self, settings: &Settings) -> Result<Settings> {
        let settings = settings.normalized()?;
        self.write(&settings)?;
        Ok(settings)
    }
}

/// In-memory settings store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<Value>,
    writes: usize,
}

impl MemoryStore {
    /// Store pre-filled with a raw value.
    pub fn with_value(value: Value) -> Self {
        Self { value: Some(value), writes: 0 }
    }

    /// Number of writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SettingsStore for MemoryStore {
    fn read(&self) -> Result<Option<Value>> {
        Ok(self.value.clone())
    }

    fn write(&mut self, settings: &Settings) -> Result<()> {
        self.value = Some(serde_json::to_value(settings)?);
        self.writes += 1;
        Ok(())
    }
}

/// Settings kept under [`STORAGE_KEY`] in a JSON file.
///
/// Other top-level keys of the file are preserved on write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/splitview/settings.json`, when a config directory exists.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("splitview").join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(SplitViewError::SettingsError(format!("{} is not a JSON object", self.path.display()))),
            Err(e) => Err(SplitViewError::SettingsError(format!("{}: {}", self.path.display(), e))),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn read(&self) -> Result<Option<Value>> {
        Ok(self.read_document()?.remove(STORAGE_KEY))
    }

    fn write(&mut self, settings: &Settings) -> Result<()> {
        let mut document = self.read_document().unwrap_or_default();
        document.insert(STORAGE_KEY.to_string(), serde_json::to_value(settings)?);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(document))?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    #[rstest]
    #[case(35.0, 20, 60, 35)]
    #[case(35.4, 20, 60, 35)]
    #[case(35.5, 20, 60, 36)]
    #[case(5.0, 20, 60, 20)]
    #[case(95.0, 20, 60, 60)]
    #[case(f64::NAN, 20, 60, 20)]
    #[case(f64::INFINITY, 20, 60, 20)]
    fn test_clamp_width(#[case] value: f64, #[case] min: u32, #[case] max: u32, #[case] expected: u32) {
        assert_eq!(clamp_width(value, min, max), expected);
    }

    #[rstest]
    #[case("https://www.Example.com:8080/path", "example.com")]
    #[case("http://news.example.com/", "news.example.com")]
    #[case("  .example.org.  ", "example.org")]
    #[case("www.example.com", "example.com")]
    #[case("", "")]
    fn test_normalize_domain(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_domain(input), expected);
    }

    #[rstest]
    #[case("example.com", true)]
    #[case("a-b.co.uk", true)]
    #[case("localhost", false)]
    #[case("exa mple.com", false)]
    fn test_is_valid_domain(#[case] domain: &str, #[case] expected: bool) {
        assert_eq!(is_valid_domain(domain), expected);
    }

    #[test]
    fn test_domain_key() {
        assert_eq!(domain_key("m.twitter.com"), "twitter.com");
        assert_eq!(domain_key("www.example.com"), "example.com");
        assert_eq!(domain_key("localhost"), "localhost");
    }

    #[test]
    fn test_match_domain_rule() {
        let domains = ["www.example.com", "", "other.org"];

        assert_eq!(match_domain_rule("example.com", domains), Some("example.com".to_string()));
        assert_eq!(match_domain_rule("news.example.com", domains), Some("example.com".to_string()));
        assert_eq!(match_domain_rule("badexample.com", domains), None);
    }

    #[test]
    fn test_normalize_defaults() {
        assert_eq!(Settings::normalize(&Value::Null), Settings::default());
        assert_eq!(Settings::normalize(&json!({"version": 1})), Settings::default());
    }

    #[test]
    fn test_normalize_clamps_widths() {
        let settings = Settings::normalize(&json!({
            "global": {"minWidthPct": 5, "maxWidthPct": 95, "defaultWidthPct": "50", "stepPct": 20},
            "siteOverrides": {"https://www.Example.com/": {"widthPct": 99}, "": {"widthPct": 30}, "bad.com": 3}
        }));

        assert_eq!(
            settings.global,
            GlobalSettings { default_width_pct: 50, min_width_pct: 10, max_width_pct: 90, step_pct: 10 }
        );
        assert_eq!(settings.site_overrides.len(), 1);
        assert_eq!(settings.site_overrides["example.com"], SiteOverride { width_pct: 90 });
        assert_eq!(settings.version, SETTINGS_VERSION);
    }

    #[test]
    fn test_normalize_missing_global_fields_use_lower_bound() {
        let settings = Settings::normalize(&json!({"global": {"maxWidthPct": "wide"}}));

        assert_eq!(settings.global.min_width_pct, 10);
        assert_eq!(settings.global.max_width_pct, 10);
        assert_eq!(settings.global.default_width_pct, 10);
        assert_eq!(settings.global.step_pct, 1);
    }

    #[test]
    fn test_normalize_whitelist() {
        let settings = Settings::normalize(&json!({
            "whitelist": {"enabled": "no", "domains": ["Example.com", "www.example.com", "", "news.org"]}
        }));

        assert!(settings.whitelist.enabled);
        assert_eq!(settings.whitelist.domains, vec!["example.com", "news.org"]);

        let disabled = Settings::normalize(&json!({"whitelist": {"enabled": false}}));
        assert!(!disabled.whitelist.enabled);
        assert_eq!(disabled.whitelist_match("example.com"), None);
    }

    #[test]
    fn test_panel_width_pct() {
        let mut settings = Settings::default();
        assert_eq!(settings.set_site_width("https://example.com/feed", 55.2), Some("example.com".to_string()));
        assert_eq!(settings.set_site_width("not a domain", 30.0), None);

        assert_eq!(settings.panel_width_pct("m.example.com"), 55);
        assert_eq!(settings.panel_width_pct("other.com"), 40);
    }

    #[test]
    fn test_store_persists_only_when_changed() {
        let mut store = MemoryStore::default();
        store.get().unwrap();
        assert_eq!(store.writes(), 1);

        store.get().unwrap();
        assert_eq!(store.writes(), 1);

        let mut edited = MemoryStore::with_value(json!({"version": 2, "global": {"minWidthPct": 1}}));
        let settings = edited.get().unwrap();
        assert_eq!(edited.writes(), 1);
        assert_eq!(settings.global.min_width_pct, 10);
    }

    #[test]
    fn test_set_normalizes() {
        let mut store = MemoryStore::default();
        let mut settings = Settings::default();
        settings.global.default_width_pct = 99;

        let stored = store.set(&settings).unwrap();

        assert_eq!(stored.global.default_width_pct, 60);
        assert_eq!(store.read().unwrap(), Some(serde_json::to_value(&stored).unwrap()));
    }

    #[test]
    fn test_json_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"theme": "dark", "splitViewSettings": {"global": {"minWidthPct": 20, "maxWidthPct": 60, "defaultWidthPct": 45}}}"#).unwrap();

        let mut store = JsonFileStore::new(&path);
        let settings = store.get().unwrap();
        assert_eq!(settings.global.default_width_pct, 45);

        let document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document["theme"], "dark");
        assert_eq!(document[STORAGE_KEY]["global"]["stepPct"], 1);
        assert_eq!(document[STORAGE_KEY]["version"], 2);
    }

    #[test]
    fn test_json_file_store_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("absent.json"));

        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_json_file_store_rejects_non_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "[1, 2]").unwrap();

        assert!(matches!(JsonFileStore::new(&path).read(), Err(SplitViewError::SettingsError(_))));
    }
}
