use crate::error::{Result, SplitViewError};
use crate::siterules::rule::SiteRule;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Loader for per-domain site rule files (`<domain>.json`)
#[derive(Debug, Clone)]
pub struct RuleLoader {
    /// Custom rule directory path
    custom_dir: Option<PathBuf>,
    /// Standard rule directory path
    standard_dir: Option<PathBuf>,
    /// Lookup cache keyed by hostname; `None` records a miss
    cache: HashMap<String, Option<SiteRule>>,
}

impl RuleLoader {
    /// Create a loader without any rule directory
    pub fn new() -> Self {
        Self { custom_dir: None, standard_dir: None, cache: HashMap::new() }
    }

    /// Load the rule for the host of a URL
    pub fn load_for_url(&mut self, url: &str) -> Result<Option<SiteRule>> {
        let url = url::Url::parse(url).map_err(|e| SplitViewError::InvalidUrl(e.to_string()))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| SplitViewError::InvalidUrl("No domain found in URL".to_string()))?;

        Ok(self.load_for_hostname(hostname))
    }

    /// Load the rule for a hostname.
    ///
    /// Candidates are tried in order, custom directory before standard
    /// directory; the first file that parses wins. Files that fail to parse
    /// are logged and skipped.
    pub fn load_for_hostname(&mut self, hostname: &str) -> Option<SiteRule> {
        let hostname = hostname.trim().to_ascii_lowercase();
        if let Some(cached) = self.cache.get(&hostname) {
            return cached.clone();
        }

        let rule = self.find_rule(&hostname);
        self.cache.insert(hostname, rule.clone());
        rule
    }

    fn find_rule(&self, hostname: &str) -> Option<SiteRule> {
        for domain in rule_candidates(hostname) {
            for dir in [&self.custom_dir, &self.standard_dir].into_iter().flatten() {
                let file_path = dir.join(format!("{}.json", domain));
                if !file_path.exists() {
                    continue;
                }

                match SiteRule::parse_file(&file_path) {
                    Ok(rule) => {
                        tracing::info!(domain = %domain, path = %file_path.display(), "loaded site rule");
                        return Some(rule);
                    }
                    Err(e) => tracing::warn!(path = %file_path.display(), error = %e, "skipping site rule"),
                }
            }
        }

        tracing::debug!(hostname, "no site rule");
        None
    }

    /// Directory searched before the standard one
    pub fn custom_dir(&self) -> Option<&Path> {
        self.custom_dir.as_deref()
    }

    /// Clear the rule cache
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

/// Domains whose rule files apply to `hostname`, most specific first.
///
/// `www.` is dropped; hostnames of more than two labels fall back to their
/// last two labels (`m.twitter.com` → `twitter.com`).
pub fn rule_candidates(hostname: &str) -> Vec<String> {
    let without_www = hostname.strip_prefix("www.").unwrap_or(hostname);
    let mut candidates = vec![without_www.to_string()];

    let parts: Vec<&str> = without_www.split('.').collect();
    if parts.len() > 2 {
        candidates.push(parts[parts.len() - 2..].join("."));
    }

    candidates
}

/// Builder for RuleLoader
#[derive(Debug)]
pub struct RuleLoaderBuilder {
    custom_dir: Option<PathBuf>,
    standard_dir: Option<PathBuf>,
}

impl RuleLoaderBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { custom_dir: None, standard_dir: None }
    }

    /// Set custom rule directory
    pub fn custom_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.custom_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set standard rule directory
    pub fn standard_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.standard_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the RuleLoader
    pub fn build(self) -> RuleLoader {
        RuleLoader { custom_dir: self.custom_dir, standard_dir: self.standard_dir, cache: HashMap::new() }
    }
}

impl Default for RuleLoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RuleLoader {
    fn default() -> Self {
        let mut builder = RuleLoaderBuilder::new();

        if let Some(custom_dir) = Self::default_custom_dir() {
            builder = builder.custom_dir(custom_dir);
        }

        if let Some(standard_dir) = Self::default_standard_dir() {
            builder = builder.standard_dir(standard_dir);
        }

        builder.build()
    }
}

impl RuleLoader {
    /// Get default custom rule directory (~/.config/splitview/site_rules).
    ///
    /// The directory is not created; a missing directory holds no rules.
    fn default_custom_dir() -> Option<PathBuf> {
        let home_dir = dirs::home_dir()?;
        Some(home_dir.join(".config").join("splitview").join("site_rules"))
    }

    /// Get default standard rule directory (shipped next to the binary's working dir)
    fn default_standard_dir() -> Option<PathBuf> {
        let std_dir = PathBuf::from("site_rules");
        if std_dir.exists() { Some(std_dir) } else { None }
    }
}
