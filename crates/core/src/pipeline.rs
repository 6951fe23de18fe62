//! Extraction pipeline: expand, clone, snapshot, sanitize, filter.
//!
//! Targets are processed strictly one after another because expansion
//! clicks mutate the live page. A failing target is logged and skipped;
//! only a run that yields nothing reports [`SplitViewError::NothingExtracted`].
//!
//! # Example
//!
//! ```rust
//! use splitview_core::{ExtractionPipeline, LivePage, StaticPage};
//!
//! let mut page = StaticPage::from_html(r#"<ul><li class="row">One</li><li class="row">Two</li></ul>"#, None);
//! let rows = page.dom().query_selector_all(page.dom().root(), "li").unwrap();
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! let items = runtime.block_on(ExtractionPipeline::default().extract(&mut page, &rows)).unwrap();
//!
//! assert_eq!(items.len(), 2);
//! assert_eq!(items[1].index, 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::expand::{ExpandConfig, expand_content};
use crate::filter::is_meaningful;
use crate::page::LivePage;
use crate::sanitize::{SanitizeConfig, sanitize_html};
use crate::siterules::SiteRule;
use crate::snapshot::snapshot_styles;
use crate::{Result, SplitViewError};

/// One extracted result, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// 1-based position among the surviving items
    pub index: usize,
    /// Sanitized, style-snapshotted HTML of the target, root included
    pub html: String,
}

/// Configuration for the extraction pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Timing of the post-expansion wait
    pub expand: ExpandConfig,
    /// Whether to inline resolved styles into the extracted HTML
    pub snapshot_styles: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { expand: ExpandConfig::default(), snapshot_styles: true }
    }
}

/// Turns picked elements into [`ExtractedItem`]s.
#[derive(Debug, Clone, Default)]
pub struct ExtractionPipeline {
    config: PipelineConfig,
    rule: Option<SiteRule>,
}

impl ExtractionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, rule: None }
    }

    /// Use `rule` to expand targets before extraction
    pub fn with_rule(mut self, rule: Option<SiteRule>) -> Self {
        self.rule = rule;
        self
    }

    pub fn rule(&self) -> Option<&SiteRule> {
        self.rule.as_ref()
    }

    pub fn set_rule(&mut self, rule: Option<SiteRule>) {
        self.rule = rule;
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extracts every target in order and numbers the survivors from 1.
    ///
    /// # Errors
    ///
    /// Returns [`SplitViewError::NothingExtracted`] when no target produced
    /// meaningful content. Per-target failures are never returned.
    pub async fn extract<P>(&self, page: &mut P, targets: &[NodeId]) -> Result<Vec<ExtractedItem>>
    where
        P: LivePage + ?Sized,
    {
        tracing::info!(targets = targets.len(), "extracting");
        let mut items = Vec::new();

        for (position, &target) in targets.iter().enumerate() {
            match self.extract_target(page, target).await {
                Ok(Some(html)) => items.push(ExtractedItem { index: items.len() + 1, html }),
                Ok(None) => tracing::debug!(node = %target, position, "target has no meaningful content"),
                Err(e) => tracing::warn!(node = %target, position, error = %e, "skipping target"),
            }
        }

        if items.is_empty() {
            return Err(SplitViewError::NothingExtracted);
        }

        tracing::info!(items = items.len(), "extraction finished");
        Ok(items)
    }

    /// Expands and extracts one target; `None` when the result is empty.
    pub async fn extract_target<P>(&self, page: &mut P, target: NodeId) -> Result<Option<String>>
    where
        P: LivePage + ?Sized,
    {
        expand_content(page, target, self.rule.as_ref(), &self.config.expand).await?;

        // the page may have dropped the target while expanding
        if !page.dom().is_attached(target) {
            return Err(SplitViewError::NodeNotFound(target));
        }

        let html = self.extract_html(page, target)?;
        Ok(is_meaningful(&html).then_some(html))
    }

    /// Clones, snapshots and sanitizes `target` without expanding it.
    pub fn extract_html<P>(&self, page: &P, target: NodeId) -> Result<String>
    where
        P: LivePage + ?Sized,
    {
        let (mut clone, copy) = page.dom().clone_subtree(target)?;
        if self.config.snapshot_styles {
            snapshot_styles(page, target, &mut clone, copy)?;
        }

        let sanitize_config = SanitizeConfig::with_base_url(page.base_url().cloned());
        Ok(sanitize_html(&clone.outer_html(copy), &sanitize_config))
    }
}
