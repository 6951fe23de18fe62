//! Split view session: picking, extraction and the content panel.
//!
//! [`SplitView`] ties one [`PickerSession`] to the [`ExtractionPipeline`].
//! When the picker yields targets the session extracts them, opens the
//! split layout and renders the items through a [`RenderSink`] in the
//! current [`RenderMode`].

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::export::{ClipboardPayload, markdown_copy, print_document};
use crate::formatters::{items_to_html, items_to_markdown};
use crate::page::LivePage;
use crate::picker::{PickerEvent, PickerHost, PickerOutcome, PickerSession};
use crate::pipeline::{ExtractedItem, ExtractionPipeline};
use crate::settings::Settings;
use crate::siterules::SiteRule;
use crate::{Result, SplitViewError};

pub const NOTHING_EXTRACTED_MESSAGE: &str = "Nothing extracted";

/// How the panel shows the extracted items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Rich,
    Markdown,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Rich => RenderMode::Markdown,
            RenderMode::Markdown => RenderMode::Rich,
        }
    }
}

/// Split panel of the host.
pub trait RenderSink {
    /// Opens the split layout with the panel at `width_pct` of the viewport
    /// and hides the `hidden` page elements.
    fn open(&mut self, width_pct: u32, hidden: &[NodeId]);

    /// Replaces the panel content; HTML in rich mode, Markdown text otherwise.
    fn render(&mut self, mode: RenderMode, content: &str);

    /// Restores the page layout.
    fn close(&mut self);
}

/// What a copy action puts on the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardContent {
    Rich(ClipboardPayload),
    Plain(String),
}

/// One tab's split view state.
#[derive(Debug, Default)]
pub struct SplitView {
    picker: PickerSession,
    pipeline: ExtractionPipeline,
    settings: Settings,
    mode: RenderMode,
    items: Vec<ExtractedItem>,
    open: bool,
}

impl SplitView {
    pub fn new(pipeline: ExtractionPipeline, settings: Settings) -> Self {
        Self { pipeline, settings, ..Default::default() }
    }

    pub fn picker(&self) -> &PickerSession {
        &self.picker
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    pub fn rule(&self) -> Option<&SiteRule> {
        self.pipeline.rule()
    }

    pub fn set_rule(&mut self, rule: Option<SiteRule>) {
        self.pipeline.set_rule(rule);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn items(&self) -> &[ExtractedItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Enters picking mode.
    pub fn start_picking<H: PickerHost + ?Sized>(&mut self, host: &mut H) {
        self.picker.start(host);
    }

    /// Forwards `event` to the picker and extracts whatever it yields.
    ///
    /// # Errors
    ///
    /// Extraction failures other than an empty result are returned; an
    /// empty result is reported to the user through the host.
    pub async fn handle_event<P, H, S>(
        &mut self, page: &mut P, host: &mut H, sink: &mut S, event: &PickerEvent,
    ) -> Result<PickerOutcome>
    where
        P: LivePage + ?Sized,
        H: PickerHost + ?Sized,
        S: RenderSink + ?Sized,
    {
        let outcome = self.picker.handle_event(&*page, host, event);

        if let PickerOutcome::Extract(targets) = &outcome {
            match self.extract(page, host, sink, targets).await {
                Ok(_) => {}
                Err(SplitViewError::NothingExtracted) => host.notify(NOTHING_EXTRACTED_MESSAGE),
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    /// Extracts `targets`, opens the panel and renders the items.
    pub async fn extract<P, H, S>(
        &mut self, page: &mut P, host: &mut H, sink: &mut S, targets: &[NodeId],
    ) -> Result<usize>
    where
        P: LivePage + ?Sized,
        H: PickerHost + ?Sized,
        S: RenderSink + ?Sized,
    {
        host.notify(&format!("Extracting {} item(s)...", targets.len()));
        let items = self.pipeline.extract(page, targets).await?;
        self.items = items;

        let width_pct = page.hostname().map_or(self.settings.global.default_width_pct, |hostname| {
            self.settings.panel_width_pct(hostname)
        });
        let hidden = self.hide_on_split_targets(&*page);
        sink.open(width_pct, &hidden);
        self.open = true;
        self.render(sink);

        Ok(self.items.len())
    }

    /// Elements the site rule hides while the split layout is active.
    pub fn hide_on_split_targets<P: LivePage + ?Sized>(&self, page: &P) -> Vec<NodeId> {
        let Some(rule) = self.pipeline.rule() else {
            return Vec::new();
        };

        let dom = page.dom();
        let mut hidden = Vec::new();
        for selector in &rule.hide_on_split {
            match dom.query_selector_all(dom.root(), selector) {
                Ok(nodes) => {
                    for node in nodes {
                        if !hidden.contains(&node) {
                            hidden.push(node);
                        }
                    }
                }
                Err(e) => tracing::warn!(selector = %selector, error = %e, "skipping hide selector"),
            }
        }
        hidden
    }

    /// Switches the render mode, re-rendering an open panel.
    pub fn set_mode<S: RenderSink + ?Sized>(&mut self, mode: RenderMode, sink: &mut S) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        if self.open {
            self.render(sink);
        }
    }

    pub fn toggle_mode<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        self.set_mode(self.mode.toggled(), sink);
    }

    /// Closes the panel; the items stay available for copying.
    pub fn close<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        if self.open {
            sink.close();
            self.open = false;
        }
    }

    /// Panel content in the current mode.
    pub fn content(&self) -> String {
        match self.mode {
            RenderMode::Rich => items_to_html(&self.items),
            RenderMode::Markdown => items_to_markdown(&self.items),
        }
    }

    /// Copy action: Markdown text in Markdown mode, rich HTML with the collapse fix otherwise.
    pub fn copy(&self) -> ClipboardContent {
        match self.mode {
            RenderMode::Rich => ClipboardContent::Rich(ClipboardPayload::from_items(&self.items, self.rule())),
            RenderMode::Markdown => ClipboardContent::Plain(markdown_copy(&self.items)),
        }
    }

    /// HTML source of the rich view.
    pub fn copy_source(&self) -> String {
        items_to_html(&self.items)
    }

    /// Print document for PDF export.
    pub fn print_document(&self) -> String {
        print_document(&items_to_html(&self.items))
    }

    fn render<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        sink.render(self.mode, &self.content());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{BoundingBox, StaticPage};
    use crate::picker::Hit;
    use crate::picker::tests::RecordingHost;
    use url::Url;

    #[derive(Debug, Default)]
    struct RecordingSink {
        opened: Option<(u32, Vec<NodeId>)>,
        renders: Vec<(RenderMode, String)>,
        closed: bool,
    }

    impl RenderSink for RecordingSink {
        fn open(&mut self, width_pct: u32, hidden: &[NodeId]) {
            self.opened = Some((width_pct, hidden.to_vec()));
        }

        fn render(&mut self, mode: RenderMode, content: &str) {
            self.renders.push((mode, content.to_string()));
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    const FEED: &str = r#"<html><body>
        <nav id="sidebar">Menu</nav>
        <ul><li class="card"><h2>One</h2></li><li class="card"><h2>Two</h2></li><li class="card"></li></ul>
    </body></html>"#;

    fn feed() -> (StaticPage, Vec<NodeId>) {
        let mut page = StaticPage::from_html(FEED, Url::parse("https://m.example.com/feed").ok());
        let cards = page.dom().query_selector_all(page.dom().root(), "li.card").unwrap();
        for (i, &card) in cards.iter().enumerate() {
            page.set_layout(card, BoundingBox::new(0.0, i as f64 * 50.0, 300.0, 50.0));
        }
        (page, cards)
    }

    fn split_view() -> SplitView {
        let rule = SiteRule::from_json(r##"{"hideOnSplit": ["#sidebar", "nav", "[["]}"##).unwrap();
        let mut settings = Settings::default();
        settings.set_site_width("example.com", 50.0);
        SplitView::new(ExtractionPipeline::default().with_rule(Some(rule)), settings)
    }

    #[tokio::test(start_paused = true)]
    async fn test_label_click_extracts_and_renders_siblings() {
        let (mut page, _) = feed();
        let mut host = RecordingHost { answer: true, ..Default::default() };
        let mut sink = RecordingSink::default();
        let mut view = split_view();
        view.start_picking(&mut host);

        let moved = PickerEvent::PointerMove { x: 5.0, y: 5.0 };
        view.handle_event(&mut page, &mut host, &mut sink, &moved).await.unwrap();
        let label = PickerEvent::Click { target: Hit::Label };
        let outcome = view.handle_event(&mut page, &mut host, &mut sink, &label).await.unwrap();

        assert!(matches!(outcome, PickerOutcome::Extract(ref targets) if targets.len() == 3));
        assert!(host.notifications.contains(&"Extracting 3 item(s)...".to_string()));
        assert_eq!(view.items().len(), 2);
        assert!(view.is_open());

        let sidebar = page.dom().query_selector(page.dom().root(), "#sidebar").unwrap().unwrap();
        assert_eq!(sink.opened, Some((50, vec![sidebar])));

        let (mode, content) = sink.renders.last().unwrap();
        assert_eq!(*mode, RenderMode::Rich);
        assert!(content.contains(r#"<br class="splitview-separator"><hr><br>"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_extracted_is_notified() {
        let (mut page, cards) = feed();
        let mut host = RecordingHost::default();
        let mut sink = RecordingSink::default();
        let mut view = split_view();
        view.start_picking(&mut host);

        view.handle_event(&mut page, &mut host, &mut sink, &PickerEvent::PointerMove { x: 5.0, y: 105.0 })
            .await
            .unwrap();
        let click = PickerEvent::Click { target: Hit::Element(cards[2]) };
        let outcome = view.handle_event(&mut page, &mut host, &mut sink, &click).await.unwrap();

        assert_eq!(outcome, PickerOutcome::Extract(vec![cards[2]]));
        assert_eq!(host.notifications.last().map(String::as_str), Some(NOTHING_EXTRACTED_MESSAGE));
        assert!(!view.is_open());
        assert!(sink.renders.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_toggle_rerenders_markdown() {
        let (mut page, cards) = feed();
        let mut host = RecordingHost::default();
        let mut sink = RecordingSink::default();
        let mut view = split_view();

        view.extract(&mut page, &mut host, &mut sink, &cards[..2]).await.unwrap();
        view.toggle_mode(&mut sink);

        assert_eq!(view.mode(), RenderMode::Markdown);
        assert_eq!(sink.renders.len(), 2);
        assert_eq!(sink.renders[1], (RenderMode::Markdown, "- ## One\n\n---\n\n- ## Two".to_string()));
        assert_eq!(view.copy(), ClipboardContent::Plain("- ## One\n\n---\n\n- ## Two".to_string()));

        view.set_mode(RenderMode::Markdown, &mut sink);
        assert_eq!(sink.renders.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_keeps_items() {
        let (mut page, cards) = feed();
        let mut host = RecordingHost::default();
        let mut sink = RecordingSink::default();
        let mut view = split_view();

        view.extract(&mut page, &mut host, &mut sink, &cards[..1]).await.unwrap();
        view.close(&mut sink);
        view.toggle_mode(&mut sink);

        assert!(sink.closed);
        assert!(!view.is_open());
        assert_eq!(sink.renders.len(), 1);
        assert!(view.copy_source().contains(">One</h2>"));
        assert!(view.print_document().contains(">One</h2>"));
    }

    #[test]
    fn test_default_width_without_hostname() {
        let view = SplitView::default();
        let page = StaticPage::from_html("<p>x</p>", None);

        assert!(view.hide_on_split_targets(&page).is_empty());
        assert_eq!(view.settings().global.default_width_pct, 40);
    }

    #[test]
    fn test_render_mode_toggled() {
        assert_eq!(RenderMode::Rich.toggled(), RenderMode::Markdown);
        assert_eq!(RenderMode::Markdown.toggled(), RenderMode::Rich);
        assert_eq!(serde_json::to_string(&RenderMode::Markdown).unwrap(), r#""markdown""#);
    }
}
