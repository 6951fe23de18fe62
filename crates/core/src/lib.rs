pub mod dom;
pub mod error;
pub mod expand;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod formatters;
pub mod page;
pub mod picker;
pub mod pipeline;
pub mod poll;
pub mod sanitize;
pub mod session;
pub mod settings;
pub mod siblings;
pub mod siterules;
pub mod snapshot;
pub mod style;

pub use dom::{Dom, NodeId, first_class};
pub use error::{Result, SplitViewError};
pub use expand::{ExpandConfig, ExpandOutcome, expand_content, is_navigation_risk, visible_text};
pub use export::{ClipboardPayload, apply_collapse_fix, markdown_copy, print_document};
#[cfg(feature = "fetch")]
pub use fetch::{FetchedDocument, fetch_url};
pub use fetch::{FetchConfig, fetch_file, fetch_stdin, parse_page_url};
pub use filter::is_meaningful;
pub use formatters::{JsonConfig, JsonFormatter, MarkdownConverter, TextConfig, TextFormatter};
pub use formatters::{convert_to_json, convert_to_text, html_to_markdown, items_to_html, items_to_markdown};
pub use page::{BoundingBox, LivePage, StaticPage};
pub use picker::{Hit, PickerEvent, PickerHost, PickerOutcome, PickerSession, PickerState};
pub use pipeline::{ExtractedItem, ExtractionPipeline, PipelineConfig};
pub use poll::poll_until;
pub use sanitize::{SanitizeConfig, sanitize_html};
pub use session::{ClipboardContent, RenderMode, RenderSink, SplitView};
pub use settings::{JsonFileStore, Settings, SettingsStore};
pub use siblings::match_siblings;
pub use siterules::{RuleLoader, RuleLoaderBuilder, SiteRule};
#[doc(hidden)]
pub use snapshot::style_snapshot;
pub use snapshot::snapshot_styles;
pub use style::{ComputedStyle, computed_style_of};
