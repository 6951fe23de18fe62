mod echo;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use splitview_core::formatters::items_to_text;
use splitview_core::{
    ClipboardPayload, ExpandConfig, ExtractedItem, ExtractionPipeline, FetchConfig, JsonConfig, LivePage,
    PipelineConfig, RuleLoader, RuleLoaderBuilder, SiteRule, SplitViewError, StaticPage, TextConfig,
    convert_to_json, fetch_file, fetch_stdin, fetch_url, items_to_html, items_to_markdown, match_siblings,
    parse_page_url, print_document,
};
use tracing_subscriber::EnvFilter;
use url::Url;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for extracted items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Rich,
    Markdown,
    Text,
    Json,
    Print,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rich" | "html" => Ok(Self::Rich),
            "markdown" | "md" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "print" | "pdf" => Ok(Self::Print),
            _ => Err(format!("Invalid format: {}. Valid options: rich, markdown, text, json, print", s)),
        }
    }
}

/// Extract elements of a web page as rich HTML, Markdown or text
#[derive(Parser, Debug)]
#[command(name = "splitview")]
#[command(author = "SplitView Contributors")]
#[command(version = VERSION)]
#[command(about = "Extract picked elements of web pages", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// CSS selector of the elements to extract
    #[arg(short, long, default_value = "body", value_name = "SELECTOR")]
    select: String,

    /// Extract the first match together with its similar siblings
    #[arg(long)]
    siblings: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (rich, markdown, text, json, print)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// Base URL for resolving links of file or stdin input
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Custom site rule directory
    #[arg(long, value_name = "DIR")]
    rules_dir: Option<PathBuf>,

    /// Do not load site rules
    #[arg(long)]
    no_rules: bool,

    /// Do not inline resolved styles
    #[arg(long)]
    no_styles: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// How long to wait for expanded content, in milliseconds
    #[arg(long, default_value = "2000", value_name = "MS")]
    expand_timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .try_init();
}

async fn load_page(args: &Args) -> anyhow::Result<StaticPage> {
    let base_url = args.base_url.as_deref().map(parse_page_url).transpose().context("Invalid base URL")?;
    tracing::debug!(input = %args.input, base_url = ?base_url.as_ref().map(Url::as_str), "loading page");

    if args.input == "-" {
        let html = fetch_stdin().context("Failed to read from stdin")?;
        return Ok(StaticPage::from_html(&html, base_url));
    }

    if args.input.starts_with("http://") || args.input.starts_with("https://") {
        let config = FetchConfig {
            timeout: args.timeout,
            user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
        };
        let document = fetch_url(&args.input, &config).await.context("Failed to fetch URL")?;
        tracing::info!(url = %document.url, bytes = document.html.len(), "fetched page");
        return Ok(StaticPage::from_html(&document.html, base_url.or(Some(document.url))));
    }

    let html = fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?;
    Ok(StaticPage::from_html(&html, base_url))
}

fn load_rule(args: &Args, page: &StaticPage) -> Option<SiteRule> {
    if args.no_rules {
        return None;
    }

    let Some(hostname) = page.hostname() else {
        tracing::debug!("page has no hostname, skipping site rules");
        return None;
    };
    let mut loader = match &args.rules_dir {
        Some(dir) => RuleLoaderBuilder::new().custom_dir(dir).build(),
        None => RuleLoader::default(),
    };
    let rule = loader.load_for_hostname(hostname);
    tracing::debug!(hostname, found = rule.is_some(), "site rule lookup");
    rule
}

fn render(args: &Args, items: &[ExtractedItem], source: Option<&Url>, rule: Option<&SiteRule>) -> anyhow::Result<String> {
    let output = match args.format {
        OutputFormat::Rich => items_to_html(items),
        OutputFormat::Markdown => items_to_markdown(items),
        OutputFormat::Text => items_to_text(items, &TextConfig::default()),
        OutputFormat::Json => {
            let config = JsonConfig { include_markdown: true, include_text: true, pretty: true };
            convert_to_json(items, source.map(Url::as_str), &config).context("Failed to convert to JSON")?
        }
        OutputFormat::Print => print_document(&ClipboardPayload::from_items(items, rule).html),
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
        echo::print_step(1, 4, &format!("Loading {}", args.input.bright_white()));
    }

    let mut page = load_page(&args).await?;

    if args.verbose {
        echo::print_detail("Elements", &page.dom().len().to_string());
        if let Some(base_url) = page.base_url() {
            echo::print_detail("Base URL", base_url.as_str());
        }
        eprintln!();
        echo::print_step(2, 4, &format!("Selecting {}", args.select.bright_white()));
    }

    let root = page.dom().root();
    let mut targets =
        page.dom().query_selector_all(root, &args.select).with_context(|| format!("Invalid selector: {}", args.select))?;
    if targets.is_empty() {
        bail!("No element matches {}", args.select);
    }
    if args.siblings {
        targets = match_siblings(&page, targets[0]);
        tracing::debug!(count = targets.len(), "matched siblings");
    }

    let rule = load_rule(&args, &page);

    if args.verbose {
        echo::print_detail("Targets", &targets.len().to_string());
        echo::print_detail("Site rule", if rule.is_some() { "Yes" } else { "No" });
        eprintln!();
        echo::print_step(3, 4, "Extracting");
    }

    let config = PipelineConfig {
        expand: ExpandConfig { timeout: Duration::from_millis(args.expand_timeout), ..Default::default() },
        snapshot_styles: !args.no_styles,
    };
    let pipeline = ExtractionPipeline::new(config).with_rule(rule);

    let started = Instant::now();
    let items = match pipeline.extract(&mut page, &targets).await {
        Ok(items) => items,
        Err(SplitViewError::NothingExtracted) => {
            tracing::warn!(targets = targets.len(), "every target was empty");
            echo::print_warning("Every target was empty");
            bail!("Nothing extracted");
        }
        Err(e) => return Err(e).context("Extraction failed"),
    };
    tracing::info!(items = items.len(), elapsed_ms = started.elapsed().as_millis() as u64, "extraction finished");

    if args.verbose {
        echo::print_timing("Extraction", started.elapsed());
        echo::print_items(&items);
        echo::print_step(4, 4, "Writing output");
        echo::print_detail("Format", &format!("{:?}", args.format));
        eprintln!();
    }

    let output = render(&args, &items, page.base_url(), pipeline.rule())?;

    match &args.output {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
