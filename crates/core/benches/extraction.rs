use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use splitview_core::{
    Dom, LivePage, SanitizeConfig, StaticPage, html_to_markdown, sanitize_html, snapshot_styles,
};
use url::Url;

fn load_feed() -> String {
    std::fs::read_to_string("../../tests/fixtures/feed.html").unwrap()
}

/// The feed fixture repeated `copies` times inside one body.
fn repeated_feed(copies: usize) -> String {
    let feed = load_feed();
    let body = feed.split("<body>").nth(1).and_then(|rest| rest.split("</body>").next()).unwrap_or("");
    format!("<html><body>{}</body></html>", body.repeat(copies))
}

fn bench_sanitize(c: &mut Criterion) {
    let config = SanitizeConfig::with_base_url(Url::parse("https://example.com/feed").ok());
    let mut group = c.benchmark_group("sanitize");

    for copies in [1, 10, 100] {
        let html = repeated_feed(copies);
        group.bench_with_input(BenchmarkId::new("feed", copies), &html, |b, html| {
            b.iter(|| sanitize_html(black_box(html), &config))
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let page = StaticPage::from_html(&repeated_feed(20), None);
    let main = page.dom().query_selector(page.dom().root(), "body").unwrap().unwrap();

    c.bench_function("snapshot_styles", |b| {
        b.iter(|| {
            let (mut clone, root): (Dom, _) = page.dom().clone_subtree(main).unwrap();
            snapshot_styles(&page, black_box(main), &mut clone, root).unwrap()
        })
    });
}

fn bench_markdown(c: &mut Criterion) {
    let html = sanitize_html(&repeated_feed(20), &SanitizeConfig::default());

    c.bench_function("html_to_markdown", |b| b.iter(|| html_to_markdown(black_box(&html))));
}

criterion_group!(benches, bench_sanitize, bench_snapshot, bench_markdown);
criterion_main!(benches);
