//! Benchmarks for the wpblocks pipeline.
//!
//! Run with: cargo bench
//!
//! These benchmarks measure each stage on synthetic posts of various sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wpblocks::{
    BatchOptions, CleanerOptions, CleaningRules, ContentCleaner, SignatureEntry, SignatureMaker,
    SignatureTable, SourceDocument, WpBlocks,
};

/// Creates a synthetic block-editor post with the given number of sections.
fn create_test_post(section_count: usize) -> String {
    let mut html = String::new();
    for i in 0..section_count {
        html.push_str(&format!(
            r#"<h2>Section {i}</h2>
<div class="wp-block-group"><p>This is paragraph {i} with <strong>some</strong> test content for benchmarking purposes.</p></div>
<div class="wp-block-image"><figure class="aligncenter"><img src="image-{i}.jpg" alt="Image {i}"><figcaption>Caption {i}</figcaption></figure></div>
<blockquote><p>Quote {i}</p><cite>Author {i}</cite></blockquote>
<figure><iframe src="https://www.youtube.com/embed/video{i}?feature=oembed"></iframe></figure>
<ul><li>one</li><li>two</li></ul>
"#
        ));
    }
    html
}

fn create_test_table() -> SignatureTable {
    [
        ("h2:", "heading"),
        ("p:", "rich_text"),
        ("p:strong:", "rich_text"),
        ("ul:li:", "rich_text"),
        ("figure:img:", "image"),
        ("blockquote:p:", "block_quote"),
        ("figure:iframe:", "embed"),
    ]
    .into_iter()
    .map(|(signature, builder)| SignatureEntry::new(signature, builder))
    .collect()
}

/// Benchmark streaming signature extraction.
fn bench_signatures(c: &mut Criterion) {
    let mut group = c.benchmark_group("signatures");
    let maker = SignatureMaker::new();

    for section_count in [10, 100, 500].iter() {
        let html = create_test_post(*section_count);
        group.throughput(Throughput::Bytes(html.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("sections", section_count),
            &html,
            |b, html| {
                b.iter(|| maker.signatures(black_box(html)));
            },
        );
    }

    group.finish();
}

/// Benchmark rule-based cleaning.
fn bench_cleaning(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleaning");
    let cleaner = ContentCleaner::new(CleaningRules::wordpress(), CleanerOptions::default());

    for section_count in [10, 100, 500].iter() {
        let html = create_test_post(*section_count);
        group.throughput(Throughput::Bytes(html.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("sections", section_count),
            &html,
            |b, html| {
                b.iter(|| cleaner.clean(black_box(html)));
            },
        );
    }

    group.finish();
}

/// Benchmark the full clean-then-build conversion.
fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");
    let converter = WpBlocks::new()
        .with_table(create_test_table())
        .converter()
        .unwrap();

    for section_count in [10, 100, 500].iter() {
        let html = create_test_post(*section_count);
        group.throughput(Throughput::Bytes(html.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("sections", section_count),
            &html,
            |b, html| {
                b.iter(|| converter.convert(black_box(html)));
            },
        );
    }

    group.finish();
}

/// Benchmark batch conversion, sequential against parallel.
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let converter = WpBlocks::new()
        .with_table(create_test_table())
        .converter()
        .unwrap();

    let documents: Vec<SourceDocument> = (0..64)
        .map(|i| SourceDocument::new(i.to_string(), "WPPost", create_test_post(20)))
        .collect();

    group.bench_function("sequential", |b| {
        b.iter(|| {
            wpblocks::convert_all(
                &converter,
                black_box(&documents),
                BatchOptions::new().sequential(),
            )
        });
    });

    group.bench_function("parallel", |b| {
        b.iter(|| wpblocks::convert_all(&converter, black_box(&documents), BatchOptions::new()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_signatures,
    bench_cleaning,
    bench_conversion,
    bench_batch,
);
criterion_main!(benches);
