//! Benchmarks for message classification.
//!
//! Every user message runs through all four classifiers before the
//! response service is called, so analysis should stay well under a
//! millisecond even for long messages.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use recall_chat::{
    classify_intent, classify_sentiment, extract_entities, extract_topics, MessageAnalyzer,
};

/// Representative messages covering each intent category.
const MESSAGES: &[&str] = &[
    "What is Storyblok?",
    "My Next.js build is broken and the API returns an error",
    "Where can I find the blog post about SEO?",
    "Write a draft for our product launch",
    "Which hosting provider do you recommend for Nuxt?",
    "Compare React vs Vue for a headless CMS frontend",
    "Analyze the performance metrics from last week",
    "Automate the publish workflow with a webhook trigger",
    "This is great, I love it, thanks!",
];

/// A long message built by repeating the representative set.
fn long_message() -> String {
    MESSAGES.iter().cycle().take(200).cloned().collect::<Vec<_>>().join(" ")
}

fn bench_individual_classifiers(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifiers");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("intent", |b| {
        b.iter(|| {
            for message in MESSAGES {
                black_box(classify_intent(black_box(message)));
            }
        });
    });

    group.bench_function("sentiment", |b| {
        b.iter(|| {
            for message in MESSAGES {
                black_box(classify_sentiment(black_box(message)));
            }
        });
    });

    group.bench_function("topics", |b| {
        b.iter(|| {
            for message in MESSAGES {
                black_box(extract_topics(black_box(message)));
            }
        });
    });

    group.bench_function("entities", |b| {
        b.iter(|| {
            for message in MESSAGES {
                black_box(extract_entities(black_box(message)));
            }
        });
    });

    group.finish();
}

fn bench_full_analysis(c: &mut Criterion) {
    let analyzer = MessageAnalyzer::new();
    let long = long_message();

    let mut group = c.benchmark_group("analysis");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("short_messages", |b| {
        b.iter(|| {
            for message in MESSAGES {
                black_box(analyzer.analyze(black_box(message)));
            }
        });
    });

    group.bench_function("long_message", |b| {
        b.iter(|| black_box(analyzer.analyze(black_box(&long))));
    });

    group.finish();
}

criterion_group!(benches, bench_individual_classifiers, bench_full_analysis);
criterion_main!(benches);
