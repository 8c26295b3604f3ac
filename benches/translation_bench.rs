/*!
 * Benchmarks for the CPU-bound parts of a translation run.
 *
 * Measures performance of:
 * - Batch partitioning
 * - Model reply parsing
 * - Transcript cleaning
 * - Reassembly of translated batches
 * - SRT parsing
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;

use movsub::cleaner::clean_cues;
use movsub::subtitle_processor::{Cue, CueStore};
use movsub::translation::assembler::Assembler;
use movsub::translation::response::ResponseParser;
use movsub::translation::{split_into_batches, TranslationResult};

/// Generate test cues.
fn generate_cues(count: usize) -> Vec<Cue> {
    let texts = [
        "Hello, how are you today?",
        "<i>I'm doing well</i>, thank you for asking.",
        "[MUSIC PLAYING]",
        "The weather is quite nice.",
        "The weather is quite nice.",
        "(SIGHS) Did you see the news this morning?",
        "No, I haven't had time to check.",
        "...",
        "Something important happened at the meeting.",
        "Tell me more about it. ♪",
    ];

    (0..count)
        .map(|i| {
            Cue::new(
                i + 1,
                (i as u64) * 3000,
                (i as u64) * 3000 + 2500,
                texts[i % texts.len()],
            )
        })
        .collect()
}

/// Numbered reply with a preamble, the way chatty models answer.
fn generate_reply(lines: usize) -> String {
    let mut reply = String::from("Here are the translations:\n\n```\n");
    for i in (1..=lines).rev() {
        reply.push_str(&format!("[{}] 这是第{}行的翻译。\n", i, i));
    }
    reply.push_str("```\n");
    reply
}

// ============================================================================
// Engine Benchmarks
// ============================================================================

fn bench_batching(c: &mut Criterion) {
    let mut group = c.benchmark_group("batching");

    for size in [100, 1000, 5000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let cues = generate_cues(size);
            b.iter(|| black_box(split_into_batches(&cues, 30)));
        });
    }

    group.finish();
}

fn bench_response_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_parsing");

    for lines in [10, 30, 100].iter() {
        group.throughput(Throughput::Elements(*lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, &lines| {
            let reply = generate_reply(lines);
            b.iter(|| black_box(ResponseParser::parse(&reply)));
        });
    }

    group.finish();
}

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");

    for size in [100, 1000, 5000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let cues = generate_cues(size);
            let batches = split_into_batches(&cues, 30).unwrap_or_default();
            let results: BTreeMap<usize, TranslationResult> = batches
                .iter()
                .map(|batch| {
                    let lines = batch.texts().iter().map(|t| format!("译: {}", t)).collect();
                    (batch.batch_id, TranslationResult::from_lines(batch, lines))
                })
                .collect();
            b.iter(|| black_box(Assembler::assemble(&cues, &results, &batches)));
        });
    }

    group.finish();
}

// ============================================================================
// Text Processing Benchmarks
// ============================================================================

fn bench_cleaning(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleaning");

    for size in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let cues = generate_cues(size);
            b.iter(|| black_box(clean_cues(cues.clone())));
        });
    }

    group.finish();
}

fn bench_srt_parsing(c: &mut Criterion) {
    let content: String = generate_cues(1000).iter().map(|cue| cue.to_string()).collect();

    c.bench_function("srt_parse_1000", |b| {
        b.iter(|| black_box(CueStore::parse_srt_string(&content)));
    });
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    engine_benches,
    bench_batching,
    bench_response_parsing,
    bench_assembly,
);

criterion_group!(
    text_benches,
    bench_cleaning,
    bench_srt_parsing,
);

criterion_main!(
    engine_benches,
    text_benches,
);
