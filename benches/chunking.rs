//! Benchmarks for the transcript pipeline stages.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use seams::{ChunkConfig, Chunker, Merger, RewrittenChunk, TranscriptChunker};

fn sample_transcript(size: usize) -> String {
    // Alternating turns with mixed CJK and Latin text
    let turns = [
        "【主持人】大家好，欢迎参加今天的预算会议。我们先看一下研发部门的情况。\n\n",
        "【嘉宾】谢谢主持人。研发投入明年需要增加，尤其是平台团队。\n\n",
        "Alice: The platform team is already at capacity. We need two more engineers.\n\n",
        "【嘉宾】对，我同意这个判断，人员配置要优先解决\n\n",
        "Bob: Agreed. Let's revisit the numbers next week.\n\n",
    ];
    let mut text = String::with_capacity(size);
    let mut i = 0;
    while text.len() < size {
        text.push_str(turns[i % turns.len()]);
        i += 1;
    }
    text
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let chunker = TranscriptChunker::new(ChunkConfig::new(500)).unwrap();

    for size in [1_000, 10_000, 100_000] {
        let text = sample_transcript(size);

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("split", size), &text, |b, text| {
            b.iter(|| chunker.split(black_box(text)))
        });
    }

    group.finish();
}

fn bench_chunk_with_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk");
    let chunker = TranscriptChunker::new(ChunkConfig::new(500).with_overlap(80)).unwrap();

    for size in [1_000, 10_000, 100_000] {
        let text = sample_transcript(size);

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("overlap", size), &text, |b, text| {
            b.iter(|| chunker.chunk(black_box(text)))
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let chunker = TranscriptChunker::new(ChunkConfig::new(500).with_overlap(80)).unwrap();
    let merger = Merger::default();

    for size in [10_000, 100_000] {
        let text = sample_transcript(size);
        let rewritten: Vec<RewrittenChunk> = chunker
            .chunk(&text)
            .iter()
            .map(|chunk| RewrittenChunk::from_chunk(chunk, chunk.text.clone()))
            .collect();

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("merge", size), &rewritten, |b, chunks| {
            b.iter(|| merger.merge(black_box(chunks)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split, bench_chunk_with_overlap, bench_merge);
criterion_main!(benches);
