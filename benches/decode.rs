//! Decoder and classification benchmarks.
//!
//! Measures the streaming UTF-8 decoder on the hot path (chunked feed
//! bytes) and the close-code classifier.
//!
//! Run with: cargo bench --bench decode
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use termfeed::{CloseClass, StreamDecoder};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CHUNK_SIZE: usize = 4096;

// ============================================================================
// Benchmark: Streaming Decode
// ============================================================================

fn bench_decode_ascii(c: &mut Criterion) {
    let chunk = vec![b'x'; CHUNK_SIZE];

    c.bench_function("decode_ascii_chunk", |b| {
        let mut decoder = StreamDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box(&chunk))));
    });
}

fn bench_decode_split_multibyte(c: &mut Criterion) {
    // Every chunk boundary splits a three-byte scalar.
    let text = "\u{20AC}".repeat(CHUNK_SIZE / 3);
    let bytes = text.as_bytes();
    let (head, tail) = bytes.split_at(bytes.len() / 2 + 1);

    c.bench_function("decode_split_multibyte", |b| {
        let mut decoder = StreamDecoder::new();
        b.iter(|| {
            let mut out = decoder.decode(black_box(head));
            out.push_str(&decoder.decode(black_box(tail)));
            black_box(out)
        });
    });
}

// ============================================================================
// Benchmark: Close Classification
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let codes = [Some(1000), Some(1006), Some(4001), Some(4002), None];

    c.bench_function("classify_close_codes", |b| {
        b.iter(|| {
            for code in codes {
                black_box(CloseClass::classify(black_box(code)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_decode_ascii,
    bench_decode_split_multibyte,
    bench_classify
);
criterion_main!(benches);
