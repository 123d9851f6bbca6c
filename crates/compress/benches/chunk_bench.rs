//! Benchmarks for chunk framing and stream compression throughput.
//!
//! Run with: `cargo bench -p compress`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use compress::chunk::ChunkCodec;
use compress::options::Encoding;
use compress::stream::StreamCompressor;

// ============================================================================
// Test Data Generation
// ============================================================================

/// Text-like data with plenty of repetition.
fn generate_text(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog; "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Pseudo-random bytes that LZO cannot shrink.
fn generate_noise(len: usize) -> Vec<u8> {
    let mut state = 0x853c_49e6_748f_ea9b_u64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 56) as u8
        })
        .collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_chunk_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_codec");
    let mut codec = ChunkCodec::new().expect("lzo self check");

    for size in [4 * 1024, 64 * 1024, 1024 * 1024] {
        for (name, data) in [("text", generate_text(size)), ("noise", generate_noise(size))] {
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("compress_{name}"), size),
                &data,
                |b, data| b.iter(|| codec.compress(black_box(data)).expect("compress")),
            );

            let chunk = codec.compress(&data).expect("compress");
            group.bench_with_input(
                BenchmarkId::new(format!("decompress_{name}"), size),
                &chunk,
                |b, chunk| b.iter(|| codec.decompress(black_box(chunk)).expect("decompress")),
            );
        }
    }
    group.finish();
}

fn bench_stream_compressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_compressor");
    let data = generate_text(256 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for encoding in [Encoding::Zlib, Encoding::Gzip] {
        let mut compressor = StreamCompressor::new();
        compressor.set_encoding(encoding);
        group.bench_function(BenchmarkId::new("encode", encoding), |b| {
            b.iter(|| {
                compressor
                    .encode_buffer(black_box(&data))
                    .expect("encode")
                    .len()
            })
        });

        let compressed = compressor.encode_buffer(&data).expect("encode").to_vec();
        group.bench_function(BenchmarkId::new("decode_guess", encoding), |b| {
            b.iter(|| {
                compressor
                    .decode_buffer(black_box(&compressed))
                    .expect("decode")
                    .len()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chunk_codec, bench_stream_compressor);
criterion_main!(benches);
