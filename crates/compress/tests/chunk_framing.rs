//! End-to-end tests for the chunk framing layer.
//!
//! This test suite focuses on:
//! 1. Round trips through the chunk codec and chunk sequences
//! 2. Integrity checks: checksum and length sensitivity
//! 3. Start, Stop and Null chunk semantics
//! 4. Buffer sizing guarantees

use std::io::{Read, Write};

use compress::header::{HEADER_SIZE, NULL_CHUNK};
use compress::lzo::Lzo;
use compress::sequence::{ChunkReader, ChunkWriter, WriterConfig, looks_chunked};
use compress::{ChunkCodec, ChunkError, ChunkHeader, ChunkType, FrameError};
use proptest::prelude::*;

fn codec() -> ChunkCodec {
    ChunkCodec::new().expect("lzo self check")
}

// =============================================================================
// SECTION 1: Round trips
// =============================================================================

#[test]
fn hello_world_scenario() {
    let mut codec = codec();
    let chunk = codec.compress(b"hello world").unwrap();

    let (header, payload) = ChunkHeader::read(&chunk).unwrap();
    assert_eq!(header.uncompressed_length(), 11);
    assert_eq!(header.chunk_type(), ChunkType::Lzo1x);

    let mut restored = [0u8; 11];
    let written = Lzo::new().unwrap().decompress(payload, &mut restored).unwrap();
    assert_eq!(written, 11);
    assert_eq!(&restored, b"hello world");
}

#[test]
fn empty_and_tiny_inputs_round_trip() {
    let mut codec = codec();
    for input in [&b""[..], b"a", b"ab", b"abc", b"abcd"] {
        let chunk = codec.compress(input).unwrap();
        assert_eq!(codec.decompress(&chunk).unwrap(), input);
    }
}

#[test]
fn large_buffer_round_trips() {
    let mut codec = codec();
    let data: Vec<u8> = (0..1_000_000u32)
        .map(|i| (i / 7 % 256) as u8 ^ (i % 3) as u8)
        .collect();
    let chunk = codec.compress(&data).unwrap();
    assert!(chunk.len() < data.len());
    assert_eq!(codec.decompress(&chunk).unwrap(), data);
}

#[test]
fn sequence_round_trips_through_io_traits() {
    let data = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(500);

    let config = WriterConfig::default().with_block_size(1024);
    let mut writer =
        ChunkWriter::with_config(Vec::new(), codec(), data.len() as u32, config).unwrap();
    for piece in data.chunks(333) {
        writer.write_all(piece).unwrap();
    }
    assert_eq!(writer.bytes_accepted(), data.len() as u64);
    let framed = writer.finish().unwrap();
    assert!(looks_chunked(&framed));

    let mut reader = ChunkReader::new(framed.as_slice()).unwrap();
    let mut restored = Vec::new();
    reader.read_to_end(&mut restored).unwrap();
    assert_eq!(restored, data);
    assert_eq!(reader.declared_length(), Some(data.len() as u32));
}

// =============================================================================
// SECTION 2: Integrity
// =============================================================================

#[test]
fn every_single_bit_flip_after_length_field_is_caught() {
    let chunk = codec().compress(b"integrity matters").unwrap();
    for byte in 4..chunk.len() {
        for bit in 0..8 {
            let mut corrupted = chunk.clone();
            corrupted[byte] ^= 1 << bit;
            let result = ChunkHeader::read(&corrupted);
            assert!(
                matches!(result, Err(FrameError::CrcMismatch { .. })),
                "byte {byte} bit {bit}: {result:?}"
            );
        }
    }
}

#[test]
fn every_truncation_is_caught() {
    let chunk = codec().compress(b"do not cut me short").unwrap();
    for len in 0..chunk.len() {
        let result = ChunkHeader::read(&chunk[..len]);
        assert!(
            matches!(
                result,
                Err(FrameError::LengthMismatch { .. } | FrameError::ChunkTooShort { .. })
            ),
            "length {len}: {result:?}"
        );
    }
}

#[test]
fn corrupted_chunk_in_sequence_aborts_reading() {
    let data = vec![b'x'; 10_000];
    let mut writer = ChunkWriter::new(Vec::new(), data.len() as u32).unwrap();
    writer.write_all(&data).unwrap();
    let mut framed = writer.finish().unwrap();

    let target = HEADER_SIZE + HEADER_SIZE + 2;
    framed[target] ^= 0x01;

    let mut reader = ChunkReader::new(framed.as_slice()).unwrap();
    assert!(matches!(
        reader.read_all(),
        Err(ChunkError::Frame(FrameError::CrcMismatch { .. }))
    ));
}

// =============================================================================
// SECTION 3: Control chunks
// =============================================================================

#[test]
fn null_chunk_equals_stop_chunk() {
    let (null, null_payload) = ChunkHeader::read(&NULL_CHUNK).unwrap();
    let stop_bytes = ChunkHeader::for_stop();
    let (stop, stop_payload) = ChunkHeader::read(&stop_bytes).unwrap();

    assert_eq!(null.chunk_type(), ChunkType::Stop);
    assert_eq!(stop.chunk_type(), ChunkType::Stop);
    assert!(null_payload.is_empty());
    assert!(stop_payload.is_empty());
    assert_eq!(ChunkHeader::read_start(&NULL_CHUNK).unwrap(), 0);
}

#[test]
fn start_chunk_carries_total_length() {
    assert_eq!(
        ChunkHeader::read_start(&ChunkHeader::for_start(12345)).unwrap(),
        12345
    );

    let mut stored = ChunkHeader::for_uncompressed(b"x").unwrap().to_vec();
    stored.push(b'x');
    assert!(matches!(
        ChunkHeader::read_start(&stored),
        Err(FrameError::UnexpectedChunkType {
            found: ChunkType::None,
            ..
        })
    ));
    assert!(ChunkHeader::try_read_start(&stored).is_none());
}

#[test]
fn decompress_requires_compressed_chunk() {
    let mut codec = codec();
    let start = ChunkHeader::for_start(3);
    assert!(matches!(
        codec.decompress(&start),
        Err(ChunkError::Frame(FrameError::UnexpectedChunkType {
            found: ChunkType::Start,
            ..
        }))
    ));
}

// =============================================================================
// SECTION 4: Property tests
// =============================================================================

proptest! {
    #[test]
    fn codec_round_trip(data in prop::collection::vec(any::<u8>(), 0..8192)) {
        let mut codec = codec();
        let chunk = codec.compress(&data).unwrap();
        prop_assert_eq!(codec.decompress(&chunk).unwrap(), data);
    }

    #[test]
    fn chunk_never_exceeds_max_chunk_length(data in prop::collection::vec(any::<u8>(), 0..8192)) {
        let mut codec = codec();
        let bound = codec.max_chunk_length(data.len());
        prop_assert!(bound >= data.len() + HEADER_SIZE);
        prop_assert!(codec.compress(&data).unwrap().len() <= bound);
    }

    #[test]
    fn bit_flip_is_crc_mismatch(
        data in prop::collection::vec(any::<u8>(), 0..512),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut chunk = codec().compress_or_store(&data).unwrap();
        let byte = 8 + position.index(chunk.len() - 8);
        chunk[byte] ^= 1 << bit;
        let is_crc_mismatch = matches!(ChunkHeader::read(&chunk), Err(FrameError::CrcMismatch { .. }));
        prop_assert!(is_crc_mismatch);
    }

    #[test]
    fn sequences_round_trip(
        data in prop::collection::vec(any::<u8>(), 0..20_000),
        block_size in 1usize..5000,
        null_terminator in any::<bool>(),
    ) {
        let config = WriterConfig::default()
            .with_block_size(block_size)
            .with_null_terminator(null_terminator);
        let mut writer = ChunkWriter::with_config(Vec::new(), codec(), data.len() as u32, config).unwrap();
        writer.write_all(&data).unwrap();
        let framed = writer.finish().unwrap();

        let mut reader = ChunkReader::new(framed.as_slice()).unwrap();
        prop_assert_eq!(reader.read_all().unwrap(), data);
    }
}
