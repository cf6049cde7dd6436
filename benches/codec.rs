//! Decode-path benchmarks
//!
//! The decode must finish well inside one frame duration (10 ms by default)
//! to keep the producer side from backlogging; this keeps an eye on that
//! soft deadline.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Instant;

use ble_audio_receiver::block::CompressedBlock;
use ble_audio_receiver::codec::CodecSession;
use ble_audio_receiver::config::StreamConfig;
use ble_audio_receiver::sequencer::SequenceTracker;
use bytes::Bytes;

fn cbr_block(config: &StreamConfig) -> CompressedBlock {
    let mut encoder = opus::Encoder::new(
        config.sample_rate,
        opus::Channels::Mono,
        opus::Application::Audio,
    )
    .unwrap();
    encoder
        .set_bitrate(opus::Bitrate::Bits(config.bitrate as i32))
        .unwrap();
    encoder.set_vbr(false).unwrap();

    let pcm: Vec<i16> = (0..config.frame_samples())
        .map(|i| {
            let t = i as f32 / config.sample_rate as f32;
            ((t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 8000.0) as i16
        })
        .collect();
    let mut out = vec![0u8; 4000];
    let len = encoder.encode(&pcm, &mut out).unwrap();
    out.truncate(len);
    CompressedBlock {
        payload: Bytes::from(out),
        sequence_tag: 0,
    }
}

fn bench_decode(c: &mut Criterion) {
    let config = StreamConfig::default();
    let block = cbr_block(&config);
    let mut session = CodecSession::new(&config).unwrap();

    c.bench_function("decode_one_block", |b| {
        b.iter(|| {
            let frame = session.decode(black_box(&block)).unwrap();
            black_box(frame);
        })
    });
}

fn bench_admit(c: &mut Criterion) {
    let start = Instant::now();

    c.bench_function("admit_in_order", |b| {
        let mut tracker = SequenceTracker::new(start);
        let mut tag = 0u8;
        b.iter(|| {
            let result = tracker.admit(black_box(tag), Instant::now());
            tag = tag.wrapping_add(1);
            black_box(result);
        })
    });
}

criterion_group!(benches, bench_decode, bench_admit);
criterion_main!(benches);
