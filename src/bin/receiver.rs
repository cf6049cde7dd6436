//! Loopback receiver demo
//!
//! Stands in for the out-of-scope wireless transport: synthesizes a sine
//! wave, Opus-encodes it at hard CBR with wrapping sequence tags, and feeds
//! the wire-format notifications through the real pipeline into the default
//! output device. Simulates one lost block and the reconnection that
//! resynchronizes the stream afterwards, so both diagnostic paths are
//! visible.

use anyhow::{Context, Result};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ble_audio_receiver::{
    audio::CpalOutput,
    config::StreamConfig,
    events::{notice_channel, Notice},
    playback::PlaybackQueue,
    stream::StreamPipeline,
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting loopback receiver demo");

    let config = match std::env::args().nth(1) {
        Some(path) => StreamConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => StreamConfig::default(),
    };
    tracing::info!(
        block_size = config.block_size(),
        frame_samples = config.frame_samples(),
        "stream format"
    );

    let queue = PlaybackQueue::shared(config.queue_capacity);
    let (bus, notices) = notice_channel();
    let sink = CpalOutput::new(&config, queue.clone());
    let mut pipeline = StreamPipeline::new(config.clone(), queue, sink, bus)?;

    // Print notices the way the original showed them on screen.
    std::thread::spawn(move || {
        for notice in notices {
            match notice {
                Notice::PacketDropped { .. } => println!("A packet got dropped"),
                Notice::Latency { mean, degraded } => println!(
                    "{:.2} ms per packet{}",
                    mean.as_secs_f64() * 1000.0,
                    if degraded { " (degraded)" } else { "" }
                ),
                other => println!("{:?}", other),
            }
        }
    });

    // Simulated sender: hard CBR so every block is exactly block_size bytes.
    let mut encoder = opus::Encoder::new(
        config.sample_rate,
        opus::Channels::Mono,
        opus::Application::Audio,
    )
    .context("creating loopback encoder")?;
    encoder.set_bitrate(opus::Bitrate::Bits(config.bitrate as i32))?;
    encoder.set_vbr(false)?;

    pipeline.handle_connect();
    pipeline.start_streaming(Instant::now())?;

    let frame_duration = config.frame_duration();
    let frame_samples = config.frame_samples();
    let mut tag = 0u8;
    let mut phase = 0.0f32;
    let mut scratch = vec![0u8; 4000];
    let mut next_deadline = Instant::now();

    // Ten seconds of audio, one block per frame duration.
    let blocks = 10_000_000 / config.frame_duration_us as u64;
    for n in 0..blocks {
        let pcm: Vec<i16> = (0..frame_samples)
            .map(|_| {
                phase += 440.0 * 2.0 * std::f32::consts::PI / config.sample_rate as f32;
                (phase.sin() * 8000.0) as i16
            })
            .collect();

        let len = encoder.encode(&pcm, &mut scratch)?;
        let mut notification = scratch[..len].to_vec();
        notification.push(tag);

        next_deadline += frame_duration;
        if let Some(wait) = next_deadline.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }

        // Lose one block on the wire; the sender's tag still advances, so
        // every later block is refused until the reconnect below.
        if n != 300 {
            pipeline.handle_notification(&notification, Instant::now());
        }
        tag = tag.wrapping_add(1);

        // The producer resynchronizes by reconnecting, as over the real
        // transport.
        if n == 350 {
            pipeline.handle_disconnect();
            pipeline.handle_connect();
            pipeline.start_streaming(Instant::now())?;
            tag = 0;
        }
    }

    pipeline.handle_disconnect();
    tracing::info!(
        accepted = pipeline.tracker().accepted(),
        dropped = pipeline.tracker().dropped(),
        "demo finished"
    );
    Ok(())
}
