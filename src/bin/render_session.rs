//! Offline renderer: runs a therapy session for a fixed duration and
//! writes the output to a WAV file.
//!
//! Usage: render_session [settings.json] [seconds] [output.wav]

use anyhow::Context;
use soundmask::{AudioRenderer, DeviceConfig, SessionSettings, TherapySession};

const SAMPLE_RATE: u32 = 48_000;
const BLOCK_SIZE: usize = 512;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let settings = match args.get(1) {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file {path}"))?;
            SessionSettings::from_json(&json).context("failed to parse settings")?
        }
        None => SessionSettings::default(),
    };
    let seconds: f32 = args
        .get(2)
        .map(|s| s.parse())
        .transpose()
        .context("invalid duration")?
        .unwrap_or(10.0);
    let output_path = args
        .get(3)
        .map(String::as_str)
        .unwrap_or("session.wav");

    let mut session = TherapySession::new(DeviceConfig {
        sample_rate: SAMPLE_RATE as f32,
        block_size: BLOCK_SIZE,
    });
    anyhow::ensure!(!session.is_degraded(), "audio device unavailable");

    settings.apply_to(&mut session);
    session.start_therapy(settings.texture());

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output_path, spec)
        .with_context(|| format!("failed to create {output_path}"))?;

    let mut left = vec![0.0f32; BLOCK_SIZE];
    let mut right = vec![0.0f32; BLOCK_SIZE];
    let total_frames = (SAMPLE_RATE as f32 * seconds) as usize;
    let mut rendered = 0usize;

    while rendered < total_frames {
        session.process_block(&mut left, &mut right);
        let frames = BLOCK_SIZE.min(total_frames - rendered);
        for i in 0..frames {
            writer.write_sample((left[i].clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
            writer.write_sample((right[i].clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        rendered += frames;
    }

    writer.finalize().context("failed to finalize WAV")?;
    println!(
        "Wrote {seconds} s of '{}' (notch at {} Hz) to {output_path}",
        settings.sound,
        session.state().frequency_hz
    );

    Ok(())
}
