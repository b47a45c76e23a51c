//! Live playback demo: starts a therapy session on the default output
//! device and plays until interrupted (or for a fixed number of seconds).
//!
//! Usage: masker_demo [settings.json] [seconds]

#![cfg(feature = "native-host")]

mod cpal_host;
mod host_buffer;

use std::time::Duration;

use anyhow::Context;
use cpal_host::AudioHost;
use soundmask::{DeviceConfig, SessionSettings, TherapySession};

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
    let run_seconds: Option<u64> = args
        .get(2)
        .map(|s| s.parse())
        .transpose()
        .context("invalid duration")?;

    let texture = settings.texture();
    let factory_settings = settings.clone();
    let host = AudioHost::new(move |sample_rate, block_size| {
        let mut session = TherapySession::new(DeviceConfig {
            sample_rate,
            block_size,
        });
        factory_settings.apply_to(&mut session);
        session.on_auto_stop(|| {
            tracing::info!("therapy reached the 30 minute limit and stopped");
        });
        session.start_therapy(texture);
        session
    })?;

    println!(
        "Playing '{}' with a notch at {} Hz on '{}' ({} Hz)",
        texture.id(),
        settings.frequency_hz,
        host.config().device_name,
        host.config().sample_rate,
    );
    println!("Press Ctrl+C to stop");

    match run_seconds {
        Some(seconds) => std::thread::sleep(Duration::from_secs(seconds)),
        None => loop {
            std::thread::sleep(Duration::from_secs(1));
        },
    }

    Ok(())
}
