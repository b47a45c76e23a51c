//! Per-texture channel fill routines.
//!
//! Every routine writes a full channel in one pass over the sample index.
//! None of them clamp or normalize: transient excursions past ±1 are left
//! for the downstream gain staging to absorb.

use std::f32::consts::TAU;

use super::noise::{BrownFilter, PinkFilter, WhiteSource};

// Rain: sparse impulse gate and amplitude.
const RAIN_BROWN_GAIN: f32 = 2.0;
const RAIN_SPIKE_PROBABILITY: f32 = 0.0005;
const RAIN_SPIKE_AMPLITUDE: f32 = 0.5;

// Wave: deep brown swell, one envelope cycle per buffer.
const WAVE_BROWN_GAIN: f32 = 4.0;

// Forest: two envelope cycles, range [0.7, 1.0].
const FOREST_ENV_BASE: f32 = 0.85;
const FOREST_ENV_DEPTH: f32 = 0.15;

// Night: bed of quiet pink with insect chirps.
const NIGHT_PINK_GAIN: f32 = 0.4;
const NIGHT_CHIRP_RATE_HZ: f32 = 10.0;
const NIGHT_CHIRP_POWER: i32 = 20;
const NIGHT_CHIRP_LEVEL: f32 = 0.3;

// Temple: faint bell resonance over pink.
const TEMPLE_BELL_HZ: f32 = 380.0;
const TEMPLE_BELL_LEVEL: f32 = 0.015;

pub fn fill_white(channel: &mut [f32], white: &mut WhiteSource) {
    for sample in channel.iter_mut() {
        *sample = white.next_sample();
    }
}

pub fn fill_rain(channel: &mut [f32], white: &mut WhiteSource) {
    let mut brown = BrownFilter::new();
    for sample in channel.iter_mut() {
        let mut s = brown.process(white.next_sample()) * RAIN_BROWN_GAIN;
        if white.next_unit() < RAIN_SPIKE_PROBABILITY {
            // A droplet: one-sample impulse on top of the rumble.
            s += white.next_sample() * RAIN_SPIKE_AMPLITUDE;
        }
        *sample = s;
    }
}

pub fn fill_wave(channel: &mut [f32], white: &mut WhiteSource) {
    let mut brown = BrownFilter::new();
    let frames = channel.len().max(1) as f32;
    for (i, sample) in channel.iter_mut().enumerate() {
        let envelope = 0.5 + 0.5 * (TAU * i as f32 / frames).sin();
        *sample = brown.process(white.next_sample()) * WAVE_BROWN_GAIN * envelope;
    }
}

pub fn fill_forest(channel: &mut [f32], white: &mut WhiteSource) {
    let mut pink = PinkFilter::new();
    let frames = channel.len().max(1) as f32;
    for (i, sample) in channel.iter_mut().enumerate() {
        let envelope = FOREST_ENV_BASE + FOREST_ENV_DEPTH * (TAU * 2.0 * i as f32 / frames).sin();
        *sample = pink.process(white.next_sample()) * envelope;
    }
}

pub fn fill_night(channel: &mut [f32], sample_rate: f32, white: &mut WhiteSource) {
    let mut pink = PinkFilter::new();
    for (i, sample) in channel.iter_mut().enumerate() {
        let t = i as f32 / sample_rate;
        let bed = pink.process(white.next_sample()) * NIGHT_PINK_GAIN;
        let chirp = (0.5 + 0.5 * (TAU * NIGHT_CHIRP_RATE_HZ * t).sin()).powi(NIGHT_CHIRP_POWER);
        *sample = bed + chirp * white.next_sample() * NIGHT_CHIRP_LEVEL;
    }
}

pub fn fill_temple(channel: &mut [f32], sample_rate: f32, white: &mut WhiteSource) {
    let mut pink = PinkFilter::new();
    for (i, sample) in channel.iter_mut().enumerate() {
        let t = i as f32 / sample_rate;
        let bell = (TAU * TEMPLE_BELL_HZ * t).sin() * TEMPLE_BELL_LEVEL;
        *sample = pink.process(white.next_sample()) + bell;
    }
}
