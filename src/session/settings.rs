use serde::{Deserialize, Serialize};

use super::controller::TherapySession;
use crate::synthesis::SoundTexture;

/// Launch settings for a session, loadable from a JSON document.
///
/// This is host configuration (what the demo binaries start with), not
/// session persistence; nothing is written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub frequency_hz: i64,
    pub volume: f32,
    /// Texture id; unknown values fall back to white noise.
    pub sound: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 4_000,
            volume: 0.5,
            sound: SoundTexture::WhiteNoise.id().to_string(),
        }
    }
}

impl SessionSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn texture(&self) -> SoundTexture {
        SoundTexture::from_id(&self.sound)
    }

    /// Pushes these settings into a session; out-of-range values are
    /// clamped by the session itself.
    pub fn apply_to(&self, session: &mut TherapySession) {
        session.set_frequency(self.frequency_hz);
        session.set_volume(self.volume);
        session.select_sound(self.texture());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let settings = SessionSettings::from_json("{}").expect("parse");
        assert_eq!(settings.frequency_hz, 4_000);
        assert_eq!(settings.texture(), SoundTexture::WhiteNoise);
    }

    #[test]
    fn unknown_sound_falls_back_to_white_noise() {
        let settings =
            SessionSettings::from_json(r#"{"sound": "whalesong", "frequency_hz": 6000}"#)
                .expect("parse");
        assert_eq!(settings.texture(), SoundTexture::WhiteNoise);
        assert_eq!(settings.frequency_hz, 6_000);
    }

    #[test]
    fn known_sound_parses() {
        let settings = SessionSettings::from_json(r#"{"sound": "temple"}"#).expect("parse");
        assert_eq!(settings.texture(), SoundTexture::Temple);
    }
}
