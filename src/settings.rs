//! Game settings and preferences
//!
//! Loading and saving the JSON text is the host's job; this module only
//! parses and validates it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Highest step on the volume sliders
pub const VOLUME_MAX: u8 = 10;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run fullscreen
    pub fullscreen: bool,
    /// Sound effects volume (0 - 10)
    pub sound_volume: u8,
    /// Music volume (0 - 10)
    pub music_volume: u8,
    /// Outline colliders while drawing
    pub debug_hitboxes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fullscreen: false,
            sound_volume: VOLUME_MAX,
            music_volume: 7,
            debug_hitboxes: false,
        }
    }
}

impl Settings {
    /// Parse settings from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        check_volume("sound_volume", self.sound_volume)?;
        check_volume("music_volume", self.music_volume)
    }

    /// Sound volume as a 0.0 - 1.0 gain
    pub fn sound_gain(&self) -> f32 {
        f32::from(self.sound_volume.min(VOLUME_MAX)) / f32::from(VOLUME_MAX)
    }

    /// Music volume as a 0.0 - 1.0 gain
    pub fn music_gain(&self) -> f32 {
        f32::from(self.music_volume.min(VOLUME_MAX)) / f32::from(VOLUME_MAX)
    }
}

fn check_volume(field: &'static str, value: u8) -> Result<()> {
    if value > VOLUME_MAX {
        return Err(Error::VolumeOutOfRange {
            field,
            value,
            max: VOLUME_MAX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"debug_hitboxes": true}"#).unwrap();
        assert!(settings.debug_hitboxes);
        assert_eq!(settings.sound_volume, VOLUME_MAX);
        assert!(!settings.fullscreen);
    }

    #[test]
    fn test_volume_out_of_range_rejected() {
        let err = Settings::from_json(r#"{"music_volume": 11}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::VolumeOutOfRange {
                field: "music_volume",
                value: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(Error::SettingsParse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings {
            fullscreen: true,
            sound_volume: 3,
            music_volume: 0,
            debug_hitboxes: true,
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
        assert_eq!(settings.music_gain(), 0.0);
        assert!((settings.sound_gain() - 0.3).abs() < 1e-6);
    }
}
