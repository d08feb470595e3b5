// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::{error::Error, time::Duration};

use duration_string::DurationString;
use serde::Deserialize;

/// How sound data is prepared when it is loaded.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SoundDataConfig {
    /// Decode simple formats fully at load time.
    pub predecode: bool,
    /// Fail the load when the data can't be predecoded.
    pub must_predecode: bool,
    /// Give every sound made from this data a resampler whose rate can change.
    pub dynamic_sample_rate: bool,
}

/// How a single playing sound behaves.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SoundConfig {
    /// Repeat the last segment forever.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Remove the sound from the mixer when it ends. Otherwise it is paused at the end
    /// and may be rewound.
    pub destroy_when_done: bool,
    /// Allow speed and low-pass changes on this sound.
    pub dynamic_sample_rate: bool,
}

impl Default for SoundConfig {
    fn default() -> Self {
        SoundConfig {
            looping: false,
            destroy_when_done: true,
            dynamic_sample_rate: false,
        }
    }
}

/// A YAML representation of how the player plays a sound.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Sound {
    /// Predecode the sound at load time.
    predecode: Option<bool>,

    /// Fail if the sound can't be predecoded.
    must_predecode: Option<bool>,

    /// Loop the sound (the loop segment, when there is one).
    #[serde(rename = "loop")]
    looping: Option<bool>,

    /// Allow playback speed changes.
    dynamic_sample_rate: Option<bool>,

    /// Linear volume (default: 1.0).
    volume: Option<f32>,

    /// Fade the sound in over this duration, e.g. "250ms".
    fade_in: Option<String>,
}

impl Sound {
    /// Returns the load-time options.
    pub fn data_config(&self) -> SoundDataConfig {
        SoundDataConfig {
            predecode: self.predecode.unwrap_or(false),
            must_predecode: self.must_predecode.unwrap_or(false),
            dynamic_sample_rate: self.dynamic_sample_rate.unwrap_or(false),
        }
    }

    /// Returns the per-sound options.
    pub fn sound_config(&self) -> SoundConfig {
        SoundConfig {
            looping: self.looping.unwrap_or(false),
            destroy_when_done: true,
            dynamic_sample_rate: self.dynamic_sample_rate.unwrap_or(false),
        }
    }

    /// Returns the volume (default: 1.0)
    pub fn volume(&self) -> f32 {
        self.volume.unwrap_or(1.0)
    }

    /// Returns the fade in duration, if any.
    pub fn fade_in(&self) -> Result<Option<Duration>, Box<dyn Error>> {
        match &self.fade_in {
            Some(fade_in) => Ok(Some(DurationString::from_string(fade_in.clone())?.into())),
            None => Ok(None),
        }
    }

    pub fn set_predecode(&mut self, predecode: bool) {
        self.predecode = Some(predecode);
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = Some(looping);
    }

    pub fn set_dynamic_sample_rate(&mut self, dynamic: bool) {
        self.dynamic_sample_rate = Some(dynamic);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = Some(volume);
    }

    pub fn set_fade_in(&mut self, fade_in: String) {
        self.fade_in = Some(fade_in);
    }
}
