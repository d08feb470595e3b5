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

use std::error::Error;

use serde::Deserialize;

use crate::audio::TargetFormat;

const DEFAULT_SAMPLE_RATE: u32 = 48000;
const DEFAULT_CHANNELS: u16 = 2;

/// A YAML representation of the audio output configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Audio {
    /// The audio device. "default" picks the host's default output.
    device: String,

    /// Mixer sample rate in Hz (default: 48000)
    sample_rate: Option<u32>,

    /// Mixer channel count, 1 or 2 (default: 2)
    channels: Option<u16>,

    /// Device period size in frames. When unset the backend chooses.
    buffer_size: Option<u32>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: device.to_string(),
            sample_rate: None,
            channels: None,
            buffer_size: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the mixer sample rate (default: 48000)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the mixer channel count (default: 2)
    pub fn channels(&self) -> u16 {
        self.channels.unwrap_or(DEFAULT_CHANNELS)
    }

    /// Returns the device period size, if one was configured.
    pub fn buffer_size(&self) -> Option<u32> {
        self.buffer_size
    }

    /// Returns the format the mixer should produce.
    pub fn target_format(&self) -> Result<TargetFormat, Box<dyn Error>> {
        TargetFormat::new(self.sample_rate(), self.channels())
    }

    pub fn set_device(&mut self, device: &str) {
        self.device = device.to_string();
    }
}

impl Default for Audio {
    fn default() -> Self {
        Audio::new("default")
    }
}
