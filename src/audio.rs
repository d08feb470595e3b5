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

use crate::config;

pub mod cpal;
pub mod decode;
pub mod format;
pub mod mixer;

pub use format::{DecoderSpec, SampleFormat, TargetFormat};
pub use mixer::{Mixer, MixerError, SoundData, SoundId, SoundStatus};

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::Device>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the output device named in the configuration.
pub fn get_device(config: &config::Audio) -> Result<cpal::Device, Box<dyn Error>> {
    cpal::Device::get(config.device())
}
