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

use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

pub mod audio;
pub mod error;
pub mod sound;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::sound::{Sound, SoundConfig, SoundDataConfig};

/// The player configuration: where to play and how to play sounds.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Player {
    /// The audio output configuration.
    audio: Option<Audio>,

    /// Defaults for sounds played by the player.
    sound: Option<Sound>,
}

impl Player {
    /// Parse a player configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Player, ConfigError> {
        let player = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Player>()?;

        if let Err(e) = player.audio().target_format() {
            return Err(ConfigError::Invalid(e.to_string()));
        }

        Ok(player)
    }

    /// Returns the audio configuration, falling back to the default device.
    pub fn audio(&self) -> Audio {
        self.audio.clone().unwrap_or_default()
    }

    /// Returns the sound configuration.
    pub fn sound(&self) -> Sound {
        self.sound.clone().unwrap_or_default()
    }
}
