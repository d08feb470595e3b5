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
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use soundmix::audio::{self, decode, Mixer, SoundStatus};
use soundmix::config::Player;
use soundmix::util::{duration_minutes_seconds, filename_display, speed_ratio_to_fixed};

/// How long a Ctrl-C fades the sound out before stopping.
const STOP_FADE: Duration = Duration::from_millis(250);

/// How often playback status is checked.
const STATUS_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sound player with a real-time mixer."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Loads a sound file and reports how it would be played.
    Probe {
        /// The path to the sound file.
        path: PathBuf,
    },
    /// Plays a sound through the audio interface.
    Play {
        /// The sound to play, or its intro when a loop file is given.
        path: PathBuf,
        /// A file played gaplessly after the first one.
        #[arg(long)]
        loop_file: Option<PathBuf>,
        /// Loop the sound (the loop file, when there is one) until interrupted.
        #[arg(short, long = "loop")]
        looping: bool,
        /// Decode the sound fully before playing it.
        #[arg(short, long)]
        predecode: bool,
        /// The playback speed ratio, e.g. 1.5.
        #[arg(short, long)]
        speed: Option<f64>,
        /// The linear playback volume.
        #[arg(short, long)]
        volume: Option<f32>,
        /// Fade the sound in over this duration, e.g. 500ms.
        #[arg(short, long)]
        fade_in: Option<String>,
        /// The device name to play through.
        #[arg(short, long)]
        device: Option<String>,
        /// The path to the player config.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn read_sound(path: &Path) -> Result<Arc<[u8]>, Box<dyn Error>> {
    let bytes = fs::read(path).map_err(|e| format!("unable to read {}: {}", path.display(), e))?;
    Ok(bytes.into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Probe { path } => {
            let registry = decode::BackendRegistry::default();
            let data =
                decode::DecoderSelectorData::load(&registry, read_sound(&path)?, true, false)?;

            println!("{}:", filename_display(&path));
            println!("- Backend: {}", data.backend_name());
            println!("- Strategy: {}", data.strategy());
            println!("- Format: {}", data.spec());
            if let Some(predecoded) = data.predecoded() {
                println!(
                    "- Duration: {} ({} frames)",
                    duration_minutes_seconds(predecoded.duration()),
                    predecoded.frames()
                );
            }
        }
        Commands::Play {
            path,
            loop_file,
            looping,
            predecode,
            speed,
            volume,
            fade_in,
            device,
            config,
        } => {
            let player = match config {
                Some(config) => Player::deserialize(&config)?,
                None => Player::default(),
            };

            let mut audio_config = player.audio();
            if let Some(device) = device {
                audio_config.set_device(&device);
            }

            let mut sound = player.sound();
            if predecode {
                sound.set_predecode(true);
            }
            if looping {
                sound.set_looping(true);
            }
            if let Some(volume) = volume {
                sound.set_volume(volume);
            }
            if let Some(fade_in) = fade_in {
                sound.set_fade_in(fade_in);
            }
            let speed = match speed {
                Some(ratio) => {
                    sound.set_dynamic_sample_rate(true);
                    Some(speed_ratio_to_fixed(ratio).ok_or("speed must be a positive ratio")?)
                }
                None => None,
            };
            let fade_in = sound.fade_in()?;

            let mixer = Arc::new(Mixer::from_config(&audio_config)?);
            let loop_data = match loop_file {
                Some(loop_file) => Some(read_sound(&loop_file)?),
                None => None,
            };
            let data =
                mixer.load_sound_data(Some(read_sound(&path)?), loop_data, &sound.data_config())?;

            let device = audio::get_device(&audio_config)?;
            let output = device.play(mixer.clone(), audio_config.buffer_size())?;

            let id = mixer.create_sound(&data, &sound.sound_config())?;
            mixer.set_sound_volume(id, sound.volume());
            if let Some(speed) = speed {
                mixer.set_sound_speed(id, speed);
            }
            if let Some(fade_in) = fade_in {
                mixer.fade_in_sound(id, fade_in);
            }
            mixer.unpause_sound(id);
            info!(
                file = filename_display(&path),
                device = device.name(),
                id = %id,
                "Playing"
            );

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            let mut interval = tokio::time::interval(STATUS_INTERVAL);
            loop {
                tokio::select! {
                    result = &mut ctrl_c => {
                        result?;
                        info!("Interrupted, stopping");
                        mixer.fade_out_sound(id, STOP_FADE);
                        tokio::time::sleep(STOP_FADE).await;
                        mixer.destroy_sound(id);
                        break;
                    }
                    _ = interval.tick() => {
                        if let Ok(err) = output.errors().try_recv() {
                            return Err(err.into());
                        }
                        if mixer.sound_status(id) == SoundStatus::NotFound {
                            info!("Finished");
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
