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

// The channel registry and the real-time mix pass.
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use super::decode::{BackendRegistry, DecodeError, SplitDecoder, SplitDecoderData};
use super::TargetFormat;
use crate::config::{Audio, SoundConfig, SoundDataConfig};
use crate::util::duration_to_frames;

/// Samples in each channel's scratch block.
const SCRATCH_SAMPLES: usize = 0x1000;

static NEXT_SOUND_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a playing sound. Ids are never zero and are never handed out twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoundId(NonZeroU64);

impl SoundId {
    fn next() -> SoundId {
        loop {
            if let Some(id) = NonZeroU64::new(NEXT_SOUND_ID.fetch_add(1, Ordering::Relaxed)) {
                return SoundId(id);
            }
        }
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the mixer knows about a sound id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundStatus {
    NotFound,
    Paused,
    Playing,
}

impl fmt::Display for SoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoundStatus::NotFound => "not found",
            SoundStatus::Paused => "paused",
            SoundStatus::Playing => "playing",
        })
    }
}

#[derive(Debug, Error)]
pub enum MixerError {
    #[error("invalid output format: {0}")]
    InvalidOutput(String),

    #[error("unable to load sound: {0}")]
    Load(#[from] DecodeError),

    #[error("no sound with id {0}")]
    NotFound(SoundId),

    #[error("sound {0} can't change looping")]
    LoopUnsupported(SoundId),
}

/// Loaded sound data. Any number of sounds may be created from the same data.
pub struct SoundData {
    split: SplitDecoderData,
    config: SoundDataConfig,
}

impl SoundData {
    pub fn split(&self) -> &SplitDecoderData {
        &self.split
    }

    pub fn config(&self) -> &SoundDataConfig {
        &self.config
    }
}

/// `value * to / from` without overflowing. `value` never exceeds `from`.
fn rescale(value: u64, to: u64, from: u64) -> u64 {
    (value as u128 * to as u128 / from as u128) as u64
}

/// Volume envelope state. At most one of the two maxima is non-zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Fade {
    counter: u64,
    out_max: u64,
    in_max: u64,
}

impl Fade {
    fn fade_out(&mut self, frames: u64) {
        let frames = frames.max(1);
        // Start from the volume the fade in has reached.
        self.counter = if self.in_max != 0 {
            rescale(self.in_max - self.counter, frames, self.in_max)
        } else {
            frames
        };
        self.out_max = frames;
        self.in_max = 0;
    }

    fn fade_in(&mut self, frames: u64) {
        let frames = frames.max(1);
        self.counter = if self.out_max != 0 {
            rescale(self.out_max - self.counter, frames, self.out_max)
        } else {
            frames
        };
        self.in_max = frames;
        self.out_max = 0;
    }

    fn cancel(&mut self) {
        *self = Fade::default();
    }

    /// Gain for the next frame. Advances the envelope.
    fn next_gain(&mut self) -> f32 {
        if self.out_max != 0 {
            let gain = self.counter as f32 / self.out_max as f32;
            self.counter = self.counter.saturating_sub(1);
            gain * gain
        } else if self.in_max != 0 {
            let gain = (self.in_max - self.counter) as f32 / self.in_max as f32;
            if self.counter <= 1 {
                self.counter = 0;
                self.in_max = 0;
            } else {
                self.counter -= 1;
            }
            gain * gain
        } else {
            1.0
        }
    }
}

/// One playing sound.
struct Channel {
    id: SoundId,
    decoder: SplitDecoder,
    paused: bool,
    /// Squared per-output-channel volume.
    volume: [f32; 2],
    fade: Fade,
    destroy_when_done: bool,
}

impl Channel {
    /// Mixes `frames` frames into `output`. Returns false once the decoder has ended.
    fn mix(
        &mut self,
        output: &mut [f32],
        frames: usize,
        scratch: &mut [f32],
        channels: usize,
    ) -> bool {
        let block_frames = scratch.len() / channels;
        let volume = if channels == 1 {
            [(self.volume[0] + self.volume[1]) / 2.0; 2]
        } else {
            self.volume
        };

        let mut done = 0;
        while done < frames {
            let wanted = block_frames.min(frames - done);
            let got = self
                .decoder
                .get_samples(&mut scratch[..wanted * channels], wanted);

            let block = &mut output[done * channels..(done + got) * channels];
            for (out_frame, in_frame) in block
                .chunks_exact_mut(channels)
                .zip(scratch.chunks_exact(channels))
            {
                let gain = self.fade.next_gain();
                for (c, (out, sample)) in out_frame.iter_mut().zip(in_frame).enumerate() {
                    *out += sample * volume[c] * gain;
                }
            }

            if got < wanted {
                return false;
            }
            done += got;
        }
        true
    }
}

struct Registry {
    channels: Vec<Channel>,
    scratch: Vec<f32>,
    /// Float staging for integer output.
    output: Vec<f32>,
}

/// Mixes any number of sounds into a single interleaved stream at the target format.
///
/// Every control call and every mix pass takes the same lock, so a control call never
/// sees a channel part way through being mixed or retired.
pub struct Mixer {
    format: TargetFormat,
    backends: BackendRegistry,
    registry: Mutex<Registry>,
}

impl Mixer {
    /// Creates a mixer with the default decoder backends.
    pub fn new(format: TargetFormat) -> Mixer {
        Mixer::with_backends(format, BackendRegistry::default())
    }

    /// Creates a mixer at the configured output format.
    pub fn from_config(audio: &Audio) -> Result<Mixer, MixerError> {
        let format = audio
            .target_format()
            .map_err(|e| MixerError::InvalidOutput(e.to_string()))?;
        Ok(Mixer::new(format))
    }

    pub fn with_backends(format: TargetFormat, backends: BackendRegistry) -> Mixer {
        let channels = format.channel_count as usize;
        info!(
            sample_rate = format.sample_rate,
            channels,
            backends = ?backends.names(),
            "Created mixer"
        );
        Mixer {
            format,
            backends,
            registry: Mutex::new(Registry {
                channels: Vec::new(),
                scratch: vec![0.0; SCRATCH_SAMPLES / channels * channels],
                output: Vec::new(),
            }),
        }
    }

    pub fn format(&self) -> &TargetFormat {
        &self.format
    }

    /// Loads sound data from an intro buffer, a loop buffer, or both.
    pub fn load_sound_data(
        &self,
        intro: Option<Arc<[u8]>>,
        looped: Option<Arc<[u8]>>,
        config: &SoundDataConfig,
    ) -> Result<Arc<SoundData>, MixerError> {
        let split = SplitDecoderData::load(
            &self.backends,
            intro,
            looped,
            config.predecode,
            config.must_predecode,
        )?;
        Ok(Arc::new(SoundData {
            split,
            config: *config,
        }))
    }

    /// Creates a paused sound from `data`. The decode chain is built before the lock is
    /// taken.
    pub fn create_sound(
        &self,
        data: &SoundData,
        config: &SoundConfig,
    ) -> Result<SoundId, MixerError> {
        let dynamic = config.dynamic_sample_rate || data.config.dynamic_sample_rate;
        let decoder = SplitDecoder::new(&data.split, self.format, config.looping, dynamic)?;

        let id = SoundId::next();
        self.registry.lock().channels.push(Channel {
            id,
            decoder,
            paused: true,
            volume: [1.0; 2],
            fade: Fade::default(),
            destroy_when_done: config.destroy_when_done,
        });
        debug!(id = %id, looping = config.looping, dynamic, "Created sound");
        Ok(id)
    }

    /// Removes a sound. Returns false if there was no such sound.
    pub fn destroy_sound(&self, id: SoundId) -> bool {
        let channel = {
            let mut registry = self.registry.lock();
            registry
                .channels
                .iter()
                .position(|channel| channel.id == id)
                .map(|index| registry.channels.swap_remove(index))
        };
        // The decode chain is dropped outside the lock.
        let found = channel.is_some();
        drop(channel);
        debug!(id = %id, found, "Destroyed sound");
        found
    }

    fn with_channel<R>(&self, id: SoundId, f: impl FnOnce(&mut Channel) -> R) -> Option<R> {
        let mut registry = self.registry.lock();
        registry
            .channels
            .iter_mut()
            .find(|channel| channel.id == id)
            .map(f)
    }

    /// Seeks a sound back to its start. Returns false if there was no such sound.
    pub fn rewind_sound(&self, id: SoundId) -> bool {
        self.with_channel(id, |channel| channel.decoder.rewind())
            .is_some()
    }

    pub fn pause_sound(&self, id: SoundId) -> bool {
        self.with_channel(id, |channel| channel.paused = true)
            .is_some()
    }

    pub fn unpause_sound(&self, id: SoundId) -> bool {
        self.with_channel(id, |channel| channel.paused = false)
            .is_some()
    }

    /// Fades a sound out over `duration`. A sound that is fading in starts from the
    /// volume it has reached.
    pub fn fade_out_sound(&self, id: SoundId, duration: Duration) -> bool {
        let frames = duration_to_frames(duration, self.format.sample_rate);
        let found = self
            .with_channel(id, |channel| channel.fade.fade_out(frames))
            .is_some();
        debug!(id = %id, frames, found, "Fading out");
        found
    }

    /// Fades a sound in over `duration`. A sound that is fading out starts from the
    /// volume it has reached.
    pub fn fade_in_sound(&self, id: SoundId, duration: Duration) -> bool {
        let frames = duration_to_frames(duration, self.format.sample_rate);
        let found = self
            .with_channel(id, |channel| channel.fade.fade_in(frames))
            .is_some();
        debug!(id = %id, frames, found, "Fading in");
        found
    }

    /// Drops any fade, leaving only the sound's volume.
    pub fn cancel_fade(&self, id: SoundId) -> bool {
        self.with_channel(id, |channel| channel.fade.cancel())
            .is_some()
    }

    /// Sets a linear volume. The square is applied to samples.
    pub fn set_sound_volume(&self, id: SoundId, volume: f32) -> bool {
        self.set_sound_stereo_volume(id, volume, volume)
    }

    /// Sets separate left and right volumes. Mono output uses their mean.
    pub fn set_sound_stereo_volume(&self, id: SoundId, left: f32, right: f32) -> bool {
        let (left, right) = (left.max(0.0), right.max(0.0));
        self.with_channel(id, |channel| channel.volume = [left * left, right * right])
            .is_some()
    }

    /// Turns looping on or off for the sound's last segment.
    pub fn set_sound_loop(&self, id: SoundId, looping: bool) -> Result<(), MixerError> {
        match self.with_channel(id, |channel| channel.decoder.set_loop(looping)) {
            None => Err(MixerError::NotFound(id)),
            Some(Err(DecodeError::LoopUnsupported)) => Err(MixerError::LoopUnsupported(id)),
            Some(Err(e)) => Err(e.into()),
            Some(Ok(())) => Ok(()),
        }
    }

    /// Sets the playback speed as a 16.16 fixed point ratio. Only sounds created with a
    /// dynamic sample rate change speed.
    pub fn set_sound_speed(&self, id: SoundId, speed: u32) -> bool {
        self.with_channel(id, |channel| channel.decoder.set_speed(speed))
            .is_some()
    }

    /// Moves the resampler's low-pass cutoff. Only affects dynamic sounds.
    pub fn set_sound_low_pass_filter(&self, id: SoundId, cutoff_hz: u32) -> bool {
        self.with_channel(id, |channel| channel.decoder.set_low_pass_filter(cutoff_hz))
            .is_some()
    }

    pub fn sound_status(&self, id: SoundId) -> SoundStatus {
        match self.with_channel(id, |channel| channel.paused) {
            None => SoundStatus::NotFound,
            Some(true) => SoundStatus::Paused,
            Some(false) => SoundStatus::Playing,
        }
    }

    /// The number of sounds in the registry, paused or not.
    pub fn active_sounds(&self) -> usize {
        self.registry.lock().channels.len()
    }

    /// Adds `frames` frames of every unpaused sound into `output`. Nothing is clamped.
    /// Sounds that end are removed, or paused if they were created to stay around.
    pub fn mix_samples(&self, output: &mut [f32], frames: usize) {
        let mut registry = self.registry.lock();
        Self::mix_locked(&mut registry, output, frames, self.format.channel_count as usize);
    }

    fn mix_locked(registry: &mut Registry, output: &mut [f32], frames: usize, channels: usize) {
        let frames = frames.min(output.len() / channels);
        let Registry {
            channels: sounds,
            scratch,
            ..
        } = registry;

        sounds.retain_mut(|channel| {
            if channel.paused || channel.mix(output, frames, scratch, channels) {
                return true;
            }
            if channel.destroy_when_done {
                debug!(id = %channel.id, "Sound finished, retiring");
                false
            } else {
                debug!(id = %channel.id, "Sound finished, pausing");
                channel.paused = true;
                true
            }
        });
    }

    /// Mixes `frames` frames and writes them as clamped signed 16-bit samples.
    pub fn output_samples(&self, output: &mut [i16], frames: usize) {
        let channels = self.format.channel_count as usize;
        let frames = frames.min(output.len() / channels);
        let samples = frames * channels;

        let mut registry = self.registry.lock();
        let mut mixed = std::mem::take(&mut registry.output);
        mixed.clear();
        mixed.resize(samples, 0.0);
        Self::mix_locked(&mut registry, &mut mixed, frames, channels);

        for (out, sample) in output.iter_mut().zip(&mixed) {
            *out = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
        registry.output = mixed;
    }
}

impl fmt::Debug for Mixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixer")
            .field("format", &self.format)
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}
