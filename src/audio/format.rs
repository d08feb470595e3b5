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

use std::{error::Error, fmt};

use super::decode::DecodeError;

/// Native sample formats a decoder backend may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit integer samples.
    S16,
    /// Signed 32-bit integer samples.
    S32,
    /// 32-bit floating point samples.
    F32,
}

impl SampleFormat {
    /// Convert to string representation
    pub fn as_str(self) -> &'static str {
        match self {
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
            SampleFormat::F32 => "f32",
        }
    }

    /// The width of a single sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::S16 => 2,
            SampleFormat::S32 | SampleFormat::F32 => 4,
        }
    }

    /// Reads one native-endian sample of this format and scales it to [-1.0, 1.0].
    /// `bytes` must hold at least `bytes_per_sample()` bytes.
    #[inline]
    pub fn read_sample(self, bytes: &[u8]) -> f32 {
        match self {
            SampleFormat::S16 => {
                let mut raw = [0u8; 2];
                raw.copy_from_slice(&bytes[..2]);
                scale_s16(i16::from_ne_bytes(raw))
            }
            SampleFormat::S32 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&bytes[..4]);
                scale_s32(i32::from_ne_bytes(raw))
            }
            SampleFormat::F32 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&bytes[..4]);
                f32::from_ne_bytes(raw)
            }
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[inline]
pub(crate) fn scale_s16(sample: i16) -> f32 {
    sample as f32 / (1i64 << 15) as f32
}

#[inline]
pub(crate) fn scale_s32(sample: i32) -> f32 {
    sample as f32 / (1i64 << 31) as f32
}

/// The native format a backend reports when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count, 1 or 2.
    pub channel_count: u16,
    /// Native sample format.
    pub sample_format: SampleFormat,
    /// Complex backends manage their own timing and looping and cannot be predecoded
    /// or sliced externally.
    pub is_complex: bool,
}

impl DecoderSpec {
    /// Creates a new DecoderSpec, rejecting rates and layouts the pipeline can't carry.
    pub fn new(
        sample_rate: u32,
        channel_count: u16,
        sample_format: SampleFormat,
        is_complex: bool,
    ) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::InvalidSpec(
                "sample rate must be greater than 0".to_string(),
            ));
        }
        if !(1..=2).contains(&channel_count) {
            return Err(DecodeError::InvalidSpec(format!(
                "unsupported channel count {}",
                channel_count
            )));
        }

        Ok(DecoderSpec {
            sample_rate,
            channel_count,
            sample_format,
            is_complex,
        })
    }

    /// Size in bytes of one interleaved frame.
    pub fn frame_size(&self) -> usize {
        self.channel_count as usize * self.sample_format.bytes_per_sample()
    }
}

impl fmt::Display for DecoderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz, {} channel(s), {}{}",
            self.sample_rate,
            self.channel_count,
            self.sample_format,
            if self.is_complex { ", complex" } else { "" }
        )
    }
}

/// The format the mixer produces: interleaved f32 at a fixed rate and channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count, 1 or 2.
    pub channel_count: u16,
}

impl TargetFormat {
    /// Creates a new TargetFormat
    pub fn new(sample_rate: u32, channel_count: u16) -> Result<Self, Box<dyn Error>> {
        if sample_rate == 0 {
            return Err("Sample rate must be greater than 0".into());
        }
        if !(1..=2).contains(&channel_count) {
            return Err(format!("Unsupported output channel count: {}", channel_count).into());
        }

        Ok(TargetFormat {
            sample_rate,
            channel_count,
        })
    }
}

impl Default for TargetFormat {
    /// Creates a default target format (48kHz stereo)
    fn default() -> Self {
        TargetFormat {
            sample_rate: 48000,
            channel_count: 2,
        }
    }
}
