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

//! Deterministic in-memory backends for exercising the decode pipeline without codecs.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::error::DecodeError;
use super::traits::{Backend, BackendFactory};
use crate::audio::{DecoderSpec, SampleFormat};

const MAGIC: &[u8; 4] = b"PCM0";
const HEADER_SIZE: usize = 10;

/// Encodes interleaved samples as a raw PCM buffer the PcmBackendFactory understands.
pub fn pcm_bytes(
    sample_rate: u32,
    channels: u8,
    format: SampleFormat,
    interleaved: &[f32],
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE + interleaved.len() * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.push(channels);
    bytes.push(match format {
        SampleFormat::S16 => 0,
        SampleFormat::S32 => 1,
        SampleFormat::F32 => 2,
    });

    let width = format.bytes_per_sample();
    let mut sample_bytes = [0u8; 4];
    for sample in interleaved {
        write_sample(format, *sample, &mut sample_bytes);
        bytes.extend_from_slice(&sample_bytes[..width]);
    }
    bytes
}

/// Writes one float sample into `bytes` in the given native format.
fn write_sample(format: SampleFormat, sample: f32, bytes: &mut [u8]) {
    match format {
        SampleFormat::S16 => {
            let value =
                (sample * (1i64 << 15) as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            bytes[..2].copy_from_slice(&value.to_ne_bytes());
        }
        SampleFormat::S32 => {
            let value = (sample as f64 * (1i64 << 31) as f64)
                .clamp(i32::MIN as f64, i32::MAX as f64) as i32;
            bytes[..4].copy_from_slice(&value.to_ne_bytes());
        }
        SampleFormat::F32 => bytes[..4].copy_from_slice(&sample.to_ne_bytes()),
    }
}

/// Opens buffers made by `pcm_bytes`. A complex factory produces backends that loop
/// internally, like tracker or chiptune emulators.
pub struct PcmBackendFactory {
    name: &'static str,
    is_complex: bool,
    created: AtomicUsize,
}

impl PcmBackendFactory {
    pub fn new(name: &'static str, is_complex: bool) -> PcmBackendFactory {
        PcmBackendFactory {
            name,
            is_complex,
            created: AtomicUsize::new(0),
        }
    }

    /// Number of backends successfully created, trial probes included.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl BackendFactory for PcmBackendFactory {
    fn name(&self) -> &'static str {
        self.name
    }

    fn create(
        &self,
        data: &Arc<[u8]>,
        looping: bool,
    ) -> Result<(Box<dyn Backend>, DecoderSpec), DecodeError> {
        if data.len() < HEADER_SIZE || &data[..4] != MAGIC {
            return Err(DecodeError::Backend("missing PCM0 header".to_string()));
        }

        let mut rate = [0u8; 4];
        rate.copy_from_slice(&data[4..8]);
        let format = match data[9] {
            0 => SampleFormat::S16,
            1 => SampleFormat::S32,
            2 => SampleFormat::F32,
            other => {
                return Err(DecodeError::Backend(format!(
                    "unknown sample format {}",
                    other
                )))
            }
        };
        let spec = DecoderSpec::new(
            u32::from_le_bytes(rate),
            data[8] as u16,
            format,
            self.is_complex,
        )?;

        self.created.fetch_add(1, Ordering::Relaxed);
        let frames = (data.len() - HEADER_SIZE) / spec.frame_size();
        Ok((
            Box::new(PcmBackend {
                data: Arc::clone(data),
                frame_size: spec.frame_size(),
                frames,
                position: 0,
                looping: self.is_complex && looping,
            }),
            spec,
        ))
    }
}

struct PcmBackend {
    data: Arc<[u8]>,
    frame_size: usize,
    frames: usize,
    position: usize,
    looping: bool,
}

impl Backend for PcmBackend {
    fn rewind(&mut self) {
        self.position = 0;
    }

    fn get_samples(&mut self, buffer: &mut [u8], frames: usize) -> usize {
        let mut frames_done = 0;
        while frames_done < frames {
            if self.position == self.frames {
                if !self.looping || self.frames == 0 {
                    break;
                }
                self.position = 0;
            }

            let to_copy = (self.frames - self.position).min(frames - frames_done);
            let start = HEADER_SIZE + self.position * self.frame_size;
            buffer[frames_done * self.frame_size..(frames_done + to_copy) * self.frame_size]
                .copy_from_slice(&self.data[start..start + to_copy * self.frame_size]);
            self.position += to_copy;
            frames_done += to_copy;
        }
        frames_done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_sample_clamps() {
        let mut bytes = [0u8; 2];
        write_sample(SampleFormat::S16, 2.0, &mut bytes);
        assert_eq!(i16::from_ne_bytes(bytes), i16::MAX);
        write_sample(SampleFormat::S16, -2.0, &mut bytes);
        assert_eq!(i16::from_ne_bytes(bytes), i16::MIN);
        write_sample(SampleFormat::S16, 0.5, &mut bytes);
        assert_eq!(i16::from_ne_bytes(bytes), 16384);
    }

    #[test]
    fn test_pcm_bytes_layout() {
        let bytes = pcm_bytes(8000, 1, SampleFormat::S16, &[0.5, -0.5]);
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(bytes.len(), HEADER_SIZE + 4);
        assert_eq!(SampleFormat::S16.read_sample(&bytes[HEADER_SIZE..]), 0.5);
        assert_eq!(SampleFormat::S16.read_sample(&bytes[HEADER_SIZE + 2..]), -0.5);
    }
}
