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

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::error::DecodeError;
use super::traits::{BackendFactory, DecodeStage};
use crate::audio::DecoderSpec;

/// Frames pulled from the backend per read while predecoding.
const PREDECODE_CHUNK_FRAMES: usize = 4096;

/// A fully decoded sound in the backend's native format. Immutable once built, so any
/// number of Predecoders may read it at once.
#[derive(Debug)]
pub struct PredecoderData {
    spec: DecoderSpec,
    pcm: Vec<u8>,
    frames: usize,
}

impl PredecoderData {
    /// Runs a non-looping backend to the end of its stream and keeps every frame.
    pub fn decode(
        factory: &dyn BackendFactory,
        data: &Arc<[u8]>,
    ) -> Result<PredecoderData, DecodeError> {
        let (mut backend, spec) = factory.create(data, false)?;
        if spec.is_complex {
            return Err(DecodeError::PredecodeRequired);
        }

        let frame_size = spec.frame_size();
        let mut pcm: Vec<u8> = Vec::new();
        let mut frames = 0;
        loop {
            pcm.resize((frames + PREDECODE_CHUNK_FRAMES) * frame_size, 0);
            let read =
                backend.get_samples(&mut pcm[frames * frame_size..], PREDECODE_CHUNK_FRAMES);
            frames += read;
            if read < PREDECODE_CHUNK_FRAMES {
                break;
            }
        }
        pcm.truncate(frames * frame_size);
        pcm.shrink_to_fit();

        debug!(
            backend = factory.name(),
            frames,
            bytes = pcm.len(),
            "Predecoded sound data"
        );

        Ok(PredecoderData { spec, pcm, frames })
    }

    pub fn spec(&self) -> &DecoderSpec {
        &self.spec
    }

    /// Total number of frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Length of the sound at its native rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames as f64 / self.spec.sample_rate as f64)
    }
}

/// A read cursor over shared PredecoderData.
pub struct Predecoder {
    data: Arc<PredecoderData>,
    position: usize,
    looping: bool,
}

impl Predecoder {
    pub fn new(data: Arc<PredecoderData>, looping: bool) -> Predecoder {
        Predecoder {
            data,
            position: 0,
            looping,
        }
    }
}

impl DecodeStage for Predecoder {
    fn spec(&self) -> &DecoderSpec {
        &self.data.spec
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    fn get_samples(&mut self, buffer: &mut [u8], frames: usize) -> usize {
        let frame_size = self.data.spec.frame_size();
        let total = self.data.frames;
        let mut frames_done = 0;

        while frames_done < frames {
            if self.position == total {
                if !self.looping || total == 0 {
                    break;
                }
                self.position = 0;
            }

            let to_copy = (total - self.position).min(frames - frames_done);
            let source = &self.data.pcm
                [self.position * frame_size..(self.position + to_copy) * frame_size];
            buffer[frames_done * frame_size..(frames_done + to_copy) * frame_size]
                .copy_from_slice(source);
            self.position += to_copy;
            frames_done += to_copy;
        }

        frames_done
    }

    fn set_loop(&mut self, looping: bool) -> Result<(), DecodeError> {
        self.looping = looping;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::decode::memory::{pcm_bytes, PcmBackendFactory};
    use crate::audio::SampleFormat;

    fn ramp_data(frames: usize) -> Arc<PredecoderData> {
        let samples: Vec<f32> = (0..frames).map(|i| i as f32 / 32768.0).collect();
        let bytes: Arc<[u8]> = pcm_bytes(8000, 1, SampleFormat::S16, &samples).into();
        Arc::new(PredecoderData::decode(&PcmBackendFactory::new("pcm", false), &bytes).unwrap())
    }

    fn frame_values(buffer: &[u8]) -> Vec<i16> {
        buffer
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn test_decode_reads_whole_stream() {
        let data = ramp_data(10000);
        assert_eq!(data.frames(), 10000);
        assert_eq!(data.spec().sample_rate, 8000);
        assert_eq!(data.duration(), Duration::from_millis(1250));
    }

    #[test]
    fn test_decode_rejects_complex_backends() {
        let bytes: Arc<[u8]> = pcm_bytes(8000, 1, SampleFormat::S16, &[0.0; 8]).into();
        assert!(matches!(
            PredecoderData::decode(&PcmBackendFactory::new("module", true), &bytes),
            Err(DecodeError::PredecodeRequired)
        ));
    }

    #[test]
    fn test_non_looping_stops_at_end() {
        let data = ramp_data(100);
        let mut predecoder = Predecoder::new(data, false);
        let mut buffer = vec![0u8; 64 * 2];
        assert_eq!(predecoder.get_samples(&mut buffer, 64), 64);
        assert_eq!(predecoder.get_samples(&mut buffer, 64), 36);
        assert_eq!(frame_values(&buffer[..2])[0], 64);
        assert_eq!(predecoder.get_samples(&mut buffer, 64), 0);

        predecoder.rewind();
        assert_eq!(predecoder.get_samples(&mut buffer, 64), 64);
        assert_eq!(frame_values(&buffer[..2])[0], 0);
    }

    #[test]
    fn test_looping_wraps_within_one_call() {
        let data = ramp_data(100);
        let mut predecoder = Predecoder::new(data, true);
        let mut buffer = vec![0u8; 250 * 2];
        assert_eq!(predecoder.get_samples(&mut buffer, 250), 250);

        let values = frame_values(&buffer);
        let expected: Vec<i16> = (0..250).map(|i| (i % 100) as i16).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_instances_share_data() {
        let data = ramp_data(100);
        let mut first = Predecoder::new(Arc::clone(&data), false);
        let mut second = Predecoder::new(Arc::clone(&data), false);
        assert_eq!(Arc::strong_count(&data), 3);

        let mut buffer = vec![0u8; 50 * 2];
        first.get_samples(&mut buffer, 50);
        second.get_samples(&mut buffer, 10);
        assert_eq!(frame_values(&buffer[..2])[0], 0);
        first.get_samples(&mut buffer, 10);
        assert_eq!(frame_values(&buffer[..2])[0], 50);
    }

    #[test]
    fn test_set_loop_toggles() {
        let mut predecoder = Predecoder::new(ramp_data(10), false);
        let mut buffer = vec![0u8; 30 * 2];
        predecoder.set_loop(true).unwrap();
        assert_eq!(predecoder.get_samples(&mut buffer, 25), 25);
        predecoder.set_loop(false).unwrap();
        assert_eq!(predecoder.get_samples(&mut buffer, 30), 5);
    }
}
