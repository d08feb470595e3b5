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

use rubato::{
    SincFixedIn, SincInterpolationParameters, SincInterpolationType, VecResampler, WindowFunction,
};
use tracing::{debug, warn};

use super::error::DecodeError;
use super::traits::DecodeStage;
use crate::audio::{DecoderSpec, TargetFormat};

/// Input block size for the sinc resampler.
const INPUT_BLOCK_SIZE: usize = 1024;

/// Sinc filter length, in input frames.
const SINC_LEN: usize = 256;

/// Fixed-point speed multiplier for normal playback (16.16).
pub const SPEED_UNITY: u32 = 0x10000;

/// How far a dynamic resampler may move from its initial ratio.
const MAX_RELATIVE_RATIO: f64 = 8.0;

/// Ratio changes are clamped just inside the resampler's limit.
const RATIO_LIMIT: f64 = 7.99;

/// Sinc cutoff relative to the Nyquist frequency when the low-pass filter sits at the
/// lower of the two sample rates.
const DEFAULT_CUTOFF: f32 = 0.95;

/// Sliding-window input buffer for streaming resampling (planar format)
struct PlanarInputBuffer {
    /// Per-channel input samples (sliding window)
    channels: Vec<Vec<f32>>,
    /// The last SINC_LEN frames handed to the resampler, per channel. Zero before
    /// the stream starts.
    history: Vec<Vec<f32>>,
}

impl PlanarInputBuffer {
    fn new(num_channels: usize) -> Self {
        Self {
            channels: vec![Vec::with_capacity(INPUT_BLOCK_SIZE * 2); num_channels],
            history: vec![vec![0.0; SINC_LEN]; num_channels],
        }
    }

    /// Number of frames currently in the buffer
    fn len(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Append interleaved frames, splitting them into planes.
    fn push_interleaved(&mut self, interleaved: &[f32]) {
        let num_channels = self.channels.len();
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, sample) in self.channels.iter_mut().zip(frame) {
                ch.push(*sample);
            }
        }
    }

    /// Drain the first `n` frames from all channels into the history.
    fn drain_frames(&mut self, n: usize) {
        for (ch, history) in self.channels.iter_mut().zip(self.history.iter_mut()) {
            history.extend(ch.drain(0..n.min(ch.len())));
            let excess = history.len() - SINC_LEN;
            history.drain(..excess);
        }
    }

    /// Puts the history back in front of the pending frames. Returns the number of
    /// frames replayed.
    fn replay_history(&mut self) -> usize {
        for (ch, history) in self.channels.iter_mut().zip(self.history.iter()) {
            ch.extend_from_slice(history);
            ch.rotate_right(SINC_LEN);
        }
        SINC_LEN
    }

    fn clear(&mut self) {
        for ch in &mut self.channels {
            ch.clear();
        }
        for history in &mut self.history {
            history.fill(0.0);
        }
    }
}

/// Planar FIFO of resampled frames waiting to be handed out.
struct PlanarOutputFifo {
    /// Per-channel output samples ready for consumption
    channels: Vec<Vec<f32>>,
    /// Current read position (in frames)
    read_pos: usize,
}

impl PlanarOutputFifo {
    fn new(num_channels: usize) -> Self {
        Self {
            channels: vec![Vec::new(); num_channels],
            read_pos: 0,
        }
    }

    /// Number of frames available to read
    fn available_frames(&self) -> usize {
        self.channels
            .first()
            .map(|c| c.len().saturating_sub(self.read_pos))
            .unwrap_or(0)
    }

    /// Drain up to `max_frames` frames into an interleaved buffer, returns the number
    /// of frames written.
    fn drain_interleaved(&mut self, output: &mut [f32], max_frames: usize) -> usize {
        let num_channels = self.channels.len();
        let to_copy = self.available_frames().min(max_frames);

        for (i, frame) in output.chunks_exact_mut(num_channels).take(to_copy).enumerate() {
            for (sample, ch) in frame.iter_mut().zip(self.channels.iter()) {
                *sample = ch[self.read_pos + i];
            }
        }
        self.read_pos += to_copy;

        // Compact buffers if we've consumed a lot
        if self.read_pos > 4096 {
            for ch in self.channels.iter_mut() {
                ch.drain(..self.read_pos);
            }
            self.read_pos = 0;
        }
        to_copy
    }

    /// Append `count` frames of resampler output starting at frame `offset`.
    fn push_planar(&mut self, per_channel: &[Vec<f32>], offset: usize, count: usize) {
        for (ch, source) in self.channels.iter_mut().zip(per_channel) {
            ch.extend_from_slice(&source[offset..offset + count]);
        }
    }

    fn clear(&mut self) {
        for ch in &mut self.channels {
            ch.clear();
        }
        self.read_pos = 0;
    }
}

/// Scales a sample rate by a 16.16 fixed-point multiplier. The integer and fractional
/// halves are multiplied separately so neither product can overflow.
pub(crate) fn scale_rate(rate: u32, speed: u32) -> u32 {
    let upper = rate as u64 * (speed >> 16) as u64;
    let lower = rate as u64 * (speed & 0xFFFF) as u64;
    (upper + (lower >> 16)).min(u32::MAX as u64) as u32
}

fn build_resampler(
    input_rate: u32,
    output_rate: u32,
    channels: usize,
    dynamic: bool,
    low_pass_hz: u32,
) -> Result<SincFixedIn<f32>, DecodeError> {
    let lower_rate = input_rate.min(output_rate) as f32;
    let sinc_params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: (DEFAULT_CUTOFF * low_pass_hz as f32 / lower_rate).clamp(0.01, 0.99),
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };

    SincFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        if dynamic { MAX_RELATIVE_RATIO } else { 1.0 },
        sinc_params,
        INPUT_BLOCK_SIZE,
        channels,
    )
    .map_err(|_e| DecodeError::ResamplingFailed(input_rate, output_rate))
}

/// Converts an upstream stage's native frames to interleaved f32 at the mixer's rate
/// and channel count. Channel mixing happens before rate conversion.
pub struct ResampledDecoder {
    upstream: Box<dyn DecodeStage>,
    input_spec: DecoderSpec,
    target: TargetFormat,
    dynamic: bool,
    /// None when the rates match and the rate can't change.
    resampler: Option<SincFixedIn<f32>>,
    speed: u32,
    low_pass_hz: u32,
    ratio: f64,

    /// Native bytes read from upstream.
    staging: Vec<u8>,
    /// Staged frames converted to f32 at the target channel count, interleaved.
    converted: Vec<f32>,
    input_buffer: PlanarInputBuffer,
    output_fifo: PlanarOutputFifo,
    output_scratch: Vec<Vec<f32>>,

    /// Leading output frames that are only filter delay.
    delay_remaining: usize,
    /// Output frames the consumed input is worth at the ratios it was resampled with.
    expected_frames: f64,
    produced_frames: u64,
    upstream_finished: bool,
    exhausted: bool,
}

impl ResampledDecoder {
    /// Wraps `upstream`. Speed and low-pass changes only take effect when `dynamic` is set.
    pub fn new(
        upstream: Box<dyn DecodeStage>,
        target: TargetFormat,
        dynamic: bool,
    ) -> Result<ResampledDecoder, DecodeError> {
        let input_spec = *upstream.spec();
        let channels = target.channel_count as usize;
        let low_pass_hz = input_spec.sample_rate.min(target.sample_rate);

        let mut decoder = ResampledDecoder {
            upstream,
            input_spec,
            target,
            dynamic,
            resampler: None,
            speed: SPEED_UNITY,
            low_pass_hz,
            ratio: target.sample_rate as f64 / input_spec.sample_rate as f64,
            staging: Vec::new(),
            converted: Vec::new(),
            input_buffer: PlanarInputBuffer::new(channels),
            output_fifo: PlanarOutputFifo::new(channels),
            output_scratch: Vec::new(),
            delay_remaining: 0,
            expected_frames: 0.0,
            produced_frames: 0,
            upstream_finished: false,
            exhausted: false,
        };

        if dynamic || input_spec.sample_rate != target.sample_rate {
            decoder.rebuild_resampler()?;
        }

        debug!(
            input = %input_spec,
            output_rate = target.sample_rate,
            output_channels = target.channel_count,
            dynamic,
            resampling = decoder.resampler.is_some(),
            "Created resampled decoder"
        );

        Ok(decoder)
    }

    /// The format this decoder produces.
    pub fn target(&self) -> &TargetFormat {
        &self.target
    }

    /// The native format of the upstream stage.
    pub fn input_spec(&self) -> &DecoderSpec {
        &self.input_spec
    }

    /// Seeks back to the first frame and drops anything buffered.
    pub fn rewind(&mut self) {
        self.upstream.rewind();
        self.input_buffer.clear();
        self.output_fifo.clear();
        self.expected_frames = 0.0;
        self.produced_frames = 0;
        self.upstream_finished = false;
        self.exhausted = false;

        if self.resampler.is_some() {
            if let Err(e) = self.rebuild_resampler() {
                warn!(err = %e, "Unable to reset resampler");
                self.exhausted = true;
            }
        }
    }

    /// Enables or disables looping upstream.
    pub fn set_loop(&mut self, looping: bool) -> Result<(), DecodeError> {
        self.upstream.set_loop(looping)
    }

    /// Plays faster or slower by scaling the input rate. `speed` is 16.16 fixed point,
    /// SPEED_UNITY being normal speed. Does nothing unless the decoder is dynamic.
    pub fn set_speed(&mut self, speed: u32) {
        if !self.dynamic {
            return;
        }
        self.speed = speed;
        self.apply_ratio();
    }

    /// Moves the anti-aliasing cutoff. Does nothing unless the decoder is dynamic.
    ///
    /// The filter is rebuilt, which allocates a new sinc table. The last input frames
    /// run through the new filter again and the output they duplicate is dropped, so
    /// playback continues where it was without a gap or a skip.
    pub fn set_low_pass_filter(&mut self, cutoff_hz: u32) {
        if !self.dynamic || cutoff_hz == 0 {
            return;
        }
        let pending_delay = self.delay_remaining;
        self.low_pass_hz = cutoff_hz;
        if let Err(e) = self.rebuild_resampler() {
            warn!(err = %e, cutoff_hz, "Unable to change low-pass filter");
            return;
        }

        let replayed = self.input_buffer.replay_history() as f64 * self.ratio;
        self.expected_frames -= replayed;
        self.delay_remaining = pending_delay + replayed.round() as usize;
    }

    /// Writes up to `frames` interleaved frames into `buffer` and returns the number
    /// written. Fewer frames means upstream has ended.
    pub fn get_samples(&mut self, buffer: &mut [f32], frames: usize) -> usize {
        let channels = self.target.channel_count as usize;

        // If no resampler, just pass through directly
        if self.resampler.is_none() {
            let read = self.pull_upstream(frames);
            buffer[..read * channels].copy_from_slice(&self.converted);
            return read;
        }

        let mut frames_done = 0;
        while frames_done < frames {
            frames_done += self.output_fifo.drain_interleaved(
                &mut buffer[frames_done * channels..frames * channels],
                frames - frames_done,
            );

            if frames_done == frames || self.exhausted {
                break;
            }

            if let Err(e) = self.fill_output_fifo() {
                warn!(err = %e, "Resampling failed, ending stream");
                self.exhausted = true;
            }
        }

        frames_done
    }

    /// Reads up to `frames` frames from upstream into `converted`, mixing channels to
    /// the target layout. Returns the number of frames read.
    fn pull_upstream(&mut self, frames: usize) -> usize {
        let frame_size = self.input_spec.frame_size();
        self.staging.resize(frames * frame_size, 0);
        let read = self.upstream.get_samples(&mut self.staging, frames);

        let format = self.input_spec.sample_format;
        let width = format.bytes_per_sample();
        let out_channels = self.target.channel_count;
        self.converted.clear();
        for frame in self.staging[..read * frame_size].chunks_exact(frame_size) {
            match (self.input_spec.channel_count, out_channels) {
                (1, 2) => {
                    let sample = format.read_sample(frame);
                    self.converted.push(sample);
                    self.converted.push(sample);
                }
                (2, 1) => {
                    let left = format.read_sample(frame);
                    let right = format.read_sample(&frame[width..]);
                    self.converted.push((left + right) * 0.5);
                }
                _ => {
                    for sample in frame.chunks_exact(width) {
                        self.converted.push(format.read_sample(sample));
                    }
                }
            }
        }

        read
    }

    /// Fill the output FIFO by reading from upstream and processing through the resampler.
    fn fill_output_fifo(&mut self) -> Result<(), DecodeError> {
        let input_frames_needed = match self.resampler.as_ref() {
            Some(r) => r.input_frames_next(),
            None => return Ok(()),
        };

        // 1. Try to fill input buffer from upstream
        while !self.upstream_finished && self.input_buffer.len() < input_frames_needed {
            let wanted = input_frames_needed - self.input_buffer.len();
            let read = self.pull_upstream(wanted);
            self.input_buffer.push_interleaved(&self.converted);
            if read < wanted {
                self.upstream_finished = true;
            }
        }

        let (input_rate, output_rate) = (self.input_spec.sample_rate, self.target.sample_rate);
        let resampler = match self.resampler.as_mut() {
            Some(r) => r,
            None => return Ok(()),
        };

        // 2. Process if we have enough input
        let nbr_out = if self.input_buffer.len() >= input_frames_needed {
            let (nbr_in, nbr_out) = resampler
                .process_into_buffer(&self.input_buffer.channels, &mut self.output_scratch, None)
                .map_err(|_e| DecodeError::ResamplingFailed(input_rate, output_rate))?;
            self.input_buffer.drain_frames(nbr_in);
            self.expected_frames += nbr_in as f64 * self.ratio;
            nbr_out
        } else {
            // 3. Upstream finished: resample what's left, then flush the filter tail.
            let remaining = self.input_buffer.len();
            let input = if remaining > 0 {
                Some(&self.input_buffer.channels as &[Vec<f32>])
            } else {
                None
            };
            let (_nbr_in, nbr_out) = resampler
                .process_partial_into_buffer(input, &mut self.output_scratch, None)
                .map_err(|_e| DecodeError::ResamplingFailed(input_rate, output_rate))?;
            self.input_buffer.drain_frames(remaining);
            self.expected_frames += remaining as f64 * self.ratio;
            if nbr_out == 0 {
                self.exhausted = true;
            }
            nbr_out
        };

        self.push_output(nbr_out);
        Ok(())
    }

    /// Moves resampler output into the FIFO, dropping the leading filter delay and,
    /// once upstream is done, anything past the expected length.
    fn push_output(&mut self, nbr_out: usize) {
        let skip = self.delay_remaining.min(nbr_out);
        self.delay_remaining -= skip;

        let mut count = nbr_out - skip;
        if self.upstream_finished {
            let limit = (self.expected_frames.round() as u64).saturating_sub(self.produced_frames);
            count = count.min(limit as usize);
            if self.produced_frames + count as u64 >= self.expected_frames.round() as u64 {
                self.exhausted = true;
            }
        }

        self.output_fifo
            .push_planar(&self.output_scratch, skip, count);
        self.produced_frames += count as u64;
    }

    fn rebuild_resampler(&mut self) -> Result<(), DecodeError> {
        let resampler = build_resampler(
            self.input_spec.sample_rate,
            self.target.sample_rate,
            self.target.channel_count as usize,
            self.dynamic,
            self.low_pass_hz,
        )?;
        self.output_scratch = resampler.output_buffer_allocate(true);
        self.delay_remaining = resampler.output_delay();
        self.resampler = Some(resampler);
        self.ratio = self.target.sample_rate as f64 / self.input_spec.sample_rate as f64;
        self.apply_ratio();
        Ok(())
    }

    fn apply_ratio(&mut self) {
        let base = self.target.sample_rate as f64 / self.input_spec.sample_rate as f64;
        let input_rate = scale_rate(self.input_spec.sample_rate, self.speed).max(1);
        let ratio = (self.target.sample_rate as f64 / input_rate as f64)
            .clamp(base / RATIO_LIMIT, base * RATIO_LIMIT);

        let Some(resampler) = self.resampler.as_mut() else {
            return;
        };
        if ratio == self.ratio {
            return;
        }
        match resampler.set_resample_ratio(ratio, true) {
            Ok(()) => self.ratio = ratio,
            Err(e) => warn!(err = %e, ratio, "Unable to change resample ratio"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::decode::memory::{pcm_bytes, PcmBackendFactory};
    use crate::audio::decode::{BackendRegistry, DecoderSelector, DecoderSelectorData};
    use crate::audio::SampleFormat;

    fn upstream(rate: u32, channels: u8, samples: &[f32], looping: bool) -> Box<dyn DecodeStage> {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(PcmBackendFactory::new("pcm", false)));
        let bytes: Arc<[u8]> = pcm_bytes(rate, channels, SampleFormat::F32, samples).into();
        let data = DecoderSelectorData::load(&registry, bytes, false, false).unwrap();
        Box::new(DecoderSelector::new(&data, looping).unwrap())
    }

    fn drain(decoder: &mut ResampledDecoder) -> Vec<f32> {
        let channels = decoder.target().channel_count as usize;
        let mut all = Vec::new();
        let mut buffer = vec![0.0f32; 1000 * channels];
        loop {
            let n = decoder.get_samples(&mut buffer, 1000);
            all.extend_from_slice(&buffer[..n * channels]);
            if n < 1000 {
                return all;
            }
        }
    }

    #[test]
    fn test_scale_rate() {
        assert_eq!(scale_rate(44100, SPEED_UNITY), 44100);
        assert_eq!(scale_rate(44100, SPEED_UNITY * 2), 88200);
        assert_eq!(scale_rate(44100, SPEED_UNITY / 2), 22050);
        assert_eq!(scale_rate(48000, 0x18000), 72000);
        assert_eq!(scale_rate(u32::MAX, 0x1FFFF), u32::MAX);
        assert_eq!(scale_rate(48000, 0), 0);
    }

    #[test]
    fn test_identity_at_equal_format() {
        let samples: Vec<f32> = (0..5000).map(|i| ((i % 200) as f32 - 100.0) / 100.0).collect();
        let mut decoder = ResampledDecoder::new(
            upstream(44100, 2, &samples, false),
            TargetFormat::new(44100, 2).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(drain(&mut decoder), samples);
    }

    #[test]
    fn test_channel_mixing() {
        let mut decoder = ResampledDecoder::new(
            upstream(8000, 1, &[0.25, -0.5], false),
            TargetFormat::new(8000, 2).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(drain(&mut decoder), vec![0.25, 0.25, -0.5, -0.5]);

        let mut decoder = ResampledDecoder::new(
            upstream(8000, 2, &[0.25, 0.75, -1.0, 0.0], false),
            TargetFormat::new(8000, 1).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(drain(&mut decoder), vec![0.5, -0.5]);
    }

    #[test]
    fn test_upsampled_length_and_level() {
        let mut decoder = ResampledDecoder::new(
            upstream(8000, 1, &vec![1.0; 16000], false),
            TargetFormat::new(48000, 2).unwrap(),
            false,
        )
        .unwrap();
        let output = drain(&mut decoder);
        assert_eq!(output.len(), 96000 * 2);
        for sample in &output[2000 * 2..94000 * 2] {
            assert!((sample - 1.0).abs() < 0.01, "sample {} not near 1.0", sample);
        }
    }

    #[test]
    fn test_downsampled_length() {
        let mut decoder = ResampledDecoder::new(
            upstream(48000, 2, &vec![0.5; 48000 * 2], false),
            TargetFormat::new(22050, 2).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(drain(&mut decoder).len(), 22050 * 2);
    }

    #[test]
    fn test_short_reads_only_at_end() {
        let mut decoder = ResampledDecoder::new(
            upstream(44100, 1, &vec![0.1; 44100], false),
            TargetFormat::new(48000, 1).unwrap(),
            false,
        )
        .unwrap();
        let mut buffer = vec![0.0f32; 7];
        let mut total = 0;
        loop {
            let n = decoder.get_samples(&mut buffer, 7);
            total += n;
            if n < 7 {
                break;
            }
        }
        assert_eq!(total, 48000);
        assert_eq!(decoder.get_samples(&mut buffer, 7), 0);
    }

    #[test]
    fn test_rewind_reproduces_output() {
        let samples: Vec<f32> = (0..10000).map(|i| (i as f32 * 0.01).sin()).collect();
        let mut decoder = ResampledDecoder::new(
            upstream(32000, 1, &samples, false),
            TargetFormat::new(48000, 1).unwrap(),
            false,
        )
        .unwrap();
        let first = drain(&mut decoder);

        let mut buffer = vec![0.0f32; 500];
        decoder.rewind();
        decoder.get_samples(&mut buffer, 500);
        decoder.rewind();
        let second = drain(&mut decoder);
        assert_eq!(first, second);
    }

    #[test]
    fn test_looping_upstream_never_ends() {
        let mut decoder = ResampledDecoder::new(
            upstream(22050, 1, &[0.5; 300], true),
            TargetFormat::new(48000, 2).unwrap(),
            false,
        )
        .unwrap();
        let mut buffer = vec![0.0f32; 4096 * 2];
        for _ in 0..10 {
            assert_eq!(decoder.get_samples(&mut buffer, 4096), 4096);
        }
    }

    #[test]
    fn test_speed_needs_dynamic_mode() {
        let mut fixed = ResampledDecoder::new(
            upstream(48000, 1, &vec![0.5; 48000], false),
            TargetFormat::new(48000, 1).unwrap(),
            false,
        )
        .unwrap();
        fixed.set_speed(SPEED_UNITY * 2);
        fixed.set_low_pass_filter(1000);
        assert_eq!(drain(&mut fixed).len(), 48000);

        let mut dynamic = ResampledDecoder::new(
            upstream(48000, 1, &vec![0.5; 48000], false),
            TargetFormat::new(48000, 1).unwrap(),
            true,
        )
        .unwrap();
        dynamic.set_speed(SPEED_UNITY * 2);
        let frames = drain(&mut dynamic).len() as i64;
        assert!((frames - 24000).abs() < 1100, "got {} frames", frames);
    }

    #[test]
    fn test_low_pass_filter_dampens_high_frequencies() {
        // Alternating samples sit right at the Nyquist frequency.
        let samples: Vec<f32> = (0..20000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let mut decoder = ResampledDecoder::new(
            upstream(44100, 1, &samples, false),
            TargetFormat::new(48000, 1).unwrap(),
            true,
        )
        .unwrap();
        decoder.set_low_pass_filter(2000);
        let output = drain(&mut decoder);
        let peak = output[4000..16000]
            .iter()
            .fold(0.0f32, |peak, sample| peak.max(sample.abs()));
        assert!(peak < 0.05, "peak {}", peak);
    }

    #[test]
    fn test_input_history_replay() {
        let mut buffer = PlanarInputBuffer::new(1);
        let frames: Vec<f32> = (0..300).map(|i| i as f32).collect();
        buffer.push_interleaved(&frames);
        buffer.drain_frames(290);
        assert_eq!(buffer.len(), 10);

        assert_eq!(buffer.replay_history(), SINC_LEN);
        assert_eq!(buffer.len(), SINC_LEN + 10);
        let expected: Vec<f32> = (34..300).map(|i| i as f32).collect();
        assert_eq!(buffer.channels[0], expected);

        buffer.clear();
        assert_eq!(buffer.replay_history(), SINC_LEN);
        assert!(buffer.channels[0].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_low_pass_change_mid_stream_is_seamless() {
        let mut decoder = ResampledDecoder::new(
            upstream(44100, 1, &vec![0.5; 44100], false),
            TargetFormat::new(48000, 1).unwrap(),
            true,
        )
        .unwrap();
        let mut output = vec![0.0f32; 10000];
        assert_eq!(decoder.get_samples(&mut output, 10000), 10000);
        decoder.set_low_pass_filter(12000);
        decoder.set_low_pass_filter(16000);
        output.extend(drain(&mut decoder));

        // Nothing is skipped and no silence is let in at the seams.
        assert!((output.len() as i64 - 48000).abs() <= 1, "{}", output.len());
        for sample in &output[2000..output.len() - 2000] {
            assert!((sample - 0.5).abs() < 0.01, "sample {} not near 0.5", sample);
        }
    }
}
