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

use tracing::{debug, warn};

use super::error::DecodeError;
use super::registry::BackendRegistry;
use super::resampled::ResampledDecoder;
use super::selector::{DecoderSelector, DecoderSelectorData};
use crate::audio::TargetFormat;

const INTRO: usize = 0;
const LOOP: usize = 1;

/// Sound data made of an intro segment played once and a loop segment played after it.
/// Either segment may be missing, but not both.
pub struct SplitDecoderData {
    segments: [Option<DecoderSelectorData>; 2],
}

impl SplitDecoderData {
    /// Loads whichever segments were supplied. A segment that fails to load is dropped
    /// as long as the other one loads.
    pub fn load(
        registry: &BackendRegistry,
        intro: Option<Arc<[u8]>>,
        looped: Option<Arc<[u8]>>,
        predecode: bool,
        must_predecode: bool,
    ) -> Result<SplitDecoderData, DecodeError> {
        let mut last_error = None;
        let mut load = |bytes: Option<Arc<[u8]>>, segment: &'static str| {
            let bytes = bytes?;
            match DecoderSelectorData::load(registry, bytes, predecode, must_predecode) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(segment, err = %e, "Unable to load segment");
                    last_error = Some(e);
                    None
                }
            }
        };
        let segments = [load(intro, "intro"), load(looped, "loop")];

        if segments.iter().all(Option::is_none) {
            return Err(last_error.unwrap_or(DecodeError::NoSegments));
        }

        Ok(SplitDecoderData { segments })
    }

    pub fn intro(&self) -> Option<&DecoderSelectorData> {
        self.segments[INTRO].as_ref()
    }

    pub fn looped(&self) -> Option<&DecoderSelectorData> {
        self.segments[LOOP].as_ref()
    }
}

/// Plays the intro segment and then, gaplessly, the loop segment.
pub struct SplitDecoder {
    decoders: [Option<ResampledDecoder>; 2],
    current: usize,
    on_last_segment: bool,
    channels: usize,
}

impl SplitDecoder {
    /// `looping` applies to the last segment; with both segments present the intro never loops.
    pub fn new(
        data: &SplitDecoderData,
        target: TargetFormat,
        looping: bool,
        dynamic: bool,
    ) -> Result<SplitDecoder, DecodeError> {
        let build = |segment: &DecoderSelectorData, looping: bool| {
            let selector = DecoderSelector::new(segment, looping)?;
            ResampledDecoder::new(Box::new(selector), target, dynamic)
        };

        let (decoders, current, on_last_segment) = match (data.intro(), data.looped()) {
            (Some(intro), Some(looped)) => (
                [Some(build(intro, false)?), Some(build(looped, looping)?)],
                INTRO,
                false,
            ),
            (Some(intro), None) => ([Some(build(intro, looping)?), None], INTRO, true),
            (None, Some(looped)) => ([None, Some(build(looped, looping)?)], LOOP, true),
            (None, None) => return Err(DecodeError::NoSegments),
        };

        Ok(SplitDecoder {
            decoders,
            current,
            on_last_segment,
            channels: target.channel_count as usize,
        })
    }

    /// Rewinds both segments. The current segment is left alone, so a sound that has
    /// reached its loop segment restarts from the loop, not the intro.
    pub fn rewind(&mut self) {
        for decoder in self.decoders.iter_mut().flatten() {
            decoder.rewind();
        }
    }

    /// Writes up to `frames` interleaved frames into `buffer`. Fewer frames means the
    /// last segment has ended.
    pub fn get_samples(&mut self, buffer: &mut [f32], frames: usize) -> usize {
        let mut frames_done = 0;
        loop {
            if let Some(decoder) = self.decoders[self.current].as_mut() {
                frames_done += decoder.get_samples(
                    &mut buffer[frames_done * self.channels..frames * self.channels],
                    frames - frames_done,
                );
            }

            if frames_done == frames || self.on_last_segment {
                return frames_done;
            }

            debug!(frames = frames_done, "Intro finished, switching to loop segment");
            self.current = LOOP;
            self.on_last_segment = true;
        }
    }

    /// Sets looping on the last segment.
    pub fn set_loop(&mut self, looping: bool) -> Result<(), DecodeError> {
        match self.decoders.iter_mut().rev().flatten().next() {
            Some(decoder) => decoder.set_loop(looping),
            None => Err(DecodeError::NoSegments),
        }
    }

    pub fn set_speed(&mut self, speed: u32) {
        for decoder in self.decoders.iter_mut().flatten() {
            decoder.set_speed(speed);
        }
    }

    pub fn set_low_pass_filter(&mut self, cutoff_hz: u32) {
        for decoder in self.decoders.iter_mut().flatten() {
            decoder.set_low_pass_filter(cutoff_hz);
        }
    }

    /// True once the intro has finished, or when there was no intro.
    pub fn on_last_segment(&self) -> bool {
        self.on_last_segment
    }
}
