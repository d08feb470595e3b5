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

use super::error::DecodeError;
use crate::audio::DecoderSpec;

/// An open decoder for one piece of sound data. Produces interleaved frames in the
/// native format reported by its factory.
pub trait Backend: Send {
    /// Seeks back to the first frame.
    fn rewind(&mut self);

    /// Writes up to `frames` frames into `buffer` and returns the number written.
    /// `buffer` must hold at least `frames` native frames. Fewer frames than requested
    /// means the stream has ended or failed.
    fn get_samples(&mut self, buffer: &mut [u8], frames: usize) -> usize;
}

/// Recognizes and opens one family of formats.
pub trait BackendFactory: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &'static str;

    /// Opens the data. Fails if the data isn't in a format this backend understands.
    /// `looping` is only honored by complex backends, which loop internally.
    fn create(
        &self,
        data: &Arc<[u8]>,
        looping: bool,
    ) -> Result<(Box<dyn Backend>, DecoderSpec), DecodeError>;
}

/// A pull-based stage producing native-format frames.
pub trait DecodeStage: Send {
    /// The format of the frames this stage produces.
    fn spec(&self) -> &DecoderSpec;

    /// Seeks back to the first frame.
    fn rewind(&mut self);

    /// Writes up to `frames` frames into `buffer` and returns the number written. A
    /// looping stage always fills the request; a short count means permanent end of stream.
    fn get_samples(&mut self, buffer: &mut [u8], frames: usize) -> usize;

    /// Enables or disables looping.
    fn set_loop(&mut self, looping: bool) -> Result<(), DecodeError>;
}

impl DecodeStage for Box<dyn DecodeStage> {
    fn spec(&self) -> &DecoderSpec {
        (**self).spec()
    }

    fn rewind(&mut self) {
        (**self).rewind()
    }

    fn get_samples(&mut self, buffer: &mut [u8], frames: usize) -> usize {
        (**self).get_samples(buffer, frames)
    }

    fn set_loop(&mut self, looping: bool) -> Result<(), DecodeError> {
        (**self).set_loop(looping)
    }
}
