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

//! The decode side of the pipeline. Encoded bytes are probed against the registered
//! backends, optionally predecoded, converted to the mixer's format and spliced into
//! intro and loop segments.
pub mod error;
pub mod media;
#[cfg(test)]
pub mod memory;
pub mod predecoder;
pub mod registry;
pub mod resampled;
pub mod selector;
pub mod split;
pub mod traits;


pub use error::DecodeError;
pub use media::SymphoniaBackendFactory;
pub use predecoder::{Predecoder, PredecoderData};
pub use registry::BackendRegistry;
pub use resampled::{ResampledDecoder, SPEED_UNITY};
pub use selector::{DecoderSelector, DecoderSelectorData, Strategy};
pub use split::{SplitDecoder, SplitDecoderData};
pub use traits::{Backend, BackendFactory, DecodeStage};
