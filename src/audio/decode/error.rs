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

/// Error types for building decode stages.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("No registered backend recognizes the data")]
    UnsupportedFormat,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Audio data error: {0}")]
    Symphonia(#[from] symphonia::core::errors::Error),

    #[error("Invalid decoder spec: {0}")]
    InvalidSpec(String),

    #[error("Resampling failed: {0}Hz -> {1}Hz")]
    ResamplingFailed(u32, u32),

    #[error("Sound data could not be predecoded")]
    PredecodeRequired,

    #[error("No sound data was supplied")]
    NoSegments,

    #[error("Looping can't be changed on a backend that manages its own timing")]
    LoopUnsupported,
}
