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

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::DecodeError;
use super::predecoder::{Predecoder, PredecoderData};
use super::registry::BackendRegistry;
use super::traits::{Backend, BackendFactory, DecodeStage};
use crate::audio::DecoderSpec;

/// How a piece of sound data is played back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Decoded up front and read from memory.
    Predecoder,
    /// A complex backend that keeps its own timing and loops by itself.
    HighLevel,
    /// A raw backend, looped by rewinding it.
    LowLevel,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Predecoder => "predecoder",
            Strategy::HighLevel => "high-level",
            Strategy::LowLevel => "low-level",
        };
        write!(f, "{}", name)
    }
}

/// Loaded sound data: the bytes, the backend that recognized them and the strategy
/// picked for them. Shared by every DecoderSelector created from it.
pub struct DecoderSelectorData {
    data: Arc<[u8]>,
    factory: Arc<dyn BackendFactory>,
    spec: DecoderSpec,
    strategy: Strategy,
    predecoded: Option<Arc<PredecoderData>>,
}

impl DecoderSelectorData {
    /// Probes the data against the registry and picks a strategy. With `predecode` set,
    /// simple formats are decoded now; if that fails the data falls back to low-level
    /// playback unless `must_predecode` is set.
    pub fn load(
        registry: &BackendRegistry,
        data: Arc<[u8]>,
        predecode: bool,
        must_predecode: bool,
    ) -> Result<DecoderSelectorData, DecodeError> {
        let (factory, spec) = registry.probe(&data)?;

        let (strategy, predecoded) = if spec.is_complex {
            if must_predecode {
                return Err(DecodeError::PredecodeRequired);
            }
            (Strategy::HighLevel, None)
        } else if predecode || must_predecode {
            match PredecoderData::decode(factory.as_ref(), &data) {
                Ok(predecoded) => (Strategy::Predecoder, Some(Arc::new(predecoded))),
                Err(e) if must_predecode => {
                    warn!(backend = factory.name(), err = %e, "Predecoding failed");
                    return Err(DecodeError::PredecodeRequired);
                }
                Err(e) => {
                    warn!(
                        backend = factory.name(),
                        err = %e,
                        "Predecoding failed, falling back to streaming"
                    );
                    (Strategy::LowLevel, None)
                }
            }
        } else {
            (Strategy::LowLevel, None)
        };

        info!(
            backend = factory.name(),
            strategy = %strategy,
            spec = %spec,
            bytes = data.len(),
            "Sound data loaded"
        );

        Ok(DecoderSelectorData {
            data,
            factory,
            spec,
            strategy,
            predecoded,
        })
    }

    pub fn spec(&self) -> &DecoderSpec {
        &self.spec
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Name of the backend that recognized the data.
    pub fn backend_name(&self) -> &'static str {
        self.factory.name()
    }

    /// The decoded frames, when the data was predecoded.
    pub fn predecoded(&self) -> Option<&Arc<PredecoderData>> {
        self.predecoded.as_ref()
    }
}

enum Stage {
    Predecoder(Predecoder),
    HighLevel(Box<dyn Backend>),
    LowLevel {
        backend: Box<dyn Backend>,
        looping: bool,
    },
}

/// One playing instance of loaded sound data, dispatching to the stage its
/// strategy calls for.
pub struct DecoderSelector {
    stage: Stage,
    spec: DecoderSpec,
    frame_size: usize,
}

impl DecoderSelector {
    pub fn new(data: &DecoderSelectorData, looping: bool) -> Result<DecoderSelector, DecodeError> {
        let stage = match (data.strategy, data.predecoded.as_ref()) {
            (Strategy::Predecoder, Some(predecoded)) => {
                Stage::Predecoder(Predecoder::new(Arc::clone(predecoded), looping))
            }
            (Strategy::HighLevel, _) => {
                let (backend, _) = data.factory.create(&data.data, looping)?;
                Stage::HighLevel(backend)
            }
            _ => {
                let (backend, _) = data.factory.create(&data.data, false)?;
                Stage::LowLevel { backend, looping }
            }
        };

        Ok(DecoderSelector {
            stage,
            spec: data.spec,
            frame_size: data.spec.frame_size(),
        })
    }
}

impl DecodeStage for DecoderSelector {
    fn spec(&self) -> &DecoderSpec {
        &self.spec
    }

    fn rewind(&mut self) {
        match &mut self.stage {
            Stage::Predecoder(predecoder) => predecoder.rewind(),
            Stage::HighLevel(backend) => backend.rewind(),
            Stage::LowLevel { backend, .. } => backend.rewind(),
        }
    }

    fn get_samples(&mut self, buffer: &mut [u8], frames: usize) -> usize {
        match &mut self.stage {
            Stage::Predecoder(predecoder) => predecoder.get_samples(buffer, frames),
            Stage::HighLevel(backend) => backend.get_samples(buffer, frames),
            Stage::LowLevel { backend, looping } => {
                let mut frames_done = 0;
                let mut rewound = false;

                while frames_done < frames {
                    let read = backend.get_samples(
                        &mut buffer[frames_done * self.frame_size..],
                        frames - frames_done,
                    );
                    frames_done += read;
                    if frames_done == frames {
                        break;
                    }
                    // A stream that yields nothing straight after a rewind would spin forever.
                    if !*looping || (rewound && read == 0) {
                        break;
                    }
                    backend.rewind();
                    rewound = true;
                }

                frames_done
            }
        }
    }

    fn set_loop(&mut self, looping: bool) -> Result<(), DecodeError> {
        match &mut self.stage {
            Stage::Predecoder(predecoder) => predecoder.set_loop(looping),
            Stage::HighLevel(_) => Err(DecodeError::LoopUnsupported),
            Stage::LowLevel { looping: current, .. } => {
                debug!(looping, "Loop changed");
                *current = looping;
                Ok(())
            }
        }
    }
}
