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

use tracing::debug;

use super::error::DecodeError;
use super::media::SymphoniaBackendFactory;
use super::traits::BackendFactory;
use crate::audio::DecoderSpec;

/// The ordered list of backends sound data is probed against. Earlier entries win.
#[derive(Clone)]
pub struct BackendRegistry {
    factories: Vec<Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> BackendRegistry {
        BackendRegistry {
            factories: Vec::new(),
        }
    }

    /// Adds a backend after every backend already registered.
    pub fn register(&mut self, factory: Arc<dyn BackendFactory>) {
        self.factories.push(factory);
    }

    /// Adds a backend ahead of every backend already registered.
    pub fn register_first(&mut self, factory: Arc<dyn BackendFactory>) {
        self.factories.insert(0, factory);
    }

    /// Names of the registered backends in probe order.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|factory| factory.name()).collect()
    }

    /// Finds the first backend that can open the data. The trial instance is dropped
    /// straight away.
    pub fn probe(
        &self,
        data: &Arc<[u8]>,
    ) -> Result<(Arc<dyn BackendFactory>, DecoderSpec), DecodeError> {
        for factory in self.factories.iter() {
            match factory.create(data, false) {
                Ok((_backend, spec)) => {
                    debug!(backend = factory.name(), spec = %spec, "Backend recognized data");
                    return Ok((Arc::clone(factory), spec));
                }
                Err(e) => {
                    debug!(backend = factory.name(), err = %e, "Backend rejected data");
                }
            }
        }

        Err(DecodeError::UnsupportedFormat)
    }
}

impl Default for BackendRegistry {
    /// The backends compiled into this crate.
    fn default() -> Self {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(SymphoniaBackendFactory));
        registry
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::decode::memory::{pcm_bytes, PcmBackendFactory};
    use crate::audio::SampleFormat;

    #[test]
    fn test_probe_order() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(PcmBackendFactory::new("second", false)));
        registry.register_first(Arc::new(PcmBackendFactory::new("first", false)));
        assert_eq!(registry.names(), vec!["first", "second"]);

        let data: Arc<[u8]> = pcm_bytes(8000, 1, SampleFormat::S16, &[0.0; 16]).into();
        let (factory, spec) = registry.probe(&data).unwrap();
        assert_eq!(factory.name(), "first");
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.sample_format, SampleFormat::S16);
    }

    #[test]
    fn test_probe_unsupported() {
        let registry = BackendRegistry::new();
        let data: Arc<[u8]> = vec![1u8, 2, 3].into();
        assert!(matches!(
            registry.probe(&data),
            Err(DecodeError::UnsupportedFormat)
        ));

        let registry = BackendRegistry::default();
        assert_eq!(registry.names(), vec!["symphonia"]);
        assert!(matches!(
            registry.probe(&data),
            Err(DecodeError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_falls_through_to_later_backend() {
        let mut registry = BackendRegistry::default();
        registry.register(Arc::new(PcmBackendFactory::new("pcm", false)));

        let data: Arc<[u8]> = pcm_bytes(8000, 2, SampleFormat::F32, &[0.5; 8]).into();
        let (factory, spec) = registry.probe(&data).unwrap();
        assert_eq!(factory.name(), "pcm");
        assert_eq!(spec.channel_count, 2);
    }
}
