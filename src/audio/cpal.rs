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

use std::{error::Error, fmt, sync::Arc};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use crate::audio::mixer::Mixer;

const DEFAULT_DEVICE: &str = "default";

/// A small wrapper around a cpal::Device.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of output channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// A running output stream. Playback stops when this is dropped.
pub struct Output {
    _stream: cpal::Stream,
    errors: crossbeam_channel::Receiver<cpal::StreamError>,
}

impl Output {
    /// Errors reported by the stream since it started.
    pub fn errors(&self) -> &crossbeam_channel::Receiver<cpal::StreamError> {
        &self.errors
    }
}

/// Mixes into `mixed` and converts to the device's integer sample type.
fn fill_buffer<T>(mixer: &Mixer, mixed: &mut Vec<f32>, data: &mut [T], channels: usize)
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    mixed.clear();
    mixed.resize(data.len(), 0.0);
    mixer.mix_samples(mixed, data.len() / channels);

    for (dst, &src) in data.iter_mut().zip(mixed.iter()) {
        *dst = T::from_sample(src.clamp(-1.0, 1.0));
    }
}

/// f32 callback: the device buffer is mixed into directly.
fn create_f32_callback(
    mixer: Arc<Mixer>,
    channels: usize,
) -> impl FnMut(&mut [f32], &cpal::OutputCallbackInfo) + Send + 'static {
    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let frames = data.len() / channels;
        data.fill(0.0);
        mixer.mix_samples(data, frames);
    }
}

/// Integer callback: mix into a float buffer and convert.
fn create_int_callback<T>(
    mixer: Arc<Mixer>,
    channels: usize,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    let mut mixed = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        fill_buffer(&mixer, &mut mixed, data, channels);
    }
}

impl Device {
    /// Lists cpal output devices.
    pub fn list() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let Ok(output_configs) = device.supported_output_configs() else {
                    continue;
                };
                let max_channels = output_configs
                    .map(|output_config| output_config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(Device {
                        name: device.name()?,
                        max_channels,
                        host_id,
                        device,
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Gets the named output device. "default" is the default host's default output.
    pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
        if name == DEFAULT_DEVICE {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default output device")?;
            let max_channels = device.default_output_config()?.channels();
            return Ok(Device {
                name: device.name()?,
                max_channels,
                host_id: host.id(),
                device,
            });
        }

        Device::list()?
            .into_iter()
            .find(|device| device.name.trim() == name)
            .ok_or_else(|| format!("no device found with name {}", name).into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts an output stream that pulls from `mixer` at the mixer's format.
    pub fn play(
        &self,
        mixer: Arc<Mixer>,
        buffer_size: Option<u32>,
    ) -> Result<Output, Box<dyn Error>> {
        let format = *mixer.format();
        let channels = format.channel_count as usize;
        let config = cpal::StreamConfig {
            channels: format.channel_count,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: match buffer_size {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };

        let (error_tx, errors) = crossbeam_channel::unbounded();
        let error_callback = move |err: cpal::StreamError| {
            error!(err = %err, "Output stream error");
            // Nobody may be listening any more.
            let _ = error_tx.send(err);
        };

        let sample_format = self.device.default_output_config()?.sample_format();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => self.device.build_output_stream(
                &config,
                create_f32_callback(mixer, channels),
                error_callback,
                None,
            )?,
            cpal::SampleFormat::I16 => self.device.build_output_stream(
                &config,
                create_int_callback::<i16>(mixer, channels),
                error_callback,
                None,
            )?,
            cpal::SampleFormat::I32 => self.device.build_output_stream(
                &config,
                create_int_callback::<i32>(mixer, channels),
                error_callback,
                None,
            )?,
            other => return Err(format!("unsupported sample format {:?}", other).into()),
        };
        stream.play()?;

        info!(
            device = %self.name,
            sample_rate = format.sample_rate,
            channels,
            sample_format = ?sample_format,
            "Output stream started"
        );

        Ok(Output {
            _stream: stream,
            errors,
        })
    }
}
