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

use std::io::Cursor;
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use super::error::DecodeError;
use super::traits::{Backend, BackendFactory};
use crate::audio::{DecoderSpec, SampleFormat};

/// Opens anything symphonia's default registry can probe: WAV, FLAC, Vorbis, MP3, AAC
/// and friends. Frames are always delivered as F32.
pub struct SymphoniaBackendFactory;

impl BackendFactory for SymphoniaBackendFactory {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn create(
        &self,
        data: &Arc<[u8]>,
        _looping: bool,
    ) -> Result<(Box<dyn Backend>, DecoderSpec), DecodeError> {
        let backend = SymphoniaBackend::open(Arc::clone(data))?;
        let spec = DecoderSpec::new(
            backend.sample_rate,
            backend.channels,
            SampleFormat::F32,
            false,
        )?;
        Ok((Box::new(backend), spec))
    }
}

/// A symphonia format reader and decoder over an in-memory buffer.
struct SymphoniaBackend {
    data: Arc<[u8]>,
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    channels: u16,
    sample_rate: u32,
    /// Decoded interleaved samples not yet handed out.
    pending: Vec<f32>,
    pending_position: usize,
    is_finished: bool,
}

impl SymphoniaBackend {
    fn open(data: Arc<[u8]>) -> Result<Self, DecodeError> {
        let mss = MediaSourceStream::new(
            Box::new(Cursor::new(Arc::clone(&data))),
            MediaSourceStreamOptions::default(),
        );

        let probed = get_probe().format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::Backend("No audio track found".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| DecodeError::Backend("Sample rate not specified".to_string()))?;
        let decoder = get_codecs().make(&params, &DecoderOptions::default())?;

        let mut backend = SymphoniaBackend {
            data,
            format_reader,
            decoder,
            track_id,
            channels: params.channels.map(|c| c.count() as u16).unwrap_or(0),
            sample_rate,
            pending: Vec::new(),
            pending_position: 0,
            is_finished: false,
        };

        // Some containers don't carry a channel layout. Decode the first packet to find
        // out, and keep its samples as the head of the stream.
        if backend.channels == 0 {
            match backend.decode_next_packet()? {
                Some(channels) => backend.channels = channels,
                None => {
                    return Err(DecodeError::Backend(
                        "Channels not specified".to_string(),
                    ))
                }
            }
        }

        debug!(
            sample_rate = backend.sample_rate,
            channels = backend.channels,
            codec = ?params.codec,
            "Opened symphonia stream"
        );

        Ok(backend)
    }

    /// Decodes the next packet of our track into `pending`. Returns the packet's channel
    /// count, or None at the end of the stream.
    fn decode_next_packet(&mut self) -> Result<Option<u16>, DecodeError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A corrupt packet is skipped rather than ending the stream.
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(err = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            samples.copy_interleaved_ref(decoded);

            self.pending.drain(..self.pending_position);
            self.pending_position = 0;
            self.pending.extend_from_slice(samples.samples());
            return Ok(Some(spec.channels.count() as u16));
        }
    }

    /// Seeks the reader back to the first frame. Returns false when the reader can't
    /// land exactly on it, which leaves the stream position undefined.
    fn seek_to_start(&mut self) -> bool {
        let seeked = self.format_reader.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: 0,
                track_id: self.track_id,
            },
        );
        match seeked {
            Ok(seeked) if seeked.actual_ts == 0 => {
                self.decoder.reset();
                self.pending.clear();
                self.pending_position = 0;
                self.is_finished = false;
                true
            }
            Ok(seeked) => {
                debug!(actual_ts = seeked.actual_ts, "Seek to start landed late");
                false
            }
            Err(e) => {
                debug!(err = %e, "Seek to start failed");
                false
            }
        }
    }
}

impl Backend for SymphoniaBackend {
    fn rewind(&mut self) {
        if self.seek_to_start() {
            return;
        }

        // Reopening gives exactly the frames a fresh instance would produce.
        match SymphoniaBackend::open(Arc::clone(&self.data)) {
            Ok(fresh) => *self = fresh,
            Err(e) => {
                warn!(err = %e, "Unable to rewind symphonia stream");
                self.pending.clear();
                self.pending_position = 0;
                self.is_finished = true;
            }
        }
    }

    fn get_samples(&mut self, buffer: &mut [u8], frames: usize) -> usize {
        let channels = self.channels as usize;
        let frame_size = channels * SampleFormat::F32.bytes_per_sample();
        let mut frames_done = 0;

        while frames_done < frames {
            let available = (self.pending.len() - self.pending_position) / channels;
            if available == 0 {
                if self.is_finished {
                    break;
                }
                match self.decode_next_packet() {
                    Ok(Some(packet_channels)) if packet_channels == self.channels => continue,
                    Ok(Some(packet_channels)) => {
                        warn!(
                            expected = self.channels,
                            got = packet_channels,
                            "Channel layout changed mid-stream"
                        );
                        self.is_finished = true;
                    }
                    Ok(None) => self.is_finished = true,
                    Err(e) => {
                        warn!(err = %e, "Decoding failed");
                        self.is_finished = true;
                    }
                }
                continue;
            }

            let to_copy = available.min(frames - frames_done);
            let samples =
                &self.pending[self.pending_position..self.pending_position + to_copy * channels];
            let output =
                &mut buffer[frames_done * frame_size..(frames_done + to_copy) * frame_size];
            for (sample, bytes) in samples.iter().zip(output.chunks_exact_mut(4)) {
                bytes.copy_from_slice(&sample.to_ne_bytes());
            }
            self.pending_position += to_copy * channels;
            frames_done += to_copy;
        }

        frames_done
    }
}
