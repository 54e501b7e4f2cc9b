//! Audio decoder using symphonia
//!
//! Decodes the bundled ambient assets (MP3, AAC/M4A, FLAC, Vorbis, WAV) to
//! interleaved stereo PCM. Assets are short loops, so the whole file is
//! decoded into memory once per category switch.

use crate::audio::types::DecodedAudio;
use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Simple whole-file audio decoder using symphonia.
pub struct SimpleDecoder;

impl SimpleDecoder {
    /// Decode entire audio file to interleaved stereo PCM.
    ///
    /// Mono sources are duplicated to both channels; sources with more than
    /// two channels keep their first two.
    ///
    /// # Errors
    /// - Failed to open file
    /// - Unsupported audio format
    /// - No decodable audio track
    pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
        debug!("Decoding entire file: {}", path.display());

        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext_str);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        // Get the default audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of file");
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    debug!("Decoder reset requested, stopping at current position");
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            // Skip packets for other tracks
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decode failed: {}", e)));
                }
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            let buf = sample_buf.get_or_insert_with(|| {
                SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
            });
            if buf.capacity() < decoded.capacity() * channels {
                *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            }
            buf.copy_interleaved_ref(decoded);

            Self::append_as_stereo(buf.samples(), channels, &mut samples);
        }

        let audio = DecodedAudio::new(samples, sample_rate);
        debug!(
            "Decoded {} frames at {}Hz ({}ms)",
            audio.frame_count(),
            audio.sample_rate,
            audio.duration_ms()
        );

        Ok(audio)
    }

    /// Append interleaved samples with `channels` channels as stereo.
    fn append_as_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
        match channels {
            0 => {}
            1 => {
                output.reserve(interleaved.len() * 2);
                for &sample in interleaved {
                    output.push(sample);
                    output.push(sample);
                }
            }
            2 => output.extend_from_slice(interleaved),
            _ => {
                for frame in interleaved.chunks_exact(channels) {
                    output.push(frame[0]);
                    output.push(frame[1]);
                }
            }
        }
    }
}
