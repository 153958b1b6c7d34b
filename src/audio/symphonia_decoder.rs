//! Default [`AudioDecoder`] built on Symphonia.
//!
//! Sources are decoded in full at their native sample rate and channel layout. The file name's
//! extension is passed to the prober as a hint, which matters for formats without a reliable
//! magic number (raw ADTS, some MP3s).

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, Track};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{AudioDecoder, DecodedAudio};

/// Decodes any container/codec pair Symphonia's default registry knows about.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, file_name: &str, bytes: &[u8]) -> Result<DecodedAudio> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str());
        decode_all(bytes.to_vec(), extension)
    }
}

fn decode_all(bytes: Vec<u8>, hint_extension: Option<&str>) -> Result<DecodedAudio> {
    let (mut format, track) = probe(bytes, hint_extension)?;
    let mut decoder = make_decoder(&track)?;

    let mut samples = Vec::new();
    let mut scratch: Option<SampleBuffer<f32>> = None;
    let mut layout: Option<(u32, usize)> = None;

    while let Some(packet) = next_packet(&mut format)? {
        if packet.track_id() != track.id {
            continue;
        }

        decode_packet_and_then(&mut decoder, &packet, |decoded| {
            let spec = *decoded.spec();
            let channels = spec.channels.count();
            if channels == 0 {
                bail!("decoded audio had zero channels");
            }

            match layout {
                None => layout = Some((spec.rate, channels)),
                Some(seen) if seen != (spec.rate, channels) => {
                    bail!(
                        "audio layout changed mid-stream ({} Hz x {} -> {} Hz x {})",
                        seen.0,
                        seen.1,
                        spec.rate,
                        channels
                    );
                }
                Some(_) => {}
            }

            let needed = decoded.frames() * channels;
            if scratch.as_ref().is_none_or(|buf| buf.capacity() < needed) {
                scratch = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            let buf = scratch
                .as_mut()
                .ok_or_else(|| anyhow!("sample buffer not initialized"))?;
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
            Ok(())
        })?;
    }

    let Some((sample_rate, channels)) = layout else {
        bail!("stream contained no decodable audio");
    };

    Ok(DecodedAudio {
        sample_rate,
        channels,
        samples,
    })
}

/// Probe the byte buffer and pick the first track that can actually be decoded.
fn probe(bytes: Vec<u8>, hint_extension: Option<&str>) -> Result<(Box<dyn FormatReader>, Track)> {
    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(bytes)),
        MediaSourceStreamOptions {
            // Probing wants a power-of-two buffer larger than 32 KiB.
            buffer_len: 256 * 1024,
        },
    );

    let mut hint = Hint::new();
    if let Some(ext) = hint_extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| anyhow!(e))
        .context("failed to probe media stream")?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no audio track found"))?;

    Ok((format, track))
}

fn make_decoder(track: &Track) -> Result<Box<dyn Decoder>> {
    symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")
}

/// `Ok(None)` on end of stream.
fn next_packet(format: &mut Box<dyn FormatReader>) -> Result<Option<Packet>> {
    match format.next_packet() {
        Ok(p) => Ok(Some(p)),
        Err(SymphoniaError::IoError(_)) => Ok(None),
        Err(e) => Err(anyhow!(e)).context("failed reading packet"),
    }
}

/// Decode one packet and pass the buffer on.
///
/// Corrupt frames are skipped and IO errors end the packet quietly; anything else is fatal.
fn decode_packet_and_then(
    decoder: &mut Box<dyn Decoder>,
    packet: &Packet,
    on_decoded: impl FnOnce(AudioBufferRef<'_>) -> Result<()>,
) -> Result<()> {
    match decoder.decode(packet) {
        Ok(buf) => on_decoded(buf),
        Err(SymphoniaError::DecodeError(_)) | Err(SymphoniaError::IoError(_)) => Ok(()),
        Err(e) => Err(anyhow!(e)).context("decoder failure"),
    }
}
