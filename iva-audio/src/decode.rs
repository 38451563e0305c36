use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported or corrupt audio: {0}")]
    Format(#[from] SymphoniaError),

    #[error("no audio track found")]
    NoTrack,

    #[error("audio track has no sample rate")]
    UnknownRate,

    #[error("no audio samples found")]
    Empty,
}

/// Mono PCM decoded from a container.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate_hz as u64
    }
}

/// Decode an in-memory file (WAV, MP3) to mono f32, averaging channels.
/// `extension` is a format hint such as `"wav"`.
pub fn decode_to_mono(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let sample_rate_hz = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::UnknownRate)?;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let signal = *decoded.spec();
        let channels = signal.channels.count().max(1);
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, signal);
        buf.copy_interleaved_ref(decoded);

        samples.extend(
            buf.samples()
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(DecodedAudio {
        sample_rate_hz,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::encode_wav_mono_i16;

    #[test]
    fn decodes_pcm_wav() {
        let input: Vec<f32> = (0..800).map(|i| ((i % 40) as f32 - 20.0) / 40.0).collect();
        let wav = encode_wav_mono_i16(&input, 8_000).unwrap();

        let out = decode_to_mono(wav, Some("wav")).unwrap();
        assert_eq!(out.sample_rate_hz, 8_000);
        assert_eq!(out.samples.len(), 800);
        assert_eq!(out.duration_ms(), 100);
        for (a, b) in input.iter().zip(&out.samples) {
            approx::assert_abs_diff_eq!(a, b, epsilon = 1e-3);
        }
    }

    #[test]
    fn garbage_is_an_error() {
        let err = decode_to_mono(b"definitely not audio".to_vec(), None).unwrap_err();
        assert!(matches!(err, DecodeError::Format(_)));
    }
}
