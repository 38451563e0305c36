pub const WAV_MIME: &str = "audio/wav";

/// Write mono f32 samples as a 16-bit PCM RIFF/WAVE file. Samples outside
/// [-1, 1] are clipped. Fails when the data chunk does not fit a RIFF size field.
pub fn encode_wav_mono_i16(samples: &[f32], sample_rate_hz: u32) -> anyhow::Result<Vec<u8>> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let audio_format: u16 = 1; // integer PCM

    let byte_rate = sample_rate_hz * num_channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = num_channels * (bits_per_sample / 8);

    let Some(data_bytes_len) = data_chunk_len(samples.len()) else {
        anyhow::bail!("clip too long for a WAV file: {} samples", samples.len());
    };

    let mut out = Vec::with_capacity(44 + data_bytes_len as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_bytes_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&audio_format.to_le_bytes());
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&sample_rate_hz.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes_len.to_le_bytes());

    for s in samples {
        out.extend_from_slice(&to_i16(*s).to_le_bytes());
    }

    Ok(out)
}

// Byte length of the data chunk, if the whole file still fits in u32 sizes.
fn data_chunk_len(sample_count: usize) -> Option<u32> {
    let len = u32::try_from(sample_count.checked_mul(2)?).ok()?;
    len.checked_add(36)?;
    Some(len)
}

fn to_i16(s: f32) -> i16 {
    if s.is_nan() {
        return 0;
    }
    (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
