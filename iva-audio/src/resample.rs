use anyhow::Context;
use rubato::Resampler;

/// Resample mono f32 audio to a target sample rate.
///
/// Input is PCM in [-1, 1]. Returns the input unchanged when the rates match
/// or there is nothing to convert.
pub fn resample_mono_f32(
    input_samples: &[f32],
    input_sample_rate_hz: u32,
    target_sample_rate_hz: u32,
) -> anyhow::Result<Vec<f32>> {
    if input_sample_rate_hz == 0 || target_sample_rate_hz == 0 {
        anyhow::bail!(
            "invalid sample rate conversion {input_sample_rate_hz} -> {target_sample_rate_hz}"
        );
    }
    if input_sample_rate_hz == target_sample_rate_hz || input_samples.is_empty() {
        return Ok(input_samples.to_vec());
    }

    let params = rubato::SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: rubato::SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: rubato::WindowFunction::BlackmanHarris2,
    };

    // The whole clip is one chunk: clips are short and already in memory.
    let mut resampler = rubato::SincFixedIn::<f32>::new(
        target_sample_rate_hz as f64 / input_sample_rate_hz as f64,
        2.0,
        params,
        input_samples.len(),
        1,
    )
    .context("create resampler")?;

    let input = vec![input_samples.to_vec()];
    let out = resampler.process(&input, None).context("resample")?;
    Ok(out.into_iter().next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_returns_input() {
        let x = vec![0.0, 0.5, -0.5, 0.25];
        let y = resample_mono_f32(&x, 16_000, 16_000).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn empty_input_is_passed_through() {
        assert!(resample_mono_f32(&[], 48_000, 16_000).unwrap().is_empty());
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(resample_mono_f32(&[0.1], 0, 16_000).is_err());
    }

    #[test]
    fn downsampling_scales_length() {
        let x: Vec<f32> = (0..48_000)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / 48_000.0).sin() * 0.5)
            .collect();
        let y = resample_mono_f32(&x, 48_000, 16_000).unwrap();
        approx::assert_abs_diff_eq!(y.len() as f64, 16_000.0, epsilon = 16.0);
    }
}
