//! Integrated loudness (ITU-R BS.1770) and gain selection.

use std::f64::consts::PI;

use crate::config::opts::LoudnessOpts;
use crate::foundation::math::{db_to_gain, gain_to_db};

const STEP_SECS: f64 = 0.1;
/// A 400 ms gating block is four 100 ms steps.
const STEPS_PER_BLOCK: usize = 4;
const ABSOLUTE_GATE_LUFS: f64 = -70.0;
const RELATIVE_GATE_LU: f64 = -10.0;
const LOUDNESS_OFFSET: f64 = -0.691;

/// Direct form I biquad, `a[0]` normalized to 1.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Biquad {
    pub(crate) b: [f64; 3],
    pub(crate) a: [f64; 3],
}

/// Delay line of one [`Biquad`] on one channel.
#[derive(Clone, Copy, Debug, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    fn process(&self, st: &mut BiquadState, x: f64) -> f64 {
        let y = self.b[0] * x + self.b[1] * st.x1 + self.b[2] * st.x2 - self.a[1] * st.y1 - self.a[2] * st.y2;
        st.x2 = st.x1;
        st.x1 = x;
        st.y2 = st.y1;
        st.y1 = y;
        y
    }
}

/// The two K-weighting stages (high shelf, then high pass) for `sample_rate`.
pub(crate) fn k_weighting(sample_rate: u32) -> [Biquad; 2] {
    let rate = f64::from(sample_rate);

    let f0 = 1681.974450955533;
    let g = 3.999843853973347;
    let q = 0.7071752369554196;
    let k = (PI * f0 / rate).tan();
    let vh = 10f64.powf(g / 20.0);
    let vb = vh.powf(0.4996667741545416);
    let a0 = 1.0 + k / q + k * k;
    let shelf = Biquad {
        b: [
            (vh + vb * k / q + k * k) / a0,
            2.0 * (k * k - vh) / a0,
            (vh - vb * k / q + k * k) / a0,
        ],
        a: [1.0, 2.0 * (k * k - 1.0) / a0, (1.0 - k / q + k * k) / a0],
    };

    let f0 = 38.13547087602444;
    let q = 0.5003270373238773;
    let k = (PI * f0 / rate).tan();
    let a0 = 1.0 + k / q + k * k;
    let high_pass = Biquad {
        b: [1.0, -2.0, 1.0],
        a: [1.0, 2.0 * (k * k - 1.0) / a0, (1.0 - k / q + k * k) / a0],
    };

    [shelf, high_pass]
}

/// Gated integrated loudness in LUFS of interleaved PCM.
///
/// Samples are filtered and summed in one streaming pass; only one energy value per 100 ms step is
/// kept. Returns `None` when the input is shorter than one 400 ms block or every block falls below
/// the absolute gate (digital silence).
pub(crate) fn integrated_loudness(samples: &[f32], channels: u16, sample_rate: u32) -> Option<f64> {
    let ch = usize::from(channels);
    if ch == 0 || sample_rate == 0 {
        return None;
    }
    let step = (STEP_SECS * f64::from(sample_rate)).round() as usize;
    let block = step * STEPS_PER_BLOCK;
    if step == 0 || samples.len() / ch < block {
        return None;
    }

    let filters = k_weighting(sample_rate);
    let mut state = vec![[BiquadState::default(); 2]; ch];
    let mut recent = [0.0f64; STEPS_PER_BLOCK];
    let mut step_energy = 0.0;
    let mut in_step = 0;
    let mut steps = 0usize;
    let mut block_power = Vec::with_capacity(samples.len() / ch / step);

    for frame in samples.chunks_exact(ch) {
        for (&s, st) in frame.iter().zip(state.iter_mut()) {
            let mut v = f64::from(s);
            for (f, fs) in filters.iter().zip(st.iter_mut()) {
                v = f.process(fs, v);
            }
            step_energy += v * v;
        }
        in_step += 1;
        if in_step == step {
            recent[steps % STEPS_PER_BLOCK] = step_energy;
            steps += 1;
            step_energy = 0.0;
            in_step = 0;
            if steps >= STEPS_PER_BLOCK {
                block_power.push(recent.iter().sum::<f64>() / block as f64);
            }
        }
    }

    let loudness = |power: f64| LOUDNESS_OFFSET + 10.0 * power.log10();

    let above_abs: Vec<f64> = block_power
        .iter()
        .copied()
        .filter(|&p| p > 0.0 && loudness(p) > ABSOLUTE_GATE_LUFS)
        .collect();
    if above_abs.is_empty() {
        return None;
    }
    let relative_gate = loudness(mean(&above_abs)) + RELATIVE_GATE_LU;

    let gated: Vec<f64> = above_abs
        .into_iter()
        .filter(|&p| loudness(p) > relative_gate)
        .collect();
    if gated.is_empty() {
        return None;
    }
    Some(loudness(mean(&gated)))
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Largest absolute sample value.
pub(crate) fn sample_peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Gain in dB that moves `measured_lufs` to the target without exceeding the boost limit or
/// pushing `peak` above the ceiling.
pub(crate) fn normalization_gain_db(measured_lufs: f64, peak: f32, opts: &LoudnessOpts) -> f64 {
    let mut gain_db = (opts.target_lufs - measured_lufs).min(opts.max_gain_db);
    let peak_db = gain_to_db(f64::from(peak));
    if peak_db.is_finite() {
        gain_db = gain_db.min(opts.peak_ceiling_dbfs - peak_db);
    }
    gain_db
}

/// Outcome of [`normalize_in_place`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LoudnessReport {
    pub(crate) measured_lufs: Option<f64>,
    pub(crate) gain_db: f64,
}

/// Measure and scale `samples` toward `opts.target_lufs`. Silent or too-short input is untouched.
pub(crate) fn normalize_in_place(
    samples: &mut [f32],
    channels: u16,
    sample_rate: u32,
    opts: &LoudnessOpts,
) -> LoudnessReport {
    let Some(measured) = integrated_loudness(samples, channels, sample_rate) else {
        return LoudnessReport {
            measured_lufs: None,
            gain_db: 0.0,
        };
    };
    let gain_db = normalization_gain_db(measured, sample_peak(samples), opts);
    let gain = db_to_gain(gain_db) as f32;
    for s in samples.iter_mut() {
        *s *= gain;
    }
    LoudnessReport {
        measured_lufs: Some(measured),
        gain_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_sine(amp: f32, freq: f64, secs: f64, rate: u32) -> Vec<f32> {
        let n = (secs * f64::from(rate)) as usize;
        (0..n)
            .flat_map(|i| {
                let v = amp * (2.0 * PI * freq * i as f64 / f64::from(rate)).sin() as f32;
                [v, v]
            })
            .collect()
    }

    #[test]
    fn k_weighting_matches_reference_coefficients_at_48k() {
        let [shelf, hp] = k_weighting(48_000);
        let want_shelf_b = [1.53512485958697, -2.69169618940638, 1.19839281085285];
        let want_shelf_a = [1.0, -1.69065929318241, 0.73248077421585];
        let want_hp_a = [1.0, -1.99004745483398, 0.99007225036621];
        for i in 0..3 {
            assert!((shelf.b[i] - want_shelf_b[i]).abs() < 1e-9);
            assert!((shelf.a[i] - want_shelf_a[i]).abs() < 1e-9);
            assert!((hp.a[i] - want_hp_a[i]).abs() < 1e-9);
        }
        assert_eq!(hp.b, [1.0, -2.0, 1.0]);
    }

    #[test]
    fn full_scale_stereo_1k_sine_is_about_zero_lufs() {
        let x = stereo_sine(1.0, 1000.0, 3.0, 48_000);
        let l = integrated_loudness(&x, 2, 48_000).unwrap();
        assert!(l.abs() < 0.1, "{l}");

        let half = stereo_sine(0.5, 1000.0, 3.0, 48_000);
        let l = integrated_loudness(&half, 2, 48_000).unwrap();
        assert!((l + 6.02).abs() < 0.1, "{l}");
    }

    #[test]
    fn silence_and_short_input_have_no_loudness() {
        assert_eq!(integrated_loudness(&vec![0.0; 48_000 * 2], 2, 48_000), None);
        let short = stereo_sine(0.5, 1000.0, 0.3, 48_000);
        assert_eq!(integrated_loudness(&short, 2, 48_000), None);
    }

    #[test]
    fn quiet_tail_is_gated_out() {
        let mut x = stereo_sine(0.5, 1000.0, 3.0, 48_000);
        x.extend(stereo_sine(0.001, 1000.0, 3.0, 48_000));
        let l = integrated_loudness(&x, 2, 48_000).unwrap();
        assert!((l + 6.02).abs() < 0.5, "{l}");
    }

    /// Filters whole channels into buffers and averages each 400 ms window directly.
    fn buffered_block_powers(samples: &[f32], ch: usize, rate: u32) -> Vec<f64> {
        let filters = k_weighting(rate);
        let frames = samples.len() / ch;
        let weighted: Vec<Vec<f64>> = (0..ch)
            .map(|c| {
                let mut st = [BiquadState::default(); 2];
                (0..frames)
                    .map(|i| {
                        let mut v = f64::from(samples[i * ch + c]);
                        for (f, fs) in filters.iter().zip(st.iter_mut()) {
                            v = f.process(fs, v);
                        }
                        v
                    })
                    .collect()
            })
            .collect();
        let step = (STEP_SECS * f64::from(rate)).round() as usize;
        let block = step * STEPS_PER_BLOCK;
        (0..)
            .map(|k| k * step)
            .take_while(|start| start + block <= frames)
            .map(|start| {
                let energy: f64 = weighted
                    .iter()
                    .map(|w| w[start..start + block].iter().map(|v| v * v).sum::<f64>())
                    .sum();
                energy / block as f64
            })
            .collect()
    }

    #[test]
    fn streaming_measurement_matches_buffered_blocks() {
        let rate = 48_000;
        let mut x = stereo_sine(0.5, 440.0, 2.0, rate);
        x.extend(stereo_sine(0.05, 3000.0, 1.5, rate));
        let powers = buffered_block_powers(&x, 2, rate);
        let loud = |p: f64| LOUDNESS_OFFSET + 10.0 * p.log10();
        let above: Vec<f64> = powers.into_iter().filter(|&p| loud(p) > ABSOLUTE_GATE_LUFS).collect();
        let gate = loud(mean(&above)) + RELATIVE_GATE_LU;
        let gated: Vec<f64> = above.into_iter().filter(|&p| loud(p) > gate).collect();
        let want = loud(mean(&gated));

        let got = integrated_loudness(&x, 2, rate).unwrap();
        assert!((got - want).abs() < 1e-9, "{got} vs {want}");
    }

    #[test]
    fn partial_trailing_step_is_ignored() {
        let full = stereo_sine(0.5, 1000.0, 3.0, 48_000);
        let mut longer = full.clone();
        // 50 ms more of a much louder signal never completes a step.
        longer.extend(stereo_sine(1.0, 200.0, 0.05, 48_000));
        assert_eq!(
            integrated_loudness(&full, 2, 48_000),
            integrated_loudness(&longer, 2, 48_000)
        );
    }

    #[test]
    fn gain_respects_boost_limit_and_peak_ceiling() {
        let opts = LoudnessOpts::default();
        assert!((normalization_gain_db(-20.0, 0.1, &opts) - 6.0).abs() < 1e-9);
        assert!((normalization_gain_db(-6.0, 0.5, &opts) + 8.0).abs() < 1e-9);
        assert!((normalization_gain_db(-60.0, 0.001, &opts) - 20.0).abs() < 1e-9);
        let g = normalization_gain_db(-30.0, 0.5, &opts);
        assert!((g - (-1.0 - gain_to_db(0.5))).abs() < 1e-9);
    }

    #[test]
    fn normalize_moves_sine_to_target() {
        let mut x = stereo_sine(0.1, 1000.0, 3.0, 48_000);
        let report = normalize_in_place(&mut x, 2, 48_000, &LoudnessOpts::default());
        assert!((report.gain_db - 6.0).abs() < 0.1);
        let after = integrated_loudness(&x, 2, 48_000).unwrap();
        assert!((after + 14.0).abs() < 0.1, "{after}");

        let mut silent = vec![0.0f32; 96_000];
        let report = normalize_in_place(&mut silent, 2, 48_000, &LoudnessOpts::default());
        assert_eq!(report.measured_lufs, None);
        assert_eq!(report.gain_db, 0.0);
    }
}
