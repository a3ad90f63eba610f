//! Waveform to log-mel spectrogram.
//!
//! The magnitude spectrogram uses a Hamming window, hop `window_size - overlap`,
//! no detrending and no edge padding, and is scaled by `1 / sqrt(sum(w^2))`
//! (density scaling at unit sampling frequency). Frames are projected onto a
//! mel filterbank spanning 20 Hz to `sample_rate / 2` and compressed with
//! `ln(x + 1e-8)`.

use std::sync::Arc;

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::mel::{hamming_window, mel_filterbank};
use crate::config::ExtractionConfig;
use crate::error::FeatureError;

pub const MEL_FMIN: f64 = 20.0;
const LOG_OFFSET: f64 = 1e-8;

/// Precomputed window, filterbank and FFT plan. Stateless per call, so one
/// extractor can be shared across threads.
pub struct LogMelExtractor {
    window_size: usize,
    hop: usize,
    window: Vec<f64>,
    scale: f64,
    mel_basis: Array2<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl LogMelExtractor {
    pub fn new(cfg: &ExtractionConfig) -> Result<Self, FeatureError> {
        cfg.validate()?;

        let window = hamming_window(cfg.window_size);
        let scale = 1.0 / window.iter().map(|w| w * w).sum::<f64>().sqrt();
        let fmax = (cfg.sample_rate / 2) as f64;
        let mel_basis = mel_filterbank(cfg.sample_rate, cfg.window_size, cfg.mel_bins, MEL_FMIN, fmax);
        let fft = FftPlanner::<f64>::new().plan_fft_forward(cfg.window_size);

        Ok(Self {
            window_size: cfg.window_size,
            hop: cfg.hop(),
            window,
            scale,
            mel_basis,
            fft,
        })
    }

    pub fn mel_bins(&self) -> usize {
        self.mel_basis.nrows()
    }

    /// The `(mel_bins, window_size / 2 + 1)` filterbank.
    pub fn mel_basis(&self) -> &Array2<f64> {
        &self.mel_basis
    }

    /// Frames produced for `n_samples` input samples (0 when shorter than one window).
    pub fn num_frames(&self, n_samples: usize) -> usize {
        if n_samples < self.window_size {
            0
        } else {
            (n_samples - self.window_size) / self.hop + 1
        }
    }

    /// One-sided magnitude spectrogram, `(frames, window_size / 2 + 1)`.
    pub fn magnitude_spectrogram(&self, waveform: &[f32]) -> Result<Array2<f64>, FeatureError> {
        let n_frames = self.num_frames(waveform.len());
        if n_frames == 0 {
            return Err(FeatureError::AudioTooShort {
                min_samples: self.window_size,
                got_samples: waveform.len(),
            });
        }

        let n_freqs = self.window_size / 2 + 1;
        let mut spec = Array2::<f64>::zeros((n_frames, n_freqs));
        let mut buf = vec![Complex::new(0.0, 0.0); self.window_size];

        for (t, mut row) in spec.rows_mut().into_iter().enumerate() {
            let frame = &waveform[t * self.hop..t * self.hop + self.window_size];
            for ((slot, &s), &w) in buf.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(s as f64 * w, 0.0);
            }
            self.fft.process(&mut buf);
            for (out, c) in row.iter_mut().zip(&buf) {
                *out = c.norm() * self.scale;
            }
        }
        Ok(spec)
    }

    /// Log-mel frames, `(frames, mel_bins)`.
    pub fn transform(&self, waveform: &[f32]) -> Result<Array2<f32>, FeatureError> {
        let spec = self.magnitude_spectrogram(waveform)?;
        let mel = spec.dot(&self.mel_basis.t());
        Ok(mel.mapv(|v| (v + LOG_OFFSET).ln() as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mel::mel_frequencies;
    use std::f64::consts::PI;

    fn small_config() -> ExtractionConfig {
        ExtractionConfig {
            sample_rate: 16_000,
            window_size: 512,
            overlap: 256,
            seq_len: 64,
            mel_bins: 40,
        }
    }

    fn sine(freq: f64, n: usize, sr: f64) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sr).sin() as f32)
            .collect()
    }

    #[test]
    fn frame_count_follows_hop() {
        let ex = LogMelExtractor::new(&small_config()).unwrap();
        let frames = ex.transform(&sine(440.0, 16_000, 16_000.0)).unwrap();
        // (16000 - 512) / 256 + 1
        assert_eq!(frames.dim(), (61, 40));
        assert!(frames.iter().all(|v| v.is_finite()));
        assert_eq!(ex.num_frames(511), 0);
        assert_eq!(ex.num_frames(512), 1);
    }

    #[test]
    fn silence_hits_log_floor() {
        let ex = LogMelExtractor::new(&small_config()).unwrap();
        let frames = ex.transform(&vec![0.0; 2048]).unwrap();
        let floor = (1e-8f64).ln() as f32;
        assert!(frames.iter().all(|&v| (v - floor).abs() < 1e-4));
    }

    #[test]
    fn short_input_is_rejected() {
        let ex = LogMelExtractor::new(&small_config()).unwrap();
        let err = ex.transform(&[0.1; 100]).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::AudioTooShort { min_samples: 512, got_samples: 100 }
        ));
    }

    #[test]
    fn tone_energy_lands_near_its_mel_band() {
        let cfg = small_config();
        let ex = LogMelExtractor::new(&cfg).unwrap();
        let frames = ex.transform(&sine(1000.0, 8000, 16_000.0)).unwrap();

        let mean = frames.mean_axis(ndarray::Axis(0)).unwrap();
        let loudest = mean
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (m, &v)| if v > best.1 { (m, v) } else { best })
            .0;
        let centers = mel_frequencies(cfg.mel_bins + 2, MEL_FMIN, 8000.0);
        assert!((centers[loudest + 1] - 1000.0).abs() < 150.0);
    }

    #[test]
    fn unit_dc_magnitude_matches_scaling() {
        let ex = LogMelExtractor::new(&small_config()).unwrap();
        let spec = ex.magnitude_spectrogram(&vec![1.0; 512]).unwrap();
        let w = hamming_window(512);
        let expected = w.iter().sum::<f64>() / w.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((spec[[0, 0]] - expected).abs() < 1e-9);
    }

    #[test]
    fn sine_frame_reference_values() {
        let ex = LogMelExtractor::new(&small_config()).unwrap();
        let tone: Vec<f32> = (0..512)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / 16_000.0).sin() as f32)
            .collect();
        let frames = ex.transform(&tone).unwrap();
        assert_eq!(frames.dim(), (1, 40));

        let expected = [
            (5, -13.408187f32),
            (11, -6.819378),
            (12, -1.938429),
            (13, -2.390580),
        ];
        for (m, v) in expected {
            assert!((frames[[0, m]] - v).abs() < 1e-3, "mel bin {m}: {}", frames[[0, m]]);
        }
    }
}
