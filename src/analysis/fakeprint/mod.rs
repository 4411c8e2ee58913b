// Fakeprint - normalized high-frequency spectral fingerprint
//
// Module organization:
// - stft: band-limited, time-averaged magnitude spectrum (SpectralProfile)
// - hull: lower convex hull baseline removal
// - mod.rs: Coordinator (FakeprintExtractor)

pub mod hull;
pub mod stft;

pub use stft::{SpectralProfile, SpectralTransformer};

use crate::error::AnalysisError;

/// Floor for the total-energy denominator of the HF ratio
const ENERGY_EPSILON: f64 = 1e-10;

/// Output of the spectral stages
#[derive(Debug, Clone, PartialEq)]
pub struct Fakeprint {
    /// Hull-normalized residuals, one per in-band bin
    pub values: Vec<f64>,
    /// Band energy divided by total energy across all bins
    pub hf_energy_ratio: f64,
}

impl Fakeprint {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// FakeprintExtractor runs the spectral transform followed by hull normalization
pub struct FakeprintExtractor {
    transformer: SpectralTransformer,
}

impl FakeprintExtractor {
    /// # Errors
    /// `EmptyBand` if the band has no bins at this sample rate and FFT size.
    pub fn new(
        sample_rate: u32,
        fft_size: usize,
        fmin: f64,
        fmax: f64,
    ) -> Result<Self, AnalysisError> {
        Ok(Self {
            transformer: SpectralTransformer::new(sample_rate, fft_size, fmin, fmax)?,
        })
    }

    pub fn transformer(&self) -> &SpectralTransformer {
        &self.transformer
    }

    /// Compute the fakeprint of a mono waveform
    pub fn extract(&self, waveform: &[f32]) -> Result<Fakeprint, AnalysisError> {
        let profile = self.transformer.transform(waveform)?;
        tracing::debug!(
            "[Fakeprint] Profile: {} bins from {:.1} Hz, band_energy={:.3e}, total_energy={:.3e}",
            profile.len(),
            self.transformer.band_start_hz(),
            profile.band_energy,
            profile.total_energy
        );
        Ok(Self::from_profile(&profile))
    }

    /// Normalize an already computed profile
    pub fn from_profile(profile: &SpectralProfile) -> Fakeprint {
        Fakeprint {
            values: hull::normalize(&profile.magnitudes),
            hf_energy_ratio: profile.band_energy / profile.total_energy.max(ENERGY_EPSILON),
        }
    }
}
