//! Equalizer graph
//!
//! `EqualizerGraph` owns the band settings and produces `FilterStage`s. A
//! stage is built off to the side and only swapped into the renderer once
//! complete, so the decoder/source connection is never torn down.
//!
//! Rebuilds are numbered. `begin_rebuild()` hands out a ticket with the next
//! generation; `attach()` accepts a stage only if no newer ticket has been
//! issued since. Last rebuild wins.

use serde::{Deserialize, Serialize};

use crate::effects::{AudioEffect, BandFilter, EffectChain, EqBand, FilterType};
use crate::error::{AudioError, Result};

/// Band centers in fixed order (ISO octave bands)
pub const DEFAULT_BAND_FREQUENCIES: [f32; 10] = [
    32.0, 64.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Q of every default band (one octave)
pub const DEFAULT_BAND_Q: f32 = 1.41;

/// Equalizer band settings
///
/// Persisted as the list of gains in band order; frequencies and filter
/// shapes are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f32>", try_from = "Vec<f32>")]
pub struct EqualizerSettings {
    bands: Vec<EqBand>,
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        let last = DEFAULT_BAND_FREQUENCIES.len() - 1;
        let bands = DEFAULT_BAND_FREQUENCIES
            .iter()
            .enumerate()
            .map(|(i, &frequency)| {
                let filter_type = match i {
                    0 => FilterType::LowShelf,
                    i if i == last => FilterType::HighShelf,
                    _ => FilterType::Peaking,
                };
                EqBand::new(frequency, 0.0, DEFAULT_BAND_Q, filter_type)
            })
            .collect();
        Self { bands }
    }
}

impl EqualizerSettings {
    /// Default bands with the given gains
    ///
    /// # Errors
    /// Fails if `gains` does not have one entry per band or holds a non-finite value
    pub fn from_gains(gains: &[f32]) -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_gains(gains)?;
        Ok(settings)
    }

    /// Bands in processing order
    pub fn bands(&self) -> &[EqBand] {
        &self.bands
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Gains in band order
    pub fn gains(&self) -> Vec<f32> {
        self.bands.iter().map(EqBand::gain_db).collect()
    }

    /// Whether every band sits at 0 dB
    pub fn is_flat(&self) -> bool {
        self.bands.iter().all(EqBand::is_flat)
    }

    /// Set one band's gain (clamped to -12..=12 dB)
    pub fn set_gain(&mut self, band: usize, gain_db: f32) -> Result<()> {
        if !gain_db.is_finite() {
            return Err(AudioError::NonFiniteGain(gain_db));
        }
        let count = self.bands.len();
        let target = self
            .bands
            .get_mut(band)
            .ok_or(AudioError::BandOutOfRange { index: band, count })?;
        target.set_gain_db(gain_db);
        Ok(())
    }

    /// Set one band's Q factor (clamped to 0.1..=10)
    pub fn set_q(&mut self, band: usize, q: f32) -> Result<()> {
        if !q.is_finite() {
            return Err(AudioError::NonFiniteQ(q));
        }
        let count = self.bands.len();
        let target = self
            .bands
            .get_mut(band)
            .ok_or(AudioError::BandOutOfRange { index: band, count })?;
        target.set_q(q);
        Ok(())
    }

    /// Set every gain at once; nothing changes if validation fails
    pub fn apply_gains(&mut self, gains: &[f32]) -> Result<()> {
        if gains.len() != self.bands.len() {
            return Err(AudioError::GainCountMismatch {
                expected: self.bands.len(),
                actual: gains.len(),
            });
        }
        if let Some(bad) = gains.iter().find(|g| !g.is_finite()) {
            return Err(AudioError::NonFiniteGain(*bad));
        }
        for (band, gain) in self.bands.iter_mut().zip(gains) {
            band.set_gain_db(*gain);
        }
        Ok(())
    }
}

impl From<EqualizerSettings> for Vec<f32> {
    fn from(settings: EqualizerSettings) -> Self {
        settings.gains()
    }
}

impl TryFrom<Vec<f32>> for EqualizerSettings {
    type Error = AudioError;

    fn try_from(gains: Vec<f32>) -> Result<Self> {
        Self::from_gains(&gains)
    }
}

/// A complete serial filter chain: `source -> band 1 -> ... -> band N -> output`
#[derive(Debug)]
pub struct FilterStage {
    generation: u64,
    bands: Vec<EqBand>,
    chain: EffectChain,
}

impl FilterStage {
    /// Rebuild generation this stage belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of band filters
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the stage is a pass-through
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Bands the stage was built from, in processing order
    pub fn bands(&self) -> &[EqBand] {
        &self.bands
    }

    /// Filter names in processing order
    pub fn filter_names(&self) -> Vec<&str> {
        self.chain.names()
    }

    /// Process interleaved stereo samples in place
    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.chain.process(buffer, sample_rate);
    }

    /// Clear filter history
    pub fn reset(&mut self) {
        self.chain.reset();
    }
}

/// Frozen settings for one rebuild
#[derive(Debug, Clone)]
pub struct RebuildTicket {
    generation: u64,
    bands: Vec<EqBand>,
}

impl RebuildTicket {
    /// Generation of the stage this ticket builds
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build the stage; flat bands are skipped
    pub fn build(self) -> FilterStage {
        let bands: Vec<EqBand> = self.bands.into_iter().filter(|b| !b.is_flat()).collect();
        let mut chain = EffectChain::with_capacity(bands.len());
        for band in &bands {
            chain.push(Box::new(BandFilter::new(*band)) as Box<dyn AudioEffect>);
        }
        FilterStage {
            generation: self.generation,
            bands,
            chain,
        }
    }
}

/// Equalizer settings plus rebuild bookkeeping
#[derive(Debug, Clone, Default)]
pub struct EqualizerGraph {
    settings: EqualizerSettings,
    latest_generation: u64,
    attached_generation: Option<u64>,
}

impl EqualizerGraph {
    /// Flat default bands
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from persisted settings
    pub fn with_settings(settings: EqualizerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Current settings
    pub fn settings(&self) -> &EqualizerSettings {
        &self.settings
    }

    /// Current gains in band order
    pub fn gains(&self) -> Vec<f32> {
        self.settings.gains()
    }

    /// Set one band's gain
    pub fn set_gain(&mut self, band: usize, gain_db: f32) -> Result<()> {
        self.settings.set_gain(band, gain_db)
    }

    /// Set one band's Q factor
    pub fn set_q(&mut self, band: usize, q: f32) -> Result<()> {
        self.settings.set_q(band, q)
    }

    /// Replace every gain
    pub fn set_gains(&mut self, gains: &[f32]) -> Result<()> {
        self.settings.apply_gains(gains)
    }

    /// Flatten every band
    pub fn reset(&mut self) {
        self.settings = EqualizerSettings::default();
    }

    /// Issue a ticket for the next generation
    pub fn begin_rebuild(&mut self) -> RebuildTicket {
        self.latest_generation += 1;
        RebuildTicket {
            generation: self.latest_generation,
            bands: self.settings.bands().to_vec(),
        }
    }

    /// Accept a finished stage for attachment
    ///
    /// # Errors
    /// `StaleStage` if a newer rebuild began after this stage's ticket
    pub fn attach(&mut self, stage: FilterStage) -> Result<FilterStage> {
        if stage.generation != self.latest_generation {
            tracing::debug!(
                stage = stage.generation,
                latest = self.latest_generation,
                "Discarding stale filter stage"
            );
            return Err(AudioError::StaleStage {
                stage: stage.generation,
                latest: self.latest_generation,
            });
        }
        self.attached_generation = Some(stage.generation);
        Ok(stage)
    }

    /// Build and accept a stage in one step
    pub fn rebuild(&mut self) -> FilterStage {
        let stage = self.begin_rebuild().build();
        self.attached_generation = Some(stage.generation);
        stage
    }

    /// Generation of the most recently accepted stage
    pub fn attached_generation(&self) -> Option<u64> {
        self.attached_generation
    }

    /// Generation of the most recently issued ticket
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }
}
