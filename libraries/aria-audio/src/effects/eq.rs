/// Equalizer bands
///
/// One biquad per band. Band frequency is fixed for the lifetime of the band;
/// gain and Q are clamped on every write.
use super::chain::AudioEffect;

/// Lowest accepted band gain
pub const MIN_GAIN_DB: f32 = -12.0;

/// Highest accepted band gain
pub const MAX_GAIN_DB: f32 = 12.0;

const MIN_Q: f32 = 0.1;
const MAX_Q: f32 = 10.0;

/// Filter shape for a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Boosts/cuts below the frequency
    LowShelf,
    /// Boosts/cuts around the frequency with Q bandwidth
    #[default]
    Peaking,
    /// Boosts/cuts above the frequency
    HighShelf,
}

/// One equalizer band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqBand {
    frequency_hz: f32,
    gain_db: f32,
    q: f32,
    filter_type: FilterType,
}

impl EqBand {
    /// Create a band; gain is clamped to -12..=12 dB, Q to 0.1..=10
    pub fn new(frequency_hz: f32, gain_db: f32, q: f32, filter_type: FilterType) -> Self {
        Self {
            frequency_hz,
            gain_db: gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB),
            q: q.clamp(MIN_Q, MAX_Q),
            filter_type,
        }
    }

    /// Peaking band
    pub fn peaking(frequency_hz: f32, gain_db: f32, q: f32) -> Self {
        Self::new(frequency_hz, gain_db, q, FilterType::Peaking)
    }

    /// Center (or corner) frequency
    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    /// Gain in dB
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Set the gain (clamped)
    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
    }

    /// Q factor
    pub fn q(&self) -> f32 {
        self.q
    }

    /// Set the Q factor (clamped)
    pub fn set_q(&mut self, q: f32) {
        self.q = q.clamp(MIN_Q, MAX_Q);
    }

    /// Filter shape
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// A 0 dB band leaves the signal untouched
    pub fn is_flat(&self) -> bool {
        self.gain_db.abs() < f32::EPSILON
    }
}

/// Per-sample coefficient smoothing factor (~3 ms at 44.1 kHz)
const SMOOTH_COEFF: f32 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    const NEUTRAL: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    fn approach(&mut self, target: &Self) {
        self.b0 += SMOOTH_COEFF * (target.b0 - self.b0);
        self.b1 += SMOOTH_COEFF * (target.b1 - self.b1);
        self.b2 += SMOOTH_COEFF * (target.b2 - self.b2);
        self.a1 += SMOOTH_COEFF * (target.a1 - self.a1);
        self.a2 += SMOOTH_COEFF * (target.a2 - self.a2);
    }

    /// RBJ cookbook coefficients for a band at `sample_rate`
    fn for_band(band: &EqBand, sample_rate: f32) -> Self {
        let a = 10.0_f32.powf(band.gain_db / 40.0);
        // Keep clear of Nyquist
        let frequency = band.frequency_hz.min(sample_rate * 0.45);
        let omega = 2.0 * std::f32::consts::PI * frequency / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();

        match band.filter_type {
            FilterType::Peaking => {
                let alpha = sin_omega / (2.0 * band.q);
                Self::normalized(
                    1.0 + alpha * a,
                    -2.0 * cos_omega,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_omega,
                    1.0 - alpha / a,
                )
            }
            FilterType::LowShelf => {
                let alpha =
                    sin_omega / 2.0 * ((a + 1.0 / a) * (1.0 / band.q - 1.0) + 2.0).sqrt();
                let beta = 2.0 * a.sqrt() * alpha;
                Self::normalized(
                    a * ((a + 1.0) - (a - 1.0) * cos_omega + beta),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega),
                    a * ((a + 1.0) - (a - 1.0) * cos_omega - beta),
                    (a + 1.0) + (a - 1.0) * cos_omega + beta,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega),
                    (a + 1.0) + (a - 1.0) * cos_omega - beta,
                )
            }
            FilterType::HighShelf => {
                let alpha =
                    sin_omega / 2.0 * ((a + 1.0 / a) * (1.0 / band.q - 1.0) + 2.0).sqrt();
                let beta = 2.0 * a.sqrt() * alpha;
                Self::normalized(
                    a * ((a + 1.0) + (a - 1.0) * cos_omega + beta),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega),
                    a * ((a + 1.0) + (a - 1.0) * cos_omega - beta),
                    (a + 1.0) - (a - 1.0) * cos_omega + beta,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_omega),
                    (a + 1.0) - (a - 1.0) * cos_omega - beta,
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl ChannelState {
    #[inline]
    fn step(&mut self, c: &Coefficients, input: f32) -> f32 {
        let mut out = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        // Flush denormals
        if out.abs() < 1e-15 {
            out = 0.0;
        }

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }
}

/// Stereo biquad realizing one `EqBand`
///
/// Coefficients are computed for the first sample rate seen and snapped into
/// place; later sample-rate changes glide toward the new target.
#[derive(Debug, Clone)]
pub struct BandFilter {
    band: EqBand,
    label: String,
    enabled: bool,
    sample_rate: u32,
    active: Coefficients,
    target: Coefficients,
    left: ChannelState,
    right: ChannelState,
}

impl BandFilter {
    /// Create a filter for `band`
    pub fn new(band: EqBand) -> Self {
        Self {
            label: format!("eq-{}hz", band.frequency_hz),
            band,
            enabled: true,
            sample_rate: 0,
            active: Coefficients::NEUTRAL,
            target: Coefficients::NEUTRAL,
            left: ChannelState::default(),
            right: ChannelState::default(),
        }
    }

    /// Band this filter realizes
    pub fn band(&self) -> &EqBand {
        &self.band
    }

    fn configure(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate || sample_rate == 0 {
            return;
        }
        let first = self.sample_rate == 0;
        self.sample_rate = sample_rate;
        self.target = Coefficients::for_band(&self.band, sample_rate as f32);
        if first {
            self.active = self.target;
        }
    }
}

impl AudioEffect for BandFilter {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        self.configure(sample_rate);
        if self.sample_rate == 0 {
            return;
        }

        for frame in buffer.chunks_exact_mut(2) {
            self.active.approach(&self.target);
            frame[0] = self.left.step(&self.active, frame[0]);
            frame[1] = self.right.step(&self.active, frame[1]);
        }
    }

    fn reset(&mut self) {
        self.left = ChannelState::default();
        self.right = ChannelState::default();
        self.active = self.target;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        &self.label
    }
}
