/// Serial effect processing
///
/// A filter stage is an `EffectChain`: `source -> effect 1 -> ... -> effect N -> output`.
use std::fmt;

/// An in-place audio processor
///
/// `process()` runs on the render path: no allocation, no blocking.
pub trait AudioEffect: Send {
    /// Process interleaved stereo samples (L, R, L, R, ...) in place
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32);

    /// Clear internal history (seek, track change)
    fn reset(&mut self);

    /// Enable/disable the effect; a disabled effect is skipped by the chain
    fn set_enabled(&mut self, enabled: bool);

    /// Check if effect is enabled
    fn is_enabled(&self) -> bool;

    /// Effect name (for logging)
    fn name(&self) -> &str;
}

/// Effects processed in insertion order
#[derive(Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn AudioEffect>>,
}

impl EffectChain {
    /// Create an empty chain (pass-through)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain with room for `capacity` effects
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            effects: Vec::with_capacity(capacity),
        }
    }

    /// Append an effect to the end of the chain
    pub fn push(&mut self, effect: Box<dyn AudioEffect>) {
        self.effects.push(effect);
    }

    /// Run the buffer through every enabled effect in order
    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        for effect in &mut self.effects {
            if effect.is_enabled() {
                effect.process(buffer, sample_rate);
            }
        }
    }

    /// Reset every effect
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Number of effects
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether the chain is a pass-through
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect at `index`
    pub fn get(&self, index: usize) -> Option<&dyn AudioEffect> {
        self.effects.get(index).map(|e| e.as_ref())
    }

    /// Effect names in processing order
    pub fn names(&self) -> Vec<&str> {
        self.effects.iter().map(|e| e.name()).collect()
    }

    /// Enable/disable every effect
    pub fn set_enabled(&mut self, enabled: bool) {
        for effect in &mut self.effects {
            effect.set_enabled(enabled);
        }
    }
}

impl fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectChain")
            .field("effects", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scale {
        factor: f32,
        enabled: bool,
        label: &'static str,
    }

    impl Scale {
        fn boxed(factor: f32, label: &'static str) -> Box<dyn AudioEffect> {
            Box::new(Self {
                factor,
                enabled: true,
                label,
            })
        }
    }

    impl AudioEffect for Scale {
        fn process(&mut self, buffer: &mut [f32], _sample_rate: u32) {
            for sample in buffer.iter_mut() {
                *sample *= self.factor;
            }
        }

        fn reset(&mut self) {}

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    #[test]
    fn empty_chain_passes_through() {
        let mut chain = EffectChain::new();
        let mut buffer = vec![0.5, -0.5];
        chain.process(&mut buffer, 44_100);
        assert_eq!(buffer, vec![0.5, -0.5]);
    }

    #[test]
    fn effects_apply_in_series() {
        let mut chain = EffectChain::with_capacity(2);
        chain.push(Scale::boxed(0.5, "half"));
        chain.push(Scale::boxed(0.5, "half again"));

        let mut buffer = vec![1.0, 1.0];
        chain.process(&mut buffer, 44_100);

        assert_eq!(buffer, vec![0.25, 0.25]);
        assert_eq!(chain.names(), vec!["half", "half again"]);
    }

    #[test]
    fn disabled_effects_are_skipped() {
        let mut chain = EffectChain::new();
        chain.push(Scale::boxed(0.0, "mute"));
        chain.set_enabled(false);

        let mut buffer = vec![0.8, 0.8];
        chain.process(&mut buffer, 44_100);
        assert_eq!(buffer, vec![0.8, 0.8]);
        assert!(!chain.get(0).unwrap().is_enabled());
    }
}
