//! Sine oscillator driving a ribbon's lateral displacement.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Oscillator {
    pub amplitude: f32,
    /// Phase advance per frame, in radians.
    pub frequency: f32,
    pub phase: f32,
}

impl Oscillator {
    pub fn new(amplitude: f32, frequency: f32, phase: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase: phase.rem_euclid(TAU),
        }
    }

    /// Current output without advancing.
    pub fn value(&self) -> f32 {
        self.amplitude * self.phase.sin()
    }

    /// Return the current output, then advance the phase by one frame.
    pub fn update(&mut self) -> f32 {
        let value = self.value();
        self.phase = (self.phase + self.frequency).rem_euclid(TAU);
        value
    }

    pub fn decay(&mut self, factor: f32) {
        self.amplitude *= factor;
    }

    /// Move amplitude a fraction `rate` of the way to `target`.
    pub fn approach_amplitude(&mut self, target: f32, rate: f32) {
        self.amplitude += (target - self.amplitude) * rate;
    }

    /// Move frequency a fraction `rate` of the way to `target`.
    pub fn approach_frequency(&mut self, target: f32, rate: f32) {
        self.frequency += (target - self.frequency) * rate;
    }

    /// Hold the phase still at `phase`.
    pub fn pin(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(TAU);
        self.frequency = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_update_returns_then_advances() {
        let mut osc = Oscillator::new(2.0, FRAC_PI_2, 0.0);

        assert_eq!(osc.update(), 0.0);
        assert!((osc.update() - 2.0).abs() < 1e-5);
        assert!((osc.phase - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_pinned_phase_holds_value() {
        let mut osc = Oscillator::new(3.0, 0.5, 1.0);
        osc.pin(FRAC_PI_2);

        for _ in 0..5 {
            assert!((osc.update() - 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_decay_and_approach() {
        let mut osc = Oscillator::new(10.0, 0.0, 0.0);
        osc.decay(0.5);
        assert_eq!(osc.amplitude, 5.0);

        osc.approach_amplitude(15.0, 0.1);
        assert!((osc.amplitude - 6.0).abs() < 1e-5);

        osc.approach_frequency(1.0, 0.5);
        assert!((osc.frequency - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_phase_wraps() {
        let mut osc = Oscillator::new(1.0, 4.0, 0.0);
        for _ in 0..10 {
            osc.update();
            assert!((0.0..TAU).contains(&osc.phase));
        }
    }
}
