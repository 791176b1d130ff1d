//! No-input finite-state generators: colour cycle and half-sine oscillator.

use std::f64::consts::FRAC_PI_2;

/// A generator advanced one tick at a time. `step()` commits the next state
/// and returns the output; the sequence is a pure function of the start
/// state and the call count, so runs are replayable.
pub trait Stepper {
    type Output;

    /// Reset internal state to the fixed initial value.
    fn start(&mut self);

    /// Advance one tick and return the output.
    fn step(&mut self) -> Self::Output;
}

/// Block colours. The palette is cosmetic; three entries keep consecutive
/// blocks visually distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockColor {
    Red,
    Green,
    Blue,
}

/// Fixed 3-cycle Red → Green → Blue → Red. The transition is its own output.
#[derive(Debug, Clone)]
pub struct ColorCycle {
    state: BlockColor,
}

impl ColorCycle {
    pub fn new() -> Self {
        let mut c = Self {
            state: BlockColor::Red,
        };
        c.start();
        c
    }
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Stepper for ColorCycle {
    type Output = BlockColor;

    fn start(&mut self) {
        self.state = BlockColor::Red;
    }

    fn step(&mut self) -> BlockColor {
        self.state = match self.state {
            BlockColor::Red => BlockColor::Green,
            BlockColor::Green => BlockColor::Blue,
            BlockColor::Blue => BlockColor::Red,
        };
        self.state
    }
}

/// Phase extreme; the half-swing from one extreme to the other spans 21 ticks.
pub const PHASE_MAX: i32 = 10;
/// Amplitude coefficient clamp range. The coefficient doubles as the
/// difficulty dial, so the range bounds how wild the sway can get.
pub const MIN_COEFF: f64 = 2.0;
pub const MAX_COEFF: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Left,
}

/// Half-sine speed profile: displacement per tick is
/// `coeff * cos(pi/2 * phase / PHASE_MAX)`, signed by direction. Speed is
/// near zero at the swing extremes and maximal at phase 0, which gives the
/// drift a smooth ease-in/ease-out feel.
#[derive(Debug, Clone)]
pub struct Oscillator {
    direction: Direction,
    phase: i32,
    coeff: f64,
}

impl Oscillator {
    /// New oscillator at the initial state with the given amplitude
    /// coefficient (clamped).
    pub fn new(coeff: f64) -> Self {
        let mut o = Self {
            direction: Direction::Right,
            phase: 0,
            coeff: coeff.clamp(MIN_COEFF, MAX_COEFF),
        };
        o.start();
        o
    }

    pub fn coeff(&self) -> f64 {
        self.coeff
    }

    /// Multiply the amplitude coefficient, clamping into
    /// [`MIN_COEFF`, `MAX_COEFF`]. An update that would leave the range is
    /// recovered here, never surfaced.
    pub fn scale_coeff(&mut self, factor: f64) {
        self.coeff = (self.coeff * factor).clamp(MIN_COEFF, MAX_COEFF);
    }

    /// Replace the coefficient outright (clamped). Used on game restart.
    pub fn set_coeff(&mut self, coeff: f64) {
        self.coeff = coeff.clamp(MIN_COEFF, MAX_COEFF);
    }
}

impl Stepper for Oscillator {
    type Output = f64;

    /// Reset phase and direction; the coefficient is left alone so a
    /// respawned block keeps the current difficulty.
    fn start(&mut self) {
        self.direction = Direction::Right;
        self.phase = 0;
    }

    fn step(&mut self) -> f64 {
        let angle = (FRAC_PI_2 / f64::from(PHASE_MAX)) * f64::from(self.phase);
        let raw = self.coeff * angle.cos();
        let output = match self.direction {
            Direction::Right => raw,
            Direction::Left => -raw,
        };
        match self.direction {
            Direction::Right => {
                if self.phase >= PHASE_MAX {
                    self.direction = Direction::Left;
                    self.phase -= 1;
                } else {
                    self.phase += 1;
                }
            }
            Direction::Left => {
                if self.phase <= -PHASE_MAX {
                    self.direction = Direction::Right;
                    self.phase += 1;
                } else {
                    self.phase -= 1;
                }
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_cycle_is_a_3_cycle() {
        let mut c = ColorCycle::new();
        assert_eq!(c.step(), BlockColor::Green);
        assert_eq!(c.step(), BlockColor::Blue);
        assert_eq!(c.step(), BlockColor::Red);
        assert_eq!(c.step(), BlockColor::Green);
    }

    #[test]
    fn oscillator_is_deterministic() {
        let mut a = Oscillator::new(6.0);
        let mut b = Oscillator::new(6.0);
        let seq_a: Vec<f64> = (0..200).map(|_| a.step()).collect();
        let seq_b: Vec<f64> = (0..200).map(|_| b.step()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn oscillator_output_bounded_by_coeff() {
        let mut o = Oscillator::new(9.5);
        for _ in 0..500 {
            assert!(o.step().abs() <= 9.5 + 1e-12);
        }
    }

    #[test]
    fn oscillator_first_step_is_full_amplitude() {
        // phase 0, cos(0) = 1
        let mut o = Oscillator::new(5.0);
        assert!((o.step() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn oscillator_flips_direction_at_phase_extremes() {
        let mut o = Oscillator::new(4.0);
        // Ticks 0..=PHASE_MAX move right (non-negative output); the next
        // tick is the first of the leftward swing.
        for _ in 0..=PHASE_MAX {
            assert!(o.step() >= 0.0);
        }
        // Leftward swing: output is -coeff*cos(angle) with phase still
        // positive, so it goes negative once cos is non-zero.
        let after_flip: Vec<f64> = (0..PHASE_MAX).map(|_| o.step()).collect();
        assert!(after_flip.iter().any(|v| *v < 0.0));
        assert!(after_flip.iter().all(|v| *v <= 1e-12));
    }

    #[test]
    fn oscillator_restart_replays_identically() {
        let mut o = Oscillator::new(7.0);
        let first: Vec<f64> = (0..50).map(|_| o.step()).collect();
        o.start();
        let second: Vec<f64> = (0..50).map(|_| o.step()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn coeff_clamped_under_repeated_growth() {
        let mut o = Oscillator::new(6.0);
        for _ in 0..100 {
            o.scale_coeff(1.15);
        }
        assert!((o.coeff() - MAX_COEFF).abs() < 1e-12);
    }

    #[test]
    fn coeff_clamped_under_repeated_shrink() {
        let mut o = Oscillator::new(6.0);
        for _ in 0..100 {
            o.scale_coeff(0.9);
        }
        assert!((o.coeff() - MIN_COEFF).abs() < 1e-12);
    }

    #[test]
    fn set_coeff_clamps_out_of_range_values() {
        let mut o = Oscillator::new(6.0);
        o.set_coeff(100.0);
        assert!((o.coeff() - MAX_COEFF).abs() < 1e-12);
        o.set_coeff(0.0);
        assert!((o.coeff() - MIN_COEFF).abs() < 1e-12);
    }
}
