use serde::{Deserialize, Serialize};
use std::f64::consts::E;

/// Element-wise activation used by the hidden and output layers.
///
/// `derivative` takes the *activated* output `y = activate(x)`, not the raw
/// weighted sum. The backward pass only keeps outputs around, so every
/// variant must express its slope in terms of `y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    #[default]
    Sigmoid,
    Tanh,
    Identity,
}

impl ActivationFunction {
    pub fn activate(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
        }
    }

    /// Slope at an already-activated output `y`.
    pub fn derivative(&self, y: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => y * (1.0 - y),
            ActivationFunction::Tanh => 1.0 - y * y,
            ActivationFunction::Identity => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn sigmoid_midpoint() {
        let f = ActivationFunction::Sigmoid;
        assert!((f.activate(0.0) - 0.5).abs() < EPS);
        assert!((f.derivative(0.5) - 0.25).abs() < EPS);
    }

    #[test]
    fn sigmoid_is_increasing_and_bounded() {
        let f = ActivationFunction::Sigmoid;
        let mut prev = f.activate(-20.0);
        let mut x = -20.0;
        while x < 20.0 {
            x += 0.5;
            let y = f.activate(x);
            assert!(y > prev, "not increasing at x = {x}");
            assert!(y > 0.0 && y < 1.0);
            prev = y;
        }
    }

    #[test]
    fn derivatives_match_numeric_slope() {
        let h = 1e-6;
        for f in [ActivationFunction::Sigmoid, ActivationFunction::Tanh, ActivationFunction::Identity] {
            for &x in &[-2.0, -0.3, 0.0, 0.7, 1.9] {
                let numeric = (f.activate(x + h) - f.activate(x - h)) / (2.0 * h);
                let analytic = f.derivative(f.activate(x));
                assert!((numeric - analytic).abs() < 1e-6, "{f:?} at {x}");
            }
        }
    }
}
