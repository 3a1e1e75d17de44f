use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::{ConvNetError, Result};

#[derive(Clone, Debug, Default, PartialEq)]
pub enum WeightInit {
    Xavier,             // Good for tanh activation
    #[default]
    He,                 // Good for ReLU activation
    LeCun,              // Good for SELU activation
    UniformRandom {     // Simple uniform random in range
        min: f64,
        max: f64,
    },
    Constant(f64),
}

impl WeightInit {
    pub fn validate(&self) -> Result<()> {
        match self {
            WeightInit::UniformRandom { min, max }
                if !min.is_finite() || !max.is_finite() || min >= max =>
            {
                Err(ConvNetError::DegenerateConfig(format!(
                    "uniform weight range [{}, {}) is empty or unbounded",
                    min, max
                )))
            }
            WeightInit::Constant(value) if !value.is_finite() => Err(
                ConvNetError::DegenerateConfig(format!("constant weight {} is not finite", value)),
            ),
            _ => Ok(()),
        }
    }

    /// Draws `count` weights from `rng`.
    ///
    /// For a convolution filter bank `fan_in` is `K * K * input_depth` and
    /// `fan_out` is `K * K * filters`.
    pub fn sample(&self, fan_in: usize, fan_out: usize, count: usize, rng: &mut StdRng) -> Result<Vec<f64>> {
        self.validate()?;

        if fan_in == 0 {
            return Err(ConvNetError::DegenerateConfig(
                "weight initialisation needs a non-zero fan-in".to_string(),
            ));
        }

        match self {
            WeightInit::Xavier => {
                let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
                let dist = Uniform::new(-limit, limit);
                Ok((0..count).map(|_| dist.sample(rng)).collect())
            }

            WeightInit::He => Self::normal(0.0, (2.0 / fan_in as f64).sqrt(), count, rng),

            WeightInit::LeCun => Self::normal(0.0, (1.0 / fan_in as f64).sqrt(), count, rng),

            WeightInit::UniformRandom { min, max } => {
                let dist = Uniform::new(*min, *max);
                Ok((0..count).map(|_| dist.sample(rng)).collect())
            }

            WeightInit::Constant(value) => Ok(vec![*value; count]),
        }
    }

    fn normal(mean: f64, std_dev: f64, count: usize, rng: &mut StdRng) -> Result<Vec<f64>> {
        let dist = Normal::new(mean, std_dev)
            .map_err(|e| ConvNetError::DegenerateConfig(format!("normal distribution: {}", e)))?;

        Ok((0..count).map(|_| dist.sample(rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn he_draws_match_requested_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        let fan_in = 3 * 3 * 4;
        let weights = WeightInit::He.sample(fan_in, 0, 20_000, &mut rng).unwrap();

        let mean = weights.iter().sum::<f64>() / weights.len() as f64;
        let var = weights.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / weights.len() as f64;
        let expected = 2.0 / fan_in as f64;

        assert!(mean.abs() < 0.01, "mean {mean}");
        assert!((var - expected).abs() / expected < 0.05, "var {var} vs {expected}");
    }

    #[test]
    fn same_seed_same_weights() {
        let a = WeightInit::He.sample(9, 9, 32, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = WeightInit::He.sample(9, 9, 32, &mut StdRng::seed_from_u64(1)).unwrap();
        let c = WeightInit::He.sample(9, 9, 32, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn xavier_stays_within_limit() {
        let mut rng = StdRng::seed_from_u64(3);
        let limit = (6.0f64 / 20.0).sqrt();
        let weights = WeightInit::Xavier.sample(10, 10, 1000, &mut rng).unwrap();
        assert!(weights.iter().all(|w| w.abs() <= limit));
    }

    #[test]
    fn constant_and_uniform() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(WeightInit::Constant(0.5).sample(1, 1, 3, &mut rng).unwrap(), vec![0.5; 3]);

        let weights = WeightInit::UniformRandom { min: -0.1, max: 0.2 }
            .sample(1, 1, 100, &mut rng)
            .unwrap();
        assert!(weights.iter().all(|&w| (-0.1..0.2).contains(&w)));
    }

    #[test]
    fn default_is_he() {
        assert_eq!(WeightInit::default(), WeightInit::He);
    }

    #[test]
    fn empty_uniform_range_is_rejected() {
        let init = WeightInit::UniformRandom { min: 1.0, max: 1.0 };
        assert!(init.validate().is_err());
        assert!(init.sample(1, 1, 1, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
