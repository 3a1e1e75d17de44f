use crate::{
    error::{ConvNetError, Result},
    model::weight_init::WeightInit,
};

// Defaults follow the usual small-CNN setup: 3x3 kernels, unit stride, no padding
#[derive(Clone, Debug, PartialEq)]
pub struct ConvConfig {
    pub filters: usize,
    pub kernel_size: usize,
    pub padding: usize,
    pub stride: usize,
    pub weight_init: WeightInit,
    pub bias_init: f64,
    // None draws a fresh seed from the OS entropy source
    pub seed: Option<u64>,
}

impl ConvConfig {
    pub fn new(filters: usize, kernel_size: usize, padding: usize, stride: usize) -> Self {
        Self {
            filters,
            kernel_size,
            padding,
            stride,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_weight_init(mut self, weight_init: WeightInit) -> Self {
        self.weight_init = weight_init;
        self
    }

    pub fn build(self) -> Result<Self> {
        check_non_zero("filter count", self.filters)?;
        check_non_zero("kernel size", self.kernel_size)?;
        check_non_zero("stride", self.stride)?;
        self.weight_init.validate()?;

        if !self.bias_init.is_finite() {
            return Err(ConvNetError::DegenerateConfig(format!(
                "initial bias {} is not finite",
                self.bias_init
            )));
        }

        Ok(self)
    }
}

impl Default for ConvConfig {
    fn default() -> Self {
        Self {
            filters: 8,
            kernel_size: 3,
            padding: 0,
            stride: 1,
            weight_init: WeightInit::He,
            bias_init: 0.01,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub scale: usize,
}

impl PoolConfig {
    pub fn new(scale: usize) -> Self {
        Self { scale }
    }

    pub fn build(self) -> Result<Self> {
        check_non_zero("pooling scale", self.scale)?;
        Ok(self)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { scale: 2 }
    }
}

fn check_non_zero(what: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ConvNetError::DegenerateConfig(format!("{} must be positive", what)));
    }
    Ok(())
}
