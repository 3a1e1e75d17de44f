use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, trace};

use crate::{
    error::{ConvNetError, Result},
    model::{layer_shape::LayerShape, weight_init::WeightInit},
    tensor::{tensor::Tensor, tensor_shape::TensorShape},
};

use super::{config::ConvConfig, layer::Layer};

/// Bank of `F` learnable `K x K x input_depth` filters applied as a strided,
/// zero-padded cross-correlation.
///
/// `backward` only accumulates parameter gradients; `update_weights` applies
/// them and clears the accumulators in the same pass, so several backward
/// calls may be batched before one update.
#[derive(Clone, Debug)]
pub struct ConvolutionLayer {
    shape: LayerShape,
    filter_count: usize,
    filter_size: usize,
    filter_depth: usize,
    padding: usize,
    stride: usize,

    filters: Vec<Tensor>,
    bias: Vec<f64>,

    filter_gradients: Vec<Tensor>,
    bias_gradients: Vec<f64>,

    weight_init: WeightInit,
    bias_init: f64,
    rng: StdRng,
}

impl ConvolutionLayer {
    pub fn new(
        input_size: TensorShape,
        filter_count: usize,
        filter_size: usize,
        padding: usize,
        stride: usize,
    ) -> Result<Self> {
        Self::with_config(input_size, ConvConfig::new(filter_count, filter_size, padding, stride))
    }

    pub fn with_config(input_size: TensorShape, config: ConvConfig) -> Result<Self> {
        let config = config.build()?;
        input_size.validate()?;

        let output_size = TensorShape::new(
            output_dim("width", input_size.width, config.kernel_size, config.padding, config.stride)?,
            output_dim("height", input_size.height, config.kernel_size, config.padding, config.stride)?,
            config.filters,
        );
        output_size.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let filter_shape = TensorShape::new(config.kernel_size, config.kernel_size, input_size.depth);
        let filters = (0..config.filters)
            .map(|_| Tensor::from_shape(filter_shape))
            .collect::<Result<Vec<_>>>()?;

        let mut layer = Self {
            shape: LayerShape::new(input_size, output_size),
            filter_count: config.filters,
            filter_size: config.kernel_size,
            filter_depth: input_size.depth,
            padding: config.padding,
            stride: config.stride,
            filter_gradients: filters.clone(),
            filters,
            bias: vec![0.0; config.filters],
            bias_gradients: vec![0.0; config.filters],
            weight_init: config.weight_init,
            bias_init: config.bias_init,
            rng,
        };

        layer.reset_parameters()?;

        debug!(
            input = %input_size,
            output = %output_size,
            filters = layer.filter_count,
            kernel = layer.filter_size,
            padding = layer.padding,
            stride = layer.stride,
            init = ?layer.weight_init,
            "created convolution layer"
        );

        Ok(layer)
    }

    /// Redraws every filter from the layer's own generator, resets biases to
    /// their initial value and clears the gradient accumulators.
    pub fn reset_parameters(&mut self) -> Result<()> {
        // Filter shape was validated at construction, so the fan-in fits
        let kernel_area = self.filter_size * self.filter_size;
        let fan_in = kernel_area * self.filter_depth;
        let fan_out = kernel_area.checked_mul(self.filter_count).ok_or_else(|| {
            ConvNetError::DegenerateConfig(format!(
                "fan-out of {} filters of size {} overflows",
                self.filter_count, self.filter_size
            ))
        })?;

        for filter in self.filters.iter_mut() {
            let count = filter.shape().num_elements();
            let values = self.weight_init.sample(fan_in, fan_out, count, &mut self.rng)?;
            filter.as_mut_slice().copy_from_slice(&values);
        }

        self.bias.iter_mut().for_each(|b| *b = self.bias_init);
        self.zero_gradients();

        Ok(())
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        self.shape.check_input(input)?;
        trace!(input = %input.shape(), "convolution forward");

        let in_size = self.shape.input_size;
        let out_size = self.shape.output_size;
        let mut output = Tensor::from_shape(out_size)?;

        for f in 0..self.filter_count {
            let filter = &self.filters[f];

            for h in 0..out_size.height {
                for w in 0..out_size.width {
                    let mut sum = self.bias[f];

                    for i in 0..self.filter_size {
                        // Rows outside the input are implicit zero padding
                        let Some(i_0) = unpad(self.stride * h + i, self.padding, in_size.height) else {
                            continue;
                        };

                        for j in 0..self.filter_size {
                            let Some(j_0) = unpad(self.stride * w + j, self.padding, in_size.width) else {
                                continue;
                            };

                            for d in 0..self.filter_depth {
                                sum += input.at(d, i_0, j_0) * filter.at(d, i, j);
                            }
                        }
                    }

                    *output.at_mut(f, h, w) = sum;
                }
            }
        }

        Ok(output)
    }

    pub fn backward(&mut self, grad_output: &Tensor, input: &Tensor) -> Result<Tensor> {
        self.shape.check_output(grad_output)?;
        self.shape.check_input(input)?;
        trace!(grad = %grad_output.shape(), "convolution backward");

        let deltas = self.upsample_deltas(grad_output)?;
        self.accumulate_parameter_gradients(&deltas, input);
        self.input_gradients(&deltas)
    }

    // Scatter the strided output gradient onto a unit-stride grid, zeros elsewhere
    fn upsample_deltas(&self, grad_output: &Tensor) -> Result<Tensor> {
        let out_size = self.shape.output_size;
        let deltas_size = TensorShape::new(
            self.stride * (out_size.width - 1) + 1,
            self.stride * (out_size.height - 1) + 1,
            out_size.depth,
        );

        let mut deltas = Tensor::from_shape(deltas_size)?;

        for d in 0..out_size.depth {
            for i in 0..out_size.height {
                for j in 0..out_size.width {
                    *deltas.at_mut(d, i * self.stride, j * self.stride) = grad_output.at(d, i, j);
                }
            }
        }

        Ok(deltas)
    }

    fn accumulate_parameter_gradients(&mut self, deltas: &Tensor, input: &Tensor) {
        let in_size = self.shape.input_size;
        let deltas_size = deltas.shape();

        for f in 0..self.filter_count {
            let gradients = &mut self.filter_gradients[f];
            let mut bias_gradient = 0.0;

            for h in 0..deltas_size.height {
                for w in 0..deltas_size.width {
                    let delta = deltas.at(f, h, w);
                    if delta == 0.0 {
                        continue;
                    }

                    for i in 0..self.filter_size {
                        let Some(i_0) = unpad(i + h, self.padding, in_size.height) else {
                            continue;
                        };

                        for j in 0..self.filter_size {
                            let Some(j_0) = unpad(j + w, self.padding, in_size.width) else {
                                continue;
                            };

                            for d in 0..self.filter_depth {
                                *gradients.at_mut(d, i, j) += delta * input.at(d, i_0, j_0);
                            }
                        }
                    }

                    bias_gradient += delta;
                }
            }

            self.bias_gradients[f] += bias_gradient;
        }
    }

    // Correlation of the deltas with the 180 degree rotated filters, padded by K - 1 - P
    fn input_gradients(&self, deltas: &Tensor) -> Result<Tensor> {
        let in_size = self.shape.input_size;
        let deltas_size = deltas.shape();
        let last = self.filter_size - 1;
        let mut input_gradients = Tensor::from_shape(in_size)?;

        for h in 0..in_size.height {
            for w in 0..in_size.width {
                for d in 0..self.filter_depth {
                    let mut sum = 0.0;

                    for i in 0..self.filter_size {
                        // h + i - (K - 1 - P), kept unsigned
                        let Some(i_0) = unpad(h + i + self.padding, last, deltas_size.height) else {
                            continue;
                        };

                        for j in 0..self.filter_size {
                            let Some(j_0) = unpad(w + j + self.padding, last, deltas_size.width) else {
                                continue;
                            };

                            for f in 0..self.filter_count {
                                sum += self.filters[f].at(d, last - i, last - j) * deltas.at(f, i_0, j_0);
                            }
                        }
                    }

                    *input_gradients.at_mut(d, h, w) = sum;
                }
            }
        }

        Ok(input_gradients)
    }

    pub fn update_weights(&mut self, learning_rate: f64) {
        trace!(learning_rate, "convolution update");

        for (filter, gradients) in self.filters.iter_mut().zip(self.filter_gradients.iter_mut()) {
            for (weight, gradient) in filter.as_mut_slice().iter_mut().zip(gradients.as_mut_slice().iter_mut()) {
                *weight -= learning_rate * *gradient;
                *gradient = 0.0;
            }
        }

        for (bias, gradient) in self.bias.iter_mut().zip(self.bias_gradients.iter_mut()) {
            *bias -= learning_rate * *gradient;
            *gradient = 0.0;
        }
    }

    /// Drops accumulated gradients without touching the parameters.
    pub fn zero_gradients(&mut self) {
        self.filter_gradients.iter_mut().for_each(|g| g.fill(0.0));
        self.bias_gradients.iter_mut().for_each(|g| *g = 0.0);
    }

    pub fn weight(&self, filter_index: usize, depth: usize, i: usize, j: usize) -> Result<f64> {
        self.check_filter_index(filter_index)?;
        self.filters[filter_index].get(depth, i, j)
    }

    pub fn set_weight(&mut self, filter_index: usize, depth: usize, i: usize, j: usize, value: f64) -> Result<()> {
        self.check_filter_index(filter_index)?;
        self.filters[filter_index].set(depth, i, j, value)
    }

    pub fn set_bias(&mut self, filter_index: usize, value: f64) -> Result<()> {
        self.check_filter_index(filter_index)?;
        self.bias[filter_index] = value;
        Ok(())
    }

    /// Flat copy of every parameter: each filter in tensor layout, in filter
    /// order, followed by the biases.
    pub fn export_parameters(&self) -> Vec<f64> {
        let mut params = Vec::with_capacity(self.parameter_count());
        for filter in &self.filters {
            params.extend_from_slice(filter.as_slice());
        }
        params.extend_from_slice(&self.bias);
        params
    }

    pub fn import_parameters(&mut self, params: &[f64]) -> Result<()> {
        if params.len() != self.parameter_count() {
            return Err(ConvNetError::ParameterCountMismatch {
                expected: self.parameter_count(),
                actual: params.len(),
            });
        }

        let mut chunks = params.chunks_exact(self.filter_len());
        for filter in self.filters.iter_mut() {
            if let Some(chunk) = chunks.next() {
                filter.as_mut_slice().copy_from_slice(chunk);
            }
        }

        let bias_start = self.filter_count * self.filter_len();
        self.bias.copy_from_slice(&params[bias_start..]);

        Ok(())
    }

    pub fn filters(&self) -> &[Tensor] {
        &self.filters
    }

    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    pub fn filter_gradients(&self) -> &[Tensor] {
        &self.filter_gradients
    }

    pub fn bias_gradients(&self) -> &[f64] {
        &self.bias_gradients
    }

    pub fn filter_count(&self) -> usize {
        self.filter_count
    }

    pub fn filter_size(&self) -> usize {
        self.filter_size
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    fn filter_len(&self) -> usize {
        self.filter_size * self.filter_size * self.filter_depth
    }

    fn check_filter_index(&self, filter_index: usize) -> Result<()> {
        if filter_index >= self.filter_count {
            return Err(ConvNetError::ParameterOutOfRange {
                what: "filter",
                index: filter_index,
                len: self.filter_count,
            });
        }
        Ok(())
    }
}

impl Layer for ConvolutionLayer {
    fn shape(&self) -> LayerShape {
        self.shape
    }

    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        ConvolutionLayer::forward(self, input)
    }

    fn backward(&mut self, grad_output: &Tensor, input: &Tensor) -> Result<Tensor> {
        ConvolutionLayer::backward(self, grad_output, input)
    }

    fn update_weights(&mut self, learning_rate: f64) {
        ConvolutionLayer::update_weights(self, learning_rate)
    }

    fn parameter_count(&self) -> usize {
        self.filter_count * self.filter_len() + self.filter_count
    }

    fn name(&self) -> String {
        "Conv2D".to_string()
    }

    fn config_string(&self) -> Option<String> {
        Some(format!(
            "in={}, out={}, filters={}, kernel={}×{}, stride={}, padding={}",
            self.shape.input_size,
            self.shape.output_size,
            self.filter_count,
            self.filter_size,
            self.filter_size,
            self.stride,
            self.padding
        ))
    }
}

// (input - K + 2P) / S + 1, truncating
fn output_dim(axis: &str, input: usize, kernel: usize, padding: usize, stride: usize) -> Result<usize> {
    let padded = padding
        .checked_mul(2)
        .and_then(|p| p.checked_add(input))
        .ok_or_else(|| {
            ConvNetError::DegenerateConfig(format!(
                "padding {} overflows the padded input {} {}",
                padding, axis, input
            ))
        })?;

    if padded < kernel {
        return Err(ConvNetError::DegenerateConfig(format!(
            "kernel size {} exceeds padded input {} {}",
            kernel, axis, padded
        )));
    }
    Ok((padded - kernel) / stride + 1)
}

// Map a padded coordinate back into [0, limit), None if it lands in the padding
fn unpad(pos: usize, padding: usize, limit: usize) -> Option<usize> {
    pos.checked_sub(padding).filter(|&p| p < limit)
}
