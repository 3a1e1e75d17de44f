use tracing::{debug, trace};

use crate::{
    error::{ConvNetError, Result},
    model::layer_shape::LayerShape,
    tensor::{tensor::Tensor, tensor_shape::TensorShape},
};

use super::{config::PoolConfig, layer::Layer};

/// Non-overlapping `scale x scale` max reduction over every channel.
///
/// Forward records the winning position of each block in a mask shaped like
/// the input; backward sends each output gradient to that position only.
#[derive(Clone, Debug)]
pub struct MaxPoolingLayer {
    shape: LayerShape,
    scale: usize,
    mask: Tensor,
    recorded: bool,
}

impl MaxPoolingLayer {
    pub fn new(input_size: TensorShape, scale: usize) -> Result<Self> {
        Self::with_config(input_size, PoolConfig::new(scale))
    }

    pub fn with_config(input_size: TensorShape, config: PoolConfig) -> Result<Self> {
        let config = config.build()?;
        input_size.validate()?;

        let output_size = TensorShape::new(
            input_size.width / config.scale,
            input_size.height / config.scale,
            input_size.depth,
        );

        if output_size.num_elements() == 0 {
            return Err(ConvNetError::DegenerateConfig(format!(
                "pooling scale {} exceeds input {}",
                config.scale, input_size
            )));
        }

        debug!(input = %input_size, output = %output_size, scale = config.scale, "created max pooling layer");

        Ok(Self {
            shape: LayerShape::new(input_size, output_size),
            scale: config.scale,
            mask: Tensor::from_shape(input_size)?,
            recorded: false,
        })
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        self.shape.check_input(input)?;
        trace!(input = %input.shape(), "max pooling forward");

        let out_size = self.shape.output_size;
        let mut output = Tensor::from_shape(out_size)?;
        self.mask.fill(0.0);

        for d in 0..out_size.depth {
            for i in 0..out_size.height {
                for j in 0..out_size.width {
                    let (row, col) = (i * self.scale, j * self.scale);
                    let mut max = input.at(d, row, col);
                    let mut argmax = (row, col);

                    // First maximum in row-major order wins ties
                    for y in row..row + self.scale {
                        for x in col..col + self.scale {
                            let value = input.at(d, y, x);
                            if value > max {
                                max = value;
                                argmax = (y, x);
                            }
                        }
                    }

                    *output.at_mut(d, i, j) = max;
                    *self.mask.at_mut(d, argmax.0, argmax.1) = 1.0;
                }
            }
        }

        self.recorded = true;

        Ok(output)
    }

    pub fn backward(&self, grad_output: &Tensor, input: &Tensor) -> Result<Tensor> {
        self.shape.check_output(grad_output)?;
        self.shape.check_input(input)?;

        if !self.recorded {
            return Err(ConvNetError::MissingForwardPass);
        }

        trace!(grad = %grad_output.shape(), "max pooling backward");

        let out_size = self.shape.output_size;
        let mut input_gradients = Tensor::from_shape(self.shape.input_size)?;

        for d in 0..out_size.depth {
            for i in 0..out_size.height {
                for j in 0..out_size.width {
                    let (row, col) = (i * self.scale, j * self.scale);

                    'window: for y in row..row + self.scale {
                        for x in col..col + self.scale {
                            if self.mask.at(d, y, x) > 0.0 {
                                *input_gradients.at_mut(d, y, x) = grad_output.at(d, i, j);
                                break 'window;
                            }
                        }
                    }
                }
            }
        }

        Ok(input_gradients)
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    pub fn mask(&self) -> &Tensor {
        &self.mask
    }
}

impl Layer for MaxPoolingLayer {
    fn shape(&self) -> LayerShape {
        self.shape
    }

    fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        MaxPoolingLayer::forward(self, input)
    }

    fn backward(&mut self, grad_output: &Tensor, input: &Tensor) -> Result<Tensor> {
        MaxPoolingLayer::backward(self, grad_output, input)
    }

    fn name(&self) -> String {
        "MaxPool2D".to_string()
    }

    fn config_string(&self) -> Option<String> {
        Some(format!(
            "in={}, out={}, scale={}",
            self.shape.input_size, self.shape.output_size, self.scale
        ))
    }
}
