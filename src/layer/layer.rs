use crate::{
    error::Result,
    model::layer_shape::LayerShape,
    tensor::{tensor::Tensor, tensor_shape::TensorShape},
};

pub trait Layer {
    // Input and output extents of this layer
    fn shape(&self) -> LayerShape;

    fn input_size(&self) -> TensorShape {
        self.shape().input_size
    }

    fn output_size(&self) -> TensorShape {
        self.shape().output_size
    }

    // Compute the output for one input volume
    fn forward(&mut self, input: &Tensor) -> Result<Tensor>;

    // Gradient w.r.t. the input, given the gradient w.r.t. the output and the
    // input that was fed to forward. Parameterised layers accumulate their
    // parameter gradients as a side effect.
    fn backward(&mut self, grad_output: &Tensor, input: &Tensor) -> Result<Tensor>;

    // Apply and clear accumulated gradients
    fn update_weights(&mut self, _learning_rate: f64) {}

    // Return the total number of parameters in this layer
    fn parameter_count(&self) -> usize {
        0
    }

    fn requires_parameters(&self) -> bool {
        self.parameter_count() > 0
    }

    // Return a string representation of the layers name
    fn name(&self) -> String;

    // Return optional configuration details for the layer
    fn config_string(&self) -> Option<String> {
        None
    }
}
