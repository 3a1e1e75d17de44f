use crate::{
    error::{ConvNetError, Result},
    tensor::{tensor::Tensor, tensor_shape::TensorShape},
};

/// Input and output extents shared by every layer kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerShape {
    pub input_size: TensorShape,
    pub output_size: TensorShape,
}

impl LayerShape {
    pub fn new(input_size: TensorShape, output_size: TensorShape) -> Self {
        Self {
            input_size,
            output_size,
        }
    }

    pub fn check_input(&self, input: &Tensor) -> Result<()> {
        check_shape(self.input_size, input)
    }

    pub fn check_output(&self, output: &Tensor) -> Result<()> {
        check_shape(self.output_size, output)
    }
}

fn check_shape(expected: TensorShape, tensor: &Tensor) -> Result<()> {
    if tensor.shape() != expected {
        return Err(ConvNetError::ShapeMismatch {
            expected,
            actual: tensor.shape(),
        });
    }
    Ok(())
}
