//! Numeric core of a small feed-forward convolutional network: a dense 3-D
//! tensor, a trainable convolution layer and a max-pooling layer.

pub mod error;
pub mod layer;
pub mod model;
pub mod tensor;

pub use error::{ConvNetError, Result};
pub use layer::{
    config::{ConvConfig, PoolConfig},
    conv2d::ConvolutionLayer,
    factory::Layers,
    layer::Layer,
    max_pool::MaxPoolingLayer,
};
pub use model::{layer_shape::LayerShape, weight_init::WeightInit};
pub use tensor::{tensor::Tensor, tensor_shape::TensorShape};
