use crate::{error::Result, tensor::tensor_shape::TensorShape};

use super::{
    config::{ConvConfig, PoolConfig},
    conv2d::ConvolutionLayer,
    layer::Layer,
    max_pool::MaxPoolingLayer,
};

pub struct Layers;

impl Layers {
    pub fn conv2d(input_size: TensorShape, filters: usize, kernel_size: usize) -> Result<Box<dyn Layer>> {
        Self::conv2d_with(input_size, ConvConfig::new(filters, kernel_size, 0, 1))
    }

    pub fn conv2d_with(input_size: TensorShape, config: ConvConfig) -> Result<Box<dyn Layer>> {
        Ok(Box::new(ConvolutionLayer::with_config(input_size, config)?))
    }

    pub fn max_pool(input_size: TensorShape, scale: usize) -> Result<Box<dyn Layer>> {
        Self::max_pool_with(input_size, PoolConfig::new(scale))
    }

    pub fn max_pool_with(input_size: TensorShape, config: PoolConfig) -> Result<Box<dyn Layer>> {
        Ok(Box::new(MaxPoolingLayer::with_config(input_size, config)?))
    }
}
