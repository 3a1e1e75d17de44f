pub mod layer_shape;
pub mod weight_init;
