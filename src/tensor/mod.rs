pub mod tensor;
pub mod tensor_shape;
