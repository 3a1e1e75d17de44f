pub mod config;
pub mod conv2d;
pub mod factory;
pub mod layer;
pub mod max_pool;
