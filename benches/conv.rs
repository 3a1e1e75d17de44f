//! Benchmarks for the convolution and pooling passes.

use convnet_core::{ConvConfig, ConvolutionLayer, MaxPoolingLayer, Tensor, TensorShape};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn ramp(shape: TensorShape) -> Tensor {
    let values = (0..shape.num_elements()).map(|v| (v % 17) as f64 * 0.1).collect();
    Tensor::from_vec(shape, values).unwrap()
}

fn bench_conv_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("conv_forward");

    for size in [8, 16, 32].iter() {
        let shape = TensorShape::new(*size, *size, 3);
        let layer = ConvolutionLayer::with_config(shape, ConvConfig::new(8, 3, 1, 1).with_seed(0)).unwrap();
        let input = ramp(shape);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| layer.forward(black_box(&input)).unwrap());
        });
    }

    group.finish();
}

fn bench_conv_backward(c: &mut Criterion) {
    let mut group = c.benchmark_group("conv_backward");

    for size in [8, 16, 32].iter() {
        let shape = TensorShape::new(*size, *size, 3);
        let mut layer = ConvolutionLayer::with_config(shape, ConvConfig::new(8, 3, 1, 2).with_seed(0)).unwrap();
        let input = ramp(shape);
        let grad = ramp(layer.forward(&input).unwrap().shape());

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| layer.backward(black_box(&grad), black_box(&input)).unwrap());
        });
    }

    group.finish();
}

fn bench_max_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_pool_forward");

    for size in [8, 16, 32].iter() {
        let shape = TensorShape::new(*size, *size, 8);
        let mut layer = MaxPoolingLayer::new(shape, 2).unwrap();
        let input = ramp(shape);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| layer.forward(black_box(&input)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_conv_forward, bench_conv_backward, bench_max_pool);
criterion_main!(benches);
