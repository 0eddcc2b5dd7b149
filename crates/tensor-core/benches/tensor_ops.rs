// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the offloadable operators.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tensor_core::{conv2d, conv2d_output_shape, linear, Conv2dParams, Shape, Tensor};

fn bench_conv2d(c: &mut Criterion) {
    // AlexNet conv3-sized layer on a 13x13 map.
    let input = Tensor::full(Shape::nchw(1, 192, 13, 13), 0.5);
    let weight = Tensor::full(Shape::nchw(384, 192, 3, 3), 0.01);
    let params = Conv2dParams { stride: 1, padding: 1 };
    let out_shape = conv2d_output_shape(input.shape(), weight.shape(), params).unwrap();
    let mut output = Tensor::zeros(out_shape);

    c.bench_function("conv2d_192x384_13x13", |b| {
        b.iter(|| {
            conv2d(
                black_box(&input.view()),
                black_box(&weight.view()),
                None,
                params,
                &mut output,
            )
            .unwrap()
        })
    });
}

fn bench_linear(c: &mut Criterion) {
    let input = Tensor::full(Shape::matrix(1, 4096), 0.5);
    let weight = Tensor::full(Shape::matrix(1000, 4096), 0.01);
    let mut output = Tensor::zeros(Shape::matrix(1, 1000));

    c.bench_function("linear_4096x1000", |b| {
        b.iter(|| linear(black_box(&input.view()), black_box(&weight.view()), None, &mut output).unwrap())
    });
}

criterion_group!(benches, bench_conv2d, bench_linear);
criterion_main!(benches);
