//! Benchmark for expression compilation.

use criterion::{criterion_group, criterion_main, Criterion};
use fractalc::{compile, compile_source, parse};
use std::hint::black_box;

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("parse z^2+c", |b| b.iter(|| black_box(parse(black_box("z^2+c")))));
}

fn benchmark_compile_mandelbrot(c: &mut Criterion) {
    c.bench_function("compile z^2+c", |b| {
        b.iter(|| black_box(compile_source(black_box("z^2+c"))))
    });
}

fn benchmark_compile_functions(c: &mut Criterion) {
    let text = "sin(z)*cos(z)+exp(c)-ln(z)/(conj(z)^3+i)";
    c.bench_function("compile nested functions", |b| {
        b.iter(|| black_box(compile(black_box(text))))
    });
}

fn benchmark_compile_long_chain(c: &mut Criterion) {
    let text = (0..200).map(|_| "z").collect::<Vec<_>>().join("+");
    c.bench_function("compile 200-term sum", |b| {
        b.iter(|| black_box(compile(black_box(&text))))
    });
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_compile_mandelbrot,
    benchmark_compile_functions,
    benchmark_compile_long_chain
);
criterion_main!(benches);
