use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use fern::{lexer, parser::parse_program, CommentStyle};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/inventory.fern");

fn criterion_benchmark(c: &mut Criterion) {
    let tokens = lexer::lex(INPUT, CommentStyle::Line).unwrap().value;

    c.bench_function("parser", |b| {
        b.iter_batched(
            || tokens.clone(),
            |tokens| {
                let program = parse_program(tokens).unwrap();
                _ = black_box(program);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
