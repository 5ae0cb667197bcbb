//! Benchmarks for method body disassembly.
//!
//! Measures the pipeline stages on a synthetic body of nested loops and branches:
//! - Instruction decoding
//! - Control flow graph construction
//! - Structure recovery
//! - Full flat and structured rendering

extern crate ilscope;

use criterion::{criterion_group, criterion_main, Criterion};
use ilscope::{
    analysis::{reduce, ControlFlowGraph, ExceptionRegionTable},
    prelude::*,
};
use std::{hint::black_box, sync::Arc};

/// `count` copies of `nop; ldarg.0; brfalse.s +3; nop; br.s -6`, followed by `ret`.
fn loop_body(count: usize) -> Vec<u8> {
    let mut code = Vec::with_capacity(count * 7 + 1);
    for _ in 0..count {
        code.extend_from_slice(&[0x00, 0x02, 0x2C, 0x03, 0x00, 0x2B, 0xFA]);
    }
    code.push(0x2A);
    code
}

fn method(code: Vec<u8>) -> MemberDef {
    MemberDef::from(MethodDef {
        token: Token::new(0x0600_0001),
        name: "Loops".to_string(),
        declaring_type: "Program".to_string(),
        flags: 0x0096,
        return_type: "void".to_string(),
        body: Some(MethodIl::Code {
            code,
            max_stack: 8,
            init_locals: false,
            clauses: Vec::new(),
        }),
        ..MethodDef::default()
    })
}

/// Benchmark decoding 1000 loops into instructions.
fn bench_decode(c: &mut Criterion) {
    let code = loop_body(1000);

    c.bench_function("decode_stream_1000_loops", |b| {
        b.iter(|| {
            let instructions = decode_stream(black_box(&code), &NullResolver).unwrap();
            black_box(instructions)
        });
    });
}

/// Benchmark building the control flow graph of 1000 loops.
fn bench_cfg(c: &mut Criterion) {
    let code = loop_body(1000);
    let instructions = decode_stream(&code, &NullResolver).unwrap();

    c.bench_function("cfg_build_1000_loops", |b| {
        b.iter(|| {
            let regions = ExceptionRegionTable::default();
            let cfg = ControlFlowGraph::build(black_box(instructions.clone()), regions).unwrap();
            black_box(cfg)
        });
    });
}

/// Benchmark structure recovery over an already built graph.
fn bench_reduce(c: &mut Criterion) {
    let code = loop_body(1000);
    let instructions = decode_stream(&code, &NullResolver).unwrap();
    let cfg = ControlFlowGraph::build(instructions, ExceptionRegionTable::default()).unwrap();

    c.bench_function("reduce_1000_loops", |b| {
        b.iter(|| black_box(reduce(black_box(&cfg))));
    });
}

/// Benchmark rendering a method in both language variants.
fn bench_render(c: &mut Criterion) {
    let member = method(loop_body(200));
    let context = DecompilationContext::new(DisassemblerOptions::verbose());

    for (name, language) in [
        ("render_flat_200_loops", IlLanguage::flat()),
        ("render_structured_200_loops", IlLanguage::structured()),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut sink = StringSink::new();
                let report = language.decompile(black_box(&member), &mut sink, &context);
                black_box((sink, report))
            });
        });
    }
}

/// Benchmark rendering 64 methods in parallel.
fn bench_parallel(c: &mut Criterion) {
    let members: Vec<MemberDef> = (0..64).map(|_| method(loop_body(50))).collect();
    let context = DecompilationContext::default().with_resolver(Arc::new(NullResolver));

    c.bench_function("render_parallel_64_methods", |b| {
        b.iter(|| black_box(IlLanguage::structured().decompile_parallel(&members, &context)));
    });
}

criterion_group!(
    benches,
    bench_decode,
    bench_cfg,
    bench_reduce,
    bench_render,
    bench_parallel
);
criterion_main!(benches);
