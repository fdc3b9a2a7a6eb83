//! Performance benchmarks for argument marshaling.
//!
//! Runs against the simulated host, so host calls cost a mutex acquisition
//! and a map lookup. The numbers measure the marshaler's own overhead:
//! - Fixed arity: inline and boxed primitives, references
//! - Variadic primitive tails of growing length
//! - Variadic reference tails of growing length
//! - Failures, which stop at the first bad position

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use narcissus::sim::SimRuntime;
use narcissus::{
    ArgumentValue, CallAddress, Marshaler, MemberDescriptor, Modifiers, PrimitiveValue,
    RegistryConfig, TypeRegistry,
};
use std::hint::black_box;

const TAIL_LENGTHS: [usize; 4] = [0, 4, 32, 256];

fn descriptor(rt: &SimRuntime, params: &[&str], modifiers: Modifiers) -> MemberDescriptor {
    MemberDescriptor::method(
        "target",
        rt.type_named("bench.Target"),
        modifiers,
        params.iter().map(|p| rt.type_named(p)).collect(),
        rt.type_named("void"),
        CallAddress::from_raw(0xb0),
    )
}

fn setup() -> (SimRuntime, TypeRegistry) {
    let rt = SimRuntime::new();
    let registry = TypeRegistry::with_host(&rt, &RegistryConfig::default())
        .expect("registry should resolve against the simulated host");
    (rt, registry)
}

/// Benchmark fixed-arity marshaling
fn fixed_arity_benchmarks(c: &mut Criterion) {
    let (rt, registry) = setup();
    let m = Marshaler::from_registry(&registry, &rt).expect("registry is initialized");
    let mut group = c.benchmark_group("marshal/fixed");

    let sum = descriptor(&rt, &["int", "int"], Modifiers::STATIC);
    let inline: [ArgumentValue; 2] = [PrimitiveValue::Int(3).into(), PrimitiveValue::Int(4).into()];
    group.bench_function("two_inline_ints", |b| {
        b.iter(|| black_box(m.marshal(&sum, black_box(&inline)).map(|buf| buf.len())));
    });

    let boxed: Vec<ArgumentValue> = [3i32, 4]
        .into_iter()
        .map(|v| rt.new_boxed(v).expect("boxed int").into())
        .collect();
    group.bench_function("two_boxed_ints", |b| {
        b.iter(|| black_box(m.marshal(&sum, black_box(&boxed)).map(|buf| buf.len())));
    });

    let mixed = descriptor(
        &rt,
        &["java.lang.String", "long", "java.lang.Object", "double"],
        Modifiers::PUBLIC,
    );
    let s = rt.new_string("bench").expect("string");
    let four: [ArgumentValue; 4] = [
        s.into(),
        PrimitiveValue::Long(1).into(),
        ArgumentValue::Null,
        PrimitiveValue::Double(0.5).into(),
    ];
    group.bench_function("mixed_four", |b| {
        b.iter(|| black_box(m.marshal(&mixed, black_box(&four)).map(|buf| buf.len())));
    });

    group.finish();
}

/// Benchmark packing primitive variadic tails
fn variadic_primitive_benchmarks(c: &mut Criterion) {
    let (rt, registry) = setup();
    let m = Marshaler::from_registry(&registry, &rt).expect("registry is initialized");
    let mut group = c.benchmark_group("marshal/variadic_primitive");
    let member = descriptor(&rt, &["int[]"], Modifiers::STATIC | Modifiers::VARARGS);

    for len in TAIL_LENGTHS {
        let args: Vec<ArgumentValue> = (0..len as i32)
            .map(|i| PrimitiveValue::Int(i).into())
            .collect();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &args, |b, args| {
            b.iter(|| {
                let buffer = m.marshal(&member, black_box(args)).expect("packs");
                if let Some(Some(array)) = buffer.reference(0) {
                    rt.free(array);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark packing reference variadic tails
fn variadic_object_benchmarks(c: &mut Criterion) {
    let (rt, registry) = setup();
    let m = Marshaler::from_registry(&registry, &rt).expect("registry is initialized");
    let mut group = c.benchmark_group("marshal/variadic_object");
    let member = descriptor(
        &rt,
        &["java.lang.String", "java.lang.Object[]"],
        Modifiers::STATIC | Modifiers::VARARGS,
    );
    let format = rt.new_string("%s").expect("string");

    for len in TAIL_LENGTHS {
        let mut args = vec![ArgumentValue::from(format)];
        for i in 0..len {
            if i % 2 == 0 {
                args.push(rt.new_boxed(i as i64).expect("boxed long").into());
            } else {
                args.push(rt.new_string("x").expect("string").into());
            }
        }
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &args, |b, args| {
            b.iter(|| {
                let buffer = m.marshal(&member, black_box(args)).expect("packs");
                if let Some(Some(array)) = buffer.reference(1) {
                    rt.free(array);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark rejected argument lists
fn failure_benchmarks(c: &mut Criterion) {
    let (rt, registry) = setup();
    let m = Marshaler::from_registry(&registry, &rt).expect("registry is initialized");
    let mut group = c.benchmark_group("marshal/failure");

    let member = descriptor(&rt, &["long", "long"], Modifiers::PUBLIC);
    let widened: [ArgumentValue; 2] = [
        PrimitiveValue::Int(1).into(),
        PrimitiveValue::Long(2).into(),
    ];
    group.bench_function("no_widening", |b| {
        b.iter(|| black_box(m.marshal(&member, black_box(&widened)).is_err()));
    });

    let short: [ArgumentValue; 1] = [PrimitiveValue::Long(1).into()];
    group.bench_function("arity", |b| {
        b.iter(|| black_box(m.marshal(&member, black_box(&short)).is_err()));
    });

    group.finish();
}

criterion_group!(
    benches,
    fixed_arity_benchmarks,
    variadic_primitive_benchmarks,
    variadic_object_benchmarks,
    failure_benchmarks
);

criterion_main!(benches);
