//! # Dispatcher Benchmarks
//!
//! Hot path costs to keep an eye on:
//! - submit + on_response for a single request (id allocate, map insert/remove, recycle)
//! - bursts of outstanding requests answered in reverse order
//! - shutdown draining a large registry
//! - contended submit/complete from several threads

use std::sync::Arc;
use std::thread;

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use glide_dispatch::{CallbackDispatcher, CallbackId};

pub fn bench_submit_complete(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/submit_complete");
    let dispatcher = CallbackDispatcher::<u64>::new();

    group.throughput(Throughput::Elements(1));
    group.bench_function("single", |b| {
        b.iter(|| {
            let (id, mut handle) = dispatcher.submit().unwrap();
            dispatcher.on_response(id, 7);
            black_box(handle.try_take())
        })
    });
    group.finish();
}

pub fn bench_out_of_order_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/out_of_order");

    for size in [16usize, 256, 4096] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let dispatcher = CallbackDispatcher::<usize>::new();
            b.iter(|| {
                let pending: Vec<_> = (0..size).map(|_| dispatcher.submit().unwrap()).collect();
                for (i, (id, _)) in pending.iter().enumerate().rev() {
                    dispatcher.on_response(*id, i);
                }
                black_box(pending)
            })
        });
    }
    group.finish();
}

pub fn bench_shutdown_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/shutdown");

    for size in [256usize, 16_384] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_with_setup(
                || {
                    let dispatcher = CallbackDispatcher::<()>::new();
                    let handles: Vec<_> =
                        (0..size).map(|_| dispatcher.submit().unwrap()).collect();
                    (dispatcher, handles)
                },
                |(dispatcher, handles)| {
                    black_box(dispatcher.shutdown());
                    handles
                },
            )
        });
    }
    group.finish();
}

pub fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/contended");
    let per_thread = 1_000usize;

    for threads in [2usize, 8] {
        group.throughput(Throughput::Elements((threads * per_thread) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                let dispatcher = Arc::new(CallbackDispatcher::<CallbackId>::new());
                b.iter(|| {
                    let workers: Vec<_> = (0..threads)
                        .map(|_| {
                            let dispatcher = Arc::clone(&dispatcher);
                            thread::spawn(move || {
                                for _ in 0..per_thread {
                                    let (id, _handle) = dispatcher.submit().unwrap();
                                    dispatcher.on_response(id, id);
                                }
                            })
                        })
                        .collect();
                    for worker in workers {
                        worker.join().unwrap();
                    }
                })
            },
        );
    }
    group.finish();
}
