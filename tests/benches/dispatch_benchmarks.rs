//! # Glide Dispatch Benchmarks
//!
//! | Group | What it measures |
//! |-------|------------------|
//! | dispatch/submit_complete | One request end to end, id recycled each time |
//! | dispatch/out_of_order | Bursts answered in reverse order |
//! | dispatch/shutdown | Draining and cancelling a full registry |
//! | dispatch/contended | Several threads sharing one dispatcher |

use criterion::{criterion_group, criterion_main};
use glide_tests::benchmarks::dispatch::{
    bench_contended, bench_out_of_order_burst, bench_shutdown_drain, bench_submit_complete,
};

criterion_group!(
    benches,
    bench_submit_complete,
    bench_out_of_order_burst,
    bench_shutdown_drain,
    bench_contended
);
criterion_main!(benches);
