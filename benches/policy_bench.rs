//! Policy Benchmarks - Per-Cycle Decision Cost
//!
//! Benchmarks the pure functions the engine evaluates on every cycle:
//! the price band check, offer pricing, wei conversion and delay draw.
//!
//! Run with: cargo bench --bench policy_bench

use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal_macros::dec;

use nft_automation_bot::domain::policy::{is_price_within_limits, offer_price, random_delay};
use nft_automation_bot::domain::settings::NetworkSettings;
use nft_automation_bot::domain::units::to_wei;

/// Benchmark the inclusive price band check.
fn bench_price_band(c: &mut Criterion) {
    let rules = NetworkSettings::default();

    c.bench_function("price_within_limits", |b| {
        b.iter(|| {
            let _ok = is_price_within_limits(black_box(dec!(0.42)), black_box(&rules));
        });
    });
}

/// Benchmark discounted offer pricing plus conversion to wei.
fn bench_offer_to_wei(c: &mut Criterion) {
    c.bench_function("offer_price_to_wei", |b| {
        b.iter(|| {
            if let Ok(price) = offer_price(black_box(dec!(1.234567)), black_box(dec!(-20))) {
                let _wei = to_wei(price.normalize());
            }
        });
    });
}

/// Benchmark the randomized inter-cycle delay.
fn bench_random_delay(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let min = Duration::from_secs(300);
    let max = Duration::from_secs(900);

    c.bench_function("random_delay", |b| {
        b.iter(|| {
            let _delay = random_delay(&mut rng, black_box(min), black_box(max));
        });
    });
}

criterion_group!(
    benches,
    bench_price_band,
    bench_offer_to_wei,
    bench_random_delay,
);
criterion_main!(benches);
