//! Benchmark tests for tvdeck-core operations
//!
//! Run with: cargo bench -p tvdeck-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use tvdeck_core::config::{GridConfig, ScrollConfig};
use tvdeck_core::format::format_clock;
use tvdeck_core::playback::{Progress, ProgressLayout};
use tvdeck_core::scroll::centered_offset;
use tvdeck_core::{EventBus, FocusNavigator, SeekTable, Signal};

// ============================================================================
// Seek Benchmarks
// ============================================================================

fn bench_seek_lookup(c: &mut Criterion) {
    let table = SeekTable::default();
    let mut group = c.benchmark_group("seek_lookup");

    for held_ms in [0u64, 2_500, 7_000, 15_000] {
        group.bench_with_input(BenchmarkId::from_parameter(held_ms), &held_ms, |b, &held| {
            b.iter(|| table.jump_for(black_box(Some(Duration::from_millis(held)))))
        });
    }

    group.finish();
}

// ============================================================================
// Focus Benchmarks
// ============================================================================

fn bench_focus_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("focus_traversal");

    for size in [19usize, 500, 5_000] {
        group.bench_with_input(BenchmarkId::new("line_moves", size), &size, |b, &size| {
            b.iter(|| {
                let mut bus = EventBus::new();
                let mut nav = FocusNavigator::new(GridConfig::default(), &ScrollConfig::default());
                nav.handle(&Signal::CatalogReady { size }, &mut bus);

                for _ in 0..50 {
                    nav.handle(&Signal::FocusNextLineCard, &mut bus);
                }
                for _ in 0..50 {
                    nav.handle(&Signal::FocusPreviousLineCard, &mut bus);
                }
                bus.clear_queue();
                black_box(nav.current())
            })
        });
    }

    group.finish();
}

fn bench_centered_offset(c: &mut Criterion) {
    let grid = GridConfig::default();
    c.bench_function("centered_offset", |b| {
        b.iter(|| centered_offset(&grid, black_box(4_321), black_box(5_000)))
    });
}

// ============================================================================
// Overlay Benchmarks
// ============================================================================

fn bench_progress(c: &mut Criterion) {
    let layout = ProgressLayout::default();
    c.bench_function("progress_compute", |b| {
        b.iter(|| {
            Progress::compute(
                black_box(Duration::from_secs(1_234)),
                black_box(Some(Duration::from_secs(5_400))),
                &layout,
            )
        })
    });

    c.bench_function("format_clock", |b| {
        b.iter(|| format_clock(black_box(Some(Duration::from_secs(3_723)))))
    });
}

criterion_group!(
    benches,
    bench_seek_lookup,
    bench_focus_traversal,
    bench_centered_offset,
    bench_progress,
);
criterion_main!(benches);
