use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use buffer_pool_manager::BufferPoolManager;
use common::api::AccessType;
use common::disk_manager::DiskManager;

const POOL_SIZE: usize = 100;
const REPLACER_K: usize = 2;
const NUM_PAGES: u64 = 1000;

fn bench_write_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("Write Pages");
    group.sample_size(10); // Smaller sample size for quick iteration

    group.bench_function("new_page", |b| {
        b.iter_custom(|iters| {
            let start = std::time::Instant::now();
            for _ in 0..iters {
                // A fresh pool (and db file) per iteration avoids state
                // interference between runs.
                let dir = tempfile::tempdir().unwrap();
                let dm = Arc::new(DiskManager::new(dir.path().join("bench.db")).unwrap());
                let bpm = BufferPoolManager::new(POOL_SIZE, dm, REPLACER_K);
                for _ in 0..black_box(NUM_PAGES) {
                    let mut page = bpm.new_page_guarded().unwrap();
                    let page_id = page.page_id();
                    page[0] = page_id as u8;
                }
                black_box(bpm.flush_all_pages().unwrap());
            }
            start.elapsed()
        });
    });
    group.finish();
}

fn bench_read_pages(c: &mut Criterion) {
    let mut group = c.benchmark_group("Read Pages");
    group.sample_size(10);

    let dir = tempfile::tempdir().unwrap();
    let dm = Arc::new(DiskManager::new(dir.path().join("bench.db")).unwrap());
    let bpm = BufferPoolManager::new(POOL_SIZE, dm, REPLACER_K);

    let mut page_ids = Vec::with_capacity(NUM_PAGES as usize);
    for _ in 0..NUM_PAGES {
        let page = bpm.new_page_guarded().unwrap();
        page_ids.push(page.page_id());
    }
    bpm.flush_all_pages().unwrap();

    group.bench_function("fetch_page", |b| {
        b.iter(|| {
            for &page_id in black_box(&page_ids) {
                let page = bpm
                    .fetch_page_guarded(page_id, AccessType::Scan)
                    .unwrap()
                    .unwrap();
                black_box(page[0]);
            }
        });
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(std::time::Duration::from_secs(10));
    targets = bench_write_pages, bench_read_pages
}
criterion_main!(benches);
