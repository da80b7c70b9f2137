//! Benchmarks for the sensor store and broadcast path
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sensor_relay::store::{HistoryStore, Reading, SensorStore};
use sensor_relay::websocket::{ConnectionHub, HubConfig};
use std::sync::Arc;
use tokio::sync::mpsc;

const CHANNELS: [&str; 2] = ["temperature", "humidity"];

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    for capacity in [30, 300, 3000] {
        group.throughput(Throughput::Elements(1));

        group.bench_function(format!("append_at_capacity_{}", capacity), |b| {
            let mut history = HistoryStore::new(&CHANNELS[..], capacity);
            for i in 0..capacity as i64 {
                history
                    .append("temperature", Reading::with_timestamp(20.0, i))
                    .unwrap();
            }

            let mut ts = capacity as i64;
            b.iter(|| {
                ts += 1;
                history
                    .append(black_box("temperature"), Reading::with_timestamp(21.5, ts))
                    .unwrap()
            });
        });

        let mut history = HistoryStore::new(&CHANNELS[..], capacity);
        for i in 0..capacity as i64 {
            history
                .append("humidity", Reading::with_timestamp(55.0, i))
                .unwrap();
        }

        group.bench_function(format!("to_map_{}", capacity), |b| {
            b.iter(|| black_box(&history).to_map())
        });
    }

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("store");

    group.bench_function("apply_single", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let store = SensorStore::new(&CHANNELS[..], 30);

                let start = std::time::Instant::now();

                for i in 0..iters {
                    let reading = Reading::with_timestamp(22.0, i as i64);
                    store.apply(black_box("temperature"), reading).await.unwrap();
                }

                start.elapsed()
            })
        });
    });

    group.bench_function("snapshot", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let store = SensorStore::new(&CHANNELS[..], 30);
                for i in 0..30 {
                    store
                        .apply("temperature", Reading::with_timestamp(22.0, i))
                        .await
                        .unwrap();
                }

                let start = std::time::Instant::now();

                for _ in 0..iters {
                    black_box(store.snapshot().await);
                }

                start.elapsed()
            })
        });
    });

    group.finish();
}

fn bench_broadcast(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("broadcast");

    for clients in [1, 10, 100] {
        group.throughput(Throughput::Elements(clients as u64));

        group.bench_function(format!("clients_{}", clients), |b| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let store = Arc::new(SensorStore::new(&CHANNELS[..], 30));
                    let hub = ConnectionHub::new(HubConfig::default(), Arc::clone(&store));

                    let mut receivers = Vec::with_capacity(clients);
                    for _ in 0..clients {
                        let (tx, rx) = mpsc::unbounded_channel();
                        hub.register(tx).await.unwrap();
                        receivers.push(rx);
                    }

                    let snapshot = store
                        .apply("temperature", Reading::with_timestamp(22.0, 0))
                        .await
                        .unwrap();

                    let start = std::time::Instant::now();

                    for _ in 0..iters {
                        hub.broadcast(Arc::clone(&snapshot)).await;
                        for rx in receivers.iter_mut() {
                            let _ = rx.try_recv();
                        }
                    }

                    start.elapsed()
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_history, bench_store, bench_broadcast);
criterion_main!(benches);
