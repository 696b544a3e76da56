use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use joint::Relay;
use tokio::sync::mpsc;

const MSG_COUNT: u64 = 100_000;
const CHANNEL_BUF: usize = 64;

async fn relay_messages(capacity: usize, filtered: bool) {
    let (tx, source) = mpsc::channel::<u64>(CHANNEL_BUF);
    let (sink, mut rx) = mpsc::channel::<u64>(CHANNEL_BUF);
    let relay = Relay::new(source, sink).unwrap();
    relay.set_capacity(capacity).unwrap();
    if filtered {
        relay.set_filter(|v| v % 2 == 0);
    }

    let producer = tokio::spawn(async move {
        for i in 0..MSG_COUNT {
            tx.send(i).await.unwrap();
        }
    });

    while let Some(item) = rx.recv().await {
        black_box(item);
    }
    producer.await.unwrap();
}

fn bench_capacity(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("relay");
    group.throughput(Throughput::Elements(MSG_COUNT));
    group.sample_size(20);

    for capacity in [0usize, 1024, 65_536] {
        group.bench_with_input(
            BenchmarkId::new("capacity", capacity),
            &capacity,
            |b, &capacity| {
                b.to_async(&rt).iter(|| relay_messages(capacity, false));
            },
        );
    }

    group.bench_function("filtered", |b| {
        b.to_async(&rt).iter(|| relay_messages(1024, true));
    });

    group.finish();
}

criterion_group!(benches, bench_capacity);
criterion_main!(benches);
