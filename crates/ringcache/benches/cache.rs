use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ringcache::{ByteView, EvictionCache, HashRing, ShardCache};

fn bench_lru_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_get");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_1kb_hit", |b| {
        let mut cache = EvictionCache::new(0);
        let data = ByteView::from(vec![b'x'; 1024]);

        let keys: Vec<String> = (0..100).map(|i| format!("key-{}", i)).collect();
        for key in &keys {
            cache.add(key.as_str(), data.clone());
        }

        let mut counter = 0;
        b.iter(|| {
            black_box(cache.get(&keys[counter % 100]));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_lru_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_churn");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_with_eviction", |b| {
        // Room for roughly 10 entries, so nearly every add evicts
        let mut cache = EvictionCache::new(10 * 1040);
        let data = ByteView::from(vec![b'x'; 1024]);
        let keys: Vec<String> = (0..100).map(|i| format!("key-{}", i)).collect();

        let mut counter = 0;
        b.iter(|| {
            cache.add(keys[counter % 100].as_str(), data.clone());
            counter += 1;
        });
    });

    group.finish();
}

fn bench_shard_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("shard_mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_read_50_write", |b| {
        let shard = ShardCache::new("bench", 1 << 20);
        let data = ByteView::from(vec![b'x'; 1024]);
        let keys: Vec<String> = (0..1000).map(|i| format!("key-{}", i)).collect();

        let mut counter = 0usize;
        b.iter(|| {
            let key = &keys[counter % 1000];
            if counter.is_multiple_of(2) {
                black_box(shard.get(key));
            } else {
                shard.add(key.as_str(), data.clone());
            }
            counter += 1;
        });
    });

    group.finish();
}

fn bench_ring_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_get");
    group.throughput(Throughput::Elements(1));

    for (peers, replicas) in [(8usize, 50usize), (64, 50), (64, 500)] {
        let mut ring = HashRing::new(replicas);
        ring.add((0..peers).map(|i| format!("cache-{}", i)));
        let keys: Vec<String> = (0..1000).map(|i| format!("key-{}", i)).collect();

        group.bench_function(format!("{}_peers_{}_replicas", peers, replicas), |b| {
            let mut counter = 0;
            b.iter(|| {
                black_box(ring.get(&keys[counter % 1000]));
                counter += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lru_get,
    bench_lru_churn,
    bench_shard_mixed,
    bench_ring_get
);
criterion_main!(benches);
