use criterion::{Criterion, criterion_group, criterion_main};
use event_store::{
    AggregateId, Envelope, Event, InMemoryStorage, Revision, RevisionRange, StampedEvent, Storage,
    StorageExt,
};

fn make_event(aggregate_id: &AggregateId, revision: u64) -> StampedEvent {
    StampedEvent::new(
        aggregate_id.clone(),
        Revision::new(revision),
        Event::new("OrderCreated")
            .with("order_id", aggregate_id.to_string())
            .with("customer_id", "00000000-0000-0000-0000-000000000001"),
    )
}

fn populated_store(envelopes: u64, batch: u64) -> InMemoryStorage {
    let storage = InMemoryStorage::new();
    let agg_id = AggregateId::new();
    for e in 0..envelopes {
        let events = (0..batch).map(|i| make_event(&agg_id, e * batch + i + 2)).collect();
        storage.store(Envelope::new(events)).unwrap();
    }
    storage
}

fn bench_store_single_event(c: &mut Criterion) {
    c.bench_function("event_store/store_single_event", |b| {
        b.iter(|| {
            let storage = InMemoryStorage::new();
            let agg_id = AggregateId::new();
            storage.store_events(vec![make_event(&agg_id, 2)]).unwrap();
        });
    });
}

fn bench_store_batch_10(c: &mut Criterion) {
    c.bench_function("event_store/store_batch_10", |b| {
        b.iter(|| {
            let storage = InMemoryStorage::new();
            let agg_id = AggregateId::new();
            let events = (2..=11).map(|v| make_event(&agg_id, v)).collect();
            storage.store_events(events).unwrap();
        });
    });
}

fn bench_stream_full_history(c: &mut Criterion) {
    let storage = populated_store(100, 10);

    c.bench_function("event_store/stream_1000_events", |b| {
        b.iter(|| {
            let count = storage.all_events().unwrap().count();
            assert_eq!(count, 1000);
        });
    });
}

fn bench_stream_early_exit(c: &mut Criterion) {
    let storage = populated_store(1000, 1);

    c.bench_function("event_store/stream_first_10_of_1000", |b| {
        b.iter(|| {
            let count = storage
                .events(RevisionRange::up_to(11u64))
                .unwrap()
                .count();
            assert_eq!(count, 10);
        });
    });
}

criterion_group!(
    benches,
    bench_store_single_event,
    bench_store_batch_10,
    bench_stream_full_history,
    bench_stream_early_exit,
);
criterion_main!(benches);
