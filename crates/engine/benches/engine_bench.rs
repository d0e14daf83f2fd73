use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use engine::{
    Aggregate, Applied, Engine, Envelope, Event, Handler, HandlerResult, StampedEvent,
};

#[derive(Default)]
struct Ledger {
    balance: i64,
}

impl Ledger {
    fn on_deposited(&mut self, event: &StampedEvent) -> HandlerResult {
        self.balance += event.get("amount").and_then(|v| v.as_i64()).unwrap_or(0);
        Ok(Applied::Ready)
    }
}

impl Aggregate for Ledger {
    fn handler(tag: &str) -> Option<Handler<Self>> {
        match tag {
            "deposited" => Some(Self::on_deposited),
            _ => None,
        }
    }
}

fn populated_engine(events: u64) -> Engine {
    let engine = Engine::new();
    for revision in 2..events + 2 {
        engine
            .mount(
                Envelope::builder()
                    .stamp("ledger", revision, Event::new("deposited").with("amount", 1))
                    .build(),
            )
            .unwrap();
    }
    engine
}

fn bench_raise_single_event(c: &mut Criterion) {
    let engine = Engine::new();
    let ledger = engine.eventable().create(Ledger::default());

    c.bench_function("engine/raise_single_event", |b| {
        b.iter(|| {
            let applied = ledger
                .raise(Event::new("deposited").with("amount", 1))
                .unwrap();
            assert!(applied.is_ready());
        });
    });
}

fn bench_raise_batched(c: &mut Criterion) {
    c.bench_function("engine/raise_10_then_commit", |b| {
        b.iter_batched(
            || Engine::builder().atomic(false).build(),
            |engine| {
                let ledger = engine.eventable().create(Ledger::default());
                for _ in 0..10 {
                    assert!(ledger.raise(Event::new("deposited")).unwrap().is_ready());
                }
                engine.commit().unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_restore_1000_events(c: &mut Criterion) {
    let engine = populated_engine(1000);
    let factory = engine.eventable();

    c.bench_function("engine/restore_1000_events", |b| {
        b.iter(|| {
            let ledger = factory.create_with_id("ledger", Ledger::default()).unwrap();
            assert!(engine.restore(&ledger, ..).unwrap().is_ready());
            assert_eq!(ledger.state().balance, 1000);
        });
    });
}

criterion_group!(
    benches,
    bench_raise_single_event,
    bench_raise_batched,
    bench_restore_1000_events,
);
criterion_main!(benches);
