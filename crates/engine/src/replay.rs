//! Replays stored events onto live aggregates.

use std::rc::Rc;

use event_store::EventStream;

use crate::applied::Applied;
use crate::error::Result;
use crate::unit_of_work::UnitOfWork;

/// Dispatches each event of `events` to the aggregate registered under its id.
///
/// Runs synchronously until a handler defers work; the rest of the stream is
/// then chained behind that handler's future, so events are never reordered
/// across aggregates. An event addressed to an aggregate that no earlier event
/// created aborts the replay.
pub(crate) fn replay(uow: Rc<UnitOfWork>, mut events: EventStream) -> Result<Applied> {
    while let Some(event) = events.next() {
        let target = uow.resolve(&event.id)?;
        tracing::trace!(id = %event.id, revision = %event.revision, tag = event.tag(), "replaying event");
        metrics::counter!("engine_events_replayed").increment(1);

        if let Applied::Pending(pending) = target.apply_events(vec![event])? {
            return Ok(Applied::pending(async move {
                pending.await?;
                replay(uow, events)?.await
            }));
        }
    }
    Ok(Applied::Ready)
}
