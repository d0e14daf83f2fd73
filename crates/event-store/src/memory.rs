use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::{
    Envelope, EventStoreError, Result, Revision, RevisionRange, StampedEvent,
    store::{EventStream, Storage, validate_envelope},
};

/// In-memory envelope storage.
///
/// Clones share the same envelopes, so a test can keep a handle on the store
/// it hands to an engine.
#[derive(Clone)]
pub struct InMemoryStorage {
    envelopes: Rc<RefCell<Vec<Envelope>>>,
    revision: Rc<Cell<Revision>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored envelopes.
    pub fn envelope_count(&self) -> usize {
        self.envelopes.borrow().len()
    }

    /// Returns the total number of stored events.
    pub fn event_count(&self) -> usize {
        self.envelopes.borrow().iter().map(Envelope::len).sum()
    }

    /// Returns a copy of every stored envelope, in store order.
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.envelopes.borrow().clone()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self {
            envelopes: Rc::default(),
            revision: Rc::new(Cell::new(Revision::initial())),
        }
    }
}

impl Storage for InMemoryStorage {
    /// Explicit revisions are only checked against the last stored envelope,
    /// so after [`clear`](Storage::clear) any explicit revision is accepted.
    fn store(&self, mut envelope: Envelope) -> Result<Envelope> {
        validate_envelope(&envelope)?;

        let mut envelopes = self.envelopes.borrow_mut();
        let revision = match envelope.revision {
            Some(revision) => {
                if let Some(last) = envelopes.last().and_then(|e| e.revision)
                    && revision <= last
                {
                    return Err(EventStoreError::RevisionConflict { revision, last });
                }
                if revision > self.revision.get() {
                    self.revision.set(revision);
                }
                revision
            }
            None => {
                let next = self.revision.get().checked_next()?;
                self.revision.set(next);
                envelope.revision = Some(next);
                next
            }
        };

        tracing::debug!(%revision, events = envelope.len(), "envelope stored");
        envelopes.push(envelope.clone());
        Ok(envelope)
    }

    fn events(&self, range: RevisionRange) -> Result<EventStream> {
        range.validate()?;
        Ok(Box::new(EnvelopeCursor {
            envelopes: Rc::clone(&self.envelopes),
            range,
            position: 0,
            batch: Vec::new().into_iter(),
            done: false,
        }))
    }

    fn revision(&self) -> Revision {
        self.revision.get()
    }

    fn clear(&self) {
        tracing::warn!("clearing all stored envelopes");
        self.envelopes.borrow_mut().clear();
    }
}

/// Walks the stored envelopes one at a time, flattening the batches that fall
/// inside the range. The store is only borrowed inside `next`.
struct EnvelopeCursor {
    envelopes: Rc<RefCell<Vec<Envelope>>>,
    range: RevisionRange,
    position: usize,
    batch: std::vec::IntoIter<StampedEvent>,
    done: bool,
}

impl Iterator for EnvelopeCursor {
    type Item = StampedEvent;

    fn next(&mut self) -> Option<StampedEvent> {
        loop {
            if let Some(event) = self.batch.next() {
                return Some(event);
            }
            if self.done {
                return None;
            }

            let envelopes = self.envelopes.borrow();
            let Some(envelope) = envelopes.get(self.position) else {
                self.done = true;
                return None;
            };
            self.position += 1;

            let revision = envelope.revision.unwrap_or_default();
            if self.range.is_exceeded_by(revision) {
                self.done = true;
                return None;
            }
            if revision >= self.range.from {
                self.batch = envelope.events.clone().into_iter();
            }
        }
    }
}
