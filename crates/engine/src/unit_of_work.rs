//! Write/read state machine coordinating buffering, committing and replaying.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use common::AggregateId;
use event_store::{Envelope, RevisionRange, StampedEvent, Storage};

use crate::applied::Applied;
use crate::error::{EngineError, Result};
use crate::identity_map::{EventProvider, IdentityMap};
use crate::replay;

/// The current mode of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Recording: raised events are buffered and committed.
    Writeable,
    /// Replaying: recording is suspended and aggregates register for routing.
    Readable,
}

/// Mediates between recording events and replaying them.
///
/// A unit of work is single-threaded: all state lives in `Cell`/`RefCell`
/// and every borrow is released before control reaches application code.
pub struct UnitOfWork {
    storage: Rc<dyn Storage>,
    identity_map: RefCell<Box<dyn IdentityMap>>,
    pending: RefCell<Vec<StampedEvent>>,
    mode: Cell<Mode>,
    atomic: bool,
}

impl UnitOfWork {
    /// Creates a unit of work in writeable mode.
    ///
    /// With `atomic`, every append is committed immediately.
    pub fn new(storage: Rc<dyn Storage>, identity_map: Box<dyn IdentityMap>, atomic: bool) -> Self {
        Self {
            storage,
            identity_map: RefCell::new(identity_map),
            pending: RefCell::new(Vec::new()),
            mode: Cell::new(Mode::Writeable),
            atomic,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    /// Returns the number of buffered, uncommitted events.
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Returns the number of live identity map entries.
    pub fn registered_len(&self) -> usize {
        self.identity_map.borrow().len()
    }

    /// Buffers stamped events. Ignored while replaying.
    pub fn append(&self, events: &[StampedEvent]) -> Result<()> {
        if self.mode.get() == Mode::Readable {
            return Ok(());
        }
        self.pending.borrow_mut().extend_from_slice(events);
        if self.atomic {
            self.commit()?;
        }
        Ok(())
    }

    /// Flushes the pending buffer into one envelope and releases the
    /// identity map.
    ///
    /// The buffer is swapped out before storing, so events appended while
    /// the store runs land in a fresh buffer. An empty buffer stores nothing
    /// and returns `None`. Ignored while replaying.
    pub fn commit(&self) -> Result<Option<Envelope>> {
        if self.mode.get() == Mode::Readable {
            return Ok(None);
        }

        let committable = std::mem::take(&mut *self.pending.borrow_mut());
        let stored = if committable.is_empty() {
            None
        } else {
            let envelope = self.storage.store(Envelope::new(committable))?;
            metrics::counter!("engine_envelopes_committed").increment(1);
            tracing::debug!(
                revision = ?envelope.revision,
                events = envelope.len(),
                "envelope committed"
            );
            Some(envelope)
        };

        self.identity_map.borrow_mut().release();
        Ok(stored)
    }

    /// Registers a live aggregate for routing. Only replays need routing, so
    /// this is a no-op in writeable mode.
    pub fn register(&self, id: &AggregateId, provider: Weak<dyn EventProvider>) -> Result<()> {
        match self.mode.get() {
            Mode::Writeable => Ok(()),
            Mode::Readable => self.identity_map.borrow_mut().register(id, provider),
        }
    }

    /// Resolves the aggregate an event is addressed to.
    pub(crate) fn resolve(&self, id: &AggregateId) -> Result<Rc<dyn EventProvider>> {
        self.identity_map.borrow().get(id)
    }

    /// Replays the events in `range` onto `root` and the aggregates its
    /// handlers create.
    ///
    /// Switches to readable mode for the duration of the replay. The identity
    /// map is released and writeable mode restored when the replay finishes,
    /// fails, or its pending future is dropped.
    #[tracing::instrument(skip(self, root))]
    pub fn restore(
        self: &Rc<Self>,
        root: Rc<dyn EventProvider>,
        range: RevisionRange,
    ) -> Result<Applied> {
        if self.mode.get() == Mode::Readable {
            return Err(EngineError::RestoreInProgress);
        }
        self.mode.set(Mode::Readable);
        let guard = ReadableGuard(Rc::clone(self));

        let root_id = root.provider_id()?;
        self.identity_map
            .borrow_mut()
            .register(&root_id, Rc::downgrade(&root))?;
        let events = self.storage.events(range)?;

        match replay::replay(Rc::clone(self), events)? {
            Applied::Ready => {
                tracing::debug!(%root_id, "restore complete");
                Ok(Applied::Ready)
            }
            Applied::Pending(pending) => Ok(Applied::pending(async move {
                let _guard = guard;
                pending.await?;
                tracing::debug!(%root_id, "restore complete");
                Ok(())
            })),
        }
    }
}

/// Returns the unit of work to writeable mode when dropped.
struct ReadableGuard(Rc<UnitOfWork>);

impl Drop for ReadableGuard {
    fn drop(&mut self) {
        self.0.identity_map.borrow_mut().release();
        self.0.mode.set(Mode::Writeable);
    }
}
