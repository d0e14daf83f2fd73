//! The aggregate protocol: raising, stamping and applying events.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use common::AggregateId;
use event_store::{Event, Revision, StampedEvent};

use crate::applied::Applied;
use crate::error::{EngineError, Result};
use crate::identity::Identity;
use crate::identity_map::EventProvider;
use crate::unit_of_work::UnitOfWork;

/// Result of one event handler.
pub type HandlerResult = Result<Applied>;

/// An event handler: mutates the aggregate state in response to one event.
///
/// Synchronous handlers return `Ok(Applied::Ready)`. A handler that needs to
/// defer work returns `Ok(Applied::pending(..))`; events after it are held
/// back until that future completes. The future is `'static`, so state it
/// touches after suspending must be shared (e.g. `Rc<RefCell<_>>`).
pub type Handler<A> = fn(&mut A, &StampedEvent) -> HandlerResult;

/// Application state that participates in event sourcing.
///
/// Implementors map event tags to handlers. Tags without a handler are
/// tolerated and only advance the revision.
///
/// ```ignore
/// impl Aggregate for Model {
///     fn handler(tag: &str) -> Option<Handler<Self>> {
///         match tag {
///             "fired" => Some(Self::on_fired),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Aggregate: Sized + 'static {
    /// Returns the handler for `tag`, if any.
    fn handler(tag: &str) -> Option<Handler<Self>>;
}

/// Converts one or many items into an ordered batch.
pub trait IntoBatch<T> {
    fn into_batch(self) -> Vec<T>;
}

macro_rules! impl_into_batch {
    ($item:ty) => {
        impl IntoBatch<$item> for $item {
            fn into_batch(self) -> Vec<$item> {
                vec![self]
            }
        }

        impl IntoBatch<$item> for Vec<$item> {
            fn into_batch(self) -> Vec<$item> {
                self
            }
        }

        impl<const N: usize> IntoBatch<$item> for [$item; N] {
            fn into_batch(self) -> Vec<$item> {
                self.into()
            }
        }
    };
}

impl_into_batch!(Event);
impl_into_batch!(StampedEvent);

struct Inner<A> {
    identity: RefCell<Identity>,
    revision: Cell<Revision>,
    state: RefCell<A>,
    uow: Rc<UnitOfWork>,
}

impl<A: Aggregate> Inner<A> {
    /// Runs the handler for one event. The revision is not touched.
    fn dispatch(&self, event: &StampedEvent) -> HandlerResult {
        let Some(handler) = A::handler(event.tag()) else {
            tracing::trace!(tag = event.tag(), "no handler registered");
            return Ok(Applied::Ready);
        };
        let mut state = self
            .state
            .try_borrow_mut()
            .map_err(|_| EngineError::Reentrant(event.id.clone()))?;
        handler(&mut state, event)
    }

    /// Runs the handlers of events whose revisions are already applied,
    /// chaining everything after a pending handler behind its future.
    fn dispatch_all(self: Rc<Self>, events: Vec<StampedEvent>) -> Result<Applied> {
        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            if let Applied::Pending(pending) = self.dispatch(&event)? {
                let rest: Vec<_> = events.collect();
                return Ok(Applied::pending(async move {
                    pending.await?;
                    self.dispatch_all(rest)?.await
                }));
            }
        }
        Ok(Applied::Ready)
    }
}

impl<A: Aggregate> EventProvider for Inner<A> {
    fn provider_id(&self) -> Result<AggregateId> {
        self.identity.borrow_mut().id()
    }

    /// Once a handler defers, the revision still moves to the last event of
    /// the batch right away; only the remaining handlers wait.
    fn apply_events(self: Rc<Self>, events: Vec<StampedEvent>) -> Result<Applied> {
        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            self.revision.set(event.revision);
            if let Applied::Pending(pending) = self.dispatch(&event)? {
                let rest: Vec<_> = events.collect();
                if let Some(last) = rest.last() {
                    self.revision.set(last.revision);
                }
                return Ok(Applied::pending(async move {
                    pending.await?;
                    self.dispatch_all(rest)?.await
                }));
            }
        }
        Ok(Applied::Ready)
    }
}

/// A live aggregate bound to an engine's unit of work.
///
/// Wraps the application state `A` together with its identity and local
/// revision. Cloning yields another handle to the same aggregate.
pub struct Eventable<A: Aggregate> {
    inner: Rc<Inner<A>>,
}

impl<A: Aggregate> Clone for Eventable<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: Aggregate> Eventable<A> {
    fn bind(uow: Rc<UnitOfWork>, identity: Identity, state: A) -> Self {
        Self {
            inner: Rc::new(Inner {
                identity: RefCell::new(identity),
                revision: Cell::new(Revision::initial()),
                state: RefCell::new(state),
                uow,
            }),
        }
    }

    /// Binds the aggregate and, when its identity is already known, registers
    /// it with the unit of work.
    fn bind_known(uow: Rc<UnitOfWork>, id: AggregateId, state: A) -> Result<Self> {
        if id.is_empty() {
            return Err(EngineError::IdentityRequired);
        }
        let eventable = Self::bind(uow, Identity::known(id.clone()), state);
        eventable.inner.uow.register(&id, eventable.provider())?;
        Ok(eventable)
    }

    fn provider(&self) -> Weak<dyn EventProvider> {
        let provider: Rc<dyn EventProvider> = self.inner.clone();
        Rc::downgrade(&provider)
    }

    /// Returns the identity, generating it on first use when allowed.
    pub fn id(&self) -> Result<AggregateId> {
        self.inner.identity.borrow_mut().id()
    }

    /// True once the identity has been supplied or generated.
    pub fn has_identity(&self) -> bool {
        self.inner.identity.borrow().has_identity()
    }

    /// Establishes the identity and registers the aggregate for routing.
    ///
    /// Assigning the identity it already has is a no-op; assigning a
    /// different one fails.
    pub fn set_id(&self, id: impl Into<AggregateId>) -> Result<()> {
        let id = id.into();
        if self.inner.identity.borrow_mut().set(id.clone())? {
            self.inner.uow.register(&id, self.provider())?;
        }
        Ok(())
    }

    /// Returns the local revision.
    pub fn revision(&self) -> Revision {
        self.inner.revision.get()
    }

    pub fn set_revision(&self, revision: Revision) {
        self.inner.revision.set(revision);
    }

    /// Returns the revision the next raised event receives.
    pub fn next_revision(&self) -> Revision {
        self.revision().next()
    }

    /// Records one or more events and applies them to this aggregate.
    ///
    /// Events are stamped with this aggregate's identity and consecutive
    /// revisions starting at [`next_revision`](Self::next_revision), handed to
    /// the unit of work, then applied in order. A handler error stops the
    /// batch; already applied events are not rolled back.
    ///
    /// When a handler defers, the returned `Applied::Pending` drives the
    /// handlers of the rest of the batch. The events are already recorded
    /// and the revision already advanced, so dropping it unawaited leaves
    /// those handlers unrun.
    pub fn raise(&self, events: impl IntoBatch<Event>) -> Result<Applied> {
        let id = self.id()?;
        let events = events.into_batch();
        if events.iter().any(|event| !event.is_tagged()) {
            return Err(EngineError::EventRequired);
        }

        let mut revision = self.revision();
        let mut stamped = Vec::with_capacity(events.len());
        for event in events {
            revision = revision.checked_next()?;
            stamped.push(StampedEvent::new(id.clone(), revision, event));
        }

        self.inner.uow.append(&stamped)?;
        metrics::counter!("engine_events_raised").increment(stamped.len() as u64);
        tracing::debug!(%id, events = stamped.len(), "events raised");

        Rc::clone(&self.inner).apply_events(stamped)
    }

    /// Applies already stamped events without recording them.
    pub fn apply_event(&self, events: impl IntoBatch<StampedEvent>) -> Result<Applied> {
        Rc::clone(&self.inner).apply_events(events.into_batch())
    }

    /// Borrows the application state.
    ///
    /// # Panics
    ///
    /// Panics if a handler of this aggregate is running.
    pub fn state(&self) -> Ref<'_, A> {
        self.inner.state.borrow()
    }

    /// Mutably borrows the application state.
    ///
    /// # Panics
    ///
    /// Panics if the state is already borrowed.
    pub fn state_mut(&self) -> RefMut<'_, A> {
        self.inner.state.borrow_mut()
    }

    /// Returns true if both handles refer to the same aggregate.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn as_provider(&self) -> Rc<dyn EventProvider> {
        self.inner.clone()
    }
}

impl<A: Aggregate + std::fmt::Debug> std::fmt::Debug for Eventable<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Eventable")
            .field("identity", &self.inner.identity.borrow().get())
            .field("revision", &self.revision())
            .field("state", &self.inner.state.try_borrow().ok())
            .finish()
    }
}

/// Builds aggregates bound to one engine's unit of work.
///
/// Handlers that create child aggregates during a replay keep a clone of the
/// factory; children with a known identity register themselves immediately.
#[derive(Clone)]
pub struct EventableFactory {
    uow: Rc<UnitOfWork>,
}

impl EventableFactory {
    pub(crate) fn new(uow: Rc<UnitOfWork>) -> Self {
        Self { uow }
    }

    /// Creates an aggregate whose identity is generated on first use.
    pub fn create<A: Aggregate>(&self, state: A) -> Eventable<A> {
        Eventable::bind(Rc::clone(&self.uow), Identity::generated(), state)
    }

    /// Creates an aggregate with a known identity.
    pub fn create_with_id<A: Aggregate>(
        &self,
        id: impl Into<AggregateId>,
        state: A,
    ) -> Result<Eventable<A>> {
        Eventable::bind_known(Rc::clone(&self.uow), id.into(), state)
    }

    /// Creates an aggregate that cannot raise events until
    /// [`Eventable::set_id`] is called.
    pub fn create_deferred<A: Aggregate>(&self, state: A) -> Eventable<A> {
        Eventable::bind(Rc::clone(&self.uow), Identity::deferred(), state)
    }
}
