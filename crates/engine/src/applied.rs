//! Outcome of applying events.

use futures_util::future::{self, FutureExt, LocalBoxFuture};

use crate::error::Result;

/// Future that finishes a pending application.
pub type PendingApply = LocalBoxFuture<'static, Result<()>>;

/// Result of handing events to their handlers.
///
/// `Ready` means every handler ran synchronously and nothing is left to do.
/// `Pending` means some handler deferred work: the remaining events are
/// chained behind it and only run when the future is awaited.
#[must_use = "a pending application only makes progress when awaited"]
pub enum Applied {
    Ready,
    /// Lazy: nothing after the deferring handler runs until this is polled,
    /// and dropping it abandons those handlers.
    Pending(PendingApply),
}

impl Applied {
    /// Wraps deferred handler work.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<()>> + 'static,
    {
        Self::Pending(future.boxed_local())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl std::fmt::Debug for Applied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => f.write_str("Ready"),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl IntoFuture for Applied {
    type Output = Result<()>;
    type IntoFuture = PendingApply;

    fn into_future(self) -> PendingApply {
        match self {
            Self::Ready => future::ready(Ok(())).boxed_local(),
            Self::Pending(pending) => pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::EngineError;

    #[tokio::test]
    async fn ready_resolves_immediately() {
        let applied = Applied::Ready;
        assert!(applied.is_ready());
        applied.await.unwrap();
    }

    #[tokio::test]
    async fn pending_runs_only_when_awaited() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let applied = Applied::pending(async move {
            flag.set(true);
            Ok(())
        });

        assert!(applied.is_pending());
        assert!(!ran.get());
        applied.await.unwrap();
        assert!(ran.get());
    }

    #[test]
    fn dropped_pending_never_runs() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        drop(Applied::pending(async move {
            flag.set(true);
            Ok(())
        }));
        assert!(!ran.get());
    }

    #[tokio::test]
    async fn pending_propagates_errors() {
        let applied = Applied::pending(async { Err(EngineError::handler("late failure")) });
        let err = applied.await.unwrap_err();
        assert_eq!(err.to_string(), "late failure");
    }
}
