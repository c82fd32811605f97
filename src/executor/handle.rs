use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Observer for the eventual outcome of one submitted work item.
///
/// Resolves exactly once: with the produced value, [`Error::TaskFailed`],
/// [`Error::Rejected`] if the item was never accepted, or
/// [`Error::Abandoned`] if a stopping pool discarded it before it ran.
#[derive(Debug)]
pub struct ResultHandle<T> {
    receiver: Receiver<Result<T>>,
    taken: bool,
}

impl<T> ResultHandle<T> {
    pub(crate) fn channel() -> (Sender<Result<T>>, Self) {
        let (sender, receiver) = bounded(1);
        (
            sender,
            Self {
                receiver,
                taken: false,
            },
        )
    }

    /// A handle that is already resolved with [`Error::Rejected`].
    pub(crate) fn rejected() -> Self {
        let (sender, handle) = Self::channel();
        let _ = sender.send(Err(Error::Rejected));
        handle
    }

    /// Block until the outcome is known.
    pub fn join(mut self) -> Result<T> {
        if self.taken {
            return Err(Error::ResultTaken);
        }
        self.taken = true;
        self.receiver.recv().unwrap_or(Err(Error::Abandoned))
    }

    /// Wait up to `timeout`; `None` if the item is still pending.
    pub fn join_timeout(&mut self, timeout: Duration) -> Option<Result<T>> {
        if self.taken {
            return Some(Err(Error::ResultTaken));
        }
        let outcome = match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(Error::Abandoned),
        };
        self.taken = true;
        Some(outcome)
    }

    /// Take the outcome without blocking; `None` if the item is still pending.
    pub fn try_join(&mut self) -> Option<Result<T>> {
        if self.taken {
            return Some(Err(Error::ResultTaken));
        }
        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(Error::Abandoned),
        };
        self.taken = true;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_with_value() {
        let (tx, handle) = ResultHandle::channel();
        tx.send(Ok(42)).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn test_dropped_sender_is_abandoned() {
        let (tx, handle) = ResultHandle::<i32>::channel();
        drop(tx);
        assert!(matches!(handle.join(), Err(Error::Abandoned)));
    }

    #[test]
    fn test_rejected_is_already_resolved() {
        let mut handle = ResultHandle::<()>::rejected();
        assert!(matches!(handle.try_join(), Some(Err(Error::Rejected))));
    }

    #[test]
    fn test_pending_then_taken_once() {
        let (tx, mut handle) = ResultHandle::channel();
        assert!(handle.try_join().is_none());
        assert!(handle.join_timeout(Duration::from_millis(5)).is_none());

        tx.send(Ok("done")).unwrap();
        assert_eq!(handle.try_join().unwrap().unwrap(), "done");
        assert!(matches!(handle.try_join(), Some(Err(Error::ResultTaken))));
        assert!(matches!(handle.join(), Err(Error::ResultTaken)));
    }
}
