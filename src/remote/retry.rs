//! Retry with exponential backoff for transient remote failures.

use std::cell::Cell;
use std::time::Duration;

use tracing::warn;

use super::{MailStore, MessageDetail, Page};
use crate::error::Result;

/// How often and how patiently to retry a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. `1` disables retrying.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles after each further failure.
    pub initial_backoff: Duration,
    /// Upper bound for a single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before attempt `failed + 1`, given `failed` failures so far.
    pub fn backoff_for(&self, failed: u32) -> Duration {
        let shift = failed.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << shift)
            .min(self.max_backoff)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T>(&self, op: &str, mut call: impl FnMut() -> Result<T>) -> Result<T> {
        let max_attempts = self.max_attempts.max(1);
        let mut failed = 0;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && failed + 1 < max_attempts => {
                    failed += 1;
                    let delay = self.backoff_for(failed);
                    warn!(
                        op = op,
                        attempt = failed,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient remote failure, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// A [`MailStore`] that retries transient failures of the wrapped store.
#[derive(Debug)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: MailStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MailStore> MailStore for RetryingStore<S> {
    fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<Page> {
        self.policy
            .run("list", || self.inner.list_page(query, page_token))
    }

    fn get_detail(&self, id: &str) -> Result<MessageDetail> {
        self.policy.run("get", || self.inner.get_detail(id))
    }

    /// A 404 after a failed attempt means the earlier request was applied
    /// and only its response was lost, so it counts as deleted.
    fn delete(&self, id: &str) -> Result<()> {
        let attempted = Cell::new(false);
        self.policy.run("delete", || {
            let result = match self.inner.delete(id) {
                Err(err) if attempted.get() && err.is_not_found() => {
                    warn!(id = id, "Message already gone on retried delete, treating as deleted");
                    Ok(())
                }
                other => other,
            };
            attempted.set(true);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;
    use crate::error::TriageError;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    fn unavailable() -> TriageError {
        TriageError::Api {
            op: "get",
            status: 503,
            message: "backend unavailable".into(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(350));
        assert_eq!(policy.backoff_for(30), Duration::from_millis(350));
    }

    #[test]
    fn test_transient_failure_is_retried() {
        let calls = Cell::new(0);
        let out = fast(3).run("get", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(unavailable())
            } else {
                Ok(42)
            }
        });
        assert_eq!(out.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let out: Result<()> = fast(2).run("get", || {
            calls.set(calls.get() + 1);
            Err(unavailable())
        });
        assert!(matches!(out, Err(TriageError::Api { status: 503, .. })));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_permanent_failure_is_not_retried() {
        let calls = Cell::new(0);
        let out: Result<()> = fast(5).run("delete", || {
            calls.set(calls.get() + 1);
            Err(TriageError::Api {
                op: "delete",
                status: 404,
                message: "Not Found".into(),
            })
        });
        assert!(out.is_err());
        assert_eq!(calls.get(), 1);
    }

    /// Store whose deletes answer with a scripted sequence of statuses.
    struct ScriptedDelete {
        statuses: RefCell<VecDeque<u16>>,
        calls: Cell<u32>,
    }

    impl ScriptedDelete {
        fn new(statuses: &[u16]) -> Self {
            Self {
                statuses: RefCell::new(statuses.iter().copied().collect()),
                calls: Cell::new(0),
            }
        }
    }

    impl MailStore for ScriptedDelete {
        fn list_page(&self, _query: &str, _page_token: Option<&str>) -> Result<Page> {
            Ok(Page::default())
        }

        fn get_detail(&self, _id: &str) -> Result<MessageDetail> {
            Ok(MessageDetail::default())
        }

        fn delete(&self, _id: &str) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            match self.statuses.borrow_mut().pop_front() {
                None | Some(200) => Ok(()),
                Some(status) => Err(TriageError::Api {
                    op: "delete",
                    status,
                    message: "scripted".into(),
                }),
            }
        }
    }

    #[test]
    fn test_not_found_after_lost_delete_response_is_success() {
        let store = RetryingStore::new(ScriptedDelete::new(&[503, 404]), fast(3));
        assert!(store.delete("m1").is_ok());
        assert_eq!(store.into_inner().calls.get(), 2);
    }

    #[test]
    fn test_not_found_on_first_delete_is_an_error() {
        let store = RetryingStore::new(ScriptedDelete::new(&[404]), fast(3));
        let err = store.delete("m1").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.into_inner().calls.get(), 1);
    }

    #[test]
    fn test_none_policy_makes_one_attempt() {
        let calls = Cell::new(0);
        let _: Result<()> = RetryPolicy::none().run("list", || {
            calls.set(calls.get() + 1);
            Err(unavailable())
        });
        assert_eq!(calls.get(), 1);
    }
}
