#![forbid(unsafe_code)]

//! One-to-many change broadcaster keyed by a property identifier.
//!
//! # Design
//!
//! [`PropertyNotifier<K>`] keeps an ordered list of callbacks, each tagged
//! with a [`SubscriptionId`]. [`notify`](PropertyNotifier::notify) snapshots
//! the list and calls every callback with the key, holding no borrow while
//! callbacks run.
//!
//! # Performance
//!
//! | Operation       | Complexity                   |
//! |-----------------|------------------------------|
//! | `subscribe()`   | O(1) amortized               |
//! | `unsubscribe()` | O(S) where S = subscribers   |
//! | `notify()`      | O(S)                         |
//!
//! # Failure Modes
//!
//! - **Panicking observer**: under [`DispatchPolicy::Propagate`] the panic
//!   unwinds out of `notify()` and later observers are skipped. Under
//!   [`DispatchPolicy::Isolate`] it is caught, logged and reported in
//!   [`DispatchOutcome::failures`].
//! - **Re-entrant registration**: subscribing or unsubscribing from inside a
//!   callback is allowed. The running dispatch keeps its snapshot; the change
//!   applies from the next `notify()`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

use crate::error::ObserverPanic;

type Callback<K> = Rc<dyn Fn(K)>;

// Shared by every notifier so a handle never matches another notifier's entry.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque handle identifying one registration.
///
/// Every call to `subscribe` yields a new id, even for the same callback.
/// Ids are unique across all notifiers in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happens when an observer panics during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Let the panic unwind out of the dispatch. Remaining observers are not
    /// called.
    #[default]
    Propagate,
    /// Catch the panic, log it, and keep calling the remaining observers.
    Isolate,
}

/// Result of one dispatch.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome<K> {
    /// Observers that returned normally.
    pub delivered: usize,
    /// Observers that panicked (only populated under `Isolate`).
    pub failures: Vec<ObserverPanic<K>>,
}

impl<K> DispatchOutcome<K> {
    fn empty() -> Self {
        Self {
            delivered: 0,
            failures: Vec::new(),
        }
    }

    /// `true` if no observer panicked.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Registration<K> {
    id: SubscriptionId,
    callback: Callback<K>,
}

/// Ordered list of change observers.
///
/// # Invariants
///
/// 1. Observers are called in registration order.
/// 2. Duplicate registrations are not merged; each one is called.
/// 3. Unsubscribing an unknown id is a no-op.
/// 4. A dispatch with no observers does nothing.
pub struct PropertyNotifier<K> {
    observers: RefCell<Vec<Registration<K>>>,
    policy: Cell<DispatchPolicy>,
}

impl<K> fmt::Debug for PropertyNotifier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyNotifier")
            .field("subscriber_count", &self.observers.borrow().len())
            .field("policy", &self.policy.get())
            .finish()
    }
}

impl<K: Copy + fmt::Debug + 'static> Default for PropertyNotifier<K> {
    fn default() -> Self {
        Self::new(DispatchPolicy::default())
    }
}

impl<K: Copy + fmt::Debug + 'static> PropertyNotifier<K> {
    /// Create an empty notifier with the given panic policy.
    #[must_use]
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
            policy: Cell::new(policy),
        }
    }

    #[must_use]
    pub fn policy(&self) -> DispatchPolicy {
        self.policy.get()
    }

    pub fn set_policy(&self, policy: DispatchPolicy) {
        self.policy.set(policy);
    }

    /// Register `callback` at the end of the list.
    pub fn subscribe(&self, callback: impl Fn(K) + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.observers.borrow_mut().push(Registration {
            id,
            callback: Rc::new(callback),
        });
        debug!(subscription = %id, "observer subscribed");
        id
    }

    /// Remove the registration for `id`. Returns `false` if it was not
    /// registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let Some(index) = observers.iter().position(|r| r.id == id) else {
            return false;
        };
        observers.remove(index);
        debug!(subscription = %id, "observer unsubscribed");
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.borrow().is_empty()
    }

    /// Call every registered observer with `key`, in registration order.
    ///
    /// # Panics
    ///
    /// Under [`DispatchPolicy::Propagate`], re-raises the first observer
    /// panic.
    pub fn notify(&self, key: K) -> DispatchOutcome<K> {
        // Snapshot so callbacks can touch the list without a borrow conflict.
        let snapshot: Vec<(SubscriptionId, Callback<K>)> = {
            let observers = self.observers.borrow();
            if observers.is_empty() {
                return DispatchOutcome::empty();
            }
            observers
                .iter()
                .map(|r| (r.id, Rc::clone(&r.callback)))
                .collect()
        };
        trace!(?key, observers = snapshot.len(), "dispatching change");

        let mut outcome = DispatchOutcome::empty();
        match self.policy.get() {
            DispatchPolicy::Propagate => {
                for (_, callback) in &snapshot {
                    callback(key);
                    outcome.delivered += 1;
                }
            }
            DispatchPolicy::Isolate => {
                for (id, callback) in &snapshot {
                    match catch_unwind(AssertUnwindSafe(|| callback(key))) {
                        Ok(()) => outcome.delivered += 1,
                        Err(payload) => {
                            let failure = ObserverPanic::from_payload(*id, key, &*payload);
                            warn!(
                                subscription = %id,
                                ?key,
                                panic = %failure.message,
                                "observer panicked during dispatch"
                            );
                            outcome.failures.push(failure);
                        }
                    }
                }
            }
        }
        outcome
    }
}
