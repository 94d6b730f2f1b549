#![forbid(unsafe_code)]

//! Failure reported when an observer panics under
//! [`DispatchPolicy::Isolate`](crate::DispatchPolicy::Isolate).

use std::any::Any;
use std::fmt;

use crate::notifier::SubscriptionId;

/// An observer panicked while handling a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverPanic<K> {
    /// Registration whose callback panicked.
    pub subscription: SubscriptionId,
    /// Key being dispatched when the panic happened.
    pub key: K,
    /// Panic payload rendered as text.
    pub message: String,
}

impl<K> ObserverPanic<K> {
    pub(crate) fn from_payload(
        subscription: SubscriptionId,
        key: K,
        payload: &(dyn Any + Send),
    ) -> Self {
        Self {
            subscription,
            key,
            message: panic_message(payload),
        }
    }
}

impl<K: fmt::Display> fmt::Display for ObserverPanic<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "observer {} panicked on '{}': {}",
            self.subscription, self.key, self.message
        )
    }
}

impl<K: fmt::Debug + fmt::Display> std::error::Error for ObserverPanic<K> {}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
