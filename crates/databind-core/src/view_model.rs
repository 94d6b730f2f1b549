#![forbid(unsafe_code)]

//! Bindable view model over a [`Person`] record.
//!
//! [`PersonViewModel`] exposes `name` and `age` accessors. Every setter call
//! assigns the value and then raises a [`Property`] change notification,
//! even when the new value equals the old one.
//!
//! # Sharing
//!
//! The record and its observers live behind a shared `Rc`. Cloning the
//! view model yields another handle to the same state. Observers that need
//! to read the record should capture a [`WeakPersonViewModel`] from
//! [`PersonViewModel::downgrade`] so the observer list does not keep its own
//! owner alive.
//!
//! The view model is `!Send` and `!Sync`: it must stay on the thread that
//! created it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::model::Person;
use crate::notifier::{DispatchOutcome, DispatchPolicy, PropertyNotifier, SubscriptionId};

/// Identifies which property of a [`PersonViewModel`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Name,
    Age,
}

impl Property {
    /// Field identifier token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Age => "Age",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Shared {
    person: RefCell<Person>,
    notifier: PropertyNotifier<Property>,
}

/// Observable wrapper around a [`Person`].
///
/// # Invariants
///
/// 1. A setter applies the value before any observer runs.
/// 2. Each setter call produces exactly one dispatch, for its own property.
/// 3. Observers run in registration order.
#[derive(Clone)]
pub struct PersonViewModel {
    shared: Rc<Shared>,
}

impl fmt::Debug for PersonViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonViewModel")
            .field("person", &*self.shared.person.borrow())
            .field("subscriber_count", &self.shared.notifier.len())
            .finish()
    }
}

impl Default for PersonViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonViewModel {
    /// Create a view model over the default record (`"John Doe"`, 30).
    #[must_use]
    pub fn new() -> Self {
        Self::from_person(Person::default())
    }

    #[must_use]
    pub fn from_person(person: Person) -> Self {
        Self {
            shared: Rc::new(Shared {
                person: RefCell::new(person),
                notifier: PropertyNotifier::new(DispatchPolicy::default()),
            }),
        }
    }

    /// Choose how observer panics are handled.
    #[must_use]
    pub fn with_dispatch_policy(self, policy: DispatchPolicy) -> Self {
        self.shared.notifier.set_policy(policy);
        self
    }

    #[must_use]
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.shared.notifier.policy()
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.shared.person.borrow().name.clone()
    }

    #[must_use]
    pub fn age(&self) -> i32 {
        self.shared.person.borrow().age
    }

    /// Borrow the record without cloning.
    pub fn with_person<R>(&self, f: impl FnOnce(&Person) -> R) -> R {
        f(&self.shared.person.borrow())
    }

    /// Clone of the current record.
    #[must_use]
    pub fn snapshot(&self) -> Person {
        self.shared.person.borrow().clone()
    }

    pub fn set_name(&self, value: impl Into<String>) {
        self.shared.person.borrow_mut().name = value.into();
        self.raise(Property::Name);
    }

    pub fn set_age(&self, value: i32) {
        self.shared.person.borrow_mut().age = value;
        self.raise(Property::Age);
    }

    /// Register an observer. Registering the same callback twice makes it
    /// run twice per change.
    pub fn subscribe(&self, observer: impl Fn(Property) + 'static) -> SubscriptionId {
        self.shared.notifier.subscribe(observer)
    }

    /// Remove a registration. Returns `false` for unknown or already removed
    /// ids.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifier.unsubscribe(id)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.notifier.len()
    }

    /// Raise a change notification for `property` without assigning.
    ///
    /// # Panics
    ///
    /// Re-raises an observer panic under [`DispatchPolicy::Propagate`].
    pub fn notify(&self, property: Property) -> DispatchOutcome<Property> {
        self.shared.notifier.notify(property)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakPersonViewModel {
        WeakPersonViewModel {
            shared: Rc::downgrade(&self.shared),
        }
    }

    fn raise(&self, property: Property) {
        trace!(%property, "property changed");
        // Setters never fail; isolated panics were already logged.
        let _ = self.notify(property);
    }
}

/// Non-owning handle to a [`PersonViewModel`].
#[derive(Clone)]
pub struct WeakPersonViewModel {
    shared: Weak<Shared>,
}

impl WeakPersonViewModel {
    /// Returns `None` once every strong handle has been dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<PersonViewModel> {
        self.shared.upgrade().map(|shared| PersonViewModel { shared })
    }
}

impl fmt::Debug for WeakPersonViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPersonViewModel")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn recorder(vm: &PersonViewModel) -> (Rc<RefCell<Vec<Property>>>, SubscriptionId) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let id = vm.subscribe(move |p| sink.borrow_mut().push(p));
        (log, id)
    }

    #[test]
    fn initial_state() {
        let vm = PersonViewModel::new();
        assert_eq!(vm.name(), "John Doe");
        assert_eq!(vm.age(), 30);
        assert_eq!(vm.subscriber_count(), 0);
        assert_eq!(vm.dispatch_policy(), DispatchPolicy::Propagate);
    }

    #[test]
    fn property_tokens() {
        assert_eq!(Property::Name.as_str(), "Name");
        assert_eq!(Property::Age.to_string(), "Age");
    }

    #[test]
    fn setters_without_observers() {
        let vm = PersonViewModel::new();
        vm.set_name("Bob");
        vm.set_age(-1);
        assert_eq!(vm.snapshot(), Person::new("Bob", -1));
    }

    #[test]
    fn set_name_notifies_once_with_name() {
        let vm = PersonViewModel::new();
        let (log, _id) = recorder(&vm);

        vm.set_name("X");
        assert_eq!(*log.borrow(), vec![Property::Name]);
    }

    #[test]
    fn equal_value_still_notifies() {
        let vm = PersonViewModel::new();
        let (log, _id) = recorder(&vm);

        vm.set_age(30);
        vm.set_age(30);
        assert_eq!(*log.borrow(), vec![Property::Age, Property::Age]);
    }

    #[test]
    fn observer_sees_new_value() {
        let vm = PersonViewModel::new();
        let weak = vm.downgrade();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        vm.subscribe(move |p| {
            if let Some(vm) = weak.upgrade() {
                let value = match p {
                    Property::Name => vm.name(),
                    Property::Age => vm.age().to_string(),
                };
                sink.borrow_mut().push(value);
            }
        });

        vm.set_name("Carol");
        vm.set_age(44);
        assert_eq!(*seen.borrow(), vec!["Carol".to_string(), "44".to_string()]);
    }

    #[test]
    fn duplicate_subscription_runs_twice() {
        let vm = PersonViewModel::new();
        let count = Rc::new(Cell::new(0u32));
        let observer = {
            let count = Rc::clone(&count);
            move |_: Property| count.set(count.get() + 1)
        };

        vm.subscribe(observer.clone());
        vm.subscribe(observer);
        vm.set_name("Dan");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn notify_without_assignment() {
        let vm = PersonViewModel::new();
        let (log, _id) = recorder(&vm);

        let outcome = vm.notify(Property::Age);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(*log.borrow(), vec![Property::Age]);
        assert_eq!(vm.age(), 30);
    }

    #[test]
    fn clones_share_state_and_observers() {
        let vm = PersonViewModel::new();
        let (log, _id) = recorder(&vm);

        let other = vm.clone();
        other.set_name("Eve");
        assert_eq!(vm.name(), "Eve");
        assert_eq!(*log.borrow(), vec![Property::Name]);
    }

    #[test]
    fn weak_handle_expires() {
        let vm = PersonViewModel::new();
        let weak = vm.downgrade();
        assert!(weak.upgrade().is_some());
        drop(vm);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn observer_may_set_other_property() {
        let vm = PersonViewModel::new();
        let (log, _id) = recorder(&vm);
        let weak = vm.downgrade();
        vm.subscribe(move |p| {
            if p == Property::Name {
                if let Some(vm) = weak.upgrade() {
                    vm.set_age(vm.age() + 1);
                }
            }
        });

        vm.set_name("Frank");
        assert_eq!(vm.age(), 31);
        assert_eq!(*log.borrow(), vec![Property::Name, Property::Age]);
    }

    #[test]
    fn propagate_keeps_mutation() {
        let vm = PersonViewModel::new();
        vm.subscribe(|_| panic!("render failed"));

        let result = catch_unwind(AssertUnwindSafe(|| vm.set_name("Grace")));
        assert!(result.is_err());
        assert_eq!(vm.name(), "Grace");
    }

    #[test]
    fn isolate_reports_failure() {
        let vm = PersonViewModel::new().with_dispatch_policy(DispatchPolicy::Isolate);
        let bad = vm.subscribe(|_| panic!("render failed"));
        let (log, _id) = recorder(&vm);

        vm.set_age(50);
        assert_eq!(*log.borrow(), vec![Property::Age]);

        let outcome = vm.notify(Property::Name);
        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].subscription, bad);
        assert_eq!(outcome.failures[0].key, Property::Name);
    }

    #[test]
    fn debug_format() {
        let vm = PersonViewModel::new();
        let dbg = format!("{vm:?}");
        assert!(dbg.contains("PersonViewModel"));
        assert!(dbg.contains("John Doe"));
    }
}
