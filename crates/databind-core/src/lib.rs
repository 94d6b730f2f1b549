#![forbid(unsafe_code)]

//! Observable records with property-change notification.
//!
//! # Role
//! `databind-core` holds bindable state for a presentation layer. It does not
//! render, persist or validate anything; callers subscribe to change
//! notifications and do that work themselves.
//!
//! # Primary pieces
//! - [`Person`]: plain data record.
//! - [`PersonViewModel`]: record wrapper whose setters raise a [`Property`]
//!   notification after assigning.
//! - [`PropertyNotifier`]: the ordered observer list behind it, usable with
//!   any `Copy` key type.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use databind_core::{PersonViewModel, Property};
//!
//! let vm = PersonViewModel::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! vm.subscribe(move |p| sink.borrow_mut().push(p));
//!
//! vm.set_name("Alice");
//! vm.set_age(31);
//! assert_eq!(*log.borrow(), vec![Property::Name, Property::Age]);
//! ```

pub mod error;
pub mod model;
pub mod notifier;
pub mod view_model;

pub use error::ObserverPanic;
pub use model::Person;
pub use notifier::{DispatchOutcome, DispatchPolicy, PropertyNotifier, SubscriptionId};
pub use view_model::{PersonViewModel, Property, WeakPersonViewModel};
