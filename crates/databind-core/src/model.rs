#![forbid(unsafe_code)]

//! Plain data record backing [`PersonViewModel`](crate::PersonViewModel).

/// Name used for a freshly constructed record.
pub const DEFAULT_NAME: &str = "John Doe";

/// Age used for a freshly constructed record.
pub const DEFAULT_AGE: i32 = 30;

/// A person record. No constraints are placed on either field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Person {
    pub name: String,
    pub age: i32,
}

impl Person {
    #[must_use]
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

impl Default for Person {
    fn default() -> Self {
        Self::new(DEFAULT_NAME, DEFAULT_AGE)
    }
}
