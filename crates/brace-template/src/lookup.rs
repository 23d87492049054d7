//! Attribute lookup: how placeholder names are resolved against caller data.
//!
//! Maps work out of the box. For a plain struct, describe its fields once
//! with [`Accessors`] and wrap a value in a [`Record`]:
//!
//! ```
//! use brace_template::{Accessors, AttributeLookup};
//!
//! struct User { name: String, age: u32 }
//!
//! let accessors = Accessors::new()
//!     .field("Name", |u: &User| u.name.clone())
//!     .field("Age", |u: &User| u.age.to_string());
//! let user = User { name: "Ada".into(), age: 36 };
//! let record = accessors.record(&user);
//!
//! assert_eq!(record.lookup("Age").unwrap().as_deref(), Some("36"));
//! assert_eq!(record.lookup("Email").unwrap(), None);
//! ```

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::ApplyError;

/// Resolves a placeholder name to its text.
pub trait AttributeLookup {
    /// `Ok(None)` when the record has no attribute called `name`.
    fn lookup(&self, name: &str) -> Result<Option<Cow<'_, str>>, ApplyError>;
}

impl<V: AsRef<str>, H: BuildHasher> AttributeLookup for HashMap<String, V, H> {
    fn lookup(&self, name: &str) -> Result<Option<Cow<'_, str>>, ApplyError> {
        Ok(self.get(name).map(|value| Cow::Borrowed(value.as_ref())))
    }
}

impl<V: AsRef<str>> AttributeLookup for BTreeMap<String, V> {
    fn lookup(&self, name: &str) -> Result<Option<Cow<'_, str>>, ApplyError> {
        Ok(self.get(name).map(|value| Cow::Borrowed(value.as_ref())))
    }
}

impl<L: AttributeLookup + ?Sized> AttributeLookup for &L {
    fn lookup(&self, name: &str) -> Result<Option<Cow<'_, str>>, ApplyError> {
        (**self).lookup(name)
    }
}

impl<L: AttributeLookup + ?Sized> AttributeLookup for Box<L> {
    fn lookup(&self, name: &str) -> Result<Option<Cow<'_, str>>, ApplyError> {
        (**self).lookup(name)
    }
}

/// An absent record cannot resolve anything.
impl<L: AttributeLookup> AttributeLookup for Option<L> {
    fn lookup(&self, name: &str) -> Result<Option<Cow<'_, str>>, ApplyError> {
        match self {
            Some(record) => record.lookup(name),
            None => Err(ApplyError::MissingRecord),
        }
    }
}

enum Accessor<T> {
    Plain(fn(&T) -> String),
    Fallible(fn(&T) -> Result<String, String>),
}

/// Named field accessors for values of type `T`.
pub struct Accessors<T> {
    fields: BTreeMap<String, Accessor<T>>,
}

impl<T> Accessors<T> {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, get: fn(&T) -> String) -> Self {
        self.fields.insert(name.into(), Accessor::Plain(get));
        self
    }

    /// An accessor that can fail; its error message ends up in
    /// [`ApplyError::InvalidField`].
    pub fn try_field(mut self, name: impl Into<String>, get: fn(&T) -> Result<String, String>) -> Self {
        self.fields.insert(name.into(), Accessor::Fallible(get));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn record<'a>(&'a self, value: &'a T) -> Record<'a, T> {
        Record {
            value,
            accessors: self,
        }
    }
}

impl<T> Default for Accessors<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A value paired with the accessors that read it.
pub struct Record<'a, T> {
    value: &'a T,
    accessors: &'a Accessors<T>,
}

impl<T> AttributeLookup for Record<'_, T> {
    fn lookup(&self, name: &str) -> Result<Option<Cow<'_, str>>, ApplyError> {
        match self.accessors.fields.get(name) {
            None => Ok(None),
            Some(Accessor::Plain(get)) => Ok(Some(Cow::Owned(get(self.value)))),
            Some(Accessor::Fallible(get)) => match get(self.value) {
                Ok(value) => Ok(Some(Cow::Owned(value))),
                Err(reason) => Err(ApplyError::InvalidField {
                    name: name.to_string(),
                    reason,
                }),
            },
        }
    }
}
