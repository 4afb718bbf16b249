//! Presence-tracked artifact holders
//!
//! A [`Slot`] binds an identifier to an optional typed value. The value and
//! its presence live in one `Option`, so they can never disagree.
//! [`SlotEntry`] is the type-erased view a [`crate::Resources`] registry
//! hands out so slots of different types can be iterated uniformly.

use std::any::Any;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A named, presence-tracked holder for one artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<T> {
    id: String,
    value: Option<T>,
}

impl<T> Slot<T> {
    /// Create an empty slot
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: None,
        }
    }

    /// Identifier, unique within a registry
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether a value has been assigned
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// The value, if present
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Mutable access to the value, if present
    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Assign a value, marking the slot present
    pub fn set(&mut self, value: T) -> &mut T {
        self.value.insert(value)
    }

    /// Remove the value, marking the slot absent
    pub fn clear(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T: Default> Slot<T> {
    /// Mutable access to the value, assigning `T::default()` first if absent
    pub fn get_or_insert_default(&mut self) -> &mut T {
        self.value.get_or_insert_with(T::default)
    }
}

/// Uniform, type-erased view of a [`Slot`]
pub trait SlotEntry {
    /// Slot identifier
    fn id(&self) -> &str;

    /// Whether the slot holds a value
    fn is_present(&self) -> bool;

    /// Decode `body` into the slot's type and mark the slot present.
    ///
    /// On error the slot is left unchanged.
    fn fill(&mut self, body: Value) -> Result<(), serde_json::Error>;

    /// Structural equality with another entry of the same type.
    ///
    /// Absent slots compare equal to each other. Entries of different types
    /// never compare equal.
    fn same_value(&self, other: &dyn SlotEntry) -> bool;

    /// JSON rendering of the value for diagnostics
    fn snapshot(&self) -> Option<Value>;

    /// Downcasting hook for [`SlotEntry::same_value`]
    fn as_any(&self) -> &dyn Any;
}

impl<T> SlotEntry for Slot<T>
where
    T: Serialize + DeserializeOwned + PartialEq + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn is_present(&self) -> bool {
        self.value.is_some()
    }

    fn fill(&mut self, body: Value) -> Result<(), serde_json::Error> {
        let value = serde_json::from_value(body)?;
        self.value = Some(value);
        Ok(())
    }

    fn same_value(&self, other: &dyn SlotEntry) -> bool {
        other
            .as_any()
            .downcast_ref::<Slot<T>>()
            .is_some_and(|other| self.value == other.value)
    }

    fn snapshot(&self) -> Option<Value> {
        self.value
            .as_ref()
            .map(|v| serde_json::to_value(v).unwrap_or_else(|e| Value::String(e.to_string())))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
