//! Typed user data attached to stage nodes
//!
//! Scripting and gameplay layers hang arbitrary values off nodes. Retrieval is
//! typed: asking for the wrong type yields `None` rather than a bad cast.

use std::any::{Any, TypeId};
use std::fmt;

/// Optional, dynamically typed value
#[derive(Default)]
pub struct UserData {
    value: Option<Box<dyn Any + Send>>,
}

impl UserData {
    /// Empty carrier
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Store a value, replacing any previous one
    pub fn set<T: Any + Send>(&mut self, value: T) {
        self.value = Some(Box::new(value));
    }

    /// Whether any value is stored
    pub const fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the stored value has type `T`
    pub fn holds<T: Any>(&self) -> bool {
        self.value
            .as_ref()
            .is_some_and(|value| (**value).type_id() == TypeId::of::<T>())
    }

    /// Borrow the stored value as `T`
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_ref()?.downcast_ref::<T>()
    }

    /// Mutably borrow the stored value as `T`
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.as_mut()?.downcast_mut::<T>()
    }

    /// Remove and return the stored value if it has type `T`.
    ///
    /// A value of another type is left in place.
    pub fn take<T: Any>(&mut self) -> Option<T> {
        if !self.holds::<T>() {
            return None;
        }
        let boxed = self.value.take()?;
        boxed.downcast::<T>().ok().map(|value| *value)
    }

    /// Drop the stored value
    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserData").field("is_set", &self.is_set()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_retrieval() {
        let mut data = UserData::new();
        assert!(!data.is_set());

        data.set(42_u32);
        assert!(data.is_set());
        assert_eq!(data.get::<u32>(), Some(&42));
        assert_eq!(data.get::<i64>(), None);
    }

    #[test]
    fn test_take_wrong_type_keeps_value() {
        let mut data = UserData::new();
        data.set(String::from("player"));

        assert_eq!(data.take::<u8>(), None);
        assert!(data.is_set());
        assert_eq!(data.take::<String>().as_deref(), Some("player"));
        assert!(!data.is_set());
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut data = UserData::new();
        data.set(vec![1, 2]);
        if let Some(list) = data.get_mut::<Vec<i32>>() {
            list.push(3);
        }
        assert_eq!(data.get::<Vec<i32>>().map(Vec::len), Some(3));
    }
}
