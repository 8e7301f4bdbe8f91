//! Copy-on-write vector
//!
//! [`CowVec`] shares its backing buffer between clones. Cloning is O(1) and
//! leaves every handle non-unique; the first mutation through a shared handle
//! deep-copies the buffer so the other holders keep seeing the original data.
//! Reads never copy.
//!
//! The reference count is atomic, but mutation always goes through `&mut self`,
//! so two threads can never write the same handle at once. Coordinating access
//! to a handle that is shared between threads is the caller's job.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Vector with shared, copy-on-write storage
pub struct CowVec<T> {
    data: Arc<Vec<T>>,
}

impl<T> CowVec<T> {
    /// Empty vector
    pub fn new() -> Self {
        Self {
            data: Arc::new(Vec::new()),
        }
    }

    /// Empty vector with room for `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Arc::new(Vec::with_capacity(capacity)),
        }
    }

    /// Take ownership of an existing vector without copying
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    /// True when this handle is the only owner of the buffer
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.data) == 1
    }

    /// Number of handles sharing the buffer
    pub fn owner_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// True when both handles point at the same buffer
    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Address of the backing buffer, stable until the next mutation
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Element at `index`
    pub fn at(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Read-only view of the elements
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    /// Allocated capacity of the backing buffer
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Remove every element.
    ///
    /// A shared buffer is not copied first; this handle simply detaches to a
    /// fresh empty buffer.
    pub fn clear(&mut self) {
        match Arc::get_mut(&mut self.data) {
            Some(data) => data.clear(),
            None => self.data = Arc::new(Vec::new()),
        }
    }
}

impl<T: Clone> CowVec<T> {
    /// Exclusive access to the buffer, copying it first if it is shared
    pub fn make_mut(&mut self) -> &mut Vec<T> {
        Arc::make_mut(&mut self.data)
    }

    /// Append an element
    pub fn push(&mut self, value: T) {
        self.make_mut().push(value);
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Option<T> {
        self.make_mut().pop()
    }

    /// Mutable element at `index`, or `None` when out of bounds.
    ///
    /// An out-of-bounds index does not trigger a copy.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len() {
            return None;
        }
        self.make_mut().get_mut(index)
    }

    /// Overwrite the element at `index`. Returns false when out of bounds.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.at_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Resize to `len` elements, filling with `value`
    pub fn resize(&mut self, len: usize, value: T) {
        self.make_mut().resize(len, value);
    }

    /// Reserve room for `additional` more elements
    pub fn reserve(&mut self, additional: usize) {
        self.make_mut().reserve(additional);
    }

    /// Release unused capacity
    pub fn shrink_to_fit(&mut self) {
        self.make_mut().shrink_to_fit();
    }

    /// Append every element of `items`
    pub fn extend_from_slice(&mut self, items: &[T]) {
        self.make_mut().extend_from_slice(items);
    }

    /// Mutable view of the elements
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.make_mut().as_mut_slice()
    }
}

impl<T> Clone for CowVec<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if !Arc::ptr_eq(&self.data, &source.data) {
            self.data = Arc::clone(&source.data);
        }
    }
}

impl<T> Default for CowVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for CowVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> From<Vec<T>> for CowVec<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T> FromIterator<T> for CowVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: PartialEq> PartialEq for CowVec<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}

impl<T: fmt::Debug> fmt::Debug for CowVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CowVec")
            .field("owners", &self.owner_count())
            .field("data", &self.data)
            .finish()
    }
}
