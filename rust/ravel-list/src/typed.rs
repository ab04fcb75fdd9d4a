//! A typed view over the erased buffer engine.

use std::alloc::Layout;
use std::marker::PhantomData;

use bytemuck::Zeroable;
use ravel_common::Result;

use crate::erased::ErasedList;

/// A growable list of values of type `T`, backed by [`ErasedList`].
///
/// `TypedList` delegates every operation to the erased engine, so the growth
/// and shrink policies are identical; the type parameter only fixes the
/// element size and alignment at compile time and removes the byte-slice
/// plumbing from the call sites.
///
/// `T` must have a defined byte representation with no uninitialized
/// padding (`bytemuck::NoUninit`) and accept any bit pattern
/// (`bytemuck::AnyBitPattern`). Zero-sized types are not supported.
pub struct TypedList<T> {
    inner: ErasedList,
    _marker: PhantomData<T>,
}

impl<T> TypedList<T>
where
    T: bytemuck::NoUninit + bytemuck::AnyBitPattern,
{
    /// Creates an empty list without allocating.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub fn new() -> TypedList<T> {
        assert!(size_of::<T>() != 0, "zero-sized element types are not supported");
        TypedList {
            inner: ErasedList::with_elem_layout(Layout::new::<T>()).expect("element layout"),
            _marker: PhantomData,
        }
    }

    /// Creates a list with the given slot capacity, zero-initialized.
    ///
    /// # Errors
    ///
    /// Returns an `Alloc` error if the backing allocation cannot be
    /// satisfied.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub fn with_capacity(capacity: usize) -> Result<TypedList<T>> {
        assert!(size_of::<T>() != 0, "zero-sized element types are not supported");
        Ok(TypedList {
            inner: ErasedList::with_capacity_and_layout(capacity, Layout::new::<T>())?,
            _marker: PhantomData,
        })
    }

    /// Returns the number of elements in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the list holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of elements the list can hold without
    /// reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Appends a value to the end of the list.
    ///
    /// # Errors
    ///
    /// Returns an `Alloc` error if growth fails; the list is unchanged.
    pub fn push(&mut self, value: T) -> Result<()> {
        self.inner.push(bytemuck::bytes_of(&value))
    }

    /// Removes and returns the last element.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is empty. Returns an
    /// `Alloc` error if the shrink reallocation fails; the element is
    /// already removed in that case and its value is not returned.
    pub fn pop(&mut self) -> Result<T> {
        let mut value = T::zeroed();
        self.inner.pop(Some(bytemuck::bytes_of_mut(&mut value)))?;
        Ok(value)
    }

    /// Returns a copy of the last element without removing it.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is empty.
    pub fn peek(&self) -> Result<T> {
        let mut value = T::zeroed();
        self.inner.peek(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Returns a copy of the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is unallocated, or an
    /// `OutOfBounds` error if `index >= len`.
    pub fn get(&self, index: usize) -> Result<T> {
        let mut value = T::zeroed();
        self.inner.get(index, bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Overwrites the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is unallocated, or an
    /// `OutOfBounds` error if `index >= len`; setting is not an insert.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.inner.set(index, bytemuck::bytes_of(&value))
    }

    /// Removes all elements, retaining the capacity and backing buffer.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Reallocates the backing buffer to hold exactly `new_capacity` slots,
    /// truncating the occupancy when the new capacity is below it.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `new_capacity` is zero, or an
    /// `Alloc` error if the reallocation fails; the list is unchanged on
    /// failure.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        self.inner.resize(new_capacity)
    }

    /// Frees the backing buffer and resets the list to its pristine empty
    /// state. Idempotent.
    pub fn release(&mut self) {
        self.inner.release();
    }

    /// Returns the occupied prefix of the list as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        bytemuck::cast_slice(self.inner.as_bytes())
    }

    /// Returns the occupied prefix of the list as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(self.inner.as_bytes_mut())
    }

    /// Consumes the list and returns the underlying erased engine.
    pub fn into_erased(self) -> ErasedList {
        self.inner
    }
}

impl<T> Default for TypedList<T>
where
    T: bytemuck::NoUninit + bytemuck::AnyBitPattern,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TypedList<T>
where
    T: bytemuck::NoUninit + bytemuck::AnyBitPattern + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedList")
            .field("values", &self.as_slice())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravel_common::error::ErrorKind;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    #[repr(C)]
    struct TestStruct {
        x: i32,
        y: f64,
    }

    unsafe impl bytemuck::Zeroable for TestStruct {}
    unsafe impl bytemuck::Pod for TestStruct {}

    #[test]
    fn test_new() {
        let list = TypedList::<u32>::new();
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), 0);
        assert!(list.is_empty());
        assert!(list.as_slice().is_empty());
    }

    #[test]
    fn test_push_pop_round_trip() {
        let mut list = TypedList::<u32>::new();
        list.push(42).unwrap();
        list.push(7).unwrap();
        assert_eq!(list.as_slice(), &[42, 7]);

        assert_eq!(list.pop().unwrap(), 7);
        assert_eq!(list.pop().unwrap(), 42);
        assert!(list.is_empty());
        assert!(matches!(
            list.pop().unwrap_err().kind(),
            ErrorKind::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_struct_elements() {
        let mut list = TypedList::<TestStruct>::new();
        let a = TestStruct { x: 1, y: 1.5 };
        let b = TestStruct { x: -2, y: 2.25 };
        list.push(a).unwrap();
        list.push(b).unwrap();

        assert_eq!(list.get(0).unwrap(), a);
        assert_eq!(list.peek().unwrap(), b);
        assert_eq!(list.as_slice(), &[a, b]);

        let c = TestStruct { x: 9, y: -0.5 };
        list.set(1, c).unwrap();
        assert_eq!(list.get(1).unwrap(), c);
    }

    #[test]
    fn test_alignment() {
        let mut list = TypedList::<TestStruct>::new();
        list.push(TestStruct { x: 1, y: 2.0 }).unwrap();
        let ptr = list.as_slice().as_ptr();
        assert_eq!(ptr as usize % std::mem::align_of::<TestStruct>(), 0);
    }

    #[test]
    fn test_growth_and_shrink_policies_carry_over() {
        let mut list = TypedList::<u64>::new();
        for i in 0..10u64 {
            list.push(i).unwrap();
        }
        assert_eq!(list.len(), 10);
        assert_eq!(list.capacity(), 16);

        for _ in 0..7 {
            list.pop().unwrap();
        }
        assert_eq!(list.len(), 3);
        assert_eq!(list.capacity(), 8);
    }

    #[test]
    fn test_with_capacity() {
        let list = TypedList::<u32>::with_capacity(12).unwrap();
        assert_eq!(list.capacity(), 12);
        assert_eq!(list.len(), 0);

        let err = TypedList::<u64>::with_capacity(usize::MAX / 2).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Alloc { .. }));
    }

    #[test]
    fn test_bounds() {
        let mut list = TypedList::<u32>::new();
        list.push(1).unwrap();
        list.push(2).unwrap();

        assert_eq!(list.get(1).unwrap(), 2);
        assert!(matches!(
            list.get(2).unwrap_err().kind(),
            ErrorKind::OutOfBounds { index: 2, len: 2 }
        ));
        assert!(matches!(
            list.set(2, 3).unwrap_err().kind(),
            ErrorKind::OutOfBounds { index: 2, len: 2 }
        ));
    }

    #[test]
    fn test_get_set_on_unallocated_list() {
        let mut list = TypedList::<u32>::new();
        assert!(matches!(
            list.get(0).unwrap_err().kind(),
            ErrorKind::InvalidArgument { .. }
        ));
        assert!(matches!(
            list.set(0, 1).unwrap_err().kind(),
            ErrorKind::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_clear_and_release() {
        let mut list = TypedList::<u32>::new();
        for i in 0..5 {
            list.push(i).unwrap();
        }
        let capacity = list.capacity();
        list.clear();
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), capacity);

        list.release();
        assert_eq!(list.capacity(), 0);
        list.push(1).unwrap();
        assert_eq!(list.as_slice(), &[1]);
    }

    #[test]
    fn test_resize_truncates() {
        let mut list = TypedList::<u16>::new();
        for i in 0..8u16 {
            list.push(i).unwrap();
        }
        list.resize(4).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_as_mut_slice() {
        let mut list = TypedList::<u32>::new();
        for i in 0..3 {
            list.push(i).unwrap();
        }
        list.as_mut_slice()[1] = 99;
        assert_eq!(list.as_slice(), &[0, 99, 2]);
    }

    #[test]
    fn test_into_erased() {
        let mut list = TypedList::<u32>::new();
        list.push(0xA1B2C3D4).unwrap();
        let erased = list.into_erased();
        assert_eq!(erased.len(), 1);
        assert_eq!(erased.elem_size(), 4);
        assert_eq!(erased.as_bytes(), &0xA1B2C3D4u32.to_ne_bytes());
    }

    #[test]
    #[should_panic(expected = "zero-sized element types")]
    fn test_zero_sized_type_rejected() {
        let _ = TypedList::<()>::new();
    }
}
