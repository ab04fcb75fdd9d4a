//! The type-erased buffer engine.

use std::alloc::Layout;

use ravel_common::{Result, error::Error, verify_arg};

use crate::raw::RawRegion;

/// A contiguous, growable list of opaque fixed-size values.
///
/// Elements are byte blocks of exactly `elem_size` bytes, identified only by
/// that declared size; values cross the API as byte slices of that length.
/// The list manages its own capacity:
///
/// - **Growth**: a push into a full list doubles the capacity (from `0` to
///   `1` on the first allocation). Newly allocated byte ranges are
///   zero-filled.
/// - **Shrink**: a pop that leaves the occupancy below a quarter of the
///   capacity halves the capacity, never dropping below `1` once allocated.
///
/// Failed operations leave the list unchanged, with one documented
/// exception: when the shrink reallocation inside [`pop`](ErasedList::pop)
/// fails, the element removal is already final and only the capacity change
/// is abandoned.
///
/// The list is single-owner and carries no internal synchronization; wrap it
/// in an external lock for shared access.
pub struct ErasedList {
    region: RawRegion,
    len: usize,
}

impl ErasedList {
    /// Creates an empty list for elements of `elem_size` bytes, without
    /// allocating.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `elem_size` is zero or not a
    /// valid allocation size.
    pub fn new(elem_size: usize) -> Result<ErasedList> {
        Self::with_capacity(0, elem_size)
    }

    /// Creates a list with the given slot capacity, zero-initialized.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `elem_size` is invalid, or an
    /// `Alloc` error if the backing allocation cannot be satisfied.
    pub fn with_capacity(capacity: usize, elem_size: usize) -> Result<ErasedList> {
        let elem_layout = Layout::from_size_align(elem_size, 1)
            .map_err(|_| Error::invalid_arg("elem_size", "not a valid allocation size"))?;
        Self::with_capacity_and_layout(capacity, elem_layout)
    }

    /// Creates an empty list for elements of the given layout.
    ///
    /// The slot stride is the layout size padded to its alignment, and the
    /// backing buffer honors the layout alignment. This is the entry point
    /// used by [`TypedList`](crate::typed::TypedList).
    pub fn with_elem_layout(elem_layout: Layout) -> Result<ErasedList> {
        Self::with_capacity_and_layout(0, elem_layout)
    }

    /// Creates a list with the given slot capacity and element layout.
    pub fn with_capacity_and_layout(capacity: usize, elem_layout: Layout) -> Result<ErasedList> {
        Ok(ErasedList {
            region: RawRegion::with_capacity(capacity, elem_layout)?,
            len: 0,
        })
    }

    /// Returns the number of occupied element slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of element slots the list can hold without
    /// reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.capacity()
    }

    /// Returns the slot stride in bytes.
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.region.elem_size()
    }

    /// Appends one element to the end of the list, growing the capacity if
    /// the list is full.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `value` is not exactly
    /// `elem_size` bytes, or an `Alloc` error if growth fails; in both cases
    /// the list is unchanged.
    pub fn push(&mut self, value: &[u8]) -> Result<()> {
        self.verify_value(value)?;
        if self.len == self.capacity() {
            self.grow()?;
        }
        let range = self.slot_range(self.len);
        self.region.as_bytes_mut()[range].copy_from_slice(value);
        self.len += 1;
        Ok(())
    }

    /// Removes the last element, optionally copying it into `out` first.
    ///
    /// After removal, the capacity is halved when the remaining occupancy
    /// falls below a quarter of it (and the capacity exceeds `1`).
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is unallocated or
    /// empty, or if `out` has the wrong length (the list is unchanged in
    /// those cases). Returns an `Alloc` error if the shrink reallocation
    /// fails; the element removal is already final then and the capacity
    /// stays as it was.
    pub fn pop(&mut self, out: Option<&mut [u8]>) -> Result<()> {
        if self.capacity() == 0 || self.len == 0 {
            return Err(Error::invalid_arg("pop", "list is unallocated or empty"));
        }
        if let Some(out) = out {
            self.verify_value(out)?;
            let range = self.slot_range(self.len - 1);
            out.copy_from_slice(&self.region.as_bytes()[range]);
        }
        self.len -= 1;

        let capacity = self.capacity();
        if capacity > 1 && self.len < capacity / 4 {
            self.region.resize((capacity / 2).max(1))?;
        }
        Ok(())
    }

    /// Copies the last element into `out` without removing it.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is unallocated or
    /// empty, or if `out` has the wrong length.
    pub fn peek(&self, out: &mut [u8]) -> Result<()> {
        if self.capacity() == 0 || self.len == 0 {
            return Err(Error::invalid_arg("peek", "list is unallocated or empty"));
        }
        self.get(self.len - 1, out)
    }

    /// Copies the element at `index` into `out`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is unallocated or
    /// `out` has the wrong length, or an `OutOfBounds` error if
    /// `index >= len`.
    pub fn get(&self, index: usize, out: &mut [u8]) -> Result<()> {
        self.verify_value(out)?;
        out.copy_from_slice(self.slot(index)?);
        Ok(())
    }

    /// Overwrites the element at `index` with `value`.
    ///
    /// Setting is only permitted within the occupied range; it is not an
    /// insert.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the list is unallocated or
    /// `value` has the wrong length, or an `OutOfBounds` error if
    /// `index >= len`.
    pub fn set(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.verify_value(value)?;
        self.slot_mut(index)?.copy_from_slice(value);
        Ok(())
    }

    /// Borrows the element at `index` as a byte slice.
    ///
    /// An unallocated list is an `InvalidArgument` error, checked before the
    /// bounds; an allocated-but-empty one reports `OutOfBounds`.
    pub fn slot(&self, index: usize) -> Result<&[u8]> {
        if self.capacity() == 0 {
            return Err(Error::invalid_arg("slot", "list is unallocated"));
        }
        if index >= self.len {
            return Err(Error::out_of_bounds(index, self.len));
        }
        let range = self.slot_range(index);
        Ok(&self.region.as_bytes()[range])
    }

    /// Mutably borrows the element at `index` as a byte slice.
    pub fn slot_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        if self.capacity() == 0 {
            return Err(Error::invalid_arg("slot", "list is unallocated"));
        }
        if index >= self.len {
            return Err(Error::out_of_bounds(index, self.len));
        }
        let range = self.slot_range(index);
        Ok(&mut self.region.as_bytes_mut()[range])
    }

    /// Removes all elements. The capacity and backing buffer are retained.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Reallocates the backing buffer to hold exactly `new_capacity` slots.
    ///
    /// Truncates the occupancy when the new capacity is below it; the
    /// internal grow and shrink paths never request such a capacity, so
    /// truncation is only reachable through this direct call.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `new_capacity` is zero, or an
    /// `Alloc` error if the reallocation fails; the list is unchanged on
    /// failure.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        self.region.resize(new_capacity)?;
        if self.len > new_capacity {
            self.len = new_capacity;
        }
        Ok(())
    }

    /// Frees the backing buffer and resets the list to its pristine empty
    /// state. Idempotent; the list can be used again afterwards and will
    /// allocate from scratch.
    pub fn release(&mut self) {
        self.region.release();
        self.len = 0;
    }

    /// Returns the occupied prefix of the list as raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.region.as_bytes()[..self.len * self.elem_size()]
    }

    /// Returns the occupied prefix of the list as mutable raw bytes.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let end = self.len * self.elem_size();
        &mut self.region.as_bytes_mut()[..end]
    }

    /// Doubles the capacity, allocating a single slot on first use.
    fn grow(&mut self) -> Result<()> {
        let capacity = self.capacity();
        let new_capacity = if capacity == 0 { 1 } else { capacity * 2 };
        self.region.resize(new_capacity)
    }

    #[inline]
    fn slot_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.elem_size();
        start..start + self.elem_size()
    }

    #[inline]
    fn verify_value(&self, value: &[u8]) -> Result<()> {
        verify_arg!(value, value.len() == self.elem_size());
        Ok(())
    }
}

impl std::fmt::Debug for ErasedList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErasedList")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("elem_size", &self.elem_size())
            .finish_non_exhaustive()
    }
}
