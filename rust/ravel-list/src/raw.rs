//! Fallible allocation of element-slot regions.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use ravel_common::{Result, error::Error, verify_arg};

/// A contiguous memory region sized in element slots, with fallible
/// reallocation.
///
/// `RawRegion` is the allocation primitive underneath [`ErasedList`]: it owns
/// the backing buffer and knows nothing about occupancy. Capacity is counted
/// in slots of a fixed element layout, established at construction.
///
/// Invariants:
/// - A region of capacity `0` owns no allocation; its pointer is a
///   well-aligned placeholder that is never dereferenced.
/// - Every allocated byte is initialized: fresh allocations are zeroed, and
///   growth zero-fills the newly added byte range. Slack bytes beyond any
///   caller-tracked length therefore always read as valid (if stale) data.
/// - Reallocation failure leaves the region untouched.
///
/// [`ErasedList`]: crate::erased::ErasedList
pub struct RawRegion {
    ptr: NonNull<u8>,
    capacity: usize,
    elem_layout: Layout,
}

// The region exclusively owns its allocation and stores plain bytes.
unsafe impl Send for RawRegion {}
unsafe impl Sync for RawRegion {}

impl RawRegion {
    /// Creates an empty region for elements of the given layout, without
    /// allocating.
    ///
    /// The layout is padded to its alignment so that consecutive slots stay
    /// properly aligned.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the element size is zero.
    pub fn new(elem_layout: Layout) -> Result<RawRegion> {
        verify_arg!(elem_layout, elem_layout.size() != 0);
        let elem_layout = elem_layout.pad_to_align();
        Ok(RawRegion {
            ptr: Self::dangling(elem_layout),
            capacity: 0,
            elem_layout,
        })
    }

    /// Creates a region with the requested slot capacity, zero-initialized.
    ///
    /// A capacity of `0` allocates nothing.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if the element size is zero, or an
    /// `Alloc` error if the allocation cannot be satisfied.
    pub fn with_capacity(capacity: usize, elem_layout: Layout) -> Result<RawRegion> {
        let mut region = Self::new(elem_layout)?;
        if capacity != 0 {
            region.resize(capacity)?;
        }
        Ok(region)
    }

    /// Returns the region capacity in element slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the slot stride in bytes (element size padded to its
    /// alignment).
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.elem_layout.size()
    }

    /// Returns the element layout of the region.
    #[inline]
    pub fn elem_layout(&self) -> Layout {
        self.elem_layout
    }

    /// Returns the total allocated size in bytes.
    #[inline]
    pub fn byte_capacity(&self) -> usize {
        self.capacity * self.elem_size()
    }

    /// Returns a raw pointer to the start of the region.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Returns a mutable raw pointer to the start of the region.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Returns the entire region as a byte slice, occupied slots and slack
    /// alike.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: every allocated byte is initialized (see type invariants),
        // and a zero-capacity region yields an empty slice from the aligned
        // placeholder pointer.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.byte_capacity()) }
    }

    /// Returns the entire region as a mutable byte slice.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: same as `as_bytes`, with exclusive access through `&mut self`.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.byte_capacity()) }
    }

    /// Reallocates the region to hold exactly `new_capacity` slots.
    ///
    /// Existing bytes are preserved up to the smaller of the old and new
    /// sizes. When growing, the newly added byte range is zero-filled. When
    /// the requested capacity equals the current one, this is a successful
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `new_capacity` is zero, or an
    /// `Alloc` error if the byte size overflows or the allocator fails; the
    /// region is left unchanged on failure.
    pub fn resize(&mut self, new_capacity: usize) -> Result<()> {
        verify_arg!(new_capacity, new_capacity != 0);
        if new_capacity == self.capacity {
            return Ok(());
        }

        let new_layout = self.region_layout(new_capacity)?;
        let new_ptr = if self.capacity == 0 {
            // SAFETY: new_layout has a nonzero size.
            unsafe { alloc::alloc_zeroed(new_layout) }
        } else {
            let old_layout = self.region_layout(self.capacity).expect("old layout");
            // SAFETY: the current pointer was allocated with old_layout, and
            // new_layout.size() is nonzero and does not overflow isize.
            let p = unsafe { alloc::realloc(self.ptr.as_ptr(), old_layout, new_layout.size()) };
            if !p.is_null() && new_layout.size() > old_layout.size() {
                // SAFETY: p spans new_layout.size() bytes; zero the added range.
                unsafe {
                    p.add(old_layout.size())
                        .write_bytes(0, new_layout.size() - old_layout.size());
                }
            }
            p
        };

        let Some(ptr) = NonNull::new(new_ptr) else {
            return Err(Error::alloc(new_layout.size()));
        };
        self.ptr = ptr;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Frees the allocation and returns the region to its pristine
    /// zero-capacity state. Idempotent.
    pub fn release(&mut self) {
        if self.capacity != 0 {
            let layout = self.region_layout(self.capacity).expect("region layout");
            // SAFETY: the pointer was allocated with this layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
            self.ptr = Self::dangling(self.elem_layout);
            self.capacity = 0;
        }
    }

    /// Computes the allocation layout for the given slot capacity.
    fn region_layout(&self, capacity: usize) -> Result<Layout> {
        let bytes = self
            .elem_size()
            .checked_mul(capacity)
            .ok_or_else(|| Error::alloc(usize::MAX))?;
        Layout::from_size_align(bytes, self.elem_layout.align()).map_err(|_| Error::alloc(bytes))
    }

    /// A well-aligned placeholder pointer for the zero-capacity state.
    fn dangling(elem_layout: Layout) -> NonNull<u8> {
        // SAFETY: alignments are nonzero, so the address is nonzero.
        unsafe { NonNull::new_unchecked(std::ptr::without_provenance_mut(elem_layout.align())) }
    }
}

impl Drop for RawRegion {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for RawRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRegion")
            .field("capacity", &self.capacity)
            .field("elem_size", &self.elem_size())
            .field("elem_align", &self.elem_layout.align())
            .finish_non_exhaustive()
    }
}
