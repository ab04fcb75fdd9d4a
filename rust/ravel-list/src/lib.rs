//! Type-erased, contiguous, growable containers that store fixed-size elements
//! by value and manage their own backing buffer's capacity.
//!
//! The crate is layered bottom-up:
//!
//! - [`raw::RawRegion`]: the allocation primitive. Owns a contiguous region
//!   sized in element slots, with fallible grow/shrink reallocation and
//!   zero-filling of newly added byte ranges.
//! - [`erased::ErasedList`]: the buffer engine. Tracks occupancy on top of a
//!   `RawRegion` and implements the push/pop growth and shrink policies over
//!   opaque fixed-size byte values.
//! - [`typed::TypedList`]: a generic wrapper over `ErasedList` for `Copy`-able
//!   element types with a defined byte representation (via `bytemuck`).
//!
//! All fallible operations report through [`ravel_common::Result`]; the engine
//! never panics on allocation failure and never partially mutates the
//! container on error, with the single documented exception of the shrink
//! step in [`erased::ErasedList::pop`].

pub mod erased;
pub mod raw;
pub mod typed;

pub use erased::ErasedList;
pub use typed::TypedList;
