//! Zero-copy table serialization.
//!
//! Buffers are assembled bottom-up by a [`Builder`] and read in place through
//! [`Table`] views: every field is reached by a vtable lookup plus relative
//! offsets, so nothing is parsed or copied up front.
//!
//! The crate is schema agnostic. Typed accessors for a concrete schema are thin
//! wrappers around [`Table`] and [`Builder`] that fix the field indices and
//! defaults (see the `tablebuf-testkit` crate for such wrappers).

pub mod builder;
pub mod codec;
pub mod follow;
pub mod offset;
pub mod table;
pub mod vector;
pub mod vtable;


pub use builder::{Builder, BuilderOptions, BuilderState};
pub use codec::{Scalar, Struct, read_scalar, resolve};
pub use follow::{Follow, ForwardsOffset, Inline, Packed};
pub use offset::{AnyTable, FieldIndex, Offset};
pub use table::{Table, buffer_has_identifier, file_identifier, get_root, get_root_at, root};
pub use vector::Vector;
pub use vtable::{VTable, VTableCache};

pub use tablebuf_bytes::Bytes;
pub use tablebuf_common::{Result, error::Error};
