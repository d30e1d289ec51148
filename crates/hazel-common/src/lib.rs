//! Shared host-value model and small utilities for the hazel optimizer.
//!
//! This crate holds everything the type lattice consumes "by capability"
//! rather than by implementation:
//! - `interner` - Interned static strings (`Str` atoms)
//! - `value` - Immutable scalar and container constants
//! - `numeric` - Key coercion helpers
//! - `options` - Process-wide runtime options
//! - `cow` - Uniqueness-aware copy-on-write boxes

pub mod cow;
pub mod interner;
pub mod numeric;
pub mod options;
pub mod value;

pub use cow::CowBox;
pub use interner::Str;
pub use value::{ArrConst, ArrConstRef, ArrKind, ConstKey, Value, ValueKind};
