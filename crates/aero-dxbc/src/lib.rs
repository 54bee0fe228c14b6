//! Safe codecs for the auxiliary metadata chunks carried by DXIL shader
//! containers.
//!
//! This crate decodes **untrusted** chunk payloads without panicking or reading
//! out of bounds, and re-encodes structured data byte-for-byte in the layout the
//! shader toolchain produces.
//!
//! It provides:
//!
//! - `RDAT` (runtime data): resource, function and subobject tables used for
//!   library linking and raytracing state objects.
//! - `PSV0` (pipeline state validation): runtime info header, resource
//!   bindings, signature elements and view-ID / IO dependency bitmasks.
//! - The deduplicating string, index-array and byte buffers both chunks use.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
mod macros;

/// Deduplicating string, index and byte buffers.
pub mod buffers;
mod enums;
mod error;
/// Pipeline state validation chunk (`PSV0`).
pub mod psv;
/// Runtime data chunk (`RDAT`).
pub mod rdat;
mod schema;

/// Fixture builders for tests and benchmarks.
///
/// This module is only available when compiling this crate's own tests, or when
/// the `test-utils` feature is enabled. It is **not** considered part of the
/// stable API.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::buffers::{BytesBuffer, BytesRef, IndexArrayLayout, IndexArrays, StringBuffer};
pub use crate::enums::{
    ComponentType, InterpolationMode, ResourceClass, ResourceKind, SemanticKind, ShaderKind,
};
pub use crate::error::DxbcError;
pub use crate::psv::{parse_psv_chunk, write_psv_chunk, PsvData, PsvVersion};
pub use crate::rdat::{parse_rdat_chunk, write_rdat_chunk, RdatData};
