//! In-memory DXIL modules and the tooling a shader debugger builds on them.
//!
//! - [`ir`]: the arena-based IR graph (types, constants, metadata, functions).
//! - [`slots`]: deterministic numbering of metadata and unnamed locals.
//! - [`disasm`]: LLVM-style disassembly in two dialects.
//! - [`reflect`]: resource, signature and compile information from `dx.*`
//!   metadata.
//!
//! [`Program`] ties these together for a single shader.

#![forbid(unsafe_code)]

pub mod disasm;
mod error;
pub mod ir;
mod program;
pub mod reflect;
pub mod slots;

/// Builders for synthetic modules.
///
/// This module is only available when compiling this crate's own tests, or when
/// the `test-utils` feature is enabled. It is **not** considered part of the
/// stable API.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::disasm::{render, Dialect, Disassembly};
pub use crate::error::ReflectionError;
pub use crate::ir::Module;
pub use crate::program::Program;
pub use crate::reflect::{PrimitiveTopology, ShaderReflection};
pub use crate::slots::SlotOwner;
