use thiserror::Error;

/// Reflection problems that are reported to the caller.
///
/// The reflection record is still filled with safe defaults when one of these
/// is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    #[error("module has no `dx.entryPoints` entry")]
    MissingEntryPoint,
    #[error("entry point `{entry}` has no thread group dimensions")]
    MissingThreadDimensions { entry: String },
}
