//! Reflection extracted from the `dx.*` named metadata.
//!
//! Extraction is best effort. Malformed or missing records are logged and
//! leave the matching fields at their defaults. Only the compute thread group
//! dimensions, which have no sensible default, are reported as an error by
//! [`fetch_compute_properties`].

mod layout;
mod meta;
mod resources;
mod signature;

use aero_dxbc::ShaderKind;

use crate::error::ReflectionError;
use crate::ir::{MetadataId, Module};

use self::layout::TypeAnnotations;
use self::meta::MetaReader;

pub use self::layout::{MemberFlags, VarClass, VarType, Variable, VariableType};
pub use self::resources::{
    BindType, ConstantBuffer, Dimension, ResourceBind, ReturnType,
};
pub use self::signature::SignatureElement;

const ENTRY_NAME: usize = 1;
const ENTRY_SIGNATURES: usize = 2;
const ENTRY_PROPERTIES: usize = 4;

const TAG_SHADER_FLAGS: u64 = 0;
const TAG_GEOMETRY: u64 = 1;
const TAG_DOMAIN: u64 = 2;
const TAG_NUM_THREADS: u64 = 4;

const GEOMETRY_OUTPUT_TOPOLOGY: usize = 3;
const DOMAIN_KIND: usize = 0;
const DOMAIN_ISOLINE: u64 = 1;

/// Primitive topology values, numbered as `D3D_PRIMITIVE_TOPOLOGY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    Undefined,
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
    LineListAdj,
    LineStripAdj,
    TriangleListAdj,
    TriangleStripAdj,
    Unknown(u32),
}

impl PrimitiveTopology {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Undefined,
            1 => Self::PointList,
            2 => Self::LineList,
            3 => Self::LineStrip,
            4 => Self::TriangleList,
            5 => Self::TriangleStrip,
            10 => Self::LineListAdj,
            11 => Self::LineStripAdj,
            12 => Self::TriangleListAdj,
            13 => Self::TriangleStripAdj,
            other => Self::Unknown(other),
        }
    }
}

/// A source file embedded in the module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFile {
    pub name: String,
    pub contents: String,
}

/// Everything the debugger needs to know about a shader's interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderReflection {
    pub entry_name: String,
    /// `ps_6_0` style target name.
    pub shader_model: String,
    pub shader_flags: u64,
    pub compiler_identity: String,
    pub compile_flags: String,
    /// Embedded sources, main file first.
    pub source_files: Vec<SourceFile>,
    pub defines: Vec<String>,
    pub validator_version: Option<(u32, u32)>,
    pub dxil_version: Option<(u32, u32)>,

    pub srvs: Vec<ResourceBind>,
    pub uavs: Vec<ResourceBind>,
    pub samplers: Vec<ResourceBind>,
    pub cbuffers: Vec<ConstantBuffer>,
    /// Element layouts of structured buffers, by resource name.
    pub resource_binds: Vec<(String, VariableType)>,

    pub input_signature: Vec<SignatureElement>,
    pub output_signature: Vec<SignatureElement>,
    pub patch_constant_signature: Vec<SignatureElement>,

    pub dispatch_threads_dimension: [u32; 3],
}

impl ShaderReflection {
    /// Element layout recorded for the structured buffer `name`.
    pub fn resource_layout(&self, name: &str) -> Option<&VariableType> {
        self.resource_binds
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, layout)| layout)
    }
}

/// Builds the reflection record of `module`.
pub fn extract(module: &Module) -> ShaderReflection {
    let meta = MetaReader::new(module);
    let annotations = TypeAnnotations::from_module(meta);

    let mut refl = ShaderReflection {
        dispatch_threads_dimension: [1, 1, 1],
        ..ShaderReflection::default()
    };

    refl.shader_model = shader_model(meta);
    refl.validator_version = version(meta, "dx.valver");
    refl.dxil_version = version(meta, "dx.version");
    refl.compiler_identity = meta
        .root("llvm.ident")
        .and_then(|n| meta.child_str(n, 0))
        .unwrap_or_default()
        .to_owned();
    source_info(meta, &mut refl);

    match meta.root("dx.entryPoints") {
        Some(entry) => {
            refl.entry_name = meta.child_str(entry, ENTRY_NAME).unwrap_or_default().to_owned();
            let sigs = signature::collect(meta, meta.child(entry, ENTRY_SIGNATURES));
            refl.input_signature = sigs.inputs;
            refl.output_signature = sigs.outputs;
            refl.patch_constant_signature = sigs.patch_constants;
            if let Some(flags) = entry_property(meta, entry, TAG_SHADER_FLAGS) {
                refl.shader_flags = meta.int(flags).unwrap_or(0);
            }
        }
        None => tracing::warn!("module has no entry point metadata"),
    }

    let lists = resources::collect(meta, &annotations);
    refl.srvs = lists.srvs;
    refl.uavs = lists.uavs;
    refl.cbuffers = lists.cbuffers;
    refl.samplers = lists.samplers;
    refl.resource_binds = lists.element_layouts;

    refl
}

/// Primitive topology emitted by a geometry or domain shader. Other stages
/// report a triangle list.
pub fn output_topology(module: &Module) -> PrimitiveTopology {
    let meta = MetaReader::new(module);
    let (tag, index) = match module.shader_kind {
        ShaderKind::Geometry => (TAG_GEOMETRY, GEOMETRY_OUTPUT_TOPOLOGY),
        ShaderKind::Domain => (TAG_DOMAIN, DOMAIN_KIND),
        _ => return PrimitiveTopology::TriangleList,
    };

    let value = meta
        .root("dx.entryPoints")
        .and_then(|entry| entry_property(meta, entry, tag))
        .and_then(|state| meta.child_int(state, index));
    let Some(value) = value else {
        tracing::error!(stage = module.shader_kind.name(), "couldn't find topology tag in shader");
        return PrimitiveTopology::TriangleList;
    };

    match module.shader_kind {
        ShaderKind::Domain if value == DOMAIN_ISOLINE => PrimitiveTopology::LineList,
        ShaderKind::Domain => PrimitiveTopology::TriangleList,
        _ => PrimitiveTopology::from_raw(value as u32),
    }
}

/// Adds the compute built-in inputs to `refl` and reads the thread group size.
///
/// When the size is missing `{1, 1, 1}` is stored and an error returned.
pub fn fetch_compute_properties(
    module: &Module,
    refl: &mut ShaderReflection,
) -> Result<(), ReflectionError> {
    refl.input_signature
        .extend(signature::compute_builtins(module));

    let meta = MetaReader::new(module);
    refl.dispatch_threads_dimension = [1, 1, 1];

    let Some(entry) = meta.root("dx.entryPoints") else {
        tracing::error!("couldn't find an entry point for thread dimensions");
        return Err(ReflectionError::MissingEntryPoint);
    };
    if module
        .named_metadata("dx.entryPoints")
        .is_some_and(|n| n.children.len() > 1)
    {
        tracing::warn!("multiple entry points; reading thread dimensions from the first");
    }

    let dims = entry_property(meta, entry, TAG_NUM_THREADS).and_then(|dims| {
        Some([
            meta.child_int(dims, 0)? as u32,
            meta.child_int(dims, 1)? as u32,
            meta.child_int(dims, 2)? as u32,
        ])
    });
    match dims {
        Some(dims) => {
            refl.dispatch_threads_dimension = dims;
            Ok(())
        }
        None => {
            let entry = meta.child_str(entry, ENTRY_NAME).unwrap_or_default().to_owned();
            tracing::error!(%entry, "couldn't find thread dimension tag in shader");
            Err(ReflectionError::MissingThreadDimensions { entry })
        }
    }
}

fn entry_property(meta: MetaReader<'_>, entry: MetadataId, tag: u64) -> Option<MetadataId> {
    meta.tags(meta.child(entry, ENTRY_PROPERTIES))
        .into_iter()
        .find(|(t, _)| *t == tag)
        .and_then(|(_, value)| value)
}

fn shader_model(meta: MetaReader<'_>) -> String {
    let Some(node) = meta.root("dx.shaderModel") else {
        return String::new();
    };
    format!(
        "{}_{}_{}",
        meta.child_str(node, 0).unwrap_or_default(),
        meta.child_u32(node, 1),
        meta.child_u32(node, 2)
    )
}

fn version(meta: MetaReader<'_>, name: &str) -> Option<(u32, u32)> {
    let node = meta.root(name)?;
    Some((meta.child_int(node, 0)? as u32, meta.child_int(node, 1)? as u32))
}

fn source_info(meta: MetaReader<'_>, refl: &mut ShaderReflection) {
    for file in meta.roots("dx.source.contents") {
        refl.source_files.push(SourceFile {
            name: meta.child_str(file, 0).unwrap_or_default().to_owned(),
            contents: meta.child_str(file, 1).unwrap_or_default().to_owned(),
        });
    }

    let main = meta
        .root("dx.source.mainFileName")
        .and_then(|n| meta.child_str(n, 0));
    if let Some(main) = main {
        match refl.source_files.iter().position(|f| f.name == main) {
            Some(index) => {
                let file = refl.source_files.remove(index);
                refl.source_files.insert(0, file);
            }
            None => tracing::warn!(main, "main source file is not embedded"),
        }
    }

    if let Some(defines) = meta.root("dx.source.defines") {
        refl.defines = meta.strings(defines);
    }
    if let Some(args) = meta.root("dx.source.args") {
        refl.compile_flags = meta.strings(args).join(" ");
    }
}
