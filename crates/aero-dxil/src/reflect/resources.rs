//! Resource bindings from `dx.resources`.

use aero_dxbc::{ComponentType, ResourceClass, ResourceKind};

use crate::ir::{MetadataId, Type, TypeId};

use super::layout::{opaque_bytes, TypeAnnotations, Variable, VariableType};
use super::meta::MetaReader;

const FIELD_ID: usize = 0;
const FIELD_VAR_DECL: usize = 1;
const FIELD_NAME: usize = 2;
const FIELD_SPACE: usize = 3;
const FIELD_REG_BASE: usize = 4;
const FIELD_REG_COUNT: usize = 5;

const SRV_SHAPE: usize = 6;
const SRV_SAMPLE_COUNT: usize = 7;
const SRV_TAGS: usize = 8;

const UAV_SHAPE: usize = 6;
const UAV_GLOBALLY_COHERENT: usize = 7;
const UAV_HIDDEN_COUNTER: usize = 8;
const UAV_RASTER_ORDER: usize = 9;
const UAV_TAGS: usize = 10;

const CBUFFER_BYTE_SIZE: usize = 6;

const SAMPLER_TYPE: usize = 6;
const SAMPLER_COMPARISON: u64 = 1;

const TAG_ELEMENT_TYPE: u64 = 0;
const TAG_STRUCT_STRIDE: u64 = 1;

/// How a resource is bound, in D3D shader-input terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindType {
    CBuffer,
    TBuffer,
    #[default]
    Texture,
    Sampler,
    UavRwTyped,
    Structured,
    UavRwStructured,
    ByteAddress,
    UavRwByteAddress,
    UavRwStructuredWithCounter,
    RtAccelerationStructure,
    UavFeedbackTexture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    #[default]
    Unknown,
    Buffer,
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMS,
    Texture2DMSArray,
    Texture3D,
    TextureCube,
    TextureCubeArray,
}

/// Element return type of a typed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnType {
    #[default]
    Unknown,
    UNorm,
    SNorm,
    SInt,
    UInt,
    Float,
    Mixed,
    Double,
}

impl ReturnType {
    fn from_component(ty: ComponentType) -> Self {
        match ty {
            ComponentType::I16 | ComponentType::I32 | ComponentType::I64 => Self::SInt,
            ComponentType::U16 | ComponentType::U32 | ComponentType::U64 => Self::UInt,
            ComponentType::F16 | ComponentType::F32 => Self::Float,
            ComponentType::F64 => Self::Double,
            ComponentType::SNormF16 | ComponentType::SNormF32 | ComponentType::SNormF64 => {
                Self::SNorm
            }
            ComponentType::UNormF16 | ComponentType::UNormF32 | ComponentType::UNormF64 => {
                Self::UNorm
            }
            _ => Self::Unknown,
        }
    }
}

/// One SRV, UAV or sampler binding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceBind {
    pub name: String,
    pub id: u32,
    pub class: Option<ResourceClass>,
    pub kind: Option<ResourceKind>,
    pub bind_type: BindType,
    pub dimension: Dimension,
    pub return_type: ReturnType,
    pub component_count: u32,
    pub space: u32,
    pub register: u32,
    pub bind_count: u32,
    pub sample_count: u32,
    pub struct_stride: Option<u32>,
    pub globally_coherent: bool,
    pub has_counter: bool,
    pub rasterizer_ordered: bool,
}

/// A constant buffer binding and its variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstantBuffer {
    pub name: String,
    pub id: u32,
    pub space: u32,
    pub register: u32,
    pub bind_count: u32,
    pub byte_size: u32,
    pub variables: Vec<Variable>,
}

#[derive(Debug, Default)]
pub(crate) struct ResourceLists {
    pub srvs: Vec<ResourceBind>,
    pub uavs: Vec<ResourceBind>,
    pub cbuffers: Vec<ConstantBuffer>,
    pub samplers: Vec<ResourceBind>,
    /// Element layouts of structured buffers, by resource name.
    pub element_layouts: Vec<(String, VariableType)>,
}

pub(crate) fn collect(meta: MetaReader<'_>, annotations: &TypeAnnotations) -> ResourceLists {
    let mut out = ResourceLists::default();
    let Some(lists) = meta.root("dx.resources") else {
        return out;
    };

    let entries = |index: usize| -> Vec<MetadataId> {
        meta.child(lists, index)
            .map(|l| meta.operands(l).iter().flatten().copied().collect())
            .unwrap_or_default()
    };

    for r in entries(0) {
        let bind = typed_bind(meta, annotations, r, ResourceClass::Srv, &mut out.element_layouts);
        out.srvs.push(bind);
    }
    for r in entries(1) {
        let bind = typed_bind(meta, annotations, r, ResourceClass::Uav, &mut out.element_layouts);
        out.uavs.push(bind);
    }
    for r in entries(2) {
        out.cbuffers.push(cbuffer(meta, annotations, r));
    }
    for r in entries(3) {
        out.samplers.push(sampler(meta, r));
    }

    tracing::debug!(
        srvs = out.srvs.len(),
        uavs = out.uavs.len(),
        cbuffers = out.cbuffers.len(),
        samplers = out.samplers.len(),
        "collected resource bindings"
    );
    out
}

fn common(meta: MetaReader<'_>, r: MetadataId) -> ResourceBind {
    ResourceBind {
        name: meta.child_str(r, FIELD_NAME).unwrap_or_default().to_owned(),
        id: meta.child_u32(r, FIELD_ID),
        space: meta.child_u32(r, FIELD_SPACE),
        register: meta.child_u32(r, FIELD_REG_BASE),
        bind_count: meta.child_u32(r, FIELD_REG_COUNT),
        component_count: 1,
        ..ResourceBind::default()
    }
}

/// Pointee of the resource variable's pointer type.
fn declared_type(meta: MetaReader<'_>, r: MetadataId) -> Option<TypeId> {
    let ty = meta.child(r, FIELD_VAR_DECL).and_then(|d| meta.value_type(d))?;
    match meta.module.ty(ty) {
        Some(Type::Pointer { pointee, .. }) => Some(*pointee),
        _ => {
            tracing::warn!(resource = r.0, "resource variable is not a pointer");
            None
        }
    }
}

fn typed_bind(
    meta: MetaReader<'_>,
    annotations: &TypeAnnotations,
    r: MetadataId,
    class: ResourceClass,
    layouts: &mut Vec<(String, VariableType)>,
) -> ResourceBind {
    let module = meta.module;
    let srv = class == ResourceClass::Srv;
    let mut bind = common(meta, r);
    bind.class = Some(class);

    let element = declared_type(meta, r);
    // Textures wrap their element in a struct alongside the mips type.
    let mut inner = element;
    if let Some(Type::Struct { members, .. }) = inner.and_then(|t| module.ty(t)) {
        if let Some(first) = members.first() {
            inner = Some(*first);
        }
    }
    if let Some(Type::Vector { element, count }) = inner.and_then(|t| module.ty(t)) {
        bind.component_count = *count;
        inner = Some(*element);
    }
    bind.return_type = match inner.and_then(|t| module.ty(t)) {
        Some(Type::Float { bits }) if *bits > 32 => ReturnType::Double,
        Some(Type::Float { .. }) => ReturnType::Float,
        // IR integers carry no sign; only the element-type tag below can say UInt.
        Some(Type::Integer { .. }) => ReturnType::SInt,
        _ => ReturnType::Unknown,
    };

    let tags = meta.child(r, if srv { SRV_TAGS } else { UAV_TAGS });
    for (tag, value) in meta.tags(tags) {
        let value = value.and_then(|v| meta.int(v)).unwrap_or(0);
        match tag {
            TAG_ELEMENT_TYPE => {
                bind.return_type = ReturnType::from_component(ComponentType::from_raw(value as u32));
            }
            TAG_STRUCT_STRIDE => bind.struct_stride = Some(value as u32),
            other => tracing::warn!(tag = other, "unknown resource tag"),
        }
    }

    let kind = ResourceKind::from_raw(meta.child_u32(r, if srv { SRV_SHAPE } else { UAV_SHAPE }));
    bind.kind = Some(kind);
    let typed = if srv { BindType::Texture } else { BindType::UavRwTyped };
    let (bind_type, dimension) = match kind {
        ResourceKind::Texture1D => (typed, Dimension::Texture1D),
        ResourceKind::Texture2D => (typed, Dimension::Texture2D),
        ResourceKind::Texture2DMS => (typed, Dimension::Texture2DMS),
        ResourceKind::Texture3D => (typed, Dimension::Texture3D),
        ResourceKind::TextureCube => (typed, Dimension::TextureCube),
        ResourceKind::Texture1DArray => (typed, Dimension::Texture1DArray),
        ResourceKind::Texture2DArray => (typed, Dimension::Texture2DArray),
        ResourceKind::Texture2DMSArray => (typed, Dimension::Texture2DMSArray),
        ResourceKind::TextureCubeArray => (typed, Dimension::TextureCubeArray),
        ResourceKind::TypedBuffer => (typed, Dimension::Buffer),
        ResourceKind::TBuffer => {
            bind.return_type = ReturnType::Unknown;
            (BindType::TBuffer, Dimension::Unknown)
        }
        ResourceKind::RawBuffer => {
            bind.return_type = ReturnType::Mixed;
            let ty = if srv { BindType::ByteAddress } else { BindType::UavRwByteAddress };
            (ty, Dimension::Buffer)
        }
        ResourceKind::StructuredBuffer => {
            bind.return_type = ReturnType::Mixed;
            let ty = if srv { BindType::Structured } else { BindType::UavRwStructured };
            (ty, Dimension::Buffer)
        }
        ResourceKind::StructuredBufferWithCounter => {
            bind.return_type = ReturnType::Mixed;
            let ty = if srv {
                BindType::Structured
            } else {
                BindType::UavRwStructuredWithCounter
            };
            (ty, Dimension::Buffer)
        }
        ResourceKind::RtAccelerationStructure if srv => {
            (BindType::RtAccelerationStructure, Dimension::Unknown)
        }
        ResourceKind::FeedbackTexture2D | ResourceKind::FeedbackTexture2DArray if !srv => {
            (BindType::UavFeedbackTexture, Dimension::Texture2D)
        }
        other => {
            tracing::error!(
                class = if srv { "SRV" } else { "UAV" },
                shape = other.raw(),
                resource = %bind.name,
                "unexpected resource shape"
            );
            (typed, Dimension::Unknown)
        }
    };
    bind.bind_type = bind_type;
    bind.dimension = dimension;

    if srv {
        bind.sample_count = meta.child_u32(r, SRV_SAMPLE_COUNT);
    } else {
        bind.globally_coherent = meta.child_int(r, UAV_GLOBALLY_COHERENT).unwrap_or(0) != 0;
        bind.has_counter = meta.child_int(r, UAV_HIDDEN_COUNTER).unwrap_or(0) != 0;
        bind.rasterizer_ordered = meta.child_int(r, UAV_RASTER_ORDER).unwrap_or(0) != 0;
        if bind.bind_type == BindType::UavRwStructured && bind.has_counter {
            bind.bind_type = BindType::UavRwStructuredWithCounter;
        }
    }

    if matches!(
        kind,
        ResourceKind::StructuredBuffer | ResourceKind::StructuredBufferWithCounter
    ) {
        let layout = match element {
            Some(ty) if annotations.get(ty).is_some() => annotations.variable_type(module, ty),
            _ => {
                let stride = bind.struct_stride.unwrap_or_else(|| {
                    tracing::warn!(resource = %bind.name, "structured buffer without a stride tag");
                    0
                });
                opaque_bytes(stride)
            }
        };
        layouts.push((bind.name.clone(), layout));
    }

    bind
}

fn cbuffer(meta: MetaReader<'_>, annotations: &TypeAnnotations, r: MetadataId) -> ConstantBuffer {
    let common = common(meta, r);
    let variables = declared_type(meta, r)
        .map(|ty| annotations.variable_type(meta.module, ty).members)
        .unwrap_or_default();
    ConstantBuffer {
        name: common.name,
        id: common.id,
        space: common.space,
        register: common.register,
        bind_count: common.bind_count,
        byte_size: meta.child_u32(r, CBUFFER_BYTE_SIZE),
        variables,
    }
}

fn sampler(meta: MetaReader<'_>, r: MetadataId) -> ResourceBind {
    let kind = if meta.child_int(r, SAMPLER_TYPE) == Some(SAMPLER_COMPARISON) {
        ResourceKind::SamplerComparison
    } else {
        ResourceKind::Sampler
    };
    ResourceBind {
        class: Some(ResourceClass::Sampler),
        kind: Some(kind),
        bind_type: BindType::Sampler,
        dimension: Dimension::Unknown,
        component_count: 0,
        ..common(meta, r)
    }
}
