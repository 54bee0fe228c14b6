//! Constant buffer and structured buffer element layouts.
//!
//! Struct layouts come from `dx.typeAnnotations`, which records per member the
//! field name, byte offset, component type and matrix shape that the IR types
//! alone cannot express.

use aero_dxbc::ComponentType;
use bitflags::bitflags;
use hashbrown::HashMap;

use crate::ir::{MetadataId, Module, Type, TypeId};

use super::meta::MetaReader;

const STRUCT_ANNOTATIONS: u64 = 0;

const MEMBER_SNORM: u64 = 0;
const MEMBER_UNORM: u64 = 1;
const MEMBER_MATRIX: u64 = 2;
const MEMBER_CBUFFER_OFFSET: u64 = 3;
const MEMBER_SEMANTIC: u64 = 4;
const MEMBER_INTERPOLATION: u64 = 5;
const MEMBER_FIELD_NAME: u64 = 6;
const MEMBER_COMP_TYPE: u64 = 7;
const MEMBER_PRECISE: u64 = 8;
const MEMBER_CB_USED: u64 = 9;

/// Shape class of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarClass {
    #[default]
    Scalar,
    MatrixRows,
    MatrixColumns,
    Struct,
}

/// Scalar type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarType {
    #[default]
    Unknown,
    Bool,
    SByte,
    UByte,
    SShort,
    UShort,
    SInt,
    UInt,
    SLong,
    ULong,
    Half,
    Float,
    Double,
}

impl VarType {
    fn from_component(ty: ComponentType) -> Self {
        match ty {
            ComponentType::I1 => Self::Bool,
            ComponentType::I16 => Self::SShort,
            ComponentType::U16 => Self::UShort,
            ComponentType::I32 => Self::SInt,
            ComponentType::U32 | ComponentType::PackedS8x32 | ComponentType::PackedU8x32 => {
                Self::UInt
            }
            ComponentType::I64 => Self::SLong,
            ComponentType::U64 => Self::ULong,
            ComponentType::F16 | ComponentType::SNormF16 | ComponentType::UNormF16 => Self::Half,
            ComponentType::F32 | ComponentType::SNormF32 | ComponentType::UNormF32 => Self::Float,
            ComponentType::F64 | ComponentType::SNormF64 | ComponentType::UNormF64 => Self::Double,
            ComponentType::Invalid | ComponentType::Unknown(_) => Self::Unknown,
        }
    }
}

/// Layout of one variable type, recursively including struct members.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableType {
    pub name: String,
    pub class: VarClass,
    pub ty: VarType,
    pub rows: u32,
    pub cols: u32,
    /// Array length, 0 for non-arrays.
    pub elements: u32,
    pub bytesize: u32,
    pub members: Vec<Variable>,
}

/// A named member of a constant buffer or struct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variable {
    pub name: String,
    pub offset: u32,
    pub ty: VariableType,
}

bitflags! {
    /// Flags recorded for one struct member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MemberFlags: u8 {
        const UNORM = 1 << 0;
        const SNORM = 1 << 1;
        const ROW_MAJOR = 1 << 2;
        const MATRIX = 1 << 3;
        const PRECISE = 1 << 4;
        const USED = 1 << 5;
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemberAnnotation {
    pub name: String,
    pub offset: u32,
    pub component: Option<ComponentType>,
    pub flags: MemberFlags,
    pub rows: u32,
    pub cols: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StructAnnotation {
    pub byte_size: u32,
    pub members: Vec<MemberAnnotation>,
}

/// Struct annotations keyed by the annotated IR struct type.
#[derive(Debug, Default)]
pub(crate) struct TypeAnnotations {
    structs: HashMap<TypeId, StructAnnotation>,
}

impl TypeAnnotations {
    pub fn from_module(meta: MetaReader<'_>) -> Self {
        let mut out = Self::default();
        for list in meta.roots("dx.typeAnnotations") {
            if meta.child_int(list, 0) != Some(STRUCT_ANNOTATIONS) {
                continue;
            }
            let operands = meta.operands(list);
            for pair in operands.get(1..).unwrap_or(&[]).chunks(2) {
                let (Some(Some(ty)), Some(Some(members))) = (pair.first(), pair.get(1)) else {
                    tracing::warn!(list = list.0, "incomplete struct annotation pair");
                    continue;
                };
                let Some(ty) = meta.value_type(*ty) else {
                    tracing::warn!(list = list.0, "struct annotation without a typed value");
                    continue;
                };
                out.structs.insert(ty, Self::parse_struct(meta, *members));
            }
        }
        out
    }

    fn parse_struct(meta: MetaReader<'_>, members: MetadataId) -> StructAnnotation {
        let operands = meta.operands(members);
        StructAnnotation {
            byte_size: meta.child_u32(members, 0),
            members: operands
                .iter()
                .skip(1)
                .map(|m| Self::parse_member(meta, *m))
                .collect(),
        }
    }

    fn parse_member(meta: MetaReader<'_>, member: Option<MetadataId>) -> MemberAnnotation {
        let mut out = MemberAnnotation::default();
        for (tag, value) in meta.tags(member) {
            let int = || value.and_then(|v| meta.int(v)).unwrap_or(0);
            match tag {
                MEMBER_SNORM if int() != 0 => out.flags |= MemberFlags::SNORM,
                MEMBER_UNORM if int() != 0 => out.flags |= MemberFlags::UNORM,
                MEMBER_PRECISE if int() != 0 => out.flags |= MemberFlags::PRECISE,
                MEMBER_CB_USED if int() != 0 => out.flags |= MemberFlags::USED,
                MEMBER_SNORM | MEMBER_UNORM | MEMBER_PRECISE | MEMBER_CB_USED => {}
                MEMBER_MATRIX => {
                    let Some(matrix) = value else { continue };
                    out.rows = meta.child_u32(matrix, 0);
                    out.cols = meta.child_u32(matrix, 1);
                    out.flags |= MemberFlags::MATRIX;
                    if meta.child_int(matrix, 2) == Some(1) {
                        out.flags |= MemberFlags::ROW_MAJOR;
                    }
                }
                MEMBER_CBUFFER_OFFSET => out.offset = int() as u32,
                MEMBER_FIELD_NAME => {
                    out.name = value
                        .and_then(|v| meta.string(v))
                        .unwrap_or_default()
                        .to_owned();
                }
                MEMBER_COMP_TYPE => out.component = Some(ComponentType::from_raw(int() as u32)),
                MEMBER_SEMANTIC | MEMBER_INTERPOLATION => {}
                other => tracing::warn!(tag = other, "unexpected struct member annotation tag"),
            }
        }
        out
    }

    pub fn get(&self, ty: TypeId) -> Option<&StructAnnotation> {
        self.structs.get(&ty)
    }

    /// Layout of `ty`, recursing into struct members.
    pub fn variable_type(&self, module: &Module, ty: TypeId) -> VariableType {
        let mut out = VariableType::default();
        let Some(resolved) = module.ty(ty) else {
            tracing::error!(ty = ty.0, "type reference outside the module arena");
            return out;
        };

        match resolved {
            Type::Integer { .. } | Type::Float { .. } | Type::Vector { .. } => {
                let (scalar, cols) = match resolved {
                    Type::Vector { element, count } => (module.ty(*element), *count),
                    _ => (Some(resolved), 1),
                };
                out.rows = 1;
                out.cols = cols;
                out.class = VarClass::Scalar;
                let (ty, bits) = match scalar {
                    Some(Type::Float { bits }) => (
                        match bits {
                            16 => VarType::Half,
                            b if *b > 32 => VarType::Double,
                            _ => VarType::Float,
                        },
                        *bits,
                    ),
                    Some(Type::Integer { bits }) => (
                        match bits {
                            1 => VarType::Bool,
                            8 => VarType::SByte,
                            16 => VarType::SShort,
                            32 => VarType::SInt,
                            _ => VarType::SLong,
                        },
                        *bits,
                    ),
                    _ => (VarType::Unknown, 0),
                };
                out.ty = ty;
                out.bytesize = bits.div_ceil(8) * cols;
                out
            }
            Type::Array { element, count } => {
                let mut out = self.variable_type(module, *element);
                let count = u32::try_from(*count).unwrap_or(u32::MAX);
                out.elements = count;
                // Array elements each start on a 16 byte register.
                out.bytesize = out
                    .bytesize
                    .saturating_add(count.saturating_sub(1).saturating_mul(16));
                out
            }
            Type::Struct { name, members, .. } => {
                if members.is_empty() {
                    return out;
                }
                let annotation = self.get(ty);
                match annotation {
                    Some(annotation) => {
                        out.bytesize = annotation.byte_size;
                        out.name = strip_struct_prefix(name.as_deref().unwrap_or_default());
                        out.class = VarClass::Struct;
                        out.ty = VarType::Unknown;
                    }
                    None => tracing::error!(
                        name = name.as_deref().unwrap_or("<anonymous>"),
                        "struct has no type annotation"
                    ),
                }

                for (i, member) in members.iter().enumerate() {
                    let mut var = Variable {
                        ty: self.variable_type(module, *member),
                        ..Variable::default()
                    };
                    match annotation.and_then(|a| a.members.get(i)) {
                        Some(info) => {
                            var.name = info.name.clone();
                            var.offset = info.offset;
                            if info.flags.contains(MemberFlags::MATRIX) {
                                var.ty.rows = info.rows;
                                var.ty.cols = info.cols;
                                var.ty.class = if info.flags.contains(MemberFlags::ROW_MAJOR) {
                                    VarClass::MatrixRows
                                } else {
                                    VarClass::MatrixColumns
                                };
                            }
                            let is_struct = matches!(module.ty(*member), Some(Type::Struct { .. }));
                            if var.ty.members.is_empty() && !is_struct {
                                if let Some(component) = info.component {
                                    var.ty.ty = VarType::from_component(component);
                                    if !matches!(
                                        component,
                                        ComponentType::I1
                                            | ComponentType::I16
                                            | ComponentType::U16
                                            | ComponentType::I32
                                            | ComponentType::U32
                                            | ComponentType::I64
                                            | ComponentType::U64
                                            | ComponentType::F16
                                            | ComponentType::F32
                                            | ComponentType::F64
                                    ) {
                                        tracing::error!(
                                            member = %info.name,
                                            component = component.raw(),
                                            "unexpected component type in struct annotation"
                                        );
                                    }
                                }
                            }
                        }
                        None => {
                            if annotation.is_some() {
                                tracing::warn!(member = i, "struct member has no annotation");
                            }
                            var.name = format!("_child{i}");
                        }
                    }
                    out.members.push(var);
                }
                out
            }
            other => {
                tracing::error!(ty = ty.0, kind = ?other, "unexpected type in variable layout");
                out
            }
        }
    }
}

/// Element layout used for a structured buffer whose element struct carries no
/// annotation: one opaque byte array spanning the stride.
pub(crate) fn opaque_bytes(stride: u32) -> VariableType {
    VariableType {
        class: VarClass::Struct,
        bytesize: stride,
        members: vec![Variable {
            name: "bytes".to_owned(),
            offset: 0,
            ty: VariableType {
                class: VarClass::Scalar,
                ty: VarType::UByte,
                rows: 1,
                cols: 1,
                elements: stride,
                bytesize: stride,
                ..VariableType::default()
            },
        }],
        ..VariableType::default()
    }
}

fn strip_struct_prefix(name: &str) -> String {
    name.strip_prefix("struct.")
        .or_else(|| name.strip_prefix("class."))
        .unwrap_or(name)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_prefixes_are_stripped() {
        assert_eq!(strip_struct_prefix("struct.Light"), "Light");
        assert_eq!(strip_struct_prefix("class.Foo"), "Foo");
        assert_eq!(strip_struct_prefix("hostlayout.Foo"), "hostlayout.Foo");
    }

    #[test]
    fn opaque_layout_spans_the_stride() {
        let layout = opaque_bytes(48);
        assert_eq!(layout.bytesize, 48);
        assert_eq!(layout.members.len(), 1);
        let bytes = &layout.members[0];
        assert_eq!(bytes.name, "bytes");
        assert_eq!(bytes.ty.ty, VarType::UByte);
        assert_eq!(bytes.ty.class, VarClass::Scalar);
        assert_eq!(bytes.ty.elements, 48);
        assert_eq!(bytes.ty.bytesize, 48);
    }

    #[test]
    fn component_types_map_to_var_types() {
        assert_eq!(VarType::from_component(ComponentType::U32), VarType::UInt);
        assert_eq!(VarType::from_component(ComponentType::UNormF32), VarType::Float);
        assert_eq!(VarType::from_component(ComponentType::Invalid), VarType::Unknown);
    }
}
