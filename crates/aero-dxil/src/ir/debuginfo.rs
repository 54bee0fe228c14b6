//! DWARF debug-info records carried as metadata.
//!
//! Tags, encodings and languages stay raw `u32` values so unknown producers
//! round-trip; the disassembler maps them back to `DW_*` names.

use bitflags::bitflags;

use super::MetadataId;

bitflags! {
    /// `DIFlag*` bits. The low two bits are an access specifier, not flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DiFlags: u32 {
        const PRIVATE = 1;
        const PROTECTED = 2;
        const PUBLIC = 3;
        const FWD_DECL = 1 << 2;
        const APPLE_BLOCK = 1 << 3;
        const BLOCK_BYREF_STRUCT = 1 << 4;
        const VIRTUAL = 1 << 5;
        const ARTIFICIAL = 1 << 6;
        const EXPLICIT = 1 << 7;
        const PROTOTYPED = 1 << 8;
        const OBJC_CLASS_COMPLETE = 1 << 9;
        const OBJECT_POINTER = 1 << 10;
        const VECTOR = 1 << 11;
        const STATIC_MEMBER = 1 << 12;
        const LVALUE_REFERENCE = 1 << 13;
        const RVALUE_REFERENCE = 1 << 14;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiFile {
    pub filename: String,
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiCompileUnit {
    pub language: u32,
    pub file: Option<MetadataId>,
    pub producer: Option<String>,
    pub is_optimized: bool,
    pub flags: Option<String>,
    pub runtime_version: u64,
    pub split_debug_filename: Option<String>,
    pub emission_kind: u64,
    pub enums: Option<MetadataId>,
    pub retained_types: Option<MetadataId>,
    pub subprograms: Option<MetadataId>,
    pub globals: Option<MetadataId>,
    pub imports: Option<MetadataId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiBasicType {
    pub tag: u32,
    pub name: Option<String>,
    pub size_in_bits: u64,
    pub align_in_bits: u64,
    pub encoding: u32,
}

/// Shared shape of `DIDerivedType` and `DICompositeType`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiType {
    pub tag: u32,
    pub name: Option<String>,
    pub scope: Option<MetadataId>,
    pub file: Option<MetadataId>,
    pub line: u64,
    pub base_type: Option<MetadataId>,
    pub size_in_bits: u64,
    pub align_in_bits: u64,
    pub offset_in_bits: u64,
    pub flags: DiFlags,
    /// `extraData` for derived types, `elements` for composites.
    pub extra: Option<MetadataId>,
    pub template_params: Option<MetadataId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiSubprogram {
    pub scope: Option<MetadataId>,
    pub name: Option<String>,
    pub linkage_name: Option<String>,
    pub file: Option<MetadataId>,
    pub line: u64,
    pub ty: Option<MetadataId>,
    pub is_local: bool,
    pub is_definition: bool,
    pub scope_line: u64,
    pub containing_type: Option<MetadataId>,
    pub virtuality: u32,
    pub virtual_index: u64,
    pub flags: DiFlags,
    pub is_optimized: bool,
    pub function: Option<MetadataId>,
    pub template_params: Option<MetadataId>,
    pub declaration: Option<MetadataId>,
    pub variables: Option<MetadataId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiGlobalVariable {
    pub scope: Option<MetadataId>,
    pub name: Option<String>,
    pub linkage_name: Option<String>,
    pub file: Option<MetadataId>,
    pub line: u64,
    pub ty: Option<MetadataId>,
    pub is_local: bool,
    pub is_definition: bool,
    pub variable: Option<MetadataId>,
    pub declaration: Option<MetadataId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiLocalVariable {
    pub tag: u32,
    pub scope: Option<MetadataId>,
    pub name: Option<String>,
    pub file: Option<MetadataId>,
    pub line: u64,
    pub ty: Option<MetadataId>,
    pub arg: u64,
    pub flags: DiFlags,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiLexicalBlock {
    pub scope: Option<MetadataId>,
    pub file: Option<MetadataId>,
    pub line: u64,
    pub column: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiNamespace {
    pub scope: Option<MetadataId>,
    pub file: Option<MetadataId>,
    pub name: Option<String>,
    pub line: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiImportedEntity {
    pub tag: u32,
    pub scope: Option<MetadataId>,
    pub entity: Option<MetadataId>,
    pub line: u64,
    pub name: Option<String>,
}

/// A `!DILocation` stored as a metadata node, for example as the target of
/// an `inlinedAt` reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiLocation {
    pub line: u64,
    pub column: u64,
    pub scope: Option<MetadataId>,
    pub inlined_at: Option<MetadataId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DebugInfo {
    File(DiFile),
    CompileUnit(DiCompileUnit),
    BasicType(DiBasicType),
    DerivedType(DiType),
    CompositeType(DiType),
    TemplateTypeParameter {
        name: Option<String>,
        ty: Option<MetadataId>,
    },
    TemplateValueParameter {
        tag: u32,
        name: Option<String>,
        ty: Option<MetadataId>,
        value: Option<MetadataId>,
    },
    Subprogram(DiSubprogram),
    SubroutineType {
        types: Option<MetadataId>,
    },
    GlobalVariable(DiGlobalVariable),
    LocalVariable(DiLocalVariable),
    /// Raw `DW_OP_*` words.
    Expression(Vec<u64>),
    LexicalBlock(DiLexicalBlock),
    Subrange {
        count: i64,
        lower_bound: i64,
    },
    Namespace(DiNamespace),
    ImportedEntity(DiImportedEntity),
    Location(DiLocation),
}

impl DebugInfo {
    /// Metadata nodes this record points at, in field order.
    pub fn references(&self) -> Vec<MetadataId> {
        let refs: Vec<Option<MetadataId>> = match self {
            DebugInfo::File(_)
            | DebugInfo::BasicType(_)
            | DebugInfo::Expression(_)
            | DebugInfo::Subrange { .. } => Vec::new(),
            DebugInfo::CompileUnit(cu) => vec![
                cu.file,
                cu.enums,
                cu.retained_types,
                cu.subprograms,
                cu.globals,
                cu.imports,
            ],
            DebugInfo::DerivedType(t) | DebugInfo::CompositeType(t) => {
                vec![t.scope, t.file, t.base_type, t.extra, t.template_params]
            }
            DebugInfo::TemplateTypeParameter { ty, .. } => vec![*ty],
            DebugInfo::TemplateValueParameter { ty, value, .. } => vec![*ty, *value],
            DebugInfo::Subprogram(sp) => vec![
                sp.scope,
                sp.file,
                sp.ty,
                sp.containing_type,
                sp.function,
                sp.template_params,
                sp.declaration,
                sp.variables,
            ],
            DebugInfo::SubroutineType { types } => vec![*types],
            DebugInfo::GlobalVariable(gv) => {
                vec![gv.scope, gv.file, gv.ty, gv.variable, gv.declaration]
            }
            DebugInfo::LocalVariable(lv) => vec![lv.scope, lv.file, lv.ty],
            DebugInfo::LexicalBlock(lb) => vec![lb.scope, lb.file],
            DebugInfo::Namespace(ns) => vec![ns.scope, ns.file],
            DebugInfo::ImportedEntity(ie) => vec![ie.scope, ie.entity],
            DebugInfo::Location(loc) => vec![loc.scope, loc.inlined_at],
        };
        refs.into_iter().flatten().collect()
    }

    /// Variable name for `llvm.dbg.*` annotations.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            DebugInfo::LocalVariable(lv) => lv.name.as_deref(),
            DebugInfo::GlobalVariable(gv) => gv.name.as_deref(),
            _ => None,
        }
    }
}
