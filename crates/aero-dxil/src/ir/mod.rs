//! In-memory DXIL module graph.
//!
//! Everything lives in per-kind arenas on [`Module`] and refers to other nodes
//! by typed index. Instruction, argument and block ids are local to the
//! function that owns them.

mod attributes;
mod constants;
mod debuginfo;
mod function;
mod instruction;
mod metadata;
mod types;

use aero_dxbc::ShaderKind;

use crate::slots::SlotTable;

pub use attributes::{AttributeGroup, Attributes, ATTRIBUTE_NAMES};
pub use constants::{Constant, ConstantValue};
pub use debuginfo::{
    DebugInfo, DiBasicType, DiCompileUnit, DiFile, DiFlags, DiGlobalVariable, DiImportedEntity,
    DiLexicalBlock, DiLocalVariable, DiLocation, DiNamespace, DiSubprogram, DiType,
};
pub use function::{Argument, Block, Function};
pub use instruction::{AtomicOrdering, Instruction, InstructionFlags, Operation};
pub use metadata::{DebugLocation, Metadata, MetadataContent, NamedMetadata};
pub use types::Type;

macro_rules! arena_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

arena_id! {
    TypeId,
    ConstantId,
    GlobalVarId,
    AliasId,
    FunctionId,
    MetadataId,
    DebugLocId,
    AttrGroupId,
    /// Index into the owning function's instruction list.
    InstId,
    /// Index into the owning function's block list.
    BlockId,
}

/// An operand reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Function(FunctionId),
    GlobalVar(GlobalVarId),
    Alias(AliasId),
    Constant(ConstantId),
    Instruction(InstId),
    Argument(u32),
    Metadata(MetadataId),
    /// A raw numeric operand such as an `extractvalue` index.
    Literal(u64),
    Block(BlockId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVar {
    pub name: String,
    /// Pointer type of the global as a value.
    pub ty: TypeId,
    pub is_const: bool,
    pub external: bool,
    pub initializer: Option<ConstantId>,
    pub align: Option<u32>,
    pub address_space: u32,
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub ty: TypeId,
    pub target: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comdat {
    pub name: String,
    pub selection: ComdatSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComdatSelection {
    Any,
    ExactMatch,
    Largest,
    NoDuplicates,
    SameSize,
}

impl ComdatSelection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::ExactMatch => "exactmatch",
            Self::Largest => "largest",
            Self::NoDuplicates => "noduplicates",
            Self::SameSize => "samesize",
        }
    }
}

/// A fully materialized DXIL module.
#[derive(Debug, Clone)]
pub struct Module {
    pub shader_kind: ShaderKind,
    pub major: u32,
    pub minor: u32,
    pub datalayout: String,
    pub triple: String,
    pub types: Vec<Type>,
    pub constants: Vec<Constant>,
    pub globals: Vec<GlobalVar>,
    pub aliases: Vec<Alias>,
    pub functions: Vec<Function>,
    pub metadata: Vec<Metadata>,
    pub debug_locations: Vec<DebugLocation>,
    pub attribute_groups: Vec<AttributeGroup>,
    pub named_metadata: Vec<NamedMetadata>,
    pub comdats: Vec<Comdat>,
    /// Names of attachment kinds (`dbg`, `tbaa`, `dx.precise`, ...).
    pub metadata_kinds: Vec<String>,
    pub(crate) slots: Option<SlotTable>,
}

impl Module {
    pub fn new(shader_kind: ShaderKind, major: u32, minor: u32) -> Self {
        Self {
            shader_kind,
            major,
            minor,
            datalayout: String::new(),
            triple: String::new(),
            types: Vec::new(),
            constants: Vec::new(),
            globals: Vec::new(),
            aliases: Vec::new(),
            functions: Vec::new(),
            metadata: Vec::new(),
            debug_locations: Vec::new(),
            attribute_groups: Vec::new(),
            named_metadata: Vec::new(),
            comdats: Vec::new(),
            metadata_kinds: Vec::new(),
            slots: None,
        }
    }

    pub fn ty(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.index())
    }

    pub fn find_type(&self, ty: &Type) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| t == ty)
            .map(|i| TypeId(i as u32))
    }

    /// Returns the id of `ty`, appending it when it is not interned yet.
    ///
    /// Named structs are matched by their full definition.
    pub fn intern_type(&mut self, ty: Type) -> TypeId {
        if let Some(id) = self.find_type(&ty) {
            return id;
        }
        self.types.push(ty);
        TypeId(self.types.len() as u32 - 1)
    }

    pub fn constant(&self, id: ConstantId) -> Option<&Constant> {
        self.constants.get(id.index())
    }

    pub fn metadata_node(&self, id: MetadataId) -> Option<&Metadata> {
        self.metadata.get(id.index())
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn named_metadata(&self, name: &str) -> Option<&NamedMetadata> {
        self.named_metadata.iter().find(|n| n.name == name)
    }

    /// Whether slot assignment has already run on this module.
    pub fn is_settled(&self) -> bool {
        self.slots.is_some()
    }

    /// Type of a value as an operand.
    ///
    /// Function-local values need the enclosing function. Literals and values
    /// whose type is not interned in the module have no type.
    pub fn value_type(&self, func: Option<&Function>, value: Value) -> Option<TypeId> {
        match value {
            Value::Function(id) => {
                let f = self.function(id)?;
                self.find_type(&Type::Pointer {
                    pointee: f.ty,
                    address_space: 0,
                })
            }
            Value::GlobalVar(id) => self.globals.get(id.index()).map(|g| g.ty),
            Value::Alias(id) => self.aliases.get(id.index()).map(|a| a.ty),
            Value::Constant(id) => self.constant(id).map(|c| c.ty),
            Value::Instruction(id) => func?.instructions.get(id.index())?.ty,
            Value::Argument(i) => func?.args.get(i as usize).map(|a| a.ty),
            Value::Metadata(_) => self.find_type(&Type::Metadata),
            Value::Block(_) => self.find_type(&Type::Label),
            Value::Literal(_) => None,
        }
    }

    /// Whether `inst` defines a value that gets a `%` name or number.
    pub fn produces_value(&self, inst: &Instruction) -> bool {
        match inst.ty {
            Some(ty) => !matches!(self.ty(ty), Some(Type::Void) | None),
            None => false,
        }
    }

    /// Reads an integer-valued constant through a `Value`.
    pub fn constant_int(&self, value: Value) -> Option<u64> {
        match value {
            Value::Constant(id) => self.constant(id)?.scalar(),
            Value::Literal(v) => Some(v),
            _ => None,
        }
    }
}
