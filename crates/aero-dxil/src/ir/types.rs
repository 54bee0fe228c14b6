use super::TypeId;

/// An interned IR type.
///
/// Named struct types keep their name; every other type is identified by its
/// shape. Types refer to each other by [`TypeId`] into [`super::Module::types`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Integer {
        bits: u32,
    },
    Float {
        bits: u32,
    },
    Vector {
        element: TypeId,
        count: u32,
    },
    Pointer {
        pointee: TypeId,
        address_space: u32,
    },
    Array {
        element: TypeId,
        count: u64,
    },
    Function {
        ret: TypeId,
        params: Vec<TypeId>,
        vararg: bool,
    },
    Struct {
        name: Option<String>,
        members: Vec<TypeId>,
        packed: bool,
    },
    Metadata,
    Label,
}

impl Type {
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Scalar integer or float types.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Integer { .. } | Type::Float { .. })
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Type::Vector { .. } | Type::Array { .. } | Type::Struct { .. }
        )
    }

    /// Bit width of a scalar type.
    pub fn scalar_bits(&self) -> Option<u32> {
        match *self {
            Type::Integer { bits } | Type::Float { bits } => Some(bits),
            _ => None,
        }
    }

    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct { name, .. } => name.as_deref(),
            _ => None,
        }
    }
}
