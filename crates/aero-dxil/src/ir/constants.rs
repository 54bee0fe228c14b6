use super::{Operation, TypeId, Value};

/// A module-level constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub ty: TypeId,
    pub value: ConstantValue,
}

/// Payload of a [`Constant`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Undef,
    /// `zeroinitializer` for aggregates, `null` for pointers, zero for scalars.
    Null,
    /// Raw scalar bits. Floats hold the bits of the value in its own width
    /// (`f16`, `f32` or `f64`).
    Scalar(u64),
    /// Vector, array or struct members, in order.
    Aggregate(Vec<Value>),
    /// Packed scalar elements of a vector or array. An `i8` array in this form
    /// is a character string.
    Data(Vec<u64>),
    /// A constant expression such as a constant GEP or cast.
    Expr { op: Operation, args: Vec<Value> },
}

impl Constant {
    pub fn is_undef(&self) -> bool {
        matches!(self.value, ConstantValue::Undef)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, ConstantValue::Null)
    }

    /// Returns the scalar payload, treating `Null` as zero.
    pub fn scalar(&self) -> Option<u64> {
        match self.value {
            ConstantValue::Scalar(v) => Some(v),
            ConstantValue::Null => Some(0),
            _ => None,
        }
    }
}
