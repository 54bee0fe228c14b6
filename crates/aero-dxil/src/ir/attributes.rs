use bitflags::bitflags;

bitflags! {
    /// Enum-kind function and parameter attributes.
    ///
    /// Declaration order is the order attribute lists are printed in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u64 {
        const ALWAYS_INLINE = 1 << 0;
        const BY_VAL = 1 << 1;
        const INLINE_HINT = 1 << 2;
        const IN_REG = 1 << 3;
        const MIN_SIZE = 1 << 4;
        const NAKED = 1 << 5;
        const NEST = 1 << 6;
        const NO_ALIAS = 1 << 7;
        const NO_BUILTIN = 1 << 8;
        const NO_CAPTURE = 1 << 9;
        const NO_DUPLICATE = 1 << 10;
        const NO_IMPLICIT_FLOAT = 1 << 11;
        const NO_INLINE = 1 << 12;
        const NON_LAZY_BIND = 1 << 13;
        const NO_RED_ZONE = 1 << 14;
        const NO_RETURN = 1 << 15;
        const NO_UNWIND = 1 << 16;
        const OPTIMIZE_FOR_SIZE = 1 << 17;
        const READ_NONE = 1 << 18;
        const READ_ONLY = 1 << 19;
        const RETURNED = 1 << 20;
        const RETURNS_TWICE = 1 << 21;
        const S_EXT = 1 << 22;
        const STACK_PROTECT = 1 << 23;
        const STACK_PROTECT_REQ = 1 << 24;
        const STACK_PROTECT_STRONG = 1 << 25;
        const STRUCT_RET = 1 << 26;
        const SANITIZE_ADDRESS = 1 << 27;
        const SANITIZE_THREAD = 1 << 28;
        const SANITIZE_MEMORY = 1 << 29;
        const UW_TABLE = 1 << 30;
        const Z_EXT = 1 << 31;
        const BUILTIN = 1 << 32;
        const COLD = 1 << 33;
        const OPTIMIZE_NONE = 1 << 34;
        const IN_ALLOCA = 1 << 35;
        const NON_NULL = 1 << 36;
        const JUMP_TABLE = 1 << 37;
        const CONVERGENT = 1 << 38;
        const SAFE_STACK = 1 << 39;
        const ARG_MEM_ONLY = 1 << 40;
    }
}

/// Keyword spelling of each attribute bit, in print order.
pub const ATTRIBUTE_NAMES: &[(Attributes, &str)] = &[
    (Attributes::ALWAYS_INLINE, "alwaysinline"),
    (Attributes::BY_VAL, "byval"),
    (Attributes::INLINE_HINT, "inlinehint"),
    (Attributes::IN_REG, "inreg"),
    (Attributes::MIN_SIZE, "minsize"),
    (Attributes::NAKED, "naked"),
    (Attributes::NEST, "nest"),
    (Attributes::NO_ALIAS, "noalias"),
    (Attributes::NO_BUILTIN, "nobuiltin"),
    (Attributes::NO_CAPTURE, "nocapture"),
    (Attributes::NO_DUPLICATE, "noduplicate"),
    (Attributes::NO_IMPLICIT_FLOAT, "noimplicitfloat"),
    (Attributes::NO_INLINE, "noinline"),
    (Attributes::NON_LAZY_BIND, "nonlazybind"),
    (Attributes::NO_RED_ZONE, "noredzone"),
    (Attributes::NO_RETURN, "noreturn"),
    (Attributes::NO_UNWIND, "nounwind"),
    (Attributes::OPTIMIZE_FOR_SIZE, "optsize"),
    (Attributes::READ_NONE, "readnone"),
    (Attributes::READ_ONLY, "readonly"),
    (Attributes::RETURNED, "returned"),
    (Attributes::RETURNS_TWICE, "returns_twice"),
    (Attributes::S_EXT, "signext"),
    (Attributes::STACK_PROTECT, "ssp"),
    (Attributes::STACK_PROTECT_REQ, "sspreq"),
    (Attributes::STACK_PROTECT_STRONG, "sspstrong"),
    (Attributes::STRUCT_RET, "sret"),
    (Attributes::SANITIZE_ADDRESS, "sanitize_address"),
    (Attributes::SANITIZE_THREAD, "sanitize_thread"),
    (Attributes::SANITIZE_MEMORY, "sanitize_memory"),
    (Attributes::UW_TABLE, "uwtable"),
    (Attributes::Z_EXT, "zeroext"),
    (Attributes::BUILTIN, "builtin"),
    (Attributes::COLD, "cold"),
    (Attributes::OPTIMIZE_NONE, "optnone"),
    (Attributes::IN_ALLOCA, "inalloca"),
    (Attributes::NON_NULL, "nonnull"),
    (Attributes::JUMP_TABLE, "jumptable"),
    (Attributes::CONVERGENT, "convergent"),
    (Attributes::SAFE_STACK, "safestack"),
    (Attributes::ARG_MEM_ONLY, "argmemonly"),
];

/// A function-level attribute set, printed as `#N`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeGroup {
    pub params: Attributes,
    pub align: Option<u64>,
    pub stack_align: Option<u64>,
    pub dereferenceable: Option<u64>,
    pub dereferenceable_or_null: Option<u64>,
    /// `"key"="value"` string attributes, in declaration order.
    pub strings: Vec<(String, String)>,
}

impl AttributeGroup {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
            && self.align.is_none()
            && self.stack_align.is_none()
            && self.dereferenceable.is_none()
            && self.dereferenceable_or_null.is_none()
            && self.strings.is_empty()
    }
}
