use bitflags::bitflags;

use super::{DebugLocId, FunctionId, MetadataId, TypeId, Value};

bitflags! {
    /// Per-instruction qualifiers: fast-math, wrap, memory and atomic bits.
    ///
    /// Atomic orderings are packed as two 3-bit [`AtomicOrdering`] fields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstructionFlags: u32 {
        const NO_NANS = 1 << 0;
        const NO_INFS = 1 << 1;
        const NO_SIGNED_ZEROS = 1 << 2;
        const ALLOW_RECIPROCAL = 1 << 3;
        const FAST_MATH = 1 << 4;
        const NO_SIGNED_WRAP = 1 << 5;
        const NO_UNSIGNED_WRAP = 1 << 6;
        const EXACT = 1 << 7;
        const IN_BOUNDS = 1 << 8;
        const VOLATILE = 1 << 9;
        const SINGLE_THREAD = 1 << 10;
        const WEAK = 1 << 11;
        const SUCCESS_ORDERING = 0b111 << 12;
        const FAILURE_ORDERING = 0b111 << 15;
    }
}

const SUCCESS_SHIFT: u32 = 12;
const FAILURE_SHIFT: u32 = 15;

impl InstructionFlags {
    pub fn success_ordering(self) -> AtomicOrdering {
        AtomicOrdering::from_bits((self & Self::SUCCESS_ORDERING).bits() >> SUCCESS_SHIFT)
    }

    pub fn failure_ordering(self) -> AtomicOrdering {
        AtomicOrdering::from_bits((self & Self::FAILURE_ORDERING).bits() >> FAILURE_SHIFT)
    }

    pub fn with_success_ordering(self, ordering: AtomicOrdering) -> Self {
        let bits = (ordering as u32) << SUCCESS_SHIFT;
        (self - Self::SUCCESS_ORDERING) | Self::from_bits_retain(bits)
    }

    pub fn with_failure_ordering(self, ordering: AtomicOrdering) -> Self {
        let bits = (ordering as u32) << FAILURE_SHIFT;
        (self - Self::FAILURE_ORDERING) | Self::from_bits_retain(bits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomicOrdering {
    #[default]
    NotAtomic = 0,
    Unordered = 1,
    Monotonic = 2,
    Acquire = 3,
    Release = 4,
    AcquireRelease = 5,
    SequentiallyConsistent = 6,
}

impl AtomicOrdering {
    fn from_bits(bits: u32) -> Self {
        match bits {
            1 => Self::Unordered,
            2 => Self::Monotonic,
            3 => Self::Acquire,
            4 => Self::Release,
            5 => Self::AcquireRelease,
            6 => Self::SequentiallyConsistent,
            _ => Self::NotAtomic,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NotAtomic => "notatomic",
            Self::Unordered => "unordered",
            Self::Monotonic => "monotonic",
            Self::Acquire => "acquire",
            Self::Release => "release",
            Self::AcquireRelease => "acq_rel",
            Self::SequentiallyConsistent => "seq_cst",
        }
    }
}

/// Instruction opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Trunc,
    ZExt,
    SExt,
    FPToUI,
    FPToSI,
    UIToFP,
    SIToFP,
    FPTrunc,
    FPExt,
    PtrToInt,
    IntToPtr,
    BitCast,
    AddrSpaceCast,

    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,

    ExtractVal,
    InsertVal,
    ExtractElement,
    InsertElement,
    ShuffleVector,

    FOrdFalse,
    FOrdEqual,
    FOrdGreater,
    FOrdGreaterEqual,
    FOrdLess,
    FOrdLessEqual,
    FOrdNotEqual,
    FOrd,
    FUnord,
    FUnordEqual,
    FUnordGreater,
    FUnordGreaterEqual,
    FUnordLess,
    FUnordLessEqual,
    FUnordNotEqual,
    FOrdTrue,
    IEqual,
    INotEqual,
    UGreater,
    UGreaterEqual,
    ULess,
    ULessEqual,
    SGreater,
    SGreaterEqual,
    SLess,
    SLessEqual,

    Alloca,
    GetElementPtr,
    Load,
    Store,
    Fence,
    CompareExchange,
    LoadAtomic,
    StoreAtomic,

    Ret,
    Br,
    Switch,
    IndirectBr,
    Unreachable,
    Phi,

    AtomicExchange,
    AtomicAdd,
    AtomicSub,
    AtomicAnd,
    AtomicNand,
    AtomicOr,
    AtomicXor,
    AtomicMax,
    AtomicMin,
    AtomicUMax,
    AtomicUMin,

    Select,
    Call,
    VAArg,
    LandingPad,

    /// An opcode the producer could not classify; rendered as `???`.
    Unknown(u32),
}

impl Operation {
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Self::Ret | Self::Br | Self::Switch | Self::IndirectBr | Self::Unreachable
        )
    }

    /// Mnemonic of cast instructions.
    pub fn cast_name(self) -> Option<&'static str> {
        Some(match self {
            Self::Trunc => "trunc",
            Self::ZExt => "zext",
            Self::SExt => "sext",
            Self::FPToUI => "fptoui",
            Self::FPToSI => "fptosi",
            Self::UIToFP => "uitofp",
            Self::SIToFP => "sitofp",
            Self::FPTrunc => "fptrunc",
            Self::FPExt => "fpext",
            Self::PtrToInt => "ptrtoint",
            Self::IntToPtr => "inttoptr",
            Self::BitCast => "bitcast",
            Self::AddrSpaceCast => "addrspacecast",
            _ => return None,
        })
    }

    /// Mnemonic of binary operators.
    pub fn binop_name(self) -> Option<&'static str> {
        Some(match self {
            Self::FAdd => "fadd",
            Self::FSub => "fsub",
            Self::FMul => "fmul",
            Self::FDiv => "fdiv",
            Self::FRem => "frem",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::UDiv => "udiv",
            Self::SDiv => "sdiv",
            Self::URem => "urem",
            Self::SRem => "srem",
            Self::Shl => "shl",
            Self::LShr => "lshr",
            Self::AShr => "ashr",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            _ => return None,
        })
    }

    /// `fcmp`/`icmp` mnemonic and predicate.
    pub fn compare(self) -> Option<(&'static str, &'static str)> {
        Some(match self {
            Self::FOrdFalse => ("fcmp", "false"),
            Self::FOrdEqual => ("fcmp", "oeq"),
            Self::FOrdGreater => ("fcmp", "ogt"),
            Self::FOrdGreaterEqual => ("fcmp", "oge"),
            Self::FOrdLess => ("fcmp", "olt"),
            Self::FOrdLessEqual => ("fcmp", "ole"),
            Self::FOrdNotEqual => ("fcmp", "one"),
            Self::FOrd => ("fcmp", "ord"),
            Self::FUnord => ("fcmp", "uno"),
            Self::FUnordEqual => ("fcmp", "ueq"),
            Self::FUnordGreater => ("fcmp", "ugt"),
            Self::FUnordGreaterEqual => ("fcmp", "uge"),
            Self::FUnordLess => ("fcmp", "ult"),
            Self::FUnordLessEqual => ("fcmp", "ule"),
            Self::FUnordNotEqual => ("fcmp", "une"),
            Self::FOrdTrue => ("fcmp", "true"),
            Self::IEqual => ("icmp", "eq"),
            Self::INotEqual => ("icmp", "ne"),
            Self::UGreater => ("icmp", "ugt"),
            Self::UGreaterEqual => ("icmp", "uge"),
            Self::ULess => ("icmp", "ult"),
            Self::ULessEqual => ("icmp", "ule"),
            Self::SGreater => ("icmp", "sgt"),
            Self::SGreaterEqual => ("icmp", "sge"),
            Self::SLess => ("icmp", "slt"),
            Self::SLessEqual => ("icmp", "sle"),
            _ => return None,
        })
    }

    /// `atomicrmw` operation keyword.
    pub fn atomic_rmw_name(self) -> Option<&'static str> {
        Some(match self {
            Self::AtomicExchange => "xchg",
            Self::AtomicAdd => "add",
            Self::AtomicSub => "sub",
            Self::AtomicAnd => "and",
            Self::AtomicNand => "nand",
            Self::AtomicOr => "or",
            Self::AtomicXor => "xor",
            Self::AtomicMax => "max",
            Self::AtomicMin => "min",
            Self::AtomicUMax => "umax",
            Self::AtomicUMin => "umin",
            _ => return None,
        })
    }
}

/// One instruction of a function body.
///
/// Operand layout per opcode follows bitcode order: `Store` is
/// `[ptr, value]`, `Select` is `[cond, if_true, if_false]`, conditional `Br`
/// is `[cond, Block(t), Block(f)]`, `Switch` is
/// `[cond, Block(default), (case, Block)*]`, and `Phi` is `[(value, Block)*]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Operation,
    /// Result type; `None` (or `void`) for instructions without a result.
    pub ty: Option<TypeId>,
    pub name: Option<String>,
    pub args: Vec<Value>,
    pub callee: Option<FunctionId>,
    pub align: Option<u32>,
    pub flags: InstructionFlags,
    pub debug_loc: Option<DebugLocId>,
    /// `(kind, node)` pairs; `kind` indexes [`super::Module::metadata_kinds`].
    pub attached: Vec<(u32, MetadataId)>,
}

impl Instruction {
    pub fn new(op: Operation) -> Self {
        Self {
            op,
            ty: None,
            name: None,
            args: Vec::new(),
            callee: None,
            align: None,
            flags: InstructionFlags::empty(),
            debug_loc: None,
            attached: Vec::new(),
        }
    }
}
