//! Opcode templates.

use crate::ir::{Instruction, InstructionFlags, Operation, Type, Value};

use super::format::{escape_name, Printer, Scope};

const FLAG_WORDS: &[(InstructionFlags, &str)] = &[
    (InstructionFlags::NO_NANS, "nnan"),
    (InstructionFlags::NO_INFS, "ninf"),
    (InstructionFlags::NO_SIGNED_ZEROS, "nsz"),
    (InstructionFlags::ALLOW_RECIPROCAL, "arcp"),
    (InstructionFlags::NO_UNSIGNED_WRAP, "nuw"),
    (InstructionFlags::NO_SIGNED_WRAP, "nsw"),
    (InstructionFlags::EXACT, "exact"),
];

/// Optimization keywords with a trailing space, or an empty string.
fn flag_prefix(flags: InstructionFlags) -> String {
    if flags.contains(InstructionFlags::FAST_MATH) {
        return "fast ".to_owned();
    }
    let mut out = String::new();
    for (flag, word) in FLAG_WORDS {
        if flags.contains(*flag) {
            out.push_str(word);
            out.push(' ');
        }
    }
    out
}

struct Operands<'a, 'p, 'm> {
    printer: &'p Printer<'m>,
    scope: Scope<'a>,
    inst: &'a Instruction,
}

impl Operands<'_, '_, '_> {
    fn get(&self, i: usize) -> Option<Value> {
        let arg = self.inst.args.get(i).copied();
        if arg.is_none() {
            tracing::error!(op = ?self.inst.op, index = i, "instruction is missing an operand");
        }
        arg
    }

    fn typed(&self, i: usize) -> String {
        self.get(i).map_or_else(
            || "???".to_owned(),
            |v| self.printer.typed(Some(self.scope), v),
        )
    }

    fn plain(&self, i: usize) -> String {
        self.get(i).map_or_else(
            || "???".to_owned(),
            |v| self.printer.value(Some(self.scope), v),
        )
    }

    fn label(&self, i: usize) -> String {
        format!("label {}", self.plain(i))
    }

    fn plain_from(&self, start: usize) -> String {
        let items: Vec<String> = self
            .inst
            .args
            .iter()
            .skip(start)
            .map(|v| self.printer.value(Some(self.scope), *v))
            .collect();
        items.join(", ")
    }

    fn typed_from(&self, start: usize) -> String {
        let items: Vec<String> = self
            .inst
            .args
            .iter()
            .skip(start)
            .map(|v| self.printer.typed(Some(self.scope), *v))
            .collect();
        items.join(", ")
    }

    fn result_type(&self) -> String {
        self.inst
            .ty
            .map_or_else(|| "void".to_owned(), |t| self.printer.type_name(t))
    }

    /// Pointee type of operand `i`.
    fn pointee_of(&self, i: usize) -> String {
        let ty = self
            .get(i)
            .and_then(|v| self.printer.module.value_type(Some(self.scope.func), v));
        match ty {
            Some(ty) => self.printer.type_name(self.printer.pointee(ty)),
            None => "???".to_owned(),
        }
    }
}

/// Text of `inst` after any `%x = ` prefix.
pub(crate) fn body(printer: &Printer<'_>, scope: Scope<'_>, inst: &Instruction) -> String {
    let ops = Operands {
        printer,
        scope,
        inst,
    };
    let flags = inst.flags;
    let align = match inst.align {
        Some(a) if a > 0 => format!(", align {a}"),
        _ => String::new(),
    };
    let volatile = if flags.contains(InstructionFlags::VOLATILE) {
        "volatile "
    } else {
        ""
    };
    let sync_scope = if flags.contains(InstructionFlags::SINGLE_THREAD) {
        " singlethread"
    } else {
        ""
    };
    let ordering = flags.success_ordering().name();

    if let Some(name) = inst.op.cast_name() {
        return format!("{name} {} to {}", ops.typed(0), ops.result_type());
    }
    if let Some(name) = inst.op.binop_name() {
        return format!(
            "{name} {}{}, {}",
            flag_prefix(flags),
            ops.typed(0),
            ops.plain(1)
        );
    }
    if let Some((mnemonic, predicate)) = inst.op.compare() {
        return format!(
            "{mnemonic} {}{predicate} {}, {}",
            flag_prefix(flags),
            ops.typed(0),
            ops.plain(1)
        );
    }
    if let Some(name) = inst.op.atomic_rmw_name() {
        return format!(
            "atomicrmw {volatile}{name} {}, {}{sync_scope} {ordering}",
            ops.typed(0),
            ops.typed(1)
        );
    }

    match inst.op {
        Operation::ExtractVal => format!("extractvalue {}, {}", ops.typed(0), ops.plain_from(1)),
        Operation::InsertVal => format!(
            "insertvalue {}, {}, {}",
            ops.typed(0),
            ops.typed(1),
            ops.plain_from(2)
        ),
        Operation::ExtractElement => {
            format!("extractelement {}, {}", ops.typed(0), ops.typed(1))
        }
        Operation::InsertElement => format!(
            "insertelement {}, {}, {}",
            ops.typed(0),
            ops.typed(1),
            ops.typed(2)
        ),
        Operation::ShuffleVector => format!(
            "shufflevector {}, {}, {}",
            ops.typed(0),
            ops.typed(1),
            ops.typed(2)
        ),
        Operation::Select => format!(
            "select {}, {}, {}",
            ops.typed(0),
            ops.typed(1),
            ops.typed(2)
        ),
        Operation::Alloca => {
            let allocated = inst
                .ty
                .map_or_else(|| "???".to_owned(), |t| printer.type_name(printer.pointee(t)));
            let count = if inst.args.is_empty() {
                String::new()
            } else {
                format!(", {}", ops.typed(0))
            };
            format!("alloca {allocated}{count}{align}")
        }
        Operation::GetElementPtr => {
            let inbounds = if flags.contains(InstructionFlags::IN_BOUNDS) {
                "inbounds "
            } else {
                ""
            };
            format!(
                "getelementptr {inbounds}{}, {}",
                ops.pointee_of(0),
                ops.typed_from(0)
            )
        }
        Operation::Load => format!(
            "load {volatile}{}, {}{align}",
            ops.result_type(),
            ops.typed(0)
        ),
        Operation::LoadAtomic => format!(
            "load atomic {volatile}{}, {}{sync_scope} {ordering}{align}",
            ops.result_type(),
            ops.typed(0)
        ),
        Operation::Store => format!("store {volatile}{}, {}{align}", ops.typed(1), ops.typed(0)),
        Operation::StoreAtomic => format!(
            "store atomic {volatile}{}, {}{sync_scope} {ordering}{align}",
            ops.typed(1),
            ops.typed(0)
        ),
        Operation::Fence => format!("fence{sync_scope} {ordering}"),
        Operation::CompareExchange => {
            let weak = if flags.contains(InstructionFlags::WEAK) {
                "weak "
            } else {
                ""
            };
            format!(
                "cmpxchg {weak}{volatile}{}, {}, {}{sync_scope} {ordering} {}",
                ops.typed(0),
                ops.typed(1),
                ops.typed(2),
                flags.failure_ordering().name()
            )
        }
        Operation::Ret => {
            if inst.args.is_empty() {
                "ret void".to_owned()
            } else {
                format!("ret {}", ops.typed(0))
            }
        }
        Operation::Br => {
            if inst.args.len() >= 3 {
                format!("br {}, {}, {}", ops.typed(0), ops.label(1), ops.label(2))
            } else {
                format!("br {}", ops.label(0))
            }
        }
        Operation::Switch => {
            let mut out = format!("switch {}, {} [", ops.typed(0), ops.label(1));
            let mut i = 2;
            while i + 1 < inst.args.len() {
                out.push_str(&format!("\n    {}, {}", ops.typed(i), ops.label(i + 1)));
                i += 2;
            }
            out.push_str("\n  ]");
            out
        }
        Operation::IndirectBr => {
            let targets: Vec<String> = (1..inst.args.len()).map(|i| ops.label(i)).collect();
            format!("indirectbr {}, [{}]", ops.typed(0), targets.join(", "))
        }
        Operation::Unreachable => "unreachable".to_owned(),
        Operation::Phi => {
            let incoming: Vec<String> = (0..inst.args.len() / 2)
                .map(|pair| format!("[ {}, {} ]", ops.plain(pair * 2), ops.plain(pair * 2 + 1)))
                .collect();
            format!("phi {} {}", ops.result_type(), incoming.join(", "))
        }
        Operation::Call => call(printer, &ops),
        Operation::VAArg => format!("va_arg {}, {}", ops.typed(0), ops.result_type()),
        Operation::LandingPad => format!("landingpad {}", ops.result_type()),
        Operation::Unknown(raw) => {
            tracing::error!(opcode = raw, "unknown instruction opcode");
            "???".to_owned()
        }
        // Casts, binary operators, comparisons and atomic RMW returned above.
        _ => {
            tracing::error!(op = ?inst.op, "instruction has no template");
            "???".to_owned()
        }
    }
}

fn call(printer: &Printer<'_>, ops: &Operands<'_, '_, '_>) -> String {
    let inst = ops.inst;
    let Some(callee) = inst.callee.and_then(|c| printer.module.function(c)) else {
        tracing::error!("call without a resolvable callee");
        return format!("call ??? ({})", ops.typed_from(0));
    };
    let callee_ty = match printer.module.ty(callee.ty) {
        Some(Type::Function {
            vararg: true, ..
        }) => printer.type_name(callee.ty),
        Some(Type::Function { ret, .. }) => printer.type_name(*ret),
        _ => ops.result_type(),
    };
    format!(
        "call {}{callee_ty} @{}({})",
        flag_prefix(inst.flags),
        escape_name(&callee.name),
        ops.typed_from(0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_overrides_individual_flags() {
        let flags = InstructionFlags::FAST_MATH | InstructionFlags::NO_NANS;
        assert_eq!(flag_prefix(flags), "fast ");
        let flags = InstructionFlags::NO_NANS | InstructionFlags::ALLOW_RECIPROCAL;
        assert_eq!(flag_prefix(flags), "nnan arcp ");
        let flags = InstructionFlags::NO_SIGNED_WRAP | InstructionFlags::NO_UNSIGNED_WRAP;
        assert_eq!(flag_prefix(flags), "nuw nsw ");
        assert_eq!(flag_prefix(InstructionFlags::VOLATILE), "");
    }
}
