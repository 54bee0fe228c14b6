//! Type, value, constant and metadata spelling shared by both dialects.

use std::fmt::Write as _;

use crate::ir::{
    BlockId, ConstantId, ConstantValue, DebugLocation, Function, MetadataContent, MetadataId,
    Module, Operation, Type, TypeId, Value,
};

use super::{debuginfo, Dialect};

/// Function context for local values.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'m> {
    pub index: usize,
    pub func: &'m Function,
}

/// Spells IR entities as text for one dialect.
#[derive(Clone, Copy)]
pub(crate) struct Printer<'m> {
    pub module: &'m Module,
    pub dialect: Dialect,
}

impl<'m> Printer<'m> {
    pub fn new(module: &'m Module, dialect: Dialect) -> Self {
        Self { module, dialect }
    }

    pub fn type_name(&self, id: TypeId) -> String {
        let Some(ty) = self.module.ty(id) else {
            tracing::error!(ty = id.0, "type reference outside the module arena");
            return "???".to_owned();
        };
        match (self.dialect, ty) {
            (Dialect::Readable, Type::Integer { bits }) => match bits {
                1 => "bool".to_owned(),
                8 => "byte".to_owned(),
                16 => "short".to_owned(),
                32 => "int".to_owned(),
                64 => "long".to_owned(),
                _ => format!("i{bits}"),
            },
            (Dialect::Readable, Type::Vector { element, count })
                if self.module.ty(*element).is_some_and(Type::is_scalar) =>
            {
                format!("{}{count}", self.type_name(*element))
            }
            (_, Type::Void) => "void".to_owned(),
            (_, Type::Integer { bits }) => format!("i{bits}"),
            (_, Type::Float { bits }) => match bits {
                16 => "half".to_owned(),
                32 => "float".to_owned(),
                64 => "double".to_owned(),
                _ => format!("fp{bits}"),
            },
            (_, Type::Vector { element, count }) => {
                format!("<{count} x {}>", self.type_name(*element))
            }
            (_, Type::Pointer {
                pointee,
                address_space,
            }) => {
                if *address_space == 0 {
                    format!("{}*", self.type_name(*pointee))
                } else {
                    format!("{} addrspace({address_space})*", self.type_name(*pointee))
                }
            }
            (_, Type::Array { element, count }) => {
                format!("[{count} x {}]", self.type_name(*element))
            }
            (_, Type::Function {
                ret,
                params,
                vararg,
            }) => {
                let mut params: Vec<String> = params.iter().map(|p| self.type_name(*p)).collect();
                if *vararg {
                    params.push("...".to_owned());
                }
                format!("{} ({})", self.type_name(*ret), params.join(", "))
            }
            (_, Type::Struct {
                name: Some(name), ..
            }) => match self.dialect {
                Dialect::ToolchainExact => format!("%{}", escape_name(name)),
                Dialect::Readable => name.clone(),
            },
            (_, Type::Struct {
                name: None,
                members,
                packed,
            }) => self.struct_body(members, *packed),
            (_, Type::Metadata) => "metadata".to_owned(),
            (_, Type::Label) => "label".to_owned(),
        }
    }

    /// `{ a, b }` body of a struct type.
    pub fn struct_body(&self, members: &[TypeId], packed: bool) -> String {
        let inner = if members.is_empty() {
            "{}".to_owned()
        } else {
            let names: Vec<String> = members.iter().map(|m| self.type_name(*m)).collect();
            format!("{{ {} }}", names.join(", "))
        };
        if packed {
            format!("<{inner}>")
        } else {
            inner
        }
    }

    /// Pointee of a pointer type, or the type itself when it is not a pointer.
    pub fn pointee(&self, id: TypeId) -> TypeId {
        match self.module.ty(id) {
            Some(Type::Pointer { pointee, .. }) => *pointee,
            _ => id,
        }
    }

    fn sigil(&self) -> char {
        match self.dialect {
            Dialect::ToolchainExact => '%',
            Dialect::Readable => '_',
        }
    }

    fn local(&self, name: Option<&str>, slot: Option<u32>, what: &str) -> String {
        let sigil = self.sigil();
        match (name, slot) {
            (Some(name), _) => format!("{sigil}{}", escape_name(name)),
            (None, Some(slot)) => format!("{sigil}{slot}"),
            (None, None) => {
                tracing::error!(what, "local value has neither a name nor a slot");
                format!("{sigil}???")
            }
        }
    }

    pub fn block_name(&self, scope: Scope<'_>, block: BlockId) -> String {
        let name = scope
            .func
            .blocks
            .get(block.index())
            .and_then(|b| b.name.as_deref());
        let slot = self.module.block_slot(scope.index, block);
        self.local(name, slot, "block")
    }

    /// A value without its type.
    pub fn value(&self, scope: Option<Scope<'_>>, value: Value) -> String {
        match value {
            Value::Function(id) => match self.module.function(id) {
                Some(f) => format!("@{}", escape_name(&f.name)),
                None => missing("function", id.0),
            },
            Value::GlobalVar(id) => match self.module.globals.get(id.index()) {
                Some(g) => format!("@{}", escape_name(&g.name)),
                None => missing("global", id.0),
            },
            Value::Alias(id) => match self.module.aliases.get(id.index()) {
                Some(a) => format!("@{}", escape_name(&a.name)),
                None => missing("alias", id.0),
            },
            Value::Constant(id) => self.constant(scope, id),
            Value::Literal(v) => v.to_string(),
            Value::Metadata(id) => self.metadata_ref(scope, id),
            Value::Instruction(id) => {
                let Some(scope) = scope else {
                    return missing("instruction outside a function", id.0);
                };
                let Some(inst) = scope.func.instructions.get(id.index()) else {
                    return missing("instruction", id.0);
                };
                let slot = self.module.instruction_slot(scope.index, id);
                self.local(inst.name.as_deref(), slot, "instruction")
            }
            Value::Argument(i) => {
                let Some(scope) = scope else {
                    return missing("argument outside a function", i);
                };
                let Some(arg) = scope.func.args.get(i as usize) else {
                    return missing("argument", i);
                };
                let slot = self.module.argument_slot(scope.index, i);
                self.local(arg.name.as_deref(), slot, "argument")
            }
            Value::Block(id) => match scope {
                Some(scope) => self.block_name(scope, id),
                None => missing("block outside a function", id.0),
            },
        }
    }

    /// A value preceded by its type, `T v`.
    pub fn typed(&self, scope: Option<Scope<'_>>, value: Value) -> String {
        if let Value::Metadata(id) = value {
            return format!("metadata {}", self.metadata_ref(scope, id));
        }
        match self.module.value_type(scope.map(|s| s.func), value) {
            Some(ty) => format!("{} {}", self.type_name(ty), self.value(scope, value)),
            None => self.value(scope, value),
        }
    }

    /// Constant payload without its type.
    pub fn constant(&self, scope: Option<Scope<'_>>, id: ConstantId) -> String {
        let Some(c) = self.module.constant(id) else {
            return missing("constant", id.0);
        };
        match &c.value {
            ConstantValue::Undef => "undef".to_owned(),
            ConstantValue::Null => self.null_of(c.ty),
            ConstantValue::Scalar(bits) => self.scalar(c.ty, *bits),
            ConstantValue::Data(elems) => self.data(c.ty, elems),
            ConstantValue::Aggregate(members) => self.aggregate(scope, c.ty, members),
            ConstantValue::Expr { op, args } => self.expr(scope, c.ty, *op, args),
        }
    }

    fn null_of(&self, ty: TypeId) -> String {
        match self.module.ty(ty) {
            Some(Type::Integer { .. } | Type::Float { .. }) => self.scalar(ty, 0),
            Some(Type::Pointer { .. }) => "null".to_owned(),
            _ => "zeroinitializer".to_owned(),
        }
    }

    pub fn scalar(&self, ty: TypeId, bits: u64) -> String {
        match self.module.ty(ty) {
            Some(Type::Integer { bits: 1 }) => {
                let text = if bits & 1 != 0 { "true" } else { "false" };
                text.to_owned()
            }
            Some(Type::Integer { bits: width }) => sign_extend(bits, *width).to_string(),
            Some(Type::Float { bits: 16 }) => match self.dialect {
                Dialect::ToolchainExact => format!("0xH{:04X}", bits as u16),
                Dialect::Readable => {
                    short_float(f64::from(half::f16::from_bits(bits as u16).to_f32()), || {
                        format!("{:?}", half::f16::from_bits(bits as u16).to_f32())
                    })
                }
            },
            Some(Type::Float { bits: 32 }) => {
                let v = f32::from_bits(bits as u32);
                match self.dialect {
                    Dialect::ToolchainExact => format_float(f64::from(v)),
                    Dialect::Readable => short_float(f64::from(v), || format!("{v:?}")),
                }
            }
            Some(Type::Float { bits: 64 }) => {
                let v = f64::from_bits(bits);
                match self.dialect {
                    Dialect::ToolchainExact => format_float(v),
                    Dialect::Readable => short_float(v, || format!("{v:?}")),
                }
            }
            Some(Type::Pointer { .. }) if bits == 0 => "null".to_owned(),
            _ => {
                tracing::error!(ty = ty.0, bits, "scalar constant of unsupported type");
                format!("unsupported type {}", ty.0)
            }
        }
    }

    fn element_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.module.ty(ty)? {
            Type::Vector { element, .. } | Type::Array { element, .. } => Some(*element),
            _ => None,
        }
    }

    fn data(&self, ty: TypeId, elems: &[u64]) -> String {
        let Some(elem) = self.element_type(ty) else {
            tracing::error!(ty = ty.0, "data constant of non-sequential type");
            return "???".to_owned();
        };
        let is_vector = matches!(self.module.ty(ty), Some(Type::Vector { .. }));
        if !is_vector && matches!(self.module.ty(elem), Some(Type::Integer { bits: 8 })) {
            return c_string(elems);
        }
        let elem_name = self.type_name(elem);
        let items: Vec<String> = elems
            .iter()
            .map(|e| format!("{elem_name} {}", self.scalar(elem, *e)))
            .collect();
        if is_vector {
            format!("<{}>", items.join(", "))
        } else {
            format!("[{}]", items.join(", "))
        }
    }

    fn aggregate(&self, scope: Option<Scope<'_>>, ty: TypeId, members: &[Value]) -> String {
        let all = |f: fn(&crate::ir::Constant) -> bool| {
            !members.is_empty()
                && members.iter().all(|m| match m {
                    Value::Constant(id) => self.module.constant(*id).is_some_and(f),
                    _ => false,
                })
        };
        if all(crate::ir::Constant::is_undef) {
            return "undef".to_owned();
        }
        if all(crate::ir::Constant::is_null) {
            return "zeroinitializer".to_owned();
        }

        let items: Vec<String> = members.iter().map(|m| self.typed(scope, *m)).collect();
        let items = items.join(", ");
        match self.module.ty(ty) {
            Some(Type::Vector { .. }) => format!("<{items}>"),
            Some(Type::Array { .. }) => format!("[{items}]"),
            Some(Type::Struct { packed: true, .. }) => format!("<{{ {items} }}>"),
            Some(Type::Struct { .. }) => format!("{{ {items} }}"),
            _ => {
                tracing::error!(ty = ty.0, "aggregate constant of non-aggregate type");
                format!("??? {{ {items} }}")
            }
        }
    }

    fn expr(&self, scope: Option<Scope<'_>>, ty: TypeId, op: Operation, args: &[Value]) -> String {
        if op == Operation::GetElementPtr {
            let Some(base) = args.first() else {
                return missing("getelementptr base", 0);
            };
            let base_ty = self
                .module
                .value_type(scope.map(|s| s.func), *base)
                .map(|t| self.type_name(self.pointee(t)))
                .unwrap_or_else(|| "???".to_owned());
            let operands: Vec<String> = args.iter().map(|a| self.typed(scope, *a)).collect();
            return format!("getelementptr inbounds ({base_ty}, {})", operands.join(", "));
        }
        if let (Some(name), Some(arg)) = (op.cast_name(), args.first()) {
            return format!(
                "{name} ({} to {})",
                self.typed(scope, *arg),
                self.type_name(ty)
            );
        }
        tracing::error!(?op, "unsupported constant expression");
        "???".to_owned()
    }

    /// `!N` when the node has a slot, its inline spelling otherwise.
    pub fn metadata_ref(&self, scope: Option<Scope<'_>>, id: MetadataId) -> String {
        if let Some(slot) = self.module.metadata_slot(id) {
            return format!("!{slot}");
        }
        let Some(node) = self.module.metadata_node(id) else {
            return missing("metadata", id.0);
        };
        match &node.content {
            MetadataContent::String(s) => format!("!{}", quoted(s.as_bytes())),
            MetadataContent::Value(v) => self.typed(scope, *v),
            MetadataContent::Node(_) | MetadataContent::Dwarf(_) => {
                tracing::error!(id = id.0, "metadata node referenced without a slot");
                "!<unassigned>".to_owned()
            }
        }
    }

    pub fn optional_ref(&self, id: Option<MetadataId>) -> String {
        match id {
            Some(id) => self.metadata_ref(None, id),
            None => "null".to_owned(),
        }
    }

    /// Right-hand side of a numbered metadata line.
    pub fn metadata_body(&self, id: MetadataId) -> String {
        let Some(node) = self.module.metadata_node(id) else {
            return missing("metadata", id.0);
        };
        let body = match &node.content {
            MetadataContent::Node(children) => {
                let items: Vec<String> = children.iter().map(|c| self.optional_ref(*c)).collect();
                format!("!{{{}}}", items.join(", "))
            }
            MetadataContent::Dwarf(info) => debuginfo::render(self, info),
            MetadataContent::String(s) => format!("!{}", quoted(s.as_bytes())),
            MetadataContent::Value(v) => self.typed(None, *v),
        };
        if node.distinct {
            format!("distinct {body}")
        } else {
            body
        }
    }

    pub fn debug_location(&self, loc: &DebugLocation) -> String {
        let mut out = format!(
            "!DILocation(line: {}, column: {}, scope: {}",
            loc.line,
            loc.column,
            self.optional_ref(loc.scope)
        );
        if let Some(inlined) = loc.inlined_at {
            let _ = write!(out, ", inlinedAt: {}", self.metadata_ref(None, inlined));
        }
        out.push(')');
        out
    }
}

fn missing(what: &str, id: u32) -> String {
    tracing::error!(what, id, "dangling reference while rendering");
    "???".to_owned()
}

pub(crate) fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

/// C `%.6e`, e.g. `1.000000e+00`.
fn c_exponent(v: f64) -> String {
    let s = format!("{v:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
        }
        None => s,
    }
}

/// Float literal that reparses to exactly `v`, or the raw double bits.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_finite() {
        let text = c_exponent(v);
        if text.parse::<f64>().ok() == Some(v) {
            return text;
        }
    }
    format!("0x{:016X}", v.to_bits())
}

fn short_float(v: f64, finite: impl FnOnce() -> String) -> String {
    if v.is_finite() {
        finite()
    } else {
        format!("0x{:016X}", v.to_bits())
    }
}

/// Escapes bytes outside printable ASCII, `"` and `\` as `\XX`.
pub(crate) fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\{b:02X}");
        }
    }
    out
}

pub(crate) fn quoted(bytes: &[u8]) -> String {
    format!("\"{}\"", escape_bytes(bytes))
}

/// `c"..."` spelling of an `i8` array.
pub(crate) fn c_string(elems: &[u64]) -> String {
    let bytes: Vec<u8> = elems.iter().map(|e| *e as u8).collect();
    format!("c{}", quoted(&bytes))
}

/// Identifiers outside `[-a-zA-Z$._0-9]`, or starting with a digit, are quoted.
pub(crate) fn escape_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.as_bytes()[0].is_ascii_digit()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'$' | b'.' | b'_'));
    if plain {
        name.to_owned()
    } else {
        quoted(name.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_use_c_exponent_when_exact() {
        assert_eq!(format_float(1.0), "1.000000e+00");
        assert_eq!(format_float(-0.5), "-5.000000e-01");
        assert_eq!(format_float(0.0), "0.000000e+00");
        assert_eq!(format_float(1.5e300), "1.500000e+300");
    }

    #[test]
    fn inexact_and_non_finite_floats_fall_back_to_hex() {
        assert_eq!(format_float(f64::from(0.1f32)), "0x3FB99999A0000000");
        assert_eq!(format_float(f64::INFINITY), "0x7FF0000000000000");
        assert_eq!(format_float(f64::NEG_INFINITY), "0xFFF0000000000000");
        assert!(format_float(f64::NAN).starts_with("0x7FF8"));
    }

    #[test]
    fn integers_sign_extend() {
        assert_eq!(sign_extend(0xFFFF_FFFF, 32), -1);
        assert_eq!(sign_extend(0x7F, 8), 127);
        assert_eq!(sign_extend(0x80, 8), -128);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }

    #[test]
    fn strings_escape_non_printable() {
        assert_eq!(c_string(&[b'h' as u64, b'i' as u64, 0]), "c\"hi\\00\"");
        assert_eq!(quoted(b"a\"b\\c\n"), "\"a\\22b\\5Cc\\0A\"");
    }

    #[test]
    fn names_quote_only_when_needed() {
        assert_eq!(escape_name("dx.op.loadInput.f32"), "dx.op.loadInput.f32");
        assert_eq!(escape_name("a b"), "\"a b\"");
        assert_eq!(escape_name("1x"), "\"1x\"");
        assert_eq!(escape_name("$tmp-1"), "$tmp-1");
    }
}
