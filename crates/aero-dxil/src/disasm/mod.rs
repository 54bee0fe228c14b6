//! Module disassembly in two dialects.
//!
//! [`Dialect::ToolchainExact`] reproduces the text layout of the LLVM 3.7
//! based shader toolchain, down to attribute groups and the numbered metadata
//! dump. [`Dialect::Readable`] prints the same instruction stream with
//! friendlier type names, `_` locals and common intrinsics rewritten into
//! HLSL-like statements.
//!
//! Rendering never fails. Dangling references and unknown opcodes are logged
//! and replaced by a `???` marker so the rest of the module still prints.

mod debuginfo;
mod dx_op;
mod format;
mod instruction;
mod readable;

use std::fmt::Write as _;

use crate::ir::{
    AttributeGroup, Block, BlockId, Function, InstId, Instruction, MetadataContent, Module,
    Operation, Type, Value, ATTRIBUTE_NAMES,
};
use crate::slots::SlotOwner;

use self::format::{escape_name, quoted, Printer, Scope};

pub use self::readable::resource_type_name;

/// Column the `; preds = ` comment of a block label starts at.
const PREDS_COLUMN: usize = 50;

/// Text style of a disassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Matches the shader toolchain's own disassembler.
    #[default]
    ToolchainExact,
    /// Easier to read, not meant to be parsed back.
    Readable,
}

/// Rendered module text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Disassembly {
    pub text: String,
    /// 1-based output line of every instruction, per function. Declarations
    /// have an empty list.
    pub instruction_lines: Vec<Vec<u32>>,
}

/// Renders `module` as text.
///
/// An unsettled module is rendered from a settled copy; settle it first to
/// avoid the clone.
pub fn render(module: &Module, dialect: Dialect) -> Disassembly {
    if !module.is_settled() {
        tracing::warn!("rendering an unsettled module; assigning slots on a copy");
        let mut settled = module.clone();
        settled.settle();
        return render(&settled, dialect);
    }

    let mut renderer = Renderer {
        printer: Printer::new(module, dialect),
        out: String::new(),
        next_line: 1,
        instruction_lines: Vec::with_capacity(module.functions.len()),
    };
    renderer.module();
    Disassembly {
        text: renderer.out,
        instruction_lines: renderer.instruction_lines,
    }
}

/// `nounwind readnone "k"="v"` spelling of an attribute group.
pub(crate) fn attribute_text(group: &AttributeGroup) -> String {
    let mut parts: Vec<String> = ATTRIBUTE_NAMES
        .iter()
        .filter(|(flag, _)| group.params.contains(*flag))
        .map(|(_, name)| (*name).to_owned())
        .collect();
    let sized = [
        ("align", group.align),
        ("alignstack", group.stack_align),
        ("dereferenceable", group.dereferenceable),
        ("dereferenceable_or_null", group.dereferenceable_or_null),
    ];
    for (key, value) in sized {
        if let Some(value) = value {
            parts.push(format!("{key}={value}"));
        }
    }
    for (key, value) in &group.strings {
        parts.push(format!("{}={}", quoted(key.as_bytes()), quoted(value.as_bytes())));
    }
    parts.join(" ")
}

struct Renderer<'m> {
    printer: Printer<'m>,
    out: String,
    next_line: u32,
    instruction_lines: Vec<Vec<u32>>,
}

impl<'m> Renderer<'m> {
    fn exact(&self) -> bool {
        self.printer.dialect == Dialect::ToolchainExact
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
        self.next_line += 1 + text.matches('\n').count() as u32;
    }

    fn blank(&mut self) {
        self.line("");
    }

    fn module(&mut self) {
        let module = self.printer.module;
        self.line(&format!(
            "; {} Shader, compiled under SM{}.{}",
            module.shader_kind.name(),
            module.major,
            module.minor
        ));
        self.blank();

        if self.exact() {
            self.line(&format!(
                "target datalayout = {}",
                quoted(module.datalayout.as_bytes())
            ));
            self.line(&format!(
                "target triple = {}",
                quoted(module.triple.as_bytes())
            ));
            self.blank();
        }

        self.struct_types();
        self.comdats();
        self.globals();
        self.aliases();

        for (index, func) in module.functions.iter().enumerate() {
            self.function(index, func);
        }

        if self.exact() {
            self.attribute_groups();
            self.named_metadata();
            self.numbered_metadata();
        }
    }

    fn struct_types(&mut self) {
        let module = self.printer.module;
        let mut any = false;
        for (i, ty) in module.types.iter().enumerate() {
            if let Type::Struct {
                name: Some(_),
                members,
                packed,
            } = ty
            {
                let name = self.printer.type_name(crate::ir::TypeId(i as u32));
                let body = self.printer.struct_body(members, *packed);
                self.line(&format!("{name} = type {body}"));
                any = true;
            }
        }
        if any {
            self.blank();
        }
    }

    fn comdats(&mut self) {
        let module = self.printer.module;
        for comdat in &module.comdats {
            self.line(&format!(
                "${} = comdat {}",
                escape_name(&comdat.name),
                comdat.selection.keyword()
            ));
        }
        if !module.comdats.is_empty() {
            self.blank();
        }
    }

    fn globals(&mut self) {
        let module = self.printer.module;
        for g in &module.globals {
            let mut text = format!("@{} = ", escape_name(&g.name));
            if g.external {
                text.push_str("external ");
            }
            if g.address_space != 0 {
                let _ = write!(text, "addrspace({}) ", g.address_space);
            }
            text.push_str(if g.is_const { "constant " } else { "global " });
            text.push_str(&self.printer.type_name(self.printer.pointee(g.ty)));
            if let Some(init) = g.initializer.filter(|_| !g.external) {
                text.push(' ');
                text.push_str(&self.printer.constant(None, init));
            }
            if let Some(section) = &g.section {
                let _ = write!(text, ", section {}", quoted(section.as_bytes()));
            }
            if let Some(align) = g.align.filter(|a| *a > 0) {
                let _ = write!(text, ", align {align}");
            }
            self.line(&text);
        }
        if !module.globals.is_empty() {
            self.blank();
        }
    }

    fn aliases(&mut self) {
        let module = self.printer.module;
        for alias in &module.aliases {
            self.line(&format!(
                "@{} = alias {}",
                escape_name(&alias.name),
                self.printer.typed(None, alias.target)
            ));
        }
        if !module.aliases.is_empty() {
            self.blank();
        }
    }

    fn function(&mut self, index: usize, func: &'m Function) {
        let module = self.printer.module;
        let scope = Scope { index, func };

        let group = func
            .attrs
            .and_then(|g| module.attribute_groups.get(g.index()).map(|grp| (g, grp)));
        let mut attr_ref = String::new();
        if self.exact() {
            if let Some((id, grp)) = group {
                if !grp.is_empty() {
                    self.line(&format!("; Function Attrs: {}", attribute_text(grp)));
                }
                match module.attr_slot(id) {
                    Some(n) => attr_ref = format!(" #{n}"),
                    None => tracing::error!(function = %func.name, "attribute group without a slot"),
                }
            }
        }

        let (ret, params, vararg) = match module.ty(func.ty) {
            Some(Type::Function {
                ret,
                params,
                vararg,
            }) => (self.printer.type_name(*ret), params.as_slice(), *vararg),
            _ => {
                tracing::error!(function = %func.name, "function has a non-function type");
                ("???".to_owned(), &[][..], false)
            }
        };
        let name = escape_name(&func.name);

        if func.external {
            let mut list: Vec<String> = params.iter().map(|p| self.printer.type_name(*p)).collect();
            if vararg {
                list.push("...".to_owned());
            }
            self.line(&format!(
                "declare {ret} @{name}({}){attr_ref}",
                list.join(", ")
            ));
            self.blank();
            self.instruction_lines.push(Vec::new());
            return;
        }

        let mut list: Vec<String> = func
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let ty = self.printer.type_name(arg.ty);
                // The toolchain leaves unnamed parameters bare.
                if arg.name.is_none() && self.exact() {
                    return ty;
                }
                let name = self.printer.value(Some(scope), Value::Argument(i as u32));
                format!("{ty} {name}")
            })
            .collect();
        if vararg {
            list.push("...".to_owned());
        }
        self.line(&format!(
            "define {ret} @{name}({}){attr_ref} {{",
            list.join(", ")
        ));

        let mut lines = vec![0u32; func.instructions.len()];
        for (b, span) in func.block_spans().into_iter().enumerate() {
            let block = func.blocks.get(b);
            let named = block.and_then(|blk| blk.name.as_ref()).is_some();
            if b > 0 || named {
                if b > 0 {
                    self.blank();
                }
                self.label(scope, BlockId(b as u32), block);
            }
            for i in span {
                lines[i] = self.next_line;
                self.instruction(scope, InstId(i as u32), &func.instructions[i]);
            }
        }

        self.line("}");
        self.blank();
        self.instruction_lines.push(lines);
    }

    fn label(&mut self, scope: Scope<'_>, id: BlockId, block: Option<&Block>) {
        let label = match block.and_then(|b| b.name.as_deref()) {
            Some(name) => format!("{}:", escape_name(name)),
            None => match self.printer.module.block_slot(scope.index, id) {
                Some(slot) => format!("; <label>:{slot}"),
                None => {
                    tracing::error!(block = id.0, "unnamed block without a slot");
                    "; <label>:???".to_owned()
                }
            },
        };
        let preds = block.map_or(&[][..], |b| b.preds.as_slice());
        if preds.is_empty() {
            self.line(&label);
            return;
        }
        let preds = match self.printer.dialect {
            // The toolchain orders predecessors by use-list, which is not
            // recoverable from the module.
            Dialect::ToolchainExact => "...".to_owned(),
            Dialect::Readable => {
                let names: Vec<String> = preds
                    .iter()
                    .map(|p| self.printer.block_name(scope, *p))
                    .collect();
                names.join(", ")
            }
        };
        let pad = PREDS_COLUMN.saturating_sub(label.len()).max(1);
        self.line(&format!("{label}{:pad$}; preds = {preds}", ""));
    }

    fn instruction(&mut self, scope: Scope<'_>, id: InstId, inst: &Instruction) {
        let printer = self.printer;
        let module = printer.module;
        let result = module
            .produces_value(inst)
            .then(|| printer.value(Some(scope), Value::Instruction(id)));

        let mut text = String::from("  ");
        let rewritten = match (printer.dialect, inst.op) {
            (Dialect::Readable, Operation::Call) => {
                readable::rewrite(&printer, scope, inst, result.as_deref())
            }
            _ => None,
        };
        match rewritten {
            Some(line) => text.push_str(&line),
            None => {
                if let Some(result) = &result {
                    let _ = write!(text, "{result} = ");
                }
                text.push_str(&instruction::body(&printer, scope, inst));
            }
        }

        if self.exact() {
            if let Some(loc) = inst.debug_loc {
                match module.debug_loc_slot(loc) {
                    Some(slot) => {
                        let _ = write!(text, ", !dbg !{slot}");
                    }
                    None => {
                        tracing::error!(loc = loc.0, "debug location without a slot");
                        text.push_str(", !dbg !<unassigned>");
                    }
                }
            }
            for &(kind, node) in &inst.attached {
                let kind = match module.metadata_kinds.get(kind as usize) {
                    Some(name) => escape_name(name),
                    None => {
                        tracing::error!(kind, "unknown metadata attachment kind");
                        kind.to_string()
                    }
                };
                let _ = write!(text, ", !{kind} {}", printer.metadata_ref(Some(scope), node));
            }
        } else if let Some(loc) = inst
            .debug_loc
            .and_then(|l| module.debug_locations.get(l.index()))
            .filter(|loc| loc.line > 0 && !is_dbg_call(module, inst))
        {
            let _ = write!(text, " ; line:{} col:{}", loc.line, loc.column);
        }

        if inst.op == Operation::Call {
            self.call_comments(inst, &mut text);
        }

        self.line(&text);
    }

    fn call_comments(&self, inst: &Instruction, text: &mut String) {
        let printer = self.printer;
        let module = printer.module;
        let Some(callee) = inst.callee.and_then(|c| module.function(c)) else {
            return;
        };

        let dbg_operands = match callee.name.as_str() {
            "llvm.dbg.value" => Some((2, 3)),
            "llvm.dbg.declare" => Some((1, 2)),
            _ => None,
        };
        if let Some((var, expr)) = dbg_operands {
            let dwarf = |i: usize| match inst.args.get(i) {
                Some(Value::Metadata(id)) => match module.metadata_node(*id).map(|m| &m.content) {
                    Some(MetadataContent::Dwarf(info)) => Some(info),
                    _ => None,
                },
                _ => None,
            };
            let name = dwarf(var).and_then(|v| v.variable_name()).unwrap_or("???");
            let _ = write!(text, " ; var:{}", quoted(name.as_bytes()));
            if let Some(expr) = dwarf(expr) {
                let _ = write!(text, " {}", debuginfo::render(&printer, expr));
            }
        }

        if callee.name.starts_with("dx.op.") {
            let opcode = inst.args.first().and_then(|a| module.constant_int(*a));
            if let Some(signature) = opcode.and_then(dx_op::signature) {
                let _ = write!(text, "  ; {signature}");
            }
        }
    }

    fn attribute_groups(&mut self) {
        let module = self.printer.module;
        let order = module.attr_groups_in_order();
        for (n, id) in order.iter().enumerate() {
            let text = module
                .attribute_groups
                .get(id.index())
                .map(attribute_text)
                .unwrap_or_else(|| {
                    tracing::error!(group = id.0, "attribute group outside the module arena");
                    "???".to_owned()
                });
            self.line(&format!("attributes #{n} = {{ {text} }}"));
        }
        if !order.is_empty() {
            self.blank();
        }
    }

    fn named_metadata(&mut self) {
        let module = self.printer.module;
        for named in &module.named_metadata {
            let items: Vec<String> = named
                .children
                .iter()
                .map(|c| self.printer.optional_ref(*c))
                .collect();
            self.line(&format!(
                "!{} = !{{{}}}",
                escape_name(&named.name),
                items.join(", ")
            ));
        }
        if !module.named_metadata.is_empty() {
            self.blank();
        }
    }

    fn numbered_metadata(&mut self) {
        let module = self.printer.module;
        for slot in 0..module.slot_count() {
            let body = match module.slot_owner(slot) {
                Some(SlotOwner::Metadata(id)) => self.printer.metadata_body(id),
                Some(SlotOwner::DebugLoc(id)) => match module.debug_locations.get(id.index()) {
                    Some(loc) => self.printer.debug_location(loc),
                    None => "???".to_owned(),
                },
                None => {
                    tracing::error!(slot, "no node owns metadata slot");
                    "???".to_owned()
                }
            };
            self.line(&format!("!{slot} = {body}"));
        }
    }
}

/// Calls into `llvm.dbg.*` intrinsics.
fn is_dbg_call(module: &Module, inst: &Instruction) -> bool {
    inst.op == Operation::Call
        && inst
            .callee
            .and_then(|c| module.function(c))
            .is_some_and(|f| f.name.starts_with("llvm.dbg."))
}
