//! `!DI*(...)` spelling of DWARF records.

use std::fmt::Write as _;

use crate::ir::{DebugInfo, DiFlags, DiType, MetadataId};

use super::format::{quoted, Printer};

const DW_TAG_BASE_TYPE: u32 = 0x24;
const DW_TAG_TEMPLATE_VALUE_PARAMETER: u32 = 0x30;

const DW_OP_PLUS: u64 = 0x22;
const DW_OP_DEREF: u64 = 0x06;
const DW_OP_BIT_PIECE: u64 = 0x9d;

pub(crate) fn tag_name(tag: u32) -> String {
    let name = match tag {
        0x01 => "array_type",
        0x02 => "class_type",
        0x03 => "entry_point",
        0x04 => "enumeration_type",
        0x05 => "formal_parameter",
        0x08 => "imported_declaration",
        0x0a => "label",
        0x0b => "lexical_block",
        0x0d => "member",
        0x0f => "pointer_type",
        0x10 => "reference_type",
        0x11 => "compile_unit",
        0x12 => "string_type",
        0x13 => "structure_type",
        0x15 => "subroutine_type",
        0x16 => "typedef",
        0x17 => "union_type",
        0x18 => "unspecified_parameters",
        0x19 => "variant",
        0x1a => "common_block",
        0x1b => "common_inclusion",
        0x1c => "inheritance",
        0x1d => "inlined_subroutine",
        0x1e => "module",
        0x1f => "ptr_to_member_type",
        0x20 => "set_type",
        0x21 => "subrange_type",
        0x22 => "with_stmt",
        0x23 => "access_declaration",
        0x24 => "base_type",
        0x25 => "catch_block",
        0x26 => "const_type",
        0x27 => "constant",
        0x28 => "enumerator",
        0x29 => "file_type",
        0x2a => "friend",
        0x2b => "namelist",
        0x2c => "namelist_item",
        0x2d => "packed_type",
        0x2e => "subprogram",
        0x2f => "template_type_parameter",
        0x30 => "template_value_parameter",
        0x31 => "thrown_type",
        0x32 => "try_block",
        0x33 => "variant_part",
        0x34 => "variable",
        0x35 => "volatile_type",
        0x36 => "dwarf_procedure",
        0x37 => "restrict_type",
        0x38 => "interface_type",
        0x39 => "namespace",
        0x3a => "imported_module",
        0x3b => "unspecified_type",
        0x3c => "partial_unit",
        0x3d => "imported_unit",
        0x3f => "condition",
        0x40 => "shared_type",
        0x41 => "type_unit",
        0x42 => "rvalue_reference_type",
        0x43 => "template_alias",
        0x100 => "auto_variable",
        0x101 => "arg_variable",
        0x4081 => "MIPS_loop",
        0x4101 => "format_label",
        0x4102 => "function_template",
        0x4103 => "class_template",
        0x4106 => "GNU_template_template_param",
        0x4107 => "GNU_template_parameter_pack",
        0x4108 => "GNU_formal_parameter_pack",
        0x4200 => "APPLE_property",
        other => return other.to_string(),
    };
    format!("DW_TAG_{name}")
}

fn encoding_name(encoding: u32) -> String {
    let name = match encoding {
        0x01 => "address",
        0x02 => "boolean",
        0x03 => "complex_float",
        0x04 => "float",
        0x05 => "signed",
        0x06 => "signed_char",
        0x07 => "unsigned",
        0x08 => "unsigned_char",
        0x09 => "imaginary_float",
        0x0a => "packed_decimal",
        0x0b => "numeric_string",
        0x0c => "edited",
        0x0d => "signed_fixed",
        0x0e => "unsigned_fixed",
        0x0f => "decimal_float",
        0x10 => "UTF",
        other => return other.to_string(),
    };
    format!("DW_ATE_{name}")
}

fn language_name(language: u32) -> String {
    let name = match language {
        0x01 => "C89",
        0x02 => "C",
        0x03 => "Ada83",
        0x04 => "C_plus_plus",
        0x05 => "Cobol74",
        0x06 => "Cobol85",
        0x07 => "Fortran77",
        0x08 => "Fortran90",
        0x09 => "Pascal83",
        0x0a => "Modula2",
        0x0b => "Java",
        0x0c => "C99",
        0x0d => "Ada95",
        0x0e => "Fortran95",
        0x0f => "PLI",
        0x10 => "ObjC",
        0x11 => "ObjC_plus_plus",
        0x12 => "UPC",
        0x13 => "D",
        0x14 => "Python",
        0x15 => "OpenCL",
        0x16 => "Go",
        0x17 => "Modula3",
        0x18 => "Haskell",
        0x19 => "C_plus_plus_03",
        0x1a => "C_plus_plus_11",
        0x1b => "OCaml",
        0x1c => "Rust",
        0x1d => "C11",
        0x1e => "Swift",
        0x1f => "Julia",
        0x20 => "Dylan",
        0x21 => "C_plus_plus_14",
        0x22 => "Fortran03",
        0x23 => "Fortran08",
        0x8001 => "Mips_Assembler",
        other => return other.to_string(),
    };
    format!("DW_LANG_{name}")
}

fn virtuality_name(virtuality: u32) -> String {
    match virtuality {
        0 => "DW_VIRTUALITY_none".to_owned(),
        1 => "DW_VIRTUALITY_virtual".to_owned(),
        2 => "DW_VIRTUALITY_pure_virtual".to_owned(),
        other => other.to_string(),
    }
}

const FLAG_NAMES: &[(DiFlags, &str)] = &[
    (DiFlags::FWD_DECL, "DIFlagFwdDecl"),
    (DiFlags::APPLE_BLOCK, "DIFlagAppleBlock"),
    (DiFlags::BLOCK_BYREF_STRUCT, "DIFlagBlockByrefStruct"),
    (DiFlags::VIRTUAL, "DIFlagVirtual"),
    (DiFlags::ARTIFICIAL, "DIFlagArtificial"),
    (DiFlags::EXPLICIT, "DIFlagExplicit"),
    (DiFlags::PROTOTYPED, "DIFlagPrototyped"),
    (DiFlags::OBJC_CLASS_COMPLETE, "DIFlagObjcClassComplete"),
    (DiFlags::OBJECT_POINTER, "DIFlagObjectPointer"),
    (DiFlags::VECTOR, "DIFlagVector"),
    (DiFlags::STATIC_MEMBER, "DIFlagStaticMember"),
    (DiFlags::LVALUE_REFERENCE, "DIFlagLValueReference"),
    (DiFlags::RVALUE_REFERENCE, "DIFlagRValueReference"),
];

pub(crate) fn flags_name(flags: DiFlags) -> String {
    let mut parts = Vec::new();
    // The access specifier is a two-bit value, not two flags.
    match (flags & DiFlags::PUBLIC).bits() {
        1 => parts.push("DIFlagPrivate".to_owned()),
        2 => parts.push("DIFlagProtected".to_owned()),
        3 => parts.push("DIFlagPublic".to_owned()),
        _ => {}
    }
    let mut rest = flags - DiFlags::PUBLIC;
    for (flag, name) in FLAG_NAMES {
        if rest.contains(*flag) {
            parts.push((*name).to_owned());
            rest -= *flag;
        }
    }
    if !rest.is_empty() {
        parts.push(rest.bits().to_string());
    }
    parts.join(" | ")
}

fn expression(ops: &[u64]) -> String {
    match ops {
        [] => "!DIExpression()".to_owned(),
        [DW_OP_DEREF] => "!DIExpression(DW_OP_deref)".to_owned(),
        [DW_OP_BIT_PIECE, offset, size] => {
            format!("!DIExpression(DW_OP_bit_piece, {offset}, {size})")
        }
        _ => {
            let mut items = Vec::new();
            let mut rest = ops;
            while let Some((&op, tail)) = rest.split_first() {
                let (name, operands) = match op {
                    DW_OP_DEREF => ("DW_OP_deref".to_owned(), 0),
                    DW_OP_PLUS => ("DW_OP_plus".to_owned(), 1),
                    DW_OP_BIT_PIECE => ("DW_OP_bit_piece".to_owned(), 2),
                    other => (other.to_string(), 0),
                };
                items.push(name);
                let take = operands.min(tail.len());
                items.extend(tail[..take].iter().map(u64::to_string));
                rest = &tail[take..];
            }
            format!("!DIExpression({})", items.join(", "))
        }
    }
}

struct Fields<'p, 'm> {
    printer: &'p Printer<'m>,
    out: String,
}

impl Fields<'_, '_> {
    fn raw(&mut self, key: &str, value: &str) {
        if !self.out.ends_with('(') {
            self.out.push_str(", ");
        }
        let _ = write!(self.out, "{key}: {value}");
    }

    fn string(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.raw(key, &quoted(value.as_bytes()));
        }
    }

    fn node(&mut self, key: &str, id: Option<MetadataId>) {
        if let Some(id) = id {
            let text = self.printer.metadata_ref(None, id);
            self.raw(key, &text);
        }
    }

    fn node_or_null(&mut self, key: &str, id: Option<MetadataId>) {
        let text = self.printer.optional_ref(id);
        self.raw(key, &text);
    }

    fn nonzero(&mut self, key: &str, value: u64) {
        if value != 0 {
            self.raw(key, &value.to_string());
        }
    }

    fn boolean(&mut self, key: &str, value: bool) {
        self.raw(key, if value { "true" } else { "false" });
    }

    fn flags(&mut self, flags: DiFlags) {
        if !flags.is_empty() {
            self.raw("flags", &flags_name(flags));
        }
    }

    fn finish(mut self) -> String {
        self.out.push(')');
        self.out
    }
}

fn type_fields(f: &mut Fields<'_, '_>, t: &DiType, base_or_null: bool) {
    f.raw("tag", &tag_name(t.tag));
    f.string("name", t.name.as_deref());
    f.node("scope", t.scope);
    f.node("file", t.file);
    f.nonzero("line", t.line);
    if base_or_null {
        f.node_or_null("baseType", t.base_type);
    } else {
        f.node("baseType", t.base_type);
    }
    f.nonzero("size", t.size_in_bits);
    f.nonzero("align", t.align_in_bits);
    f.nonzero("offset", t.offset_in_bits);
    f.flags(t.flags);
}

fn fields<'p, 'm>(printer: &'p Printer<'m>, name: &str) -> Fields<'p, 'm> {
    Fields {
        printer,
        out: format!("!{name}("),
    }
}

pub(crate) fn render(printer: &Printer<'_>, info: &DebugInfo) -> String {
    let open = |name: &str| fields(printer, name);
    match info {
        DebugInfo::File(file) => {
            let mut f = open("DIFile");
            f.raw("filename", &quoted(file.filename.as_bytes()));
            f.raw("directory", &quoted(file.directory.as_bytes()));
            f.finish()
        }
        DebugInfo::CompileUnit(cu) => {
            let mut f = open("DICompileUnit");
            f.raw("language", &language_name(cu.language));
            f.node_or_null("file", cu.file);
            f.string("producer", cu.producer.as_deref());
            f.boolean("isOptimized", cu.is_optimized);
            f.string("flags", cu.flags.as_deref());
            f.raw("runtimeVersion", &cu.runtime_version.to_string());
            f.string("splitDebugFilename", cu.split_debug_filename.as_deref());
            f.raw("emissionKind", &cu.emission_kind.to_string());
            f.node("enums", cu.enums);
            f.node("retainedTypes", cu.retained_types);
            f.node("subprograms", cu.subprograms);
            f.node("globals", cu.globals);
            f.node("imports", cu.imports);
            f.finish()
        }
        DebugInfo::BasicType(bt) => {
            let mut f = open("DIBasicType");
            if bt.tag != DW_TAG_BASE_TYPE {
                f.raw("tag", &tag_name(bt.tag));
            }
            f.raw("name", &quoted(bt.name.as_deref().unwrap_or("").as_bytes()));
            f.raw("size", &bt.size_in_bits.to_string());
            f.raw("align", &bt.align_in_bits.to_string());
            f.raw("encoding", &encoding_name(bt.encoding));
            f.finish()
        }
        DebugInfo::DerivedType(t) => {
            let mut f = open("DIDerivedType");
            type_fields(&mut f, t, true);
            f.node("extraData", t.extra);
            f.finish()
        }
        DebugInfo::CompositeType(t) => {
            let mut f = open("DICompositeType");
            type_fields(&mut f, t, false);
            f.node("elements", t.extra);
            f.node("templateParams", t.template_params);
            f.finish()
        }
        DebugInfo::TemplateTypeParameter { name, ty } => {
            let mut f = open("DITemplateTypeParameter");
            f.raw("name", &quoted(name.as_deref().unwrap_or("").as_bytes()));
            f.node_or_null("type", *ty);
            f.finish()
        }
        DebugInfo::TemplateValueParameter {
            tag,
            name,
            ty,
            value,
        } => {
            let mut f = open("DITemplateValueParameter");
            if *tag != DW_TAG_TEMPLATE_VALUE_PARAMETER {
                f.raw("tag", &tag_name(*tag));
            }
            f.raw("name", &quoted(name.as_deref().unwrap_or("").as_bytes()));
            f.node_or_null("type", *ty);
            f.node_or_null("value", *value);
            f.finish()
        }
        DebugInfo::Subprogram(sp) => {
            let mut f = open("DISubprogram");
            f.raw("name", &quoted(sp.name.as_deref().unwrap_or("").as_bytes()));
            f.string("linkageName", sp.linkage_name.as_deref());
            f.node("scope", sp.scope);
            f.node_or_null("file", sp.file);
            f.nonzero("line", sp.line);
            f.node("type", sp.ty);
            f.boolean("isLocal", sp.is_local);
            f.boolean("isDefinition", sp.is_definition);
            f.nonzero("scopeLine", sp.scope_line);
            f.node("containingType", sp.containing_type);
            if sp.virtuality != 0 {
                f.raw("virtuality", &virtuality_name(sp.virtuality));
                f.nonzero("virtualIndex", sp.virtual_index);
            }
            f.flags(sp.flags);
            f.boolean("isOptimized", sp.is_optimized);
            f.node("function", sp.function);
            f.node("templateParams", sp.template_params);
            f.node("declaration", sp.declaration);
            f.node("variables", sp.variables);
            f.finish()
        }
        DebugInfo::SubroutineType { types } => {
            let mut f = open("DISubroutineType");
            f.node_or_null("types", *types);
            f.finish()
        }
        DebugInfo::GlobalVariable(gv) => {
            let mut f = open("DIGlobalVariable");
            f.raw("name", &quoted(gv.name.as_deref().unwrap_or("").as_bytes()));
            f.string("linkageName", gv.linkage_name.as_deref());
            f.node("scope", gv.scope);
            f.node_or_null("file", gv.file);
            f.nonzero("line", gv.line);
            f.node("type", gv.ty);
            f.boolean("isLocal", gv.is_local);
            f.boolean("isDefinition", gv.is_definition);
            f.node("variable", gv.variable);
            f.node("declaration", gv.declaration);
            f.finish()
        }
        DebugInfo::LocalVariable(lv) => {
            let mut f = open("DILocalVariable");
            f.raw("tag", &tag_name(lv.tag));
            f.raw("name", &quoted(lv.name.as_deref().unwrap_or("").as_bytes()));
            f.nonzero("arg", lv.arg);
            f.node("scope", lv.scope);
            f.node_or_null("file", lv.file);
            f.nonzero("line", lv.line);
            f.node("type", lv.ty);
            f.flags(lv.flags);
            f.finish()
        }
        DebugInfo::Expression(ops) => expression(ops),
        DebugInfo::LexicalBlock(lb) => {
            let mut f = open("DILexicalBlock");
            f.node_or_null("scope", lb.scope);
            f.node("file", lb.file);
            f.nonzero("line", lb.line);
            f.nonzero("column", lb.column);
            f.finish()
        }
        DebugInfo::Subrange { count, lower_bound } => {
            let mut f = open("DISubrange");
            f.raw("count", &count.to_string());
            if *lower_bound != 0 {
                f.raw("lowerBound", &lower_bound.to_string());
            }
            f.finish()
        }
        DebugInfo::Namespace(ns) => {
            let mut f = open("DINamespace");
            f.string("name", ns.name.as_deref());
            f.node_or_null("scope", ns.scope);
            f.node("file", ns.file);
            f.nonzero("line", ns.line);
            f.finish()
        }
        DebugInfo::ImportedEntity(ie) => {
            let mut f = open("DIImportedEntity");
            f.raw("tag", &tag_name(ie.tag));
            f.node_or_null("scope", ie.scope);
            f.node("entity", ie.entity);
            f.nonzero("line", ie.line);
            f.string("name", ie.name.as_deref());
            f.finish()
        }
        DebugInfo::Location(loc) => {
            let mut f = open("DILocation");
            f.raw("line", &loc.line.to_string());
            f.raw("column", &loc.column.to_string());
            f.node_or_null("scope", loc.scope);
            f.node("inlinedAt", loc.inlined_at);
            f.finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disasm::Dialect;
    use crate::ir::{DiBasicType, DiFile, Module};
    use aero_dxbc::ShaderKind;

    fn render_one(info: DebugInfo) -> String {
        let module = Module::new(ShaderKind::Pixel, 6, 0);
        let printer = Printer::new(&module, Dialect::ToolchainExact);
        render(&printer, &info)
    }

    #[test]
    fn file_and_basic_type() {
        assert_eq!(
            render_one(DebugInfo::File(DiFile {
                filename: "shader.hlsl".into(),
                directory: "C:\\src".into(),
            })),
            "!DIFile(filename: \"shader.hlsl\", directory: \"C:\\5Csrc\")"
        );
        assert_eq!(
            render_one(DebugInfo::BasicType(DiBasicType {
                tag: DW_TAG_BASE_TYPE,
                name: Some("float".into()),
                size_in_bits: 32,
                align_in_bits: 32,
                encoding: 4,
            })),
            "!DIBasicType(name: \"float\", size: 32, align: 32, encoding: DW_ATE_float)"
        );
    }

    #[test]
    fn expressions() {
        assert_eq!(expression(&[]), "!DIExpression()");
        assert_eq!(expression(&[DW_OP_DEREF]), "!DIExpression(DW_OP_deref)");
        assert_eq!(
            expression(&[DW_OP_BIT_PIECE, 32, 32]),
            "!DIExpression(DW_OP_bit_piece, 32, 32)"
        );
        assert_eq!(
            expression(&[DW_OP_PLUS, 4, DW_OP_DEREF]),
            "!DIExpression(DW_OP_plus, 4, DW_OP_deref)"
        );
    }

    #[test]
    fn flags_split_access_from_bits() {
        assert_eq!(
            flags_name(DiFlags::PUBLIC | DiFlags::PROTOTYPED),
            "DIFlagPublic | DIFlagPrototyped"
        );
        assert_eq!(flags_name(DiFlags::PRIVATE), "DIFlagPrivate");
        assert_eq!(
            flags_name(DiFlags::from_bits_retain(1 << 20)),
            (1u32 << 20).to_string()
        );
    }

    #[test]
    fn subrange_omits_zero_lower_bound() {
        assert_eq!(
            render_one(DebugInfo::Subrange {
                count: 4,
                lower_bound: 0
            }),
            "!DISubrange(count: 4)"
        );
        assert_eq!(
            render_one(DebugInfo::Subrange {
                count: 4,
                lower_bound: -1
            }),
            "!DISubrange(count: 4, lowerBound: -1)"
        );
    }
}
