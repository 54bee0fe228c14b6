use std::io;
use std::sync::{Arc, Mutex};

use aero_dxbc::ShaderKind;
use aero_dxil::ir::{
    AttributeGroup, Attributes, BlockId, ConstantValue, InstId, Instruction, InstructionFlags,
    Module, Operation, Value,
};
use aero_dxil::test_utils::{sample_compute_module, ModuleBuilder};
use aero_dxil::{render, Dialect, Program};
use pretty_assertions::assert_eq;

/// `0.1 + 1.0` written to output 0.x.
fn store_output_module() -> Module {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let void = b.void();
    let i32_ty = b.int(32);
    let i8_ty = b.int(8);
    let f32_ty = b.float(32);

    let nounwind = b.attribute_group(AttributeGroup {
        params: Attributes::NO_UNWIND,
        ..AttributeGroup::default()
    });
    let store = b.declare(
        "dx.op.storeOutput.f32",
        void,
        vec![i32_ty, i32_ty, i32_ty, i8_ty, f32_ty],
    );
    b.function_mut(store).attrs = Some(nounwind);

    let tenth = b.f32(0.1);
    let one = b.f32(1.0);
    let mut add = b.binop(Operation::FAdd, f32_ty, tenth, one);
    add.flags = InstructionFlags::FAST_MATH;
    let opcode = b.i32(5);
    let zero = b.i32(0);
    let col = b.int_const(8, 0);
    let call = b.call(
        store,
        vec![opcode, zero, zero, col, Value::Instruction(InstId(0))],
    );
    let ret = b.ret_void();
    b.define("main", void, Vec::new(), vec![add, call, ret]);

    let version = b.md_ints(&[1, 0]);
    b.named("dx.version", vec![version]);
    b.finish()
}

#[test]
fn toolchain_exact_layout() {
    let mut module = store_output_module();
    module.settle();
    let text = render(&module, Dialect::ToolchainExact).text;

    let expected = [
        "; Pixel Shader, compiled under SM6.0",
        "",
        "target datalayout = \"e-m:e-p:32:32-i1:32-i8:32-i16:32-i32:32-i64:64-f16:32-f32:32-f64:64-n8:16:32:64\"",
        "target triple = \"dxil-ms-dx\"",
        "",
        "; Function Attrs: nounwind",
        "declare void @dx.op.storeOutput.f32(i32, i32, i32, i8, float) #0",
        "",
        "define void @main() {",
        "  %1 = fadd fast float 0x3FB99999A0000000, 1.000000e+00",
        "  call void @dx.op.storeOutput.f32(i32 5, i32 0, i32 0, i8 0, float %1)  ; StoreOutput(outputSigId,rowIndex,colIndex,value)",
        "  ret void",
        "}",
        "",
        "attributes #0 = { nounwind }",
        "",
        "!dx.version = !{!0}",
        "",
        "!0 = !{i32 1, i32 0}",
        "",
    ]
    .join("\n");
    assert_eq!(text, expected);
}

#[test]
fn readable_layout() {
    let mut program = Program::new(store_output_module());
    let text = program.disassembly(Dialect::Readable).to_owned();

    let expected = [
        "; Pixel Shader, compiled under SM6.0",
        "",
        "declare void @dx.op.storeOutput.f32(int, int, int, byte, float)",
        "",
        "define void @main() {",
        "  _1 = fadd fast float 0.1, 1.0",
        "  Output[0].x = _1  ; StoreOutput(outputSigId,rowIndex,colIndex,value)",
        "  ret void",
        "}",
        "",
        "",
    ]
    .join("\n");
    assert_eq!(text, expected);
}

#[test]
fn rendering_is_deterministic_and_memoized_per_dialect() {
    let mut program = Program::new(sample_compute_module());
    let exact = program.disassembly(Dialect::ToolchainExact).to_owned();
    let readable = program.disassembly(Dialect::Readable).to_owned();
    assert_ne!(exact, readable);
    assert_eq!(program.disassembly(Dialect::ToolchainExact), exact);

    let mut module = sample_compute_module();
    module.settle();
    assert_eq!(render(&module, Dialect::ToolchainExact).text, exact);
    assert_eq!(render(&module, Dialect::ToolchainExact).text, exact);
}

#[test]
fn compute_sample_declares_types_globals_and_metadata() {
    let mut program = Program::new(sample_compute_module());
    let text = program.disassembly(Dialect::ToolchainExact);
    let lines: Vec<&str> = text.lines().collect();

    assert!(lines.contains(&"%struct.Particle = type { <4 x float> }"));
    assert!(lines.contains(&"%Params = type { <4 x float>, i32 }"));
    assert!(lines.contains(&"@particles = external global %struct.Particle, align 4"));
    assert!(lines.contains(&"  %1 = call i32 @dx.op.threadId.i32(i32 93, i32 0)  ; ThreadId(component)"));
    assert!(lines.contains(&"!dx.resources = !{!0}"));
    assert!(lines.contains(&"!0 = !{null, !1, !4, null}"));
    assert!(lines.contains(&"!3 = !{i32 1, i32 16}"));
    assert!(lines.contains(&"!12 = !{i32 8, i32 4, i32 1}"));
    assert_eq!(lines.last(), Some(&"!13 = !{!\"cs\", i32 6, i32 0}"));

    let readable = program.disassembly(Dialect::Readable);
    assert!(readable.contains("  _1 = SV_DispatchThreadID.x  ; ThreadId(component)\n"));
    assert!(readable.contains("\nstruct.Particle = type { float4 }\n"));
}

/// `switch` on the argument with two targets that both return.
fn branchy_module() -> Module {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let i32_ty = b.int(32);
    let one = b.i32(1);
    let two = b.i32(2);
    let switch = Instruction {
        args: vec![
            Value::Argument(0),
            Value::Block(BlockId(1)),
            one,
            Value::Block(BlockId(2)),
        ],
        ..Instruction::new(Operation::Switch)
    };
    let ret_one = Instruction {
        args: vec![one],
        ..Instruction::new(Operation::Ret)
    };
    let ret_two = Instruction {
        args: vec![two],
        ..Instruction::new(Operation::Ret)
    };
    b.define("pick", i32_ty, vec![i32_ty], vec![switch, ret_one, ret_two]);
    b.finish()
}

#[test]
fn block_labels_and_predecessors() {
    let mut module = branchy_module();
    module.settle();

    let exact = render(&module, Dialect::ToolchainExact).text;
    let expected_body = [
        "define i32 @pick(i32) {".to_owned(),
        "  switch i32 %0, label %2 [".to_owned(),
        "    i32 1, label %3".to_owned(),
        "  ]".to_owned(),
        String::new(),
        format!("{:<50}; preds = ...", "; <label>:2"),
        "  ret i32 1".to_owned(),
        String::new(),
        format!("{:<50}; preds = ...", "; <label>:3"),
        "  ret i32 2".to_owned(),
        "}".to_owned(),
    ]
    .join("\n");
    assert!(exact.contains(&expected_body), "{exact}");

    let readable = render(&module, Dialect::Readable).text;
    assert!(readable.contains("define int @pick(int _0) {\n"));
    assert!(readable.contains(&format!("{:<50}; preds = _1\n", "; <label>:2")));
}

#[test]
fn instruction_lines_follow_multi_line_instructions() {
    let mut module = branchy_module();
    module.settle();
    let rendered = render(&module, Dialect::ToolchainExact);
    let lines: Vec<&str> = rendered.text.lines().collect();

    assert_eq!(rendered.instruction_lines.len(), 1);
    let at = |line: u32| lines[line as usize - 1];
    let numbers = &rendered.instruction_lines[0];
    assert!(at(numbers[0]).starts_with("  switch"));
    assert_eq!(at(numbers[1]), "  ret i32 1");
    assert_eq!(at(numbers[2]), "  ret i32 2");
    assert_eq!(numbers[1], numbers[0] + 5);
}

#[test]
fn unknown_opcode_renders_a_marker_and_continues() {
    let mut b = ModuleBuilder::new(ShaderKind::Vertex, 6, 0);
    let void = b.void();
    let unknown = Instruction::new(Operation::Unknown(999));
    let ret = b.ret_void();
    b.define("main", void, Vec::new(), vec![unknown, ret]);
    let mut program = Program::new(b.finish());

    let text = program.disassembly(Dialect::ToolchainExact);
    assert!(text.contains("\n  ???\n  ret void\n}\n"), "{text}");
}

#[test]
fn constants_collapse_and_strings_print_as_c_strings() {
    let mut b = ModuleBuilder::new(ShaderKind::Library, 6, 3);
    let i8_ty = b.int(8);
    let i32_ty = b.int(32);
    let f32_ty = b.float(32);
    let bytes = b.array(i8_ty, 3);
    let pair = b.ty(aero_dxil::ir::Type::Struct {
        name: None,
        members: vec![i32_ty, f32_ty],
        packed: false,
    });
    let float2 = b.vector(f32_ty, 2);

    let msg = b.constant(bytes, ConstantValue::Data(vec![u64::from(b'h'), u64::from(b'i'), 0]));
    let zero_i = b.constant(i32_ty, ConstantValue::Null);
    let zero_f = b.constant(f32_ty, ConstantValue::Null);
    let zeros = b.constant(pair, ConstantValue::Aggregate(vec![zero_i, zero_f]));
    let undef = b.undef(f32_ty);
    let undefs = b.constant(float2, ConstantValue::Aggregate(vec![undef, undef]));
    let half = b.f32(0.5);
    let mixed = b.constant(float2, ConstantValue::Aggregate(vec![half, undef]));

    let mut globals = Vec::new();
    for (name, ty, init) in [
        ("msg", bytes, msg),
        ("zeros", pair, zeros),
        ("undefs", float2, undefs),
        ("mixed", float2, mixed),
    ] {
        b.global(name, ty);
        globals.push(init);
    }
    let mut module = b.finish();
    for (global, init) in module.globals.iter_mut().zip(globals) {
        let Value::Constant(id) = init else { unreachable!() };
        global.external = false;
        global.is_const = true;
        global.align = None;
        global.initializer = Some(id);
    }
    module.globals[0].section = Some("strings".into());

    let text = render(&module, Dialect::ToolchainExact).text;
    assert!(text.contains("@msg = constant [3 x i8] c\"hi\\00\", section \"strings\"\n"), "{text}");
    assert!(text.contains("@zeros = constant { i32, float } zeroinitializer\n"));
    assert!(text.contains("@undefs = constant <2 x float> undef\n"));
    assert!(text.contains("@mixed = constant <2 x float> <float 5.000000e-01, float undef>\n"));
}

#[test]
fn debug_location_prints_before_attachments_with_lower_slot() {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let void = b.void();
    let md_ty = b.metadata_type();
    let operand = b.md_node(vec![]);
    let tbaa = b.md_node(vec![]);
    let scope = b.md_node(vec![]);
    let loc = b.debug_location(4, 2, Some(scope));

    let sink = b.declare("sink", void, vec![md_ty]);
    let mut call = b.call(sink, vec![Value::Metadata(operand)]);
    call.attached.push((1, tbaa));
    call.debug_loc = Some(loc);
    let ret = b.ret_void();
    b.define("main", void, Vec::new(), vec![call, ret]);
    let mut module = b.finish();
    module.settle();

    let text = render(&module, Dialect::ToolchainExact).text;
    assert!(
        text.contains("  call void @sink(metadata !0), !dbg !1, !tbaa !3\n"),
        "{text}"
    );
    assert!(text.ends_with(
        "!0 = !{}\n!1 = !DILocation(line: 4, column: 2, scope: !2)\n!2 = !{}\n!3 = !{}\n"
    ));
}

#[test]
fn readable_line_comment_skips_line_zero_and_dbg_intrinsics() {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let void = b.void();
    let sink = b.declare("sink", void, Vec::new());
    let dbg_value = b.declare("llvm.dbg.value", void, Vec::new());
    let nowhere = b.debug_location(0, 0, None);
    let here = b.debug_location(9, 3, None);

    let mut unplaced = b.call(sink, Vec::new());
    unplaced.debug_loc = Some(nowhere);
    let mut dbg = b.call(dbg_value, Vec::new());
    dbg.debug_loc = Some(here);
    let mut placed = b.call(sink, Vec::new());
    placed.debug_loc = Some(here);
    let ret = b.ret_void();
    b.define("main", void, Vec::new(), vec![unplaced, dbg, placed, ret]);
    let mut module = b.finish();
    module.settle();

    let text = render(&module, Dialect::Readable).text;
    let lines: Vec<&str> = text.lines().filter(|l| l.contains("call void")).collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert_eq!(lines[0], "  call void @sink()");
    assert!(lines[1].starts_with("  call void @llvm.dbg.value()"), "{text}");
    assert!(!lines[1].contains("line:"), "{text}");
    assert_eq!(lines[2], "  call void @sink() ; line:9 col:3");
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn degraded_paths_are_logged() {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let void = b.void();
    let dangling = Instruction {
        args: vec![Value::Instruction(InstId(42))],
        ..Instruction::new(Operation::Ret)
    };
    b.define("main", void, Vec::new(), vec![Instruction::new(Operation::Unknown(7)), dangling]);
    let mut module = b.finish();
    module.settle();

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::ERROR)
        .finish();
    let text = tracing::subscriber::with_default(subscriber, || {
        render(&module, Dialect::ToolchainExact).text
    });

    assert!(text.contains("  ???\n  ret ???\n"), "{text}");
    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("unknown instruction opcode"), "{logs}");
    assert!(logs.contains("dangling reference while rendering"), "{logs}");
}
