use aero_dxbc::ShaderKind;
use aero_dxil::ir::{InstId, Module, Operation, Value};
use aero_dxil::test_utils::ModuleBuilder;
use aero_dxil::{Dialect, Program, SlotOwner};
use pretty_assertions::assert_eq;

/// One external declaration, a three instruction body ending in `ret`, and a
/// named root holding two nodes.
fn minimal_module() -> Module {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let void = b.void();
    let f32_ty = b.float(32);

    let version = b.md_ints(&[1, 0]);
    let tool = b.md_string("shader");
    let tool = b.md_list(&[tool]);
    b.named("dx.roots", vec![version, tool]);

    let scope = b.md_node(vec![]);
    let loc = b.debug_location(12, 5, Some(scope));
    let range = b.md_node(vec![]);

    let sink = b.declare("sink", void, vec![f32_ty]);
    let one = b.f32(1.0);
    let two = b.f32(2.0);
    let mut add = b.binop(Operation::FAdd, f32_ty, one, two);
    add.debug_loc = Some(loc);
    let mut call = b.call(sink, vec![Value::Instruction(InstId(0))]);
    call.attached.push((4, range));
    let ret = b.ret_void();
    b.define("main", void, Vec::new(), vec![add, call, ret]);

    b.finish()
}

#[test]
fn named_roots_take_the_first_slots() {
    let mut module = minimal_module();
    module.settle();

    let roots = &module.named_metadata[0].children;
    assert_eq!(module.slot_owner(0), Some(SlotOwner::Metadata(roots[0].unwrap())));
    assert_eq!(module.slot_owner(1), Some(SlotOwner::Metadata(roots[1].unwrap())));
    assert!(matches!(module.slot_owner(2), Some(SlotOwner::DebugLoc(_))));
    assert_eq!(module.slot_count(), 5);
}

#[test]
fn exact_disassembly_prints_slots_in_order_at_the_end() {
    let mut program = Program::new(minimal_module());
    let text = program.disassembly(Dialect::ToolchainExact).to_owned();

    assert!(text.contains("declare void @sink(float)\n"));
    assert!(text.contains("  %1 = fadd float 1.000000e+00, 2.000000e+00, !dbg !2\n"));
    assert!(text.contains("  call void @sink(float %1), !range !4\n"));

    let tail: Vec<&str> = text
        .lines()
        .skip_while(|line| !line.starts_with("!0 = "))
        .collect();
    assert_eq!(
        tail,
        vec![
            "!0 = !{i32 1, i32 0}",
            "!1 = !{!\"shader\"}",
            "!2 = !DILocation(line: 12, column: 5, scope: !3)",
            "!3 = !{}",
            "!4 = !{}",
        ]
    );
}

#[test]
fn readable_disassembly_drops_metadata_sections() {
    let mut program = Program::new(minimal_module());
    let text = program.disassembly(Dialect::Readable).to_owned();

    assert!(text.contains("  _1 = fadd float 1.0, 2.0 ; line:12 col:5\n"));
    assert!(!text.contains("!0 = "));
    assert!(!text.contains("target datalayout"));
}
