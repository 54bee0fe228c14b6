use aero_dxbc::ShaderKind;
use aero_dxil::ir::{
    AttributeGroup, Attributes, BlockId, InstId, Instruction, Metadata, MetadataId, Module,
    NamedMetadata, Operation, Value,
};
use aero_dxil::test_utils::ModuleBuilder;
use aero_dxil::SlotOwner;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn owners(module: &Module) -> Vec<SlotOwner> {
    (0..module.slot_count())
        .map(|slot| module.slot_owner(slot).unwrap())
        .collect()
}

#[test]
fn named_roots_come_before_instruction_references() {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let void = b.void();
    let md_ty = b.metadata_type();

    let leaf = b.md_node(vec![]);
    let first = b.md_list(&[leaf]);
    let second = b.md_node(vec![None]);
    b.named("roots", vec![first, second]);

    let operand = b.md_node(vec![]);
    let attached = b.md_node(vec![]);
    let scope = b.md_node(vec![]);
    let loc = b.debug_location(3, 7, Some(scope));

    let sink = b.declare("sink", void, vec![md_ty]);
    let mut call = b.call(sink, vec![Value::Metadata(operand)]);
    call.attached.push((1, attached));
    call.debug_loc = Some(loc);
    let ret = b.ret_void();
    b.define("main", void, Vec::new(), vec![call, ret]);

    let mut module = b.finish();
    module.settle();

    assert_eq!(
        owners(&module),
        vec![
            SlotOwner::Metadata(first),
            SlotOwner::Metadata(leaf),
            SlotOwner::Metadata(second),
            SlotOwner::Metadata(operand),
            SlotOwner::DebugLoc(loc),
            SlotOwner::Metadata(scope),
            SlotOwner::Metadata(attached),
        ]
    );
}

#[test]
fn settling_twice_keeps_assignments() {
    let mut module = aero_dxil::test_utils::sample_compute_module();
    module.settle();
    let before = owners(&module);
    module.settle();
    assert_eq!(owners(&module), before);

    module.clear_slots();
    assert!(!module.is_settled());
    assert_eq!(module.slot_count(), 0);
    module.settle();
    assert_eq!(owners(&module), before);
}

#[test]
fn value_and_string_nodes_take_no_slot() {
    let mut b = ModuleBuilder::new(ShaderKind::Vertex, 6, 0);
    let name = b.md_string("name");
    let value = b.md_i32(4);
    let node = b.md_list(&[name, value]);
    b.named("dx.version", vec![node]);
    let mut module = b.finish();
    module.settle();

    assert_eq!(module.slot_count(), 1);
    assert_eq!(module.metadata_slot(node), Some(0));
    assert_eq!(module.metadata_slot(name), None);
    assert_eq!(module.metadata_slot(value), None);
}

#[test]
fn locals_number_arguments_then_blocks_and_results() {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let i32_ty = b.int(32);
    let one = b.i32(1);

    let add = b.binop(Operation::Add, i32_ty, Value::Argument(0), one);
    let br = Instruction {
        args: vec![Value::Block(BlockId(1))],
        ..Instruction::new(Operation::Br)
    };
    let mul = b.binop(
        Operation::Mul,
        i32_ty,
        Value::Instruction(InstId(0)),
        Value::Argument(1),
    );
    let ret = Instruction {
        args: vec![Value::Instruction(InstId(2))],
        ..Instruction::new(Operation::Ret)
    };
    let f = b.define("f", i32_ty, vec![i32_ty, i32_ty], vec![add, br, mul, ret]);
    b.function_mut(f).args[1].name = Some("scale".into());
    let mut module = b.finish();
    module.settle();

    assert_eq!(module.argument_slot(0, 0), Some(0));
    assert_eq!(module.argument_slot(0, 1), None);
    assert_eq!(module.block_slot(0, BlockId(0)), Some(1));
    assert_eq!(module.instruction_slot(0, InstId(0)), Some(2));
    assert_eq!(module.instruction_slot(0, InstId(1)), None);
    assert_eq!(module.block_slot(0, BlockId(1)), Some(3));
    assert_eq!(module.instruction_slot(0, InstId(2)), Some(4));
    assert_eq!(module.function(aero_dxil::ir::FunctionId(0)).unwrap().blocks[1].preds, vec![BlockId(0)]);
}

#[test]
fn attribute_groups_are_numbered_by_first_use() {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let void = b.void();
    let unused = b.attribute_group(AttributeGroup {
        params: Attributes::NO_INLINE,
        ..AttributeGroup::default()
    });
    let readnone = b.attribute_group(AttributeGroup {
        params: Attributes::NO_UNWIND | Attributes::READ_NONE,
        ..AttributeGroup::default()
    });
    let nounwind = b.attribute_group(AttributeGroup {
        params: Attributes::NO_UNWIND,
        ..AttributeGroup::default()
    });
    let a = b.declare("a", void, Vec::new());
    let c = b.declare("c", void, Vec::new());
    let d = b.declare("d", void, Vec::new());
    b.function_mut(a).attrs = Some(nounwind);
    b.function_mut(c).attrs = Some(readnone);
    b.function_mut(d).attrs = Some(nounwind);
    let mut module = b.finish();
    module.settle();

    assert_eq!(module.attr_groups_in_order(), &[nounwind, readnone]);
    assert_eq!(module.attr_slot(nounwind), Some(0));
    assert_eq!(module.attr_slot(readnone), Some(1));
    assert_eq!(module.attr_slot(unused), None);
}

fn graph_module(edges: &[Vec<usize>], roots: &[usize]) -> Module {
    let mut module = Module::new(ShaderKind::Library, 6, 3);
    module.metadata = edges
        .iter()
        .map(|children| {
            Metadata::node(
                children
                    .iter()
                    .map(|c| Some(MetadataId(*c as u32)))
                    .collect(),
            )
        })
        .collect();
    module.named_metadata.push(NamedMetadata {
        name: "roots".into(),
        children: roots.iter().map(|r| Some(MetadataId(*r as u32))).collect(),
    });
    module
}

fn graph() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    (1usize..24).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(0..n, 0..4), n),
            prop::collection::vec(0..n, 1..4),
        )
    })
}

proptest! {
    #[test]
    fn slots_are_dense_and_deterministic((edges, roots) in graph()) {
        let mut module = graph_module(&edges, &roots);
        module.settle();

        let count = module.slot_count();
        let mut seen = vec![false; count as usize];
        for id in 0..edges.len() {
            if let Some(slot) = module.metadata_slot(MetadataId(id as u32)) {
                prop_assert!(slot < count);
                prop_assert!(!seen[slot as usize]);
                seen[slot as usize] = true;
                prop_assert_eq!(module.slot_owner(slot), Some(SlotOwner::Metadata(MetadataId(id as u32))));
            }
        }
        prop_assert!(seen.iter().all(|s| *s));
        prop_assert_eq!(module.metadata_slot(MetadataId(roots[0] as u32)), Some(0));

        let mut again = graph_module(&edges, &roots);
        again.settle();
        prop_assert_eq!(owners(&again), owners(&module));
    }
}
