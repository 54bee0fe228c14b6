//! Numbering of metadata, debug locations and unnamed locals.
//!
//! Metadata nodes and debug locations share one slot space. Slots are handed
//! out in a single deterministic walk: named-metadata roots first, then every
//! instruction's metadata operands, debug location and attachments in
//! function order. Each node is numbered before its children.

use hashbrown::HashMap;

use crate::ir::{
    AttrGroupId, BlockId, DebugLocId, Function, InstId, MetadataContent, MetadataId, Module,
    Value,
};

/// The node that owns a slot number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOwner {
    Metadata(MetadataId),
    DebugLoc(DebugLocId),
}

#[derive(Debug, Clone, Default)]
struct LocalSlots {
    args: Vec<Option<u32>>,
    blocks: Vec<Option<u32>>,
    instructions: Vec<Option<u32>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SlotTable {
    metadata: HashMap<MetadataId, u32>,
    debug_locs: HashMap<DebugLocId, u32>,
    owners: Vec<SlotOwner>,
    locals: Vec<LocalSlots>,
    attr_groups: Vec<AttrGroupId>,
}

impl SlotTable {
    fn build(module: &Module) -> Self {
        let mut table = SlotTable::default();

        for named in &module.named_metadata {
            for child in named.children.iter().flatten() {
                table.visit_metadata(module, *child);
            }
        }

        for func in &module.functions {
            for inst in &func.instructions {
                for arg in &inst.args {
                    if let Value::Metadata(id) = *arg {
                        table.visit_metadata(module, id);
                    }
                }
                if let Some(loc) = inst.debug_loc {
                    table.visit_debug_loc(module, loc);
                }
                for &(_, id) in &inst.attached {
                    table.visit_metadata(module, id);
                }
            }
            if let Some(group) = func.attrs {
                if !table.attr_groups.contains(&group) {
                    table.attr_groups.push(group);
                }
            }
            table.locals.push(number_locals(module, func));
        }

        table
    }

    fn next_slot(&self) -> u32 {
        self.owners.len() as u32
    }

    fn visit_metadata(&mut self, module: &Module, root: MetadataId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.metadata.contains_key(&id) {
                continue;
            }
            let Some(node) = module.metadata_node(id) else {
                tracing::error!(id = id.0, "metadata reference outside the module arena");
                continue;
            };
            if is_inlinable(&node.content) {
                continue;
            }
            let slot = self.next_slot();
            self.metadata.insert(id, slot);
            self.owners.push(SlotOwner::Metadata(id));
            stack.extend(node.children().into_iter().rev());
        }
    }

    fn visit_debug_loc(&mut self, module: &Module, id: DebugLocId) {
        if self.debug_locs.contains_key(&id) {
            return;
        }
        let Some(loc) = module.debug_locations.get(id.index()) else {
            tracing::error!(id = id.0, "debug location outside the module arena");
            return;
        };
        let slot = self.next_slot();
        self.debug_locs.insert(id, slot);
        self.owners.push(SlotOwner::DebugLoc(id));
        for node in [loc.scope, loc.inlined_at].into_iter().flatten() {
            self.visit_metadata(module, node);
        }
    }
}

/// Strings and value wrappers print inline and never take a slot.
fn is_inlinable(content: &MetadataContent) -> bool {
    matches!(
        content,
        MetadataContent::String(_) | MetadataContent::Value(_)
    )
}

/// `%N` numbering: arguments, then each block label followed by the results
/// defined in that block.
fn number_locals(module: &Module, func: &Function) -> LocalSlots {
    let mut next = 0u32;
    let mut take = |named: bool| {
        if named {
            None
        } else {
            next += 1;
            Some(next - 1)
        }
    };

    let args = func.args.iter().map(|a| take(a.name.is_some())).collect();

    let mut blocks = vec![None; func.blocks.len()];
    let mut instructions = vec![None; func.instructions.len()];
    if !func.external {
        for (b, span) in func.block_spans().into_iter().enumerate() {
            let named = func.blocks.get(b).and_then(|blk| blk.name.as_ref()).is_some();
            let slot = take(named);
            if let Some(entry) = blocks.get_mut(b) {
                *entry = slot;
            }
            for i in span {
                let inst = &func.instructions[i];
                if module.produces_value(inst) {
                    instructions[i] = take(inst.name.is_some());
                }
            }
        }
    }

    LocalSlots {
        args,
        blocks,
        instructions,
    }
}

impl Module {
    /// Assigns slots. Calling it again on a settled module does nothing.
    pub fn settle(&mut self) {
        if self.slots.is_some() {
            return;
        }
        let table = SlotTable::build(self);
        tracing::debug!(
            slots = table.owners.len(),
            attribute_groups = table.attr_groups.len(),
            "assigned module slots"
        );
        self.slots = Some(table);
    }

    /// Drops assigned slots so the next [`Module::settle`] renumbers.
    pub fn clear_slots(&mut self) {
        self.slots = None;
    }

    pub fn metadata_slot(&self, id: MetadataId) -> Option<u32> {
        self.slots.as_ref()?.metadata.get(&id).copied()
    }

    pub fn debug_loc_slot(&self, id: DebugLocId) -> Option<u32> {
        self.slots.as_ref()?.debug_locs.get(&id).copied()
    }

    /// Number of slots handed out; valid slots are `0..slot_count()`.
    pub fn slot_count(&self) -> u32 {
        self.slots.as_ref().map_or(0, |t| t.owners.len() as u32)
    }

    pub fn slot_owner(&self, slot: u32) -> Option<SlotOwner> {
        self.slots.as_ref()?.owners.get(slot as usize).copied()
    }

    /// `%N` number of an unnamed argument.
    pub fn argument_slot(&self, func: usize, arg: u32) -> Option<u32> {
        let locals = self.slots.as_ref()?.locals.get(func)?;
        locals.args.get(arg as usize).copied().flatten()
    }

    /// `%N` number of an unnamed block label.
    pub fn block_slot(&self, func: usize, block: BlockId) -> Option<u32> {
        let locals = self.slots.as_ref()?.locals.get(func)?;
        locals.blocks.get(block.index()).copied().flatten()
    }

    /// `%N` number of an unnamed instruction result.
    pub fn instruction_slot(&self, func: usize, inst: InstId) -> Option<u32> {
        let locals = self.slots.as_ref()?.locals.get(func)?;
        locals.instructions.get(inst.index()).copied().flatten()
    }

    /// `#N` index of a function attribute group.
    pub fn attr_slot(&self, group: AttrGroupId) -> Option<u32> {
        let order = &self.slots.as_ref()?.attr_groups;
        order.iter().position(|g| *g == group).map(|i| i as u32)
    }

    /// Attribute groups referenced by functions, in `#N` order.
    pub fn attr_groups_in_order(&self) -> &[AttrGroupId] {
        self.slots.as_ref().map_or(&[][..], |t| t.attr_groups.as_slice())
    }
}
