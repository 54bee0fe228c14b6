//! Entry point signatures and the built-in compute inputs.

use aero_dxbc::{ComponentType, InterpolationMode, SemanticKind};

use crate::ir::{MetadataId, Module};

use super::meta::MetaReader;

const ELEMENT_SEMANTIC: usize = 1;
const ELEMENT_COMPONENT_TYPE: usize = 2;
const ELEMENT_SEMANTIC_KIND: usize = 3;
const ELEMENT_SEMANTIC_INDICES: usize = 4;
const ELEMENT_INTERPOLATION: usize = 5;
const ELEMENT_ROWS: usize = 6;
const ELEMENT_COLS: usize = 7;
const ELEMENT_START_ROW: usize = 8;
const ELEMENT_START_COL: usize = 9;
const ELEMENT_TAGS: usize = 10;

const TAG_OUTPUT_STREAM: u64 = 0;
const TAG_GLOBAL_SYMBOL: u64 = 1;
const TAG_DYNAMIC_INDEX_MASK: u64 = 2;
const TAG_USAGE_MASK: u64 = 3;

/// One signature element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureElement {
    pub semantic_name: String,
    pub semantic_indices: Vec<u32>,
    pub system_value: SemanticKind,
    pub component_type: ComponentType,
    pub interpolation: InterpolationMode,
    pub rows: u32,
    pub cols: u32,
    /// `-1` when the element is not packed into a register.
    pub start_row: i32,
    pub start_col: i32,
    /// Components the element occupies within its register.
    pub register_mask: u8,
    /// Components the shader actually reads or writes.
    pub used_mask: u8,
    pub stream: u32,
}

impl SignatureElement {
    /// A system-value input the compute stage reads through a `dx.op` call.
    fn builtin(name: &str, system_value: SemanticKind, cols: u32) -> Self {
        let mask = (1u8 << cols) - 1;
        Self {
            semantic_name: name.to_owned(),
            semantic_indices: vec![0],
            system_value,
            component_type: ComponentType::U32,
            interpolation: InterpolationMode::Undefined,
            rows: 1,
            cols,
            start_row: -1,
            start_col: -1,
            register_mask: mask,
            used_mask: mask,
            stream: 0,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Signatures {
    pub inputs: Vec<SignatureElement>,
    pub outputs: Vec<SignatureElement>,
    pub patch_constants: Vec<SignatureElement>,
}

pub(crate) fn collect(meta: MetaReader<'_>, signatures: Option<MetadataId>) -> Signatures {
    let Some(signatures) = signatures else {
        return Signatures::default();
    };
    let list = |index: usize| -> Vec<SignatureElement> {
        meta.child(signatures, index)
            .map(|l| {
                meta.operands(l)
                    .iter()
                    .flatten()
                    .map(|e| element(meta, *e))
                    .collect()
            })
            .unwrap_or_default()
    };
    Signatures {
        inputs: list(0),
        outputs: list(1),
        patch_constants: list(2),
    }
}

fn element(meta: MetaReader<'_>, e: MetadataId) -> SignatureElement {
    let cols = meta.child_u32(e, ELEMENT_COLS);
    let start_col = meta.child_int(e, ELEMENT_START_COL).unwrap_or(0) as i32;
    let register_mask = if (0..4).contains(&start_col) && cols <= 4 {
        (((1u32 << cols) - 1) << start_col) as u8 & 0xF
    } else {
        0
    };

    let mut out = SignatureElement {
        semantic_name: meta.child_str(e, ELEMENT_SEMANTIC).unwrap_or_default().to_owned(),
        semantic_indices: meta
            .child(e, ELEMENT_SEMANTIC_INDICES)
            .map(|list| {
                meta.operands(list)
                    .iter()
                    .flatten()
                    .filter_map(|i| meta.int(*i))
                    .map(|i| i as u32)
                    .collect()
            })
            .unwrap_or_default(),
        system_value: SemanticKind::from_raw(meta.child_u32(e, ELEMENT_SEMANTIC_KIND) as u8),
        component_type: ComponentType::from_raw(meta.child_u32(e, ELEMENT_COMPONENT_TYPE)),
        interpolation: InterpolationMode::from_raw(meta.child_u32(e, ELEMENT_INTERPOLATION) as u8),
        rows: meta.child_u32(e, ELEMENT_ROWS),
        cols,
        start_row: meta.child_int(e, ELEMENT_START_ROW).unwrap_or(0) as i32,
        start_col,
        register_mask,
        used_mask: register_mask,
        stream: 0,
    };

    for (tag, value) in meta.tags(meta.child(e, ELEMENT_TAGS)) {
        let value = value.and_then(|v| meta.int(v)).unwrap_or(0);
        match tag {
            TAG_OUTPUT_STREAM => out.stream = value as u32,
            TAG_USAGE_MASK => {
                let shift = out.start_col.clamp(0, 3) as u32;
                out.used_mask = ((value as u32) << shift) as u8 & 0xF;
            }
            TAG_GLOBAL_SYMBOL | TAG_DYNAMIC_INDEX_MASK => {}
            other => tracing::warn!(tag = other, "unknown signature element tag"),
        }
    }
    out
}

/// System-value inputs implied by the `dx.op` thread id intrinsics a module
/// declares.
pub(crate) fn compute_builtins(module: &Module) -> Vec<SignatureElement> {
    let mut out = Vec::new();
    for func in &module.functions {
        let name = func.name.as_str();
        let builtin = if name.starts_with("dx.op.threadId.") {
            SignatureElement::builtin("SV_DispatchThreadID", SemanticKind::DispatchThreadId, 3)
        } else if name.starts_with("dx.op.groupId.") {
            SignatureElement::builtin("SV_GroupID", SemanticKind::GroupId, 3)
        } else if name.starts_with("dx.op.threadIdInGroup.") {
            SignatureElement::builtin("SV_GroupThreadID", SemanticKind::GroupThreadId, 3)
        } else if name.starts_with("dx.op.flattenedThreadIdInGroup.") {
            SignatureElement::builtin("SV_GroupIndex", SemanticKind::GroupIndex, 1)
        } else {
            continue;
        };
        if !out.iter().any(|e: &SignatureElement| e.system_value == builtin.system_value) {
            out.push(builtin);
        }
    }
    out
}
