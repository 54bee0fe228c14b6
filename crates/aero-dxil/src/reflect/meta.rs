//! Typed access to the `dx.*` named metadata tree.

use crate::ir::{Metadata, MetadataId, Module, TypeId};

/// Reads metadata operands by position, treating every malformed shape as
/// absent.
#[derive(Clone, Copy)]
pub(crate) struct MetaReader<'m> {
    pub module: &'m Module,
}

impl<'m> MetaReader<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self { module }
    }

    pub fn node(&self, id: MetadataId) -> Option<&'m Metadata> {
        let node = self.module.metadata_node(id);
        if node.is_none() {
            tracing::error!(id = id.0, "metadata reference outside the module arena");
        }
        node
    }

    /// First child of the named root `name`.
    pub fn root(&self, name: &str) -> Option<MetadataId> {
        self.module.named_metadata(name)?.children.first().copied().flatten()
    }

    /// Every non-null child of the named root `name`.
    pub fn roots(&self, name: &str) -> Vec<MetadataId> {
        self.module
            .named_metadata(name)
            .map(|n| n.children.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    pub fn operands(&self, id: MetadataId) -> &'m [Option<MetadataId>] {
        self.node(id).map_or(&[][..], Metadata::operands)
    }

    pub fn child(&self, id: MetadataId, index: usize) -> Option<MetadataId> {
        self.operands(id).get(index).copied().flatten()
    }

    pub fn int(&self, id: MetadataId) -> Option<u64> {
        self.module.constant_int(self.node(id)?.as_value()?)
    }

    pub fn child_int(&self, id: MetadataId, index: usize) -> Option<u64> {
        self.int(self.child(id, index)?)
    }

    pub fn child_u32(&self, id: MetadataId, index: usize) -> u32 {
        self.child_int(id, index).unwrap_or(0) as u32
    }

    pub fn string(&self, id: MetadataId) -> Option<&'m str> {
        self.node(id)?.as_str()
    }

    pub fn child_str(&self, id: MetadataId, index: usize) -> Option<&'m str> {
        self.string(self.child(id, index)?)
    }

    /// Type of the value wrapped by a metadata node.
    pub fn value_type(&self, id: MetadataId) -> Option<TypeId> {
        self.module.value_type(None, self.node(id)?.as_value()?)
    }

    /// `tag, value` pairs of a tag list.
    pub fn tags(&self, id: Option<MetadataId>) -> Vec<(u64, Option<MetadataId>)> {
        let Some(id) = id else {
            return Vec::new();
        };
        self.operands(id)
            .chunks(2)
            .filter_map(|pair| {
                let tag = self.int((*pair.first()?)?);
                if tag.is_none() {
                    tracing::warn!(list = id.0, "tag list entry is not an integer");
                }
                Some((tag?, pair.get(1).copied().flatten()))
            })
            .collect()
    }

    /// Strings listed under a node, skipping anything else.
    pub fn strings(&self, id: MetadataId) -> Vec<String> {
        self.operands(id)
            .iter()
            .flatten()
            .filter_map(|c| self.string(*c))
            .map(str::to_owned)
            .collect()
    }
}
