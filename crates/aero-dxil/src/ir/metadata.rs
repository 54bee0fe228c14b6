use super::{DebugInfo, MetadataId, Value};

/// A metadata node in the module arena.
///
/// Nodes reference each other by [`MetadataId`], so cycles and shared
/// children are plain ids rather than owning pointers.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub distinct: bool,
    pub content: MetadataContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataContent {
    /// `!{...}`; `None` children print as `null`.
    Node(Vec<Option<MetadataId>>),
    String(String),
    /// Wraps a value (`!{i32 0}` members, `!{void ()* @main}`).
    Value(Value),
    Dwarf(DebugInfo),
}

impl Metadata {
    pub fn node(children: Vec<Option<MetadataId>>) -> Self {
        Self {
            distinct: false,
            content: MetadataContent::Node(children),
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self {
            distinct: false,
            content: MetadataContent::String(s.into()),
        }
    }

    pub fn value(v: Value) -> Self {
        Self {
            distinct: false,
            content: MetadataContent::Value(v),
        }
    }

    pub fn dwarf(info: DebugInfo) -> Self {
        Self {
            distinct: false,
            content: MetadataContent::Dwarf(info),
        }
    }

    /// Child node references, in listed order.
    pub fn children(&self) -> Vec<MetadataId> {
        match &self.content {
            MetadataContent::Node(children) => children.iter().flatten().copied().collect(),
            MetadataContent::Dwarf(info) => info.references(),
            MetadataContent::String(_) | MetadataContent::Value(_) => Vec::new(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.content {
            MetadataContent::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<Value> {
        match self.content {
            MetadataContent::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The raw child list of a plain node.
    pub fn operands(&self) -> &[Option<MetadataId>] {
        match &self.content {
            MetadataContent::Node(children) => children,
            _ => &[],
        }
    }
}

/// A source location attached to an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugLocation {
    pub line: u64,
    pub column: u64,
    pub scope: Option<MetadataId>,
    pub inlined_at: Option<MetadataId>,
}

/// `!name = !{...}` roots.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMetadata {
    pub name: String,
    pub children: Vec<Option<MetadataId>>,
}
