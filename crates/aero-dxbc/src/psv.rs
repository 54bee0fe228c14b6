//! Codec for the pipeline state validation chunk (`PSV0`).
//!
//! Unlike `RDAT`, the chunk has no part directory. Its sections follow each
//! other in a fixed order and the presence and size of most of them is implied
//! by counts stored in the leading runtime-info header, whose own size selects
//! the layout version.

use bitflags::bitflags;

use crate::buffers::{IndexArrayLayout, IndexArrays, StringBuffer};
use crate::enums::{InterpolationMode, ResourceKind, SemanticKind, ShaderKind};
use crate::schema::{self, raw_u32, raw_u8, Buffers, FieldWalker, Row, RowReader, RowWriter};
use crate::DxbcError;

const STAGE_INFO_LEN: usize = 16;
const MAX_STREAMS: usize = 4;
const RESOURCE_ROW_V0: u32 = 0;
const RESOURCE_ROW_V1: u32 = 1;
// Byte offset of the `rows` field inside a signature element row.
const ELEMENT_ROWS_OFFSET: usize = 8;

/// Runtime-info header revision, implied by the stored header size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PsvVersion {
    /// 24-byte header: stage info and wave sizes.
    #[default]
    V0,
    /// 36-byte header: adds signature counts, string and index tables.
    V1,
    /// 48-byte header: adds thread group size.
    V2,
    /// 52-byte header: adds the entry function name.
    V3,
}

impl PsvVersion {
    const ALL: [PsvVersion; 4] = [Self::V0, Self::V1, Self::V2, Self::V3];

    fn index(self) -> u32 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Encoded size of the runtime-info header for this version.
    pub fn header_size(self) -> usize {
        schema::row_size::<RuntimeInfo>(self.index())
    }
}

raw_enum! {
    /// Resource binding type (`PSVResourceType`).
    pub enum PsvResourceType: u32 {
        /// No resource.
        Invalid = 0,
        /// Sampler.
        Sampler = 1,
        /// Constant buffer.
        Cbv = 2,
        /// Typed SRV.
        SrvTyped = 3,
        /// Raw SRV.
        SrvRaw = 4,
        /// Structured SRV.
        SrvStructured = 5,
        /// Typed UAV.
        UavTyped = 6,
        /// Raw UAV.
        UavRaw = 7,
        /// Structured UAV.
        UavStructured = 8,
        /// Structured UAV with a hidden counter.
        UavStructuredWithCounter = 9,
    }
}

raw_enum! {
    /// Register component type of a signature element (`DxilProgramSigCompType`).
    pub enum SigComponentType: u8 {
        /// No type information.
        Untyped = 0,
        /// 32-bit unsigned integer.
        UInt32 = 1,
        /// 32-bit signed integer.
        SInt32 = 2,
        /// 32-bit float.
        Float32 = 3,
        /// 16-bit unsigned integer.
        UInt16 = 4,
        /// 16-bit signed integer.
        SInt16 = 5,
        /// 16-bit float.
        Float16 = 6,
        /// 64-bit unsigned integer.
        UInt64 = 7,
        /// 64-bit signed integer.
        SInt64 = 8,
        /// 64-bit float.
        Float64 = 9,
    }
}

bitflags! {
    /// Resource flags stored in version 1 resource rows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PsvResourceFlags: u32 {
        /// The resource is accessed by atomic 64-bit operations.
        const USED_BY_ATOMIC64 = 1 << 0;
    }
}

/// One resource binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsvResourceBind {
    /// Binding type.
    pub res_type: PsvResourceType,
    /// Register space.
    pub space: u32,
    /// First register.
    pub lower_bound: u32,
    /// Last register (inclusive).
    pub upper_bound: u32,
    /// Resource shape, only stored by version 1 rows.
    pub res_kind: ResourceKind,
    /// Resource flags, only stored by version 1 rows.
    pub res_flags: PsvResourceFlags,
}

impl Default for PsvResourceBind {
    fn default() -> Self {
        Self {
            res_type: PsvResourceType::Invalid,
            space: 0,
            lower_bound: 0,
            upper_bound: 0,
            res_kind: ResourceKind::Invalid,
            res_flags: PsvResourceFlags::empty(),
        }
    }
}

impl Row for PsvResourceBind {
    fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError> {
        raw_u32(
            w,
            "res_type",
            &mut self.res_type,
            |t| t.raw(),
            PsvResourceType::from_raw,
        )?;
        w.u32("space", &mut self.space)?;
        w.u32("lower_bound", &mut self.lower_bound)?;
        w.u32("upper_bound", &mut self.upper_bound)?;
        if w.version() >= RESOURCE_ROW_V1 {
            raw_u32(w, "res_kind", &mut self.res_kind, |k| k.raw(), ResourceKind::from_raw)?;
            raw_u32(
                w,
                "res_flags",
                &mut self.res_flags,
                |f| f.bits(),
                PsvResourceFlags::from_bits_retain,
            )?;
        }
        Ok(())
    }
}

/// One signature element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsvSignatureElement {
    /// Semantic name; empty for system values.
    pub semantic_name: String,
    /// Semantic index of every row; the length is the element's row count.
    pub semantic_indexes: Vec<u32>,
    /// First allocated row, `0xFF` when unallocated.
    pub start_row: u8,
    /// Column count (1..=4).
    pub cols: u8,
    /// First allocated column (0..=3).
    pub start_col: u8,
    /// Whether the element was assigned a location.
    pub allocated: bool,
    /// System-value kind.
    pub semantic_kind: SemanticKind,
    /// Register component type.
    pub component_type: SigComponentType,
    /// Interpolation mode.
    pub interpolation_mode: InterpolationMode,
    /// Mask of dynamically indexed components (4 bits).
    pub dynamic_mask: u8,
    /// Geometry shader output stream (0..=3).
    pub output_stream: u8,
}

impl Default for PsvSignatureElement {
    fn default() -> Self {
        Self {
            semantic_name: String::new(),
            semantic_indexes: Vec::new(),
            start_row: 0,
            cols: 0,
            start_col: 0,
            allocated: false,
            semantic_kind: SemanticKind::Arbitrary,
            component_type: SigComponentType::Untyped,
            interpolation_mode: InterpolationMode::Undefined,
            dynamic_mask: 0,
            output_stream: 0,
        }
    }
}

impl Row for PsvSignatureElement {
    fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError> {
        w.string("semantic_name", &mut self.semantic_name)?;
        w.counted_index_array(
            "semantic_indexes",
            &mut self.semantic_indexes,
            ELEMENT_ROWS_OFFSET,
        )?;
        let mut rows = u8::try_from(self.semantic_indexes.len()).map_err(|_| {
            DxbcError::invalid_data(format!(
                "signature element {:?} spans {} rows",
                self.semantic_name,
                self.semantic_indexes.len()
            ))
        })?;
        w.u8("rows", &mut rows)?;
        w.u8("start_row", &mut self.start_row)?;

        let mut cols_and_start =
            (self.cols & 0xF) | ((self.start_col & 0x3) << 4) | (u8::from(self.allocated) << 6);
        w.u8("cols_and_start", &mut cols_and_start)?;
        self.cols = cols_and_start & 0xF;
        self.start_col = (cols_and_start >> 4) & 0x3;
        self.allocated = cols_and_start & 0x40 != 0;

        raw_u8(
            w,
            "semantic_kind",
            &mut self.semantic_kind,
            |k| k.raw(),
            SemanticKind::from_raw,
        )?;
        raw_u8(
            w,
            "component_type",
            &mut self.component_type,
            |t| t.raw(),
            SigComponentType::from_raw,
        )?;
        raw_u8(
            w,
            "interpolation_mode",
            &mut self.interpolation_mode,
            |m| m.raw(),
            InterpolationMode::from_raw,
        )?;

        let mut mask_and_stream = (self.dynamic_mask & 0xF) | ((self.output_stream & 0x3) << 4);
        w.u8("dynamic_mask_and_stream", &mut mask_and_stream)?;
        self.dynamic_mask = mask_and_stream & 0xF;
        self.output_stream = (mask_and_stream >> 4) & 0x3;

        w.skip("reserved", 1)
    }
}

/// Typed view of the stage-specific union at the start of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsvStageInfo {
    /// Vertex shader info.
    Vertex {
        /// Whether `SV_Position` is written.
        output_position_present: bool,
    },
    /// Hull shader info.
    Hull {
        /// Input control point count.
        input_control_point_count: u32,
        /// Output control point count.
        output_control_point_count: u32,
        /// Tessellator domain.
        tessellator_domain: u32,
        /// Tessellator output primitive.
        tessellator_output_primitive: u32,
    },
    /// Domain shader info.
    Domain {
        /// Input control point count.
        input_control_point_count: u32,
        /// Whether `SV_Position` is written.
        output_position_present: bool,
        /// Tessellator domain.
        tessellator_domain: u32,
    },
    /// Geometry shader info.
    Geometry {
        /// Input primitive.
        input_primitive: u32,
        /// Output topology.
        output_topology: u32,
        /// Mask of active output streams.
        output_stream_mask: u32,
        /// Whether `SV_Position` is written.
        output_position_present: bool,
    },
    /// Pixel shader info.
    Pixel {
        /// Whether depth is written.
        depth_output: bool,
        /// Whether the shader runs at sample frequency.
        sample_frequency: bool,
    },
    /// Amplification shader info.
    Amplification {
        /// Payload size in bytes.
        payload_size_in_bytes: u32,
    },
    /// Mesh shader info.
    Mesh {
        /// Group shared memory used.
        group_shared_bytes_used: u32,
        /// Group shared memory whose contents depend on the view ID.
        group_shared_bytes_dependent_on_view_id: u32,
        /// Payload size in bytes.
        payload_size_in_bytes: u32,
        /// Maximum output vertices.
        max_output_vertices: u16,
        /// Maximum output primitives.
        max_output_primitives: u16,
    },
    /// Stages without stage-specific info.
    None,
}

impl PsvStageInfo {
    /// Interprets `raw` according to `stage`.
    pub fn decode(stage: ShaderKind, raw: &[u8; STAGE_INFO_LEN]) -> Self {
        let word = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
        let half = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);
        match stage {
            ShaderKind::Vertex => Self::Vertex {
                output_position_present: raw[0] != 0,
            },
            ShaderKind::Hull => Self::Hull {
                input_control_point_count: word(0),
                output_control_point_count: word(4),
                tessellator_domain: word(8),
                tessellator_output_primitive: word(12),
            },
            ShaderKind::Domain => Self::Domain {
                input_control_point_count: word(0),
                output_position_present: raw[4] != 0,
                tessellator_domain: word(8),
            },
            ShaderKind::Geometry => Self::Geometry {
                input_primitive: word(0),
                output_topology: word(4),
                output_stream_mask: word(8),
                output_position_present: raw[12] != 0,
            },
            ShaderKind::Pixel => Self::Pixel {
                depth_output: raw[0] != 0,
                sample_frequency: raw[1] != 0,
            },
            ShaderKind::Amplification => Self::Amplification {
                payload_size_in_bytes: word(0),
            },
            ShaderKind::Mesh => Self::Mesh {
                group_shared_bytes_used: word(0),
                group_shared_bytes_dependent_on_view_id: word(4),
                payload_size_in_bytes: word(8),
                max_output_vertices: half(12),
                max_output_primitives: half(14),
            },
            _ => Self::None,
        }
    }

    /// Encodes the union bytes.
    pub fn encode(&self) -> [u8; STAGE_INFO_LEN] {
        let mut raw = [0u8; STAGE_INFO_LEN];
        let mut put = |at: usize, bytes: &[u8]| raw[at..at + bytes.len()].copy_from_slice(bytes);
        match *self {
            Self::Vertex {
                output_position_present,
            } => put(0, &[u8::from(output_position_present)]),
            Self::Hull {
                input_control_point_count,
                output_control_point_count,
                tessellator_domain,
                tessellator_output_primitive,
            } => {
                put(0, &input_control_point_count.to_le_bytes());
                put(4, &output_control_point_count.to_le_bytes());
                put(8, &tessellator_domain.to_le_bytes());
                put(12, &tessellator_output_primitive.to_le_bytes());
            }
            Self::Domain {
                input_control_point_count,
                output_position_present,
                tessellator_domain,
            } => {
                put(0, &input_control_point_count.to_le_bytes());
                put(4, &[u8::from(output_position_present)]);
                put(8, &tessellator_domain.to_le_bytes());
            }
            Self::Geometry {
                input_primitive,
                output_topology,
                output_stream_mask,
                output_position_present,
            } => {
                put(0, &input_primitive.to_le_bytes());
                put(4, &output_topology.to_le_bytes());
                put(8, &output_stream_mask.to_le_bytes());
                put(12, &[u8::from(output_position_present)]);
            }
            Self::Pixel {
                depth_output,
                sample_frequency,
            } => put(0, &[u8::from(depth_output), u8::from(sample_frequency)]),
            Self::Amplification {
                payload_size_in_bytes,
            } => put(0, &payload_size_in_bytes.to_le_bytes()),
            Self::Mesh {
                group_shared_bytes_used,
                group_shared_bytes_dependent_on_view_id,
                payload_size_in_bytes,
                max_output_vertices,
                max_output_primitives,
            } => {
                put(0, &group_shared_bytes_used.to_le_bytes());
                put(4, &group_shared_bytes_dependent_on_view_id.to_le_bytes());
                put(8, &payload_size_in_bytes.to_le_bytes());
                put(12, &max_output_vertices.to_le_bytes());
                put(14, &max_output_primitives.to_le_bytes());
            }
            Self::None => {}
        }
        raw
    }
}

/// Decoded contents of a `PSV0` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsvData {
    /// Header revision.
    pub version: PsvVersion,
    /// Raw stage-specific union; see [`PsvData::stage_info`].
    pub stage_info: [u8; STAGE_INFO_LEN],
    /// Minimum expected wave size.
    pub min_expected_wave_lane_count: u32,
    /// Maximum expected wave size.
    pub max_expected_wave_lane_count: u32,
    /// Shader stage (V1+).
    pub shader_stage: ShaderKind,
    /// Whether outputs depend on `SV_ViewID` (V1+).
    pub uses_view_id: bool,
    /// Stage word: max vertex count for geometry shaders, otherwise
    /// patch-constant/primitive vectors in the low byte and mesh output
    /// topology in the high byte (V1+).
    pub stage_word: u16,
    /// Number of packed input vectors (V1+).
    pub sig_input_vectors: u8,
    /// Number of packed output vectors per stream (V1+).
    pub sig_output_vectors: [u8; MAX_STREAMS],
    /// Thread group size (V2+).
    pub num_threads: [u32; 3],
    /// Entry function name (V3).
    pub entry_function_name: String,
    /// Resource bindings.
    pub resources: Vec<PsvResourceBind>,
    /// Input signature elements (V1+).
    pub input_elements: Vec<PsvSignatureElement>,
    /// Output signature elements (V1+).
    pub output_elements: Vec<PsvSignatureElement>,
    /// Patch constant or primitive signature elements (V1+).
    pub patch_const_or_prim_elements: Vec<PsvSignatureElement>,
    /// Per-stream masks of outputs affected by the view ID.
    pub view_id_output_masks: [Vec<u32>; MAX_STREAMS],
    /// Mask of patch constant/primitive outputs affected by the view ID.
    pub view_id_patch_const_or_prim_output_mask: Vec<u32>,
    /// Per-stream input to output dependency tables.
    pub input_to_output_tables: [Vec<u32>; MAX_STREAMS],
    /// Input to patch constant output dependency table (hull shaders).
    pub input_to_patch_const_output_table: Vec<u32>,
    /// Patch constant input to output dependency table (domain shaders).
    pub patch_const_input_to_output_table: Vec<u32>,
}

impl Default for PsvData {
    fn default() -> Self {
        Self {
            version: PsvVersion::V0,
            stage_info: [0; STAGE_INFO_LEN],
            min_expected_wave_lane_count: 0,
            max_expected_wave_lane_count: 0,
            shader_stage: ShaderKind::Pixel,
            uses_view_id: false,
            stage_word: 0,
            sig_input_vectors: 0,
            sig_output_vectors: [0; MAX_STREAMS],
            num_threads: [0; 3],
            entry_function_name: String::new(),
            resources: Vec::new(),
            input_elements: Vec::new(),
            output_elements: Vec::new(),
            patch_const_or_prim_elements: Vec::new(),
            view_id_output_masks: Default::default(),
            view_id_patch_const_or_prim_output_mask: Vec::new(),
            input_to_output_tables: Default::default(),
            input_to_patch_const_output_table: Vec::new(),
            patch_const_input_to_output_table: Vec::new(),
        }
    }
}

impl PsvData {
    /// Typed view of [`PsvData::stage_info`] for [`PsvData::shader_stage`].
    pub fn stage_info(&self) -> PsvStageInfo {
        PsvStageInfo::decode(self.shader_stage, &self.stage_info)
    }

    /// Replaces the raw stage union.
    pub fn set_stage_info(&mut self, info: PsvStageInfo) {
        self.stage_info = info.encode();
    }

    /// Geometry shader maximum vertex count.
    pub fn max_vertex_count(&self) -> u16 {
        self.stage_word
    }

    /// Packed patch constant (hull/domain) or primitive (mesh) vector count.
    pub fn sig_patch_const_or_prim_vectors(&self) -> u8 {
        self.stage_word.to_le_bytes()[0]
    }

    /// Mesh shader output topology.
    pub fn mesh_output_topology(&self) -> u8 {
        self.stage_word.to_le_bytes()[1]
    }

    fn stream_count(&self) -> usize {
        if self.shader_stage == ShaderKind::Geometry {
            MAX_STREAMS
        } else {
            1
        }
    }

    /// Word counts of the dependency tables implied by the header.
    fn dependency_layout(&self) -> DependencyLayout {
        let mut layout = DependencyLayout::default();
        if self.version < PsvVersion::V1 {
            return layout;
        }

        let inputs = usize::from(self.sig_input_vectors);
        let pc = usize::from(self.sig_patch_const_or_prim_vectors());
        for stream in 0..self.stream_count() {
            let outputs = usize::from(self.sig_output_vectors[stream]);
            if self.uses_view_id && outputs > 0 {
                layout.view_id_outputs[stream] = mask_words(outputs);
            }
            if inputs > 0 && outputs > 0 {
                layout.input_to_output[stream] = inputs * 4 * mask_words(outputs);
            }
        }
        let has_pc_outputs = matches!(self.shader_stage, ShaderKind::Hull | ShaderKind::Mesh);
        if self.uses_view_id && has_pc_outputs && pc > 0 {
            layout.view_id_patch_const = mask_words(pc);
        }
        if self.shader_stage == ShaderKind::Hull && inputs > 0 && pc > 0 {
            layout.input_to_patch_const = inputs * 4 * mask_words(pc);
        }
        let outputs = usize::from(self.sig_output_vectors[0]);
        if self.shader_stage == ShaderKind::Domain && pc > 0 && outputs > 0 {
            layout.patch_const_to_output = pc * 4 * mask_words(outputs);
        }
        layout
    }

    fn validate(&self) -> Result<(), DxbcError> {
        let fail = |what: String| Err(DxbcError::invalid_data(what));

        if self.version < PsvVersion::V1 {
            let has_v1_content = self.shader_stage != ShaderKind::Pixel
                || self.uses_view_id
                || self.stage_word != 0
                || self.sig_input_vectors != 0
                || self.sig_output_vectors != [0; MAX_STREAMS]
                || !self.input_elements.is_empty()
                || !self.output_elements.is_empty()
                || !self.patch_const_or_prim_elements.is_empty();
            if has_v1_content {
                return fail("version 0 data carries signature information".into());
            }
        }
        if self.version < PsvVersion::V2 && self.num_threads != [0; 3] {
            return fail(format!("{:?} data carries a thread group size", self.version));
        }
        if self.version < PsvVersion::V3 && !self.entry_function_name.is_empty() {
            return fail(format!("{:?} data carries an entry name", self.version));
        }
        if resource_row_version(self.version) == RESOURCE_ROW_V0 {
            if let Some(r) = self.resources.iter().find(|r| {
                r.res_kind != ResourceKind::Invalid || !r.res_flags.is_empty()
            }) {
                return fail(format!(
                    "{:?} resource rows cannot store kind {:?} / flags {:?}",
                    self.version, r.res_kind, r.res_flags
                ));
            }
        }

        for (what, elements) in [
            ("input", &self.input_elements),
            ("output", &self.output_elements),
            ("patch constant", &self.patch_const_or_prim_elements),
        ] {
            if elements.len() > usize::from(u8::MAX) {
                return fail(format!("{} {what} elements exceed 255", elements.len()));
            }
            for e in elements.iter() {
                if e.cols > 0xF || e.start_col > 3 || e.dynamic_mask > 0xF || e.output_stream > 3 {
                    return fail(format!(
                        "{what} element {:?} has out of range packing",
                        e.semantic_name
                    ));
                }
            }
        }

        let layout = self.dependency_layout();
        let tables = self.dependency_tables();
        for ((name, table), expected) in tables.iter().zip(layout.word_counts()) {
            if table.len() != expected {
                return fail(format!(
                    "{name} has {} words but the header implies {expected}",
                    table.len()
                ));
            }
        }
        Ok(())
    }

    fn dependency_tables(&self) -> Vec<(&'static str, &Vec<u32>)> {
        let mut tables = Vec::new();
        for mask in &self.view_id_output_masks {
            tables.push(("view ID output mask", mask));
        }
        tables.push((
            "view ID patch constant mask",
            &self.view_id_patch_const_or_prim_output_mask,
        ));
        for table in &self.input_to_output_tables {
            tables.push(("input to output table", table));
        }
        tables.push((
            "input to patch constant table",
            &self.input_to_patch_const_output_table,
        ));
        tables.push((
            "patch constant to output table",
            &self.patch_const_input_to_output_table,
        ));
        tables
    }

    /// Word count of every dependency table implied by the header, in the
    /// order of [`PsvData::dependency_tables_mut`].
    pub fn dependency_table_sizes(&self) -> Vec<usize> {
        self.dependency_layout().word_counts()
    }

    /// Every dependency table in physical order: view-ID output masks per
    /// stream, the view-ID patch constant mask, input to output tables per
    /// stream, input to patch constant, then patch constant to output.
    pub fn dependency_tables_mut(&mut self) -> Vec<&mut Vec<u32>> {
        let mut tables: Vec<&mut Vec<u32>> = Vec::new();
        tables.extend(self.view_id_output_masks.iter_mut());
        tables.push(&mut self.view_id_patch_const_or_prim_output_mask);
        tables.extend(self.input_to_output_tables.iter_mut());
        tables.push(&mut self.input_to_patch_const_output_table);
        tables.push(&mut self.patch_const_input_to_output_table);
        tables
    }
}

/// Number of 32-bit words needed for one bit per component of `vectors` vectors.
fn mask_words(vectors: usize) -> usize {
    (vectors + 7) / 8
}

#[derive(Debug, Default)]
struct DependencyLayout {
    view_id_outputs: [usize; MAX_STREAMS],
    view_id_patch_const: usize,
    input_to_output: [usize; MAX_STREAMS],
    input_to_patch_const: usize,
    patch_const_to_output: usize,
}

impl DependencyLayout {
    /// Word counts in the physical order of the tables.
    fn word_counts(&self) -> Vec<usize> {
        let mut counts = self.view_id_outputs.to_vec();
        counts.push(self.view_id_patch_const);
        counts.extend_from_slice(&self.input_to_output);
        counts.push(self.input_to_patch_const);
        counts.push(self.patch_const_to_output);
        counts
    }
}

fn resource_row_version(version: PsvVersion) -> u32 {
    if version >= PsvVersion::V2 {
        RESOURCE_ROW_V1
    } else {
        RESOURCE_ROW_V0
    }
}

/// The fixed header, including the element counts that live in [`PsvData`]
/// as list lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuntimeInfo {
    stage_info: [u8; STAGE_INFO_LEN],
    min_wave: u32,
    max_wave: u32,
    shader_stage: u8,
    uses_view_id: u8,
    stage_word: u16,
    input_elements: u8,
    output_elements: u8,
    patch_const_elements: u8,
    input_vectors: u8,
    output_vectors: [u8; MAX_STREAMS],
    num_threads: [u32; 3],
    entry_function_name: String,
}

impl Default for RuntimeInfo {
    fn default() -> Self {
        Self {
            stage_info: [0; STAGE_INFO_LEN],
            min_wave: 0,
            max_wave: 0,
            shader_stage: 0,
            uses_view_id: 0,
            stage_word: 0,
            input_elements: 0,
            output_elements: 0,
            patch_const_elements: 0,
            input_vectors: 0,
            output_vectors: [0; MAX_STREAMS],
            num_threads: [0; 3],
            entry_function_name: String::new(),
        }
    }
}

impl Row for RuntimeInfo {
    fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError> {
        for byte in self.stage_info.iter_mut() {
            w.u8("stage_info", byte)?;
        }
        w.u32("min_expected_wave_lane_count", &mut self.min_wave)?;
        w.u32("max_expected_wave_lane_count", &mut self.max_wave)?;
        if w.version() < 1 {
            return Ok(());
        }

        w.u8("shader_stage", &mut self.shader_stage)?;
        w.u8("uses_view_id", &mut self.uses_view_id)?;
        w.u16("stage_word", &mut self.stage_word)?;
        w.u8("sig_input_elements", &mut self.input_elements)?;
        w.u8("sig_output_elements", &mut self.output_elements)?;
        w.u8("sig_patch_const_or_prim_elements", &mut self.patch_const_elements)?;
        w.u8("sig_input_vectors", &mut self.input_vectors)?;
        for vectors in self.output_vectors.iter_mut() {
            w.u8("sig_output_vectors", vectors)?;
        }
        if w.version() < 2 {
            return Ok(());
        }

        for n in self.num_threads.iter_mut() {
            w.u32("num_threads", n)?;
        }
        if w.version() < 3 {
            return Ok(());
        }

        w.string("entry_function_name", &mut self.entry_function_name)
    }
}

/// Decodes a `PSV0` chunk payload.
pub fn parse_psv_chunk(bytes: &[u8]) -> Result<PsvData, DxbcError> {
    let mut cursor = Cursor { bytes, pos: 0 };

    let header_size = cursor.u32("runtime_info_size")? as usize;
    let version = PsvVersion::ALL
        .into_iter()
        .rev()
        .find(|v| v.header_size() <= header_size)
        .ok_or_else(|| {
            DxbcError::unsupported_version(format!(
                "PSV runtime info size {header_size} is smaller than the {} byte minimum",
                PsvVersion::V0.header_size()
            ))
        })?;
    if version.header_size() != header_size {
        tracing::debug!(header_size, ?version, "PSV runtime info has unknown trailing bytes");
    }
    let header_bytes = cursor.take(header_size, "runtime info")?;

    let mut buffers = Buffers {
        strings: StringBuffer::new(false),
        indices: IndexArrays::new(IndexArrayLayout::Unprefixed),
        bytes: Default::default(),
    };

    let resource_count = cursor.u32("resource_count")?;
    let mut resources = Vec::new();
    if resource_count > 0 {
        let stride = cursor.u32("resource_stride")? as usize;
        let row_version = schema::version_for_stride::<PsvResourceBind>(
            stride,
            resource_row_version(version),
        )
        .ok_or_else(|| {
            DxbcError::malformed_header(format!("PSV resource stride {stride} is too small"))
        })?;
        let table = cursor.take_rows(resource_count, stride, "resource table")?;
        resources = schema::decode_rows(
            table,
            resource_count,
            stride,
            row_version,
            &buffers,
            "PSV resource",
        )?;
    }

    if version >= PsvVersion::V1 {
        let string_size = cursor.u32("string_table_size")? as usize;
        buffers.strings = StringBuffer::from_bytes(cursor.take(string_size, "string table")?);
        let index_count = cursor.u32("semantic_index_count")?;
        let index_bytes = cursor.take_rows(index_count, 4, "semantic index table")?;
        buffers.indices = IndexArrays::from_bytes(index_bytes, IndexArrayLayout::Unprefixed)?;
    }

    let mut info = RuntimeInfo::default();
    info.walk(&mut RowReader::new(
        version.index(),
        header_bytes,
        &buffers,
        "PSV runtime info",
    ))?;

    let mut data = PsvData {
        version,
        stage_info: info.stage_info,
        min_expected_wave_lane_count: info.min_wave,
        max_expected_wave_lane_count: info.max_wave,
        shader_stage: ShaderKind::from_raw(u32::from(info.shader_stage)),
        uses_view_id: info.uses_view_id != 0,
        stage_word: info.stage_word,
        sig_input_vectors: info.input_vectors,
        sig_output_vectors: info.output_vectors,
        num_threads: info.num_threads,
        entry_function_name: info.entry_function_name,
        resources,
        ..Default::default()
    };
    if version < PsvVersion::V1 {
        return Ok(data);
    }

    let counts = [
        info.input_elements,
        info.output_elements,
        info.patch_const_elements,
    ];
    if counts.iter().any(|&n| n > 0) {
        let stride = cursor.u32("signature_element_size")? as usize;
        if stride < schema::row_size::<PsvSignatureElement>(0) {
            return Err(DxbcError::malformed_header(format!(
                "PSV signature element size {stride} is too small"
            )));
        }
        let mut lists = Vec::with_capacity(3);
        for count in counts {
            let count = u32::from(count);
            let table = cursor.take_rows(count, stride, "signature elements")?;
            lists.push(schema::decode_rows::<PsvSignatureElement>(
                table,
                count,
                stride,
                0,
                &buffers,
                "PSV signature element",
            )?);
        }
        data.patch_const_or_prim_elements = lists.pop().unwrap_or_default();
        data.output_elements = lists.pop().unwrap_or_default();
        data.input_elements = lists.pop().unwrap_or_default();
    }

    let word_counts = data.dependency_table_sizes();
    for (table, words) in data.dependency_tables_mut().into_iter().zip(word_counts) {
        if words == 0 {
            continue;
        }
        let raw = cursor.take_rows(len_u32(words, "dependency table")?, 4, "dependency table")?;
        *table = raw
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
    }

    Ok(data)
}

/// Encodes `data` as a `PSV0` chunk payload.
pub fn write_psv_chunk(data: &PsvData) -> Result<Vec<u8>, DxbcError> {
    data.validate()?;

    let mut buffers = Buffers::new(false, IndexArrayLayout::Unprefixed);
    let mut info = RuntimeInfo {
        stage_info: data.stage_info,
        min_wave: data.min_expected_wave_lane_count,
        max_wave: data.max_expected_wave_lane_count,
        shader_stage: u8::try_from(data.shader_stage.raw()).map_err(|_| {
            DxbcError::invalid_data(format!("shader stage {:?} does not fit in u8", data.shader_stage))
        })?,
        uses_view_id: u8::from(data.uses_view_id),
        stage_word: data.stage_word,
        input_elements: count_u8(&data.input_elements)?,
        output_elements: count_u8(&data.output_elements)?,
        patch_const_elements: count_u8(&data.patch_const_or_prim_elements)?,
        input_vectors: data.sig_input_vectors,
        output_vectors: data.sig_output_vectors,
        num_threads: data.num_threads,
        entry_function_name: data.entry_function_name.clone(),
    };

    let mut header = Vec::new();
    info.walk(&mut RowWriter::new(
        data.version.index(),
        &mut header,
        &mut buffers,
    ))?;

    let mut out = Vec::new();
    out.extend_from_slice(&len_u32(header.len(), "runtime info size")?.to_le_bytes());
    out.extend_from_slice(&header);

    out.extend_from_slice(&len_u32(data.resources.len(), "resource count")?.to_le_bytes());
    if !data.resources.is_empty() {
        let row_version = resource_row_version(data.version);
        let stride = schema::row_size::<PsvResourceBind>(row_version);
        out.extend_from_slice(&len_u32(stride, "resource stride")?.to_le_bytes());
        out.extend(schema::encode_rows(&data.resources, row_version, &mut buffers)?);
    }

    if data.version < PsvVersion::V1 {
        return Ok(out);
    }

    let element_count = data.input_elements.len()
        + data.output_elements.len()
        + data.patch_const_or_prim_elements.len();
    let mut elements = Vec::new();
    if element_count > 0 {
        for list in [
            &data.input_elements,
            &data.output_elements,
            &data.patch_const_or_prim_elements,
        ] {
            elements.extend(schema::encode_rows(list, 0, &mut buffers)?);
        }
    }

    let strings = buffers.strings.as_bytes();
    let aligned = strings.len().next_multiple_of(4);
    out.extend_from_slice(&len_u32(aligned, "string table size")?.to_le_bytes());
    out.extend_from_slice(strings);
    out.resize(out.len() + (aligned - strings.len()), 0);

    out.extend_from_slice(&len_u32(buffers.indices.len(), "semantic index count")?.to_le_bytes());
    out.extend(buffers.indices.to_bytes());

    if element_count > 0 {
        let stride = schema::row_size::<PsvSignatureElement>(0);
        out.extend_from_slice(&len_u32(stride, "signature element size")?.to_le_bytes());
        out.extend(elements);
    }

    for (_, table) in data.dependency_tables() {
        for word in table {
            out.extend_from_slice(&word.to_le_bytes());
        }
    }
    Ok(out)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], DxbcError> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| DxbcError::malformed_header(format!("{what} size overflows")))?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            DxbcError::out_of_bounds(format!(
                "{what} at {}..{end} is outside chunk length {}",
                self.pos,
                self.bytes.len()
            ))
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn take_rows(&mut self, count: u32, stride: usize, what: &str) -> Result<&'a [u8], DxbcError> {
        let len = (count as usize)
            .checked_mul(stride)
            .ok_or_else(|| DxbcError::malformed_header(format!("{what} size overflows")))?;
        self.take(len, what)
    }

    fn u32(&mut self, what: &str) -> Result<u32, DxbcError> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn count_u8<T>(list: &[T]) -> Result<u8, DxbcError> {
    u8::try_from(list.len())
        .map_err(|_| DxbcError::invalid_data(format!("{} signature elements exceed 255", list.len())))
}

fn len_u32(len: usize, what: &str) -> Result<u32, DxbcError> {
    u32::try_from(len).map_err(|_| DxbcError::invalid_data(format!("{what} {len} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_sizes_grow_with_version() {
        let sizes: Vec<usize> = PsvVersion::ALL.iter().map(|v| v.header_size()).collect();
        assert_eq!(sizes, vec![24, 36, 48, 52]);
        assert_eq!(schema::row_size::<PsvResourceBind>(RESOURCE_ROW_V0), 16);
        assert_eq!(schema::row_size::<PsvResourceBind>(RESOURCE_ROW_V1), 24);
        assert_eq!(schema::row_size::<PsvSignatureElement>(0), 16);
    }

    #[test]
    fn minimal_v0_layout() {
        let data = PsvData {
            min_expected_wave_lane_count: 4,
            max_expected_wave_lane_count: 64,
            ..Default::default()
        };
        let bytes = write_psv_chunk(&data).unwrap();
        let mut expected = vec![24, 0, 0, 0];
        expected.extend_from_slice(&[0; 16]);
        expected.extend_from_slice(&[4, 0, 0, 0, 64, 0, 0, 0]);
        expected.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(bytes, expected);
        assert_eq!(parse_psv_chunk(&bytes).unwrap(), data);
    }

    #[test]
    fn short_headers_are_rejected() {
        let bytes = [20u32.to_le_bytes(), [0; 4], [0; 4], [0; 4], [0; 4], [0; 4]].concat();
        assert!(matches!(
            parse_psv_chunk(&bytes),
            Err(DxbcError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn dependency_tables_are_sized_by_the_header() {
        let mut data = PsvData {
            version: PsvVersion::V1,
            shader_stage: ShaderKind::Vertex,
            uses_view_id: true,
            sig_input_vectors: 2,
            sig_output_vectors: [9, 0, 0, 0],
            ..Default::default()
        };
        // 9 output vectors need two mask words; the IO table has one row per input component.
        data.view_id_output_masks[0] = vec![0x1, 0x2];
        data.input_to_output_tables[0] = (0..16).collect();

        let bytes = write_psv_chunk(&data).unwrap();
        // header + resource count + string table + index count + 2 + 16 words
        assert_eq!(bytes.len(), 4 + 36 + 4 + 8 + 4 + 18 * 4);
        assert_eq!(parse_psv_chunk(&bytes).unwrap(), data);

        data.input_to_output_tables[0].pop();
        assert!(matches!(
            write_psv_chunk(&data),
            Err(DxbcError::InvalidData { .. })
        ));
    }

    #[test]
    fn view_id_tables_are_absent_without_the_flag() {
        let data = PsvData {
            version: PsvVersion::V1,
            shader_stage: ShaderKind::Pixel,
            sig_output_vectors: [1, 0, 0, 0],
            ..Default::default()
        };
        let bytes = write_psv_chunk(&data).unwrap();
        assert_eq!(bytes.len(), 4 + 36 + 4 + 8 + 4);
    }

    #[test]
    fn v3_entry_name_references_the_following_string_table() {
        let data = PsvData {
            version: PsvVersion::V3,
            shader_stage: ShaderKind::Compute,
            num_threads: [8, 8, 1],
            entry_function_name: "main".into(),
            ..Default::default()
        };
        let bytes = write_psv_chunk(&data).unwrap();
        // The name is the first string after the leading NUL.
        assert_eq!(&bytes[4 + 48..4 + 52], &1u32.to_le_bytes());
        assert_eq!(&bytes[4 + 52 + 4 + 4..4 + 52 + 4 + 4 + 8], b"\0main\0\0\0");
        assert_eq!(parse_psv_chunk(&bytes).unwrap(), data);
    }

    #[test]
    fn stage_info_round_trips_through_raw_bytes() {
        let mut data = PsvData {
            version: PsvVersion::V1,
            shader_stage: ShaderKind::Geometry,
            stage_word: 12,
            ..Default::default()
        };
        let info = PsvStageInfo::Geometry {
            input_primitive: 4,
            output_topology: 5,
            output_stream_mask: 1,
            output_position_present: true,
        };
        data.set_stage_info(info);
        assert_eq!(data.stage_info(), info);
        assert_eq!(data.max_vertex_count(), 12);
    }

    #[test]
    fn v0_data_cannot_carry_signatures() {
        let data = PsvData {
            input_elements: vec![PsvSignatureElement::default()],
            ..Default::default()
        };
        assert!(matches!(
            write_psv_chunk(&data),
            Err(DxbcError::InvalidData { .. })
        ));
    }
}
