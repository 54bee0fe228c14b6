//! Codec for the runtime data chunk (`RDAT`).
//!
//! The chunk is a small container of parts. Buffer parts hold strings, index
//! arrays and raw bytes; table parts hold fixed-stride rows that refer into the
//! buffers. Encoding always emits parts in one canonical order so re-encoded
//! chunks compare equal to the toolchain's output.

use bitflags::bitflags;

use crate::buffers::{BytesBuffer, IndexArrayLayout, IndexArrays, StringBuffer};
use crate::enums::{ResourceClass, ResourceKind, ShaderKind};
use crate::schema::{self, raw_u32, Buffers, FieldWalker, Row};
use crate::DxbcError;

/// The only RDAT container version this crate understands.
pub const RDAT_VERSION: u32 = 0x10;

const FUNCTION_ROW_V1: u32 = 0;
const FUNCTION_ROW_V2: u32 = 1;

raw_enum! {
    /// Kind of an RDAT part.
    pub enum RdatPartKind: u32 {
        /// NUL-terminated string blob.
        StringBuffer = 1,
        /// Length-prefixed index arrays.
        IndexArrays = 2,
        /// [`ResourceInfo`] rows.
        ResourceTable = 3,
        /// [`FunctionInfo`] rows.
        FunctionTable = 4,
        /// Raw byte blobs (root signatures).
        RawBytes = 5,
        /// [`SubobjectInfo`] rows.
        SubobjectTable = 6,
    }
}

bitflags! {
    /// Resource attribute flags (`RDAT::DxilResourceFlag`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceFlags: u32 {
        /// `globallycoherent` UAV.
        const GLOBALLY_COHERENT = 1 << 0;
        /// UAV with a hidden counter.
        const HAS_COUNTER = 1 << 1;
        /// Rasterizer ordered view.
        const RASTERIZER_ORDERED_VIEW = 1 << 2;
        /// Dynamically indexed resource.
        const DYNAMIC_INDEXING = 1 << 3;
        /// Atomic 64-bit operations are used on this resource.
        const ATOMICS_64_USE = 1 << 4;
        /// `reordercoherent` UAV.
        const REORDER_COHERENT = 1 << 5;
    }
}

/// One row of the resource table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    /// SRV / UAV / CBuffer / Sampler.
    pub class: ResourceClass,
    /// Resource shape.
    pub kind: ResourceKind,
    /// Resource ID within its class.
    pub id: u32,
    /// Register space.
    pub space: u32,
    /// First register.
    pub lower_bound: u32,
    /// Last register (inclusive, `u32::MAX` for unbounded).
    pub upper_bound: u32,
    /// Declared name.
    pub name: String,
    /// Attribute flags.
    pub flags: ResourceFlags,
}

impl Default for ResourceInfo {
    fn default() -> Self {
        Self {
            class: ResourceClass::Srv,
            kind: ResourceKind::Invalid,
            id: 0,
            space: 0,
            lower_bound: 0,
            upper_bound: 0,
            name: String::new(),
            flags: ResourceFlags::empty(),
        }
    }
}

impl Row for ResourceInfo {
    fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError> {
        raw_u32(w, "class", &mut self.class, |c| c.raw(), ResourceClass::from_raw)?;
        raw_u32(w, "kind", &mut self.kind, |k| k.raw(), ResourceKind::from_raw)?;
        w.u32("id", &mut self.id)?;
        w.u32("space", &mut self.space)?;
        w.u32("lower_bound", &mut self.lower_bound)?;
        w.u32("upper_bound", &mut self.upper_bound)?;
        w.string("name", &mut self.name)?;
        raw_u32(
            w,
            "flags",
            &mut self.flags,
            |f| f.bits(),
            ResourceFlags::from_bits_retain,
        )
    }
}

/// Fields added by the second revision of the function table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionInfo2Ext {
    /// Minimum expected wave size, 0 if unconstrained.
    pub min_expected_wave_lane_count: u8,
    /// Maximum expected wave size, 0 if unconstrained.
    pub max_expected_wave_lane_count: u8,
    /// Stage-specific shader flags.
    pub shader_flags: u16,
    /// Raw reference to a stage-specific info record, `u32::MAX` when absent.
    pub shader_info: u32,
}

/// One row of the function table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Mangled function name.
    pub name: String,
    /// Demangled function name.
    pub unmangled_name: String,
    /// Indices into the resource table of every resource the function uses.
    pub resources: Vec<u32>,
    /// Names of the functions this function calls.
    pub function_dependencies: Vec<String>,
    /// Stage this function can be used as.
    pub shader_kind: ShaderKind,
    /// Ray payload size.
    pub payload_size_in_bytes: u32,
    /// Hit attribute size.
    pub attribute_size_in_bytes: u32,
    /// Low word of the shader feature flags.
    pub feature_info1: u32,
    /// High word of the shader feature flags.
    pub feature_info2: u32,
    /// Mask of stages the function is valid in.
    pub shader_stage_flag: u32,
    /// Minimum shader target, encoded as `(kind << 16) | (major << 4) | minor`.
    pub min_shader_target: u32,
    /// Present when the table uses the extended row layout.
    pub ext: Option<FunctionInfo2Ext>,
}

impl Default for FunctionInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            unmangled_name: String::new(),
            resources: Vec::new(),
            function_dependencies: Vec::new(),
            shader_kind: ShaderKind::Invalid,
            payload_size_in_bytes: 0,
            attribute_size_in_bytes: 0,
            feature_info1: 0,
            feature_info2: 0,
            shader_stage_flag: 0,
            min_shader_target: 0,
            ext: None,
        }
    }
}

impl Row for FunctionInfo {
    fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError> {
        w.string("name", &mut self.name)?;
        w.string("unmangled_name", &mut self.unmangled_name)?;
        w.index_array("resources", &mut self.resources, true)?;
        w.string_array(
            "function_dependencies",
            &mut self.function_dependencies,
            true,
        )?;
        raw_u32(
            w,
            "shader_kind",
            &mut self.shader_kind,
            |k| k.raw(),
            ShaderKind::from_raw,
        )?;
        w.u32("payload_size_in_bytes", &mut self.payload_size_in_bytes)?;
        w.u32("attribute_size_in_bytes", &mut self.attribute_size_in_bytes)?;
        w.u32("feature_info1", &mut self.feature_info1)?;
        w.u32("feature_info2", &mut self.feature_info2)?;
        w.u32("shader_stage_flag", &mut self.shader_stage_flag)?;
        w.u32("min_shader_target", &mut self.min_shader_target)?;

        if w.version() >= FUNCTION_ROW_V2 {
            let ext = self.ext.get_or_insert_with(Default::default);
            w.u8(
                "min_expected_wave_lane_count",
                &mut ext.min_expected_wave_lane_count,
            )?;
            w.u8(
                "max_expected_wave_lane_count",
                &mut ext.max_expected_wave_lane_count,
            )?;
            w.u16("shader_flags", &mut ext.shader_flags)?;
            w.u32("shader_info", &mut ext.shader_info)?;
        }
        Ok(())
    }
}

/// Hit group flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitGroupType {
    /// Triangle geometry.
    Triangle,
    /// Procedural primitive geometry.
    ProceduralPrimitive,
    /// Value not known to this crate.
    Unknown(u32),
}

impl HitGroupType {
    /// Converts a raw value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Triangle,
            1 => Self::ProceduralPrimitive,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw value.
    pub fn raw(self) -> u32 {
        match self {
            Self::Triangle => 0,
            Self::ProceduralPrimitive => 1,
            Self::Unknown(raw) => raw,
        }
    }
}

/// Kind-specific contents of a subobject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubobjectPayload {
    /// State object configuration flags.
    StateObjectConfig {
        /// `D3D12_STATE_OBJECT_FLAGS`.
        flags: u32,
    },
    /// Serialized global root signature.
    GlobalRootSignature {
        /// Root signature blob.
        data: Vec<u8>,
    },
    /// Serialized local root signature.
    LocalRootSignature {
        /// Root signature blob.
        data: Vec<u8>,
    },
    /// Associates a subobject with a list of exports.
    SubobjectToExportsAssociation {
        /// Name of the associated subobject.
        subobject: String,
        /// Export names.
        exports: Vec<String>,
    },
    /// Raytracing shader configuration.
    RaytracingShaderConfig {
        /// Maximum payload size in bytes.
        max_payload_size_in_bytes: u32,
        /// Maximum attribute size in bytes.
        max_attribute_size_in_bytes: u32,
    },
    /// Raytracing pipeline configuration.
    RaytracingPipelineConfig {
        /// Maximum trace recursion depth.
        max_trace_recursion_depth: u32,
    },
    /// Hit group definition.
    HitGroup {
        /// Geometry flavour.
        hit_group_type: HitGroupType,
        /// Any-hit shader export.
        any_hit: String,
        /// Closest-hit shader export.
        closest_hit: String,
        /// Intersection shader export.
        intersection: String,
    },
    /// Raytracing pipeline configuration with flags.
    RaytracingPipelineConfig1 {
        /// Maximum trace recursion depth.
        max_trace_recursion_depth: u32,
        /// `D3D12_RAYTRACING_PIPELINE_FLAGS`.
        flags: u32,
    },
    /// A subobject kind this crate does not know; the payload is kept verbatim.
    Unknown {
        /// Raw subobject kind.
        kind: u32,
        /// Raw payload words.
        raw: [u32; 4],
    },
}

impl SubobjectPayload {
    /// Raw subobject kind (`D3D12_STATE_SUBOBJECT_TYPE`).
    pub fn kind(&self) -> u32 {
        match self {
            Self::StateObjectConfig { .. } => 0,
            Self::GlobalRootSignature { .. } => 1,
            Self::LocalRootSignature { .. } => 2,
            Self::SubobjectToExportsAssociation { .. } => 8,
            Self::RaytracingShaderConfig { .. } => 9,
            Self::RaytracingPipelineConfig { .. } => 10,
            Self::HitGroup { .. } => 11,
            Self::RaytracingPipelineConfig1 { .. } => 12,
            Self::Unknown { kind, .. } => *kind,
        }
    }

    fn empty_for_kind(kind: u32) -> Self {
        match kind {
            0 => Self::StateObjectConfig { flags: 0 },
            1 => Self::GlobalRootSignature { data: Vec::new() },
            2 => Self::LocalRootSignature { data: Vec::new() },
            8 => Self::SubobjectToExportsAssociation {
                subobject: String::new(),
                exports: Vec::new(),
            },
            9 => Self::RaytracingShaderConfig {
                max_payload_size_in_bytes: 0,
                max_attribute_size_in_bytes: 0,
            },
            10 => Self::RaytracingPipelineConfig {
                max_trace_recursion_depth: 0,
            },
            11 => Self::HitGroup {
                hit_group_type: HitGroupType::Triangle,
                any_hit: String::new(),
                closest_hit: String::new(),
                intersection: String::new(),
            },
            12 => Self::RaytracingPipelineConfig1 {
                max_trace_recursion_depth: 0,
                flags: 0,
            },
            other => Self::Unknown {
                kind: other,
                raw: [0; 4],
            },
        }
    }
}

const SUBOBJECT_PAYLOAD_LEN: usize = 16;

/// One row of the subobject table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubobjectInfo {
    /// Subobject name.
    pub name: String,
    /// Kind-specific contents.
    pub payload: SubobjectPayload,
}

impl Default for SubobjectInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            payload: SubobjectPayload::StateObjectConfig { flags: 0 },
        }
    }
}

impl Row for SubobjectInfo {
    fn walk<W: FieldWalker>(&mut self, w: &mut W) -> Result<(), DxbcError> {
        let mut kind = self.payload.kind();
        w.u32("kind", &mut kind)?;
        if kind != self.payload.kind() {
            self.payload = SubobjectPayload::empty_for_kind(kind);
        }
        w.string("name", &mut self.name)?;

        let used = match &mut self.payload {
            SubobjectPayload::StateObjectConfig { flags } => {
                w.u32("flags", flags)?;
                4
            }
            SubobjectPayload::GlobalRootSignature { data }
            | SubobjectPayload::LocalRootSignature { data } => {
                w.bytes("root_signature", data)?;
                8
            }
            SubobjectPayload::SubobjectToExportsAssociation { subobject, exports } => {
                w.string("subobject", subobject)?;
                w.string_array("exports", exports, true)?;
                8
            }
            SubobjectPayload::RaytracingShaderConfig {
                max_payload_size_in_bytes,
                max_attribute_size_in_bytes,
            } => {
                w.u32("max_payload_size_in_bytes", max_payload_size_in_bytes)?;
                w.u32("max_attribute_size_in_bytes", max_attribute_size_in_bytes)?;
                8
            }
            SubobjectPayload::RaytracingPipelineConfig {
                max_trace_recursion_depth,
            } => {
                w.u32("max_trace_recursion_depth", max_trace_recursion_depth)?;
                4
            }
            SubobjectPayload::HitGroup {
                hit_group_type,
                any_hit,
                closest_hit,
                intersection,
            } => {
                raw_u32(
                    w,
                    "hit_group_type",
                    hit_group_type,
                    |t| t.raw(),
                    HitGroupType::from_raw,
                )?;
                w.string("any_hit", any_hit)?;
                w.string("closest_hit", closest_hit)?;
                w.string("intersection", intersection)?;
                16
            }
            SubobjectPayload::RaytracingPipelineConfig1 {
                max_trace_recursion_depth,
                flags,
            } => {
                w.u32("max_trace_recursion_depth", max_trace_recursion_depth)?;
                w.u32("flags", flags)?;
                8
            }
            SubobjectPayload::Unknown { raw, .. } => {
                for word in raw.iter_mut() {
                    w.u32("raw", word)?;
                }
                16
            }
        };
        w.skip("payload_padding", SUBOBJECT_PAYLOAD_LEN - used)
    }
}

/// Decoded contents of an `RDAT` chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdatData {
    /// Resource table rows.
    pub resources: Vec<ResourceInfo>,
    /// Function table rows.
    pub functions: Vec<FunctionInfo>,
    /// Subobject table rows.
    pub subobjects: Vec<SubobjectInfo>,
}

/// Decodes an `RDAT` chunk payload.
pub fn parse_rdat_chunk(bytes: &[u8]) -> Result<RdatData, DxbcError> {
    let version = read_u32(bytes, 0, "version")?;
    if version != RDAT_VERSION {
        return Err(DxbcError::unsupported_version(format!(
            "RDAT version {version:#x} (expected {RDAT_VERSION:#x})"
        )));
    }
    let part_count = read_u32(bytes, 4, "part_count")?;

    let mut parts = Vec::new();
    for index in 0..part_count as usize {
        let table_pos = 8 + index * 4;
        let offset = read_u32(bytes, table_pos, "part_offset")? as usize;
        let kind = RdatPartKind::from_raw(read_u32(bytes, offset, "part kind")?);
        let size = read_u32(bytes, offset + 4, "part size")? as usize;
        let start = offset + 8;
        let payload = start
            .checked_add(size)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| {
                DxbcError::out_of_bounds(format!(
                    "RDAT part {index} ({kind:?}) at {start}+{size} overruns chunk of {} bytes",
                    bytes.len()
                ))
            })?;
        parts.push((kind, payload));
    }

    // Pass 1: buffers.
    let mut buffers = Buffers {
        strings: StringBuffer::new(false),
        indices: IndexArrays::new(IndexArrayLayout::LengthPrefixed),
        bytes: BytesBuffer::new(),
    };
    for &(kind, payload) in &parts {
        match kind {
            RdatPartKind::StringBuffer => buffers.strings = StringBuffer::from_bytes(payload),
            RdatPartKind::IndexArrays => {
                buffers.indices =
                    IndexArrays::from_bytes(payload, IndexArrayLayout::LengthPrefixed)?
            }
            RdatPartKind::RawBytes => buffers.bytes = BytesBuffer::from_bytes(payload),
            RdatPartKind::ResourceTable
            | RdatPartKind::FunctionTable
            | RdatPartKind::SubobjectTable => {}
            RdatPartKind::Unknown(raw) => {
                tracing::warn!(kind = raw, "skipping unknown RDAT part");
            }
        }
    }

    // Pass 2: tables.
    let mut data = RdatData::default();
    for &(kind, payload) in &parts {
        match kind {
            RdatPartKind::ResourceTable => {
                data.resources = decode_table(payload, &buffers, 0, "resource")?;
            }
            RdatPartKind::FunctionTable => {
                data.functions = decode_table(payload, &buffers, FUNCTION_ROW_V2, "function")?;
            }
            RdatPartKind::SubobjectTable => {
                data.subobjects = decode_table(payload, &buffers, 0, "subobject")?;
            }
            _ => {}
        }
    }
    Ok(data)
}

/// Encodes `data` as an `RDAT` chunk payload.
pub fn write_rdat_chunk(data: &RdatData) -> Result<Vec<u8>, DxbcError> {
    let function_version = function_row_version(&data.functions)?;
    check_subobject_kinds(&data.subobjects)?;

    let mut buffers = Buffers::new(true, IndexArrayLayout::LengthPrefixed);
    for function in &data.functions {
        for dependency in &function.function_dependencies {
            buffers.strings.make_ref(dependency)?;
        }
    }

    let resources = encode_table(&data.resources, 0, &mut buffers)?;
    let functions = encode_table(&data.functions, function_version, &mut buffers)?;
    let subobjects = encode_table(&data.subobjects, 0, &mut buffers)?;

    let mut parts: Vec<(RdatPartKind, Vec<u8>)> = vec![(
        RdatPartKind::StringBuffer,
        buffers.strings.as_bytes().to_vec(),
    )];
    if let Some(table) = resources {
        parts.push((RdatPartKind::ResourceTable, table));
    }
    if let Some(table) = functions {
        parts.push((RdatPartKind::FunctionTable, table));
    }
    if !buffers.indices.is_empty() {
        parts.push((RdatPartKind::IndexArrays, buffers.indices.to_bytes()));
    }
    if !buffers.bytes.as_bytes().is_empty() {
        parts.push((RdatPartKind::RawBytes, buffers.bytes.as_bytes().to_vec()));
    }
    if let Some(table) = subobjects {
        parts.push((RdatPartKind::SubobjectTable, table));
    }

    let mut out = Vec::new();
    out.extend_from_slice(&RDAT_VERSION.to_le_bytes());
    out.extend_from_slice(&len_u32(parts.len(), "part count")?.to_le_bytes());
    let offsets_pos = out.len();
    out.resize(offsets_pos + 4 * parts.len(), 0);

    for (index, (kind, payload)) in parts.iter().enumerate() {
        let offset = len_u32(out.len(), "part offset")?;
        out[offsets_pos + index * 4..offsets_pos + index * 4 + 4]
            .copy_from_slice(&offset.to_le_bytes());

        let aligned = payload.len().next_multiple_of(4);
        out.extend_from_slice(&kind.raw().to_le_bytes());
        out.extend_from_slice(&len_u32(aligned, "part size")?.to_le_bytes());
        out.extend_from_slice(payload);
        out.resize(out.len() + (aligned - payload.len()), 0);
    }
    Ok(out)
}

/// An `Unknown` payload may not claim a kind that has its own variant; it
/// would decode as that variant instead.
fn check_subobject_kinds(subobjects: &[SubobjectInfo]) -> Result<(), DxbcError> {
    for subobject in subobjects {
        if let SubobjectPayload::Unknown { kind, .. } = subobject.payload {
            if !matches!(
                SubobjectPayload::empty_for_kind(kind),
                SubobjectPayload::Unknown { .. }
            ) {
                return Err(DxbcError::invalid_data(format!(
                    "subobject {:?} stores kind {kind} as unknown but the kind has a typed payload",
                    subobject.name
                )));
            }
        }
    }
    Ok(())
}

fn function_row_version(functions: &[FunctionInfo]) -> Result<u32, DxbcError> {
    let extended = functions.iter().filter(|f| f.ext.is_some()).count();
    match extended {
        0 => Ok(FUNCTION_ROW_V1),
        n if n == functions.len() => Ok(FUNCTION_ROW_V2),
        n => Err(DxbcError::invalid_data(format!(
            "{n} of {} functions carry the extended layout; it must be all or none",
            functions.len()
        ))),
    }
}

fn encode_table<R: Row>(
    rows: &[R],
    version: u32,
    buffers: &mut Buffers,
) -> Result<Option<Vec<u8>>, DxbcError> {
    if rows.is_empty() {
        return Ok(None);
    }
    let stride = schema::row_size::<R>(version);
    let mut out = Vec::new();
    out.extend_from_slice(&len_u32(rows.len(), "row count")?.to_le_bytes());
    out.extend_from_slice(&len_u32(stride, "row stride")?.to_le_bytes());
    out.extend(schema::encode_rows(rows, version, buffers)?);
    Ok(Some(out))
}

fn decode_table<R: Row>(
    payload: &[u8],
    buffers: &Buffers,
    max_version: u32,
    what: &'static str,
) -> Result<Vec<R>, DxbcError> {
    let count = read_u32(payload, 0, "table row count")?;
    let stride = read_u32(payload, 4, "table row stride")? as usize;
    let version = schema::version_for_stride::<R>(stride, max_version).ok_or_else(|| {
        DxbcError::malformed_header(format!(
            "{what} table stride {stride} is smaller than the minimum row size {}",
            schema::row_size::<R>(0)
        ))
    })?;
    schema::decode_rows(&payload[8..], count, stride, version, buffers, what)
}

fn read_u32(bytes: &[u8], offset: usize, what: &str) -> Result<u32, DxbcError> {
    let end = offset
        .checked_add(4)
        .ok_or_else(|| DxbcError::malformed_header(format!("{what} offset overflows")))?;
    let slice = bytes.get(offset..end).ok_or_else(|| {
        DxbcError::out_of_bounds(format!(
            "need 4 bytes for {what} at {offset}..{end}, but length is {}",
            bytes.len()
        ))
    })?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn len_u32(len: usize, what: &str) -> Result<u32, DxbcError> {
    u32::try_from(len).map_err(|_| DxbcError::invalid_data(format!("{what} {len} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn part_kinds(bytes: &[u8]) -> Vec<u32> {
        let count = read_u32(bytes, 4, "count").unwrap() as usize;
        (0..count)
            .map(|i| {
                let offset = read_u32(bytes, 8 + i * 4, "offset").unwrap() as usize;
                read_u32(bytes, offset, "kind").unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_data_writes_only_the_string_buffer() {
        let bytes = write_rdat_chunk(&RdatData::default()).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x10, 0, 0, 0, // version
                1, 0, 0, 0, // part count
                12, 0, 0, 0, // part offset
                1, 0, 0, 0, // string buffer
                4, 0, 0, 0, // aligned size
                0, 0, 0, 0, // "" plus padding
            ]
        );
        assert_eq!(parse_rdat_chunk(&bytes).unwrap(), RdatData::default());
    }

    #[test]
    fn parts_are_written_in_canonical_order() {
        let data = RdatData {
            resources: vec![ResourceInfo {
                name: "tex".into(),
                ..Default::default()
            }],
            functions: vec![FunctionInfo {
                name: "main".into(),
                resources: vec![0],
                ..Default::default()
            }],
            subobjects: vec![SubobjectInfo {
                name: "grs".into(),
                payload: SubobjectPayload::GlobalRootSignature {
                    data: vec![1, 2, 3],
                },
            }],
        };
        let bytes = write_rdat_chunk(&data).unwrap();
        assert_eq!(part_kinds(&bytes), vec![1, 3, 4, 2, 5, 6]);
        assert_eq!(parse_rdat_chunk(&bytes).unwrap(), data);
    }

    #[test]
    fn row_strides_match_the_toolchain_layout() {
        assert_eq!(schema::row_size::<ResourceInfo>(0), 32);
        assert_eq!(schema::row_size::<FunctionInfo>(FUNCTION_ROW_V1), 44);
        assert_eq!(schema::row_size::<FunctionInfo>(FUNCTION_ROW_V2), 52);
        assert_eq!(schema::row_size::<SubobjectInfo>(0), 24);
    }

    #[test]
    fn mixed_function_layouts_are_rejected() {
        let data = RdatData {
            functions: vec![
                FunctionInfo {
                    name: "a".into(),
                    ext: Some(FunctionInfo2Ext::default()),
                    ..Default::default()
                },
                FunctionInfo {
                    name: "b".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert!(matches!(
            write_rdat_chunk(&data),
            Err(DxbcError::InvalidData { .. })
        ));
    }

    #[test]
    fn unknown_payloads_may_not_shadow_typed_kinds() {
        let shadowing = RdatData {
            subobjects: vec![SubobjectInfo {
                name: "cfg".into(),
                payload: SubobjectPayload::Unknown {
                    kind: 9,
                    raw: [1, 2, 0, 0],
                },
            }],
            ..Default::default()
        };
        assert!(matches!(
            write_rdat_chunk(&shadowing),
            Err(DxbcError::InvalidData { .. })
        ));

        let unknown = RdatData {
            subobjects: vec![SubobjectInfo {
                name: "future".into(),
                payload: SubobjectPayload::Unknown {
                    kind: 5,
                    raw: [1, 2, 3, 4],
                },
            }],
            ..Default::default()
        };
        let bytes = write_rdat_chunk(&unknown).unwrap();
        assert_eq!(parse_rdat_chunk(&bytes).unwrap(), unknown);
    }

    #[test]
    fn unknown_versions_fail() {
        let mut bytes = write_rdat_chunk(&RdatData::default()).unwrap();
        bytes[0] = 0x11;
        assert!(matches!(
            parse_rdat_chunk(&bytes),
            Err(DxbcError::UnsupportedVersion { .. })
        ));
        assert!(parse_rdat_chunk(&[0x10, 0]).is_err());
    }

    #[test]
    fn overrunning_parts_fail() {
        let mut bytes = write_rdat_chunk(&RdatData::default()).unwrap();
        bytes[16] = 0x40;
        assert!(matches!(
            parse_rdat_chunk(&bytes),
            Err(DxbcError::OutOfBounds { .. })
        ));
    }
}
