use crate::psv::{
    PsvResourceBind, PsvResourceFlags, PsvResourceType, PsvSignatureElement, PsvStageInfo,
    SigComponentType,
};
use crate::rdat::{
    FunctionInfo, FunctionInfo2Ext, HitGroupType, ResourceFlags, ResourceInfo, SubobjectInfo,
    SubobjectPayload,
};
use crate::{
    InterpolationMode, PsvData, PsvVersion, RdatData, ResourceClass, ResourceKind, SemanticKind,
    ShaderKind,
};

/// A small raytracing library: two resources, three functions sharing
/// dependencies and a handful of subobjects.
pub fn sample_rdat() -> RdatData {
    RdatData {
        resources: vec![
            ResourceInfo {
                class: ResourceClass::Srv,
                kind: ResourceKind::RtAccelerationStructure,
                id: 0,
                space: 0,
                lower_bound: 0,
                upper_bound: 0,
                name: "Scene".into(),
                flags: ResourceFlags::empty(),
            },
            ResourceInfo {
                class: ResourceClass::Uav,
                kind: ResourceKind::Texture2D,
                id: 0,
                space: 0,
                lower_bound: 0,
                upper_bound: 0,
                name: "Output".into(),
                flags: ResourceFlags::GLOBALLY_COHERENT,
            },
        ],
        functions: vec![
            FunctionInfo {
                name: "\u{1}?RayGen@@YAXXZ".into(),
                unmangled_name: "RayGen".into(),
                resources: vec![0, 1],
                function_dependencies: vec!["TraceHelper".into(), "Shade".into()],
                shader_kind: ShaderKind::RayGeneration,
                shader_stage_flag: 1 << 7,
                min_shader_target: (7 << 16) | (6 << 4) | 3,
                ..Default::default()
            },
            FunctionInfo {
                name: "\u{1}?Miss@@YAXUPayload@@@Z".into(),
                unmangled_name: "Miss".into(),
                function_dependencies: vec!["Shade".into(), "Sky".into()],
                shader_kind: ShaderKind::Miss,
                payload_size_in_bytes: 16,
                shader_stage_flag: 1 << 11,
                min_shader_target: (11 << 16) | (6 << 4) | 3,
                ..Default::default()
            },
            FunctionInfo {
                name: "\u{1}?Hit@@YAXUPayload@@UAttribs@@@Z".into(),
                unmangled_name: "Hit".into(),
                resources: vec![1],
                shader_kind: ShaderKind::ClosestHit,
                payload_size_in_bytes: 16,
                attribute_size_in_bytes: 8,
                shader_stage_flag: 1 << 10,
                min_shader_target: (10 << 16) | (6 << 4) | 3,
                ..Default::default()
            },
        ],
        subobjects: vec![
            SubobjectInfo {
                name: "Config".into(),
                payload: SubobjectPayload::RaytracingShaderConfig {
                    max_payload_size_in_bytes: 16,
                    max_attribute_size_in_bytes: 8,
                },
            },
            SubobjectInfo {
                name: "HitGroup".into(),
                payload: SubobjectPayload::HitGroup {
                    hit_group_type: HitGroupType::Triangle,
                    any_hit: String::new(),
                    closest_hit: "Hit".into(),
                    intersection: String::new(),
                },
            },
            SubobjectInfo {
                name: "Global".into(),
                payload: SubobjectPayload::GlobalRootSignature {
                    data: vec![2, 0, 0, 0, 1, 0, 0, 0],
                },
            },
            SubobjectInfo {
                name: "Assoc".into(),
                payload: SubobjectPayload::SubobjectToExportsAssociation {
                    subobject: "Config".into(),
                    exports: vec!["RayGen".into(), "Miss".into()],
                },
            },
        ],
    }
}

/// Same as [`sample_rdat`], with every function using the extended row layout.
pub fn sample_rdat_v2() -> RdatData {
    let mut data = sample_rdat();
    for (i, function) in data.functions.iter_mut().enumerate() {
        function.ext = Some(FunctionInfo2Ext {
            min_expected_wave_lane_count: 0,
            max_expected_wave_lane_count: 0,
            shader_flags: i as u16,
            shader_info: u32::MAX,
        });
    }
    data
}

/// A vertex shader validation chunk at `version` with two inputs and one output.
pub fn sample_psv(version: PsvVersion) -> PsvData {
    let mut data = PsvData {
        version,
        min_expected_wave_lane_count: 0,
        max_expected_wave_lane_count: u32::MAX,
        resources: vec![PsvResourceBind {
            res_type: PsvResourceType::Cbv,
            space: 0,
            lower_bound: 0,
            upper_bound: 0,
            ..Default::default()
        }],
        ..Default::default()
    };
    if version >= PsvVersion::V2 {
        data.resources[0].res_kind = ResourceKind::CBuffer;
        data.resources[0].res_flags = PsvResourceFlags::empty();
    }
    if version < PsvVersion::V1 {
        data.set_stage_info(PsvStageInfo::Vertex {
            output_position_present: true,
        });
        return data;
    }

    data.shader_stage = ShaderKind::Vertex;
    data.set_stage_info(PsvStageInfo::Vertex {
        output_position_present: true,
    });
    data.sig_input_vectors = 2;
    data.sig_output_vectors = [1, 0, 0, 0];
    data.input_elements = vec![
        element("POSITION", &[0], 0, 3, SigComponentType::Float32),
        element("TEXCOORD", &[0], 1, 2, SigComponentType::Float32),
    ];
    data.output_elements = vec![PsvSignatureElement {
        semantic_kind: SemanticKind::Position,
        interpolation_mode: InterpolationMode::LinearNoPerspective,
        ..element("SV_Position", &[0], 0, 4, SigComponentType::Float32)
    }];
    data.input_to_output_tables[0] = vec![0xF, 0xF, 0xF, 0, 0xF, 0xF, 0, 0];
    if version >= PsvVersion::V2 {
        data.num_threads = [0, 0, 0];
    }
    if version >= PsvVersion::V3 {
        data.entry_function_name = "main".into();
    }
    data
}

fn element(
    name: &str,
    indexes: &[u32],
    start_row: u8,
    cols: u8,
    component_type: SigComponentType,
) -> PsvSignatureElement {
    PsvSignatureElement {
        semantic_name: name.into(),
        semantic_indexes: indexes.to_vec(),
        start_row,
        cols,
        start_col: 0,
        allocated: true,
        semantic_kind: SemanticKind::Arbitrary,
        component_type,
        interpolation_mode: InterpolationMode::Undefined,
        dynamic_mask: 0,
        output_stream: 0,
    }
}
