use aero_dxbc::rdat::{
    FunctionInfo, FunctionInfo2Ext, HitGroupType, ResourceFlags, ResourceInfo, SubobjectInfo,
    SubobjectPayload,
};
use aero_dxbc::test_utils::{sample_rdat, sample_rdat_v2};
use aero_dxbc::{
    parse_rdat_chunk, write_rdat_chunk, RdatData, ResourceClass, ResourceKind, ShaderKind,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

/// Returns `(kind, payload)` for every part, in file order.
fn parts(bytes: &[u8]) -> Vec<(u32, &[u8])> {
    let count = u32_at(bytes, 4) as usize;
    (0..count)
        .map(|i| {
            let offset = u32_at(bytes, 8 + i * 4) as usize;
            let size = u32_at(bytes, offset + 4) as usize;
            (u32_at(bytes, offset), &bytes[offset + 8..offset + 8 + size])
        })
        .collect()
}

/// Splits the string buffer part into its stored strings.
fn stored_strings(bytes: &[u8]) -> Vec<String> {
    let (_, strings) = parts(bytes)
        .into_iter()
        .find(|(kind, _)| *kind == 1)
        .expect("string buffer part");
    strings[1..]
        .split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8(s.to_vec()).unwrap())
        .collect()
}

// ---- Fixtures --------------------------------------------------------------

#[test]
fn sample_library_round_trips() {
    let data = sample_rdat();
    let bytes = write_rdat_chunk(&data).unwrap();
    assert_eq!(parse_rdat_chunk(&bytes).unwrap(), data);

    // Re-encoding the decoded value reproduces the same bytes.
    let again = write_rdat_chunk(&parse_rdat_chunk(&bytes).unwrap()).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn extended_function_rows_use_the_wider_stride() {
    let data = sample_rdat_v2();
    let bytes = write_rdat_chunk(&data).unwrap();
    let (_, functions) = parts(&bytes)
        .into_iter()
        .find(|(kind, _)| *kind == 4)
        .unwrap();
    assert_eq!(u32_at(functions, 0), 3);
    assert_eq!(u32_at(functions, 4), 52);
    assert_eq!(parse_rdat_chunk(&bytes).unwrap(), data);
}

// ---- Canonical ordering ----------------------------------------------------

#[test]
fn dependency_names_lead_the_string_buffer() {
    let bytes = write_rdat_chunk(&sample_rdat()).unwrap();
    let strings = stored_strings(&bytes);
    assert_eq!(&strings[..3], &["TraceHelper", "Shade", "Sky"]);
    assert_eq!(strings[3], "Scene");
}

#[test]
fn canonical_part_order_is_independent_of_content() {
    let bytes = write_rdat_chunk(&sample_rdat()).unwrap();
    let kinds: Vec<u32> = parts(&bytes).into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![1, 3, 4, 2, 5, 6]);

    let only_subobjects = RdatData {
        subobjects: vec![SubobjectInfo {
            name: "cfg".into(),
            payload: SubobjectPayload::StateObjectConfig { flags: 1 },
        }],
        ..Default::default()
    };
    let bytes = write_rdat_chunk(&only_subobjects).unwrap();
    let kinds: Vec<u32> = parts(&bytes).into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![1, 6]);
}

// ---- Deduplication ---------------------------------------------------------

#[test]
fn identical_resource_names_are_stored_once() {
    let resource = ResourceInfo {
        class: ResourceClass::Srv,
        kind: ResourceKind::Texture2D,
        name: "tex".into(),
        ..Default::default()
    };
    let data = RdatData {
        resources: vec![
            resource.clone(),
            ResourceInfo {
                id: 1,
                lower_bound: 1,
                upper_bound: 1,
                ..resource
            },
        ],
        ..Default::default()
    };
    let bytes = write_rdat_chunk(&data).unwrap();
    assert_eq!(stored_strings(&bytes), vec!["tex".to_string()]);
    assert_eq!(parse_rdat_chunk(&bytes).unwrap(), data);
}

#[test]
fn identical_resource_lists_share_one_index_array() {
    let function = |name: &str| FunctionInfo {
        name: name.into(),
        resources: vec![0, 1],
        ..Default::default()
    };
    let data = RdatData {
        functions: vec![function("a"), function("b")],
        ..Default::default()
    };
    let bytes = write_rdat_chunk(&data).unwrap();
    let (_, indices) = parts(&bytes)
        .into_iter()
        .find(|(kind, _)| *kind == 2)
        .unwrap();
    assert_eq!(indices, &[2, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);
}

#[test]
fn root_signature_blobs_are_deduplicated() {
    let blob = vec![9u8; 12];
    let data = RdatData {
        subobjects: vec![
            SubobjectInfo {
                name: "g".into(),
                payload: SubobjectPayload::GlobalRootSignature { data: blob.clone() },
            },
            SubobjectInfo {
                name: "l".into(),
                payload: SubobjectPayload::LocalRootSignature { data: blob },
            },
        ],
        ..Default::default()
    };
    let bytes = write_rdat_chunk(&data).unwrap();
    let (_, raw) = parts(&bytes)
        .into_iter()
        .find(|(kind, _)| *kind == 5)
        .unwrap();
    assert_eq!(raw.len(), 12);
    assert_eq!(parse_rdat_chunk(&bytes).unwrap(), data);
}

// ---- Properties ------------------------------------------------------------

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_?@][A-Za-z0-9_?@]{0,10}|"
}

fn resource_strategy() -> impl Strategy<Value = ResourceInfo> {
    (
        0u32..6,
        0u32..24,
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        name_strategy(),
        any::<u32>(),
    )
        .prop_map(
            |(class, kind, id, space, lower_bound, upper_bound, name, flags)| ResourceInfo {
                class: ResourceClass::from_raw(class),
                kind: ResourceKind::from_raw(kind),
                id,
                space,
                lower_bound,
                upper_bound,
                name,
                flags: ResourceFlags::from_bits_retain(flags),
            },
        )
}

fn function_strategy(extended: bool) -> impl Strategy<Value = FunctionInfo> {
    (
        (name_strategy(), name_strategy()),
        prop::collection::vec(0u32..8, 0..4),
        prop::collection::vec(name_strategy(), 0..4),
        0u32..20,
        any::<[u32; 6]>(),
        (any::<u8>(), any::<u8>(), any::<u16>(), any::<u32>()),
    )
        .prop_map(
            move |((name, unmangled_name), resources, deps, kind, words, ext)| FunctionInfo {
                name,
                unmangled_name,
                resources,
                function_dependencies: deps,
                shader_kind: ShaderKind::from_raw(kind),
                payload_size_in_bytes: words[0],
                attribute_size_in_bytes: words[1],
                feature_info1: words[2],
                feature_info2: words[3],
                shader_stage_flag: words[4],
                min_shader_target: words[5],
                ext: extended.then_some(FunctionInfo2Ext {
                    min_expected_wave_lane_count: ext.0,
                    max_expected_wave_lane_count: ext.1,
                    shader_flags: ext.2,
                    shader_info: ext.3,
                }),
            },
        )
}

fn payload_strategy() -> impl Strategy<Value = SubobjectPayload> {
    prop_oneof![
        any::<u32>().prop_map(|flags| SubobjectPayload::StateObjectConfig { flags }),
        prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(|data| SubobjectPayload::GlobalRootSignature { data }),
        prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(|data| SubobjectPayload::LocalRootSignature { data }),
        (name_strategy(), prop::collection::vec(name_strategy(), 0..3)).prop_map(
            |(subobject, exports)| SubobjectPayload::SubobjectToExportsAssociation {
                subobject,
                exports
            }
        ),
        (any::<u32>(), any::<u32>()).prop_map(|(p, a)| {
            SubobjectPayload::RaytracingShaderConfig {
                max_payload_size_in_bytes: p,
                max_attribute_size_in_bytes: a,
            }
        }),
        any::<u32>().prop_map(|d| SubobjectPayload::RaytracingPipelineConfig {
            max_trace_recursion_depth: d
        }),
        (0u32..4, name_strategy(), name_strategy(), name_strategy()).prop_map(
            |(t, any_hit, closest_hit, intersection)| SubobjectPayload::HitGroup {
                hit_group_type: HitGroupType::from_raw(t),
                any_hit,
                closest_hit,
                intersection,
            }
        ),
        (any::<u32>(), any::<u32>()).prop_map(|(d, flags)| {
            SubobjectPayload::RaytracingPipelineConfig1 {
                max_trace_recursion_depth: d,
                flags,
            }
        }),
        (prop_oneof![3u32..8, 13u32..64], any::<[u32; 4]>())
            .prop_map(|(kind, raw)| SubobjectPayload::Unknown { kind, raw }),
    ]
}

fn rdat_strategy() -> impl Strategy<Value = RdatData> {
    any::<bool>().prop_flat_map(|extended| {
        (
            prop::collection::vec(resource_strategy(), 0..4),
            prop::collection::vec(function_strategy(extended), 0..4),
            prop::collection::vec(
                (name_strategy(), payload_strategy())
                    .prop_map(|(name, payload)| SubobjectInfo { name, payload }),
                0..4,
            ),
        )
            .prop_map(|(resources, functions, subobjects)| RdatData {
                resources,
                functions,
                subobjects,
            })
    })
}

proptest! {
    #[test]
    fn rdat_round_trips(data in rdat_strategy()) {
        let bytes = write_rdat_chunk(&data).unwrap();
        prop_assert_eq!(bytes.len() % 4, 0);
        prop_assert_eq!(parse_rdat_chunk(&bytes).unwrap(), data);
    }

    #[test]
    fn rdat_decoding_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_rdat_chunk(&bytes);
    }
}
