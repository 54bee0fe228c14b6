use aero_dxbc::{ComponentType, InterpolationMode, ResourceKind, SemanticKind, ShaderKind};
use aero_dxil::ir::{MetadataId, Module};
use aero_dxil::reflect::{BindType, Dimension, ReturnType, VarClass, VarType};
use aero_dxil::test_utils::{sample_compute_module, ModuleBuilder};
use aero_dxil::{PrimitiveTopology, Program, ReflectionError};
use pretty_assertions::assert_eq;

#[test]
fn structured_buffer_without_annotation_falls_back_to_bytes() {
    let program = Program::new(sample_compute_module());
    let refl = program.reflection();

    assert_eq!(refl.uavs.len(), 1);
    let uav = &refl.uavs[0];
    assert_eq!(uav.name, "particles");
    assert_eq!(uav.bind_type, BindType::UavRwStructured);
    assert_eq!(uav.dimension, Dimension::Buffer);
    assert_eq!(uav.return_type, ReturnType::Mixed);
    assert_eq!(uav.kind, Some(ResourceKind::StructuredBuffer));
    assert_eq!(uav.struct_stride, Some(16));
    assert_eq!((uav.space, uav.register, uav.bind_count), (0, 0, 1));

    let layout = refl.resource_layout("particles").unwrap();
    assert_eq!(layout.bytesize, 16);
    assert_eq!(layout.members.len(), 1);
    let bytes = &layout.members[0];
    assert_eq!(bytes.name, "bytes");
    assert_eq!(bytes.ty.class, VarClass::Scalar);
    assert_eq!(bytes.ty.ty, VarType::UByte);
    assert_eq!(bytes.ty.elements, 16);
    assert_eq!(bytes.ty.bytesize, 16);
}

#[test]
fn cbuffer_variables_follow_type_annotations() {
    let refl = Program::new(sample_compute_module()).reflection();

    assert_eq!(refl.cbuffers.len(), 1);
    let cb = &refl.cbuffers[0];
    assert_eq!(cb.name, "Params");
    assert_eq!(cb.byte_size, 32);
    assert_eq!(cb.variables.len(), 2);

    let gravity = &cb.variables[0];
    assert_eq!(gravity.name, "gravity");
    assert_eq!(gravity.offset, 0);
    assert_eq!(gravity.ty.ty, VarType::Float);
    assert_eq!((gravity.ty.rows, gravity.ty.cols), (1, 4));
    assert_eq!(gravity.ty.bytesize, 16);

    let count = &cb.variables[1];
    assert_eq!(count.name, "count");
    assert_eq!(count.offset, 16);
    assert_eq!(count.ty.ty, VarType::UInt);
    assert_eq!(count.ty.bytesize, 4);
}

#[test]
fn entry_point_and_shader_model() {
    let refl = Program::new(sample_compute_module()).reflection();
    assert_eq!(refl.entry_name, "main");
    assert_eq!(refl.shader_model, "cs_6_0");
    assert_eq!(refl.dispatch_threads_dimension, [1, 1, 1]);
}

#[test]
fn compute_properties_read_thread_dimensions_and_builtins() {
    let program = Program::new(sample_compute_module());
    let mut refl = program.reflection();
    program.fetch_compute_properties(&mut refl).unwrap();

    assert_eq!(refl.dispatch_threads_dimension, [8, 4, 1]);
    assert_eq!(refl.input_signature.len(), 1);
    let builtin = &refl.input_signature[0];
    assert_eq!(builtin.semantic_name, "SV_DispatchThreadID");
    assert_eq!(builtin.system_value, SemanticKind::DispatchThreadId);
    assert_eq!(builtin.cols, 3);
    assert_eq!(builtin.register_mask, 0x7);
}

#[test]
fn missing_thread_dimensions_default_to_one() {
    let mut b = ModuleBuilder::new(ShaderKind::Compute, 6, 0);
    let void = b.void();
    let i32_ty = b.int(32);
    b.declare("dx.op.flattenedThreadIdInGroup.i32", i32_ty, vec![i32_ty]);
    let ret = b.ret_void();
    let main = b.define("main", void, Vec::new(), vec![ret]);
    let main = b.function_value(main);
    let main = b.md_value(main);
    let name = b.md_string("main");
    let entry = b.md_node(vec![Some(main), Some(name), None, None, None]);
    b.named("dx.entryPoints", vec![entry]);

    let program = Program::new(b.finish());
    let mut refl = program.reflection();
    refl.dispatch_threads_dimension = [0, 0, 0];
    let err = program.fetch_compute_properties(&mut refl).unwrap_err();

    assert_eq!(
        err,
        ReflectionError::MissingThreadDimensions {
            entry: "main".into()
        }
    );
    assert_eq!(refl.dispatch_threads_dimension, [1, 1, 1]);
    assert_eq!(refl.input_signature[0].semantic_name, "SV_GroupIndex");
    assert_eq!(refl.input_signature[0].register_mask, 0x1);
}

#[test]
fn missing_entry_point_is_reported() {
    let program = Program::new(ModuleBuilder::new(ShaderKind::Compute, 6, 0).finish());
    let mut refl = program.reflection();
    assert_eq!(
        program.fetch_compute_properties(&mut refl),
        Err(ReflectionError::MissingEntryPoint)
    );
    assert_eq!(refl.dispatch_threads_dimension, [1, 1, 1]);
}

/// Entry point `main` with a property list `[tag, state]`.
fn stage_module(kind: ShaderKind, tag: i32, state: &[i32]) -> Module {
    let mut b = ModuleBuilder::new(kind, 6, 0);
    let name = b.md_string("main");
    let tag = b.md_i32(tag);
    let state = b.md_ints(state);
    let properties = b.md_list(&[tag, state]);
    let entry = b.md_node(vec![None, Some(name), None, None, Some(properties)]);
    b.named("dx.entryPoints", vec![entry]);
    b.finish()
}

#[test]
fn output_topology_per_stage() {
    // [inputPrimitive, maxVertexCount, streamMask, outputTopology, instanceCount]
    let gs = Program::new(stage_module(ShaderKind::Geometry, 1, &[3, 6, 1, 5, 1]));
    assert_eq!(gs.output_topology(), PrimitiveTopology::TriangleStrip);

    let gs = Program::new(stage_module(ShaderKind::Geometry, 1, &[1, 1, 1, 1, 1]));
    assert_eq!(gs.output_topology(), PrimitiveTopology::PointList);

    // [domain, inputControlPointCount]
    let isolines = Program::new(stage_module(ShaderKind::Domain, 2, &[1, 4]));
    assert_eq!(isolines.output_topology(), PrimitiveTopology::LineList);
    let quads = Program::new(stage_module(ShaderKind::Domain, 2, &[3, 4]));
    assert_eq!(quads.output_topology(), PrimitiveTopology::TriangleList);

    let missing = Program::new(stage_module(ShaderKind::Geometry, 4, &[8, 8, 1]));
    assert_eq!(missing.output_topology(), PrimitiveTopology::TriangleList);

    let ps = Program::new(stage_module(ShaderKind::Pixel, 0, &[0]));
    assert_eq!(ps.output_topology(), PrimitiveTopology::TriangleList);
}

fn signature_element(b: &mut ModuleBuilder, semantic: &str, fields: [i32; 8], indices: &[i32]) -> MetadataId {
    let id = b.md_i32(fields[0]);
    let semantic = b.md_string(semantic);
    let comp = b.md_i32(fields[1]);
    let kind = b.md_i32(fields[2]);
    let indices = b.md_ints(indices);
    let interp = b.md_i32(fields[3]);
    let rest: Vec<MetadataId> = fields[4..].iter().map(|v| b.md_i32(*v)).collect();
    let usage = b.md_ints(&[3, 0b11]);
    b.md_list(&[
        id, semantic, comp, kind, indices, interp, rest[0], rest[1], rest[2], rest[3], usage,
    ])
}

#[test]
fn signatures_resources_and_source_info() {
    let mut b = ModuleBuilder::new(ShaderKind::Pixel, 6, 0);
    let f32_ty = b.float(32);
    let float4 = b.vector(f32_ty, 4);
    let i32_ty = b.int(32);

    // float2 TEXCOORD0 in v0.zw; [id, comp, kind, interp, rows, cols, startRow, startCol]
    let texcoord = signature_element(&mut b, "TEXCOORD", [0, 9, 0, 2, 1, 2, 0, 2], &[0]);
    let target = signature_element(&mut b, "SV_Target", [0, 9, 16, 0, 1, 4, 0, 0], &[0]);
    let inputs = b.md_list(&[texcoord]);
    let outputs = b.md_list(&[target]);
    let sigs = b.md_node(vec![Some(inputs), Some(outputs), None]);
    let name = b.md_string("PSMain");
    let flags_tag = b.md_i32(0);
    let flags = b.int_const(64, 0x10);
    let flags = b.md_value(flags);
    let properties = b.md_list(&[flags_tag, flags]);
    let entry = b.md_node(vec![None, Some(name), Some(sigs), None, Some(properties)]);
    b.named("dx.entryPoints", vec![entry]);

    // Texture2D<float4> tex : register(t3, space1), with a uint element type override.
    let tex_struct = b.named_struct("class.Texture2D<vector<float, 4> >", vec![float4, i32_ty]);
    let tex = b.global("tex", tex_struct);
    let tex = b.md_value(tex);
    let tex_name = b.md_string("tex");
    let fields: Vec<MetadataId> = [0, 1, 3, 1, 2, 0].iter().map(|v| b.md_i32(*v)).collect();
    let element_type = b.md_ints(&[0, 5]);
    let srv = b.md_list(&[
        fields[0], tex, tex_name, fields[1], fields[2], fields[3], fields[4], fields[5],
        element_type,
    ]);
    let srvs = b.md_list(&[srv]);

    let sampler_ty = b.named_struct("struct.SamplerComparisonState", vec![i32_ty]);
    let samp = b.global("shadow", sampler_ty);
    let samp = b.md_value(samp);
    let samp_name = b.md_string("shadow");
    let samp_fields: Vec<MetadataId> = [0, 0, 2, 1, 1].iter().map(|v| b.md_i32(*v)).collect();
    let sampler = b.md_node(vec![
        Some(samp_fields[0]),
        Some(samp),
        Some(samp_name),
        Some(samp_fields[1]),
        Some(samp_fields[2]),
        Some(samp_fields[3]),
        Some(samp_fields[4]),
        None,
    ]);
    let samplers = b.md_list(&[sampler]);
    let resources = b.md_node(vec![Some(srvs), None, None, Some(samplers)]);
    b.named("dx.resources", vec![resources]);

    let ident = b.md_string("dxcoob 1.7");
    let ident = b.md_list(&[ident]);
    b.named("llvm.ident", vec![ident]);
    let valver = b.md_ints(&[1, 7]);
    b.named("dx.valver", vec![valver]);

    let inc = b.md_string("common.hlsli");
    let inc_body = b.md_string("float4 f();");
    let main_file = b.md_string("shader.hlsl");
    let main_body = b.md_string("#include \"common.hlsli\"");
    let inc = b.md_list(&[inc, inc_body]);
    let main = b.md_list(&[main_file, main_body]);
    b.named("dx.source.contents", vec![inc, main]);
    let main_name = b.md_string("shader.hlsl");
    let main_name = b.md_list(&[main_name]);
    b.named("dx.source.mainFileName", vec![main_name]);
    let define = b.md_string("FAST=1");
    let defines = b.md_list(&[define]);
    b.named("dx.source.defines", vec![defines]);
    let args: Vec<MetadataId> = ["-E", "PSMain", "-T", "ps_6_0"]
        .iter()
        .map(|a| b.md_string(a))
        .collect();
    let args = b.md_list(&args);
    b.named("dx.source.args", vec![args]);

    let refl = Program::new(b.finish()).reflection();

    assert_eq!(refl.entry_name, "PSMain");
    assert_eq!(refl.shader_flags, 0x10);
    assert_eq!(refl.compiler_identity, "dxcoob 1.7");
    assert_eq!(refl.validator_version, Some((1, 7)));
    assert_eq!(refl.dxil_version, None);
    assert_eq!(refl.compile_flags, "-E PSMain -T ps_6_0");
    assert_eq!(refl.defines, vec!["FAST=1".to_owned()]);
    assert_eq!(refl.source_files[0].name, "shader.hlsl");
    assert_eq!(refl.source_files[1].name, "common.hlsli");

    let texcoord = &refl.input_signature[0];
    assert_eq!(texcoord.semantic_name, "TEXCOORD");
    assert_eq!(texcoord.semantic_indices, vec![0]);
    assert_eq!(texcoord.component_type, ComponentType::F32);
    assert_eq!(texcoord.interpolation, InterpolationMode::Linear);
    assert_eq!(texcoord.register_mask, 0b1100);
    assert_eq!(texcoord.used_mask, 0b1100);
    assert_eq!(refl.output_signature[0].system_value, SemanticKind::Target);
    assert_eq!(refl.output_signature[0].register_mask, 0b1111);

    let srv = &refl.srvs[0];
    assert_eq!(srv.name, "tex");
    assert_eq!((srv.space, srv.register, srv.bind_count), (1, 3, 1));
    assert_eq!(srv.bind_type, BindType::Texture);
    assert_eq!(srv.dimension, Dimension::Texture2D);
    assert_eq!(srv.component_count, 4);
    assert_eq!(srv.return_type, ReturnType::UInt);

    let sampler = &refl.samplers[0];
    assert_eq!(sampler.name, "shadow");
    assert_eq!(sampler.kind, Some(ResourceKind::SamplerComparison));
    assert_eq!(sampler.bind_type, BindType::Sampler);
    assert_eq!(sampler.register, 2);
    assert_eq!(sampler.component_count, 0);
    assert!(refl.uavs.is_empty());
    assert!(refl.cbuffers.is_empty());
}
