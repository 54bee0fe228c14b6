use aero_dxbc::ShaderKind;

use crate::ir::{
    Argument, AttrGroupId, AttributeGroup, Constant, ConstantId, ConstantValue, DebugLocId,
    DebugLocation, Function, FunctionId, GlobalVar, GlobalVarId, Instruction, Metadata,
    MetadataId, Module, NamedMetadata, Operation, Type, TypeId, Value,
};

/// Data layout string the shader toolchain emits for DXIL.
pub const DXIL_DATALAYOUT: &str =
    "e-m:e-p:32:32-i1:32-i8:32-i16:32-i32:32-i64:64-f16:32-f32:32-f64:64-n8:16:32:64";

/// Builds synthetic [`Module`]s for tests.
///
/// Types are interned, constants and metadata are appended, and
/// [`ModuleBuilder::finish`] fills in block predecessors.
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(kind: ShaderKind, major: u32, minor: u32) -> Self {
        let mut module = Module::new(kind, major, minor);
        module.datalayout = DXIL_DATALAYOUT.to_owned();
        module.triple = "dxil-ms-dx".to_owned();
        module.metadata_kinds = ["dbg", "tbaa", "prof", "fpmath", "range", "dx.precise"]
            .into_iter()
            .map(String::from)
            .collect();
        Self { module }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn ty(&mut self, ty: Type) -> TypeId {
        self.module.intern_type(ty)
    }

    pub fn void(&mut self) -> TypeId {
        self.ty(Type::Void)
    }

    pub fn int(&mut self, bits: u32) -> TypeId {
        self.ty(Type::Integer { bits })
    }

    pub fn float(&mut self, bits: u32) -> TypeId {
        self.ty(Type::Float { bits })
    }

    pub fn vector(&mut self, element: TypeId, count: u32) -> TypeId {
        self.ty(Type::Vector { element, count })
    }

    pub fn array(&mut self, element: TypeId, count: u64) -> TypeId {
        self.ty(Type::Array { element, count })
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.ty(Type::Pointer {
            pointee,
            address_space: 0,
        })
    }

    pub fn function_type(&mut self, ret: TypeId, params: Vec<TypeId>) -> TypeId {
        self.ty(Type::Function {
            ret,
            params,
            vararg: false,
        })
    }

    pub fn named_struct(&mut self, name: &str, members: Vec<TypeId>) -> TypeId {
        self.ty(Type::Struct {
            name: Some(name.to_owned()),
            members,
            packed: false,
        })
    }

    pub fn metadata_type(&mut self) -> TypeId {
        self.ty(Type::Metadata)
    }

    pub fn constant(&mut self, ty: TypeId, value: ConstantValue) -> Value {
        self.module.constants.push(Constant { ty, value });
        Value::Constant(ConstantId(self.module.constants.len() as u32 - 1))
    }

    pub fn int_const(&mut self, bits: u32, value: u64) -> Value {
        let ty = self.int(bits);
        self.constant(ty, ConstantValue::Scalar(value))
    }

    pub fn i32(&mut self, value: i32) -> Value {
        self.int_const(32, u64::from(value as u32))
    }

    pub fn f32(&mut self, value: f32) -> Value {
        let ty = self.float(32);
        self.constant(ty, ConstantValue::Scalar(u64::from(value.to_bits())))
    }

    pub fn undef(&mut self, ty: TypeId) -> Value {
        self.constant(ty, ConstantValue::Undef)
    }

    pub fn global(&mut self, name: &str, pointee: TypeId) -> Value {
        let ty = self.pointer(pointee);
        self.module.globals.push(GlobalVar {
            name: name.to_owned(),
            ty,
            is_const: false,
            external: true,
            initializer: None,
            align: Some(4),
            address_space: 0,
            section: None,
        });
        Value::GlobalVar(GlobalVarId(self.module.globals.len() as u32 - 1))
    }

    pub fn metadata(&mut self, node: Metadata) -> MetadataId {
        self.module.metadata.push(node);
        MetadataId(self.module.metadata.len() as u32 - 1)
    }

    pub fn md_node(&mut self, children: Vec<Option<MetadataId>>) -> MetadataId {
        self.metadata(Metadata::node(children))
    }

    /// A node whose children are all present.
    pub fn md_list(&mut self, children: &[MetadataId]) -> MetadataId {
        self.md_node(children.iter().copied().map(Some).collect())
    }

    pub fn md_string(&mut self, s: &str) -> MetadataId {
        self.metadata(Metadata::string(s))
    }

    pub fn md_value(&mut self, value: Value) -> MetadataId {
        self.metadata(Metadata::value(value))
    }

    pub fn md_i32(&mut self, value: i32) -> MetadataId {
        let v = self.i32(value);
        self.md_value(v)
    }

    /// A node of `i32` constants.
    pub fn md_ints(&mut self, values: &[i32]) -> MetadataId {
        let children: Vec<MetadataId> = values.iter().map(|v| self.md_i32(*v)).collect();
        self.md_list(&children)
    }

    pub fn named(&mut self, name: &str, children: Vec<MetadataId>) {
        self.module.named_metadata.push(NamedMetadata {
            name: name.to_owned(),
            children: children.into_iter().map(Some).collect(),
        });
    }

    pub fn debug_location(&mut self, line: u64, column: u64, scope: Option<MetadataId>) -> DebugLocId {
        self.module.debug_locations.push(DebugLocation {
            line,
            column,
            scope,
            inlined_at: None,
        });
        DebugLocId(self.module.debug_locations.len() as u32 - 1)
    }

    pub fn attribute_group(&mut self, group: AttributeGroup) -> AttrGroupId {
        self.module.attribute_groups.push(group);
        AttrGroupId(self.module.attribute_groups.len() as u32 - 1)
    }

    /// An external function, such as a `dx.op` intrinsic.
    pub fn declare(&mut self, name: &str, ret: TypeId, params: Vec<TypeId>) -> FunctionId {
        let ty = self.function_type(ret, params.clone());
        self.push_function(Function {
            name: name.to_owned(),
            ty,
            external: true,
            attrs: None,
            args: params
                .into_iter()
                .map(|ty| Argument { ty, name: None })
                .collect(),
            instructions: Vec::new(),
            blocks: Vec::new(),
        })
    }

    /// A function body with unnamed arguments and blocks.
    pub fn define(
        &mut self,
        name: &str,
        ret: TypeId,
        params: Vec<TypeId>,
        instructions: Vec<Instruction>,
    ) -> FunctionId {
        let ty = self.function_type(ret, params.clone());
        self.push_function(Function {
            name: name.to_owned(),
            ty,
            external: false,
            attrs: None,
            args: params
                .into_iter()
                .map(|ty| Argument { ty, name: None })
                .collect(),
            instructions,
            blocks: Vec::new(),
        })
    }

    fn push_function(&mut self, func: Function) -> FunctionId {
        self.module.functions.push(func);
        FunctionId(self.module.functions.len() as u32 - 1)
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.module.functions[id.index()]
    }

    /// `@name` operand of a function. Interns its pointer type so the value
    /// prints with a type.
    pub fn function_value(&mut self, id: FunctionId) -> Value {
        let ty = self.module.functions[id.index()].ty;
        self.pointer(ty);
        Value::Function(id)
    }

    /// `call ret @callee(args)`.
    pub fn call(&self, callee: FunctionId, args: Vec<Value>) -> Instruction {
        let func = &self.module.functions[callee.index()];
        let ret = match self.module.ty(func.ty) {
            Some(Type::Function { ret, .. }) => Some(*ret),
            _ => None,
        };
        Instruction {
            ty: ret,
            args,
            callee: Some(callee),
            ..Instruction::new(Operation::Call)
        }
    }

    pub fn binop(&self, op: Operation, ty: TypeId, lhs: Value, rhs: Value) -> Instruction {
        Instruction {
            ty: Some(ty),
            args: vec![lhs, rhs],
            ..Instruction::new(op)
        }
    }

    pub fn ret_void(&self) -> Instruction {
        Instruction::new(Operation::Ret)
    }

    /// Computes predecessors and returns the module, unsettled.
    pub fn finish(mut self) -> Module {
        for func in self.module.functions.iter_mut().filter(|f| !f.external) {
            func.compute_predecessors();
        }
        self.module
    }
}

/// Resource and entry point metadata of a small compute shader:
///
/// - `RWStructuredBuffer<Particle> particles : register(u0)` with a 16 byte
///   stride and no type annotation,
/// - `cbuffer Params : register(b0)` holding `float4 gravity; uint count;`,
/// - `[numthreads(8, 4, 1)]` on `main`, which reads `SV_DispatchThreadID.x`.
pub fn sample_compute_module() -> Module {
    let mut b = ModuleBuilder::new(ShaderKind::Compute, 6, 0);
    let void = b.void();
    let i32_ty = b.int(32);
    let f32_ty = b.float(32);
    let float4 = b.vector(f32_ty, 4);

    let particle = b.named_struct("struct.Particle", vec![float4]);
    let particles = b.global("particles", particle);
    let params_ty = b.named_struct("Params", vec![float4, i32_ty]);
    let params = b.global("Params", params_ty);

    let thread_id = b.declare("dx.op.threadId.i32", i32_ty, vec![i32_ty, i32_ty]);
    let opcode = b.i32(93);
    let component = b.i32(0);
    let call = b.call(thread_id, vec![opcode, component]);
    let ret = b.ret_void();
    let main = b.define("main", void, Vec::new(), vec![call, ret]);

    // dx.resources: [SRVs, UAVs, CBuffers, Samplers]
    let uav_var = b.md_value(particles);
    let uav_name = b.md_string("particles");
    let uav_fields: Vec<MetadataId> = [0, 0, 0, 1].iter().map(|v| b.md_i32(*v)).collect();
    let shape = b.md_i32(12);
    let flags: Vec<MetadataId> = [0, 0, 0].iter().map(|v| b.md_i32(*v)).collect();
    let stride_tags = b.md_ints(&[1, 16]);
    let uav = b.md_list(&[
        uav_fields[0],
        uav_var,
        uav_name,
        uav_fields[1],
        uav_fields[2],
        uav_fields[3],
        shape,
        flags[0],
        flags[1],
        flags[2],
        stride_tags,
    ]);
    let uavs = b.md_list(&[uav]);

    let cb_var = b.md_value(params);
    let cb_name = b.md_string("Params");
    let cb_fields: Vec<MetadataId> = [0, 0, 0, 1, 32].iter().map(|v| b.md_i32(*v)).collect();
    let cbuffer = b.md_node(vec![
        Some(cb_fields[0]),
        Some(cb_var),
        Some(cb_name),
        Some(cb_fields[1]),
        Some(cb_fields[2]),
        Some(cb_fields[3]),
        Some(cb_fields[4]),
        None,
    ]);
    let cbuffers = b.md_list(&[cbuffer]);
    let resources = b.md_node(vec![None, Some(uavs), Some(cbuffers), None]);
    b.named("dx.resources", vec![resources]);

    // dx.typeAnnotations for Params only.
    let annotated = b.undef(params_ty);
    let annotated = b.md_value(annotated);
    let gravity_name = b.md_string("gravity");
    let count_name = b.md_string("count");
    let gravity = member_tags(&mut b, gravity_name, 0, 9);
    let count = member_tags(&mut b, count_name, 16, 5);
    let byte_size = b.md_i32(20);
    let members = b.md_list(&[byte_size, gravity, count]);
    let tag = b.md_i32(0);
    let structs = b.md_list(&[tag, annotated, members]);
    b.named("dx.typeAnnotations", vec![structs]);

    let main_ref = b.function_value(main);
    let main_ref = b.md_value(main_ref);
    let entry_name = b.md_string("main");
    let threads = b.md_ints(&[8, 4, 1]);
    let num_threads_tag = b.md_i32(4);
    let properties = b.md_list(&[num_threads_tag, threads]);
    let entry = b.md_node(vec![Some(main_ref), Some(entry_name), None, None, Some(properties)]);
    b.named("dx.entryPoints", vec![entry]);

    let cs = b.md_string("cs");
    let major = b.md_i32(6);
    let minor = b.md_i32(0);
    let model = b.md_list(&[cs, major, minor]);
    b.named("dx.shaderModel", vec![model]);

    b.finish()
}

/// `[FieldName, name, CBufferOffset, offset, CompType, comp]`.
fn member_tags(b: &mut ModuleBuilder, name: MetadataId, offset: i32, comp: i32) -> MetadataId {
    let field_name = b.md_i32(6);
    let offset_tag = b.md_i32(3);
    let offset = b.md_i32(offset);
    let comp_tag = b.md_i32(7);
    let comp = b.md_i32(comp);
    b.md_list(&[field_name, name, offset_tag, offset, comp_tag, comp])
}
