//! Enumerations shared by the RDAT and PSV chunks and by DXIL reflection.

raw_enum! {
    /// Shader stage or library kind (`DXIL::ShaderKind`).
    pub enum ShaderKind: u32 {
        /// Pixel shader.
        Pixel = 0,
        /// Vertex shader.
        Vertex = 1,
        /// Geometry shader.
        Geometry = 2,
        /// Hull shader.
        Hull = 3,
        /// Domain shader.
        Domain = 4,
        /// Compute shader.
        Compute = 5,
        /// Shader library.
        Library = 6,
        /// Ray generation shader.
        RayGeneration = 7,
        /// Intersection shader.
        Intersection = 8,
        /// Any-hit shader.
        AnyHit = 9,
        /// Closest-hit shader.
        ClosestHit = 10,
        /// Miss shader.
        Miss = 11,
        /// Callable shader.
        Callable = 12,
        /// Mesh shader.
        Mesh = 13,
        /// Amplification shader.
        Amplification = 14,
        /// Work graph node shader.
        Node = 15,
        /// Explicitly invalid kind.
        Invalid = 16,
    }
}

impl ShaderKind {
    /// Parses the shader model prefix used in `dx.shaderModel` (`"ps"`, `"cs"`, ...).
    pub fn from_model_prefix(prefix: &str) -> Self {
        match prefix {
            "ps" => Self::Pixel,
            "vs" => Self::Vertex,
            "gs" => Self::Geometry,
            "hs" => Self::Hull,
            "ds" => Self::Domain,
            "cs" => Self::Compute,
            "lib" => Self::Library,
            "ms" => Self::Mesh,
            "as" => Self::Amplification,
            _ => Self::Invalid,
        }
    }

    /// Human readable stage name, as printed in disassembly headers.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pixel => "Pixel",
            Self::Vertex => "Vertex",
            Self::Geometry => "Geometry",
            Self::Hull => "Hull",
            Self::Domain => "Domain",
            Self::Compute => "Compute",
            Self::Library => "Library",
            Self::RayGeneration => "RayGeneration",
            Self::Intersection => "Intersection",
            Self::AnyHit => "AnyHit",
            Self::ClosestHit => "ClosestHit",
            Self::Miss => "Miss",
            Self::Callable => "Callable",
            Self::Mesh => "Mesh",
            Self::Amplification => "Amplification",
            Self::Node => "Node",
            Self::Invalid | Self::Unknown(_) => "Unknown",
        }
    }
}

raw_enum! {
    /// Resource class (`DXIL::ResourceClass`).
    pub enum ResourceClass: u32 {
        /// Shader resource view.
        Srv = 0,
        /// Unordered access view.
        Uav = 1,
        /// Constant buffer.
        CBuffer = 2,
        /// Sampler.
        Sampler = 3,
        /// Explicitly invalid class.
        Invalid = 4,
    }
}

raw_enum! {
    /// Resource shape (`DXIL::ResourceKind`).
    pub enum ResourceKind: u32 {
        /// No shape.
        Invalid = 0,
        /// `Texture1D`.
        Texture1D = 1,
        /// `Texture2D`.
        Texture2D = 2,
        /// `Texture2DMS`.
        Texture2DMS = 3,
        /// `Texture3D`.
        Texture3D = 4,
        /// `TextureCube`.
        TextureCube = 5,
        /// `Texture1DArray`.
        Texture1DArray = 6,
        /// `Texture2DArray`.
        Texture2DArray = 7,
        /// `Texture2DMSArray`.
        Texture2DMSArray = 8,
        /// `TextureCubeArray`.
        TextureCubeArray = 9,
        /// Typed buffer (`Buffer<T>`).
        TypedBuffer = 10,
        /// Raw buffer (`ByteAddressBuffer`).
        RawBuffer = 11,
        /// Structured buffer.
        StructuredBuffer = 12,
        /// Constant buffer.
        CBuffer = 13,
        /// Sampler state.
        Sampler = 14,
        /// Texture buffer.
        TBuffer = 15,
        /// Raytracing acceleration structure.
        RtAccelerationStructure = 16,
        /// Sampler feedback texture.
        FeedbackTexture2D = 17,
        /// Sampler feedback texture array.
        FeedbackTexture2DArray = 18,
        /// Structured buffer with a hidden counter.
        StructuredBufferWithCounter = 19,
        /// Comparison sampler.
        SamplerComparison = 20,
    }
}

impl ResourceKind {
    /// Returns true for every texture shape, including feedback textures.
    pub fn is_texture(self) -> bool {
        matches!(
            self,
            Self::Texture1D
                | Self::Texture2D
                | Self::Texture2DMS
                | Self::Texture3D
                | Self::TextureCube
                | Self::Texture1DArray
                | Self::Texture2DArray
                | Self::Texture2DMSArray
                | Self::TextureCubeArray
                | Self::FeedbackTexture2D
                | Self::FeedbackTexture2DArray
        )
    }
}

raw_enum! {
    /// Scalar component type (`DXIL::ComponentType`).
    pub enum ComponentType: u32 {
        /// No type.
        Invalid = 0,
        /// `bool`.
        I1 = 1,
        /// `int16_t`.
        I16 = 2,
        /// `uint16_t`.
        U16 = 3,
        /// `int`.
        I32 = 4,
        /// `uint`.
        U32 = 5,
        /// `int64_t`.
        I64 = 6,
        /// `uint64_t`.
        U64 = 7,
        /// `half`.
        F16 = 8,
        /// `float`.
        F32 = 9,
        /// `double`.
        F64 = 10,
        /// `snorm half`.
        SNormF16 = 11,
        /// `unorm half`.
        UNormF16 = 12,
        /// `snorm float`.
        SNormF32 = 13,
        /// `unorm float`.
        UNormF32 = 14,
        /// `snorm double`.
        SNormF64 = 15,
        /// `unorm double`.
        UNormF64 = 16,
        /// Packed signed 8-bit quad.
        PackedS8x32 = 17,
        /// Packed unsigned 8-bit quad.
        PackedU8x32 = 18,
    }
}

impl ComponentType {
    /// HLSL spelling of the scalar type, used when describing resources.
    pub fn hlsl_name(self) -> &'static str {
        match self {
            Self::I1 => "bool",
            Self::I16 => "int16_t",
            Self::U16 => "uint16_t",
            Self::I32 => "int",
            Self::U32 => "uint",
            Self::I64 => "int64_t",
            Self::U64 => "uint64_t",
            Self::F16 => "half",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::SNormF16 => "snorm half",
            Self::UNormF16 => "unorm half",
            Self::SNormF32 => "snorm float",
            Self::UNormF32 => "unorm float",
            Self::SNormF64 => "snorm double",
            Self::UNormF64 => "unorm double",
            Self::PackedS8x32 => "int8_t4_packed",
            Self::PackedU8x32 => "uint8_t4_packed",
            Self::Invalid | Self::Unknown(_) => "unknown",
        }
    }
}

raw_enum! {
    /// System-value semantic kind of a signature element (`DXIL::SemanticKind`).
    pub enum SemanticKind: u8 {
        /// User semantic.
        Arbitrary = 0,
        /// `SV_VertexID`.
        VertexId = 1,
        /// `SV_InstanceID`.
        InstanceId = 2,
        /// `SV_Position`.
        Position = 3,
        /// `SV_RenderTargetArrayIndex`.
        RenderTargetArrayIndex = 4,
        /// `SV_ViewportArrayIndex`.
        ViewportArrayIndex = 5,
        /// `SV_ClipDistance`.
        ClipDistance = 6,
        /// `SV_CullDistance`.
        CullDistance = 7,
        /// `SV_OutputControlPointID`.
        OutputControlPointId = 8,
        /// `SV_DomainLocation`.
        DomainLocation = 9,
        /// `SV_PrimitiveID`.
        PrimitiveId = 10,
        /// `SV_GSInstanceID`.
        GsInstanceId = 11,
        /// `SV_SampleIndex`.
        SampleIndex = 12,
        /// `SV_IsFrontFace`.
        IsFrontFace = 13,
        /// `SV_Coverage`.
        Coverage = 14,
        /// `SV_InnerCoverage`.
        InnerCoverage = 15,
        /// `SV_Target`.
        Target = 16,
        /// `SV_Depth`.
        Depth = 17,
        /// `SV_DepthLessEqual`.
        DepthLessEqual = 18,
        /// `SV_DepthGreaterEqual`.
        DepthGreaterEqual = 19,
        /// `SV_StencilRef`.
        StencilRef = 20,
        /// `SV_DispatchThreadID`.
        DispatchThreadId = 21,
        /// `SV_GroupID`.
        GroupId = 22,
        /// `SV_GroupIndex`.
        GroupIndex = 23,
        /// `SV_GroupThreadID`.
        GroupThreadId = 24,
        /// `SV_TessFactor`.
        TessFactor = 25,
        /// `SV_InsideTessFactor`.
        InsideTessFactor = 26,
        /// `SV_ViewID`.
        ViewId = 27,
        /// `SV_Barycentrics`.
        Barycentrics = 28,
        /// `SV_ShadingRate`.
        ShadingRate = 29,
        /// `SV_CullPrimitive`.
        CullPrimitive = 30,
        /// Explicitly invalid kind.
        Invalid = 31,
    }
}

raw_enum! {
    /// Interpolation mode of a signature element (`DXIL::InterpolationMode`).
    pub enum InterpolationMode: u8 {
        /// Not specified.
        Undefined = 0,
        /// `nointerpolation`.
        Constant = 1,
        /// `linear`.
        Linear = 2,
        /// `linear centroid`.
        LinearCentroid = 3,
        /// `noperspective`.
        LinearNoPerspective = 4,
        /// `noperspective centroid`.
        LinearNoPerspectiveCentroid = 5,
        /// `sample`.
        LinearSample = 6,
        /// `noperspective sample`.
        LinearNoPerspectiveSample = 7,
        /// Explicitly invalid mode.
        Invalid = 8,
    }
}
