use aero_dxbc::ShaderKind;

use crate::disasm::{self, Dialect, Disassembly};
use crate::error::ReflectionError;
use crate::ir::Module;
use crate::reflect::{self, PrimitiveTopology, ShaderReflection};

/// A shader module together with its cached disassembly.
///
/// The last rendered disassembly is kept until a different dialect is
/// requested.
#[derive(Debug, Clone)]
pub struct Program {
    module: Module,
    rendered: Option<(Dialect, Disassembly)>,
}

impl Program {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            rendered: None,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    pub fn shader_kind(&self) -> ShaderKind {
        self.module.shader_kind
    }

    /// Disassembly text in `dialect`.
    pub fn disassembly(&mut self, dialect: Dialect) -> &str {
        &self.disassembled(dialect).text
    }

    /// Full disassembly in `dialect`, including instruction line numbers.
    pub fn disassembled(&mut self, dialect: Dialect) -> &Disassembly {
        self.module.settle();
        if !matches!(&self.rendered, Some((d, _)) if *d == dialect) {
            tracing::debug!(?dialect, "rendering disassembly");
            self.rendered = None;
        }
        let module = &self.module;
        &self
            .rendered
            .get_or_insert_with(|| (dialect, disasm::render(module, dialect)))
            .1
    }

    pub fn reflection(&self) -> ShaderReflection {
        reflect::extract(&self.module)
    }

    pub fn output_topology(&self) -> PrimitiveTopology {
        reflect::output_topology(&self.module)
    }

    /// See [`reflect::fetch_compute_properties`].
    pub fn fetch_compute_properties(
        &self,
        refl: &mut ShaderReflection,
    ) -> Result<(), ReflectionError> {
        reflect::fetch_compute_properties(&self.module, refl)
    }
}
