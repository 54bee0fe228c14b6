//! Higher-level spelling of common `dx.op` intrinsics for the readable dialect.

use aero_dxbc::{ComponentType, ResourceKind};

use crate::ir::{ConstantValue, Instruction, Value};

use super::format::{Printer, Scope};

fn is_intrinsic(name: &str, base: &str) -> bool {
    name == base
        || name
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('.'))
}

fn component(printer: &Printer<'_>, scope: Scope<'_>, value: Option<&Value>) -> String {
    let Some(value) = value else {
        return "???".to_owned();
    };
    match printer.module.constant_int(*value) {
        Some(c @ 0..=3) => ["x", "y", "z", "w"][c as usize].to_owned(),
        _ => format!("[{}]", printer.value(Some(scope), *value)),
    }
}

fn index(printer: &Printer<'_>, scope: Scope<'_>, value: Option<&Value>) -> String {
    match value {
        Some(v) => match printer.module.constant_int(*v) {
            Some(c) => c.to_string(),
            None => printer.value(Some(scope), *v),
        },
        None => "???".to_owned(),
    }
}

/// `[sig]` or `[sig][row]`; row 0 is implied.
fn element(printer: &Printer<'_>, scope: Scope<'_>, sig: Option<&Value>, row: Option<&Value>) -> String {
    let sig = index(printer, scope, sig);
    let row_is_zero = row.and_then(|r| printer.module.constant_int(*r)) == Some(0);
    if row_is_zero {
        format!("[{sig}]")
    } else {
        format!("[{sig}][{}]", index(printer, scope, row))
    }
}

/// Two words of `%dx.types.ResourceProperties`.
fn resource_properties(printer: &Printer<'_>, value: Value) -> Option<[u32; 2]> {
    let Value::Constant(id) = value else {
        return None;
    };
    let c = printer.module.constant(id)?;
    match &c.value {
        ConstantValue::Null => Some([0, 0]),
        ConstantValue::Data(words) => Some([
            words.first().copied().unwrap_or(0) as u32,
            words.get(1).copied().unwrap_or(0) as u32,
        ]),
        ConstantValue::Aggregate(members) => {
            let word = |i: usize| {
                members
                    .get(i)
                    .and_then(|m| printer.module.constant_int(*m))
                    .unwrap_or(0) as u32
            };
            Some([word(0), word(1)])
        }
        _ => None,
    }
}

/// HLSL-style spelling of an annotated resource, e.g. `RWTexture2D<float4>`.
pub fn resource_type_name(props: [u32; 2]) -> String {
    let [basic, extra] = props;
    let kind = ResourceKind::from_raw(basic & 0xFF);
    let is_uav = basic & (1 << 12) != 0;
    let is_rov = basic & (1 << 13) != 0;
    let cmp_or_counter = basic & (1 << 15) != 0;

    let rw = if is_rov {
        "RasterizerOrdered"
    } else if is_uav {
        "RW"
    } else {
        ""
    };
    let element = || {
        let comp = ComponentType::from_raw(extra & 0xFF).hlsl_name();
        match (extra >> 8) & 0xFF {
            0 | 1 => comp.to_owned(),
            n => format!("{comp}{n}"),
        }
    };

    match kind {
        ResourceKind::Texture1D
        | ResourceKind::Texture2D
        | ResourceKind::Texture2DMS
        | ResourceKind::Texture3D
        | ResourceKind::TextureCube
        | ResourceKind::Texture1DArray
        | ResourceKind::Texture2DArray
        | ResourceKind::Texture2DMSArray
        | ResourceKind::TextureCubeArray => {
            format!("{rw}{kind:?}<{}>", element())
        }
        ResourceKind::TypedBuffer => format!("{rw}Buffer<{}>", element()),
        ResourceKind::RawBuffer => format!("{rw}ByteAddressBuffer"),
        ResourceKind::StructuredBuffer | ResourceKind::StructuredBufferWithCounter => {
            format!("{rw}StructuredBuffer<stride={extra}>")
        }
        ResourceKind::CBuffer => "CBuffer".to_owned(),
        ResourceKind::TBuffer => "TBuffer".to_owned(),
        ResourceKind::Sampler if cmp_or_counter => "SamplerComparisonState".to_owned(),
        ResourceKind::Sampler => "SamplerState".to_owned(),
        ResourceKind::SamplerComparison => "SamplerComparisonState".to_owned(),
        ResourceKind::RtAccelerationStructure => "RaytracingAccelerationStructure".to_owned(),
        ResourceKind::FeedbackTexture2D => "FeedbackTexture2D".to_owned(),
        ResourceKind::FeedbackTexture2DArray => "FeedbackTexture2DArray".to_owned(),
        ResourceKind::Invalid | ResourceKind::Unknown(_) => {
            tracing::error!(kind = kind.raw(), "unknown resource kind in annotateHandle");
            format!("Unknown({})", kind.raw())
        }
    }
}

/// Rewritten line body for a recognized intrinsic call, or `None` to keep the
/// plain `call` form. `result` is the already spelled result name.
pub(crate) fn rewrite(
    printer: &Printer<'_>,
    scope: Scope<'_>,
    inst: &Instruction,
    result: Option<&str>,
) -> Option<String> {
    let callee = printer.module.function(inst.callee?)?;
    let name = callee.name.as_str();
    let args = &inst.args;
    let assign = |rhs: String| match result {
        Some(result) => format!("{result} = {rhs}"),
        None => rhs,
    };

    if is_intrinsic(name, "dx.op.loadInput") {
        let elem = element(printer, scope, args.get(1), args.get(2));
        let comp = component(printer, scope, args.get(3));
        return Some(assign(format!("Input{elem}.{comp}")));
    }
    if is_intrinsic(name, "dx.op.storeOutput") {
        let elem = element(printer, scope, args.get(1), args.get(2));
        let comp = component(printer, scope, args.get(3));
        let value = args
            .get(4)
            .map_or_else(|| "???".to_owned(), |v| printer.value(Some(scope), *v));
        return Some(format!("Output{elem}.{comp} = {value}"));
    }
    for (base, semantic) in [
        ("dx.op.threadId", "SV_DispatchThreadID"),
        ("dx.op.groupId", "SV_GroupID"),
        ("dx.op.threadIdInGroup", "SV_GroupThreadID"),
    ] {
        if is_intrinsic(name, base) {
            let comp = component(printer, scope, args.get(1));
            return Some(assign(format!("{semantic}.{comp}")));
        }
    }
    if is_intrinsic(name, "dx.op.flattenedThreadIdInGroup") {
        return Some(assign("SV_GroupIndex".to_owned()));
    }
    if is_intrinsic(name, "dx.op.annotateHandle") {
        let props = resource_properties(printer, *args.get(2)?)?;
        let handle = printer.value(Some(scope), *args.get(1)?);
        return Some(assign(format!(
            "AnnotateHandle({handle}, {})",
            resource_type_name(props)
        )));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsic_names_match_on_overload_boundary() {
        assert!(is_intrinsic("dx.op.threadId.i32", "dx.op.threadId"));
        assert!(!is_intrinsic("dx.op.threadIdInGroup.i32", "dx.op.threadId"));
        assert!(is_intrinsic("dx.op.annotateHandle", "dx.op.annotateHandle"));
    }

    #[test]
    fn resource_types() {
        // Texture2D UAV of float4.
        let basic = ResourceKind::Texture2D.raw() | 1 << 12;
        let extra = ComponentType::F32.raw() | 4 << 8;
        assert_eq!(resource_type_name([basic, extra]), "RWTexture2D<float4>");

        let basic = ResourceKind::StructuredBuffer.raw();
        assert_eq!(
            resource_type_name([basic, 16]),
            "StructuredBuffer<stride=16>"
        );
        assert_eq!(
            resource_type_name([ResourceKind::RawBuffer.raw(), 0]),
            "ByteAddressBuffer"
        );
        assert_eq!(
            resource_type_name([ResourceKind::Sampler.raw() | 1 << 15, 0]),
            "SamplerComparisonState"
        );
        assert_eq!(resource_type_name([0, 0]), "Unknown(0)");
        assert_eq!(resource_type_name([99, 0]), "Unknown(99)");
    }
}
