use clap::ValueEnum;
use json::JsonValue;

use crate::{
    config::{self, Parameters},
    error::CfdMeshError,
    model::GeoModel,
};

pub mod bump;
pub mod flatplate;
pub mod inlet;
pub mod inlet_structured;

use bump::BumpParameters;
use flatplate::FlatPlateParameters;
use inlet::InletParameters;
use inlet_structured::StructuredInletParameters;

/// The fixed test geometries this tool can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaseKind {
    /// Rectangular plate inside a channel, unstructured with a boundary layer
    Flatplate,
    /// Supersonic double-ramp inlet, unstructured with a boundary layer
    Inlet,
    /// Supersonic double-ramp inlet, block-structured quadrilaterals
    InletStructured,
    /// Triangular bump on a channel wall
    Bump,
}

fn configured<P: Parameters + Default>(
    params_json: Option<&JsonValue>,
) -> Result<P, CfdMeshError> {
    let mut params = P::default();
    if let Some(params_json) = params_json {
        let applied = config::apply_parameters(&mut params, params_json)?;
        println!("info: applied {applied} parameter overrides");
    }
    Ok(params)
}

/// Builds the geometry model of a case
///
/// # Arguments
/// * `kind` - The case to build
/// * `params_json` - Optional parsed parameter file with overrides
///
/// # Returns
/// The registered geometry, ready to be written for Gmsh
pub fn build(kind: CaseKind, params_json: Option<&JsonValue>) -> Result<GeoModel, CfdMeshError> {
    let mut model = match kind {
        CaseKind::Flatplate => flatplate::build(&configured::<FlatPlateParameters>(params_json)?)?,
        CaseKind::Inlet => inlet::build(&configured::<InletParameters>(params_json)?)?,
        CaseKind::InletStructured => {
            inlet_structured::build(&configured::<StructuredInletParameters>(params_json)?)?
        }
        CaseKind::Bump => bump::build(&configured::<BumpParameters>(params_json)?)?,
    };

    if let Some(params_json) = params_json {
        config::apply_mesh_options(model.options_mut(), params_json)?;
    }

    Ok(model)
}
