use std::path::Path;

use json::JsonValue;

use crate::{
    datatypes::{Algorithm, MeshOptions},
    error::CfdMeshError,
};

/// A mutable view of one named case parameter
pub enum Slot<'a> {
    Real(&'a mut f64),
    Count(&'a mut usize),
}

/// Implemented by every case's parameter struct so that values can be
/// overridden by name from a parameter file
pub trait Parameters {
    fn slots(&mut self) -> Vec<(&'static str, Slot<'_>)>;
}

/// Parses the parameter file into a JsonValue object
///
/// # Arguments
/// * `params_file` - The path to the parameter file
///
/// # Returns
/// A JsonValue object with validated top-level sections
pub fn load_parameter_file(params_file: &Path) -> Result<JsonValue, CfdMeshError> {
    let file_string = match std::fs::read_to_string(params_file) {
        Ok(f) => f,
        Err(err) => {
            return Err(CfdMeshError::Input(format!(
                "Unable to open parameter file {}: {err}",
                params_file.display()
            )))
        }
    };

    parse_parameters(&file_string)
}

/// Parses and validates the contents of a parameter file
pub fn parse_parameters(contents: &str) -> Result<JsonValue, CfdMeshError> {
    let params_json = match json::parse(contents) {
        Ok(j) => j,
        Err(err) => {
            return Err(CfdMeshError::Input(format!(
                "Error in parameter file json: {err}"
            )))
        }
    };

    if !params_json.is_object() {
        return Err(CfdMeshError::Input(
            "Parameter file must contain a json object".to_owned(),
        ));
    }
    for (key, _) in params_json.entries() {
        if key != "parameters" && key != "mesh" {
            println!("warning [config]: ignoring unknown section '{key}'");
        }
    }
    if params_json.has_key("parameters") && !params_json["parameters"].is_object() {
        return Err(CfdMeshError::Input(
            "Section 'parameters' must be a json object".to_owned(),
        ));
    }
    if params_json.has_key("mesh") && !params_json["mesh"].is_object() {
        return Err(CfdMeshError::Input(
            "Section 'mesh' must be a json object".to_owned(),
        ));
    }

    Ok(params_json)
}

/// Overrides case parameters with the values of the 'parameters' section
///
/// # Arguments
/// * `params` - The case parameters to modify
/// * `params_json` - The parsed parameter file
///
/// # Returns
/// The number of parameters that were overridden
pub fn apply_parameters<P: Parameters>(
    params: &mut P,
    params_json: &JsonValue,
) -> Result<usize, CfdMeshError> {
    let mut applied: usize = 0;

    for (name, value) in params_json["parameters"].entries() {
        let mut slots = params.slots();
        match slots.iter_mut().find(|(slot_name, _)| *slot_name == name) {
            Some((_, Slot::Real(target))) => {
                **target = match value.as_f64() {
                    Some(v) if v.is_finite() => v,
                    _ => {
                        return Err(CfdMeshError::Input(format!(
                            "Parameter '{name}' must be a number, got {value}"
                        )))
                    }
                };
                applied += 1;
            }
            Some((_, Slot::Count(target))) => {
                **target = match value.as_usize() {
                    Some(v) => v,
                    None => {
                        return Err(CfdMeshError::Input(format!(
                            "Parameter '{name}' must be a non-negative integer, got {value}"
                        )))
                    }
                };
                applied += 1;
            }
            None => {
                println!("warning [config]: ignoring unknown parameter '{name}'");
            }
        }
    }

    Ok(applied)
}

/// Overrides global mesh options with the values of the 'mesh' section
pub fn apply_mesh_options(
    options: &mut MeshOptions,
    params_json: &JsonValue,
) -> Result<(), CfdMeshError> {
    let mesh_json = &params_json["mesh"];

    for (key, value) in mesh_json.entries() {
        match key {
            "algorithm" => {
                let algorithm = value
                    .as_u32()
                    .and_then(Algorithm::from_gmsh_id)
                    .ok_or_else(|| {
                        CfdMeshError::Input(format!("Unknown 2D meshing algorithm {value}"))
                    })?;
                options.algorithm = Some(algorithm);
            }
            "recombine_all" => {
                options.recombine_all = value.as_bool().ok_or_else(|| {
                    CfdMeshError::Input(format!("Option recombine_all must be a bool, got {value}"))
                })?;
            }
            other => println!("warning [config]: ignoring unknown mesh option '{other}'"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Sample {
        length: f64,
        cells: usize,
    }

    impl Parameters for Sample {
        fn slots(&mut self) -> Vec<(&'static str, Slot<'_>)> {
            vec![
                ("length", Slot::Real(&mut self.length)),
                ("cells", Slot::Count(&mut self.cells)),
            ]
        }
    }

    #[test]
    fn overrides_known_parameters() {
        let params_json =
            parse_parameters(r#"{"parameters": {"length": 2.5, "cells": 40, "colour": 1}}"#)
                .unwrap();
        let mut sample = Sample::default();

        let applied = apply_parameters(&mut sample, &params_json).unwrap();

        assert_eq!(applied, 2);
        assert_eq!(sample.length, 2.5);
        assert_eq!(sample.cells, 40);
    }

    #[test]
    fn rejects_badly_typed_values() {
        let mut sample = Sample::default();

        let params_json = parse_parameters(r#"{"parameters": {"length": "long"}}"#).unwrap();
        assert!(apply_parameters(&mut sample, &params_json).is_err());

        let params_json = parse_parameters(r#"{"parameters": {"cells": -3}}"#).unwrap();
        assert!(apply_parameters(&mut sample, &params_json).is_err());
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(parse_parameters("{ not json").is_err());
        assert!(parse_parameters("[1, 2]").is_err());
        assert!(parse_parameters(r#"{"parameters": 3}"#).is_err());
        assert!(parse_parameters(r#"{"mesh": []}"#).is_err());
    }

    #[test]
    fn missing_sections_change_nothing() {
        let params_json = parse_parameters("{}").unwrap();
        let mut sample = Sample {
            length: 1.0,
            cells: 3,
        };
        let mut options = MeshOptions::default();

        assert_eq!(apply_parameters(&mut sample, &params_json).unwrap(), 0);
        apply_mesh_options(&mut options, &params_json).unwrap();
        assert_eq!(sample.length, 1.0);
        assert_eq!(options, MeshOptions::default());
    }

    #[test]
    fn mesh_options_are_applied() {
        let params_json =
            parse_parameters(r#"{"mesh": {"algorithm": 5, "recombine_all": true}}"#).unwrap();
        let mut options = MeshOptions::default();

        apply_mesh_options(&mut options, &params_json).unwrap();

        assert_eq!(options.algorithm, Some(Algorithm::Delaunay));
        assert!(options.recombine_all);

        let params_json = parse_parameters(r#"{"mesh": {"algorithm": 4}}"#).unwrap();
        assert!(apply_mesh_options(&mut options, &params_json).is_err());
    }

    #[test]
    fn parameter_file_is_read_from_a_path() {
        let params_file =
            std::env::temp_dir().join(format!("cfdmesh-params-{}.json", std::process::id()));
        std::fs::write(&params_file, r#"{"parameters": {"mesh_size": 0.5}}"#).unwrap();

        let params_json = load_parameter_file(&params_file).unwrap();
        std::fs::remove_file(&params_file).unwrap();
        assert_eq!(params_json["parameters"]["mesh_size"].as_f64(), Some(0.5));

        let err = load_parameter_file(&params_file).unwrap_err();
        assert!(matches!(err, CfdMeshError::Input(_)));
    }
}
