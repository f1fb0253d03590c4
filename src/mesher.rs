use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::ProgressBar;

use crate::{
    datatypes::{Distribution, Field, PhysicalDim},
    error::CfdMeshError,
    model::GeoModel,
};

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Writes a model as a Gmsh .geo script
///
/// # Arguments
/// * `model` - The geometry to write
/// * `geo` - Destination of the script
pub fn write_geo<W: Write>(model: &GeoModel, geo: &mut W) -> std::io::Result<()> {
    writeln!(geo, "// Model: {}", model.name())?;

    writeln!(geo, "\n// Define points")?;
    for (tag, vertex) in model.points() {
        let p = vertex.position;
        match vertex.mesh_size {
            Some(lc) => writeln!(geo, "Point({tag}) = {{ {}, {}, 0, {lc} }};", p.x, p.y)?,
            None => writeln!(geo, "Point({tag}) = {{ {}, {}, 0 }};", p.x, p.y)?,
        }
    }

    writeln!(geo, "\n// Connect points")?;
    for (tag, line) in model.lines() {
        writeln!(geo, "Line({tag}) = {{ {}, {} }};", line.start, line.end)?;
    }

    writeln!(geo, "\n// Register loops")?;
    for (tag, curve_loop) in model.curve_loops() {
        writeln!(geo, "Curve Loop({tag}) = {{ {} }};", join(&curve_loop.curves))?;
    }

    writeln!(geo, "\n// Define surfaces")?;
    for (tag, surface) in model.surfaces() {
        writeln!(geo, "Plane Surface({tag}) = {{ {} }};", join(&surface.loops))?;
    }

    if !model.transfinite_curves().is_empty() || !model.transfinite_surfaces().is_empty() {
        writeln!(geo, "\n// Structured meshing constraints")?;
    }
    for transfinite in model.transfinite_curves() {
        let (kind, coefficient) = match transfinite.distribution {
            Distribution::Progression(c) => ("Progression", c),
            Distribution::Bump(c) => ("Bump", c),
        };
        writeln!(
            geo,
            "Transfinite Curve {{ {} }} = {} Using {kind} {coefficient};",
            join(&transfinite.curves),
            transfinite.nodes
        )?;
    }
    for transfinite in model.transfinite_surfaces() {
        writeln!(
            geo,
            "Transfinite Surface {{ {} }} = {{ {} }};",
            transfinite.surface,
            join(transfinite.corners)
        )?;
    }

    if model.fields().next().is_some() {
        writeln!(geo, "\n// Mesh size fields")?;
    }
    for (tag, field) in model.fields() {
        writeln!(geo, "Field[{tag}] = {};", field.kind())?;
        match field {
            Field::Distance { curves } => {
                writeln!(geo, "Field[{tag}].CurvesList = {{ {} }};", join(curves))?;
            }
            Field::Threshold {
                in_field,
                size_min,
                size_max,
                dist_min,
                dist_max,
            } => {
                writeln!(geo, "Field[{tag}].InField = {in_field};")?;
                writeln!(geo, "Field[{tag}].SizeMin = {size_min};")?;
                writeln!(geo, "Field[{tag}].SizeMax = {size_max};")?;
                writeln!(geo, "Field[{tag}].DistMin = {dist_min};")?;
                writeln!(geo, "Field[{tag}].DistMax = {dist_max};")?;
            }
            Field::BoundaryLayer(layer) => {
                writeln!(geo, "Field[{tag}].CurvesList = {{ {} }};", join(&layer.curves))?;
                writeln!(geo, "Field[{tag}].Size = {};", layer.size)?;
                writeln!(geo, "Field[{tag}].Ratio = {};", layer.ratio)?;
                writeln!(geo, "Field[{tag}].Thickness = {};", layer.thickness)?;
                writeln!(geo, "Field[{tag}].Quads = {};", u8::from(layer.quads))?;
                if !layer.fan_points.is_empty() {
                    writeln!(
                        geo,
                        "Field[{tag}].FanPointsList = {{ {} }};",
                        join(&layer.fan_points)
                    )?;
                }
                if !layer.fan_point_sizes.is_empty() {
                    writeln!(
                        geo,
                        "Field[{tag}].FanPointsSizesList = {{ {} }};",
                        join(&layer.fan_point_sizes)
                    )?;
                }
            }
        }
    }
    if let Some(tag) = model.background_field() {
        writeln!(geo, "Background Field = {tag};")?;
    }
    if let Some(tag) = model.boundary_layer() {
        writeln!(geo, "BoundaryLayer Field = {tag};")?;
    }

    if !model.physical_groups().is_empty() {
        writeln!(geo, "\n// Physical groups")?;
    }
    for group in model.physical_groups() {
        let keyword = match group.dim {
            PhysicalDim::Curve => "Curve",
            PhysicalDim::Surface => "Surface",
        };
        writeln!(
            geo,
            "Physical {keyword}(\"{}\", {}) = {{ {} }};",
            group.name,
            group.tag,
            join(&group.entities)
        )?;
    }

    writeln!(geo, "\n// Define Mesh Settings")?;
    if let Some(algorithm) = model.options().algorithm {
        writeln!(geo, "Mesh.Algorithm = {};", algorithm.gmsh_id())?;
    }
    if model.options().recombine_all {
        writeln!(geo, "Mesh.RecombineAll = 1;")?;
    }

    Ok(())
}

/// Builds a .geo file from a model
///
/// # Arguments
/// * `model` - The geometry to write
/// * `output_file` - The output .geo file
pub fn save_geo(model: &GeoModel, output_file: &Path) -> Result<(), CfdMeshError> {
    let mut geo_file = match std::fs::File::create(output_file) {
        Ok(f) => f,
        Err(err) => {
            return Err(CfdMeshError::Mesher(format!(
                "Failed to create {}: {err}",
                output_file.display()
            )))
        }
    };

    write_geo(model, &mut geo_file).map_err(|err| {
        CfdMeshError::Mesher(format!("Failed to write {}: {err}", output_file.display()))
    })?;

    println!("info: wrote geometry to {}", output_file.display());
    Ok(())
}

/// Handle on the Gmsh executable
#[derive(Debug, Clone)]
pub struct Gmsh {
    executable: PathBuf,
}

impl Gmsh {
    pub fn new(executable: impl Into<PathBuf>) -> Gmsh {
        Gmsh {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs Gmsh to create a 2D mesh from a .geo script
    ///
    /// # Arguments
    /// * `geo_file` - The input .geo script
    /// * `output` - The output filepath of the .msh file
    pub fn generate(&self, geo_file: &Path, output: &Path) -> Result<(), CfdMeshError> {
        let spinner = ProgressBar::new_spinner();
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner.set_message(format!("running gmsh on {}...", geo_file.display()));

        let result = std::process::Command::new(&self.executable)
            .arg(geo_file)
            .arg("-2")
            .arg("-format")
            .arg("msh41")
            .arg("-o")
            .arg(output)
            .output();

        spinner.finish_and_clear();

        let out = match result {
            Ok(out) => out,
            Err(err) => {
                return Err(CfdMeshError::Mesher(format!(
                    "Unable to run {}: {err}",
                    self.executable.display()
                )))
            }
        };

        if !out.status.success() {
            return Err(CfdMeshError::Mesher(format!(
                "Gmsh failed with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        println!("info: wrote mesh to {}", output.display());
        Ok(())
    }
}

enum MeshParseState {
    Format,
    Nodes,
    Elements,
    Limbo,
}

/// Node and element counts of a generated mesh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshSummary {
    pub nodes: usize,
    pub points: usize,
    pub lines: usize,
    pub triangles: usize,
    pub quadrangles: usize,
    pub other: usize,
}

impl MeshSummary {
    pub fn elements(&self) -> usize {
        self.points + self.lines + self.triangles + self.quadrangles + self.other
    }

    pub fn surface_elements(&self) -> usize {
        self.triangles + self.quadrangles
    }

    fn count(&mut self, element_type: usize, amount: usize) {
        match element_type {
            15 => self.points += amount,
            1 | 8 => self.lines += amount,
            2 | 9 => self.triangles += amount,
            3 | 10 => self.quadrangles += amount,
            _ => self.other += amount,
        }
    }

    /// Parses the contents of an ASCII MSH 4.1 file
    pub fn from_msh(contents: &str) -> Result<MeshSummary, CfdMeshError> {
        let mut summary = MeshSummary::default();
        let mut parser_state = MeshParseState::Limbo;
        let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

        while let Some(line) = lines.next() {
            if line.starts_with("$End") {
                parser_state = MeshParseState::Limbo;
                continue;
            }

            match parser_state {
                MeshParseState::Limbo => {
                    parser_state = match line {
                        "$MeshFormat" => MeshParseState::Format,
                        "$Nodes" => MeshParseState::Nodes,
                        "$Elements" => MeshParseState::Elements,
                        _ => MeshParseState::Limbo,
                    };
                }
                MeshParseState::Format => {
                    let version = line.split_whitespace().next().unwrap_or_default();
                    let file_type = line.split_whitespace().nth(1).unwrap_or_default();
                    if !version.starts_with('4') {
                        return Err(CfdMeshError::Mesher(format!(
                            "Unsupported mesh format version {version}"
                        )));
                    }
                    if file_type != "0" {
                        return Err(CfdMeshError::Mesher(
                            "Only ASCII mesh files can be read".to_owned(),
                        ));
                    }
                    parser_state = MeshParseState::Limbo;
                }
                MeshParseState::Nodes => {
                    // numEntityBlocks numNodes minNodeTag maxNodeTag
                    let header = parse_numbers(line)?;
                    summary.nodes = *header.get(1).ok_or_else(|| truncated("$Nodes"))?;
                    parser_state = MeshParseState::Limbo;
                }
                MeshParseState::Elements => {
                    let header = parse_numbers(line)?;
                    let blocks = *header.first().ok_or_else(|| truncated("$Elements"))?;

                    for _ in 0..blocks {
                        // entityDim entityTag elementType numElementsInBlock
                        let block_header = lines.next().ok_or_else(|| truncated("$Elements"))?;
                        let block = parse_numbers(block_header)?;
                        if block.len() < 4 {
                            return Err(truncated("$Elements"));
                        }
                        let (element_type, amount) = (block[2], block[3]);
                        for _ in 0..amount {
                            lines.next().ok_or_else(|| truncated("$Elements"))?;
                        }
                        summary.count(element_type, amount);
                    }
                    parser_state = MeshParseState::Limbo;
                }
            }
        }

        Ok(summary)
    }
}

fn parse_numbers(line: &str) -> Result<Vec<usize>, CfdMeshError> {
    line.split_whitespace()
        .map(|i| {
            i.parse()
                .map_err(|_| CfdMeshError::Mesher(format!("Unexpected non-int in mesh data {i}")))
        })
        .collect()
}

fn truncated(section: &str) -> CfdMeshError {
    CfdMeshError::Mesher(format!("Mesh file ends inside its {section} section"))
}

/// Reads a .msh file into a summary of its contents
///
/// # Arguments
/// * `mesh_file` - The path to the mesh file
pub fn parse_mesh_summary(mesh_file: &Path) -> Result<MeshSummary, CfdMeshError> {
    let contents = match std::fs::read_to_string(mesh_file) {
        Ok(c) => c,
        Err(err) => {
            return Err(CfdMeshError::Mesher(format!(
                "Unable to open generated mesh file {}: {err}",
                mesh_file.display()
            )))
        }
    };

    MeshSummary::from_msh(&contents)
}
