use std::path::PathBuf;

use clap::Parser;

mod cases;
mod config;
mod datatypes;
mod error;
mod geometry;
mod mesher;
mod model;
mod post_processor;

use cases::CaseKind;
use error::CfdMeshError;
use mesher::Gmsh;

/// Builds 2D CFD test geometries and meshes them with Gmsh
#[derive(Debug, Parser)]
#[command(name = "cfdmesh", version)]
struct Cli {
    /// Geometry to build
    #[arg(value_enum)]
    case: CaseKind,

    /// JSON file overriding case parameters and mesh options
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Where to write the .geo script [default: <model>.geo]
    #[arg(long)]
    geo: Option<PathBuf>,

    /// Where Gmsh writes the mesh [default: <model>.msh]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only write the .geo script without running Gmsh
    #[arg(long)]
    geo_only: bool,

    /// Do not open the generated mesh in the Gmsh GUI
    #[arg(long)]
    no_gui: bool,

    /// Gmsh executable
    #[arg(long, default_value = "gmsh")]
    gmsh: PathBuf,
}

fn run(cli: Cli) -> Result<(), CfdMeshError> {
    let params_json = match &cli.params {
        Some(path) => Some(config::load_parameter_file(path)?),
        None => None,
    };

    let model = cases::build(cli.case, params_json.as_ref())?;
    println!(
        "info: built {} with {} points, {} curves and {} surfaces",
        model.name(),
        model.points().count(),
        model.lines().count(),
        model.surfaces().count()
    );

    let geo_file = cli
        .geo
        .unwrap_or_else(|| PathBuf::from(format!("{}.geo", model.name())));
    mesher::save_geo(&model, &geo_file)?;

    if cli.geo_only {
        return Ok(());
    }

    let mesh_file = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.msh", model.name())));
    let gmsh = Gmsh::new(cli.gmsh);
    gmsh.generate(&geo_file, &mesh_file)?;

    let summary = mesher::parse_mesh_summary(&mesh_file)?;
    post_processor::report(&summary);

    if !cli.no_gui {
        post_processor::display(&gmsh, &mesh_file)?;
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1)
    }
}
