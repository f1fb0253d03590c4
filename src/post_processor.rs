use std::path::Path;

use crate::{
    error::CfdMeshError,
    mesher::{Gmsh, MeshSummary},
};

/// Prints the contents of a generated mesh
pub fn report(summary: &MeshSummary) {
    println!(
        "info: loaded {} nodes and {} elements",
        summary.nodes,
        summary.elements()
    );
    println!(
        "info: {} triangles, {} quadrangles, {} boundary lines",
        summary.triangles, summary.quadrangles, summary.lines
    );
    if summary.other > 0 {
        println!(
            "warning [mesh]: {} elements of unexpected type",
            summary.other
        );
    }
    if summary.surface_elements() == 0 {
        println!("warning [mesh]: mesh has no 2D elements");
    }
}

/// Opens a mesh in the Gmsh GUI and waits until the window is closed
///
/// # Arguments
/// * `gmsh` - The Gmsh executable to launch
/// * `mesh_file` - The .msh file to show
pub fn display(gmsh: &Gmsh, mesh_file: &Path) -> Result<(), CfdMeshError> {
    println!("info: opening {} in gmsh...", mesh_file.display());

    let status = match std::process::Command::new(gmsh.executable())
        .arg(mesh_file)
        .status()
    {
        Ok(status) => status,
        Err(err) => {
            return Err(CfdMeshError::PostProcessor(format!(
                "Unable to launch {}: {err}",
                gmsh.executable().display()
            )))
        }
    };

    if !status.success() {
        return Err(CfdMeshError::PostProcessor(format!(
            "Gmsh viewer exited with {status}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_failures_are_post_processor_errors() {
        let mesh_file = std::env::temp_dir().join("viewer.msh");

        let err = display(&Gmsh::new("/nonexistent/gmsh"), &mesh_file).unwrap_err();
        assert!(matches!(err, CfdMeshError::PostProcessor(_)));

        let err = display(&Gmsh::new("false"), &mesh_file).unwrap_err();
        assert!(matches!(err, CfdMeshError::PostProcessor(_)));
    }
}
