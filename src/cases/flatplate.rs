use nalgebra::Point2;

use crate::{
    config::{Parameters, Slot},
    datatypes::{Algorithm, BoundaryLayer, Field},
    error::CfdMeshError,
    model::GeoModel,
};

/// Channel with a thick flat plate in its middle
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPlateParameters {
    pub mesh_size: f64,
    pub domain_length: f64,
    pub domain_height: f64,
    pub plate_length: f64,
    pub plate_height: f64,
    /// Mesh size at the plate corners, relative to `mesh_size`
    pub plate_size_factor: f64,
    pub size_min: f64,
    pub size_max: f64,
    pub dist_min: f64,
    pub dist_max: f64,
    pub layer_size: f64,
    pub layer_ratio: f64,
    pub layer_thickness: f64,
    pub fan_elements: usize,
}

impl Default for FlatPlateParameters {
    fn default() -> Self {
        FlatPlateParameters {
            mesh_size: 0.01,
            domain_length: 2.0,
            domain_height: 1.0,
            plate_length: 1.0,
            plate_height: 0.2,
            plate_size_factor: 0.1,
            size_min: 0.02,
            size_max: 0.2,
            dist_min: 0.1,
            dist_max: 0.5,
            layer_size: 0.005,
            layer_ratio: 1.1,
            layer_thickness: 0.1,
            fan_elements: 4,
        }
    }
}

impl Parameters for FlatPlateParameters {
    fn slots(&mut self) -> Vec<(&'static str, Slot<'_>)> {
        vec![
            ("mesh_size", Slot::Real(&mut self.mesh_size)),
            ("domain_length", Slot::Real(&mut self.domain_length)),
            ("domain_height", Slot::Real(&mut self.domain_height)),
            ("plate_length", Slot::Real(&mut self.plate_length)),
            ("plate_height", Slot::Real(&mut self.plate_height)),
            ("plate_size_factor", Slot::Real(&mut self.plate_size_factor)),
            ("size_min", Slot::Real(&mut self.size_min)),
            ("size_max", Slot::Real(&mut self.size_max)),
            ("dist_min", Slot::Real(&mut self.dist_min)),
            ("dist_max", Slot::Real(&mut self.dist_max)),
            ("layer_size", Slot::Real(&mut self.layer_size)),
            ("layer_ratio", Slot::Real(&mut self.layer_ratio)),
            ("layer_thickness", Slot::Real(&mut self.layer_thickness)),
            ("fan_elements", Slot::Count(&mut self.fan_elements)),
        ]
    }
}

pub fn build(params: &FlatPlateParameters) -> Result<GeoModel, CfdMeshError> {
    let mut model = GeoModel::new("flatplate");
    let lc = params.mesh_size;
    let lc_plate = lc * params.plate_size_factor;

    if !(params.plate_length > 0.0 && params.plate_height > 0.0) {
        return Err(CfdMeshError::Geometry(format!(
            "Plate dimensions must be positive, got {} x {}",
            params.plate_length, params.plate_height
        )));
    }
    if params.plate_length >= params.domain_length || params.plate_height >= params.domain_height
    {
        return Err(CfdMeshError::Geometry(format!(
            "Plate {} x {} does not fit in the {} x {} channel",
            params.plate_length, params.plate_height, params.domain_length, params.domain_height
        )));
    }
    let x_start = (params.domain_length - params.plate_length) / 2.0;
    let y_start = (params.domain_height - params.plate_height) / 2.0;

    // Channel
    let p1 = model.add_point(0.0, 0.0, Some(lc))?;
    let p2 = model.add_point(params.domain_length, 0.0, Some(lc))?;
    let p3 = model.add_point(params.domain_length, params.domain_height, Some(lc))?;
    let p4 = model.add_point(0.0, params.domain_height, Some(lc))?;

    let l1 = model.add_line(p1, p2)?;
    let l2 = model.add_line(p2, p3)?;
    let l3 = model.add_line(p3, p4)?;
    let l4 = model.add_line(p4, p1)?;

    // Plate
    let x_end = x_start + params.plate_length;
    let y_end = y_start + params.plate_height;
    let p5 = model.add_point(x_start, y_start, Some(lc_plate))?;
    let p6 = model.add_point(x_end, y_start, Some(lc_plate))?;
    let p7 = model.add_point(x_end, y_end, Some(lc_plate))?;
    let p8 = model.add_point(x_start, y_end, Some(lc_plate))?;

    let l5 = model.add_line(p5, p6)?;
    let l6 = model.add_line(p6, p7)?;
    let l7 = model.add_line(p7, p8)?;
    let l8 = model.add_line(p8, p5)?;

    let cl_domain = model.add_curve_loop(&[l1.into(), l2.into(), l3.into(), l4.into()])?;
    let cl_plate = model.add_curve_loop(&[l5.into(), l6.into(), l7.into(), l8.into()])?;
    model.add_plane_surface(&[cl_domain, cl_plate])?;

    let walls = vec![l5, l6, l7, l8];

    let dist = model.add_field(Field::Distance {
        curves: walls.clone(),
    })?;
    let thresh = model.add_field(Field::Threshold {
        in_field: dist,
        size_min: params.size_min,
        size_max: params.size_max,
        dist_min: params.dist_min,
        dist_max: params.dist_max,
    })?;
    model.set_background_field(thresh)?;

    let fan_points = vec![p5, p6, p7, p8];
    let bl = model.add_field(Field::BoundaryLayer(BoundaryLayer {
        curves: walls,
        size: params.layer_size,
        ratio: params.layer_ratio,
        thickness: params.layer_thickness,
        quads: true,
        fan_point_sizes: vec![params.fan_elements; fan_points.len()],
        fan_points,
    }))?;
    model.set_boundary_layer(bl)?;

    model.set_algorithm(Algorithm::FrontalDelaunay);

    model.check_within(
        Point2::origin(),
        Point2::new(params.domain_length, params.domain_height),
    )?;

    Ok(model)
}
