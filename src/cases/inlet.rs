use nalgebra::Point2;

use crate::{
    config::{Parameters, Slot},
    datatypes::{Algorithm, BoundaryLayer, CurveRef, Field, PhysicalDim},
    error::CfdMeshError,
    geometry::{InletDimensions, InletLayout},
    model::GeoModel,
};

/// Parameter slots shared by both inlet cases
pub(super) fn dimension_slots(dims: &mut InletDimensions) -> Vec<(&'static str, Slot<'_>)> {
    vec![
        ("domain_length", Slot::Real(&mut dims.domain_length)),
        ("domain_height", Slot::Real(&mut dims.domain_height)),
        ("intake_length", Slot::Real(&mut dims.intake_length)),
        ("intake_height", Slot::Real(&mut dims.intake_height)),
        ("throat_height", Slot::Real(&mut dims.throat_height)),
        ("ramp_length", Slot::Real(&mut dims.ramp_length)),
        ("ramp_height", Slot::Real(&mut dims.ramp_height)),
        ("ramp_angle_one", Slot::Real(&mut dims.ramp_angle_one)),
        ("ramp_angle_two", Slot::Real(&mut dims.ramp_angle_two)),
        ("cowl_angle", Slot::Real(&mut dims.cowl_angle)),
        ("cowl_height", Slot::Real(&mut dims.cowl_height)),
    ]
}

/// Unstructured inlet in a large far-field box
#[derive(Debug, Clone, PartialEq)]
pub struct InletParameters {
    pub dimensions: InletDimensions,
    pub mesh_size: f64,
    pub size_min: f64,
    pub size_max: f64,
    pub dist_min: f64,
    pub dist_max: f64,
    pub layer_size: f64,
    pub layer_ratio: f64,
    pub layer_thickness: f64,
    /// Fan elements inserted at the cowl lip
    pub fan_elements: usize,
}

impl Default for InletParameters {
    fn default() -> Self {
        let (intake_height, cowl_height, throat_height) = (44.0, 8.0, 15.0);
        InletParameters {
            dimensions: InletDimensions {
                domain_length: 500.0,
                domain_height: 250.0,
                intake_length: 150.0,
                intake_height,
                throat_height,
                ramp_length: 81.7,
                ramp_height: intake_height - cowl_height - throat_height,
                ramp_angle_one: 10.0,
                ramp_angle_two: 22.0,
                cowl_angle: 30.0,
                cowl_height,
            },
            mesh_size: 10.0,
            size_min: 0.5,
            size_max: 10.0,
            dist_min: 1.0,
            dist_max: 40.0,
            layer_size: 0.02,
            layer_ratio: 1.15,
            layer_thickness: 0.8,
            fan_elements: 6,
        }
    }
}

impl Parameters for InletParameters {
    fn slots(&mut self) -> Vec<(&'static str, Slot<'_>)> {
        let mut slots = dimension_slots(&mut self.dimensions);
        slots.extend([
            ("mesh_size", Slot::Real(&mut self.mesh_size)),
            ("size_min", Slot::Real(&mut self.size_min)),
            ("size_max", Slot::Real(&mut self.size_max)),
            ("dist_min", Slot::Real(&mut self.dist_min)),
            ("dist_max", Slot::Real(&mut self.dist_max)),
            ("layer_size", Slot::Real(&mut self.layer_size)),
            ("layer_ratio", Slot::Real(&mut self.layer_ratio)),
            ("layer_thickness", Slot::Real(&mut self.layer_thickness)),
            ("fan_elements", Slot::Count(&mut self.fan_elements)),
        ]);
        slots
    }
}

pub fn build(params: &InletParameters) -> Result<GeoModel, CfdMeshError> {
    let mut model = GeoModel::new("inlet");
    let dims = &params.dimensions;
    let layout = InletLayout::derive(dims)?;
    let lc = Some(params.mesh_size);

    println!(
        "info: ramp kink at ({:.4}, {:.4})",
        layout.x_kink, layout.kink.height
    );

    // Ramp side
    let p_inlet_bot = model.add_point(0.0, 0.0, lc)?;
    let p_ramp = model.add_point(layout.x_ramp_start, 0.0, lc)?;
    let p_kink = model.add_point(layout.x_kink, layout.kink.height, lc)?;
    let p_throat = model.add_point(layout.x_throat_start, dims.ramp_height, lc)?;
    let p_out_bot = model.add_point(layout.x_end, dims.ramp_height, lc)?;

    // Cowl
    let p_out_cowl = model.add_point(layout.x_end, layout.y_split, lc)?;
    let p_lip = model.add_point(layout.x_throat_start, layout.y_split, lc)?;
    let p_cowl_tip = model.add_point(layout.x_cowl_tip, layout.y_cowl_top, lc)?;
    let p_out_cowl_top = model.add_point(layout.x_end, layout.y_cowl_top, lc)?;

    // Far field
    let p_out_top = model.add_point(layout.x_end, layout.y_top, lc)?;
    let p_inlet_top = model.add_point(0.0, layout.y_top, lc)?;

    let l_wall_1 = model.add_line(p_inlet_bot, p_ramp)?;
    let l_wall_2 = model.add_line(p_ramp, p_kink)?;
    let l_wall_3 = model.add_line(p_kink, p_throat)?;
    let l_throat_bot = model.add_line(p_throat, p_out_bot)?;
    let l_out_int = model.add_line(p_out_bot, p_out_cowl)?;
    let l_throat_top = model.add_line(p_out_cowl, p_lip)?;
    let l_cowl_top = model.add_line(p_lip, p_cowl_tip)?;
    let l_cowl_back = model.add_line(p_cowl_tip, p_out_cowl_top)?;
    let l_out_ext = model.add_line(p_out_cowl_top, p_out_top)?;
    let l_top = model.add_line(p_out_top, p_inlet_top)?;
    let l_inlet = model.add_line(p_inlet_top, p_inlet_bot)?;

    let boundary = [
        l_wall_1, l_wall_2, l_wall_3, l_throat_bot, l_out_int, l_throat_top, l_cowl_top,
        l_cowl_back, l_out_ext, l_top, l_inlet,
    ];
    let cl = model.add_curve_loop(&boundary.map(CurveRef::from))?;
    let fluid = model.add_plane_surface(&[cl])?;

    let walls = vec![
        l_wall_1,
        l_wall_2,
        l_wall_3,
        l_throat_bot,
        l_throat_top,
        l_cowl_top,
        l_cowl_back,
    ];

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

    let bl = model.add_field(Field::BoundaryLayer(BoundaryLayer {
        curves: walls.clone(),
        size: params.layer_size,
        ratio: params.layer_ratio,
        thickness: params.layer_thickness,
        quads: true,
        fan_points: vec![p_lip],
        fan_point_sizes: vec![params.fan_elements],
    }))?;
    model.set_boundary_layer(bl)?;

    model.add_physical_group(PhysicalDim::Surface, &[fluid.0], "fluid")?;
    model.add_physical_group(PhysicalDim::Curve, &[l_inlet.0], "inlet")?;
    model.add_physical_group(PhysicalDim::Curve, &[l_out_int.0, l_out_ext.0], "outlet")?;
    model.add_physical_group(PhysicalDim::Curve, &[l_top.0], "top")?;
    let wall_tags: Vec<u32> = walls.iter().map(|l| l.0).collect();
    model.add_physical_group(PhysicalDim::Curve, &wall_tags, "wall")?;

    model.set_algorithm(Algorithm::FrontalDelaunay);

    model.check_within(
        Point2::origin(),
        Point2::new(dims.domain_length, dims.domain_height),
    )?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::PointTag;
    use approx::assert_relative_eq;

    #[test]
    fn intake_sits_at_the_end_of_the_box() {
        let model = build(&InletParameters::default()).unwrap();

        assert_eq!(model.points().count(), 11);
        assert_eq!(model.lines().count(), 11);

        let ramp = model.point(PointTag(2)).unwrap();
        assert_relative_eq!(ramp.position.x, 350.0);

        let lip = model.point(PointTag(7)).unwrap();
        assert_relative_eq!(lip.position.x, 431.7, epsilon = 1e-9);
        assert_relative_eq!(lip.position.y, 36.0);

        let tip = model.point(PointTag(8)).unwrap();
        assert_relative_eq!(tip.position.y, 44.0);
        assert_relative_eq!(
            tip.position.x,
            431.7 + 8.0 / 30.0_f64.to_radians().tan(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn ramp_height_follows_intake_stack() {
        let params = InletParameters::default();
        assert_relative_eq!(params.dimensions.ramp_height, 21.0);

        let model = build(&params).unwrap();
        let throat = model.point(PointTag(4)).unwrap();
        assert_relative_eq!(throat.position.y, 21.0);
    }

    #[test]
    fn walls_form_the_wall_group() {
        let model = build(&InletParameters::default()).unwrap();

        let names: Vec<&str> = model
            .physical_groups()
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, ["fluid", "inlet", "outlet", "top", "wall"]);

        let wall = &model.physical_groups()[4];
        assert_eq!(wall.entities, vec![1, 2, 3, 4, 6, 7, 8]);
    }

    #[test]
    fn cowl_outside_the_domain_is_rejected() {
        let mut params = InletParameters::default();
        params.dimensions.intake_length = 90.0;
        assert!(build(&params).is_err());
    }
}
