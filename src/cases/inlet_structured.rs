use nalgebra::Point2;

use crate::{
    config::{Parameters, Slot},
    datatypes::{CurveTag, Distribution, PhysicalDim, PointTag, SurfaceTag},
    error::CfdMeshError,
    geometry::{streamwise_divisions, InletDimensions, InletLayout},
    model::GeoModel,
};

use super::inlet::dimension_slots;

const REFERENCE_LENGTH: f64 = 150.0;

/// Block-structured inlet. The domain is cut at the cowl lip height into a
/// near-wall row of blocks and a far-field row.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredInletParameters {
    pub dimensions: InletDimensions,
    pub mesh_size: f64,
    /// Streamwise cells spread over the whole domain length
    pub total_divisions: usize,
    pub ny_wall: usize,
    pub ny_far: usize,
    pub wall_progression: f64,
    pub far_progression: f64,
    pub throat_bump: f64,
    pub cowl_progression: f64,
}

impl Default for StructuredInletParameters {
    fn default() -> Self {
        StructuredInletParameters {
            dimensions: InletDimensions {
                domain_length: 1.04 * REFERENCE_LENGTH,
                domain_height: 0.4 * REFERENCE_LENGTH,
                intake_length: 150.0,
                intake_height: 44.0,
                throat_height: 15.0,
                ramp_length: 81.7,
                ramp_height: 21.0,
                ramp_angle_one: 10.0,
                ramp_angle_two: 22.0,
                cowl_angle: 30.0,
                cowl_height: 8.0,
            },
            mesh_size: 1.0,
            total_divisions: 1024,
            ny_wall: 400,
            ny_far: 100,
            wall_progression: 1.05,
            far_progression: 1.02,
            throat_bump: 0.05,
            cowl_progression: 1.01,
        }
    }
}

impl Parameters for StructuredInletParameters {
    fn slots(&mut self) -> Vec<(&'static str, Slot<'_>)> {
        let mut slots = dimension_slots(&mut self.dimensions);
        slots.extend([
            ("mesh_size", Slot::Real(&mut self.mesh_size)),
            ("total_divisions", Slot::Count(&mut self.total_divisions)),
            ("ny_wall", Slot::Count(&mut self.ny_wall)),
            ("ny_far", Slot::Count(&mut self.ny_far)),
            ("wall_progression", Slot::Real(&mut self.wall_progression)),
            ("far_progression", Slot::Real(&mut self.far_progression)),
            ("throat_bump", Slot::Real(&mut self.throat_bump)),
            ("cowl_progression", Slot::Real(&mut self.cowl_progression)),
        ]);
        slots
    }
}

/// Streamwise node counts of each block column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamwiseCounts {
    pub forebody: usize,
    pub first_ramp: usize,
    pub second_ramp: usize,
    pub cowl: usize,
    pub wake: usize,
    pub throat: usize,
}

impl StreamwiseCounts {
    pub fn new(layout: &InletLayout, total_divisions: usize) -> Result<Self, CfdMeshError> {
        let divisions =
            |length: f64| streamwise_divisions(length, layout.x_end, total_divisions);
        let cowl = divisions(layout.x_cowl_tip - layout.x_throat_start)?;
        let wake = divisions(layout.x_end - layout.x_cowl_tip)?;

        Ok(StreamwiseCounts {
            forebody: divisions(layout.x_ramp_start)?,
            first_ramp: divisions(layout.x_kink - layout.x_ramp_start)?,
            second_ramp: divisions(layout.x_throat_start - layout.x_kink)?,
            cowl,
            wake,
            throat: cowl + wake,
        })
    }
}

fn tags(curves: &[CurveTag]) -> Vec<u32> {
    curves.iter().map(|c| c.0).collect()
}

struct Block {
    boundary: [CurveTag; 4],
    reversed: [bool; 4],
    corners: [PointTag; 4],
}

pub fn build(params: &StructuredInletParameters) -> Result<GeoModel, CfdMeshError> {
    let mut model = GeoModel::new("inlet-structured-highres");
    let dims = &params.dimensions;
    let layout = InletLayout::derive(dims)?;
    let counts = StreamwiseCounts::new(&layout, params.total_divisions)?;
    let lc = Some(params.mesh_size);

    println!(
        "info: ramp kink at ({:.4}, {:.4}), streamwise counts {:?}",
        layout.x_kink, layout.kink.height, counts
    );

    let (x_start, x_ramp, x_kink, x_throat, x_tip, x_end) = (
        0.0,
        layout.x_ramp_start,
        layout.x_kink,
        layout.x_throat_start,
        layout.x_cowl_tip,
        layout.x_end,
    );
    let (y_split, y_top) = (layout.y_split, layout.y_top);

    // Bottom wall
    let p_inlet_wall = model.add_point(x_start, 0.0, lc)?;
    let p_ramp = model.add_point(x_ramp, 0.0, lc)?;
    let p_kink = model.add_point(x_kink, layout.kink.height, lc)?;
    let p_throat = model.add_point(x_throat, dims.ramp_height, lc)?;
    let p_out_wall = model.add_point(x_end, dims.ramp_height, lc)?;

    // Split line at cowl lip level
    let p_inlet_split = model.add_point(x_start, y_split, lc)?;
    let p_ramp_split = model.add_point(x_ramp, y_split, lc)?;
    let p_kink_split = model.add_point(x_kink, y_split, lc)?;
    let p_lip = model.add_point(x_throat, y_split, lc)?;

    // Cowl outer surface and wake
    let p_cowl_tip = model.add_point(x_tip, layout.y_cowl_top, lc)?;
    let p_out_cowl = model.add_point(x_end, layout.y_cowl_top, lc)?;
    let p_out_split = model.add_point(x_end, y_split, lc)?;

    // Top boundary
    let p_inlet_top = model.add_point(x_start, y_top, lc)?;
    let p_ramp_top = model.add_point(x_ramp, y_top, lc)?;
    let p_kink_top = model.add_point(x_kink, y_top, lc)?;
    let p_lip_top = model.add_point(x_throat, y_top, lc)?;
    let p_tip_top = model.add_point(x_tip, y_top, lc)?;
    let p_out_top = model.add_point(x_end, y_top, lc)?;

    // Streamwise lines
    let l_wall_1 = model.add_line(p_inlet_wall, p_ramp)?;
    let l_wall_2 = model.add_line(p_ramp, p_kink)?;
    let l_wall_3 = model.add_line(p_kink, p_throat)?;
    let l_throat_bot = model.add_line(p_throat, p_out_wall)?;

    let l_mid_1 = model.add_line(p_inlet_split, p_ramp_split)?;
    let l_mid_2 = model.add_line(p_ramp_split, p_kink_split)?;
    let l_mid_3 = model.add_line(p_kink_split, p_lip)?;

    let l_throat_top = model.add_line(p_out_split, p_lip)?;
    let l_cowl_top = model.add_line(p_lip, p_cowl_tip)?;
    let l_cowl_back = model.add_line(p_cowl_tip, p_out_cowl)?;

    let l_top_1 = model.add_line(p_inlet_top, p_ramp_top)?;
    let l_top_2 = model.add_line(p_ramp_top, p_kink_top)?;
    let l_top_3 = model.add_line(p_kink_top, p_lip_top)?;
    let l_top_4 = model.add_line(p_lip_top, p_tip_top)?;
    let l_top_5 = model.add_line(p_tip_top, p_out_top)?;

    // Wall-normal lines
    let l_inlet_bot = model.add_line(p_inlet_wall, p_inlet_split)?;
    let l_inlet_top = model.add_line(p_inlet_split, p_inlet_top)?;

    let l_v1_bot = model.add_line(p_ramp, p_ramp_split)?;
    let l_v1_top = model.add_line(p_ramp_split, p_ramp_top)?;

    let l_v2_bot = model.add_line(p_kink, p_kink_split)?;
    let l_v2_top = model.add_line(p_kink_split, p_kink_top)?;

    let l_throat_inlet = model.add_line(p_throat, p_lip)?;
    let l_v3 = model.add_line(p_lip, p_lip_top)?;

    let l_v4 = model.add_line(p_cowl_tip, p_tip_top)?;
    let l_out_int = model.add_line(p_out_wall, p_out_split)?;
    let l_out_ext = model.add_line(p_out_cowl, p_out_top)?;

    // Each block: bottom, right, top (reversed), left (reversed)
    let quad = |bottom, right, top, left, corners| Block {
        boundary: [bottom, right, top, left],
        reversed: [false, false, true, true],
        corners,
    };
    let blocks = [
        quad(
            l_wall_1,
            l_v1_bot,
            l_mid_1,
            l_inlet_bot,
            [p_inlet_wall, p_ramp, p_ramp_split, p_inlet_split],
        ),
        quad(
            l_mid_1,
            l_v1_top,
            l_top_1,
            l_inlet_top,
            [p_inlet_split, p_ramp_split, p_ramp_top, p_inlet_top],
        ),
        quad(l_wall_2, l_v2_bot, l_mid_2, l_v1_bot, [p_ramp, p_kink, p_kink_split, p_ramp_split]),
        quad(
            l_mid_2,
            l_v2_top,
            l_top_2,
            l_v1_top,
            [p_ramp_split, p_kink_split, p_kink_top, p_ramp_top],
        ),
        quad(l_wall_3, l_throat_inlet, l_mid_3, l_v2_bot, [p_kink, p_throat, p_lip, p_kink_split]),
        quad(l_mid_3, l_v3, l_top_3, l_v2_top, [p_kink_split, p_lip, p_lip_top, p_kink_top]),
        // the throat's upper wall runs from the outlet back to the lip
        Block {
            boundary: [l_throat_bot, l_out_int, l_throat_top, l_throat_inlet],
            reversed: [false, false, false, true],
            corners: [p_throat, p_out_wall, p_out_split, p_lip],
        },
        quad(l_cowl_top, l_v4, l_top_4, l_v3, [p_lip, p_cowl_tip, p_tip_top, p_lip_top]),
        quad(l_cowl_back, l_out_ext, l_top_5, l_v4, [p_cowl_tip, p_out_cowl, p_out_top, p_tip_top]),
    ];

    let mut surfaces: Vec<SurfaceTag> = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let mut curves = Vec::with_capacity(4);
        for (curve, reversed) in block.boundary.iter().zip(block.reversed) {
            curves.push(if reversed { -*curve } else { (*curve).into() });
        }
        let cl = model.add_curve_loop(&curves)?;
        surfaces.push(model.add_plane_surface(&[cl])?);
    }

    // Streamwise distribution
    let uniform = Distribution::Progression(1.0);
    model.set_transfinite_curves(&[l_wall_1, l_mid_1, l_top_1], counts.forebody, uniform)?;
    model.set_transfinite_curves(&[l_wall_2, l_mid_2, l_top_2], counts.first_ramp, uniform)?;
    model.set_transfinite_curves(&[l_wall_3, l_mid_3, l_top_3], counts.second_ramp, uniform)?;
    model.set_transfinite_curves(&[l_throat_bot, l_throat_top], counts.throat, uniform)?;
    model.set_transfinite_curves(&[l_cowl_top, l_top_4], counts.cowl, uniform)?;
    model.set_transfinite_curves(&[l_cowl_back, l_top_5], counts.wake, uniform)?;

    // Wall-normal clustering towards the ramp
    model.set_transfinite_curves(
        &[l_inlet_bot, l_v1_bot, l_v2_bot],
        params.ny_wall,
        Distribution::Progression(params.wall_progression),
    )?;
    model.set_transfinite_curves(
        &[l_inlet_top, l_v1_top, l_v2_top, l_v3],
        params.ny_far,
        Distribution::Progression(params.far_progression),
    )?;
    // Throat is clustered against both walls
    model.set_transfinite_curves(
        &[l_throat_inlet, l_out_int],
        params.ny_wall,
        Distribution::Bump(params.throat_bump),
    )?;
    model.set_transfinite_curves(
        &[l_v4, l_out_ext],
        params.ny_far,
        Distribution::Progression(params.cowl_progression),
    )?;

    for (surface, block) in surfaces.iter().zip(&blocks) {
        model.set_transfinite_surface(*surface, block.corners)?;
    }

    let surface_tags: Vec<u32> = surfaces.iter().map(|s| s.0).collect();
    model.add_physical_group(PhysicalDim::Surface, &surface_tags, "fluid")?;

    model.add_physical_group(PhysicalDim::Curve, &tags(&[l_inlet_bot, l_inlet_top]), "inlet")?;
    model.add_physical_group(PhysicalDim::Curve, &tags(&[l_out_int, l_out_ext]), "outlet")?;
    model.add_physical_group(
        PhysicalDim::Curve,
        &tags(&[l_top_1, l_top_2, l_top_3, l_top_4, l_top_5]),
        "top",
    )?;
    model.add_physical_group(
        PhysicalDim::Curve,
        &tags(&[
            l_wall_1,
            l_wall_2,
            l_wall_3,
            l_throat_bot,
            l_throat_top,
            l_cowl_top,
            l_cowl_back,
        ]),
        "wall",
    )?;

    model.options_mut().recombine_all = true;

    model.check_within(
        Point2::origin(),
        Point2::new(dims.domain_length, dims.domain_height),
    )?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nine_blocks_are_built() {
        let model = build(&StructuredInletParameters::default()).unwrap();

        assert_eq!(model.points().count(), 18);
        assert_eq!(model.lines().count(), 26);
        assert_eq!(model.surfaces().count(), 9);
        assert_eq!(model.transfinite_surfaces().len(), 9);
        assert!(model.options().recombine_all);
        assert!(model.options().algorithm.is_none());
    }

    #[test]
    fn streamwise_counts_follow_segment_lengths() {
        let params = StructuredInletParameters::default();
        let layout = InletLayout::derive(&params.dimensions).unwrap();

        let counts = StreamwiseCounts::new(&layout, params.total_divisions).unwrap();

        assert_eq!(counts.forebody, 39);
        assert_eq!(counts.first_ramp, 346);
        assert_eq!(counts.second_ramp, 190);
        assert_eq!(counts.cowl, 91);
        assert_eq!(counts.wake, 357);
        assert_eq!(counts.throat, 448);
    }

    #[test]
    fn kink_point_lies_on_both_ramps() {
        let model = build(&StructuredInletParameters::default()).unwrap();

        let kink = model.point(PointTag(3)).unwrap().position;
        let t1 = 10.0_f64.to_radians().tan();
        let t2 = 22.0_f64.to_radians().tan();
        assert_relative_eq!(kink.y, t1 * (kink.x - 6.0), epsilon = 1e-10);
        assert_relative_eq!(kink.y, 21.0 - t2 * (87.7 - kink.x), epsilon = 1e-9);
    }

    #[test]
    fn throat_uses_bump_distribution() {
        let params = StructuredInletParameters::default();
        let model = build(&params).unwrap();

        let bumps: Vec<_> = model
            .transfinite_curves()
            .iter()
            .filter(|t| matches!(t.distribution, Distribution::Bump(_)))
            .collect();
        assert_eq!(bumps.len(), 1);
        assert_eq!(bumps[0].nodes, params.ny_wall);
        assert_eq!(bumps[0].curves.len(), 2);
    }

    #[test]
    fn coarse_grid_rejects_degenerate_blocks() {
        let params = StructuredInletParameters {
            total_divisions: 20,
            ..Default::default()
        };
        assert!(build(&params).is_err());
    }
}
