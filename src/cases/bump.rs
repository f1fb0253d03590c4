use nalgebra::Point2;

use crate::{
    config::{Parameters, Slot},
    datatypes::{Algorithm, BoundaryLayer, Field},
    error::CfdMeshError,
    model::GeoModel,
};

/// Channel whose lower wall carries a symmetric triangular bump
#[derive(Debug, Clone, PartialEq)]
pub struct BumpParameters {
    pub mesh_size: f64,
    pub domain_length: f64,
    pub domain_height: f64,
    pub bump_start: f64,
    pub bump_length: f64,
    pub bump_height: f64,
    pub layer_size: f64,
    pub layer_ratio: f64,
    pub layer_thickness: f64,
}

impl Default for BumpParameters {
    fn default() -> Self {
        BumpParameters {
            mesh_size: 0.1,
            domain_length: 2.0,
            domain_height: 1.0,
            bump_start: 0.5,
            bump_length: 1.0,
            bump_height: 0.3,
            layer_size: 0.005,
            layer_ratio: 1.1,
            layer_thickness: 0.2,
        }
    }
}

impl Parameters for BumpParameters {
    fn slots(&mut self) -> Vec<(&'static str, Slot<'_>)> {
        vec![
            ("mesh_size", Slot::Real(&mut self.mesh_size)),
            ("domain_length", Slot::Real(&mut self.domain_length)),
            ("domain_height", Slot::Real(&mut self.domain_height)),
            ("bump_start", Slot::Real(&mut self.bump_start)),
            ("bump_length", Slot::Real(&mut self.bump_length)),
            ("bump_height", Slot::Real(&mut self.bump_height)),
            ("layer_size", Slot::Real(&mut self.layer_size)),
            ("layer_ratio", Slot::Real(&mut self.layer_ratio)),
            ("layer_thickness", Slot::Real(&mut self.layer_thickness)),
        ]
    }
}

pub fn build(params: &BumpParameters) -> Result<GeoModel, CfdMeshError> {
    let mut model = GeoModel::new("bump");
    let lc = Some(params.mesh_size);
    let bump_end = params.bump_start + params.bump_length;

    if !(params.bump_length > 0.0) {
        return Err(CfdMeshError::Geometry(format!(
            "Bump length must be positive, got {}",
            params.bump_length
        )));
    }
    if !(params.bump_start > 0.0 && bump_end < params.domain_length) {
        return Err(CfdMeshError::Geometry(format!(
            "Bump from {} to {} must lie strictly inside the channel length {}",
            params.bump_start, bump_end, params.domain_length
        )));
    }
    if !(params.bump_height > 0.0 && params.bump_height < params.domain_height) {
        return Err(CfdMeshError::Geometry(format!(
            "Bump height {} must lie strictly between 0 and the channel height {}",
            params.bump_height, params.domain_height
        )));
    }

    let p1 = model.add_point(0.0, 0.0, lc)?;
    let p2 = model.add_point(params.bump_start, 0.0, lc)?;
    let apex = model.add_point(
        params.bump_start + params.bump_length / 2.0,
        params.bump_height,
        lc,
    )?;
    let p4 = model.add_point(bump_end, 0.0, lc)?;
    let p5 = model.add_point(params.domain_length, 0.0, lc)?;
    let p6 = model.add_point(params.domain_length, params.domain_height, lc)?;
    let p7 = model.add_point(0.0, params.domain_height, lc)?;

    let l1 = model.add_line(p1, p2)?;
    let l2 = model.add_line(p2, apex)?;
    let l3 = model.add_line(apex, p4)?;
    let l4 = model.add_line(p4, p5)?;
    let l5 = model.add_line(p5, p6)?;
    let l6 = model.add_line(p6, p7)?;
    let l7 = model.add_line(p7, p1)?;

    let cl = model.add_curve_loop(&[
        l1.into(),
        l2.into(),
        l3.into(),
        l4.into(),
        l5.into(),
        l6.into(),
        l7.into(),
    ])?;
    model.add_plane_surface(&[cl])?;

    let bl = model.add_field(Field::BoundaryLayer(BoundaryLayer {
        curves: vec![l1, l2, l3, l4],
        size: params.layer_size,
        ratio: params.layer_ratio,
        thickness: params.layer_thickness,
        quads: true,
        fan_points: vec![apex],
        fan_point_sizes: Vec::new(),
    }))?;
    model.set_boundary_layer(bl)?;

    model.set_algorithm(Algorithm::FrontalDelaunay);

    model.check_within(
        Point2::origin(),
        Point2::new(params.domain_length, params.domain_height),
    )?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::PointTag;

    #[test]
    fn apex_sits_midway_along_the_bump() {
        let model = build(&BumpParameters::default()).unwrap();

        assert_eq!(model.points().count(), 7);
        assert_eq!(model.curve_loops().count(), 1);
        let apex = model.point(PointTag(3)).unwrap();
        assert_eq!(apex.position, Point2::new(1.0, 0.3));
    }

    #[test]
    fn boundary_layer_covers_lower_wall_only() {
        let model = build(&BumpParameters::default()).unwrap();

        assert!(model.background_field().is_none());
        let bl = model.boundary_layer().unwrap();
        match model.field(bl).unwrap() {
            Field::BoundaryLayer(layer) => {
                assert_eq!(layer.curves.len(), 4);
                assert_eq!(layer.fan_points, vec![PointTag(3)]);
                assert!(layer.fan_point_sizes.is_empty());
            }
            other => panic!("unexpected field {other:?}"),
        }
    }

    #[test]
    fn bump_must_fit_the_channel() {
        let params = BumpParameters {
            bump_length: 1.6,
            ..Default::default()
        };
        assert!(build(&params).is_err());

        let params = BumpParameters {
            bump_height: 1.0,
            ..Default::default()
        };
        assert!(build(&params).is_err());
    }

    #[test]
    fn bump_needs_positive_size() {
        for (bump_length, bump_height) in [(0.0, 0.3), (-0.4, 0.3), (1.0, 0.0)] {
            let params = BumpParameters {
                bump_length,
                bump_height,
                ..Default::default()
            };
            let err = build(&params).unwrap_err();
            assert!(matches!(err, CfdMeshError::Geometry(_)));
        }
    }
}
