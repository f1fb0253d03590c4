use nalgebra::Point2;

use crate::{
    datatypes::{
        Algorithm, BoundaryLayer, CurveLoop, CurveRef, CurveTag, Distribution, Field, FieldTag,
        Line, LoopTag, MeshOptions, PhysicalDim, PhysicalGroup, PlaneSurface, PointTag,
        SurfaceTag, TransfiniteCurves, TransfiniteSurface, Vertex,
    },
    error::CfdMeshError,
};

/// Relative slack allowed when checking points against domain bounds
const BOUNDS_TOLERANCE: f64 = 1e-9;

/// In-memory geometry of one case, registered the same way the Gmsh
/// built-in kernel registers entities. Tags are handed out sequentially
/// from 1 for each kind of entity.
#[derive(Debug, Clone, Default)]
pub struct GeoModel {
    name: String,
    points: Vec<Vertex>,
    lines: Vec<Line>,
    loops: Vec<CurveLoop>,
    surfaces: Vec<PlaneSurface>,
    fields: Vec<Field>,
    background_field: Option<FieldTag>,
    boundary_layer: Option<FieldTag>,
    transfinite_curves: Vec<TransfiniteCurves>,
    transfinite_surfaces: Vec<TransfiniteSurface>,
    physical_groups: Vec<PhysicalGroup>,
    options: MeshOptions,
}

fn next_tag(len: usize) -> u32 {
    len as u32 + 1
}

impl GeoModel {
    pub fn new(name: &str) -> GeoModel {
        GeoModel {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_point(
        &mut self,
        x: f64,
        y: f64,
        mesh_size: Option<f64>,
    ) -> Result<PointTag, CfdMeshError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(CfdMeshError::Geometry(format!(
                "Point ({x}, {y}) has a non-finite coordinate"
            )));
        }
        if let Some(size) = mesh_size {
            if !(size > 0.0) {
                return Err(CfdMeshError::Geometry(format!(
                    "Point ({x}, {y}) has non-positive mesh size {size}"
                )));
            }
        }

        let tag = PointTag(next_tag(self.points.len()));
        self.points.push(Vertex {
            position: Point2::new(x, y),
            mesh_size,
        });
        Ok(tag)
    }

    pub fn add_line(&mut self, start: PointTag, end: PointTag) -> Result<CurveTag, CfdMeshError> {
        let from = self.point(start)?.position;
        let to = self.point(end)?.position;
        if start == end {
            return Err(CfdMeshError::Geometry(format!(
                "Line cannot start and end at point {start}"
            )));
        }
        if from == to {
            return Err(CfdMeshError::Geometry(format!(
                "Line from point {start} to point {end} has zero length"
            )));
        }

        let tag = CurveTag(next_tag(self.lines.len()));
        self.lines.push(Line { start, end });
        Ok(tag)
    }

    /// Registers a closed loop of oriented curves
    pub fn add_curve_loop(&mut self, curves: &[CurveRef]) -> Result<LoopTag, CfdMeshError> {
        if curves.is_empty() {
            return Err(CfdMeshError::Geometry("Curve loop has no curves".to_owned()));
        }

        let mut endpoints: Vec<(PointTag, PointTag)> = Vec::with_capacity(curves.len());
        for curve_ref in curves {
            endpoints.push(self.oriented_endpoints(*curve_ref)?);
        }

        for (i, (_, end)) in endpoints.iter().enumerate() {
            let (next_start, _) = endpoints[(i + 1) % endpoints.len()];
            if *end != next_start {
                return Err(CfdMeshError::Geometry(format!(
                    "Curve loop is not closed: curve {} ends at point {} but curve {} starts at point {}",
                    curves[i],
                    end,
                    curves[(i + 1) % curves.len()],
                    next_start
                )));
            }
        }

        let tag = LoopTag(next_tag(self.loops.len()));
        self.loops.push(CurveLoop {
            curves: curves.to_vec(),
        });
        Ok(tag)
    }

    /// Registers a plane surface. The first loop bounds the surface, any
    /// further loops are holes.
    pub fn add_plane_surface(&mut self, loops: &[LoopTag]) -> Result<SurfaceTag, CfdMeshError> {
        if loops.is_empty() {
            return Err(CfdMeshError::Geometry(
                "Plane surface needs at least one curve loop".to_owned(),
            ));
        }
        for tag in loops {
            self.curve_loop(*tag)?;
        }

        let tag = SurfaceTag(next_tag(self.surfaces.len()));
        self.surfaces.push(PlaneSurface {
            loops: loops.to_vec(),
        });
        Ok(tag)
    }

    pub fn add_field(&mut self, field: Field) -> Result<FieldTag, CfdMeshError> {
        match &field {
            Field::Distance { curves } => {
                self.check_curves(curves, "Distance")?;
            }
            Field::Threshold {
                in_field,
                size_min,
                size_max,
                dist_min,
                dist_max,
            } => {
                self.field(*in_field)?;
                if !(*size_min > 0.0) || size_min > size_max {
                    return Err(CfdMeshError::Geometry(format!(
                        "Threshold field needs 0 < SizeMin <= SizeMax, got {size_min} and {size_max}"
                    )));
                }
                if *dist_min < 0.0 || dist_min > dist_max {
                    return Err(CfdMeshError::Geometry(format!(
                        "Threshold field needs 0 <= DistMin <= DistMax, got {dist_min} and {dist_max}"
                    )));
                }
            }
            Field::BoundaryLayer(layer) => self.check_boundary_layer(layer)?,
        }

        let tag = FieldTag(next_tag(self.fields.len()));
        self.fields.push(field);
        Ok(tag)
    }

    fn check_boundary_layer(&self, layer: &BoundaryLayer) -> Result<(), CfdMeshError> {
        self.check_curves(&layer.curves, "BoundaryLayer")?;
        if !(layer.size > 0.0) || !(layer.thickness > 0.0) {
            return Err(CfdMeshError::Geometry(format!(
                "BoundaryLayer field needs positive Size and Thickness, got {} and {}",
                layer.size, layer.thickness
            )));
        }
        if layer.size > layer.thickness {
            return Err(CfdMeshError::Geometry(format!(
                "BoundaryLayer first cell size {} exceeds the layer thickness {}",
                layer.size, layer.thickness
            )));
        }
        if !(layer.ratio >= 1.0) {
            return Err(CfdMeshError::Geometry(format!(
                "BoundaryLayer growth ratio must be at least 1, got {}",
                layer.ratio
            )));
        }
        for point in &layer.fan_points {
            self.point(*point)?;
        }
        if !layer.fan_point_sizes.is_empty()
            && layer.fan_point_sizes.len() != layer.fan_points.len()
        {
            return Err(CfdMeshError::Geometry(format!(
                "BoundaryLayer has {} fan points but {} fan sizes",
                layer.fan_points.len(),
                layer.fan_point_sizes.len()
            )));
        }
        Ok(())
    }

    pub fn set_background_field(&mut self, tag: FieldTag) -> Result<(), CfdMeshError> {
        self.field(tag)?;
        self.background_field = Some(tag);
        Ok(())
    }

    pub fn set_boundary_layer(&mut self, tag: FieldTag) -> Result<(), CfdMeshError> {
        let field = self.field(tag)?;
        if !matches!(field, Field::BoundaryLayer(_)) {
            return Err(CfdMeshError::Geometry(format!(
                "Field {tag} is a {} field, not a BoundaryLayer",
                field.kind()
            )));
        }

        self.boundary_layer = Some(tag);
        Ok(())
    }

    pub fn set_transfinite_curves(
        &mut self,
        curves: &[CurveTag],
        nodes: usize,
        distribution: Distribution,
    ) -> Result<(), CfdMeshError> {
        self.check_curves(curves, "Transfinite")?;
        if nodes < 2 {
            return Err(CfdMeshError::Geometry(format!(
                "Transfinite curves need at least 2 nodes, got {nodes}"
            )));
        }
        let coefficient = match distribution {
            Distribution::Progression(c) | Distribution::Bump(c) => c,
        };
        if !(coefficient > 0.0) {
            return Err(CfdMeshError::Geometry(format!(
                "Transfinite distribution coefficient must be positive, got {coefficient}"
            )));
        }

        self.transfinite_curves.push(TransfiniteCurves {
            curves: curves.to_vec(),
            nodes,
            distribution,
        });
        Ok(())
    }

    /// Marks a four-sided surface as transfinite with the given corners
    pub fn set_transfinite_surface(
        &mut self,
        surface: SurfaceTag,
        corners: [PointTag; 4],
    ) -> Result<(), CfdMeshError> {
        let plane = self.surface(surface)?;
        if plane.loops.len() != 1 {
            return Err(CfdMeshError::Geometry(format!(
                "Transfinite surface {surface} must be bounded by a single loop"
            )));
        }

        let boundary = self.curve_loop(plane.loops[0])?;
        let mut loop_points: Vec<PointTag> = Vec::with_capacity(boundary.curves.len());
        for curve_ref in &boundary.curves {
            loop_points.push(self.oriented_endpoints(*curve_ref)?.0);
        }

        for corner in corners {
            if !loop_points.contains(&corner) {
                return Err(CfdMeshError::Geometry(format!(
                    "Point {corner} is not on the boundary of surface {surface}"
                )));
            }
        }

        self.transfinite_surfaces
            .push(TransfiniteSurface { surface, corners });
        Ok(())
    }

    pub fn add_physical_group(
        &mut self,
        dim: PhysicalDim,
        entities: &[u32],
        name: &str,
    ) -> Result<u32, CfdMeshError> {
        for entity in entities {
            let known = match dim {
                PhysicalDim::Curve => self.line(CurveTag(*entity)).is_ok(),
                PhysicalDim::Surface => self.surface(SurfaceTag(*entity)).is_ok(),
            };
            if !known {
                return Err(CfdMeshError::Geometry(format!(
                    "Physical group '{name}' references unknown entity {entity} of dimension {}",
                    dim.dimension()
                )));
            }
        }

        let tag = next_tag(
            self.physical_groups
                .iter()
                .filter(|group| group.dim == dim)
                .count(),
        );
        self.physical_groups.push(PhysicalGroup {
            dim,
            tag,
            name: name.to_owned(),
            entities: entities.to_vec(),
        });
        Ok(tag)
    }

    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut MeshOptions {
        &mut self.options
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.options.algorithm = Some(algorithm);
    }

    /// Fails if any point lies outside the rectangle spanned by `min` and `max`
    pub fn check_within(&self, min: Point2<f64>, max: Point2<f64>) -> Result<(), CfdMeshError> {
        let slack = BOUNDS_TOLERANCE * (max - min).norm().max(1.0);
        for (i, vertex) in self.points.iter().enumerate() {
            let p = vertex.position;
            if p.x < min.x - slack || p.x > max.x + slack || p.y < min.y - slack || p.y > max.y + slack
            {
                return Err(CfdMeshError::Geometry(format!(
                    "Point {} at ({}, {}) lies outside the domain [{}, {}] x [{}, {}]",
                    i + 1,
                    p.x,
                    p.y,
                    min.x,
                    max.x,
                    min.y,
                    max.y
                )));
            }
        }
        Ok(())
    }

    pub fn point(&self, tag: PointTag) -> Result<&Vertex, CfdMeshError> {
        lookup(&self.points, tag.0).ok_or_else(|| {
            CfdMeshError::Geometry(format!("Point {tag} has not been registered"))
        })
    }

    pub fn line(&self, tag: CurveTag) -> Result<&Line, CfdMeshError> {
        lookup(&self.lines, tag.0).ok_or_else(|| {
            CfdMeshError::Geometry(format!("Curve {tag} has not been registered"))
        })
    }

    pub fn curve_loop(&self, tag: LoopTag) -> Result<&CurveLoop, CfdMeshError> {
        lookup(&self.loops, tag.0).ok_or_else(|| {
            CfdMeshError::Geometry(format!("Curve loop {tag} has not been registered"))
        })
    }

    pub fn surface(&self, tag: SurfaceTag) -> Result<&PlaneSurface, CfdMeshError> {
        lookup(&self.surfaces, tag.0).ok_or_else(|| {
            CfdMeshError::Geometry(format!("Surface {tag} has not been registered"))
        })
    }

    pub fn field(&self, tag: FieldTag) -> Result<&Field, CfdMeshError> {
        lookup(&self.fields, tag.0).ok_or_else(|| {
            CfdMeshError::Geometry(format!("Field {tag} has not been registered"))
        })
    }

    pub fn points(&self) -> impl Iterator<Item = (PointTag, &Vertex)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, v)| (PointTag(next_tag(i)), v))
    }

    pub fn lines(&self) -> impl Iterator<Item = (CurveTag, &Line)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| (CurveTag(next_tag(i)), l))
    }

    pub fn curve_loops(&self) -> impl Iterator<Item = (LoopTag, &CurveLoop)> {
        self.loops
            .iter()
            .enumerate()
            .map(|(i, l)| (LoopTag(next_tag(i)), l))
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceTag, &PlaneSurface)> {
        self.surfaces
            .iter()
            .enumerate()
            .map(|(i, s)| (SurfaceTag(next_tag(i)), s))
    }

    pub fn fields(&self) -> impl Iterator<Item = (FieldTag, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, f)| (FieldTag(next_tag(i)), f))
    }

    pub fn background_field(&self) -> Option<FieldTag> {
        self.background_field
    }

    pub fn boundary_layer(&self) -> Option<FieldTag> {
        self.boundary_layer
    }

    pub fn transfinite_curves(&self) -> &[TransfiniteCurves] {
        &self.transfinite_curves
    }

    pub fn transfinite_surfaces(&self) -> &[TransfiniteSurface] {
        &self.transfinite_surfaces
    }

    pub fn physical_groups(&self) -> &[PhysicalGroup] {
        &self.physical_groups
    }

    fn oriented_endpoints(&self, curve_ref: CurveRef) -> Result<(PointTag, PointTag), CfdMeshError> {
        let line = self.line(curve_ref.curve)?;
        if curve_ref.reversed {
            Ok((line.end, line.start))
        } else {
            Ok((line.start, line.end))
        }
    }

    fn check_curves(&self, curves: &[CurveTag], context: &str) -> Result<(), CfdMeshError> {
        if curves.is_empty() {
            return Err(CfdMeshError::Geometry(format!(
                "{context} needs at least one curve"
            )));
        }
        for curve in curves {
            self.line(*curve)?;
        }
        Ok(())
    }
}

fn lookup<T>(items: &[T], tag: u32) -> Option<&T> {
    (tag as usize).checked_sub(1).and_then(|i| items.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(model: &mut GeoModel) -> ([PointTag; 4], [CurveTag; 4]) {
        let p1 = model.add_point(0.0, 0.0, Some(0.1)).unwrap();
        let p2 = model.add_point(1.0, 0.0, Some(0.1)).unwrap();
        let p3 = model.add_point(1.0, 1.0, Some(0.1)).unwrap();
        let p4 = model.add_point(0.0, 1.0, Some(0.1)).unwrap();
        let l1 = model.add_line(p1, p2).unwrap();
        let l2 = model.add_line(p2, p3).unwrap();
        let l3 = model.add_line(p3, p4).unwrap();
        let l4 = model.add_line(p4, p1).unwrap();
        ([p1, p2, p3, p4], [l1, l2, l3, l4])
    }

    #[test]
    fn tags_are_sequential_per_kind() {
        let mut model = GeoModel::new("square");
        let (points, lines) = unit_square(&mut model);

        assert_eq!(points, [PointTag(1), PointTag(2), PointTag(3), PointTag(4)]);
        assert_eq!(lines, [CurveTag(1), CurveTag(2), CurveTag(3), CurveTag(4)]);

        let cl = model
            .add_curve_loop(&[lines[0].into(), lines[1].into(), lines[2].into(), lines[3].into()])
            .unwrap();
        assert_eq!(cl, LoopTag(1));
        assert_eq!(model.add_plane_surface(&[cl]).unwrap(), SurfaceTag(1));
    }

    #[test]
    fn reversed_curves_close_a_loop() {
        let mut model = GeoModel::new("square");
        let ([p1, _, p3, _], [l1, l2, _, _]) = unit_square(&mut model);
        let diagonal = model.add_line(p1, p3).unwrap();

        assert!(model
            .add_curve_loop(&[l1.into(), l2.into(), -diagonal])
            .is_ok());
    }

    #[test]
    fn open_loop_is_rejected() {
        let mut model = GeoModel::new("square");
        let (_, [l1, l2, l3, _]) = unit_square(&mut model);

        let err = model
            .add_curve_loop(&[l1.into(), l2.into(), l3.into()])
            .unwrap_err();
        assert!(matches!(err, CfdMeshError::Geometry(_)));

        // wrong orientation
        assert!(model
            .add_curve_loop(&[l1.into(), -l2, l3.into()])
            .is_err());
    }

    #[test]
    fn dangling_references_are_rejected() {
        let mut model = GeoModel::new("square");
        let ([p1, ..], _) = unit_square(&mut model);

        assert!(model.add_line(p1, PointTag(42)).is_err());
        assert!(model.add_line(p1, p1).is_err());
        assert!(model.add_plane_surface(&[LoopTag(1)]).is_err());
        assert!(model
            .add_field(Field::Distance {
                curves: vec![CurveTag(9)]
            })
            .is_err());
        assert!(model.set_background_field(FieldTag(1)).is_err());
    }

    #[test]
    fn coincident_points_cannot_form_a_line() {
        let mut model = GeoModel::new("square");
        let ([p1, p2, ..], _) = unit_square(&mut model);
        let twin = model.add_point(1.0, 0.0, None).unwrap();

        let err = model.add_line(p2, twin).unwrap_err();
        assert!(matches!(err, CfdMeshError::Geometry(_)));
        assert_eq!(model.lines().count(), 4);
        assert!(model.add_line(p1, twin).is_ok());
    }

    #[test]
    fn threshold_field_validates_ranges() {
        let mut model = GeoModel::new("square");
        let (_, lines) = unit_square(&mut model);
        let dist = model
            .add_field(Field::Distance {
                curves: lines.to_vec(),
            })
            .unwrap();

        let bad = Field::Threshold {
            in_field: dist,
            size_min: 0.5,
            size_max: 0.1,
            dist_min: 0.1,
            dist_max: 0.5,
        };
        assert!(model.add_field(bad).is_err());

        let good = Field::Threshold {
            in_field: dist,
            size_min: 0.02,
            size_max: 0.2,
            dist_min: 0.1,
            dist_max: 0.5,
        };
        let thresh = model.add_field(good).unwrap();
        assert_eq!(thresh, FieldTag(2));
        model.set_background_field(thresh).unwrap();
        assert_eq!(model.background_field(), Some(thresh));

        // only boundary layer fields can be the boundary layer
        assert!(model.set_boundary_layer(thresh).is_err());
    }

    #[test]
    fn boundary_layer_fan_sizes_must_match_points() {
        let mut model = GeoModel::new("square");
        let ([p1, p2, ..], [l1, ..]) = unit_square(&mut model);

        let mismatched = BoundaryLayer {
            curves: vec![l1],
            size: 0.005,
            ratio: 1.1,
            thickness: 0.1,
            quads: true,
            fan_points: vec![p1, p2],
            fan_point_sizes: vec![4],
        };
        assert!(model
            .add_field(Field::BoundaryLayer(mismatched.clone()))
            .is_err());

        let layer = BoundaryLayer {
            fan_point_sizes: vec![4, 4],
            ..mismatched
        };
        let bl = model.add_field(Field::BoundaryLayer(layer)).unwrap();
        model.set_boundary_layer(bl).unwrap();
        assert_eq!(model.boundary_layer(), Some(bl));
    }

    #[test]
    fn transfinite_surface_corners_must_be_on_boundary() {
        let mut model = GeoModel::new("square");
        let (points, lines) = unit_square(&mut model);
        let stray = model.add_point(0.5, 0.5, None).unwrap();
        let cl = model
            .add_curve_loop(&[lines[0].into(), lines[1].into(), lines[2].into(), lines[3].into()])
            .unwrap();
        let s = model.add_plane_surface(&[cl]).unwrap();

        assert!(model
            .set_transfinite_surface(s, [points[0], points[1], points[2], stray])
            .is_err());
        model.set_transfinite_surface(s, points).unwrap();
        assert_eq!(model.transfinite_surfaces().len(), 1);

        assert!(model
            .set_transfinite_curves(&lines, 1, Distribution::Progression(1.0))
            .is_err());
        model
            .set_transfinite_curves(&lines, 10, Distribution::Bump(0.05))
            .unwrap();
    }

    #[test]
    fn physical_group_tags_count_per_dimension() {
        let mut model = GeoModel::new("square");
        let (_, [l1, l2, l3, l4]) = unit_square(&mut model);
        let cl = model
            .add_curve_loop(&[l1.into(), l2.into(), l3.into(), l4.into()])
            .unwrap();
        let s = model.add_plane_surface(&[cl]).unwrap();

        assert_eq!(
            model
                .add_physical_group(PhysicalDim::Surface, &[s.0], "fluid")
                .unwrap(),
            1
        );
        assert_eq!(
            model
                .add_physical_group(PhysicalDim::Curve, &[l1.0], "wall")
                .unwrap(),
            1
        );
        assert_eq!(
            model
                .add_physical_group(PhysicalDim::Curve, &[l2.0, l4.0], "farfield")
                .unwrap(),
            2
        );
        assert!(model
            .add_physical_group(PhysicalDim::Surface, &[7], "ghost")
            .is_err());
    }

    #[test]
    fn points_outside_bounds_are_reported() {
        let mut model = GeoModel::new("square");
        unit_square(&mut model);

        assert!(model
            .check_within(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
            .is_ok());
        model.add_point(1.5, 0.5, None).unwrap();
        assert!(model
            .check_within(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0))
            .is_err());
    }
}
