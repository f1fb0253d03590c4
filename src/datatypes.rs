use std::fmt::Display;
use std::ops::Neg;

use nalgebra::Point2;

macro_rules! tag_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

tag_type!(
    /// Handle of a geometry point
    PointTag
);
tag_type!(
    /// Handle of a straight line segment
    CurveTag
);
tag_type!(
    /// Handle of a closed curve loop
    LoopTag
);
tag_type!(
    /// Handle of a plane surface
    SurfaceTag
);
tag_type!(
    /// Handle of a mesh size field
    FieldTag
);

/// A curve as it appears inside a curve loop. Reversed curves are
/// traversed from their end point to their start point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveRef {
    pub curve: CurveTag,
    pub reversed: bool,
}

impl From<CurveTag> for CurveRef {
    fn from(curve: CurveTag) -> Self {
        CurveRef {
            curve,
            reversed: false,
        }
    }
}

impl Neg for CurveTag {
    type Output = CurveRef;

    fn neg(self) -> CurveRef {
        CurveRef {
            curve: self,
            reversed: true,
        }
    }
}

impl Neg for CurveRef {
    type Output = CurveRef;

    fn neg(self) -> CurveRef {
        CurveRef {
            curve: self.curve,
            reversed: !self.reversed,
        }
    }
}

impl Display for CurveRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reversed {
            write!(f, "-{}", self.curve)
        } else {
            write!(f, "{}", self.curve)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Point2<f64>,
    /// Target element size at this point; `None` leaves it to the fields
    pub mesh_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: PointTag,
    pub end: PointTag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurveLoop {
    pub curves: Vec<CurveRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaneSurface {
    /// Outer boundary first, holes after
    pub loops: Vec<LoopTag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    pub curves: Vec<CurveTag>,
    pub size: f64,
    pub ratio: f64,
    pub thickness: f64,
    pub quads: bool,
    pub fan_points: Vec<PointTag>,
    pub fan_point_sizes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Distance {
        curves: Vec<CurveTag>,
    },
    Threshold {
        in_field: FieldTag,
        size_min: f64,
        size_max: f64,
        dist_min: f64,
        dist_max: f64,
    },
    BoundaryLayer(BoundaryLayer),
}

impl Field {
    pub fn kind(&self) -> &'static str {
        match self {
            Field::Distance { .. } => "Distance",
            Field::Threshold { .. } => "Threshold",
            Field::BoundaryLayer(_) => "BoundaryLayer",
        }
    }
}

/// Node spacing along a transfinite curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    /// Geometric growth by the given ratio; 1.0 is uniform
    Progression(f64),
    /// Refinement towards both ends
    Bump(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransfiniteCurves {
    pub curves: Vec<CurveTag>,
    pub nodes: usize,
    pub distribution: Distribution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransfiniteSurface {
    pub surface: SurfaceTag,
    pub corners: [PointTag; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalDim {
    Curve,
    Surface,
}

impl PhysicalDim {
    pub fn dimension(&self) -> u8 {
        match self {
            PhysicalDim::Curve => 1,
            PhysicalDim::Surface => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalGroup {
    pub dim: PhysicalDim,
    pub tag: u32,
    pub name: String,
    pub entities: Vec<u32>,
}

/// 2D meshing algorithms understood by Gmsh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    MeshAdapt,
    Automatic,
    Delaunay,
    FrontalDelaunay,
    Bamg,
    FrontalQuad,
    PackingOfParallelograms,
    QuasiStructuredQuad,
}

impl Algorithm {
    pub fn gmsh_id(&self) -> u32 {
        match self {
            Algorithm::MeshAdapt => 1,
            Algorithm::Automatic => 2,
            Algorithm::Delaunay => 5,
            Algorithm::FrontalDelaunay => 6,
            Algorithm::Bamg => 7,
            Algorithm::FrontalQuad => 8,
            Algorithm::PackingOfParallelograms => 9,
            Algorithm::QuasiStructuredQuad => 11,
        }
    }

    pub fn from_gmsh_id(id: u32) -> Option<Algorithm> {
        match id {
            1 => Some(Algorithm::MeshAdapt),
            2 => Some(Algorithm::Automatic),
            5 => Some(Algorithm::Delaunay),
            6 => Some(Algorithm::FrontalDelaunay),
            7 => Some(Algorithm::Bamg),
            8 => Some(Algorithm::FrontalQuad),
            9 => Some(Algorithm::PackingOfParallelograms),
            11 => Some(Algorithm::QuasiStructuredQuad),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshOptions {
    pub algorithm: Option<Algorithm>,
    pub recombine_all: bool,
}
