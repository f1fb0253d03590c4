use nalgebra::{Matrix2, Vector2};

use crate::error::CfdMeshError;

/// Where the two ramp segments of a double-wedge intake meet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kink {
    /// Streamwise distance from the ramp start
    pub length: f64,
    /// Height above the ramp start
    pub height: f64,
}

/// Locates the kink of a two-segment ramp.
///
/// The first segment leaves the origin at `angle_one_deg`, the second
/// arrives at `(ramp_length, ramp_height)` at `angle_two_deg`. The kink is
/// the intersection of the two segments.
///
/// # Arguments
/// * `angle_one_deg` - Inclination of the first ramp segment, in degrees
/// * `angle_two_deg` - Inclination of the second ramp segment, in degrees
/// * `ramp_length` - Streamwise length of the whole ramp
/// * `ramp_height` - Total rise of the ramp
///
/// # Returns
/// The kink offset relative to the ramp start
pub fn kink_point(
    angle_one_deg: f64,
    angle_two_deg: f64,
    ramp_length: f64,
    ramp_height: f64,
) -> Result<Kink, CfdMeshError> {
    let slope_one = angle_one_deg.to_radians().tan();
    let slope_two = angle_two_deg.to_radians().tan();

    // y - s1 x = 0
    // y - s2 x = h - s2 l
    let system = Matrix2::new(-slope_one, 1.0, -slope_two, 1.0);
    let rhs = Vector2::new(0.0, ramp_height - slope_two * ramp_length);

    let solution = match system.lu().solve(&rhs) {
        Some(s) if s.iter().all(|v| v.is_finite()) => s,
        _ => {
            return Err(CfdMeshError::Geometry(format!(
                "Ramp angles {angle_one_deg} and {angle_two_deg} give parallel segments"
            )))
        }
    };

    let kink = Kink {
        length: solution[0],
        height: solution[1],
    };

    if !(kink.length > 0.0 && kink.length < ramp_length) {
        return Err(CfdMeshError::Geometry(format!(
            "Ramp kink at x = {:.4} lies outside the ramp (0, {})",
            kink.length, ramp_length
        )));
    }

    Ok(kink)
}

/// Cells covering a segment, as a share of `total_divisions`. Halves round
/// to the even neighbour.
pub fn streamwise_divisions(
    segment_length: f64,
    total_length: f64,
    total_divisions: usize,
) -> Result<usize, CfdMeshError> {
    if !(total_length > 0.0) {
        return Err(CfdMeshError::Geometry(format!(
            "Total length must be positive, got {total_length}"
        )));
    }

    let count = (segment_length / total_length * total_divisions as f64).round_ties_even();
    if !(count >= 2.0) {
        return Err(CfdMeshError::Geometry(format!(
            "Segment of length {segment_length} gets {count} divisions; at least 2 are needed"
        )));
    }

    Ok(count as usize)
}

/// Fixed dimensions of a mixed-compression intake with a double ramp and
/// a wedge cowl
#[derive(Debug, Clone, PartialEq)]
pub struct InletDimensions {
    pub domain_length: f64,
    pub domain_height: f64,
    pub intake_length: f64,
    pub intake_height: f64,
    pub throat_height: f64,
    pub ramp_length: f64,
    pub ramp_height: f64,
    pub ramp_angle_one: f64,
    pub ramp_angle_two: f64,
    pub cowl_angle: f64,
    pub cowl_height: f64,
}

/// Coordinates derived from [`InletDimensions`]
#[derive(Debug, Clone, PartialEq)]
pub struct InletLayout {
    pub kink: Kink,
    pub x_ramp_start: f64,
    pub x_kink: f64,
    pub x_throat_start: f64,
    pub x_cowl_tip: f64,
    pub x_end: f64,
    /// Height of the cowl lip and of the inner cowl wall
    pub y_split: f64,
    pub y_cowl_top: f64,
    pub y_top: f64,
}

impl InletLayout {
    pub fn derive(dims: &InletDimensions) -> Result<InletLayout, CfdMeshError> {
        let kink = kink_point(
            dims.ramp_angle_one,
            dims.ramp_angle_two,
            dims.ramp_length,
            dims.ramp_height,
        )?;

        let cowl_slope = dims.cowl_angle.to_radians().tan();
        if !(cowl_slope > 0.0) || !cowl_slope.is_finite() {
            return Err(CfdMeshError::Geometry(format!(
                "Cowl angle must lie strictly between 0 and 90 degrees, got {}",
                dims.cowl_angle
            )));
        }

        let x_ramp_start = dims.domain_length - dims.intake_length;
        let x_throat_start = x_ramp_start + dims.ramp_length;
        let layout = InletLayout {
            kink,
            x_ramp_start,
            x_kink: x_ramp_start + kink.length,
            x_throat_start,
            x_cowl_tip: x_throat_start + dims.cowl_height / cowl_slope,
            x_end: dims.domain_length,
            y_split: dims.ramp_height + dims.throat_height,
            y_cowl_top: dims.intake_height,
            y_top: dims.domain_height,
        };

        if layout.x_ramp_start < 0.0 {
            return Err(CfdMeshError::Geometry(format!(
                "Intake length {} exceeds the domain length {}",
                dims.intake_length, dims.domain_length
            )));
        }
        if !(layout.x_cowl_tip < layout.x_end) {
            return Err(CfdMeshError::Geometry(format!(
                "Cowl tip at x = {:.4} does not fit in the domain length {}",
                layout.x_cowl_tip, layout.x_end
            )));
        }
        if !(kink.height > 0.0 && kink.height < layout.y_split) {
            return Err(CfdMeshError::Geometry(format!(
                "Kink height {:.4} must lie between the wall and the cowl lip at y = {}",
                kink.height, layout.y_split
            )));
        }
        if !(layout.y_split < layout.y_cowl_top && layout.y_cowl_top < layout.y_top) {
            return Err(CfdMeshError::Geometry(format!(
                "Intake heights must satisfy ramp + throat ({}) < intake ({}) < domain ({})",
                layout.y_split, layout.y_cowl_top, layout.y_top
            )));
        }

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn kink_satisfies_both_ramp_segments() {
        let (theta_one, theta_two) = (10.0_f64, 22.0_f64);
        let (ramp_length, ramp_height) = (81.7, 21.0);

        let kink = kink_point(theta_one, theta_two, ramp_length, ramp_height).unwrap();

        let t1 = theta_one.to_radians().tan();
        let t2 = theta_two.to_radians().tan();
        assert_relative_eq!(t1 * kink.length, kink.height, epsilon = 1e-10);
        assert_relative_eq!(
            ramp_height - t2 * ramp_length,
            kink.length * (t1 - t2),
            epsilon = 1e-10
        );
        assert_relative_eq!(kink.length, 52.7404, epsilon = 1e-3);
        assert_relative_eq!(kink.height, 9.2996, epsilon = 1e-3);
    }

    #[test]
    fn parallel_ramp_segments_have_no_kink() {
        let err = kink_point(15.0, 15.0, 81.7, 21.0).unwrap_err();
        assert!(matches!(err, CfdMeshError::Geometry(_)));
    }

    #[test]
    fn kink_beyond_ramp_is_rejected() {
        // too little rise for the second segment pushes the kink past the ramp end
        assert!(kink_point(10.0, 22.0, 81.7, 5.0).is_err());
    }

    #[test]
    fn divisions_round_half_to_even() {
        assert_eq!(streamwise_divisions(3.0, 8.0, 12).unwrap(), 4);
        assert_eq!(streamwise_divisions(5.0, 8.0, 12).unwrap(), 8);
        assert_eq!(streamwise_divisions(6.0, 156.0, 1024).unwrap(), 39);
        assert!(streamwise_divisions(0.01, 156.0, 1024).is_err());
    }

    #[test]
    fn layout_places_intake_at_domain_end() {
        let dims = InletDimensions {
            domain_length: 156.0,
            domain_height: 60.0,
            intake_length: 150.0,
            intake_height: 44.0,
            throat_height: 15.0,
            ramp_length: 81.7,
            ramp_height: 21.0,
            ramp_angle_one: 10.0,
            ramp_angle_two: 22.0,
            cowl_angle: 30.0,
            cowl_height: 8.0,
        };

        let layout = InletLayout::derive(&dims).unwrap();

        assert_relative_eq!(layout.x_ramp_start, 6.0);
        assert_relative_eq!(layout.x_throat_start, 87.7, epsilon = 1e-12);
        assert_relative_eq!(layout.x_cowl_tip, 87.7 + 8.0 * 3.0_f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(layout.y_split, 36.0);
        assert_relative_eq!(layout.x_kink, 6.0 + layout.kink.length);

        let cramped = InletDimensions {
            domain_height: 40.0,
            ..dims
        };
        assert!(InletLayout::derive(&cramped).is_err());
    }

    #[test]
    fn kink_above_the_cowl_lip_is_rejected() {
        let dims = InletDimensions {
            domain_length: 500.0,
            domain_height: 250.0,
            intake_length: 150.0,
            intake_height: 44.0,
            throat_height: 15.0,
            ramp_length: 81.7,
            ramp_height: 21.0,
            ramp_angle_one: 40.0,
            ramp_angle_two: -30.0,
            cowl_angle: 30.0,
            cowl_height: 8.0,
        };

        // the ramps still meet inside (0, ramp_length), but at y ~ 40.4 > 36
        let kink = kink_point(40.0, -30.0, 81.7, 21.0).unwrap();
        assert!(kink.height > 36.0);

        let err = InletLayout::derive(&dims).unwrap_err();
        assert!(matches!(err, CfdMeshError::Geometry(_)));
    }
}
