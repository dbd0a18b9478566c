//! Viewport point filter

use crate::error::PointIssue;
use crate::types::{LatLng, LatLngBounds, Point};

/// A point that passed the filter, borrowed from the input set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisiblePoint<'a> {
    pub id: &'a str,
    pub location: LatLng,
}

#[derive(Debug, Default)]
pub struct FilterOutput<'a> {
    /// Points inside the viewport, in input order
    pub visible: Vec<VisiblePoint<'a>>,
    /// Points skipped because their location is missing or malformed
    pub malformed: Vec<PointIssue>,
}

/// Keep the points whose location lies inside `bounds` (edges included).
/// Points without a usable location are skipped and reported.
pub fn filter_visible<'a>(points: &'a [Point], bounds: &LatLngBounds) -> FilterOutput<'a> {
    let mut output = FilterOutput::default();

    for point in points {
        match point.location {
            Some(location) if location.is_valid() => {
                if bounds.contains(&location) {
                    output.visible.push(VisiblePoint { id: &point.id, location });
                }
            }
            _ => {
                log::warn!("Skipping point {}: missing or malformed location", point.id);
                output.malformed.push(PointIssue::MalformedLocation {
                    point_id: point.id.clone(),
                });
            }
        }
    }

    output
}
