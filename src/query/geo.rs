//! Geographical points and the cell-covering collaborator.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkewerError};

/// A geographical point with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new geographical point.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(SkewerError::query(format!(
                "Invalid latitude: {lat} (must be between -90 and 90)"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(SkewerError::query(format!(
                "Invalid longitude: {lng} (must be between -180 and 180)"
            )));
        }

        Ok(GeoPoint { lat, lng })
    }

    /// Render as `lat,lng`, the form both backends accept for point params.
    pub fn to_param(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Turns a region into the opaque cell tokens a point field was indexed with.
///
/// Implementations live outside this crate. The returned tokens are matched
/// as ordinary exact terms.
pub trait CellCoverer: Send + Sync {
    /// Cells covering the circle of `radius_m` meters around `center`.
    fn cover(&self, center: GeoPoint, radius_m: f64) -> Vec<String>;
}
