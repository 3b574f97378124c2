use geo_types::Point;
use std::fmt;

/// A (longitude, latitude) pair in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    lng: f64,
    lat: f64,
}

impl Location {
    pub fn new(lng: f64, lat: f64) -> Result<Self, String> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(format!("coordinate ({}, {}) is not finite", lng, lat));
        }
        Ok(Self { lng, lat })
    }
}

impl From<Location> for [f64; 2] {
    fn from(loc: Location) -> Self {
        [loc.lng, loc.lat]
    }
}

impl From<Location> for Point<f64> {
    fn from(loc: Location) -> Self {
        Point::new(loc.lng, loc.lat)
    }
}

/// Renders the location as a WKT point.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "POINT ({} {})", self.lng, self.lat)
    }
}
