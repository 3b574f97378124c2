use crate::error::{Error, Result};
use crate::region::Region;
use geo::algorithm::map_coords::MapCoords;
use geo_types::{Coord, Geometry, MultiPolygon, Polygon};
use geojson::{GeoJson, JsonObject};
use std::convert::TryFrom;
use std::fs::read_to_string;
use std::path::Path;
use tracing::warn;

const EARTH_RADIUS: f64 = 6_378_137.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Crs {
    Wgs84,
    WebMercator,
}

impl Crs {
    fn from_name(name: &str) -> Result<Self> {
        let upper = name.to_ascii_uppercase();
        let code = upper
            .rsplit(|c: char| c == ':' || c == '/')
            .find(|part| !part.is_empty())
            .unwrap_or("");
        match code {
            "4326" | "CRS84" => Ok(Crs::Wgs84),
            "3857" | "900913" | "3785" => Ok(Crs::WebMercator),
            _ => Err(Error::Region(format!("unsupported crs {}", name))),
        }
    }

    fn from_members(members: Option<&JsonObject>) -> Result<Self> {
        let name = members
            .and_then(|m| m.get("crs"))
            .and_then(|crs| crs.get("properties"))
            .and_then(|props| props.get("name"))
            .and_then(|name| name.as_str());
        match name {
            Some(name) => Crs::from_name(name),
            None => Ok(Crs::Wgs84),
        }
    }
}

fn web_mercator_to_wgs84(c: Coord<f64>) -> Coord<f64> {
    let lng = (c.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (c.y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    Coord { x: lng, y: lat }
}

fn collect_polygons(geometry: Geometry<f64>, polygons: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => polygons.push(p),
        Geometry::MultiPolygon(mp) => polygons.extend(mp),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_polygons(g, polygons);
            }
        }
        other => warn!("ignoring non polygonal geometry {:?}", other),
    }
}

fn convert(value: geojson::Geometry, polygons: &mut Vec<Polygon<f64>>) -> Result<()> {
    let geometry = Geometry::<f64>::try_from(value)
        .map_err(|e| Error::Region(format!("invalid geometry: {}", e)))?;
    collect_polygons(geometry, polygons);
    Ok(())
}

/// Merges every polygon of a GeoJSON document into one region, reprojected
/// to EPSG:4326.
pub fn region_from_geojson(geojson: GeoJson) -> Result<Region> {
    let mut polygons = Vec::new();
    let crs = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = Crs::from_members(fc.foreign_members.as_ref())?;
            for feature in fc.features {
                if let Some(geometry) = feature.geometry {
                    convert(geometry, &mut polygons)?;
                }
            }
            crs
        }
        GeoJson::Feature(feature) => {
            let crs = Crs::from_members(feature.foreign_members.as_ref())?;
            if let Some(geometry) = feature.geometry {
                convert(geometry, &mut polygons)?;
            }
            crs
        }
        GeoJson::Geometry(geometry) => {
            let crs = Crs::from_members(geometry.foreign_members.as_ref())?;
            convert(geometry, &mut polygons)?;
            crs
        }
    };

    let mut mp = MultiPolygon(polygons);
    if crs == Crs::WebMercator {
        mp = mp.map_coords(web_mercator_to_wgs84);
    }
    Region::new(mp).ok_or_else(|| Error::Region("no polygon found".into()))
}

pub fn read_region(path: &Path) -> Result<Region> {
    let contents = read_to_string(path)?;
    let geojson: GeoJson = contents
        .parse()
        .map_err(|e| Error::Region(format!("could not parse {:?}: {}", path, e)))?;
    region_from_geojson(geojson)
}

/// File name up to its first dot: `zone.shp.geojson` gives `zone`.
pub fn polygon_stem(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or_default()
        .to_string()
}
