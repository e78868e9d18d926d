//! Display geometry for dashboard features.
//!
//! Features arrive as GeoJSON with coordinates in `[lon, lat]` order; everything
//! produced here for the map camera is in `(lat, lng)` order.

use geo::CoordsIter;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde::Serialize;
use thiserror::Error;

/// Default camera padding around a feature's bounding box, in degrees.
pub const DEFAULT_PADDING_DEGREES: f64 = 0.01;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("geometry has no coordinates")]
    EmptyGeometry,
    #[error("unsupported geometry type: {0}")]
    Unsupported(String),
    #[error("malformed coordinates: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeometryKind {
    Point,
    Polygon,
    MultiPolygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coord<f64>> for LatLng {
    fn from(coord: Coord<f64>) -> Self {
        LatLng {
            lat: coord.y,
            lng: coord.x,
        }
    }
}

/// Axis-aligned box in `(lat, lng)` space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Box of `padding` degrees around a single location.
    pub fn around(point: LatLng, padding: f64) -> Self {
        LatLngBounds {
            south_west: point,
            north_east: point,
        }
        .padded(padding)
    }

    pub fn padded(&self, padding: f64) -> Self {
        LatLngBounds {
            south_west: LatLng {
                lat: self.south_west.lat - padding,
                lng: self.south_west.lng - padding,
            },
            north_east: LatLng {
                lat: self.north_east.lat + padding,
                lng: self.north_east.lng + padding,
            },
        }
    }

    /// `[[minLat, minLng], [maxLat, maxLng]]`, the shape map cameras expect.
    pub fn to_array(&self) -> [[f64; 2]; 2] {
        [
            [self.south_west.lat, self.south_west.lng],
            [self.north_east.lat, self.north_east.lng],
        ]
    }
}

/// A feature geometry restricted to the kinds the dashboard can display.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Shape {
    /// Convert a parsed GeoJSON geometry, rejecting kinds other than
    /// Point, Polygon and MultiPolygon.
    pub fn from_geojson(value: &geojson::Value) -> Result<Self, GeometryError> {
        match value {
            geojson::Value::Point(position) => Ok(Shape::Point(Point::from(coord(position)?))),
            geojson::Value::Polygon(rings) => Ok(Shape::Polygon(polygon(rings)?)),
            geojson::Value::MultiPolygon(polygons) => {
                let polygons = polygons
                    .iter()
                    .map(|rings| polygon(rings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Shape::MultiPolygon(MultiPolygon::new(polygons)))
            }
            other => Err(GeometryError::Unsupported(kind_name(other).to_string())),
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Shape::Point(_) => GeometryKind::Point,
            Shape::Polygon(_) => GeometryKind::Polygon,
            Shape::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Display anchor: the point itself, or the mean of the outer ring
    /// (of the first polygon, for multipolygons).
    pub fn centroid(&self) -> Result<LatLng, GeometryError> {
        match self {
            Shape::Point(point) => Ok(LatLng::from(point.0)),
            Shape::Polygon(polygon) => ring_centroid(&polygon.exterior().0),
            Shape::MultiPolygon(multi) => {
                let first = multi.0.first().ok_or(GeometryError::EmptyGeometry)?;
                ring_centroid(&first.exterior().0)
            }
        }
    }

    /// Extent over every coordinate of every ring.
    pub fn bounding_box(&self) -> Result<LatLngBounds, GeometryError> {
        let coords: Box<dyn Iterator<Item = Coord<f64>> + '_> = match self {
            Shape::Point(point) => {
                let at = LatLng::from(point.0);
                return Ok(LatLngBounds {
                    south_west: at,
                    north_east: at,
                });
            }
            Shape::Polygon(polygon) => Box::new(polygon.coords_iter()),
            Shape::MultiPolygon(multi) => Box::new(multi.coords_iter()),
        };

        let extent = coords.fold(None, |acc: Option<(Coord<f64>, Coord<f64>)>, c| {
            Some(match acc {
                None => (c, c),
                Some((min, max)) => (
                    Coord {
                        x: min.x.min(c.x),
                        y: min.y.min(c.y),
                    },
                    Coord {
                        x: max.x.max(c.x),
                        y: max.y.max(c.y),
                    },
                ),
            })
        });

        let (min, max) = extent.ok_or(GeometryError::EmptyGeometry)?;
        Ok(LatLngBounds {
            south_west: LatLng::from(min),
            north_east: LatLng::from(max),
        })
    }

    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Shape::Point(point) => Geometry::Point(*point),
            Shape::Polygon(polygon) => Geometry::Polygon(polygon.clone()),
            Shape::MultiPolygon(multi) => Geometry::MultiPolygon(multi.clone()),
        }
    }
}

/// Arithmetic mean of a ring's vertices. The closing vertex of a closed ring
/// repeats the first one and is counted once.
pub fn ring_centroid(ring: &[Coord<f64>]) -> Result<LatLng, GeometryError> {
    let points = match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    };
    if points.is_empty() {
        return Err(GeometryError::EmptyGeometry);
    }

    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
    let count = points.len() as f64;
    Ok(LatLng {
        lat: sum_y / count,
        lng: sum_x / count,
    })
}

fn kind_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn coord(position: &[f64]) -> Result<Coord<f64>, GeometryError> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        _ => Err(GeometryError::Malformed(format!(
            "position {:?} needs two finite numbers",
            position
        ))),
    }
}

fn ring(positions: &[Vec<f64>]) -> Result<LineString<f64>, GeometryError> {
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.iter();
    let exterior = match rings.next() {
        Some(outer) => ring(outer)?,
        None => LineString::new(vec![]),
    };
    let interiors = rings.map(|r| ring(r)).collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}
