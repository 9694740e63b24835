use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius used by the Haversine formula, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the usual degree ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lng)
    }
}

impl FromStr for GeoPoint {
    type Err = anyhow::Error;

    /// Parses "<lat>,<lng>" where each half is anything `parse_coordinate` accepts
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (lat_str, lng_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Expected \"<lat>,<lng>\", got {:?}", s))?;

        let lat = parse_coordinate(lat_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid latitude: {:?}", lat_str.trim()))?;
        let lng = parse_coordinate(lng_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid longitude: {:?}", lng_str.trim()))?;

        let point = GeoPoint::new(lat, lng);
        if !point.is_valid() {
            anyhow::bail!("Coordinates out of range: {}", point);
        }
        Ok(point)
    }
}

/// Great-circle distance between two points in kilometres (Haversine)
///
/// Coordinates are not range-checked. The intermediate term is clamped to
/// [0, 1] so rounding near antipodal points cannot produce `NaN`.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lng = (d_lng / 2.0).sin();
    let h = sin_lat * sin_lat + lat_a.cos() * lat_b.cos() * sin_lng * sin_lng;
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Parses a single coordinate in decimal, degrees + decimal minutes, or DMS form
/// Examples: "13.0827", "13 4.96", "13 deg 4' 57.72\" N", "80.2707E"
/// A trailing S or W makes the value negative.
pub fn parse_coordinate(coord_str: &str) -> Option<f64> {
    let cleaned = coord_str
        .replace("deg", " ")
        .replace(['°', '\'', '"'], " ")
        .trim()
        .to_string();

    // Pull a hemisphere letter off the end, glued on or separated by a space
    let (body, negate) = match cleaned.chars().last() {
        Some(c) if matches!(c.to_ascii_uppercase(), 'N' | 'E') => {
            (&cleaned[..cleaned.len() - 1], false)
        }
        Some(c) if matches!(c.to_ascii_uppercase(), 'S' | 'W') => {
            (&cleaned[..cleaned.len() - 1], true)
        }
        _ => (cleaned.as_str(), false),
    };

    let parts: Vec<&str> = body.split_whitespace().collect();

    let value = match parts.len() {
        1 => parts[0].parse::<f64>().ok()?,
        2 => {
            let degrees: f64 = parts[0].parse().ok()?;
            let minutes: f64 = parts[1].parse().ok()?;
            degrees.signum() * (degrees.abs() + minutes / 60.0)
        }
        3 => {
            let degrees: f64 = parts[0].parse().ok()?;
            let minutes: f64 = parts[1].parse().ok()?;
            let seconds: f64 = parts[2].parse().ok()?;
            degrees.signum() * (degrees.abs() + minutes / 60.0 + seconds / 3600.0)
        }
        _ => return None,
    };

    if !value.is_finite() {
        return None;
    }

    Some(if negate { -value.abs() } else { value })
}

/// Formats a point as a compact label
/// Example: "13.08N_80.27E"
pub fn format_point(point: &GeoPoint) -> String {
    let lat_dir = if point.lat >= 0.0 { "N" } else { "S" };
    let lng_dir = if point.lng >= 0.0 { "E" } else { "W" };

    format!(
        "{:.2}{}_{:.2}{}",
        point.lat.abs(),
        lat_dir,
        point.lng.abs(),
        lng_dir
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHENNAI: GeoPoint = GeoPoint { lat: 13.0827, lng: 80.2707 };
    const SALEM: GeoPoint = GeoPoint { lat: 11.6643, lng: 78.1460 };

    #[test]
    fn test_zero_distance() {
        for p in [CHENNAI, SALEM, GeoPoint::new(0.0, 0.0), GeoPoint::new(-89.9, 179.9)] {
            assert_eq!(distance_km(p, p), 0.0);
        }
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (CHENNAI, SALEM),
            (GeoPoint::new(51.5074, -0.1278), GeoPoint::new(35.6762, 139.6503)),
            (GeoPoint::new(-33.87, 151.21), GeoPoint::new(40.71, -74.01)),
        ];
        for (a, b) in pairs {
            assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_chennai_to_salem() {
        let d = distance_km(CHENNAI, SALEM);
        assert!((d - 279.5).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let d = distance_km(a, b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_is_valid() {
        assert!(CHENNAI.is_valid());
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("13.0827"), Some(13.0827));
        assert_eq!(parse_coordinate("-33.5"), Some(-33.5));
        assert_eq!(parse_coordinate("13 30"), Some(13.5));
        assert_eq!(parse_coordinate("80.25W"), Some(-80.25));
        assert_eq!(parse_coordinate("33 30 S"), Some(-33.5));

        let dms = parse_coordinate("13 deg 4' 57.72\" N").unwrap();
        assert!((dms - 13.0827).abs() < 1e-4);

        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("north"), None);
        assert_eq!(parse_coordinate("1 2 3 4"), None);
    }

    #[test]
    fn test_point_from_str() {
        let p: GeoPoint = "11.6643, 78.1460".parse().unwrap();
        assert_eq!(p, SALEM);

        assert!("11.6643".parse::<GeoPoint>().is_err());
        assert!("95.0,10.0".parse::<GeoPoint>().is_err());
        assert!("abc,10.0".parse::<GeoPoint>().is_err());
    }

    #[test]
    fn test_format_point() {
        assert_eq!(format_point(&CHENNAI), "13.08N_80.27E");
        assert_eq!(format_point(&GeoPoint::new(-33.87, -70.65)), "33.87S_70.65W");
    }
}
