use crate::category::Category;
use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// Stock image shown for cities without one of their own
pub const DEFAULT_CITY_IMAGE: &str = "https://images.pexels.com/photos/7084313/pexels-photo-7084313.jpeg";

/// A named content record with a position, such as a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatedEntity {
    /// Identity key, unique within its collection
    pub name: String,
    pub location: GeoPoint,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl LocatedEntity {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            location: GeoPoint::new(lat, lng),
            image: None,
            description: None,
        }
    }

    pub fn image_or_default(&self) -> &str {
        self.image
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_CITY_IMAGE)
    }

    pub fn description_or_default(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => format!("Explore the cultural heritage of {}", self.name),
        }
    }
}

/// A heritage site listed under a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeritagePlace {
    /// Key of the place inside its city's `heritagePlaces` map
    pub id: String,
    pub name: String,
    pub city: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub story: Option<String>,
    pub year: Option<String>,
    pub location: GeoPoint,
    pub google_maps_url: Option<String>,
}

/// One entry of a category collection (a beach, lake, temple, ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attraction {
    pub category: Category,
    /// Array index or map key inside the collection
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub district: Option<String>,
    /// Sanctuary type or presiding deity
    pub kind: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub best_time_to_visit: Option<String>,
    /// Attractions, activities or key species
    pub highlights: Vec<String>,
    /// Facilities marked as available
    pub facilities: Vec<String>,
    pub location: Option<GeoPoint>,
    pub maps_url: Option<String>,
}

impl Attraction {
    /// "City, District" with whichever parts are known
    pub fn locality(&self) -> Option<String> {
        let parts: Vec<&str> = [self.city.as_deref(), self.district.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        match parts.as_slice() {
            [] => None,
            [one] => Some(one.to_string()),
            [city, district] if city.eq_ignore_ascii_case(district) => Some(city.to_string()),
            _ => Some(parts.join(", ")),
        }
    }
}
