//! Turns raw database snapshots into typed collections
//!
//! Snapshots are JSON objects keyed by a unique name. Every snapshot fully
//! replaces the previous one, so ingestion is a pure function of the value.

use crate::category::{Category, Layout};
use crate::entity::{Attraction, HeritagePlace, LocatedEntity};
use crate::geo::GeoPoint;
use serde_json::{Map, Value};

/// Records accepted from a snapshot, plus the keys that were dropped
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested<T> {
    pub items: Vec<T>,
    pub skipped: Vec<String>,
}

impl<T> Default for Ingested<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Ingests a `{ "<city name>": { lat, lng, image?, description? } }` snapshot
///
/// The key is the city's name. Records without usable coordinates are
/// skipped and reported. A null or non-object snapshot yields nothing.
pub fn ingest_cities(snapshot: &Value) -> Ingested<LocatedEntity> {
    let mut ingested = Ingested::default();

    let Some(records) = as_keyed_map(snapshot, "city") else {
        return ingested;
    };

    for (name, record) in records {
        match read_point(record) {
            Some(location) => ingested.items.push(LocatedEntity {
                name: name.clone(),
                location,
                image: read_string(record, "image"),
                description: read_string(record, "description"),
            }),
            None => {
                log::warn!("Skipping city '{}': missing or invalid lat/lng", name);
                ingested.skipped.push(name.clone());
            }
        }
    }

    log::info!(
        "Ingested {} cities ({} skipped)",
        ingested.items.len(),
        ingested.skipped.len()
    );

    ingested
}

/// Ingests the `heritagePlaces` map nested under one city's document
pub fn ingest_heritage_places(city_name: &str, city_doc: &Value) -> Ingested<HeritagePlace> {
    let mut ingested = Ingested::default();

    let places = city_doc.get("heritagePlaces").unwrap_or(&Value::Null);
    let Some(records) = as_keyed_map(places, "heritage place") else {
        return ingested;
    };

    for (id, record) in records {
        let location = record.get("location").and_then(read_point);
        let Some(location) = location else {
            log::warn!(
                "Skipping heritage place '{}' in {}: missing or invalid location",
                id,
                city_name
            );
            ingested.skipped.push(id.clone());
            continue;
        };

        ingested.items.push(HeritagePlace {
            id: id.clone(),
            name: read_string(record, "name").unwrap_or_else(|| id.clone()),
            city: read_string(record, "city").unwrap_or_else(|| city_name.to_string()),
            image: read_string(record, "image"),
            description: read_string(record, "description"),
            story: read_string(record, "story"),
            year: read_string(record, "year"),
            location,
            google_maps_url: read_string(record, "googleMapsUrl")
                .or_else(|| record.get("location").and_then(|l| read_string(l, "googleMapsUrl"))),
        });
    }

    ingested
}

/// Ingests one category collection (beaches, lakes, temples, ...)
///
/// List-shaped collections keep their array order and use the index as the
/// id; keyed ones fall back to the key when a record has no name. Optional
/// fields that are missing or mistyped are left empty.
pub fn ingest_category(category: Category, snapshot: &Value) -> Ingested<Attraction> {
    let mut ingested = Ingested::default();

    let records: Vec<(String, &Value)> = match category.layout() {
        Layout::List(field) => {
            let list = snapshot.get(field).unwrap_or(&Value::Null);
            match list {
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, record)| (i.to_string(), record))
                    .collect(),
                // The database stores sparse arrays as index-keyed objects
                other => as_keyed_map(other, category.label())
                    .map(|map| map.iter().map(|(k, v)| (k.clone(), v)).collect())
                    .unwrap_or_default(),
            }
        }
        Layout::Keyed => as_keyed_map(snapshot, category.label())
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v)).collect())
            .unwrap_or_default(),
    };

    for (id, record) in records {
        if !record.is_object() {
            log::warn!("Skipping {} entry '{}': not an object", category, id);
            ingested.skipped.push(id);
            continue;
        }

        let name = read_string(record, "name")
            .or_else(|| read_string(record, "title"))
            .filter(|n| !n.trim().is_empty())
            .or_else(|| (category.layout() == Layout::Keyed).then(|| id.clone()));
        let Some(name) = name else {
            log::warn!("Skipping {} entry '{}': missing name", category, id);
            ingested.skipped.push(id);
            continue;
        };

        let visitor_info = record.get("visitorInfo").unwrap_or(&Value::Null);
        let location = record.get("location").unwrap_or(&Value::Null);

        let mut highlights = Vec::new();
        for field in ["attractions", "activities", "key_species"] {
            highlights.extend(read_string_list(record.get(field)));
        }

        ingested.items.push(Attraction {
            category,
            name,
            city: read_string(record, "city"),
            district: read_string(record, "district"),
            kind: read_string(record, "type").or_else(|| read_string(record, "deity")),
            description: read_string(record, "description"),
            image: read_string(record, "image_url")
                .or_else(|| read_string(record, "image"))
                .or_else(|| read_string(visitor_info, "imageUrl")),
            best_time_to_visit: read_string(record, "best_time_to_visit")
                .or_else(|| read_string(visitor_info, "bestSeason")),
            highlights,
            facilities: read_flags(record.get("facilities").or_else(|| record.get("keyFeatures"))),
            location: read_point(location)
                .or_else(|| read_point_with(location, "latitude", "longitude")),
            maps_url: read_string(location, "mapLink")
                .or_else(|| read_string(record, "googleMapsUrl")),
            id,
        });
    }

    log::info!(
        "Ingested {} {} ({} skipped)",
        ingested.items.len(),
        category.label(),
        ingested.skipped.len()
    );

    ingested
}

/// Case-insensitive substring match on entity names; an empty term keeps everything
pub fn filter_by_name<'a>(entities: &'a [LocatedEntity], term: &str) -> Vec<&'a LocatedEntity> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return entities.iter().collect();
    }

    entities
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .collect()
}

fn as_keyed_map<'a>(value: &'a Value, what: &str) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Null => {
            log::debug!("Empty {} snapshot", what);
            None
        }
        other => {
            log::warn!(
                "Ignoring {} snapshot: expected an object, got {}",
                what,
                json_kind(other)
            );
            None
        }
    }
}

/// Reads `lat`/`lng` from an object, accepting numbers or numeric strings
fn read_point(record: &Value) -> Option<GeoPoint> {
    read_point_with(record, "lat", "lng")
}

fn read_point_with(record: &Value, lat_field: &str, lng_field: &str) -> Option<GeoPoint> {
    let lat = read_number(record.get(lat_field)?)?;
    let lng = read_number(record.get(lng_field)?)?;
    let point = GeoPoint::new(lat, lng);
    point.is_valid().then_some(point)
}

fn read_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn read_string(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Strings from an array, or the values of a `{ key: text }` map
fn read_string_list(value: Option<&Value>) -> Vec<String> {
    let strings: Vec<&Value> = match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => return Vec::new(),
    };

    strings
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Names of the flags set in a `{ flag: true | { available: true } }` map
fn read_flags(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Object(map)) = value else {
        return Vec::new();
    };

    map.iter()
        .filter(|(_, flag)| match flag {
            Value::Bool(set) => *set,
            Value::Object(_) => flag.get("available").and_then(Value::as_bool) == Some(true),
            _ => false,
        })
        .map(|(name, _)| name.replace('_', " "))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
