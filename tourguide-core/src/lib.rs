use anyhow::{Context, Result};
use std::sync::Arc;

mod category;
mod chat;
mod config;
mod entity;
mod error;
mod feedback;
mod geo;
mod location;
mod proximity;
mod search;
mod snapshot;
mod source;

// Re-export public types
pub use category::{Category, Layout};
pub use chat::{ChatClient, ChatMessage, ChatReply};
pub use config::ExplorerConfig;
pub use entity::{Attraction, HeritagePlace, LocatedEntity, DEFAULT_CITY_IMAGE};
pub use error::{FeedbackError, LocationError};
pub use feedback::{
    Feedback, FeedbackSink, JsonLinesFeedbackSink, RealtimeDbFeedbackSink, MAX_MESSAGE_CHARS,
};
pub use geo::{distance_km, format_point, parse_coordinate, GeoPoint, EARTH_RADIUS_KM};
pub use location::{DeniedLocation, FixedLocation, IpLocationProvider, LocationProvider};
pub use proximity::{find_nearby, ProximityResult, DEFAULT_RADIUS_KM};
pub use search::{NearbySearch, SearchOutcome, SearchState, DEFAULT_LOCATION_TIMEOUT};
pub use snapshot::{
    filter_by_name, ingest_category, ingest_cities, ingest_heritage_places, Ingested,
};
pub use source::{BuiltinSource, CollectionSource, JsonFileSource, RealtimeDbSource};

/// User agent sent with every outgoing HTTP request
pub(crate) fn user_agent() -> String {
    format!("Tourguide/{}", env!("CARGO_PKG_VERSION"))
}

/// Browses the region's cities through an injected data source
pub struct Explorer {
    config: ExplorerConfig,
    source: Box<dyn CollectionSource>,
}

impl Explorer {
    /// Create an explorer reading from the given source
    pub fn new(config: ExplorerConfig, source: Box<dyn CollectionSource>) -> Self {
        Self { config, source }
    }

    /// Create an explorer over the realtime database named in the config
    pub fn from_config(config: ExplorerConfig) -> Result<Self> {
        let url = config
            .database_url
            .clone()
            .context("No database URL configured (set TOURGUIDE_DATABASE_URL)")?;
        let source = RealtimeDbSource::new(&url, config.auth_token.clone(), config.http_timeout)?;
        Ok(Self::new(config, Box::new(source)))
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Fetch and ingest a fresh snapshot of the city collection
    pub fn load_cities(&self) -> Result<Vec<LocatedEntity>> {
        log::info!("Loading cities from {}", self.source.name());
        let snapshot = self
            .source
            .fetch(&self.config.cities_path)
            .context("Failed to load cities")?;

        Ok(ingest_cities(&snapshot).items)
    }

    /// Heritage places listed under one city; None when the city is unknown
    pub fn heritage_places(&self, city_name: &str) -> Result<Option<Vec<HeritagePlace>>> {
        let path = format!(
            "{}/{}",
            self.config.cities_path.trim_end_matches('/'),
            city_name
        );
        let city_doc = self
            .source
            .fetch(&path)
            .with_context(|| format!("Failed to load heritage places for {}", city_name))?;

        if city_doc.is_null() {
            return Ok(None);
        }
        Ok(Some(ingest_heritage_places(city_name, &city_doc).items))
    }

    /// Entries of one category collection; None when the database has no data for it
    pub fn category(&self, category: Category) -> Result<Option<Vec<Attraction>>> {
        log::info!("Loading {} from {}", category.label(), self.source.name());
        let snapshot = self
            .source
            .fetch(category.path())
            .with_context(|| format!("Failed to load {}", category.label()))?;

        if snapshot.is_null() {
            return Ok(None);
        }
        Ok(Some(ingest_category(category, &snapshot).items))
    }

    /// Cities whose name contains `term`, case-insensitively
    pub fn search_cities(&self, term: &str) -> Result<Vec<LocatedEntity>> {
        let cities = self.load_cities()?;
        Ok(filter_by_name(&cities, term).into_iter().cloned().collect())
    }

    /// A nearby search preloaded with the current city snapshot
    pub fn nearby_search(&self, provider: Arc<dyn LocationProvider>) -> Result<NearbySearch> {
        let mut search = NearbySearch::new(provider)
            .with_radius(self.config.radius_km)
            .with_timeout(self.config.location_timeout);
        search.replace_collection(self.load_cities()?);
        Ok(search)
    }
}
