use crate::error::LocationError;
use crate::geo::GeoPoint;
use serde::Deserialize;
use std::time::Duration;

/// Produces the searcher's current position, once per request
///
/// Implementations may block; `NearbySearch` calls them off the caller's
/// thread and enforces its own timeout.
pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> Result<GeoPoint, LocationError>;
}

/// A position supplied up front, e.g. from the command line
pub struct FixedLocation(pub GeoPoint);

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> Result<GeoPoint, LocationError> {
        Ok(self.0)
    }
}

/// A provider that never grants access to the position
pub struct DeniedLocation;

impl LocationProvider for DeniedLocation {
    fn current_position(&self) -> Result<GeoPoint, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

/// Approximate position from an IP geolocation endpoint
pub struct IpLocationProvider {
    url: String,
    timeout: Duration,
}

/// Response shape of ip-api.com style endpoints
#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpLocationProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    fn request(&self) -> anyhow::Result<IpLocationResponse> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(crate::user_agent())
            .timeout(self.timeout)
            .build()?;

        let response = client.get(&self.url).send()?;
        if !response.status().is_success() {
            anyhow::bail!("IP location service returned status {}", response.status());
        }
        Ok(response.json()?)
    }
}

impl LocationProvider for IpLocationProvider {
    fn current_position(&self) -> Result<GeoPoint, LocationError> {
        log::debug!("Looking up approximate position via {}", self.url);

        let response = self.request().map_err(|e| {
            let timed_out = e
                .downcast_ref::<reqwest::Error>()
                .map_or(false, |re| re.is_timeout());
            if timed_out {
                LocationError::Timeout
            } else {
                LocationError::PositionUnavailable(e.to_string())
            }
        })?;

        position_from_response(response)
    }
}

fn position_from_response(response: IpLocationResponse) -> Result<GeoPoint, LocationError> {
    if let Some(status) = response.status.as_deref() {
        if status != "success" {
            let reason = response.message.unwrap_or_else(|| status.to_string());
            return Err(LocationError::PositionUnavailable(reason));
        }
    }

    match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => {
            let point = GeoPoint::new(lat, lon);
            if point.is_valid() {
                Ok(point)
            } else {
                Err(LocationError::PositionUnavailable(format!(
                    "service returned out-of-range coordinates {}",
                    point
                )))
            }
        }
        _ => Err(LocationError::PositionUnavailable(
            "service returned no coordinates".to_string(),
        )),
    }
}
