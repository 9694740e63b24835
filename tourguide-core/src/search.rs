use crate::entity::LocatedEntity;
use crate::error::LocationError;
use crate::geo::GeoPoint;
use crate::location::LocationProvider;
use crate::proximity::{find_nearby, ProximityResult, DEFAULT_RADIUS_KM};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long to wait for a position before giving up
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the nearby search is in its request cycle
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Detecting,
    Succeeded,
    Failed(LocationError),
}

/// What the caller should tell the user right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Idle,
    Detecting,
    Found(usize),
    NothingNearby,
    /// No entities loaded yet; not worth retrying until data arrives
    CollectionEmpty,
    /// The position could not be obtained; the user may try again
    LocationUnavailable,
}

struct PendingRequest {
    receiver: Receiver<Result<GeoPoint, LocationError>>,
    /// None when the timeout is too large to land on the clock
    deadline: Option<Instant>,
}

/// Owns the nearby-cities search for one view session
///
/// At most one position request is in flight. Results are computed against
/// whatever collection is resident when the position arrives.
pub struct NearbySearch {
    provider: Arc<dyn LocationProvider>,
    entities: Vec<LocatedEntity>,
    radius_km: f64,
    timeout: Duration,
    state: SearchState,
    reference: Option<GeoPoint>,
    results: Vec<ProximityResult>,
    pending: Option<PendingRequest>,
}

impl NearbySearch {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self {
            provider,
            entities: Vec::new(),
            radius_km: DEFAULT_RADIUS_KM,
            timeout: DEFAULT_LOCATION_TIMEOUT,
            state: SearchState::Idle,
            reference: None,
            results: Vec::new(),
            pending: None,
        }
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn results(&self) -> &[ProximityResult] {
        &self.results
    }

    /// The position used for the current results, if any
    pub fn reference(&self) -> Option<GeoPoint> {
        self.reference
    }

    pub fn entities(&self) -> &[LocatedEntity] {
        &self.entities
    }

    /// Swap in a fresh snapshot; existing results are left alone
    pub fn replace_collection(&mut self, entities: Vec<LocatedEntity>) {
        log::debug!("Collection replaced ({} entities)", entities.len());
        self.entities = entities;
    }

    /// Start a position request. Returns false (and does nothing) while one is in flight.
    pub fn trigger(&mut self) -> bool {
        if self.state == SearchState::Detecting {
            log::debug!("Location request already in flight, ignoring trigger");
            return false;
        }

        let (sender, receiver) = mpsc::channel();
        let provider = Arc::clone(&self.provider);

        let spawned = std::thread::Builder::new()
            .name("location-request".to_string())
            .spawn(move || {
                // The receiver is gone if the request already timed out
                let _ = sender.send(provider.current_position());
            });

        match spawned {
            Ok(_) => {
                let deadline = Instant::now().checked_add(self.timeout);
                if deadline.is_none() {
                    log::debug!("Timeout of {:?} is unbounded, waiting indefinitely", self.timeout);
                }
                self.pending = Some(PendingRequest { receiver, deadline });
                self.state = SearchState::Detecting;
            }
            Err(e) => {
                self.finish(Err(LocationError::PositionUnavailable(format!(
                    "could not start location request: {}",
                    e
                ))));
            }
        }

        true
    }

    /// Non-blocking check for a finished request; call from the event loop
    pub fn poll(&mut self) -> &SearchState {
        let Some(pending) = self.pending.as_ref() else {
            return &self.state;
        };

        let resolved = match pending.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty)
                if pending.deadline.is_some_and(|deadline| Instant::now() >= deadline) =>
            {
                Some(Err(LocationError::Timeout))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_exited())),
        };

        if let Some(result) = resolved {
            self.finish(result);
        }
        &self.state
    }

    /// Block until the in-flight request resolves or times out
    pub fn wait(&mut self) -> &SearchState {
        let Some(pending) = self.pending.as_ref() else {
            return &self.state;
        };

        let result = match pending.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match pending.receiver.recv_timeout(remaining) {
                    Ok(result) => result,
                    Err(RecvTimeoutError::Timeout) => Err(LocationError::Timeout),
                    Err(RecvTimeoutError::Disconnected) => Err(worker_exited()),
                }
            }
            None => pending.receiver.recv().unwrap_or_else(|_| Err(worker_exited())),
        };

        self.finish(result);
        &self.state
    }

    pub fn outcome(&self) -> SearchOutcome {
        match &self.state {
            SearchState::Idle => SearchOutcome::Idle,
            SearchState::Detecting => SearchOutcome::Detecting,
            SearchState::Failed(_) => SearchOutcome::LocationUnavailable,
            SearchState::Succeeded if self.entities.is_empty() => SearchOutcome::CollectionEmpty,
            SearchState::Succeeded if self.results.is_empty() => SearchOutcome::NothingNearby,
            SearchState::Succeeded => SearchOutcome::Found(self.results.len()),
        }
    }

    /// One-line status suitable for a status bar
    pub fn status_message(&self) -> String {
        match self.outcome() {
            SearchOutcome::Idle => "Find nearby cities".to_string(),
            SearchOutcome::Detecting => "Detecting...".to_string(),
            SearchOutcome::Found(n) => format!("{} found", n),
            SearchOutcome::NothingNearby => {
                format!("No cities within {} km", self.radius_km)
            }
            SearchOutcome::CollectionEmpty => "City data is still loading".to_string(),
            SearchOutcome::LocationUnavailable => match &self.state {
                SearchState::Failed(e) => format!("Location unavailable ({}), try again", e),
                _ => "Location unavailable, try again".to_string(),
            },
        }
    }

    fn finish(&mut self, result: Result<GeoPoint, LocationError>) {
        self.pending = None;

        match result {
            Ok(reference) => {
                self.results = find_nearby(reference, &self.entities, self.radius_km);
                self.reference = Some(reference);
                self.state = SearchState::Succeeded;
                log::info!(
                    "Found {} cities within {} km of {}",
                    self.results.len(),
                    self.radius_km,
                    reference
                );
            }
            Err(e) => {
                log::warn!("Error getting location: {}", e);
                self.results.clear();
                self.reference = None;
                self.state = SearchState::Failed(e);
            }
        }
    }
}

fn worker_exited() -> LocationError {
    LocationError::PositionUnavailable("location request ended without an answer".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{DeniedLocation, FixedLocation};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const SALEM: GeoPoint = GeoPoint { lat: 11.6643, lng: 78.1460 };

    /// Answers only once the test feeds it a position
    struct GatedLocation {
        gate: Mutex<Receiver<GeoPoint>>,
        requests: AtomicUsize,
    }

    impl GatedLocation {
        fn new() -> (Arc<Self>, mpsc::Sender<GeoPoint>) {
            let (sender, receiver) = mpsc::channel();
            let provider = Arc::new(Self {
                gate: Mutex::new(receiver),
                requests: AtomicUsize::new(0),
            });
            (provider, sender)
        }
    }

    impl LocationProvider for GatedLocation {
        fn current_position(&self) -> Result<GeoPoint, LocationError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap();
            gate.recv()
                .map_err(|_| LocationError::PositionUnavailable("gate closed".to_string()))
        }
    }

    fn cities() -> Vec<LocatedEntity> {
        vec![
            LocatedEntity::new("Chennai", 13.0827, 80.2707),
            LocatedEntity::new("Salem", 11.6643, 78.1460),
            LocatedEntity::new("Coimbatore", 11.0174, 76.9589),
        ]
    }

    #[test]
    fn test_starts_idle() {
        let search = NearbySearch::new(Arc::new(FixedLocation(SALEM)));
        assert_eq!(search.state(), &SearchState::Idle);
        assert_eq!(search.outcome(), SearchOutcome::Idle);
        assert!(search.results().is_empty());
    }

    #[test]
    fn test_successful_search() {
        let mut search = NearbySearch::new(Arc::new(FixedLocation(SALEM)));
        search.replace_collection(cities());

        assert!(search.trigger());
        assert_eq!(search.wait(), &SearchState::Succeeded);

        let names: Vec<&str> = search.results().iter().map(|r| r.entity.name.as_str()).collect();
        assert_eq!(names, vec!["Salem"]);
        assert_eq!(search.reference(), Some(SALEM));
        assert_eq!(search.outcome(), SearchOutcome::Found(1));
        assert_eq!(search.status_message(), "1 found");
    }

    #[test]
    fn test_poll_until_done() {
        let mut search = NearbySearch::new(Arc::new(FixedLocation(SALEM))).with_radius(200.0);
        search.replace_collection(cities());
        search.trigger();

        for _ in 0..1000 {
            if search.poll() != &SearchState::Detecting {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(search.state(), &SearchState::Succeeded);
        assert_eq!(search.results().len(), 2);
    }

    #[test]
    fn test_denied_location_fails_and_allows_retry() {
        let mut search = NearbySearch::new(Arc::new(DeniedLocation));
        search.replace_collection(cities());

        assert!(search.trigger());
        assert_eq!(
            search.wait(),
            &SearchState::Failed(LocationError::PermissionDenied)
        );
        assert!(search.results().is_empty());
        assert_eq!(search.outcome(), SearchOutcome::LocationUnavailable);
        assert!(search.status_message().contains("try again"));

        // No automatic retry, but a fresh trigger is accepted
        assert!(search.trigger());
        assert_eq!(search.state(), &SearchState::Detecting);
        search.wait();
    }

    #[test]
    fn test_failure_clears_previous_results() {
        let (provider, gate) = GatedLocation::new();
        let mut search = NearbySearch::new(provider).with_timeout(Duration::from_secs(5));
        search.replace_collection(cities());

        search.trigger();
        gate.send(SALEM).unwrap();
        assert_eq!(search.wait(), &SearchState::Succeeded);
        assert_eq!(search.results().len(), 1);

        search.trigger();
        drop(gate);
        assert!(matches!(search.wait(), SearchState::Failed(_)));
        assert!(search.results().is_empty());
        assert_eq!(search.reference(), None);
    }

    #[test]
    fn test_trigger_while_detecting_is_ignored() {
        let (provider, gate) = GatedLocation::new();
        let mut search =
            NearbySearch::new(provider.clone()).with_timeout(Duration::from_secs(5));
        search.replace_collection(cities());

        assert!(search.trigger());
        assert!(!search.trigger());
        assert!(!search.trigger());
        assert_eq!(search.outcome(), SearchOutcome::Detecting);

        gate.send(SALEM).unwrap();
        assert_eq!(search.wait(), &SearchState::Succeeded);
        assert_eq!(provider.requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_uses_collection_resident_at_completion() {
        let (provider, gate) = GatedLocation::new();
        let mut search = NearbySearch::new(provider).with_timeout(Duration::from_secs(5));
        search.replace_collection(cities());

        search.trigger();
        search.replace_collection(vec![
            LocatedEntity::new("Yercaud", 11.7753, 78.2093),
            LocatedEntity::new("Erode", 11.3410, 77.7172),
        ]);
        gate.send(SALEM).unwrap();
        search.wait();

        let names: Vec<&str> = search.results().iter().map(|r| r.entity.name.as_str()).collect();
        assert_eq!(names, vec!["Yercaud"]);
    }

    #[test]
    fn test_timeout() {
        let (provider, gate) = GatedLocation::new();
        let mut search = NearbySearch::new(provider).with_timeout(Duration::from_millis(20));
        search.replace_collection(cities());

        search.trigger();
        assert_eq!(search.wait(), &SearchState::Failed(LocationError::Timeout));
        assert!(search.results().is_empty());

        // Late answers are discarded with the old request
        gate.send(SALEM).unwrap();
        assert_eq!(search.poll(), &SearchState::Failed(LocationError::Timeout));
    }

    #[test]
    fn test_huge_timeout_waits_without_deadline() {
        let mut search = NearbySearch::new(Arc::new(FixedLocation(SALEM)))
            .with_timeout(Duration::from_secs(u64::MAX));
        search.replace_collection(cities());

        assert!(search.trigger());
        assert_eq!(search.wait(), &SearchState::Succeeded);
        assert_eq!(search.outcome(), SearchOutcome::Found(1));
    }

    #[test]
    fn test_huge_timeout_never_expires_while_polling() {
        let (provider, gate) = GatedLocation::new();
        let mut search = NearbySearch::new(provider).with_timeout(Duration::MAX);
        search.replace_collection(cities());

        search.trigger();
        assert_eq!(search.poll(), &SearchState::Detecting);

        gate.send(SALEM).unwrap();
        for _ in 0..1000 {
            if search.poll() != &SearchState::Detecting {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(search.state(), &SearchState::Succeeded);
    }

    #[test]
    fn test_empty_collection_is_not_a_failure() {
        let mut search = NearbySearch::new(Arc::new(FixedLocation(SALEM)));
        search.trigger();
        assert_eq!(search.wait(), &SearchState::Succeeded);
        assert!(search.results().is_empty());
        assert_eq!(search.outcome(), SearchOutcome::CollectionEmpty);
    }

    #[test]
    fn test_nothing_nearby() {
        let mut search = NearbySearch::new(Arc::new(FixedLocation(GeoPoint::new(51.5, -0.12))));
        search.replace_collection(cities());
        search.trigger();
        search.wait();
        assert_eq!(search.outcome(), SearchOutcome::NothingNearby);
        assert_eq!(search.status_message(), "No cities within 50 km");
    }
}
