//! Device position lookup
//!
//! The view model only needs "where is the user, or why not". Providers sit
//! behind [`GeolocationProvider`]; [`locate`] adds the hard timeout so no
//! provider can stall the location button.

use crate::core::{constants, geo::LatLng};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeolocationOptions {
    /// Advisory: providers that cannot do better than a coarse fix (IP
    /// lookup) still answer, and say so through [`Position::accuracy`]
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position that is still acceptable
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(constants::GEOLOCATION_TIMEOUT_SECS),
            maximum_age: Duration::from_secs(constants::GEOLOCATION_MAX_AGE_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeolocationError {
    #[error("geolocation is not supported")]
    NotSupported,

    #[error("permission to read the location was denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("no position within {0:?}")]
    Timeout(Duration),

    #[error("location lookup failed: {0}")]
    Lookup(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: LatLng,
    /// Radius of uncertainty in meters, when the provider knows it
    pub accuracy: Option<f64>,
    pub timestamp: Instant,
}

impl Position {
    pub fn new(coords: LatLng) -> Self {
        Self {
            coords,
            accuracy: None,
            timestamp: Instant::now(),
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.timestamp)
    }
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError>;

    fn name(&self) -> &str;
}

/// Asks `provider` for a position, giving up after `options.timeout`
pub async fn locate(
    provider: &dyn GeolocationProvider,
    options: &GeolocationOptions,
) -> Result<Position, GeolocationError> {
    let position = tokio::time::timeout(options.timeout, provider.current_position(options))
        .await
        .map_err(|_| GeolocationError::Timeout(options.timeout))??;

    if !position.coords.is_valid() {
        return Err(GeolocationError::PositionUnavailable(format!(
            "{} reported {}, {}",
            provider.name(),
            position.coords.lat,
            position.coords.lng
        )));
    }
    Ok(position)
}

/// Always reports the same place
pub struct FixedGeolocation {
    coords: LatLng,
}

impl FixedGeolocation {
    pub fn new(coords: LatLng) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError> {
        Ok(Position::new(self.coords))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Always fails with the configured error
pub struct UnavailableGeolocation {
    error: GeolocationError,
}

impl UnavailableGeolocation {
    pub fn new(error: GeolocationError) -> Self {
        Self { error }
    }

    pub fn denied() -> Self {
        Self::new(GeolocationError::PermissionDenied)
    }
}

impl Default for UnavailableGeolocation {
    fn default() -> Self {
        Self::new(GeolocationError::NotSupported)
    }
}

#[async_trait]
impl GeolocationProvider for UnavailableGeolocation {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError> {
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json/";

/// Uncertainty reported for an IP fix, in meters; roughly a city
pub const IP_ACCURACY_METERS: f64 = 5_000.0;

/// Coarse position from an IP geolocation service
///
/// Desktop machines rarely expose a GPS, so this is the practical stand-in
/// for a browser location prompt. City-level accuracy at best.
pub struct IpGeolocation {
    client: reqwest::Client,
    url: String,
}

impl IpGeolocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Default for IpGeolocation {
    fn default() -> Self {
        Self::new(DEFAULT_IP_LOOKUP_URL)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupBody {
    status: Option<String>,
    message: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

/// Reads `lat`/`lon` (or `latitude`/`longitude`) from a lookup response
pub fn parse_ip_lookup(body: &str) -> Result<LatLng, GeolocationError> {
    let parsed: IpLookupBody =
        serde_json::from_str(body).map_err(|e| GeolocationError::Lookup(e.to_string()))?;

    if parsed.status.as_deref() == Some("fail") {
        return Err(GeolocationError::PositionUnavailable(
            parsed.message.unwrap_or_else(|| "lookup refused".to_string()),
        ));
    }

    match (parsed.lat, parsed.lon) {
        (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)),
        _ => Err(GeolocationError::Lookup(
            "response has no coordinates".to_string(),
        )),
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| GeolocationError::Lookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeolocationError::Lookup(format!(
                "status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeolocationError::Lookup(e.to_string()))?;
        if options.high_accuracy {
            log::debug!("High accuracy requested; an IP lookup is city-level at best");
        }
        parse_ip_lookup(&body).map(|coords| Position {
            accuracy: Some(IP_ACCURACY_METERS),
            ..Position::new(coords)
        })
    }

    fn name(&self) -> &str {
        "ip"
    }
}

/// Reuses the last good position while it is younger than `maximum_age`
pub struct CachedGeolocation {
    inner: Arc<dyn GeolocationProvider>,
    last: Mutex<Option<Position>>,
}

impl CachedGeolocation {
    pub fn new(inner: Arc<dyn GeolocationProvider>) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }

    fn cached(&self, max_age: Duration) -> Option<Position> {
        let last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        last.filter(|p| p.age(Instant::now()) <= max_age)
    }
}

#[async_trait]
impl GeolocationProvider for CachedGeolocation {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Position, GeolocationError> {
        if let Some(position) = self.cached(options.maximum_age) {
            log::debug!("Using cached position from {} provider", self.inner.name());
            return Ok(position);
        }

        let position = self.inner.current_position(options).await?;
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(position);
        Ok(position)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeolocationProvider for Counting {
        async fn current_position(
            &self,
            _options: &GeolocationOptions,
        ) -> Result<Position, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Position::new(LatLng::new(51.5, -0.12)))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Hanging;

    #[async_trait]
    impl GeolocationProvider for Hanging {
        async fn current_position(
            &self,
            _options: &GeolocationOptions,
        ) -> Result<Position, GeolocationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(GeolocationError::NotSupported)
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    #[test]
    fn test_default_options() {
        let options = GeolocationOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.maximum_age, Duration::from_secs(300));
    }

    #[test]
    fn test_parse_ip_lookup() {
        let ok = parse_ip_lookup(r#"{"status":"success","lat":40.71,"lon":-74.0}"#).unwrap();
        assert_eq!(ok, LatLng::new(40.71, -74.0));

        let alt = parse_ip_lookup(r#"{"latitude":48.85,"longitude":2.35}"#).unwrap();
        assert_eq!(alt, LatLng::new(48.85, 2.35));

        assert!(matches!(
            parse_ip_lookup(r#"{"status":"fail","message":"private range"}"#),
            Err(GeolocationError::PositionUnavailable(m)) if m == "private range"
        ));
        assert!(matches!(
            parse_ip_lookup(r#"{"city":"Nowhere"}"#),
            Err(GeolocationError::Lookup(_))
        ));
        assert!(matches!(parse_ip_lookup("nope"), Err(GeolocationError::Lookup(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_times_out() {
        let options = GeolocationOptions::default();
        let result = locate(&Hanging, &options).await;
        assert_eq!(result, Err(GeolocationError::Timeout(Duration::from_secs(5))));
    }

    #[tokio::test]
    async fn test_locate_rejects_invalid_coordinates() {
        let provider = FixedGeolocation::new(LatLng::new(123.0, 0.0));
        let result = locate(&provider, &GeolocationOptions::default()).await;
        assert!(matches!(result, Err(GeolocationError::PositionUnavailable(_))));
    }

    #[tokio::test]
    async fn test_unavailable_reports_its_error() {
        let provider = UnavailableGeolocation::denied();
        let result = locate(&provider, &GeolocationOptions::default()).await;
        assert_eq!(result, Err(GeolocationError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_cache_respects_maximum_age() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedGeolocation::new(inner.clone());
        let options = GeolocationOptions::default();

        cached.current_position(&options).await.unwrap();
        cached.current_position(&options).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        let fresh_only = GeolocationOptions {
            maximum_age: Duration::ZERO,
            ..options
        };
        std::thread::sleep(Duration::from_millis(2));
        cached.current_position(&fresh_only).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
