use crate::data::crowd::{fallback_points, CrowdPoint, DataOrigin};
use crate::{MapError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Everything that can go wrong while loading crowd points
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to fetch crowd data: {0}")]
    Status(u16),

    #[error("invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unexpected API response format: {0}")]
    UnexpectedShape(String),
}

/// Anything that can produce a set of crowd points
#[async_trait]
pub trait CrowdDataSource: Send + Sync {
    /// Load the current points; errors are handled by [`CrowdDataAdapter`]
    async fn fetch_points(&self) -> std::result::Result<Vec<CrowdPoint>, DataSourceError>;

    /// Origin reported when this source succeeds
    fn origin(&self) -> DataOrigin {
        DataOrigin::Live
    }

    fn name(&self) -> &str;
}

/// Validates a raw crowd data response
///
/// Requires a 2xx status and a JSON body of the form `{ "data": [...] }`
/// whose elements are crowd points. Intensities are clamped into `[0, 1]`.
pub fn parse_crowd_response(
    status: u16,
    body: &str,
) -> std::result::Result<Vec<CrowdPoint>, DataSourceError> {
    if !(200..300).contains(&status) {
        return Err(DataSourceError::Status(status));
    }

    let value: serde_json::Value = serde_json::from_str(body)?;
    let data = match value.get("data") {
        Some(data @ serde_json::Value::Array(_)) => data.clone(),
        Some(other) => {
            return Err(DataSourceError::UnexpectedShape(format!(
                "'data' is {}, expected an array",
                json_kind(other)
            )))
        }
        None => {
            return Err(DataSourceError::UnexpectedShape(
                "missing 'data' field".to_string(),
            ))
        }
    };

    let points: Vec<CrowdPoint> = serde_json::from_value(data)
        .map_err(|e| DataSourceError::UnexpectedShape(format!("bad crowd point: {e}")))?;

    Ok(points.into_iter().map(CrowdPoint::normalized).collect())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Single best-effort GET against the crowd data endpoint
pub struct HttpCrowdSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCrowdSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("crowdflow/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(MapError::Network)?;

        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CrowdDataSource for HttpCrowdSource {
    async fn fetch_points(&self) -> std::result::Result<Vec<CrowdPoint>, DataSourceError> {
        log::debug!("Fetching crowd data from {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        log::trace!("API response: {body}");
        parse_crowd_response(status.as_u16(), &body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Serves a fixed set of points
pub struct StaticCrowdSource {
    points: Vec<CrowdPoint>,
}

impl StaticCrowdSource {
    pub fn new(points: Vec<CrowdPoint>) -> Self {
        Self { points }
    }
}

#[async_trait]
impl CrowdDataSource for StaticCrowdSource {
    async fn fetch_points(&self) -> std::result::Result<Vec<CrowdPoint>, DataSourceError> {
        Ok(self.points.clone())
    }

    fn origin(&self) -> DataOrigin {
        DataOrigin::Static
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Result of one adapter fetch; `failure` is set when the fallback was used
#[derive(Debug)]
pub struct CrowdFetch {
    pub points: Vec<CrowdPoint>,
    pub origin: DataOrigin,
    pub failure: Option<DataSourceError>,
}

impl CrowdFetch {
    pub fn is_fallback(&self) -> bool {
        self.failure.is_some()
    }
}

/// Wraps a source so that loading never fails
///
/// Any error from the source is logged and replaced by the fallback set. There
/// are no retries; the next scheduled refresh is the retry.
#[derive(Clone)]
pub struct CrowdDataAdapter {
    source: Arc<dyn CrowdDataSource>,
    fallback: Arc<Vec<CrowdPoint>>,
}

impl CrowdDataAdapter {
    pub fn new(source: Arc<dyn CrowdDataSource>) -> Self {
        Self::with_fallback(source, fallback_points())
    }

    pub fn with_fallback(source: Arc<dyn CrowdDataSource>, fallback: Vec<CrowdPoint>) -> Self {
        Self {
            source,
            fallback: Arc::new(fallback),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub async fn fetch(&self) -> CrowdFetch {
        match self.source.fetch_points().await {
            Ok(points) => {
                log::info!(
                    "Loaded {} crowd points from {} source",
                    points.len(),
                    self.source.name()
                );
                CrowdFetch {
                    points,
                    origin: self.source.origin(),
                    failure: None,
                }
            }
            Err(e) => {
                log::warn!("Error fetching crowd data: {e}; using fallback data");
                CrowdFetch {
                    points: self.fallback.as_ref().clone(),
                    origin: DataOrigin::Fallback,
                    failure: Some(e),
                }
            }
        }
    }

    /// The plain form: always some points, never an error
    pub async fn fetch_crowd_data(&self) -> Vec<CrowdPoint> {
        self.fetch().await.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_BODY: &str = r#"{"data": [
        {"lat": 40.7589, "lng": -73.9851, "intensity": 0.5, "location": "Times Square"},
        {"lat": 40.7614, "lng": -73.9776, "intensity": 1.4, "location": "Central Park South"}
    ]}"#;

    #[test]
    fn test_parse_good_body() {
        let points = parse_crowd_response(200, GOOD_BODY).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "Times Square");
        // clamped on ingest
        assert_eq!(points[1].intensity, 1.0);
    }

    #[test]
    fn test_parse_rejects_bad_status() {
        assert!(matches!(
            parse_crowd_response(503, GOOD_BODY),
            Err(DataSourceError::Status(503))
        ));
        assert!(matches!(
            parse_crowd_response(302, GOOD_BODY),
            Err(DataSourceError::Status(302))
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(
            parse_crowd_response(200, "<html>oops</html>"),
            Err(DataSourceError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        for body in [
            r#"{"data": "not an array"}"#,
            r#"{"points": []}"#,
            r#"[1, 2, 3]"#,
            r#"{"data": [{"lat": "north"}]}"#,
        ] {
            assert!(
                matches!(
                    parse_crowd_response(200, body),
                    Err(DataSourceError::UnexpectedShape(_))
                ),
                "body {body} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_accepts_empty_array() {
        assert!(parse_crowd_response(200, r#"{"data": []}"#).unwrap().is_empty());
    }

    struct FailingSource;

    #[async_trait]
    impl CrowdDataSource for FailingSource {
        async fn fetch_points(&self) -> std::result::Result<Vec<CrowdPoint>, DataSourceError> {
            Err(DataSourceError::Status(500))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_adapter_substitutes_fallback() {
        let adapter = CrowdDataAdapter::new(Arc::new(FailingSource));
        let fetch = adapter.fetch().await;

        assert!(fetch.is_fallback());
        assert_eq!(fetch.origin, DataOrigin::Fallback);
        assert_eq!(fetch.points, fallback_points());
        assert_eq!(adapter.fetch_crowd_data().await, fallback_points());
    }

    #[tokio::test]
    async fn test_adapter_passes_success_through() {
        let points = vec![CrowdPoint::new(40.75, -73.98, 0.2, "Koreatown")];
        let adapter = CrowdDataAdapter::new(Arc::new(StaticCrowdSource::new(points.clone())));
        let fetch = adapter.fetch().await;

        assert!(!fetch.is_fallback());
        assert_eq!(fetch.origin, DataOrigin::Static);
        assert_eq!(fetch.points, points);
    }
}
