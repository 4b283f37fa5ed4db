//! SumoLogic API endpoints
//!
//! Covers the Search Job API (create, poll, page messages, delete) and
//! the Dashboard API used to publish generated dashboards. All requests
//! authenticate with HTTP basic auth using the access ID and key.

use crate::client::{AuthScheme, QuerydeckClient};
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Grid width used by SumoLogic dashboard layouts
pub const GRID_COLUMNS: u32 = 12;

/// Default number of panels placed side by side
pub const DEFAULT_PANELS_PER_ROW: u32 = 2;

/// Default panel height in grid units
pub const DEFAULT_PANEL_HEIGHT: u32 = 6;

/// SumoLogic API interface
#[derive(Clone)]
pub struct SumoApi {
    client: QuerydeckClient,
}

impl SumoApi {
    /// Create a new SumoLogic API interface
    pub(crate) fn new(client: QuerydeckClient) -> Self {
        Self { client }
    }

    fn auth(&self) -> ApiResult<AuthScheme> {
        let (id, key) = self.client.config().sumo_credentials()?;
        Ok(AuthScheme::Basic {
            username: id.to_string(),
            password: key.to_string(),
        })
    }

    fn base(&self) -> &'static str {
        self.client.config().sumo_api_base()
    }

    /// Start a search job
    ///
    /// POST v1/search/jobs
    pub async fn start_search_job(&self, request: &SearchJobRequest) -> ApiResult<SearchJobHandle> {
        let auth = self.auth()?;
        let url = format!("{}/v1/search/jobs", self.base());
        self.client.post_url(&url, &auth, request).await
    }

    /// Get the current status of a search job
    ///
    /// GET v1/search/jobs/{id}
    pub async fn search_job_status(&self, job_id: &str) -> ApiResult<SearchJobStatus> {
        let auth = self.auth()?;
        let url = format!("{}/v1/search/jobs/{}", self.base(), job_id);
        self.client.get_url(&url, &auth).await
    }

    /// Fetch a page of messages from a search job
    ///
    /// GET v1/search/jobs/{id}/messages?offset=..&limit=..
    pub async fn search_job_messages(
        &self,
        job_id: &str,
        offset: u32,
        limit: u32,
    ) -> ApiResult<SearchJobMessages> {
        let auth = self.auth()?;
        let url = format!(
            "{}/v1/search/jobs/{}/messages?offset={}&limit={}",
            self.base(),
            job_id,
            offset,
            limit
        );
        self.client.get_url(&url, &auth).await
    }

    /// Delete a search job
    ///
    /// DELETE v1/search/jobs/{id}
    pub async fn delete_search_job(&self, job_id: &str) -> ApiResult<()> {
        let auth = self.auth()?;
        let url = format!("{}/v1/search/jobs/{}", self.base(), job_id);
        self.client.delete_url(&url, &auth).await
    }

    /// Poll a search job until it reaches a terminal state
    ///
    /// Returns the final status once the job is done or cancelled; the
    /// caller decides what a cancelled job means. Fails with
    /// [`ApiError::Timeout`] when the deadline passes first.
    pub async fn wait_for_completion(
        &self,
        job_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> ApiResult<SearchJobStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.search_job_status(job_id).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                return Err(ApiError::Timeout(timeout));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Create a dashboard
    ///
    /// POST v2/dashboards
    pub async fn create_dashboard(&self, dashboard: &DashboardRequest) -> ApiResult<DashboardResponse> {
        let auth = self.auth()?;
        let url = format!("{}/v2/dashboards", self.base());
        self.client.post_url(&url, &auth, dashboard).await
    }

    /// Timed connectivity probe against the collectors listing
    ///
    /// GET v1/collectors?limit=1
    pub async fn ping(&self) -> ApiResult<Duration> {
        let auth = self.auth()?;
        let url = format!("{}/v1/collectors?limit=1", self.base());
        let (_, elapsed): (serde_json::Value, Duration) =
            self.client.timed_get_url(&url, &auth).await?;
        Ok(elapsed)
    }
}

// ============================================================================
// Search Job Types
// ============================================================================

/// Search job creation request
///
/// `from` and `to` take ISO 8601 timestamps; the API does not accept the
/// relative expressions the UI does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJobRequest {
    /// The log query to run
    pub query: String,
    /// Start of the time range (ISO 8601)
    pub from: String,
    /// End of the time range (ISO 8601)
    pub to: String,
    /// IANA time zone name
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl SearchJobRequest {
    /// Create a request with the default UTC time zone
    pub fn new(query: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            from: from.into(),
            to: to.into(),
            time_zone: "UTC".to_string(),
        }
    }

    /// Set the time zone
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }
}

/// Handle returned when a search job is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJobHandle {
    /// Job ID used for polling and paging
    pub id: String,
}

/// Search job lifecycle states reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchJobState {
    /// Queued but not running yet
    #[serde(rename = "NOT STARTED")]
    NotStarted,
    /// Results are still being gathered
    #[serde(rename = "GATHERING RESULTS")]
    GatheringResults,
    /// All results have been gathered
    #[serde(rename = "DONE GATHERING RESULTS")]
    Done,
    /// The job was cancelled
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// The job was paused by the service
    #[serde(rename = "FORCE PAUSED")]
    ForcePaused,
    /// A state this client does not know about
    #[serde(other)]
    Unknown,
}

/// Search job status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJobStatus {
    /// Current lifecycle state
    pub state: SearchJobState,
    /// Messages gathered so far
    #[serde(rename = "messageCount", default)]
    pub message_count: u64,
    /// Aggregate records produced so far
    #[serde(rename = "recordCount", default)]
    pub record_count: u64,
    /// Errors the job has accumulated
    #[serde(rename = "pendingErrors", default)]
    pub pending_errors: Vec<String>,
    /// Warnings the job has accumulated
    #[serde(rename = "pendingWarnings", default)]
    pub pending_warnings: Vec<String>,
}

impl SearchJobStatus {
    /// True once all results are gathered
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == SearchJobState::Done
    }

    /// True when the job will make no further progress
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SearchJobState::Done | SearchJobState::Cancelled)
    }
}

/// A page of search job messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchJobMessages {
    /// Field descriptors for this result set
    #[serde(default)]
    pub fields: Vec<MessageField>,
    /// Raw log messages
    #[serde(default)]
    pub messages: Vec<LogMessage>,
}

/// Descriptor for one field in a message page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageField {
    /// Field name
    pub name: String,
    /// Field type as reported by the API
    #[serde(rename = "fieldType")]
    pub field_type: String,
    /// Whether this field is a key field
    #[serde(rename = "keyField", default)]
    pub key_field: bool,
}

/// A single log message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    /// Field name to value map
    pub map: HashMap<String, String>,
}

impl LogMessage {
    /// The raw log line, when present
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.map.get("_raw").map(String::as_str)
    }

    /// The message timestamp in epoch milliseconds, when present
    #[must_use]
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.map.get("_messagetime").and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Dashboard Types
// ============================================================================

/// Dashboard creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardRequest {
    /// Dashboard title
    pub title: String,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Refresh interval in seconds (0 disables auto refresh)
    #[serde(rename = "refreshInterval")]
    pub refresh_interval: u32,
    /// Default time range applied to all panels
    #[serde(rename = "timeRange")]
    pub time_range: TimeRange,
    /// Grid layout
    pub layout: DashboardLayout,
    /// Search panels
    pub panels: Vec<DashboardPanel>,
    /// Destination folder
    #[serde(rename = "folderId", skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

/// Relative time range in the dashboard wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(rename = "type")]
    range_type: String,
    from: TimeRangeBoundary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeRangeBoundary {
    #[serde(rename = "type")]
    boundary_type: String,
    #[serde(rename = "relativeTime")]
    relative_time: String,
}

impl TimeRange {
    /// Build a relative time range such as `-1h` or `-15m`
    pub fn relative(expr: impl Into<String>) -> Self {
        Self {
            range_type: "BeginBoundedTimeRange".to_string(),
            from: TimeRangeBoundary {
                boundary_type: "RelativeTimeRangeBoundary".to_string(),
                relative_time: expr.into(),
            },
        }
    }
}

/// Grid layout container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardLayout {
    /// Always `Grid` for generated dashboards
    #[serde(rename = "layoutType")]
    pub layout_type: String,
    /// Placement of each panel, keyed by panel key
    #[serde(rename = "layoutStructures")]
    pub structures: Vec<LayoutStructure>,
}

/// Placement of one panel on the grid
///
/// The `structure` field is a JSON string, not an object; that is how
/// the dashboard API wants it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutStructure {
    /// Matching panel key
    pub key: String,
    /// Serialized `{height, width, x, y}` placement
    pub structure: String,
}

/// One search panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardPanel {
    /// Panel key referenced from the layout
    pub key: String,
    /// Panel title
    pub title: String,
    /// Always `SumoSearchPanel` for generated dashboards
    #[serde(rename = "panelType")]
    pub panel_type: String,
    /// Queries rendered by the panel
    pub queries: Vec<PanelQuery>,
}

/// One query inside a panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelQuery {
    /// The log query text
    #[serde(rename = "queryString")]
    pub query_string: String,
    /// Always `Logs` for generated dashboards
    #[serde(rename = "queryType")]
    pub query_type: String,
    /// Query letter within the panel
    #[serde(rename = "queryKey")]
    pub query_key: String,
}

/// Response from dashboard creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    /// Dashboard ID
    pub id: String,
    /// Dashboard title as stored
    pub title: String,
    /// Content library ID, when reported
    #[serde(rename = "contentId", default)]
    pub content_id: Option<String>,
}

/// Scope a query to a source category unless it already carries a scope
///
/// Queries that name `_source*` or `_index` fields are left untouched so
/// an explicit scope in the saved query always wins over the mapping.
#[must_use]
pub fn scope_query(query: &str, source_category: Option<&str>) -> String {
    match source_category {
        Some(sc) if !query.contains("_source") && !query.contains("_index") => {
            format!("_sourceCategory={} {}", sc, query)
        }
        _ => query.to_string(),
    }
}

/// Builder for grid dashboards
///
/// Panels are placed left to right, top to bottom on a 12-unit grid.
#[derive(Debug, Clone)]
pub struct DashboardBuilder {
    title: String,
    description: Option<String>,
    time_range: String,
    refresh_interval: u32,
    panels_per_row: u32,
    panel_height: u32,
    folder_id: Option<String>,
    panels: Vec<(String, String)>,
}

impl DashboardBuilder {
    /// Create a builder with default layout settings
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            time_range: "-1h".to_string(),
            refresh_interval: 0,
            panels_per_row: DEFAULT_PANELS_PER_ROW,
            panel_height: DEFAULT_PANEL_HEIGHT,
            folder_id: None,
            panels: Vec::new(),
        }
    }

    /// Set the dashboard description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the relative time range (e.g. `-1h`)
    pub fn time_range(mut self, expr: impl Into<String>) -> Self {
        self.time_range = expr.into();
        self
    }

    /// Set the auto refresh interval in seconds
    pub fn refresh_interval(mut self, seconds: u32) -> Self {
        self.refresh_interval = seconds;
        self
    }

    /// Set how many panels share a row (clamped to the grid width)
    pub fn panels_per_row(mut self, count: u32) -> Self {
        self.panels_per_row = count.clamp(1, GRID_COLUMNS);
        self
    }

    /// Set the destination folder
    pub fn folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    /// Add a search panel, scoping the query to a source category when
    /// one is given and the query has no scope of its own
    pub fn add_query_panel(
        mut self,
        title: impl Into<String>,
        query: &str,
        source_category: Option<&str>,
    ) -> Self {
        self.panels
            .push((title.into(), scope_query(query, source_category)));
        self
    }

    /// Number of panels added so far
    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Build the dashboard request
    #[must_use]
    pub fn build(self) -> DashboardRequest {
        let width = GRID_COLUMNS / self.panels_per_row;
        let mut structures = Vec::with_capacity(self.panels.len());
        let mut panels = Vec::with_capacity(self.panels.len());

        for (index, (title, query)) in self.panels.into_iter().enumerate() {
            let key = format!("panel-{}", index);
            let col = index as u32 % self.panels_per_row;
            let row = index as u32 / self.panels_per_row;

            structures.push(LayoutStructure {
                key: key.clone(),
                structure: format!(
                    "{{\"height\":{},\"width\":{},\"x\":{},\"y\":{}}}",
                    self.panel_height,
                    width,
                    col * width,
                    row * self.panel_height
                ),
            });
            panels.push(DashboardPanel {
                key,
                title,
                panel_type: "SumoSearchPanel".to_string(),
                queries: vec![PanelQuery {
                    query_string: query,
                    query_type: "Logs".to_string(),
                    query_key: "A".to_string(),
                }],
            });
        }

        DashboardRequest {
            title: self.title,
            description: self.description,
            refresh_interval: self.refresh_interval,
            time_range: TimeRange::relative(self.time_range),
            layout: DashboardLayout {
                layout_type: "Grid".to_string(),
                structures,
            },
            panels,
            folder_id: self.folder_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_job_status_deserialize() {
        let json = r#"{
            "state": "DONE GATHERING RESULTS",
            "messageCount": 120,
            "recordCount": 0,
            "pendingErrors": [],
            "pendingWarnings": ["slow partition"]
        }"#;

        let status: SearchJobStatus = serde_json::from_str(json).unwrap();
        assert!(status.is_done());
        assert!(status.is_terminal());
        assert_eq!(status.message_count, 120);
        assert_eq!(status.pending_warnings.len(), 1);
    }

    #[test]
    fn test_search_job_state_unknown() {
        let status: SearchJobStatus =
            serde_json::from_str(r#"{"state": "SOMETHING NEW"}"#).unwrap();
        assert_eq!(status.state, SearchJobState::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_messages_deserialize() {
        let json = r#"{
            "fields": [{"name": "_raw", "fieldType": "string", "keyField": false}],
            "messages": [
                {"map": {"_raw": "error: connection reset", "_messagetime": "1710000000000"}}
            ]
        }"#;

        let page: SearchJobMessages = serde_json::from_str(json).unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].raw(), Some("error: connection reset"));
        assert_eq!(page.messages[0].timestamp_ms(), Some(1_710_000_000_000));
    }

    #[test]
    fn test_scope_query() {
        assert_eq!(
            scope_query("error | count by _sourceHost", Some("prod/auth")),
            "error | count by _sourceHost"
        );
        assert_eq!(
            scope_query("_index=audit failure", Some("prod/auth")),
            "_index=audit failure"
        );
        assert_eq!(
            scope_query("error | count", Some("prod/auth")),
            "_sourceCategory=prod/auth error | count"
        );
        assert_eq!(scope_query("error | count", None), "error | count");
    }

    #[test]
    fn test_builder_grid_layout() {
        let request = DashboardBuilder::new("Checkout health")
            .time_range("-3h")
            .add_query_panel("failures", "error", Some("prod/checkout"))
            .add_query_panel("latency", "latency | avg", Some("prod/checkout"))
            .add_query_panel("volume", "* | count", None)
            .build();

        assert_eq!(request.panels.len(), 3);
        assert_eq!(request.layout.structures.len(), 3);

        // Two panels per row, six units each, third panel wraps
        assert_eq!(
            request.layout.structures[0].structure,
            "{\"height\":6,\"width\":6,\"x\":0,\"y\":0}"
        );
        assert_eq!(
            request.layout.structures[1].structure,
            "{\"height\":6,\"width\":6,\"x\":6,\"y\":0}"
        );
        assert_eq!(
            request.layout.structures[2].structure,
            "{\"height\":6,\"width\":6,\"x\":0,\"y\":6}"
        );

        // Layout keys line up with panel keys
        for (structure, panel) in request.layout.structures.iter().zip(&request.panels) {
            assert_eq!(structure.key, panel.key);
        }

        assert_eq!(
            request.panels[0].queries[0].query_string,
            "_sourceCategory=prod/checkout error"
        );
    }

    #[test]
    fn test_dashboard_request_wire_format() {
        let request = DashboardBuilder::new("Ops")
            .description("Generated")
            .add_query_panel("errors", "error | count", None)
            .build();

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"timeRange\""));
        assert!(json.contains("\"layoutStructures\""));
        assert!(json.contains("\"panelType\":\"SumoSearchPanel\""));
        assert!(json.contains("\"queryType\":\"Logs\""));
        assert!(json.contains("\"refreshInterval\":0"));
        assert!(json.contains("\"relativeTime\":\"-1h\""));
        // No folder was set, so the field is omitted entirely
        assert!(!json.contains("folderId"));
    }

    #[test]
    fn test_full_width_panels() {
        let request = DashboardBuilder::new("Single column")
            .panels_per_row(1)
            .add_query_panel("a", "q", None)
            .add_query_panel("b", "q", None)
            .build();

        assert_eq!(
            request.layout.structures[0].structure,
            "{\"height\":6,\"width\":12,\"x\":0,\"y\":0}"
        );
        assert_eq!(
            request.layout.structures[1].structure,
            "{\"height\":6,\"width\":12,\"x\":0,\"y\":6}"
        );
    }
}
