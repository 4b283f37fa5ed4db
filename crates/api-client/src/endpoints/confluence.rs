//! Confluence API endpoints
//!
//! Reads and updates pages through the content REST API using a personal
//! access token. Page bodies travel in storage format (XHTML), so the
//! tracked-links list is spliced with plain string surgery rather than a
//! DOM round trip.

use crate::client::{AuthScheme, QuerydeckClient};
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Confluence API interface
#[derive(Clone)]
pub struct ConfluenceApi {
    client: QuerydeckClient,
}

impl ConfluenceApi {
    /// Create a new Confluence API interface
    pub(crate) fn new(client: QuerydeckClient) -> Self {
        Self { client }
    }

    fn auth(&self) -> ApiResult<AuthScheme> {
        Ok(AuthScheme::Bearer(
            self.client.config().confluence_auth()?.to_string(),
        ))
    }

    fn base(&self) -> ApiResult<&str> {
        self.client.config().confluence_base()
    }

    /// Fetch a page with its storage body and version
    ///
    /// GET rest/api/content/{id}?expand=body.storage,version
    pub async fn get_page(&self, page_id: &str) -> ApiResult<ConfluencePage> {
        let auth = self.auth()?;
        let url = format!(
            "{}/rest/api/content/{}?expand=body.storage,version",
            self.base()?,
            page_id
        );
        self.client.get_url(&url, &auth).await
    }

    /// Replace a page body, bumping to the given version
    ///
    /// PUT rest/api/content/{id}
    pub async fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body_storage: &str,
        new_version: u32,
    ) -> ApiResult<ConfluencePage> {
        let auth = self.auth()?;
        let url = format!("{}/rest/api/content/{}", self.base()?, page_id);
        let body = UpdatePageBody {
            id: page_id,
            content_type: "page",
            title,
            body: WireBody {
                storage: WireStorage {
                    value: body_storage,
                    representation: "storage",
                },
            },
            version: WireVersion { number: new_version },
        };
        self.client.put_url(&url, &auth, &body).await
    }

    /// Append a tracked link to a page
    ///
    /// The link lands inside the last `<ul>` on the page, or a fresh list
    /// is appended when the page has none. The page version is bumped by
    /// one, so a concurrent edit makes the update fail with a conflict
    /// instead of silently overwriting it.
    pub async fn append_link(&self, page_id: &str, link: &TrackedLink) -> ApiResult<ConfluencePage> {
        let page = self.get_page(page_id).await?;
        let current = page.storage_value().unwrap_or_default();
        let updated = splice_link(current, &link.render());
        self.update_page(page_id, &page.title, &updated, page.version.number + 1)
            .await
    }

    /// Timed connectivity probe against the space listing
    ///
    /// GET rest/api/space?limit=1
    pub async fn ping(&self) -> ApiResult<Duration> {
        let auth = self.auth()?;
        let url = format!("{}/rest/api/space?limit=1", self.base()?);
        let (_, elapsed): (serde_json::Value, Duration) =
            self.client.timed_get_url(&url, &auth).await?;
        Ok(elapsed)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A Confluence page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfluencePage {
    /// Page ID
    pub id: String,
    /// Page title
    pub title: String,
    /// Version info
    pub version: PageVersion,
    /// Body, present when requested via expand
    #[serde(default)]
    pub body: Option<PageBody>,
    /// Navigation links
    #[serde(rename = "_links", default)]
    pub links: Option<PageLinks>,
}

impl ConfluencePage {
    /// The storage-format body, when the page was fetched with one
    #[must_use]
    pub fn storage_value(&self) -> Option<&str> {
        self.body.as_ref().map(|b| b.storage.value.as_str())
    }

    /// Absolute browser URL for the page, when the API reported one
    #[must_use]
    pub fn web_url(&self) -> Option<String> {
        let links = self.links.as_ref()?;
        match (&links.base, &links.webui) {
            (Some(base), Some(webui)) => Some(format!("{}{}", base, webui)),
            _ => None,
        }
    }
}

/// Page version info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVersion {
    /// Monotonically increasing version number
    pub number: u32,
}

/// Page body container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageBody {
    /// Storage-format representation
    pub storage: StorageBody,
}

/// Storage-format body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageBody {
    /// XHTML content
    pub value: String,
    /// Always `storage` for this client
    pub representation: String,
}

/// Navigation links reported by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLinks {
    /// Instance base URL
    #[serde(default)]
    pub base: Option<String>,
    /// Browser path for the page
    #[serde(default)]
    pub webui: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdatePageBody<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    content_type: &'static str,
    title: &'a str,
    body: WireBody<'a>,
    version: WireVersion,
}

#[derive(Debug, Serialize)]
struct WireBody<'a> {
    storage: WireStorage<'a>,
}

#[derive(Debug, Serialize)]
struct WireStorage<'a> {
    value: &'a str,
    representation: &'static str,
}

#[derive(Debug, Serialize)]
struct WireVersion {
    number: u32,
}

/// A link to publish on the tracking page
#[derive(Debug, Clone)]
pub struct TrackedLink {
    /// Link text
    pub title: String,
    /// Target URL
    pub url: String,
    /// Optional note rendered after the link
    pub note: Option<String>,
}

impl TrackedLink {
    /// Create a link with no note
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            note: None,
        }
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Render as a storage-format list item
    fn render(&self) -> String {
        let mut item = format!(
            "<li><a href=\"{}\">{}</a>",
            escape_xml(&self.url),
            escape_xml(&self.title)
        );
        if let Some(note) = &self.note {
            item.push_str(" - ");
            item.push_str(&escape_xml(note));
        }
        item.push_str("</li>");
        item
    }
}

/// Insert a list item into the last `<ul>` of a storage body, or append
/// a new list when the body has none
fn splice_link(body: &str, item: &str) -> String {
    match body.rfind("</ul>") {
        Some(pos) => {
            let mut out = String::with_capacity(body.len() + item.len());
            out.push_str(&body[..pos]);
            out.push_str(item);
            out.push_str(&body[pos..]);
            out
        }
        None => format!("{}<ul>{}</ul>", body, item),
    }
}

/// Escape the characters storage format treats as markup
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialize() {
        let json = r#"{
            "id": "12345",
            "type": "page",
            "title": "Generated Dashboards",
            "version": {"number": 7, "minorEdit": false},
            "body": {"storage": {"value": "<p>intro</p><ul><li>old</li></ul>", "representation": "storage"}},
            "_links": {"base": "https://wiki.example.com", "webui": "/display/OPS/Dashboards"}
        }"#;

        let page: ConfluencePage = serde_json::from_str(json).unwrap();
        assert_eq!(page.id, "12345");
        assert_eq!(page.version.number, 7);
        assert_eq!(
            page.storage_value(),
            Some("<p>intro</p><ul><li>old</li></ul>")
        );
        assert_eq!(
            page.web_url(),
            Some("https://wiki.example.com/display/OPS/Dashboards".to_string())
        );
    }

    #[test]
    fn test_page_without_body() {
        let json = r#"{"id": "1", "title": "T", "version": {"number": 1}}"#;
        let page: ConfluencePage = serde_json::from_str(json).unwrap();
        assert_eq!(page.storage_value(), None);
        assert_eq!(page.web_url(), None);
    }

    #[test]
    fn test_splice_into_existing_list() {
        let body = "<p>links</p><ul><li>first</li></ul><p>footer</p>";
        let spliced = splice_link(body, "<li>second</li>");
        assert_eq!(
            spliced,
            "<p>links</p><ul><li>first</li><li>second</li></ul><p>footer</p>"
        );
    }

    #[test]
    fn test_splice_uses_last_list() {
        let body = "<ul><li>nav</li></ul><h2>Tracked</h2><ul><li>a</li></ul>";
        let spliced = splice_link(body, "<li>b</li>");
        assert_eq!(
            spliced,
            "<ul><li>nav</li></ul><h2>Tracked</h2><ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_splice_creates_list_when_missing() {
        let spliced = splice_link("<p>empty page</p>", "<li>first</li>");
        assert_eq!(spliced, "<p>empty page</p><ul><li>first</li></ul>");
    }

    #[test]
    fn test_link_render_escapes_markup() {
        let link = TrackedLink::new("Errors <5xx> & friends", "https://example.com/d?a=1&b=2")
            .with_note("auto \"generated\"");
        assert_eq!(
            link.render(),
            "<li><a href=\"https://example.com/d?a=1&amp;b=2\">Errors &lt;5xx&gt; &amp; friends</a> - auto &quot;generated&quot;</li>"
        );
    }

    #[test]
    fn test_update_body_wire_format() {
        let body = UpdatePageBody {
            id: "12345",
            content_type: "page",
            title: "Dashboards",
            body: WireBody {
                storage: WireStorage {
                    value: "<p>x</p>",
                    representation: "storage",
                },
            },
            version: WireVersion { number: 8 },
        };

        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"type\":\"page\""));
        assert!(json.contains("\"representation\":\"storage\""));
        assert!(json.contains("\"number\":8"));
    }
}
