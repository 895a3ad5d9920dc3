//! `webdriver-client`: a thin W3C WebDriver wire client.
//!
//! Covers only what simulated timeline interaction needs: open or attach to a
//! session, navigate, find elements, click, read attributes and text,
//! and run small scripts (scrolling). W3C error bodies are mapped onto
//! [`WebDriverError`] so callers can tell a missing control from a stale one.

pub mod error;

pub use error::{Result, WebDriverError};

use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

/// Key under which W3C WebDriver serializes element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Element lookup strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum By {
    Css(String),
    XPath(String),
}

impl By {
    fn strategy(&self) -> &'static str {
        match self {
            By::Css(_) => "css selector",
            By::XPath(_) => "xpath",
        }
    }

    fn value(&self) -> &str {
        match self {
            By::Css(v) | By::XPath(v) => v,
        }
    }
}

/// Opaque handle to an element in the current document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(ELEMENT_KEY.to_string(), Value::String(self.0.clone()));
        Value::Object(map)
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// A session on a remote WebDriver endpoint (chromedriver, geckodriver,
/// Selenium grid). The browser process itself is managed elsewhere.
pub struct WebDriver {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriver {
    /// Open a new session against `base_url` with the given capabilities
    /// object (placed under `capabilities.alwaysMatch`).
    pub async fn new_session(base_url: &str, capabilities: Value) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let body = json!({ "capabilities": { "alwaysMatch": capabilities } });
        let value = send(&client, Method::POST, &format!("{base_url}/session"), Some(body)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::Parse("missing sessionId".into()))?
            .to_string();
        tracing::info!(session_id = %session_id, "WebDriver session opened");
        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    /// Attach to an existing session by id.
    pub fn attach(base_url: &str, session_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: session_id.into(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.call(Method::POST, "url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    /// All elements matching `by`, searched from the document root or from
    /// inside `scope`. An empty result is not an error.
    pub async fn find_elements(&self, scope: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        let path = match scope {
            Some(el) => format!("element/{}/elements", el.0),
            None => "elements".to_string(),
        };
        let body = json!({ "using": by.strategy(), "value": by.value() });
        let value = self.call(Method::POST, &path, Some(body)).await?;
        let items = value
            .as_array()
            .ok_or_else(|| WebDriverError::Parse("elements response is not an array".into()))?;
        items
            .iter()
            .map(|v| {
                v.get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .map(|s| ElementId(s.to_string()))
                    .ok_or_else(|| WebDriverError::Parse("missing element reference".into()))
            })
            .collect()
    }

    pub async fn click(&self, el: &ElementId) -> Result<()> {
        self.call(Method::POST, &format!("element/{}/click", el.0), Some(json!({})))
            .await?;
        Ok(())
    }

    pub async fn attribute(&self, el: &ElementId, name: &str) -> Result<Option<String>> {
        let value = self
            .call(
                Method::GET,
                &format!("element/{}/attribute/{}", el.0, name),
                None,
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    pub async fn text(&self, el: &ElementId) -> Result<String> {
        let value = self
            .call(Method::GET, &format!("element/{}/text", el.0), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Run a synchronous script in the page. Element handles passed in
    /// `args` must be serialized with [`ElementId`] semantics by the caller.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.call(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    /// Scroll the viewport down by roughly one screen.
    pub async fn scroll_page(&self) -> Result<()> {
        self.execute("window.scrollBy(0, window.innerHeight);", vec![])
            .await?;
        Ok(())
    }

    pub async fn scroll_into_view(&self, el: &ElementId) -> Result<()> {
        self.execute(
            "arguments[0].scrollIntoView({block: 'center'});",
            vec![el.to_json()],
        )
        .await?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        send(&self.client, Method::DELETE, &url, None).await?;
        Ok(())
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/session/{}/{}", self.base_url, self.session_id, path);
        send(&self.client, method, &url, body).await
    }
}

async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value> {
    let mut req = client.request(method, url);
    if let Some(body) = body {
        req = req.json(&body);
    }
    let resp = req.send().await?;
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let err = serde_json::from_str::<WireResponse>(&text)
            .ok()
            .and_then(|w| serde_json::from_value::<WireError>(w.value).ok());
        return Err(match err {
            Some(e) if e.error == "no such element" => WebDriverError::NoSuchElement(e.message),
            Some(e) if e.error == "stale element reference" => {
                WebDriverError::StaleElement(e.message)
            }
            Some(e) => WebDriverError::Api {
                status: status.as_u16(),
                error: e.error,
                message: e.message,
            },
            None => WebDriverError::Api {
                status: status.as_u16(),
                error: "unknown error".into(),
                message: text,
            },
        });
    }

    let wire: WireResponse = serde_json::from_str(&text)?;
    Ok(wire.value)
}
