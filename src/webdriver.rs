//! Minimal W3C WebDriver client.
//!
//! Only the endpoints needed to log in, read the schedule table and click
//! reserve links are covered. Every call is a JSON request against a running
//! driver such as chromedriver.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::{NetworkConfig, WebDriverConfig};

/// Key under which the protocol serializes element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Error payload returned by the driver on failed commands.
#[derive(Debug, Clone, PartialEq, Eq, Error, Deserialize)]
#[error("webdriver error '{error}': {message}")]
pub struct WebDriverError {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Element lookup strategies used by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Css(&'a str),
    LinkText(&'a str),
    TagName(&'a str),
}

impl Locator<'_> {
    fn to_json(self) -> Value {
        let (using, value) = match self {
            Locator::Css(v) => ("css selector", v),
            Locator::LinkText(v) => ("link text", v),
            Locator::TagName(v) => ("tag name", v),
        };
        json!({ "using": using, "value": value })
    }
}

/// Reference to an element of the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

impl ElementId {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementId(id.to_string()))
            .context("Response does not contain an element reference")
    }

    /// Serialized form, for script arguments.
    pub fn to_json(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }
}

/// Client for a WebDriver endpoint.
#[derive(Clone, Debug)]
pub struct WebDriverClient {
    client: reqwest::Client,
    url: String,
}

impl WebDriverClient {
    /// Create a new client with configurable timeouts.
    pub fn new(url: String, network_config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Capabilities requested for the configured browser.
    pub fn capabilities(config: &WebDriverConfig) -> Value {
        let mut always_match = json!({ "browserName": config.browser });
        if config.headless {
            match config.browser.as_str() {
                "chrome" => {
                    always_match["goog:chromeOptions"] = json!({ "args": ["--headless"] });
                }
                "firefox" => {
                    always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] });
                }
                _ => {}
            }
        }
        json!({ "capabilities": { "alwaysMatch": always_match } })
    }

    /// Start a browser session.
    pub async fn new_session(&self, config: &WebDriverConfig) -> Result<Session> {
        let body = Self::capabilities(config);
        let value = send(&self.client, Method::POST, &format!("{}/session", self.url), Some(body))
            .await
            .context("Failed to create webdriver session")?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .context("Session response does not contain a sessionId")?
            .to_string();
        debug!("Webdriver session {} created", id);

        Ok(Session {
            client: self.client.clone(),
            base: format!("{}/session/{}", self.url, id),
            id,
        })
    }
}

/// A live browser session.
#[derive(Debug)]
pub struct Session {
    client: reqwest::Client,
    base: String,
    id: String,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        send(&self.client, method, &format!("{}{}", self.base, path), body).await
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    pub async fn maximize_window(&self) -> Result<()> {
        self.command(Method::POST, "/window/maximize", Some(json!({})))
            .await
            .context("Failed to maximize window")?;
        Ok(())
    }

    pub async fn find_element(&self, locator: Locator<'_>) -> Result<ElementId> {
        let value = self
            .command(Method::POST, "/element", Some(locator.to_json()))
            .await
            .with_context(|| format!("Failed to find element {:?}", locator))?;
        ElementId::from_value(&value)
    }

    pub async fn find_elements(&self, locator: Locator<'_>) -> Result<Vec<ElementId>> {
        let value = self
            .command(Method::POST, "/elements", Some(locator.to_json()))
            .await
            .with_context(|| format!("Failed to find elements {:?}", locator))?;
        element_list(&value)
    }

    /// Find the first descendant of `parent` matching `locator`.
    pub async fn find_element_in(
        &self,
        parent: &ElementId,
        locator: Locator<'_>,
    ) -> Result<ElementId> {
        let path = format!("/element/{}/element", parent.0);
        let value = self
            .command(Method::POST, &path, Some(locator.to_json()))
            .await
            .with_context(|| format!("Failed to find {:?} inside {}", locator, parent.0))?;
        ElementId::from_value(&value)
    }

    /// Find every descendant of `parent` matching `locator`, in document order.
    pub async fn find_elements_in(
        &self,
        parent: &ElementId,
        locator: Locator<'_>,
    ) -> Result<Vec<ElementId>> {
        let path = format!("/element/{}/elements", parent.0);
        let value = self
            .command(Method::POST, &path, Some(locator.to_json()))
            .await
            .with_context(|| format!("Failed to find {:?} inside {}", locator, parent.0))?;
        element_list(&value)
    }

    /// Rendered text of an element.
    pub async fn element_text(&self, element: &ElementId) -> Result<String> {
        let path = format!("/element/{}/text", element.0);
        let value = self
            .command(Method::GET, &path, None)
            .await
            .with_context(|| format!("Failed to read text of {}", element.0))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Attribute value, `None` when the element does not carry it.
    pub async fn element_attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>> {
        let path = format!("/element/{}/attribute/{}", element.0, name);
        let value = self
            .command(Method::GET, &path, None)
            .await
            .with_context(|| format!("Failed to read attribute {} of {}", name, element.0))?;
        Ok(value.as_str().map(str::to_string))
    }

    pub async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        let path = format!("/element/{}/value", element.0);
        self.command(Method::POST, &path, Some(json!({ "text": text })))
            .await
            .with_context(|| format!("Failed to type into {}", element.0))?;
        Ok(())
    }

    pub async fn click(&self, element: &ElementId) -> Result<()> {
        let path = format!("/element/{}/click", element.0);
        self.command(Method::POST, &path, Some(json!({})))
            .await
            .with_context(|| format!("Failed to click {}", element.0))?;
        Ok(())
    }

    /// Run a synchronous script in the page and return its result.
    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
        .context("Failed to execute script")
    }

    /// End the session and close the browser.
    pub async fn delete(self) -> Result<()> {
        self.command(Method::DELETE, "", None)
            .await
            .context("Failed to delete webdriver session")?;
        debug!("Webdriver session {} deleted", self.id);
        Ok(())
    }
}

fn element_list(value: &Value) -> Result<Vec<ElementId>> {
    value
        .as_array()
        .context("Expected a list of elements")?
        .iter()
        .map(ElementId::from_value)
        .collect()
}

/// Send one command and unwrap the `value` member of the response.
async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value> {
    debug!("{} {}", method, url);
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request
        .send()
        .await
        .context("Failed to send request to webdriver")?;

    let status = response.status();
    let payload = response
        .json::<Value>()
        .await
        .with_context(|| format!("Failed to parse webdriver response (status {})", status))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = serde_json::from_value::<WebDriverError>(value).unwrap_or_else(|_| {
            WebDriverError {
                error: "unknown error".to_string(),
                message: format!("status {}", status),
            }
        });
        return Err(error.into());
    }

    Ok(value)
}
