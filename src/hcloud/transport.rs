/// HTTP transport for the Hetzner Cloud API
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::models::{Hydrate, ResourceIter};
use crate::config::Configuration;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw outcome of one API call after classification
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Parsed JSON body, `Value::Null` when empty, or the raw text of a non-JSON error page
    pub body: Value,
}

/// Issues one HTTP request per call against the configured endpoint.
///
/// Cloning is cheap: the underlying connection pool and configuration are shared.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    config: Arc<Configuration>,
}

impl Transport {
    /// Build the HTTP client for a validated configuration
    pub fn new(config: Configuration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.api_key()))
                .map_err(|_| Error::Configuration("Invalid API token format".to_string()))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Configuration this transport was built from
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Send one request and classify the outcome.
    ///
    /// Authentication, rate-limit and server-side failures are mapped to their
    /// own error variants. Any other status is returned to the caller, who
    /// knows which code the endpoint is supposed to answer with.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = self.config.endpoint_url(endpoint);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        classify(status, &text)
    }

    /// Send a mutation and require a specific status code.
    ///
    /// An `action.error` embedded in the response fails the call even when
    /// the status code matches.
    pub async fn expect(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        expected: StatusCode,
    ) -> Result<Value> {
        let response = self.request(method, endpoint, &[], body).await?;
        embedded_action_error(response.status, &response.body)?;
        if response.status != expected {
            return Err(Error::action(
                Some(response.status.as_u16()),
                response.body,
            ));
        }
        Ok(response.body)
    }

    /// Fetch the raw JSON object stored under `key` for a single resource
    pub async fn fetch_json(
        &self,
        endpoint: &str,
        key: &str,
        resource: &'static str,
        id: u64,
    ) -> Result<Value> {
        let response = self.request(Method::GET, endpoint, &[], None).await?;
        match response.status {
            StatusCode::NOT_FOUND => Err(Error::NotFound { resource, id }),
            StatusCode::OK => take_key(response.body, key, StatusCode::OK),
            status => Err(Error::action(Some(status.as_u16()), response.body)),
        }
    }

    /// Fetch and hydrate a single resource
    pub async fn fetch_one<T: Hydrate>(
        &self,
        endpoint: &str,
        key: &str,
        resource: &'static str,
        id: u64,
    ) -> Result<T> {
        let value = self.fetch_json(endpoint, key, resource, id).await?;
        let wire = serde_json::from_value(value)?;
        Ok(T::hydrate(self, wire))
    }

    /// List a collection; records are hydrated lazily as the iterator is consumed
    pub async fn list<T: Hydrate>(
        &self,
        endpoint: &str,
        key: &str,
        query: &[(&str, String)],
    ) -> Result<ResourceIter<T>> {
        let response = self.request(Method::GET, endpoint, query, None).await?;
        if response.status != StatusCode::OK {
            return Err(Error::action(
                Some(response.status.as_u16()),
                response.body,
            ));
        }

        let records = take_key(response.body, key, StatusCode::OK)?;
        let wires: Vec<T::Wire> = serde_json::from_value(records)?;
        Ok(ResourceIter::new(self.clone(), wires))
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Map a status code and raw body to either a response or a typed error
fn classify(status: StatusCode, text: &str) -> Result<ApiResponse> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimitExceeded);
    }

    if status.is_server_error() {
        return Err(Error::ProviderUnavailable(text.to_string()));
    }

    let body = if text.trim().is_empty() {
        Value::Null
    } else if status.is_success() {
        serde_json::from_str(text)?
    } else {
        // Error pages are not always JSON; keep the raw text as the payload
        serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
    };

    Ok(ApiResponse { status, body })
}

/// Fail when a mutation response carries a non-null `action.error`
fn embedded_action_error(status: StatusCode, body: &Value) -> Result<()> {
    match body
        .get("action")
        .and_then(|action| action.get("error"))
        .filter(|error| !error.is_null())
    {
        Some(error) => Err(Error::action(Some(status.as_u16()), error.clone())),
        None => Ok(()),
    }
}

/// Query parameters for an optional exact-name filter
pub(crate) fn name_filter(name: Option<&str>) -> Vec<(&'static str, String)> {
    name.map(|n| vec![("name", n.to_string())])
        .unwrap_or_default()
}

/// Pull the expected top-level key out of a response envelope
pub(crate) fn take_key(mut body: Value, key: &str, status: StatusCode) -> Result<Value> {
    match body.get_mut(key).map(Value::take) {
        Some(value) => Ok(value),
        None => Err(Error::action(Some(status.as_u16()), body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{action_json, mock_transport};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_classify_auth_failures() {
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED, ""),
            Err(Error::Authentication)
        ));
        assert!(matches!(
            classify(StatusCode::FORBIDDEN, "{}"),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_classify_rate_limit_and_server_errors() {
        assert!(matches!(
            classify(StatusCode::TOO_MANY_REQUESTS, "{}"),
            Err(Error::RateLimitExceeded)
        ));

        match classify(StatusCode::SERVICE_UNAVAILABLE, "maintenance") {
            Err(Error::ProviderUnavailable(text)) => assert_eq!(text, "maintenance"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_embedded_action_error_wins() {
        let body = json!({
            "action": {
                "id": 1,
                "status": "error",
                "error": {"code": "action_failed", "message": "boom"}
            }
        })
        .to_string();

        let response = classify(StatusCode::OK, &body).unwrap();
        match embedded_action_error(response.status, &response.body) {
            Err(Error::Action { status, payload }) => {
                assert_eq!(status, Some(200));
                assert_eq!(payload["code"], "action_failed");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_null_action_error_passes() {
        let body = json!({"action": {"id": 1, "error": null}}).to_string();
        let response = classify(StatusCode::CREATED, &body).unwrap();
        assert!(embedded_action_error(response.status, &response.body).is_ok());
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["action"]["id"], 1);
    }

    #[test]
    fn test_classify_empty_body() {
        let response = classify(StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(response.body, Value::Null);
    }

    #[test]
    fn test_take_key_missing() {
        let result = take_key(json!({"error": {"code": "x"}}), "servers", StatusCode::OK);
        assert!(matches!(result, Err(Error::Action { .. })));

        let result = take_key(json!([]), "ssh_key", StatusCode::CREATED);
        assert!(matches!(result, Err(Error::Action { status: Some(201), .. })));
    }

    #[test]
    fn test_classify_plain_text_error_body() {
        let response = classify(StatusCode::NOT_FOUND, "404 page not found").unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!("404 page not found"));

        assert!(matches!(
            classify(StatusCode::OK, "not json"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_name_filter() {
        assert!(name_filter(None).is_empty());
        assert_eq!(
            name_filter(Some("my-server")),
            vec![("name", "my-server".to_string())]
        );
    }

    #[tokio::test]
    async fn test_fetch_keeps_failed_action() {
        let server = MockServer::start().await;
        let mut failed = action_json(7, "error");
        failed["error"] = json!({"code": "action_failed", "message": "Action failed"});
        Mock::given(method("GET"))
            .and(path("/v1/actions/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"action": failed})))
            .mount(&server)
            .await;

        let transport = mock_transport(&server);
        let value = transport
            .fetch_json("actions/7", "action", "action", 7)
            .await
            .unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], "action_failed");
    }

    #[tokio::test]
    async fn test_plain_text_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ssh_keys/5"))
            .respond_with(ResponseTemplate::new(404).set_body_string("404 page not found"))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/ssh_keys/5"))
            .respond_with(ResponseTemplate::new(404).set_body_string("404 page not found"))
            .mount(&server)
            .await;

        let transport = mock_transport(&server);
        let result = transport.fetch_json("ssh_keys/5", "ssh_key", "ssh_key", 5).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                resource: "ssh_key",
                id: 5
            })
        ));

        let body = json!({"name": "laptop"});
        match transport
            .expect(Method::PUT, "ssh_keys/5", Some(&body), StatusCode::OK)
            .await
        {
            Err(Error::Action { status, payload }) => {
                assert_eq!(status, Some(404));
                assert_eq!(payload, json!("404 page not found"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
