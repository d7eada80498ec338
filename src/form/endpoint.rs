// Form submission endpoint port
//
// The backend is an opaque collaborator: it receives a form-encoded or JSON
// POST and answers the JSON contract { success, message?, errors? }. The port
// is a trait so the controller can be exercised against test doubles; the
// reqwest implementation is what a real session wires in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{FieldErrors, PageError};

/// Response contract shared by the contact and newsletter collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}

impl FormResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            errors: FieldErrors::new(),
        }
    }

    pub fn rejected(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            errors,
        }
    }
}

/// How the body goes over the wire
#[derive(Debug, Clone)]
pub enum SubmitBody {
    /// Contact form: application/x-www-form-urlencoded
    FormEncoded(Vec<(String, String)>),
    /// Newsletter: application/json
    Json(serde_json::Value),
}

/// One outgoing submission
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub url: String,
    pub body: SubmitBody,
    /// Anti-forgery token from the rendered markup, sent as X-CSRFToken
    pub csrf_token: Option<String>,
}

/// Collaborator port for form submissions
#[async_trait]
pub trait FormEndpoint: Send + Sync {
    async fn submit(&self, request: SubmitRequest) -> Result<FormResponse, PageError>;
}

/// Real HTTP collaborator backed by reqwest
pub struct HttpEndpoint {
    client: reqwest::Client,
    /// Resolves the page-relative action URLs ("/api/contact/")
    base_url: String,
}

impl HttpEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), url)
        }
    }
}

#[async_trait]
impl FormEndpoint for HttpEndpoint {
    async fn submit(&self, request: SubmitRequest) -> Result<FormResponse, PageError> {
        let mut builder = self
            .client
            .post(self.resolve(&request.url))
            .header("X-Requested-With", "XMLHttpRequest");

        if let Some(token) = &request.csrf_token {
            builder = builder.header("X-CSRFToken", token);
        }

        builder = match &request.body {
            SubmitBody::FormEncoded(pairs) => builder.form(pairs),
            SubmitBody::Json(value) => builder.json(value),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| PageError::Network(e.to_string()))?;

        // The collaborator reports failure inside the JSON contract, so the
        // body is parsed regardless of HTTP status; an unparseable body is a
        // network-class failure.
        response
            .json::<FormResponse>()
            .await
            .map_err(|e| PageError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_contract_deserializes_minimal_body() {
        let response: FormResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(response.success);
        assert!(response.message.is_none());
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_response_contract_keeps_error_order() {
        let response: FormResponse = serde_json::from_str(
            r#"{"success": false, "errors": {"email": ["Invalid", "Already subscribed"]}}"#,
        )
        .unwrap();
        assert_eq!(response.errors["email"], vec!["Invalid", "Already subscribed"]);
    }

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let endpoint = HttpEndpoint::new("http://127.0.0.1:9999/");
        assert_eq!(
            endpoint.resolve("/api/contact/"),
            "http://127.0.0.1:9999/api/contact/"
        );
        assert_eq!(
            endpoint.resolve("http://other.test/x"),
            "http://other.test/x"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Nothing listens on this port
        let endpoint = HttpEndpoint::new("http://127.0.0.1:1");
        let result = endpoint
            .submit(SubmitRequest {
                url: "/api/newsletter/".to_string(),
                body: SubmitBody::Json(serde_json::json!({"email": "user@example.com"})),
                csrf_token: None,
            })
            .await;
        assert!(matches!(result, Err(PageError::Network(_))));
    }
}
