use crate::models::types::{AppError, HttpMethod, HttpOperation};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{json, Map, Value as JsonValue};
use std::time::Duration;

/// The network layer every tool call goes through.
#[async_trait]
pub trait BankBackend: Send + Sync {
    async fn send(&self, operation: HttpOperation, args: JsonValue) -> Result<JsonValue, AppError>;
}

pub struct HttpBankBackend {
    client: Client,
    base_url: Url,
}

impl HttpBankBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::CommandError(format!("Invalid bank API url `{}`: {}", base_url, e)))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    fn build_url(&self, segments: &[String]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::CommandError(format!("Bank API url `{}` cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl BankBackend for HttpBankBackend {
    async fn send(&self, operation: HttpOperation, args: JsonValue) -> Result<JsonValue, AppError> {
        let mut params = match args {
            JsonValue::Object(map) => map,
            JsonValue::Null => Map::new(),
            other => {
                return Err(AppError::CommandError(format!(
                    "Arguments for `{}` must be a JSON object, got {}",
                    operation, other
                )))
            }
        };

        let segments = render_path(operation.path, &mut params)?;
        let mut url = self.build_url(&segments)?;

        let request = match operation.method {
            HttpMethod::Get => {
                {
                    let mut query = url.query_pairs_mut();
                    for (key, value) in &params {
                        if !value.is_null() {
                            query.append_pair(key, &scalar_to_string(value));
                        }
                    }
                }
                if url.query() == Some("") {
                    url.set_query(None);
                }
                self.client.get(url)
            }
            HttpMethod::Post => self.client.post(url).json(&JsonValue::Object(params)),
        };

        log::debug!("Sending {} to the banking API", operation);
        let response = request.send().await.map_err(AppError::from)?;
        let status = response.status();
        log::debug!("Banking API response status: {:?}", status);

        let body = response.text().await.map_err(AppError::from)?;
        if !status.is_success() {
            return Err(AppError::ApiError {
                status: status.as_u16(),
                body: error_detail(&body),
            });
        }

        Ok(parse_body(&body))
    }
}

/// Fills the `{param}` segments of `template` from `params`, removing the
/// consumed entries. Returns the path segments ready to be url-encoded.
pub fn render_path(template: &str, params: &mut Map<String, JsonValue>) -> Result<Vec<String>, AppError> {
    template
        .trim_start_matches('/')
        .split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => match params.remove(name) {
                Some(value) if !value.is_null() => {
                    let segment = scalar_to_string(&value);
                    // url normalization would drop these and hit another route
                    if segment.trim().is_empty() || segment == "." || segment == ".." {
                        return Err(AppError::InvalidArguments {
                            tool: template.to_string(),
                            reason: format!("invalid value `{}` for path parameter `{}`", segment, name),
                        });
                    }
                    Ok(segment)
                }
                _ => Err(AppError::InvalidArguments {
                    tool: template.to_string(),
                    reason: format!("missing path parameter `{}`", name),
                }),
            },
            None => Ok(segment.to_string()),
        })
        .collect()
}

fn scalar_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_body(body: &str) -> JsonValue {
    if body.trim().is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| json!({ "result": body }))
}

// FastAPI style errors carry the message under `detail`
fn error_detail(body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_render_path_consumes_params() {
        let mut params = json!({"customer_id": "C001", "extra": 1})
            .as_object()
            .unwrap()
            .clone();
        let segments = render_path("/customers/{customer_id}/accounts", &mut params).unwrap();
        assert_eq!(segments, vec!["customers", "C001", "accounts"]);
        assert!(!params.contains_key("customer_id"));
        assert!(params.contains_key("extra"));
    }

    #[test]
    fn test_render_path_missing_param() {
        let mut params = Map::new();
        let result = render_path("/loans/{customer_id}", &mut params);
        assert!(matches!(result, Err(AppError::InvalidArguments { .. })));
    }

    #[test]
    fn test_render_path_rejects_dot_segments() {
        for bad in ["..", ".", "", "  "] {
            let mut params = json!({ "customer_id": bad }).as_object().unwrap().clone();
            let result = render_path("/customers/{customer_id}/accounts", &mut params);
            assert!(
                matches!(result, Err(AppError::InvalidArguments { .. })),
                "accepted `{}`",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_dot_dot_customer_never_reaches_server() {
        let server = MockServer::start().await;
        let backend = HttpBankBackend::new(&server.uri(), Duration::from_secs(5)).unwrap();

        let result = backend
            .send(
                HttpOperation::get("/customers/{customer_id}/accounts"),
                json!({"customer_id": ".."}),
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidArguments { .. })));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(""), JsonValue::Null);
        assert_eq!(parse_body("[1,2]"), json!([1, 2]));
        assert_eq!(parse_body("plain text"), json!({"result": "plain text"}));
    }

    #[tokio::test]
    async fn test_get_with_path_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers/C001/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"account_id": "A1", "type": "checking", "balance": 1200.5, "currency": "EUR"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/web"))
            .and(query_param("query", "euribor rate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBankBackend::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let accounts = backend
            .send(
                HttpOperation::get("/customers/{customer_id}/accounts"),
                json!({"customer_id": "C001"}),
            )
            .await
            .unwrap();
        assert_eq!(accounts[0]["balance"], 1200.5);

        let search = backend
            .send(HttpOperation::get("/search/web"), json!({"query": "euribor rate"}))
            .await
            .unwrap();
        assert_eq!(search, json!({"results": []}));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/loans/apply"))
            .and(body_json(json!({"customer_id": "C001", "amount": 5000.0, "purpose": "cars"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loan_id": "LN-1234", "status": "approved"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBankBackend::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let loan = backend
            .send(
                HttpOperation::post("/loans/apply"),
                json!({"customer_id": "C001", "amount": 5000.0, "purpose": "cars"}),
            )
            .await
            .unwrap();
        assert_eq!(loan["status"], "approved");
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers/C404"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Customer not found"})),
            )
            .mount(&server)
            .await;

        let backend = HttpBankBackend::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = backend
            .send(
                HttpOperation::get("/customers/{customer_id}"),
                json!({"customer_id": "C404"}),
            )
            .await
            .unwrap_err();
        match err {
            AppError::ApiError { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "Customer not found");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
