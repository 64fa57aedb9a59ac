//! Gateway-proxy style request router.
//!
//! Requests and responses use the familiar proxy envelope
//! (`httpMethod`, `path`, `queryStringParameters`, `body` in;
//! `statusCode`, `headers`, `body` out) so any HTTP front end can forward
//! to [`handle_request`] unchanged.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::chat::REPHRASE_HINT;
use crate::error::{CoreError, ParseError};
use crate::goal::GoalDraft;
use crate::service::GoalService;

pub const STATUS_PATH: &str = "/status";
pub const GOAL_PATH: &str = "/goal";
pub const GOALS_PATH: &str = "/goals";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(http_method: &str, path: &str) -> Self {
        Self {
            http_method: http_method.to_string(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn query(&self, key: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()?
            .get(key)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ApiResponse {
    pub fn new(status_code: u16, body: &Value) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ]);
        Self {
            status_code,
            headers,
            body: Some(body.to_string()),
        }
    }

    fn message(status_code: u16, message: &str) -> Self {
        Self::new(status_code, &Value::String(message.to_string()))
    }

    /// Response for an envelope that could not be read at all.
    pub fn internal_error() -> Self {
        Self::message(500, "Internal Server Error")
    }

    /// Decoded body, if any.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(self.body.as_deref()?).ok()
    }
}

/// Why a request was turned away before reaching the service.
enum Rejection {
    BadRequest,
    InvalidJson,
}

impl From<Rejection> for ApiResponse {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::BadRequest => ApiResponse::message(400, "Bad Request"),
            Rejection::InvalidJson => ApiResponse::message(400, "Invalid JSON"),
        }
    }
}

fn json_body(request: &ApiRequest) -> Result<Value, Rejection> {
    let raw = request.body.as_deref().ok_or(Rejection::BadRequest)?;
    serde_json::from_str(raw).map_err(|_| Rejection::InvalidJson)
}

fn required_query(request: &ApiRequest, key: &str) -> Result<String, Rejection> {
    request
        .query(key)
        .map(str::to_string)
        .ok_or(Rejection::BadRequest)
}

fn operation(name: &str, item: &impl Serialize) -> Value {
    json!({
        "Operation": name,
        "Message": "SUCCESS",
        "Item": item,
    })
}

fn error_response(err: CoreError) -> ApiResponse {
    match &err {
        CoreError::Parse(ParseError::TaskExtractionFailed(_)) => ApiResponse::new(
            422,
            &json!({ "message": REPHRASE_HINT, "error": err.to_string() }),
        ),
        CoreError::Parse(ParseError::TimeOutOfRange) | CoreError::Validation(_) => {
            ApiResponse::message(400, &err.to_string())
        }
        CoreError::NotFound(_) => ApiResponse::message(404, &err.to_string()),
        CoreError::Integration { .. } => {
            error!(error = %err, "upstream integration failed");
            ApiResponse::message(502, &err.to_string())
        }
        CoreError::Database(_) | CoreError::Config(_) | CoreError::Io(_) | CoreError::Json(_) => {
            error!(error = %err, "request failed");
            ApiResponse::message(500, &err.to_string())
        }
    }
}

fn respond<T: Serialize>(result: Result<T, CoreError>, wrap: impl FnOnce(&T) -> Value) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::new(200, &wrap(&value)),
        Err(err) => error_response(err),
    }
}

/// Route one request at the current instant.
pub async fn handle_request(service: &GoalService, request: &ApiRequest) -> ApiResponse {
    handle_request_at(service, request, Utc::now()).await
}

/// Route one request, composing relative times against `now`.
///
/// `now` is UTC, so clock phrases in posted text ("at 9 am") resolve on the
/// UTC wall clock; the goal's `timeZone` is only a label.
pub async fn handle_request_at(
    service: &GoalService,
    request: &ApiRequest,
    now: DateTime<Utc>,
) -> ApiResponse {
    debug!(method = %request.http_method, path = %request.path, "api request");

    match (request.path.as_str(), request.http_method.as_str()) {
        (STATUS_PATH, "GET") => ApiResponse::message(200, "Service is available"),
        (GOAL_PATH, method) => match goal_route(service, request, method, now).await {
            Ok(response) | Err(response) => response,
        },
        (GOALS_PATH, "GET") => respond(service.list(), |goals| json!(goals)),
        _ => ApiResponse::message(404, "404 Not Found"),
    }
}

async fn goal_route(
    service: &GoalService,
    request: &ApiRequest,
    method: &str,
    now: DateTime<Utc>,
) -> Result<ApiResponse, ApiResponse> {
    let response = match method {
        "GET" => {
            let goal_id = required_query(request, "goalId")?;
            respond(service.get(&goal_id), |goal| json!(goal))
        }
        "POST" => {
            let result = match json_body(request)? {
                Value::String(text) => service.create_from_text(&text, &now).await,
                body @ Value::Object(_) => {
                    let draft: GoalDraft =
                        serde_json::from_value(body).map_err(|_| Rejection::BadRequest)?;
                    service.create(draft, now).await
                }
                _ => return Err(Rejection::BadRequest.into()),
            };
            respond(result, |goal| operation("SAVE", goal))
        }
        "PATCH" => {
            let body = json_body(request)?;
            let goal_id = body
                .get("goalId")
                .and_then(Value::as_str)
                .ok_or(Rejection::BadRequest)?;
            let key = body
                .get("updateKey")
                .and_then(Value::as_str)
                .ok_or(Rejection::BadRequest)?;
            let value = body.get("updateValue").ok_or(Rejection::BadRequest)?;
            respond(service.update(goal_id, key, value), |goal| operation("UPDATE", goal))
        }
        "DELETE" => {
            let goal_id = required_query(request, "goalId")?;
            respond(service.delete(&goal_id), |goal| operation("DELETE", goal))
        }
        _ => ApiResponse::message(405, "Method Not Allowed"),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::RuleTaskExtractor;
    use crate::parser::ReminderComposer;
    use crate::storage::GoalDb;
    use std::sync::Arc;

    fn service() -> GoalService {
        GoalService::new(
            GoalDb::open_memory().unwrap(),
            ReminderComposer::new(Arc::new(RuleTaskExtractor::new())),
        )
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn send(service: &GoalService, request: ApiRequest) -> ApiResponse {
        handle_request_at(service, &request, now()).await
    }

    #[tokio::test]
    async fn status_is_available() {
        let response = send(&service(), ApiRequest::new("GET", "/status")).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.json(), Some(json!("Service is available")));
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.headers["Content-Type"], "application/json");
    }

    #[tokio::test]
    async fn post_text_creates_goal() {
        let service = service();
        let response = send(
            &service,
            ApiRequest::new("POST", "/goal").with_body(r#""remind me to call John in 2 hours""#),
        )
        .await;

        assert_eq!(response.status_code, 200);
        let body = response.json().unwrap();
        assert_eq!(body["Operation"], "SAVE");
        assert_eq!(body["Message"], "SUCCESS");
        assert_eq!(body["Item"]["title"], "Reminder: call John");
        assert_eq!(body["Item"]["startTime"], "2024-01-01T12:00:00Z");
        assert_eq!(body["Item"]["reminder"], 5);
        assert_eq!(body["Item"]["createdDate"], 20240101);
    }

    #[tokio::test]
    async fn posted_clock_time_is_read_in_utc() {
        let service = service();
        let response = send(
            &service,
            ApiRequest::new("POST", "/goal").with_body(r#""standup at 9 am""#),
        )
        .await;

        let item = &response.json().unwrap()["Item"];
        assert_eq!(item["startTime"], "2024-01-02T09:00:00Z");
        assert_eq!(item["timeZone"], "America/Denver");
    }

    #[tokio::test]
    async fn post_object_creates_goal_from_draft() {
        let service = service();
        let body = json!({
            "title": "Standup",
            "startTime": "2024-01-02T16:00:00Z",
            "endTime": "2024-01-02T16:15:00Z",
            "reminder": 10,
        });
        let response = send(&service, ApiRequest::new("POST", "/goal").with_body(body.to_string())).await;
        assert_eq!(response.status_code, 200);
        let item = &response.json().unwrap()["Item"];
        assert_eq!(item["timeZone"], "America/Denver");
        assert_eq!(item["reminder"], 10);
    }

    #[tokio::test]
    async fn get_patch_delete_flow() {
        let service = service();
        let created = send(&service, ApiRequest::new("POST", "/goal").with_body(r#""buy milk""#)).await;
        let goal_id = created.json().unwrap()["Item"]["goalId"]
            .as_str()
            .unwrap()
            .to_string();

        let fetched = send(&service, ApiRequest::new("GET", "/goal").with_query("goalId", &goal_id)).await;
        assert_eq!(fetched.status_code, 200);
        assert_eq!(fetched.json().unwrap()["title"], "Reminder: buy milk");

        let patch = json!({ "goalId": goal_id, "updateKey": "title", "updateValue": "Reminder: buy oat milk" });
        let patched = send(&service, ApiRequest::new("PATCH", "/goal").with_body(patch.to_string())).await;
        assert_eq!(patched.status_code, 200);
        let body = patched.json().unwrap();
        assert_eq!(body["Operation"], "UPDATE");
        assert_eq!(body["Item"]["title"], "Reminder: buy oat milk");

        let listed = send(&service, ApiRequest::new("GET", "/goals")).await;
        assert_eq!(listed.json().unwrap().as_array().unwrap().len(), 1);

        let deleted = send(&service, ApiRequest::new("DELETE", "/goal").with_query("goalId", &goal_id)).await;
        assert_eq!(deleted.status_code, 200);
        assert_eq!(deleted.json().unwrap()["Operation"], "DELETE");

        let missing = send(&service, ApiRequest::new("GET", "/goal").with_query("goalId", &goal_id)).await;
        assert_eq!(missing.status_code, 404);
        let missing = send(&service, ApiRequest::new("DELETE", "/goal").with_query("goalId", &goal_id)).await;
        assert_eq!(missing.status_code, 404);
    }

    #[tokio::test]
    async fn malformed_requests() {
        let service = service();
        let cases = [
            (ApiRequest::new("GET", "/goal"), 400, json!("Bad Request")),
            (ApiRequest::new("POST", "/goal"), 400, json!("Bad Request")),
            (ApiRequest::new("POST", "/goal").with_body("{not json"), 400, json!("Invalid JSON")),
            (ApiRequest::new("POST", "/goal").with_body("42"), 400, json!("Bad Request")),
            (ApiRequest::new("POST", "/goal").with_body(r#"{"title":"x"}"#), 400, json!("Bad Request")),
            (ApiRequest::new("PATCH", "/goal").with_body(r#"{"goalId":"x"}"#), 400, json!("Bad Request")),
            (ApiRequest::new("PUT", "/goal"), 405, json!("Method Not Allowed")),
            (ApiRequest::new("GET", "/nowhere"), 404, json!("404 Not Found")),
            (ApiRequest::new("POST", "/goals"), 404, json!("404 Not Found")),
        ];
        for (request, status, body) in cases {
            let response = send(&service, request.clone()).await;
            assert_eq!(response.status_code, status, "{request:?}");
            assert_eq!(response.json(), Some(body), "{request:?}");
        }
    }

    #[tokio::test]
    async fn unusable_text_asks_for_rephrasing() {
        let response = send(
            &service(),
            ApiRequest::new("POST", "/goal").with_body(r#""remind me tomorrow""#),
        )
        .await;
        assert_eq!(response.status_code, 422);
        assert_eq!(response.json().unwrap()["message"], REPHRASE_HINT);
    }

    #[tokio::test]
    async fn invalid_update_is_a_validation_error() {
        let service = service();
        let created = send(&service, ApiRequest::new("POST", "/goal").with_body(r#""buy milk""#)).await;
        let goal_id = created.json().unwrap()["Item"]["goalId"].clone();
        let patch = json!({ "goalId": goal_id, "updateKey": "colour", "updateValue": "red" });
        let response = send(&service, ApiRequest::new("PATCH", "/goal").with_body(patch.to_string())).await;
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn envelope_uses_proxy_field_names() {
        let request: ApiRequest = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/goal",
            "queryStringParameters": { "goalId": "abc" },
        }))
        .unwrap();
        assert_eq!(request.query("goalId"), Some("abc"));

        let response = serde_json::to_value(ApiResponse::internal_error()).unwrap();
        assert_eq!(response["statusCode"], 500);
        assert_eq!(response["body"], "\"Internal Server Error\"");
    }
}
