use std::fmt;

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

/// Client for the external REST API that owns all real data: users, handles,
/// links and folders. Every operation here is a thin pass-through; this
/// service holds no state of its own beyond the session cookie.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

/// Failure surface of the external API, split the way the action handlers
/// need to report it.
#[derive(Debug)]
pub enum ApiError {
    /// The API answered with a non-success status and (usually) a JSON body.
    Status { status: StatusCode, body: Value },
    /// The request never produced an API response.
    Transport {
        status: Option<StatusCode>,
        message: String,
    },
}

impl ApiError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        ApiError::Transport {
            status: err.status(),
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Status { status, .. } => *status,
            ApiError::Transport { status, .. } => status.unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }

    /// Flatten into the `{ok:false, ...}` view-model surfaced to pages.
    ///
    /// For status errors every field of the upstream body is preserved
    /// unchanged next to `ok:false`; non-object bodies are carried under
    /// `message`. Transport errors report a `code` and `message`.
    pub fn failure_body(&self) -> Value {
        match self {
            ApiError::Status { body, .. } => {
                let mut merged = json!({ "ok": false });
                match body {
                    Value::Object(fields) => {
                        for (key, value) in fields {
                            merged[key.as_str()] = value.clone();
                        }
                    }
                    Value::Null => {}
                    other => merged["message"] = other.clone(),
                }
                merged
            }
            ApiError::Transport { status, message } => json!({
                "ok": false,
                "code": status.map(|s| s.as_u16()).unwrap_or(502),
                "message": message,
            }),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status { status, body } => {
                write!(f, "api call failed with status {status}: {body}")
            }
            ApiError::Transport { message, .. } => write!(f, "api transport error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Token pair returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Read-only profile projection from `GET /handles/:username/details`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandleDetails {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct AvailabilityPayload {
    #[serde(rename = "isAvailable", default)]
    is_available: bool,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let body = self
            .request(
                Method::POST,
                "/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await?;

        serde_json::from_value(body.clone()).map_err(|err| ApiError::Transport {
            status: None,
            message: format!("unexpected login payload: {err} ({body})"),
        })
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        handle: &str,
    ) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "name": name,
                "email": email,
                "password": password,
                "handle": handle,
            })),
            None,
        )
        .await
    }

    /// `GET /handles/:handle` — asks whether a handle is still free.
    pub async fn handle_availability(&self, handle: &str) -> Result<bool, ApiError> {
        let body = self
            .request(Method::GET, &format!("/handles/{handle}"), None, None)
            .await?;

        let payload: AvailabilityPayload =
            serde_json::from_value(body).map_err(|err| ApiError::Transport {
                status: None,
                message: format!("unexpected availability payload: {err}"),
            })?;
        Ok(payload.is_available)
    }

    /// `GET /handles/:username/details` — `None` when the handle is unknown
    /// (the API answers with a null or empty body).
    pub async fn handle_details(&self, username: &str) -> Result<Option<HandleDetails>, ApiError> {
        let body = self
            .request(
                Method::GET,
                &format!("/handles/{username}/details"),
                None,
                None,
            )
            .await?;

        if body.is_null() {
            return Ok(None);
        }
        let details: HandleDetails =
            serde_json::from_value(body).map_err(|err| ApiError::Transport {
                status: None,
                message: format!("unexpected handle details payload: {err}"),
            })?;
        Ok(Some(details))
    }

    /// `PATCH /users/:id` with bearer authorization. Used for profile
    /// mutations; currently only the avatar URL goes through here.
    pub async fn update_user(
        &self,
        id: &str,
        bearer_token: &str,
        patch: Value,
    ) -> Result<Value, ApiError> {
        self.request(
            Method::PATCH,
            &format!("/users/{id}"),
            Some(patch),
            Some(bearer_token),
        )
        .await
    }

    pub async fn links_for_user(&self, id: &str) -> Result<Vec<LinkItem>, ApiError> {
        let body = self
            .request(Method::GET, &format!("/links/u/{id}"), None, None)
            .await?;

        serde_json::from_value(body).map_err(|err| ApiError::Transport {
            status: None,
            message: format!("unexpected links payload: {err}"),
        })
    }

    pub async fn folders_for_user(&self, id: &str) -> Result<Vec<Folder>, ApiError> {
        let body = self
            .request(Method::GET, &format!("/folders/u/{id}"), None, None)
            .await?;

        serde_json::from_value(body).map_err(|err| ApiError::Transport {
            status: None,
            message: format!("unexpected folders payload: {err}"),
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        json_body: Option<Value>,
        bearer_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self.http.request(method, &url);

        if let Some(token) = bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::from_reqwest)?;

        // Empty bodies (204, missing records) read as null.
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        Ok(body)
    }
}
