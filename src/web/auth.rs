use axum::{
    Json,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{
    api::ApiError,
    token,
    web::{AppState, session, templates},
};

/// Raw form surface of the `__action`-discriminated auth posts. All fields
/// except the discriminator are optional at the wire level; `into_action`
/// enforces per-action requirements.
#[derive(Debug, Default, Deserialize)]
pub struct AuthForm {
    #[serde(rename = "__action")]
    pub action: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub remember: Option<String>,
    pub name: Option<String>,
    pub handle: Option<String>,
    pub username: Option<String>,
}

/// The exhaustive command set behind `POST /login` and `POST /register`.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthAction {
    Login {
        email: String,
        password: String,
        remember: bool,
    },
    Register {
        name: String,
        email: String,
        password: String,
        handle: String,
    },
    CheckHandleAvailability {
        handle: String,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum ActionError {
    UnknownAction,
    MissingField(&'static str),
}

impl AuthForm {
    pub fn into_action(self) -> Result<AuthAction, ActionError> {
        fn require(
            value: Option<String>,
            field: &'static str,
        ) -> Result<String, ActionError> {
            value
                .filter(|v| !v.is_empty())
                .ok_or(ActionError::MissingField(field))
        }

        match self.action.as_deref() {
            Some("login") => Ok(AuthAction::Login {
                email: require(self.email, "email")?,
                password: require(self.password, "password")?,
                remember: self.remember.as_deref() == Some("on"),
            }),
            Some("register") => Ok(AuthAction::Register {
                name: require(self.name, "name")?,
                email: require(self.email, "email")?,
                password: require(self.password, "password")?,
                handle: require(self.handle, "handle")?,
            }),
            Some("check-handle-availability") => Ok(AuthAction::CheckHandleAvailability {
                handle: require(self.handle, "handle")?,
            }),
            // The wizard's step-1 form posts the same check under the input's
            // field name.
            Some("check-username-availability") => Ok(AuthAction::CheckHandleAvailability {
                handle: require(self.username, "username")?,
            }),
            _ => Err(ActionError::UnknownAction),
        }
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        match self {
            ActionError::UnknownAction => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "message": "Unknown action" })),
            )
                .into_response(),
            ActionError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "message": format!("Missing field `{field}`.") })),
            )
                .into_response(),
        }
    }
}

pub async fn login_page(jar: SignedCookieJar) -> Result<Html<String>, Redirect> {
    if let Some(redirect) = redirect_if_authenticated(&jar) {
        return Err(redirect);
    }

    Ok(Html(templates::render_login_page()))
}

pub async fn register_page(jar: SignedCookieJar) -> Result<Html<String>, Redirect> {
    if let Some(redirect) = redirect_if_authenticated(&jar) {
        return Err(redirect);
    }

    Ok(Html(templates::render_register_page()))
}

/// Shared action endpoint behind `POST /login` and `POST /register`.
pub async fn auth_action(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<AuthForm>,
) -> Response {
    let action = match form.into_action() {
        Ok(action) => action,
        Err(err) => return err.into_response(),
    };

    match action {
        AuthAction::Login {
            email,
            password,
            remember,
        } => process_login(state, jar, &email, &password, remember).await,
        AuthAction::Register {
            name,
            email,
            password,
            handle,
        } => process_register(state, &name, &email, &password, &handle).await,
        AuthAction::CheckHandleAvailability { handle } => {
            check_handle_availability(state, &handle).await
        }
    }
}

pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    session::destroy_session(jar, state.production()).into_response()
}

async fn process_login(
    state: AppState,
    jar: SignedCookieJar,
    email: &str,
    password: &str,
    remember: bool,
) -> Response {
    let tokens = match state.api().login(email, password).await {
        Ok(tokens) => tokens,
        Err(err) => {
            error!(%err, "login failed");
            return api_failure(&err);
        }
    };

    let handle = token::decode(&tokens.access_token)
        .ok()
        .and_then(|claims| claims.handle);
    let Some(handle) = handle else {
        error!("login succeeded but access token carries no handle claim");
        return authentication_required();
    };

    session::create_user_session(
        jar,
        &tokens.access_token,
        &tokens.refresh_token,
        remember,
        &format!("/{handle}"),
        state.production(),
    )
    .into_response()
}

async fn process_register(
    state: AppState,
    name: &str,
    email: &str,
    password: &str,
    handle: &str,
) -> Response {
    match state.api().register(name, email, password, handle).await {
        Ok(body) if body["ok"] == json!(true) => {
            Redirect::to(&session::safe_redirect(&format!("/{handle}"))).into_response()
        }
        Ok(_) => Json(json!({ "ok": false, "message": "Unable to register" })).into_response(),
        Err(err) => {
            error!(%err, "registration failed");
            api_failure(&err)
        }
    }
}

async fn check_handle_availability(state: AppState, handle: &str) -> Response {
    match state.api().handle_availability(handle).await {
        Ok(true) => Json(json!({
            "isAvailable": true,
            "message": "This username is available.",
        }))
        .into_response(),
        Ok(false) => Json(json!({
            "isAvailable": false,
            "message": "This username is already taken.",
        }))
        .into_response(),
        Err(err @ ApiError::Status { .. }) => {
            error!(%err, "availability check rejected upstream");
            api_failure(&err)
        }
        Err(err) => {
            // The wizard treats a transport hiccup as "not available yet";
            // the user just types on and retriggers the check.
            error!(%err, "availability check failed");
            Json(json!({
                "isAvailable": false,
                "message": "Something went wrong.",
            }))
            .into_response()
        }
    }
}

/// Map an upstream failure into the `{ok:false, ...}` view-model, keeping the
/// upstream status where one exists.
pub fn api_failure(err: &ApiError) -> Response {
    (err.status(), Json(err.failure_body())).into_response()
}

pub fn authentication_required() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "ok": false, "message": "Authentication required." })),
    )
        .into_response()
}

fn redirect_if_authenticated(jar: &SignedCookieJar) -> Option<Redirect> {
    let token_str = session::access_token(jar)?;
    let claims = token::decode(&token_str).ok()?;
    let handle = claims.handle?;

    Some(Redirect::to(&session::safe_redirect(&format!("/{handle}"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> AuthForm {
        let mut form = AuthForm::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "__action" => form.action = value,
                "email" => form.email = value,
                "password" => form.password = value,
                "remember" => form.remember = value,
                "name" => form.name = value,
                "handle" => form.handle = value,
                "username" => form.username = value,
                other => panic!("unexpected field {other}"),
            }
        }
        form
    }

    #[test]
    fn parses_login_with_remember() {
        let action = form(&[
            ("__action", "login"),
            ("email", "a@b.com"),
            ("password", "x"),
            ("remember", "on"),
        ])
        .into_action()
        .unwrap();

        assert_eq!(
            action,
            AuthAction::Login {
                email: "a@b.com".into(),
                password: "x".into(),
                remember: true,
            }
        );
    }

    #[test]
    fn login_without_remember_checkbox_is_session_only() {
        let action = form(&[
            ("__action", "login"),
            ("email", "a@b.com"),
            ("password", "x"),
        ])
        .into_action()
        .unwrap();

        assert!(matches!(action, AuthAction::Login { remember: false, .. }));
    }

    #[test]
    fn parses_register() {
        let action = form(&[
            ("__action", "register"),
            ("name", "Alice"),
            ("email", "a@b.com"),
            ("password", "x"),
            ("handle", "alice"),
        ])
        .into_action()
        .unwrap();

        assert_eq!(
            action,
            AuthAction::Register {
                name: "Alice".into(),
                email: "a@b.com".into(),
                password: "x".into(),
                handle: "alice".into(),
            }
        );
    }

    #[test]
    fn handle_check_reads_the_handle_field() {
        let action = form(&[("__action", "check-handle-availability"), ("handle", "bob")])
            .into_action()
            .unwrap();

        assert_eq!(
            action,
            AuthAction::CheckHandleAvailability {
                handle: "bob".into()
            }
        );
    }

    #[test]
    fn username_check_alias_reads_the_username_field() {
        let action = form(&[
            ("__action", "check-username-availability"),
            ("username", "bob"),
        ])
        .into_action()
        .unwrap();

        assert_eq!(
            action,
            AuthAction::CheckHandleAvailability {
                handle: "bob".into()
            }
        );
    }

    #[test]
    fn unknown_or_missing_action_is_rejected() {
        assert_eq!(
            form(&[("__action", "drop-table")]).into_action(),
            Err(ActionError::UnknownAction)
        );
        assert_eq!(
            form(&[("email", "a@b.com")]).into_action(),
            Err(ActionError::UnknownAction)
        );
    }

    #[test]
    fn missing_required_field_is_reported_by_name() {
        assert_eq!(
            form(&[("__action", "login"), ("email", "a@b.com")]).into_action(),
            Err(ActionError::MissingField("password"))
        );
        assert_eq!(
            form(&[("__action", "check-handle-availability"), ("handle", "")]).into_action(),
            Err(ActionError::MissingField("handle"))
        );
    }

    mod routes {
        use axum::{
            Json, Router,
            body::Body,
            http::{Request, StatusCode, header},
            routing::post,
        };
        use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
        use serde_json::{Value, json};
        use tower::ServiceExt;

        use crate::{
            config::{CloudinaryConfig, Config},
            web::{AppState, router::build_router, session},
        };

        fn access_token_for(handle: &str) -> String {
            let encode = |value: &Value| URL_SAFE_NO_PAD.encode(value.to_string());
            format!(
                "{}.{}.sig",
                encode(&json!({ "alg": "HS256", "typ": "JWT" })),
                encode(&json!({ "sub": "user-1", "handle": handle, "name": "Alice" })),
            )
        }

        /// Stand-in for the external API, answering the login route with a
        /// fixed token pair.
        async fn spawn_upstream(tokens: Value) -> String {
            let app = Router::new().route(
                "/auth/login",
                post(move || async move { Json(tokens) }),
            );
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind upstream");
            let addr = listener.local_addr().expect("upstream addr");
            tokio::spawn(async move {
                let _ = axum::serve(listener, app).await;
            });
            format!("http://{addr}")
        }

        #[tokio::test]
        async fn login_sets_session_cookie_and_redirects_to_handle() {
            let upstream = spawn_upstream(json!({
                "accessToken": access_token_for("alice"),
                "refreshToken": "refresh-1",
            }))
            .await;
            let app = build_router(AppState::from_config(Config {
                api_url: upstream,
                session_secret: "login-test-secret".into(),
                cloudinary: CloudinaryConfig::default(),
                production: false,
            }));

            let request = Request::builder()
                .method("POST")
                .uri("/login")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from(
                    "__action=login&email=a%40b.com&password=pw&remember=on",
                ))
                .expect("request");
            let response = app.oneshot(request).await.expect("response");

            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(
                response
                    .headers()
                    .get(header::LOCATION)
                    .expect("location header"),
                "/alice"
            );

            let set_cookie = response
                .headers()
                .get(header::SET_COOKIE)
                .expect("set-cookie header")
                .to_str()
                .expect("header text");
            assert!(set_cookie.starts_with(&format!("{}=", session::SESSION_COOKIE)));
            assert!(set_cookie.contains("accessToken"));
            assert!(set_cookie.contains("refreshToken"));
            // `remember=on` pins the seven-day lifetime.
            assert!(set_cookie.contains("Max-Age=604800"));
            assert!(set_cookie.contains("HttpOnly"));
        }
    }
}
