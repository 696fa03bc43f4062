use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use bytes::Bytes;
use futures::SinkExt;
use serde_json::json;
use tracing::error;

use crate::{
    token,
    web::{
        AppState,
        auth::{api_failure, authentication_required},
        session,
    },
};

// Channel depth for the upload pipe; keeps memory bounded while the CDN
// reads slower than the browser writes.
const UPLOAD_PIPE_DEPTH: usize = 8;

/// `POST /:username` — multipart avatar actions (`add-avatar`,
/// `delete-avatar`).
///
/// Both require a session access token whose `sub` claim identifies the user
/// record to PATCH; without one the request fails up front instead of
/// reaching the external API with a bogus path.
pub async fn avatar_action(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(username): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let Some(access_token) = session::access_token(&jar) else {
        return authentication_required();
    };
    let subject = token::decode(&access_token)
        .ok()
        .and_then(|claims| claims.sub);
    let Some(subject) = subject else {
        return authentication_required();
    };

    let mut action: Option<String> = None;
    let mut uploaded_url: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return form_failure(&format!("invalid multipart form: {err}")),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "__action" => match field.text().await {
                Ok(value) => action = Some(value),
                Err(err) => return form_failure(&format!("failed to read action field: {err}")),
            },
            "avatar" if field.file_name().is_some() => {
                match relay_avatar_upload(&state, field).await {
                    Ok(url) => uploaded_url = Some(url),
                    Err(response) => return response,
                }
            }
            _ => {
                // Unknown fields are drained so the stream stays consistent.
                let _ = field.text().await;
            }
        }
    }

    match action.as_deref() {
        Some("add-avatar") => {
            let Some(url) = uploaded_url else {
                return form_failure("missing avatar file");
            };
            patch_avatar(&state, &subject, &access_token, &username, json!(url)).await
        }
        Some("delete-avatar") => {
            patch_avatar(&state, &subject, &access_token, &username, json!("")).await
        }
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "message": "Unknown action" })),
        )
            .into_response(),
    }
}

/// Pipe the multipart field into the CDN upload: field chunks go into a
/// bounded channel while reqwest drains the other end, so the file is never
/// held in memory as a whole.
async fn relay_avatar_upload(
    state: &AppState,
    mut field: axum::extract::multipart::Field<'_>,
) -> Result<String, Response> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let is_image = content_type
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false);
    if !is_image {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({ "ok": false, "message": "Avatar must be an image." })),
        )
            .into_response());
    }

    let filename = field.file_name().unwrap_or("avatar").to_string();

    let (mut tx, rx) = futures::channel::mpsc::channel::<Result<Bytes, std::io::Error>>(
        UPLOAD_PIPE_DEPTH,
    );
    let upload = state.cdn().upload_stream(&filename, &content_type, rx);
    let pump = async move {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    // The receiver is dropped once the CDN call settles;
                    // stop pumping instead of erroring in that case.
                    if tx.send(Ok(chunk)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    };

    let (upload_result, pump_result) = tokio::join!(upload, pump);

    if let Err(err) = pump_result {
        error!(%err, "failed to read avatar upload");
        return Err(form_failure(&format!("failed to read avatar upload: {err}")));
    }
    match upload_result {
        Ok(url) => Ok(url),
        Err(err) => {
            error!(%err, "cdn upload failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "ok": false, "message": "Image upload failed." })),
            )
                .into_response())
        }
    }
}

async fn patch_avatar(
    state: &AppState,
    subject: &str,
    access_token: &str,
    username: &str,
    avatar: serde_json::Value,
) -> Response {
    match state
        .api()
        .update_user(subject, access_token, json!({ "avatar": avatar }))
        .await
    {
        Ok(_) => Redirect::to(&session::safe_redirect(&format!("/{username}"))).into_response(),
        Err(err) => {
            error!(%err, "avatar update failed");
            api_failure(&err)
        }
    }
}

fn form_failure(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "ok": false, "message": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{
        config::{CloudinaryConfig, Config},
        web::{AppState, router::build_router, session},
    };

    const TEST_SECRET: &str = "avatar-test-secret";
    const BOUNDARY: &str = "liber-boundary";

    fn test_state() -> AppState {
        // Port 9 (discard) so an accidental upstream call fails fast.
        AppState::from_config(Config {
            api_url: "http://127.0.0.1:9".into(),
            session_secret: TEST_SECRET.into(),
            cloudinary: CloudinaryConfig::default(),
            production: false,
        })
    }

    fn delete_avatar_request(cookie: Option<String>) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"__action\"\r\n\r\n\
             delete-avatar\r\n\
             --{BOUNDARY}--\r\n"
        );
        let mut builder = Request::builder()
            .method("POST")
            .uri("/alice")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).expect("request")
    }

    fn signed_session_cookie(access_token: &str) -> String {
        let key = session::signing_key(TEST_SECRET);
        let payload = json!({ "accessToken": access_token }).to_string();

        let mut jar = cookie::CookieJar::new();
        jar.signed_mut(&key)
            .add(cookie::Cookie::new(session::SESSION_COOKIE, payload));
        let signed = jar.get(session::SESSION_COOKIE).expect("signed cookie");
        format!("{}={}", session::SESSION_COOKIE, signed.value())
    }

    fn token_without_subject() -> String {
        let encode = |value: &Value| URL_SAFE_NO_PAD.encode(value.to_string());
        format!(
            "{}.{}.sig",
            encode(&json!({ "alg": "HS256", "typ": "JWT" })),
            encode(&json!({ "handle": "alice" })),
        )
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn avatar_action_without_session_is_rejected() {
        let app = build_router(test_state());

        let response = app
            .oneshot(delete_avatar_request(None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": false, "message": "Authentication required." })
        );
    }

    #[tokio::test]
    async fn avatar_action_with_subjectless_token_is_rejected() {
        let app = build_router(test_state());
        let cookie = signed_session_cookie(&token_without_subject());

        let response = app
            .oneshot(delete_avatar_request(Some(cookie)))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": false, "message": "Authentication required." })
        );
    }
}
