use axum::response::Html;

use crate::web::templates;

/// `GET /` and `GET /home` — the public marketing page.
pub async fn landing_page() -> Html<String> {
    Html(templates::render_landing_page())
}
