use axum::response::Html;

use crate::html::render_index;

/// `GET /`: upload form.
pub async fn index() -> Html<String> {
    Html(render_index())
}
