//! Dashboard page
//!
//! Thin presentation client over the JSON endpoints; served as a static
//! embedded page.

use axum::response::Html;

/// `GET /api/db-attention`
pub async fn page() -> Html<&'static str> {
    Html(include_str!("../../assets/dashboard.html"))
}
