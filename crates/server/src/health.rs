use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", timestamp: Utc::now().to_rfc3339() })
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::health;

    #[tokio::test]
    async fn health_reports_ok_with_a_parseable_timestamp() {
        let payload = health().await.0;

        assert_eq!(payload.status, "ok");
        assert!(DateTime::parse_from_rfc3339(&payload.timestamp).is_ok());
    }
}
