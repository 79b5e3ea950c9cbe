/// Liveness check, also the keepalive target
pub async fn health_check() -> &'static str {
    "ok"
}
