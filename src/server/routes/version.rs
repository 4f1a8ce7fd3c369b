//! GET /version

/// Crate version as plain text
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
