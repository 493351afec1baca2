//! Database and client test utilities

use anyhow::Result;
use sqlx::SqlitePool;
use std::time::Duration;
use tempfile::TempDir;

use hsa_assist::services::{ClientConfig, RequestClient};
use hsa_assist::utils::RetryPolicy;

/// Create a temporary database with the schema applied
///
/// Returns (TempDir, path, pool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, std::path::PathBuf, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_hsa.db");
    let pool = hsa_common::db::init_database(&db_path).await?;
    Ok((temp_dir, db_path, pool))
}

/// Three attempts, 10 ms apart
pub fn fast_client_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::new(3, Duration::from_millis(10)),
    }
}

pub fn fast_client(base_url: &str) -> RequestClient {
    RequestClient::new(fast_client_config(base_url)).expect("client builds")
}

/// URL of a local port with nothing listening on it
pub async fn unused_local_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
