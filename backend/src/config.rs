//! Service configuration, read from the environment (and `.env` if present).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str =
    "https://cloud.yellow.ai/api/engagements/notifications/v2/push?bot=x1683181251134";
pub const DEFAULT_MEDIA_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";
pub const DEFAULT_SENDER: &str = "919311239211";
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub report_dir: PathBuf,
    pub api_url: String,
    pub api_key: String,
    pub sender: String,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub media_upload_url: String,
    pub media_api_key: String,
    /// Refuse to dispatch when a column binding names a column the data
    /// source does not have. Off by default: missing values resolve to "".
    pub strict_columns: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let host = env::var("WA_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("WA_PORT").unwrap_or(8080);
        let db_path = env::var("WA_DB_PATH").unwrap_or_else(|_| "templates.sqlite".to_string());
        let data_dir = env::var("WA_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let report_dir = env::var("WA_REPORT_DIR").unwrap_or_else(|_| "./reports".to_string());
        let api_url = env::var("WA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_key = env::var("WA_API_KEY").unwrap_or_default();
        let sender = env::var("WA_SENDER").unwrap_or_else(|_| DEFAULT_SENDER.to_string());
        let max_concurrency = parse_var::<usize>("WA_MAX_CONCURRENCY")
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            .max(1);
        let request_timeout = Duration::from_secs(
            parse_var("WA_REQUEST_TIMEOUT_SECS").unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );
        let media_upload_url = env::var("WA_MEDIA_UPLOAD_URL")
            .unwrap_or_else(|_| DEFAULT_MEDIA_UPLOAD_URL.to_string());
        let media_api_key = env::var("WA_MEDIA_API_KEY").unwrap_or_default();
        let strict_columns = parse_var("WA_STRICT_COLUMNS").unwrap_or(false);

        Self {
            host,
            port,
            db_path: PathBuf::from(db_path),
            data_dir: PathBuf::from(data_dir),
            report_dir: PathBuf::from(report_dir),
            api_url,
            api_key,
            sender,
            max_concurrency,
            request_timeout,
            media_upload_url,
            media_api_key,
            strict_columns,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
