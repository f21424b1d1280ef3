use std::env;

/// Application configuration loaded from environment variables.
/// Every setting has a default; nothing is required for a local run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the archive metadata service.
    pub api_base_url: String,

    /// URLs per metadata lookup call. The service caps batches at 50.
    pub batch_size: usize,

    /// HTTP timeout for metadata calls, in seconds.
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults. Panics with a clear message on unparseable numbers.
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("ARCHIVE_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            batch_size: env::var("LINKPULSE_BATCH_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .expect("LINKPULSE_BATCH_SIZE must be a number"),
            request_timeout_secs: env::var("LINKPULSE_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("LINKPULSE_HTTP_TIMEOUT_SECS must be a number"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            batch_size: 50,
            request_timeout_secs: 30,
        }
    }
}
