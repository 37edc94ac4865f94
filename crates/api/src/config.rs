use storyreel_providers::ProviderId;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Static bearer token required on all `/api` routes.
    pub api_token: String,
    /// Delay between provider status polls, in seconds (default: `2`).
    pub poll_interval_secs: u64,
    /// Status polls before a job is recorded as timed out (default: `30`).
    pub poll_max_attempts: u32,
    /// Per-provider endpoints, API keys, and webhook secrets.
    pub providers: ProvidersConfig,
}

/// Connection settings for one external generation service.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    /// Shared secret the provider signs webhook bodies with.
    pub webhook_secret: String,
}

/// Settings for all three backing services.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    pub flux: ProviderSettings,
    pub luma: ProviderSettings,
    pub scribe: ProviderSettings,
}

impl ProvidersConfig {
    /// The webhook signing secret for a provider.
    pub fn webhook_secret(&self, provider: ProviderId) -> &str {
        match provider {
            ProviderId::Flux => &self.flux.webhook_secret,
            ProviderId::Luma => &self.luma.webhook_secret,
            ProviderId::Scribe => &self.scribe.webhook_secret,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `API_TOKEN`            | `dev-token`                |
    /// | `POLL_INTERVAL_SECS`   | `2`                        |
    /// | `POLL_MAX_ATTEMPTS`    | `30`                       |
    /// | `FLUX_BASE_URL`        | `https://api.flux.local`   |
    /// | `FLUX_API_KEY`         | (empty)                    |
    /// | `FLUX_WEBHOOK_SECRET`  | (empty)                    |
    /// | `LUMA_BASE_URL`        | `https://api.luma.local`   |
    /// | `LUMA_API_KEY`         | (empty)                    |
    /// | `LUMA_WEBHOOK_SECRET`  | (empty)                    |
    /// | `SCRIBE_BASE_URL`      | `https://api.scribe.local` |
    /// | `SCRIBE_API_KEY`       | (empty)                    |
    /// | `SCRIBE_WEBHOOK_SECRET`| (empty)                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let api_token = std::env::var("API_TOKEN").unwrap_or_else(|_| "dev-token".into());

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let poll_max_attempts: u32 = std::env::var("POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("POLL_MAX_ATTEMPTS must be a valid u32");

        let providers = ProvidersConfig {
            flux: provider_settings("FLUX", "https://api.flux.local"),
            luma: provider_settings("LUMA", "https://api.luma.local"),
            scribe: provider_settings("SCRIBE", "https://api.scribe.local"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            api_token,
            poll_interval_secs,
            poll_max_attempts,
            providers,
        }
    }
}

fn provider_settings(prefix: &str, default_base_url: &str) -> ProviderSettings {
    ProviderSettings {
        base_url: std::env::var(format!("{prefix}_BASE_URL"))
            .unwrap_or_else(|_| default_base_url.into()),
        api_key: std::env::var(format!("{prefix}_API_KEY")).unwrap_or_default(),
        webhook_secret: std::env::var(format!("{prefix}_WEBHOOK_SECRET")).unwrap_or_default(),
    }
}
