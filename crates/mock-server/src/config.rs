/// Mock server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `8000`, the real backend's port).
    pub port: u16,
}

impl MockConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var     | Default     |
    /// |-------------|-------------|
    /// | `MOCK_HOST` | `127.0.0.1` |
    /// | `MOCK_PORT` | `8000`      |
    pub fn from_env() -> Result<Self, String> {
        let host = std::env::var("MOCK_HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = std::env::var("MOCK_PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .map_err(|_| "MOCK_PORT must be a valid u16".to_string())?;

        Ok(Self { host, port })
    }
}
