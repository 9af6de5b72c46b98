/// Configuration for connecting to S3-compatible object storage (AWS S3,
/// or a MinIO deployment reachable via a custom endpoint).
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for MinIO / LocalStack; absent means real AWS S3.
    pub endpoint_url: Option<String>,
    /// Allow plain HTTP — only ever set for local MinIO.
    pub allow_http: bool,
}

impl StorageConfig {
    /// Build from environment variables: `STORAGE_BUCKET`, `STORAGE_REGION`,
    /// `STORAGE_ACCESS_KEY_ID`, `STORAGE_SECRET_ACCESS_KEY`,
    /// `STORAGE_ENDPOINT_URL`, `STORAGE_ALLOW_HTTP`.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self {
            bucket: std::env::var("STORAGE_BUCKET")?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")?,
            endpoint_url: std::env::var("STORAGE_ENDPOINT_URL").ok(),
            allow_http: std::env::var("STORAGE_ALLOW_HTTP")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}
