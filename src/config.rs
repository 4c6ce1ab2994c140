use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub max_body_size: usize,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let jwt_ttl_hours: i64 = env_or("MOCKHUB_JWT_TTL_HOURS", "168")
            .parse()
            .map_err(|e| format!("Invalid MOCKHUB_JWT_TTL_HOURS: {e}"))?;
        if jwt_ttl_hours <= 0 {
            return Err("MOCKHUB_JWT_TTL_HOURS must be positive".to_string());
        }

        let host: IpAddr = env_or("MOCKHUB_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid MOCKHUB_HOST: {e}"))?;

        let port: u16 = env_or("MOCKHUB_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid MOCKHUB_PORT: {e}"))?;

        let base_url = env_or("MOCKHUB_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let max_body_size: usize = env_or("MOCKHUB_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid MOCKHUB_MAX_BODY_SIZE: {e}"))?;

        let allowed_origins = parse_origins(&env_or(
            "MOCKHUB_ALLOWED_ORIGINS",
            "http://localhost:3000",
        ));

        let log_level = env_or("MOCKHUB_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            host,
            port,
            base_url,
            max_body_size,
            allowed_origins,
            log_level,
        })
    }

    /// Public URL under which a mock is executed.
    pub fn mock_url(&self, mock_id: uuid::Uuid) -> String {
        format!("{}/mock/{mock_id}", self.base_url)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("http://a.test, http://b.test ,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }
}
