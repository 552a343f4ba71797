use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_RATE_LIMIT_RPM: u32 = 120;
const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Verbose default log filter when RUST_LOG is unset
    pub debug: bool,
    /// CORS allowed origins (`*` = any)
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u32,
    /// Directory to serve the front-end from (None = don't serve it)
    pub static_dir: Option<String>,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT").filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PORT", raw))?,
            None => DEFAULT_PORT,
        };

        // Anything but "true" (case-insensitive) is off.
        let debug = lookup("DEBUG")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        // Unset, empty, or only separators all mean "any origin".
        let allowed_origins: Vec<String> = lookup("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let rate_limit_rpm = match lookup("RATE_LIMIT_RPM").filter(|s| !s.is_empty()) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) | Err(_) => return Err(ConfigError::InvalidNumber("RATE_LIMIT_RPM", raw)),
                Ok(rpm) => rpm,
            },
            None => DEFAULT_RATE_LIMIT_RPM,
        };

        // Empty STATIC_DIR disables front-end serving.
        let static_dir = match lookup("STATIC_DIR") {
            Some(dir) if dir.trim().is_empty() => None,
            Some(dir) => Some(dir),
            None => Some(DEFAULT_STATIC_DIR.to_string()),
        };

        Ok(Self {
            host,
            port,
            debug,
            allowed_origins,
            rate_limit_rpm,
            static_dir,
        })
    }

    /// Default tracing filter, used when RUST_LOG is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "debug,actix_web=info,hyper=info,reqwest=info"
        } else {
            "info,actix_web=info"
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidNumber(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<NodeConfig, ConfigError> {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        NodeConfig::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(config.debug);
        assert_eq!(config.allowed_origins, vec!["*"]);
        assert_eq!(config.rate_limit_rpm, 120);
        assert_eq!(config.static_dir.as_deref(), Some("static"));
        assert_eq!(
            config.default_log_filter(),
            "debug,actix_web=info,hyper=info,reqwest=info"
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DEBUG", "False"),
            ("ALLOWED_ORIGINS", "http://localhost:3000, https://poet.example"),
            ("STATIC_DIR", ""),
        ])
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert!(!config.debug);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "https://poet.example"]
        );
        assert_eq!(config.static_dir, None);
        assert_eq!(config.default_log_filter(), "info,actix_web=info");
    }

    #[test]
    fn test_blank_origins_fall_back_to_any() {
        for raw in ["", "  ", " , ,"] {
            let config = load(&[("ALLOWED_ORIGINS", raw)]).unwrap();
            assert_eq!(config.allowed_origins, vec!["*"], "ALLOWED_ORIGINS={raw:?}");
        }
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("PORT", "70000")]).is_err());
        assert!(load(&[("RATE_LIMIT_RPM", "0")]).is_err());
    }
}
