use config::{Config, Environment};
use serde::Deserialize;

/// Runtime knobs, overridable through GHP_* environment variables
/// (GHP_HOST, GHP_USER_AGENT, GHP_TIMEOUT_SECS).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "github.com".to_string(),
            user_agent: format!("gh_profile/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Config::builder()
            .add_source(Environment::with_prefix("GHP"))
            .build()
            .and_then(Config::try_deserialize)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.host, "github.com");
        assert_eq!(s.timeout_secs, 30);
        assert!(s.user_agent.starts_with("gh_profile/"));
    }
}
