use base64::Engine;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

pub const SERVER_NAME: &str = "Keyword MCP Server";

pub const DEFAULT_DATAFORSEO_BASE_URL: &str = "https://api.dataforseo.com/v3";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const ENV_KEYS: [&str; 21] = [
    "host",
    "port",
    "loglevel",
    "max_body_bytes",
    "mcp_auth_token",
    "database_url",
    "database_max_connections",
    "dataforseo_api_key",
    "dataforseo_username",
    "dataforseo_login",
    "dataforseo_api_secret",
    "dataforseo_password",
    "dataforseo_base_url",
    "dataforseo_rate_limit",
    "google_api_key",
    "gemini_base_url",
    "gemini_image_model",
    "aws_access_key_id",
    "aws_secret_access_key",
    "aws_region",
    "aws_s3_bucket",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub loglevel: String,
    pub max_body_bytes: usize,
    pub mcp_auth_token: Option<String>,

    pub database_url: Option<String>,
    pub database_max_connections: u32,

    pub dataforseo_api_key: Option<String>,
    pub dataforseo_username: Option<String>,
    pub dataforseo_login: Option<String>,
    pub dataforseo_api_secret: Option<String>,
    pub dataforseo_password: Option<String>,
    pub dataforseo_base_url: Url,
    pub dataforseo_rate_limit: u32,

    pub google_api_key: Option<String>,
    pub gemini_base_url: Url,
    pub gemini_image_model: String,

    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_region: String,
    pub aws_s3_bucket: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            loglevel: "info".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
            mcp_auth_token: None,
            database_url: None,
            database_max_connections: 5,
            dataforseo_api_key: None,
            dataforseo_username: None,
            dataforseo_login: None,
            dataforseo_api_secret: None,
            dataforseo_password: None,
            dataforseo_base_url: Url::parse(DEFAULT_DATAFORSEO_BASE_URL)
                .expect("default DataForSEO url is valid"),
            dataforseo_rate_limit: 600,
            google_api_key: None,
            gemini_base_url: Url::parse(DEFAULT_GEMINI_BASE_URL)
                .expect("default Gemini url is valid"),
            gemini_image_model: DEFAULT_GEMINI_IMAGE_MODEL.to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_region: "us-east-2".to_string(),
            aws_s3_bucket: Some("arb-imgs".to_string()),
        }
    }
}

impl Config {
    /// Defaults overlaid with process environment variables (`PORT`, `DATABASE_URL`, ...).
    /// A value that fails to parse is an error; nothing falls back to defaults.
    pub fn from_env() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::raw().only(&ENV_KEYS))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value for the DataForSEO `Authorization: Basic ...` header.
    ///
    /// Login and secret are encoded together; a lone key is assumed to be
    /// Base64 already.
    pub fn dataforseo_basic_auth(&self) -> Option<String> {
        let user = non_blank(&self.dataforseo_username)
            .or_else(|| non_blank(&self.dataforseo_login))
            .or_else(|| non_blank(&self.dataforseo_api_key))?;
        let secret =
            non_blank(&self.dataforseo_api_secret).or_else(|| non_blank(&self.dataforseo_password));

        Some(match secret {
            Some(secret) => base64::engine::general_purpose::STANDARD
                .encode(format!("{user}:{secret}")),
            None => user.to_string(),
        })
    }

    pub fn s3_credentials(&self) -> Option<(&str, &str)> {
        Some((
            non_blank(&self.aws_access_key_id)?,
            non_blank(&self.aws_secret_access_key)?,
        ))
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        non_blank(&self.aws_s3_bucket)
    }

    pub fn google_api_key(&self) -> Option<&str> {
        non_blank(&self.google_api_key)
    }

    pub fn database_url(&self) -> Option<&str> {
        non_blank(&self.database_url)
    }

    pub fn auth_token(&self) -> Option<&str> {
        non_blank(&self.mcp_auth_token)
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_prefers_username_and_secret() {
        let cfg = Config {
            dataforseo_username: Some("user@example.com".into()),
            dataforseo_api_secret: Some("s3cret".into()),
            dataforseo_api_key: Some("ignored".into()),
            ..Config::default()
        };
        let expected = base64::engine::general_purpose::STANDARD.encode("user@example.com:s3cret");
        assert_eq!(cfg.dataforseo_basic_auth(), Some(expected));
    }

    #[test]
    fn basic_auth_accepts_login_password_pair() {
        let cfg = Config {
            dataforseo_login: Some("login".into()),
            dataforseo_password: Some("pw".into()),
            ..Config::default()
        };
        assert_eq!(cfg.dataforseo_basic_auth().as_deref(), Some("bG9naW46cHc="));
    }

    #[test]
    fn lone_api_key_is_used_verbatim() {
        let cfg = Config {
            dataforseo_api_key: Some("dXNlcjpwYXNz".into()),
            ..Config::default()
        };
        assert_eq!(cfg.dataforseo_basic_auth().as_deref(), Some("dXNlcjpwYXNz"));
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let cfg = Config {
            dataforseo_api_key: Some("   ".into()),
            ..Config::default()
        };
        assert_eq!(cfg.dataforseo_basic_auth(), None);
        assert!(cfg.s3_credentials().is_none());
    }

    #[test]
    fn unparsable_env_value_is_an_error() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DATAFORSEO_API_KEY", "dXNlcjpwYXNz");
            jail.set_env("DATABASE_URL", "postgres://localhost/keywords");
            jail.set_env("DATABASE_MAX_CONNECTIONS", "ten");
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"), "{err}");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PORT", "9123");
            jail.set_env("AWS_REGION", "eu-west-1");
            jail.set_env("DATABASE_URL", "postgres://localhost/keywords");
            let cfg = Config::from_env()?;
            assert_eq!(cfg.port, 9123);
            assert_eq!(cfg.aws_region, "eu-west-1");
            assert_eq!(cfg.database_url(), Some("postgres://localhost/keywords"));
            assert_eq!(cfg.s3_bucket(), Some("arb-imgs"));
            Ok(())
        });
    }
}
