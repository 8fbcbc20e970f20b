use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use gallery_api::host::CloudinaryConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// Deployed client origin, allowed by CORS in production.
    pub frontend_url: Option<String>,
    pub production: bool,
    pub host: String,
    pub port: u16,
    pub web_dir: PathBuf,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{} must be set", key));

        let jwt_secret = require("GALLERY_JWT_SECRET")?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("GALLERY_JWT_SECRET is still a placeholder; set a random secret");
        }

        let port: u16 = match get("GALLERY_PORT") {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid GALLERY_PORT {:?}", p))?,
            None => 5000,
        };

        let production = get("GALLERY_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            db_path: get("GALLERY_DB_PATH").unwrap_or_else(|| "gallery.db".into()).into(),
            jwt_secret,
            frontend_url: get("GALLERY_FRONTEND_URL"),
            production,
            host: get("GALLERY_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            web_dir: get("GALLERY_WEB_DIR").unwrap_or_else(|| "./web".into()).into(),
            cloudinary: CloudinaryConfig {
                cloud_name: require("CLOUDINARY_CLOUD_NAME")?,
                api_key: require("CLOUDINARY_API_KEY")?,
                api_secret: require("CLOUDINARY_API_SECRET")?,
                folder: get("CLOUDINARY_FOLDER").unwrap_or_else(|| "creative-showcase".into()),
                api_base: get("CLOUDINARY_API_BASE")
                    .unwrap_or_else(|| "https://api.cloudinary.com/v1_1".into()),
            },
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}
