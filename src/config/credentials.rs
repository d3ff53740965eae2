//! Credentials file loader
//!
//! Reads the INI-style `dl.cfg` file. Only the `[AWS]` section is consulted.
//! Section and key names are case-insensitive.

use crate::error::{Error, Result};
use configparser::ini::Ini;
use std::fmt;
use std::fs;
use std::path::Path;

/// Section holding the object-store keys
pub const AWS_SECTION: &str = "AWS";

/// Object-store credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Optional region override
    pub region: Option<String>,
    /// Optional endpoint override (S3-compatible stores)
    pub endpoint: Option<String>,
}

impl Credentials {
    /// Create credentials from a key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: None,
            endpoint: None,
        }
    }

    /// Set the region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Load credentials from a file
pub fn load_credentials(path: impl AsRef<Path>) -> Result<Credentials> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read credentials file '{}': {e}",
                path.display()
            ))
        }
    })?;

    let credentials = parse_credentials(&content)?;
    tracing::debug!(
        path = %path.display(),
        region = ?credentials.region,
        "Loaded credentials"
    );
    Ok(credentials)
}

/// Parse credentials from INI content
pub fn parse_credentials(content: &str) -> Result<Credentials> {
    let mut ini = Ini::new();
    let sections = ini
        .read(content.to_string())
        .map_err(|e| Error::config(format!("Malformed credentials file: {e}")))?;
    if !sections.contains_key(&AWS_SECTION.to_ascii_lowercase()) {
        return Err(Error::config(format!("Missing [{AWS_SECTION}] section")));
    }

    let value = |key: &str| ini.get(AWS_SECTION, key).map(|v| unquote(&v).to_string());
    let required = |key: &str| -> Result<String> {
        match value(key) {
            Some(v) if !v.is_empty() => Ok(v),
            Some(_) => Err(Error::invalid_value(key, "value is empty")),
            None => Err(Error::missing_field(key)),
        }
    };
    let optional = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| value(key))
            .filter(|v| !v.is_empty())
    };

    Ok(Credentials {
        access_key_id: required("AWS_ACCESS_KEY_ID")?,
        secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
        region: optional(&["AWS_REGION", "AWS_DEFAULT_REGION"]),
        endpoint: optional(&["AWS_ENDPOINT", "AWS_ENDPOINT_URL"]),
    })
}

/// Strip one pair of matching surrounding quotes
fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
