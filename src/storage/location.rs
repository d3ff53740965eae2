//! Storage locations (S3, R2, GCS, Azure, local filesystem)

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::storage::GlobPattern;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// A root location in object storage, parsed from a URL
#[derive(Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Scheme used for display (s3, r2, gs, az, file)
    scheme: String,
    /// Bucket, container or local root for display
    root: String,
}

impl fmt::Debug for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageLocation")
            .field("url", &self.url())
            .finish_non_exhaustive()
    }
}

impl StorageLocation {
    /// Open a location that must already exist (inputs)
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` or `s3a://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path/` - Local filesystem
    pub fn open(url: &str, credentials: Option<&Credentials>) -> Result<Self> {
        Self::parse(url, credentials, false)
    }

    /// Open a location, creating local directories if needed (outputs)
    pub fn create(url: &str, credentials: Option<&Credentials>) -> Result<Self> {
        Self::parse(url, credentials, true)
    }

    fn parse(url: &str, credentials: Option<&Credentials>, create: bool) -> Result<Self> {
        let scheme = url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
        match scheme.as_deref() {
            Some("s3" | "s3a" | "s3n") => Self::parse_s3(url, credentials, false),
            Some("r2") => Self::parse_s3(url, credentials, true),
            Some("gs" | "gcs") => Self::parse_gcs(url),
            Some("az" | "abfs" | "abfss") => Self::parse_azure(url),
            Some("file") => {
                let parsed = Url::parse(url)?;
                let path = parsed
                    .to_file_path()
                    .map_err(|()| Error::config(format!("Invalid file URL: {url}")))?;
                Self::parse_local(&path.to_string_lossy(), create)
            }
            Some(other) => Err(Error::config(format!(
                "Unsupported storage scheme '{other}' in {url}"
            ))),
            None => Self::parse_local(url, create),
        }
    }

    /// Split `scheme://bucket/some/prefix/` into bucket and prefix
    fn split_bucket(url: &str) -> Result<(String, String)> {
        let parsed = Url::parse(url)?;
        let bucket = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::config(format!("Missing bucket in URL: {url}")))?
            .to_string();
        let prefix = parsed.path().trim_matches('/').to_string();
        Ok((bucket, prefix))
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, credentials: Option<&Credentials>, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = Self::split_bucket(url)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);

        if let Some(creds) = credentials {
            builder = builder
                .with_access_key_id(&creds.access_key_id)
                .with_secret_access_key(&creds.secret_access_key);
            if let Some(region) = &creds.region {
                builder = builder.with_region(region);
            }
            if let Some(endpoint) = &creds.endpoint {
                builder = builder.with_endpoint(endpoint);
            }
        }

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
            root: bucket,
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let (bucket, prefix) = Self::split_bucket(url)?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(&bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
            root: bucket,
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let (container, prefix) = Self::split_bucket(url)?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(&container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
            root: container,
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str, create: bool) -> Result<Self> {
        if create {
            std::fs::create_dir_all(path)
                .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;
        } else if !std::path::Path::new(path).is_dir() {
            return Err(Error::FileNotFound {
                path: path.to_string(),
            });
        }

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
            root: path.trim_end_matches('/').to_string(),
        })
    }

    /// Check if this is a cloud destination (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Display URL of the location root
    pub fn url(&self) -> String {
        self.display_path("")
    }

    /// Display URL of a path relative to this location
    pub fn display_path(&self, relative: &str) -> String {
        let key = self.key(relative);
        if self.is_cloud() {
            format!("{}://{}/{key}", self.scheme, self.root)
        } else {
            format!("{}/{key}", self.root)
        }
    }

    /// Full key (prefix + relative) without leading/trailing slashes
    fn key(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        match (self.prefix.is_empty(), relative.is_empty()) {
            (true, _) => relative.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{relative}", self.prefix),
        }
    }

    /// Object path for a relative key
    ///
    /// Keys are taken as already encoded: partition directories carry their
    /// own escaping and listed keys come back encoded, so nothing is
    /// percent-encoded a second time.
    fn object_path(&self, relative: &str) -> Result<ObjectPath> {
        ObjectPath::parse(self.key(relative))
            .map_err(|e| Error::storage(self.display_path(relative), e.to_string()))
    }

    /// Strip this location's prefix from a full object path
    fn relative_key<'a>(&self, path: &'a ObjectPath) -> &'a str {
        let full = path.as_ref();
        if self.prefix.is_empty() {
            full
        } else {
            full.strip_prefix(self.prefix.as_str())
                .map_or(full, |rest| rest.trim_start_matches('/'))
        }
    }

    /// List all objects under a relative directory, as relative keys
    pub async fn list(&self, relative_dir: &str) -> Result<Vec<String>> {
        let prefix = self.object_path(relative_dir)?;
        let prefix = (!prefix.as_ref().is_empty()).then_some(prefix);

        let metas: Vec<_> = self
            .store
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(|e| Error::storage(self.display_path(relative_dir), e.to_string()))?;

        let mut keys: Vec<String> = metas
            .iter()
            .map(|meta| self.relative_key(&meta.location).to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// List objects matching a glob, sorted lexicographically
    pub async fn list_glob(&self, pattern: &GlobPattern) -> Result<Vec<String>> {
        let keys = self.list(&pattern.literal_prefix()).await?;
        let matched: Vec<String> = keys.into_iter().filter(|k| pattern.matches(k)).collect();

        tracing::debug!(
            location = %self.url(),
            pattern = pattern.as_str(),
            matched = matched.len(),
            "Listed input objects"
        );
        Ok(matched)
    }

    /// Read an object fully into memory
    pub async fn read(&self, relative: &str) -> Result<Bytes> {
        let path = self.object_path(relative)?;
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| Error::storage(self.display_path(relative), e.to_string()))?;
        let data = result
            .bytes()
            .await
            .map_err(|e| Error::storage(self.display_path(relative), e.to_string()))?;
        Ok(data)
    }

    /// Write bytes to an object, replacing it if present
    pub async fn write(&self, relative: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(relative)?;

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::storage(self.display_path(relative), e.to_string()))?;

        Ok(self.display_path(relative))
    }

    /// Delete a single object
    pub async fn delete(&self, relative: &str) -> Result<()> {
        let path = self.object_path(relative)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::storage(self.display_path(relative), e.to_string())),
        }
    }

    /// Delete every object under a relative directory
    ///
    /// Returns the number of objects removed.
    pub async fn delete_prefix(&self, relative_dir: &str) -> Result<usize> {
        if relative_dir.trim_matches('/').is_empty() {
            return Err(Error::storage(
                self.url(),
                "refusing to delete the location root",
            ));
        }

        let keys = self.list(relative_dir).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(keys.len())
    }
}
