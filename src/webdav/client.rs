use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use url::Url;

use super::multistatus;
use crate::config::WebDavConfig;
use crate::error::{ConfigError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype/>
    <d:getcontentlength/>
    <d:getlastmodified/>
  </d:prop>
</d:propfind>"#;

/// PROPFIND `Depth` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Zero,
    One,
}

impl Depth {
    fn as_str(&self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
        }
    }
}

/// A file or collection reported by PROPFIND.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntry {
    /// Last path segment, percent-decoded.
    pub name: String,
    /// Path relative to the server URL, percent-decoded, starting with `/`.
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<DateTime<FixedOffset>>,
}

/// Minimal WebDAV client: PROPFIND, MKCOL, PUT and GET with Basic auth.
pub struct WebDavClient {
    http: Client,
    server: Url,
    authorization: String,
}

impl WebDavClient {
    pub fn new(config: &WebDavConfig) -> Result<Self> {
        if !config.is_complete() {
            return Err(ConfigError::validation(
                "WebDAV config is incomplete: server, username and password are required",
            ));
        }

        let mut server = Url::parse(&config.server).map_err(|e| {
            ConfigError::validation(format!("Invalid WebDAV server URL '{}': {}", config.server, e))
        })?;
        if server.cannot_be_a_base() {
            return Err(ConfigError::validation(format!(
                "Invalid WebDAV server URL '{}'",
                config.server
            )));
        }
        let base_path = server.path().trim_end_matches('/').to_string();
        server.set_path(&base_path);

        let credentials = format!("{}:{}", config.username, config.password.expose());
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::remote(format!("Failed to build HTTP client: {}", e), None))?;

        Ok(Self {
            http,
            server,
            authorization: format!("Basic {}", STANDARD.encode(credentials)),
        })
    }

    /// List `dir`. With [`Depth::One`] the directory itself is left out.
    pub async fn list(&self, dir: &str, depth: Depth) -> Result<Vec<RemoteEntry>> {
        let response = self.propfind(dir, depth).await?;
        let status = response.status();
        if status != StatusCode::MULTI_STATUS && status != StatusCode::OK {
            return Err(unexpected("PROPFIND", dir, response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ConfigError::remote(format!("Failed to read PROPFIND body: {}", e), None))?;

        let own_path = normalize_dir(dir);
        let entries = multistatus::parse(&body)?
            .into_iter()
            .map(|entry| self.to_remote_entry(entry))
            .filter(|entry| depth == Depth::Zero || normalize_dir(&entry.path) != own_path)
            .collect::<Vec<_>>();

        tracing::debug!(dir = %dir, entries = entries.len(), "Listed WebDAV directory");
        Ok(entries)
    }

    /// Create `dir` and any missing parents.
    pub async fn ensure_dir(&self, dir: &str) -> Result<()> {
        let response = self.propfind(dir, Depth::Zero).await?;
        match response.status() {
            StatusCode::MULTI_STATUS | StatusCode::OK => return Ok(()),
            StatusCode::NOT_FOUND => {}
            _ => return Err(unexpected("PROPFIND", dir, response).await),
        }

        let mut current = String::new();
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);

            let response = self.request(dav_method(b"MKCOL")?, &current).send().await;
            let response = response.map_err(|e| transport("MKCOL", &current, e))?;
            match response.status() {
                // 405: the collection already exists.
                StatusCode::CREATED | StatusCode::OK | StatusCode::METHOD_NOT_ALLOWED => {}
                _ => return Err(unexpected("MKCOL", &current, response).await),
            }
        }

        tracing::info!(dir = %dir, "Created WebDAV directory");
        Ok(())
    }

    /// Upload `bytes`, replacing any existing file.
    pub async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len();
        let response = self
            .request(Method::PUT, path)
            .header(CONTENT_TYPE, "application/json")
            .body(bytes)
            .send()
            .await
            .map_err(|e| transport("PUT", path, e))?;

        if !response.status().is_success() {
            return Err(unexpected("PUT", path, response).await);
        }
        tracing::debug!(path = %path, bytes = size, "Uploaded WebDAV file");
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| transport("GET", path, e))?;

        if !response.status().is_success() {
            return Err(unexpected("GET", path, response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport("GET", path, e))?;
        Ok(bytes.to_vec())
    }

    /// Check that the server root can be listed with these credentials.
    pub async fn test(&self) -> Result<()> {
        self.list("/", Depth::Zero).await.map(|_| ())
    }

    /// Absolute URL of `path` on this server.
    pub fn url_for(&self, path: &str) -> String {
        let encoded = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.server.as_str().trim_end_matches('/'), encoded)
    }

    async fn propfind(&self, dir: &str, depth: Depth) -> Result<Response> {
        self.request(dav_method(b"PROPFIND")?, dir)
            .header("Depth", depth.as_str())
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY)
            .send()
            .await
            .map_err(|e| transport("PROPFIND", dir, e))
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut url = self.url_for(path);
        if path.ends_with('/') && !url.ends_with('/') {
            url.push('/');
        }
        self.http
            .request(method, url)
            .header(AUTHORIZATION, &self.authorization)
    }

    fn to_remote_entry(&self, entry: multistatus::PropEntry) -> RemoteEntry {
        let href_path = match Url::parse(&entry.href) {
            Ok(url) => url.path().to_string(),
            Err(_) => entry.href.clone(),
        };
        let decoded = urlencoding::decode(&href_path)
            .map(|s| s.into_owned())
            .unwrap_or(href_path);

        // Make the path relative to the server URL's own path.
        let base = urlencoding::decode(self.server.path())
            .map(|s| s.into_owned())
            .unwrap_or_default();
        let base = base.trim_end_matches('/');
        let relative = decoded.strip_prefix(base).unwrap_or(&decoded);
        let path = if relative.starts_with('/') {
            relative.to_string()
        } else {
            format!("/{}", relative)
        };

        let name = path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        RemoteEntry {
            name,
            path,
            is_dir: entry.is_collection,
            size: entry.content_length.unwrap_or(0),
            modified: entry
                .last_modified
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc2822(s).ok()),
        }
    }
}

fn dav_method(name: &'static [u8]) -> Result<Method> {
    Method::from_bytes(name).map_err(|e| ConfigError::remote(e.to_string(), None))
}

fn normalize_dir(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

fn transport(verb: &str, path: &str, error: reqwest::Error) -> ConfigError {
    ConfigError::remote(format!("{} {} failed: {}", verb, path, error), None)
}

async fn unexpected(verb: &str, path: &str, response: Response) -> ConfigError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(verb, path, status = %status, "Unexpected WebDAV response");

    let mut message = format!("{} {} returned {}", verb, path, status);
    let body = body.trim();
    if !body.is_empty() && body.len() < 200 {
        message.push_str(": ");
        message.push_str(body);
    }
    ConfigError::remote(message, Some(status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecureString;

    fn config(server: &str) -> WebDavConfig {
        WebDavConfig {
            server: server.to_string(),
            username: "u".into(),
            password: SecureString::new("p"),
            ..Default::default()
        }
    }

    #[test]
    fn incomplete_config_is_rejected() {
        let mut incomplete = config("https://dav.test");
        incomplete.password = SecureString::default();
        let err = WebDavClient::new(&incomplete).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::ValidationError);
    }

    #[test]
    fn urls_are_joined_and_encoded() {
        let client = WebDavClient::new(&config("https://dav.test/remote.php/dav/")).unwrap();
        assert_eq!(
            client.url_for("/ccr-backups/a b.json"),
            "https://dav.test/remote.php/dav/ccr-backups/a%20b.json"
        );
        assert_eq!(client.authorization, "Basic dTpw");
    }

    #[test]
    fn entries_are_relative_to_server_path() {
        let client = WebDavClient::new(&config("https://dav.test/dav")).unwrap();
        let entry = client.to_remote_entry(multistatus::PropEntry {
            href: "https://dav.test/dav/ccr-backups/a%20b.json".into(),
            is_collection: false,
            content_length: Some(7),
            last_modified: Some("Tue, 02 Jan 2024 10:00:00 GMT".into()),
        });

        assert_eq!(entry.name, "a b.json");
        assert_eq!(entry.path, "/ccr-backups/a b.json");
        assert_eq!(entry.size, 7);
        assert!(entry.modified.is_some());
    }
}
