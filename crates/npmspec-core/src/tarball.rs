//! Download locations of every package in a resolved tree.

use npmspec_util::errors::NpmspecError;
use url::Url;

/// Distinct tarball URLs in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TarballSet {
    urls: Vec<String>,
}

/// A tarball URL split the way an OSC `download_url` service wants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadUrl {
    pub protocol: String,
    /// Host, with `:port` when the URL carries an explicit one.
    pub host: String,
    pub path: String,
}

impl DownloadUrl {
    pub fn parse(raw: &str) -> Result<Self, NpmspecError> {
        let url = Url::parse(raw).map_err(|e| NpmspecError::Generic {
            message: format!("Invalid tarball URL `{raw}`: {e}"),
        })?;
        let host = url.host_str().ok_or_else(|| NpmspecError::Generic {
            message: format!("Tarball URL `{raw}` has no host"),
        })?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self {
            protocol: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
        })
    }

    /// File name the service will download to.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl TarballSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a URL. Returns `false` if it was already present.
    pub fn insert(&mut self, url: &str) -> bool {
        if url.is_empty() || self.urls.iter().any(|u| u == url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// RPM `SourceN:` tags, numbered from 0, one per line.
    pub fn source_lines(&self) -> String {
        self.urls
            .iter()
            .enumerate()
            .map(|(i, url)| format!("Source{i}:\t{url}\n"))
            .collect()
    }

    pub fn download_urls(&self) -> Result<Vec<DownloadUrl>, NpmspecError> {
        self.urls.iter().map(|u| DownloadUrl::parse(u)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_registry_url() {
        let d = DownloadUrl::parse("https://registry.npmjs.org/punycode/-/punycode-2.1.1.tgz").unwrap();
        assert_eq!(d.protocol, "https");
        assert_eq!(d.host, "registry.npmjs.org");
        assert_eq!(d.path, "/punycode/-/punycode-2.1.1.tgz");
        assert_eq!(d.basename(), "punycode-2.1.1.tgz");
    }

    #[test]
    fn explicit_port_kept_in_host() {
        let d = DownloadUrl::parse("http://localhost:4873/a/-/a-1.0.0.tgz").unwrap();
        assert_eq!(d.host, "localhost:4873");
    }

    #[test]
    fn rejects_relative_url() {
        assert!(DownloadUrl::parse("a/-/a-1.0.0.tgz").is_err());
    }
}
