//! Backend target abstraction.
//!
//! # Responsibilities
//! - Represent a single static backend base URL (scheme, authority, path)
//! - Validate targets once at startup
//! - Rewrite a request URI onto the target

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::Uri;
use std::fmt;
use url::Url;

/// Errors produced while parsing a backend target URL.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TargetError {
    #[error("invalid target URL {target:?}: {source}")]
    InvalidUrl {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("target URL {0:?} has no host")]
    MissingHost(String),

    #[error("target URL {0:?} does not form a valid request URI")]
    InvalidUri(String),
}

/// A single backend server the reverse proxy can send traffic to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    scheme: Scheme,
    authority: Authority,
    path: String,
}

impl BackendTarget {
    /// Parse a base URL such as `http://localhost:9091` or `https://api:8443/v1`.
    pub fn parse(target: &str) -> Result<Self, TargetError> {
        let url = Url::parse(target).map_err(|source| TargetError::InvalidUrl {
            target: target.to_string(),
            source,
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TargetError::MissingHost(target.to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::try_from(authority.as_str())
            .map_err(|_| TargetError::InvalidUri(target.to_string()))?;

        // Url always yields at least "/" for http(s).
        let path = url.path().to_string();
        PathAndQuery::try_from(path.as_str())
            .map_err(|_| TargetError::InvalidUri(target.to_string()))?;

        Ok(Self {
            scheme,
            authority,
            path,
        })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Point `uri` at this target: scheme, authority and path are replaced,
    /// the query string is kept.
    pub fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = match uri.query() {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
    }
}

impl std::str::FromStr for BackendTarget {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
