//! The origin the diary is served from.
//!
//! Two platform decisions hang off the origin: whether cryptography may run
//! at all (secure context) and which relying-party identifier a platform
//! authenticator binds credentials to.

use std::fmt;
use std::net::IpAddr;

use crate::error::{DiaryError, Result};

/// Scheme and hostname of the app's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
}

impl Origin {
    /// Parse `scheme://host[:port][/path]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the scheme or host is missing.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let (scheme, rest) = value.split_once("://").ok_or_else(|| {
            DiaryError::InvalidInput(format!("Origin must look like https://host, got {value:?}"))
        })?;
        if scheme.is_empty() {
            return Err(DiaryError::InvalidInput("Origin scheme is empty".to_string()));
        }

        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let authority = authority.rsplit('@').next().unwrap_or_default();
        let host = if let Some(bracketed) = authority.strip_prefix('[') {
            // IPv6 literal: [::1]:8080
            bracketed.split(']').next().unwrap_or_default()
        } else {
            authority.split(':').next().unwrap_or_default()
        };
        if host.is_empty() {
            return Err(DiaryError::InvalidInput(format!(
                "Origin has no host: {value:?}"
            )));
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
        })
    }

    /// `http://localhost`, the default for a locally run diary.
    pub fn localhost() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// HTTPS, or a loopback host (where platforms expose crypto over plain HTTP).
    pub fn is_secure_context(&self) -> bool {
        self.scheme == "https" || matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }

    /// `localhost` or any IP literal.
    pub fn is_ip_or_loopback(&self) -> bool {
        self.host == "localhost" || self.host.parse::<IpAddr>().is_ok()
    }

    /// Relying-party identifier for platform credentials.
    ///
    /// `None` for loopback and IP hosts, which authenticators reject as RP ids.
    pub fn relying_party_id(&self) -> Option<&str> {
        if self.is_ip_or_loopback() {
            None
        } else {
            Some(&self.host)
        }
    }

    /// Whether a platform authenticator may be offered for this origin.
    pub fn allows_platform_authenticator(&self) -> bool {
        self.is_secure_context() && !self.is_ip_or_loopback()
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self::localhost()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]", self.scheme, self.host)
        } else {
            write!(f, "{}://{}", self.scheme, self.host)
        }
    }
}
