mod blacklist;
mod discover;
#[cfg(test)]
pub(crate) mod fakes;
mod history;
mod log;
mod orchestrator;
mod player;
mod resolve;

use std::fmt;
use std::time::Duration;

pub(crate) use blacklist::*;
pub(crate) use discover::*;
pub(crate) use history::*;
pub(crate) use log::*;
pub(crate) use orchestrator::*;
pub(crate) use player::*;
#[cfg(test)]
pub(crate) use resolve::*;

/// A candidate server, `host:port` or a full `http://host:port` base.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Host(String);

impl Host {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn base_url(&self) -> String {
        let trimmed = self.0.trim().trim_end_matches('/');
        if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct FileToken(String);

impl FileToken {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute URL that answered a reachability probe when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct StreamUrl(String);

impl StreamUrl {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timeouts {
    /// `/api/next` and HEAD resolution probes.
    pub(crate) probe: Duration,
    /// `/api/deleteVideo` attempts.
    pub(crate) blacklist: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_millis(2000),
            blacklist: Duration::from_millis(3000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_base_url_adds_scheme_and_strips_trailing_slash() {
        assert_eq!(Host::new("media.local:3000").base_url(), "http://media.local:3000");
        assert_eq!(
            Host::new("http://10.0.0.2:3000/").base_url(),
            "http://10.0.0.2:3000"
        );
        assert_eq!(
            Host::new(" https://example.test ").base_url(),
            "https://example.test"
        );
    }
}
