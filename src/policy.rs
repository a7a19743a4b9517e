//! Allow/deny decision for requests made by a page while it is captured.

use url::Url;

/// Backend API host that must never see requests from preview renders
pub const DEFAULT_BLOCKED_HOST: &str = "api.zitefy.com";

/// Per-request allow/deny predicate, independent of the render itself.
///
/// A request is denied when its URL host equals one of the blocked hosts
/// (ASCII case-insensitive). URLs without a host, or that do not parse, are
/// allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicy {
    blocked_hosts: Vec<String>,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self::blocking([DEFAULT_BLOCKED_HOST])
    }
}

impl RequestPolicy {
    pub fn allow_all() -> Self {
        Self {
            blocked_hosts: Vec::new(),
        }
    }

    pub fn blocking<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked_hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn block(&mut self, host: impl Into<String>) {
        self.blocked_hosts.push(host.into());
    }

    pub fn blocked_hosts(&self) -> &[String] {
        &self.blocked_hosts
    }

    pub fn allows(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return true,
        };
        match parsed.host_str() {
            Some(host) => !self
                .blocked_hosts
                .iter()
                .any(|blocked| blocked.eq_ignore_ascii_case(host)),
            None => true,
        }
    }
}
