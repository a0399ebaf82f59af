use std::time::Duration;

use thiserror::Error;

/// Failure taxonomy shared by every network-facing engine operation.
///
/// DNS failures, refused connections and timeouts all collapse into
/// `NetworkUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ProbeFailure {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("server rejected request with HTTP {0}")]
    ServerRejected(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no candidate found")]
    NoCandidateFound,
    #[error("playback failure: {0}")]
    PlaybackFailure(String),
}

pub(crate) type ProbeResult<T> = Result<T, ProbeFailure>;

/// Short-timeout HTTP calls used by discovery, resolution and blacklisting.
///
/// Any HTTP status is a successful probe; interpreting it is up to the caller.
pub(crate) trait Probe: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> ProbeResult<(u16, String)>;
    fn head(&self, url: &str, timeout: Duration) -> ProbeResult<u16>;
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &str,
        timeout: Duration,
    ) -> ProbeResult<u16>;
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

pub(crate) fn is_reachable(status: u16) -> bool {
    (200..400).contains(&status)
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct HttpProbe;

impl HttpProbe {
    fn agent(timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .timeout(timeout)
            .redirects(0)
            .build()
    }
}

fn status_of(result: Result<ureq::Response, ureq::Error>) -> ProbeResult<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(_, response)) => Ok(response),
        Err(ureq::Error::Transport(err)) => {
            Err(ProbeFailure::NetworkUnavailable(format!("transport error: {err}")))
        }
    }
}

impl Probe for HttpProbe {
    fn get(&self, url: &str, timeout: Duration) -> ProbeResult<(u16, String)> {
        let response = status_of(Self::agent(timeout).get(url).call())?;
        let status = response.status();
        let body = response.into_string().map_err(|err| {
            ProbeFailure::MalformedResponse(format!("response decode failed: {err}"))
        })?;
        Ok((status, body))
    }

    fn head(&self, url: &str, timeout: Duration) -> ProbeResult<u16> {
        let response = status_of(Self::agent(timeout).head(url).call())?;
        Ok(response.status())
    }

    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &str,
        timeout: Duration,
    ) -> ProbeResult<u16> {
        let request = Self::agent(timeout)
            .post(url)
            .set("Content-Type", content_type);
        let response = status_of(request.send_string(body))?;
        Ok(response.status())
    }
}
