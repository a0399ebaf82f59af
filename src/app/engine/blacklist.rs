use std::fmt;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use url::Url;

use super::resolve::encode_query_value;
use super::{FileToken, Host, StreamUrl};
use crate::http::{Probe, ProbeFailure, ProbeResult, is_success};

/// Request encoding that the server accepted for a blacklist call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlacklistForm {
    JsonPost,
    FormPost,
    QueryGet,
}

impl fmt::Display for BlacklistForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::JsonPost => "JSON POST",
            Self::FormPost => "form POST",
            Self::QueryGet => "GET",
        })
    }
}

fn status_outcome(status: ProbeResult<u16>) -> ProbeResult<()> {
    match status {
        Ok(status) if is_success(status) => Ok(()),
        Ok(status) => Err(ProbeFailure::ServerRejected(status)),
        Err(err) => Err(err),
    }
}

/// Asks `base` to exclude `token` from future `/api/next` answers, falling
/// back through the request encodings servers are known to accept.
pub(crate) fn blacklist_file(
    probe: &dyn Probe,
    base: &Host,
    token: &FileToken,
    timeout: Duration,
) -> ProbeResult<BlacklistForm> {
    let endpoint = format!("{}/api/deleteVideo", base.base_url());
    let encoded = encode_query_value(token.as_str());
    let json_body = serde_json::json!({ "file": token.as_str() }).to_string();

    let attempts = [
        BlacklistForm::JsonPost,
        BlacklistForm::FormPost,
        BlacklistForm::QueryGet,
    ];
    let mut last_failure = ProbeFailure::NoCandidateFound;
    for form in attempts {
        let outcome = match form {
            BlacklistForm::JsonPost => {
                status_outcome(probe.post(&endpoint, "application/json", &json_body, timeout))
            }
            BlacklistForm::FormPost => status_outcome(probe.post(
                &endpoint,
                "application/x-www-form-urlencoded",
                &format!("file={encoded}"),
                timeout,
            )),
            BlacklistForm::QueryGet => status_outcome(
                probe
                    .get(&format!("{endpoint}?file={encoded}"), timeout)
                    .map(|(status, _)| status),
            ),
        };
        match outcome {
            Ok(()) => return Ok(form),
            Err(err) => {
                tracing::debug!(%base, %form, error = %err, "blacklist attempt failed");
                last_failure = err;
            }
        }
    }
    Err(last_failure)
}

/// Recovers the server's file token from a resolved stream URL: the `file`
/// query parameter when present, else the last path segment.
pub(crate) fn extract_file_token(stream: &StreamUrl) -> Option<FileToken> {
    let parsed = Url::parse(stream.as_str()).ok()?;
    if let Some((_, file)) = parsed.query_pairs().find(|(key, _)| key == "file") {
        return (!file.is_empty()).then(|| FileToken::new(file.into_owned()));
    }
    let segment = parsed.path_segments()?.rev().find(|segment| !segment.is_empty())?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    Some(FileToken::new(decoded.into_owned()))
}

/// Scheme and authority of a stream URL, used when no host is remembered.
pub(crate) fn host_of(stream: &StreamUrl) -> Option<Host> {
    let parsed = Url::parse(stream.as_str()).ok()?;
    let host = parsed.host_str()?;
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Some(Host::new(format!("{}://{authority}", parsed.scheme())))
}
