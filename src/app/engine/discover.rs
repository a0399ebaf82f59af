use serde_json::Value;

use super::resolve::resolve_stream;
use super::{FileToken, Host, StreamUrl, Timeouts};
use crate::http::{Probe, ProbeFailure, ProbeResult, is_success};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Discovery {
    pub(crate) host: Host,
    pub(crate) stream: StreamUrl,
}

pub(crate) fn parse_next_file(raw: &str) -> ProbeResult<FileToken> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|err| ProbeFailure::MalformedResponse(format!("next body is not JSON: {err}")))?;
    let file = parsed
        .get("file")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if file.is_empty() {
        return Err(ProbeFailure::MalformedResponse(
            "next body has no file".to_string(),
        ));
    }
    Ok(FileToken::new(file))
}

/// One discovery step: ask `host` for its next file and resolve it.
pub(crate) fn ask_host(
    probe: &dyn Probe,
    host: &Host,
    timeouts: Timeouts,
) -> ProbeResult<StreamUrl> {
    let base = host.base_url();
    let (status, body) = probe.get(&format!("{base}/api/next"), timeouts.probe)?;
    if !is_success(status) {
        return Err(ProbeFailure::ServerRejected(status));
    }
    let token = parse_next_file(&body)?;
    tracing::debug!(%host, %token, "server offered next file");
    resolve_stream(probe, &base, &token, timeouts.probe)
}

/// Tries `hosts` strictly in order; the first host that yields a playable
/// stream wins and later hosts are never contacted.
///
/// Sequential by nature: with every host black-holed this takes up to
/// `timeouts.probe * hosts.len() * 4` (one next call plus three HEAD probes).
pub(crate) fn find_working_host(
    probe: &dyn Probe,
    hosts: &[Host],
    timeouts: Timeouts,
) -> ProbeResult<Discovery> {
    for host in hosts {
        match ask_host(probe, host, timeouts) {
            Ok(stream) => {
                return Ok(Discovery {
                    host: host.clone(),
                    stream,
                });
            }
            Err(err) => tracing::info!(%host, error = %err, "host did not yield a stream"),
        }
    }
    Err(ProbeFailure::NoCandidateFound)
}
