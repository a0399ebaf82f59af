use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::form_urlencoded;

use super::{FileToken, StreamUrl};
use crate::http::{Probe, ProbeFailure, ProbeResult, is_reachable};

/// Characters escaped inside a single path segment; `/` included so a token
/// never spans segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'|');

pub(crate) fn encode_path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

pub(crate) fn encode_query_value(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

pub(crate) fn candidate_urls(base: &str, token: &FileToken) -> [String; 3] {
    let segment = encode_path_segment(token.as_str());
    let query = encode_query_value(token.as_str());
    [
        format!("{base}/video/{segment}"),
        format!("{base}/{segment}"),
        format!("{base}/video?file={query}"),
    ]
}

/// HEAD-probes the three known URL shapes in order and returns the first
/// reachable one.
pub(crate) fn resolve_stream(
    probe: &dyn Probe,
    base: &str,
    token: &FileToken,
    timeout: Duration,
) -> ProbeResult<StreamUrl> {
    for candidate in candidate_urls(base, token) {
        match probe.head(&candidate, timeout) {
            Ok(status) if is_reachable(status) => return Ok(StreamUrl::new(candidate)),
            Ok(status) => {
                tracing::debug!(%candidate, status, "stream candidate rejected");
            }
            Err(err) => {
                tracing::debug!(%candidate, error = %err, "stream candidate unreachable");
            }
        }
    }
    Err(ProbeFailure::NoCandidateFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_and_query_encoding_differ_on_spaces() {
        assert_eq!(encode_path_segment("my ep 01.mp4"), "my%20ep%2001.mp4");
        assert_eq!(encode_query_value("my ep 01.mp4"), "my+ep+01.mp4");
    }

    #[test]
    fn path_segment_encoding_escapes_separators() {
        assert_eq!(encode_path_segment("dir/a#b?.mp4"), "dir%2Fa%23b%3F.mp4");
        assert_eq!(encode_path_segment("ação.mkv"), "a%C3%A7%C3%A3o.mkv");
    }

    #[test]
    fn candidate_urls_follow_priority_order() {
        let urls = candidate_urls("http://media.local:3000", &FileToken::new("ep 1.mp4"));
        assert_eq!(
            urls,
            [
                "http://media.local:3000/video/ep%201.mp4".to_string(),
                "http://media.local:3000/ep%201.mp4".to_string(),
                "http://media.local:3000/video?file=ep+1.mp4".to_string(),
            ]
        );
    }
}
