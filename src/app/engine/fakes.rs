use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};

use super::MediaPlayer;
use crate::http::{Probe, ProbeFailure, ProbeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Method {
    Get,
    Head,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProbeCall {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) content_type: Option<String>,
    pub(crate) body: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16),
    Body(u16, String),
    Unreachable,
}

/// In-memory [`Probe`]: replies by exact method and URL, records every call,
/// and treats unrouted URLs as unreachable.
#[derive(Debug, Default)]
pub(crate) struct ScriptedProbe {
    routes: Mutex<HashMap<(Method, String), Reply>>,
    calls: Mutex<Vec<ProbeCall>>,
}

impl ScriptedProbe {
    pub(crate) fn route(&self, method: Method, url: &str, reply: Reply) {
        self.routes
            .lock()
            .expect("lock routes")
            .insert((method, url.to_string()), reply);
    }

    pub(crate) fn next_file(&self, base: &str, file: &str) {
        let body = serde_json::json!({ "file": file }).to_string();
        self.route(Method::Get, &format!("{base}/api/next"), Reply::Body(200, body));
    }

    pub(crate) fn calls(&self) -> Vec<ProbeCall> {
        self.calls.lock().expect("lock calls").clone()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.url).collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().expect("lock calls").clear();
    }

    fn reply(&self, call: ProbeCall) -> Option<Reply> {
        let key = (call.method, call.url.clone());
        self.calls.lock().expect("lock calls").push(call);
        self.routes.lock().expect("lock routes").get(&key).cloned()
    }
}

fn unreachable(url: &str) -> ProbeFailure {
    ProbeFailure::NetworkUnavailable(format!("no route for {url}"))
}

impl Probe for ScriptedProbe {
    fn get(&self, url: &str, _timeout: Duration) -> ProbeResult<(u16, String)> {
        let call = ProbeCall {
            method: Method::Get,
            url: url.to_string(),
            content_type: None,
            body: None,
        };
        match self.reply(call) {
            Some(Reply::Body(status, body)) => Ok((status, body)),
            Some(Reply::Status(status)) => Ok((status, String::new())),
            Some(Reply::Unreachable) | None => Err(unreachable(url)),
        }
    }

    fn head(&self, url: &str, _timeout: Duration) -> ProbeResult<u16> {
        let call = ProbeCall {
            method: Method::Head,
            url: url.to_string(),
            content_type: None,
            body: None,
        };
        match self.reply(call) {
            Some(Reply::Status(status) | Reply::Body(status, _)) => Ok(status),
            Some(Reply::Unreachable) | None => Err(unreachable(url)),
        }
    }

    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &str,
        _timeout: Duration,
    ) -> ProbeResult<u16> {
        let call = ProbeCall {
            method: Method::Post,
            url: url.to_string(),
            content_type: Some(content_type.to_string()),
            body: Some(body.to_string()),
        };
        match self.reply(call) {
            Some(Reply::Status(status) | Reply::Body(status, _)) => Ok(status),
            Some(Reply::Unreachable) | None => Err(unreachable(url)),
        }
    }
}

/// Handle a test keeps to inspect and steer a [`RecordingPlayer`].
#[derive(Debug, Clone, Default)]
pub(crate) struct PlayerProbe {
    pub(crate) commands: Arc<Mutex<Vec<String>>>,
    pub(crate) position_ms: Arc<AtomicU64>,
    pub(crate) fail_prepare: Arc<AtomicBool>,
}

impl PlayerProbe {
    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("lock commands").clone()
    }

    pub(crate) fn clear(&self) {
        self.commands.lock().expect("lock commands").clear();
    }

    pub(crate) fn set_position(&self, ms: u64) {
        self.position_ms.store(ms, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub(crate) struct RecordingPlayer {
    handle: PlayerProbe,
    speed: f64,
}

impl RecordingPlayer {
    pub(crate) fn new() -> (Self, PlayerProbe) {
        let handle = PlayerProbe::default();
        (
            Self {
                handle: handle.clone(),
                speed: 1.0,
            },
            handle,
        )
    }

    fn record(&self, command: String) {
        self.handle
            .commands
            .lock()
            .expect("lock commands")
            .push(command);
    }
}

impl MediaPlayer for RecordingPlayer {
    fn set_source(&mut self, url: &str) -> Result<()> {
        self.record(format!("source {url}"));
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        if self.handle.fail_prepare.load(Ordering::SeqCst) {
            return Err(anyhow!("player binary missing"));
        }
        self.record("prepare".to_string());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.handle.set_position(0);
        self.record("play".to_string());
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record("stop".to_string());
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        self.handle.set_position(position_ms);
        self.record(format!("seek {position_ms}"));
        Ok(())
    }

    fn current_position(&self) -> u64 {
        self.handle.position_ms.load(Ordering::SeqCst)
    }

    fn set_playback_speed(&mut self, speed: f64) -> Result<()> {
        self.speed = speed;
        self.record(format!("speed {speed}"));
        Ok(())
    }

    fn playback_speed(&self) -> f64 {
        self.speed
    }
}
