use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};

use super::EngineEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlayerEvent {
    Ended,
    Error(String),
}

/// The media player the engine drives. Every call happens on the foreground
/// thread; implementations report completion and errors as [`PlayerEvent`]s.
pub(crate) trait MediaPlayer {
    fn set_source(&mut self, url: &str) -> Result<()>;
    fn prepare(&mut self) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn seek_to(&mut self, position_ms: u64) -> Result<()>;
    fn current_position(&self) -> u64;
    fn set_playback_speed(&mut self, speed: f64) -> Result<()>;
    fn playback_speed(&self) -> f64;
}

pub(crate) fn resolve_player_bin(configured: &str) -> PathBuf {
    resolve_player_bin_from_env(env::var_os("LANREEL_PLAYER_BIN"), configured)
}

pub(crate) fn resolve_player_bin_from_env(
    env_value: Option<OsString>,
    configured: &str,
) -> PathBuf {
    match env_value {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ if !configured.trim().is_empty() => PathBuf::from(configured.trim()),
        _ => PathBuf::from("mpv"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum IpcUpdate {
    Position(u64),
    Event(PlayerEvent),
}

pub(crate) fn parse_ipc_line(line: &str) -> Option<IpcUpdate> {
    let msg: Value = serde_json::from_str(line.trim()).ok()?;
    match msg.get("event")?.as_str()? {
        "property-change" if msg.get("name")?.as_str()? == "time-pos" => {
            let seconds = msg.get("data")?.as_f64()?;
            Some(IpcUpdate::Position((seconds.max(0.0) * 1000.0).round() as u64))
        }
        "end-file" => match msg.get("reason")?.as_str()? {
            "eof" => Some(IpcUpdate::Event(PlayerEvent::Ended)),
            "error" => {
                let detail = msg
                    .get("file_error")
                    .and_then(Value::as_str)
                    .unwrap_or("playback error");
                Some(IpcUpdate::Event(PlayerEvent::Error(detail.to_string())))
            }
            _ => None,
        },
        _ => None,
    }
}

type IpcWriter = Box<dyn Write + Send>;
type IpcReader = Box<dyn Read + Send>;

#[cfg(unix)]
fn connect_ipc(socket_path: &std::path::Path) -> Result<(IpcWriter, IpcReader)> {
    use std::os::unix::net::UnixStream;

    let mut last_err = None;
    for _ in 0..50 {
        match UnixStream::connect(socket_path) {
            Ok(stream) => {
                let reader = stream
                    .try_clone()
                    .context("failed to clone mpv IPC socket")?;
                return Ok((Box::new(stream), Box::new(reader)));
            }
            Err(err) => {
                last_err = Some(err);
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
    Err(anyhow!(
        "mpv IPC socket {} never became available: {}",
        socket_path.display(),
        last_err.map(|err| err.to_string()).unwrap_or_default()
    ))
}

#[cfg(not(unix))]
fn connect_ipc(_socket_path: &std::path::Path) -> Result<(IpcWriter, IpcReader)> {
    Err(anyhow!("mpv JSON IPC needs unix domain sockets on this platform"))
}

/// External mpv process controlled over its JSON IPC socket.
pub(crate) struct MpvPlayer {
    bin: PathBuf,
    socket_path: PathBuf,
    events: Sender<EngineEvent>,
    process: Option<Child>,
    connection: Option<IpcWriter>,
    source: Option<String>,
    speed: f64,
    position_ms: Arc<AtomicU64>,
}

impl MpvPlayer {
    pub(crate) fn new(bin: PathBuf, events: Sender<EngineEvent>) -> Self {
        Self {
            bin,
            socket_path: env::temp_dir().join(format!("lanreel-mpv-{}.sock", std::process::id())),
            events,
            process: None,
            connection: None,
            source: None,
            speed: 1.0,
            position_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn is_running(&mut self) -> bool {
        match self.process.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kills and reaps the current mpv process, if any.
    fn kill(&mut self) {
        self.connection = None;
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn spawn(&mut self) -> Result<()> {
        self.kill();
        let _ = fs::remove_file(&self.socket_path);
        let child = ProcessCommand::new(&self.bin)
            .arg("--idle=yes")
            .arg("--force-window=yes")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {}", self.bin.display()))?;
        self.process = Some(child);
        tracing::info!(bin = %self.bin.display(), "spawned player process");

        let (writer, reader) = match connect_ipc(&self.socket_path) {
            Ok(ends) => ends,
            Err(err) => {
                self.kill();
                return Err(err);
            }
        };
        self.connection = Some(writer);
        self.spawn_reader(reader);
        self.send(json!(["observe_property", 1, "time-pos"]))?;
        Ok(())
    }

    fn spawn_reader(&self, reader: IpcReader) {
        let events = self.events.clone();
        let position_ms = Arc::clone(&self.position_ms);
        thread::spawn(move || {
            for line in BufReader::new(reader).lines() {
                let Ok(line) = line else {
                    break;
                };
                match parse_ipc_line(&line) {
                    Some(IpcUpdate::Position(ms)) => position_ms.store(ms, Ordering::Relaxed),
                    Some(IpcUpdate::Event(event)) => {
                        if events.send(EngineEvent::Player(event)).is_err() {
                            break;
                        }
                    }
                    None => {}
                }
            }
            tracing::debug!("player IPC reader finished");
        });
    }

    fn send(&mut self, command: Value) -> Result<()> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| anyhow!("player is not running"))?;
        let line = json!({ "command": command });
        writeln!(connection, "{line}").context("failed to write mpv IPC command")?;
        connection.flush().context("failed to flush mpv IPC command")
    }
}

impl MediaPlayer for MpvPlayer {
    fn set_source(&mut self, url: &str) -> Result<()> {
        self.source = Some(url.to_string());
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        if self.is_running() && self.connection.is_some() {
            return Ok(());
        }
        self.spawn()
    }

    fn play(&mut self) -> Result<()> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| anyhow!("no source set"))?;
        self.position_ms.store(0, Ordering::Relaxed);
        self.send(json!(["loadfile", source, "replace"]))?;
        self.send(json!(["set_property", "pause", false]))
    }

    fn stop(&mut self) -> Result<()> {
        if self.connection.is_none() {
            return Ok(());
        }
        self.send(json!(["stop"]))
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        let seconds = position_ms as f64 / 1000.0;
        self.send(json!(["seek", seconds, "absolute"]))?;
        self.position_ms.store(position_ms, Ordering::Relaxed);
        Ok(())
    }

    fn current_position(&self) -> u64 {
        self.position_ms.load(Ordering::Relaxed)
    }

    fn set_playback_speed(&mut self, speed: f64) -> Result<()> {
        self.speed = speed;
        if self.connection.is_none() {
            return Ok(());
        }
        self.send(json!(["set_property", "speed", speed]))
    }

    fn playback_speed(&self) -> f64 {
        self.speed
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if self.connection.is_some() {
            let _ = self.send(json!(["quit"]));
        }
        self.kill();
        let _ = fs::remove_file(&self.socket_path);
    }
}
