use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::blacklist::{BlacklistForm, blacklist_file, extract_file_token, host_of};
use super::discover::{Discovery, ask_host, find_working_host};
use super::{
    FileToken, History, Host, LogBuffer, MediaPlayer, PlayerEvent, StreamUrl, Timeouts,
};
use crate::http::{Probe, ProbeFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaybackState {
    Idle,
    Probing,
    Playing,
    Ended,
    Failed,
}

impl PlaybackState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Probing => "PROBING",
            Self::Playing => "PLAYING",
            Self::Ended => "ENDED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProbeOutcome {
    pub(crate) result: Result<Discovery, ProbeFailure>,
    /// The remembered host was asked first and did not yield a stream.
    pub(crate) remembered_failed: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum EngineEvent {
    Discovered {
        generation: u64,
        outcome: ProbeOutcome,
    },
    Blacklisted {
        generation: u64,
        host: Host,
        token: FileToken,
        result: Result<BlacklistForm, ProbeFailure>,
    },
    Player(PlayerEvent),
}

#[derive(Debug, Clone)]
pub(crate) struct EngineSettings {
    pub(crate) hosts: Vec<Host>,
    pub(crate) timeouts: Timeouts,
    pub(crate) rewind_threshold_ms: u64,
    pub(crate) playback_speed: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            timeouts: Timeouts::default(),
            rewind_threshold_ms: 5000,
            playback_speed: 1.0,
        }
    }
}

/// Mutable state of one playback session.
#[derive(Debug, Default)]
pub(crate) struct PlaybackSession {
    pub(crate) current: Option<StreamUrl>,
    pub(crate) remembered: Option<Host>,
    pub(crate) history: History,
    pub(crate) log: LogBuffer,
}

/// Runs a probing pass: remembered host first, then full discovery.
pub(crate) fn probe_for_stream(
    probe: &dyn Probe,
    remembered: Option<&Host>,
    hosts: &[Host],
    timeouts: Timeouts,
) -> ProbeOutcome {
    let mut remembered_failed = false;
    if let Some(host) = remembered {
        match ask_host(probe, host, timeouts) {
            Ok(stream) => {
                return ProbeOutcome {
                    result: Ok(Discovery {
                        host: host.clone(),
                        stream,
                    }),
                    remembered_failed: false,
                };
            }
            Err(err) => {
                tracing::info!(%host, error = %err, "remembered host failed");
                remembered_failed = true;
            }
        }
    }
    ProbeOutcome {
        result: find_working_host(probe, hosts, timeouts),
        remembered_failed,
    }
}

/// Playback state machine. Owns the session; every method runs on the
/// foreground thread, and network work reports back through the event channel.
pub(crate) struct Orchestrator {
    probe: Arc<dyn Probe>,
    player: Box<dyn MediaPlayer>,
    settings: EngineSettings,
    session: PlaybackSession,
    state: PlaybackState,
    /// The player holds `session.current` and has not reported it finished.
    player_loaded: bool,
    generation: u64,
    events_tx: Sender<EngineEvent>,
    events_rx: Receiver<EngineEvent>,
}

impl Orchestrator {
    pub(crate) fn new(
        probe: Arc<dyn Probe>,
        player: Box<dyn MediaPlayer>,
        settings: EngineSettings,
        events: (Sender<EngineEvent>, Receiver<EngineEvent>),
    ) -> Self {
        let (events_tx, events_rx) = events;
        Self {
            probe,
            player,
            settings,
            session: PlaybackSession::default(),
            state: PlaybackState::Idle,
            player_loaded: false,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    pub(crate) fn channel() -> (Sender<EngineEvent>, Receiver<EngineEvent>) {
        mpsc::channel()
    }

    pub(crate) fn state(&self) -> PlaybackState {
        self.state
    }

    pub(crate) fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub(crate) fn position_ms(&self) -> u64 {
        self.player.current_position()
    }

    pub(crate) fn playback_speed(&self) -> f64 {
        self.player.playback_speed()
    }

    pub(crate) fn log(&mut self, line: impl Into<String>) {
        self.session.log.log(line);
    }

    pub(crate) fn start(&mut self) {
        self.log(format!(
            "starting with {} candidate host(s)",
            self.settings.hosts.len()
        ));
        self.load_next();
    }

    pub(crate) fn next(&mut self) {
        self.log("next requested");
        self.load_next();
    }

    pub(crate) fn load_next(&mut self) {
        self.generation += 1;
        self.state = PlaybackState::Probing;

        let generation = self.generation;
        let probe = Arc::clone(&self.probe);
        let remembered = self.session.remembered.clone();
        let hosts = self.settings.hosts.clone();
        let timeouts = self.settings.timeouts;
        let tx = self.events_tx.clone();
        match &remembered {
            Some(host) => self.log(format!("probing remembered host {host}")),
            None => self.log("probing all hosts"),
        }
        thread::spawn(move || {
            let outcome = probe_for_stream(probe.as_ref(), remembered.as_ref(), &hosts, timeouts);
            let _ = tx.send(EngineEvent::Discovered {
                generation,
                outcome,
            });
        });
    }

    pub(crate) fn previous(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Ended) {
            self.log(format!("previous ignored while {}", self.state));
            return;
        }
        if self.player.current_position() > self.settings.rewind_threshold_ms {
            self.restart_current();
            return;
        }
        match self.session.history.go_back() {
            Some(url) => {
                self.log(format!("back to {url}"));
                self.play_stream(url, false);
            }
            None => {
                if let Some(oldest) = self.session.history.peek() {
                    self.log(format!("no entry before {oldest}"));
                }
                self.restart_current();
            }
        }
    }

    /// Replays the entry after the history cursor, left behind by `previous`.
    pub(crate) fn forward(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Ended) {
            self.log(format!("forward ignored while {}", self.state));
            return;
        }
        match self.session.history.go_forward() {
            Some(url) => {
                self.log(format!("forward to {url}"));
                self.play_stream(url, false);
            }
            None => self.log("already at the newest history entry"),
        }
    }

    pub(crate) fn blacklist_current(&mut self) {
        let Some(current) = self.session.current.clone() else {
            self.log("blacklist ignored: nothing is playing");
            return;
        };
        let target = self
            .session
            .remembered
            .clone()
            .or_else(|| host_of(&current));
        let (Some(token), Some(host)) = (extract_file_token(&current), target) else {
            self.log(format!("could not derive a blacklist request from {current}"));
            self.stop_player();
            self.load_next();
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        let probe = Arc::clone(&self.probe);
        let timeout = self.settings.timeouts.blacklist;
        let tx = self.events_tx.clone();
        self.log(format!("blacklisting {token} on {host}"));
        thread::spawn(move || {
            let result = blacklist_file(probe.as_ref(), &host, &token, timeout);
            let _ = tx.send(EngineEvent::Blacklisted {
                generation,
                host,
                token,
                result,
            });
        });
    }

    /// Handles every event already queued, without blocking.
    pub(crate) fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for one event and handles it.
    #[cfg(test)]
    pub(crate) fn process_next_event(&mut self, timeout: std::time::Duration) -> bool {
        use std::sync::mpsc::RecvTimeoutError;

        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    pub(crate) fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Discovered {
                generation,
                outcome,
            } => self.on_discovered(generation, outcome),
            EngineEvent::Blacklisted {
                generation,
                host,
                token,
                result,
            } => self.on_blacklisted(generation, host, token, result),
            EngineEvent::Player(PlayerEvent::Ended) => {
                self.player_loaded = false;
                self.state = PlaybackState::Ended;
                self.log("playback completed");
                self.load_next();
            }
            EngineEvent::Player(PlayerEvent::Error(message)) => {
                self.player_loaded = false;
                self.state = PlaybackState::Failed;
                let failure = ProbeFailure::PlaybackFailure(message);
                self.log(format!("{failure}, forgetting remembered host"));
                self.session.remembered = None;
                self.load_next();
            }
        }
    }

    fn on_discovered(&mut self, generation: u64, outcome: ProbeOutcome) {
        if generation != self.generation {
            self.log(format!("discarding stale discovery #{generation}"));
            return;
        }
        if outcome.remembered_failed {
            self.session.remembered = None;
        }
        match outcome.result {
            Ok(Discovery { host, stream }) => {
                self.log(format!("{host} offered {stream}"));
                self.session.remembered = Some(host);
                self.play_stream(stream, true);
            }
            Err(err) => match self.session.current.clone() {
                Some(current) if self.player_loaded => {
                    self.state = PlaybackState::Playing;
                    self.log(format!(
                        "no playable video on any host ({err}), still playing {current}"
                    ));
                }
                current => {
                    if current.is_some() {
                        self.stop_player();
                    }
                    self.state = PlaybackState::Failed;
                    self.log(format!("no playable video on any host ({err})"));
                }
            },
        }
    }

    fn on_blacklisted(
        &mut self,
        generation: u64,
        host: Host,
        token: FileToken,
        result: Result<BlacklistForm, ProbeFailure>,
    ) {
        match &result {
            Ok(form) => self.log(format!("blacklisted {token} on {host} via {form}")),
            Err(err) => self.log(format!("blacklist of {token} on {host} failed: {err}")),
        }
        if generation != self.generation {
            self.log(format!("not advancing for stale blacklist #{generation}"));
            return;
        }
        self.stop_player();
        self.load_next();
    }

    fn play_stream(&mut self, url: StreamUrl, push_to_history: bool) {
        if push_to_history {
            self.session.history.push(url.clone());
        }
        self.session.current = Some(url.clone());

        let speed = self.settings.playback_speed;
        let started = self
            .player
            .set_source(url.as_str())
            .and_then(|()| self.player.prepare())
            .and_then(|()| self.player.play())
            .and_then(|()| self.player.set_playback_speed(speed));
        match started {
            Ok(()) => {
                self.player_loaded = true;
                self.state = PlaybackState::Playing;
                self.log(format!("playing {url}"));
            }
            Err(err) => {
                self.player_loaded = false;
                self.state = PlaybackState::Failed;
                self.log(format!("player failed to start {url}: {err:#}"));
            }
        }
    }

    fn restart_current(&mut self) {
        match self.player.seek_to(0) {
            Ok(()) => self.log("restarted current video"),
            Err(err) => self.log(format!("seek failed: {err:#}")),
        }
    }

    /// Stops the player and forgets the stream it was showing.
    fn stop_player(&mut self) {
        self.player_loaded = false;
        self.session.current = None;
        if let Err(err) = self.player.stop() {
            self.log(format!("stop failed: {err:#}"));
        }
    }
}
