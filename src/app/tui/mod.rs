mod render;
mod session;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::config::Config;
use crate::http::HttpProbe;

use super::engine::{MpvPlayer, Orchestrator, StreamUrl};

use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone)]
pub(super) struct PendingBlacklist {
    pub(super) stream: StreamUrl,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct ViewOptions {
    pub(super) show_log: bool,
}

pub(crate) fn run_tui(config: &Config) -> Result<()> {
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let events = Orchestrator::channel();
    let player = MpvPlayer::new(config.player_bin(), events.0.clone());
    let mut orchestrator = Orchestrator::new(
        Arc::new(HttpProbe),
        Box::new(player),
        config.engine_settings(),
        events,
    );
    let mut view = ViewOptions {
        show_log: config.show_log,
    };
    let mut pending_blacklist = None::<PendingBlacklist>;
    orchestrator.start();

    loop {
        orchestrator.drain_events();
        terminal.draw(|frame| draw_tui(frame, &orchestrator, view, pending_blacklist.as_ref()))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(dialog) = pending_blacklist.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    if orchestrator.session().current.as_ref() == Some(&dialog.stream) {
                        orchestrator.blacklist_current();
                    } else {
                        orchestrator.log("blacklist canceled: a different video is playing now");
                    }
                }
                KeyCode::Esc | KeyCode::Char('n') => orchestrator.log("blacklist canceled"),
                _ => pending_blacklist = Some(dialog),
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Char('n') | KeyCode::Right => orchestrator.next(),
            KeyCode::Char('r') => {
                orchestrator.log("retry requested");
                orchestrator.load_next();
            }
            KeyCode::Char('p') | KeyCode::Left => orchestrator.previous(),
            KeyCode::Char('f') => orchestrator.forward(),
            KeyCode::Char('b') => match orchestrator.session().current.clone() {
                Some(stream) => pending_blacklist = Some(PendingBlacklist { stream }),
                None => orchestrator.log("blacklist ignored: nothing is playing"),
            },
            KeyCode::Char('l') => view.show_log = !view.show_log,
            _ => {}
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
