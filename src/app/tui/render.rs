use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Padding, Paragraph, Row, Table, TableState, Wrap,
};

use super::super::engine::{History, Orchestrator, PlaybackState};
use super::{PendingBlacklist, ViewOptions};

pub(super) fn draw_tui(
    frame: &mut Frame,
    orchestrator: &Orchestrator,
    view: ViewOptions,
    pending_blacklist: Option<&PendingBlacklist>,
) {
    let session = orchestrator.session();
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let remembered = session
        .remembered
        .as_ref()
        .map(|host| host.to_string())
        .unwrap_or_else(|| "-".to_string());
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "LANREEL",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            orchestrator.state().label(),
            state_style(orchestrator.state()),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("{} hosts", orchestrator.settings().hosts.len()),
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("server {remembered}"),
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Session"));
    frame.render_widget(header, chunks[0]);

    let body_constraints = if view.show_log {
        [Constraint::Percentage(55), Constraint::Percentage(45)]
    } else {
        [Constraint::Percentage(100), Constraint::Percentage(0)]
    };
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(body_constraints)
        .split(chunks[1]);
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(4)])
        .split(body_chunks[0]);

    let now_playing_width = left_chunks[0].width.saturating_sub(4) as usize;
    let now_playing_text = match session.current.as_ref() {
        Some(stream) => format!(
            "Stream\n{}\n\nPosition {}   Speed {:.2}x   Entry {}/{}   Attempt #{}",
            truncate_front(stream.as_str(), now_playing_width),
            format_position(orchestrator.position_ms()),
            orchestrator.playback_speed(),
            session.history.cursor().map_or(0, |cursor| cursor + 1),
            session.history.len(),
            orchestrator.generation(),
        ),
        None => match orchestrator.state() {
            PlaybackState::Failed => {
                "No server offered a playable video.\n\nPress r to retry.".to_string()
            }
            _ => "Looking for a server...".to_string(),
        },
    };
    let now_playing = Paragraph::new(now_playing_text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .block(panel_block("Now Playing"));
    frame.render_widget(now_playing, left_chunks[0]);

    render_history(frame, left_chunks[1], &session.history);

    if view.show_log {
        let visible = body_chunks[1].height.saturating_sub(2) as usize;
        let skip = session.log.len().saturating_sub(visible);
        let lines: Vec<Line> = session
            .log
            .lines()
            .skip(skip)
            .map(|line| Line::from(line.to_string()))
            .collect();
        let log = Paragraph::new(lines)
            .style(Style::default().fg(Color::Rgb(185, 195, 210)))
            .wrap(Wrap { trim: false })
            .block(panel_block("Log"));
        frame.render_widget(log, body_chunks[1]);
    }

    let controls = Paragraph::new(controls_line())
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[2]);

    if let Some(confirm) = pending_blacklist {
        let popup_text = format!(
            "Blacklist this video on the server?\n\n{}\n\nIt will no longer be offered as next.\n\n[y / Enter] Blacklist   [n / Esc] Cancel",
            truncate_front(confirm.stream.as_str(), 56)
        );
        let popup_area = popup_rect_for_text(frame.area(), &popup_text);
        render_popup_shadow(frame, popup_area);
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new(popup_text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(modal_block("Confirm Blacklist"));
        frame.render_widget(popup, popup_area);
    }
}

/// History table scrolled so the cursor row stays visible.
fn render_history(frame: &mut Frame, area: Rect, history: &History) {
    let history_width = area.width.saturating_sub(10) as usize;
    let cursor = history.cursor();
    let rows: Vec<Row> = history
        .entries()
        .iter()
        .enumerate()
        .map(|(idx, url)| {
            let marker = if Some(idx) == cursor { "▸" } else { " " };
            Row::new(vec![
                Cell::from(format!("{marker}{:>3}", idx + 1)),
                Cell::from(truncate_front(url.as_str(), history_width)),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(5), Constraint::Min(10)])
        .header(
            Row::new(vec!["#", "Stream"]).style(
                Style::default()
                    .fg(Color::Rgb(110, 170, 255))
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(panel_block("History"))
        .row_highlight_style(
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        );
    let mut state = TableState::default().with_selected(cursor);
    frame.render_stateful_widget(table, area, &mut state);
}

/// Keeps the tail of `s`, where the file name lives.
fn truncate_front(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let tail: String = s.chars().skip(count - keep).collect();
    format!("...{tail}")
}

fn format_position(ms: u64) -> String {
    let total = ms / 1000;
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

fn state_style(state: PlaybackState) -> Style {
    let color = match state {
        PlaybackState::Playing => Color::Rgb(130, 220, 150),
        PlaybackState::Probing | PlaybackState::Ended => Color::Yellow,
        PlaybackState::Failed => Color::Rgb(255, 145, 120),
        PlaybackState::Idle => Color::Rgb(185, 195, 210),
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn key_pill(label: &'static str) -> Span<'static> {
    Span::styled(
        label,
        Style::default()
            .bg(Color::Rgb(72, 82, 96))
            .fg(Color::Rgb(230, 235, 242)),
    )
}

fn controls_line() -> Line<'static> {
    let hint = Style::default().fg(Color::Rgb(185, 195, 210));
    Line::from(vec![
        key_pill(" n "),
        Span::styled(" next  ", hint),
        key_pill(" p "),
        Span::styled(" previous  ", hint),
        key_pill(" f "),
        Span::styled(" forward  ", hint),
        key_pill(" b "),
        Span::styled(" blacklist  ", hint),
        key_pill(" r "),
        Span::styled(" retry  ", hint),
        key_pill(" l "),
        Span::styled(" log  ", hint),
        key_pill(" q "),
        Span::styled(" quit", hint),
    ])
}

fn centered_fixed_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width.max(1));
    let clamped_height = height.min(area.height.max(1));
    let x = area.x + area.width.saturating_sub(clamped_width) / 2;
    let y = area.y + area.height.saturating_sub(clamped_height) / 2;
    Rect::new(x, y, clamped_width, clamped_height)
}

fn render_popup_shadow(frame: &mut Frame, popup_area: Rect) {
    let area = frame.area();
    let shadow = Rect::new(
        (popup_area.x + 1).min(area.x + area.width.saturating_sub(1)),
        (popup_area.y + 1).min(area.y + area.height.saturating_sub(1)),
        popup_area.width.saturating_sub(1),
        popup_area.height.saturating_sub(1),
    );
    if shadow.width == 0 || shadow.height == 0 {
        return;
    }
    let shadow_block = Block::default().style(Style::default().bg(Color::Rgb(14, 16, 24)));
    frame.render_widget(shadow_block, shadow);
}

fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let max_line_width = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let width = max_line_width
        .saturating_add(8)
        .clamp(48.min(available_width), 76.min(available_width));

    let available_height = area.height.saturating_sub(2).max(1);
    let height = line_count
        .saturating_add(4)
        .clamp(8.min(available_height), 16.min(available_height));

    centered_fixed_rect(width, height, area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::engine::StreamUrl;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered_history(history: &History, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
        terminal
            .draw(|frame| render_history(frame, frame.area(), history))
            .expect("draw history");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn history_scrolls_to_keep_cursor_row_visible() {
        let mut history = History::default();
        for idx in 1..=40 {
            history.push(StreamUrl::new(format!("http://a:1/video/ep{idx:02}.mp4")));
        }

        let screen = rendered_history(&history, 50, 8);
        assert!(screen.contains("▸ 40"), "cursor row missing:\n{screen}");
        assert!(!screen.contains("ep01.mp4"));

        history.go_back();
        let screen = rendered_history(&history, 50, 8);
        assert!(screen.contains("▸ 39"), "cursor row missing:\n{screen}");
    }

    #[test]
    fn truncate_front_keeps_file_name() {
        assert_eq!(truncate_front("http://h/video/a.mp4", 40), "http://h/video/a.mp4");
        assert_eq!(truncate_front("http://host:3000/video/ep01.mp4", 12), ".../ep01.mp4");
    }

    #[test]
    fn format_position_renders_hours_minutes_seconds() {
        assert_eq!(format_position(0), "00:00:00");
        assert_eq!(format_position(3_725_999), "01:02:05");
    }
}
