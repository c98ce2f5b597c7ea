//! Terminal rendering with `ratatui`.

use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::config::{ControlsSettings, TimeField, TrackDisplayField, UiSettings};
use crate::engine::{PlaybackInfo, PlaybackState, Sequencing};
use crate::library::{Track, field_text};
use crate::playlist::Playlist;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("J/K", "extend selection"),
        ("gg/G", "top/bottom"),
        ("enter", "play selected"),
        ("space", "play/pause"),
        ("p", "pause"),
        ("x", "play"),
        ("S", "stop"),
        ("h/l", "prev/next"),
        ("[/]", "preamp -/+"),
        ("s", "shuffle"),
        ("r", "loop"),
        ("m", "mono"),
        ("d", "remove"),
        ("q", "quit"),
    ])
});

/// Render the controls help text, incorporating the configured steps.
fn controls_text(controls: &ControlsSettings) -> String {
    let order = [
        "j/k", "J/K", "gg/G", "enter", "space", "p", "x", "S", "h/l", "H/L", "-/+", "[/]", "s", "r",
        "m", "d", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] seek -/+{}s", controls.seek_seconds)),
            "-/+" => Some(format!("[-/+] volume -/+{}%", controls.volume_step)),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{k}] {v}")),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    let parts: Vec<String> = ui
        .now_playing_track_fields
        .iter()
        .filter_map(|&field| match field {
            TrackDisplayField::Display => Some(track.display.clone()),
            other => field_text(track, other, &ui.now_playing_track_separator),
        })
        .filter(|part| !part.trim().is_empty())
        .collect();

    if parts.is_empty() {
        track.display.clone()
    } else {
        parts.join(&ui.now_playing_track_separator)
    }
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(elapsed)),
            TimeField::Total => total.map(format_mmss),
            TimeField::Remaining => total.map(|t| format!("-{}", format_mmss(t.saturating_sub(elapsed)))),
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

fn sequencing_text(sequencing: Sequencing) -> String {
    let on_off = |on: bool| if on { "ON" } else { "OFF" };
    format!(
        "Shuffle: {} • Loop: {}",
        on_off(sequencing.shuffle),
        on_off(sequencing.loop_play)
    )
}

fn status_text(app: &App, playlist: &Playlist, info: &PlaybackInfo, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    let state = match info.state {
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
        PlaybackState::Stopped => "Stopped",
    };
    match info.index.and_then(|i| playlist.get(i)) {
        Some(track) if info.state != PlaybackState::Stopped => {
            let song = now_playing_track_text(track, ui);
            match now_playing_time_text(info.elapsed, track.duration, ui) {
                Some(time) => parts.push(format!("{state}: {song} [{time}]")),
                None => parts.push(format!("{state}: {song}")),
            }
        }
        _ => parts.push(state.to_string()),
    }

    parts.push(format!("Vol: {}%", info.volume));
    parts.push(sequencing_text(info.sequencing));
    if !info.effects.is_empty() {
        parts.push(format!("FX: {}", info.effects.join("+")));
    }
    parts.push(
        if app.follow_playback {
            "CURSOR: Follow"
        } else {
            "CURSOR: Free-roam"
        }
        .to_string(),
    );
    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {dir}"));
    }
    if !info.message.is_empty() {
        parts.push(format!("! {}", info.message));
    }

    parts.join(" • ")
}

/// Render the whole screen.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    playlist: &Playlist,
    info: &PlaybackInfo,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app, playlist, info, ui_settings))
        .block(Block::bordered().padding(Padding::left(1)).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Only build items for the visible window, keeping the cursor centered when possible.
    let total = playlist.len();
    let height = chunks[2].height.saturating_sub(2) as usize;
    let cursor = playlist.cursor().unwrap_or(0);
    let start = if total <= height || height == 0 {
        0
    } else {
        cursor.saturating_sub(height / 2).min(total - height)
    };
    let end = if height == 0 { total } else { (start + height).min(total) };
    let selected = playlist.selection_range();

    let items: Vec<ListItem> = playlist.tracks()[start..end]
        .iter()
        .enumerate()
        .map(|(offset, track)| {
            let index = start + offset;
            let marker = if info.index == Some(index) { "♪ " } else { "  " };
            let item = ListItem::new(format!("{marker}{}", track.display));
            if selected.as_ref().is_some_and(|r| r.contains(&index)) && index != cursor {
                item.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" playlist "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(cursor - start));
    }
    frame.render_stateful_widget(list, chunks[2], &mut state);

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding::left(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
