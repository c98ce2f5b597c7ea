use crossterm::event::KeyCode;

use super::*;
use crate::config::ControlsSettings;
use crate::engine::{EngineCmd, PlaybackInfo, PlaybackState, Sequencing};
use crate::library::Track;
use crate::playlist::Playlist;
use crate::plugin::Equalizer;

fn playlist(n: usize) -> Playlist {
    Playlist::new(
        (0..n)
            .map(|i| Track::from_path(format!("/music/{i}.mp3")))
            .collect(),
    )
}

fn press(app: &mut App, key: KeyCode, playlist: &mut Playlist, info: &PlaybackInfo) -> Action {
    app.handle_key(
        key,
        playlist,
        info,
        &Equalizer::default(),
        &ControlsSettings::default(),
    )
}

#[test]
fn movement_keys_walk_the_cursor_and_stop_following() {
    let mut app = App::new(true);
    let mut pl = playlist(5);
    let info = PlaybackInfo::default();

    press(&mut app, KeyCode::Char('j'), &mut pl, &info);
    press(&mut app, KeyCode::Char('j'), &mut pl, &info);
    assert_eq!(pl.cursor(), Some(2));
    assert!(!app.follow_playback);

    press(&mut app, KeyCode::Char('G'), &mut pl, &info);
    assert_eq!(pl.cursor(), Some(4));
    press(&mut app, KeyCode::Char('j'), &mut pl, &info);
    assert_eq!(pl.cursor(), Some(4));

    press(&mut app, KeyCode::Char('g'), &mut pl, &info);
    assert_eq!(pl.cursor(), Some(4));
    press(&mut app, KeyCode::Char('g'), &mut pl, &info);
    assert_eq!(pl.cursor(), Some(0));

    press(&mut app, KeyCode::Char('k'), &mut pl, &info);
    assert_eq!(pl.cursor(), Some(0));
}

#[test]
fn a_single_g_is_forgotten_after_another_key() {
    let mut app = App::new(false);
    let mut pl = playlist(5);
    let info = PlaybackInfo::default();
    pl.select(3);

    press(&mut app, KeyCode::Char('g'), &mut pl, &info);
    press(&mut app, KeyCode::Char('j'), &mut pl, &info);
    press(&mut app, KeyCode::Char('g'), &mut pl, &info);
    assert_eq!(pl.cursor(), Some(4));
}

#[test]
fn follow_moves_the_cursor_to_the_playing_track() {
    let mut pl = playlist(5);
    pl.set_current(Some(3));

    App::new(false).follow(&mut pl);
    assert_eq!(pl.cursor(), Some(0));

    App::new(true).follow(&mut pl);
    assert_eq!(pl.cursor(), Some(3));
}

#[test]
fn transport_keys_map_to_engine_commands() {
    let mut app = App::new(false);
    let mut pl = playlist(3);
    let info = PlaybackInfo::default();

    assert!(matches!(
        press(&mut app, KeyCode::Enter, &mut pl, &info),
        Action::Send(EngineCmd::StartSelected)
    ));
    assert!(app.follow_playback);
    assert!(matches!(
        press(&mut app, KeyCode::Char(' '), &mut pl, &info),
        Action::Send(EngineCmd::TogglePause)
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('p'), &mut pl, &info),
        Action::Send(EngineCmd::Pause)
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('S'), &mut pl, &info),
        Action::Send(EngineCmd::Stop)
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('l'), &mut pl, &info),
        Action::Send(EngineCmd::Skip(1))
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('h'), &mut pl, &info),
        Action::Send(EngineCmd::Skip(-1))
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('L'), &mut pl, &info),
        Action::Send(EngineCmd::Seek { secs: 10, relative: true })
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('-'), &mut pl, &info),
        Action::Send(EngineCmd::SetVolume { value: -5, relative: true })
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('q'), &mut pl, &info),
        Action::Quit
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('z'), &mut pl, &info),
        Action::Nothing
    ));
}

#[test]
fn x_resumes_plays_or_starts_the_selection() {
    let mut app = App::new(false);
    let mut pl = playlist(3);

    let stopped = PlaybackInfo::default();
    assert!(matches!(
        press(&mut app, KeyCode::Char('x'), &mut pl, &stopped),
        Action::Send(EngineCmd::StartSelected)
    ));

    pl.set_current(Some(1));
    assert!(matches!(
        press(&mut app, KeyCode::Char('x'), &mut pl, &stopped),
        Action::Send(EngineCmd::Play)
    ));

    let paused = PlaybackInfo {
        state: PlaybackState::Paused,
        ..PlaybackInfo::default()
    };
    assert!(matches!(
        press(&mut app, KeyCode::Char('x'), &mut pl, &paused),
        Action::Send(EngineCmd::Resume)
    ));
}

#[test]
fn toggles_flip_the_current_sequencing() {
    let mut app = App::new(false);
    let mut pl = playlist(3);
    let info = PlaybackInfo {
        sequencing: Sequencing {
            shuffle: true,
            loop_play: false,
        },
        ..PlaybackInfo::default()
    };

    assert!(matches!(
        press(&mut app, KeyCode::Char('s'), &mut pl, &info),
        Action::Send(EngineCmd::SetShuffle(false))
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Char('r'), &mut pl, &info),
        Action::Send(EngineCmd::SetLoop(true))
    ));
}

#[test]
fn m_flips_the_mono_downmix() {
    let mut app = App::new(false);
    let mut pl = playlist(1);

    assert!(matches!(
        press(&mut app, KeyCode::Char('m'), &mut pl, &PlaybackInfo::default()),
        Action::Send(EngineCmd::SetDownmix(true))
    ));
    let mono = PlaybackInfo {
        effects: vec!["mono".into()],
        ..PlaybackInfo::default()
    };
    assert!(matches!(
        press(&mut app, KeyCode::Char('m'), &mut pl, &mono),
        Action::Send(EngineCmd::SetDownmix(false))
    ));
}

#[test]
fn preamp_keys_step_by_one_db() {
    let mut app = App::new(false);
    let mut pl = playlist(1);
    let mut eq = Equalizer::default();
    eq.preamp = Equalizer::MAX_DB;

    let action = app.handle_key(
        KeyCode::Char(']'),
        &mut pl,
        &PlaybackInfo::default(),
        &eq,
        &ControlsSettings::default(),
    );
    match action {
        Action::Send(EngineCmd::SetEqualizer(next)) => assert_eq!(next.preamp, Equalizer::MAX_DB),
        other => panic!("unexpected {other:?}"),
    }

    let action = app.handle_key(
        KeyCode::Char('['),
        &mut pl,
        &PlaybackInfo::default(),
        &Equalizer::default(),
        &ControlsSettings::default(),
    );
    match action {
        Action::Send(EngineCmd::SetEqualizer(next)) => assert_eq!(next.preamp, -1.0),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn d_removes_the_visual_selection() {
    let mut app = App::new(false);
    let mut pl = playlist(5);
    let info = PlaybackInfo::default();
    pl.select(1);
    press(&mut app, KeyCode::Char('J'), &mut pl, &info);
    press(&mut app, KeyCode::Char('J'), &mut pl, &info);

    assert!(matches!(
        press(&mut app, KeyCode::Char('d'), &mut pl, &info),
        Action::Send(EngineCmd::Remove { start: 1, end: 3 })
    ));

    let mut empty = playlist(0);
    assert!(matches!(
        press(&mut app, KeyCode::Char('d'), &mut empty, &info),
        Action::Nothing
    ));
    assert!(matches!(
        press(&mut app, KeyCode::Enter, &mut empty, &info),
        Action::Nothing
    ));
}
