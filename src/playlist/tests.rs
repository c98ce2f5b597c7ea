use super::*;
use std::time::Duration;

fn playlist(names: &[&str]) -> Playlist {
    Playlist::new(
        names
            .iter()
            .map(|n| Track::from_path(format!("/music/{n}.mp3")))
            .collect(),
    )
}

fn titles(p: &Playlist) -> Vec<&str> {
    p.tracks().iter().map(|t| t.title.as_str()).collect()
}

#[test]
fn current_is_none_or_in_range() {
    let mut p = playlist(&["a", "b"]);
    assert_eq!(p.current(), None);
    assert_eq!(p.set_current(Some(1)), Some(1));
    assert_eq!(p.current_track().map(|t| t.title.as_str()), Some("b"));
    assert_eq!(p.set_current(Some(2)), None);
    assert_eq!(p.current(), None);
}

#[test]
fn empty_playlist_has_no_selection() {
    let mut p = Playlist::default();
    assert!(p.is_empty());
    assert_eq!(p.selection_range(), None);
    p.select(3);
    assert_eq!(p.cursor(), None);
    let p = Playlist::new(vec![Track::from_path("/x.mp3")]);
    assert_eq!(p.selection_range(), Some(0..=0));
}

#[test]
fn selection_is_clamped_and_ordered() {
    let mut p = playlist(&["a", "b", "c", "d"]);
    p.select(2);
    p.extend_selection(0);
    assert_eq!(p.selection_range(), Some(0..=2));
    assert_eq!(p.cursor(), Some(0));
    p.select(99);
    assert_eq!(p.selection_range(), Some(3..=3));
}

#[test]
fn remove_before_current_shifts_it() {
    let mut p = playlist(&["a", "b", "c", "d"]);
    p.set_current(Some(3));
    let removed = p.remove(0..=1);
    assert_eq!(removed.len(), 2);
    assert_eq!(titles(&p), vec!["c", "d"]);
    assert_eq!(p.current(), Some(1));
}

#[test]
fn remove_current_clears_it() {
    let mut p = playlist(&["a", "b", "c"]);
    p.set_current(Some(1));
    p.remove(1..=5);
    assert_eq!(titles(&p), vec!["a"]);
    assert_eq!(p.current(), None);
    assert_eq!(p.cursor(), Some(0));
}

#[test]
fn remove_after_current_keeps_it() {
    let mut p = playlist(&["a", "b", "c"]);
    p.set_current(Some(0));
    p.remove(2..=2);
    assert_eq!(p.current(), Some(0));
    assert!(p.remove(7..=9).is_empty());
}

#[test]
fn set_duration_updates_cached_length() {
    let mut p = playlist(&["a"]);
    p.set_duration(0, Duration::from_secs(90));
    p.set_duration(5, Duration::from_secs(1));
    assert_eq!(p.get(0).and_then(|t| t.duration), Some(Duration::from_secs(90)));
}
