use crate::config::TrackDisplayField;

use super::model::Track;

/// Text of one field of `track`, or `None` when the field is empty.
///
/// `Display` stands for artist then title, joined by `sep`.
pub fn field_text(track: &Track, field: TrackDisplayField, sep: &str) -> Option<String> {
    let non_empty = |s: Option<&str>| {
        s.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match field {
        TrackDisplayField::Display => {
            let parts: Vec<String> = non_empty(track.artist.as_deref())
                .into_iter()
                .chain(non_empty(Some(track.title.as_str())))
                .collect();
            (!parts.is_empty()).then(|| parts.join(sep))
        }
        TrackDisplayField::Title => non_empty(Some(track.title.as_str())),
        TrackDisplayField::Artist => non_empty(track.artist.as_deref()),
        TrackDisplayField::Album => non_empty(track.album.as_deref()),
        TrackDisplayField::Filename => non_empty(track.path.file_stem().and_then(|s| s.to_str())),
        TrackDisplayField::Path => Some(track.path.display().to_string()),
    }
}

/// Build the list label for `track` from the configured `fields`.
///
/// Empty fields are skipped; when nothing is left the title is used.
pub fn display_for(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|&field| field_text(track, field, sep))
        .collect();

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
