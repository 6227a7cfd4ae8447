use common::{
    ItemFields, MediaItem, DEFAULT_NUMBER, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_ITEM,
};
use metadata::TagInfo;

use crate::pathname::parse_pathname;

// Any non-blank tag value replaces the pathname-derived one, artist and
// album included.
pub fn build_item(pathname: &str, tags: Option<&TagInfo>, added: &str) -> MediaItem {
    let from_path = parse_pathname(pathname);
    let mut fields = ItemFields {
        pathname: pathname.to_string(),
        album: from_path.album,
        artist: from_path.artist,
        name: from_path.name,
        disc: from_path.disc,
        track: from_path.track,
        year: String::new(),
        genre: String::new(),
        added: added.to_string(),
    };

    if let Some(tags) = tags {
        override_with(&mut fields.album, tags.album.as_deref());
        override_with(&mut fields.artist, tags.artist.as_deref());
        override_with(&mut fields.name, tags.name.as_deref());
        override_with(&mut fields.disc, tags.disc.as_deref());
        override_with(&mut fields.track, tags.track.as_deref());
        override_with(&mut fields.year, tags.year.as_deref());
        override_with(&mut fields.genre, tags.genre.as_deref());
    }

    finish(fields)
}

/// Idempotent: applied to the fields of an item it produced, it returns the
/// same item.
pub fn finish(mut fields: ItemFields) -> MediaItem {
    default_if_blank(&mut fields.artist, UNKNOWN_ARTIST);
    default_if_blank(&mut fields.album, UNKNOWN_ALBUM);
    default_if_blank(&mut fields.name, UNKNOWN_ITEM);
    default_if_blank(&mut fields.disc, DEFAULT_NUMBER);
    default_if_blank(&mut fields.track, DEFAULT_NUMBER);
    MediaItem::new(fields)
}

fn override_with(target: &mut String, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        *target = value.to_string();
    }
}

fn default_if_blank(target: &mut String, default: &str) {
    if target.trim().is_empty() {
        *target = default.to_string();
    }
}
