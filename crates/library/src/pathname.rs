use common::remove_extension;

/// Fields recovered from a `Artist/Album/[Disc-]Track Name.ext` pathname.
/// Anything the pathname does not carry is left empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathnameInfo {
    pub artist: String,
    pub album: String,
    pub disc: String,
    pub track: String,
    pub name: String,
}

pub fn parse_pathname(pathname: &str) -> PathnameInfo {
    let parts: Vec<&str> = pathname.split('/').collect();
    let len = parts.len();
    let mut info = PathnameInfo::default();
    if len > 2 {
        info.artist = parts[len - 3].to_string();
    }
    if len > 1 {
        info.album = parts[len - 2].to_string();
    }
    if let Some(basename) = parts.last() {
        let (disc, track, name) = split_disc_track_name(basename);
        info.disc = disc.to_string();
        info.track = track.to_string();
        info.name = remove_extension(name).to_string();
    }
    info
}

/// Splits `"1-01 Hells Bells.m4a"` into `("1", "01", "Hells Bells.m4a")`.
///
/// The numeric prefix is `D-T`, `-T` or `T` and must be followed by
/// whitespace; a lone number is the track. Without a prefix followed by
/// whitespace the whole basename is the name.
pub fn split_disc_track_name(basename: &str) -> (&str, &str, &str) {
    let head = basename.trim_start();
    let (first, rest) = leading_digits(head);
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    let (second, rest) = leading_digits(rest);
    let name = rest.trim_start();
    if name.len() == rest.len() {
        return ("", "", basename);
    }
    if !first.is_empty() && second.is_empty() {
        ("", first, name)
    } else {
        (first, second, name)
    }
}

fn leading_digits(value: &str) -> (&str, &str) {
    let end = value
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(value.len());
    value.split_at(end)
}
