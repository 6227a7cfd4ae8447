use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lofty::error::LoftyError;
use lofty::prelude::{ItemKey, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Tag;

/// Raw tag values as found in the file. Values are trimmed; blank values are
/// reported as `None`. Numbers stay strings ("3/12", "2004-05-01") and are
/// reduced to digits later, during normalization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub album: Option<String>,
    pub artist: Option<String>,
    pub name: Option<String>,
    pub disc: Option<String>,
    pub track: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// Reads embedded tags. A file without any tag yields an empty `TagInfo`;
/// an unreadable or unparseable file yields an error.
pub fn read_tags(path: &Path) -> Result<TagInfo, MetadataError> {
    read_tags_from(File::open(path)?)
}

/// Same as `read_tags` for a file the caller already opened. The format is
/// guessed from the content.
pub fn read_tags_from(file: File) -> Result<TagInfo, MetadataError> {
    let tagged_file = Probe::new(BufReader::new(file)).guess_file_type()?.read()?;
    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => return Ok(TagInfo::default()),
    };
    Ok(tag_info(tag))
}

fn tag_info(tag: &Tag) -> TagInfo {
    let artist = text(tag, &ItemKey::TrackArtist).or_else(|| text(tag, &ItemKey::AlbumArtist));
    let year = text(tag, &ItemKey::Year).or_else(|| text(tag, &ItemKey::RecordingDate));
    TagInfo {
        album: text(tag, &ItemKey::AlbumTitle),
        artist,
        name: text(tag, &ItemKey::TrackTitle),
        disc: text(tag, &ItemKey::DiscNumber),
        track: text(tag, &ItemKey::TrackNumber),
        year,
        genre: text(tag, &ItemKey::Genre).map(|value| clean_genre(&value)),
    }
}

fn text(tag: &Tag, key: &ItemKey) -> Option<String> {
    tag.get_string(key).and_then(clean_value)
}

fn clean_value(value: &str) -> Option<String> {
    let trimmed = value.trim_matches(|ch: char| ch.is_whitespace() || ch == '\0');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ID3v1-style numeric genres show up as "(17)" or "(17)Rock"; keep the text
// part when there is one.
fn clean_genre(value: &str) -> String {
    if let Some(rest) = value.strip_prefix('(') {
        if let Some((code, label)) = rest.split_once(')') {
            if code.chars().all(|ch| ch.is_ascii_digit()) && !label.trim().is_empty() {
                return label.trim().to_string();
            }
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::tag::TagType;

    #[test]
    fn reads_strings_from_tag() {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.insert_text(ItemKey::AlbumTitle, "  Back In Black ".to_string());
        tag.insert_text(ItemKey::AlbumArtist, "AC/DC".to_string());
        tag.insert_text(ItemKey::TrackTitle, "Hells Bells".to_string());
        tag.insert_text(ItemKey::TrackNumber, "1/10".to_string());
        tag.insert_text(ItemKey::Genre, "(17)Rock".to_string());

        let info = tag_info(&tag);
        assert_eq!(info.album.as_deref(), Some("Back In Black"));
        assert_eq!(info.artist.as_deref(), Some("AC/DC"));
        assert_eq!(info.name.as_deref(), Some("Hells Bells"));
        assert_eq!(info.track.as_deref(), Some("1/10"));
        assert_eq!(info.genre.as_deref(), Some("Rock"));
        assert_eq!(info.disc, None);
    }

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(clean_value("   "), None);
        assert_eq!(clean_value("\0\0"), None);
        assert_eq!(clean_value(" x "), Some("x".to_string()));
    }

    #[test]
    fn keeps_plain_genres() {
        assert_eq!(clean_genre("Rock"), "Rock");
        assert_eq!(clean_genre("(17)"), "(17)");
        assert_eq!(clean_genre("(Live) Jazz"), "(Live) Jazz");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_tags(Path::new("/definitely/not/here.mp3")).unwrap_err();
        assert!(matches!(err, MetadataError::Io(_)));
        assert!(err.to_string().starts_with("io error"));
    }

    #[test]
    fn unrecognized_content_is_a_tag_error() {
        let mut file = tempfile::tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"garbage bytes, not audio").unwrap();
        std::io::Seek::rewind(&mut file).unwrap();
        let err = read_tags_from(file).unwrap_err();
        assert!(matches!(err, MetadataError::Lofty(_)));
    }
}
