use common::MediaItem;

use crate::query::Clause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pathname,
    Album,
    Artist,
    Name,
    Disc,
    Track,
    Year,
    Genre,
    Added,
}

impl Field {
    /// Looks up an already-normalized keyword. Unknown keywords yield `None`
    /// and are searched like clauses without a keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "path" | "pathname" => Some(Field::Pathname),
            "album" => Some(Field::Album),
            "artist" => Some(Field::Artist),
            "name" => Some(Field::Name),
            "disc" => Some(Field::Disc),
            "track" => Some(Field::Track),
            "year" => Some(Field::Year),
            "genre" => Some(Field::Genre),
            "mtime" | "added" => Some(Field::Added),
            _ => None,
        }
    }

    fn value<'a>(self, item: &'a MediaItem) -> &'a str {
        let normalized = item.normalized();
        match self {
            Field::Pathname => &normalized.pathname,
            Field::Album => &normalized.album,
            Field::Artist => &normalized.artist,
            Field::Name => &normalized.name,
            Field::Disc => &normalized.disc,
            Field::Track => &normalized.track,
            Field::Year => &normalized.year,
            Field::Genre => &normalized.genre,
            // Already digits and dashes.
            Field::Added => item.added(),
        }
    }
}

const ALL_FIELDS: [Field; 9] = [
    Field::Pathname,
    Field::Album,
    Field::Artist,
    Field::Name,
    Field::Disc,
    Field::Track,
    Field::Year,
    Field::Genre,
    Field::Added,
];

/// True when every clause holds for `item`. Clauses are expected in the
/// normalized form `Query::parse` produces. No clauses match everything.
pub fn matches(item: &MediaItem, clauses: &[Clause]) -> bool {
    clauses.iter().all(|clause| clause_holds(item, clause))
}

fn clause_holds(item: &MediaItem, clause: &Clause) -> bool {
    let found = match Field::from_keyword(&clause.keyword) {
        Some(field) => field.value(item).contains(clause.term.as_str()),
        None => ALL_FIELDS
            .iter()
            .any(|field| field.value(item).contains(clause.term.as_str())),
    };
    found != clause.negated
}

pub fn filter<'a>(items: &'a [MediaItem], clauses: &[Clause]) -> Vec<&'a MediaItem> {
    items.iter().filter(|item| matches(item, clauses)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::build_item;
    use crate::query::Query;
    use metadata::TagInfo;

    fn acdc() -> MediaItem {
        let tags = TagInfo {
            artist: Some("AC/DC".to_string()),
            year: Some("1980".to_string()),
            genre: Some("Hard Rock".to_string()),
            ..TagInfo::default()
        };
        build_item(
            "AC_DC/Back In Black/1-01 Hells Bells.m4a",
            Some(&tags),
            "2024-03-09",
        )
    }

    fn matches_query(item: &MediaItem, raw: &str) -> bool {
        matches(item, Query::parse(raw).clauses())
    }

    #[test]
    fn keyword_matches_single_field() {
        let item = acdc();
        assert!(matches(&item, &[Clause::new("artist", "ac", false)]));
        assert!(!matches(&item, &[Clause::new("artist", "ac", true)]));
        assert!(!matches(&item, &[Clause::new("album", "hells", false)]));
        assert!(matches(&item, &[Clause::new("name", "hells", false)]));
    }

    #[test]
    fn bare_terms_search_every_field() {
        let item = acdc();
        assert!(matches_query(&item, "bells"));
        assert!(matches_query(&item, "hard"));
        assert!(matches_query(&item, "2024-03"));
        assert!(!matches_query(&item, "zeppelin"));
    }

    #[test]
    fn unknown_keyword_searches_every_field() {
        let item = acdc();
        assert!(matches_query(&item, "composer:black"));
        assert!(!matches_query(&item, "composer:mozart"));
    }

    #[test]
    fn clauses_are_anded() {
        let item = acdc();
        assert!(matches_query(&item, "artist:ac/dc year:1980 -live"));
        assert!(!matches_query(&item, "artist:ac/dc year:1979"));
        assert!(!matches_query(&item, "artist:ac/dc genre:-rock"));
    }

    #[test]
    fn numeric_fields_use_digits() {
        let item = acdc();
        assert!(matches_query(&item, "disc:1 track:01"));
        assert!(matches_query(&item, "track:1"));
        assert!(!matches_query(&item, "track:2"));
    }

    #[test]
    fn added_and_mtime_are_aliases() {
        let item = acdc();
        assert!(matches_query(&item, "added:2024-03-"));
        assert!(matches_query(&item, "mtime:2024-03-"));
        assert!(!matches_query(&item, "mtime:2024-02-"));
    }

    #[test]
    fn pathname_keyword_sees_folders() {
        let item = acdc();
        assert!(matches_query(&item, "path:ac_dc/back"));
        assert!(matches_query(&item, "pathname:.m4a"));
    }

    #[test]
    fn empty_clause_list_matches_everything() {
        assert!(matches(&acdc(), &[]));
        assert!(matches_query(&acdc(), "   "));
    }

    #[test]
    fn filter_keeps_catalog_order() {
        let items = vec![
            build_item("B/Two/02 Second.mp3", None, "2024-01-01"),
            build_item("A/One/01 First.mp3", None, "2024-01-01"),
            build_item("C/Three/03 Third.mp3", None, "2024-01-01"),
        ];
        let found = filter(&items, Query::parse("-three").clauses());
        let paths: Vec<&str> = found.iter().map(|item| item.pathname()).collect();
        assert_eq!(paths, vec!["B/Two/02 Second.mp3", "A/One/01 First.mp3"]);
    }
}
