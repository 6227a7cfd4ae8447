use common::normalize_for_search;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Colon,
    Dash,
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(word) => word,
            Token::Colon => ":",
            Token::Dash => "-",
        }
    }
}

/// One `{keyword, term, negated}` unit of a query. An empty keyword means
/// the term may match any field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub keyword: String,
    pub term: String,
    pub negated: bool,
}

impl Clause {
    pub fn new(keyword: &str, term: &str, negated: bool) -> Self {
        Self {
            keyword: keyword.to_string(),
            term: term.to_string(),
            negated,
        }
    }

    fn normalized(self) -> Self {
        Self {
            keyword: normalize_for_search(&self.keyword),
            term: normalize_for_search(&self.term),
            negated: self.negated,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    /// Never fails; stray punctuation and unbalanced quotes degrade to
    /// whatever clauses can still be recovered.
    pub fn parse(raw: &str) -> Self {
        let clauses = reconstruct_clauses(&tokenize(raw))
            .into_iter()
            .map(Clause::normalized)
            .filter(|clause| !clause.term.is_empty())
            .collect();
        Self { clauses }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

// Start and Boundary accept the same input; Start only marks that nothing
// has been read yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Bareword,
    Quoted,
    Boundary,
}

pub fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = State::Start;

    for ch in raw.chars() {
        state = match state {
            State::Bareword => {
                if ch.is_whitespace() {
                    flush(&mut tokens, &mut current);
                    State::Boundary
                } else if ch == ':' {
                    flush(&mut tokens, &mut current);
                    tokens.push(Token::Colon);
                    State::Boundary
                } else {
                    current.push(ch);
                    State::Bareword
                }
            }
            State::Quoted => {
                if ch == '"' {
                    flush(&mut tokens, &mut current);
                    State::Boundary
                } else {
                    current.push(ch);
                    State::Quoted
                }
            }
            State::Start | State::Boundary => match ch {
                '"' => State::Quoted,
                '-' => {
                    tokens.push(Token::Dash);
                    State::Boundary
                }
                ':' => {
                    tokens.push(Token::Colon);
                    State::Boundary
                }
                ch if ch.is_whitespace() => State::Boundary,
                ch => {
                    current.push(ch);
                    State::Bareword
                }
            },
        };
    }

    // An unterminated quote is closed here.
    flush(&mut tokens, &mut current);
    tokens
}

fn flush(tokens: &mut Vec<Token>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(Token::Word(std::mem::take(current)));
    }
}

pub fn reconstruct_clauses(tokens: &[Token]) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut rest = tokens;

    while !rest.is_empty() {
        let (clause, consumed) = next_clause(rest);
        if let Some(clause) = clause {
            clauses.push(clause);
        }
        rest = &rest[consumed..];
    }

    clauses
}

fn next_clause(tokens: &[Token]) -> (Option<Clause>, usize) {
    match tokens {
        [Token::Dash] => (None, 1),
        [Token::Dash, Token::Word(term), ..] => (Some(Clause::new("", term, true)), 2),
        [Token::Dash, ..] | [Token::Colon, ..] => (None, 1),
        [Token::Word(keyword), Token::Colon, Token::Dash, Token::Word(term), ..] => {
            (Some(Clause::new(keyword, term, true)), 4)
        }
        [Token::Word(keyword), Token::Colon, Token::Word(term), ..] => {
            (Some(Clause::new(keyword, term, false)), 3)
        }
        [Token::Word(_), Token::Colon, Token::Dash] => (None, 3),
        [Token::Word(term), Token::Colon, ..] => (Some(Clause::new("", term, false)), 2),
        [Token::Word(term), ..] => (Some(Clause::new("", term, false)), 1),
        [] => (None, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = r#"Foo bar kw:term kw2 : term2 -greeb graggle kw3: -"term 3""#;

    fn strings(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn tokenizes_reference_query() {
        let tokens = tokenize(RAW);
        assert_eq!(
            strings(&tokens),
            vec![
                "Foo", "bar", "kw", ":", "term", "kw2", ":", "term2", "-", "greeb", "graggle",
                "kw3", ":", "-", "term 3",
            ]
        );
    }

    #[test]
    fn reconstructs_reference_clauses() {
        let clauses = reconstruct_clauses(&tokenize(RAW));
        assert_eq!(
            clauses,
            vec![
                Clause::new("", "Foo", false),
                Clause::new("", "bar", false),
                Clause::new("kw", "term", false),
                Clause::new("kw2", "term2", false),
                Clause::new("", "greeb", true),
                Clause::new("", "graggle", false),
                Clause::new("kw3", "term 3", true),
            ]
        );
    }

    #[test]
    fn quoted_operators_are_words() {
        let tokens = tokenize(r#"name:"a:b" "-x""#);
        assert_eq!(
            tokens,
            vec![
                Token::Word("name".to_string()),
                Token::Colon,
                Token::Word("a:b".to_string()),
                Token::Word("-x".to_string()),
            ]
        );
    }

    #[test]
    fn dashes_inside_barewords_are_kept() {
        assert_eq!(strings(&tokenize("jay-z -live")), vec!["jay-z", "-", "live"]);
    }

    #[test]
    fn unterminated_quote_closes_at_end() {
        assert_eq!(strings(&tokenize(r#"artist:"sigur ro"#)), vec!["artist", ":", "sigur ro"]);
        assert!(tokenize(r#""""#).is_empty());
    }

    #[test]
    fn dangling_operators_are_dropped() {
        assert_eq!(reconstruct_clauses(&tokenize("foo -")), vec![Clause::new("", "foo", false)]);
        assert_eq!(reconstruct_clauses(&tokenize("-")), vec![]);
        assert_eq!(reconstruct_clauses(&tokenize(": foo")), vec![Clause::new("", "foo", false)]);
        assert_eq!(reconstruct_clauses(&tokenize("--foo")), vec![Clause::new("", "foo", true)]);
        assert_eq!(reconstruct_clauses(&tokenize("year:-")), vec![]);
    }

    #[test]
    fn keyword_without_term_becomes_plain_term() {
        assert_eq!(reconstruct_clauses(&tokenize("album:")), vec![Clause::new("", "album", false)]);
        assert_eq!(
            reconstruct_clauses(&tokenize("album: :x")),
            vec![Clause::new("", "album", false), Clause::new("", "x", false)]
        );
    }

    #[test]
    fn parse_normalizes_keywords_and_terms() {
        let query = Query::parse(r#"ARTIST:Björk Genre:-"Électro Pop" Début"#);
        assert_eq!(
            query.clauses(),
            &[
                Clause::new("artist", "bjork", false),
                Clause::new("genre", "electro pop", true),
                Clause::new("", "debut", false),
            ]
        );
    }

    #[test]
    fn blank_query_has_no_clauses() {
        assert!(Query::parse("").is_empty());
        assert!(Query::parse("   \t").is_empty());
    }
}
