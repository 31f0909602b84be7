//! The boolean full-text query language front end.
//!
//! This module only parses query text into an [`Expr`] tree; it knows
//! nothing about SQLite or `fts5`. Keeping the grammar and its precedence
//! rules (tightest first: `NOT`, `AND`, `OR`) independent of the backend
//! lets them be tested without a database, and lets the lowering step in
//! the repository crate own all backend-specific quoting concerns.

use crate::error::Fault;

/// A recognized field prefix (`title:`, `content:`, ...). `query()` with no
/// prefix searches the default column set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Content,
    Tags,
    Type,
}

impl Field {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "title" => Some(Field::Title),
            "description" => Some(Field::Description),
            "content" => Some(Field::Content),
            "tags" => Some(Field::Tags),
            "type" => Some(Field::Type),
            _ => None,
        }
    }

    pub fn column_name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Content => "content",
            Field::Tags => "tags_joined",
            Field::Type => "type_name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub field: Option<Field>,
    pub text: String,
    pub phrase: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(Term),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Terms required for a match, for building a highlight query over an
    /// already-matched row. Terms beneath a `NOT` are excluded, since
    /// their presence says nothing about where the match came from.
    pub fn positive_terms(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        collect_positive_terms(self, &mut out);
        out
    }
}

fn collect_positive_terms<'a>(expr: &'a Expr, out: &mut Vec<&'a Term>) {
    match expr {
        Expr::Term(term) => out.push(term),
        Expr::Not(_) => {}
        Expr::And(left, right) | Expr::Or(left, right) => {
            collect_positive_terms(left, out);
            collect_positive_terms(right, out);
        }
    }
}

pub fn parse(query: &str) -> Result<Expr, Fault> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Err(Fault::validation("empty search query"));
    }
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(Fault::validation("unexpected trailing input in search query"));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Word(String),
}

fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '(' && chars[i] != ')' {
            if chars[i] == '"' {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    i += 1;
                }
                if i < chars.len() {
                    i += 1;
                }
            } else {
                i += 1;
            }
        }
        let raw: String = chars[start..i].iter().collect();
        tokens.push(match raw.as_str() {
            "AND" => Token::And,
            "OR" => Token::Or,
            "NOT" => Token::Not,
            _ => Token::Word(raw),
        });
    }
    tokens
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn starts_operand(&self) -> bool {
        matches!(self.peek(), Some(Token::LParen) | Some(Token::Word(_)) | Some(Token::Not))
    }

    /// Loosest precedence: `OR`.
    fn parse_or(&mut self) -> Result<Expr, Fault> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `AND`, explicit or implicit between adjacent operands.
    fn parse_and(&mut self) -> Result<Expr, Fault> {
        let mut left = self.parse_not()?;
        loop {
            if matches!(self.peek(), Some(Token::And)) {
                self.advance();
            } else if matches!(self.peek(), Some(Token::Or) | Some(Token::RParen) | None) {
                break;
            } else if !self.starts_operand() {
                break;
            }
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Tightest precedence: `NOT` / `-term`.
    fn parse_not(&mut self) -> Result<Expr, Fault> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        if let Some(Token::Word(w)) = self.peek() {
            if let Some(rest) = w.strip_prefix('-') {
                if !rest.is_empty() {
                    let rest = rest.to_string();
                    self.advance();
                    let term = parse_term(&rest)?;
                    return Ok(Expr::Not(Box::new(Expr::Term(term))));
                }
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, Fault> {
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(Fault::validation("unmatched '(' in search query")),
                }
            }
            Some(Token::Word(w)) => Ok(Expr::Term(parse_term(w)?)),
            Some(Token::RParen) => Err(Fault::validation("unexpected ')' in search query")),
            Some(Token::And) | Some(Token::Or) | Some(Token::Not) => {
                Err(Fault::validation("unexpected operator in search query"))
            }
            None => Err(Fault::validation("unexpected end of search query")),
        }
    }
}

fn parse_term(raw: &str) -> Result<Term, Fault> {
    if raw.is_empty() {
        return Err(Fault::validation("empty search term"));
    }
    let (field, rest) = match raw.split_once(':') {
        Some((prefix, rest)) if !rest.is_empty() => match Field::from_prefix(prefix) {
            Some(field) => (Some(field), rest),
            None => (None, raw),
        },
        _ => (None, raw),
    };

    if let Some(inner) = rest.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        if inner.is_empty() {
            return Err(Fault::validation("empty quoted phrase in search query"));
        }
        return Ok(Term {
            field,
            text: inner.to_string(),
            phrase: true,
        });
    }

    Ok(Term {
        field,
        text: rest.to_string(),
        phrase: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(field: Option<Field>, text: &str) -> Expr {
        Expr::Term(Term {
            field,
            text: text.to_string(),
            phrase: false,
        })
    }

    #[test]
    fn single_bare_word() {
        assert_eq!(parse("login").unwrap(), term(None, "login"));
    }

    #[test]
    fn field_prefixed_term() {
        assert_eq!(parse("title:login").unwrap(), term(Some(Field::Title), "login"));
    }

    #[test]
    fn implicit_and_between_adjacent_tokens() {
        let expr = parse("login bug").unwrap();
        assert_eq!(expr, Expr::And(Box::new(term(None, "login")), Box::new(term(None, "bug"))));
    }

    #[test]
    fn explicit_and_or() {
        let expr = parse("title:login OR title:logout").unwrap();
        assert_eq!(
            expr,
            Expr::Or(
                Box::new(term(Some(Field::Title), "login")),
                Box::new(term(Some(Field::Title), "logout"))
            )
        );
    }

    #[test]
    fn dash_negation_and_not_keyword_are_equivalent() {
        let dash = parse("title:login AND -fix").unwrap();
        let kw = parse("title:login AND NOT fix").unwrap();
        assert_eq!(dash, kw);
    }

    #[test]
    fn not_binds_tighter_than_and_which_binds_tighter_than_or() {
        // a AND NOT b OR c  =>  (a AND (NOT b)) OR c
        let expr = parse("a AND NOT b OR c").unwrap();
        let expected = Expr::Or(
            Box::new(Expr::And(Box::new(term(None, "a")), Box::new(Expr::Not(Box::new(term(None, "b")))))),
            Box::new(term(None, "c")),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse("(title:login OR title:logout) AND -content:fix").unwrap();
        let expected = Expr::And(
            Box::new(Expr::Or(
                Box::new(term(Some(Field::Title), "login")),
                Box::new(term(Some(Field::Title), "logout")),
            )),
            Box::new(Expr::Not(Box::new(term(Some(Field::Content), "fix")))),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn quoted_phrase_passes_through() {
        let expr = parse("\"login bug\"").unwrap();
        match expr {
            Expr::Term(t) => {
                assert!(t.phrase);
                assert_eq!(t.text, "login bug");
            }
            other => panic!("expected a term, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_paren_is_rejected() {
        assert!(parse("(title:login").is_err());
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(parse("   ").is_err());
    }

    #[test]
    fn positive_terms_excludes_negated_terms() {
        let expr = parse("title:login AND -fix").unwrap();
        let texts: Vec<&str> = expr.positive_terms().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["login"]);
    }

    #[test]
    fn positive_terms_collects_both_sides_of_or() {
        let expr = parse("(login OR logout) AND NOT crash").unwrap();
        let texts: Vec<&str> = expr.positive_terms().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["login", "logout"]);
    }
}
