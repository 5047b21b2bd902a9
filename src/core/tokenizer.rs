//! XML tokenizer
//!
//! Pull-style tokenizer that extracts XML tokens from a byte slice:
//! start/end/empty tags, text content, CDATA sections, comments,
//! processing instructions, the XML declaration, and DOCTYPE declarations.
//!
//! The tokenizer is strict: any markup that is not well-formed XML 1.0
//! stops tokenization with a `ParseError`. There is no recovery mode —
//! the facade contract requires malformed documents to be rejected.

use super::entities::{decode_text, validate_chars};
use super::scanner::Scanner;
use std::borrow::Cow;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: `<element>`
    StartTag,
    /// Element end tag: `</element>`
    EndTag,
    /// Empty element: `<element/>`
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: `<![CDATA[...]]>`
    CData,
    /// Comment: `<!--...-->`
    Comment,
    /// Processing instruction: `<?target ...?>`
    ProcessingInstruction,
    /// XML declaration: `<?xml ...?>`
    XmlDeclaration,
    /// DOCTYPE declaration (skipped, no DTD processing)
    DocType,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags and PIs: the name
    pub name: Option<&'a [u8]>,
    /// For text/CDATA/comments: the content (owned if entities were decoded)
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token { kind, span, name: None, content: None }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }
}

/// A well-formedness violation, with the byte offset where it was detected
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError { message: message.into(), position }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer { scanner: Scanner::new(input) }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::new(message, self.scanner.position()))
    }

    /// Get the next token, or None at end of input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        if self.scanner.is_eof() {
            return Ok(None);
        }

        match self.scanner.peek() {
            Some(b'<') => self.parse_markup().map(Some),
            Some(_) => self.parse_text().map(Some),
            None => Ok(None),
        }
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(1); // '<'

        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
            None => self.error("'<' at end of input"),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let name = match self.scanner.read_name() {
            Some(name) => name,
            None => return self.error("invalid element name"),
        };

        let Some(end) = self.scanner.find_tag_end_quoted() else {
            return Err(ParseError::new(
                format!("unclosed tag '<{}'", String::from_utf8_lossy(name)),
                start,
            ));
        };

        let is_empty = self.scanner.slice(start, end).ends_with(b"/");
        self.scanner.set_position(end + 1);

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, (start, end + 1)).with_name(name))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // '/'

        let name = match self.scanner.read_name() {
            Some(name) => name,
            None => return self.error("invalid element name in end tag"),
        };

        // Only whitespace may follow the name
        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            Some(b'>') => {
                self.scanner.advance(1);
                Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name))
            }
            Some(_) => self.error("end tag cannot have attributes"),
            None => Err(ParseError::new(
                format!("unclosed end tag '</{}'", String::from_utf8_lossy(name)),
                start,
            )),
        }
    }

    /// Parse markup starting with '<!' (comment, CDATA, DOCTYPE)
    fn parse_bang_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // '!'

        if self.scanner.starts_with(b"--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.parse_cdata(start)
        } else if self.scanner.starts_with(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            self.error("invalid declaration, expected comment, CDATA, or DOCTYPE")
        }
    }

    /// Parse a comment `<!--...-->`
    fn parse_comment(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(2); // '--'
        let content_start = self.scanner.position();

        loop {
            let Some(pos) = self.scanner.find_byte(b'-') else {
                return Err(ParseError::new("unterminated comment", start));
            };
            self.scanner.set_position(pos);

            if self.scanner.starts_with(b"-->") {
                let content = self.scanner.slice(content_start, pos);
                validate_comment(content).map_err(|msg| ParseError::new(msg, content_start))?;
                validate_chars(content).map_err(|msg| ParseError::new(msg, content_start))?;
                self.scanner.advance(3);
                return Ok(Token::new(TokenKind::Comment, (start, self.scanner.position()))
                    .with_content(Cow::Borrowed(content)));
            }
            if self.scanner.starts_with(b"--") {
                return self.error("comment cannot contain '--'");
            }
            self.scanner.advance(1);
        }
    }

    /// Parse a CDATA section `<![CDATA[...]]>`
    fn parse_cdata(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(7); // '[CDATA['
        let content_start = self.scanner.position();

        loop {
            let Some(pos) = self.scanner.find_byte(b']') else {
                return Err(ParseError::new("unterminated CDATA section", start));
            };
            self.scanner.set_position(pos);

            if self.scanner.starts_with(b"]]>") {
                let content = self.scanner.slice(content_start, pos);
                validate_chars(content).map_err(|msg| ParseError::new(msg, content_start))?;
                self.scanner.advance(3);
                return Ok(Token::new(TokenKind::CData, (start, self.scanner.position()))
                    .with_content(Cow::Borrowed(content)));
            }
            self.scanner.advance(1);
        }
    }

    /// Skip over a DOCTYPE declaration, tracking quotes and the internal subset
    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(7); // 'DOCTYPE'

        let mut in_internal_subset = false;
        let mut in_string = false;
        let mut string_char = 0u8;

        while let Some(b) = self.scanner.peek() {
            if in_string {
                if b == string_char {
                    in_string = false;
                }
                self.scanner.advance(1);
                continue;
            }
            match b {
                b'"' | b'\'' => {
                    in_string = true;
                    string_char = b;
                    self.scanner.advance(1);
                }
                b'[' => {
                    in_internal_subset = true;
                    self.scanner.advance(1);
                }
                b']' => {
                    in_internal_subset = false;
                    self.scanner.advance(1);
                }
                b'>' if !in_internal_subset => {
                    self.scanner.advance(1);
                    return Ok(Token::new(TokenKind::DocType, (start, self.scanner.position())));
                }
                _ => self.scanner.advance(1),
            }
        }
        Err(ParseError::new("unterminated DOCTYPE declaration", start))
    }

    /// Parse a processing instruction `<?target ...?>`
    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // '?'

        let name = match self.scanner.read_name() {
            Some(name) => name,
            None => return self.error("invalid processing instruction target"),
        };

        // The target 'xml' is reserved for the declaration, exact lowercase only
        let is_xml_decl = name == b"xml";
        if !is_xml_decl && name.eq_ignore_ascii_case(b"xml") {
            return self.error("processing instruction target cannot be 'xml'");
        }

        // Whitespace or '?>' must follow the target
        match self.scanner.peek() {
            Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {}
            Some(b'?') if self.scanner.peek_at(1) == Some(b'>') => {}
            Some(_) => return self.error("invalid character after PI target"),
            None => return Err(ParseError::new("unterminated processing instruction", start)),
        }

        loop {
            let Some(pos) = self.scanner.find_byte(b'?') else {
                return Err(ParseError::new("unterminated processing instruction", start));
            };
            self.scanner.set_position(pos);

            if self.scanner.starts_with(b"?>") {
                self.scanner.advance(2);
                let kind = if is_xml_decl {
                    TokenKind::XmlDeclaration
                } else {
                    TokenKind::ProcessingInstruction
                };
                return Ok(Token::new(kind, (start, self.scanner.position())).with_name(name));
            }
            self.scanner.advance(1);
        }
    }

    /// Parse text content up to the next '<'
    fn parse_text(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(start + self.scanner.remaining().len());

        let content = self.scanner.slice(start, end);
        validate_cdata_end(content).map_err(|msg| ParseError::new(msg, start))?;
        let decoded = decode_text(content).map_err(|msg| ParseError::new(msg, start))?;

        self.scanner.set_position(end);
        Ok(Token::new(TokenKind::Text, (start, end)).with_content(decoded))
    }
}

/// Comment content cannot contain '--' or end with '-'
fn validate_comment(content: &[u8]) -> Result<(), String> {
    if content.windows(2).any(|w| w == b"--") {
        return Err("comment cannot contain '--'".to_string());
    }
    if content.last() == Some(&b'-') {
        return Err("comment cannot end with '-'".to_string());
    }
    Ok(())
}

/// ']]>' is not allowed in character data outside CDATA sections
fn validate_cdata_end(content: &[u8]) -> Result<(), String> {
    if content.windows(3).any(|w| w == b"]]>") {
        return Err("text content cannot contain ']]>'".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(input: &[u8]) -> Result<Vec<TokenKind>, ParseError> {
        let mut tokenizer = Tokenizer::new(input);
        let mut kinds = Vec::new();
        while let Some(token) = tokenizer.next_token()? {
            kinds.push(token.kind);
        }
        Ok(kinds)
    }

    #[test]
    fn test_simple_element() {
        let kinds = all_tokens(b"<root>hello</root>").unwrap();
        assert_eq!(kinds, vec![TokenKind::StartTag, TokenKind::Text, TokenKind::EndTag]);
    }

    #[test]
    fn test_empty_element() {
        let kinds = all_tokens(b"<br/>").unwrap();
        assert_eq!(kinds, vec![TokenKind::EmptyTag]);
    }

    #[test]
    fn test_cdata() {
        let kinds = all_tokens(b"<s><![CDATA[a < b]]></s>").unwrap();
        assert_eq!(kinds, vec![TokenKind::StartTag, TokenKind::CData, TokenKind::EndTag]);
    }

    #[test]
    fn test_comment_and_pi() {
        let kinds = all_tokens(b"<!-- note --><?pi data?><r/>").unwrap();
        assert_eq!(
            kinds,
            vec![TokenKind::Comment, TokenKind::ProcessingInstruction, TokenKind::EmptyTag]
        );
    }

    #[test]
    fn test_xml_declaration() {
        let kinds = all_tokens(b"<?xml version=\"1.0\"?><r/>").unwrap();
        assert_eq!(kinds, vec![TokenKind::XmlDeclaration, TokenKind::EmptyTag]);
    }

    #[test]
    fn test_doctype_skipped() {
        let kinds = all_tokens(b"<!DOCTYPE r [<!ELEMENT r EMPTY>]><r/>").unwrap();
        assert_eq!(kinds, vec![TokenKind::DocType, TokenKind::EmptyTag]);
    }

    #[test]
    fn test_unclosed_tag() {
        assert!(all_tokens(b"<root attr=\"x\"").is_err());
    }

    #[test]
    fn test_double_dash_in_comment() {
        assert!(all_tokens(b"<!-- a -- b --><r/>").is_err());
    }

    #[test]
    fn test_end_tag_with_attributes() {
        assert!(all_tokens(b"<a></a attr=\"x\">").is_err());
    }

    #[test]
    fn test_cdata_end_in_text() {
        assert!(all_tokens(b"<a>b]]>c</a>").is_err());
    }

    #[test]
    fn test_reserved_pi_target() {
        assert!(all_tokens(b"<a><?XML data?></a>").is_err());
    }
}
