//! Identifier extraction for running the classifiers over real source text.
//!
//! This is not a tokenizer: it only finds `[A-Za-z_][A-Za-z0-9_]*` runs,
//! stepping over number literals, quoted strings and comments so that their
//! contents are never reported as identifiers.

use std::ops::Range;

use crate::{classify::Classify, keyword::Keyword, utils::FxIndexMap};

const NAME_BODY: u8 = 1;
const NAME_START: u8 = 2;
const DIGIT: u8 = 4;
const QUOTE: u8 = 8;

const CLASS: [u8; 256] = {
    let mut lut = [0; 256];
    let mut byte = 0;
    while byte < 256 {
        let b = byte as u8;
        lut[byte] = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => NAME_START | NAME_BODY,
            b'0'..=b'9' => DIGIT | NAME_BODY,
            b'\'' | b'"' | b'`' => QUOTE,
            _ => 0,
        };
        byte += 1;
    }
    lut
};

#[inline]
fn is_name_body(byte: u8) -> bool {
    CLASS[byte as usize] & NAME_BODY > 0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident<'s> {
    pub span: Range<usize>,
    pub text: &'s [u8],
}

#[derive(Debug, Clone)]
pub struct Scanner<'s> {
    source: &'s [u8],
    pos: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s [u8]) -> Self {
        Scanner { source, pos: 0 }
    }

    #[inline]
    fn peek_at(&self, n: usize) -> Option<u8> {
        self.source.get(self.pos + n).copied()
    }

    #[inline]
    fn crunch_name(&mut self) {
        while self.peek_at(0).is_some_and(is_name_body) {
            self.pos += 1;
        }
    }

    fn skip_quoted(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(byte) = self.peek_at(0) {
            self.pos += 1;
            match byte {
                b'\\' => self.pos = (self.pos + 1).min(self.source.len()),
                _ if byte == quote => return,
                _ => (),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        match self.source[self.pos..].iter().position(|&b| b == b'\n') {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.source.len(),
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while self.pos < self.source.len() {
            if self.source[self.pos..].starts_with(b"*/") {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }
}

impl<'s> Iterator for Scanner<'s> {
    type Item = Ident<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let byte = self.peek_at(0)?;
            let class = CLASS[byte as usize];

            if class & NAME_START > 0 {
                let start = self.pos;
                self.pos += 1;
                self.crunch_name();
                return Some(Ident {
                    span: start..self.pos,
                    text: &self.source[start..self.pos],
                });
            }

            if class & DIGIT > 0 {
                self.crunch_name();
            } else if class & QUOTE > 0 {
                self.skip_quoted(byte);
            } else if byte == b'/' && self.peek_at(1) == Some(b'/') {
                self.skip_line_comment();
            } else if byte == b'/' && self.peek_at(1) == Some(b'*') {
                self.skip_block_comment();
            } else {
                self.pos += 1;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub span: Range<usize>,
    pub keyword: Keyword,
}

/// Every keyword in `source`, in source order.
pub fn occurrences(source: &[u8], classifier: &dyn Classify) -> Vec<Occurrence> {
    Scanner::new(source)
        .filter_map(|ident| {
            classifier.classify(ident.text).map(|keyword| Occurrence {
                span: ident.span,
                keyword,
            })
        })
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct Tally {
    pub identifiers: usize,
    pub keywords: usize,
    /// Per-keyword counts, in order of first appearance.
    pub counts: FxIndexMap<Keyword, usize>,
}

impl Tally {
    pub fn new(source: &[u8], classifier: &dyn Classify) -> Self {
        let mut tally = Tally::default();
        for ident in Scanner::new(source) {
            tally.identifiers += 1;
            if let Some(keyword) = classifier.classify(ident.text) {
                tally.keywords += 1;
                *tally.counts.entry(keyword).or_default() += 1;
            }
        }
        tally
    }

    /// Counts ordered from most to least frequent.
    pub fn ranked(&self) -> Vec<(Keyword, usize)> {
        let mut ranked: Vec<_> = self.counts.iter().map(|(&kw, &n)| (kw, n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Strategy;

    fn idents(source: &str) -> Vec<&str> {
        Scanner::new(source.as_bytes())
            .map(|ident| std::str::from_utf8(ident.text).unwrap())
            .collect()
    }

    #[test]
    fn finds_identifiers() {
        assert_eq!(
            idents("pub fn main() {\n\tmut x := 0x1f + y2\n}"),
            ["pub", "fn", "main", "mut", "x", "y2"]
        );
    }

    #[test]
    fn skips_literals_and_comments() {
        let source = r#"
            // fn in a comment
            s := 'for \' in'
            t := "if" /* struct
            union */ return
        "#;
        assert_eq!(idents(source), ["s", "t", "return"]);
    }

    #[test]
    fn unterminated_input() {
        assert_eq!(idents("a 'b c"), ["a"]);
        assert_eq!(idents("a /* b"), ["a"]);
        assert_eq!(idents("a \"\\"), ["a"]);
        assert!(idents("").is_empty());
    }

    #[test]
    fn spans_index_source() {
        let source = b"if x in xs";
        let found = occurrences(source, &Strategy::Hash);
        assert_eq!(
            found,
            [
                Occurrence {
                    span: 0..2,
                    keyword: Keyword::If,
                },
                Occurrence {
                    span: 5..7,
                    keyword: Keyword::In,
                },
            ]
        );
    }

    #[test]
    fn tallies() {
        let source = b"fn a() { return 1 }\nfn b() { return 2 }\nstruct S {}";
        let tally = Tally::new(source, &Strategy::Trie);
        assert_eq!(tally.identifiers, 8);
        assert_eq!(tally.keywords, 5);
        assert_eq!(
            tally.ranked(),
            [(Keyword::Fn, 2), (Keyword::Return, 2), (Keyword::Struct, 1)]
        );
    }
}
