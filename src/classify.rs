use std::{fmt, str::FromStr};

use crate::{
    hash::HashClassifier,
    keyword::{Keyword, TokenCode, NOT_FOUND},
    trie::TrieClassifier,
};

/// Keyword recognition over a single identifier lexeme.
///
/// Implementations are pure: the answer depends only on the lexeme bytes, and
/// every implementation accepts exactly the same set with the same codes.
pub trait Classify: Sync {
    fn classify(&self, lexeme: &[u8]) -> Option<Keyword>;

    #[inline]
    fn token_code(&self, lexeme: &[u8]) -> TokenCode {
        self.classify(lexeme).map_or(NOT_FOUND, Keyword::code)
    }
}

impl<C: Classify + ?Sized> Classify for &C {
    #[inline]
    fn classify(&self, lexeme: &[u8]) -> Option<Keyword> {
        (**self).classify(lexeme)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    #[default]
    Hash,
    Trie,
    Bytewise,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Hash, Strategy::Trie, Strategy::Bytewise];

    pub fn classifier(self) -> &'static dyn Classify {
        match self {
            Strategy::Hash => &HashClassifier,
            Strategy::Trie => TrieClassifier::shared(),
            Strategy::Bytewise => TrieClassifier::bytewise(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Hash => "hash",
            Strategy::Trie => "trie",
            Strategy::Bytewise => "bytewise",
        }
    }
}

impl Classify for Strategy {
    #[inline]
    fn classify(&self, lexeme: &[u8]) -> Option<Keyword> {
        match self {
            Strategy::Hash => HashClassifier.classify(lexeme),
            Strategy::Trie => TrieClassifier::shared().classify(lexeme),
            Strategy::Bytewise => TrieClassifier::bytewise().classify(lexeme),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl fmt::Display for UnknownStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown strategy `{}`, expected one of: hash, trie, bytewise",
            self.0
        )
    }
}

impl std::error::Error for UnknownStrategy {}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|it| it.name() == s)
            .ok_or_else(|| UnknownStrategy(s.to_owned()))
    }
}

/// Classify with the default strategy.
#[inline]
pub fn classify(lexeme: &[u8]) -> Option<Keyword> {
    Strategy::default().classify(lexeme)
}
