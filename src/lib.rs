mod mem_size;

pub mod classify;
pub mod cli;
pub mod driver;
pub mod error;
pub mod hash;
pub mod keyword;
pub mod scan;
pub mod trie;
pub mod utils;
pub mod verify;

pub use classify::{classify, Classify, Strategy};
pub use keyword::{Keyword, KeywordEntry, TokenCode, KEYWORDS, MAX_LEN, MIN_LEN, NOT_FOUND};
