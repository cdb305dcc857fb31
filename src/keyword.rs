use std::fmt;

/// Integer token code handed to the parser.
pub type TokenCode = i32;

/// Token code reported for lexemes outside the keyword set.
pub const NOT_FOUND: TokenCode = -1;

/// Shortest keyword length.
pub const MIN_LEN: usize = 2;
/// Longest keyword length.
pub const MAX_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordEntry {
    pub text: &'static [u8],
    pub kind: Keyword,
}

impl KeywordEntry {
    #[inline]
    pub const fn code(&self) -> TokenCode {
        self.kind.code()
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.text.len()
    }
}

macro_rules! keywords {
    ($($variant:ident = $code:literal => $text:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Keyword {
            $($variant = $code,)*
        }

        /// Every keyword in authoring order.
        pub const KEYWORDS: &[KeywordEntry] = &[
            $(KeywordEntry { text: $text, kind: Keyword::$variant },)*
        ];

        impl Keyword {
            #[inline]
            pub const fn as_bytes(self) -> &'static [u8] {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }

            pub const fn from_code(code: TokenCode) -> Option<Keyword> {
                match code {
                    $($code => Some(Keyword::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

keywords! {
    As = 67 => b"as",
    Asm = 68 => b"asm",
    Assert = 69 => b"assert",
    Atomic = 70 => b"atomic",
    Break = 71 => b"break",
    Const = 72 => b"const",
    Continue = 73 => b"continue",
    Defer = 74 => b"defer",
    Else = 75 => b"else",
    Enum = 76 => b"enum",
    False = 77 => b"false",
    For = 78 => b"for",
    Fn = 79 => b"fn",
    Global = 80 => b"__global",
    Go = 81 => b"go",
    Goto = 82 => b"goto",
    If = 83 => b"if",
    Import = 84 => b"import",
    In = 85 => b"in",
    Interface = 86 => b"interface",
    Is = 87 => b"is",
    Match = 88 => b"match",
    Module = 89 => b"module",
    Mut = 90 => b"mut",
    Nil = 91 => b"nil",
    Shared = 92 => b"shared",
    Lock = 93 => b"lock",
    RLock = 94 => b"rlock",
    None = 95 => b"none",
    Return = 96 => b"return",
    Select = 97 => b"select",
    Sizeof = 98 => b"sizeof",
    IsRefType = 99 => b"isreftype",
    Likely = 100 => b"_likely_",
    Unlikely = 101 => b"_unlikely_",
    Offsetof = 102 => b"__offsetof",
    Struct = 103 => b"struct",
    True = 104 => b"true",
    Type = 105 => b"type",
    Typeof = 106 => b"typeof",
    Dump = 107 => b"dump",
    Or = 108 => b"or",
    Union = 109 => b"union",
    Pub = 110 => b"pub",
    Static = 111 => b"static",
    Volatile = 112 => b"volatile",
    Unsafe = 113 => b"unsafe",
}

impl Keyword {
    #[inline]
    pub const fn code(self) -> TokenCode {
        self as TokenCode
    }

    pub fn as_str(self) -> &'static str {
        // keyword texts are ASCII literals
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn iter() -> impl ExactSizeIterator<Item = Keyword> {
        KEYWORDS.iter().map(|entry| entry.kind)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const fn bytes_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }

    let mut i = 0;
    while i < lhs.len() {
        if lhs[i] != rhs[i] {
            return false;
        }
        i += 1;
    }

    true
}

const _: () = {
    let mut i = 0;
    while i < KEYWORDS.len() {
        let entry = &KEYWORDS[i];
        if entry.len() < MIN_LEN || entry.len() > MAX_LEN {
            panic!("keyword length outside MIN_LEN..=MAX_LEN");
        }
        if !bytes_eq(entry.text, entry.kind.as_bytes()) {
            panic!("keyword entry text disagrees with its kind");
        }

        let mut j = i + 1;
        while j < KEYWORDS.len() {
            if bytes_eq(entry.text, KEYWORDS[j].text) {
                panic!("duplicate keyword text");
            }
            if entry.code() == KEYWORDS[j].code() {
                panic!("duplicate keyword code");
            }
            j += 1;
        }
        i += 1;
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for entry in KEYWORDS {
            assert_eq!(Keyword::from_code(entry.code()), Some(entry.kind));
            assert_eq!(entry.kind.as_bytes(), entry.text);
        }
        assert_eq!(Keyword::from_code(NOT_FOUND), None);
        assert_eq!(Keyword::from_code(66), None);
        assert_eq!(Keyword::from_code(114), None);
    }

    #[test]
    fn codes_are_dense_and_ordered() {
        assert_eq!(KEYWORDS.len(), 47);
        for (idx, entry) in KEYWORDS.iter().enumerate() {
            assert_eq!(entry.code(), 67 + idx as TokenCode, "{}", entry.kind);
        }
    }

    #[test]
    fn display() {
        assert_eq!(Keyword::Fn.to_string(), "fn");
        assert_eq!(Keyword::Offsetof.to_string(), "__offsetof");
        assert_eq!(Keyword::None.as_str(), "none");
    }

    #[test]
    fn lengths_cover_bounds() {
        let min = KEYWORDS.iter().map(KeywordEntry::len).min();
        let max = KEYWORDS.iter().map(KeywordEntry::len).max();
        assert_eq!(min, Some(MIN_LEN));
        assert_eq!(max, Some(MAX_LEN));
        assert!(KEYWORDS.iter().all(|entry| entry.len() != 7));
    }
}
