//! Exhaustive self-test of the classifiers against the keyword table.

use std::fmt;

use rand::{rngs::StdRng, Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::{
    classify::{Classify, Strategy},
    hash::{self, SlotFault},
    keyword::{Keyword, TokenCode, KEYWORDS, MAX_LEN},
    utils::FxIndexSet,
};

const RANDOM_PROBES: usize = 4096;
const DEFAULT_SEED: u64 = 0x6b77_636c_6173_7321;

const NAME_START: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const NAME_BODY: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_0123456789";

/// Hand-picked near misses, always part of the corpus.
const NEAR_MISSES: &[&[u8]] = &[
    b"fo",
    b"form",
    b"FN",
    b"structx",
    b"Unsafe",
    b"_likely",
    b"__global_",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A keyword was not recognized as itself.
    Missing {
        strategy: Strategy,
        keyword: Keyword,
        got: Option<Keyword>,
    },
    /// A non-keyword was accepted.
    FalsePositive {
        strategy: Strategy,
        probe: Vec<u8>,
        got: Keyword,
    },
    /// Two strategies answered differently.
    Disagreement {
        probe: Vec<u8>,
        left: (Strategy, Option<Keyword>),
        right: (Strategy, Option<Keyword>),
    },
    Slot(SlotFault),
    DuplicateCode {
        code: TokenCode,
        first: Keyword,
        second: Keyword,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Missing {
                strategy,
                keyword,
                got,
            } => write!(
                f,
                "{strategy}: `{keyword}` classified as {}",
                describe(*got)
            ),
            Failure::FalsePositive {
                strategy,
                probe,
                got,
            } => write!(
                f,
                "{strategy}: `{}` accepted as `{got}`",
                String::from_utf8_lossy(probe)
            ),
            Failure::Disagreement { probe, left, right } => write!(
                f,
                "`{}`: {} says {}, {} says {}",
                String::from_utf8_lossy(probe),
                left.0,
                describe(left.1),
                right.0,
                describe(right.1)
            ),
            Failure::Slot(fault) => write!(f, "hash table: {fault}"),
            Failure::DuplicateCode {
                code,
                first,
                second,
            } => write!(f, "`{first}` and `{second}` share token code {code}"),
        }
    }
}

impl std::error::Error for Failure {}

fn describe(keyword: Option<Keyword>) -> String {
    match keyword {
        Some(keyword) => format!("`{keyword}` ({})", keyword.code()),
        None => "not a keyword".to_owned(),
    }
}

/// Linear scan of the keyword table; the ground truth every strategy is
/// compared against.
pub fn reference(lexeme: &[u8]) -> Option<Keyword> {
    KEYWORDS
        .iter()
        .find(|entry| entry.text == lexeme)
        .map(|entry| entry.kind)
}

/// Keywords, their near misses, boundary lengths and seeded random
/// identifiers. Deduplicated, in generation order.
pub fn probes(seed: u64) -> Vec<Vec<u8>> {
    let mut probes = FxIndexSet::default();

    probes.insert(Vec::new());
    probes.insert(vec![b'a'; MAX_LEN + 5]);
    probes.insert(vec![b'_'; MAX_LEN + 1]);
    for &byte in NAME_START {
        probes.insert(vec![byte]);
    }
    for &near in NEAR_MISSES {
        probes.insert(near.to_vec());
    }

    for entry in KEYWORDS {
        let text = entry.text;
        probes.insert(text.to_vec());
        probes.insert(text[1..].to_vec());
        for end in 1..text.len() {
            probes.insert(text[..end].to_vec());
        }
        for suffix in [b'x', b'_', b'0', b's'] {
            let mut longer = text.to_vec();
            longer.push(suffix);
            probes.insert(longer);
        }
        probes.insert(text.to_ascii_uppercase());
        let mut capitalized = text.to_vec();
        capitalized[0] = capitalized[0].to_ascii_uppercase();
        probes.insert(capitalized);

        for pos in 0..text.len() {
            for &byte in b"aeiostu_Z9" {
                let mut swapped = text.to_vec();
                swapped[pos] = byte;
                probes.insert(swapped);
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..RANDOM_PROBES {
        let len = rng.gen_range(1..=MAX_LEN + 2);
        let mut ident = Vec::with_capacity(len);
        ident.push(NAME_START[rng.gen_range(0..NAME_START.len())]);
        for _ in 1..len {
            ident.push(NAME_BODY[rng.gen_range(0..NAME_BODY.len())]);
        }
        probes.insert(ident);
    }

    probes.into_iter().collect()
}

#[derive(Debug, Default)]
pub struct Verification {
    pub probes: usize,
    pub failures: Vec<Failure>,
}

impl Verification {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn verify(strategies: &[Strategy]) -> Verification {
    verify_with_seed(strategies, DEFAULT_SEED)
}

pub fn verify_with_seed(strategies: &[Strategy], seed: u64) -> Verification {
    let mut failures = Vec::new();

    let mut codes: FxHashMap<TokenCode, Keyword> = FxHashMap::default();
    for keyword in Keyword::iter() {
        if let Some(&first) = codes.get(&keyword.code()) {
            failures.push(Failure::DuplicateCode {
                code: keyword.code(),
                first,
                second: keyword,
            });
        }
        codes.insert(keyword.code(), keyword);
    }

    failures.extend(hash::slot_faults(KEYWORDS).into_iter().map(Failure::Slot));

    for &strategy in strategies {
        for entry in KEYWORDS {
            let got = strategy.classify(entry.text);
            if got != Some(entry.kind) {
                failures.push(Failure::Missing {
                    strategy,
                    keyword: entry.kind,
                    got,
                });
            }
        }
    }

    let probes = probes(seed);
    for probe in &probes {
        let expected = reference(probe);
        let answers: Vec<_> = strategies
            .iter()
            .map(|&strategy| (strategy, strategy.classify(probe)))
            .collect();

        if expected.is_none() {
            for &(strategy, got) in &answers {
                if let Some(got) = got {
                    failures.push(Failure::FalsePositive {
                        strategy,
                        probe: probe.clone(),
                        got,
                    });
                }
            }
        }

        if let Some((&first, rest)) = answers.split_first() {
            for &other in rest {
                if other.1 != first.1 {
                    failures.push(Failure::Disagreement {
                        probe: probe.clone(),
                        left: first,
                        right: other,
                    });
                }
            }
        }
    }

    Verification {
        probes: probes.len(),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_strategies_pass() {
        let verification = verify(&Strategy::ALL);
        assert!(verification.is_ok(), "{:#?}", verification.failures);
        assert!(verification.probes > RANDOM_PROBES);
    }

    #[test]
    fn other_seeds_pass() {
        for seed in [0, 1, 0xdead_beef] {
            assert!(verify_with_seed(&Strategy::ALL, seed).is_ok());
        }
    }

    #[test]
    fn probes_cover_edge_cases() {
        let probes = probes(DEFAULT_SEED);
        for probe in [&b""[..], b"fo", b"form", b"FN", b"Fn", b"structx", b"nsafe", b"Unsafe"] {
            assert!(probes.iter().any(|p| p == probe), "{probe:?}");
        }
        for &near in NEAR_MISSES {
            assert_eq!(reference(near), None, "{near:?}");
        }
        assert!(probes.iter().any(|p| p.len() == MAX_LEN + 5));
    }

    #[test]
    fn probes_are_deterministic() {
        assert_eq!(probes(7), probes(7));
        assert_ne!(probes(7), probes(8));
    }

    #[test]
    fn reference_agrees_with_table() {
        assert_eq!(reference(b"volatile"), Some(Keyword::Volatile));
        assert_eq!(reference(b"volatil"), None);
    }

    #[test]
    fn failure_messages() {
        let failure = Failure::Disagreement {
            probe: b"fn".to_vec(),
            left: (Strategy::Hash, Some(Keyword::Fn)),
            right: (Strategy::Trie, None),
        };
        assert_eq!(
            failure.to_string(),
            "`fn`: hash says `fn` (79), trie says not a keyword"
        );

        let failure = Failure::FalsePositive {
            strategy: Strategy::Bytewise,
            probe: b"fnx".to_vec(),
            got: Keyword::Fn,
        };
        assert_eq!(failure.to_string(), "bytewise: `fnx` accepted as `fn`");

        let failure = Failure::Slot(SlotFault::Collision {
            slot: 7,
            first: Keyword::In,
            second: Keyword::Is,
        });
        assert_eq!(
            failure.to_string(),
            "hash table: `in` and `is` both hash to slot 7"
        );
    }
}
