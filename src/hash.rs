//! Hash-indexed keyword classifier.
//!
//! Each keyword owns one slot of a small table. The slot index is the lexeme
//! length plus per-byte weights of the first three bytes. The weights were
//! solved for exactly this keyword set; they are not a general purpose hash.

use std::fmt;

use crate::{
    classify::Classify,
    keyword::{bytes_eq, Keyword, KeywordEntry, KEYWORDS, MAX_LEN, MIN_LEN},
    mem_size::DeepSize,
};

pub const MIN_HASH: usize = 7;
pub const MAX_HASH: usize = 85;

pub(crate) const TABLE_LEN: usize = MAX_HASH + 1;

/// Weight for bytes that never occur in the first three bytes of a keyword.
const OUT_OF_SET: u8 = 86;

#[rustfmt::skip]
const ASSO_VALUES: [u8; 256] = {
    const X: u8 = OUT_OF_SET;
    [
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
    //  P  Q  R  S  T  U  V  W  X  Y  Z  [  \  ]  ^  _
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, 5, //
    //  `  a   b   c   d  e   f   g   h   i  j  k  l  m   n  o
        X, 10, 50, 35, 5, 25, 25, 35, 40, 5, X, X, 5, 25, 0, 15, //
    //  p   q  r  s  t  u  v  w  x  y   z   {  |  }  ~  DEL
        10, X, 5, 5, 0, 0, 5, X, X, 50, 40, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
        X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, X, //
    ]
};

/// Length seeded hash over at most the first three bytes.
#[inline]
pub const fn hash(lexeme: &[u8]) -> usize {
    let len = lexeme.len();
    let mut hval = len;
    if len >= 3 {
        hval += ASSO_VALUES[lexeme[2] as usize] as usize;
    }
    if len >= 2 {
        hval += ASSO_VALUES[lexeme[1] as usize] as usize;
    }
    if len >= 1 {
        hval += ASSO_VALUES[lexeme[0] as usize] as usize;
    }
    hval
}

const fn build_slots() -> [Option<KeywordEntry>; TABLE_LEN] {
    let mut slots = [None; TABLE_LEN];
    let mut min = usize::MAX;
    let mut max = 0;

    let mut i = 0;
    while i < KEYWORDS.len() {
        let entry = KEYWORDS[i];
        let key = hash(entry.text);
        if key < MIN_HASH || key > MAX_HASH {
            panic!("keyword hash outside MIN_HASH..=MAX_HASH");
        }
        if slots[key].is_some() {
            panic!("keyword hash collision, regenerate ASSO_VALUES");
        }
        slots[key] = Some(entry);

        if key < min {
            min = key;
        }
        if key > max {
            max = key;
        }
        i += 1;
    }

    if min != MIN_HASH || max != MAX_HASH {
        panic!("MIN_HASH/MAX_HASH do not match the keyword set");
    }

    slots
}

const fn build_lengths(slots: &[Option<KeywordEntry>; TABLE_LEN]) -> [u8; TABLE_LEN] {
    let mut lengths = [0; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        if let Some(entry) = slots[i] {
            lengths[i] = entry.text.len() as u8;
        }
        i += 1;
    }
    lengths
}

static SLOTS: [Option<KeywordEntry>; TABLE_LEN] = build_slots();
static LENGTHS: [u8; TABLE_LEN] = build_lengths(&build_slots());

#[derive(Debug, Default, Clone, Copy)]
pub struct HashClassifier;

impl HashClassifier {
    /// Occupied slots in table order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, &'static KeywordEntry)> {
        SLOTS
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|entry| (idx, entry)))
    }
}

impl Classify for HashClassifier {
    #[inline]
    fn classify(&self, lexeme: &[u8]) -> Option<Keyword> {
        let len = lexeme.len();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return None;
        }

        let key = hash(lexeme);
        if !(MIN_HASH..=MAX_HASH).contains(&key) {
            return None;
        }

        if LENGTHS[key] as usize != len {
            return None;
        }

        let entry = SLOTS[key].as_ref()?;
        (entry.text == lexeme).then_some(entry.kind)
    }
}

impl DeepSize for HashClassifier {
    fn deep_size_of_children(&self) -> usize {
        size_of_val(&ASSO_VALUES) + size_of_val(&SLOTS) + size_of_val(&LENGTHS)
    }
}

/// A keyword set that cannot be laid out in the slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFault {
    /// Two keywords route to the same slot.
    Collision {
        slot: usize,
        first: Keyword,
        second: Keyword,
    },
    /// A keyword hashes outside `MIN_HASH..=MAX_HASH`.
    OutOfRange { keyword: Keyword, hash: usize },
}

impl fmt::Display for SlotFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotFault::Collision {
                slot,
                first,
                second,
            } => write!(f, "`{first}` and `{second}` both hash to slot {slot}"),
            SlotFault::OutOfRange { keyword, hash } => write!(
                f,
                "`{keyword}` hashes to {hash}, outside {MIN_HASH}..={MAX_HASH}"
            ),
        }
    }
}

/// Re-derive slot assignment for `entries`, reporting every clash and every
/// hash that falls outside the table.
pub fn slot_faults(entries: &[KeywordEntry]) -> Vec<SlotFault> {
    let mut seen: [Option<Keyword>; TABLE_LEN] = [None; TABLE_LEN];
    let mut faults = Vec::new();

    for entry in entries {
        let key = hash(entry.text);
        if !(MIN_HASH..=MAX_HASH).contains(&key) {
            faults.push(SlotFault::OutOfRange {
                keyword: entry.kind,
                hash: key,
            });
            continue;
        }

        let slot = &mut seen[key];
        match slot {
            Some(first) if !bytes_eq(first.as_bytes(), entry.text) => {
                faults.push(SlotFault::Collision {
                    slot: key,
                    first: *first,
                    second: entry.kind,
                })
            }
            Some(_) => (),
            None => *slot = Some(entry.kind),
        }
    }

    faults
}
