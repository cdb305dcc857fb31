//! Length-dispatched trie classifier.
//!
//! Keywords are grouped by exact length. Each length gets a matcher that walks
//! the lexeme in fixed chunks (8, 4, 2 or 1 bytes, widest first) and compares
//! every chunk against packed constants derived from the keyword texts. No
//! chunk ever extends past the end of the lexeme.

use std::{fmt, sync::LazyLock};

use bitflags::bitflags;

use crate::{
    classify::Classify,
    keyword::{Keyword, KeywordEntry, KEYWORDS, MAX_LEN},
    mem_size::DeepSize,
    utils::{indenter::guided, FxIndexMap},
};

bitflags! {
    /// Multi-byte loads the matchers may use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LoadWidths: u8 {
        const WIDE_16 = 0b001;
        const WIDE_32 = 0b010;
        const WIDE_64 = 0b100;
    }
}

impl LoadWidths {
    /// Widths the target can load from any address.
    pub const fn native() -> Self {
        if cfg!(any(target_arch = "arm", feature = "bytewise")) {
            LoadWidths::empty()
        } else {
            LoadWidths::all()
        }
    }

    /// Chunk layout for a lexeme of `len` bytes.
    pub fn plan(self, len: usize) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut offset = 0;
        while offset < len {
            let width = Width::widest(self, len - offset);
            steps.push(Step {
                offset: offset as u8,
                width,
            });
            offset += width.bytes();
        }
        steps
    }
}

impl fmt::Display for LoadWidths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.iter_names()
                .map(|(name, _)| name)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Width {
    U8 = 1,
    U16 = 2,
    U32 = 4,
    U64 = 8,
}

impl Width {
    #[inline]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    fn widest(widths: LoadWidths, remaining: usize) -> Width {
        if remaining >= 8 && widths.contains(LoadWidths::WIDE_64) {
            Width::U64
        } else if remaining >= 4 && widths.contains(LoadWidths::WIDE_32) {
            Width::U32
        } else if remaining >= 2 && widths.contains(LoadWidths::WIDE_16) {
            Width::U16
        } else {
            Width::U8
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub offset: u8,
    pub width: Width,
}

impl Step {
    #[inline]
    fn load(self, lexeme: &[u8]) -> Option<u64> {
        let offset = self.offset as usize;
        match self.width {
            Width::U8 => read::<u8>(lexeme, offset).map(u64::from),
            Width::U16 => read::<u16>(lexeme, offset).map(u64::from),
            Width::U32 => read::<u32>(lexeme, offset).map(u64::from),
            Width::U64 => read::<u64>(lexeme, offset),
        }
    }

    fn pack(self, text: &[u8]) -> u64 {
        let start = self.offset as usize;
        pack_chunk(&text[start..start + self.width.bytes()])
    }
}

/// Packs up to eight bytes into the integer an unaligned native load of the
/// same bytes produces.
pub const fn pack_chunk(bytes: &[u8]) -> u64 {
    let bits = bytes.len() * 8;
    let mut packed = 0u64;
    let mut i = 0;
    while i < bytes.len() {
        let shift = if cfg!(target_endian = "little") {
            8 * i
        } else {
            bits - 8 - 8 * i
        };
        packed |= (bytes[i] as u64) << shift;
        i += 1;
    }
    packed
}

pub(crate) trait Chunk: Sized + Copy {
    const SIZE: usize;

    /// # Safety
    ///
    /// `ptr` must be valid for reads of `SIZE` bytes.
    unsafe fn from_ptr(ptr: *const u8) -> Self;
}

impl Chunk for u8 {
    const SIZE: usize = 1;

    #[inline]
    unsafe fn from_ptr(ptr: *const u8) -> Self {
        unsafe { *ptr }
    }
}

macro_rules! impl_chunk {
    ($($ty:ty),*) => {
        $(
            impl Chunk for $ty {
                const SIZE: usize = size_of::<$ty>();

                #[inline]
                unsafe fn from_ptr(ptr: *const u8) -> Self {
                    unsafe { ptr.cast::<$ty>().read_unaligned() }
                }
            }
        )*
    };
}

impl_chunk!(u16, u32, u64);

#[inline]
fn read<C: Chunk>(bytes: &[u8], offset: usize) -> Option<C> {
    if offset + (C::SIZE - 1) < bytes.len() {
        // # Safety: we just performed a bounds check.
        Some(unsafe { C::from_ptr(bytes.as_ptr().add(offset)) })
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy)]
enum Next {
    Node(u32),
    Match(Keyword),
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    chunk: u64,
    next: Next,
}

#[derive(Debug, Default)]
struct Node {
    /// Sorted by `chunk`.
    edges: Box<[Edge]>,
}

/// Decision tree for every keyword of one length. Node 0 is the root.
#[derive(Debug)]
pub struct LengthMatcher {
    len: usize,
    steps: Box<[Step]>,
    nodes: Box<[Node]>,
}

impl LengthMatcher {
    fn build(len: usize, entries: &[KeywordEntry], widths: LoadWidths) -> Self {
        let steps = widths.plan(len);
        let mut nodes = Vec::new();
        if let Some((&first, rest)) = steps.split_first() {
            build_node(first, rest, entries, &mut nodes);
        }

        LengthMatcher {
            len,
            steps: steps.into_boxed_slice(),
            nodes: nodes.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// `lexeme` must be exactly `self.len()` bytes long.
    #[inline]
    fn find(&self, lexeme: &[u8]) -> Option<Keyword> {
        debug_assert_eq!(lexeme.len(), self.len);

        let mut node = self.nodes.first()?;
        for step in self.steps.iter() {
            let chunk = step.load(lexeme)?;
            let idx = node
                .edges
                .binary_search_by_key(&chunk, |edge| edge.chunk)
                .ok()?;
            match node.edges[idx].next {
                Next::Match(keyword) => return Some(keyword),
                Next::Node(child) => node = &self.nodes[child as usize],
            }
        }

        None
    }

    fn write_node(&self, f: &mut dyn fmt::Write, node: usize, depth: usize) -> fmt::Result {
        let width = self.steps[depth].width.bytes();
        for edge in self.nodes[node].edges.iter() {
            let bytes = chunk_bytes(edge.chunk, width);
            match edge.next {
                Next::Match(keyword) => {
                    writeln!(f, "{bytes:?} => {keyword} ({})", keyword.code())?;
                }
                Next::Node(child) => {
                    writeln!(f, "{bytes:?}")?;
                    self.write_node(&mut guided(&mut *f), child as usize, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

fn build_node(step: Step, rest: &[Step], entries: &[KeywordEntry], nodes: &mut Vec<Node>) -> u32 {
    let id = nodes.len();
    nodes.push(Node::default());

    let mut groups: FxIndexMap<u64, Vec<KeywordEntry>> = FxIndexMap::default();
    for entry in entries {
        groups.entry(step.pack(entry.text)).or_default().push(*entry);
    }

    let mut edges: Vec<Edge> = groups
        .into_iter()
        .map(|(chunk, group)| {
            let next = match rest.split_first() {
                Some((&next_step, rest)) => {
                    Next::Node(build_node(next_step, rest, &group, nodes))
                }
                None => {
                    debug_assert_eq!(group.len(), 1, "duplicate keyword text");
                    Next::Match(group[0].kind)
                }
            };
            Edge { chunk, next }
        })
        .collect();
    edges.sort_unstable_by_key(|edge| edge.chunk);

    nodes[id].edges = edges.into_boxed_slice();
    id as u32
}

fn chunk_bytes(chunk: u64, width: usize) -> String {
    let bytes = chunk.to_ne_bytes();
    let bytes = if cfg!(target_endian = "little") {
        &bytes[..width]
    } else {
        &bytes[8 - width..]
    };
    String::from_utf8_lossy(bytes).into_owned()
}

impl fmt::Display for LengthMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "length {} [", self.len)?;
        for (idx, step) in self.steps.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}@{}", step.width.bytes(), step.offset)?;
        }
        f.write_str("]\n")?;
        if self.nodes.is_empty() {
            return Ok(());
        }
        self.write_node(&mut guided(f), 0, 0)
    }
}

impl DeepSize for Step {
    fn deep_size_of_children(&self) -> usize {
        0
    }
}

impl DeepSize for Edge {
    fn deep_size_of_children(&self) -> usize {
        0
    }
}

impl DeepSize for Node {
    fn deep_size_of_children(&self) -> usize {
        self.edges.deep_size_of_children()
    }
}

impl DeepSize for LengthMatcher {
    fn deep_size_of_children(&self) -> usize {
        self.steps.deep_size_of_children() + self.nodes.deep_size_of_children()
    }
}

pub struct TrieClassifier {
    widths: LoadWidths,
    by_len: [Option<LengthMatcher>; MAX_LEN + 1],
}

impl TrieClassifier {
    pub fn new(widths: LoadWidths) -> Self {
        let mut by_len: FxIndexMap<usize, Vec<KeywordEntry>> = FxIndexMap::default();
        for entry in KEYWORDS {
            by_len.entry(entry.len()).or_default().push(*entry);
        }

        TrieClassifier {
            widths,
            by_len: std::array::from_fn(|len| {
                by_len
                    .get(&len)
                    .map(|group| LengthMatcher::build(len, group, widths))
            }),
        }
    }

    /// Process-wide matcher using every load width the target supports.
    pub fn shared() -> &'static TrieClassifier {
        static SHARED: LazyLock<TrieClassifier> =
            LazyLock::new(|| TrieClassifier::new(LoadWidths::native()));
        &SHARED
    }

    /// Process-wide matcher that only compares single bytes.
    pub fn bytewise() -> &'static TrieClassifier {
        static BYTEWISE: LazyLock<TrieClassifier> =
            LazyLock::new(|| TrieClassifier::new(LoadWidths::empty()));
        &BYTEWISE
    }

    pub fn widths(&self) -> LoadWidths {
        self.widths
    }

    pub fn matchers(&self) -> impl Iterator<Item = &LengthMatcher> {
        self.by_len.iter().flatten()
    }
}

impl Classify for TrieClassifier {
    #[inline]
    fn classify(&self, lexeme: &[u8]) -> Option<Keyword> {
        self.by_len.get(lexeme.len())?.as_ref()?.find(lexeme)
    }
}

impl DeepSize for TrieClassifier {
    fn deep_size_of_children(&self) -> usize {
        self.by_len.iter().map(DeepSize::deep_size_of_children).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(widths: LoadWidths, len: usize) -> Vec<(u8, usize)> {
        widths
            .plan(len)
            .iter()
            .map(|step| (step.offset, step.width.bytes()))
            .collect()
    }

    #[test]
    fn plans_never_overread() {
        for widths in [
            LoadWidths::all(),
            LoadWidths::empty(),
            LoadWidths::WIDE_16,
            LoadWidths::WIDE_32 | LoadWidths::WIDE_16,
        ] {
            for len in 0..=MAX_LEN + 6 {
                let mut end = 0;
                for step in widths.plan(len) {
                    assert_eq!(step.offset as usize, end);
                    end += step.width.bytes();
                    assert!(end <= len, "{widths} overreads {len}");
                }
                assert_eq!(end, len);
            }
        }
    }

    #[test]
    fn widest_first() {
        let all = LoadWidths::all();
        assert_eq!(layout(all, 2), [(0, 2)]);
        assert_eq!(layout(all, 3), [(0, 2), (2, 1)]);
        assert_eq!(layout(all, 5), [(0, 4), (4, 1)]);
        assert_eq!(layout(all, 6), [(0, 4), (4, 2)]);
        assert_eq!(layout(all, 10), [(0, 8), (8, 2)]);
        assert_eq!(layout(LoadWidths::empty(), 3), [(0, 1), (1, 1), (2, 1)]);
        assert_eq!(layout(LoadWidths::WIDE_32, 6), [(0, 4), (4, 1), (5, 1)]);
    }

    #[test]
    fn packed_constants_match_loads() {
        for entry in KEYWORDS {
            for step in LoadWidths::all().plan(entry.len()) {
                assert_eq!(step.load(entry.text), Some(step.pack(entry.text)));
            }
        }
    }

    #[test]
    fn pack_is_endian_aware() {
        let packed = pack_chunk(b"brea");
        assert_eq!(packed, u32::from_ne_bytes(*b"brea") as u64);
        assert_eq!(pack_chunk(b"k"), b'k' as u64);
        assert_eq!(chunk_bytes(packed, 4), "brea");
    }

    #[test]
    fn reads_stay_in_bounds() {
        assert_eq!(read::<u32>(b"abc", 0), None);
        assert_eq!(read::<u16>(b"abc", 2), None);
        assert_eq!(read::<u8>(b"abc", 2), Some(b'c'));
    }

    #[test]
    fn finds_every_keyword() {
        for widths in [LoadWidths::all(), LoadWidths::empty(), LoadWidths::WIDE_16] {
            let trie = TrieClassifier::new(widths);
            for entry in KEYWORDS {
                assert_eq!(trie.classify(entry.text), Some(entry.kind), "{widths}");
            }
        }
    }

    #[test]
    fn rejects_near_misses() {
        let trie = TrieClassifier::shared();
        for probe in [
            &b"fo"[..],
            b"form",
            b"FN",
            b"Unsafe",
            b"structx",
            b"breaK",
            b"continuE",
            b"__offsetoF",
            b"_unlikely",
            b"abcdefg",
        ] {
            assert_eq!(trie.classify(probe), None, "{probe:?}");
        }
    }

    #[test]
    fn sparse_length_dispatch() {
        let trie = TrieClassifier::shared();
        let lens: Vec<_> = trie.matchers().map(LengthMatcher::len).collect();
        assert_eq!(lens, [2, 3, 4, 5, 6, 8, 9, 10]);
        assert_eq!(trie.classify(&[]), None);
        assert_eq!(trie.classify(&[b'a'; MAX_LEN + 5]), None);
    }

    #[test]
    fn bytewise_has_no_wide_steps() {
        let trie = TrieClassifier::bytewise();
        assert!(trie
            .matchers()
            .flat_map(|m| m.steps().iter())
            .all(|step| step.width == Width::U8));
    }

    #[test]
    fn footprint_counts_every_edge() {
        let trie = TrieClassifier::new(LoadWidths::all());
        let edges: usize = trie
            .matchers()
            .flat_map(|m| m.nodes.iter())
            .map(|node| node.edges.len())
            .sum();
        let steps: usize = trie.matchers().map(|m| m.steps().len()).sum();
        let nodes: usize = trie.matchers().map(|m| m.nodes.len()).sum();

        assert_eq!(
            trie.deep_size_of_children(),
            edges * size_of::<Edge>() + steps * size_of::<Step>() + nodes * size_of::<Node>()
        );
        assert_eq!(
            trie.deep_size_of(),
            size_of::<TrieClassifier>() + trie.deep_size_of_children()
        );
    }

    #[test]
    fn renders_tree() {
        let trie = TrieClassifier::new(LoadWidths::all());
        let matcher = trie.matchers().find(|m| m.len() == 9).unwrap();
        let expected = "length 9 [8@0 1@8]\n\
                        │   \"interfac\"\n\
                        │   │   \"e\" => interface (86)\n\
                        │   \"isreftyp\"\n\
                        │   │   \"e\" => isreftype (99)\n";
        assert_eq!(matcher.to_string(), expected);
    }
}
