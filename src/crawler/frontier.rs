use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    pub score: i32,
}

impl Ord for FrontierEntry {
    /// Higher score first, then shallower depth, then smaller URL
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| other.url.cmp(&self.url))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Max-priority queue of URLs to visit
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: impl Into<String>, depth: u32, score: i32) {
        self.heap.push(FrontierEntry {
            url: url.into(),
            depth,
            score,
        });
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
