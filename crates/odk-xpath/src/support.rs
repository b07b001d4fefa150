//! Randomness and ordering helpers shared by the function table.
use crate::model::XPathNode;
use core::cmp::Ordering;
use core::fmt::Write as _;

const PM_MODULUS: i64 = 2_147_483_647;
const PM_MULTIPLIER: i64 = 16_807;

/// Park–Miller minimal standard generator. Seeded shuffles must reproduce
/// across platforms, so this is used instead of any library PRNG.
#[derive(Debug, Clone)]
pub struct ParkMiller {
    state: i64,
}

impl ParkMiller {
    /// `seed` must be a finite integer value.
    pub fn new(seed: f64) -> Self {
        let mut state = (seed % PM_MODULUS as f64) as i64;
        if state <= 0 {
            state += PM_MODULUS - 1;
        }
        Self { state }
    }

    pub fn next_u31(&mut self) -> i64 {
        self.state = self.state * PM_MULTIPLIER % PM_MODULUS;
        self.state
    }

    /// Uniform in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        (self.next_u31() - 1) as f64 / (PM_MODULUS - 1) as f64
    }
}

/// Durstenfeld shuffle walking from the back. With a seed the permutation is
/// a pure function of `(items.len(), seed)`.
pub fn shuffle<T: Clone>(items: &[T], seed: Option<f64>) -> Vec<T> {
    let mut out = items.to_vec();
    let mut next: Box<dyn FnMut() -> f64> = match seed {
        Some(seed) => {
            let mut rng = ParkMiller::new(seed);
            Box::new(move || rng.next_float())
        }
        None => Box::new(fastrand::f64),
    };
    for i in (1..out.len()).rev() {
        let j = (next() * (i + 1) as f64).floor() as usize;
        out.swap(i, j.min(i));
    }
    out
}

/// Opaque hex token of exactly `len` characters.
pub fn random_token(len: usize) -> String {
    let mut out = String::with_capacity(len.saturating_add(16));
    while out.len() < len {
        let _ = write!(out, "{:016x}", fastrand::u64(..));
    }
    out.truncate(len);
    out
}

/// Pairwise document order. Nodes of different trees compare `Equal`; use
/// [`sort_document_order`] to order a mixed set.
pub fn document_order_compare<N: XPathNode>(a: &N, b: &N) -> Ordering {
    a.compare_document_order(b).unwrap_or(Ordering::Equal)
}

fn root_of<N: XPathNode>(node: &N) -> N {
    let mut cur = node.clone();
    while let Some(parent) = cur.parent() {
        cur = parent;
    }
    cur
}

/// Tree index of every node, trees numbered by first appearance in `nodes`.
pub(crate) fn tree_ranks<N: XPathNode>(nodes: &[N]) -> Vec<usize> {
    let mut roots: Vec<N> = Vec::new();
    nodes
        .iter()
        .map(|n| {
            let root = root_of(n);
            roots.iter().position(|r| *r == root).unwrap_or_else(|| {
                roots.push(root);
                roots.len() - 1
            })
        })
        .collect()
}

/// Host order where it exists; otherwise whole trees by rank.
pub(crate) fn compare_ranked<N: XPathNode>(
    a: &N,
    rank_a: usize,
    b: &N,
    rank_b: usize,
) -> Ordering {
    a.compare_document_order(b)
        .unwrap_or_else(|_| rank_a.cmp(&rank_b))
}

/// Stable in-place sort into document order. Trees the host cannot order
/// against each other keep the order of their first node in `nodes`.
pub fn sort_document_order<N: XPathNode>(nodes: &mut [N]) {
    let ranks = tree_ranks(nodes);
    let mut keyed: Vec<(usize, N)> = ranks.into_iter().zip(nodes.iter().cloned()).collect();
    keyed.sort_by(|(ra, a), (rb, b)| compare_ranked(a, *ra, b, *rb));
    for (slot, (_, n)) in nodes.iter_mut().zip(keyed) {
        *slot = n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shuffled(seed: f64) -> String {
        let letters: Vec<char> = "ABCDEF".chars().collect();
        shuffle(&letters, Some(seed)).into_iter().collect()
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        assert_eq!(shuffled(42.0), "BDFECA");
        assert_eq!(shuffled(-42.0), "EDACBF");
        assert_eq!(shuffled(1.0), "ECBDFA");
        assert_eq!(shuffled(11_111_111.0), "ADBCEF");
        assert_eq!(shuffled(42.0), shuffled(42.0));
    }

    #[test]
    fn unseeded_shuffle_is_a_permutation() {
        let items: Vec<u32> = (0..50).collect();
        let mut out = shuffle(&items, None);
        out.sort_unstable();
        assert_eq!(out, items);
    }

    #[test]
    fn token_length_and_alphabet() {
        for len in [0, 1, 16, 17, 40] {
            let t = random_token(len);
            assert_eq!(t.len(), len);
            assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_ne!(random_token(32), random_token(32));
    }
}
