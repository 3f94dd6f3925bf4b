//! In-place permutation of three parallel arrays.
//!
//! Rearranges `a`, `b`, `c` so that `a'[i] == a[perm[i]]` by following the
//! cycles of `perm`. Extra storage is one visited bit per slot plus a single
//! saved triple, so the arrays themselves are never duplicated.

/// Packed visited flags, one bit per slot.
#[derive(Debug)]
struct VisitedBits {
    words: Vec<u64>,
}

impl VisitedBits {
    fn new(len: usize) -> Self {
        Self {
            words: vec![0; (len + 63) / 64],
        }
    }

    #[inline]
    fn get(&self, i: usize) -> bool {
        self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    #[inline]
    fn set(&mut self, i: usize) {
        self.words[i / 64] |= 1u64 << (i % 64);
    }
}

/// Apply the gather permutation `perm` to three equal-length slices in place.
///
/// `perm` must be a bijection on `0..len`; this is not checked.
pub fn apply_permutation<A, B, C>(a: &mut [A], b: &mut [B], c: &mut [C], perm: &[usize])
where
    A: Copy,
    B: Copy,
    C: Copy,
{
    debug_assert_eq!(a.len(), perm.len());
    debug_assert_eq!(b.len(), perm.len());
    debug_assert_eq!(c.len(), perm.len());

    let mut visited = VisitedBits::new(perm.len());
    for start in 0..perm.len() {
        if visited.get(start) || perm[start] == start {
            continue;
        }

        let saved = (a[start], b[start], c[start]);
        let mut j = start;
        while perm[j] != start {
            visited.set(j);
            let next = perm[j];
            a[j] = a[next];
            b[j] = b[next];
            c[j] = c[next];
            j = next;
        }
        visited.set(j);
        a[j] = saved.0;
        b[j] = saved.1;
        c[j] = saved.2;
    }
}

/// Stateless entry point mirroring [`apply_permutation`] for callers that
/// prefer a type to pass around.
#[derive(Debug, Default, Clone, Copy)]
pub struct Permuter;

impl Permuter {
    #[inline]
    pub fn apply<A: Copy, B: Copy, C: Copy>(
        &self,
        a: &mut [A],
        b: &mut [B],
        c: &mut [C],
        perm: &[usize],
    ) {
        apply_permutation(a, b, c, perm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn permuted(perm: &[usize]) -> (Vec<u32>, Vec<u32>, Vec<f64>) {
        let n = perm.len();
        let mut a: Vec<u32> = (0..n as u32).collect();
        let mut b: Vec<u32> = (0..n as u32).map(|v| v * 10).collect();
        let mut c: Vec<f64> = (0..n).map(|v| v as f64 + 0.5).collect();
        apply_permutation(&mut a, &mut b, &mut c, perm);
        (a, b, c)
    }

    #[test]
    fn identity_leaves_arrays_untouched() {
        let (a, b, c) = permuted(&[0, 1, 2, 3]);
        assert_eq!(a, vec![0, 1, 2, 3]);
        assert_eq!(b, vec![0, 10, 20, 30]);
        assert_eq!(c, vec![0.5, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn simple_swap() {
        let (a, b, c) = permuted(&[1, 0]);
        assert_eq!(a, vec![1, 0]);
        assert_eq!(b, vec![10, 0]);
        assert_eq!(c, vec![1.5, 0.5]);
    }

    #[test]
    fn three_cycle() {
        let (a, _, _) = permuted(&[2, 0, 1]);
        assert_eq!(a, vec![2, 0, 1]);
    }

    #[test]
    fn multiple_disjoint_cycles() {
        let (a, b, _) = permuted(&[1, 0, 3, 4, 2, 5]);
        assert_eq!(a, vec![1, 0, 3, 4, 2, 5]);
        assert_eq!(b, vec![10, 0, 30, 40, 20, 50]);
    }

    #[test]
    fn reversal() {
        let (a, _, c) = permuted(&[4, 3, 2, 1, 0]);
        assert_eq!(a, vec![4, 3, 2, 1, 0]);
        assert_eq!(c, vec![4.5, 3.5, 2.5, 1.5, 0.5]);
    }

    #[test]
    fn visited_bits_pack_64_per_word() {
        let mut bits = VisitedBits::new(130);
        assert_eq!(bits.words.len(), 3);
        for i in [0, 63, 64, 129] {
            assert!(!bits.get(i));
            bits.set(i);
            assert!(bits.get(i));
        }
        assert!(!bits.get(1) && !bits.get(65) && !bits.get(128));
        assert_eq!(bits.words, vec![1 | 1 << 63, 1, 1 << 1]);
        assert!(VisitedBits::new(0).words.is_empty());
    }

    #[test]
    fn long_cycle_across_word_boundaries() {
        let perm: Vec<usize> = (0..200).map(|i| (i + 1) % 200).collect();
        let (a, _, _) = permuted(&perm);
        assert_eq!(a, perm.iter().map(|&p| p as u32).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input() {
        let (a, b, c) = permuted(&[]);
        assert!(a.is_empty() && b.is_empty() && c.is_empty());
    }

    fn arb_permutation() -> impl Strategy<Value = Vec<usize>> {
        (0usize..=1000).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    }

    proptest! {
        #[test]
        fn matches_naive_gather(perm in arb_permutation()) {
            let n = perm.len();
            let a: Vec<u32> = (0..n as u32).map(|v| v.wrapping_mul(7919)).collect();
            let b: Vec<i64> = (0..n as i64).map(|v| -v).collect();
            let c: Vec<f64> = (0..n).map(|v| v as f64 * 0.25).collect();

            let expected_a: Vec<u32> = perm.iter().map(|&p| a[p]).collect();
            let expected_b: Vec<i64> = perm.iter().map(|&p| b[p]).collect();
            let expected_c: Vec<f64> = perm.iter().map(|&p| c[p]).collect();

            let (mut a, mut b, mut c) = (a, b, c);
            Permuter.apply(&mut a, &mut b, &mut c, &perm);

            prop_assert_eq!(a, expected_a);
            prop_assert_eq!(b, expected_b);
            prop_assert_eq!(c, expected_c);
        }
    }
}
