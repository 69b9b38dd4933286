//! Duplicate detection between two record sets
//!
//! Semantics follow "concatenate, then mark repeats": over `a ++ b`, a row is
//! marked as duplicated when an equal key appeared earlier. Rows of `a` are
//! therefore only marked for repeats inside `a`; rows of `b` are marked for
//! repeats in `a` or earlier in `b`.

use std::borrow::Cow;

use rustc_hash::FxHashSet;

/// Duplicate masks for `a` and `b`, by position.
pub fn duplicated<K, A, B>(a: A, b: B) -> (Vec<bool>, Vec<bool>)
where
    K: AsRef<[u8]>,
    A: IntoIterator<Item = K>,
    B: IntoIterator<Item = K>,
{
    let mut seen: FxHashSet<Vec<u8>> = FxHashSet::default();
    let mut mark = |key: K| !seen.insert(key.as_ref().to_vec());
    let mask_a = a.into_iter().map(&mut mark).collect();
    let mask_b = b.into_iter().map(&mut mark).collect();
    (mask_a, mask_b)
}

/// Keeps the rows not marked by `mask`.
pub fn retain_unmarked<T>(rows: Vec<T>, mask: &[bool]) -> Vec<T> {
    rows.into_iter()
        .zip(mask)
        .filter(|(_, dup)| !**dup)
        .map(|(row, _)| row)
        .collect()
}

/// Drops duplicated rows from both sets, keyed by `key`.
pub fn drop_duplicates<T, F>(a: Vec<T>, b: Vec<T>, mut key: F) -> (Vec<T>, Vec<T>)
where
    F: for<'r> FnMut(&'r T) -> Cow<'r, [u8]>,
{
    let (mask_a, mask_b) = {
        let keys_a: Vec<Cow<'_, [u8]>> = a.iter().map(|row| key(row)).collect();
        let keys_b: Vec<Cow<'_, [u8]>> = b.iter().map(|row| key(row)).collect();
        duplicated(keys_a, keys_b)
    };
    (retain_unmarked(a, &mask_a), retain_unmarked(b, &mask_b))
}
