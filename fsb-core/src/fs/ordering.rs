//! ``src/fs/ordering.rs``
//!
//! # Entry ordering
//!
//! Listing order is two-class: names without a leading dot first, dot-prefixed
//! names (the `..` parent marker included) after them. Within a class names
//! compare case-insensitively. The remaining tie-breaks only exist to make the
//! order total, which keeps sorting idempotent and lets binary search land on
//! the exact entry.

use std::cmp::Ordering;

use crate::fs::entry::Entry;
use crate::util::paths::split_extension;

/// Slices at or below this length are finished with insertion sort.
const INSERTION_THRESHOLD: usize = 12;

/// `strcasecmp` semantics: ASCII case folded, byte-wise.
#[must_use]
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Borrowed sort key for an entry or a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameKey<'a> {
    pub name: &'a str,
    pub extension: &'a str,
    /// `notes.` as opposed to `notes`.
    pub dotted: bool,
}

impl<'a> NameKey<'a> {
    #[must_use]
    pub fn of(entry: &'a Entry) -> Self {
        Self {
            name: entry.name(),
            extension: entry.extension().unwrap_or(""),
            dotted: entry.has_extension_dot(),
        }
    }

    /// Key of an on-disk file name, split the way file entries are.
    #[must_use]
    pub fn of_file_name(file_name: &'a str) -> Self {
        let (name, extension) = split_extension(file_name);
        Self {
            name,
            extension: extension.unwrap_or(""),
            dotted: extension.is_some(),
        }
    }

    #[inline]
    fn dot_class(&self) -> bool {
        self.name.starts_with('.')
    }

    /// Class, then case-insensitive name, then case-insensitive extension.
    #[must_use]
    pub fn cmp_folded(&self, other: &Self) -> Ordering {
        self.dot_class()
            .cmp(&other.dot_class())
            .then_with(|| cmp_ignore_case(self.name, other.name))
            .then_with(|| cmp_ignore_case(self.extension, other.extension))
    }

    /// Total order: the folded order, then exact bytes.
    #[must_use]
    pub fn cmp_exact(&self, other: &Self) -> Ordering {
        self.cmp_folded(other)
            .then_with(|| self.name.cmp(other.name))
            .then_with(|| self.extension.cmp(other.extension))
            .then_with(|| self.dotted.cmp(&other.dotted))
    }
}

/// Comparator applied to both the directory and the file collection.
#[must_use]
pub fn entry_order(a: &Entry, b: &Entry) -> Ordering {
    NameKey::of(a)
        .cmp_exact(&NameKey::of(b))
        .then_with(|| a.explicit_directory().cmp(&b.explicit_directory()))
}

/// Sorts `entries` in place with [`entry_order`].
pub fn sort_entries(entries: &mut [Entry]) {
    quicksort_by(entries, &mut entry_order);
}

/// In-place partition quicksort.
///
/// Recurses into the smaller partition and loops on the larger one, so the
/// stack depth stays logarithmic in the slice length.
pub fn quicksort_by<T, F>(mut v: &mut [T], cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    while v.len() > INSERTION_THRESHOLD {
        let mid = partition(v, cmp);
        let (left, rest) = std::mem::take(&mut v).split_at_mut(mid);
        let right = &mut rest[1..];

        if left.len() < right.len() {
            quicksort_by(left, cmp);
            v = right;
        } else {
            quicksort_by(right, cmp);
            v = left;
        }
    }
    insertion_sort(v, cmp);
}

/// Lomuto partition around a median-of-three pivot; returns the pivot's
/// final position.
fn partition<T, F>(v: &mut [T], cmp: &mut F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let last = v.len() - 1;
    let mid = last / 2;

    if cmp(&v[mid], &v[0]) == Ordering::Less {
        v.swap(mid, 0);
    }
    if cmp(&v[last], &v[0]) == Ordering::Less {
        v.swap(last, 0);
    }
    if cmp(&v[last], &v[mid]) == Ordering::Less {
        v.swap(last, mid);
    }
    // median now sits at `mid`; park it at the end
    v.swap(mid, last);

    let mut store = 0;
    for i in 0..last {
        if cmp(&v[i], &v[last]) == Ordering::Less {
            v.swap(i, store);
            store += 1;
        }
    }
    v.swap(store, last);
    store
}

fn insertion_sort<T, F>(v: &mut [T], cmp: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && cmp(&v[j], &v[j - 1]) == Ordering::Less {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, ext: &str) -> Entry {
        Entry::file(name, ext, None, false)
    }

    fn names(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(Entry::display_name).collect()
    }

    #[test]
    fn case_insensitive_compare() {
        assert_eq!(cmp_ignore_case("ABC", "abc"), Ordering::Equal);
        assert_eq!(cmp_ignore_case("a", "B"), Ordering::Less);
        assert_eq!(cmp_ignore_case("b", "A"), Ordering::Greater);
        assert_eq!(cmp_ignore_case("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn dot_names_follow_everything_else() {
        let mut entries = vec![
            Entry::directory("..", None),
            Entry::directory("zeta", None),
            Entry::directory(".config", None),
            Entry::directory("Alpha", None),
        ];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), ["Alpha", "zeta", "..", ".config"]);
    }

    #[test]
    fn files_sort_case_insensitively() {
        let mut entries = vec![file("b", "txt"), file("A", "TXT"), file("c", "png")];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), ["A.TXT", "b.txt", "c.png"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut entries: Vec<Entry> = (0..200)
            .map(|i| {
                let name = format!("{}{}", if i % 7 == 0 { "." } else { "" }, (i * 37) % 101);
                file(&name, if i % 2 == 0 { "png" } else { "PNG" })
            })
            .collect();

        sort_entries(&mut entries);
        let first = names(&entries);
        sort_entries(&mut entries);
        assert_eq!(names(&entries), first);

        let first_dot = entries.iter().position(|e| e.name().starts_with('.')).unwrap();
        assert!(entries[first_dot..].iter().all(|e| e.name().starts_with('.')));
        assert!(entries[..first_dot].iter().all(|e| !e.name().starts_with('.')));
    }

    #[test]
    fn quicksort_matches_std_sort() {
        let mut data: Vec<u32> = (0..500).map(|i| (i * 7919) % 613).collect();
        let mut expected = data.clone();
        expected.sort_unstable();

        quicksort_by(&mut data, &mut |a: &u32, b: &u32| a.cmp(b));
        assert_eq!(data, expected);
    }

    #[test]
    fn quicksort_handles_tiny_and_equal_inputs() {
        let mut empty: Vec<u8> = Vec::new();
        quicksort_by(&mut empty, &mut |a: &u8, b: &u8| a.cmp(b));
        assert!(empty.is_empty());

        let mut same = vec![3u8; 40];
        quicksort_by(&mut same, &mut |a: &u8, b: &u8| a.cmp(b));
        assert!(same.iter().all(|&x| x == 3));
    }
}
