//! Deterministic listing order for collections of backups (SPEC_FULL §4.1).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches a trailing 14-digit timestamp suffix, e.g. `-20210101010101`.
    static ref TIMESTAMP_SUFFIX_RE: Regex = Regex::new(r"-(\d{14})$").unwrap();
}

/// Splits `name` into `(prefix, suffix)` if it ends in a 14-digit
/// timestamp suffix; `prefix` is everything before the trailing `-`.
fn split_suffix(name: &str) -> Option<(&str, &str)> {
    let m = TIMESTAMP_SUFFIX_RE.find(name)?;
    let prefix = &name[..m.start()];
    let suffix = &name[m.start() + 1..];
    Some((prefix, suffix))
}

/// Sort `names` by the rule in SPEC_FULL §4.1: names sharing a common
/// prefix followed by a 14-digit timestamp suffix are grouped by that
/// prefix and ordered newest-suffix-first within the group; everything
/// else (and ties) falls back to ascending lexical order on the full
/// name. Stable: equal keys preserve input order.
///
/// Implemented as decorate-sort-undecorate rather than a pairwise
/// comparator: a name with a recognized suffix sorts by
/// `(prefix, suffix descending)`, a name without one sorts by
/// `(name, "")`. Comparing full names directly (as a pairwise
/// comparator keyed on *pairs* of inputs would) is not transitive,
/// since whether two names are "in the same group" depends on both of
/// them at once; sorting on a single precomputed key per name is.
pub fn sort_names(names: &mut [String]) {
    let mut decorated: Vec<(SortKey, String)> =
        names.iter().map(|n| (sort_key(n), n.clone())).collect();
    decorated.sort_by(|a, b| a.0.cmp(&b.0));
    for (slot, (_, name)) in names.iter_mut().zip(decorated) {
        *slot = name;
    }
}

type SortKey = (String, std::cmp::Reverse<String>);

fn sort_key(name: &str) -> SortKey {
    match split_suffix(name) {
        Some((prefix, suffix)) => (prefix.to_string(), std::cmp::Reverse(suffix.to_string())),
        None => (name.to_string(), std::cmp::Reverse(String::new())),
    }
}

/// Same as [`sort_names`] but returns a new, sorted `Vec` and leaves
/// the input untouched.
pub fn sorted<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = names.into_iter().map(str::to_string).collect();
    sort_names(&mut out);
    out
}
