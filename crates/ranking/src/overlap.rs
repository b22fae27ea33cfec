//! Tag and author overlap between two papers
//!
//! Tags are compared exactly (they are normalized on the way in). Authors are
//! compared loosely: two fragments match when either one, lowercased, is a
//! substring of the other. "J. Smith" does not match "John Smith" but "Smith"
//! matches both, and short names over-match ("Li" matches "Lin"). The loose
//! match is the intended behaviour.

use crate::paper::PaperRecord;
use serde::Serialize;

/// Evidence shared by a target paper and a candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub shared_tags: Vec<String>,
    pub shared_authors: Vec<String>,
}

impl Overlap {
    /// Shared tags and authors, reported from the target's side
    pub fn between(target: &PaperRecord, candidate: &PaperRecord) -> Self {
        Self {
            shared_tags: shared_tags(&target.tags, &candidate.tags),
            shared_authors: shared_authors(&target.author_list(), &candidate.author_list()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shared_tags.is_empty() && self.shared_authors.is_empty()
    }
}

/// Split a comma-separated author string into trimmed, non-empty fragments
///
/// Empty fragments (`"A, , B"`) are dropped on purpose: an empty name would
/// substring-match every author and make unrelated papers look co-authored.
pub fn split_authors(authors: &str) -> Vec<String> {
    authors
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

/// Tags of `a` that also appear in `b`, in `a`'s order
pub fn shared_tags(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|tag| b.contains(tag)).cloned().collect()
}

/// Case-insensitive containment in either direction
pub fn authors_match(x: &str, y: &str) -> bool {
    let x = x.to_lowercase();
    let y = y.to_lowercase();
    x.contains(&y) || y.contains(&x)
}

/// Fragments of `a` that match at least one fragment of `b`
///
/// Repeated names in `a` are reported as often as they occur.
pub fn shared_authors(a: &[String], b: &[String]) -> Vec<String> {
    let b_lower: Vec<String> = b.iter().map(|author| author.to_lowercase()).collect();

    a.iter()
        .filter(|author| {
            let author = author.to_lowercase();
            b_lower
                .iter()
                .any(|other| other.contains(&author) || author.contains(other.as_str()))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::Rng;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_shared_tags_exact() {
        let a = strings(&["zkp", "crypto", "mpc"]);
        let b = strings(&["mpc", "privacy", "zkp"]);
        assert_eq!(shared_tags(&a, &b), strings(&["zkp", "mpc"]));
        assert!(shared_tags(&a, &[]).is_empty());
        assert!(shared_tags(&strings(&["crypto"]), &strings(&["cryptography"])).is_empty());
    }

    #[test]
    fn test_author_substring_match() {
        assert!(authors_match("Smith", "John Smith"));
        assert!(authors_match("john smith", "John Smith"));
        assert!(!authors_match("J. Smith", "John Smith"));
        // Known over-match on short names
        assert!(authors_match("Li", "Lin Zhou"));
    }

    #[test]
    fn test_shared_authors_reports_a_side() {
        let a = strings(&["Alice Smith", "Bob", "Carol Diaz"]);
        let b = strings(&["alice smith", "Bobby Tables"]);
        assert_eq!(shared_authors(&a, &b), strings(&["Alice Smith", "Bob"]));
    }

    #[test]
    fn test_shared_authors_keeps_duplicates() {
        let a = strings(&["Alice", "Alice"]);
        let b = strings(&["Alice Smith"]);
        assert_eq!(shared_authors(&a, &b), strings(&["Alice", "Alice"]));
    }

    #[test]
    fn test_split_authors_drops_empty_fragments() {
        assert_eq!(split_authors(" A. Turing ,, Grace Hopper, "), strings(&["A. Turing", "Grace Hopper"]));
        assert!(split_authors("").is_empty());
    }

    #[test]
    fn test_blank_fragment_matches_nobody() {
        let a = split_authors("Alice, , Bob");
        assert_eq!(a, strings(&["Alice", "Bob"]));
        assert!(shared_authors(&a, &strings(&["Zed"])).is_empty());
    }

    #[test]
    fn test_author_matching_symmetric() {
        let pool = [
            "Alice Smith", "Smith", "alice", "Bob Li", "Li", "Lin", "Carol", "CAROL D", "Dan",
            "Erin O'Neil", "neil",
        ];
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let a: Vec<String> = (0..rng.gen_range(0..5))
                .map(|_| pool.choose(&mut rng).unwrap().to_string())
                .collect();
            let b: Vec<String> = (0..rng.gen_range(0..5))
                .map(|_| pool.choose(&mut rng).unwrap().to_string())
                .collect();

            let mut forward: Vec<(String, String)> = Vec::new();
            for x in &a {
                for y in &b {
                    if authors_match(x, y) {
                        forward.push((x.clone(), y.clone()));
                    }
                }
            }
            let mut backward: Vec<(String, String)> = Vec::new();
            for y in &b {
                for x in &a {
                    if authors_match(y, x) {
                        backward.push((x.clone(), y.clone()));
                    }
                }
            }
            forward.sort();
            backward.sort();
            assert_eq!(forward, backward);

            // Either side finds a match exactly when the other does
            assert_eq!(
                shared_authors(&a, &b).is_empty(),
                shared_authors(&b, &a).is_empty()
            );

            // Reordering B does not change which fragments of A are flagged
            let mut shuffled = b.clone();
            shuffled.shuffle(&mut rng);
            assert_eq!(shared_authors(&a, &b), shared_authors(&a, &shuffled));
        }
    }

    #[test]
    fn test_overlap_between_papers() {
        use crate::paper::fixtures::paper;

        let target = paper(1, 0, 0, &["zkp", "crypto"], Some("Alice Smith, Bob"));
        let candidate = paper(2, 0, 0, &["zkp", "privacy"], Some("alice smith"));
        let overlap = Overlap::between(&target, &candidate);

        assert_eq!(overlap.shared_tags, strings(&["zkp"]));
        assert_eq!(overlap.shared_authors, strings(&["Alice Smith"]));
        assert!(!overlap.is_empty());

        let stranger = paper(3, 0, 0, &["biology"], None);
        assert!(Overlap::between(&target, &stranger).is_empty());
    }
}
