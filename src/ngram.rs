use crate::utils::Sequence;
use std::collections::HashMap;

pub type Ngram = Vec<String>;

/// Multiset of the n-grams of one document: n-gram -> occurrence count.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NgramCounts {
    counts: HashMap<Ngram, usize>,
    total: usize,
}

impl NgramCounts {
    /// Slides a width-`n` window over the tokens with stride 1. Fewer than `n`
    /// tokens (or `n == 0`) gives an empty multiset.
    pub fn from_tokens(word_vec: &[String], n: usize) -> Self {
        let mut ngram_counts = NgramCounts::default();
        if n == 0 || word_vec.len() < n {
            return ngram_counts;
        }
        for window in word_vec.windows(n) {
            *ngram_counts.counts.entry(window.to_vec()).or_insert(0) += 1;
            ngram_counts.total += 1;
        }
        ngram_counts
    }

    pub fn from_sequence(seq: &Sequence, n: usize) -> Self {
        Self::from_tokens(&seq.word_vector, n)
    }

    pub fn from_text(text: &str, n: usize) -> Self {
        Self::from_sequence(&Sequence::new(text), n)
    }

    pub fn get(&self, ngram: &[String]) -> usize {
        self.counts.get(ngram).copied().unwrap_or(0)
    }

    /// Number of distinct n-grams.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Multiset intersection size: every shared n-gram contributes the
    /// smaller of its two counts.
    pub fn clipped_overlap(&self, other: &NgramCounts) -> usize {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut matches: usize = 0;
        for (ng, count) in &small.counts {
            if let Some(other_count) = large.counts.get(ng) {
                matches += count.min(other_count);
            }
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grams(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_empty_text_has_no_ngrams() {
        for n in 1..=4 {
            let counts = NgramCounts::from_text("", n);
            assert!(counts.is_empty());
            assert_eq!(counts.total(), 0);
        }
    }

    #[test]
    fn test_fewer_tokens_than_order() {
        let counts = NgramCounts::from_text("only two", 3);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_zero_order_is_empty() {
        assert!(NgramCounts::from_text("the cat sat", 0).is_empty());
    }

    #[test]
    fn test_bigrams_of_sentence() {
        let counts = NgramCounts::from_text("the cat sat on the mat", 2);
        assert_eq!(counts.len(), 5);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.get(&grams("the cat")), 1);
        assert_eq!(counts.get(&grams("on the")), 1);
        assert_eq!(counts.get(&grams("the mat")), 1);
        assert_eq!(counts.get(&grams("cat the")), 0);
    }

    #[test]
    fn test_repeated_unigrams_are_counted() {
        let counts = NgramCounts::from_text("a a a b", 1);
        assert_eq!(counts.get(&grams("a")), 3);
        assert_eq!(counts.get(&grams("b")), 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_ngrams_use_normalized_tokens() {
        let counts = NgramCounts::from_text("The, CAT!", 2);
        assert_eq!(counts.get(&grams("the cat")), 1);
    }

    #[test]
    fn test_overlap_is_clipped() {
        let reference = NgramCounts::from_text("a a a", 1);
        let candidate = NgramCounts::from_text("a a", 1);
        assert_eq!(reference.clipped_overlap(&candidate), 2);
        assert_eq!(candidate.clipped_overlap(&reference), 2);
    }

    #[test]
    fn test_overlap_without_shared_ngrams() {
        let a = NgramCounts::from_text("cats sleep all day", 2);
        let b = NgramCounts::from_text("the quick brown fox", 2);
        assert_eq!(a.clipped_overlap(&b), 0);
    }
}
