use crate::ngram::NgramCounts;
use crate::utils::{is_blank, DPMatrix, Sequence};
use serde::{Deserialize, Serialize};

/// Precision, recall and F1 of one (reference, candidate) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl PairScore {
    /// Builds the triple from a match count and the two totals. A zero
    /// denominator resolves to 0.0 instead of NaN.
    pub fn from_counts(matches: usize, candidate_total: usize, reference_total: usize) -> Self {
        let matches = matches as f64;
        let precision = if candidate_total > 0 {
            matches / candidate_total as f64
        } else {
            0.0
        };
        let recall = if reference_total > 0 {
            matches / reference_total as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        PairScore {
            precision,
            recall,
            f1,
        }
    }
}

/// ROUGE-N of a candidate against a reference, straight from raw text.
///
/// Either side being empty or whitespace-only yields the all-zero triple.
pub fn score_pair(reference: &str, candidate: &str, n: usize) -> PairScore {
    if is_blank(reference) || is_blank(candidate) {
        return PairScore::default();
    }
    rouge_n_score(&Sequence::new(candidate), &Sequence::new(reference), n)
}

pub fn rouge_n_score(pred: &Sequence, gold: &Sequence, n: usize) -> PairScore {
    let pred_counts = NgramCounts::from_sequence(pred, n);
    let gold_counts = NgramCounts::from_sequence(gold, n);

    let overlap = pred_counts.clipped_overlap(&gold_counts);
    PairScore::from_counts(overlap, pred_counts.total(), gold_counts.total())
}

fn get_lcs(pred: &Sequence, gold: &Sequence) -> usize {
    // Add +1 to both rows and cols to accommodate the empty prefix
    // of the dynamic programming matrix
    let mut dp: DPMatrix = DPMatrix::new(pred.n_words + 1, gold.n_words + 1);
    for i in 1..=pred.n_words {
        for j in 1..=gold.n_words {
            // Off-by-one between dp and word vector indexing is intentional,
            // row/col 0 is the empty prefix
            if pred.word_vector[i - 1] == gold.word_vector[j - 1] {
                dp.set(i, j, dp.at(i - 1, j - 1) + 1)
            } else {
                // LCS keeps order but not contiguity, so skipping a word on
                // either side is allowed; take whichever is longer.
                dp.set(i, j, dp.at(i - 1, j).max(dp.at(i, j - 1)));
            }
        }
    }
    dp.at(pred.n_words, gold.n_words) as usize
}

/// ROUGE-L: precision/recall over the longest common token subsequence.
pub fn rouge_l_score(pred: &Sequence, gold: &Sequence) -> PairScore {
    if pred.n_words == 0 || gold.n_words == 0 {
        return PairScore::default();
    }
    let lcs_len = get_lcs(pred, gold);
    PairScore::from_counts(lcs_len, pred.n_words, gold.n_words)
}
