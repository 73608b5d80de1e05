use crate::error::{Error, Result};
use crate::metric::{parse_metrics, Metric, DEFAULT_METRICS};
use crate::rouge::PairScore;
use crate::utils::Sequence;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use tracing::debug;

/// Mean scores of a batch, keyed `avg_<metric>_{precision,recall,f1}`.
///
/// Entries keep insertion order: precision, recall, f1 per metric, metrics in
/// the order they were configured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    entries: Vec<(String, f64)>,
}

impl AggregateResult {
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for AggregateResult {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut result = AggregateResult::default();
        for (key, value) in iter {
            result.insert(key, value);
        }
        result
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One tokenized (reference, candidate) pair, scored for every metric.
pub struct PairContext {
    pred: Sequence,
    gold: Sequence,
}

impl PairContext {
    pub fn new(pred: Sequence, gold: Sequence) -> Self {
        PairContext { pred, gold }
    }

    pub fn from_str(reference: &str, candidate: &str) -> Self {
        PairContext {
            pred: Sequence::new(candidate),
            gold: Sequence::new(reference),
        }
    }

    pub fn scores(&self, metrics: &[Metric]) -> Vec<PairScore> {
        metrics
            .iter()
            .map(|metric| metric.score(&self.pred, &self.gold))
            .collect()
    }
}

/// Running per-metric sums. Partials from separate workers merge in any
/// order because the reduction is a plain sum.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTotals {
    sums: Vec<PairScore>,
    pairs: usize,
}

impl ScoreTotals {
    pub fn new(n_metrics: usize) -> Self {
        ScoreTotals {
            sums: vec![PairScore::default(); n_metrics],
            pairs: 0,
        }
    }

    pub fn add(&mut self, scores: &[PairScore]) {
        for (sum, score) in self.sums.iter_mut().zip(scores) {
            sum.precision += score.precision;
            sum.recall += score.recall;
            sum.f1 += score.f1;
        }
        self.pairs += 1;
    }

    pub fn merge(&mut self, other: &ScoreTotals) {
        for (sum, partial) in self.sums.iter_mut().zip(&other.sums) {
            sum.precision += partial.precision;
            sum.recall += partial.recall;
            sum.f1 += partial.f1;
        }
        self.pairs += other.pairs;
    }

    pub fn pairs(&self) -> usize {
        self.pairs
    }

    /// Divides every sum by the pair count.
    pub fn into_result(self, metrics: &[Metric]) -> Result<AggregateResult> {
        if self.pairs == 0 {
            return Err(Error::EmptyBatch);
        }
        let m = self.pairs as f64;
        let mut result = AggregateResult::default();
        for (metric, sum) in metrics.iter().zip(&self.sums) {
            result.insert(metric.precision_key(), sum.precision / m);
            result.insert(metric.recall_key(), sum.recall / m);
            result.insert(metric.f1_key(), sum.f1 / m);
        }
        Ok(result)
    }
}

fn check_shape(references: usize, candidates: usize) -> Result<()> {
    if references != candidates {
        return Err(Error::SizeMismatch {
            references,
            candidates,
        });
    }
    if references == 0 {
        return Err(Error::EmptyBatch);
    }
    Ok(())
}

/// Averages pair scores over a batch for a configured set of metrics.
#[derive(Debug, Clone)]
pub struct Evaluator {
    metrics: Vec<Metric>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator {
            metrics: DEFAULT_METRICS.to_vec(),
        }
    }
}

impl Evaluator {
    /// Repeated metrics keep their first position. With no metrics the
    /// batch is still shape-checked but the result has no entries.
    pub fn new(metrics: Vec<Metric>) -> Self {
        let mut unique: Vec<Metric> = Vec::with_capacity(metrics.len());
        for metric in metrics {
            if !unique.contains(&metric) {
                unique.push(metric);
            }
        }
        Evaluator { metrics: unique }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        Ok(Evaluator::new(parse_metrics(names)?))
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Sequential evaluation in input order.
    ///
    /// Fails with `SizeMismatch` when the batches differ in length and with
    /// `EmptyBatch` when both are empty. No partial result is returned.
    pub fn evaluate<S: AsRef<str>>(
        &self,
        references: &[S],
        candidates: &[S],
    ) -> Result<AggregateResult> {
        check_shape(references.len(), candidates.len())?;

        let mut totals = ScoreTotals::new(self.metrics.len());
        for (reference, candidate) in references.iter().zip(candidates) {
            let ctx = PairContext::from_str(reference.as_ref(), candidate.as_ref());
            totals.add(&ctx.scores(&self.metrics));
        }
        debug!(pairs = totals.pairs(), metrics = self.metrics.len(), "scored batch");
        totals.into_result(&self.metrics)
    }

    /// Splits the batch into contiguous chunks, scores each chunk on a
    /// blocking worker with its own accumulator, then merges the partials.
    pub async fn evaluate_concurrent(
        &self,
        references: Vec<String>,
        candidates: Vec<String>,
        workers: usize,
    ) -> Result<AggregateResult> {
        check_shape(references.len(), candidates.len())?;

        let m = references.len();
        let chunk_size = m.div_ceil(workers.clamp(1, m));
        let metrics: Arc<[Metric]> = self.metrics.clone().into();

        let mut pairs = references.into_iter().zip(candidates);
        let mut tasks = vec![];
        loop {
            let chunk: Vec<(String, String)> = pairs.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let metrics = Arc::clone(&metrics);
            tasks.push(tokio::task::spawn_blocking(move || {
                let mut totals = ScoreTotals::new(metrics.len());
                for (reference, candidate) in &chunk {
                    totals.add(&PairContext::from_str(reference, candidate).scores(&metrics));
                }
                totals
            }));
        }
        debug!(pairs = m, workers = tasks.len(), "scoring batch concurrently");

        let mut totals = ScoreTotals::new(self.metrics.len());
        for partial in futures::future::join_all(tasks).await {
            let partial = partial.map_err(|e| Error::Join(e.to_string()))?;
            totals.merge(&partial);
        }
        totals.into_result(&self.metrics)
    }
}

/// Batch entry point taking metric identifiers as strings.
pub fn evaluate_batch<S: AsRef<str>, M: AsRef<str>>(
    references: &[S],
    candidates: &[S],
    metrics: &[M],
) -> Result<AggregateResult> {
    Evaluator::from_names(metrics)?.evaluate(references, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rouge::score_pair;
    use tokio::runtime::Runtime;

    fn close_enough(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_size_mismatch() {
        let err = Evaluator::default()
            .evaluate(&["a b", "c d"], &["a b"])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                references: 2,
                candidates: 1
            }
        ));
    }

    #[test]
    fn test_empty_batch_is_an_error() {
        let empty: [&str; 0] = [];
        let err = Evaluator::default().evaluate(&empty, &empty).unwrap_err();
        assert!(matches!(err, Error::EmptyBatch));
    }

    #[test]
    fn test_default_metric_keys_in_order() {
        let result = Evaluator::default()
            .evaluate(&["the cat sat on the mat"], &["the cat sat on a mat"])
            .unwrap();
        let keys: Vec<&str> = result.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["avg_rouge-2_precision", "avg_rouge-2_recall", "avg_rouge-2_f1"]
        );
        assert!(close_enough(result.get("avg_rouge-2_f1").unwrap(), 0.6, 1e-9));
    }

    #[test]
    fn test_identical_pairs_average_to_pair_score() {
        let reference = "the quick brown fox jumps over the lazy dog";
        let candidate = "the quick brown dog jumps over the fox";
        let pair = score_pair(reference, candidate, 2);

        let refs = vec![reference; 5];
        let cands = vec![candidate; 5];
        let result = Evaluator::default().evaluate(&refs, &cands).unwrap();

        assert!(close_enough(result.get("avg_rouge-2_precision").unwrap(), pair.precision, 1e-12));
        assert!(close_enough(result.get("avg_rouge-2_recall").unwrap(), pair.recall, 1e-12));
        assert!(close_enough(result.get("avg_rouge-2_f1").unwrap(), pair.f1, 1e-12));
    }

    #[test]
    fn test_empty_pair_counts_as_zero_in_mean() {
        let result = Evaluator::default()
            .evaluate(&["the cat sat", "the cat sat"], &["the cat sat", ""])
            .unwrap();
        assert!(close_enough(result.get("avg_rouge-2_precision").unwrap(), 0.5, 1e-12));
        assert!(close_enough(result.get("avg_rouge-2_recall").unwrap(), 0.5, 1e-12));
    }

    #[test]
    fn test_metrics_follow_configured_order() {
        let evaluator = Evaluator::from_names(&["rouge-l", "rouge-1"]).unwrap();
        let result = evaluator.evaluate(&["a b c"], &["a b c"]).unwrap();
        let keys: Vec<&str> = result.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "avg_rouge-l_precision",
                "avg_rouge-l_recall",
                "avg_rouge-l_f1",
                "avg_rouge-1_precision",
                "avg_rouge-1_recall",
                "avg_rouge-1_f1",
            ]
        );
        assert!(result.iter().all(|(_, v)| v == 1.0));
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let err = evaluate_batch(&["a"], &["a"], &["bleu"]).unwrap_err();
        assert!(matches!(err, Error::UnknownMetric(name) if name == "bleu"));
    }

    #[test]
    fn test_default_evaluator_uses_rouge_2() {
        assert_eq!(Evaluator::default().metrics(), &[Metric::RougeN(2)]);
    }

    #[test]
    fn test_no_metrics_gives_empty_result() {
        let none: [&str; 0] = [];
        let result = evaluate_batch(&["the cat sat"], &["the cat sat"], &none).unwrap();
        assert!(result.is_empty());
        assert!(Evaluator::new(vec![]).metrics().is_empty());

        let rt = Runtime::new().expect("Failed to create async runtime");
        let concurrent = rt
            .block_on(Evaluator::new(vec![]).evaluate_concurrent(
                vec!["a b".to_string()],
                vec!["a b".to_string()],
                2,
            ))
            .unwrap();
        assert!(concurrent.is_empty());
    }

    #[test]
    fn test_no_metrics_still_checks_shape() {
        let none: [&str; 0] = [];
        let mismatch = evaluate_batch(&["a", "b"], &["a"], &none);
        assert!(matches!(mismatch, Err(Error::SizeMismatch { .. })));
        let empty: [&str; 0] = [];
        assert!(matches!(
            evaluate_batch(&empty, &empty, &none),
            Err(Error::EmptyBatch)
        ));
    }

    #[test]
    fn test_totals_merge() {
        let mut a = ScoreTotals::new(1);
        a.add(&[PairScore::from_counts(1, 2, 2)]);
        let mut b = ScoreTotals::new(1);
        b.add(&[PairScore::from_counts(2, 2, 2)]);
        b.add(&[PairScore::from_counts(0, 2, 2)]);
        a.merge(&b);
        assert_eq!(a.pairs(), 3);
        let result = a.into_result(&[Metric::RougeN(1)]).unwrap();
        assert!(close_enough(result.get("avg_rouge-1_precision").unwrap(), 0.5, 1e-12));
    }

    #[test]
    fn test_concurrent_matches_sequential() {
        let refs: Vec<String> = (0..23)
            .map(|i| format!("the study {} finds a strong link between media and views", i))
            .collect();
        let cands: Vec<String> = (0..23)
            .map(|i| format!("this study finds media {} is linked to extreme views", i % 4))
            .collect();
        let evaluator = Evaluator::from_names(&["rouge-1", "rouge-2", "rouge-l"]).unwrap();
        let sequential = evaluator.evaluate(&refs, &cands).unwrap();

        let rt = Runtime::new().expect("Failed to create async runtime");
        for workers in [1, 4, 64] {
            let concurrent = rt
                .block_on(evaluator.evaluate_concurrent(refs.clone(), cands.clone(), workers))
                .unwrap();
            assert_eq!(concurrent.len(), sequential.len());
            for ((k1, v1), (k2, v2)) in sequential.iter().zip(concurrent.iter()) {
                assert_eq!(k1, k2);
                assert!(close_enough(v1, v2, 1e-9), "{}: {} vs {}", k1, v1, v2);
            }
        }
    }

    #[test]
    fn test_concurrent_shape_errors() {
        let rt = Runtime::new().expect("Failed to create async runtime");
        let evaluator = Evaluator::default();
        let mismatch = rt.block_on(evaluator.evaluate_concurrent(
            vec!["a".to_string()],
            vec![],
            2,
        ));
        assert!(matches!(mismatch, Err(Error::SizeMismatch { .. })));
        let empty = rt.block_on(evaluator.evaluate_concurrent(vec![], vec![], 2));
        assert!(matches!(empty, Err(Error::EmptyBatch)));
    }

    #[test]
    fn test_aggregate_serializes_in_order() {
        let result: AggregateResult = vec![("b", 0.5), ("a", 0.25)].into_iter().collect();
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"b":0.5,"a":0.25}"#);
    }
}
