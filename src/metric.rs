use crate::error::{Error, Result};
use crate::rouge::{rouge_l_score, rouge_n_score, PairScore};
use crate::utils::Sequence;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_METRICS: &[Metric] = &[Metric::RougeN(2)];

/// A metric identifier the evaluator knows how to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Clipped n-gram overlap of order `n`.
    RougeN(usize),
    /// Longest common token subsequence.
    RougeL,
}

impl Metric {
    /// Scores pre-tokenized sequences. Texts that are blank score zero for
    /// every metric, whatever the order.
    pub fn score(&self, pred: &Sequence, gold: &Sequence) -> PairScore {
        if pred.n_words == 0 || gold.n_words == 0 {
            return PairScore::default();
        }
        match *self {
            Metric::RougeN(n) => rouge_n_score(pred, gold, n),
            Metric::RougeL => rouge_l_score(pred, gold),
        }
    }

    pub fn precision_key(&self) -> String {
        format!("avg_{}_precision", self)
    }

    pub fn recall_key(&self) -> String {
        format!("avg_{}_recall", self)
    }

    pub fn f1_key(&self) -> String {
        format!("avg_{}_f1", self)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::RougeN(n) => write!(f, "rouge-{}", n),
            Metric::RougeL => write!(f, "rouge-l"),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        let order = lowered
            .strip_prefix("rouge-")
            .ok_or_else(|| Error::UnknownMetric(s.to_string()))?;
        if order == "l" {
            return Ok(Metric::RougeL);
        }
        match order.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Metric::RougeN(n)),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a list of identifiers, dropping repeats after their first occurrence.
pub fn parse_metrics<S: AsRef<str>>(names: &[S]) -> Result<Vec<Metric>> {
    let mut metrics: Vec<Metric> = Vec::with_capacity(names.len());
    for name in names {
        let metric: Metric = name.as_ref().parse()?;
        if !metrics.contains(&metric) {
            metrics.push(metric);
        }
    }
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rouge_n() {
        assert_eq!("rouge-2".parse::<Metric>().unwrap(), Metric::RougeN(2));
        assert_eq!("ROUGE-1".parse::<Metric>().unwrap(), Metric::RougeN(1));
        assert_eq!(" rouge-4 ".parse::<Metric>().unwrap(), Metric::RougeN(4));
    }

    #[test]
    fn test_parse_rouge_l() {
        assert_eq!("rouge-l".parse::<Metric>().unwrap(), Metric::RougeL);
        assert_eq!("Rouge-L".parse::<Metric>().unwrap(), Metric::RougeL);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for bad in ["bleu", "rouge-0", "rouge-", "rouge-x", "rouge2", ""] {
            let err = bad.parse::<Metric>().unwrap_err();
            assert!(matches!(err, Error::UnknownMetric(_)), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_display_round_trips_identifier() {
        assert_eq!(Metric::RougeN(2).to_string(), "rouge-2");
        assert_eq!(Metric::RougeL.to_string(), "rouge-l");
    }

    #[test]
    fn test_result_keys() {
        let metric = Metric::RougeN(2);
        assert_eq!(metric.precision_key(), "avg_rouge-2_precision");
        assert_eq!(metric.recall_key(), "avg_rouge-2_recall");
        assert_eq!(metric.f1_key(), "avg_rouge-2_f1");
    }

    #[test]
    fn test_parse_metrics_dedups_in_order() {
        let metrics = parse_metrics(&["rouge-l", "rouge-2", "ROUGE-L"]).unwrap();
        assert_eq!(metrics, vec![Metric::RougeL, Metric::RougeN(2)]);
    }

    #[test]
    fn test_metric_from_toml_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            metrics: Vec<Metric>,
        }
        let parsed: Wrapper = toml::from_str(r#"metrics = ["rouge-1", "rouge-l"]"#).unwrap();
        assert_eq!(parsed.metrics, vec![Metric::RougeN(1), Metric::RougeL]);
    }
}
