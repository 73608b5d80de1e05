use crate::error::Result;
use crate::score::AggregateResult;

const HEADER: &str = "--- Evaluation Report ---";
const FOOTER: &str = "-------------------------";

/// Renders one `Title Cased Key: value` line per entry, values to four
/// decimals, between a fixed header and footer. Entry order is preserved.
pub fn format_report(results: &AggregateResult) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(results.len() + 2);
    lines.push(HEADER.to_string());
    for (key, value) in results.iter() {
        lines.push(format!("{}: {:.4}", title_case(&key.replace('_', " ")), value));
    }
    lines.push(FOOTER.to_string());
    lines.join("\n")
}

/// Upper-cases a letter that follows a non-letter and lower-cases the rest,
/// so `avg rouge-l f1` becomes `Avg Rouge-L F1`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

pub fn to_json(results: &AggregateResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Evaluator;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("avg rouge-2 precision"), "Avg Rouge-2 Precision");
        assert_eq!(title_case("avg rouge-l f1"), "Avg Rouge-L F1");
        assert_eq!(title_case("MIXED cAsE"), "Mixed Case");
    }

    #[test]
    fn test_report_layout() {
        let results: AggregateResult = vec![
            ("avg_rouge-2_precision", 0.6),
            ("avg_rouge-2_recall", 2.0 / 3.0),
            ("avg_rouge-2_f1", 0.123456),
        ]
        .into_iter()
        .collect();
        let report = format_report(&results);
        assert_eq!(
            report,
            "--- Evaluation Report ---\n\
             Avg Rouge-2 Precision: 0.6000\n\
             Avg Rouge-2 Recall: 0.6667\n\
             Avg Rouge-2 F1: 0.1235\n\
             -------------------------"
        );
    }

    #[test]
    fn test_report_of_empty_results_is_banner_only() {
        let report = format_report(&AggregateResult::default());
        assert_eq!(report, format!("{}\n{}", HEADER, FOOTER));
    }

    #[test]
    fn test_report_from_evaluation() {
        let results = Evaluator::default()
            .evaluate(&["the cat sat on the mat"], &["the cat sat on a mat"])
            .unwrap();
        let report = format_report(&results);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "Avg Rouge-2 Precision: 0.6000");
        assert_eq!(lines[3], "Avg Rouge-2 F1: 0.6000");
    }

    #[test]
    fn test_json_keeps_order() {
        let results: AggregateResult = vec![("z", 1.0), ("a", 0.0)].into_iter().collect();
        let json = to_json(&results).unwrap();
        assert!(json.find("\"z\"").unwrap() < json.find("\"a\"").unwrap());
    }
}
