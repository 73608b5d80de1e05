use crate::error::Error;
use crate::report::format_report as render_report;
use crate::rouge::score_pair as rouge_n_pair;
use crate::score::{AggregateResult, Evaluator};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use tokio::runtime::Runtime;

fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::SizeMismatch { .. } | Error::EmptyBatch | Error::UnknownMetric(_) => {
            PyValueError::new_err(err.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

fn to_py_dict<'py>(py: Python<'py>, results: &AggregateResult) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (key, value) in results.iter() {
        dict.set_item(key, value)?;
    }
    Ok(dict)
}

#[pyfunction]
#[pyo3(signature = (reference, candidate, n = 2))]
fn score_pair<'py>(
    py: Python<'py>,
    reference: String,
    candidate: String,
    n: usize,
) -> PyResult<Bound<'py, PyDict>> {
    let score = py.allow_threads(|| rouge_n_pair(&reference, &candidate, n));
    let dict = PyDict::new(py);
    dict.set_item("precision", score.precision)?;
    dict.set_item("recall", score.recall)?;
    dict.set_item("f1", score.f1)?;
    Ok(dict)
}

#[pyfunction]
#[pyo3(signature = (references, candidates, metrics = None, workers = 1))]
fn evaluate_batch<'py>(
    py: Python<'py>,
    references: Vec<String>,
    candidates: Vec<String>,
    metrics: Option<Vec<String>>,
    workers: usize,
) -> PyResult<Bound<'py, PyDict>> {
    let evaluator = match metrics {
        Some(names) => Evaluator::from_names(&names).map_err(to_py_err)?,
        None => Evaluator::default(),
    };

    let results = py.allow_threads(|| {
        if workers <= 1 {
            return evaluator.evaluate(&references, &candidates).map_err(to_py_err);
        }
        let rt = Runtime::new().map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        rt.block_on(evaluator.evaluate_concurrent(references, candidates, workers))
            .map_err(to_py_err)
    })?;

    to_py_dict(py, &results)
}

#[pyfunction]
fn format_report(results: &Bound<'_, PyDict>) -> PyResult<String> {
    let mut aggregate = AggregateResult::default();
    for (key, value) in results.iter() {
        aggregate.insert(key.extract::<String>()?, value.extract::<f64>()?);
    }
    Ok(render_report(&aggregate))
}

#[pymodule]
fn summeval(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(score_pair, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_batch, m)?)?;
    m.add_function(wrap_pyfunction!(format_report, m)?)?;
    Ok(())
}
