//! Python extension module (`--features python`).

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::common_types::{Dataset, Record};
use crate::error::KnnError;
use crate::evaluate::{Misclassification, evaluate};
use crate::knn::{KnnClassifier, classify};
use crate::knn::distance::euclidean_distance;
use crate::split::{stratified_split, stratified_split_seeded};

type PyRecord = (Vec<f64>, String);

impl From<KnnError> for PyErr {
    fn from(err: KnnError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

/// Accepts `{'features': [...], 'label': '...'}` dicts or `([...], '...')` tuples.
fn extract_records(items: &Bound<'_, PyList>) -> PyResult<Vec<Record<f64>>> {
    let mut records = Vec::with_capacity(items.len());
    for item_py in items {
        if let Ok(dict) = item_py.downcast::<PyDict>() {
            let features_any = dict
                .get_item("features")?
                .ok_or_else(|| PyValueError::new_err("Missing 'features' key"))?;
            let label_any = dict
                .get_item("label")?
                .ok_or_else(|| PyValueError::new_err("Missing 'label' key"))?;
            records.push(Record::new(features_any.extract::<Vec<f64>>()?, label_any.extract::<String>()?));
        } else if let Ok((features, label)) = item_py.extract::<PyRecord>() {
            records.push(Record::new(features, label));
        } else {
            return Err(PyTypeError::new_err(
                "Records must be dictionaries {'features': [...], 'label': '...'} or tuples ([...], '...')",
            ));
        }
    }
    Ok(records)
}

fn into_py_records(records: Vec<Record<f64>>) -> Vec<PyRecord> {
    records.into_iter().map(|r| (r.features, r.label)).collect()
}

/// Calculates the Euclidean distance between two vectors of f64.
#[pyfunction]
#[pyo3(name = "euclidean_distance")]
fn euclidean_distance_py(a: Vec<f64>, b: Vec<f64>) -> PyResult<f64> {
    Ok(euclidean_distance(&a, &b)?)
}

/// Stratified split; returns `(training, testing)` as lists of `(features, label)`.
#[pyfunction]
#[pyo3(name = "stratified_split", signature = (records, testing_fraction = 0.8, seed = None))]
fn stratified_split_py(
    records: &Bound<'_, PyList>,
    testing_fraction: f64,
    seed: Option<u64>,
) -> PyResult<(Vec<PyRecord>, Vec<PyRecord>)> {
    let dataset = Dataset::new(extract_records(records)?)?;
    let split = match seed {
        Some(seed) => stratified_split_seeded(&dataset, testing_fraction, seed)?,
        None => stratified_split(&dataset, testing_fraction)?,
    };
    Ok((into_py_records(split.training), into_py_records(split.testing)))
}

#[pyfunction]
#[pyo3(name = "classify")]
fn classify_py(training: &Bound<'_, PyList>, query: Vec<f64>, k: usize) -> PyResult<String> {
    let training = extract_records(training)?;
    Ok(classify(&training, &query, k)?)
}

/// Runs the evaluation driver; misses are returned under the `misses` key.
#[pyfunction]
#[pyo3(name = "evaluate")]
fn evaluate_py<'py>(
    py: Python<'py>,
    training: &Bound<'py, PyList>,
    testing: &Bound<'py, PyList>,
    k: usize,
) -> PyResult<Bound<'py, PyDict>> {
    let training = extract_records(training)?;
    let testing = extract_records(testing)?;

    let mut misses: Vec<(usize, String, String)> = Vec::new();
    let mut sink = |miss: &Misclassification<'_>| {
        misses.push((miss.index, miss.actual.to_string(), miss.predicted.clone()))
    };
    let report = py.allow_threads(|| evaluate(&training, &testing, k, &mut sink))?;

    let result = PyDict::new_bound(py);
    result.set_item("total", report.total)?;
    result.set_item("training", report.training)?;
    result.set_item("testing", report.testing)?;
    result.set_item("hits", report.hits)?;
    result.set_item("accuracy", report.accuracy)?;
    result.set_item("misses", misses)?;
    Ok(result)
}

#[pyclass(name = "KnnClassifier")]
struct PyKnnClassifier {
    classifier: KnnClassifier<f64>,
}

#[pymethods]
impl PyKnnClassifier {
    #[new]
    #[pyo3(signature = (k = 10))]
    fn new(k: usize) -> Self {
        PyKnnClassifier {
            classifier: KnnClassifier::new(k),
        }
    }

    fn fit(&mut self, training_data_py: &Bound<'_, PyList>) -> PyResult<()> {
        let training_data = extract_records(training_data_py)?;
        self.classifier.fit(training_data)?;
        Ok(())
    }

    fn predict_single(&self, test_sample_features: Vec<f64>) -> PyResult<String> {
        Ok(self.classifier.predict_single(&test_sample_features)?)
    }

    fn predict(&self, py: Python<'_>, test_data: Vec<Vec<f64>>) -> PyResult<Vec<String>> {
        Ok(py.allow_threads(|| self.classifier.predict(&test_data))?)
    }

    #[getter]
    fn k(&self) -> usize {
        self.classifier.k()
    }
}

/// A Python module implemented in Rust. The module name must match the `lib.name`
/// in `Cargo.toml`.
#[pymodule]
#[pyo3(name = "stratified_knn")]
fn stratified_knn_py(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(euclidean_distance_py, m)?)?;
    m.add_function(wrap_pyfunction!(stratified_split_py, m)?)?;
    m.add_function(wrap_pyfunction!(classify_py, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_py, m)?)?;
    m.add_class::<PyKnnClassifier>()?;
    Ok(())
}
