//! Value/Python conversion (spec §6 "Argument/return conversion rules"),
//! grounded on `pyo3-bindings/src/types.rs`'s `json_to_py`/`py_to_json` —
//! generalized from "expose Rust to Python" to "embed Python and call into
//! it", the opposite direction of data flow, same crate.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyFloat, PyList, PyString};

use pulsar_types::{PulsarError, Result, Value, ValueTag};

/// `Value -> PyObject`: `bool <-> bool`, `i64 <-> int`, `f64 <-> float`,
/// `String <-> str`, and ordered sequences of each map to a Python list.
pub fn value_to_py(py: Python<'_>, value: &Value) -> PyObject {
    match value {
        Value::Bool(b) => b.into_py(py),
        Value::Int(i) => i.into_py(py),
        Value::Float(f) => f.into_py(py),
        Value::Str(s) => s.into_py(py),
        Value::BoolSeq(v) => v.clone().into_py(py),
        Value::IntSeq(v) => v.clone().into_py(py),
        Value::FloatSeq(v) => v.clone().into_py(py),
        Value::StrSeq(v) => v.clone().into_py(py),
    }
}

/// `PyObject -> Value`. A Python list is accepted only if every element
/// shares the same tag (spec §6: "a heterogeneous sequence is converted to
/// the first element's type if and only if every element has that same
/// tag, otherwise a conversion error is raised").
pub fn py_to_value(obj: &Bound<'_, PyAny>) -> Result<Value> {
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if let Ok(i) = obj.extract::<i64>() {
        return Ok(Value::Int(i));
    }
    if let Ok(f) = obj.downcast::<PyFloat>() {
        return Ok(Value::Float(f.value()));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Value::Str(s.to_string()));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return py_list_to_value(list);
    }
    Err(PulsarError::serialization_error(format!(
        "cannot convert Python value of type {} to a Pulsar Value",
        obj.get_type().name().unwrap_or_else(|_| "<unknown>".into())
    )))
}

fn py_list_to_value(list: &Bound<'_, PyList>) -> Result<Value> {
    if list.is_empty() {
        // An empty sequence carries no tag information; Pulsar treats it
        // as an empty string sequence, the least surprising default for a
        // caller that will immediately check `.len() == 0`.
        return Ok(Value::StrSeq(Vec::new()));
    }
    let elements: Result<Vec<Value>> = list.iter().map(|item| py_to_value(&item)).collect();
    let elements = elements?;
    let first_tag = elements[0].tag();
    if !elements.iter().all(|e| e.tag() == first_tag) {
        return Err(PulsarError::serialization_error(
            "heterogeneous Python sequence cannot convert to a single Pulsar Value shape",
        ));
    }
    Ok(match first_tag {
        ValueTag::Bool => Value::BoolSeq(elements.into_iter().map(|e| must_bool(e)).collect()),
        ValueTag::Int => Value::IntSeq(elements.into_iter().map(|e| must_int(e)).collect()),
        ValueTag::Float => Value::FloatSeq(elements.into_iter().map(|e| must_float(e)).collect()),
        ValueTag::Str => Value::StrSeq(elements.into_iter().map(|e| must_str(e)).collect()),
        // Sequences-of-sequences are not part of the wire contract (spec §6
        // only names scalars and ordered sequences of scalars).
        _ => {
            return Err(PulsarError::serialization_error(
                "nested sequences are not a supported Pulsar Value shape",
            ))
        }
    })
}

fn must_bool(v: Value) -> bool {
    match v {
        Value::Bool(b) => b,
        _ => unreachable!("tag already checked uniform"),
    }
}
fn must_int(v: Value) -> i64 {
    match v {
        Value::Int(i) => i,
        _ => unreachable!("tag already checked uniform"),
    }
}
fn must_float(v: Value) -> f64 {
    match v {
        Value::Float(f) => f,
        _ => unreachable!("tag already checked uniform"),
    }
}
fn must_str(v: Value) -> String {
    match v {
        Value::Str(s) => s,
        _ => unreachable!("tag already checked uniform"),
    }
}

/// `serde_json::Value -> PyObject`, used for the generic `call_method`
/// trampoline surface (arbitrary arguments/return values, not just
/// `OptionMap`-shaped ones).
pub fn json_to_py(py: Python<'_>, value: serde_json::Value) -> PyResult<PyObject> {
    use pyo3::types::PyDict;
    match value {
        serde_json::Value::Null => Ok(py.None()),
        serde_json::Value::Bool(b) => Ok(b.into_py(py)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into_py(py))
            } else if let Some(f) = n.as_f64() {
                Ok(f.into_py(py))
            } else {
                Ok(n.to_string().into_py(py))
            }
        }
        serde_json::Value::String(s) => Ok(s.into_py(py)),
        serde_json::Value::Array(arr) => {
            let list = PyList::empty_bound(py);
            for item in arr {
                list.append(json_to_py(py, item)?)?;
            }
            Ok(list.into())
        }
        serde_json::Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (k, v) in map {
                dict.set_item(k, json_to_py(py, v)?)?;
            }
            Ok(dict.into())
        }
    }
}

/// `PyObject -> serde_json::Value`, the inverse of [`json_to_py`].
pub fn py_to_json(obj: &Bound<'_, PyAny>) -> PyResult<serde_json::Value> {
    use pyo3::types::PyDict;
    if obj.is_none() {
        Ok(serde_json::Value::Null)
    } else if let Ok(b) = obj.downcast::<PyBool>() {
        Ok(serde_json::Value::Bool(b.is_true()))
    } else if let Ok(i) = obj.extract::<i64>() {
        Ok(serde_json::json!(i))
    } else if let Ok(f) = obj.extract::<f64>() {
        Ok(serde_json::json!(f))
    } else if let Ok(s) = obj.extract::<String>() {
        Ok(serde_json::Value::String(s))
    } else if let Ok(list) = obj.downcast::<PyList>() {
        let arr: PyResult<Vec<serde_json::Value>> = list.iter().map(|item| py_to_json(&item)).collect();
        Ok(serde_json::Value::Array(arr?))
    } else if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut map = serde_json::Map::new();
        for (k, v) in dict.iter() {
            let key: String = k.extract()?;
            map.insert(key, py_to_json(&v)?);
        }
        Ok(serde_json::Value::Object(map))
    } else {
        Err(PyErr::new::<pyo3::exceptions::PyTypeError, _>(format!(
            "cannot convert {} to JSON",
            obj.get_type().name()?
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trips() {
        Python::with_gil(|py| {
            let v = Value::Int(42);
            let obj = value_to_py(py, &v);
            let back = py_to_value(obj.bind(py)).unwrap();
            assert_eq!(back, v);
        });
    }

    #[test]
    fn homogeneous_sequence_round_trips() {
        Python::with_gil(|py| {
            let v = Value::StrSeq(vec!["a".into(), "b".into()]);
            let obj = value_to_py(py, &v);
            let back = py_to_value(obj.bind(py)).unwrap();
            assert_eq!(back, v);
        });
    }

    #[test]
    fn heterogeneous_sequence_errors() {
        Python::with_gil(|py| {
            let list = PyList::new_bound(py, [1i64.into_py(py), "oops".into_py(py)]);
            assert!(py_to_value(list.as_any()).is_err());
        });
    }
}
