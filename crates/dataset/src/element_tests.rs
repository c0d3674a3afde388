// SPDX-License-Identifier: MIT

use super::*;
use serde_json::json;

#[test]
fn map_style_function_returns_exactly_one_output() {
    let double = |v: &Value| -> Result<Vec<Value>, BndlError> { Ok(vec![json!(v.as_i64().unwrap_or(0) * 2)]) };
    assert_eq!(double.apply(&json!(3)).unwrap(), vec![json!(6)]);
}

#[test]
fn filter_style_function_can_drop_an_element() {
    let evens_only = |v: &Value| -> Result<Vec<Value>, BndlError> {
        if v.as_i64().unwrap_or(0) % 2 == 0 { Ok(vec![v.clone()]) } else { Ok(vec![]) }
    };
    assert_eq!(evens_only.apply(&json!(3)).unwrap(), Vec::<Value>::new());
    assert_eq!(evens_only.apply(&json!(4)).unwrap(), vec![json!(4)]);
}

#[test]
fn flatmap_style_function_can_expand_an_element() {
    let repeat_idx_times = |v: &Value| -> Result<Vec<Value>, BndlError> {
        let n = v.as_i64().unwrap_or(0);
        Ok((0..n).map(|_| v.clone()).collect())
    };
    assert_eq!(repeat_idx_times.apply(&json!(3)).unwrap(), vec![json!(3), json!(3), json!(3)]);
}

#[test]
fn registry_looks_up_by_name() {
    let registry = ElementRegistry::new();
    registry.register("double", Arc::new(|v: &Value| -> Result<Vec<Value>, BndlError> { Ok(vec![json!(v.as_i64().unwrap_or(0) * 2)]) }));
    assert_eq!(registry.apply("double", &json!(5)).unwrap(), vec![json!(10)]);
}

#[test]
fn unknown_name_is_a_task_failure() {
    let registry = ElementRegistry::new();
    let err = registry.apply("missing", &json!(1)).unwrap_err();
    assert!(matches!(err, BndlError::TaskFailure(_)));
}
