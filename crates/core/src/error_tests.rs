// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn task_failure_is_retryable() {
    assert!(BndlError::TaskFailure("boom".into()).is_retryable());
}

#[test]
fn cache_miss_is_retryable() {
    let e = BndlError::CacheMiss { cache_key: "d1".into(), obj_key: "p0".into() };
    assert!(e.is_retryable());
}

#[test]
fn config_error_is_not_retryable() {
    assert!(!BndlError::ConfigError("bad key".into()).is_retryable());
}

#[test]
fn invocation_failure_message_includes_peer_and_method() {
    let e = BndlError::InvocationFailure {
        peer: "w1".into(),
        method: "materialize".into(),
        message: "boom".into(),
        remote_trace: None,
    };
    let rendered = e.to_string();
    assert!(rendered.contains("w1"));
    assert!(rendered.contains("materialize"));
}
