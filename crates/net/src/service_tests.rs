// SPDX-License-Identifier: MIT

use super::*;
use std::sync::Arc;

struct Echo;

#[async_trait::async_trait]
impl Service for Echo {
    async fn call(&self, method: &str, args: Vec<Value>, _kwargs: HashMap<String, Value>) -> Result<Value, BndlError> {
        match method {
            "echo" => Ok(args.into_iter().next().unwrap_or(Value::Null)),
            other => Err(BndlError::InvocationFailure {
                peer: "local".into(),
                method: other.into(),
                message: "no such method".into(),
                remote_trace: None,
            }),
        }
    }
}

#[tokio::test]
async fn registered_service_is_reachable_by_name() {
    let registry = ServiceRegistry::new();
    registry.register("echo", Arc::new(Echo));

    let svc = registry.get("echo").expect("service registered");
    let result = svc.call("echo", vec![Value::from(42)], HashMap::new()).await.unwrap();
    assert_eq!(result, Value::from(42));
}

#[test]
fn unknown_service_is_absent() {
    let registry = ServiceRegistry::new();
    assert!(registry.get("nope").is_none());
}

#[test]
fn deregister_removes_the_service() {
    let registry = ServiceRegistry::new();
    registry.register("echo", Arc::new(Echo));
    assert!(registry.deregister("echo").is_some());
    assert!(registry.get("echo").is_none());
}

#[test]
fn default_dispatch_is_on_demand_thread() {
    let echo = Echo;
    assert_eq!(echo.dispatch(), Dispatch::OnDemandThread);
}
