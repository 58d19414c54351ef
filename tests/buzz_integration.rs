//! Buzz integration tests
//!
//! End-to-end tests through the public API: gates feeding the handler,
//! cause chaining, absorption, accumulation, async regions, and reports.

use a3s_buzz::{
    check_expressions, enforce_defined, handle_errors, prepare_message, require_condition,
    sanitize, BuzzError, Construction, ConstructionError, Fault, FaultKind, InitParams, RaiseSpec,
    Result, CANCELLED, FAULT, PANIC, RUNTIME_ERROR,
};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

static STORAGE: FaultKind = FaultKind::new("StorageError", &FAULT);
static NOT_FOUND: FaultKind = FaultKind::new("NotFound", &STORAGE);
static NETWORK: FaultKind = FaultKind::new("NetworkError", &FAULT);
static SERVICE: FaultKind = FaultKind::new("ServiceError", &FAULT);

/// Requires a `status` kwarg and puts it in front of the message
fn build_http(params: &InitParams<'_>) -> std::result::Result<Fault, ConstructionError> {
    let status = params
        .init_kwargs
        .get("status")
        .and_then(Value::as_u64)
        .ok_or_else(|| ConstructionError::new(&HTTP, "missing 'status'"))?;
    Ok(Fault::new(&HTTP, format!("[{}] {}", status, params.message))
        .with_kwargs(params.init_kwargs.clone()))
}

static HTTP: FaultKind =
    FaultKind::new("HttpError", &FAULT).with_construction(Construction::Custom(build_http));

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// Payload whose identity survives moves
#[derive(Debug, thiserror::Error)]
#[error("tracked")]
struct Tracked(Arc<()>);

// ─── Condition Gates ─────────────────────────────────────────────

#[test]
fn test_require_condition_raises_iff_falsy() {
    let cases = [
        (json!(true), false),
        (json!(0), true),
        (json!("x"), false),
        (json!([]), true),
    ];
    for (condition, raises) in cases {
        let result = require_condition(&condition, "check {braces} stay");
        assert_eq!(result.is_err(), raises, "condition {}", condition);
        if let Err(err) = result {
            assert_eq!(err.to_string(), "check {braces} stay");
        }
    }
}

#[test]
fn test_enforce_defined_returns_value_unchanged() {
    let values = vec![1, 2, 3];
    let returned = enforce_defined(Some(values), None).unwrap();
    assert_eq!(returned, vec![1, 2, 3]);
    assert!(enforce_defined(None::<Vec<u8>>, None).is_err());
}

#[test]
fn test_sanitize_then_render_is_identity() {
    for text in ["plain", "{", "}}{{", "{0} and {name}", "{:>8}", "{'a': {'b': 1}}"] {
        assert_eq!(prepare_message(text, &[], &Map::new()).unwrap(), text);
    }
    assert_eq!(sanitize("no delimiters"), "no delimiters");
}

#[test]
fn test_custom_construction() {
    let err = RaiseSpec::new("upstream returned {}")
        .format_arg("garbage")
        .kind(&HTTP)
        .init_kwarg("status", 502)
        .require_condition(false)
        .unwrap_err();
    let fault = err.as_fault().unwrap();
    assert_eq!(fault.message(), "[502] upstream returned garbage");
    assert_eq!(fault.kwarg("status"), Some(&json!(502)));

    let err = HTTP.require_condition(false, "no status").unwrap_err();
    match err {
        BuzzError::Construction(e) => {
            assert_eq!(e.kind, "HttpError");
            assert_eq!(e.reason, "missing 'status'");
        }
        other => panic!("expected construction error, got {:?}", other),
    }
}

#[test]
fn test_template_with_bad_placeholder_is_format_error() {
    let err = RaiseSpec::new("value {missing}")
        .format_kwarg("present", 1)
        .require_condition(false)
        .unwrap_err();
    assert!(matches!(err, BuzzError::Format { .. }));
}

// ─── Scoped Handler ──────────────────────────────────────────────

#[test]
fn test_gate_inside_handler() {
    let lookup = |id: u32| -> Result<&'static str> {
        NOT_FOUND.enforce_defined(None, format!("row {} not found", id).as_str())
    };

    let err = handle_errors("Loading profile failed")
        .handle(&STORAGE)
        .raise(&SERVICE)
        .run(|| lookup(7))
        .unwrap_err();

    let fault = err.as_fault().unwrap();
    assert!(fault.is_kind_of(&SERVICE));
    assert_eq!(fault.message(), "Loading profile failed -- NotFound: row 7 not found");
    assert_eq!(fault.base_message(), Some("Loading profile failed"));
    assert!(fault.root_cause().is_kind_of(&STORAGE));
}

#[test]
fn test_unmatched_kind_propagates_with_only_finally() {
    let (except, else_, finally) = (AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0));
    let err = handle_errors("base")
        .handle(&STORAGE)
        .do_except(|_| bump(&except))
        .do_else(|| bump(&else_))
        .do_finally(|| bump(&finally))
        .run(|| NETWORK.require_condition(false, "link down"))
        .unwrap_err();

    assert!(err.is_kind_of(&NETWORK));
    assert_eq!(err.to_string(), "link down");
    let counts = [&except, &else_, &finally].map(|c| c.load(Ordering::SeqCst));
    assert_eq!(counts, [0, 0, 1]);
}

#[test]
fn test_absorb_continues_after_region() {
    let final_message = Mutex::new(String::new());

    let outcome = handle_errors("there was a problem")
        .absorb()
        .do_except(|params| *final_message.lock().unwrap() = params.final_message.to_string())
        .run(|| require_condition(false, "bad value"));
    assert!(outcome.unwrap().is_none());

    let after = require_condition(true, "runs after the region");
    assert!(after.is_ok());
    assert_eq!(final_message.into_inner().unwrap(), "there was a problem -- Fault: bad value");
}

#[test]
fn test_reraise_keeps_original_instance_as_cause() {
    let token = Arc::new(());
    let original = Fault::new(&STORAGE, "disk full").with_payload(Tracked(Arc::clone(&token)));

    let err = handle_errors("Saving failed")
        .run(move || -> Result<()> { Err(original.into()) })
        .unwrap_err();

    let fault = err.into_fault().unwrap();
    assert!(fault.is_kind_of(&RUNTIME_ERROR));
    let cause = fault.cause().unwrap();
    assert_eq!(cause.message(), "disk full");
    let tracked = cause.downcast_ref::<Tracked>().unwrap();
    assert!(Arc::ptr_eq(&tracked.0, &token));
    assert_eq!(Arc::strong_count(&token), 2);
}

#[test]
fn test_nested_handlers_build_a_chain() {
    let err = handle_errors("outer")
        .raise(&SERVICE)
        .run(|| {
            handle_errors("inner")
                .run(|| NOT_FOUND.require_condition(false, "gone"))
                .map(|_| ())
        })
        .unwrap_err();

    let fault = err.as_fault().unwrap();
    let kinds: Vec<_> = std::iter::once(fault)
        .chain(fault.causes())
        .map(Fault::kind_name)
        .collect();
    assert_eq!(kinds, vec!["ServiceError", "RuntimeError", "NotFound"]);
    assert_eq!(fault.message(), "outer -- RuntimeError: inner -- NotFound: gone");
}

mod storage {
    use super::*;
    pub static NOT_FOUND: FaultKind = FaultKind::new("NotFound", &STORAGE);
}

mod http {
    use super::*;
    pub static NOT_FOUND: FaultKind = FaultKind::new("NotFound", &FAULT);
}

#[test]
fn test_handler_ignores_same_named_kind_from_other_module() {
    let err = handle_errors("http layer")
        .handle(&http::NOT_FOUND)
        .run(|| storage::NOT_FOUND.require_condition(false, "row missing"))
        .unwrap_err();

    assert!(err.is_kind_of(&storage::NOT_FOUND));
    assert!(!err.is_kind_of(&http::NOT_FOUND));
    assert_eq!(err.to_string(), "row missing");
    assert!(err.as_fault().unwrap().cause().is_none());
}

#[test]
fn test_report_serializes_chain() {
    let err = handle_errors("outer")
        .raise_kwarg("attempt", 2)
        .run(|| STORAGE.require_condition(false, "locked"))
        .unwrap_err();

    let report = serde_json::to_value(err.as_fault().unwrap().report()).unwrap();
    assert_eq!(report["kind"], "RuntimeError");
    assert_eq!(report["baseMessage"], "outer");
    assert_eq!(report["kwargs"], json!({"attempt": 2}));
    assert_eq!(report["cause"]["kind"], "StorageError");
    assert_eq!(report["cause"]["ancestry"], json!(["StorageError", "Fault"]));
    assert!(report["cause"].get("cause").is_none());
}

// ─── Async Regions ───────────────────────────────────────────────

#[tokio::test]
async fn test_async_region_reraises() {
    let err = SERVICE
        .handle_errors("fetch failed")
        .run_async(async {
            tokio::task::yield_now().await;
            NETWORK.require_condition(false, "timed out")
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "fetch failed -- NetworkError: timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handled_region_inside_spawned_task() {
    let finally = Arc::new(AtomicU32::new(0));
    let hook = Arc::clone(&finally);

    let task = tokio::spawn(async move {
        SERVICE
            .handle_errors("background sync failed")
            .handle(&NETWORK)
            .do_finally(move || bump(&hook))
            .run_async(async {
                tokio::task::yield_now().await;
                NETWORK.require_condition(false, "peer reset")
            })
            .await
    });

    let err = task.await.unwrap().unwrap_err();
    assert!(err.is_kind_of(&SERVICE));
    assert_eq!(err.to_string(), "background sync failed -- NetworkError: peer reset");
    assert_eq!(finally.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_join_error_is_classified() {
    let err = handle_errors("worker")
        .handle(&PANIC)
        .raise(&SERVICE)
        .run_async(async {
            tokio::spawn(async { panic!("worker exploded") }).await?;
            Ok::<(), BuzzError>(())
        })
        .await
        .unwrap_err();

    let fault = err.as_fault().unwrap();
    assert!(fault.is_kind_of(&SERVICE));
    assert!(fault.cause().unwrap().is_kind_of(&PANIC));
}

#[tokio::test]
async fn test_cancellation_token_mid_flight() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        canceller.cancel();
    });

    let finally = AtomicU32::new(0);
    let outcome = handle_errors("long job")
        .handle(&CANCELLED)
        .absorb()
        .do_finally(|| bump(&finally))
        .run_until_cancelled(&token, std::future::pending::<Result<()>>())
        .await
        .unwrap();

    assert!(outcome.is_none());
    assert_eq!(finally.load(Ordering::SeqCst), 1);
}

// ─── Expression Accumulator ──────────────────────────────────────

#[test]
fn test_check_expressions_reports_failures() {
    let err = check_expressions("there will be errors")
        .run(|check| {
            check.check(true, None);
            check.check(false, None);
            check.check(1 == 2, "one is not two");
            check.check("cool", "not a problem");
            check.check(0, "zero is still zero");
        })
        .unwrap_err();

    let message = err.to_string();
    let lines: Vec<_> = message.lines().collect();
    assert_eq!(
        lines,
        vec![
            "there will be errors",
            "  2: 2 expression failed",
            "  3: one is not two",
            "  5: zero is still zero",
        ]
    );
}

#[test]
fn test_check_expressions_empty_or_passing_never_raises() {
    assert!(check_expressions("empty").run(|_| ()).is_ok());
    assert!(check_expressions("passing")
        .run(|check| {
            check.check(1, None);
            check.check(Some(true), "set");
            check.check(vec!["a"], "non-empty");
        })
        .is_ok());
}

#[test]
fn test_check_expressions_inside_handler() {
    let err = handle_errors("Validating request failed")
        .raise(&SERVICE)
        .run(|| {
            STORAGE.check_expressions("bad request").run(|check| {
                check.check("", "name is required");
            })
        })
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Validating request failed -- StorageError: bad request\n  1: name is required"
    );
}
