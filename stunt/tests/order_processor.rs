//! Void members, callback arguments and recursive defaults.

mod common;

use std::{cell::RefCell, rc::Rc};

use common::{OrderProcessor, OrderProcessorDouble, Url, UrlDouble};
use stunt::{
    Callback, CallbackChain, Capability, Double, Error, Harness, Invocation, Matcher, Substitute,
    Times, Value, ValueKind, args, substitute_for,
};

fn completions() -> (Rc<RefCell<Vec<i64>>>, Callback) {
    let done = Rc::new(RefCell::new(Vec::new()));
    let sink = done.clone();
    let callback = Callback::action(move |args| {
        sink.borrow_mut()
            .push(args.first().and_then(Value::as_int).unwrap_or(-1));
    });
    (done, callback)
}

// ============================================================================
// Callback arguments
// ============================================================================

#[test]
fn invoking_matcher_calls_back_with_configured_arguments() {
    let orders: OrderProcessorDouble = substitute_for();
    orders
        .substitute()
        .when("process_order", (Matcher::any(), Matcher::invoking(args![200])))
        .unwrap()
        .do_action(|_| {});

    let (done, callback) = completions();
    orders.process_order(7, callback).unwrap();

    assert_eq!(*done.borrow(), [200]);
}

#[test]
fn invoking_matcher_fires_once_per_selected_call_and_not_on_verify() {
    let orders: OrderProcessorDouble = substitute_for();
    let sub = orders.substitute();
    sub.when("process_order", (1, Matcher::invoking(args![1])))
        .unwrap()
        .do_action(|_| {});
    sub.when("process_order", (2, Matcher::invoking(args![2])))
        .unwrap()
        .do_action(|_| {});

    let (done, callback) = completions();
    orders.process_order(1, callback.clone()).unwrap();
    orders.process_order(2, callback.clone()).unwrap();
    orders.process_order(3, callback).unwrap();
    assert_eq!(*done.borrow(), [1, 2]);

    sub.received_times(Times::exactly(3))
        .call("process_order", (Matcher::any(), Matcher::invoking(args![99])))
        .unwrap();
    assert_eq!(*done.borrow(), [1, 2]);
}

#[test]
fn when_do_receives_the_actual_arguments() {
    let orders: OrderProcessorDouble = substitute_for();
    let processed = Rc::new(RefCell::new(Vec::new()));
    let sink = processed.clone();
    orders
        .substitute()
        .when("process_order", ())
        .unwrap()
        .do_action(move |call: &Invocation| {
            sink.borrow_mut().push(call.arg_as::<i64>(0).unwrap_or_default());
            if let Some(Value::Callback(done)) = call.arg(1) {
                let _ = done.call(&args![0]);
            }
        });

    let (done, callback) = completions();
    orders.process_order(11, callback.clone()).unwrap();
    orders.process_order(12, callback).unwrap();

    assert_eq!(*processed.borrow(), [11, 12]);
    assert_eq!(*done.borrow(), [0, 0]);
}

#[test]
fn when_throw_fails_the_void_call() {
    let orders: OrderProcessorDouble = substitute_for();
    orders
        .substitute()
        .when("process_order", (13,))
        .unwrap()
        .throw("unlucky order");

    let (_, callback) = completions();
    assert!(orders.process_order(12, callback.clone()).is_ok());
    let err = orders.process_order(13, callback).unwrap_err();
    assert_eq!(err.as_configured().map(|f| f.message()), Some("unlucky order"));
}

#[test]
fn when_chain_steps_through_calls() {
    let orders: OrderProcessorDouble = substitute_for();
    let log = Rc::new(RefCell::new(String::new()));
    let (a, b, always) = (log.clone(), log.clone(), log.clone());
    orders.substitute().when("process_order", ()).unwrap().do_chain(
        CallbackChain::first(move |_| a.borrow_mut().push('a'))
            .then_keep_doing(move |_| b.borrow_mut().push('b'))
            .and_always(move |_| always.borrow_mut().push('.')),
    );

    let (_, callback) = completions();
    for id in 0..3 {
        orders.process_order(id, callback.clone()).unwrap();
    }
    assert_eq!(*log.borrow(), "a.b.b.");
}

#[test]
fn when_is_rejected_for_value_members() {
    let orders: OrderProcessorDouble = substitute_for();
    let err = orders.substitute().when("validate", ()).err().unwrap();
    assert!(matches!(err, Error::UnsupportedReaction { .. }));
}

#[test]
fn computed_stub_with_side_effect() {
    let orders: OrderProcessorDouble = substitute_for();
    let shipped = Rc::new(RefCell::new(Vec::new()));
    let sink = shipped.clone();
    orders
        .substitute()
        .when_called("ship", (Matcher::any(), Matcher::is::<String, _>(|a| !a.is_empty())))
        .unwrap()
        .then_compute(|call| Ok(Value::from(format!("TRACK-{}", call.arg_as::<i64>(0)?))))
        .unwrap()
        .and_do(move |call| sink.borrow_mut().push(call.arg_as::<String>(1).unwrap_or_default()));

    assert_eq!(orders.ship(5, "Main St").unwrap(), "TRACK-5");
    assert_eq!(orders.ship(6, "").unwrap(), "");
    assert_eq!(*shipped.borrow(), ["Main St"]);
}

#[test]
fn disabled_stub_falls_back_to_older_one() {
    let orders: OrderProcessorDouble = substitute_for();
    let sub = orders.substitute();
    sub.when_called("validate", ()).unwrap().then_return(true).unwrap();
    let reject = sub
        .when_called("validate", (42,))
        .unwrap()
        .then_return(false)
        .unwrap();

    assert!(!orders.validate(42).unwrap());
    reject.disable();
    assert!(orders.validate(42).unwrap());
}

// ============================================================================
// Recursive defaults
// ============================================================================

#[test]
fn self_returning_member_is_memoized_per_arguments() {
    let url: UrlDouble = substitute_for();

    let first = url.clone_with(",").unwrap();
    let second = url.clone_with(",").unwrap();
    let other = url.clone_with("X").unwrap();

    assert!(first.substitute().ptr_eq(second.substitute()));
    assert!(!first.substitute().ptr_eq(other.substitute()));
    assert!(!first.substitute().ptr_eq(url.substitute()));
}

#[test]
fn nested_substitutes_are_full_substitutes() {
    let url: UrlDouble = substitute_for();
    let copy = url.clone_with("/").unwrap();
    copy.substitute()
        .when_called("host", ())
        .unwrap()
        .then_return("example.org")
        .unwrap();

    assert_eq!(url.clone_with("/").unwrap().host().unwrap(), "example.org");
    assert_eq!(url.host().unwrap(), "");
    copy.substitute().received().call("host", ()).unwrap();
}

#[test]
fn members_returning_other_capabilities() {
    let url = UrlDouble::capability();
    let factory = Capability::builder("UrlFactory")
        .method("parse", [ValueKind::Str], ValueKind::Capability(url))
        .build()
        .unwrap();
    let sub = Substitute::new(factory);

    let parsed = sub.call_as::<Substitute>("parse", args!["http://a"]).unwrap();
    assert_eq!(parsed.capability().name(), "Url");
    assert!(parsed.ptr_eq(&sub.call_as::<Substitute>("parse", args!["http://a"]).unwrap()));

    let err = sub
        .when_called("parse", ())
        .unwrap()
        .then_return("http://b")
        .unwrap_err();
    assert!(matches!(err, Error::ReturnKindMismatch { .. }));
}

// ============================================================================
// Reporting
// ============================================================================

#[test]
fn harness_reports_interleaved_history() {
    let test = Harness::new();
    let orders: OrderProcessorDouble = test.double();
    let url: UrlDouble = test.double();

    orders.validate(1).unwrap();
    url.host().unwrap();
    orders.ship(1, "Main St").unwrap();

    let mermaid = test.to_mermaid();
    let lines: Vec<&str> = mermaid.lines().skip(3).collect();
    assert_eq!(
        lines,
        [
            "    test->>s0: validate(1)",
            "    test->>s1: host()",
            "    test->>s0: ship(1, \"Main St\")",
        ]
    );
    assert_eq!(test.calls().on(orders.substitute()).count(), 2);
    assert_eq!(
        test.calls().to("ship").first().unwrap().arg_as::<String>(1).unwrap(),
        "Main St"
    );
}
