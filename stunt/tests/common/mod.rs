//! Typed forwarding adapters shared by the integration tests.
//!
//! Each adapter wraps a `Substitute` and routes every trait method through
//! it, the way production code would see a hand-written test double.

#![allow(dead_code)]

use std::rc::Rc;

use stunt::{Callback, Capability, Double, Result, Substitute, ValueKind, args};

// ============================================================================
// Calculator
// ============================================================================

pub trait Calculator {
    fn add(&self, a: i64, b: i64) -> Result<i64>;
    fn divide(&self, a: f64, b: f64) -> Result<f64>;
    fn mode(&self) -> Result<String>;
    fn set_mode(&self, mode: &str) -> Result;
    fn on_powered_up(&self, handler: Callback) -> Result;
}

pub struct CalculatorDouble(Substitute);

impl Double for CalculatorDouble {
    fn capability() -> Rc<Capability> {
        Capability::builder("Calculator")
            .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
            .method("divide", [ValueKind::Float, ValueKind::Float], ValueKind::Float)
            .property("mode", ValueKind::Str)
            .event("powered_up", [])
            .build()
            .expect("calculator capability")
    }

    fn from_substitute(substitute: Substitute) -> Self {
        Self(substitute)
    }

    fn substitute(&self) -> &Substitute {
        &self.0
    }
}

impl Calculator for CalculatorDouble {
    fn add(&self, a: i64, b: i64) -> Result<i64> {
        self.0.call_as("add", args![a, b])
    }

    fn divide(&self, a: f64, b: f64) -> Result<f64> {
        self.0.call_as("divide", args![a, b])
    }

    fn mode(&self) -> Result<String> {
        self.0.get_as("mode")
    }

    fn set_mode(&self, mode: &str) -> Result {
        self.0.set("mode", mode)
    }

    fn on_powered_up(&self, handler: Callback) -> Result {
        self.0.subscribe("powered_up", handler)
    }
}

// ============================================================================
// Queue
// ============================================================================

pub trait Queue {
    fn dequeue(&self) -> Result<String>;
    fn is_empty(&self) -> Result<bool>;
    fn on_item_added(&self, handler: Callback) -> Result;
    fn off_item_added(&self, handler: &Callback) -> Result;
}

pub struct QueueDouble(Substitute);

impl Double for QueueDouble {
    fn capability() -> Rc<Capability> {
        Capability::builder("Queue")
            .method("dequeue", [], ValueKind::Str)
            .method("is_empty", [], ValueKind::Bool)
            .event("item_added", [ValueKind::Str])
            .build()
            .expect("queue capability")
    }

    fn from_substitute(substitute: Substitute) -> Self {
        Self(substitute)
    }

    fn substitute(&self) -> &Substitute {
        &self.0
    }
}

impl Queue for QueueDouble {
    fn dequeue(&self) -> Result<String> {
        self.0.call_as("dequeue", args![])
    }

    fn is_empty(&self) -> Result<bool> {
        self.0.call_as("is_empty", args![])
    }

    fn on_item_added(&self, handler: Callback) -> Result {
        self.0.subscribe("item_added", handler)
    }

    fn off_item_added(&self, handler: &Callback) -> Result {
        self.0.unsubscribe("item_added", handler)
    }
}

// ============================================================================
// Order processor
// ============================================================================

pub trait OrderProcessor {
    fn process_order(&self, order_id: i64, on_complete: Callback) -> Result;
    fn validate(&self, order_id: i64) -> Result<bool>;
    fn ship(&self, order_id: i64, address: &str) -> Result<String>;
}

pub struct OrderProcessorDouble(Substitute);

impl Double for OrderProcessorDouble {
    fn capability() -> Rc<Capability> {
        Capability::builder("OrderProcessor")
            .method(
                "process_order",
                [ValueKind::Int, ValueKind::Callback],
                ValueKind::Unit,
            )
            .method("validate", [ValueKind::Int], ValueKind::Bool)
            .method("ship", [ValueKind::Int, ValueKind::Str], ValueKind::Str)
            .build()
            .expect("order processor capability")
    }

    fn from_substitute(substitute: Substitute) -> Self {
        Self(substitute)
    }

    fn substitute(&self) -> &Substitute {
        &self.0
    }
}

impl OrderProcessor for OrderProcessorDouble {
    fn process_order(&self, order_id: i64, on_complete: Callback) -> Result {
        self.0
            .call("process_order", args![order_id, on_complete])
            .map(|_| ())
    }

    fn validate(&self, order_id: i64) -> Result<bool> {
        self.0.call_as("validate", args![order_id])
    }

    fn ship(&self, order_id: i64, address: &str) -> Result<String> {
        self.0.call_as("ship", args![order_id, address])
    }
}

// ============================================================================
// Url (self-returning members)
// ============================================================================

pub trait Url {
    fn clone_with(&self, separator: &str) -> Result<UrlDouble>;
    fn host(&self) -> Result<String>;
}

pub struct UrlDouble(Substitute);

impl Double for UrlDouble {
    fn capability() -> Rc<Capability> {
        Capability::builder("Url")
            .method("clone", [ValueKind::Str], ValueKind::This)
            .method("host", [], ValueKind::Str)
            .build()
            .expect("url capability")
    }

    fn from_substitute(substitute: Substitute) -> Self {
        Self(substitute)
    }

    fn substitute(&self) -> &Substitute {
        &self.0
    }
}

impl Url for UrlDouble {
    fn clone_with(&self, separator: &str) -> Result<UrlDouble> {
        self.0
            .call_as::<Substitute>("clone", args![separator])
            .map(UrlDouble)
    }

    fn host(&self) -> Result<String> {
        self.0.call_as("host", args![])
    }
}
