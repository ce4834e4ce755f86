#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Stunt
//!
//! Test doubles for Rust traits, built on explicit capability descriptors.
//!
//! Stunt creates substitutes for a declared set of members, records every
//! call made against them, answers calls from programmer-configured stubs
//! and verifies afterwards what was received, how often and in which order.
//! Instead of generating proxies at runtime, you write a small forwarding
//! adapter per trait (see [`Double`]) that routes each method through
//! [`Substitute::dispatch`].
//!
//! ## Quick Start
//!
//! ```rust
//! use stunt::*;
//!
//! let calculator = Capability::builder("Calculator")
//!     .method("add", [ValueKind::Int, ValueKind::Int], ValueKind::Int)
//!     .property("mode", ValueKind::Str)
//!     .event("powered_up", [])
//!     .build()?;
//!
//! let calc = Substitute::new(calculator);
//! calc.when_called("add", (1, 2))?.then_return(3)?;
//! calc.when_called("add", (Matcher::any(), 0))?
//!     .then_compute(|call| Ok(call.arg(0).cloned().unwrap_or_default()))?;
//!
//! assert_eq!(calc.call_as::<i64>("add", args![1, 2])?, 3);
//! assert_eq!(calc.call_as::<i64>("add", args![7, 0])?, 7);
//! assert_eq!(calc.call_as::<i64>("add", args![4, 4])?, 0); // unstubbed default
//!
//! calc.received_times(Times::once()).call("add", (1, 2))?;
//! calc.did_not_receive().call("add", (5, 5))?;
//! # Ok::<(), stunt::Error>(())
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Capability`] | Declared methods, properties and events a substitute exposes |
//! | [`Substitute`] | Records calls, resolves stubs, returns defaults |
//! | [`Value`] | Dynamic argument and return value passed through dispatch |
//! | [`Matcher`] | Predicate over one argument, composable and nameable |
//! | [`StubBuilder`] / [`Stub`] | Configure and control reactions to calls |
//! | [`CallbackChain`] | Ordered per-call actions with a repeating tail |
//! | [`Received`] / [`Times`] | Assertions about received calls |
//! | [`CallOrder`] | Ordered expectations across substitutes |
//! | [`CallQuery`] | Composable filter over recorded calls |
//! | [`Harness`] | Fixture context tracking the substitutes of one test |
//! | [`Double`] | Trait for typed forwarding adapters |
//!
//! ## Stub Precedence
//!
//! For each call the most recently configured stub whose matchers accept
//! the arguments is selected. Calls no stub matches return the declared
//! default (`0`, `false`, `""`, an empty list, unit) or, for members
//! returning another capability, a recursive substitute that is the same
//! for equal arguments. With [`Config::with_strict`] unmatched calls on
//! value-returning members fail instead.
//!
//! ## Events
//!
//! Declared events are subscribed with [`Substitute::subscribe`] and raised
//! synthetically with [`Substitute::raise`]. Subscribing is recorded as a
//! call to the event's `+=` member, so it can be verified and ordered like
//! any other call.
//!
//! ## Threading
//!
//! Everything is single-threaded: substitutes use `Rc` and `RefCell` and are
//! neither `Send` nor `Sync`. Stubs and handlers may call back into the
//! substitute that runs them; capture a [`WeakSubstitute`] for that, since a
//! strong clone held by the substitute's own stub is never freed.
//!
//! ## Logging
//!
//! Stunt emits [`tracing`] events: `trace` per recorded call, `debug` when
//! stubs are registered and events raised, `warn` for strict-mode misses.
//! Install any subscriber in your tests to see them.
//!
//! ## Features
//!
//! - **`serde`** - JSON export of recorded calls ([`Substitute::to_json`], [`Harness::to_json`])

mod call_order;
mod call_query;
mod call_seq;
mod callback_chain;
mod capability;
mod config;
mod double;
mod error;
mod event_bridge;
mod harness;
mod invocation;
mod matcher;
mod matchers;
mod member_id;
mod reaction;
mod recorder;
mod stub_builder;
mod stub_rule;
mod stub_table;
mod substitute;
mod substitute_id;
mod value;
mod verify;

pub use call_order::{CallOrder, OrderingFailure};
pub use call_query::CallQuery;
pub use call_seq::CallSeq;
pub use callback_chain::CallbackChain;
pub use capability::{Capability, CapabilityBuilder, EventSig, MemberSig, ValueKind};
pub use config::Config;
pub use double::{Double, substitute_for};
pub use error::Error;
pub use harness::Harness;
pub use invocation::Invocation;
pub use matcher::{Captor, IntoMatcher, Matcher};
pub use matchers::{IntoMatchers, Matchers};
pub use member_id::{MemberId, MemberKind};
pub use reaction::{Failure, Reaction, ValueSequence};
pub use recorder::CallRecorder;
pub use stub_builder::{Stub, StubBuilder, WhenBuilder};
pub use substitute::{Substitute, WeakSubstitute};
pub use substitute_id::SubstituteId;
pub use value::{Callback, FromValue, Value};
pub use verify::{Received, Times, VerificationFailure};

/// Convenience alias for `Result<T, stunt::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
