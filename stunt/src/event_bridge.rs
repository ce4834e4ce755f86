//! Event subscription and synthetic raising.
//!
//! Subscribing and unsubscribing dispatch the event's `+=` and `-=` members,
//! so they are recorded and verifiable like any other call. Raising is not a
//! call on the substitute and is not recorded; calls made by the handlers
//! are.

use std::sync::Arc;

use crate::{Callback, Error, MemberId, Result, Substitute, Value};

#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    event: Arc<str>,
    handler: Callback,
}

impl Substitute {
    /// Subscribe `handler` to `event`.
    ///
    /// The subscription is recorded as a call to the event's add accessor,
    /// and a stub configured on that accessor runs first. If the stub fails,
    /// the handler is not subscribed.
    pub fn subscribe(&self, event: &str, handler: Callback) -> Result {
        self.dispatch(&MemberId::add(event), vec![Value::Callback(handler.clone())])?;
        self.subscriptions().borrow_mut().push(Subscription {
            event: Arc::from(event),
            handler,
        });
        Ok(())
    }

    /// Remove the first subscription of `handler` to `event`.
    ///
    /// Handlers compare by identity. Removing a handler that was never
    /// subscribed is recorded but changes nothing.
    pub fn unsubscribe(&self, event: &str, handler: &Callback) -> Result {
        self.dispatch(&MemberId::remove(event), vec![Value::Callback(handler.clone())])?;
        let mut subscriptions = self.subscriptions().borrow_mut();
        if let Some(pos) = subscriptions
            .iter()
            .position(|s| &*s.event == event && s.handler.ptr_eq(handler))
        {
            subscriptions.remove(pos);
        }
        Ok(())
    }

    /// Invoke every handler subscribed to `event`, in subscription order.
    ///
    /// Handlers subscribed or removed while raising take effect on the next
    /// raise. The first handler failure stops the remaining handlers and is
    /// returned.
    pub fn raise(&self, event: &str, args: Vec<Value>) -> Result {
        let sig = self
            .capability()
            .event(event)
            .ok_or_else(|| Error::UndeclaredMember {
                capability: self.capability().name_arc(),
                member: MemberId::add(event),
            })?;
        if sig.params().len() != args.len() {
            return Err(Error::ArityMismatch {
                member: MemberId::add(event),
                expected: sig.params().len(),
                actual: args.len(),
            });
        }
        for (kind, arg) in sig.params().iter().zip(&args) {
            if !kind.admits(arg, self.capability()) {
                return Err(Error::TypeMismatch {
                    expected: kind.type_name(),
                    found: arg.type_name(),
                });
            }
        }

        let handlers: Vec<Callback> = self
            .subscriptions()
            .borrow()
            .iter()
            .filter(|s| &*s.event == event)
            .map(|s| s.handler.clone())
            .collect();
        tracing::debug!(substitute = %self, event, handlers = handlers.len(), "raising event");

        for handler in handlers {
            handler.call(&args)?;
        }
        Ok(())
    }

    /// Number of handlers currently subscribed to `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscriptions()
            .borrow()
            .iter()
            .filter(|s| &*s.event == event)
            .count()
    }
}
