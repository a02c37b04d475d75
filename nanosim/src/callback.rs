//! Type-safe multicast callbacks for instrumentation fan-out.
//!
//! A [`TracedCallback`] decouples the producer of an event from its
//! observers: many sinks subscribe to one typed call site and invocation
//! fans out to every currently-connected sink in connection order. This is
//! fire-and-forget multicast; no return value is aggregated.
//!
//! Closures are not comparable by value, so disconnection matches by
//! *identity*: a [`Callback`] is a cheaply-cloneable shared closure and
//! two clones of the same callback compare equal via pointer identity.
//! Arbitrary observer arity is handled with a tuple payload type, e.g.
//! `TracedCallback<(u8, f64)>` for a two-argument trace source.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A shared, identity-comparable observer closure.
pub struct Callback<T: 'static>(Rc<dyn Fn(&T)>);

impl<T> Callback<T> {
    /// Wraps a closure as a connectable callback.
    pub fn new<F: Fn(&T) + 'static>(f: F) -> Self {
        Callback(Rc::new(f))
    }

    /// Invokes the underlying closure.
    pub fn invoke(&self, value: &T) {
        (self.0)(value)
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Callback(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for Callback<T> {}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

/// A shared observer closure that receives a context string first.
///
/// The context is the concrete resolved config path of the trace source
/// the sink was connected to, which is what lets one logger distinguish
/// events from `/NodeA/NodeB/NodesB/1/Source` and `/.../2/Source`.
pub struct ContextCallback<T: 'static>(#[allow(clippy::type_complexity)] Rc<dyn Fn(&str, &T)>);

impl<T> ContextCallback<T> {
    /// Wraps a closure as a connectable context-aware callback.
    pub fn new<F: Fn(&str, &T) + 'static>(f: F) -> Self {
        ContextCallback(Rc::new(f))
    }

    /// Invokes the underlying closure with its bound context.
    pub fn invoke(&self, context: &str, value: &T) {
        (self.0)(context, value)
    }
}

impl<T> Clone for ContextCallback<T> {
    fn clone(&self) -> Self {
        ContextCallback(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for ContextCallback<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for ContextCallback<T> {}

impl<T> fmt::Debug for ContextCallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextCallback({:p})", Rc::as_ptr(&self.0))
    }
}

enum Sink<T: 'static> {
    Plain(Callback<T>),
    WithContext(String, ContextCallback<T>),
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        match self {
            Sink::Plain(cb) => Sink::Plain(cb.clone()),
            Sink::WithContext(ctx, cb) => Sink::WithContext(ctx.clone(), cb.clone()),
        }
    }
}

/// An ordered multicast list of observers for one trace call site.
///
/// Connection order is invocation order. [`fire`](TracedCallback::fire)
/// snapshots the sink list before fan-out, so an observer connecting or
/// disconnecting sinks from inside its own invocation cannot corrupt the
/// iteration; list changes take effect from the next `fire`.
pub struct TracedCallback<T: 'static> {
    sinks: RefCell<Vec<Sink<T>>>,
}

impl<T> TracedCallback<T> {
    /// Creates a trace source with no connected sinks.
    pub fn new() -> Self {
        TracedCallback {
            sinks: RefCell::new(Vec::new()),
        }
    }

    /// Appends an observer to the fan-out list.
    pub fn connect(&self, callback: Callback<T>) {
        self.sinks.borrow_mut().push(Sink::Plain(callback));
    }

    /// Appends a context-aware observer; `context` is delivered as the
    /// first argument on every invocation.
    pub fn connect_with_context(&self, context: impl Into<String>, callback: ContextCallback<T>) {
        self.sinks
            .borrow_mut()
            .push(Sink::WithContext(context.into(), callback));
    }

    /// Removes the first sink whose closure is identical to `callback`.
    /// Returns `false` if no such sink is connected.
    pub fn disconnect(&self, callback: &Callback<T>) -> bool {
        let mut sinks = self.sinks.borrow_mut();
        let before = sinks.len();
        if let Some(pos) = sinks
            .iter()
            .position(|s| matches!(s, Sink::Plain(cb) if cb == callback))
        {
            sinks.remove(pos);
        }
        sinks.len() != before
    }

    /// Removes the first context-aware sink whose closure is identical to
    /// `callback`, regardless of the context it was bound with.
    pub fn disconnect_context(&self, callback: &ContextCallback<T>) -> bool {
        let mut sinks = self.sinks.borrow_mut();
        let before = sinks.len();
        if let Some(pos) = sinks
            .iter()
            .position(|s| matches!(s, Sink::WithContext(_, cb) if cb == callback))
        {
            sinks.remove(pos);
        }
        sinks.len() != before
    }

    /// Fans `value` out to every currently-connected sink, in connection
    /// order.
    pub fn fire(&self, value: &T) {
        let snapshot: Vec<Sink<T>> = self.sinks.borrow().clone();
        for sink in &snapshot {
            match sink {
                Sink::Plain(cb) => cb.invoke(value),
                Sink::WithContext(ctx, cb) => cb.invoke(ctx, value),
            }
        }
    }

    /// The number of connected sinks.
    pub fn len(&self) -> usize {
        self.sinks.borrow().len()
    }

    /// Returns `true` if no sinks are connected.
    pub fn is_empty(&self) -> bool {
        self.sinks.borrow().is_empty()
    }
}

impl<T> Default for TracedCallback<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TracedCallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TracedCallback(sinks: {})", self.len())
    }
}
