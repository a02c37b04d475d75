//! Reflective base machinery: objects, aggregation, and TypeId records.
//!
//! A configurable object implements [`Object`], which gives the kernel an
//! `Any`-based downcast seam (used by accessors), the name of its
//! registered [`TypeId`], and access to an embedded [`ObjectCore`] used
//! for aggregation. Aggregation composes capabilities at run time: two
//! aggregated objects can find each other by TypeId name without either
//! inheriting from the other.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::attribute::{AttributeAccessor, AttributeChecker, AttributeValue};
use crate::callback::{ContextCallback, TracedCallback};

/// A shared, interiorly-mutable node of the live object graph.
pub type ObjectRc = Rc<RefCell<dyn Object>>;

type WeakObject = Weak<RefCell<dyn Object>>;

/// Base trait for every configurable simulation object.
pub trait Object: Any {
    /// The name of this object's registered [`TypeId`].
    fn type_name(&self) -> &'static str;

    /// Downcast seam used by attribute accessors.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast seam used by attribute accessors.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The embedded aggregation core.
    fn core(&self) -> &ObjectCore;
}

/// Per-object aggregation state.
///
/// Members of an aggregate share one group vector; the group holds weak
/// references so aggregation never extends object lifetimes (ownership
/// stays with the graph: registry roots and ObjectVector attributes).
#[derive(Default)]
pub struct ObjectCore {
    group: RefCell<Option<Rc<RefCell<Vec<WeakObject>>>>>,
}

impl ObjectCore {
    /// Creates a core belonging to no aggregate.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for ObjectCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self
            .group
            .borrow()
            .as_ref()
            .map(|g| g.borrow().len())
            .unwrap_or(0);
        write!(f, "ObjectCore(group: {members})")
    }
}

/// Aggregates `a` and `b` (and, transitively, everything already
/// aggregated with either) into one capability group.
pub fn aggregate(a: &ObjectRc, b: &ObjectRc) {
    let mut members: Vec<WeakObject> = Vec::new();
    let mut absorb = |obj: &ObjectRc| {
        let existing = obj.borrow().core().group.borrow().clone();
        match existing {
            Some(group) => {
                for member in group.borrow().iter() {
                    if let Some(live) = member.upgrade() {
                        if !members.iter().any(|m| m.ptr_eq(member)) {
                            members.push(Rc::downgrade(&live));
                        }
                    }
                }
            }
            None => members.push(Rc::downgrade(obj)),
        }
    };
    absorb(a);
    absorb(b);

    let merged = Rc::new(RefCell::new(members));
    for member in merged.borrow().iter() {
        if let Some(live) = member.upgrade() {
            *live.borrow().core().group.borrow_mut() = Some(Rc::clone(&merged));
        }
    }
}

/// Returns the members aggregated with `obj`, including `obj` itself.
pub fn aggregate_members(obj: &ObjectRc) -> Vec<ObjectRc> {
    let group = obj.borrow().core().group.borrow().clone();
    match group {
        Some(group) => group.borrow().iter().filter_map(Weak::upgrade).collect(),
        None => vec![Rc::clone(obj)],
    }
}

/// One registered attribute of a [`TypeId`].
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    /// Attribute name, unique across the TypeId lineage.
    pub name: String,
    /// Human-readable description.
    pub help: String,
    /// Declared default value.
    pub initial: AttributeValue,
    /// Validator and string codec.
    pub checker: AttributeChecker,
    /// Getter/setter pair over the concrete type.
    pub accessor: AttributeAccessor,
}

/// One registered trace source of a [`TypeId`].
#[derive(Clone)]
pub struct TraceSourceInfo {
    /// Trace source name.
    pub name: String,
    /// Human-readable description.
    pub help: String,
    /// Type-erased connect/disconnect plumbing.
    pub accessor: TraceSourceAccessor,
}

impl fmt::Debug for TraceSourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceSourceInfo({})", self.name)
    }
}

/// Type-erased subscription surface for one trace source.
///
/// Built generically at registration over the concrete object type and
/// the trace payload type; configuration code then connects observers
/// through `&dyn Any` without static knowledge of either.
#[derive(Clone)]
pub struct TraceSourceAccessor {
    #[allow(clippy::type_complexity)]
    connect: Rc<dyn Fn(&dyn Object, &str, &dyn Any) -> bool>,
    #[allow(clippy::type_complexity)]
    disconnect: Rc<dyn Fn(&dyn Object, &dyn Any) -> bool>,
}

impl TraceSourceAccessor {
    /// Builds an accessor from a projection of the concrete type onto its
    /// [`TracedCallback`] field.
    pub fn new<T, P, S>(source: S) -> Self
    where
        T: Object,
        P: 'static,
        S: for<'a> Fn(&'a T) -> &'a TracedCallback<P> + Clone + 'static,
    {
        let connect_source = source.clone();
        TraceSourceAccessor {
            connect: Rc::new(move |obj: &dyn Object, context: &str, cb: &dyn Any| {
                let Some(obj) = obj.as_any().downcast_ref::<T>() else {
                    return false;
                };
                let Some(cb) = cb.downcast_ref::<ContextCallback<P>>() else {
                    return false;
                };
                connect_source(obj).connect_with_context(context, cb.clone());
                true
            }),
            disconnect: Rc::new(move |obj: &dyn Object, cb: &dyn Any| {
                let Some(obj) = obj.as_any().downcast_ref::<T>() else {
                    return false;
                };
                let Some(cb) = cb.downcast_ref::<ContextCallback<P>>() else {
                    return false;
                };
                source(obj).disconnect_context(cb)
            }),
        }
    }

    /// Connects `callback` (a `&ContextCallback<P>` behind `Any`) with the
    /// given context string. `false` on a type mismatch.
    pub fn connect(&self, obj: &dyn Object, context: &str, callback: &dyn Any) -> bool {
        (self.connect)(obj, context, callback)
    }

    /// Disconnects `callback` by identity. `false` if it was not
    /// connected or the types mismatch.
    pub fn disconnect(&self, obj: &dyn Object, callback: &dyn Any) -> bool {
        (self.disconnect)(obj, callback)
    }
}

/// The registration record for one object type.
///
/// Carries the attribute and trace-source tables plus an optional parent
/// record name; attribute lookup walks the parent chain, so a derived
/// type inherits everything its ancestors declared.
#[derive(Debug, Clone)]
pub struct TypeId {
    name: String,
    parent: Option<String>,
    attributes: Vec<AttributeInfo>,
    trace_sources: Vec<TraceSourceInfo>,
}

impl TypeId {
    /// Starts a record for the type called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        TypeId {
            name: name.into(),
            parent: None,
            attributes: Vec::new(),
            trace_sources: Vec::new(),
        }
    }

    /// Declares the parent record for attribute-lookup chaining.
    pub fn set_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Declares an attribute.
    pub fn add_attribute(
        mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        initial: AttributeValue,
        checker: AttributeChecker,
        accessor: AttributeAccessor,
    ) -> Self {
        self.attributes.push(AttributeInfo {
            name: name.into(),
            help: help.into(),
            initial,
            checker,
            accessor,
        });
        self
    }

    /// Declares a trace source.
    pub fn add_trace_source(
        mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        accessor: TraceSourceAccessor,
    ) -> Self {
        self.trace_sources.push(TraceSourceInfo {
            name: name.into(),
            help: help.into(),
            accessor,
        });
        self
    }

    /// The record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent record name, if declared.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Locally declared attributes (no parent-chain walk).
    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    /// Locally declared trace sources (no parent-chain walk).
    pub fn trace_sources(&self) -> &[TraceSourceInfo] {
        &self.trace_sources
    }

    /// Looks up a locally declared attribute by name.
    pub fn find_attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Looks up a locally declared trace source by name.
    pub fn find_trace_source(&self, name: &str) -> Option<&TraceSourceInfo> {
        self.trace_sources.iter().find(|t| t.name == name)
    }
}
