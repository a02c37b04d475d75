//! The process-scoped configuration context.
//!
//! Every piece of state that a classic simulator would hide in
//! function-local statics (the TypeId table, the named-object service,
//! the root namespace objects) lives in an explicit [`Registry`] value
//! instead. That keeps multiple independent simulations per process
//! possible and makes teardown order deterministic: drop the registry and
//! everything it owned is released.

use std::collections::HashMap;
use std::rc::Rc;

use crate::attribute::{AttributeChecker, AttributeValue};
use crate::object::{aggregate_members, AttributeInfo, ObjectRc, TraceSourceInfo, TypeId};

/// TypeId table + named-object service + root namespace objects.
#[derive(Default)]
pub struct Registry {
    types: HashMap<String, TypeId>,
    names: HashMap<String, ObjectRc>,
    roots: Vec<ObjectRc>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a TypeId record.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered, or if an attribute name
    /// collides with one declared by an ancestor record. Attribute names
    /// must be unique per lineage, and violating that is a registration
    /// bug, not a runtime condition.
    pub fn register(&mut self, type_id: TypeId) {
        let name = type_id.name().to_string();
        assert!(
            !self.types.contains_key(&name),
            "TypeId {name:?} registered twice"
        );
        if let Some(parent) = type_id.parent() {
            for attribute in type_id.attributes() {
                assert!(
                    self.find_attribute(parent, &attribute.name).is_none(),
                    "attribute {:?} of TypeId {name:?} shadows an ancestor's",
                    attribute.name
                );
            }
        }
        self.types.insert(name, type_id);
    }

    /// Looks up a TypeId record by name.
    pub fn lookup(&self, name: &str) -> Option<&TypeId> {
        self.types.get(name)
    }

    /// Looks up an attribute by name, walking the parent chain of
    /// `type_name` until found or exhausted.
    pub fn find_attribute(&self, type_name: &str, attribute: &str) -> Option<&AttributeInfo> {
        let mut current = self.types.get(type_name);
        while let Some(type_id) = current {
            if let Some(info) = type_id.find_attribute(attribute) {
                return Some(info);
            }
            current = type_id.parent().and_then(|p| self.types.get(p));
        }
        None
    }

    /// Looks up a trace source by name, walking the parent chain.
    pub fn find_trace_source(&self, type_name: &str, source: &str) -> Option<&TraceSourceInfo> {
        let mut current = self.types.get(type_name);
        while let Some(type_id) = current {
            if let Some(info) = type_id.find_trace_source(source) {
                return Some(info);
            }
            current = type_id.parent().and_then(|p| self.types.get(p));
        }
        None
    }

    /// Returns `true` if `type_name` is `ancestor` or declares it
    /// anywhere up its parent chain.
    pub fn is_derived_from(&self, type_name: &str, ancestor: &str) -> bool {
        let mut current = Some(type_name);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.types.get(name).and_then(|t| t.parent());
        }
        false
    }

    /// Sets an attribute on `obj` by typed value.
    ///
    /// Returns `false`, leaving the stored value unchanged, when the
    /// attribute is unknown, the checker rejects the value, or the
    /// accessor's setter rejects it.
    pub fn set_attribute(&self, obj: &ObjectRc, name: &str, value: &AttributeValue) -> bool {
        let type_name = obj.borrow().type_name();
        let Some(info) = self.find_attribute(type_name, name) else {
            return false;
        };
        if !info.checker.check(value) {
            return false;
        }
        info.accessor.set(&mut *obj.borrow_mut(), value)
    }

    /// Sets an attribute on `obj` from its canonical string form.
    pub fn set_attribute_str(&self, obj: &ObjectRc, name: &str, value: &str) -> bool {
        let type_name = obj.borrow().type_name();
        let Some(info) = self.find_attribute(type_name, name) else {
            return false;
        };
        let Some(parsed) = info.checker.parse(value) else {
            return false;
        };
        info.accessor.set(&mut *obj.borrow_mut(), &parsed)
    }

    /// Reads an attribute from `obj` by name.
    pub fn get_attribute(&self, obj: &ObjectRc, name: &str) -> Option<AttributeValue> {
        let type_name = obj.borrow().type_name();
        let info = self.find_attribute(type_name, name)?;
        info.accessor.get(&*obj.borrow())
    }

    /// Reads an attribute and renders its canonical string form.
    pub fn get_attribute_str(&self, obj: &ObjectRc, name: &str) -> Option<String> {
        let type_name = obj.borrow().type_name();
        let info = self.find_attribute(type_name, name)?;
        let value = info.accessor.get(&*obj.borrow())?;
        info.checker.serialize(&value)
    }

    /// The checker declared for an attribute, if registered.
    pub fn attribute_checker(&self, type_name: &str, name: &str) -> Option<&AttributeChecker> {
        self.find_attribute(type_name, name).map(|i| &i.checker)
    }

    /// Gives `obj` a friendly name in the named-object service.
    ///
    /// Path resolution tries names before anything else, so a named
    /// object is addressable from any point in a config path as well as
    /// under the `/Names` namespace.
    pub fn add_name(&mut self, name: impl Into<String>, obj: ObjectRc) {
        self.names.insert(name.into(), obj);
    }

    /// Looks up an object by friendly name.
    pub fn find_name(&self, name: &str) -> Option<ObjectRc> {
        self.names.get(name).map(Rc::clone)
    }

    /// Registers a root object for config path resolution: every lookup
    /// walks from each registered root.
    pub fn register_root_namespace_object(&mut self, obj: ObjectRc) {
        self.roots.push(obj);
    }

    /// The registered root namespace objects.
    pub fn roots(&self) -> &[ObjectRc] {
        &self.roots
    }

    /// Capability lookup: finds the member of `obj`'s aggregate (including
    /// `obj` itself) whose type is, or derives from, `type_name`.
    pub fn get_capability(&self, obj: &ObjectRc, type_name: &str) -> Option<ObjectRc> {
        aggregate_members(obj)
            .into_iter()
            .find(|member| self.is_derived_from(member.borrow().type_name(), type_name))
    }

    /// Drops every registered type, name, and root. Called at simulator
    /// teardown when the registry is owned by a longer-lived harness.
    pub fn clear(&mut self) {
        self.types.clear();
        self.names.clear();
        self.roots.clear();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.types.len())
            .field("names", &self.names.len())
            .field("roots", &self.roots.len())
            .finish()
    }
}
