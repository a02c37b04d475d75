//! Path-based bulk configuration over the live object graph.
//!
//! A config path is a `/`-delimited string addressing one or more objects,
//! for example `/NodeA/NodeB/NodesB/[0-2]/Source`. The resolver walks it
//! from every registered root object (and from the `/Names` namespace),
//! fanning out through ObjectVector attributes with the array-matcher
//! mini-language:
//!
//! - `*` matches every index,
//! - `N` matches exactly index `N`,
//! - `[m-n]` matches every index in the inclusive range,
//! - `a|b` matches the union of what `a` and `b` match, recursively, so
//!   `0|1|[3-5]` is legal.
//!
//! Resolution is permissive: a segment that does not resolve (unknown
//! attribute, null pointer, type mismatch) silently terminates that branch
//! of the walk and contributes zero matches; a lookup never fails as a
//! whole. Callers who want to know *where* a path went dead can supply a
//! miss hook via [`lookup_matches_with`].

use std::any::Any;
use std::rc::Rc;

use crate::attribute::{AttributeChecker, AttributeValue};
use crate::callback::ContextCallback;
use crate::object::ObjectRc;
use crate::registry::Registry;

/// Tests a single vector index against an array-matcher pattern.
///
/// Pure function over (pattern, index); the grammar is `*`, decimal `N`,
/// inclusive `[m-n]`, and recursive alternation `a|b`. Malformed patterns
/// match nothing.
pub fn matches_index(pattern: &str, index: usize) -> bool {
    if pattern.contains('|') {
        return pattern.split('|').any(|part| matches_index(part, index));
    }
    if pattern == "*" {
        return true;
    }
    if let Some(range) = pattern
        .strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
    {
        if let Some((lo, hi)) = range.split_once('-') {
            if let (Ok(lo), Ok(hi)) = (lo.parse::<usize>(), hi.parse::<usize>()) {
                return lo <= index && index <= hi;
            }
        }
        return false;
    }
    pattern.parse::<usize>().map(|n| n == index).unwrap_or(false)
}

/// One resolved (object, concrete path) pair.
#[derive(Clone)]
pub struct Match {
    /// The matched object.
    pub object: ObjectRc,
    /// The concrete path that reached it, with array matchers replaced by
    /// the concrete index, e.g. `/NodeA/NodeB/NodesB/1`.
    pub path: String,
}

/// The ephemeral result set of one path resolution.
///
/// Nothing is cached across calls: every `set`/`connect` performs a fresh
/// walk, so matches reflect the graph as it was at lookup time.
#[derive(Default)]
pub struct MatchContainer {
    matches: Vec<Match>,
}

impl MatchContainer {
    /// The number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns `true` if the path resolved to nothing.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The `i`-th match.
    pub fn get(&self, i: usize) -> Option<&Match> {
        self.matches.get(i)
    }

    /// The concrete resolved path of the `i`-th match.
    pub fn get_matched_path(&self, i: usize) -> Option<&str> {
        self.matches.get(i).map(|m| m.path.as_str())
    }

    /// Iterates over the matches in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter()
    }

    /// Sets attribute `name` to `value` on every match. Returns how many
    /// matches accepted the value; rejections leave that match unchanged.
    pub fn set(&self, registry: &Registry, name: &str, value: &AttributeValue) -> usize {
        self.matches
            .iter()
            .filter(|m| registry.set_attribute(&m.object, name, value))
            .count()
    }

    /// Sets attribute `name` from its canonical string form on every
    /// match.
    pub fn set_str(&self, registry: &Registry, name: &str, value: &str) -> usize {
        self.matches
            .iter()
            .filter(|m| registry.set_attribute_str(&m.object, name, value))
            .count()
    }

    /// Connects `callback` to trace source `name` on every match, binding
    /// the concrete resolved path (plus the source name) as the context
    /// string. Returns the number of subscriptions made.
    pub fn connect<P: 'static>(
        &self,
        registry: &Registry,
        name: &str,
        callback: &ContextCallback<P>,
    ) -> usize {
        self.matches
            .iter()
            .filter(|m| {
                let type_name = m.object.borrow().type_name();
                let Some(info) = registry.find_trace_source(type_name, name) else {
                    return false;
                };
                let context = format!("{}/{}", m.path, name);
                info.accessor
                    .connect(&*m.object.borrow(), &context, callback as &dyn Any)
            })
            .count()
    }

    /// Disconnects `callback` (matched by identity) from trace source
    /// `name` on every match. Returns the number of removals.
    pub fn disconnect<P: 'static>(
        &self,
        registry: &Registry,
        name: &str,
        callback: &ContextCallback<P>,
    ) -> usize {
        self.matches
            .iter()
            .filter(|m| {
                let type_name = m.object.borrow().type_name();
                let Some(info) = registry.find_trace_source(type_name, name) else {
                    return false;
                };
                info.accessor
                    .disconnect(&*m.object.borrow(), callback as &dyn Any)
            })
            .count()
    }
}

/// Resolves an object path into its match set.
///
/// `path` addresses objects, not attributes: for `set`/`connect`-style
/// full paths, the final segment is the attribute or source name and is
/// split off by [`set`], [`connect`] and friends before resolution.
pub fn lookup_matches(registry: &Registry, path: &str) -> MatchContainer {
    lookup_matches_with(registry, path, None)
}

/// Like [`lookup_matches`], with a diagnostic hook invoked once per dead
/// branch with (unresolvable segment, concrete path reached so far). The
/// walk stays permissive either way.
pub fn lookup_matches_with(
    registry: &Registry,
    path: &str,
    on_miss: Option<&dyn Fn(&str, &str)>,
) -> MatchContainer {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut resolver = Resolver {
        registry,
        on_miss,
        matches: Vec::new(),
    };

    if segments.first() == Some(&"Names") {
        // The named-object namespace: /Names/<name>/rest...
        match segments.get(1) {
            Some(name) => match registry.find_name(name) {
                Some(obj) => {
                    resolver.descend(obj, format!("/Names/{name}"), &segments[2..]);
                }
                None => resolver.miss(name, "/Names"),
            },
            None => resolver.miss("Names", ""),
        }
    } else {
        for root in registry.roots() {
            resolver.descend(Rc::clone(root), String::new(), &segments);
        }
    }

    MatchContainer {
        matches: resolver.matches,
    }
}

struct Resolver<'a> {
    registry: &'a Registry,
    on_miss: Option<&'a dyn Fn(&str, &str)>,
    matches: Vec<Match>,
}

impl Resolver<'_> {
    fn miss(&self, segment: &str, path: &str) {
        tracing::trace!(segment, path, "config path branch did not resolve");
        if let Some(hook) = self.on_miss {
            hook(segment, path);
        }
    }

    /// Walks `segments` from `current`, accumulating fully resolved
    /// branches into the match set.
    fn descend(&mut self, current: ObjectRc, path: String, segments: &[&str]) {
        let Some(&segment) = segments.first() else {
            self.matches.push(Match {
                object: current,
                path,
            });
            return;
        };
        let rest = &segments[1..];

        // Friendly names resolve first, wherever they appear.
        if let Some(named) = self.registry.find_name(segment) {
            self.descend(named, format!("{path}/{segment}"), rest);
            return;
        }

        // $TypeName performs a capability lookup on the aggregate.
        if let Some(type_name) = segment.strip_prefix('$') {
            match self.registry.get_capability(&current, type_name) {
                Some(capability) => {
                    self.descend(capability, format!("{path}/{segment}"), rest)
                }
                None => self.miss(segment, &path),
            }
            return;
        }

        // Otherwise the segment is an attribute of the current object.
        let type_name = current.borrow().type_name();
        let Some(checker) = self.registry.attribute_checker(type_name, segment) else {
            self.miss(segment, &path);
            return;
        };
        match checker {
            AttributeChecker::Object { .. } => {
                match self
                    .registry
                    .get_attribute(&current, segment)
                    .and_then(|v| v.as_object())
                {
                    Some(child) => self.descend(child, format!("{path}/{segment}"), rest),
                    None => self.miss(segment, &path),
                }
            }
            AttributeChecker::Vector => {
                let Some(value) = self.registry.get_attribute(&current, segment) else {
                    self.miss(segment, &path);
                    return;
                };
                let Some(children) = value.as_vector() else {
                    self.miss(segment, &path);
                    return;
                };
                // The next segment is the array matcher over the vector's
                // valid indices.
                let Some(&matcher) = rest.first() else {
                    self.miss(segment, &path);
                    return;
                };
                for (index, child) in children.iter().enumerate() {
                    if matches_index(matcher, index) {
                        self.descend(
                            Rc::clone(child),
                            format!("{path}/{segment}/{index}"),
                            &rest[1..],
                        );
                    }
                }
            }
            _ => self.miss(segment, &path),
        }
    }
}

/// Splits a full config path into (object path, leaf name).
fn split_leaf(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit_once('/').filter(|(_, leaf)| !leaf.is_empty())
}

/// Sets the attribute addressed by `path` (object path + attribute leaf)
/// on every matching object. Returns the number of objects updated.
///
/// Unresolvable paths are not an error: they update zero objects.
pub fn set(registry: &Registry, path: &str, value: &AttributeValue) -> usize {
    let Some((object_path, leaf)) = split_leaf(path) else {
        return 0;
    };
    let updated = lookup_matches(registry, object_path).set(registry, leaf, value);
    tracing::debug!(path, updated, "config set");
    updated
}

/// Sets the attribute addressed by `path` from its canonical string form.
pub fn set_str(registry: &Registry, path: &str, value: &str) -> usize {
    let Some((object_path, leaf)) = split_leaf(path) else {
        return 0;
    };
    let updated = lookup_matches(registry, object_path).set_str(registry, leaf, value);
    tracing::debug!(path, value, updated, "config set");
    updated
}

/// Bulk-subscribes `callback` to the trace source addressed by `path`,
/// binding each concrete resolved path as the context string. Returns the
/// number of subscriptions made.
pub fn connect<P: 'static>(
    registry: &Registry,
    path: &str,
    callback: &ContextCallback<P>,
) -> usize {
    let Some((object_path, leaf)) = split_leaf(path) else {
        return 0;
    };
    lookup_matches(registry, object_path).connect(registry, leaf, callback)
}

/// Bulk-unsubscribes `callback` (matched by identity) from the trace
/// source addressed by `path`. Returns the number of removals.
pub fn disconnect<P: 'static>(
    registry: &Registry,
    path: &str,
    callback: &ContextCallback<P>,
) -> usize {
    let Some((object_path, leaf)) = split_leaf(path) else {
        return 0;
    };
    lookup_matches(registry, object_path).disconnect(registry, leaf, callback)
}
