//! Values, validators and accessors for the reflective attribute system.
//!
//! Every configurable object exposes named, typed, validated properties.
//! A property is described once, at type-registration time, by three
//! pieces: the initial [`AttributeValue`], an [`AttributeChecker`] that
//! validates candidate values (and defines the canonical string form),
//! and an [`AttributeAccessor`] holding getter/setter closures built over
//! the concrete type. Nothing in this module walks inheritance at run
//! time; the registration table is the whole mechanism.

use std::fmt;
use std::rc::Rc;

use crate::object::{Object, ObjectRc};
use crate::time::Time;

/// A typed attribute value.
///
/// `Object` and `Vector` variants hold live graph references and have no
/// string form; every other variant round-trips through the canonical
/// string representation defined by its checker.
#[derive(Clone)]
pub enum AttributeValue {
    /// Boolean, canonical form `"true"` / `"false"`.
    Bool(bool),
    /// Signed integer, canonical decimal form without leading zeros.
    Integer(i64),
    /// Unsigned integer, canonical decimal form.
    Unsigned(u64),
    /// Floating point value.
    Double(f64),
    /// Free-form string.
    Str(String),
    /// Enumeration member, canonical form is the registered name.
    Enum(String),
    /// Virtual time, canonical form `"<nanos>ns"`.
    Time(Time),
    /// Pointer to a single child object (or none).
    Object(Option<ObjectRc>),
    /// An indexable vector of child objects.
    Vector(Vec<ObjectRc>),
}

impl AttributeValue {
    /// The signed integer payload, if this is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// The unsigned integer payload, if this is an `Unsigned`.
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            AttributeValue::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if this is a `Double`.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            AttributeValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The child object, if this is a non-null `Object`.
    pub fn as_object(&self) -> Option<ObjectRc> {
        match self {
            AttributeValue::Object(Some(o)) => Some(Rc::clone(o)),
            _ => None,
        }
    }

    /// The child vector, if this is a `Vector`.
    pub fn as_vector(&self) -> Option<&[ObjectRc]> {
        match self {
            AttributeValue::Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(v) => write!(f, "Bool({v})"),
            AttributeValue::Integer(v) => write!(f, "Integer({v})"),
            AttributeValue::Unsigned(v) => write!(f, "Unsigned({v})"),
            AttributeValue::Double(v) => write!(f, "Double({v})"),
            AttributeValue::Str(v) => write!(f, "Str({v:?})"),
            AttributeValue::Enum(v) => write!(f, "Enum({v})"),
            AttributeValue::Time(v) => write!(f, "Time({v})"),
            AttributeValue::Object(Some(_)) => write!(f, "Object(..)"),
            AttributeValue::Object(None) => write!(f, "Object(null)"),
            AttributeValue::Vector(v) => write!(f, "Vector(len: {})", v.len()),
        }
    }
}

/// Pure validation for one attribute, plus its string codec.
///
/// Numeric bounds are closed and boundary-exact: an `Integer` checker
/// declared over `[-32768, 32767]` accepts both endpoints and rejects
/// each value one past them.
#[derive(Debug, Clone)]
pub enum AttributeChecker {
    /// Accepts `Bool` values.
    Bool,
    /// Accepts `Integer` values within the closed range `[min, max]`.
    Integer {
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },
    /// Accepts `Unsigned` values within the closed range `[min, max]`.
    Unsigned {
        /// Smallest accepted value.
        min: u64,
        /// Largest accepted value.
        max: u64,
    },
    /// Accepts `Double` values within the closed range `[min, max]`.
    Double {
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// Accepts any `Str` value.
    Str,
    /// Accepts `Enum` values drawn from the registered member names.
    Enum {
        /// The registered member names.
        values: Vec<String>,
    },
    /// Accepts any `Time` value.
    Time,
    /// Accepts `Object` values whose pointee declares the given TypeId
    /// name (null is always accepted).
    Object {
        /// Required TypeId name of the pointee.
        type_name: String,
    },
    /// Accepts `Vector` values. The resolver treats attributes with this
    /// checker as fan-out points for array matchers.
    Vector,
}

impl AttributeChecker {
    /// An `Integer` checker covering the full `i64` range.
    pub fn any_integer() -> Self {
        AttributeChecker::Integer {
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    /// An `Unsigned` checker covering the full `u64` range.
    pub fn any_unsigned() -> Self {
        AttributeChecker::Unsigned {
            min: u64::MIN,
            max: u64::MAX,
        }
    }

    /// Validates a candidate value. Pure; never mutates anything.
    pub fn check(&self, value: &AttributeValue) -> bool {
        match (self, value) {
            (AttributeChecker::Bool, AttributeValue::Bool(_)) => true,
            (AttributeChecker::Integer { min, max }, AttributeValue::Integer(v)) => {
                min <= v && v <= max
            }
            (AttributeChecker::Unsigned { min, max }, AttributeValue::Unsigned(v)) => {
                min <= v && v <= max
            }
            (AttributeChecker::Double { min, max }, AttributeValue::Double(v)) => {
                min <= v && v <= max
            }
            (AttributeChecker::Str, AttributeValue::Str(_)) => true,
            (AttributeChecker::Enum { values }, AttributeValue::Enum(v)) => {
                values.iter().any(|m| m == v)
            }
            (AttributeChecker::Time, AttributeValue::Time(_)) => true,
            (AttributeChecker::Object { .. }, AttributeValue::Object(None)) => true,
            (AttributeChecker::Object { type_name }, AttributeValue::Object(Some(o))) => {
                o.borrow().type_name() == type_name
            }
            (AttributeChecker::Vector, AttributeValue::Vector(_)) => true,
            _ => false,
        }
    }

    /// Parses the canonical string form into a value, pre-validated
    /// against this checker. Object-valued attributes have no string form.
    pub fn parse(&self, s: &str) -> Option<AttributeValue> {
        let value = match self {
            AttributeChecker::Bool => match s {
                "true" => AttributeValue::Bool(true),
                "false" => AttributeValue::Bool(false),
                _ => return None,
            },
            AttributeChecker::Integer { .. } => AttributeValue::Integer(s.parse().ok()?),
            AttributeChecker::Unsigned { .. } => AttributeValue::Unsigned(s.parse().ok()?),
            AttributeChecker::Double { .. } => AttributeValue::Double(s.parse().ok()?),
            AttributeChecker::Str => AttributeValue::Str(s.to_string()),
            AttributeChecker::Enum { .. } => AttributeValue::Enum(s.to_string()),
            AttributeChecker::Time => AttributeValue::Time(parse_time(s)?),
            AttributeChecker::Object { .. } | AttributeChecker::Vector => return None,
        };
        self.check(&value).then_some(value)
    }

    /// Serializes a value into its canonical string form, or `None` for
    /// graph-valued attributes.
    pub fn serialize(&self, value: &AttributeValue) -> Option<String> {
        match value {
            AttributeValue::Bool(v) => Some(v.to_string()),
            AttributeValue::Integer(v) => Some(v.to_string()),
            AttributeValue::Unsigned(v) => Some(v.to_string()),
            AttributeValue::Double(v) => Some(v.to_string()),
            AttributeValue::Str(v) => Some(v.clone()),
            AttributeValue::Enum(v) => Some(v.clone()),
            AttributeValue::Time(v) => Some(format!("{}ns", v.as_nanos())),
            AttributeValue::Object(_) | AttributeValue::Vector(_) => None,
        }
    }
}

/// Parses `"<n>"` with an `ns`/`us`/`ms`/`s` suffix into a [`Time`].
fn parse_time(s: &str) -> Option<Time> {
    let (digits, unit): (&str, fn(i64) -> Time) = if let Some(d) = s.strip_suffix("ns") {
        (d, Time::nanos)
    } else if let Some(d) = s.strip_suffix("us") {
        (d, Time::micros)
    } else if let Some(d) = s.strip_suffix("ms") {
        (d, Time::millis)
    } else if let Some(d) = s.strip_suffix('s') {
        (d, Time::seconds)
    } else {
        return None;
    };
    digits.parse().ok().map(unit)
}

/// Getter/setter pair for one attribute of one concrete type.
///
/// Built generically at registration: the closures downcast the erased
/// object to the concrete type, so a mismatched object simply reports
/// failure instead of corrupting anything.
#[derive(Clone)]
pub struct AttributeAccessor {
    getter: Rc<dyn Fn(&dyn Object) -> Option<AttributeValue>>,
    #[allow(clippy::type_complexity)]
    setter: Rc<dyn Fn(&mut dyn Object, &AttributeValue) -> bool>,
}

impl AttributeAccessor {
    /// Builds an accessor over concrete type `T` from a field getter and
    /// a field setter. The setter returns `false` to reject a value the
    /// checker could not rule out (for example a pointer of the wrong
    /// concrete type).
    pub fn new<T, G, S>(get: G, set: S) -> Self
    where
        T: Object,
        G: Fn(&T) -> AttributeValue + 'static,
        S: Fn(&mut T, &AttributeValue) -> bool + 'static,
    {
        AttributeAccessor {
            getter: Rc::new(move |obj: &dyn Object| {
                obj.as_any().downcast_ref::<T>().map(&get)
            }),
            setter: Rc::new(move |obj: &mut dyn Object, value: &AttributeValue| {
                match obj.as_any_mut().downcast_mut::<T>() {
                    Some(obj) => set(obj, value),
                    None => false,
                }
            }),
        }
    }

    /// Reads the attribute from `obj`, or `None` if `obj` is not the
    /// accessor's concrete type.
    pub fn get(&self, obj: &dyn Object) -> Option<AttributeValue> {
        (self.getter)(obj)
    }

    /// Writes the attribute on `obj`. `false` leaves the value unchanged.
    pub fn set(&self, obj: &mut dyn Object, value: &AttributeValue) -> bool {
        (self.setter)(obj, value)
    }
}

impl fmt::Debug for AttributeAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AttributeAccessor")
    }
}
