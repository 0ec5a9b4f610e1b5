//! Heterogeneous keys with a total cross-kind ordering.

use alloc::boxed::Box;
use alloc::string::String;
use core::cmp::Ordering;
use core::fmt;

/// The kind of a [`Key`].
///
/// Variants are declared in the lexicographic order of their [`tag`](Kind::tag)s, so the
/// derived [`Ord`] is the cross-kind ordering used by [`polymorphic_compare`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Kind {
    /// `true` or `false`.
    Boolean,
    /// A callable, compared through the primitive it unwraps to.
    Function,
    /// The null value.
    Null,
    /// A double-precision number, including NaN.
    Number,
    /// A boxed or object-like value, compared through the primitive it unwraps to.
    Object,
    /// A string.
    String,
    /// A symbol-like value, compared through the primitive it unwraps to.
    Symbol,
    /// The absent value.
    Undefined,
}

impl Kind {
    /// The name this kind is ordered by.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::Function => "function",
            Kind::Null => "null",
            Kind::Number => "number",
            Kind::Object => "object",
            Kind::String => "string",
            Kind::Symbol => "symbol",
            Kind::Undefined => "undefined",
        }
    }

    /// Returns `true` for the kinds that are compared by unwrapping.
    #[must_use]
    pub const fn is_wrapper(self) -> bool {
        matches!(self, Kind::Function | Kind::Object | Kind::Symbol)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Payload of the object-like [`Key`] variants.
///
/// A `Boxed` may carry the primitive it unwraps to (its "value of"). Without one,
/// unwrapping makes no progress and two such keys of the same kind compare equal.
#[derive(Clone, Debug, Default)]
pub struct Boxed {
    primitive: Option<Box<Key>>,
}

impl Boxed {
    /// A wrapper that unwraps to `primitive`.
    #[must_use]
    pub fn new(primitive: impl Into<Key>) -> Self {
        Boxed {
            primitive: Some(Box::new(primitive.into())),
        }
    }

    /// A wrapper with no primitive form.
    #[must_use]
    pub const fn opaque() -> Self {
        Boxed { primitive: None }
    }

    /// The primitive this wrapper unwraps to, if any.
    #[must_use]
    pub fn primitive(&self) -> Option<&Key> {
        self.primitive.as_deref()
    }
}

/// A dynamically typed map key.
///
/// `Key` is totally ordered: keys of different [`Kind`]s order by kind tag
/// (`boolean < function < null < number < object < string < symbol < undefined`), and
/// keys of the same kind order by value. See [`polymorphic_compare`] for the details.
///
/// # Examples
///
/// ```
/// use ranked_btree::{Boxed, Key, RankedBTreeMap};
///
/// let mut map = RankedBTreeMap::new();
/// map.set(Key::from("b"), 1).set(Key::from(2.5), 2).set(Key::Null, 3);
/// map.set(Key::Object(Boxed::new(1)), 4);
///
/// let kinds: Vec<_> = map.keys(0, None).map(|k| k.kind().tag()).collect();
/// assert_eq!(kinds, ["null", "number", "object", "string"]);
/// ```
#[derive(Clone, Debug)]
pub enum Key {
    /// A boolean.
    Bool(bool),
    /// A callable.
    Function(Boxed),
    /// The null value.
    Null,
    /// A number.
    Number(f64),
    /// An object-like value.
    Object(Boxed),
    /// A string.
    String(String),
    /// A symbol-like value.
    Symbol(Boxed),
    /// The absent value.
    Undefined,
}

impl Key {
    /// The kind of this key.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Key::Bool(_) => Kind::Boolean,
            Key::Function(_) => Kind::Function,
            Key::Null => Kind::Null,
            Key::Number(_) => Kind::Number,
            Key::Object(_) => Kind::Object,
            Key::String(_) => Kind::String,
            Key::Symbol(_) => Kind::Symbol,
            Key::Undefined => Kind::Undefined,
        }
    }

    /// Unwraps an object-like key to its primitive form.
    ///
    /// Primitive keys, and wrappers without a primitive form, unwrap to themselves.
    #[must_use]
    pub fn to_primitive(&self) -> &Key {
        match self {
            Key::Function(boxed) | Key::Object(boxed) | Key::Symbol(boxed) => boxed.primitive().unwrap_or(self),
            _ => self,
        }
    }
}

/// The default total order over [`Key`]s.
///
/// 1. Keys of different kinds order by [`Kind::tag`].
/// 2. Numbers order numerically, except that NaN equals NaN and is less than every
///    other number.
/// 3. Object-like keys (functions, objects, symbols) are unwrapped with
///    [`Key::to_primitive`]. If the unwrapped kinds differ their tags decide; if the
///    unwrapped kind is still object-like the keys are equal; otherwise the unwrapped
///    values are compared.
/// 4. Everything else compares by value.
///
/// Rule 3 means two object-like keys of the same kind that cannot be unwrapped are
/// equal and occupy a single map slot.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use ranked_btree::{polymorphic_compare, Boxed, Key};
///
/// assert_eq!(polymorphic_compare(&Key::from(f64::NAN), &Key::from(-1e300)), Ordering::Less);
/// assert_eq!(polymorphic_compare(&Key::from(true), &Key::Null), Ordering::Less);
/// assert_eq!(
///     polymorphic_compare(&Key::Object(Boxed::opaque()), &Key::Object(Boxed::opaque())),
///     Ordering::Equal,
/// );
/// ```
#[must_use]
pub fn polymorphic_compare(a: &Key, b: &Key) -> Ordering {
    let (kind_a, kind_b) = (a.kind(), b.kind());
    if kind_a != kind_b {
        return kind_a.cmp(&kind_b);
    }

    match (a, b) {
        (Key::Number(x), Key::Number(y)) => compare_numbers(*x, *y),
        (Key::Bool(x), Key::Bool(y)) => x.cmp(y),
        (Key::String(x), Key::String(y)) => x.cmp(y),
        _ if kind_a.is_wrapper() => {
            let (a, b) = (a.to_primitive(), b.to_primitive());
            let (kind_a, kind_b) = (a.kind(), b.kind());
            if kind_a != kind_b {
                kind_a.cmp(&kind_b)
            } else if kind_a.is_wrapper() {
                // Unwrapping made no progress.
                Ordering::Equal
            } else {
                polymorphic_compare(a, b)
            }
        }
        // Null and Undefined each form a single value.
        _ => Ordering::Equal,
    }
}

fn compare_numbers(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        polymorphic_compare(self, other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        polymorphic_compare(self, other)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{b}"),
            Key::Number(n) => write!(f, "{n}"),
            Key::String(s) => write!(f, "{s:?}"),
            Key::Null => f.write_str("null"),
            Key::Undefined => f.write_str("undefined"),
            Key::Function(boxed) | Key::Object(boxed) | Key::Symbol(boxed) => match boxed.primitive() {
                Some(primitive) => write!(f, "{}({primitive})", self.kind()),
                None => write!(f, "{}", self.kind()),
            },
        }
    }
}

impl From<bool> for Key {
    fn from(value: bool) -> Self {
        Key::Bool(value)
    }
}

impl From<f64> for Key {
    fn from(value: f64) -> Self {
        Key::Number(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Number(f64::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Number(f64::from(value))
    }
}

impl From<i64> for Key {
    /// Values beyond 2^53 in magnitude are rounded to the nearest `f64`.
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Key::Number(value as f64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::String(String::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::String(value)
    }
}

impl From<Boxed> for Key {
    fn from(value: Boxed) -> Self {
        Key::Object(value)
    }
}

impl<T: Into<Key>> From<Option<T>> for Key {
    /// `None` becomes [`Key::Null`].
    fn from(value: Option<T>) -> Self {
        value.map_or(Key::Null, Into::into)
    }
}
