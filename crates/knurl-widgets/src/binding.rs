#![forbid(unsafe_code)]

//! Property boundary and operator hooks.
//!
//! Widgets never mutate application state directly. A [`PropertyBinding`]
//! is the seam: the embedder implements it over its own data model, and
//! the interaction layer reads, writes, and notifies through it. An
//! [`Operator`] is the heavier hook for actions (invoked from the deferred
//! queue after interaction state is torn down).
//!
//! # Invariants
//!
//! - `set` clamps to `range()` before storing; a binding never holds an
//!   out-of-range value.
//! - `notify_update` fires after a committed change only, never per-cell
//!   during a drag preview.

use std::cell::RefCell;
use std::collections::BTreeMap;

use knurl_core::event::Modifiers;
use knurl_core::geometry::Point;

/// A property value crossing the binding boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Boolean state (toggles).
    Bool(bool),
    /// Numeric state (sliders, fields, color channels).
    Float(f64),
    /// Enumeration index (menus).
    Index(usize),
    /// Free text.
    Text(String),
}

/// Valid range for a numeric property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropRange {
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl PropRange {
    /// Unbounded range.
    pub const UNBOUNDED: Self = Self {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    /// Construct a range.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        assert!(min <= max, "range must be ordered");
        Self { min, max }
    }

    /// Clamp a value into the range.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Errors arising at the binding boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The named property does not exist.
    UnknownProperty(String),
    /// The value's variant does not match the property's type.
    TypeMismatch(String),
    /// The property is read-only.
    ReadOnly(String),
}

impl std::fmt::Display for BindingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownProperty(name) => write!(f, "unknown property: {name}"),
            Self::TypeMismatch(name) => write!(f, "type mismatch for property: {name}"),
            Self::ReadOnly(name) => write!(f, "property is read-only: {name}"),
        }
    }
}

impl std::error::Error for BindingError {}

/// The seam between widgets and application data.
pub trait PropertyBinding {
    /// Read the current value.
    fn get(&self, prop: &str) -> Result<PropValue, BindingError>;

    /// Write a value. Numeric values are clamped to [`Self::range`]
    /// before storing.
    fn set(&mut self, prop: &str, value: PropValue) -> Result<(), BindingError>;

    /// Valid numeric range; [`PropRange::UNBOUNDED`] for non-numerics.
    fn range(&self, prop: &str) -> PropRange {
        let _ = prop;
        PropRange::UNBOUNDED
    }

    /// Whether the property accepts writes right now.
    fn editable(&self, prop: &str) -> bool {
        let _ = prop;
        true
    }

    /// Called once after a committed change has been stored.
    fn notify_update(&mut self, prop: &str) {
        let _ = prop;
    }
}

/// Snapshot of interaction state captured when an operator is queued.
///
/// Operators run after the originating widget is torn down, so they get
/// the pointer and modifier state from enqueue time, not run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpContext {
    /// Pointer position at enqueue time.
    pub pointer: Point,
    /// Modifier state at enqueue time.
    pub modifiers: Modifiers,
}

impl OpContext {
    /// Capture a context snapshot.
    #[must_use]
    pub fn new(pointer: Point, modifiers: Modifiers) -> Self {
        Self { pointer, modifiers }
    }
}

/// Outcome of an operator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpResult {
    /// Ran to completion; effects stand.
    Finished,
    /// Declined or aborted; effects were not applied.
    Cancelled,
}

/// An action hook attached to a widget.
///
/// Operators are shared handles (`Rc<dyn Operator>`): a queued action
/// holds its own reference, so teardown of the widget that queued it
/// cannot invalidate the hook. Methods take `&self`; operators keep any
/// mutable state behind interior mutability.
pub trait Operator {
    /// Whether the operator can run in this context.
    fn poll(&self, ctx: &OpContext) -> bool {
        let _ = ctx;
        true
    }

    /// Run the operator.
    fn invoke(&self, ctx: &OpContext) -> OpResult;
}

/// In-memory binding over a string-keyed map.
///
/// The reference embedder implementation, used heavily in tests. Records
/// every `notify_update` so tests can assert notification counts.
#[derive(Debug, Default)]
pub struct MapBinding {
    values: BTreeMap<String, PropValue>,
    ranges: BTreeMap<String, PropRange>,
    locked: Vec<String>,
    notify_log: RefCell<Vec<String>>,
}

impl MapBinding {
    /// Empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property (builder).
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: PropValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Constrain a numeric property (builder).
    #[must_use]
    pub fn with_range(mut self, name: impl Into<String>, min: f64, max: f64) -> Self {
        self.ranges.insert(name.into(), PropRange::new(min, max));
        self
    }

    /// Mark a property read-only (builder).
    #[must_use]
    pub fn with_locked(mut self, name: impl Into<String>) -> Self {
        self.locked.push(name.into());
        self
    }

    /// Drain the recorded notification log.
    pub fn drain_notifications(&self) -> Vec<String> {
        self.notify_log.borrow_mut().drain(..).collect()
    }
}

impl PropertyBinding for MapBinding {
    fn get(&self, prop: &str) -> Result<PropValue, BindingError> {
        self.values
            .get(prop)
            .cloned()
            .ok_or_else(|| BindingError::UnknownProperty(prop.to_owned()))
    }

    fn set(&mut self, prop: &str, value: PropValue) -> Result<(), BindingError> {
        if self.locked.iter().any(|p| p == prop) {
            return Err(BindingError::ReadOnly(prop.to_owned()));
        }
        let slot = self
            .values
            .get_mut(prop)
            .ok_or_else(|| BindingError::UnknownProperty(prop.to_owned()))?;
        if std::mem::discriminant(slot) != std::mem::discriminant(&value) {
            return Err(BindingError::TypeMismatch(prop.to_owned()));
        }
        *slot = match value {
            PropValue::Float(v) => {
                let range = self.ranges.get(prop).copied().unwrap_or(PropRange::UNBOUNDED);
                PropValue::Float(range.clamp(v))
            }
            other => other,
        };
        Ok(())
    }

    fn range(&self, prop: &str) -> PropRange {
        self.ranges.get(prop).copied().unwrap_or(PropRange::UNBOUNDED)
    }

    fn editable(&self, prop: &str) -> bool {
        self.values.contains_key(prop) && !self.locked.iter().any(|p| p == prop)
    }

    fn notify_update(&mut self, prop: &str) {
        self.notify_log.borrow_mut().push(prop.to_owned());
    }
}
