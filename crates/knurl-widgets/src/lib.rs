#![forbid(unsafe_code)]

//! Widget data model, property boundary, and value-edit engines for Knurl.

pub mod binding;
pub mod multi_drag;
pub mod text_edit;
pub mod value_drag;
pub mod widget;

pub use binding::{BindingError, Operator, OpContext, OpResult, PropRange, PropValue,
    PropertyBinding};
pub use widget::{ColorChannel, ColorField, MenuField, NumberField, NumberScale, TextField,
    Widget, WidgetFlags, WidgetId, WidgetKind};
