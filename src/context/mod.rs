//! Scoped helpers: temporary attribute patches and error collection.

mod catch_errors;
mod set_attr;

pub use catch_errors::{CatchErrors, CaughtErrors};
pub use set_attr::{AttrTarget, SetAttr, SetAttrGuard};
