//! Attributes - the values a rule set reads and derives.
//!
//! Attributes are not declared up front. Any name can be an input, a rule
//! target or a rule source, and several logical namespaces (abilities,
//! combat stats, feature flags, validation notes) share one flat map.

mod map;
mod name;
mod value;

pub use map::AttributeMap;
pub use name::AttrName;
pub use value::Value;
