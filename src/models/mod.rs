mod forms;
pub mod entity;
pub mod resource;

pub use forms::FormFields;
pub use entity::{NamedOption, Record};
pub use resource::{Field, FieldKind, Resource};
