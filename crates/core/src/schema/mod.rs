pub mod model;
pub mod registry;

pub use model::{FieldDef, FieldSchema, FieldType};
pub use registry::{EntityDef, EntityRegistry};
