pub mod error;
pub mod types;
pub mod value;

pub use error::{MoatError, Result};
pub use types::AttributeType;
pub use value::Value;
