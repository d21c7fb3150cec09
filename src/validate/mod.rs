mod cycles;
mod validator;

pub use cycles::find_cycles;
pub use validator::{StateValidator, ValidationError, ValidationResult};
