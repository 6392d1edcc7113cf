mod aliases;
mod defs;
mod health;

pub use aliases::{assign_aliases, delete_aliases, put_aliases, AliasQuery};
pub use defs::{create_def, delete_def, get_def, list_defs, update_def};
pub use health::{health_handler, HealthResponse};
