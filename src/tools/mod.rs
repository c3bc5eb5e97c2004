pub mod directives;
pub mod executor;

pub use directives::{extract, ActionDirective, Directives};
pub use executor::{ActionError, ActionExecutor, ActionResult, Confirmation};
