//! Weft Resolver
//!
//! Two concerns live here, both about data-flow between components:
//!
//! - **Validation** ([`validate_workflow`]): a construction-time walk of the
//!   component tree that rejects duplicate names within a scope, ill-formed
//!   reference expressions, and references to components not declared earlier
//!   in the visible scope. Catches ordering bugs before a run starts.
//! - **Resolution** ([`resolve_inputs`]): the runtime lookup of a step's
//!   declared inputs against the workflow output map, immediately before the
//!   step body executes.
//!
//! The reference mini-language is a single form: `"{ComponentName.outputKey}"`,
//! matched verbatim against the output map key `"ComponentName.outputKey"`.
//! No nested braces, no expressions, no escaping.

mod error;
mod reference;
mod resolver;
mod validate;

pub use error::ValidationError;
pub use reference::{parse_reference, reference_key};
pub use resolver::resolve_inputs;
pub use validate::validate_workflow;
