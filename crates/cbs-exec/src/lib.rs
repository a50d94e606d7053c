//! Tag reconciliation through an external program.
//!
//! The controller delegates the actual cloud-side tagging to a command (for example a
//! script around the CBS API client). Each pass spawns the command once with the request
//! passed through the environment; a non-zero exit is a failed pass.
mod error;
pub use error::ExecError;

mod command;
pub use command::{ENV_REGION, ReconcileCommand};

mod reconciler;
pub use reconciler::CommandTagReconciler;
