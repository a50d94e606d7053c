mod env;
pub use env::{Env, KeyValue};

mod role;
pub use role::ComponentRole;

mod metadata;
pub use metadata::MetadataKey;

mod endpoint;
pub use endpoint::Endpoint;

mod constants;
pub use constants::*;

/// Logical identifier for a supervised service slot.
///
/// The controller admits at most one running instance per slot.
pub type Slot = String;
