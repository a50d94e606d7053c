mod cluster;
pub use cluster::ClusterClientSource;

mod input;
pub use input::ConfigInput;

mod limits;
pub use limits::{TagSyncInterval, VolumeAttachLimit};

mod runtime;
pub use runtime::RuntimeConfig;
