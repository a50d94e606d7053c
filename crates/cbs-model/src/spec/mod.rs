mod service;
pub use service::ServiceSpec;
