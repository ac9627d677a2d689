//! Audio focus providers

mod local_broker;

pub use local_broker::LocalFocusBroker;
