//! Broker actor and the handle that reaches it.

pub mod broker;
pub mod command;
pub mod handle;

pub use broker::Hub;
pub use handle::HubHandle;
