//! Domain layer: value objects, the connection entity, room membership and
//! the broker interface the other layers depend on.

pub mod backlog;
pub mod broker;
pub mod connection;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod value_object;

pub use backlog::{Backlog, DEFAULT_BACKLOG_CAPACITY};
#[cfg(test)]
pub use broker::MockMessageBroker;
pub use broker::MessageBroker;
pub use connection::{
    Connection, Delivery, LinkState, OutboundReceiver, OutboundSender, WeakOutboundSender,
};
pub use error::{HubError, ValueObjectError};
pub use registry::{JoinOutcome, LeaveOutcome, Registry, RoomLimitReached};
pub use snapshot::{ConnectionSnapshot, HubSnapshot, RoomDetail, RoomSnapshot};
pub use value_object::{ConnectionId, DisplayName, Generation, RoomName, Timestamp};
