//! Real-time session protocol: framing, validation, rooms and dispatch.

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod payloads;
pub mod rooms;
pub mod session;
pub mod validation;

pub use dispatcher::Dispatcher;
pub use error::ConnectionRefused;
pub use events::{
    ClientFrame, ConnectionResponse, DiagramNotFound, ErrorNotice, ModelDeleted, ModelRepDeleted,
    ServerEvent, UserPresence, error_types,
};
pub use rooms::RoomBus;
pub use session::Session;
pub use validation::{Schema, ValidationError, validate};
