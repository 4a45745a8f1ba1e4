//! Core widget client: session identity, message dispatch, response
//! polling, and event emission for one embedded chat widget instance.

mod error;
mod events;
mod poller;
mod session;
mod transport;
mod widget;

pub use error::WidgetError;
pub use events::{EventBus, ListenerId};
pub use poller::{PollerState, ResponsePoller};
pub use session::{Session, generate_session_id, generate_uid};
pub use transport::{ChatApi, HttpChatApi};
pub use widget::{ChatWidget, WidgetState};
