//! CleanTrack event bus and notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ComplianceEvent`]: the events published when alerts open or close and
//!   when cleanings are recorded.
//! - [`NotificationDispatcher`]: background service that turns events into
//!   emails for facility managers and admins.
//! - [`delivery`]: the SMTP email channel.

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod message;

pub use bus::{ComplianceEvent, EventBus};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError, NotificationSink};
pub use dispatcher::NotificationDispatcher;
pub use message::EmailMessage;
