pub mod events;
pub mod socket;

pub use events::{CorrelationOutcome, EventCorrelator, PushMessage};
pub use socket::{ConnectionStatus, RealtimeClient};
