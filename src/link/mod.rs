//! Wireless link contract shared by both nodes.

pub mod mailbox;
pub mod message;
pub mod peer;

pub use mailbox::{Mailbox, SendOutcome, SendOutcomeSlot};
pub use message::{DecodeError, SequenceCounter, WireMessage, WIRE_LEN};
pub use peer::{AddressParseError, PeerAddress};
