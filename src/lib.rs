//! # AwningLink
//!
//! Two-node wireless awning remote over ESP-NOW.
//!
//! ## Architecture
//!
//! ```text
//! SENDER (battery remote)                      RECEIVER (relay board)
//! buttons ─▶ debounce ─▶ arbiter ─▶ dispatch ~~~▶ callback ─▶ Mailbox
//!                 │                                            │
//!             power (sleep)                   main loop ◀──────┘
//!                                               ├─▶ validator ─▶ output arbiter ─▶ relays
//!                                               └─▶ fail-safe watchdog
//! ```
//!
//! Core logic is `no_std`, owns its state, and takes time as an argument.
//! Hardware is reached through the capability traits in [`hal`]; the
//! ESP-IDF implementations live in `platform` and are only built for
//! `target_os = "espidf"`.

#![cfg_attr(not(test), no_std)]

#[cfg(target_os = "espidf")]
extern crate std;

pub mod battery;
pub mod buttons;
pub mod config;
pub mod dispatch;
pub mod fault;
pub mod hal;
pub mod link;
pub mod power;
pub mod receiver;
pub mod sender;
pub mod status;

#[cfg(target_os = "espidf")]
pub mod platform;

pub use buttons::{Arbitration, ButtonArbiter, ButtonCommand, ButtonMask, InputDebouncer};
pub use config::{ReceiverConfig, SenderConfig};
pub use fault::{FaultCode, FaultLog};
pub use link::{Mailbox, PeerAddress, SendOutcome, SendOutcomeSlot, WireMessage};
pub use power::{PowerState, SenderPowerController, WakeCause};
pub use receiver::{FailSafeWatchdog, OutputArbiter, ReceiveValidator, ReceiverNode};
pub use sender::{SenderBoard, SenderNode};
pub use status::StatusPattern;
