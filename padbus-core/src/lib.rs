//! Platform-agnostic session layer for the controller bus.
//!
//! Up to three controllers share one bus with a central hub. Each controller
//! picks an ephemeral [`DeviceId`], asks the hub for a seat, and - once
//! granted a stable [`PlayerId`] - streams its input state every scheduler
//! tick. The hub owns the seat assignments and evicts players that go
//! silent.
//!
//! # Overview
//!
//! The crate is organized into several modules:
//!
//! - [`slot`]: Fixed-capacity player registry ([`SlotTable`])
//! - [`hub`]: Hub-side session manager ([`HubSession`])
//! - [`controller`]: Controller-side state machine ([`ControllerSession`])
//! - [`bus`]: Transport seam ([`FrameBus`], [`RawFrame`])
//! - [`runtime`]: Tick-loop glue binding sessions to a scheduler and
//!   transport ([`HubRuntime`], [`ControllerRuntime`])
//!
//! # Concurrency Model
//!
//! Everything here is single-threaded and cooperative: the embedder calls
//! `tick(now)` at a fixed period and forwards received frames. Received
//! frames are only *copied* on arrival ([`RawFrame`]) and queued; all state
//! mutation happens inside `tick`, so a transport that completes receives
//! from interrupt context never touches session state directly. No
//! operation blocks, and all work per tick is bounded by [`MAX_PLAYERS`]
//! and the inbound queue depth.
//!
//! # Example
//!
//! ```
//! use padbus_core::{FrameBus, HubConfig, HubRuntime, SendError};
//! use padbus_core::proto::BusAddress;
//!
//! struct NullBus;
//! impl FrameBus for NullBus {
//!     fn send(&mut self, _addr: BusAddress, _bytes: &[u8]) -> Result<(), SendError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut hub = HubRuntime::new(HubConfig::default());
//! let mut bus = NullBus;
//!
//! // transport receive completion (possibly interrupt context): copy + queue
//! hub.on_frame_received(BusAddress::CONNECTION_REQUEST, &[7]);
//!
//! // cooperative loop: drain + dispatch + liveness sweep
//! hub.tick(0, &mut bus);
//! assert_eq!(hub.session().connected_slots().len(), 1);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.
//! Logging goes through the `log` facade; the embedder picks the backend.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod controller;
pub mod hub;
pub mod runtime;
pub mod slot;

pub use padbus_proto as proto;

// Re-export main types at crate root
pub use bus::{FrameBus, RawFrame, SendError};
pub use controller::{ControllerConfig, ControllerSession, InputSampler, Phase};
pub use hub::{HubConfig, HubSession};
pub use runtime::{ControllerRuntime, FrameQueue, HubRuntime, FRAME_QUEUE_DEPTH};
pub use slot::{PlayerState, SlotTable, SlotsFull, MAX_PLAYERS};

// Convenience re-exports of the wire types most callers need
pub use padbus_proto::{Axes, Buttons, DeviceId, PlayerId};
