//! Frame layouts, signal scaling, and codecs for the controller bus.
//!
//! This crate provides everything needed to work with the controller bus
//! protocol:
//!
//! - **Types**: Core data structures shared by controllers and the hub
//!   - [`Buttons`] - Button state bitfield
//!   - [`Axes`] - Vertical/horizontal/rotation axis snapshot
//!   - [`DeviceId`] - Ephemeral identity a controller picks for the handshake
//!   - [`PlayerId`] - Stable slot identity granted by the hub
//!
//! - **Frames**: The three fixed-layout bus frames
//!   - [`ConnectionRequest`] - Controller asks for a player slot
//!   - [`ConnectionResponse`] - Hub grants a slot or rejects
//!   - [`InputFrame`] - Periodic controller state once connected
//!   - [`Message`] - Tagged union with a single decode entry point
//!
//! # Wire Format
//!
//! Three fixed-address frames, all signals little-endian:
//!
//! | Address | Frame              | Length | Layout                                 |
//! |---------|--------------------|--------|----------------------------------------|
//! | `0x000` | ConnectionRequest  | 1      | device id (i8)                         |
//! | `0x100` | ConnectionResponse | 2-8    | device id (i8), player id (i8), rsvd   |
//! | `0x200` | InputFrame         | 8      | player id, 3 x i16 axes, button mask   |
//!
//! Axis values are normalized floats packed as i16 with a 0.01 scale factor.
//! A response player id of `-1` ([`PlayerId::REJECTED`]) means the hub has no
//! free slot.
//!
//! # Examples
//!
//! ## Decoding a received frame
//!
//! ```
//! use padbus_proto::{BusAddress, Message};
//!
//! let msg = Message::decode(BusAddress::CONNECTION_REQUEST, &[7]).unwrap();
//! assert!(matches!(msg, Message::Request(_)));
//! ```
//!
//! ## Encoding a response
//!
//! ```
//! use padbus_proto::{ConnectionResponse, DeviceId, PlayerId};
//!
//! let resp = ConnectionResponse {
//!     device_id: DeviceId(42),
//!     player_id: PlayerId(1),
//! };
//! let bytes = resp.encode();
//! assert_eq!(bytes[0], 42);
//! assert_eq!(ConnectionResponse::decode(&bytes).unwrap(), resp);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod frame;
pub mod signal;
pub mod types;

// Re-export types at crate root for convenience
pub use frame::{
    BusAddress, ConnectionRequest, ConnectionResponse, FrameError, InputFrame, Message,
    MAX_FRAME_LEN,
};
pub use signal::{decode_axis, encode_axis, AXIS_SCALE};
pub use types::{Axes, Buttons, DeviceId, PlayerId};
