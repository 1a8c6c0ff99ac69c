//! Fixed-layout bus frames and the tagged decode entry point.
//!
//! Three frames exist on the bus, one per address:
//!
//! - [`ConnectionRequest`] at `0x000`: 1 byte, the controller's device id.
//! - [`ConnectionResponse`] at `0x100`: device id echo plus granted player
//!   id (or [`PlayerId::REJECTED`]); encoded as 8 bytes with the trailing
//!   six reserved, decoded from any length in 2..=8.
//! - [`InputFrame`] at `0x200`: 8 bytes, player id, three scaled i16 axes,
//!   button mask.
//!
//! Decoding is pure and never panics; wrong-length payloads are reported as
//! [`FrameError::Length`] for the caller to discard. Encoding always
//! produces the fixed length declared for the frame type.

use crate::signal::{decode_axis, encode_axis};
use crate::types::{Axes, Buttons, DeviceId, PlayerId};

/// Largest frame the bus carries.
pub const MAX_FRAME_LEN: usize = 8;

/// Fixed bus address a frame is sent to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusAddress(pub u16);

impl BusAddress {
    /// Controller-to-hub connection request.
    pub const CONNECTION_REQUEST: Self = Self(0x000);
    /// Hub-to-controller connection response.
    pub const CONNECTION_RESPONSE: Self = Self(0x100);
    /// Controller-to-hub periodic input.
    pub const PLAYER_INPUT: Self = Self(0x200);
}

/// Structural decode failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload length does not match the frame's declared layout.
    Length,
    /// No frame type is assigned to the address.
    UnknownAddress,
}

/// Controller's request for a player slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionRequest {
    pub device_id: DeviceId,
}

impl ConnectionRequest {
    /// Declared frame length.
    pub const LEN: usize = 1;

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        [self.device_id.0 as u8]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != Self::LEN {
            return Err(FrameError::Length);
        }
        Ok(Self {
            device_id: DeviceId(bytes[0] as i8),
        })
    }
}

/// Hub's answer to a connection request.
///
/// `player_id` is the granted slot, or [`PlayerId::REJECTED`] when the hub
/// is full. The response is addressed to every controller; receivers match
/// on `device_id` to find their own answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionResponse {
    pub device_id: DeviceId,
    pub player_id: PlayerId,
}

impl ConnectionResponse {
    /// Declared frame length. Bytes past the first two are reserved.
    pub const LEN: usize = 8;

    /// Shortest payload a peer may legally send.
    pub const MIN_LEN: usize = 2;

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0] = self.device_id.0 as u8;
        out[1] = self.player_id.0 as u8;
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < Self::MIN_LEN || bytes.len() > Self::LEN {
            return Err(FrameError::Length);
        }
        Ok(Self {
            device_id: DeviceId(bytes[0] as i8),
            player_id: PlayerId(bytes[1] as i8),
        })
    }
}

/// Periodic controller state, sent once connected.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputFrame {
    pub player_id: PlayerId,
    pub axes: Axes,
    pub buttons: Buttons,
}

impl InputFrame {
    /// Declared frame length.
    pub const LEN: usize = 8;

    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0] = self.player_id.0 as u8;
        out[1..3].copy_from_slice(&encode_axis(self.axes.vertical).to_le_bytes());
        out[3..5].copy_from_slice(&encode_axis(self.axes.horizontal).to_le_bytes());
        out[5..7].copy_from_slice(&encode_axis(self.axes.rotation).to_le_bytes());
        out[7] = self.buttons.raw();
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != Self::LEN {
            return Err(FrameError::Length);
        }
        Ok(Self {
            player_id: PlayerId(bytes[0] as i8),
            axes: Axes {
                vertical: decode_axis(i16::from_le_bytes([bytes[1], bytes[2]])),
                horizontal: decode_axis(i16::from_le_bytes([bytes[3], bytes[4]])),
                rotation: decode_axis(i16::from_le_bytes([bytes[5], bytes[6]])),
            },
            buttons: Buttons(bytes[7]),
        })
    }
}

/// Any frame the bus carries, tagged by type.
///
/// [`Message::decode`] is the single dispatch entry point: callers hand it
/// the address and payload of a received frame and match on the result
/// instead of registering per-address handlers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    Request(ConnectionRequest),
    Response(ConnectionResponse),
    Input(InputFrame),
}

impl Message {
    pub fn decode(addr: BusAddress, bytes: &[u8]) -> Result<Self, FrameError> {
        match addr {
            BusAddress::CONNECTION_REQUEST => ConnectionRequest::decode(bytes).map(Self::Request),
            BusAddress::CONNECTION_RESPONSE => {
                ConnectionResponse::decode(bytes).map(Self::Response)
            }
            BusAddress::PLAYER_INPUT => InputFrame::decode(bytes).map(Self::Input),
            _ => Err(FrameError::UnknownAddress),
        }
    }

    /// The address this frame type lives at.
    #[must_use]
    pub const fn address(&self) -> BusAddress {
        match self {
            Self::Request(_) => BusAddress::CONNECTION_REQUEST,
            Self::Response(_) => BusAddress::CONNECTION_RESPONSE,
            Self::Input(_) => BusAddress::PLAYER_INPUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_round_trip() {
        let req = ConnectionRequest {
            device_id: DeviceId(5),
        };
        assert_eq!(ConnectionRequest::decode(&req.encode()).unwrap(), req);

        let neg = ConnectionRequest {
            device_id: DeviceId(-12),
        };
        assert_eq!(ConnectionRequest::decode(&neg.encode()).unwrap(), neg);
    }

    #[test]
    fn test_request_rejects_bad_length() {
        assert_eq!(ConnectionRequest::decode(&[]), Err(FrameError::Length));
        assert_eq!(ConnectionRequest::decode(&[1, 2]), Err(FrameError::Length));
    }

    #[test]
    fn test_response_round_trip() {
        let resp = ConnectionResponse {
            device_id: DeviceId(42),
            player_id: PlayerId(2),
        };
        let bytes = resp.encode();
        assert_eq!(bytes.len(), ConnectionResponse::LEN);
        assert_eq!(&bytes[2..], &[0u8; 6]);
        assert_eq!(ConnectionResponse::decode(&bytes).unwrap(), resp);
        // re-encoding a decoded frame reproduces the original bytes
        assert_eq!(ConnectionResponse::decode(&bytes).unwrap().encode(), bytes);
    }

    #[test]
    fn test_response_rejection_sentinel() {
        let resp = ConnectionResponse {
            device_id: DeviceId(9),
            player_id: PlayerId::REJECTED,
        };
        let bytes = resp.encode();
        assert_eq!(bytes[1], 0xFF);
        let back = ConnectionResponse::decode(&bytes).unwrap();
        assert!(back.player_id.is_rejected());
    }

    #[test]
    fn test_response_accepts_short_frames() {
        let resp = ConnectionResponse::decode(&[42, 1]).unwrap();
        assert_eq!(resp.device_id, DeviceId(42));
        assert_eq!(resp.player_id, PlayerId(1));

        // reserved bytes are ignored
        let padded = ConnectionResponse::decode(&[42, 1, 9, 9, 9]).unwrap();
        assert_eq!(padded, resp);
    }

    #[test]
    fn test_response_rejects_bad_length() {
        assert_eq!(ConnectionResponse::decode(&[42]), Err(FrameError::Length));
        assert_eq!(
            ConnectionResponse::decode(&[0; 9]),
            Err(FrameError::Length)
        );
    }

    #[test]
    fn test_input_frame_layout() {
        let frame = InputFrame {
            player_id: PlayerId(1),
            axes: Axes::new(1.0, -1.0, 0.0),
            buttons: Buttons::SHOOT | Buttons::BACK,
        };
        let bytes = frame.encode();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..3], &100i16.to_le_bytes());
        assert_eq!(&bytes[3..5], &(-100i16).to_le_bytes());
        assert_eq!(&bytes[5..7], &0i16.to_le_bytes());
        assert_eq!(bytes[7], 0b1001);
    }

    #[test]
    fn test_input_frame_byte_round_trip() {
        // encode(decode(bytes)) == bytes for well-formed frames
        let cases = [
            [0u8, 0, 0, 0, 0, 0, 0, 0],
            [2, 100, 0, 0x9C, 0xFF, 50, 0, 0x0F],
            [1, 0xFF, 0x7F, 0x00, 0x80, 0x01, 0x00, 0xAA],
        ];
        for bytes in cases {
            let frame = InputFrame::decode(&bytes).unwrap();
            assert_eq!(frame.encode(), bytes);
        }
    }

    #[test]
    fn test_input_frame_clamps_out_of_range_axes() {
        let frame = InputFrame {
            player_id: PlayerId(0),
            axes: Axes::new(400.0, -400.0, 0.0),
            buttons: Buttons::NONE,
        };
        let bytes = frame.encode();
        assert_eq!(&bytes[1..3], &i16::MAX.to_le_bytes());
        assert_eq!(&bytes[3..5], &i16::MIN.to_le_bytes());
    }

    #[test]
    fn test_input_frame_rejects_bad_length() {
        assert_eq!(InputFrame::decode(&[0; 7]), Err(FrameError::Length));
        assert_eq!(InputFrame::decode(&[0; 9]), Err(FrameError::Length));
    }

    #[test]
    fn test_message_dispatch() {
        let req = Message::decode(BusAddress::CONNECTION_REQUEST, &[7]).unwrap();
        assert!(matches!(req, Message::Request(_)));
        assert_eq!(req.address(), BusAddress::CONNECTION_REQUEST);

        let resp = Message::decode(BusAddress::CONNECTION_RESPONSE, &[7, 0]).unwrap();
        assert!(matches!(resp, Message::Response(_)));

        let input = Message::decode(BusAddress::PLAYER_INPUT, &[0; 8]).unwrap();
        assert!(matches!(input, Message::Input(_)));
    }

    #[test]
    fn test_message_unknown_address() {
        assert_eq!(
            Message::decode(BusAddress(0x300), &[0]),
            Err(FrameError::UnknownAddress)
        );
    }

    #[test]
    fn test_message_propagates_length_errors() {
        assert_eq!(
            Message::decode(BusAddress::PLAYER_INPUT, &[0; 3]),
            Err(FrameError::Length)
        );
    }
}
