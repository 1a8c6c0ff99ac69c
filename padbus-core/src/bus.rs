//! Transport seam: the outbound frame trait and the copyable inbound record.

use padbus_proto::{BusAddress, MAX_FRAME_LEN};

/// Error type for transmit operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Transmit mailbox full or arbitration lost.
    Busy,
    /// Transport-level I/O failure.
    Io,
}

/// Outbound side of the shared bus.
///
/// Implementations wrap the real transport peripheral (or a test double).
/// Delivery is best-effort: the session layer reports failures to its
/// caller and never retries a send.
pub trait FrameBus {
    /// Queue one frame for transmission at the given address.
    fn send(&mut self, addr: BusAddress, bytes: &[u8]) -> Result<(), SendError>;
}

/// One received frame, copied out of the transport's buffer.
///
/// Receive completion handlers build a `RawFrame` and hand it to a runtime
/// queue; decoding and all session-state mutation happen later, on the
/// cooperative tick.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawFrame {
    addr: BusAddress,
    len: u8,
    data: [u8; MAX_FRAME_LEN],
}

impl RawFrame {
    /// Copy a received payload. Returns `None` if it exceeds
    /// [`MAX_FRAME_LEN`]; such frames cannot be well-formed and are dropped
    /// at the edge.
    #[must_use]
    pub fn copy_from(addr: BusAddress, bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_FRAME_LEN {
            return None;
        }
        let mut data = [0u8; MAX_FRAME_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            addr,
            len: bytes.len() as u8,
            data,
        })
    }

    #[inline]
    #[must_use]
    pub fn addr(&self) -> BusAddress {
        self.addr
    }

    /// The received payload.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}
