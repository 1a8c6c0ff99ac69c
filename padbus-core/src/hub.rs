//! Hub-side session management.
//!
//! The hub has no state machine of its own; connection state is implicit in
//! the slot table's occupancy. Connection requests drive the allocator and
//! are always answered, input frames refresh slots, and the periodic tick
//! runs the liveness sweep.

use heapless::Vec;
use log::{debug, warn};
use padbus_proto::{
    BusAddress, ConnectionRequest, ConnectionResponse, InputFrame, Message, PlayerId,
};

use crate::bus::{FrameBus, SendError};
use crate::slot::{PlayerState, SlotTable, SlotsFull, MAX_PLAYERS};

/// Hub-side tunables.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HubConfig {
    /// A slot with no accepted input for longer than this is evicted by the
    /// periodic sweep.
    pub inactivity_timeout_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: 1000,
        }
    }
}

/// Owns the slot table and answers bus traffic addressed to the hub.
///
/// Explicitly constructed and passed into callbacks by the embedder; the
/// crate keeps no global state.
pub struct HubSession {
    slots: SlotTable,
    config: HubConfig,
}

impl HubSession {
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            slots: SlotTable::new(),
            config,
        }
    }

    /// Decode-then-dispatch entry point for one received frame.
    ///
    /// Malformed frames are dropped without a transmission. Responses seen
    /// on the bus are the hub's own traffic and are ignored. The returned
    /// error is a transmit failure from answering a request; the frame
    /// itself was consumed either way.
    pub fn on_frame<B: FrameBus>(
        &mut self,
        addr: BusAddress,
        bytes: &[u8],
        now: u64,
        bus: &mut B,
    ) -> Result<(), SendError> {
        match Message::decode(addr, bytes) {
            Ok(Message::Request(req)) => self.handle_request(req, now, bus),
            Ok(Message::Input(frame)) => {
                self.handle_input(frame, now);
                Ok(())
            }
            Ok(Message::Response(_)) => Ok(()),
            Err(err) => {
                warn!("dropping malformed frame at {:#05x}: {:?}", addr.0, err);
                Ok(())
            }
        }
    }

    /// Answer a connection request.
    ///
    /// Every request gets a response, including replays from an identity
    /// that already holds a slot. When the table is full the response
    /// carries [`PlayerId::REJECTED`].
    pub fn handle_request<B: FrameBus>(
        &mut self,
        req: ConnectionRequest,
        now: u64,
        bus: &mut B,
    ) -> Result<(), SendError> {
        let player_id = match self.slots.try_assign(req.device_id, now) {
            Ok(id) => id,
            Err(SlotsFull) => {
                warn!("no free slot for device {}", req.device_id.0);
                PlayerId::REJECTED
            }
        };

        let response = ConnectionResponse {
            device_id: req.device_id,
            player_id,
        };
        bus.send(BusAddress::CONNECTION_RESPONSE, &response.encode())
            .map_err(|err| {
                warn!("failed to send connection response: {:?}", err);
                err
            })
    }

    /// Record an input frame against its slot.
    pub fn handle_input(&mut self, frame: InputFrame, now: u64) {
        debug!("input from player {}", frame.player_id.0);
        self.slots
            .record_input(frame.player_id, frame.axes, frame.buttons, now);
    }

    /// Periodic work: run the liveness sweep once per scheduler period.
    pub fn tick(&mut self, now: u64) {
        self.slots.sweep(now, self.config.inactivity_timeout_ms);
    }

    /// Explicitly disconnect a player, freeing its slot and identity.
    pub fn disconnect(&mut self, player_id: PlayerId) {
        self.slots.release(player_id);
    }

    /// Occupied slots in ascending order, for status indicators.
    #[must_use]
    pub fn connected_slots(&self) -> Vec<PlayerId, MAX_PLAYERS> {
        self.slots.connected_slots()
    }

    /// Latest recorded state for one player.
    #[must_use]
    pub fn player_state(&self, player_id: PlayerId) -> Option<&PlayerState> {
        self.slots.player_state(player_id)
    }

    #[must_use]
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }
}
