//! Fixed-capacity player slot registry.
//!
//! The table owns the device-identity mapping and the liveness timestamps.
//! Both directions of the mapping (identity to slot, slot to identity) are
//! updated together on assignment and release, so neither side can observe
//! a binding the other disputes.

use heapless::{FnvIndexMap, Vec};
use log::{debug, info, warn};
use padbus_proto::{Axes, Buttons, DeviceId, PlayerId};

/// Number of player slots on the hub.
pub const MAX_PLAYERS: usize = 3;

// FnvIndexMap capacity must be a power of two
const DEVICE_INDEX_CAP: usize = 4;

/// Returned by [`SlotTable::try_assign`] when every slot is occupied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotsFull;

/// Live state of one occupied slot.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayerState {
    /// Identity that claimed the slot.
    pub device_id: DeviceId,
    pub axes: Axes,
    pub buttons: Buttons,
    /// Monotonic time of occupation or of the last accepted input frame.
    pub last_input_ms: u64,
}

/// Registry of player slots, fixed at [`MAX_PLAYERS`].
///
/// Slots are created unoccupied, claimed through [`try_assign`], refreshed
/// by [`record_input`], and cleared by [`release`] or the periodic
/// [`sweep`].
///
/// [`try_assign`]: SlotTable::try_assign
/// [`record_input`]: SlotTable::record_input
/// [`release`]: SlotTable::release
/// [`sweep`]: SlotTable::sweep
#[derive(Default)]
pub struct SlotTable {
    slots: [Option<PlayerState>; MAX_PLAYERS],
    device_index: FnvIndexMap<i8, u8, DEVICE_INDEX_CAP>,
}

impl SlotTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `device_id` to a slot.
    ///
    /// If the identity already holds a slot, that slot is returned again
    /// (replayed handshakes are idempotent). Otherwise the lowest-index
    /// unoccupied slot is claimed and its liveness timestamp set to `now`.
    /// When no slot is free nothing is mutated and [`SlotsFull`] is
    /// returned.
    pub fn try_assign(&mut self, device_id: DeviceId, now: u64) -> Result<PlayerId, SlotsFull> {
        if let Some(&idx) = self.device_index.get(&device_id.0) {
            return Ok(PlayerId(idx as i8));
        }

        let free = self
            .slots
            .iter()
            .position(|slot| slot.is_none())
            .ok_or(SlotsFull)?;

        // The map holds one entry per occupied slot, so with a slot free
        // there is always room for one more.
        let inserted = self.device_index.insert(device_id.0, free as u8);
        debug_assert!(inserted.is_ok());

        self.slots[free] = Some(PlayerState {
            device_id,
            axes: Axes::NEUTRAL,
            buttons: Buttons::NONE,
            last_input_ms: now,
        });
        info!("device {} assigned to slot {}", device_id.0, free);
        Ok(PlayerId(free as i8))
    }

    /// Store an input update and refresh the slot's liveness timestamp.
    ///
    /// Out-of-range ids and unoccupied slots are logged and ignored; a late
    /// frame for an evicted slot never resurrects it.
    pub fn record_input(&mut self, player_id: PlayerId, axes: Axes, buttons: Buttons, now: u64) {
        let Some(idx) = player_id.index().filter(|&i| i < MAX_PLAYERS) else {
            warn!("input for invalid player id {}", player_id.0);
            return;
        };
        match &mut self.slots[idx] {
            Some(state) => {
                state.axes = axes;
                state.buttons = buttons;
                state.last_input_ms = now;
            }
            None => debug!("input for unoccupied slot {}, dropped", idx),
        }
    }

    /// Clear a slot and both directions of its identity mapping.
    ///
    /// No-op if the slot is already unoccupied or the id is out of range.
    pub fn release(&mut self, player_id: PlayerId) {
        let Some(idx) = player_id.index().filter(|&i| i < MAX_PLAYERS) else {
            return;
        };
        if let Some(state) = self.slots[idx].take() {
            self.device_index.remove(&state.device_id.0);
            info!("slot {} released (device {})", idx, state.device_id.0);
        }
    }

    /// Evict every occupied slot whose last input is older than
    /// `timeout_ms`.
    ///
    /// Runs in slot-index order; each slot is judged independently against
    /// `now`.
    pub fn sweep(&mut self, now: u64, timeout_ms: u64) {
        for idx in 0..MAX_PLAYERS {
            let stale = matches!(
                &self.slots[idx],
                Some(state) if now.saturating_sub(state.last_input_ms) > timeout_ms
            );
            if stale {
                info!("slot {} inactive for more than {} ms, evicting", idx, timeout_ms);
                self.release(PlayerId(idx as i8));
            }
        }
    }

    /// Currently occupied slots in ascending order.
    #[must_use]
    pub fn connected_slots(&self) -> Vec<PlayerId, MAX_PLAYERS> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| PlayerId(idx as i8))
            .collect()
    }

    /// Read-only view of one slot's state, if occupied.
    #[must_use]
    pub fn player_state(&self, player_id: PlayerId) -> Option<&PlayerState> {
        self.slots.get(player_id.index()?)?.as_ref()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_distinct_identities_distinct_slots() {
        let mut table = SlotTable::new();
        let a = table.try_assign(DeviceId(5), 0).unwrap();
        let b = table.try_assign(DeviceId(9), 0).unwrap();
        let c = table.try_assign(DeviceId(11), 0).unwrap();
        assert_eq!(a, PlayerId(0));
        assert_eq!(b, PlayerId(1));
        assert_eq!(c, PlayerId(2));
    }

    #[test]
    fn test_assign_is_idempotent_per_identity() {
        let mut table = SlotTable::new();
        let first = table.try_assign(DeviceId(5), 0).unwrap();
        let second = table.try_assign(DeviceId(5), 100).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.occupied_count(), 1);
    }

    #[test]
    fn test_assign_full_leaves_state_untouched() {
        let mut table = SlotTable::new();
        for id in [5, 9, 11] {
            table.try_assign(DeviceId(id), 0).unwrap();
        }
        assert_eq!(table.try_assign(DeviceId(13), 0), Err(SlotsFull));
        // the rejected identity gained no mapping
        assert_eq!(table.occupied_count(), 3);
        table.release(PlayerId(1));
        assert_eq!(table.try_assign(DeviceId(13), 0), Ok(PlayerId(1)));
    }

    #[test]
    fn test_release_clears_both_mapping_directions() {
        let mut table = SlotTable::new();
        let id = table.try_assign(DeviceId(5), 0).unwrap();
        table.release(id);
        assert!(table.connected_slots().is_empty());
        assert!(table.player_state(id).is_none());
        // same identity assigns fresh, lowest slot again
        assert_eq!(table.try_assign(DeviceId(5), 0), Ok(PlayerId(0)));
    }

    #[test]
    fn test_release_unoccupied_is_noop() {
        let mut table = SlotTable::new();
        table.release(PlayerId(1));
        table.release(PlayerId(7));
        table.release(PlayerId::REJECTED);
        assert!(table.connected_slots().is_empty());
    }

    #[test]
    fn test_record_input_refreshes_timestamp() {
        let mut table = SlotTable::new();
        let id = table.try_assign(DeviceId(5), 0).unwrap();
        table.record_input(id, Axes::new(0.5, 0.0, 0.0), Buttons::SHOOT, 200);
        let state = table.player_state(id).unwrap();
        assert_eq!(state.last_input_ms, 200);
        assert_eq!(state.buttons, Buttons::SHOOT);
        assert_eq!(state.axes.vertical, 0.5);
    }

    #[test]
    fn test_record_input_never_resurrects() {
        let mut table = SlotTable::new();
        let id = table.try_assign(DeviceId(5), 0).unwrap();
        table.release(id);
        table.record_input(id, Axes::NEUTRAL, Buttons::NONE, 300);
        assert!(table.player_state(id).is_none());
        assert!(table.connected_slots().is_empty());
    }

    #[test]
    fn test_record_input_out_of_range_ignored() {
        let mut table = SlotTable::new();
        table.record_input(PlayerId(7), Axes::NEUTRAL, Buttons::NONE, 0);
        table.record_input(PlayerId::REJECTED, Axes::NEUTRAL, Buttons::NONE, 0);
        assert!(table.connected_slots().is_empty());
    }

    #[test]
    fn test_sweep_boundary() {
        let mut table = SlotTable::new();
        let id = table.try_assign(DeviceId(5), 0).unwrap();
        table.record_input(id, Axes::NEUTRAL, Buttons::NONE, 200);

        // 1150 - 200 = 950 <= 1000: stays
        table.sweep(1150, 1000);
        assert_eq!(table.connected_slots().len(), 1);

        // exactly at the timeout is still alive
        table.sweep(1200, 1000);
        assert_eq!(table.connected_slots().len(), 1);

        // 1300 - 200 = 1100 > 1000: evicted
        table.sweep(1300, 1000);
        assert!(table.connected_slots().is_empty());
    }

    #[test]
    fn test_sweep_judges_slots_independently() {
        let mut table = SlotTable::new();
        let a = table.try_assign(DeviceId(5), 0).unwrap();
        let b = table.try_assign(DeviceId(9), 0).unwrap();
        table.record_input(b, Axes::NEUTRAL, Buttons::NONE, 900);

        table.sweep(1500, 1000);
        assert!(table.player_state(a).is_none());
        assert!(table.player_state(b).is_some());
        assert_eq!(table.connected_slots().as_slice(), &[b]);
    }

    #[test]
    fn test_connected_slots_ascending() {
        let mut table = SlotTable::new();
        for id in [5, 9, 11] {
            table.try_assign(DeviceId(id), 0).unwrap();
        }
        table.release(PlayerId(1));
        let connected = table.connected_slots();
        assert_eq!(connected.as_slice(), &[PlayerId(0), PlayerId(2)]);
    }

    #[test]
    fn test_assign_stamps_liveness_at_occupation() {
        let mut table = SlotTable::new();
        let id = table.try_assign(DeviceId(5), 400).unwrap();
        assert_eq!(table.player_state(id).unwrap().last_input_ms, 400);
    }
}
