//! Controller-side session state machine.
//!
//! A controller starts disconnected, draws a fresh random identity, and
//! asks the hub for a slot. While waiting it retransmits the request on a
//! backoff schedule; after too many unanswered attempts it starts over
//! with a new identity. Once connected it samples its local inputs every
//! tick and streams them to the hub. There is no path out of Connected:
//! the hub's inactivity eviction is invisible from this side of the bus.

use log::{debug, info, warn};
use padbus_proto::{
    Axes, BusAddress, Buttons, ConnectionRequest, DeviceId, InputFrame, Message, PlayerId,
};

use crate::bus::{FrameBus, SendError};
use crate::slot::MAX_PLAYERS;

/// Local input seam: whatever produces the controller's axis and button
/// readings (ADC channels, GPIO, a test double).
pub trait InputSampler {
    /// Sample the current input state.
    fn sample(&mut self) -> (Axes, Buttons);
}

/// Controller-side tunables for the connection handshake.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Time to wait for a response before the first retransmit.
    pub response_timeout_ms: u64,
    /// Ceiling for the doubling retransmit backoff.
    pub max_backoff_ms: u64,
    /// Unanswered attempts before starting over with a fresh identity.
    pub max_attempts: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 200,
            max_backoff_ms: 1600,
            max_attempts: 5,
        }
    }
}

/// Connection phase of a controller session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Disconnected,
    AwaitingResponse,
    Connected,
}

// xorshift32, seeded by the embedder; draws feed the 7-bit identity space
struct IdentityRng {
    state: u32,
}

impl IdentityRng {
    fn new(seed: u32) -> Self {
        // xorshift has no escape from the all-zero state
        Self {
            state: if seed == 0 { 0x6C078965 } else { seed },
        }
    }

    fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    fn next_device_id(&mut self) -> DeviceId {
        DeviceId((self.next() & 0x7f) as i8)
    }
}

/// Per-controller session state machine.
///
/// Created once at controller startup and driven by [`tick`] and
/// [`on_frame`]; it is never destroyed while powered.
///
/// [`tick`]: ControllerSession::tick
/// [`on_frame`]: ControllerSession::on_frame
pub struct ControllerSession {
    phase: Phase,
    device_id: DeviceId,
    player_id: Option<PlayerId>,
    config: ControllerConfig,
    rng: IdentityRng,
    attempt: u8,
    deadline_ms: u64,
}

impl ControllerSession {
    /// `seed` feeds the identity generator; the embedder sources it from
    /// whatever entropy the platform has (ADC noise, a hardware RNG, a
    /// serial number).
    #[must_use]
    pub fn new(seed: u32, config: ControllerConfig) -> Self {
        Self {
            phase: Phase::Disconnected,
            device_id: DeviceId(0),
            player_id: None,
            config,
            rng: IdentityRng::new(seed),
            attempt: 0,
            deadline_ms: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// The granted slot, once connected.
    #[must_use]
    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    /// Drive the state machine one scheduler period forward.
    ///
    /// Transmissions are fire-and-forget: a failure is surfaced to the
    /// caller and the next tick (or the retransmit schedule) provides the
    /// retry.
    pub fn tick<S: InputSampler, B: FrameBus>(
        &mut self,
        now: u64,
        sampler: &mut S,
        bus: &mut B,
    ) -> Result<(), SendError> {
        match self.phase {
            Phase::Disconnected => self.start_connect(now, bus),
            Phase::AwaitingResponse => self.poll_retransmit(now, bus),
            Phase::Connected => self.send_input(sampler, bus),
        }
    }

    /// Consume one received frame.
    ///
    /// Only connection responses matching this session's device identity
    /// are considered; everything else (foreign responses, other frame
    /// types, malformed payloads) is ignored, never fatal.
    pub fn on_frame(&mut self, addr: BusAddress, bytes: &[u8], now: u64) {
        if self.phase != Phase::AwaitingResponse {
            return;
        }
        let Ok(Message::Response(resp)) = Message::decode(addr, bytes) else {
            return;
        };
        if resp.device_id != self.device_id {
            return;
        }

        match resp.player_id.index().filter(|&idx| idx < MAX_PLAYERS) {
            Some(_) => {
                info!("connected as player {}", resp.player_id.0);
                self.player_id = Some(resp.player_id);
                self.phase = Phase::Connected;
            }
            None => {
                // Hub is full. Keep the identity and retry later; a slot
                // may free up once the hub evicts an inactive player.
                warn!("hub rejected connection, retrying after backoff");
                self.deadline_ms = now + self.config.max_backoff_ms;
            }
        }
    }

    fn start_connect<B: FrameBus>(&mut self, now: u64, bus: &mut B) -> Result<(), SendError> {
        self.device_id = self.rng.next_device_id();
        self.player_id = None;
        self.attempt = 1;
        self.deadline_ms = now + self.config.response_timeout_ms;
        self.phase = Phase::AwaitingResponse;
        info!("requesting slot as device {}", self.device_id.0);
        self.send_request(bus)
    }

    fn poll_retransmit<B: FrameBus>(&mut self, now: u64, bus: &mut B) -> Result<(), SendError> {
        if now < self.deadline_ms {
            return Ok(());
        }
        if self.attempt >= self.config.max_attempts {
            warn!(
                "no response after {} attempts, restarting with a fresh identity",
                self.attempt
            );
            self.phase = Phase::Disconnected;
            return self.start_connect(now, bus);
        }

        self.attempt += 1;
        let exp = u32::from(self.attempt - 1).min(10);
        let backoff = (self.config.response_timeout_ms << exp).min(self.config.max_backoff_ms);
        self.deadline_ms = now + backoff;
        debug!("retransmitting connection request, attempt {}", self.attempt);
        self.send_request(bus)
    }

    fn send_request<B: FrameBus>(&mut self, bus: &mut B) -> Result<(), SendError> {
        let request = ConnectionRequest {
            device_id: self.device_id,
        };
        bus.send(BusAddress::CONNECTION_REQUEST, &request.encode())
    }

    fn send_input<S: InputSampler, B: FrameBus>(
        &mut self,
        sampler: &mut S,
        bus: &mut B,
    ) -> Result<(), SendError> {
        let Some(player_id) = self.player_id else {
            return Ok(());
        };
        let (axes, buttons) = sampler.sample();
        let frame = InputFrame {
            player_id,
            axes,
            buttons,
        };
        bus.send(BusAddress::PLAYER_INPUT, &frame.encode())
    }
}
