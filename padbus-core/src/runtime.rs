//! Tick-loop glue binding sessions to a scheduler and transport.
//!
//! The transport delivers received frames from its own completion context,
//! possibly an interrupt. The runtimes therefore split reception in two:
//! [`on_frame_received`](HubRuntime::on_frame_received) only copies the
//! payload into a bounded queue, and the next `tick` - invoked by the
//! embedder's periodic scheduler - drains the queue and runs all session
//! logic on the cooperative loop. The bus is lossy by design, so a full
//! queue drops the newest frame.

use heapless::Deque;
use log::warn;
use padbus_proto::BusAddress;

use crate::bus::{FrameBus, RawFrame};
use crate::controller::{ControllerSession, InputSampler};
use crate::hub::{HubConfig, HubSession};

/// Frames buffered between ticks.
pub const FRAME_QUEUE_DEPTH: usize = 8;

/// Bounded inbound frame buffer.
#[derive(Default)]
pub struct FrameQueue {
    frames: Deque<RawFrame, FRAME_QUEUE_DEPTH>,
}

impl FrameQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a received frame. Returns `false` when the queue is full
    /// and the frame was dropped.
    pub fn push(&mut self, frame: RawFrame) -> bool {
        self.frames.push_back(frame).is_ok()
    }

    pub fn pop(&mut self) -> Option<RawFrame> {
        self.frames.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Binds a [`HubSession`] to the scheduler and transport.
pub struct HubRuntime {
    session: HubSession,
    inbox: FrameQueue,
}

impl HubRuntime {
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            session: HubSession::new(config),
            inbox: FrameQueue::new(),
        }
    }

    /// Receive-completion entry point: copy the frame and return.
    ///
    /// Safe to call from the transport's delivery context; no session
    /// state is touched here. Oversized frames and queue overflow drop the
    /// frame.
    pub fn on_frame_received(&mut self, addr: BusAddress, bytes: &[u8]) {
        match RawFrame::copy_from(addr, bytes) {
            Some(frame) => {
                if !self.inbox.push(frame) {
                    warn!("hub inbox full, dropping frame at {:#05x}", addr.0);
                }
            }
            None => warn!("oversized frame at {:#05x}, dropped", addr.0),
        }
    }

    /// One scheduler period: drain queued frames, then run the liveness
    /// sweep.
    pub fn tick<B: FrameBus>(&mut self, now: u64, bus: &mut B) {
        while let Some(frame) = self.inbox.pop() {
            if let Err(err) = self.session.on_frame(frame.addr(), frame.bytes(), now, bus) {
                warn!("transmit failed while answering a request: {:?}", err);
            }
        }
        self.session.tick(now);
    }

    #[must_use]
    pub fn session(&self) -> &HubSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut HubSession {
        &mut self.session
    }
}

/// Binds a [`ControllerSession`] to the scheduler and transport.
pub struct ControllerRuntime {
    session: ControllerSession,
    inbox: FrameQueue,
}

impl ControllerRuntime {
    #[must_use]
    pub fn new(session: ControllerSession) -> Self {
        Self {
            session,
            inbox: FrameQueue::new(),
        }
    }

    /// Receive-completion entry point: copy the frame and return.
    pub fn on_frame_received(&mut self, addr: BusAddress, bytes: &[u8]) {
        match RawFrame::copy_from(addr, bytes) {
            Some(frame) => {
                if !self.inbox.push(frame) {
                    warn!("controller inbox full, dropping frame at {:#05x}", addr.0);
                }
            }
            None => warn!("oversized frame at {:#05x}, dropped", addr.0),
        }
    }

    /// One scheduler period: drain queued frames, then drive the state
    /// machine (request, retransmit, or input transmission).
    pub fn tick<S: InputSampler, B: FrameBus>(&mut self, now: u64, sampler: &mut S, bus: &mut B) {
        while let Some(frame) = self.inbox.pop() {
            self.session.on_frame(frame.addr(), frame.bytes(), now);
        }
        if let Err(err) = self.session.tick(now, sampler, bus) {
            warn!("transmit failed: {:?}", err);
        }
    }

    #[must_use]
    pub fn session(&self) -> &ControllerSession {
        &self.session
    }
}
