//! REQ socket: the requesting side of lockstep request/reply.
//!
//! # Architecture
//!
//! `ReqSocket` wraps a [`Router`] (normally [`XReq`](crate::xreq::XReq))
//! and a [`Timer`]. The router moves frames; the socket decides what goes
//! out and which reply is accepted. Nothing here blocks and nothing here
//! reads a clock: the timer collaborator owns time.
//!
//! # Request Lifecycle
//!
//! ```text
//!            send(P)                      recv() matches id
//! ┌──────┐ ─────────> ┌─────────────┐ ──────────────────────> ┌──────┐
//! │ Idle │            │ In progress │                         │ Idle │
//! └──────┘            └─────────────┘                         └──────┘
//!                       │  ↑     │ ↑
//!             send(P')  └──┘     └─┘  resend timer: retransmit, rearm
//!     (abandon, new id)
//! ```
//!
//! # Invariants
//!
//! - A pending request exists iff the resend timer is armed.
//! - At most one request is pending; a new send abandons the previous one.
//! - A reply is accepted only if it is marked and carries the current id.
//! - Resends reuse the stored envelope, so every copy is byte-identical.

use std::time::Duration;

use bytes::Bytes;
use lockstep_proto::{Envelope, EnvelopeHeader, RequestId};
use tracing::{debug, error, trace};

use crate::{
    correlation::RequestIdGenerator,
    env::Environment,
    error::ReqError,
    options::{INT_OPTION_SIZE, ReqConfig, SocketOption},
    socket::SocketProtocol,
    timer::Timer,
    transport::{PipeId, RecvOutcome, Router, SendOutcome},
};

/// Per-socket counters. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReqStats {
    /// Requests submitted through `send`
    pub requests_sent: u64,
    /// Retransmissions triggered by the resend timer
    pub resends: u64,
    /// Replies handed to the caller
    pub replies_accepted: u64,
    /// Frames dropped as malformed, unmarked or carrying a stale id
    pub replies_discarded: u64,
    /// Requests superseded by a newer send before a reply arrived
    pub requests_abandoned: u64,
    /// Transmissions (first sends and resends) the router reported busy
    pub transport_busy: u64,
}

/// Requesting socket with automatic retransmission.
#[derive(Debug)]
pub struct ReqSocket<R: Router, T: Timer> {
    router: R,
    timer: T,
    ids: RequestIdGenerator,
    /// Outstanding request; `Some` exactly while a request is in progress
    pending: Option<Envelope>,
    resend_interval_ms: i32,
    stats: ReqStats,
}

impl<R: Router, T: Timer> ReqSocket<R, T> {
    /// Create a socket whose correlation ids start at a random value.
    pub fn new(env: &impl Environment, router: R, timer: T, config: ReqConfig) -> Self {
        Self::from_generator(RequestIdGenerator::from_env(env), router, timer, config)
    }

    /// Create a socket with a fixed correlation-id seed (top bit masked).
    pub fn with_seed(seed: u32, router: R, timer: T, config: ReqConfig) -> Self {
        Self::from_generator(RequestIdGenerator::with_seed(seed), router, timer, config)
    }

    fn from_generator(ids: RequestIdGenerator, router: R, mut timer: T, config: ReqConfig) -> Self {
        timer.disarm();

        Self {
            router,
            timer,
            ids,
            pending: None,
            resend_interval_ms: config.resend_interval_millis(),
            stats: ReqStats::default(),
        }
    }

    /// True while a request is waiting for its reply
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.pending.is_some()
    }

    /// Id of the latest request (the seed before the first send)
    #[must_use]
    pub fn current_request_id(&self) -> RequestId {
        self.ids.current()
    }

    /// Envelope of the request in progress
    #[must_use]
    pub fn pending_request(&self) -> Option<&Envelope> {
        self.pending.as_ref()
    }

    /// Interval used the next time the resend timer is armed
    #[must_use]
    pub fn resend_interval(&self) -> Duration {
        Duration::from_millis(self.resend_interval_ms.unsigned_abs().into())
    }

    /// Change the resend interval. The running countdown is not touched.
    ///
    /// # Errors
    ///
    /// [`ReqError::InvalidArgument`] unless the interval is between 1 and
    /// `i32::MAX` milliseconds.
    pub fn set_resend_interval(&mut self, interval: Duration) -> Result<(), ReqError> {
        let millis = i32::try_from(interval.as_millis()).map_err(|_| {
            ReqError::InvalidArgument {
                option: SocketOption::ResendInterval,
                reason: format!("{interval:?} exceeds i32::MAX milliseconds"),
            }
        })?;
        self.apply_resend_interval(millis)
    }

    /// Counters since construction
    #[must_use]
    pub fn stats(&self) -> &ReqStats {
        &self.stats
    }

    /// Underlying router
    #[must_use]
    pub fn router(&self) -> &R {
        &self.router
    }

    /// Underlying router, mutably
    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    /// Resend timer
    #[must_use]
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Resend timer, mutably
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Send a request, abandoning any request still in progress.
    ///
    /// Never fails: if the router is busy the request is still recorded and
    /// the resend timer delivers it later.
    ///
    /// # Panics
    ///
    /// If the router fails with anything other than backpressure.
    pub fn send(&mut self, payload: &[u8]) {
        if let Some(abandoned) = self.pending.take() {
            self.timer.disarm();
            self.stats.requests_abandoned += 1;
            debug!(request_id = %abandoned.request_id(), "abandoning request in progress");
        }

        let id = self.ids.advance();
        let request = Envelope::new(id, payload);

        Self::transmit(&mut self.router, &mut self.stats, &request);

        self.pending = Some(request);
        let interval = self.resend_interval();
        self.timer.arm(interval);
        self.stats.requests_sent += 1;

        debug!(request_id = %id, len = payload.len(), "request sent");
        self.debug_assert_consistent();
    }

    /// Receive the reply to the request in progress.
    ///
    /// Copies up to `buf.len()` payload bytes and returns the full payload
    /// length; a result larger than `buf.len()` means the reply was
    /// truncated. Either way the request is complete afterwards.
    ///
    /// Exactly one candidate frame is inspected per call. A frame that is
    /// too short, unmarked, or tagged with another id is dropped and the call
    /// returns [`ReqError::TryAgain`] even if more frames are queued.
    ///
    /// # Errors
    ///
    /// - [`ReqError::InvalidState`] if no request is in progress
    /// - [`ReqError::TryAgain`] if no acceptable reply is available
    ///
    /// # Panics
    ///
    /// If the router fails with anything other than "no data".
    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, ReqError> {
        let reply = self.take_reply(buf.len())?;
        let payload = reply.payload();

        let copied = payload.len().min(buf.len());
        buf[..copied].copy_from_slice(&payload[..copied]);

        Ok(payload.len())
    }

    /// Receive the reply to the request in progress as an owned buffer.
    ///
    /// Same validation and state effects as [`ReqSocket::recv`], without a
    /// capacity limit.
    ///
    /// # Errors
    ///
    /// As [`ReqSocket::recv`].
    pub fn recv_msg(&mut self) -> Result<Bytes, ReqError> {
        self.take_reply(usize::MAX).map(Envelope::into_payload)
    }

    /// Run the resend callback if the timer has expired.
    ///
    /// Returns true if a retransmission happened. Drivers that poll call
    /// this after sleeping until the timer's deadline.
    pub fn tick(&mut self) -> bool {
        if !self.timer.take_expired() {
            return false;
        }

        self.on_resend_timer();
        true
    }

    /// Resend callback: retransmit the pending request unchanged and rearm.
    ///
    /// # Panics
    ///
    /// If no request is in progress (the timer is disarmed whenever a request
    /// completes, so this means the timer collaborator misbehaved), or if the
    /// router fails with anything other than backpressure.
    pub fn on_resend_timer(&mut self) {
        let Some(request) = self.pending.as_ref() else {
            error!("resend timer fired with no request in progress");
            panic!("resend timer fired with no request in progress");
        };

        trace!(request_id = %request.request_id(), "resending request");
        Self::transmit(&mut self.router, &mut self.stats, request);

        self.stats.resends += 1;
        let interval = self.resend_interval();
        self.timer.arm(interval);
        self.debug_assert_consistent();
    }

    fn take_reply(&mut self, capacity: usize) -> Result<Envelope, ReqError> {
        if self.pending.is_none() {
            return Err(ReqError::InvalidState { operation: "recv" });
        }

        let max_len = capacity.saturating_add(EnvelopeHeader::SIZE);
        let frame = match self.router.recv(max_len) {
            Ok(RecvOutcome::Frame(frame)) => frame,
            Ok(RecvOutcome::NoData) => return Err(ReqError::TryAgain),
            Err(err) => {
                error!(error = %err, "router recv failed");
                panic!("router recv failed: {err}");
            },
        };

        let reply = match Envelope::decode(frame) {
            Ok(reply) => reply,
            Err(err) => {
                self.stats.replies_discarded += 1;
                trace!(error = %err, "discarding malformed reply");
                return Err(ReqError::TryAgain);
            },
        };

        let expected = self.ids.current();
        if reply.request_id() != expected {
            self.stats.replies_discarded += 1;
            trace!(
                received = %reply.request_id(),
                expected = %expected,
                "discarding reply with stale request id"
            );
            return Err(ReqError::TryAgain);
        }

        self.timer.disarm();
        self.pending = None;
        self.stats.replies_accepted += 1;

        debug!(request_id = %expected, len = reply.payload().len(), "reply accepted");
        self.debug_assert_consistent();

        Ok(reply)
    }

    fn transmit(router: &mut R, stats: &mut ReqStats, request: &Envelope) {
        match router.send(request.as_bytes()) {
            Ok(SendOutcome::Sent) => {},
            Ok(SendOutcome::Busy) => {
                // Resend timer is the recovery path
                stats.transport_busy += 1;
                trace!(request_id = %request.request_id(), "router busy, deferring to resend");
            },
            Err(err) => {
                error!(request_id = %request.request_id(), error = %err, "router send failed");
                panic!("router send failed: {err}");
            },
        }
    }

    fn apply_resend_interval(&mut self, millis: i32) -> Result<(), ReqError> {
        if millis <= 0 {
            return Err(ReqError::InvalidArgument {
                option: SocketOption::ResendInterval,
                reason: format!("interval must be positive, got {millis}"),
            });
        }

        self.resend_interval_ms = millis;
        debug!(resend_interval_ms = millis, "resend interval updated");
        Ok(())
    }

    fn debug_assert_consistent(&self) {
        debug_assert_eq!(
            self.pending.is_some(),
            self.timer.is_armed(),
            "pending request and resend timer out of sync"
        );
    }
}

impl<R: Router, T: Timer> SocketProtocol for ReqSocket<R, T> {
    type Pipe = R::Pipe;

    fn add_pipe(&mut self, pipe: Self::Pipe) -> PipeId {
        self.router.add_pipe(pipe)
    }

    fn remove_pipe(&mut self, id: PipeId) -> Option<Self::Pipe> {
        self.router.remove_pipe(id)
    }

    fn pipe_readable(&mut self, id: PipeId) {
        self.router.pipe_readable(id);
    }

    fn pipe_writable(&mut self, id: PipeId) {
        self.router.pipe_writable(id);
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), ReqError> {
        ReqSocket::send(self, payload);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, ReqError> {
        ReqSocket::recv(self, buf)
    }

    fn set_option(&mut self, option: i32, value: &[u8]) -> Result<(), ReqError> {
        let Some(known) = SocketOption::from_raw(option) else {
            return Err(ReqError::UnsupportedOption(option));
        };

        match known {
            SocketOption::ResendInterval => {
                let encoded: [u8; INT_OPTION_SIZE] =
                    value.try_into().map_err(|_| ReqError::InvalidArgument {
                        option: known,
                        reason: format!(
                            "expected {INT_OPTION_SIZE} bytes, got {}",
                            value.len()
                        ),
                    })?;
                self.apply_resend_interval(i32::from_ne_bytes(encoded))
            },
        }
    }

    fn get_option(&self, option: i32, buf: &mut [u8]) -> Result<usize, ReqError> {
        let Some(known) = SocketOption::from_raw(option) else {
            return Err(ReqError::UnsupportedOption(option));
        };

        match known {
            SocketOption::ResendInterval => {
                if buf.len() < INT_OPTION_SIZE {
                    return Err(ReqError::InvalidArgument {
                        option: known,
                        reason: format!(
                            "buffer holds {} bytes, need {INT_OPTION_SIZE}",
                            buf.len()
                        ),
                    });
                }

                buf[..INT_OPTION_SIZE].copy_from_slice(&self.resend_interval_ms.to_ne_bytes());
                Ok(INT_OPTION_SIZE)
            },
        }
    }

    fn terminate(&mut self) {
        if let Some(request) = self.pending.take() {
            self.timer.disarm();
            debug!(request_id = %request.request_id(), "request dropped at termination");
        }

        self.router.terminate();
    }
}
