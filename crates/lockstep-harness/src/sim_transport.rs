//! In-memory lossy link between one requester pipe and one replier.
//!
//! The link is two bounded FIFO queues sharing a seeded RNG. Each direction
//! drops frames with its own probability, so a run with a given
//! [`SimConfig`] loses the same frames every time.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use bytes::Bytes;
use lockstep_core::transport::{Pipe, RecvOutcome, SendOutcome, TransportError};
use lockstep_proto::Envelope;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Link behavior knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Probability that a request frame is lost on its way to the replier.
    pub request_loss: f64,
    /// Probability that a reply frame is lost on its way back.
    pub reply_loss: f64,
    /// Frames each direction holds before the sender sees `Busy`.
    pub capacity: usize,
    /// RNG seed for loss decisions.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { request_loss: 0.0, reply_loss: 0.0, capacity: 64, seed: 0 }
    }
}

/// Counters kept by the link itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Request frames that reached the replier queue.
    pub requests_delivered: u64,
    /// Request frames dropped by the loss model.
    pub requests_lost: u64,
    /// Reply frames that reached the requester queue.
    pub replies_delivered: u64,
    /// Reply frames dropped by the loss model.
    pub replies_lost: u64,
    /// Frames the replier could not decode as envelopes.
    pub malformed: u64,
}

struct LinkState {
    config: SimConfig,
    rng: ChaCha20Rng,
    to_replier: VecDeque<Bytes>,
    to_requester: VecDeque<Bytes>,
    closed: bool,
    stats: LinkStats,
}

impl LinkState {
    fn lose(&mut self, probability: f64) -> bool {
        probability > 0.0 && self.rng.gen_bool(probability.min(1.0))
    }
}

type Shared = Arc<Mutex<LinkState>>;

fn lock(state: &Shared) -> MutexGuard<'_, LinkState> {
    state.lock().unwrap_or_else(|e| {
        // SAFETY: Turmoil is single threaded. Mutex can only be poisoned if another
        // thread panics while holding the lock.
        unreachable!("link mutex poisoned in single-threaded context: {}", e)
    })
}

/// Create a connected requester pipe and replier.
pub fn sim_link(config: SimConfig) -> (SimPipe, SimReplier) {
    let state = Arc::new(Mutex::new(LinkState {
        rng: ChaCha20Rng::seed_from_u64(config.seed),
        config,
        to_replier: VecDeque::new(),
        to_requester: VecDeque::new(),
        closed: false,
        stats: LinkStats::default(),
    }));
    (SimPipe { state: Arc::clone(&state) }, SimReplier { state })
}

/// Requester end of a link, plugged into an `XReq` router.
pub struct SimPipe {
    state: Shared,
}

impl std::fmt::Debug for SimPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("SimPipe")
            .field("outbound", &state.to_replier.len())
            .field("inbound", &state.to_requester.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl Pipe for SimPipe {
    fn send(&mut self, frame: &[u8]) -> Result<SendOutcome, TransportError> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(TransportError::Closed);
        }
        if state.to_replier.len() >= state.config.capacity {
            return Ok(SendOutcome::Busy);
        }

        let loss = state.config.request_loss;
        if state.lose(loss) {
            state.stats.requests_lost += 1;
        } else {
            state.to_replier.push_back(Bytes::copy_from_slice(frame));
            state.stats.requests_delivered += 1;
        }
        Ok(SendOutcome::Sent)
    }

    /// Frames are returned whole; `max_len` is only a hint, so the socket
    /// still sees the full reply length.
    fn recv(&mut self, _max_len: usize) -> Result<RecvOutcome, TransportError> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(TransportError::Closed);
        }

        Ok(match state.to_requester.pop_front() {
            Some(frame) => RecvOutcome::Frame(frame),
            None => RecvOutcome::NoData,
        })
    }
}

/// Replier end of a link.
///
/// Answers requests by echoing each envelope header with a payload computed
/// by the caller's handler.
#[derive(Clone)]
pub struct SimReplier {
    state: Shared,
}

impl SimReplier {
    /// Answer every queued request.
    ///
    /// Malformed frames are counted and skipped. Returns the number of
    /// requests answered, including answers the loss model then drops or
    /// that find the reply queue full.
    pub fn serve<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(&[u8]) -> Vec<u8>,
    {
        let mut state = lock(&self.state);
        let mut served = 0;

        while let Some(frame) = state.to_replier.pop_front() {
            let request = match Envelope::decode(frame) {
                Ok(request) => request,
                Err(err) => {
                    tracing::trace!(error = %err, "replier skipped malformed frame");
                    state.stats.malformed += 1;
                    continue;
                },
            };

            let reply = Envelope::new(request.request_id(), &handler(request.payload()));
            push_reply(&mut state, Bytes::copy_from_slice(reply.as_bytes()));
            served += 1;
        }

        served
    }

    /// Queue a raw frame for the requester, subject to loss and capacity.
    ///
    /// Returns true if the frame was queued.
    pub fn inject(&self, frame: Bytes) -> bool {
        push_reply(&mut lock(&self.state), frame)
    }

    /// Take queued request frames without answering them.
    pub fn take_requests(&self) -> Vec<Bytes> {
        lock(&self.state).to_replier.drain(..).collect()
    }

    /// Number of request frames waiting for the replier.
    pub fn pending_requests(&self) -> usize {
        lock(&self.state).to_replier.len()
    }

    /// Replace the link's loss and capacity settings. The RNG keeps its
    /// position.
    pub fn reconfigure(&self, config: SimConfig) {
        lock(&self.state).config = config;
    }

    /// Close the link; the requester pipe reports `Closed` from then on.
    pub fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        state.to_replier.clear();
        state.to_requester.clear();
    }

    /// Link counters
    pub fn stats(&self) -> LinkStats {
        lock(&self.state).stats
    }
}

impl std::fmt::Debug for SimReplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimReplier").field("stats", &self.stats()).finish_non_exhaustive()
    }
}

fn push_reply(state: &mut LinkState, frame: Bytes) -> bool {
    if state.closed || state.to_requester.len() >= state.config.capacity {
        return false;
    }

    let loss = state.config.reply_loss;
    if state.lose(loss) {
        state.stats.replies_lost += 1;
        return false;
    }

    state.to_requester.push_back(frame);
    state.stats.replies_delivered += 1;
    true
}

#[cfg(test)]
mod tests {
    use lockstep_proto::RequestId;

    use super::*;

    fn echo(payload: &[u8]) -> Vec<u8> {
        payload.to_vec()
    }

    #[test]
    fn lossless_echo() {
        let (mut pipe, replier) = sim_link(SimConfig::default());
        let request = Envelope::new(RequestId::new(7), b"ping");

        assert_eq!(pipe.send(request.as_bytes()), Ok(SendOutcome::Sent));
        assert_eq!(replier.serve(echo), 1);
        assert_eq!(pipe.recv(64), Ok(RecvOutcome::Frame(Bytes::copy_from_slice(request.as_bytes()))));
        assert_eq!(pipe.recv(64), Ok(RecvOutcome::NoData));
    }

    #[test]
    fn full_queue_reports_busy() {
        let (mut pipe, replier) = sim_link(SimConfig { capacity: 1, ..SimConfig::default() });

        assert_eq!(pipe.send(b"\x80\0\0\x01"), Ok(SendOutcome::Sent));
        assert_eq!(pipe.send(b"\x80\0\0\x02"), Ok(SendOutcome::Busy));
        assert_eq!(replier.pending_requests(), 1);
    }

    #[test]
    fn total_loss_drops_everything() {
        let (mut pipe, replier) =
            sim_link(SimConfig { request_loss: 1.0, ..SimConfig::default() });

        for _ in 0..10 {
            assert_eq!(pipe.send(b"\x80\0\0\x01"), Ok(SendOutcome::Sent));
        }
        assert_eq!(replier.pending_requests(), 0);
        assert_eq!(replier.stats().requests_lost, 10);
    }

    #[test]
    fn malformed_requests_are_skipped() {
        let (mut pipe, replier) = sim_link(SimConfig::default());

        pipe.send(b"\x00\0\0\x01junk").unwrap();
        pipe.send(b"\x80").unwrap();

        assert_eq!(replier.serve(echo), 0);
        assert_eq!(replier.stats().malformed, 2);
    }

    #[test]
    fn recv_ignores_max_len() {
        let (mut pipe, replier) = sim_link(SimConfig::default());
        replier.inject(Bytes::from_static(b"\x80\0\0\x01abcdef"));

        assert_eq!(
            pipe.recv(6),
            Ok(RecvOutcome::Frame(Bytes::from_static(b"\x80\0\0\x01abcdef")))
        );
    }

    #[test]
    fn closed_link_reports_closed() {
        let (mut pipe, replier) = sim_link(SimConfig::default());
        replier.close();

        assert_eq!(pipe.send(b"\x80\0\0\x01"), Err(TransportError::Closed));
        assert_eq!(pipe.recv(16), Err(TransportError::Closed));
    }

    #[test]
    fn same_seed_loses_same_frames() {
        let config = SimConfig { request_loss: 0.5, seed: 42, ..SimConfig::default() };
        let run = |config: SimConfig| {
            let (mut pipe, replier) = sim_link(config);
            for i in 0..32u8 {
                pipe.send(&[0x80, 0, 0, i]).unwrap();
            }
            replier.take_requests()
        };

        assert_eq!(run(config.clone()), run(config));
    }
}
