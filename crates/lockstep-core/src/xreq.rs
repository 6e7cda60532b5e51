//! Request router over many pipes.
//!
//! `XReq` is the raw, unchecked half of the request/reply pattern: it moves
//! frames without looking at them. Requests are load-balanced round-robin
//! across writable pipes and replies are fair-queued round-robin across
//! readable pipes, so no single peer can starve the others.
//!
//! # Readiness
//!
//! A pipe that answers `Busy` is skipped by `send` until the owner reports
//! [`Router::pipe_writable`]; a pipe that answers `NoData` is skipped by
//! `recv` until [`Router::pipe_readable`]. A pipe that answers
//! [`TransportError::Closed`] is dropped on the spot and the next pipe is
//! tried.

use tracing::{debug, trace};

use crate::transport::{Pipe, PipeId, RecvOutcome, Router, SendOutcome, TransportError};

#[derive(Debug)]
struct Slot<P> {
    id: PipeId,
    pipe: P,
    readable: bool,
    writable: bool,
}

/// Load-balancing, fair-queuing router.
#[derive(Debug)]
pub struct XReq<P> {
    slots: Vec<Slot<P>>,
    next_id: u64,
    send_cursor: usize,
    recv_cursor: usize,
}

impl<P: Pipe> XReq<P> {
    /// Create a router with no pipes
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new(), next_id: 0, send_cursor: 0, recv_cursor: 0 }
    }

    /// Number of attached pipes
    #[must_use]
    pub fn pipe_count(&self) -> usize {
        self.slots.len()
    }

    /// Borrow an attached pipe
    #[must_use]
    pub fn pipe(&self, id: PipeId) -> Option<&P> {
        self.slots.iter().find(|slot| slot.id == id).map(|slot| &slot.pipe)
    }

    /// Ids of the attached pipes, in attach order
    pub fn pipe_ids(&self) -> Vec<PipeId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    /// Borrow an attached pipe mutably
    pub fn pipe_mut(&mut self, id: PipeId) -> Option<&mut P> {
        self.slot_mut(id).map(|slot| &mut slot.pipe)
    }

    fn slot_mut(&mut self, id: PipeId) -> Option<&mut Slot<P>> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    fn drop_closed(&mut self, index: usize) {
        let slot = self.slots.remove(index);
        debug!(pipe = %slot.id, "dropping closed pipe");
    }
}

impl<P: Pipe> Default for XReq<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pipe> Router for XReq<P> {
    type Pipe = P;

    fn add_pipe(&mut self, pipe: P) -> PipeId {
        let id = PipeId(self.next_id);
        self.next_id += 1;
        self.slots.push(Slot { id, pipe, readable: true, writable: true });
        debug!(pipe = %id, pipes = self.slots.len(), "pipe attached");
        id
    }

    fn remove_pipe(&mut self, id: PipeId) -> Option<P> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        let slot = self.slots.remove(index);
        debug!(pipe = %id, pipes = self.slots.len(), "pipe detached");
        Some(slot.pipe)
    }

    fn pipe_readable(&mut self, id: PipeId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.readable = true;
        }
    }

    fn pipe_writable(&mut self, id: PipeId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.writable = true;
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<SendOutcome, TransportError> {
        let mut tried = 0;

        // Each pass either visits one slot or removes one, so this terminates.
        while tried < self.slots.len() {
            let index = self.send_cursor % self.slots.len();

            if !self.slots[index].writable {
                self.send_cursor = index + 1;
                tried += 1;
                continue;
            }

            match self.slots[index].pipe.send(frame) {
                Ok(SendOutcome::Sent) => {
                    trace!(pipe = %self.slots[index].id, len = frame.len(), "frame sent");
                    self.send_cursor = index + 1;
                    return Ok(SendOutcome::Sent);
                },
                Ok(SendOutcome::Busy) => {
                    self.slots[index].writable = false;
                    self.send_cursor = index + 1;
                    tried += 1;
                },
                Err(TransportError::Closed) => {
                    self.drop_closed(index);
                    self.send_cursor = index;
                },
                Err(err) => return Err(err),
            }
        }

        Ok(SendOutcome::Busy)
    }

    fn recv(&mut self, max_len: usize) -> Result<RecvOutcome, TransportError> {
        let mut tried = 0;

        while tried < self.slots.len() {
            let index = self.recv_cursor % self.slots.len();

            if !self.slots[index].readable {
                self.recv_cursor = index + 1;
                tried += 1;
                continue;
            }

            match self.slots[index].pipe.recv(max_len) {
                Ok(RecvOutcome::Frame(frame)) => {
                    trace!(pipe = %self.slots[index].id, len = frame.len(), "frame received");
                    self.recv_cursor = index + 1;
                    return Ok(RecvOutcome::Frame(frame));
                },
                Ok(RecvOutcome::NoData) => {
                    self.slots[index].readable = false;
                    self.recv_cursor = index + 1;
                    tried += 1;
                },
                Err(TransportError::Closed) => {
                    self.drop_closed(index);
                    self.recv_cursor = index;
                },
                Err(err) => return Err(err),
            }
        }

        Ok(RecvOutcome::NoData)
    }

    fn terminate(&mut self) {
        debug!(pipes = self.slots.len(), "router terminated");
        self.slots.clear();
        self.send_cursor = 0;
        self.recv_cursor = 0;
    }
}
