//! Async polling driver for a REQ socket over a simulated link.
//!
//! The socket is sans-IO, so something has to move time forward, poll the
//! link and tick the resend timer. [`SimClient`] is that loop for tests: it
//! sleeps on the environment (virtual time under turmoil) between polls and
//! lets the replier run in between.

use std::time::Duration;

use bytes::Bytes;
use lockstep_core::{
    DeadlineTimer, PipeId, ReqConfig, ReqError, ReqSocket, Router, SocketProtocol, XReq,
    env::Environment,
};
use tracing::debug;

use crate::sim_transport::{SimPipe, SimReplier};

/// REQ socket wired to an `XReq` router and a deadline timer.
pub type SimSocket<E> = ReqSocket<XReq<SimPipe>, DeadlineTimer<E>>;

/// Default time between polls of the link.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A REQ socket plus the loop that drives it.
#[derive(Debug)]
pub struct SimClient<E: Environment> {
    env: E,
    socket: SimSocket<E>,
    poll_interval: Duration,
}

impl<E: Environment> SimClient<E> {
    /// Create a client with no pipes attached.
    pub fn new(env: E, config: ReqConfig) -> Self {
        let socket = ReqSocket::new(&env, XReq::new(), DeadlineTimer::new(env.clone()), config);
        Self { env, socket, poll_interval: DEFAULT_POLL_INTERVAL }
    }

    /// Change the time between polls.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Attach a link's requester end.
    pub fn attach(&mut self, pipe: SimPipe) -> PipeId {
        self.socket.add_pipe(pipe)
    }

    /// The driven socket
    pub fn socket(&self) -> &SimSocket<E> {
        &self.socket
    }

    /// The driven socket, mutably
    pub fn socket_mut(&mut self) -> &mut SimSocket<E> {
        &mut self.socket
    }

    /// Send `payload` and poll until its reply arrives.
    ///
    /// Between polls every replier answers queued requests with `handler`.
    /// Lost requests and replies are recovered only by the socket's resend
    /// timer.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error from the socket. With the
    /// request in progress there is none, so in practice this only returns
    /// once a reply is accepted.
    pub async fn request<F>(
        &mut self,
        payload: &[u8],
        repliers: &[SimReplier],
        mut handler: F,
    ) -> Result<Bytes, ReqError>
    where
        F: FnMut(&[u8]) -> Vec<u8>,
    {
        self.socket.send(payload);
        let id = self.socket.current_request_id();

        loop {
            for replier in repliers {
                replier.serve(&mut handler);
            }

            match self.poll() {
                Ok(reply) => {
                    debug!(request_id = %id, len = reply.len(), "reply accepted");
                    return Ok(reply);
                },
                Err(err) if err.is_transient() => {},
                Err(err) => return Err(err),
            }

            self.env.sleep(self.poll_interval).await;
            self.socket.tick();
        }
    }

    /// Mark every pipe ready and try to take one reply.
    ///
    /// The simulated pipes raise no readiness events, so each poll re-arms
    /// the router's readiness flags before receiving.
    ///
    /// # Errors
    ///
    /// As [`ReqSocket::recv_msg`].
    pub fn poll(&mut self) -> Result<Bytes, ReqError> {
        let router = self.socket.router_mut();
        for id in router.pipe_ids() {
            router.pipe_readable(id);
            router.pipe_writable(id);
        }
        self.socket.recv_msg()
    }

    /// Sleep on the environment, then run the resend timer if it expired.
    ///
    /// Returns true if a retransmission happened.
    pub async fn idle(&mut self, duration: Duration) -> bool {
        self.env.sleep(duration).await;
        self.socket.tick()
    }
}
