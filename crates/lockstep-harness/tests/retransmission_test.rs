//! End-to-end REQ socket tests over simulated links in turmoil virtual time.
//!
//! Every resend interval here is short (100ms) so a test with dozens of
//! retransmissions still fits in a few simulated seconds.

use std::{
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use bytes::Bytes;
use lockstep_core::{ReqConfig, ReqError, ReqStats, Timer, env::Environment};
use lockstep_harness::{LinkStats, SimClient, SimConfig, SimEnv, sim_link};
use lockstep_proto::Envelope;

const RESEND: Duration = Duration::from_millis(100);

fn config() -> ReqConfig {
    ReqConfig { resend_interval: RESEND }
}

fn echo(payload: &[u8]) -> Vec<u8> {
    payload.to_vec()
}

fn reversed(payload: &[u8]) -> Vec<u8> {
    payload.iter().rev().copied().collect()
}

fn simulate<F>(client: F)
where
    F: Future<Output = turmoil::Result> + 'static,
{
    let mut sim = turmoil::Builder::new().simulation_duration(Duration::from_secs(120)).build();
    sim.client("client", client);
    sim.run().expect("simulation failed");
}

#[test]
fn lossless_link_needs_no_resend() {
    simulate(async {
        let mut client = SimClient::new(SimEnv::with_seed(1), config());
        let (pipe, replier) = sim_link(SimConfig::default());
        client.attach(pipe);

        let reply = client.request(b"hello", &[replier], echo).await?;

        assert_eq!(reply, Bytes::from_static(b"hello"));
        let stats = client.socket().stats();
        assert_eq!(stats.resends, 0);
        assert_eq!(stats.replies_accepted, 1);
        assert!(!client.socket().is_in_progress());

        Ok(())
    });
}

fn lossy_run(seed: u64) -> (ReqStats, LinkStats) {
    let captured = Arc::new(Mutex::new(None));
    let captured_clone = Arc::clone(&captured);

    simulate(async move {
        let mut client = SimClient::new(SimEnv::with_seed(seed), config());
        let (pipe, replier) = sim_link(SimConfig {
            request_loss: 0.3,
            reply_loss: 0.3,
            seed,
            ..SimConfig::default()
        });
        client.attach(pipe);
        let repliers = [replier];

        for i in 0..20u8 {
            let payload = [i, i.wrapping_mul(3), 0xAB];
            let reply = client.request(&payload, &repliers, reversed).await?;
            assert_eq!(&reply[..], &reversed(&payload)[..], "request {i} got a foreign reply");
        }

        *captured_clone.lock().unwrap() = Some((*client.socket().stats(), repliers[0].stats()));
        Ok(())
    });

    let result = captured.lock().unwrap().take();
    result.expect("client should have captured stats")
}

#[test]
fn lossy_link_converges_through_resends() {
    let (stats, link) = lossy_run(7);

    assert_eq!(stats.requests_sent, 20);
    assert_eq!(stats.replies_accepted, 20);
    assert!(stats.resends > 0, "30% loss each way should force at least one resend");
    assert!(link.requests_lost + link.replies_lost > 0);
}

#[test]
fn lossy_runs_are_deterministic() {
    assert_eq!(lossy_run(99), lossy_run(99));
}

#[test]
fn resends_are_byte_identical_and_paced() {
    simulate(async {
        let env = SimEnv::with_seed(3);
        let mut client = SimClient::new(env.clone(), config());
        let (pipe, replier) = sim_link(SimConfig::default());
        client.attach(pipe);

        let start = env.now();
        client.socket_mut().send(b"retry me");
        while client.socket().stats().resends < 5 {
            client.idle(Duration::from_millis(10)).await;
        }
        let elapsed = env.now() - start;

        assert!(elapsed >= RESEND * 5, "five resends took only {elapsed:?}");

        let frames = replier.take_requests();
        assert_eq!(frames.len(), 6);
        assert!(frames.iter().all(|frame| frame == &frames[0]));

        // Answer one copy; the request completes and the timer stops.
        replier.inject(frames[0].clone());
        assert_eq!(client.poll()?, Bytes::from_static(b"retry me"));
        assert!(!client.socket().timer().is_armed());

        Ok(())
    });
}

#[test]
fn reply_to_superseded_request_is_ignored() {
    simulate(async {
        let mut client = SimClient::new(SimEnv::with_seed(4), config());
        let (pipe, replier) = sim_link(SimConfig::default());
        client.attach(pipe);

        client.socket_mut().send(b"first");
        let first = client.socket().current_request_id();
        replier.take_requests();

        client.socket_mut().send(b"second");
        assert_eq!(client.socket().stats().requests_abandoned, 1);

        replier.inject(Bytes::copy_from_slice(Envelope::new(first, b"late").as_bytes()));
        assert_eq!(client.poll(), Err(ReqError::TryAgain));
        assert_eq!(client.socket().stats().replies_discarded, 1);
        assert!(client.socket().is_in_progress());

        replier.serve(echo);
        assert_eq!(client.poll()?, Bytes::from_static(b"second"));

        Ok(())
    });
}

#[test]
fn busy_link_is_retried_by_timer() {
    simulate(async {
        let mut client = SimClient::new(SimEnv::with_seed(5), config());
        let (pipe, replier) = sim_link(SimConfig { capacity: 0, ..SimConfig::default() });
        client.attach(pipe);

        client.socket_mut().send(b"blocked");
        assert_eq!(client.socket().stats().transport_busy, 1);
        assert!(client.socket().is_in_progress());

        replier.reconfigure(SimConfig::default());
        let mut reply = client.poll();
        while reply == Err(ReqError::TryAgain) {
            client.idle(Duration::from_millis(10)).await;
            replier.serve(echo);
            reply = client.poll();
        }

        assert_eq!(reply?, Bytes::from_static(b"blocked"));
        assert_eq!(client.socket().stats().resends, 1);

        Ok(())
    });
}

#[test]
fn closed_link_fails_over_to_remaining_pipe() {
    simulate(async {
        let mut client = SimClient::new(SimEnv::with_seed(6), config());
        let (dead_pipe, dead) = sim_link(SimConfig::default());
        let (live_pipe, live) = sim_link(SimConfig::default());
        client.attach(dead_pipe);
        client.attach(live_pipe);
        dead.close();

        for round in 0..4u8 {
            let reply = client.request(&[round], &[dead.clone(), live.clone()], echo).await?;
            assert_eq!(&reply[..], &[round]);
        }

        assert_eq!(client.socket().router().pipe_count(), 1);
        assert_eq!(dead.stats().requests_delivered, 0);
        assert_eq!(live.stats().requests_delivered, 4);
        assert_eq!(client.socket().stats().resends, 0);

        Ok(())
    });
}
