//! Reconnect supervision for the effect-service link.
//!
//! One background thread retries `start()` while the transport is down and
//! publishes every transition. The wait between passes is a `recv_timeout`
//! on the cancel channel, so shutdown interrupts it immediately instead of
//! sleeping out the poll interval.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{ConnectionState, EffectTransport, LinkEvent};

pub struct LinkSupervisor {
    state: Arc<RwLock<ConnectionState>>,
    cancel_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl LinkSupervisor {
    /// Spawn the supervising thread. Transitions are pushed on `events`;
    /// the current state is readable through [`LinkSupervisor::state`].
    pub fn spawn(
        transport: Arc<dyn EffectTransport>,
        poll_interval: Duration,
        events: Sender<LinkEvent>,
    ) -> Self {
        let state = Arc::new(RwLock::new(ConnectionState::Disconnected));
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let thread_state = Arc::clone(&state);
        let join = thread::spawn(move || {
            supervise(transport, poll_interval, thread_state, events, cancel_rx);
        });
        Self {
            state,
            cancel_tx: Some(cancel_tx),
            join: Some(join),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Stop the supervising loop and wait for it. Idempotent; does not touch
    /// the transport itself.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for LinkSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn supervise(
    transport: Arc<dyn EffectTransport>,
    poll_interval: Duration,
    state: Arc<RwLock<ConnectionState>>,
    events: Sender<LinkEvent>,
    cancel_rx: Receiver<()>,
) {
    loop {
        if !transport.is_running() {
            publish(&state, &events, ConnectionState::Connecting, "Connecting...");
            if transport.start() {
                log::info!("effect service link up");
                publish(&state, &events, ConnectionState::Connected, "Connected");
            } else {
                log::debug!("effect service start failed, retrying");
                publish(
                    &state,
                    &events,
                    ConnectionState::Disconnected,
                    "Disconnected - effect service not found, retrying",
                );
            }
        }
        match cancel_rx.recv_timeout(poll_interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn publish(
    state: &RwLock<ConnectionState>,
    events: &Sender<LinkEvent>,
    next: ConnectionState,
    message: &str,
) {
    if let Ok(mut s) = state.write() {
        *s = next;
    }
    let _ = events.send(LinkEvent {
        state: next,
        message: message.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{RecordingTransport, TransportOp};

    const POLL: Duration = Duration::from_millis(20);

    fn drain(rx: &Receiver<LinkEvent>) -> Vec<ConnectionState> {
        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            states.push(event.state);
        }
        states
    }

    #[test]
    fn connects_on_first_pass_when_service_is_up() {
        let transport = Arc::new(RecordingTransport::new());
        let (tx, rx) = mpsc::channel();
        let mut supervisor = LinkSupervisor::spawn(Arc::clone(&transport) as _, POLL, tx);

        thread::sleep(Duration::from_millis(60));
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        assert_eq!(
            drain(&rx),
            vec![ConnectionState::Connecting, ConnectionState::Connected]
        );
        supervisor.shutdown();
    }

    #[test]
    fn reports_disconnected_and_retries_after_failed_start() {
        let transport = Arc::new(RecordingTransport::new());
        transport.refuse_start();
        let (tx, rx) = mpsc::channel();
        let mut supervisor = LinkSupervisor::spawn(Arc::clone(&transport) as _, POLL, tx);

        thread::sleep(Duration::from_millis(150));
        // Mid-retry the state is briefly Connecting; it is never Connected.
        assert_ne!(supervisor.state(), ConnectionState::Connected);
        let attempts = transport.count(|op| matches!(op, TransportOp::Start));
        assert!(attempts >= 2, "only {attempts} start attempts");
        let states = drain(&rx);
        assert!(states.contains(&ConnectionState::Disconnected));
        assert!(!states.contains(&ConnectionState::Connected));
        supervisor.shutdown();
    }

    #[test]
    fn recovers_once_the_service_comes_back() {
        let transport = Arc::new(RecordingTransport::new());
        transport.refuse_start();
        let (tx, _rx) = mpsc::channel();
        let mut supervisor = LinkSupervisor::spawn(Arc::clone(&transport) as _, POLL, tx);

        thread::sleep(Duration::from_millis(60));
        assert_ne!(supervisor.state(), ConnectionState::Connected);

        transport.allow_start();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(supervisor.state(), ConnectionState::Connected);
        supervisor.shutdown();
    }

    #[test]
    fn stays_quiet_while_connected() {
        let transport = Arc::new(RecordingTransport::new());
        let (tx, rx) = mpsc::channel();
        let mut supervisor = LinkSupervisor::spawn(Arc::clone(&transport) as _, POLL, tx);

        thread::sleep(Duration::from_millis(150));
        supervisor.shutdown();
        // One start attempt, no flapping while the link stays up.
        assert_eq!(transport.count(|op| matches!(op, TransportOp::Start)), 1);
        assert_eq!(drain(&rx).len(), 2);
    }

    #[test]
    fn shutdown_interrupts_the_poll_wait() {
        let transport = Arc::new(RecordingTransport::new());
        let (tx, _rx) = mpsc::channel();
        let mut supervisor =
            LinkSupervisor::spawn(Arc::clone(&transport) as _, Duration::from_secs(60), tx);

        thread::sleep(Duration::from_millis(40));
        let started = std::time::Instant::now();
        supervisor.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
        // Idempotent.
        supervisor.shutdown();
    }
}
