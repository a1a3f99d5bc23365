//! TriggerEngine: the facade the UI layer drives.
//!
//! Owns the channel bank, the debounce scheduler, the transport handle, and
//! the link supervisor. Edits never block: they update the bank and arm a
//! timer; the timer thread does the dispatch with whatever connection exists
//! at fire time.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use crate::catalog;
use crate::config::Config;
use crate::debounce::DebounceScheduler;
use crate::dispatch;
use crate::link::{
    ConnectionState, ControllerTarget, EffectTransport, IpcClient, LinkEvent, LinkSupervisor,
};
use crate::preset;
use crate::state::ChannelBank;

pub struct TriggerEngine {
    bank: ChannelBank,
    scheduler: DebounceScheduler,
    transport: Arc<dyn EffectTransport>,
    supervisor: LinkSupervisor,
    events_rx: Receiver<LinkEvent>,
    target: ControllerTarget,
    active_channel: Option<String>,
    shut_down: bool,
}

impl TriggerEngine {
    /// Engine wired to the real effect service from configuration.
    pub fn new(config: &Config) -> Self {
        let transport: Arc<dyn EffectTransport> = Arc::new(IpcClient::new(&config.service_addr));
        Self::with_transport(transport, config.quiet_period(), config.poll_interval())
    }

    /// Engine over an arbitrary transport. This is also the test seam.
    pub fn with_transport(
        transport: Arc<dyn EffectTransport>,
        quiet_period: Duration,
        poll_interval: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let supervisor = LinkSupervisor::spawn(Arc::clone(&transport), poll_interval, events_tx);
        Self {
            bank: ChannelBank::new(),
            scheduler: DebounceScheduler::new(quiet_period),
            transport,
            supervisor,
            events_rx,
            target: ControllerTarget::Both,
            active_channel: None,
            shut_down: false,
        }
    }

    // ── Parameter editing ─────────────────────────────────────────

    /// Record a slot edit and arm the channel's debounced dispatch. The timer
    /// carries the full vector as of the last edit, so a burst sends only its
    /// final state.
    pub fn edit_param(&mut self, channel: &str, slot: usize, value: u8) -> Result<(), String> {
        self.bank.set_slot(channel, slot, value)?;
        self.schedule_dispatch(channel);
        Ok(())
    }

    /// Which physical controller subsequent dispatches address.
    pub fn set_target(&mut self, target: ControllerTarget) {
        self.target = target;
    }

    pub fn target(&self) -> ControllerTarget {
        self.target
    }

    pub fn channel_values(&self, channel: &str) -> Option<&[u8]> {
        self.bank.values(channel)
    }

    /// Restore every channel to per-slot minimums and re-send the active one.
    pub fn reset_channels(&mut self) {
        self.bank.reset();
        if let Some(channel) = self.active_channel.clone() {
            self.schedule_dispatch(&channel);
        }
    }

    // ── Channel activation ────────────────────────────────────────

    /// Make `channel` the active one. The outgoing channel's pending timer is
    /// disposed without firing, effects are disabled for both controllers so
    /// nothing stale keeps running, and the new channel's current parameters
    /// are sent.
    pub fn activate_channel(&mut self, channel: &str) -> Result<(), String> {
        let def = catalog::find(channel).ok_or_else(|| format!("unknown effect: {channel}"))?;
        if let Some(previous) = self.active_channel.take() {
            self.scheduler.cancel(&previous);
        }
        self.active_channel = Some(def.name.to_string());

        dispatch::disable_all(self.transport.as_ref(), ControllerTarget::Both)?;
        let vector = self.bank.values(def.name).unwrap_or_default();
        dispatch::dispatch_effect(self.transport.as_ref(), def.name, self.target, vector)
    }

    pub fn active_channel(&self) -> Option<&str> {
        self.active_channel.as_deref()
    }

    /// Dispose a channel's pending debounce timer without firing it.
    pub fn cancel_pending(&self, channel: &str) {
        self.scheduler.cancel(channel);
    }

    /// Stop all effects for both controllers, independent of any channel.
    pub fn disable_all(&self) -> Result<(), String> {
        dispatch::disable_all(self.transport.as_ref(), ControllerTarget::Both)
    }

    // ── Connection status ─────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Status transitions accumulated since the last call, for the UI to
    /// render.
    pub fn drain_events(&self) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ── Presets ───────────────────────────────────────────────────

    pub fn save_preset(&self, path: &std::path::Path) -> Result<(), String> {
        preset::save_file(path, &self.bank)
    }

    /// Partial overwrite: only channels present in the file change, and the
    /// active channel's (possibly updated) parameters are re-sent.
    pub fn load_preset(&mut self, path: &std::path::Path) -> Result<(), String> {
        let loaded = preset::load_file(path)?;
        self.bank.apply_partial(&loaded);
        if let Some(channel) = self.active_channel.clone() {
            self.schedule_dispatch(&channel);
        }
        Ok(())
    }

    // ── Shutdown ──────────────────────────────────────────────────

    /// Cancel the supervisor, dispose every pending timer, close the
    /// transport, in that order. Idempotent; safe while timers are mid-fire.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.supervisor.shutdown();
        self.scheduler.cancel_all();
        self.transport.stop();
        log::info!("engine shut down");
    }

    fn schedule_dispatch(&self, channel: &str) {
        let Some(vector) = self.bank.values(channel).map(|v| v.to_vec()) else {
            return;
        };
        let transport = Arc::clone(&self.transport);
        let name = channel.to_string();
        let target = self.target;
        self.scheduler.schedule(channel, move || {
            if let Err(e) = dispatch::dispatch_effect(transport.as_ref(), &name, target, &vector) {
                log::warn!("debounced dispatch failed: {e}");
            }
        });
    }
}

impl Drop for TriggerEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
