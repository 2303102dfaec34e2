//! Turns frame updates into render ticks
//!
//! A tick is only produced when a watched field differs from what was delivered last,
//! and never while the previous tick's `done` is still outstanding.

use crate::panel::{ColorScheme, RenderField, RenderState, Topic};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Completion signal handed to the panel with each tick.
///
/// Dropping it without [`TickDone::signal`] also releases the driver.
#[derive(Debug)]
pub struct TickDone {
    ready: Arc<AtomicBool>,
    signalled: bool,
}

impl TickDone {
    pub fn signal(mut self) {
        self.signalled = true;
        self.ready.store(true, Ordering::Release);
    }
}

impl Drop for TickDone {
    fn drop(&mut self) {
        if !self.signalled {
            warn!("Render tick dropped without completion");
            self.ready.store(true, Ordering::Release);
        }
    }
}

#[derive(Debug)]
pub struct RenderDriver {
    delivered: RenderState,
    ready: Arc<AtomicBool>,
    ticks: u64,
}

impl Default for RenderDriver {
    fn default() -> Self {
        Self {
            delivered: RenderState::default(),
            ready: Arc::new(AtomicBool::new(true)),
            ticks: 0,
        }
    }
}

impl RenderDriver {
    pub fn is_waiting(&self) -> bool {
        !self.ready.load(Ordering::Acquire)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn next_tick<W>(
        &mut self,
        topics: &[Topic],
        scheme: ColorScheme,
        watches: W,
    ) -> Option<(RenderState, TickDone)>
    where
        W: Fn(RenderField) -> bool,
    {
        if self.is_waiting() {
            return None;
        }

        let mut state = RenderState::default();
        if watches(RenderField::Topics) && self.delivered.topics.as_deref() != Some(topics) {
            state.topics = Some(topics.to_vec());
        }
        if watches(RenderField::ColorScheme) && self.delivered.color_scheme != Some(scheme) {
            state.color_scheme = Some(scheme);
        }
        if state.topics.is_none() && state.color_scheme.is_none() {
            return None;
        }

        if let Some(topics) = &state.topics {
            self.delivered.topics = Some(topics.clone());
        }
        if let Some(scheme) = state.color_scheme {
            self.delivered.color_scheme = Some(scheme);
        }
        self.ready.store(false, Ordering::Release);
        self.ticks += 1;
        trace!("Render tick #{}", self.ticks);

        Some((
            state,
            TickDone {
                ready: self.ready.clone(),
                signalled: false,
            },
        ))
    }
}
