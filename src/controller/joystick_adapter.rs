//! Joystick adapter - pointer gestures to throttled velocity commands
//!
//! Owns the single [`JoystickWidget`] instance, the gesture machine and the publish
//! throttle. Moves are offered to the throttle on every event; the throttle decides
//! what actually goes out. Releasing the stick bypasses the throttle: any parked
//! command is dropped and one stop command is published right away.
//!
//! # Widget handle
//!
//! ```text
//! mount(scheme) ──► destroy old (if any) ──► create new ──► gesture reset to Idle
//! sync_scheme(s) ──► s differs from widget scheme? ──► mount(s), report a dropped drag
//! unmount() ──► destroy, cancel parked command
//! ```

use crate::controller::gesture::{GestureOutput, GesturePhase, PointerEvent};
use crate::controller::widget::JoystickWidget;
use crate::mapping::velocity::build_command;
use crate::mapping::{Deflection, MappingError, SpeedLimits, Throttle};
use crate::panel::host::PanelHost;
use crate::panel::{ColorScheme, Topic};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

/// Result of [`JoystickAdapter::sync_scheme`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeSync {
    Unchanged,
    Rebuilt,
    /// Rebuilt while dragging; the caller owes the robot a stop command
    RebuiltDuringDrag,
}

/// Per-publish view of the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PublishTarget {
    pub topic: Option<Topic>,
    pub limits: SpeedLimits,
    pub frame_id: String,
}

/// Scales `deflection`, shapes it for the target's schema and hands it to the host.
///
/// Unsupported schemas and host failures are logged and swallowed.
pub fn publish_command<H: PanelHost>(host: &mut H, target: &PublishTarget, deflection: Deflection) {
    let result = target
        .topic
        .as_ref()
        .ok_or(MappingError::NoTopic)
        .and_then(|topic| {
            build_command(&topic.schema_name, deflection, target.limits, &target.frame_id)
                .map(|message| (topic, message))
        });

    match result {
        Ok((topic, message)) => {
            trace!(
                "Publishing on {}: linear.x={:.3} angular.z={:.3}",
                topic.name,
                message.twist().linear.x,
                message.twist().angular.z
            );
            if let Err(e) = host.publish(&topic.name, &message) {
                error!("Failed to publish on {}: {}", topic.name, e);
            }
        }
        Err(MappingError::NoTopic) => debug!("No topic selected, command dropped"),
        Err(e) => error!("{}", e),
    }
}

#[derive(Debug)]
pub struct JoystickAdapter {
    widget: Option<JoystickWidget>,
    generation: u64,
    gesture: Option<GesturePhase>,
    throttle: Throttle<Deflection>,
}

impl JoystickAdapter {
    pub fn new(publish_rate: f64) -> Self {
        Self {
            widget: None,
            generation: 0,
            gesture: Some(GesturePhase::default()),
            throttle: Throttle::new(Throttle::<Deflection>::interval_for_rate(publish_rate)),
        }
    }

    /// Creates a fresh widget, destroying the previous one first.
    ///
    /// Any gesture in progress is discarded. Returns `true` if one was.
    pub fn mount(&mut self, scheme: ColorScheme) -> bool {
        let was_dragging = self.is_dragging();
        if let Some(old) = self.widget.take() {
            old.destroy();
        }
        self.throttle.cancel();
        self.gesture = Some(GesturePhase::default());
        self.generation += 1;
        self.widget = Some(JoystickWidget::create(self.generation, scheme));
        info!("Joystick mounted ({} scheme)", scheme);
        was_dragging
    }

    /// Rebuilds the widget when the color scheme differs from the one it was built for.
    pub fn sync_scheme(&mut self, scheme: ColorScheme) -> SchemeSync {
        if self.widget.as_ref().is_some_and(|widget| widget.scheme() == scheme) {
            return SchemeSync::Unchanged;
        }
        if self.mount(scheme) {
            SchemeSync::RebuiltDuringDrag
        } else {
            SchemeSync::Rebuilt
        }
    }

    pub fn unmount(&mut self) {
        self.throttle.cancel();
        self.gesture = Some(GesturePhase::default());
        if let Some(widget) = self.widget.take() {
            widget.destroy();
        }
    }

    pub fn widget(&self) -> Option<&JoystickWidget> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut JoystickWidget> {
        self.widget.as_mut()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture
            .as_ref()
            .is_some_and(|gesture| gesture.is_dragging())
    }

    pub fn set_publish_rate(&mut self, rate_hz: f64) {
        self.throttle
            .set_interval(Throttle::<Deflection>::interval_for_rate(rate_hz));
    }

    pub fn publish_interval(&self) -> Duration {
        self.throttle.interval()
    }

    /// Feeds one pointer event through the gesture machine.
    pub fn handle_event<H: PanelHost>(
        &mut self,
        event: PointerEvent,
        now: Instant,
        target: &PublishTarget,
        host: &mut H,
    ) {
        if self.widget.is_none() {
            debug!("Pointer event without mounted joystick: {:?}", event);
            return;
        }
        let phase = self.gesture.take().unwrap_or_default();
        let (phase, output) = phase.handle(event);
        self.gesture = Some(phase);

        match output {
            GestureOutput::Moved(displacement) => {
                let deflection = Deflection::from(displacement);
                self.throttle
                    .call(now, deflection, |d| publish_command(host, target, d));
            }
            GestureOutput::Released => {
                self.throttle.cancel();
                publish_command(host, target, Deflection::ZERO);
            }
            GestureOutput::Started | GestureOutput::Ignored => {}
        }
    }

    /// Delivers a parked command whose interval has elapsed.
    pub fn tick<H: PanelHost>(&mut self, now: Instant, target: &PublishTarget, host: &mut H) {
        self.throttle
            .flush(now, |d| publish_command(host, target, d));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.next_deadline()
    }
}
