//! Drag gesture state machine
//!
//! ```text
//!          start(anchor)              drag_to(point)
//!   Idle ───────────────► Dragging ◄──────────────┐
//!    ▲                       │  └─────────────────┘
//!    └───── release() ───────┘
//! ```
//!
//! The anchor lives in the `Dragging` state data, so it only exists while a gesture
//! is in progress. [`GesturePhase`] carries the machine between pointer events.

use crate::mapping::{Displacement, DragPoint};
use statum::{machine, state};
use tracing::{debug, trace};

/// Pointer events the widget reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Start(DragPoint),
    Move(DragPoint),
    End,
}

/// Where the current drag began
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub start: DragPoint,
}

#[state]
#[derive(Debug, Clone)]
pub enum GestureState {
    Idle,
    Dragging(DragAnchor),
}

#[machine]
#[derive(Debug)]
pub struct Gesture<S: GestureState> {
    // Offset of the last move from the anchor
    displacement: Displacement,

    // Move events seen during the current drag
    moves: u64,
}

impl<S: GestureState> Gesture<S> {
    pub fn displacement(&self) -> Displacement {
        self.displacement
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }
}

impl Gesture<Idle> {
    pub fn create() -> Self {
        Self::new(Displacement::default(), 0)
    }

    /// Begins a drag anchored at `at` with zero displacement.
    pub fn start(mut self, at: DragPoint) -> Gesture<Dragging> {
        debug!("Drag started at ({:.1}, {:.1})", at.x, at.y);
        self.displacement = Displacement::default();
        self.moves = 0;
        self.transition_with(DragAnchor { start: at })
    }
}

impl Gesture<Dragging> {
    pub fn anchor(&self) -> Option<DragPoint> {
        self.get_state_data().map(|anchor| anchor.start)
    }

    /// Recomputes the displacement for a pointer now at `at`.
    pub fn drag_to(&mut self, at: DragPoint) -> Displacement {
        if let Some(anchor) = self.anchor() {
            self.displacement = Displacement::between(anchor, at);
            self.moves += 1;
            trace!(
                "Drag moved: dx={:.1} dy={:.1}",
                self.displacement.dx,
                self.displacement.dy
            );
        }
        self.displacement
    }

    pub fn release(self) -> Gesture<Idle> {
        debug!("Drag released after {} moves", self.moves);
        self.transition()
    }
}

/// What handling one pointer event produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutput {
    Ignored,
    Started,
    Moved(Displacement),
    Released,
}

/// Runtime holder for whichever state the gesture is in
#[derive(Debug)]
pub enum GesturePhase {
    Idle(Gesture<Idle>),
    Dragging(Gesture<Dragging>),
}

impl Default for GesturePhase {
    fn default() -> Self {
        GesturePhase::Idle(Gesture::create())
    }
}

impl GesturePhase {
    pub fn is_dragging(&self) -> bool {
        matches!(self, GesturePhase::Dragging(_))
    }

    pub fn handle(self, event: PointerEvent) -> (GesturePhase, GestureOutput) {
        match (self, event) {
            (GesturePhase::Idle(idle), PointerEvent::Start(at)) => {
                (GesturePhase::Dragging(idle.start(at)), GestureOutput::Started)
            }
            (GesturePhase::Dragging(dragging), PointerEvent::Start(at)) => {
                debug!("Drag restarted without release, re-anchoring");
                (
                    GesturePhase::Dragging(dragging.release().start(at)),
                    GestureOutput::Started,
                )
            }
            (GesturePhase::Dragging(mut dragging), PointerEvent::Move(at)) => {
                let displacement = dragging.drag_to(at);
                (
                    GesturePhase::Dragging(dragging),
                    GestureOutput::Moved(displacement),
                )
            }
            (GesturePhase::Dragging(dragging), PointerEvent::End) => {
                (GesturePhase::Idle(dragging.release()), GestureOutput::Released)
            }
            (phase @ GesturePhase::Idle(_), event) => {
                debug!("Ignoring {:?} while idle", event);
                (phase, GestureOutput::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_gesture() {
        let idle = Gesture::create();
        let mut dragging = idle.start(DragPoint::new(100.0, 100.0));
        assert_eq!(dragging.anchor(), Some(DragPoint::new(100.0, 100.0)));
        assert_eq!(dragging.displacement(), Displacement::default());

        let d = dragging.drag_to(DragPoint::new(90.0, 120.0));
        assert_eq!(d, Displacement { dx: 10.0, dy: -20.0 });
        assert_eq!(dragging.moves(), 1);

        let idle = dragging.release();
        assert_eq!(idle.moves(), 1);
    }

    #[test]
    fn test_start_resets_displacement() {
        let mut dragging = Gesture::create().start(DragPoint::new(0.0, 0.0));
        dragging.drag_to(DragPoint::new(5.0, 5.0));
        let restarted = dragging.release().start(DragPoint::new(50.0, 50.0));
        assert_eq!(restarted.displacement(), Displacement::default());
        assert_eq!(restarted.moves(), 0);
    }

    #[test]
    fn test_phase_transitions() {
        let phase = GesturePhase::default();
        let (phase, out) = phase.handle(PointerEvent::Start(DragPoint::new(10.0, 10.0)));
        assert_eq!(out, GestureOutput::Started);
        assert!(phase.is_dragging());

        let (phase, out) = phase.handle(PointerEvent::Move(DragPoint::new(10.0, 0.0)));
        assert_eq!(out, GestureOutput::Moved(Displacement { dx: 0.0, dy: 10.0 }));

        let (phase, out) = phase.handle(PointerEvent::End);
        assert_eq!(out, GestureOutput::Released);
        assert!(!phase.is_dragging());
    }

    #[test]
    fn test_events_while_idle_are_ignored() {
        let (phase, out) = GesturePhase::default().handle(PointerEvent::Move(DragPoint::new(1.0, 1.0)));
        assert_eq!(out, GestureOutput::Ignored);
        let (phase, out) = phase.handle(PointerEvent::End);
        assert_eq!(out, GestureOutput::Ignored);
        assert!(!phase.is_dragging());
    }

    #[test]
    fn test_restart_reanchors() {
        let (phase, _) = GesturePhase::default().handle(PointerEvent::Start(DragPoint::new(0.0, 0.0)));
        let (phase, out) = phase.handle(PointerEvent::Start(DragPoint::new(20.0, 20.0)));
        assert_eq!(out, GestureOutput::Started);
        let (_, out) = phase.handle(PointerEvent::Move(DragPoint::new(20.0, 30.0)));
        assert_eq!(out, GestureOutput::Moved(Displacement { dx: 0.0, dy: -10.0 }));
    }
}
