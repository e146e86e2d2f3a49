use tokio::time::Instant;
use tracing::{debug, trace};

use super::core::{Effect, PlaybackCore, TimerKind};
use crate::models::PlaybackState;

/// Control visibility state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Control surface is hidden
    Hidden,
    /// Controls are visible; `countdown` is set while the auto-hide slot is armed
    Visible { countdown: bool },
    /// Controls are visible because the pointer is over them
    Hovering,
}

/// Input activity reported by the embedding surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PointerMove,
    /// Pointer entered the control surface
    PointerEnter,
    /// Pointer left the control surface
    PointerLeave,
    Focus,
    KeyPress,
}

/// Control visibility state machine implementation
impl PlaybackCore {
    pub fn handle_activity(&mut self, signal: ActivitySignal) {
        if self.detached {
            return;
        }
        match signal {
            ActivitySignal::PointerEnter => self.transition_to_hovering(),
            ActivitySignal::PointerLeave => self.transition_to_visible(),
            ActivitySignal::PointerMove | ActivitySignal::Focus | ActivitySignal::KeyPress => {
                self.reveal_controls()
            }
        }
    }

    /// The auto-hide slot fired.
    pub fn handle_auto_hide_elapsed(&mut self) {
        if self.detached {
            return;
        }
        match self.control_state {
            ControlState::Visible { countdown: true }
                if self.session.state == PlaybackState::Playing =>
            {
                self.transition_to_hidden();
            }
            state => trace!("Auto-hide elapsed in {:?}, keeping controls", state),
        }
    }

    /// Show controls and restart the countdown, unless the pointer is
    /// hovering them.
    pub(super) fn reveal_controls(&mut self) {
        if self.control_state == ControlState::Hovering {
            self.last_activity_at = Instant::now();
        } else {
            self.transition_to_visible();
        }
    }

    pub(super) fn on_displayed_state_changed(&mut self) {
        self.reveal_controls();
    }

    pub fn controls_visible(&self) -> bool {
        !matches!(self.control_state, ControlState::Hidden)
    }

    fn transition_to_hidden(&mut self) {
        debug!("Hiding controls after {:?} of inactivity", self.settings.inactivity_timeout);
        self.control_state = ControlState::Hidden;
    }

    fn transition_to_visible(&mut self) {
        self.last_activity_at = Instant::now();

        // Auto-hide only applies while actually playing
        if self.session.state == PlaybackState::Playing {
            self.push(Effect::ArmTimer(
                TimerKind::AutoHide,
                self.settings.inactivity_timeout,
            ));
            self.control_state = ControlState::Visible { countdown: true };
        } else {
            self.cancel_auto_hide();
            self.control_state = ControlState::Visible { countdown: false };
        }
    }

    fn transition_to_hovering(&mut self) {
        self.last_activity_at = Instant::now();
        self.cancel_auto_hide();
        self.control_state = ControlState::Hovering;
    }

    fn cancel_auto_hide(&mut self) {
        if let ControlState::Visible { countdown: true } = self.control_state {
            self.push(Effect::CancelTimer(TimerKind::AutoHide));
        }
    }
}
