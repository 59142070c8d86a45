//! Single-slot toast notifications.
//!
//! The slot holds at most one live notification. Showing a new one retires the
//! current one on the spot (no exit animation). Lifecycle steps are driven by
//! timer callbacks that carry the notification id; a callback for an id that is
//! no longer current is ignored, so a superseded timer can never touch a newer
//! toast.

pub const EMAIL_COPIED: &str = "Email copied to clipboard!";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Entering,
    Visible,
    Exiting,
    Removed,
}

impl Phase {
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Entering => "toast--entering",
            Self::Visible => "toast--visible",
            Self::Exiting => "toast--exiting",
            Self::Removed => "toast--removed",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Entering => Self::Visible,
            Self::Visible => Self::Exiting,
            Self::Exiting | Self::Removed => Self::Removed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationTimings {
    pub enter_ms: u32,
    pub hold_ms: u32,
    pub exit_ms: u32,
}

impl NotificationTimings {
    /// How long a notification stays in `phase` before advancing.
    pub fn phase_duration(&self, phase: Phase) -> Option<u32> {
        match phase {
            Phase::Entering => Some(self.enter_ms),
            Phase::Visible => Some(self.hold_ms),
            Phase::Exiting => Some(self.exit_ms),
            Phase::Removed => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub phase: Phase,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationSlot {
    timings: NotificationTimings,
    next_id: u64,
    current: Option<Notification>,
}

impl NotificationSlot {
    pub fn new(timings: NotificationTimings) -> Self {
        Self {
            timings,
            next_id: 1,
            current: None,
        }
    }

    pub fn timings(&self) -> NotificationTimings {
        self.timings
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    /// Replaces whatever is shown and returns the new notification's id.
    pub fn show(&mut self, message: impl Into<String>) -> u64 {
        self.clear();
        let id = self.next_id;
        self.next_id += 1;

        self.current = Some(Notification {
            id,
            message: message.into(),
            phase: Phase::Entering,
        });

        id
    }

    /// Moves notification `id` to its next phase. Returns the new phase, or
    /// `None` when `id` is stale.
    pub fn advance(&mut self, id: u64) -> Option<Phase> {
        let current = self.current.as_mut().filter(|current| current.id == id)?;
        let next = current.phase.next();

        if next == Phase::Removed {
            self.current = None;
        } else {
            current.phase = next;
        }

        Some(next)
    }

    pub fn clear(&mut self) -> Option<u64> {
        self.current.take().map(|current| current.id)
    }
}
