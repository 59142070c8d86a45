/// A page section as laid out right now. Rebuilt from the DOM on every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionBounds {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl SectionBounds {
    fn contains(&self, position: f64) -> bool {
        position >= self.top && position < self.top + self.height
    }
}

/// Returns the id of the last section, in document order, whose span contains
/// `scroll_y + lookahead`.
pub fn compute_active_section(
    sections: &[SectionBounds],
    scroll_y: f64,
    lookahead: f64,
) -> Option<&str> {
    let probe = scroll_y + lookahead;

    sections
        .iter()
        .rev()
        .find(|section| !section.id.is_empty() && section.contains(probe))
        .map(|section| section.id.as_str())
}

/// True when the link's fragment names the active section.
pub fn link_targets_section(href: &str, active: Option<&str>) -> bool {
    let Some(active) = active else {
        return false;
    };

    href.split_once('#')
        .map(|(_, fragment)| fragment == active)
        .unwrap_or(false)
}

pub fn scroll_to_top_visible(scroll_y: f64, threshold: f64) -> bool {
    scroll_y > threshold
}

/// Scroll position that lands a section just below the fixed navigation bar.
pub fn anchor_scroll_target(section_top: f64, nav_height: f64, gap: f64) -> f64 {
    (section_top - nav_height - gap).max(0.0)
}

/// Coalesces scroll and resize events into at most one recompute per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// Returns true when the caller should schedule a frame.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn complete(&mut self) {
        self.pending = false;
    }
}
