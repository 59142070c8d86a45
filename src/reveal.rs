#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealOptions {
    /// Fraction of the element that must be inside the viewport, 0.0..=1.0.
    pub threshold: f64,
    /// The viewport is treated as this much shorter at the bottom.
    pub bottom_margin: f64,
}

impl RevealOptions {
    /// `rootMargin` string for an `IntersectionObserver` using these options.
    pub fn root_margin(&self) -> String {
        format!("0px 0px -{}px 0px", self.bottom_margin)
    }
}

fn shrunk_root(viewport: Viewport, options: RevealOptions) -> Rect {
    Rect {
        top: 0.0,
        left: 0.0,
        width: viewport.width,
        height: (viewport.height - options.bottom_margin).max(0.0),
    }
}

/// Overlap area between `rect` and the shrunk root, or `None` when they do
/// not touch. Shared edges give `Some(0.0)`.
fn root_overlap(rect: Rect, root: Rect) -> Option<f64> {
    let overlap_left = rect.left.max(root.left);
    let overlap_right = rect.right().min(root.right());
    let overlap_top = rect.top.max(root.top);
    let overlap_bottom = rect.bottom().min(root.bottom());

    if overlap_right < overlap_left || overlap_bottom < overlap_top {
        return None;
    }

    Some((overlap_right - overlap_left) * (overlap_bottom - overlap_top))
}

/// The visible ratio is taken against the smaller of the element and the
/// shrunk root, so an element taller than the viewport counts as fully
/// visible once it covers the root.
pub fn should_reveal(rect: Rect, viewport: Viewport, options: RevealOptions) -> bool {
    let root = shrunk_root(viewport, options);
    let Some(overlap_area) = root_overlap(rect, root) else {
        return false;
    };

    if options.threshold <= 0.0 {
        return true;
    }

    let basis = rect.area().min(root.area());
    if basis == 0.0 {
        // Degenerate boxes count once they touch the root, edges included.
        return true;
    }

    overlap_area > 0.0 && overlap_area / basis >= options.threshold
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealDecision {
    Reveal,
    AlreadyRevealed,
    Pending,
}

/// One irreversible `revealed` flag per eligible element, plus the pending
/// elements currently touching the root. Those need rechecking on scroll
/// because the browser only reports crossings of its own ratio thresholds.
#[derive(Clone, Debug, Default)]
pub struct RevealGate {
    revealed: Vec<bool>,
    touching: Vec<bool>,
}

impl RevealGate {
    pub fn new(count: usize) -> Self {
        Self {
            revealed: vec![false; count],
            touching: vec![false; count],
        }
    }

    pub fn pending_count(&self) -> usize {
        self.revealed.iter().filter(|revealed| !**revealed).count()
    }

    /// Pending elements that touched the root at their last observation.
    pub fn watched(&self) -> Vec<usize> {
        self.revealed
            .iter()
            .zip(&self.touching)
            .enumerate()
            .filter(|(_, (revealed, touching))| !**revealed && **touching)
            .map(|(index, _)| index)
            .collect()
    }

    /// Reports `Reveal` at most once per element; the caller then stops
    /// observing it.
    pub fn observe(
        &mut self,
        index: usize,
        rect: Rect,
        viewport: Viewport,
        options: RevealOptions,
    ) -> RevealDecision {
        let (Some(revealed), Some(touching)) =
            (self.revealed.get_mut(index), self.touching.get_mut(index))
        else {
            return RevealDecision::Pending;
        };

        if *revealed {
            return RevealDecision::AlreadyRevealed;
        }

        if should_reveal(rect, viewport, options) {
            *revealed = true;
            RevealDecision::Reveal
        } else {
            *touching = root_overlap(rect, shrunk_root(viewport, options)).is_some();
            RevealDecision::Pending
        }
    }

    /// Marks everything revealed and returns the indices that changed.
    pub fn reveal_all(&mut self) -> Vec<usize> {
        self.revealed
            .iter_mut()
            .enumerate()
            .filter(|(_, revealed)| !**revealed)
            .map(|(index, revealed)| {
                *revealed = true;
                index
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 1_280.0,
        height: 800.0,
    };

    const OPTIONS: RevealOptions = RevealOptions {
        threshold: 0.1,
        bottom_margin: 50.0,
    };

    fn card_at(top: f64) -> Rect {
        Rect {
            top,
            left: 100.0,
            width: 600.0,
            height: 200.0,
        }
    }

    #[test]
    fn threshold_is_measured_against_shortened_viewport() {
        // Visible root ends at 750; 20px of a 200px card is exactly 10%.
        assert!(should_reveal(card_at(730.0), VIEWPORT, OPTIONS));
        assert!(!should_reveal(card_at(740.0), VIEWPORT, OPTIONS));
        // Inside the real viewport but entirely inside the bottom margin.
        assert!(!should_reveal(card_at(760.0), VIEWPORT, OPTIONS));
    }

    #[test]
    fn elements_above_or_beside_viewport_do_not_reveal() {
        assert!(!should_reveal(card_at(-400.0), VIEWPORT, OPTIONS));
        let beside = Rect {
            left: 1_400.0,
            ..card_at(100.0)
        };
        assert!(!should_reveal(beside, VIEWPORT, OPTIONS));
    }

    #[test]
    fn zero_threshold_reveals_from_edge_contact() {
        let options = RevealOptions {
            threshold: 0.0,
            ..OPTIONS
        };
        assert!(should_reveal(card_at(750.0), VIEWPORT, options));
        assert!(should_reveal(card_at(749.0), VIEWPORT, options));
        assert!(!should_reveal(card_at(750.5), VIEWPORT, options));

        let mut gate = RevealGate::new(1);
        assert_eq!(
            gate.observe(0, card_at(750.0), VIEWPORT, options),
            RevealDecision::Reveal
        );
    }

    #[test]
    fn element_taller_than_viewport_reveals_once_it_covers_root() {
        let tall = Rect {
            top: -100.0,
            left: 0.0,
            width: 1_280.0,
            height: 9_000.0,
        };
        assert!(should_reveal(tall, VIEWPORT, OPTIONS));

        let strict = RevealOptions {
            threshold: 0.5,
            ..OPTIONS
        };
        assert!(should_reveal(Rect { height: 3_000.0, ..tall }, VIEWPORT, strict));
        // 300px of a 750px root is 40%.
        assert!(!should_reveal(Rect { top: 450.0, ..tall }, VIEWPORT, strict));
    }

    #[test]
    fn tall_element_reveals_during_scroll_pass() {
        let mut gate = RevealGate::new(1);
        let mut revealed_at = None;

        let mut top = 800.0;
        while top >= -8_000.0 {
            let rect = Rect {
                top,
                left: 0.0,
                width: 1_280.0,
                height: 9_000.0,
            };
            if gate.observe(0, rect, VIEWPORT, OPTIONS) == RevealDecision::Reveal {
                revealed_at = Some(top);
                break;
            }
            top -= 25.0;
        }

        // 10% of the 750px root is 75px of overlap.
        assert_eq!(revealed_at, Some(675.0));
        assert_eq!(gate.pending_count(), 0);
    }

    #[test]
    fn pending_elements_touching_root_are_watched() {
        let mut gate = RevealGate::new(3);

        // Edge contact only: not revealed yet but needs rechecking.
        gate.observe(0, card_at(745.0), VIEWPORT, OPTIONS);
        gate.observe(1, card_at(2_000.0), VIEWPORT, OPTIONS);
        gate.observe(2, card_at(300.0), VIEWPORT, OPTIONS);
        assert_eq!(gate.watched(), vec![0]);

        gate.observe(0, card_at(1_200.0), VIEWPORT, OPTIONS);
        assert!(gate.watched().is_empty());

        gate.observe(0, card_at(745.0), VIEWPORT, OPTIONS);
        assert_eq!(
            gate.observe(0, card_at(600.0), VIEWPORT, OPTIONS),
            RevealDecision::Reveal
        );
        assert!(gate.watched().is_empty());
    }

    #[test]
    fn zero_area_target_reveals_on_contact() {
        let marker = Rect {
            top: 750.0,
            left: 10.0,
            width: 0.0,
            height: 0.0,
        };
        assert!(should_reveal(marker, VIEWPORT, OPTIONS));
        assert!(!should_reveal(Rect { top: 751.0, ..marker }, VIEWPORT, OPTIONS));
    }

    #[test]
    fn revealed_element_never_resets() {
        let mut gate = RevealGate::new(2);

        assert_eq!(
            gate.observe(0, card_at(900.0), VIEWPORT, OPTIONS),
            RevealDecision::Pending
        );
        assert_eq!(
            gate.observe(0, card_at(300.0), VIEWPORT, OPTIONS),
            RevealDecision::Reveal
        );

        for top in [-2_000.0, 300.0, 5_000.0] {
            assert_eq!(
                gate.observe(0, card_at(top), VIEWPORT, OPTIONS),
                RevealDecision::AlreadyRevealed
            );
        }
        assert_eq!(gate.pending_count(), 1);
    }

    #[test]
    fn reveal_all_reports_only_newly_revealed() {
        let mut gate = RevealGate::new(3);
        gate.observe(1, card_at(300.0), VIEWPORT, OPTIONS);

        assert_eq!(gate.reveal_all(), vec![0, 2]);
        assert!(gate.reveal_all().is_empty());
        assert_eq!(gate.pending_count(), 0);
    }

    #[test]
    fn unknown_index_stays_pending() {
        let mut gate = RevealGate::new(1);
        assert_eq!(
            gate.observe(5, card_at(300.0), VIEWPORT, OPTIONS),
            RevealDecision::Pending
        );
        assert!(gate.watched().is_empty());
    }

    #[test]
    fn root_margin_shrinks_bottom_edge() {
        assert_eq!(OPTIONS.root_margin(), "0px 0px -50px 0px");
    }
}
