//! Swipe-card deck driven by a single horizontal drag offset.
//!
//! The deck only tracks gesture state. Animations are performed by the view;
//! it reports completion through [`SwipeDeck::settle`], which is where a
//! flung card is committed and the swipe signal produced.

use serde::Serialize;

/// Release speed (points per second) at or above which a card is flung.
pub const SWIPE_VELOCITY: f64 = 800.0;

/// Rotation reached when the card is fully off-screen.
pub const ROTATION_DEG: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Resting,
    Dragging,
    SpringingBack,
    Flung(Direction),
}

/// A committed swipe: emitted exactly once per completed fling.
#[derive(Debug, Clone, PartialEq)]
pub struct Swiped<T> {
    pub direction: Direction,
    pub item: T,
}

#[derive(Debug, Clone)]
pub struct SwipeDeck<T> {
    items: Vec<T>,
    index: usize,
    offset: f64,
    drag_start: f64,
    phase: Phase,
    hidden_x: f64,
}

impl<T> SwipeDeck<T> {
    pub fn new(screen_width: f64) -> Self {
        Self {
            items: Vec::new(),
            index: 0,
            offset: 0.0,
            drag_start: 0.0,
            phase: Phase::Resting,
            hidden_x: 2.0 * screen_width,
        }
    }

    /// Replace the candidates and rewind to the first one.
    pub fn load(&mut self, items: Vec<T>) {
        self.items = items;
        self.index = 0;
        self.offset = 0.0;
        self.drag_start = 0.0;
        self.phase = Phase::Resting;
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.index)
    }

    pub fn next_item(&self) -> Option<&T> {
        self.items.get(self.index + 1)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hidden_x(&self) -> f64 {
        self.hidden_x
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }

    fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::SpringingBack | Phase::Flung(_))
    }

    fn accepts_gestures(&self) -> bool {
        !self.is_exhausted() && !self.is_animating()
    }

    pub fn begin_drag(&mut self) -> bool {
        if !self.accepts_gestures() {
            return false;
        }
        self.drag_start = self.offset;
        self.phase = Phase::Dragging;
        true
    }

    /// Track the gesture: `translation` is relative to where the drag began.
    pub fn drag(&mut self, translation: f64) -> bool {
        if self.phase != Phase::Dragging || self.is_exhausted() {
            return false;
        }
        self.offset = self.drag_start + translation;
        true
    }

    /// End the drag. Direction comes from the sign of the velocity, not from
    /// where the card ended up.
    pub fn release(&mut self, velocity: f64) -> Option<Phase> {
        if self.phase != Phase::Dragging || self.is_exhausted() {
            return None;
        }

        self.phase = if velocity.abs() < SWIPE_VELOCITY {
            Phase::SpringingBack
        } else if velocity > 0.0 {
            Phase::Flung(Direction::Right)
        } else {
            Phase::Flung(Direction::Left)
        };
        Some(self.phase)
    }

    /// Offset the current release animation is heading for.
    pub fn target_offset(&self) -> f64 {
        match self.phase {
            Phase::Flung(Direction::Right) => self.hidden_x,
            Phase::Flung(Direction::Left) => -self.hidden_x,
            Phase::SpringingBack => 0.0,
            Phase::Resting | Phase::Dragging => self.offset,
        }
    }

    fn reset_offset(&mut self) {
        self.offset = 0.0;
        self.drag_start = 0.0;
        self.phase = Phase::Resting;
    }
}

impl<T: Clone> SwipeDeck<T> {
    /// The release animation finished. A completed fling advances the deck
    /// and yields the swipe; a spring-back just comes to rest.
    pub fn settle(&mut self) -> Option<Swiped<T>> {
        match self.phase {
            Phase::SpringingBack => {
                self.reset_offset();
                None
            }
            Phase::Flung(direction) => {
                let item = self.current().cloned();
                self.index += 1;
                self.reset_offset();
                item.map(|item| Swiped { direction, item })
            }
            Phase::Resting | Phase::Dragging => None,
        }
    }

    /// "Next" control: advance one card without any swipe signal.
    pub fn skip(&mut self) -> bool {
        if !self.accepts_gestures() {
            return false;
        }
        self.index += 1;
        self.reset_offset();
        true
    }

    pub fn rotation(&self) -> f64 {
        (ROTATION_DEG * self.offset / self.hidden_x).clamp(-ROTATION_DEG, ROTATION_DEG)
    }

    pub fn like_opacity(&self) -> f64 {
        (self.offset / (self.hidden_x / 5.0)).clamp(0.0, 1.0)
    }

    pub fn nope_opacity(&self) -> f64 {
        (-self.offset / (self.hidden_x / 5.0)).clamp(0.0, 1.0)
    }

    fn progress(&self) -> f64 {
        (self.offset.abs() / self.hidden_x).clamp(0.0, 1.0)
    }

    pub fn next_scale(&self) -> f64 {
        0.8 + 0.2 * self.progress()
    }

    pub fn next_opacity(&self) -> f64 {
        0.6 + 0.4 * self.progress()
    }

    pub fn view(&self) -> DeckView<T> {
        DeckView {
            current: self.current().cloned(),
            next: self.next_item().cloned(),
            index: self.index,
            remaining: self.remaining(),
            phase: self.phase,
            offset: self.offset,
            target_offset: self.target_offset(),
            rotation_deg: self.rotation(),
            like_opacity: self.like_opacity(),
            nope_opacity: self.nope_opacity(),
            next_scale: self.next_scale(),
            next_opacity: self.next_opacity(),
            message: self.is_exhausted().then_some("no more users"),
        }
    }
}

/// Render snapshot of the deck.
#[derive(Debug, Clone, Serialize)]
pub struct DeckView<T> {
    pub current: Option<T>,
    pub next: Option<T>,
    pub index: usize,
    pub remaining: usize,
    pub phase: Phase,
    pub offset: f64,
    pub target_offset: f64,
    pub rotation_deg: f64,
    pub like_opacity: f64,
    pub nope_opacity: f64,
    pub next_scale: f64,
    pub next_opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(items: &[&'static str]) -> SwipeDeck<&'static str> {
        let mut deck = SwipeDeck::new(390.0);
        deck.load(items.to_vec());
        deck
    }

    fn fling(
        deck: &mut SwipeDeck<&'static str>,
        translation: f64,
        velocity: f64,
    ) -> Option<Swiped<&'static str>> {
        deck.begin_drag();
        deck.drag(translation);
        deck.release(velocity);
        deck.settle()
    }

    #[test]
    fn right_fling_advances_once_and_signals_once() {
        let mut deck = deck(&["ann", "bea", "cat"]);
        let swiped = fling(&mut deck, 120.0, 1200.0);

        assert_eq!(swiped, Some(Swiped { direction: Direction::Right, item: "ann" }));
        assert_eq!(deck.index(), 1);
        assert_eq!(deck.offset(), 0.0);
        assert_eq!(deck.current(), Some(&"bea"));

        // A second settle after the fling completed is not a second swipe
        assert_eq!(deck.settle(), None);
        assert_eq!(deck.index(), 1);
    }

    #[test]
    fn slow_release_springs_back() {
        let mut deck = deck(&["ann", "bea"]);
        deck.begin_drag();
        deck.drag(300.0);
        assert_eq!(deck.release(799.9), Some(Phase::SpringingBack));
        assert_eq!(deck.target_offset(), 0.0);

        assert_eq!(deck.settle(), None);
        assert_eq!(deck.offset(), 0.0);
        assert_eq!(deck.index(), 0);
        assert_eq!(deck.phase(), Phase::Resting);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut deck = deck(&["ann", "bea"]);
        deck.begin_drag();
        assert_eq!(deck.release(-800.0), Some(Phase::Flung(Direction::Left)));
    }

    #[test]
    fn direction_follows_velocity_not_position() {
        let mut deck = deck(&["ann", "bea"]);
        let swiped = fling(&mut deck, 150.0, -900.0);
        assert_eq!(swiped.map(|s| s.direction), Some(Direction::Left));
    }

    #[test]
    fn drag_offset_is_relative_to_start() {
        let mut deck = deck(&["ann"]);
        deck.begin_drag();
        deck.drag(40.0);
        deck.release(0.0);
        // Second drag begins mid spring-back: ignored
        assert!(!deck.begin_drag());
        deck.settle();

        deck.begin_drag();
        deck.drag(-25.0);
        assert_eq!(deck.offset(), -25.0);
    }

    #[test]
    fn derived_visuals() {
        let mut deck = deck(&["ann", "bea"]);
        let hidden_x = deck.hidden_x();
        assert_eq!(hidden_x, 780.0);

        deck.begin_drag();
        deck.drag(hidden_x / 10.0);
        assert!((deck.like_opacity() - 0.5).abs() < 1e-9);
        assert_eq!(deck.nope_opacity(), 0.0);
        assert!((deck.rotation() - 6.0).abs() < 1e-9);

        deck.drag(-2.0 * hidden_x);
        assert_eq!(deck.rotation(), -ROTATION_DEG);
        assert_eq!(deck.nope_opacity(), 1.0);
        assert_eq!(deck.next_scale(), 1.0);
        assert_eq!(deck.next_opacity(), 1.0);

        deck.drag(0.0);
        assert_eq!(deck.next_scale(), 0.8);
        assert_eq!(deck.next_opacity(), 0.6);
    }

    #[test]
    fn empty_deck_ignores_gestures() {
        let mut deck = deck(&["ann"]);
        assert!(fling(&mut deck, 10.0, 900.0).is_some());
        assert!(deck.is_exhausted());

        assert!(!deck.begin_drag());
        assert!(!deck.drag(50.0));
        assert_eq!(deck.release(2000.0), None);
        assert!(!deck.skip());
        assert_eq!(deck.view().message, Some("no more users"));
    }

    #[test]
    fn skip_advances_without_signal() {
        let mut deck = deck(&["ann", "bea"]);
        assert!(deck.skip());
        assert_eq!(deck.current(), Some(&"bea"));
        assert_eq!(deck.settle(), None);
    }

    #[test]
    fn view_shows_next_card() {
        let deck = deck(&["ann", "bea"]);
        let view = deck.view();
        assert_eq!(view.current, Some("ann"));
        assert_eq!(view.next, Some("bea"));
        assert_eq!(view.remaining, 2);
        assert!(view.message.is_none());
    }
}
