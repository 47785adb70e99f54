//! Reset button gesture classification
//!
//! Turns debounced press/release edges into the two admin gestures:
//! releasing after a short hold resets the network configuration, holding
//! for a long time resets the accessory to factory settings. The long hold
//! fires while the button is still down and suppresses the release gesture.

use embassy_time::{Duration, Instant};

use crate::config::ButtonConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonGesture {
    /// Released after at least the network reset threshold
    ReleasedAfter,
    /// Held for at least the factory reset threshold
    HeldFor,
}

pub struct ResetButton {
    release_threshold: Duration,
    hold_threshold: Duration,
    pressed_at: Option<Instant>,
    hold_fired: bool,
}

impl ResetButton {
    pub fn new(config: &ButtonConfig) -> Self {
        Self {
            release_threshold: config.network_reset_release(),
            hold_threshold: config.factory_reset_hold(),
            pressed_at: None,
            hold_fired: false,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    /// Record a press edge. Repeated presses keep the first timestamp.
    pub fn press(&mut self, now: Instant) {
        if self.pressed_at.is_none() {
            self.pressed_at = Some(now);
            self.hold_fired = false;
        }
    }

    /// Check a held button; returns the long hold gesture at most once per press.
    pub fn poll(&mut self, now: Instant) -> Option<ButtonGesture> {
        let pressed_at = self.pressed_at?;

        if !self.hold_fired && now.saturating_duration_since(pressed_at) >= self.hold_threshold {
            self.hold_fired = true;
            return Some(ButtonGesture::HeldFor);
        }

        None
    }

    /// Record a release edge and classify the press that just ended.
    pub fn release(&mut self, now: Instant) -> Option<ButtonGesture> {
        // A long hold that was never polled still counts
        if let Some(gesture) = self.poll(now) {
            self.pressed_at = None;
            return Some(gesture);
        }

        let pressed_at = self.pressed_at.take()?;
        if self.hold_fired {
            return None;
        }

        (now.saturating_duration_since(pressed_at) >= self.release_threshold)
            .then_some(ButtonGesture::ReleasedAfter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn button() -> ResetButton {
        ResetButton::new(&ButtonConfig::default())
    }

    #[test]
    fn test_short_press_is_ignored() {
        let mut button = button();
        button.press(at(1_000));
        assert_eq!(button.poll(at(2_000)), None);
        assert_eq!(button.release(at(3_999)), None);
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_release_after_threshold_resets_network() {
        let mut button = button();
        button.press(at(0));
        assert_eq!(button.release(at(3_000)), Some(ButtonGesture::ReleasedAfter));

        button.press(at(10_000));
        assert_eq!(button.release(at(19_999)), Some(ButtonGesture::ReleasedAfter));
    }

    #[test]
    fn test_long_hold_fires_once_while_pressed() {
        let mut button = button();
        button.press(at(0));
        assert_eq!(button.poll(at(9_999)), None);
        assert_eq!(button.poll(at(10_000)), Some(ButtonGesture::HeldFor));
        assert_eq!(button.poll(at(11_000)), None);
        assert_eq!(button.release(at(12_000)), None);
    }

    #[test]
    fn test_unpolled_long_hold_fires_on_release() {
        let mut button = button();
        button.press(at(0));
        assert_eq!(button.release(at(15_000)), Some(ButtonGesture::HeldFor));
        assert!(!button.is_pressed());
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut button = button();
        assert_eq!(button.release(at(5_000)), None);
        assert_eq!(button.poll(at(50_000)), None);
    }

    #[test]
    fn test_repeated_press_keeps_first_edge() {
        let mut button = button();
        button.press(at(0));
        button.press(at(2_500));
        assert_eq!(button.release(at(3_000)), Some(ButtonGesture::ReleasedAfter));
    }

    #[test]
    fn test_each_press_can_fire_long_hold() {
        let mut button = button();
        button.press(at(0));
        assert_eq!(button.poll(at(10_000)), Some(ButtonGesture::HeldFor));
        button.release(at(10_500));

        button.press(at(20_000));
        assert_eq!(button.poll(at(30_000)), Some(ButtonGesture::HeldFor));
    }
}
