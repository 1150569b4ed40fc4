//! Lid decision with an optional debounce window.

use crate::sensing::LidState;

/// Turns the presence level of each cycle into the lid state to command.
///
/// With a window of zero the lid simply follows the presence pin. With a window
/// of `n`, a changed level has to be seen on `n + 1` consecutive cycles before
/// the lid moves, which keeps a noisy sensor from making the lid chatter.
#[derive(Debug, Clone)]
pub struct LidDebouncer {
    window: u32,
    current: Option<LidState>,
    pending: Option<(LidState, u32)>,
}

impl LidDebouncer {
    pub fn new(window: u32) -> Self {
        Self {
            window,
            current: None,
            pending: None,
        }
    }

    /// Feed this cycle's desired state; returns the state to command.
    pub fn update(&mut self, desired: LidState) -> LidState {
        let current = match self.current {
            // first decision is taken as-is
            None => {
                self.current = Some(desired);
                return desired;
            }
            Some(current) => current,
        };

        if current == desired {
            self.pending = None;
            return current;
        }

        let seen = match self.pending {
            Some((state, count)) if state == desired => count + 1,
            _ => 1,
        };
        if seen > self.window {
            self.current = Some(desired);
            self.pending = None;
            desired
        } else {
            self.pending = Some((desired, seen));
            current
        }
    }

    pub fn current(&self) -> Option<LidState> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LidState::{Closed, Open};

    #[test]
    fn test_zero_window_follows_presence() {
        let mut lid = LidDebouncer::new(0);
        assert_eq!(lid.update(Closed), Closed);
        assert_eq!(lid.update(Open), Open);
        assert_eq!(lid.update(Closed), Closed);
        assert_eq!(lid.update(Open), Open);
    }

    #[test]
    fn test_window_suppresses_chatter() {
        let mut lid = LidDebouncer::new(2);
        assert_eq!(lid.update(Closed), Closed);
        assert_eq!(lid.update(Open), Closed);
        assert_eq!(lid.update(Closed), Closed);
        assert_eq!(lid.update(Open), Closed);
        assert_eq!(lid.update(Open), Closed);
        assert_eq!(lid.update(Open), Open);
        assert_eq!(lid.current(), Some(Open));
    }

    #[test]
    fn test_first_decision_is_immediate() {
        let mut lid = LidDebouncer::new(5);
        assert_eq!(lid.update(Open), Open);
    }
}
