//! Notification state for a polled characteristic
//!
//! Holds the notifying flag, the id of the subscription session that owns the
//! poll loop, and the last value pushed to the client. Duplicate values are
//! suppressed. Starting a new session takes ownership from any running one,
//! whose next tick then tells its loop to stop.

/// Outcome of one poll tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Value changed, push it
    Notify(Vec<u8>),
    /// Value unchanged
    Unchanged,
    /// Notifications were disabled or taken over by a newer session
    Stop,
}

#[derive(Debug, Default)]
pub struct NotifyState {
    notifying: bool,
    session: u64,
    last_value: Option<Vec<u8>>,
}

impl NotifyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_notifying(&self) -> bool {
        self.notifying
    }

    pub fn last_value(&self) -> Option<&[u8]> {
        self.last_value.as_deref()
    }

    /// Enable notifications under a fresh session id. Any session still
    /// running loses ownership.
    pub fn start(&mut self) -> u64 {
        self.notifying = true;
        self.session += 1;
        self.last_value = None;
        self.session
    }

    /// Disable notifications regardless of which session owns them
    pub fn stop(&mut self) {
        self.notifying = false;
    }

    /// Disable notifications if `session` still owns them
    pub fn stop_session(&mut self, session: u64) {
        if self.session == session {
            self.stop();
        }
    }

    /// Whether `session` is the live one
    pub fn is_current(&self, session: u64) -> bool {
        self.is_notifying() && self.session == session
    }

    /// Record a freshly read value for `session`
    pub fn observe(&mut self, session: u64, value: Vec<u8>) -> Tick {
        if !self.is_current(session) {
            return Tick::Stop;
        }
        if self.last_value() == Some(value.as_slice()) {
            return Tick::Unchanged;
        }
        self.last_value = Some(value.clone());
        Tick::Notify(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_takes_over_running_session() {
        let mut state = NotifyState::new();
        let first = state.start();
        state.observe(first, b"1.0".to_vec());

        let second = state.start();
        assert!(state.is_notifying());
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
        assert_eq!(state.last_value(), None);
        assert_eq!(state.observe(first, b"1.0".to_vec()), Tick::Stop);

        // The old loop exiting must not end the new session
        state.stop_session(first);
        assert!(state.is_current(second));
    }

    #[test]
    fn test_only_changes_notify() {
        let mut state = NotifyState::new();
        let session = state.start();

        assert_eq!(
            state.observe(session, b"1.0".to_vec()),
            Tick::Notify(b"1.0".to_vec())
        );
        assert_eq!(state.observe(session, b"1.0".to_vec()), Tick::Unchanged);
        assert_eq!(
            state.observe(session, b"1.5".to_vec()),
            Tick::Notify(b"1.5".to_vec())
        );
        assert_eq!(state.last_value(), Some(b"1.5".as_slice()));
    }

    #[test]
    fn test_stop_ends_polling() {
        let mut state = NotifyState::new();
        let session = state.start();
        state.stop();

        assert!(!state.is_notifying());
        assert_eq!(state.observe(session, b"2.0".to_vec()), Tick::Stop);
    }

    #[test]
    fn test_restart_supersedes_old_session() {
        let mut state = NotifyState::new();
        let first = state.start();
        state.observe(first, b"1.0".to_vec());
        state.stop();

        let second = state.start();
        assert_ne!(first, second);
        assert_eq!(state.last_value(), None);
        assert_eq!(state.observe(first, b"3.0".to_vec()), Tick::Stop);

        // A late stop from the old session leaves the new one running
        state.stop_session(first);
        assert!(state.is_current(second));
        assert_eq!(
            state.observe(second, b"1.0".to_vec()),
            Tick::Notify(b"1.0".to_vec())
        );
    }
}
