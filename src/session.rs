use log::{debug, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Paused,
    GameOver,
}

/// Lifecycle of the game plus a round counter.
///
/// Every start or reset opens a new round. A game-over signal names the
/// round it was raised in and is dropped when that round is already over,
/// so a late signal can never end the round that follows it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    round: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Idle or GameOver -> Running.
    pub fn start(&mut self) -> bool {
        match self.state {
            SessionState::Idle | SessionState::GameOver => {
                self.round += 1;
                self.enter(SessionState::Running);
                true
            }
            _ => self.ignore("start"),
        }
    }

    pub fn pause(&mut self) -> bool {
        match self.state {
            SessionState::Running => {
                self.enter(SessionState::Paused);
                true
            }
            _ => self.ignore("pause"),
        }
    }

    pub fn resume(&mut self) -> bool {
        match self.state {
            SessionState::Paused => {
                self.enter(SessionState::Running);
                true
            }
            _ => self.ignore("resume"),
        }
    }

    /// Any state -> Idle. Always opens a new round.
    pub fn reset(&mut self) {
        self.round += 1;
        self.enter(SessionState::Idle);
    }

    /// Running -> GameOver for the given round. Returns `true` only for the
    /// signal that actually ended the round.
    pub fn finish(&mut self, round: u64) -> bool {
        if round != self.round {
            debug!("Dropping game over for stale round {} (now {})", round, self.round);
            return false;
        }
        match self.state {
            SessionState::Running => {
                self.enter(SessionState::GameOver);
                true
            }
            _ => self.ignore("finish"),
        }
    }

    fn enter(&mut self, state: SessionState) {
        info!(
            "Session {:?} -> {:?} (round {})",
            self.state, state, self.round
        );
        self.state = state;
    }

    fn ignore(&self, what: &str) -> bool {
        warn!("Ignoring {} while {:?}", what, self.state);
        false
    }
}
