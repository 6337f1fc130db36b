use std::time::Duration;

pub const DEFAULT_PORT: u16 = 42485;
pub const DEFAULT_GAMES: u32 = 100;
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(60);

/// Rule toggles. The first block is the standard rule set; the second block
/// is the optional extensions, off by default. `five_skip` and `six_reverse`
/// are accepted but not yet wired into the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    pub revolution: bool,
    pub eight_cut: bool,
    pub suit_lock: bool,
    pub card_exchange: bool,
    pub spade3_return: bool,
    pub thousand_day: bool,

    pub eleven_back: bool,
    pub five_skip: bool,
    pub six_reverse: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            revolution: true,
            eight_cut: true,
            suit_lock: true,
            card_exchange: true,
            spade3_return: true,
            thousand_day: true,
            eleven_back: false,
            five_skip: false,
            six_reverse: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub port: u16,
    pub total_games: u32,
    pub seed: Option<u64>,
    pub turn_timeout: Duration,
    pub show_hands: bool,
    pub rules: Rules,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            port: DEFAULT_PORT,
            total_games: DEFAULT_GAMES,
            seed: None,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            show_hands: false,
            rules: Rules::default(),
        }
    }
}
