/// Session state shared by every screen: credits, and the flags the global
/// dispatcher consults before acting on reserved buttons.
#[derive(Debug, Default)]
pub struct GameState {
    pub coins: u32,
    /// True while a system screen (options, editor) is active. Synced from the
    /// screen manager every frame.
    pub on_system_menu: bool,
    pub editing: bool,
    pub session_time: f64,
    #[cfg(test)]
    pub observer: Option<crate::testing::Recorder>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to attract-mode defaults. Credits survive a reset.
    pub fn reset(&mut self) {
        log::debug!("Game state reset ({} credits kept)", self.coins);
        self.on_system_menu = false;
        self.editing = false;
        self.session_time = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.session_time += f64::from(dt);
        self.observe_update(dt);
    }

    #[cfg(test)]
    fn observe_update(&self, dt: f32) {
        if let Some(observer) = &self.observer {
            observer.push(crate::testing::Call::GameStateUpdate(dt));
        }
    }

    #[cfg(not(test))]
    fn observe_update(&self, _dt: f32) {}

    pub fn insert_coin(&mut self) {
        self.coins = self.coins.saturating_add(1);
        log::info!("Coin inserted ({} total)", self.coins);
    }
}
