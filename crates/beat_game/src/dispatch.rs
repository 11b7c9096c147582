//! Reserved inputs handled before the active screen sees them.

use std::path::{Path, PathBuf};

use beat_core::{DeviceInput, InputEvent, Key, MappedInput, MenuButton};

use crate::error::FatalRuntimeError;
use crate::frame_loop::RunState;
use crate::graphics::apply_graphics_options;
use crate::registry::Live;

pub const OPERATOR_SCREEN: &str = "ScreenOptionsMenu";
pub const COIN_SOUND: &str = "Common coin";
pub const SCREENSHOT_SLOTS: u32 = 1000;

/// Returns `true` when the event was consumed and must not reach the screen.
pub fn handle(
    live: &mut Live<'_>,
    run: &mut RunState,
    event: &InputEvent,
    mapped: &MappedInput,
) -> Result<bool, FatalRuntimeError> {
    if !event.is_first_press() {
        return Ok(false);
    }

    match mapped.menu_button() {
        Some(MenuButton::Operator) => {
            // System menus (editor included) must not be left without saving.
            if !live.game_state.on_system_menu {
                log::debug!(
                    "Operator menu from {}",
                    live.screens.active_screen().unwrap_or("<none>")
                );
                live.screens.post_system_message("OPERATOR");
                live.screens.set_active_screen(OPERATOR_SCREEN);
            }
            return Ok(true);
        }
        Some(MenuButton::Coin) if !live.game_state.editing => {
            live.game_state.insert_coin();
            live.screens.refresh_credits(live.game_state.coins);
            live.audio.play_once(COIN_SOUND);
            // Attract screens watch for credits, so the screen still gets it.
            return Ok(false);
        }
        _ => {}
    }

    let alt_held = live
        .input_filter
        .is_either_pressed(DeviceInput::Key(Key::LAlt), DeviceInput::Key(Key::RAlt));

    match event.input {
        DeviceInput::Key(Key::F4) if alt_held => {
            log::info!("Alt+F4: exiting");
            run.request_exit();
            Ok(true)
        }
        DeviceInput::Key(Key::F5) => {
            save_screenshot(live);
            Ok(true)
        }
        DeviceInput::Key(Key::Enter) if alt_held => {
            live.prefs.windowed = !live.prefs.windowed;
            apply_graphics_options(live.prefs, live.renderer, live.textures, live.screens)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn save_screenshot(live: &mut Live<'_>) {
    let path = next_screenshot_path(&live.prefs.screenshot_dir, &live.prefs.screenshot_format);
    match live.renderer.save_screenshot(&path) {
        Ok(()) => live
            .screens
            .post_system_message(&format!("Saved screenshot: {}", path.display())),
        Err(err) => {
            log::warn!("Screenshot '{}' failed: {err}", path.display());
            live.screens
                .post_system_message(&format!("Failed to save screenshot: {}", path.display()));
        }
    }
}

/// First free `screenNNNN.<ext>` in `dir`. When every slot is taken the
/// last one is overwritten.
pub fn next_screenshot_path(dir: &Path, ext: &str) -> PathBuf {
    let slot = |i: u32| dir.join(format!("screen{i:04}.{ext}"));
    (0..SCREENSHOT_SLOTS)
        .map(slot)
        .find(|path| !path.exists())
        .unwrap_or_else(|| slot(SCREENSHOT_SLOTS - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, LiveFixture};
    use beat_core::{GameButton, GameController, GameInput, InputPhase};
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "beat_screenshots_{}_{}",
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    fn press(key: Key) -> InputEvent {
        InputEvent::new(DeviceInput::Key(key), InputPhase::FirstPress)
    }

    fn dispatch(fixture: &mut LiveFixture, run: &mut RunState, event: InputEvent) -> bool {
        fixture
            .with_live(|live| {
                let mapped = live.input_mapper.map(event.input);
                handle(live, run, &event, &mapped)
            })
            .expect("dispatch")
    }

    #[test]
    fn screenshot_picks_first_free_slot() {
        let dir = scratch_dir();
        for i in 0..42 {
            fs::write(dir.join(format!("screen{i:04}.bmp")), b"x").expect("write");
        }
        assert_eq!(next_screenshot_path(&dir, "bmp"), dir.join("screen0042.bmp"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn screenshot_overwrites_last_slot_when_full() {
        let dir = scratch_dir();
        for i in 0..SCREENSHOT_SLOTS {
            fs::write(dir.join(format!("screen{i:04}.png")), b"x").expect("write");
        }
        assert_eq!(next_screenshot_path(&dir, "png"), dir.join("screen0999.png"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn only_first_press_is_considered() {
        let mut fixture = LiveFixture::new();
        let mut run = RunState::default();
        let event = InputEvent::new(DeviceInput::Key(Key::F1), InputPhase::Repeat);
        assert!(!dispatch(&mut fixture, &mut run, event));
        assert_eq!(fixture.game_state_coins(), 0);
    }

    #[test]
    fn coin_adds_one_credit_and_is_not_consumed() {
        let mut fixture = LiveFixture::new();
        let mut run = RunState::default();
        for expected in 1..=3 {
            assert!(!dispatch(&mut fixture, &mut run, press(Key::F1)));
            assert_eq!(fixture.game_state_coins(), expected);
        }
        let calls = fixture.recorder.calls();
        assert!(calls.contains(&Call::PlayOnce(COIN_SOUND.to_string())));
        assert!(calls.contains(&Call::Credits(3)));
    }

    #[test]
    fn coin_is_ignored_while_editing() {
        let mut fixture = LiveFixture::new();
        fixture.with_live(|live| live.game_state.editing = true);
        let mut run = RunState::default();
        assert!(!dispatch(&mut fixture, &mut run, press(Key::F1)));
        assert_eq!(fixture.game_state_coins(), 0);
    }

    #[test]
    fn operator_opens_options_unless_on_system_menu() {
        let mut fixture = LiveFixture::new();
        let mut run = RunState::default();
        assert!(dispatch(&mut fixture, &mut run, press(Key::ScrollLock)));
        let calls = fixture.recorder.calls();
        assert!(calls.contains(&Call::SetScreen(OPERATOR_SCREEN.to_string())));
        assert!(calls.contains(&Call::Message("OPERATOR".to_string())));

        let mut fixture = LiveFixture::new();
        fixture.with_live(|live| live.game_state.on_system_menu = true);
        assert!(dispatch(&mut fixture, &mut run, press(Key::ScrollLock)));
        assert!(fixture.recorder.calls().is_empty());
    }

    #[test]
    fn alt_f4_requests_exit() {
        let mut fixture = LiveFixture::new();
        let mut run = RunState::default();
        assert!(!dispatch(&mut fixture, &mut run, press(Key::F4)));
        assert!(!run.is_quitting());

        fixture.with_live(|live| {
            live.input_filter
                .button_pressed(DeviceInput::Key(Key::RAlt), true)
        });
        assert!(dispatch(&mut fixture, &mut run, press(Key::F4)));
        assert!(run.is_quitting());
    }

    #[test]
    fn alt_enter_toggles_windowed_and_reapplies() {
        let mut fixture = LiveFixture::new();
        let mut run = RunState::default();

        // Plain Enter is Start and belongs to the screen.
        assert!(!dispatch(&mut fixture, &mut run, press(Key::Enter)));

        fixture.with_live(|live| {
            live.input_filter
                .button_pressed(DeviceInput::Key(Key::LAlt), true)
        });
        assert!(dispatch(&mut fixture, &mut run, press(Key::Enter)));
        assert!(!fixture.with_live(|live| live.prefs.windowed));
        assert!(fixture
            .recorder
            .calls()
            .iter()
            .any(|c| matches!(c, Call::SetVideoMode(mode) if !mode.windowed)));
    }

    #[test]
    fn f5_saves_screenshot_and_notifies() {
        let dir = scratch_dir();
        let mut fixture = LiveFixture::new();
        fixture.with_live(|live| live.prefs.screenshot_dir = dir.clone());
        let mut run = RunState::default();
        assert!(dispatch(&mut fixture, &mut run, press(Key::F5)));
        let expected = dir.join("screen0000.bmp");
        let calls = fixture.recorder.calls();
        assert!(calls.contains(&Call::Screenshot(expected.clone())));
        assert!(calls.contains(&Call::Message(format!(
            "Saved screenshot: {}",
            expected.display()
        ))));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unrecognised_input_is_not_consumed() {
        let mut fixture = LiveFixture::new();
        let mut run = RunState::default();
        assert!(!dispatch(&mut fixture, &mut run, press(Key::Left)));
        let game = fixture
            .with_live(|live| live.input_mapper.device_to_game(DeviceInput::Key(Key::Left)));
        assert_eq!(
            game,
            Some(GameInput::new(GameController::One, GameButton::Left))
        );
    }
}
