// File: src/tui/handlers.rs
// Maps terminal input and background notifications onto state changes.
use crate::tui::action::{Action, AppEvent, InputEvent};
use crate::tui::state::AppState;
use chrono::NaiveDateTime;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    // Windows reports releases too.
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(InputEvent::Quit),
        KeyCode::Char('f') if ctrl => Some(InputEvent::ScrollDown),
        KeyCode::Char('b') if ctrl => Some(InputEvent::ScrollUp),
        KeyCode::Char('q') | KeyCode::Esc => Some(InputEvent::Quit),
        KeyCode::Char('h') | KeyCode::Left => Some(InputEvent::ScrollLeft),
        KeyCode::Char('l') | KeyCode::Right => Some(InputEvent::ScrollRight),
        KeyCode::Char('k') | KeyCode::Up => Some(InputEvent::ScrollUp),
        KeyCode::Char('j') | KeyCode::Down => Some(InputEvent::ScrollDown),
        KeyCode::Char('p') => Some(InputEvent::PreviousWindow),
        KeyCode::Char('n') => Some(InputEvent::NextWindow),
        KeyCode::Char('r') => Some(InputEvent::Refresh),
        _ => None,
    }
}

/// Applies a background notification. Returns the follow-up action, if any.
pub fn handle_app_event(state: &mut AppState, event: AppEvent, now: NaiveDateTime) -> Option<Action> {
    match event {
        AppEvent::PassCompleted { pass, result } => {
            let result = result.map_err(|e| {
                log::warn!("Pass {} failed: {}", pass, e);
                e.to_string()
            });
            state.complete_pass(pass, result, now);
            None
        }
        AppEvent::Tick => {
            state.set_today(now.date());
            state.handle_input(InputEvent::Tick)
        }
        AppEvent::Resized(w, h) => state.handle_input(InputEvent::Resize(w, h)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AggregateError, SourceError};
    use crate::grid::GridConfig;
    use crate::model::ViewKind;
    use crate::tui::state::Screen;
    use chrono::NaiveDate;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('h'))), Some(InputEvent::ScrollLeft));
        assert_eq!(map_key(key(KeyCode::Right)), Some(InputEvent::ScrollRight));
        assert_eq!(map_key(key(KeyCode::Char('j'))), Some(InputEvent::ScrollDown));
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(InputEvent::Quit));
        assert_eq!(map_key(key(KeyCode::Esc)), Some(InputEvent::Quit));
        assert_eq!(map_key(key(KeyCode::Char('x'))), None);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL)),
            Some(InputEvent::ScrollDown)
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::CONTROL)),
            Some(InputEvent::ScrollUp)
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(InputEvent::Quit)
        );
    }

    #[test]
    fn test_release_ignored() {
        let mut k = key(KeyCode::Char('q'));
        k.kind = KeyEventKind::Release;
        assert_eq!(map_key(k), None);
    }

    #[test]
    fn test_failed_pass_shows_error() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let now = today.and_hms_opt(12, 0, 0).unwrap();
        let mut st = AppState::new(ViewKind::Day, 0, today, GridConfig::default());
        let pass = match st.request_refresh() {
            Action::Refresh { pass, .. } => pass,
            Action::Quit => unreachable!(),
        };
        let err = AggregateError::for_account("work", SourceError::Credential("gone".into()));
        handle_app_event(
            &mut st,
            AppEvent::PassCompleted {
                pass,
                result: Err(err),
            },
            now,
        );
        match &st.screen {
            Screen::Error(msg) => assert!(msg.contains("work") && msg.contains("gone")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tick_rolls_day_and_refreshes() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        let mut st = AppState::new(ViewKind::Day, 0, today, GridConfig::default());
        let tomorrow = today.succ_opt().unwrap().and_hms_opt(0, 1, 0).unwrap();
        match handle_app_event(&mut st, AppEvent::Tick, tomorrow) {
            Some(Action::Refresh { window, .. }) => assert_eq!(window.start, tomorrow.date()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
