//! Translation from crossterm events and the command-vs-text dispatch
//! discipline.
//!
//! Every key press is offered to `on_key_event` first. Only when the
//! application leaves it unconsumed, the key is printable, and no
//! Ctrl/Alt/Cmd modifier is held does a synthesized `Char` follow through
//! `on_char_event`. At most one `Key` delivery per source event, never
//! interleaved across source events.

use crossterm::event;

use ttk_core::{
    CharEvent, EventHandler, KeyCode, KeyEvent, Modifiers, MouseAction, MouseButton, MouseEvent,
};

pub(crate) fn translate_key(native: &event::KeyEvent) -> Option<KeyEvent> {
    if !matches!(native.kind, event::KeyEventKind::Press | event::KeyEventKind::Repeat) {
        return None;
    }
    let mut modifiers = translate_modifiers(native.modifiers);
    let code = match native.code {
        event::KeyCode::Char(c) => KeyCode::Char(c),
        event::KeyCode::Enter => KeyCode::Enter,
        event::KeyCode::Tab => KeyCode::Tab,
        event::KeyCode::BackTab => {
            modifiers |= Modifiers::SHIFT;
            KeyCode::Tab
        }
        event::KeyCode::Esc => KeyCode::Escape,
        event::KeyCode::Backspace => KeyCode::Backspace,
        event::KeyCode::Up => KeyCode::Up,
        event::KeyCode::Down => KeyCode::Down,
        event::KeyCode::Left => KeyCode::Left,
        event::KeyCode::Right => KeyCode::Right,
        event::KeyCode::Home => KeyCode::Home,
        event::KeyCode::End => KeyCode::End,
        event::KeyCode::PageUp => KeyCode::PageUp,
        event::KeyCode::PageDown => KeyCode::PageDown,
        event::KeyCode::Insert => KeyCode::Insert,
        event::KeyCode::Delete => KeyCode::Delete,
        event::KeyCode::F(n) => KeyCode::F(n),
        _ => return None,
    };
    Some(KeyEvent::new(code, modifiers))
}

fn translate_modifiers(native: event::KeyModifiers) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if native.contains(event::KeyModifiers::SHIFT) {
        modifiers |= Modifiers::SHIFT;
    }
    if native.contains(event::KeyModifiers::CONTROL) {
        modifiers |= Modifiers::CONTROL;
    }
    if native.contains(event::KeyModifiers::ALT) {
        modifiers |= Modifiers::ALT;
    }
    if native.contains(event::KeyModifiers::SUPER) || native.contains(event::KeyModifiers::META) {
        modifiers |= Modifiers::COMMAND;
    }
    modifiers
}

pub(crate) fn translate_mouse(native: &event::MouseEvent) -> Option<MouseEvent> {
    let (button, action) = match native.kind {
        event::MouseEventKind::Down(b) => (translate_button(b), MouseAction::Press),
        event::MouseEventKind::Up(b) => (translate_button(b), MouseAction::Release),
        event::MouseEventKind::Drag(b) => (translate_button(b), MouseAction::Move),
        event::MouseEventKind::Moved => (MouseButton::Other(0), MouseAction::Move),
        _ => return None,
    };
    Some(MouseEvent {
        x: i32::from(native.column),
        y: i32::from(native.row),
        button,
        action,
    })
}

fn translate_button(native: event::MouseButton) -> MouseButton {
    match native {
        event::MouseButton::Left => MouseButton::Left,
        event::MouseButton::Right => MouseButton::Right,
        event::MouseButton::Middle => MouseButton::Middle,
    }
}

/// Deliver one key press with the command-vs-text discipline.
pub(crate) fn deliver_key(handler: &mut dyn EventHandler, key: KeyEvent) {
    let consumed = handler.on_key_event(&key);
    if consumed || key.modifiers.suppresses_text() {
        return;
    }
    if let Some(grapheme) = key.text {
        handler.on_char_event(&CharEvent { grapheme });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttk_core::{Event, SystemEvent};

    /// Records deliveries and consumes keys on demand.
    struct Recorder {
        consume_keys: bool,
        delivered: Vec<Event>,
    }

    impl Recorder {
        fn new(consume_keys: bool) -> Self {
            Recorder { consume_keys, delivered: Vec::new() }
        }
    }

    impl EventHandler for Recorder {
        fn on_key_event(&mut self, event: &KeyEvent) -> bool {
            self.delivered.push(Event::Key(event.clone()));
            self.consume_keys
        }

        fn on_char_event(&mut self, event: &CharEvent) -> bool {
            self.delivered.push(Event::Char(event.clone()));
            true
        }

        fn on_system_event(&mut self, event: &SystemEvent) -> bool {
            self.delivered.push(Event::System(*event));
            true
        }
    }

    fn press(code: event::KeyCode, modifiers: event::KeyModifiers) -> event::KeyEvent {
        event::KeyEvent::new(code, modifiers)
    }

    #[test]
    fn unconsumed_printable_key_is_followed_by_char() {
        let mut handler = Recorder::new(false);
        let key = translate_key(&press(event::KeyCode::Char('q'), event::KeyModifiers::NONE))
            .unwrap();
        deliver_key(&mut handler, key);
        assert_eq!(handler.delivered.len(), 2);
        assert!(matches!(&handler.delivered[0], Event::Key(k) if k.code == KeyCode::Char('q')));
        assert!(matches!(&handler.delivered[1], Event::Char(c) if c.grapheme == "q"));
    }

    #[test]
    fn consumed_key_suppresses_char() {
        let mut handler = Recorder::new(true);
        let key = translate_key(&press(event::KeyCode::Char('q'), event::KeyModifiers::NONE))
            .unwrap();
        deliver_key(&mut handler, key);
        assert_eq!(handler.delivered.len(), 1);
        assert!(matches!(&handler.delivered[0], Event::Key(_)));
    }

    #[test]
    fn control_modifier_never_produces_char() {
        let mut handler = Recorder::new(false);
        let key = translate_key(&press(event::KeyCode::Char('c'), event::KeyModifiers::CONTROL))
            .unwrap();
        assert_eq!(key.modifiers, Modifiers::CONTROL);
        deliver_key(&mut handler, key);
        assert_eq!(handler.delivered.len(), 1);
        assert!(matches!(&handler.delivered[0], Event::Key(k) if k.text.is_none()));
    }

    #[test]
    fn non_printable_keys_never_produce_char() {
        let mut handler = Recorder::new(false);
        let key =
            translate_key(&press(event::KeyCode::Enter, event::KeyModifiers::NONE)).unwrap();
        deliver_key(&mut handler, key);
        assert_eq!(handler.delivered.len(), 1);
    }

    #[test]
    fn shift_still_produces_char() {
        let mut handler = Recorder::new(false);
        let key = translate_key(&press(event::KeyCode::Char('Q'), event::KeyModifiers::SHIFT))
            .unwrap();
        deliver_key(&mut handler, key);
        assert!(matches!(&handler.delivered[1], Event::Char(c) if c.grapheme == "Q"));
    }

    #[test]
    fn special_keys_translate() {
        let key =
            translate_key(&press(event::KeyCode::Up, event::KeyModifiers::NONE)).unwrap();
        assert_eq!(key.code, KeyCode::Up);
        let key = translate_key(&press(event::KeyCode::F(5), event::KeyModifiers::NONE)).unwrap();
        assert_eq!(key.code, KeyCode::F(5));
        let key =
            translate_key(&press(event::KeyCode::BackTab, event::KeyModifiers::NONE)).unwrap();
        assert_eq!(key.code, KeyCode::Tab);
        assert!(key.modifiers.contains(Modifiers::SHIFT));
    }

    #[test]
    fn key_release_is_ignored() {
        let mut native = press(event::KeyCode::Char('a'), event::KeyModifiers::NONE);
        native.kind = event::KeyEventKind::Release;
        assert_eq!(translate_key(&native), None);
    }

    #[test]
    fn mouse_events_translate() {
        let native = event::MouseEvent {
            kind: event::MouseEventKind::Down(event::MouseButton::Left),
            column: 3,
            row: 7,
            modifiers: event::KeyModifiers::NONE,
        };
        let mouse = translate_mouse(&native).unwrap();
        assert_eq!((mouse.x, mouse.y), (3, 7));
        assert_eq!(mouse.button, MouseButton::Left);
        assert_eq!(mouse.action, MouseAction::Press);

        let scroll = event::MouseEvent {
            kind: event::MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: event::KeyModifiers::NONE,
        };
        assert_eq!(translate_mouse(&scroll), None);
    }
}
