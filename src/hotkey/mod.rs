//! Global export shortcut, backed by `rdev`.
//!
//! # Design
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while the
//! process is alive.  It must run on a **dedicated OS thread**; it cannot be
//! used inside a tokio task.
//!
//! The shortcut is a [`Chord`]: one key plus a set of modifiers, parsed from a
//! config string such as `"Ctrl+Meta+C"`.  [`ChordMatcher`] follows modifier
//! presses and releases and reports one match per physical key press, so
//! keyboard auto-repeat does not queue a burst of exports.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use audio_stager::hotkey::{HotkeyListener, parse_chord};
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let chord = parse_chord("Ctrl+Meta+C").expect("bad chord");
//! let _listener = HotkeyListener::start(chord, tx);
//!
//! // In your async loop:
//! // while let Some(ev) = rx.recv().await { ... }
//! ```

pub mod listener;

pub use listener::HotkeyListener;

// ---------------------------------------------------------------------------
// HotkeyEvent
// ---------------------------------------------------------------------------

/// Events emitted by the hotkey listener thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// The export chord was pressed.
    ExportRequested,
}

// ---------------------------------------------------------------------------
// Modifiers / Chord
// ---------------------------------------------------------------------------

/// Modifier keys, left and right variants folded together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Command on macOS, Windows key elsewhere.
    pub meta: bool,
}

impl Modifiers {
    /// `true` when every modifier set in `required` is also set in `self`.
    pub fn contains(&self, required: &Modifiers) -> bool {
        (!required.ctrl || self.ctrl)
            && (!required.shift || self.shift)
            && (!required.alt || self.alt)
            && (!required.meta || self.meta)
    }

    /// Update from a key event.  Returns `false` if `key` is not a modifier.
    fn apply(&mut self, key: rdev::Key, down: bool) -> bool {
        let slot = match key {
            rdev::Key::ControlLeft | rdev::Key::ControlRight => &mut self.ctrl,
            rdev::Key::ShiftLeft | rdev::Key::ShiftRight => &mut self.shift,
            rdev::Key::Alt | rdev::Key::AltGr => &mut self.alt,
            rdev::Key::MetaLeft | rdev::Key::MetaRight => &mut self.meta,
            _ => return false,
        };
        *slot = down;
        true
    }
}

/// A key plus the modifiers that must be held with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chord {
    pub key: rdev::Key,
    pub modifiers: Modifiers,
}

// ---------------------------------------------------------------------------
// parse_key / parse_chord
// ---------------------------------------------------------------------------

/// Parse a key name from a config string into an [`rdev::Key`].
///
/// Supports F1–F12, common named keys, digits, and single ASCII letters in
/// either case.
///
/// # Examples
///
/// ```
/// use audio_stager::hotkey::parse_key;
///
/// assert_eq!(parse_key("F9"),      Some(rdev::Key::F9));
/// assert_eq!(parse_key("Escape"),  Some(rdev::Key::Escape));
/// assert_eq!(parse_key("c"),       Some(rdev::Key::KeyC));
/// assert_eq!(parse_key("xyz"),     None);
/// ```
pub fn parse_key(key_str: &str) -> Option<rdev::Key> {
    use rdev::Key::*;

    let key = match key_str {
        "F1" => F1,
        "F2" => F2,
        "F3" => F3,
        "F4" => F4,
        "F5" => F5,
        "F6" => F6,
        "F7" => F7,
        "F8" => F8,
        "F9" => F9,
        "F10" => F10,
        "F11" => F11,
        "F12" => F12,

        "Escape" | "Esc" => Escape,
        "Space" => Space,
        "Return" | "Enter" => Return,
        "Tab" => Tab,
        "Backspace" => Backspace,
        "Delete" | "Del" => Delete,
        "Home" => Home,
        "End" => End,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "PrintScreen" => PrintScreen,
        "Pause" => Pause,

        "0" => Num0,
        "1" => Num1,
        "2" => Num2,
        "3" => Num3,
        "4" => Num4,
        "5" => Num5,
        "6" => Num6,
        "7" => Num7,
        "8" => Num8,
        "9" => Num9,

        s if s.len() == 1 => return letter_key(s.as_bytes()[0].to_ascii_uppercase()),
        _ => return None,
    };
    Some(key)
}

fn letter_key(c: u8) -> Option<rdev::Key> {
    use rdev::Key::*;

    const LETTERS: [rdev::Key; 26] = [
        KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM, KeyN,
        KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
    ];
    c.is_ascii_uppercase().then(|| LETTERS[(c - b'A') as usize])
}

/// Parse a chord such as `"Ctrl+Meta+C"` or `"Shift+F9"`.
///
/// Modifier names are case-insensitive: `Ctrl`/`Control`, `Shift`,
/// `Alt`/`Option`, `Meta`/`Cmd`/`Command`/`Super`/`Win`.  Exactly one
/// non-modifier key must be present.
///
/// ```
/// use audio_stager::hotkey::parse_chord;
///
/// let chord = parse_chord("Ctrl+Meta+C").unwrap();
/// assert_eq!(chord.key, rdev::Key::KeyC);
/// assert!(chord.modifiers.ctrl && chord.modifiers.meta);
/// assert!(parse_chord("Ctrl+Shift").is_none());
/// ```
pub fn parse_chord(chord_str: &str) -> Option<Chord> {
    let mut modifiers = Modifiers::default();
    let mut key = None;

    for part in chord_str.split('+').map(str::trim) {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.ctrl = true,
            "shift" => modifiers.shift = true,
            "alt" | "option" => modifiers.alt = true,
            "meta" | "cmd" | "command" | "super" | "win" => modifiers.meta = true,
            _ => {
                if key.is_some() {
                    return None;
                }
                key = Some(parse_key(part)?);
            }
        }
    }

    key.map(|key| Chord { key, modifiers })
}

// ---------------------------------------------------------------------------
// ChordMatcher
// ---------------------------------------------------------------------------

/// Tracks keyboard state and reports when a [`Chord`] is struck.
#[derive(Debug, Clone)]
pub struct ChordMatcher {
    chord: Chord,
    held: Modifiers,
    key_down: bool,
}

impl ChordMatcher {
    pub fn new(chord: Chord) -> Self {
        Self {
            chord,
            held: Modifiers::default(),
            key_down: false,
        }
    }

    /// Feed one input event.  Returns `true` on the first press of the chord
    /// key while all required modifiers are held.
    pub fn handle(&mut self, event: &rdev::EventType) -> bool {
        match event {
            &rdev::EventType::KeyPress(k) => {
                if self.held.apply(k, true) || k != self.chord.key {
                    return false;
                }
                let first_press = !self.key_down;
                self.key_down = true;
                first_press && self.held.contains(&self.chord.modifiers)
            }
            &rdev::EventType::KeyRelease(k) => {
                if !self.held.apply(k, false) && k == self.chord.key {
                    self.key_down = false;
                }
                false
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rdev::EventType::{KeyPress, KeyRelease};
    use rdev::Key;

    #[test]
    fn parse_function_and_named_keys() {
        assert_eq!(parse_key("F9"), Some(Key::F9));
        assert_eq!(parse_key("F12"), Some(Key::F12));
        assert_eq!(parse_key("Esc"), Some(Key::Escape));
        assert_eq!(parse_key("Enter"), Some(Key::Return));
        assert_eq!(parse_key("7"), Some(Key::Num7));
    }

    #[test]
    fn parse_letter_keys_case_insensitive() {
        assert_eq!(parse_key("A"), Some(Key::KeyA));
        assert_eq!(parse_key("a"), Some(Key::KeyA));
        assert_eq!(parse_key("z"), Some(Key::KeyZ));
    }

    #[test]
    fn parse_unknown_key_returns_none() {
        assert_eq!(parse_key("xyz"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("?"), None);
    }

    #[test]
    fn parse_default_export_chord() {
        let chord = parse_chord("Ctrl+Meta+C").unwrap();
        assert_eq!(chord.key, Key::KeyC);
        assert_eq!(
            chord.modifiers,
            Modifiers {
                ctrl: true,
                meta: true,
                ..Modifiers::default()
            }
        );
    }

    #[test]
    fn parse_chord_aliases_and_spacing() {
        let chord = parse_chord("cmd + shift + F9").unwrap();
        assert_eq!(chord.key, Key::F9);
        assert!(chord.modifiers.meta && chord.modifiers.shift);
        assert!(!chord.modifiers.ctrl);

        assert_eq!(parse_chord("F9").unwrap().modifiers, Modifiers::default());
    }

    #[test]
    fn parse_chord_rejects_bad_input() {
        assert!(parse_chord("").is_none());
        assert!(parse_chord("Ctrl+Alt").is_none());
        assert!(parse_chord("Ctrl+A+B").is_none());
        assert!(parse_chord("Ctrl+Nope").is_none());
    }

    fn matcher() -> ChordMatcher {
        ChordMatcher::new(parse_chord("Ctrl+Meta+C").unwrap())
    }

    #[test]
    fn fires_when_modifiers_held() {
        let mut m = matcher();
        assert!(!m.handle(&KeyPress(Key::ControlLeft)));
        assert!(!m.handle(&KeyPress(Key::MetaLeft)));
        assert!(m.handle(&KeyPress(Key::KeyC)));
    }

    #[test]
    fn extra_modifiers_still_match() {
        let mut m = matcher();
        m.handle(&KeyPress(Key::ControlRight));
        m.handle(&KeyPress(Key::MetaRight));
        m.handle(&KeyPress(Key::ShiftLeft));
        assert!(m.handle(&KeyPress(Key::KeyC)));
    }

    #[test]
    fn missing_modifier_does_not_fire() {
        let mut m = matcher();
        m.handle(&KeyPress(Key::ControlLeft));
        assert!(!m.handle(&KeyPress(Key::KeyC)));
    }

    #[test]
    fn auto_repeat_fires_once_per_press() {
        let mut m = matcher();
        m.handle(&KeyPress(Key::ControlLeft));
        m.handle(&KeyPress(Key::MetaLeft));

        assert!(m.handle(&KeyPress(Key::KeyC)));
        assert!(!m.handle(&KeyPress(Key::KeyC)));
        assert!(!m.handle(&KeyPress(Key::KeyC)));

        m.handle(&KeyRelease(Key::KeyC));
        assert!(m.handle(&KeyPress(Key::KeyC)));
    }

    #[test]
    fn released_modifier_stops_matching() {
        let mut m = matcher();
        m.handle(&KeyPress(Key::ControlLeft));
        m.handle(&KeyPress(Key::MetaLeft));
        m.handle(&KeyRelease(Key::MetaLeft));
        assert!(!m.handle(&KeyPress(Key::KeyC)));
    }
}
