//! Keyboard script builders

use std::time::Duration;

use input_types::{InputEvent, KeyModifiers, KeyStroke, VirtualKeyCode};
use motion_synth::DelayRange;
use rand::Rng;

use crate::{DispatchError, DispatchResult, Script};

/// Gap between chord stages in [`hotkey_script`]
pub const HOTKEY_GAP: Duration = Duration::from_millis(20);

/// Resolve every character up front so nothing is sent for bad input
pub fn keystrokes(text: &str) -> DispatchResult<Vec<KeyStroke>> {
    text.chars()
        .map(|c| KeyStroke::from_char(c).ok_or(DispatchError::UnmappableCharacter(c)))
        .collect()
}

/// Key down/up pairs for `text`, one random delay between characters
///
/// Shifted characters are wrapped in a Shift press and release.
pub fn text_script<R: Rng + ?Sized>(
    text: &str,
    per_char_delay: DelayRange,
    rng: &mut R,
) -> DispatchResult<Script> {
    per_char_delay.validate()?;
    let strokes = keystrokes(text)?;

    let mut script = Script::new();
    for (i, stroke) in strokes.into_iter().enumerate() {
        if i > 0 {
            script.pause(per_char_delay.sample(rng));
        }
        if stroke.shift {
            script.then(Duration::ZERO, InputEvent::key_down(VirtualKeyCode::Shift));
        }
        script.tap(stroke.key, Duration::ZERO);
        if stroke.shift {
            script.then(Duration::ZERO, InputEvent::key_up(VirtualKeyCode::Shift));
        }
    }
    Ok(script)
}

/// Modifiers down in order, key tapped, modifiers up in reverse
pub fn hotkey_script(modifiers: KeyModifiers, key: VirtualKeyCode) -> Script {
    let held = modifiers.keys();
    let gap = if held.is_empty() {
        Duration::ZERO
    } else {
        HOTKEY_GAP
    };

    let mut script = Script::new();
    for &modifier in &held {
        script.then(Duration::ZERO, InputEvent::key_down(modifier));
    }
    script.pause(gap).tap(key, Duration::ZERO).pause(gap);
    for &modifier in held.iter().rev() {
        script.then(Duration::ZERO, InputEvent::key_up(modifier));
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn events(script: &Script) -> Vec<InputEvent> {
        script.events().iter().map(|e| e.event).collect()
    }

    #[test]
    fn test_plain_text_is_down_up_pairs() {
        let mut rng = StdRng::seed_from_u64(0);
        let script = text_script("ab", DelayRange::new(30, 90), &mut rng).unwrap();
        assert_eq!(
            events(&script),
            vec![
                InputEvent::key_down(VirtualKeyCode::A),
                InputEvent::key_up(VirtualKeyCode::A),
                InputEvent::key_down(VirtualKeyCode::B),
                InputEvent::key_up(VirtualKeyCode::B),
            ]
        );

        let gap = script.events()[2].at - script.events()[1].at;
        assert!(gap >= Duration::from_millis(30) && gap <= Duration::from_millis(90));
    }

    #[test]
    fn test_shifted_characters_wrap_in_shift() {
        let mut rng = StdRng::seed_from_u64(0);
        let script = text_script("A!", DelayRange::ZERO, &mut rng).unwrap();
        use VirtualKeyCode as K;
        assert_eq!(
            events(&script),
            vec![
                InputEvent::key_down(K::Shift),
                InputEvent::key_down(K::A),
                InputEvent::key_up(K::A),
                InputEvent::key_up(K::Shift),
                InputEvent::key_down(K::Shift),
                InputEvent::key_down(K::Num1),
                InputEvent::key_up(K::Num1),
                InputEvent::key_up(K::Shift),
            ]
        );
    }

    #[test]
    fn test_unmappable_character_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            text_script("hé", DelayRange::ZERO, &mut rng),
            Err(DispatchError::UnmappableCharacter('é'))
        ));
        assert!(matches!(keystrokes("ok🙂"), Err(DispatchError::UnmappableCharacter('🙂'))));
    }

    #[test]
    fn test_empty_text_is_empty_script() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(text_script("", DelayRange::ZERO, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_hotkey_releases_in_reverse() {
        let script = hotkey_script(KeyModifiers::new().with_ctrl().with_shift(), VirtualKeyCode::T);
        use VirtualKeyCode as K;
        assert_eq!(
            events(&script),
            vec![
                InputEvent::key_down(K::Control),
                InputEvent::key_down(K::Shift),
                InputEvent::key_down(K::T),
                InputEvent::key_up(K::T),
                InputEvent::key_up(K::Shift),
                InputEvent::key_up(K::Control),
            ]
        );
        assert_eq!(script.end(), HOTKEY_GAP * 2);
    }
}
