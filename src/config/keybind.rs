//! Custom keybinding sanitation, normalization and validation.
//!
//! Bindings are written as `Modifier+...+Key`, e.g. `Meta+Shift+e`.

use std::collections::HashSet;
use std::fmt;

/// Canonical modifier spellings, in the order they are emitted.
const MODIFIERS: &[(&str, &str)] = &[
    ("meta", "Meta"),
    ("ctrl", "Ctrl"),
    ("alt", "Alt"),
    ("shift", "Shift"),
];

const SPECIAL_KEYS: &[&str] = &[
    "ENTER", "TAB", "SPACE", "ESC", "BS", "LEFT", "RIGHT", "UP", "DOWN", "KP_DEL", "DEL",
    "KP_INS", "INS", "HOME", "END", "PGUP", "PGDWN", "PRINT", "F1", "F2", "F3", "F4", "F5", "F6",
    "F7", "F8", "F9", "F10", "F11", "F12",
];

fn is_modifier(part: &str) -> bool {
    let lower = part.to_lowercase();
    MODIFIERS.iter().any(|(alias, _)| *alias == lower)
}

fn is_special_key(key: &str) -> bool {
    SPECIAL_KEYS.contains(&key.to_uppercase().as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeybindStatus {
    Disabled,
    Valid,
    /// Usable, but the key name is not one the player is known to accept.
    Warning(String),
    Invalid(String),
}

impl KeybindStatus {
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

impl fmt::Display for KeybindStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "ⓘ Keybind disabled"),
            Self::Valid => write!(f, "✓ Keybind is valid"),
            Self::Warning(message) | Self::Invalid(message) => write!(f, "⚠ {}", message),
        }
    }
}

/// Cleans raw input: drops leading `+`, collapses repeated `+`, removes
/// whitespace and duplicate modifiers (first spelling wins). The key itself is
/// kept as typed, including an empty trailing segment.
pub fn sanitize(input: &str) -> String {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let trimmed = compact.trim_start_matches('+');

    let mut collapsed = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == '+' && collapsed.ends_with('+') {
            continue;
        }
        collapsed.push(c);
    }

    if collapsed.is_empty() {
        return String::new();
    }

    let mut parts: Vec<&str> = collapsed.split('+').collect();
    let dangling = parts.pop().unwrap_or_default();

    let mut seen = HashSet::new();
    let mut result: Vec<&str> = parts
        .into_iter()
        .filter(|part| !part.is_empty() && seen.insert(part.to_lowercase()))
        .collect();
    result.push(dangling);

    result.join("+")
}

/// Produces the canonical form: known modifiers in `Meta`, `Ctrl`, `Alt`, `Shift`
/// order followed by the key, with special key names upper-cased.
pub fn normalize(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }

    let mut parts: Vec<&str> = key.split('+').collect();
    let actual = parts.pop().unwrap_or_default();
    let actual = if is_special_key(actual) {
        actual.to_uppercase()
    } else {
        actual.to_string()
    };

    if parts.is_empty() {
        return actual;
    }

    let present: HashSet<String> = parts.iter().map(|p| p.to_lowercase()).collect();
    let mut normalized: Vec<String> = MODIFIERS
        .iter()
        .filter(|(alias, _)| present.contains(*alias))
        .map(|(_, canonical)| canonical.to_string())
        .collect();
    normalized.push(actual);

    normalized.join("+")
}

pub fn validate(key: &str) -> KeybindStatus {
    if key.is_empty() {
        return KeybindStatus::Disabled;
    }

    if key.ends_with('+') {
        return KeybindStatus::Invalid("Invalid format: Trailing +".to_string());
    }

    let mut parts: Vec<&str> = key.split('+').collect();
    let actual = parts.pop().unwrap_or_default();

    if is_modifier(actual) {
        return KeybindStatus::Invalid("Invalid format: Trailing modifier".to_string());
    }

    let unknown: Vec<&str> = parts.into_iter().filter(|p| !is_modifier(p)).collect();
    if !unknown.is_empty() {
        return KeybindStatus::Invalid(format!("Unknown modifier(s): {}", unknown.join(", ")));
    }

    if actual.chars().count() > 1 && !is_special_key(actual) {
        return KeybindStatus::Warning(format!("Possibly invalid key: {}", actual));
    }

    KeybindStatus::Valid
}

/// Whether `normalized` is already taken by one of the host's bindings.
pub fn conflicts<'a, I>(normalized: &str, existing: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    !normalized.is_empty() && existing.into_iter().any(|bound| normalize(bound) == normalized)
}

/// Outcome of checking a configured keybinding against the host's bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeybindResolution {
    pub normalized: String,
    pub status: KeybindStatus,
    pub conflict: bool,
}

impl KeybindResolution {
    /// The binding to register, if any.
    pub fn binding(&self) -> Option<&str> {
        if self.normalized.is_empty() || self.conflict || !self.status.is_usable() {
            None
        } else {
            Some(&self.normalized)
        }
    }
}

pub fn resolve<'a, I>(raw: &str, existing: I) -> KeybindResolution
where
    I: IntoIterator<Item = &'a str>,
{
    let clean = sanitize(raw);
    let status = validate(&clean);
    let normalized = if status.is_usable() {
        normalize(&clean)
    } else {
        String::new()
    };
    let conflict = conflicts(&normalized, existing);

    KeybindResolution {
        normalized,
        status,
        conflict,
    }
}
