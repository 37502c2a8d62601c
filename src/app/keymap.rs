//! Key mapping and action dispatch for lazyworktree.
//!
//! Every built-in action is listed once in [BINDINGS] together with its keys, its help text and
//! whether it appears in the command palette. Custom commands from the config are bound on top
//! of the built-ins, parsed with the same key syntax (`x`, `ctrl+e`, `<c-e>`, `f5`).

use crate::config::CustomCommand;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Any action the base layout can perform.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Nav(NavAction),
    Worktree(WorktreeAction),
    View(ViewAction),
    System(SystemAction),
    /// Index into the configured custom commands.
    Custom(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NavAction {
    Up,
    Down,
    Top,
    Bottom,
    PageUp,
    PageDown,
    ToggleFocus,
    Filter,
    ClearFilter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorktreeAction {
    Select,
    Create,
    CreateFromPr,
    CreateFromIssue,
    Delete,
    PruneMerged,
    Refresh,
    FetchPrs,
    OpenPr,
    CiChecks,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewAction {
    Commit,
    CommitFiles,
    CycleSort,
    Help,
    Palette,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SystemAction {
    Quit,
}

pub struct Binding {
    pub keys: &'static [&'static str],
    pub action: Action,
    pub label: &'static str,
    pub section: &'static str,
    pub in_palette: bool,
}

const fn bind(
    keys: &'static [&'static str],
    action: Action,
    label: &'static str,
    section: &'static str,
    in_palette: bool,
) -> Binding {
    Binding {
        keys,
        action,
        label,
        section,
        in_palette,
    }
}

use Action::{Nav, System, View, Worktree};
use NavAction as N;
use SystemAction as S;
use ViewAction as V;
use WorktreeAction as W;

#[rustfmt::skip]
pub const BINDINGS: &[Binding] = &[
    bind(&["k", "up"],           Nav(N::Up),                "Move up",                       "Navigation", false),
    bind(&["j", "down"],         Nav(N::Down),              "Move down",                     "Navigation", false),
    bind(&["g", "home"],         Nav(N::Top),               "First worktree",                "Navigation", false),
    bind(&["G", "end"],          Nav(N::Bottom),            "Last worktree",                 "Navigation", false),
    bind(&["ctrl+u", "pageup"],  Nav(N::PageUp),            "Page up",                       "Navigation", false),
    bind(&["ctrl+d", "pagedown"],Nav(N::PageDown),          "Page down",                     "Navigation", false),
    bind(&["tab"],               Nav(N::ToggleFocus),       "Switch between list and details","Navigation", false),
    bind(&["/"],                 Nav(N::Filter),            "Filter worktrees",              "Navigation", true),
    bind(&["esc"],               Nav(N::ClearFilter),       "Clear filter",                  "Navigation", true),
    bind(&["enter"],             Worktree(W::Select),       "Select worktree and exit",      "Worktrees",  true),
    bind(&["n"],                 Worktree(W::Create),       "Create worktree",               "Worktrees",  true),
    bind(&["N"],                 Worktree(W::CreateFromPr), "Create worktree from PR",       "Worktrees",  true),
    bind(&["I"],                 Worktree(W::CreateFromIssue),"Create worktree from issue",  "Worktrees",  true),
    bind(&["D"],                 Worktree(W::Delete),       "Delete worktree",               "Worktrees",  true),
    bind(&["X"],                 Worktree(W::PruneMerged),  "Prune merged worktrees",        "Worktrees",  true),
    bind(&["r"],                 Worktree(W::Refresh),      "Refresh",                       "Worktrees",  true),
    bind(&["p"],                 Worktree(W::FetchPrs),     "Fetch PR data",                 "GitHub",     true),
    bind(&["o"],                 Worktree(W::OpenPr),       "Open PR in browser",            "GitHub",     true),
    bind(&["v"],                 Worktree(W::CiChecks),     "CI checks",                     "GitHub",     true),
    bind(&["c"],                 View(V::Commit),           "Show HEAD commit",              "View",       true),
    bind(&["F"],                 View(V::CommitFiles),      "Browse files in HEAD",          "View",       true),
    bind(&["s"],                 View(V::CycleSort),        "Cycle sort mode",               "View",       true),
    bind(&["?"],                 View(V::Help),             "Help",                          "View",       true),
    bind(&["ctrl+p", ":"],       View(V::Palette),          "Command palette",               "View",       false),
    bind(&["q", "ctrl+c"],       System(S::Quit),           "Quit",                          "View",       true),
];

/// Key + modifiers as used in the keymap.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

pub struct Keymap {
    map: HashMap<Key, Action>,
}

impl Keymap {
    /// Built-in bindings, then custom commands. A custom command never shadows a built-in key.
    pub fn new(custom: &[CustomCommand]) -> Self {
        let mut map = HashMap::new();
        for b in BINDINGS {
            for k in b.keys {
                if let Some(key) = parse_key(k) {
                    map.insert(key, b.action);
                }
            }
        }
        for (i, cmd) in custom.iter().enumerate() {
            match parse_key(&cmd.key) {
                Some(key) if !map.contains_key(&key) => {
                    map.insert(key, Action::Custom(i));
                }
                Some(_) => tracing::warn!(key = %cmd.key, "custom command key is already bound"),
                None => tracing::warn!(key = %cmd.key, "cannot parse custom command key"),
            }
        }
        Self { map }
    }

    pub fn lookup(&self, key: KeyEvent) -> Option<Action> {
        let k = Key {
            code: key.code,
            modifiers: key.modifiers,
        };

        if let Some(action) = self.map.get(&k).copied() {
            return Some(action);
        }

        if matches!(key.code, KeyCode::Char(_)) && key.modifiers.contains(KeyModifiers::SHIFT) {
            let k2 = Key {
                code: key.code,
                modifiers: key.modifiers - KeyModifiers::SHIFT,
            };
            return self.map.get(&k2).copied();
        }
        None
    }
}

/// Label and key hint of an action, for the palette and the help screen.
pub fn describe(action: Action, custom: &[CustomCommand]) -> (String, String) {
    match action {
        Action::Custom(i) => custom
            .get(i)
            .map(|c| {
                let label = if c.description.is_empty() {
                    c.command.clone()
                } else {
                    c.description.clone()
                };
                (label, c.key.clone())
            })
            .unwrap_or_default(),
        other => BINDINGS
            .iter()
            .find(|b| b.action == other)
            .map(|b| (b.label.to_string(), b.keys.join(", ")))
            .unwrap_or_default(),
    }
}

/// Actions offered by the command palette, in display order.
pub fn palette_actions(custom: &[CustomCommand]) -> Vec<Action> {
    BINDINGS
        .iter()
        .filter(|b| b.in_palette)
        .map(|b| b.action)
        .chain((0..custom.len()).map(Action::Custom))
        .collect()
}

/// Help screen rows: a heading row (empty keys) before each section.
pub fn help_entries(custom: &[CustomCommand]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut section = "";
    for b in BINDINGS {
        if b.section != section {
            if !out.is_empty() {
                out.push((String::new(), String::new()));
            }
            out.push((String::new(), b.section.to_string()));
            section = b.section;
        }
        out.push((b.keys.join(", "), b.label.to_string()));
    }
    if !custom.is_empty() {
        out.push((String::new(), String::new()));
        out.push((String::new(), "Custom commands".to_string()));
        for i in 0..custom.len() {
            let (label, key) = describe(Action::Custom(i), custom);
            out.push((key, label));
        }
    }
    out.push((String::new(), String::new()));
    out.push((String::new(), "Filter input".to_string()));
    out.push((
        "enter".to_string(),
        "Leave the filter (or select, with search_auto_select)".to_string(),
    ));
    out.push(("esc".to_string(), "Clear and leave the filter".to_string()));
    out
}

pub fn parse_key(s: &str) -> Option<Key> {
    let mut modifiers = KeyModifiers::NONE;
    let mut code: Option<KeyCode> = None;

    let is_bracketed = s.starts_with('<') && s.ends_with('>');
    let mut input = s.trim_start_matches('<').trim_end_matches('>').to_string();

    if is_bracketed && input.contains('-') {
        let parts: Vec<&str> = input.split('-').collect();

        for &prefix in parts.iter().take(parts.len().saturating_sub(1)) {
            match prefix.to_lowercase().as_str() {
                "c" | "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "a" | "m" | "alt" => modifiers |= KeyModifiers::ALT,
                "s" | "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }
        input = parts.last()?.to_string();
    }

    // a lone "+" or "-" is a key, not a separator
    if input == "+" || input == "-" {
        return Some(Key {
            code: KeyCode::Char(input.chars().next()?),
            modifiers,
        });
    }

    let normalized = input.replace('-', "+");
    for part in normalized.split('+') {
        let p_low = part.to_lowercase();
        match p_low.as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" | "meta" => modifiers |= KeyModifiers::ALT,
            "shift" => modifiers |= KeyModifiers::SHIFT,

            "up" => code = Some(KeyCode::Up),
            "down" => code = Some(KeyCode::Down),
            "left" => code = Some(KeyCode::Left),
            "right" => code = Some(KeyCode::Right),
            "home" => code = Some(KeyCode::Home),
            "end" => code = Some(KeyCode::End),
            "pageup" => code = Some(KeyCode::PageUp),
            "pagedown" => code = Some(KeyCode::PageDown),
            "enter" => code = Some(KeyCode::Enter),
            "esc" => code = Some(KeyCode::Esc),
            "backspace" | "back" => code = Some(KeyCode::Backspace),
            "tab" => code = Some(KeyCode::Tab),
            "space" | "spc" => code = Some(KeyCode::Char(' ')),

            _ => {
                if part.chars().count() == 1 {
                    let mut c = part.chars().next()?;
                    if modifiers.contains(KeyModifiers::SHIFT) {
                        c = c.to_ascii_uppercase();
                        modifiers.remove(KeyModifiers::SHIFT);
                    }
                    code = Some(KeyCode::Char(c));
                } else if p_low.starts_with('f')
                    && p_low.len() > 1
                    && p_low[1..].chars().all(|c| c.is_ascii_digit())
                {
                    let n = p_low[1..].parse().ok()?;
                    code = Some(KeyCode::F(n));
                } else if part.is_empty() {
                    continue;
                } else {
                    return None;
                }
            }
        }
    }

    Some(Key {
        code: code?,
        modifiers,
    })
}
