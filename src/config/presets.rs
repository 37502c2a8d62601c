//! Built-in themes for lazyworktree.

use crate::config::theme::{Palette, Theme, make_theme};

const DRACULA: Palette = Palette {
    base: (40, 42, 54),
    surface: (68, 71, 90),
    overlay: (98, 114, 164),
    text: (248, 248, 242),
    primary: (189, 147, 249),
    secondary: (139, 233, 253),
    success: (80, 250, 123),
    warn: (241, 250, 140),
    error: (255, 85, 85),
};

const NORD: Palette = Palette {
    base: (46, 52, 64),
    surface: (59, 66, 82),
    overlay: (97, 110, 136),
    text: (236, 239, 244),
    primary: (136, 192, 208),
    secondary: (129, 161, 193),
    success: (163, 190, 140),
    warn: (235, 203, 139),
    error: (191, 97, 106),
};

const CLEAN_LIGHT: Palette = Palette {
    base: (250, 250, 250),
    surface: (229, 231, 235),
    overlay: (107, 114, 128),
    text: (31, 41, 55),
    primary: (37, 99, 235),
    secondary: (8, 145, 178),
    success: (22, 163, 74),
    warn: (202, 138, 4),
    error: (220, 38, 38),
};

pub(crate) fn dracula() -> Theme {
    make_theme("dracula", DRACULA)
}

pub(crate) fn nord() -> Theme {
    make_theme("nord", NORD)
}

pub(crate) fn clean_light() -> Theme {
    make_theme("clean-light", CLEAN_LIGHT)
}
