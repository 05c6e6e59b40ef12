#![forbid(unsafe_code)]

//! Palettes and appearance.
//!
//! Styling beyond a palette id and an appearance id is out of scope; a
//! palette only carries the per-region background and a couple of text
//! colors, each in a dark and a light variant.

use std::fmt;

use weft_render::Region;
use weft_render::ansi;

/// Dark or light variant of the active palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Appearance {
    /// Dark backgrounds, light text.
    #[default]
    Dark,
    /// Light backgrounds, dark text.
    Light,
}

impl Appearance {
    /// The other appearance.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Stable id used in fingerprints and logs.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for Appearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// SGR sequence selecting this color as background.
    #[must_use]
    pub fn bg(self) -> String {
        ansi::bg_rgb(self.0, self.1, self.2)
    }

    /// SGR sequence selecting this color as foreground.
    #[must_use]
    pub fn fg(self) -> String {
        ansi::fg_rgb(self.0, self.1, self.2)
    }
}

/// Colors of one appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    /// Header background.
    pub header: Rgb,
    /// Content background.
    pub content: Rgb,
    /// Status line background.
    pub status: Rgb,
    /// Default text color.
    pub text: Rgb,
    /// Accent for focused elements and key hints.
    pub accent: Rgb,
}

/// A named palette with dark and light swatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Stable id (part of the environment fingerprint).
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Colors for [`Appearance::Dark`].
    pub dark: Swatch,
    /// Colors for [`Appearance::Light`].
    pub light: Swatch,
}

impl Palette {
    /// The swatch for `appearance`.
    #[must_use]
    pub fn swatch(&self, appearance: Appearance) -> &Swatch {
        match appearance {
            Appearance::Dark => &self.dark,
            Appearance::Light => &self.light,
        }
    }

    /// Background color of `region` under `appearance`.
    #[must_use]
    pub fn background(&self, region: Region, appearance: Appearance) -> Rgb {
        let swatch = self.swatch(appearance);
        match region {
            Region::Header => swatch.header,
            Region::Content => swatch.content,
            Region::StatusLine => swatch.status,
        }
    }

    /// Built-in palettes, in cycling order.
    #[must_use]
    pub fn builtin() -> Vec<Palette> {
        vec![
            Palette {
                id: "slate",
                name: "Slate",
                dark: Swatch {
                    header: Rgb(38, 44, 56),
                    content: Rgb(24, 27, 34),
                    status: Rgb(48, 56, 72),
                    text: Rgb(220, 223, 228),
                    accent: Rgb(97, 175, 239),
                },
                light: Swatch {
                    header: Rgb(222, 226, 232),
                    content: Rgb(246, 247, 249),
                    status: Rgb(204, 210, 220),
                    text: Rgb(36, 41, 51),
                    accent: Rgb(31, 111, 191),
                },
            },
            Palette {
                id: "ember",
                name: "Ember",
                dark: Swatch {
                    header: Rgb(60, 36, 30),
                    content: Rgb(30, 22, 20),
                    status: Rgb(82, 46, 34),
                    text: Rgb(240, 222, 210),
                    accent: Rgb(255, 140, 66),
                },
                light: Swatch {
                    header: Rgb(250, 224, 208),
                    content: Rgb(255, 246, 240),
                    status: Rgb(242, 204, 184),
                    text: Rgb(64, 34, 24),
                    accent: Rgb(196, 84, 20),
                },
            },
            Palette {
                id: "moss",
                name: "Moss",
                dark: Swatch {
                    header: Rgb(34, 50, 38),
                    content: Rgb(20, 28, 22),
                    status: Rgb(44, 66, 50),
                    text: Rgb(216, 232, 218),
                    accent: Rgb(134, 200, 120),
                },
                light: Swatch {
                    header: Rgb(214, 232, 214),
                    content: Rgb(244, 250, 244),
                    status: Rgb(196, 220, 196),
                    text: Rgb(28, 48, 30),
                    accent: Rgb(52, 128, 60),
                },
            },
        ]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::builtin().into_iter().next().unwrap_or(Palette {
            id: "plain",
            name: "Plain",
            dark: PLAIN,
            light: PLAIN,
        })
    }
}

const PLAIN: Swatch = Swatch {
    header: Rgb(0, 0, 0),
    content: Rgb(0, 0, 0),
    status: Rgb(0, 0, 0),
    text: Rgb(255, 255, 255),
    accent: Rgb(255, 255, 255),
};

/// The active palette and appearance, cycled by the default bindings.
#[derive(Debug, Clone)]
pub struct Theme {
    palettes: Vec<Palette>,
    index: usize,
    appearance: Appearance,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(Palette::builtin())
    }
}

impl Theme {
    /// A theme cycling through `palettes`. An empty list falls back to the
    /// default palette.
    #[must_use]
    pub fn new(palettes: Vec<Palette>) -> Self {
        let palettes = if palettes.is_empty() {
            vec![Palette::default()]
        } else {
            palettes
        };
        Self {
            palettes,
            index: 0,
            appearance: Appearance::default(),
        }
    }

    /// The active palette.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palettes[self.index]
    }

    /// The active appearance.
    #[must_use]
    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    /// Switch to the next palette (wraps).
    pub fn cycle_palette(&mut self) {
        self.index = (self.index + 1) % self.palettes.len();
        tracing::debug!(palette = self.palette().id, "palette changed");
    }

    /// Flip between dark and light.
    pub fn toggle_appearance(&mut self) {
        self.appearance = self.appearance.toggled();
        tracing::debug!(appearance = self.appearance.id(), "appearance changed");
    }

    /// Set the appearance explicitly.
    pub fn set_appearance(&mut self, appearance: Appearance) {
        self.appearance = appearance;
    }

    /// Select a palette by id. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        match self.palettes.iter().position(|p| p.id == id) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }

    /// Background SGR for a region under the current palette/appearance.
    #[must_use]
    pub fn region_background(&self, region: Region) -> String {
        self.palette().background(region, self.appearance).bg()
    }
}
