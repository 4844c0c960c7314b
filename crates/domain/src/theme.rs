use serde::Deserialize;

/// Channel amount subtracted to derive a hover shade.
pub const HOVER_DARKEN_AMOUNT: u8 = 20;

/// Optional primary and secondary colour overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    /// Primary accent colour, usually `#rrggbb`.
    pub primary: Option<String>,
    /// Secondary colour, usually `#rrggbb`.
    pub secondary: Option<String>,
}

impl ThemeColors {
    /// Creates a colour pair.
    #[must_use]
    pub fn new(primary: Option<String>, secondary: Option<String>) -> Self {
        Self { primary, secondary }
    }

    /// Resolves these host overrides on top of schema-level colours.
    #[must_use]
    pub fn over(&self, schema_colors: &ThemeColors) -> ThemeColors {
        ThemeColors {
            primary: non_blank(self.primary.as_deref())
                .or_else(|| non_blank(schema_colors.primary.as_deref())),
            secondary: non_blank(self.secondary.as_deref())
                .or_else(|| non_blank(schema_colors.secondary.as_deref())),
        }
    }

    /// Returns whether neither colour is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// An RGB colour parsed from six-digit hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Parses `#rrggbb` or `rrggbb` (case-insensitive).
    #[must_use]
    pub fn parse_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Darkens every channel by `amount`, clamping at zero.
    #[must_use]
    pub fn darken(self, amount: u8) -> Self {
        Self {
            r: self.r.saturating_sub(amount),
            g: self.g.saturating_sub(amount),
            b: self.b.saturating_sub(amount),
        }
    }

    /// Formats as lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Formats as a CSS `rgba(...)` value.
    #[must_use]
    pub fn rgba(self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {alpha})", self.r, self.g, self.b)
    }
}

/// Darkens a hex colour, returning the input unchanged when it is not `#rrggbb`.
#[must_use]
pub fn darken_hex(value: &str, amount: u8) -> String {
    Rgb::parse_hex(value)
        .map(|rgb| rgb.darken(amount).to_hex())
        .unwrap_or_else(|| value.to_owned())
}
