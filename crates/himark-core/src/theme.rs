//! Editor themes.
//!
//! Two static themes, dark and light, each made of editor chrome colors and
//! a table of Markdown highlight rules. Both share one [`BaseStyle`] for
//! layout and typography.

use serde::{Deserialize, Serialize};

/// Which of the built-in themes to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            other => Err(format!("unknown theme '{other}' (expected dark or light)")),
        }
    }
}

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    /// Opaque color from `0xRRGGBB`.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
            a: 1.0,
        }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.a >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Layout and typography shared by all themes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseStyle {
    pub font_size_px: f32,
    pub line_height: f32,
    pub font_family: &'static [&'static str],
    pub content_max_width_px: f32,
    pub content_padding_top_px: f32,
    pub content_padding_bottom_px: f32,
    pub content_padding_inline_px: f32,
    pub cursor_width_px: f32,
    pub tooltip_radius_px: f32,
    pub tooltip_font_size_px: f32,
    pub completion_max_height_px: f32,
    pub show_gutters: bool,
}

/// The base style used by both themes.
pub const BASE_STYLE: BaseStyle = BaseStyle {
    font_size_px: 15.0,
    line_height: 1.75,
    font_family: &[
        "JetBrains Mono",
        "Fira Code",
        "Cascadia Code",
        "SF Mono",
        "ui-monospace",
        "monospace",
    ],
    content_max_width_px: 740.0,
    content_padding_top_px: 32.0,
    content_padding_bottom_px: 128.0,
    content_padding_inline_px: 48.0,
    cursor_width_px: 2.0,
    tooltip_radius_px: 6.0,
    tooltip_font_size_px: 13.0,
    completion_max_height_px: 220.0,
    show_gutters: false,
};

/// Editor chrome colors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chrome {
    pub background: Color,
    pub foreground: Color,
    pub caret: Color,
    pub selection: Color,
    pub tooltip_background: Color,
    pub tooltip_border: Color,
    pub completion_foreground: Color,
    pub completion_selected_background: Color,
    pub completion_selected_foreground: Color,
}

/// Markdown and embedded-code syntax categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Strong,
    Emphasis,
    Strikethrough,
    Link,
    Url,
    Monospace,
    Quote,
    ProcessingInstruction,
    ContentSeparator,
    LabelName,
    List,
    TagName,
    AttributeName,
    Keyword,
    String,
    Number,
    Comment,
    Operator,
    TypeName,
    FunctionName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decoration {
    Underline,
    LineThrough,
}

/// Styling applied to one [`Tag`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightRule {
    pub tag: Tag,
    pub color: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_em: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoration: Option<Decoration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
}

impl HighlightRule {
    const fn new(tag: Tag, color: Color) -> Self {
        Self {
            tag,
            color,
            font_weight: None,
            font_style: None,
            font_size_em: None,
            decoration: None,
            background: None,
        }
    }

    const fn weight(mut self, weight: u16) -> Self {
        self.font_weight = Some(weight);
        self
    }

    const fn italic(mut self) -> Self {
        self.font_style = Some(FontStyle::Italic);
        self
    }

    const fn size(mut self, em: f32) -> Self {
        self.font_size_em = Some(em);
        self
    }

    const fn decorate(mut self, decoration: Decoration) -> Self {
        self.decoration = Some(decoration);
        self
    }

    const fn on(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }
}

/// A complete editor theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub name: &'static str,
    pub dark: bool,
    pub base: BaseStyle,
    pub chrome: Chrome,
    pub highlights: Vec<HighlightRule>,
}

impl Theme {
    /// Returns the built-in theme for `mode`.
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Looks up the rule for `tag`.
    pub fn highlight(&self, tag: Tag) -> Option<&HighlightRule> {
        self.highlights.iter().find(|rule| rule.tag == tag)
    }

    pub fn dark() -> Self {
        use Tag::*;
        let accent = Color::hex(0x9d86e9);
        let separator = Color::hex(0x5a5a6a);

        Self {
            name: "dark",
            dark: true,
            base: BASE_STYLE,
            chrome: Chrome {
                background: Color::hex(0x1c1c1e),
                foreground: Color::hex(0xe0e0e0),
                caret: accent,
                selection: Color::rgba(157, 134, 233, 0.22),
                tooltip_background: Color::hex(0x232326),
                tooltip_border: Color::hex(0x3a3a3f),
                completion_foreground: Color::hex(0xc0c0c6),
                completion_selected_background: Color::hex(0x3a3a5e),
                completion_selected_foreground: Color::hex(0xe0e0e0),
            },
            highlights: vec![
                HighlightRule::new(Heading1, Color::hex(0xffffff)).weight(700).size(1.45),
                HighlightRule::new(Heading2, Color::hex(0xf0f0f0)).weight(700).size(1.25),
                HighlightRule::new(Heading3, Color::hex(0xe8e8e8)).weight(600).size(1.1),
                HighlightRule::new(Heading4, Color::hex(0xe0e0e0)).weight(600),
                HighlightRule::new(Heading5, Color::hex(0xd8d8d8)).weight(600),
                HighlightRule::new(Heading6, Color::hex(0xc8c8c8)).weight(600),
                HighlightRule::new(Strong, Color::hex(0xf2f2f2)).weight(700),
                HighlightRule::new(Emphasis, Color::hex(0xd4d4d4)).italic(),
                HighlightRule::new(Strikethrough, Color::hex(0x888888))
                    .decorate(Decoration::LineThrough),
                HighlightRule::new(Link, accent).decorate(Decoration::Underline),
                HighlightRule::new(Url, Color::hex(0x7a9fe8)),
                HighlightRule::new(Monospace, Color::hex(0x78c1a1))
                    .on(Color::rgba(120, 193, 161, 0.08)),
                HighlightRule::new(Quote, Color::hex(0x888888)).italic(),
                HighlightRule::new(ProcessingInstruction, separator),
                HighlightRule::new(ContentSeparator, separator),
                HighlightRule::new(LabelName, accent),
                HighlightRule::new(List, accent),
                HighlightRule::new(TagName, Color::hex(0xe8845f)),
                HighlightRule::new(AttributeName, Color::hex(0xdba56e)),
                HighlightRule::new(Keyword, Color::hex(0xc792ea)),
                HighlightRule::new(String, Color::hex(0xc3e88d)),
                HighlightRule::new(Number, Color::hex(0xf78c6c)),
                HighlightRule::new(Comment, Color::hex(0x5a6a5a)).italic(),
                HighlightRule::new(Operator, Color::hex(0x89ddff)),
                HighlightRule::new(TypeName, Color::hex(0xffcb6b)),
                HighlightRule::new(FunctionName, Color::hex(0x82aaff)),
            ],
        }
    }

    pub fn light() -> Self {
        use Tag::*;
        let accent = Color::hex(0x6a50c7);
        let separator = Color::hex(0xaaaaaa);

        Self {
            name: "light",
            dark: false,
            base: BASE_STYLE,
            chrome: Chrome {
                background: Color::hex(0xffffff),
                foreground: Color::hex(0x1a1a1a),
                caret: accent,
                selection: Color::rgba(106, 80, 199, 0.15),
                tooltip_background: Color::hex(0xffffff),
                tooltip_border: Color::hex(0xd0d0d0),
                completion_foreground: Color::hex(0x333333),
                completion_selected_background: Color::hex(0xe0d8f8),
                completion_selected_foreground: Color::hex(0x1a1a1a),
            },
            highlights: vec![
                HighlightRule::new(Heading1, Color::hex(0x0d0d0d)).weight(700).size(1.45),
                HighlightRule::new(Heading2, Color::hex(0x1a1a1a)).weight(700).size(1.25),
                HighlightRule::new(Heading3, Color::hex(0x222222)).weight(600).size(1.1),
                HighlightRule::new(Heading4, Color::hex(0x2a2a2a)).weight(600),
                HighlightRule::new(Heading5, Color::hex(0x333333)).weight(600),
                HighlightRule::new(Heading6, Color::hex(0x444444)).weight(600),
                HighlightRule::new(Strong, Color::hex(0x111111)).weight(700),
                HighlightRule::new(Emphasis, Color::hex(0x333333)).italic(),
                HighlightRule::new(Strikethrough, Color::hex(0x999999))
                    .decorate(Decoration::LineThrough),
                HighlightRule::new(Link, accent).decorate(Decoration::Underline),
                HighlightRule::new(Url, Color::hex(0x3a6fb5)),
                HighlightRule::new(Monospace, Color::hex(0x2a7a5a))
                    .on(Color::rgba(42, 122, 90, 0.08)),
                HighlightRule::new(Quote, Color::hex(0x888888)).italic(),
                HighlightRule::new(ProcessingInstruction, separator),
                HighlightRule::new(ContentSeparator, separator),
                HighlightRule::new(LabelName, accent),
                HighlightRule::new(List, accent),
                HighlightRule::new(TagName, Color::hex(0xc0392b)),
                HighlightRule::new(AttributeName, Color::hex(0xb7510a)),
                HighlightRule::new(Keyword, Color::hex(0x7b2d9e)),
                HighlightRule::new(String, Color::hex(0x3a7a2a)),
                HighlightRule::new(Number, Color::hex(0xc0392b)),
                HighlightRule::new(Comment, Color::hex(0x888888)).italic(),
                HighlightRule::new(Operator, Color::hex(0x1a6080)),
                HighlightRule::new(TypeName, Color::hex(0x8a6000)),
                HighlightRule::new(FunctionName, Color::hex(0x1a4faa)),
            ],
        }
    }
}
