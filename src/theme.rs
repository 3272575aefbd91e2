use grocery_list::ThemeMode;
use ratatui::style::Color;

#[derive(Clone)]
pub struct Theme {
    pub name: &'static str,
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub done: Color,
}

struct ThemeDefinition {
    name: &'static str,
    primary: &'static str,
    accent: &'static str,
    highlight: &'static str,
    background: &'static str,
    surface: &'static str,
    text: &'static str,
    muted: &'static str,
    done: &'static str,
}

const LIGHT: ThemeDefinition = ThemeDefinition {
    name: "Light",
    primary: "#22C55E",
    accent: "#047857",
    highlight: "#A7F3D0",
    background: "#ECFDF5",
    surface: "#FFFFFF",
    text: "#1F2937",
    muted: "#6B7280",
    done: "#16A34A",
};

const DARK: ThemeDefinition = ThemeDefinition {
    name: "Dark",
    primary: "#15803D",
    accent: "#4ADE80",
    highlight: "#34D399",
    background: "#111827",
    surface: "#1F2937",
    text: "#F9FAFB",
    muted: "#9CA3AF",
    done: "#4ADE80",
};

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Theme::from_definition(&LIGHT),
            ThemeMode::Dark => Theme::from_definition(&DARK),
        }
    }

    fn from_definition(def: &ThemeDefinition) -> Self {
        Theme {
            name: def.name,
            primary: color_from_hex(def.primary).unwrap_or(Color::Green),
            accent: color_from_hex(def.accent).unwrap_or(Color::Cyan),
            highlight: color_from_hex(def.highlight).unwrap_or(Color::Cyan),
            background: color_from_hex(def.background).unwrap_or(Color::Black),
            surface: color_from_hex(def.surface).unwrap_or(Color::DarkGray),
            text: color_from_hex(def.text).unwrap_or(Color::White),
            muted: color_from_hex(def.muted).unwrap_or(Color::Gray),
            done: color_from_hex(def.done).unwrap_or(Color::Green),
        }
    }
}

pub fn color_from_hex(value: &str) -> Option<Color> {
    let normalized = normalize_hex(value)?;
    let r = u8::from_str_radix(&normalized[1..3], 16).ok()?;
    let g = u8::from_str_radix(&normalized[3..5], 16).ok()?;
    let b = u8::from_str_radix(&normalized[5..7], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn normalize_hex(value: &str) -> Option<String> {
    let mut cleaned = value.trim().to_string();
    if !cleaned.starts_with('#') {
        cleaned.insert(0, '#');
    }
    if cleaned.len() != 7 || !cleaned.is_ascii() {
        return None;
    }
    Some(cleaned)
}
