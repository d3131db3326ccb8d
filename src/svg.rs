use chrono::{DateTime, Utc};

use crate::languages::RankedEntry;

const START_Y: i32 = 40;
const LINE_HEIGHT: i32 = 24;
const BAR_HEIGHT: i32 = 14;
const LEFT_PADDING: f32 = 15.0;
const LABEL_GAP: f32 = 10.0;
const RIGHT_PADDING: f32 = 30.0;
const CHAR_WIDTH: f32 = 9.6;
const BAR_AREA: f32 = 300.0;
const MIN_LABEL_CHARS: usize = 8;
const VALUE_CHARS: usize = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

pub struct ThemeColors {
    pub bg: &'static str,
    pub bg_secondary: &'static str,
    pub primary: &'static str,
    pub primary_light: &'static str,
    pub text: &'static str,
    pub secondary_text: &'static str,
}

impl Theme {
    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Dark => ThemeColors {
                bg: "#282a36",
                bg_secondary: "#44475a",
                primary: "#ff5722",
                primary_light: "#ffccbc",
                text: "#f8f8f2",
                secondary_text: "#757575",
            },
            Theme::Light => ThemeColors {
                bg: "#E6E6E6",
                bg_secondary: "#FFFFFF",
                primary: "#ff5722",
                primary_light: "#ffccbc",
                text: "#212121",
                secondary_text: "#757575",
            },
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// GitHub linguist colours for the usual suspects. Anything else is drawn in
/// the theme's primary colour.
fn language_color(language: &str) -> Option<&'static str> {
    let color = match language {
        "C" => "#555555",
        "C#" => "#178600",
        "C++" => "#f34b7d",
        "CSS" => "#563d7c",
        "Dart" => "#00B4AB",
        "Dockerfile" => "#384d54",
        "Go" => "#00ADD8",
        "HTML" => "#e34c26",
        "Java" => "#b07219",
        "JavaScript" => "#f1e05a",
        "Kotlin" => "#A97BFF",
        "Lua" => "#000080",
        "Makefile" => "#427819",
        "PHP" => "#4F5D95",
        "Pug" => "#a86454",
        "Python" => "#3572A5",
        "Ruby" => "#701516",
        "Rust" => "#dea584",
        "SCSS" => "#c6538c",
        "Shell" => "#89e051",
        "Swift" => "#F05138",
        "TypeScript" => "#3178c6",
        "Vue" => "#41b883",
        _ => return None,
    };
    Some(color)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Bar width as a percentage of the largest total.
pub fn bar_percent(bytes: u64, max: u64) -> f32 {
    if max == 0 {
        0.0
    } else {
        (bytes as f64 * 100.0 / max as f64) as f32
    }
}

/// 1536 -> "1.5 KB"
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn build_header_line(label: &str, width_chars: usize) -> String {
    let base = format!("{label} ");
    let dash_count = width_chars.saturating_sub(base.len());
    format!("{base}{}", "-".repeat(dash_count))
}

fn build_rows(ranking: &[RankedEntry], label_chars: usize, theme: Theme) -> String {
    let colors = theme.colors();
    let max = ranking.first().map(RankedEntry::bytes).unwrap_or(0);
    let total = ranking
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.bytes()));

    let label_x = LEFT_PADDING + label_chars as f32 * CHAR_WIDTH;
    let bar_x = label_x + LABEL_GAP;
    let value_x = bar_x + BAR_AREA + LABEL_GAP;

    let mut out = String::new();
    for (i, entry) in ranking.iter().enumerate() {
        // One header line sits above the first row.
        let y = START_Y + (i as i32 + 1) * LINE_HEIGHT;
        let bar_w = BAR_AREA * bar_percent(entry.bytes(), max) / 100.0;
        let fill = language_color(entry.language()).unwrap_or(colors.primary);

        out.push_str(&format!(
            r#"<text x="{label_x}" y="{y}" text-anchor="end" class="label">{}</text>
<rect x="{bar_x}" y="{bar_y}" width="{bar_area}" height="{BAR_HEIGHT}" rx="3" class="track"/>
<rect x="{bar_x}" y="{bar_y}" width="{bar_w:.1}" height="{BAR_HEIGHT}" rx="3" fill="{fill}"/>
<text x="{value_x}" y="{y}" class="value">{} ({:.1}%)</text>
"#,
            escape_xml(entry.language()),
            human_bytes(entry.bytes()),
            entry.share_of(total),
            bar_y = y - BAR_HEIGHT + 2,
            bar_area = BAR_AREA,
        ));
    }
    out
}

/// Render the ranking as a horizontal bar chart.
pub fn generate_svg(ranking: &[RankedEntry], theme: Theme, generated: DateTime<Utc>) -> String {
    let colors = theme.colors();

    let label_chars = ranking
        .iter()
        .map(|e| e.language().chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_LABEL_CHARS);

    let width_chars = label_chars + VALUE_CHARS;
    let w = LEFT_PADDING
        + label_chars as f32 * CHAR_WIDTH
        + 2.0 * LABEL_GAP
        + BAR_AREA
        + VALUE_CHARS as f32 * CHAR_WIDTH
        + RIGHT_PADDING;
    // header + rows + footer
    let rows = ranking.len().max(1) as i32;
    let h = START_Y + (rows + 2) * LINE_HEIGHT;

    let header = build_header_line("Languages", width_chars + (BAR_AREA / CHAR_WIDTH) as usize);
    let body = if ranking.is_empty() {
        format!(
            r#"<text x="{LEFT_PADDING}" y="{y}" class="muted">No language data yet</text>
"#,
            y = START_Y + LINE_HEIGHT
        )
    } else {
        build_rows(ranking, label_chars, theme)
    };
    let footer_y = h - LINE_HEIGHT / 2;

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{w}px" height="{h}px"
     font-family="ConsolasFallback,Consolas,monospace"
     font-size="14px">

<style>
.header {{ fill: {primary}; }}
.label  {{ fill: {text}; }}
.value  {{ fill: {text}; }}
.muted  {{ fill: {muted}; }}
.track  {{ fill: {track}; }}
</style>

<rect width="{w}px" height="{h}px" fill="{bg}" rx="15"/>

<text x="{LEFT_PADDING}" y="{START_Y}" class="header" xml:space="preserve">{header}</text>
<line x1="{LEFT_PADDING}" y1="{rule_y}" x2="{rule_x2}" y2="{rule_y}" stroke="{rule}" stroke-width="1"/>
{body}
<text x="{LEFT_PADDING}" y="{footer_y}" class="muted" font-size="11px">generated {stamp}</text>

</svg>
"#,
        primary = colors.primary,
        text = colors.text,
        muted = colors.secondary_text,
        track = colors.bg_secondary,
        bg = colors.bg,
        header = escape_xml(&header),
        rule = colors.primary_light,
        rule_y = START_Y + 6,
        rule_x2 = w - RIGHT_PADDING,
        stamp = generated.format("%d %b %Y %H:%M UTC"),
    )
}
