use ratatui::prelude::*;

use crate::domain::Status;

/// Status label on its badge color, with contrasting text.
pub fn status_badge(status: Status) -> Span<'static> {
    let hex = status.color();
    let background = hex_to_color(hex);
    let foreground = if should_use_light_text(hex) {
        Color::White
    } else {
        Color::Black
    };

    Span::styled(
        format!(" {} ", status.as_str()),
        Style::default()
            .bg(background)
            .fg(foreground)
            .add_modifier(Modifier::BOLD),
    )
}

/// Calculate luminance of a color for contrast calculation
fn calculate_luminance(r: u8, g: u8, b: u8) -> f64 {
    let channel = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };

    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// Parse hex color string to RGB values
fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

fn hex_to_color(hex: &str) -> Color {
    hex_to_rgb(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

/// Determine if text should be light or dark based on background color
fn should_use_light_text(bg_color: &str) -> bool {
    match hex_to_rgb(bg_color) {
        Some((r, g, b)) => calculate_luminance(r, g, b) < 0.5,
        None => false,
    }
}
