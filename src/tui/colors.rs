//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Category;

/// Focused field borders and the selected tab.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Destructive confirmations.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Status bar background.
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

/// Accent used for a finished-task section.
pub fn category_color(category: Category) -> Color {
    match category {
        Category::Bill => GOLD,
        Category::Food => Color::Green,
        Category::Meeting => Color::Cyan,
        Category::Medication => Color::Magenta,
        Category::Other => Color::Gray,
    }
}
