use strum::IntoEnumIterator;

use crate::target::Target;

/// Width of the target-name column, matching the `%-15s` listing the
/// original Makefile help produced.
pub const NAME_COLUMN_WIDTH: usize = 15;

/// Two-column listing of every target and its one-line description, in
/// declaration order.
#[must_use]
pub fn render_target_listing() -> String {
    Target::iter()
        .map(|target| {
            format!(
                "{:<width$} {}",
                target.to_string(),
                target.description(),
                width = NAME_COLUMN_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
