//! Render-mode gate.

use dsr_core::{PageRecord, RenderMode};

/// Whether a page is rendered by this dispatcher.
///
/// The only authorization checkpoint: nothing is fetched or rendered for a
/// page that fails it.
pub fn is_eligible(page: &PageRecord) -> bool {
    page.mode == RenderMode::OnDemand
}
