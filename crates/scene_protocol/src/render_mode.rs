/// Global rendering mode, set on `Drawing` and consulted by every item's
/// `render_variant` (spec.md §4.1). `NoFilters` and `Outline` exist for the
/// host's "fast preview" and "wireframe debug" views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Normal,
    NoFilters,
    Outline,
}

impl RenderMode {
    pub fn renders_filters(self) -> bool {
        matches!(self, RenderMode::Normal)
    }

    pub fn is_outline(self) -> bool {
        matches!(self, RenderMode::Outline)
    }
}
