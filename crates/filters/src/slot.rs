//! Named buffers flowing between filter primitives (spec.md §4.4).

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotName {
    SourceGraphic,
    SourceAlpha,
    BackgroundImage,
    BackgroundAlpha,
    FillPaint,
    StrokePaint,
    /// The `result` name of a prior primitive in the same pipeline.
    Named(String),
    /// No `result`/`in` given: the previous primitive's output.
    LastResult,
}

impl SlotName {
    pub fn is_reserved_source(&self) -> bool {
        matches!(
            self,
            SlotName::SourceGraphic
                | SlotName::SourceAlpha
                | SlotName::BackgroundImage
                | SlotName::BackgroundAlpha
                | SlotName::FillPaint
                | SlotName::StrokePaint
        )
    }
}
