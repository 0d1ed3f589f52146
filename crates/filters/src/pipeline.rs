//! A filter pipeline: an ordered list of primitives reading and writing
//! named slots (spec.md §4.4). Reserved source slots are materialized
//! lazily, on first read, via a host-provided `SlotSource`.

use std::collections::HashMap;

use geom::{Affine2D, IntRect};
use log::warn;

use crate::image::PremulImage;
use crate::primitive::{Primitive, PrimitiveInputs};
use crate::slot::SlotName;

/// Host hook that produces the pixels behind a reserved source slot
/// (`SourceGraphic`, `BackgroundImage`, paint slots, ...), transformed
/// into filter-primitive space and cropped to `region`. The filter
/// pipeline itself has no notion of the scene it's filtering.
pub trait SlotSource {
    fn materialize(&self, slot: &SlotName, region: IntRect) -> PremulImage;
}

pub struct FilterStage {
    pub primitive: Box<dyn Primitive>,
    pub input: SlotName,
    pub input2: Option<SlotName>,
    /// The `result` name other stages can reference via
    /// `SlotName::Named`; `None` means only `SlotName::LastResult` reaches
    /// it.
    pub result: Option<String>,
}

pub struct FilterPipeline {
    pub stages: Vec<FilterStage>,
    pub num_threads: usize,
}

impl FilterPipeline {
    /// Enlarges `bbox` by every stage's dependent-area requirement, per
    /// spec.md §4.4's "Dependent-area enlargement". Stages are folded in
    /// order since this pipeline models a linear chain rather than a
    /// general DAG; a branching pipeline would need to enlarge along each
    /// path to its slot's consumers and take the union.
    pub fn compute_drawbox(&self, bbox: IntRect, ctm: Affine2D) -> IntRect {
        self.stages
            .iter()
            .fold(bbox, |acc, stage| stage.primitive.area_enlarge(acc, ctm))
    }

    /// True only if every stage can handle `m` without resampling — used
    /// by the render pipeline to decide whether a filtered subtree can
    /// skip re-rendering its cache on a transform-only change.
    pub fn can_handle_affine(&self, m: Affine2D) -> bool {
        self.stages.iter().all(|stage| stage.primitive.can_handle_affine(m))
    }

    /// Runs every stage in order, returning the final stage's output
    /// cropped to `output_region`. Materializes reserved slots lazily and
    /// caches every stage's result so `Named` back-references are cheap.
    pub fn run(
        &self,
        source: &dyn SlotSource,
        output_region: IntRect,
        ctm: Affine2D,
    ) -> PremulImage {
        let mut slots: HashMap<SlotName, (PremulImage, IntRect)> = HashMap::new();
        let mut last: Option<(PremulImage, IntRect)> = None;

        for stage in &self.stages {
            let input_region = stage.primitive.area_enlarge(output_region, ctm);
            let (primary, primary_region) =
                self.resolve(stage, &stage.input, source, input_region, &mut slots, &last);
            let secondary = stage
                .input2
                .as_ref()
                .map(|name| self.resolve(stage, name, source, input_region, &mut slots, &last));

            let inputs = PrimitiveInputs {
                primary: &primary,
                primary_region,
                secondary: secondary.as_ref().map(|(image, _)| image),
                secondary_region: secondary.as_ref().map(|(_, region)| *region),
            };
            let output = stage.primitive.apply(inputs, output_region, self.num_threads);

            let entry = (output, output_region);
            if let Some(name) = &stage.result {
                slots.insert(SlotName::Named(name.clone()), entry.clone());
            }
            last = Some(entry);
        }

        last.map(|(image, _)| image)
            .unwrap_or_else(|| PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32))
    }

    fn resolve(
        &self,
        _stage: &FilterStage,
        name: &SlotName,
        source: &dyn SlotSource,
        region: IntRect,
        slots: &mut HashMap<SlotName, (PremulImage, IntRect)>,
        last: &Option<(PremulImage, IntRect)>,
    ) -> (PremulImage, IntRect) {
        match name {
            SlotName::LastResult => last
                .clone()
                .unwrap_or_else(|| (source.materialize(&SlotName::SourceGraphic, region), region)),
            SlotName::Named(_) => slots
                .get(name)
                .cloned()
                .unwrap_or_else(|| {
                    warn!("filter primitive references unresolved result slot, using SourceGraphic");
                    (source.materialize(&SlotName::SourceGraphic, region), region)
                }),
            reserved => slots
                .entry(reserved.clone())
                .or_insert_with(|| (source.materialize(reserved, region), region))
                .clone(),
        }
    }
}
