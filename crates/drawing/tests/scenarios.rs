//! End-to-end scenarios exercising `Drawing` through its public facade
//! (insert/append/set_clip/update/render/pick) and, where a scenario only
//! asserts cache or pick bookkeeping, directly against `drawing_tree`'s
//! lower-level `Tree`/`UpdatePass` plus `cache::CacheRegistry` and
//! `scheduler`'s free functions. No snapshot framework: every assertion
//! reads a concrete rect, handle, or pixel buffer.

use std::rc::Rc;

use cache::CacheRegistry;
use drawing::{Drawing, GroupData, ItemVariant, ShapeData};
use drawing_tree::{ItemKey, ItemState, Tree, UpdatePass};
use filters::{FilterPipeline, FilterStage, Primitive, PrimitiveInputs, SlotName};
use geom::{Affine2D, IntRect, RectF};
use scene_protocol::{
    Color, ContentKind, Context, DefaultPreferences, FillRule, Operator, Paint, PaintRef,
    PaintResolver, PathSegment, PathVector, PixelFormat, RenderMode, Style, Surface,
    SurfaceError, SurfaceFactory, SubPath,
};

/// An axis-aligned rectangle path, the only shape geometry these
/// scenarios need. `point_bbox_wind_distance` takes `point` in the space
/// `transform` maps into, per the trait's contract, so it inverts
/// `transform` before testing containment.
struct RectPath {
    rect: RectF,
}

impl PathVector for RectPath {
    fn subpaths(&self) -> Vec<SubPath> {
        vec![vec![
            PathSegment::MoveTo(self.rect.min_x, self.rect.min_y),
            PathSegment::LineTo(self.rect.max_x, self.rect.min_y),
            PathSegment::LineTo(self.rect.max_x, self.rect.max_y),
            PathSegment::LineTo(self.rect.min_x, self.rect.max_y),
            PathSegment::ClosePath,
        ]]
    }

    fn bounds_exact_transformed(&self, transform: Affine2D) -> Option<RectF> {
        if self.rect.is_empty() {
            return None;
        }
        Some(transform.transform_rect_bounds(self.rect))
    }

    fn point_bbox_wind_distance(
        &self,
        transform: Affine2D,
        point: (f64, f64),
        _viewbox: Option<RectF>,
    ) -> (i32, f64) {
        let inv = transform.inverse().unwrap_or(Affine2D::IDENTITY);
        let (lx, ly) = inv.transform_point(point.0, point.1);
        let inside = lx >= self.rect.min_x
            && lx <= self.rect.max_x
            && ly >= self.rect.min_y
            && ly <= self.rect.max_y;
        let dist_x = (lx - self.rect.min_x).min(self.rect.max_x - lx);
        let dist_y = (ly - self.rect.min_y).min(self.rect.max_y - ly);
        let distance = dist_x.min(dist_y);
        (if inside { 1 } else { 0 }, distance)
    }
}

fn red_fill_style() -> Style {
    Style {
        fill: Paint::Color(Color::new(1.0, 0.0, 0.0, 1.0)),
        stroke: Paint::None,
        ..Style::default()
    }
}

struct NoResolver;

impl PaintResolver for NoResolver {
    fn resolve(&self, _paint: PaintRef, _ctx: &mut dyn Context, _opacity: f64) {
        unreachable!("scenarios never attach a paint server")
    }
}

// ---------------------------------------------------------------------
// Scenario 1: insert a shape, update, then bbox/drawbox/pick all agree.
// ---------------------------------------------------------------------

#[test]
fn shape_bbox_drawbox_and_pick_agree_after_update() {
    let mut drawing = Drawing::new(ItemVariant::Group(GroupData::default()), &DefaultPreferences);
    let root = drawing.root();

    let shape = drawing.insert(ItemVariant::Shape(ShapeData {
        path: Some(Rc::new(RectPath {
            rect: RectF::new(10.0, 10.0, 30.0, 30.0),
        })),
        style: red_fill_style(),
        ..ShapeData::default()
    }));
    drawing.append_child(root, shape).unwrap();

    drawing.update(IntRect::INFINITE);

    let expected = IntRect::new(10, 10, 30, 30);
    assert_eq!(drawing.get_bbox(shape), Some(expected));
    assert_eq!(drawing.get_drawbox(shape), Some(expected));

    assert_eq!(drawing.pick((20.0, 20.0), 0.0, false), Some(shape));
    assert_eq!(drawing.pick((5.0, 5.0), 0.0, false), Some(root));
}

// ---------------------------------------------------------------------
// Scenario 2: a half-opacity, clipped group composites to the expected
// premultiplied pixel, via a hand-rolled Context/Surface test double.
// ---------------------------------------------------------------------

/// Straight (non-premultiplied) RGBA, the shape of what
/// `Context::set_source_rgba` hands over.
#[derive(Clone, Copy)]
struct Rgba {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

/// A full-canvas premultiplied layer. Every group this test pushes is
/// sized to the whole canvas rather than to the live clip rect — every
/// paint operation already restricts itself to the current clip, so the
/// extra transparent padding outside it never participates in a
/// composite and the simplification is invisible to the assertions.
#[derive(Clone)]
struct Layer {
    width: u32,
    height: u32,
    // Premultiplied (a, r, g, b) per pixel, row-major.
    pixels: Vec<[f64; 4]>,
}

impl Layer {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; (width as usize) * (height as usize)],
        }
    }

    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn get(&self, x: i32, y: i32) -> [f64; 4] {
        self.idx(x, y).map(|i| self.pixels[i]).unwrap_or([0.0; 4])
    }

    fn set(&mut self, x: i32, y: i32, px: [f64; 4]) {
        if let Some(i) = self.idx(x, y) {
            self.pixels[i] = px;
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for [a, r, g, b] in &self.pixels {
            out.push(to_byte(*b));
            out.push(to_byte(*g));
            out.push(to_byte(*r));
            out.push(to_byte(*a));
        }
        out
    }

    fn from_bytes(width: u32, height: u32, data: &[u8]) -> Self {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize));
        for chunk in data.chunks_exact(4) {
            let b = chunk[0] as f64 / 255.0;
            let g = chunk[1] as f64 / 255.0;
            let r = chunk[2] as f64 / 255.0;
            let a = chunk[3] as f64 / 255.0;
            pixels.push([a, r, g, b]);
        }
        Self { width, height, pixels }
    }
}

fn to_byte(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn composite(op: Operator, src: [f64; 4], dst: [f64; 4]) -> [f64; 4] {
    let [sa, sr, sg, sb] = src;
    let [da, dr, dg, db] = dst;
    match op {
        Operator::Clear => [0.0; 4],
        Operator::Source => src,
        Operator::Over => [
            sa + da * (1.0 - sa),
            sr + dr * (1.0 - sa),
            sg + dg * (1.0 - sa),
            sb + db * (1.0 - sa),
        ],
        Operator::In => [sa * da, sr * da, sg * da, sb * da],
        Operator::Xor => [
            sa * (1.0 - da) + da * (1.0 - sa),
            sr * (1.0 - da) + dr * (1.0 - sa),
            sg * (1.0 - da) + dg * (1.0 - sa),
            sb * (1.0 - da) + db * (1.0 - sa),
        ],
    }
}

#[derive(Clone)]
enum Source {
    Solid(Rgba),
    Layer(Layer),
}

#[derive(Clone)]
struct Snapshot {
    clip: IntRect,
    operator: Operator,
    transform: Affine2D,
    fill_rule: FillRule,
    line_width: f64,
    source: Source,
}

struct FakeSurface {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl FakeSurface {
    fn from_layer(layer: &Layer) -> Self {
        Self {
            width: layer.width,
            height: layer.height,
            bytes: layer.to_bytes(),
        }
    }
}

impl Surface for FakeSurface {
    fn format(&self) -> PixelFormat {
        PixelFormat::Argb32
    }
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn stride(&self) -> usize {
        self.width as usize * 4
    }
    fn data(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
    fn data_ref(&self) -> &[u8] {
        &self.bytes
    }
    fn flush(&mut self) {}
    fn mark_dirty(&mut self) {}
}

struct FakeFactory {
    width: u32,
    height: u32,
}

impl SurfaceFactory for FakeFactory {
    fn new_image(
        &self,
        _format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn Surface>, SurfaceError> {
        Ok(Box::new(FakeSurface::from_layer(&Layer::blank(width, height))))
    }

    fn similar(
        &self,
        _src: &dyn Surface,
        _content: ContentKind,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn Surface>, SurfaceError> {
        self.new_image(PixelFormat::Argb32, width, height)
    }
}

/// A minimal cairo-shaped `Context`: one canvas-sized `Layer` stack,
/// bbox-only path tracking (sufficient for the axis-aligned rectangles
/// every scenario draws), and the five Porter-Duff operators over
/// premultiplied floats.
struct FakeContext {
    canvas: Layer,
    stack: Vec<Layer>,
    clip: IntRect,
    operator: Operator,
    transform: Affine2D,
    fill_rule: FillRule,
    line_width: f64,
    source: Source,
    path_bbox: Option<RectF>,
    saves: Vec<Snapshot>,
    factory: FakeFactory,
}

impl FakeContext {
    fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Layer::blank(width, height),
            stack: Vec::new(),
            clip: IntRect::from_xywh(0, 0, width as i32, height as i32),
            operator: Operator::Over,
            transform: Affine2D::IDENTITY,
            fill_rule: FillRule::NonZero,
            line_width: 1.0,
            source: Source::Solid(Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }),
            path_bbox: None,
            saves: Vec::new(),
            factory: FakeFactory { width, height },
        }
    }

    fn top_mut(&mut self) -> &mut Layer {
        self.stack.last_mut().unwrap_or(&mut self.canvas)
    }

    fn accumulate(&mut self, x: f64, y: f64) {
        let (dx, dy) = self.transform.transform_point(x, y);
        let point = RectF::new(dx, dy, dx, dy);
        self.path_bbox = Some(match self.path_bbox {
            Some(existing) => RectF::new(
                existing.min_x.min(dx),
                existing.min_y.min(dy),
                existing.max_x.max(dx),
                existing.max_y.max(dy),
            ),
            None => point,
        });
    }

    fn source_at(&self, x: i32, y: i32) -> [f64; 4] {
        match &self.source {
            Source::Solid(c) => [c.a, c.r * c.a, c.g * c.a, c.b * c.a],
            Source::Layer(layer) => layer.get(x, y),
        }
    }

    fn composite_rect(&mut self, rect: IntRect, alpha: f64) {
        let rect = rect.intersect(&self.clip);
        if rect.is_empty() {
            return;
        }
        let op = self.operator;
        for y in rect.min_y..rect.max_y {
            for x in rect.min_x..rect.max_x {
                let mut src = self.source_at(x, y);
                if alpha != 1.0 {
                    for c in &mut src {
                        *c *= alpha;
                    }
                }
                let dst = self.top_mut().get(x, y);
                let out = composite(op, src, dst);
                self.top_mut().set(x, y, out);
            }
        }
    }

    fn path_rect(&self) -> Option<IntRect> {
        self.path_bbox.map(|b| b.to_outward_int_rect())
    }
}

impl Context for FakeContext {
    fn move_to(&mut self, x: f64, y: f64) {
        self.accumulate(x, y);
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.accumulate(x, y);
    }
    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.accumulate(x1, y1);
        self.accumulate(x2, y2);
        self.accumulate(x3, y3);
    }
    fn close_path(&mut self) {}
    fn new_path(&mut self) {
        self.path_bbox = None;
    }
    fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.accumulate(x, y);
        self.accumulate(x + width, y + height);
    }
    fn append_path(&mut self, path: &dyn PathVector) {
        for subpath in path.subpaths() {
            for segment in subpath {
                match segment {
                    PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => self.accumulate(x, y),
                    PathSegment::CurveTo { c1, c2, to } => {
                        self.accumulate(c1.0, c1.1);
                        self.accumulate(c2.0, c2.1);
                        self.accumulate(to.0, to.1);
                    }
                    PathSegment::ClosePath => {}
                }
            }
        }
    }

    fn fill(&mut self) {
        self.fill_preserve();
        self.new_path();
    }
    fn fill_preserve(&mut self) {
        if let Some(rect) = self.path_rect() {
            self.composite_rect(rect, 1.0);
        }
    }
    fn stroke(&mut self) {
        self.stroke_preserve();
        self.new_path();
    }
    fn stroke_preserve(&mut self) {
        if let Some(rect) = self.path_rect() {
            let half = (self.line_width / 2.0).ceil() as i32;
            self.composite_rect(rect.inflate(half, half), 1.0);
        }
    }
    fn clip(&mut self) {
        self.clip_preserve();
        self.new_path();
    }
    fn clip_preserve(&mut self) {
        if let Some(rect) = self.path_rect() {
            self.clip = self.clip.intersect(&rect);
        }
    }

    fn set_source_rgba(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.source = Source::Solid(Rgba { r, g, b, a });
    }
    fn set_source_surface(&mut self, surface: &dyn Surface, x: f64, y: f64) {
        let width = surface.width();
        let height = surface.height();
        let bytes = surface.data_ref();
        let mut layer = Layer::from_bytes(width, height, bytes);
        // Re-anchor the surface's local (0,0) at (x, y) in canvas space by
        // rebuilding a canvas-sized layer offset by the caller's explicit
        // placement, the authoritative one per the `Context` contract.
        let mut placed = Layer::blank(self.canvas.width, self.canvas.height);
        for row in 0..height as i32 {
            for col in 0..width as i32 {
                placed.set(col + x as i32, row + y as i32, layer.get(col, row));
            }
        }
        std::mem::swap(&mut layer, &mut placed);
        self.source = Source::Layer(layer);
    }
    fn set_operator(&mut self, op: Operator) {
        self.operator = op;
    }
    fn set_transform(&mut self, transform: Affine2D) {
        self.transform = transform;
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }
    fn set_fill_rule(&mut self, rule: FillRule) {
        self.fill_rule = rule;
    }
    fn set_dash(&mut self, _dashes: &[f64], _offset: f64) {}

    fn paint(&mut self) {
        self.paint_with_alpha(1.0);
    }
    fn paint_with_alpha(&mut self, alpha: f64) {
        let clip = self.clip;
        self.composite_rect(clip, alpha);
    }

    fn push_group(&mut self) {
        self.stack.push(Layer::blank(self.canvas.width, self.canvas.height));
    }
    fn push_group_with_content(&mut self, _content: ContentKind) {
        self.push_group();
    }
    fn pop_group_to_source(&mut self) {
        let layer = self.stack.pop().expect("pop_group_to_source with no pushed group");
        self.source = Source::Layer(layer);
    }
    fn pop_group_to_surface(&mut self) -> Box<dyn Surface> {
        let layer = self.stack.pop().expect("pop_group_to_surface with no pushed group");
        Box::new(FakeSurface::from_layer(&layer))
    }

    fn save(&mut self) {
        self.saves.push(Snapshot {
            clip: self.clip,
            operator: self.operator,
            transform: self.transform,
            fill_rule: self.fill_rule,
            line_width: self.line_width,
            source: self.source.clone(),
        });
    }
    fn restore(&mut self) {
        if let Some(s) = self.saves.pop() {
            self.clip = s.clip;
            self.operator = s.operator;
            self.transform = s.transform;
            self.fill_rule = s.fill_rule;
            self.line_width = s.line_width;
            self.source = s.source;
        }
    }

    fn surface_factory(&self) -> &dyn SurfaceFactory {
        &self.factory
    }
}

#[test]
fn half_opacity_clipped_group_composites_expected_pixel() {
    let mut drawing = Drawing::new(ItemVariant::Group(GroupData::default()), &DefaultPreferences);
    let root = drawing.root();

    let shape = drawing.insert(ItemVariant::Shape(ShapeData {
        path: Some(Rc::new(RectPath {
            rect: RectF::new(10.0, 10.0, 30.0, 30.0),
        })),
        style: red_fill_style(),
        ..ShapeData::default()
    }));
    drawing.append_child(root, shape).unwrap();

    let clip = drawing.insert(ItemVariant::Shape(ShapeData {
        path: Some(Rc::new(RectPath {
            rect: RectF::new(15.0, 15.0, 25.0, 25.0),
        })),
        ..ShapeData::default()
    }));
    drawing.set_clip(root, Some(clip)).unwrap();
    drawing.set_opacity(root, 0.5).unwrap();

    drawing.update(IntRect::INFINITE);
    assert_eq!(drawing.get_drawbox(root), Some(IntRect::new(15, 15, 25, 25)));

    let mut ctx = FakeContext::new(40, 40);
    drawing.render(&mut ctx, IntRect::new(0, 0, 40, 40), &NoResolver);

    for y in 0..40 {
        for x in 0..40 {
            let px = ctx.canvas.get(x, y);
            let inside = (15..25).contains(&x) && (15..25).contains(&y);
            if inside {
                assert_eq!(
                    [to_byte(px[0]), to_byte(px[1]), to_byte(px[2]), to_byte(px[3])],
                    [128, 128, 0, 0],
                    "pixel ({x},{y}) inside the clip should be half-opacity red"
                );
            } else {
                assert_eq!(px, [0.0, 0.0, 0.0, 0.0], "pixel ({x},{y}) outside the clip should stay transparent");
            }
        }
    }
}

// ---------------------------------------------------------------------
// Scenarios 3 and 6 only assert structural/cache bookkeeping, so they
// exercise `drawing_tree`/`cache`/`scheduler` directly rather than
// `Drawing`: no pixels are ever read, so no `Context` is needed.
// ---------------------------------------------------------------------

struct FakeFactoryTiles;

impl SurfaceFactory for FakeFactoryTiles {
    fn new_image(&self, _format: PixelFormat, width: u32, height: u32) -> Result<Box<dyn Surface>, SurfaceError> {
        Ok(Box::new(FakeSurface::from_layer(&Layer::blank(width, height))))
    }
    fn similar(&self, _src: &dyn Surface, _content: ContentKind, width: u32, height: u32) -> Result<Box<dyn Surface>, SurfaceError> {
        self.new_image(PixelFormat::Argb32, width, height)
    }
}

/// Grows its input rect by a fixed margin, standing in for a real filter
/// kernel whose only property this scenario cares about is that it
/// widens the drawbox past the bbox.
struct FixedEnlarge(i32);

impl Primitive for FixedEnlarge {
    fn name(&self) -> &'static str {
        "fixed-enlarge"
    }
    fn apply(&self, _inputs: PrimitiveInputs<'_>, output_region: IntRect, _num_threads: usize) -> filters::PremulImage {
        filters::PremulImage::new(output_region.width().max(0) as u32, output_region.height().max(0) as u32)
    }
    fn area_enlarge(&self, rect: IntRect, _ctm: Affine2D) -> IntRect {
        rect.inflate(self.0, self.0)
    }
}

fn all_requested() -> ItemState {
    ItemState::all()
}

#[test]
fn fill_change_clears_pick_readiness_and_leaves_cache_dirty() {
    let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
    let root = tree.root();
    let shape = tree.insert(ItemVariant::Shape(ShapeData {
        path: Some(Rc::new(RectPath {
            rect: RectF::new(10.0, 10.0, 30.0, 30.0),
        })),
        style: red_fill_style(),
        ..ShapeData::default()
    }));
    tree.append_child(root, shape).unwrap();
    tree.get_mut(shape).unwrap().filter = Some(FilterPipeline {
        stages: vec![FilterStage {
            primitive: Box::new(FixedEnlarge(3)),
            input: SlotName::SourceGraphic,
            input2: None,
            result: None,
        }],
        num_threads: 1,
    });
    tree.set_cached(shape, true, false).unwrap();

    let mut registry: CacheRegistry<ItemKey> = CacheRegistry::new(i64::MAX);
    {
        let mut pass = UpdatePass::new(&mut tree, &mut registry, IntRect::INFINITE, RenderMode::Normal);
        pass.update(root, IntRect::INFINITE, Affine2D::IDENTITY, all_requested(), ItemState::empty());
    }

    let expected_drawbox = IntRect::new(7, 7, 33, 33);
    assert_eq!(tree.get(shape).unwrap().drawbox, expected_drawbox);
    assert!(tree.get(shape).unwrap().state.contains(ItemState::PICK_READY));

    registry.allocate_tile(shape, expected_drawbox, &FakeFactoryTiles).unwrap();
    registry.tile_mut(shape).unwrap().mark_clean(expected_drawbox);
    assert!(registry.tile(shape).unwrap().is_clean_over(expected_drawbox));

    // Change the fill; this never touches bbox/drawbox geometry, so the
    // only thing that should move is the dirty flag and PICK_READY.
    if let ItemVariant::Shape(data) = &mut tree.get_mut(shape).unwrap().variant {
        data.style.fill = Paint::Color(Color::new(0.0, 1.0, 0.0, 1.0));
    }

    scheduler::mark_for_rendering(&tree, &mut registry, shape, RenderMode::Normal, &mut scheduler::CallbackList::new());
    scheduler::mark_for_update(
        &mut tree,
        shape,
        ItemState::BBOX | ItemState::DRAWBOX | ItemState::CACHE_READY | ItemState::PICK_READY,
        false,
        &mut scheduler::CallbackList::new(),
    );
    assert!(!tree.get(shape).unwrap().state.contains(ItemState::PICK_READY));

    {
        let mut pass = UpdatePass::new(&mut tree, &mut registry, IntRect::INFINITE, RenderMode::Normal);
        pass.update(root, IntRect::INFINITE, Affine2D::IDENTITY, all_requested(), ItemState::empty());
    }
    assert_eq!(tree.get(shape).unwrap().drawbox, expected_drawbox);
    assert!(tree.get(shape).unwrap().state.contains(ItemState::PICK_READY));
    assert_eq!(
        drawing_tree::pick(&mut tree, root, (20.0, 20.0), 0.0, false, false),
        Some(shape)
    );

    assert!(
        !registry.tile(shape).unwrap().is_clean_over(expected_drawbox),
        "the tile must still be dirty: the fill change never re-renders it"
    );
}

#[test]
fn budget_eviction_keeps_the_highest_scoring_tiles() {
    let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
    let root = tree.root();

    let mut shapes = Vec::with_capacity(100);
    for i in 0..100 {
        let side = 10.0 + i as f64;
        let shape = tree.insert(ItemVariant::Shape(ShapeData {
            path: Some(Rc::new(RectPath {
                rect: RectF::new(0.0, 0.0, side, side),
            })),
            style: red_fill_style(),
            ..ShapeData::default()
        }));
        tree.get_mut(shape).unwrap().filter = Some(FilterPipeline {
            stages: vec![FilterStage {
                primitive: Box::new(FixedEnlarge(0)),
                input: SlotName::SourceGraphic,
                input2: None,
                result: None,
            }],
            num_threads: 1,
        });
        tree.set_cached(shape, true, false).unwrap();
        tree.append_child(root, shape).unwrap();
        shapes.push(shape);
    }

    let mut registry: CacheRegistry<ItemKey> = CacheRegistry::new(i64::MAX);
    {
        let mut pass = UpdatePass::new(&mut tree, &mut registry, IntRect::INFINITE, RenderMode::Normal);
        pass.update(root, IntRect::INFINITE, Affine2D::IDENTITY, all_requested(), ItemState::empty());
    }

    let mut by_area: Vec<(ItemKey, IntRect)> = shapes
        .iter()
        .map(|&key| (key, tree.get(key).unwrap().drawbox))
        .collect();
    for &(key, drawbox) in &by_area {
        assert!(registry.is_candidate(key), "every shape scores above threshold");
        registry.allocate_tile(key, drawbox, &FakeFactoryTiles).unwrap();
    }

    by_area.sort_by_key(|(_, rect)| std::cmp::Reverse(rect.area()));
    let top_ten_bytes: i64 = by_area[..10].iter().map(|(_, rect)| rect.area() * 4).sum();

    registry.set_budget_bytes(top_ten_bytes);

    assert_eq!(registry.cached_items().count(), 10);
    for (key, _) in &by_area[..10] {
        assert!(registry.has_tile(*key), "top-10 by area must keep a tile");
    }
    for (key, _) in &by_area[10..] {
        assert!(!registry.has_tile(*key), "everything outside the top 10 must be evicted");
    }
}
