// The drawing surface: pointer/touch input in, ink on a 280x280 raster out.
// Visual expectation: holding the left button and moving draws a smooth
// 10px black line with round ends; undo repaints everything that is left.

use crate::gamma::GammaLut;
use crate::strokes::StrokeStore;
use crate::types::{FrameBuffer, Point, Stroke};

/// Intrinsic (backing) resolution of the surface, both axes.
pub const SURFACE_SIZE: usize = 280;
/// Brush diameter in intrinsic pixels.
pub const BRUSH_SIZE: f32 = 10.0;
pub const INK: u32 = 0x0000_0000;
pub const PAPER: u32 = 0x00FF_FFFF;

/// A pointer position in window (display) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientPoint {
    pub x: f32,
    pub y: f32,
}

impl ClientPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where the surface sits on screen and how big it is shown, versus how big
/// its backing raster is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceGeometry {
    pub left: f32,
    pub top: f32,
    pub display_width: f32,
    pub display_height: f32,
    pub intrinsic_width: f32,
    pub intrinsic_height: f32,
}

impl SurfaceGeometry {
    /// Square surface of `intrinsic` pixels shown as `display` pixels at (left, top).
    pub fn square(left: f32, top: f32, display: f32, intrinsic: f32) -> Self {
        Self {
            left,
            top,
            display_width: display,
            display_height: display,
            intrinsic_width: intrinsic,
            intrinsic_height: intrinsic,
        }
    }

    /// `(client - topLeft) * (intrinsic / display)` per axis.
    pub fn to_intrinsic(&self, client: ClientPoint) -> Point {
        let scale_x = self.intrinsic_width / self.display_width;
        let scale_y = self.intrinsic_height / self.display_height;
        Point::new((client.x - self.left) * scale_x, (client.y - self.top) * scale_y)
    }

    pub fn contains(&self, client: ClientPoint) -> bool {
        client.x >= self.left
            && client.y >= self.top
            && client.x < self.left + self.display_width
            && client.y < self.top + self.display_height
    }
}

/// Raw input, independent of the windowing library that produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown(ClientPoint),
    PointerMove(ClientPoint),
    PointerUp,
    /// Pointer left the surface; ends the stroke like a release.
    PointerLeave,
    /// All active contacts; only the first (primary) one is tracked.
    TouchStart(Vec<ClientPoint>),
    TouchMove(Vec<ClientPoint>),
    TouchEnd,
}

/// What a single input event did to the stroke state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceOutcome {
    Ignored,
    Began,
    Extended,
    Ended { committed: bool },
}

/// Backing raster plus the brush that paints into it.
pub struct Canvas {
    fb: FrameBuffer,
    lut: GammaLut,
    brush: f32,
}

impl Canvas {
    pub fn new(width: usize, height: usize, brush: f32) -> Self {
        Self { fb: FrameBuffer::filled(width, height, PAPER), lut: GammaLut::new(), brush }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.fb
    }

    /// Visual: the surface turns blank white.
    pub fn clear(&mut self) {
        self.fb.fill(PAPER);
    }

    /// Paint one brush segment from `a` to `b` (a capsule: round caps, and
    /// round joins where consecutive segments meet).
    /// Edge pixels get partial coverage blended in linear light; overlapping
    /// segments keep the darker value, so draw order never matters.
    pub fn draw_segment(&mut self, a: Point, b: Point) {
        let r = self.brush * 0.5;
        let reach = r + 1.0;
        let x0 = (a.x.min(b.x) - reach).floor().max(0.0) as i64;
        let y0 = (a.y.min(b.y) - reach).floor().max(0.0) as i64;
        let x1 = ((a.x.max(b.x) + reach).ceil() as i64).min(self.fb.width as i64 - 1);
        let y1 = ((a.y.max(b.y) + reach).ceil() as i64).min(self.fb.height as i64 - 1);
        if x1 < x0 || y1 < y0 {
            return;
        }

        for py in y0..=y1 {
            for px in x0..=x1 {
                let c = Point::new(px as f32 + 0.5, py as f32 + 0.5);
                let coverage = (r + 0.5 - distance_to_segment(c, a, b)).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let idx = py as usize * self.fb.width + px as usize;
                let painted = self.lut.mix(PAPER, INK, coverage);
                self.fb.pixels[idx] = darker(self.fb.pixels[idx], painted);
            }
        }
    }

    /// Paint a whole stroke. Fewer than 2 points leaves no mark.
    pub fn draw_stroke(&mut self, stroke: &[Point]) {
        for pair in stroke.windows(2) {
            self.draw_segment(pair[0], pair[1]);
        }
    }

    /// Clear, then replay every stroke in commit order.
    pub fn redraw(&mut self, strokes: &[Stroke]) {
        self.clear();
        for stroke in strokes {
            self.draw_stroke(stroke);
        }
    }
}

/// Drawing surface adapter: input FSM (Idle -> Drawing -> Idle) on top of
/// the stroke store, keeping the canvas in sync with it.
pub struct DrawingSurface {
    geometry: SurfaceGeometry,
    store: StrokeStore,
    canvas: Canvas,
    last: Option<Point>,
}

impl DrawingSurface {
    pub fn new(geometry: SurfaceGeometry) -> Self {
        let canvas = Canvas::new(
            geometry.intrinsic_width.round() as usize,
            geometry.intrinsic_height.round() as usize,
            BRUSH_SIZE,
        );
        Self { geometry, store: StrokeStore::new(), canvas, last: None }
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        self.canvas.framebuffer()
    }

    pub fn is_drawing(&self) -> bool {
        self.store.is_drawing()
    }

    pub fn handle(&mut self, event: &InputEvent) -> SurfaceOutcome {
        match event {
            InputEvent::PointerDown(client) => self.press(*client),
            InputEvent::PointerMove(client) => self.motion(*client),
            InputEvent::PointerUp | InputEvent::PointerLeave | InputEvent::TouchEnd => self.release(),
            InputEvent::TouchStart(touches) => match touches.first() {
                Some(primary) => self.press(*primary),
                None => SurfaceOutcome::Ignored,
            },
            InputEvent::TouchMove(touches) => match touches.first() {
                Some(primary) => self.motion(*primary),
                None => SurfaceOutcome::Ignored,
            },
        }
    }

    fn press(&mut self, client: ClientPoint) -> SurfaceOutcome {
        if self.store.is_drawing() {
            return SurfaceOutcome::Ignored;
        }
        let p = self.geometry.to_intrinsic(client);
        self.store.begin_stroke(p);
        self.last = Some(p);
        SurfaceOutcome::Began
    }

    fn motion(&mut self, client: ClientPoint) -> SurfaceOutcome {
        if !self.store.is_drawing() {
            return SurfaceOutcome::Ignored;
        }
        let p = self.geometry.to_intrinsic(client);
        self.store.extend_stroke(p);
        if let Some(prev) = self.last {
            self.canvas.draw_segment(prev, p);
        }
        self.last = Some(p);
        SurfaceOutcome::Extended
    }

    fn release(&mut self) -> SurfaceOutcome {
        if !self.store.is_drawing() {
            return SurfaceOutcome::Ignored;
        }
        self.last = None;
        SurfaceOutcome::Ended { committed: self.store.end_stroke() }
    }

    /// Remove the last committed stroke and repaint from what remains.
    /// Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.store.undo().is_none() {
            return false;
        }
        self.canvas.redraw(self.store.snapshot());
        // An open stroke is not in the snapshot; put its ink back.
        if self.store.is_drawing() {
            let current = self.store.current().to_vec();
            self.canvas.draw_stroke(&current);
        }
        true
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.canvas.clear();
        self.last = None;
    }
}

/// Turns mouse state polled once per frame (what minifb gives us) into
/// pointer events. Leaving the surface while held ends the stroke; coming
/// back in while still held does not start a new one.
#[derive(Debug, Default)]
pub struct PointerSampler {
    was_down: bool,
    last: Option<ClientPoint>,
}

impl PointerSampler {
    pub fn sample(
        &mut self,
        down: bool,
        pos: Option<ClientPoint>,
        geometry: &SurfaceGeometry,
        drawing: bool,
    ) -> Vec<InputEvent> {
        let inside = pos.filter(|p| geometry.contains(*p));
        let mut events = Vec::new();

        if down && !self.was_down {
            if let Some(p) = inside {
                events.push(InputEvent::PointerDown(p));
            }
        } else if down && drawing {
            match inside {
                Some(p) if Some(p) != self.last => events.push(InputEvent::PointerMove(p)),
                Some(_) => {}
                None => events.push(InputEvent::PointerLeave),
            }
        }
        if !down && self.was_down && drawing {
            events.push(InputEvent::PointerUp);
        }

        self.was_down = down;
        self.last = inside;
        events
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len2 = abx * abx + aby * aby;
    let t = if len2 <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + abx * t, a.y + aby * t);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Per-channel minimum of two 0x00RRGGBB colors.
#[inline]
fn darker(a: u32, b: u32) -> u32 {
    let mut out = 0u32;
    for shift in [16u32, 8, 0] {
        out |= ((a >> shift) & 0xFF).min((b >> shift) & 0xFF) << shift;
    }
    out
}
