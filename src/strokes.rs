// Stroke bookkeeping: what has been drawn, in the order it was drawn.
// Nothing here touches pixels; the surface replays `snapshot()` when it needs
// to repaint (undo) and the session asks `is_empty()` before classifying.

use crate::types::{Point, Stroke};

#[derive(Debug, Default)]
pub struct StrokeStore {
    strokes: Vec<Stroke>,
    current: Stroke,
    drawing: bool,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new stroke at `point`. Ignored while a stroke is already open.
    pub fn begin_stroke(&mut self, point: Point) {
        if self.drawing {
            return;
        }
        self.drawing = true;
        self.current.clear();
        self.current.push(point);
    }

    /// Append to the open stroke. Ignored when not drawing.
    pub fn extend_stroke(&mut self, point: Point) {
        if !self.drawing {
            return;
        }
        self.current.push(point);
    }

    /// Close the open stroke and commit it if it has any points.
    /// Returns true when a stroke was committed.
    pub fn end_stroke(&mut self) -> bool {
        if !self.drawing {
            return false;
        }
        self.drawing = false;
        if self.current.is_empty() {
            return false;
        }
        self.strokes.push(std::mem::take(&mut self.current));
        true
    }

    /// Drop the most recently committed stroke (LIFO). The open stroke, if
    /// any, is left alone.
    pub fn undo(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.current.clear();
        self.drawing = false;
    }

    /// True until the first stroke is committed; an open stroke does not count.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn current(&self) -> &[Point] {
        &self.current
    }

    /// Completed strokes in commit order.
    pub fn snapshot(&self) -> &[Stroke] {
        &self.strokes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn draw(store: &mut StrokeStore, pts: &[(f32, f32)]) {
        let mut it = pts.iter();
        if let Some(&(x, y)) = it.next() {
            store.begin_stroke(p(x, y));
        }
        for &(x, y) in it {
            store.extend_stroke(p(x, y));
        }
        store.end_stroke();
    }

    #[test]
    fn strokes_commit_in_order() {
        let mut store = StrokeStore::new();
        draw(&mut store, &[(0.0, 0.0), (1.0, 1.0)]);
        draw(&mut store, &[(5.0, 5.0)]);
        draw(&mut store, &[(9.0, 9.0), (8.0, 8.0), (7.0, 7.0)]);

        let snap = store.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0], vec![p(0.0, 0.0), p(1.0, 1.0)]);
        assert_eq!(snap[1], vec![p(5.0, 5.0)]);
        assert_eq!(snap[2].len(), 3);
        assert!(snap.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn begin_while_drawing_is_ignored() {
        let mut store = StrokeStore::new();
        store.begin_stroke(p(1.0, 1.0));
        store.begin_stroke(p(50.0, 50.0));
        assert_eq!(store.current(), &[p(1.0, 1.0)]);
    }

    #[test]
    fn extend_and_end_without_begin_are_noops() {
        let mut store = StrokeStore::new();
        store.extend_stroke(p(1.0, 1.0));
        assert!(!store.end_stroke());
        assert!(store.is_empty());
        assert!(store.current().is_empty());
    }

    #[test]
    fn open_stroke_does_not_count_as_content() {
        let mut store = StrokeStore::new();
        store.begin_stroke(p(1.0, 1.0));
        store.extend_stroke(p(2.0, 2.0));
        assert!(store.is_empty());
        assert!(store.end_stroke());
        assert!(!store.is_empty());
        assert!(store.current().is_empty());
        assert!(!store.is_drawing());
    }

    #[test]
    fn undo_on_empty_and_after_clear_is_noop() {
        let mut store = StrokeStore::new();
        assert!(store.undo().is_none());
        assert!(store.is_empty());

        draw(&mut store, &[(0.0, 0.0), (3.0, 3.0)]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.undo().is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn undo_mid_draw_keeps_open_stroke() {
        let mut store = StrokeStore::new();
        draw(&mut store, &[(0.0, 0.0), (3.0, 3.0)]);
        store.begin_stroke(p(10.0, 10.0));
        store.extend_stroke(p(11.0, 11.0));

        assert!(store.undo().is_some());
        assert_eq!(store.current(), &[p(10.0, 10.0), p(11.0, 11.0)]);
        store.end_stroke();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_resets_drawing_flag() {
        let mut store = StrokeStore::new();
        store.begin_stroke(p(0.0, 0.0));
        store.clear();
        assert!(!store.is_drawing());
        assert!(store.is_empty());
        assert!(!store.end_stroke());
    }
}
