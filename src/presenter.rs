// Prediction panel: ranked guesses with confidence bars, plus the model status.
// Visual expectation: a dark panel right of the drawing; a colored status dot
// on top, then "1. Cat ... 70.0%" rows with a bar under each label, then a
// stats line with the top confidence and how long the prediction took.

use crate::draw::{TEXT_ADVANCE, draw_text_5x7, fill_rect};
use crate::types::{FrameBuffer, Prediction};
use std::time::Duration;

pub const IDLE_TEXT: &str = "Start drawing!";
pub const EMPTY_TEXT: &str = "No confident predictions";
pub const ERROR_LABEL: &str = "Prediction Error";

const PANEL_BG: u32 = 0x0020_2430;
const TEXT: u32 = 0x00E8_E8E8;
const MUTED: u32 = 0x0090_96A0;
const TOP_TEXT: u32 = 0x00FF_D866;
const BAR_BG: u32 = 0x0038_3E4C;
const BAR_FILL: u32 = 0x0046_B4FF;

/// Model status indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelStatus {
    Loading,
    Ready,
    Error,
}

impl ModelStatus {
    pub fn message(self) -> &'static str {
        match self {
            ModelStatus::Loading => "Loading Model...",
            ModelStatus::Ready => "Model Ready",
            ModelStatus::Error => "Model Failed",
        }
    }

    fn color(self) -> u32 {
        match self {
            ModelStatus::Loading => 0x00FF_B020,
            ModelStatus::Ready => 0x0040_D070,
            ModelStatus::Error => 0x00FF_4040,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewItem {
    pub rank: usize,
    pub label: String,
    pub percentage: String,
    /// Bar length in [0,1].
    pub fraction: f32,
    pub top: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewStats {
    pub top_confidence: String,
    pub processing_ms: u128,
}

/// Everything the panel needs to draw itself.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionView {
    pub placeholder: Option<&'static str>,
    pub items: Vec<ViewItem>,
    pub stats: Option<ViewStats>,
}

impl PredictionView {
    /// Visual: "Start drawing!" and no stats.
    pub fn idle() -> Self {
        Self { placeholder: Some(IDLE_TEXT), items: Vec::new(), stats: None }
    }

    /// Visual: a single "Prediction Error" row at 0.0%.
    pub fn error() -> Self {
        Self {
            placeholder: None,
            items: vec![ViewItem {
                rank: 1,
                label: ERROR_LABEL.to_string(),
                percentage: percent(0.0),
                fraction: 0.0,
                top: true,
            }],
            stats: None,
        }
    }
}

/// Ranked list + timing -> view. An empty list is the "no confident
/// prediction" state, not an error.
pub fn present(predictions: &[Prediction], elapsed: Duration) -> PredictionView {
    let stats = Some(ViewStats {
        top_confidence: percent(predictions.first().map_or(0.0, |p| p.confidence)),
        processing_ms: elapsed.as_millis(),
    });

    if predictions.is_empty() {
        return PredictionView { placeholder: Some(EMPTY_TEXT), items: Vec::new(), stats };
    }

    let items = predictions
        .iter()
        .enumerate()
        .map(|(i, p)| ViewItem {
            rank: i + 1,
            label: display_label(&p.label),
            percentage: percent(p.confidence),
            fraction: p.confidence.clamp(0.0, 1.0),
            top: i == 0,
        })
        .collect();

    PredictionView { placeholder: None, items, stats }
}

fn percent(confidence: f32) -> String {
    format!("{:.1}", confidence * 100.0)
}

/// `palm_tree` -> `Palm Tree`: underscores become spaces, each word starts
/// uppercase.
pub fn display_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_word = false;
    for ch in raw.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        let word = ch.is_ascii_alphanumeric();
        if word && !prev_word {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        prev_word = word;
    }
    out
}

/// Screen rectangle the panel owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

const ROW_HEIGHT: i32 = 24;
const PAD: i32 = 10;

/// Draw status, rows and stats into `screen` inside `panel`.
pub fn render(view: &PredictionView, status: ModelStatus, screen: &mut FrameBuffer, panel: PanelRect) {
    fill_rect(screen, panel.x, panel.y, panel.w, panel.h, PANEL_BG);
    let left = panel.x + PAD;
    let width = panel.w - 2 * PAD;
    let mut y = panel.y + PAD;

    // Status dot + text
    fill_rect(screen, left, y, 7, 7, status.color());
    draw_text_5x7(screen, left + 12, y, status.message(), TEXT);
    y += 20;

    if let Some(text) = view.placeholder {
        draw_text_5x7(screen, left, y, text, MUTED);
        y += ROW_HEIGHT;
    }

    for item in &view.items {
        if y + ROW_HEIGHT > panel.y + panel.h - ROW_HEIGHT {
            break;
        }
        let color = if item.top { TOP_TEXT } else { TEXT };
        let pct = format!("{}%", item.percentage);
        let pct_x = left + width - pct.len() as i32 * TEXT_ADVANCE;
        draw_text_5x7(screen, left, y, &format!("{}. {}", item.rank, item.label), color);
        draw_text_5x7(screen, pct_x, y, &pct, color);

        fill_rect(screen, left, y + 10, width, 5, BAR_BG);
        let filled = (width as f32 * item.fraction).round() as i32;
        fill_rect(screen, left, y + 10, filled, 5, BAR_FILL);
        y += ROW_HEIGHT;
    }

    if let Some(stats) = &view.stats {
        let line = format!("Top: {}% | {}ms", stats.top_confidence, stats.processing_ms);
        draw_text_5x7(screen, left, panel.y + panel.h - PAD - 7, &line, MUTED);
    }
}
