// What you SEE:
// • Left: a white drawing surface. Hold Left Mouse and draw a doodle.
// • Right: model status, then the model's top guesses with confidence bars.
// • Release the mouse: ~0.3s later the guesses update.
// • U / Backspace undoes the last stroke, C clears everything. ESC quits.

use clap::Parser;
use doodle_classifier::classifier::{Classifier, ModelLoader};
use doodle_classifier::config::Settings;
use doodle_classifier::draw::{Drawer, blit_scaled, fill_rect};
use doodle_classifier::labels::{default_labels, load_labels};
use doodle_classifier::logging;
use doodle_classifier::presenter::{self, ModelStatus, PanelRect};
use doodle_classifier::session::{ClassifyOutcome, Session};
use doodle_classifier::surface::{ClientPoint, PointerSampler, SURFACE_SIZE, SurfaceGeometry};
use doodle_classifier::types::FrameBuffer;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

const MARGIN: usize = 20;
const PANEL_WIDTH: usize = 280;
const BACKGROUND: u32 = 0x0030_3440;
const FRAME: u32 = 0x0070_7888;
/// How often the buffer pool safety sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Labels and model, loaded side by side at startup.
struct Startup {
    labels: Vec<String>,
    classifier: Classifier,
    loaded: doodle_classifier::Result<()>,
}

#[cfg(feature = "onnx")]
fn model_loader() -> Arc<dyn ModelLoader> {
    Arc::new(doodle_classifier::onnx::OnnxLoader)
}

#[cfg(not(feature = "onnx"))]
fn model_loader() -> Arc<dyn ModelLoader> {
    Arc::new(doodle_classifier::classifier::UnavailableLoader)
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    settings.validate()?;
    logging::init(settings.debug);
    info!("starting doodle classifier");

    // Model calls run here; the window loop below stays on the main thread.
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;

    /* --- Layout + window ---
       Visual: surface on the left at `display_size`, panel on the right. */
    let display = settings.display_size;
    let win_w = MARGIN * 3 + display + PANEL_WIDTH;
    let win_h = MARGIN * 2 + display;
    let geometry = SurfaceGeometry::square(MARGIN as f32, MARGIN as f32, display as f32, SURFACE_SIZE as f32);
    let panel = PanelRect {
        x: (MARGIN * 2 + display) as i32,
        y: MARGIN as i32,
        w: PANEL_WIDTH as i32,
        h: display as i32,
    };
    let mut drawer = Drawer::new("Doodle Classifier", win_w, win_h)?;
    let mut screen = FrameBuffer::filled(win_w, win_h, BACKGROUND);

    let mut session = Session::new(geometry, default_labels(settings.classes), settings.top_k);

    /* --- Startup: labels + model in parallel ---
       Visual: status stays "Loading Model..." until this settles. */
    let (startup_tx, startup_rx) = oneshot::channel::<Startup>();
    let mut startup_rx = Some(startup_rx);
    {
        let loader = model_loader();
        let (model_path, labels_path, classes) = (settings.model.clone(), settings.labels.clone(), settings.classes);
        rt.spawn(async move {
            let mut classifier = Classifier::new(loader);
            let (labels, loaded) =
                tokio::join!(load_labels(&labels_path, classes), classifier.load(&model_path));
            let _ = startup_tx.send(Startup { labels, classifier, loaded });
        });
    }

    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<ClassifyOutcome>();
    let mut classifier: Option<Classifier> = None;
    let mut sampler = PointerSampler::default();
    let mut last_sweep = Instant::now();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Did startup settle? */
        if let Some(rx) = startup_rx.as_mut() {
            match rx.try_recv() {
                Ok(startup) => {
                    session.set_labels(startup.labels);
                    match startup.loaded {
                        Ok(()) => {
                            session.set_status(ModelStatus::Ready);
                            info!("application ready");
                        }
                        Err(e) => {
                            session.set_status(ModelStatus::Error);
                            error!("model unavailable: {e}");
                        }
                    }
                    classifier = Some(startup.classifier);
                    startup_rx = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    session.set_status(ModelStatus::Error);
                    error!("startup task ended without reporting");
                    startup_rx = None;
                }
            }
        }

        /* 2) Inputs
           Visual: ink follows the mouse; U/C change the surface immediately. */
        let pos = drawer.mouse_pos().map(|(x, y)| ClientPoint::new(x, y));
        let events = sampler.sample(drawer.left_mouse_down(), pos, &geometry, session.surface().is_drawing());
        for event in &events {
            session.handle_input(event, now);
        }
        if drawer.clear_pressed_once() {
            session.clear();
        }
        if drawer.undo_pressed_once() {
            session.undo(now);
        }

        /* 3) Start a classify pass if one is due. */
        if let Some(request) = session.poll(now) {
            let handle = classifier.as_ref().map(Classifier::handle);
            match handle {
                Some(Ok(handle)) => {
                    let tx = result_tx.clone();
                    rt.spawn(async move {
                        let result = handle.classify(&request.grid).await;
                        let elapsed = request.started.elapsed();
                        let _ = tx.send(ClassifyOutcome { seq: request.seq, elapsed, result });
                    });
                }
                Some(Err(e)) => session.complete(ClassifyOutcome {
                    seq: request.seq,
                    elapsed: request.started.elapsed(),
                    result: Err(e),
                }),
                None => session.complete(ClassifyOutcome {
                    seq: request.seq,
                    elapsed: request.started.elapsed(),
                    result: Err(doodle_classifier::Error::NotReady),
                }),
            }
        }

        /* 4) Apply whatever finished since last frame (in arrival order). */
        while let Ok(outcome) = result_rx.try_recv() {
            session.complete(outcome);
        }

        /* 5) Low-frequency safety sweep of inference buffers. */
        if now.duration_since(last_sweep) >= SWEEP_INTERVAL {
            if let Some(c) = &classifier {
                c.pool().sweep();
                debug!(stats = ?c.pool().stats(), "buffer pool");
            }
            last_sweep = now;
        }

        /* 6) Compose the frame: background, framed surface, panel. */
        screen.fill(BACKGROUND);
        fill_rect(&mut screen, MARGIN as i32 - 2, MARGIN as i32 - 2, display as i32 + 4, display as i32 + 4, FRAME);
        blit_scaled(&mut screen, session.surface().framebuffer(), MARGIN as i32, MARGIN as i32, display, display);
        presenter::render(session.view(), session.status(), &mut screen, panel);

        /* 7) Present to the window (this is when the on-screen image updates). */
        drawer.present(&screen)?;
    }

    rt.shutdown_background();
    Ok(())
}
