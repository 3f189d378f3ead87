//! Promo strip rotation.
//!
//! The strip shows one product of the rotation at a time. Advancing fades the
//! current banner out, swaps the content once the fade has run, then fades
//! back in. A [`RotationTimer`] drives this on a background thread; each strip
//! owns at most one, and starting a new one stops the old one first.
//!
//! The timer never touches the page itself. Every state change is published as
//! a [`PromoFrame`] on the strip's channel and [`PromoStrip::drain`] applies
//! the pending frames to a [`Document`].

use crate::document::Document;
use crate::shop::filter::promo_rotation;
use crate::shop::render::promo_banner;
use crate::types::Product;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const PROMO_STRIP: &str = "promoStrip";

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_FADE: Duration = Duration::from_millis(160);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Shown,
    /// Faded out; the content swaps to `next` when the fade completes.
    FadingOut { next: usize },
}

/// One rendered state of the strip, ready to be written into the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoFrame {
    pub product_id: String,
    pub html: String,
    pub phase: Phase,
}

impl PromoFrame {
    fn opacity(&self) -> &'static str {
        match self.phase {
            Phase::Shown => "1",
            Phase::FadingOut { .. } => "0",
        }
    }

    /// Write the frame into the strip region. `false` when the page has none.
    pub fn apply(&self, doc: &mut Document) -> bool {
        doc.set_html(PROMO_STRIP, maud::PreEscaped(self.html.clone()))
            && doc.set_attr(PROMO_STRIP, "data-product", self.product_id.clone())
            && doc.set_attr(
                PROMO_STRIP,
                "style",
                format!("transition: opacity .5s ease; opacity: {}", self.opacity()),
            )
    }
}

#[derive(Debug)]
struct StripState {
    rotation: Vec<Product>,
    index: usize,
    phase: Phase,
}

impl StripState {
    fn begin_fade(&mut self) {
        if self.rotation.is_empty() {
            return;
        }
        let next = (self.index + 1) % self.rotation.len();
        self.phase = Phase::FadingOut { next };
    }

    fn finish_fade(&mut self) {
        if let Phase::FadingOut { next } = self.phase {
            self.index = next;
        }
        self.phase = Phase::Shown;
    }

    fn frame(&self) -> Option<PromoFrame> {
        let product = self.rotation.get(self.index)?;
        Some(PromoFrame {
            product_id: product.id.clone(),
            html: promo_banner(product).into_string(),
            phase: self.phase,
        })
    }
}

fn lock(state: &Mutex<StripState>) -> MutexGuard<'_, StripState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Apply `change` to the shared state and publish the resulting frame.
fn step(state: &Mutex<StripState>, frames: &Sender<PromoFrame>, change: fn(&mut StripState)) {
    let frame = {
        let mut state = lock(state);
        change(&mut *state);
        state.frame()
    };
    if let Some(frame) = frame {
        // The strip owns the receiver; a failed send means it is gone.
        let _ = frames.send(frame);
    }
}

/// Background ticker advancing a strip. Stops when dropped.
#[derive(Debug)]
pub struct RotationTimer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RotationTimer {
    fn spawn(
        state: Arc<Mutex<StripState>>,
        frames: Sender<PromoFrame>,
        interval: Duration,
        fade: Duration,
    ) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            log::debug!("promo rotation started ({interval:?})");
            loop {
                if !matches!(stopped.recv_timeout(interval), Err(RecvTimeoutError::Timeout)) {
                    break;
                }
                step(&state, &frames, StripState::begin_fade);
                let stop_requested =
                    !matches!(stopped.recv_timeout(fade), Err(RecvTimeoutError::Timeout));
                step(&state, &frames, StripState::finish_fade);
                if stop_requested {
                    break;
                }
            }
            log::debug!("promo rotation stopped");
        });
        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The thread may already be gone; dropping the sender is enough.
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("promo rotation thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The promo strip and its rotation.
#[derive(Debug)]
pub struct PromoStrip {
    state: Arc<Mutex<StripState>>,
    timer: Option<RotationTimer>,
    frames_tx: Sender<PromoFrame>,
    frames: Receiver<PromoFrame>,
}

impl PromoStrip {
    pub fn new(products: &[Product]) -> Self {
        let rotation = promo_rotation(products).into_iter().cloned().collect();
        let (frames_tx, frames) = mpsc::channel();
        Self {
            state: Arc::new(Mutex::new(StripState {
                rotation,
                index: 0,
                phase: Phase::Shown,
            })),
            timer: None,
            frames_tx,
            frames,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.state).rotation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self) -> usize {
        lock(&self.state).index
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    pub fn current(&self) -> Option<Product> {
        let state = lock(&self.state);
        state.rotation.get(state.index).cloned()
    }

    /// Ids in rotation order.
    pub fn rotation_ids(&self) -> Vec<String> {
        lock(&self.state).rotation.iter().map(|p| p.id.clone()).collect()
    }

    /// Start fading towards the next item.
    pub fn begin_advance(&self) {
        lock(&self.state).begin_fade();
    }

    /// Swap to the pending item and show it.
    pub fn finish_advance(&self) {
        lock(&self.state).finish_fade();
    }

    /// Advance one step without waiting for the fade.
    pub fn advance(&self) {
        let mut state = lock(&self.state);
        state.begin_fade();
        state.finish_fade();
    }

    /// Start timed rotation. Any previous timer is stopped first. With reduced
    /// motion (or nothing to rotate) no timer runs. Returns whether one does.
    pub fn start(&mut self, interval: Duration, fade: Duration, reduced_motion: bool) -> bool {
        self.stop();
        if reduced_motion || self.is_empty() {
            return false;
        }
        self.timer = Some(RotationTimer::spawn(
            Arc::clone(&self.state),
            self.frames_tx.clone(),
            interval,
            fade,
        ));
        true
    }

    pub fn stop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
    }

    pub fn is_rotating(&self) -> bool {
        self.timer.as_ref().is_some_and(RotationTimer::is_running)
    }

    /// Apply every frame the timer published since the last drain, in order.
    /// Returns the number applied.
    pub fn drain(&self, doc: &mut Document) -> usize {
        self.frames
            .try_iter()
            .filter(|frame| frame.apply(doc))
            .count()
    }

    /// Write the current banner into the strip region.
    pub fn flush(&self, doc: &mut Document) -> bool {
        let frame = lock(&self.state).frame();
        frame.is_some_and(|frame| frame.apply(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::product;
    use std::time::Instant;

    fn strip(count: usize) -> PromoStrip {
        let products: Vec<Product> = (0..count)
            .map(|i| {
                let mut p = product(&format!("p{i}"), "subs");
                p.popularity = (count - i) as i64;
                p
            })
            .collect();
        PromoStrip::new(&products)
    }

    #[test]
    fn advance_wraps_to_first() {
        let strip = strip(3);
        assert_eq!(strip.rotation_ids(), ["p0", "p1", "p2"]);
        strip.advance();
        strip.advance();
        assert_eq!(strip.index(), 2);
        strip.advance();
        assert_eq!(strip.index(), 0);
    }

    #[test]
    fn cross_fade_swaps_after_fade_out() {
        let strip = strip(2);
        let mut doc = Document::with_regions([PROMO_STRIP]);
        strip.begin_advance();
        assert_eq!(strip.phase(), Phase::FadingOut { next: 1 });
        assert_eq!(strip.index(), 0);
        strip.flush(&mut doc);
        let region = doc.region(PROMO_STRIP).unwrap();
        assert_eq!(region.attrs["data-product"], "p0");
        assert!(region.attrs["style"].ends_with("opacity: 0"));

        strip.finish_advance();
        strip.flush(&mut doc);
        let region = doc.region(PROMO_STRIP).unwrap();
        assert_eq!(region.attrs["data-product"], "p1");
        assert!(region.attrs["style"].ends_with("opacity: 1"));
        assert!(region.html.contains("Product p1"));
    }

    #[test]
    fn reduced_motion_starts_no_timer() {
        let mut strip = strip(3);
        assert!(!strip.start(Duration::from_millis(5), Duration::ZERO, true));
        assert!(!strip.is_rotating());
    }

    #[test]
    fn empty_strip_renders_nothing() {
        let mut strip = PromoStrip::new(&[]);
        let mut doc = Document::with_regions([PROMO_STRIP]);
        assert!(!strip.flush(&mut doc));
        assert!(!strip.start(Duration::from_millis(5), Duration::ZERO, false));
    }

    #[test]
    fn timer_rotates_until_stopped() {
        let mut strip = strip(3);
        assert!(strip.start(Duration::from_millis(5), Duration::from_millis(1), false));
        let deadline = Instant::now() + Duration::from_secs(5);
        while strip.index() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert_ne!(strip.index(), 0);

        strip.stop();
        assert!(!strip.is_rotating());
        let index = strip.index();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(strip.index(), index);
        assert_eq!(strip.phase(), Phase::Shown);
    }

    #[test]
    fn restarting_replaces_the_timer() {
        let mut strip = strip(3);
        assert!(strip.start(Duration::from_secs(60), Duration::ZERO, false));
        assert_eq!(Arc::strong_count(&strip.state), 2);
        assert!(strip.start(Duration::from_secs(60), Duration::ZERO, false));
        // The first thread has exited and released its handle on the state.
        assert_eq!(Arc::strong_count(&strip.state), 2);
        assert!(strip.is_rotating());
        strip.stop();
        assert!(!strip.is_rotating());
        assert_eq!(Arc::strong_count(&strip.state), 1);
    }

    #[test]
    fn timer_ticks_reach_the_page() {
        let mut strip = strip(2);
        let mut doc = Document::with_regions([PROMO_STRIP]);
        strip.flush(&mut doc);
        assert!(strip.start(Duration::from_millis(5), Duration::from_millis(1), false));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut applied = 0;
        while doc.region(PROMO_STRIP).unwrap().attrs["data-product"] == "p0"
            && Instant::now() < deadline
        {
            applied += strip.drain(&mut doc);
            thread::sleep(Duration::from_millis(2));
        }
        assert!(applied > 0);
        assert_eq!(doc.region(PROMO_STRIP).unwrap().attrs["data-product"], "p1");

        strip.stop();
        strip.drain(&mut doc);
        let region = doc.region(PROMO_STRIP).unwrap();
        assert_eq!(region.attrs["data-product"], strip.current().unwrap().id);
        assert!(region.attrs["style"].ends_with("opacity: 1"));
        assert_eq!(strip.drain(&mut doc), 0);
    }
}
