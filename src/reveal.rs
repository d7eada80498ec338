// Reveal animator - one-shot viewport-entry animations
//
// Observes a fixed set of elements captured at attach time (the set is not
// re-scanned). The first time an element's intersection ratio reaches the
// configured threshold it gets its opacity/transform transition and is
// permanently unobserved: re-entering the viewport never re-triggers.
//
// The counter variant interpolates a numeric display from 0 to its target
// over a fixed duration with per-frame stepping. Intermediate frames floor
// the interpolated value; the final frame always displays exactly the target.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::RevealConfig;
use crate::events::SessionStats;
use crate::page::SharedPage;

/// What firing a target does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealKind {
    /// Opacity/translate transition (business cards, section titles)
    Fade,
    /// Animated count up to a fixed value
    Counter { target: u64 },
}

/// One observed element and its one-shot latch
#[derive(Debug, Clone)]
pub struct RevealTarget {
    pub element_id: String,
    pub kind: RevealKind,
    pub has_fired: bool,
}

impl RevealTarget {
    pub fn fade(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            kind: RevealKind::Fade,
            has_fired: false,
        }
    }

    pub fn counter(element_id: impl Into<String>, target: u64) -> Self {
        Self {
            element_id: element_id.into(),
            kind: RevealKind::Counter { target },
            has_fired: false,
        }
    }
}

/// Frame-stepped interpolation from 0 to a target value.
///
/// Pure so the exactness property is testable without timers: `tick()` yields
/// each displayed value and terminates with exactly the target.
#[derive(Debug)]
pub struct CounterAnimation {
    target: u64,
    step: f64,
    current: f64,
    done: bool,
}

impl CounterAnimation {
    pub fn new(target: u64, duration: Duration, frame: Duration) -> Self {
        let frames = (duration.as_millis() / frame.as_millis().max(1)).max(1) as f64;
        Self {
            target,
            step: target as f64 / frames,
            current: 0.0,
            done: false,
        }
    }

    /// Advance one frame. Returns the value to display, or None once the
    /// target has been shown.
    pub fn tick(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        self.current += self.step;
        if self.current < self.target as f64 {
            Some(self.current as u64)
        } else {
            self.done = true;
            Some(self.target)
        }
    }
}

pub struct RevealAnimator {
    config: RevealConfig,
    page: SharedPage,
    targets: Vec<RevealTarget>,
    /// When the user prefers reduced motion, final styles apply immediately
    reduced_motion: bool,
    stats: Arc<Mutex<SessionStats>>,
}

impl RevealAnimator {
    pub fn new(
        config: RevealConfig,
        page: SharedPage,
        targets: Vec<RevealTarget>,
        reduced_motion: bool,
        stats: Arc<Mutex<SessionStats>>,
    ) -> Self {
        Self {
            config,
            page,
            targets,
            reduced_motion,
            stats,
        }
    }

    /// React to one intersection report. Returns the handle of a spawned
    /// counter task when one starts, so callers can await completion.
    pub fn handle_intersection(
        &mut self,
        element_id: &str,
        ratio: f64,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let kind = {
            let target = self
                .targets
                .iter_mut()
                .find(|t| t.element_id == element_id)?;
            let threshold = match target.kind {
                RevealKind::Fade => self.config.threshold,
                RevealKind::Counter { .. } => self.config.counter_threshold,
            };
            if target.has_fired || ratio < threshold {
                return None;
            }
            target.has_fired = true;
            target.kind
        };
        tracing::debug!(element_id, ratio, "reveal fired");
        self.stats.lock().unwrap().reveals_fired += 1;

        match kind {
            RevealKind::Fade => {
                self.apply_fade(element_id);
                None
            }
            RevealKind::Counter { target } => Some(self.start_counter(element_id, target)),
        }
    }

    fn apply_fade(&self, element_id: &str) {
        let mut page = self.page.lock().unwrap();
        if let Some(element) = page.element_mut(element_id) {
            if !self.reduced_motion {
                element
                    .styles
                    .insert("transition".to_string(), "all 0.6s ease".to_string());
            }
            element.styles.insert("opacity".to_string(), "1".to_string());
            element
                .styles
                .insert("transform".to_string(), "translateY(0)".to_string());
            element.classes.insert("revealed".to_string());
        }
    }

    fn start_counter(&self, element_id: &str, target: u64) -> tokio::task::JoinHandle<()> {
        let page = self.page.clone();
        let stats = self.stats.clone();
        let element_id = element_id.to_string();
        let frame = Duration::from_millis(self.config.counter_frame_ms);
        let duration = Duration::from_millis(self.config.counter_duration_ms);

        if self.reduced_motion {
            // Snap straight to the target, no per-frame stepping
            return tokio::spawn(async move {
                set_counter_text(&page, &element_id, target);
                stats.lock().unwrap().counters_completed += 1;
            });
        }

        let animation = CounterAnimation::new(target, duration, frame);
        tokio::spawn(async move {
            run_counter(page, element_id, animation, frame).await;
            stats.lock().unwrap().counters_completed += 1;
        })
    }

    /// Consume intersection reports until the channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<(String, f64)>) -> anyhow::Result<()> {
        while let Some((element_id, ratio)) = rx.recv().await {
            self.handle_intersection(&element_id, ratio);
        }
        tracing::debug!("Reveal animator detached");
        Ok(())
    }
}

async fn run_counter(
    page: SharedPage,
    element_id: String,
    mut animation: CounterAnimation,
    frame: Duration,
) {
    let mut interval = tokio::time::interval(frame);
    loop {
        interval.tick().await;
        match animation.tick() {
            Some(value) => set_counter_text(&page, &element_id, value),
            None => break,
        }
    }
}

fn set_counter_text(page: &SharedPage, element_id: &str, value: u64) {
    let mut page = page.lock().unwrap();
    if let Some(element) = page.element_mut(element_id) {
        element.text = value.to_string();
        element.classes.insert("counted".to_string());
    }
}
