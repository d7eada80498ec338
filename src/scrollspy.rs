// Scroll-spy - derives the active section from scroll position
//
// On each debounced scroll tick, the topmost section whose top offset (minus
// the fixed header offset plus slack) is <= the scroll position becomes
// current; when several qualify the last one in document order wins, i.e. the
// closest section above the viewport boundary. Exactly one nav link is active,
// or none when the page is above all sections.

use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::config::ScrollSpyConfig;
use crate::page::{Section, SharedPage};
use crate::util::Debouncer;

pub struct ScrollSpy {
    config: ScrollSpyConfig,
    page: SharedPage,
}

impl ScrollSpy {
    pub fn new(config: ScrollSpyConfig, page: SharedPage) -> Self {
        Self { config, page }
    }

    /// Pure active-section rule, separated from the event loop for tests.
    pub fn compute_active(
        sections: &[Section],
        scroll_pos: f64,
        config: &ScrollSpyConfig,
    ) -> Option<String> {
        let offset = config.header_offset + config.offset_slack;
        let mut current = None;
        for section in sections {
            if scroll_pos >= section.top_offset - offset {
                current = Some(section.id.clone());
            }
        }
        current
    }

    fn apply(&self, scroll_pos: f64) {
        let mut page = self.page.lock().unwrap();
        let active = Self::compute_active(&page.sections, scroll_pos, &self.config);
        tracing::trace!(scroll_pos, active = ?active, "scroll-spy tick");
        page.set_active_section(active.as_deref());
    }

    /// Consume scroll positions until the channel closes.
    ///
    /// Runs once eagerly at attach so the initial nav state is correct before
    /// any scroll occurs. Bursts of events are coalesced: each newer position
    /// restarts the quiet window, and only the latest position is applied.
    pub async fn run(self, mut rx: mpsc::Receiver<f64>) -> anyhow::Result<()> {
        self.apply(0.0);

        let mut debouncer = Debouncer::new(Duration::from_millis(self.config.debounce_ms));
        let mut latest = 0.0;
        loop {
            if debouncer.pending() {
                tokio::select! {
                    next = rx.recv() => match next {
                        Some(pos) => {
                            latest = pos;
                            debouncer.record(Instant::now());
                        }
                        None => break,
                    },
                    _ = sleep(debouncer.window()) => {
                        if debouncer.ready(Instant::now()) {
                            debouncer.reset();
                            self.apply(latest);
                        }
                    }
                }
            } else {
                let Some(pos) = rx.recv().await else {
                    break;
                };
                latest = pos;
                debouncer.record(Instant::now());
            }
        }

        // Apply a position still waiting out its quiet window at detach
        if debouncer.pending() {
            self.apply(latest);
        }

        tracing::debug!("Scroll-spy detached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{self, PageModel};

    fn fixture_sections() -> Vec<Section> {
        ["home", "about", "businesses", "contact"]
            .iter()
            .zip([0.0, 600.0, 1400.0, 2200.0])
            .map(|(id, top_offset)| Section {
                id: id.to_string(),
                top_offset,
            })
            .collect()
    }

    #[test]
    fn test_above_all_sections_yields_none() {
        let sections = vec![Section {
            id: "about".to_string(),
            top_offset: 600.0,
        }];
        let active = ScrollSpy::compute_active(&sections, 0.0, &ScrollSpyConfig::default());
        assert_eq!(active, None);
    }

    #[test]
    fn test_last_qualifying_section_wins() {
        let sections = fixture_sections();
        let config = ScrollSpyConfig::default();

        // 1500 is past "about" (600) and "businesses" (1400 - 180 = 1220)
        let active = ScrollSpy::compute_active(&sections, 1500.0, &config);
        assert_eq!(active.as_deref(), Some("businesses"));

        // All the way down every section qualifies; the last one wins
        let active = ScrollSpy::compute_active(&sections, 10_000.0, &config);
        assert_eq!(active.as_deref(), Some("contact"));
    }

    #[test]
    fn test_header_offset_pulls_section_in_early() {
        let sections = fixture_sections();
        let config = ScrollSpyConfig::default();

        // 600 - (80 + 100) = 420: "about" becomes current before its top
        let active = ScrollSpy::compute_active(&sections, 420.0, &config);
        assert_eq!(active.as_deref(), Some("about"));

        let active = ScrollSpy::compute_active(&sections, 419.0, &config);
        assert_eq!(active.as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn test_run_applies_eagerly_and_on_scroll() {
        let mut model = PageModel::new();
        for section in fixture_sections() {
            model.add_section(section.id, section.top_offset);
        }
        let page = page::shared(model);

        let (tx, rx) = mpsc::channel(16);
        let spy = ScrollSpy::new(
            ScrollSpyConfig {
                debounce_ms: 5,
                ..Default::default()
            },
            page.clone(),
        );
        let handle = tokio::spawn(spy.run(rx));

        // A burst of scroll positions; only the last should stick
        for pos in [100.0, 700.0, 1500.0, 2300.0] {
            tx.send(pos).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap().unwrap();

        let page = page.lock().unwrap();
        assert_eq!(page.active_section(), Some("contact"));
        let active_links = page.nav_links.iter().filter(|l| l.active).count();
        assert_eq!(active_links, 1);
    }

    #[tokio::test]
    async fn test_attach_sets_initial_state_before_any_scroll() {
        let mut model = PageModel::new();
        model.add_section("home", 0.0);
        let page = page::shared(model);

        let (tx, rx) = mpsc::channel(1);
        let spy = ScrollSpy::new(ScrollSpyConfig::default(), page.clone());
        let handle = tokio::spawn(spy.run(rx));
        drop(tx);
        handle.await.unwrap().unwrap();

        // Position 0 with the home section at offset 0 marks it active
        assert_eq!(page.lock().unwrap().active_section(), Some("home"));
    }
}
