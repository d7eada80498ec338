// gkpage - Page interaction engine for the GK Group website
//
// A headless implementation of the client-side interaction layer: the
// browser DOM is modeled as a typed in-memory page surface, and each
// behavior runs as an independently constructible component.
//
// Architecture:
// - Scroll-spy: derives the active nav section from debounced scroll ticks
// - Reveal animator: one-shot viewport-entry animations and counters
// - Form controller: validation, submit state machine, notices, analytics
// - Preference store: fail-soft local-storage emulation
// - Error sink: panic hook and task-failure monitor, log-only
// - Event system: mpsc channels connect the page event stream to components

mod analytics;
mod cli;
mod config;
mod demo;
mod error;
mod events;
mod form;
mod logging;
mod page;
mod prefs;
mod reveal;
mod scrollspy;
mod sink;
mod util;

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use analytics::{Analytics, NoopAnalytics, TraceAnalytics};
use config::Config;
use events::{PageEvent, SessionStats};
use form::endpoint::HttpEndpoint;
use form::{FormController, FormEvent};
use prefs::PreferenceStore;
use reveal::RevealAnimator;
use scrollspy::ScrollSpy;

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --path)
    // If a command was handled, exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();
    let config = Config::from_env();

    // The guard must be kept alive for the duration of the program so file
    // logs flush on exit
    let _file_guard = logging::init(&config);

    // Process-wide handlers for uncaught panics and failed tasks
    sink::install();

    // Local-storage emulation; everything on top of it is fail-soft
    let prefs = PreferenceStore::file(config.storage_dir.clone());
    let preferences = prefs.preferences();

    // In demo mode the collaborator is a local stub on an ephemeral port;
    // otherwise relative form actions resolve against the configured base
    let (endpoint_base, stub_handle) = if config.demo_mode {
        let (addr, handle) = demo::spawn_stub_collaborator().await?;
        (format!("http://{addr}"), Some(handle))
    } else {
        (config.form.endpoint_base.clone(), None)
    };

    // The page surface every component mutates through typed handles
    let page = page::shared(demo::build_page(&config));
    let stats = Arc::new(Mutex::new(SessionStats::default()));

    if prefs.mark_first_visit() {
        page.lock()
            .unwrap()
            .push_notice(page::NoticeKind::Info, "Welcome to GK Group!");
    }

    // Event channels: one inbound stream from the page (or the demo script),
    // one channel per component. Bounded so a flooding producer backpressures.
    let (event_tx, mut event_rx) = mpsc::channel::<PageEvent>(1000);
    let (scroll_tx, scroll_rx) = mpsc::channel::<f64>(1000);
    let (reveal_tx, reveal_rx) = mpsc::channel::<(String, f64)>(1000);
    let (form_tx, form_rx) = mpsc::channel::<FormEvent>(1000);

    // Attach components: one task each, detached by closing its channel
    let spy = ScrollSpy::new(config.scrollspy.clone(), page.clone());
    let spy_task = sink::monitor("scroll-spy", tokio::spawn(spy.run(scroll_rx)));

    let animator = RevealAnimator::new(
        config.reveal.clone(),
        page.clone(),
        demo::reveal_targets(),
        preferences.reduced_motion,
        stats.clone(),
    );
    let reveal_task = sink::monitor("reveal-animator", tokio::spawn(animator.run(reveal_rx)));

    let endpoint = Arc::new(HttpEndpoint::new(endpoint_base));
    // Real sessions would inject a gtag/fbq-backed tracker; the demo logs
    let analytics: Arc<dyn Analytics> = if config.demo_mode {
        Arc::new(TraceAnalytics)
    } else {
        Arc::new(NoopAnalytics)
    };
    let controller = FormController::new(
        config.form.clone(),
        page.clone(),
        endpoint,
        analytics,
        prefs.clone(),
        stats.clone(),
    );
    let form_task = sink::monitor("form-controller", tokio::spawn(controller.run(form_rx)));

    // Event router: fans the page event stream out to component channels.
    // Theme toggles are handled inline; they are a preference write plus a
    // body class flip, not a stateful component of their own.
    let router_page = page.clone();
    let router_prefs = prefs.clone();
    let router_stats = stats.clone();
    let router = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                PageEvent::Scroll { position, .. } => {
                    router_stats.lock().unwrap().scroll_ticks += 1;
                    let _ = scroll_tx.send(position).await;
                }
                PageEvent::Intersection {
                    element_id, ratio, ..
                } => {
                    let _ = reveal_tx.send((element_id, ratio)).await;
                }
                PageEvent::Submit { form_id, .. } => {
                    let _ = form_tx.send(FormEvent::Submit { form_id }).await;
                }
                PageEvent::FieldInput {
                    form_id,
                    field,
                    value,
                    ..
                } => {
                    let _ = form_tx
                        .send(FormEvent::FieldInput {
                            form_id,
                            field,
                            value,
                        })
                        .await;
                }
                PageEvent::InterestSelected { value, .. } => {
                    let _ = form_tx.send(FormEvent::InterestSelected { value }).await;
                }
                PageEvent::WhatsAppClicked { .. } => {
                    let _ = form_tx.send(FormEvent::WhatsAppClicked).await;
                }
                PageEvent::ThemeToggled { .. } => {
                    let dark = router_prefs.toggle_dark_theme(&router_page);
                    tracing::info!(dark, "theme toggled");
                }
            }
        }
        Ok(())
    });
    let router_task = sink::monitor("event-router", router);

    if config.demo_mode {
        tracing::info!("Running in DEMO MODE - replaying a scripted visit");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let mut demo_handle = tokio::spawn(demo::run_demo(event_tx, shutdown_rx));
        tokio::select! {
            _ = &mut demo_handle => {}
            _ = tokio::signal::ctrl_c() => {
                let _ = shutdown_tx.send(());
                let _ = (&mut demo_handle).await;
            }
        }
    } else {
        // A real browser bridge would feed event_tx; until then just wait
        tracing::info!("No demo script; waiting for a browser bridge (Ctrl+C to exit)");
        tokio::signal::ctrl_c().await?;
        drop(event_tx);
    }

    tracing::info!("Shutting down...");

    // Dropping the event sender cascades: the router drains and closes the
    // component channels, and each component detaches
    let _ = router_task.await;
    let _ = spy_task.await;
    let _ = reveal_task.await;
    let _ = form_task.await;
    if let Some(handle) = stub_handle {
        handle.abort();
    }

    let stats = stats.lock().unwrap();
    tracing::info!(
        scroll_ticks = stats.scroll_ticks,
        reveals = stats.reveals_fired,
        counters = stats.counters_completed,
        rejected = stats.submissions_rejected,
        "Session complete: {}/{} submissions succeeded ({:.0}%)",
        stats.submissions_succeeded,
        stats.submissions_attempted,
        stats.success_rate(),
    );

    Ok(())
}
