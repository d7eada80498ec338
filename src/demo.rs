// Demo mode: scripted browser session against a stub collaborator
//
// Builds the GK Group page fixture (sections, counters, reveal targets, the
// contact and newsletter forms), then replays a realistic visit: a scroll
// burst the spy coalesces, elements entering the viewport, a counter that
// re-enters without re-firing, an invalid submit, a duplicate submit, and a
// successful contact and newsletter signup.
//
// The stub collaborator is a small axum router on an ephemeral local port
// that speaks the { success, message?, errors? } contract, so the real
// reqwest endpoint path is exercised end to end.
//
// Run with: GKPAGE_DEMO=1 cargo run --release (demo is also the default)

use axum::extract::Form;
use axum::routing::post;
use axum::{Json, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Duration};

use crate::config::Config;
use crate::error::FieldErrors;
use crate::events::PageEvent;
use crate::form::endpoint::FormResponse;
use crate::page::{Element, FieldKind, FieldModel, FormKind, FormModel, PageModel};
use crate::reveal::RevealTarget;

/// Anti-forgery token the "rendered markup" of the fixture carries
const DEMO_CSRF_TOKEN: &str = "demo-csrf-token";

/// Build the page surface the demo session runs against
pub fn build_page(config: &Config) -> PageModel {
    let mut page = PageModel::new();

    page.add_section("home", 0.0);
    page.add_section("about", 600.0);
    page.add_section("businesses", 1400.0);
    page.add_section("contact", 2200.0);

    for id in [
        "about-text",
        "section-title",
        "business-card-textiles",
        "business-card-steels",
    ] {
        page.add_element(id, Element::default());
    }
    for id in ["years-counter", "clients-counter", "projects-counter"] {
        let mut element = Element::default();
        element.text = "0".to_string();
        page.add_element(id, element);
    }

    page.add_form(
        FormModel::new("contactForm", FormKind::Contact, &config.form.contact_url)
            .with_csrf_token(DEMO_CSRF_TOKEN)
            .with_field(FieldModel::new("name", FieldKind::Text, true))
            .with_field(FieldModel::new("email", FieldKind::Email, true))
            .with_field(FieldModel::new("phone", FieldKind::Phone, false))
            .with_field(FieldModel::new("subject", FieldKind::Text, true))
            .with_field(FieldModel::new("message", FieldKind::TextArea, true)),
    );
    page.add_form(
        FormModel::new(
            "newsletterForm",
            FormKind::Newsletter,
            &config.form.newsletter_url,
        )
        .with_csrf_token(DEMO_CSRF_TOKEN)
        .with_field(FieldModel::new("email", FieldKind::Email, true)),
    );

    page
}

/// The fixed set of observed elements, captured once at attach
pub fn reveal_targets() -> Vec<RevealTarget> {
    vec![
        RevealTarget::fade("about-text"),
        RevealTarget::fade("section-title"),
        RevealTarget::fade("business-card-textiles"),
        RevealTarget::fade("business-card-steels"),
        RevealTarget::counter("years-counter", 25),
        RevealTarget::counter("clients-counter", 500),
        RevealTarget::counter("projects-counter", 120),
    ]
}

/// Start the stub collaborator on an ephemeral port.
pub async fn spawn_stub_collaborator(
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = Router::new()
        .route("/api/contact/", post(stub_contact))
        .route("/api/newsletter/", post(stub_newsletter));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Stub collaborator failed: {e}");
        }
    });

    tracing::info!("Stub collaborator listening on http://{addr}");
    Ok((addr, handle))
}

async fn stub_contact(Form(fields): Form<HashMap<String, String>>) -> Json<FormResponse> {
    let email = fields.get("email").map(String::as_str).unwrap_or_default();
    if email.ends_with("@blocked.test") {
        let mut errors = FieldErrors::new();
        errors.insert(
            "email".to_string(),
            vec!["Messages from this address are not accepted.".to_string()],
        );
        return Json(FormResponse::rejected(
            "We could not send your message.",
            errors,
        ));
    }
    Json(FormResponse::ok(
        "Thank you for contacting GK Group. We will get back to you shortly.",
    ))
}

async fn stub_newsletter(Json(body): Json<serde_json::Value>) -> Json<FormResponse> {
    let email = body["email"].as_str().unwrap_or_default();
    if email == "taken@example.com" {
        let mut errors = FieldErrors::new();
        errors.insert(
            "email".to_string(),
            vec!["This address is already subscribed.".to_string()],
        );
        return Json(FormResponse::rejected("Subscription failed.", errors));
    }
    Json(FormResponse::ok("Thank you for subscribing to our newsletter!"))
}

/// Replay the scripted visit, then return so the session can shut down.
pub async fn run_demo(tx: mpsc::Sender<PageEvent>, mut shutdown_rx: oneshot::Receiver<()>) {
    for (event, delay_ms) in demo_sequence() {
        if shutdown_rx.try_recv().is_ok() {
            return;
        }
        if tx.send(event).await.is_err() {
            break;
        }
        sleep(Duration::from_millis(delay_ms)).await;
    }

    // Leave time for the last in-flight submission and its notice
    tokio::select! {
        _ = &mut shutdown_rx => {}
        _ = sleep(Duration::from_millis(800)) => {}
    }
}

/// The visit script: (event, delay after sending it in ms)
fn demo_sequence() -> Vec<(PageEvent, u64)> {
    vec![
        // Scroll burst: the spy should coalesce these into one tick
        (PageEvent::scroll(120.0), 10),
        (PageEvent::scroll(300.0), 10),
        (PageEvent::scroll(480.0), 120),
        // Settle on the about section; its text reveals
        (PageEvent::scroll(620.0), 100),
        (PageEvent::intersection("about-text", 0.25), 80),
        (PageEvent::intersection("section-title", 0.4), 80),
        // Counters come into view half-visible
        (PageEvent::intersection("years-counter", 0.8), 60),
        (PageEvent::intersection("clients-counter", 0.7), 60),
        (PageEvent::intersection("projects-counter", 0.6), 200),
        // Scrolling back up and down again must not re-fire anything
        (PageEvent::scroll(100.0), 100),
        (PageEvent::scroll(1500.0), 100),
        (PageEvent::intersection("years-counter", 0.9), 80),
        (PageEvent::intersection("business-card-textiles", 0.3), 60),
        (PageEvent::intersection("business-card-steels", 0.3), 120),
        // Contact form: filled out and submitted, with an eager double click
        (PageEvent::scroll(2300.0), 100),
        (
            PageEvent::field_input("contactForm", "name", "Priya Raman"),
            30,
        ),
        (
            PageEvent::field_input("contactForm", "email", "priya@example.com"),
            30,
        ),
        (
            PageEvent::field_input("contactForm", "phone", "+91 (44) 2345-6789"),
            30,
        ),
        (
            PageEvent::field_input("contactForm", "subject", "Steel catalogue"),
            30,
        ),
        (
            PageEvent::field_input(
                "contactForm",
                "message",
                "Please send your current steel product catalogue.",
            ),
            30,
        ),
        (PageEvent::submit("contactForm"), 5),
        // Double click while the first request is in flight: ignored
        (PageEvent::submit("contactForm"), 300),
        // Newsletter: an invalid address first, then a valid one
        (
            PageEvent::field_input("newsletterForm", "email", "not-an-email"),
            30,
        ),
        (PageEvent::submit("newsletterForm"), 100),
        (
            PageEvent::field_input("newsletterForm", "email", "priya@example.com"),
            30,
        ),
        (PageEvent::submit("newsletterForm"), 300),
        // Interest area drives the prefilled WhatsApp template
        (
            PageEvent::InterestSelected {
                timestamp: chrono::Utc::now(),
                value: "gk_textiles".to_string(),
            },
            50,
        ),
        (
            PageEvent::WhatsAppClicked {
                timestamp: chrono::Utc::now(),
            },
            50,
        ),
        // Dark theme toggle persists the preference
        (
            PageEvent::ThemeToggled {
                timestamp: chrono::Utc::now(),
            },
            50,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::endpoint::{FormEndpoint, HttpEndpoint, SubmitBody, SubmitRequest};

    #[tokio::test]
    async fn test_stub_contact_round_trip() {
        let (addr, server) = spawn_stub_collaborator().await.unwrap();
        let endpoint = HttpEndpoint::new(format!("http://{addr}"));

        let response = endpoint
            .submit(SubmitRequest {
                url: "/api/contact/".to_string(),
                body: SubmitBody::FormEncoded(vec![
                    ("name".to_string(), "Priya".to_string()),
                    ("email".to_string(), "priya@example.com".to_string()),
                    ("csrfmiddlewaretoken".to_string(), DEMO_CSRF_TOKEN.to_string()),
                ]),
                csrf_token: Some(DEMO_CSRF_TOKEN.to_string()),
            })
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.message.unwrap().contains("GK Group"));
        server.abort();
    }

    #[tokio::test]
    async fn test_stub_newsletter_rejects_duplicate() {
        let (addr, server) = spawn_stub_collaborator().await.unwrap();
        let endpoint = HttpEndpoint::new(format!("http://{addr}"));

        let response = endpoint
            .submit(SubmitRequest {
                url: "/api/newsletter/".to_string(),
                body: SubmitBody::Json(serde_json::json!({"email": "taken@example.com"})),
                csrf_token: None,
            })
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(
            response.errors["email"],
            vec!["This address is already subscribed."]
        );
        server.abort();
    }

    #[test]
    fn test_fixture_targets_exist_on_page() {
        let config = Config::default();
        let page = build_page(&config);
        for target in reveal_targets() {
            assert!(
                page.elements.contains_key(&target.element_id),
                "fixture missing element {}",
                target.element_id
            );
        }
        assert!(page.form("contactForm").is_some());
        assert!(page.form("newsletterForm").is_some());
    }
}
