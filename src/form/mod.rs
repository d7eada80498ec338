// Form controller - owns the submit lifecycle for contact and newsletter forms
//
// State machine per form instance: Idle -> Submitting -> Success | Error,
// with Success/Error decaying back to Idle when the notice auto-dismisses.
// The Submitting guard is the re-entrancy rule: a submit event while a
// request is in flight is a logged no-op, so a form can never have two
// requests outstanding. Submissions run in their own task so scroll,
// intersections and other forms stay live while one is in flight.

pub mod endpoint;
pub mod validate;

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analytics::Analytics;
use crate::config::FormConfig;
use crate::events::SessionStats;
use crate::page::{FormKind, NoticeKind, SharedPage, SubmitStatus};
use crate::prefs::{PreferenceStore, WHATSAPP_MESSAGE_KEY};
use endpoint::{FormEndpoint, SubmitBody, SubmitRequest};

/// User-initiated events routed to the controller
#[derive(Debug, Clone)]
pub enum FormEvent {
    Submit {
        form_id: String,
    },
    FieldInput {
        form_id: String,
        field: String,
        value: String,
    },
    InterestSelected {
        value: String,
    },
    WhatsAppClicked,
}

/// What a submit event turned into, for tests and logging
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Unknown form or already Submitting
    Ignored,
    /// Client-side validation failed; no request was issued
    ValidationFailed,
    /// A request is in flight on the returned task
    Started(JoinHandle<()>),
}

/// Prefilled WhatsApp message for an interest area; unknown areas fall back
/// to the general inquiry template.
pub fn whatsapp_template(interest_area: &str) -> &'static str {
    match interest_area {
        "gk_textiles" => {
            "Hello GK Group! I'm interested in your textile products. \
             Could you please provide more information?"
        }
        "gk_steels" => {
            "Hello GK Group! I'm interested in your steel products. \
             Could you please provide more information?"
        }
        "partnership" => "Hello GK Group! I'm interested in discussing partnership opportunities.",
        "feedback" => "Hello GK Group! I would like to provide some feedback.",
        _ => "Hello GK Group! I have a general inquiry. Could you please assist me?",
    }
}

pub struct FormController {
    config: FormConfig,
    page: SharedPage,
    endpoint: Arc<dyn FormEndpoint>,
    analytics: Arc<dyn Analytics>,
    prefs: PreferenceStore,
    stats: Arc<Mutex<SessionStats>>,
}

impl FormController {
    pub fn new(
        config: FormConfig,
        page: SharedPage,
        endpoint: Arc<dyn FormEndpoint>,
        analytics: Arc<dyn Analytics>,
        prefs: PreferenceStore,
        stats: Arc<Mutex<SessionStats>>,
    ) -> Self {
        Self {
            config,
            page,
            endpoint,
            analytics,
            prefs,
            stats,
        }
    }

    /// Consume form events until the channel closes.
    pub async fn run(self, mut rx: mpsc::Receiver<FormEvent>) -> anyhow::Result<()> {
        while let Some(event) = rx.recv().await {
            match event {
                FormEvent::Submit { form_id } => {
                    self.handle_submit(&form_id);
                }
                FormEvent::FieldInput {
                    form_id,
                    field,
                    value,
                } => self.handle_field_input(&form_id, &field, value),
                FormEvent::InterestSelected { value } => self.handle_interest_selected(&value),
                FormEvent::WhatsAppClicked => self.handle_whatsapp_click(),
            }
        }
        tracing::debug!("Form controller detached");
        Ok(())
    }

    /// Start (or refuse) a submission for one form.
    pub fn handle_submit(&self, form_id: &str) -> SubmitOutcome {
        // Phase one under the lock: guard, validate, transition to Submitting
        // and snapshot the outgoing request.
        let request = {
            let mut page = self.page.lock().unwrap();
            let Some(form) = page.form_mut(form_id) else {
                tracing::warn!(form_id, "submit for unknown form ignored");
                return SubmitOutcome::Ignored;
            };

            if form.status == SubmitStatus::Submitting {
                tracing::debug!(form_id, "submit ignored: request already in flight");
                return SubmitOutcome::Ignored;
            }

            form.clear_errors();
            self.stats.lock().unwrap().submissions_attempted += 1;

            let errors = validate::validate(form);
            if !errors.is_empty() {
                tracing::debug!(form_id, fields = errors.len(), "validation failed");
                form.apply_field_errors(&errors);
                return SubmitOutcome::ValidationFailed;
            }

            form.status = SubmitStatus::Submitting;
            form.submit_disabled = true;

            let body = match form.kind {
                FormKind::Contact => {
                    let mut pairs = form.values();
                    if let Some(token) = &form.csrf_token {
                        pairs.push(("csrfmiddlewaretoken".to_string(), token.clone()));
                    }
                    SubmitBody::FormEncoded(pairs)
                }
                FormKind::Newsletter => {
                    let email = form
                        .field("email")
                        .map(|f| f.value.clone())
                        .unwrap_or_default();
                    SubmitBody::Json(serde_json::json!({ "email": email }))
                }
            };

            SubmitRequest {
                url: form.action.clone(),
                body,
                csrf_token: form.csrf_token.clone(),
            }
        };

        // Phase two off the lock: the network call and its continuation.
        let controller = SubmissionTask {
            config: self.config.clone(),
            page: self.page.clone(),
            endpoint: self.endpoint.clone(),
            analytics: self.analytics.clone(),
            stats: self.stats.clone(),
            form_id: form_id.to_string(),
        };
        SubmitOutcome::Started(tokio::spawn(controller.run(request)))
    }

    /// Editing a field updates its value and clears its error list.
    pub fn handle_field_input(&self, form_id: &str, field_name: &str, value: String) {
        let mut page = self.page.lock().unwrap();
        if let Some(field) = page
            .form_mut(form_id)
            .and_then(|form| form.field_mut(field_name))
        {
            field.value = value;
            field.errors.clear();
        }
    }

    /// Persist the prefilled WhatsApp message for the selected interest area.
    pub fn handle_interest_selected(&self, interest_area: &str) {
        let message = whatsapp_template(interest_area);
        self.prefs.set(WHATSAPP_MESSAGE_KEY, &message);
        tracing::debug!(interest_area, "whatsapp template updated");
    }

    /// Best-effort click tracking on the floating WhatsApp button.
    pub fn handle_whatsapp_click(&self) {
        let link = format!(
            "https://wa.me/{}",
            crate::util::digits_only(&self.config.whatsapp_number)
        );
        tracing::debug!(link, "whatsapp button clicked");
        self.analytics
            .track("whatsapp_click", "engagement", "social_media");
    }
}

/// Owned continuation of one in-flight submission
struct SubmissionTask {
    config: FormConfig,
    page: SharedPage,
    endpoint: Arc<dyn FormEndpoint>,
    analytics: Arc<dyn Analytics>,
    stats: Arc<Mutex<SessionStats>>,
    form_id: String,
}

impl SubmissionTask {
    async fn run(self, request: SubmitRequest) {
        let result = self.endpoint.submit(request).await;

        let notice_id = {
            let mut page = self.page.lock().unwrap();
            let Some(form) = page.form_mut(&self.form_id) else {
                return; // form unmounted while in flight
            };
            form.submit_disabled = false;

            match result {
                Ok(response) if response.success => {
                    form.status = SubmitStatus::Success;
                    form.clear_values();
                    let kind = form.kind;
                    let message = response
                        .message
                        .unwrap_or_else(|| "Thank you! Your message has been sent.".to_string());
                    self.stats.lock().unwrap().submissions_succeeded += 1;
                    self.track_conversion(kind);
                    page.push_notice(NoticeKind::Success, message)
                }
                Ok(response) => {
                    // Collaborator reported failure: keep entered values,
                    // surface the general message plus any field errors.
                    form.status = SubmitStatus::Error;
                    form.apply_field_errors(&response.errors);
                    let message = response
                        .message
                        .unwrap_or_else(|| "An error occurred. Please try again.".to_string());
                    self.stats.lock().unwrap().submissions_rejected += 1;
                    page.push_notice(NoticeKind::Danger, message)
                }
                Err(error) => {
                    tracing::error!(form_id = %self.form_id, "submission failed: {error}");
                    form.status = SubmitStatus::Error;
                    let message = error.notice_message();
                    self.stats.lock().unwrap().submissions_rejected += 1;
                    page.push_notice(NoticeKind::Danger, message)
                }
            }
        };

        self.dismiss_later(notice_id).await;
    }

    fn track_conversion(&self, kind: FormKind) {
        let event = match kind {
            FormKind::Contact => "contact_form_submitted",
            FormKind::Newsletter => "newsletter_signup",
        };
        self.analytics.track(event, "engagement", "form_submission");
    }

    /// Auto-dismiss the transient notice and decay Success/Error back to
    /// Idle. Field values are untouched: an Error form keeps what the user
    /// typed.
    async fn dismiss_later(self, notice_id: u64) {
        tokio::time::sleep(Duration::from_millis(self.config.notice_dismiss_ms)).await;
        let mut page = self.page.lock().unwrap();
        page.remove_notice(notice_id);
        if let Some(form) = page.form_mut(&self.form_id) {
            if matches!(form.status, SubmitStatus::Success | SubmitStatus::Error) {
                form.status = SubmitStatus::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::RecordingAnalytics;
    use crate::error::{FieldErrors, PageError};
    use crate::form::endpoint::FormResponse;
    use crate::page::{self, FieldKind, FieldModel, FormModel, PageModel};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    enum Behavior {
        Respond(FormResponse),
        NetworkError,
        /// Hold the request until notified, then respond
        Hold(Arc<Notify>, FormResponse),
    }

    struct MockEndpoint {
        calls: AtomicUsize,
        behavior: Behavior,
    }

    impl MockEndpoint {
        fn respond(response: FormResponse) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                behavior: Behavior::Respond(response),
            })
        }

        fn network_error() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                behavior: Behavior::NetworkError,
            })
        }

        fn held(gate: Arc<Notify>, response: FormResponse) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                behavior: Behavior::Hold(gate, response),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FormEndpoint for MockEndpoint {
        async fn submit(&self, _request: SubmitRequest) -> Result<FormResponse, PageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Respond(response) => Ok(response.clone()),
                Behavior::NetworkError => {
                    Err(PageError::Network("connection reset".to_string()))
                }
                Behavior::Hold(gate, response) => {
                    gate.notified().await;
                    Ok(response.clone())
                }
            }
        }
    }

    fn newsletter_page() -> SharedPage {
        let mut model = PageModel::new();
        model.add_form(
            FormModel::new("newsletterForm", FormKind::Newsletter, "/api/newsletter/")
                .with_csrf_token("token-123")
                .with_field(FieldModel::new("email", FieldKind::Email, true)),
        );
        page::shared(model)
    }

    fn contact_page() -> SharedPage {
        let mut model = PageModel::new();
        model.add_form(
            FormModel::new("contactForm", FormKind::Contact, "/api/contact/")
                .with_csrf_token("token-123")
                .with_field(FieldModel::new("name", FieldKind::Text, true))
                .with_field(FieldModel::new("email", FieldKind::Email, true))
                .with_field(FieldModel::new("message", FieldKind::TextArea, true)),
        );
        page::shared(model)
    }

    fn controller(
        page: SharedPage,
        endpoint: Arc<MockEndpoint>,
    ) -> (FormController, Arc<RecordingAnalytics>) {
        let analytics = Arc::new(RecordingAnalytics::default());
        let controller = FormController::new(
            FormConfig {
                // Short dismiss so decay is observable in tests
                notice_dismiss_ms: 20,
                ..Default::default()
            },
            page,
            endpoint,
            analytics.clone(),
            PreferenceStore::in_memory(),
            Arc::new(Mutex::new(SessionStats::default())),
        );
        (controller, analytics)
    }

    fn fill_contact(page: &SharedPage) {
        let mut page = page.lock().unwrap();
        let form = page.form_mut("contactForm").unwrap();
        form.field_mut("name").unwrap().value = "Priya".to_string();
        form.field_mut("email").unwrap().value = "user@example.com".to_string();
        form.field_mut("message").unwrap().value = "Catalogue please.".to_string();
    }

    #[tokio::test]
    async fn test_invalid_email_sends_no_request() {
        let page = newsletter_page();
        let endpoint = MockEndpoint::respond(FormResponse::ok("Subscribed"));
        let (controller, _) = controller(page.clone(), endpoint.clone());

        page.lock()
            .unwrap()
            .form_mut("newsletterForm")
            .unwrap()
            .field_mut("email")
            .unwrap()
            .value = "not-an-email".to_string();

        let outcome = controller.handle_submit("newsletterForm");
        assert!(matches!(outcome, SubmitOutcome::ValidationFailed));
        assert_eq!(endpoint.call_count(), 0);

        let page = page.lock().unwrap();
        let form = page.form("newsletterForm").unwrap();
        assert_eq!(form.status, SubmitStatus::Idle);
        assert!(!form.field("email").unwrap().errors.is_empty());
    }

    #[tokio::test]
    async fn test_success_clears_fields_and_shows_notice() {
        let page = contact_page();
        let endpoint = MockEndpoint::respond(FormResponse::ok("Thanks"));
        let (controller, analytics) = controller(page.clone(), endpoint);
        fill_contact(&page);

        let SubmitOutcome::Started(handle) = controller.handle_submit("contactForm") else {
            panic!("expected submission to start");
        };

        // Poll until the in-flight continuation lands (before dismiss)
        let mut saw_success = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            let page = page.lock().unwrap();
            let form = page.form("contactForm").unwrap();
            if form.status == SubmitStatus::Success {
                assert_eq!(form.field("name").unwrap().value, "");
                assert_eq!(page.notices.len(), 1);
                assert_eq!(page.notices[0].kind, NoticeKind::Success);
                assert_eq!(page.notices[0].message, "Thanks");
                saw_success = true;
                break;
            }
        }
        assert!(saw_success, "form never reached Success");
        assert_eq!(
            *analytics.events.lock().unwrap(),
            vec!["contact_form_submitted"]
        );

        // After the dismiss timeout the notice is gone and status decays
        handle.await.unwrap();
        let page = page.lock().unwrap();
        assert!(page.notices.is_empty());
        assert_eq!(page.form("contactForm").unwrap().status, SubmitStatus::Idle);
    }

    #[tokio::test]
    async fn test_rejection_preserves_values_and_marks_field() {
        let page = newsletter_page();
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), vec!["Invalid".to_string()]);
        let endpoint = MockEndpoint::respond(FormResponse::rejected("Please fix", errors));
        let (controller, analytics) = controller(page.clone(), endpoint);

        page.lock()
            .unwrap()
            .form_mut("newsletterForm")
            .unwrap()
            .field_mut("email")
            .unwrap()
            .value = "user@example.com".to_string();

        let SubmitOutcome::Started(handle) = controller.handle_submit("newsletterForm") else {
            panic!("expected submission to start");
        };

        let mut saw_error = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            let page = page.lock().unwrap();
            let form = page.form("newsletterForm").unwrap();
            if form.status == SubmitStatus::Error {
                assert_eq!(form.field("email").unwrap().value, "user@example.com");
                assert_eq!(form.field("email").unwrap().errors, vec!["Invalid"]);
                assert_eq!(page.notices[0].kind, NoticeKind::Danger);
                saw_error = true;
                break;
            }
        }
        assert!(saw_error, "form never reached Error");
        assert!(analytics.events.lock().unwrap().is_empty());

        // Decay to Idle keeps the entered value
        handle.await.unwrap();
        let page = page.lock().unwrap();
        let form = page.form("newsletterForm").unwrap();
        assert_eq!(form.status, SubmitStatus::Idle);
        assert_eq!(form.field("email").unwrap().value, "user@example.com");
    }

    #[tokio::test]
    async fn test_network_error_shows_retry_notice() {
        let page = contact_page();
        let endpoint = MockEndpoint::network_error();
        let (controller, _) = controller(page.clone(), endpoint);
        fill_contact(&page);

        let SubmitOutcome::Started(handle) = controller.handle_submit("contactForm") else {
            panic!("expected submission to start");
        };
        handle.await.unwrap();

        // Values survived the failed round trip
        let page = page.lock().unwrap();
        let form = page.form("contactForm").unwrap();
        assert_eq!(form.field("name").unwrap().value, "Priya");
    }

    #[tokio::test]
    async fn test_submit_while_submitting_is_ignored() {
        let page = contact_page();
        let gate = Arc::new(Notify::new());
        let endpoint = MockEndpoint::held(gate.clone(), FormResponse::ok("Thanks"));
        let (controller, _) = controller(page.clone(), endpoint.clone());
        fill_contact(&page);

        let SubmitOutcome::Started(handle) = controller.handle_submit("contactForm") else {
            panic!("expected submission to start");
        };

        // Wait for the guard to be visible, then try again
        for _ in 0..50 {
            if page.lock().unwrap().form("contactForm").unwrap().status
                == SubmitStatus::Submitting
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(page.lock().unwrap().form("contactForm").unwrap().submit_disabled);
        let second = controller.handle_submit("contactForm");
        assert!(matches!(second, SubmitOutcome::Ignored));

        gate.notify_one();
        handle.await.unwrap();
        assert_eq!(endpoint.call_count(), 1);
    }

    #[tokio::test]
    async fn test_field_input_clears_only_that_fields_errors() {
        let page = contact_page();
        let endpoint = MockEndpoint::respond(FormResponse::ok("Thanks"));
        let (controller, _) = controller(page.clone(), endpoint);

        {
            let mut page = page.lock().unwrap();
            let form = page.form_mut("contactForm").unwrap();
            form.field_mut("name").unwrap().errors = vec!["This field is required.".to_string()];
            form.field_mut("email").unwrap().errors = vec!["Invalid".to_string()];
        }

        controller.handle_field_input("contactForm", "name", "Priya".to_string());

        let page = page.lock().unwrap();
        let form = page.form("contactForm").unwrap();
        assert!(form.field("name").unwrap().errors.is_empty());
        assert_eq!(form.field("name").unwrap().value, "Priya");
        assert_eq!(form.field("email").unwrap().errors, vec!["Invalid"]);
    }

    #[tokio::test]
    async fn test_interest_selection_persists_template() {
        let page = contact_page();
        let endpoint = MockEndpoint::respond(FormResponse::ok("Thanks"));
        let analytics = Arc::new(RecordingAnalytics::default());
        let prefs = PreferenceStore::in_memory();
        let controller = FormController::new(
            FormConfig::default(),
            page,
            endpoint,
            analytics,
            prefs.clone(),
            Arc::new(Mutex::new(SessionStats::default())),
        );

        controller.handle_interest_selected("gk_steels");
        let stored: String = prefs.get(WHATSAPP_MESSAGE_KEY, String::new());
        assert!(stored.contains("steel products"));

        // Unknown areas fall back to the general template
        controller.handle_interest_selected("mystery");
        let stored: String = prefs.get(WHATSAPP_MESSAGE_KEY, String::new());
        assert!(stored.contains("general inquiry"));
    }
}
