// Typed page surface - the in-memory stand-in for the rendered document
//
// Components never touch markup or CSS selectors directly; they mutate this
// model through typed handles. A browser bridge (out of scope) would mirror
// these mutations onto real DOM nodes. Each component owns its behavioral
// state; the page model only holds what the page itself would display.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use crate::error::FieldErrors;
use crate::util::generate_id;

/// Shared handle to the page model, one per session
pub type SharedPage = Arc<Mutex<PageModel>>;

/// A `section[id]` with its vertical offset in page coordinates
#[derive(Debug, Clone)]
pub struct Section {
    pub id: String,
    pub top_offset: f64,
}

/// A navigation link pointing at a section id
#[derive(Debug, Clone)]
pub struct NavLink {
    pub target: String,
    pub active: bool,
}

/// An element that reveal/counter animations can mutate
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub classes: BTreeSet<String>,
    pub styles: BTreeMap<String, String>,
    pub text: String,
}

/// Kind of a transient notice banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Danger,
    Info,
}

/// A dismissible notice inserted next to a form (or floating for info)
#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// Submit lifecycle of one form instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

/// What kind of input a field is, for validation purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    TextArea,
}

/// One form field: name, current value, ordered validation errors
#[derive(Debug, Clone)]
pub struct FieldModel {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
    pub errors: Vec<String>,
}

impl FieldModel {
    pub fn new(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            value: String::new(),
            errors: Vec::new(),
        }
    }
}

/// Which endpoint contract a form uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// Full contact form, posted form-encoded
    Contact,
    /// Newsletter signup, posted as JSON `{ "email": ... }`
    Newsletter,
}

/// One mounted form instance
#[derive(Debug, Clone)]
pub struct FormModel {
    pub id: String,
    pub kind: FormKind,
    pub action: String,
    /// Anti-forgery token sourced from the rendered markup
    pub csrf_token: Option<String>,
    pub fields: Vec<FieldModel>,
    pub status: SubmitStatus,
    pub submit_disabled: bool,
}

impl FormModel {
    pub fn new(id: impl Into<String>, kind: FormKind, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            action: action.into(),
            csrf_token: None,
            fields: Vec::new(),
            status: SubmitStatus::default(),
            submit_disabled: false,
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_field(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldModel> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Snapshot of (name, value) pairs in declaration order
    pub fn values(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Reset field values after a successful submission
    pub fn clear_values(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
    }

    /// Drop all validation errors (new submit attempt)
    pub fn clear_errors(&mut self) {
        for field in &mut self.fields {
            field.errors.clear();
        }
    }

    /// Annotate fields with errors from validation or the collaborator.
    /// Unknown field names are ignored; the collaborator may report on
    /// fields this form does not render.
    pub fn apply_field_errors(&mut self, errors: &FieldErrors) {
        for (name, messages) in errors {
            if let Some(field) = self.field_mut(name) {
                field.errors = messages.clone();
            }
        }
    }
}

/// The whole page surface for one session
#[derive(Debug, Default)]
pub struct PageModel {
    pub sections: Vec<Section>,
    pub nav_links: Vec<NavLink>,
    pub elements: BTreeMap<String, Element>,
    pub forms: BTreeMap<String, FormModel>,
    pub notices: Vec<Notice>,
    pub body_classes: BTreeSet<String>,
    active_section: Option<String>,
}

impl PageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_section(&mut self, id: impl Into<String>, top_offset: f64) {
        let id = id.into();
        self.nav_links.push(NavLink {
            target: id.clone(),
            active: false,
        });
        self.sections.push(Section { id, top_offset });
    }

    pub fn add_element(&mut self, id: impl Into<String>, element: Element) {
        self.elements.insert(id.into(), element);
    }

    pub fn add_form(&mut self, form: FormModel) {
        self.forms.insert(form.id.clone(), form);
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    pub fn form(&self, id: &str) -> Option<&FormModel> {
        self.forms.get(id)
    }

    pub fn form_mut(&mut self, id: &str) -> Option<&mut FormModel> {
        self.forms.get_mut(id)
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active_section.as_deref()
    }

    /// Mark exactly one nav link active (or none when above all sections)
    pub fn set_active_section(&mut self, section_id: Option<&str>) {
        self.active_section = section_id.map(str::to_string);
        for link in &mut self.nav_links {
            link.active = Some(link.target.as_str()) == section_id;
        }
    }

    /// Insert a notice, returning its id for later dismissal
    pub fn push_notice(&mut self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        let id = generate_id();
        self.notices.push(Notice {
            id,
            kind,
            message: message.into(),
        });
        id
    }

    /// Remove a notice if it is still present (it may have been dismissed)
    pub fn remove_notice(&mut self, id: u64) {
        self.notices.retain(|n| n.id != id);
    }

    pub fn toggle_body_class(&mut self, class: &str) -> bool {
        if self.body_classes.contains(class) {
            self.body_classes.remove(class);
            false
        } else {
            self.body_classes.insert(class.to_string());
            true
        }
    }
}

/// Create a fresh shared page handle
pub fn shared(page: PageModel) -> SharedPage {
    Arc::new(Mutex::new(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_nav_link_active() {
        let mut page = PageModel::new();
        page.add_section("home", 0.0);
        page.add_section("about", 600.0);
        page.add_section("contact", 1400.0);

        page.set_active_section(Some("about"));
        let active: Vec<_> = page.nav_links.iter().filter(|l| l.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].target, "about");

        page.set_active_section(None);
        assert!(page.nav_links.iter().all(|l| !l.active));
    }

    #[test]
    fn test_field_errors_ignore_unknown_fields() {
        let mut form = FormModel::new("contactForm", FormKind::Contact, "/api/contact/")
            .with_field(FieldModel::new("email", FieldKind::Email, true));

        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), vec!["Invalid".to_string()]);
        errors.insert("missing".to_string(), vec!["ignored".to_string()]);
        form.apply_field_errors(&errors);

        assert_eq!(form.field("email").unwrap().errors, vec!["Invalid"]);
    }

    #[test]
    fn test_clear_values_keeps_fields() {
        let mut form = FormModel::new("contactForm", FormKind::Contact, "/api/contact/")
            .with_field(FieldModel::new("name", FieldKind::Text, true));
        form.field_mut("name").unwrap().value = "Priya".to_string();

        form.clear_values();
        assert_eq!(form.field("name").unwrap().value, "");
    }

    #[test]
    fn test_notice_roundtrip() {
        let mut page = PageModel::new();
        let id = page.push_notice(NoticeKind::Success, "Thanks");
        assert_eq!(page.notices.len(), 1);
        page.remove_notice(id);
        assert!(page.notices.is_empty());
        // Removing twice is harmless
        page.remove_notice(id);
    }

    #[test]
    fn test_toggle_body_class() {
        let mut page = PageModel::new();
        assert!(page.toggle_body_class("dark-theme"));
        assert!(!page.toggle_body_class("dark-theme"));
    }
}
