// Configuration for the interaction layer
//
// Behavior is decoupled from markup: timings, offsets and endpoints arrive
// here as typed configuration instead of being read off CSS selectors.
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/gkpage/config.toml)
// 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scroll-spy tuning
#[derive(Debug, Clone)]
pub struct ScrollSpyConfig {
    /// Fixed header height subtracted from section offsets (px)
    pub header_offset: f64,

    /// Extra slack below the header before a section counts as current (px)
    pub offset_slack: f64,

    /// Quiet interval for coalescing scroll events (ms)
    pub debounce_ms: u64,
}

impl Default for ScrollSpyConfig {
    fn default() -> Self {
        Self {
            header_offset: 80.0,
            offset_slack: 100.0,
            debounce_ms: 50,
        }
    }
}

/// Reveal and counter animation tuning
#[derive(Debug, Clone)]
pub struct RevealConfig {
    /// Intersection ratio that triggers a reveal
    pub threshold: f64,

    /// Intersection ratio that triggers a counter (counters wait until half
    /// visible so the count-up is actually seen)
    pub counter_threshold: f64,

    /// Total counter run time (ms)
    pub counter_duration_ms: u64,

    /// Per-frame step interval (ms), one requestAnimationFrame tick
    pub counter_frame_ms: u64,

    /// Vertical translate distance for the reveal transition (px)
    pub translate_px: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            counter_threshold: 0.5,
            counter_duration_ms: 2000,
            counter_frame_ms: 16,
            translate_px: 30.0,
        }
    }
}

/// Form submission tuning and collaborator endpoints
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// How long success/error notices stay up before auto-dismissing (ms)
    pub notice_dismiss_ms: u64,

    /// Base URL page-relative actions resolve against. Demo mode replaces
    /// this with the stub collaborator's address.
    pub endpoint_base: String,

    /// Contact form collaborator (form-encoded POST)
    pub contact_url: String,

    /// Newsletter collaborator (JSON POST)
    pub newsletter_url: String,

    /// Business WhatsApp number for the floating chat button
    pub whatsapp_number: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            notice_dismiss_ms: 5000,
            // Django dev server default
            endpoint_base: "http://localhost:8000".to_string(),
            contact_url: "/api/contact/".to_string(),
            newsletter_url: "/api/newsletter/".to_string(),
            whatsapp_number: "+91 44 2345 6789".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Also write JSON logs to rotating files
    pub file_enabled: bool,

    /// Directory for log files
    pub file_dir: PathBuf,

    /// Log file name prefix
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
            file_prefix: "gkpage".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory backing the local-storage emulation (one JSON file per key)
    pub storage_dir: PathBuf,

    /// Demo mode: run the scripted browser session against a stub collaborator
    pub demo_mode: bool,

    pub scrollspy: ScrollSpyConfig,
    pub reveal: RevealConfig,
    pub form: FormConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./local-storage"),
            demo_mode: true,
            scrollspy: ScrollSpyConfig::default(),
            reveal: RevealConfig::default(),
            form: FormConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Scroll-spy settings as loaded from the config file
#[derive(Debug, Deserialize, Default)]
struct FileScrollSpy {
    header_offset: Option<f64>,
    offset_slack: Option<f64>,
    debounce_ms: Option<u64>,
}

/// Reveal settings as loaded from the config file
#[derive(Debug, Deserialize, Default)]
struct FileReveal {
    threshold: Option<f64>,
    counter_threshold: Option<f64>,
    counter_duration_ms: Option<u64>,
    counter_frame_ms: Option<u64>,
    translate_px: Option<f64>,
}

/// Form settings as loaded from the config file
#[derive(Debug, Deserialize, Default)]
struct FileForm {
    notice_dismiss_ms: Option<u64>,
    endpoint_base: Option<String>,
    contact_url: Option<String>,
    newsletter_url: Option<String>,
    whatsapp_number: Option<String>,
}

/// Logging settings as loaded from the config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
    file_enabled: Option<bool>,
    file_dir: Option<String>,
    file_prefix: Option<String>,
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    storage_dir: Option<String>,
    demo_mode: Option<bool>,

    scrollspy: Option<FileScrollSpy>,
    reveal: Option<FileReveal>,
    form: Option<FileForm>,
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/gkpage/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("gkpage").join("config.toml"))
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# gkpage configuration
# Uncomment and modify options as needed

# Directory backing the local-storage emulation (default: ./local-storage)
# storage_dir = "./local-storage"

# Demo mode: scripted browser session against a stub collaborator (default: true)
# demo_mode = true

# Scroll-spy tuning
# [scrollspy]
# header_offset = 80.0   # Fixed header height (px)
# offset_slack = 100.0   # Extra slack before a section counts as current (px)
# debounce_ms = 50       # Scroll event quiet interval

# Reveal and counter animations
# [reveal]
# threshold = 0.1            # Intersection ratio that triggers a reveal
# counter_threshold = 0.5    # Intersection ratio that triggers a counter
# counter_duration_ms = 2000 # Counter run time
# counter_frame_ms = 16      # Per-frame interval
# translate_px = 30.0        # Reveal translate distance

# Form submission
# [form]
# notice_dismiss_ms = 5000                 # Success/error banner lifetime
# endpoint_base = "http://localhost:8000"  # Where relative actions resolve
# contact_url = "/api/contact/"            # Contact collaborator
# newsletter_url = "/api/newsletter/"      # Newsletter collaborator
# whatsapp_number = "+91 44 2345 6789"     # Floating chat button target

# Logging configuration
# [logging]
# level = "info"          # trace, debug, info, warn, error (RUST_LOG overrides)
# file_enabled = false    # Also write JSON logs to rotating files
# file_dir = "./logs"
# file_prefix = "gkpage"
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# gkpage configuration

# Directory backing the local-storage emulation
storage_dir = "{storage_dir}"

# Demo mode: scripted browser session against a stub collaborator
demo_mode = {demo}

# Scroll-spy tuning
[scrollspy]
header_offset = {header_offset}
offset_slack = {offset_slack}
debounce_ms = {debounce_ms}

# Reveal and counter animations
[reveal]
threshold = {threshold}
counter_threshold = {counter_threshold}
counter_duration_ms = {counter_duration_ms}
counter_frame_ms = {counter_frame_ms}
translate_px = {translate_px}

# Form submission
[form]
notice_dismiss_ms = {dismiss}
endpoint_base = "{endpoint_base}"
contact_url = "{contact}"
newsletter_url = "{newsletter}"
whatsapp_number = "{whatsapp}"

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
file_enabled = {file_enabled}
file_dir = "{file_dir}"
file_prefix = "{file_prefix}"
"#,
            storage_dir = self.storage_dir.display(),
            demo = self.demo_mode,
            header_offset = self.scrollspy.header_offset,
            offset_slack = self.scrollspy.offset_slack,
            debounce_ms = self.scrollspy.debounce_ms,
            threshold = self.reveal.threshold,
            counter_threshold = self.reveal.counter_threshold,
            counter_duration_ms = self.reveal.counter_duration_ms,
            counter_frame_ms = self.reveal.counter_frame_ms,
            translate_px = self.reveal.translate_px,
            dismiss = self.form.notice_dismiss_ms,
            endpoint_base = self.form.endpoint_base,
            contact = self.form.contact_url,
            newsletter = self.form.newsletter_url,
            whatsapp = self.form.whatsapp_number,
            log_level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display(),
            file_prefix = self.logging.file_prefix,
        )
    }

    /// Load configuration: defaults <- file <- env vars
    pub fn from_env() -> Self {
        let file = Self::load_file_config();
        let defaults = Config::default();

        let storage_dir = std::env::var("GKPAGE_STORAGE_DIR")
            .ok()
            .or(file.storage_dir)
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        let demo_mode = std::env::var("GKPAGE_DEMO")
            .ok()
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .or(file.demo_mode)
            .unwrap_or(defaults.demo_mode);

        let file_spy = file.scrollspy.unwrap_or_default();
        let scrollspy = ScrollSpyConfig {
            header_offset: file_spy
                .header_offset
                .unwrap_or(defaults.scrollspy.header_offset),
            offset_slack: file_spy
                .offset_slack
                .unwrap_or(defaults.scrollspy.offset_slack),
            debounce_ms: file_spy.debounce_ms.unwrap_or(defaults.scrollspy.debounce_ms),
        };

        let file_reveal = file.reveal.unwrap_or_default();
        let reveal = RevealConfig {
            threshold: file_reveal.threshold.unwrap_or(defaults.reveal.threshold),
            counter_threshold: file_reveal
                .counter_threshold
                .unwrap_or(defaults.reveal.counter_threshold),
            counter_duration_ms: file_reveal
                .counter_duration_ms
                .unwrap_or(defaults.reveal.counter_duration_ms),
            counter_frame_ms: file_reveal
                .counter_frame_ms
                .unwrap_or(defaults.reveal.counter_frame_ms),
            translate_px: file_reveal
                .translate_px
                .unwrap_or(defaults.reveal.translate_px),
        };

        let file_form = file.form.unwrap_or_default();
        let form = FormConfig {
            notice_dismiss_ms: file_form
                .notice_dismiss_ms
                .unwrap_or(defaults.form.notice_dismiss_ms),
            endpoint_base: std::env::var("GKPAGE_ENDPOINT_BASE")
                .ok()
                .or(file_form.endpoint_base)
                .unwrap_or(defaults.form.endpoint_base),
            contact_url: std::env::var("GKPAGE_CONTACT_URL")
                .ok()
                .or(file_form.contact_url)
                .unwrap_or(defaults.form.contact_url),
            newsletter_url: std::env::var("GKPAGE_NEWSLETTER_URL")
                .ok()
                .or(file_form.newsletter_url)
                .unwrap_or(defaults.form.newsletter_url),
            whatsapp_number: file_form
                .whatsapp_number
                .unwrap_or(defaults.form.whatsapp_number),
        };

        let file_logging = file.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or(defaults.logging.level),
            file_enabled: file_logging
                .file_enabled
                .unwrap_or(defaults.logging.file_enabled),
            file_dir: file_logging
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(defaults.logging.file_dir),
            file_prefix: file_logging
                .file_prefix
                .unwrap_or(defaults.logging.file_prefix),
        };

        Config {
            storage_dir,
            demo_mode,
            scrollspy,
            reveal,
            form,
            logging,
        }
    }
}
