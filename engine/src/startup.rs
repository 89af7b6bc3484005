//! Startup banner and summary display.

use crate::config::AppConfig;
use crate::queue::types::AutoPromotionConfig;

/// Configuration for startup display.
pub struct StartupConfig {
    pub version: &'static str,
    pub backend: String,
    pub port: u16,
    pub capacity: usize,
    pub scheduler: String,
    pub business_hours: Option<String>,
    pub auth_enabled: bool,
    pub token_count: usize,
    pub captcha_enabled: bool,
    pub runtime: &'static str,
    pub docs_url: Option<String>,
}

impl StartupConfig {
    pub fn new(config: &AppConfig) -> Self {
        let auto = &config.queue.auto_promotion;
        Self {
            version: env!("CARGO_PKG_VERSION"),
            backend: backend_label(config.backend_failure_rate),
            port: config.port,
            capacity: config.queue.max_queue_size,
            scheduler: scheduler_label(auto),
            business_hours: auto.business_hours.enabled.then(|| {
                format!(
                    "{}-{} {}",
                    auto.business_hours.start.format("%H:%M"),
                    auto.business_hours.end.format("%H:%M"),
                    auto.business_hours.timezone.name()
                )
            }),
            auth_enabled: !config.queue.admin_tokens.is_empty(),
            token_count: config.queue.admin_tokens.len(),
            captcha_enabled: config.captcha.is_some(),
            runtime: crate::runtime::runtime_description(),
            docs_url: Some(format!("http://localhost:{}/docs", config.port)),
        }
    }
}

fn backend_label(failure_rate: f64) -> String {
    if failure_rate > 0.0 {
        format!("Mock ({:.0}% failures)", failure_rate * 100.0)
    } else {
        "Mock".to_string()
    }
}

fn scheduler_label(config: &AutoPromotionConfig) -> String {
    if !config.enabled {
        return "Disabled".to_string();
    }
    format!(
        "{} every {}s, max {}",
        config.batch_size,
        config.interval_ms / 1000,
        config.max_concurrent_admitted
    )
}

/// ANSI color codes for terminal output.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
}

/// Check if terminal supports colors.
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    atty::is(atty::Stream::Stdout)
}

/// Print the startup banner with configuration summary.
pub fn print_startup_summary(config: &StartupConfig) {
    let use_color = supports_color();

    let (bold, dim, cyan, green, yellow, blue, magenta, reset) = if use_color {
        (
            colors::BOLD,
            colors::DIM,
            colors::CYAN,
            colors::GREEN,
            colors::YELLOW,
            colors::BLUE,
            colors::MAGENTA,
            colors::RESET,
        )
    } else {
        ("", "", "", "", "", "", "", "")
    };

    let box_width = 57;
    let horizontal = "─".repeat(box_width);

    println!();
    println!("  {cyan}{bold}                _ _                            {reset}");
    println!("  {cyan}{bold} __      ____ _(_) |_ _ __ ___   ___  _ __ ___  {reset}");
    println!("  {cyan}{bold} \\ \\ /\\ / / _` | | __| '__/ _ \\ / _ \\| '_ ` _ \\ {reset}");
    println!("  {cyan}{bold}  \\ V  V / (_| | | |_| | | (_) | (_) | | | | | |{reset}");
    println!("  {cyan}{bold}   \\_/\\_/ \\__,_|_|\\__|_|  \\___/ \\___/|_| |_| |_|{reset}");
    println!();

    println!("  {dim}┌{horizontal}┐{reset}");

    let title = format!("Virtual Waiting Room v{}", config.version);
    let padding = box_width.saturating_sub(title.len());
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;
    println!(
        "  {dim}│{reset}{bold}{:>left_pad$}{title}{:>right_pad$}{reset}{dim}│{reset}",
        "", ""
    );

    println!("  {dim}├{horizontal}┤{reset}");

    print_row(dim, reset, "Backend", &config.backend, green, box_width);
    print_row(
        dim,
        reset,
        "Capacity",
        &config.capacity.to_string(),
        green,
        box_width,
    );

    let scheduler_color = if config.scheduler == "Disabled" { yellow } else { green };
    print_row(dim, reset, "Auto", &config.scheduler, scheduler_color, box_width);

    if let Some(ref hours) = config.business_hours {
        print_row(dim, reset, "Hours", hours, green, box_width);
    }

    let auth_status = if config.auth_enabled {
        format!("Enabled ({} tokens)", config.token_count)
    } else {
        "Disabled".to_string()
    };
    let auth_color = if config.auth_enabled { green } else { yellow };
    print_row(dim, reset, "Auth", &auth_status, auth_color, box_width);

    let (captcha, captcha_color) = if config.captcha_enabled {
        ("reCAPTCHA v3", green)
    } else {
        ("Disabled", yellow)
    };
    print_row(dim, reset, "Captcha", captcha, captcha_color, box_width);

    print_row(dim, reset, "Runtime", config.runtime, blue, box_width);

    println!("  {dim}├{horizontal}┤{reset}");

    print_row(
        dim,
        reset,
        "HTTP",
        &format!("http://0.0.0.0:{}", config.port),
        magenta,
        box_width,
    );

    if let Some(ref docs) = config.docs_url {
        print_row(dim, reset, "Docs", docs, cyan, box_width);
    }

    println!("  {dim}└{horizontal}┘{reset}");
    println!();
}

fn print_row(dim: &str, reset: &str, label: &str, value: &str, color: &str, width: usize) {
    let content = format!("  {}:  {}", label, value);
    let padding = width
        .saturating_sub(content.chars().count())
        .saturating_sub(label.len() + 3);
    println!(
        "  {dim}│{reset} {label}:{color}  {value}{:>padding$}{reset} {dim}│{reset}",
        ""
    );
}
