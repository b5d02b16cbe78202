//! Dashboard rendering: HTML page, HTML fragment, plain text.
//!
//! Rendering only formats projected rows; every visibility decision has
//! already been made by the projector.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::projector::{Dashboard, DisplayRow, RowKind};

/// Text colour for disconnected PVs.
pub const DISCONNECTED_COLOR: &str = "BlueViolet";

/// Text colour for active alarms.
pub const ALARM_COLOR: &str = "red";

/// Placeholder shown instead of a withheld value.
pub const UNAVAILABLE_TEXT: &str = "Unavailable";

const NBSP2: &str = "&nbsp;&nbsp;";

/// Page-level settings for `render_page`.
#[derive(Debug, Clone)]
pub struct PageOptions<'a> {
    /// Instrument name shown as the page heading.
    pub instrument: &'a str,
    /// Browser auto-refresh interval; `None` disables refresh.
    pub refresh_secs: Option<u64>,
    /// Time the snapshot was fetched.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================
// HTML
// ============================================================

/// Renders one row as an `<li>` element.
pub fn render_row_html(row: &DisplayRow) -> String {
    let mut li = format!("<li>{}:{NBSP2}", escape_html(&row.label));
    match row.kind {
        RowKind::Disconnected => {
            let _ = write!(
                li,
                "<span class=\"disconnected\" style=\"color:{DISCONNECTED_COLOR}\">DISCONNECTED</span>"
            );
        }
        RowKind::Suppressed => {
            let _ = write!(li, "<i class=\"unavailable\">{UNAVAILABLE_TEXT}</i>");
        }
        RowKind::Value => {
            li.push_str(&escape_html(row.value.as_deref().unwrap_or_default()));
            if let Some(alarm) = &row.alarm {
                let _ = write!(
                    li,
                    "{NBSP2}<span class=\"alarm\" style=\"color:{ALARM_COLOR}\">({})</span>",
                    escape_html(alarm)
                );
            }
        }
    }
    li.push_str("</li>");
    li
}

/// Renders the dashboard body: instrument, configuration, groups, run information.
pub fn render_fragment(dashboard: &Dashboard, instrument: &str) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<h1 id=\"inst_name\">{}</h1>", escape_html(instrument));
    let _ = writeln!(
        html,
        "<p id=\"config_name\">Configuration: {}</p>",
        escape_html(&dashboard.config_name)
    );

    html.push_str("<div id=\"groups\">\n");
    for group in &dashboard.groups {
        let _ = writeln!(html, "<h3>{}</h3>", escape_html(&group.label));
        html.push_str("<ul style=\"padding-left:20px\">\n");
        for row in &group.rows {
            html.push_str(&render_row_html(row));
            html.push('\n');
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</div>\n");

    html.push_str("<div id=\"inst_pvs\">\n<h3>Run Information</h3>\n<ul>\n");
    for row in &dashboard.inst_pvs {
        html.push_str(&render_row_html(row));
        html.push('\n');
    }
    html.push_str("</ul>\n</div>\n");
    html
}

/// Renders a complete HTML document for the dashboard.
pub fn render_page(dashboard: &Dashboard, opts: &PageOptions<'_>) -> String {
    let mut body = render_fragment(dashboard, opts.instrument);
    if let Some(ts) = opts.updated_at {
        let _ = writeln!(
            body,
            "<p id=\"updated\"><small>Last updated: {}</small></p>",
            ts.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    page_shell(opts.instrument, opts.refresh_secs, &body)
}

/// Page shown before the first snapshot arrives or while the feed is down.
pub fn render_unavailable_page(instrument: &str, message: &str, refresh_secs: Option<u64>) -> String {
    let body = format!(
        "<h1 id=\"inst_name\">{}</h1>\n<p><i>{}</i></p>\n",
        escape_html(instrument),
        escape_html(message)
    );
    page_shell(instrument, refresh_secs, &body)
}

fn page_shell(instrument: &str, refresh_secs: Option<u64>, body: &str) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    if let Some(secs) = refresh_secs {
        let _ = writeln!(html, "<meta http-equiv=\"refresh\" content=\"{secs}\">");
    }
    let _ = writeln!(
        html,
        "<title>{} Dashboard</title>\n</head>\n<body>",
        escape_html(instrument)
    );
    html.push_str(body);
    html.push_str("</body>\n</html>\n");
    html
}

// ============================================================
// Plain text
// ============================================================

/// Renders one row as `label: value (alarm)`.
pub fn render_row_text(row: &DisplayRow) -> String {
    match row.kind {
        RowKind::Disconnected => format!("{}: DISCONNECTED", row.label),
        RowKind::Suppressed => format!("{}: {UNAVAILABLE_TEXT}", row.label),
        RowKind::Value => {
            let value = row.value.as_deref().unwrap_or_default();
            match &row.alarm {
                Some(alarm) => format!("{}: {value} ({alarm})", row.label),
                None => format!("{}: {value}", row.label),
            }
        }
    }
}

/// Renders the dashboard as indented plain text.
pub fn render_text(dashboard: &Dashboard, instrument: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{instrument}");
    let _ = writeln!(out, "Configuration: {}", dashboard.config_name);
    for group in &dashboard.groups {
        let _ = writeln!(out, "\n{}", group.label);
        for row in &group.rows {
            let _ = writeln!(out, "  {}", render_row_text(row));
        }
    }
    let _ = writeln!(out, "\nRun Information");
    for row in &dashboard.inst_pvs {
        let _ = writeln!(out, "  {}", render_row_text(row));
    }
    out
}
