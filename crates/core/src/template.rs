//! Ticket template rendering.
//!
//! Recurring rules carry a ticket template whose `title` and `description`
//! may contain `{{token}}` placeholders. Rendering substitutes the calendar
//! tokens below and leaves unknown tokens verbatim, so a template author's
//! typo can never crash the scheduler.
//!
//! | Token             | Substitution                              |
//! |-------------------|-------------------------------------------|
//! | `current_month`   | month name in the rule's timezone         |
//! | `current_year`    | 4-digit year                              |
//! | `current_date`    | ISO date (`YYYY-MM-DD`)                   |
//! | `week_number`     | ISO week of year                          |

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::priority::Priority;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Template input / output
// ---------------------------------------------------------------------------

/// The templated ticket payload attached to a recurring rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateData {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub data: serde_json::Value,
}

/// The instant and timezone a template is rendered against.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub now: Timestamp,
    pub timezone: Tz,
}

/// A fully rendered ticket-creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub data: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Substitute `{{name}}` placeholders from a variable list.
///
/// Tokens not present in `vars` are left verbatim.
pub fn render_tokens(input: &str, vars: &[(&str, String)]) -> String {
    let mut out = input.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

/// The calendar variables available to rule templates.
pub fn calendar_vars(ctx: &RenderContext) -> Vec<(&'static str, String)> {
    let local = ctx.now.with_timezone(&ctx.timezone);
    vec![
        ("current_month", local.format("%B").to_string()),
        ("current_year", local.format("%Y").to_string()),
        ("current_date", local.format("%Y-%m-%d").to_string()),
        ("week_number", local.format("%V").to_string()),
    ]
}

/// Render a rule's template into a creatable ticket payload.
///
/// A rule with no template falls back to its own name as the ticket title,
/// so rendering is total: every rule produces a valid draft.
pub fn render(
    template: Option<&TemplateData>,
    rule_name: &str,
    ctx: &RenderContext,
) -> TicketDraft {
    let vars = calendar_vars(ctx);
    match template {
        Some(t) => TicketDraft {
            title: render_tokens(&t.title, &vars),
            description: t
                .description
                .as_deref()
                .map(|d| render_tokens(d, &vars))
                .unwrap_or_default(),
            priority: t.priority,
            data: t.data.clone(),
        },
        None => TicketDraft {
            title: rule_name.to_string(),
            description: String::new(),
            priority: Priority::default(),
            data: serde_json::Value::Object(Default::default()),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ctx_at(y: i32, mo: u32, d: u32) -> RenderContext {
        RenderContext {
            now: Utc.with_ymd_and_hms(y, mo, d, 12, 0, 0).unwrap(),
            timezone: chrono_tz::UTC,
        }
    }

    fn template(title: &str, description: Option<&str>) -> TemplateData {
        TemplateData {
            title: title.to_string(),
            description: description.map(str::to_string),
            priority: Priority::High,
            data: json!({"department": "finance"}),
        }
    }

    #[test]
    fn substitutes_month_and_year() {
        let t = template("Report {{current_month}} {{current_year}}", None);
        let draft = render(Some(&t), "rule", &ctx_at(2024, 2, 1));
        assert_eq!(draft.title, "Report February 2024");
    }

    #[test]
    fn substitutes_date_and_week_number() {
        let t = template("{{current_date}}", Some("week {{week_number}}"));
        let draft = render(Some(&t), "rule", &ctx_at(2024, 2, 1));
        assert_eq!(draft.title, "2024-02-01");
        assert_eq!(draft.description, "week 05");
    }

    #[test]
    fn unknown_token_left_verbatim() {
        let t = template("Report {{foo}}", None);
        let draft = render(Some(&t), "rule", &ctx_at(2024, 2, 1));
        assert_eq!(draft.title, "Report {{foo}}");
    }

    #[test]
    fn priority_and_data_pass_through() {
        let t = template("t", None);
        let draft = render(Some(&t), "rule", &ctx_at(2024, 2, 1));
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.data, json!({"department": "finance"}));
    }

    #[test]
    fn missing_template_falls_back_to_rule_name() {
        let draft = render(None, "Monthly closing", &ctx_at(2024, 2, 1));
        assert_eq!(draft.title, "Monthly closing");
        assert_eq!(draft.description, "");
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.data, json!({}));
    }

    #[test]
    fn month_renders_in_rule_timezone() {
        // 2024-01-31T22:00Z is already February 1st in Riyadh (UTC+3).
        let ctx = RenderContext {
            now: Utc.with_ymd_and_hms(2024, 1, 31, 22, 0, 0).unwrap(),
            timezone: "Asia/Riyadh".parse().unwrap(),
        };
        let t = template("{{current_month}}", None);
        let draft = render(Some(&t), "rule", &ctx);
        assert_eq!(draft.title, "February");
    }

    #[test]
    fn tokens_are_case_sensitive() {
        let t = template("{{Current_Month}}", None);
        let draft = render(Some(&t), "rule", &ctx_at(2024, 2, 1));
        assert_eq!(draft.title, "{{Current_Month}}");
    }

    #[test]
    fn render_tokens_replaces_every_occurrence() {
        let out = render_tokens(
            "{{a}} and {{a}}",
            &[("a", "x".to_string())],
        );
        assert_eq!(out, "x and x");
    }
}
