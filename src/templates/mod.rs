//! Embedded notification templates.
//!
//! The first line of each template is `Subject: ...`, the rest is the
//! body. Placeholders: `{organization}`, `{space}`, `{days}`, `{purge_date}`.

use chrono::NaiveDate;

/// Warning sent to spaces approaching the purge threshold.
pub(crate) const NOTIFY_TXT: &str = include_str!("notify.txt");

/// Notice sent after a space has been purged and recreated.
pub(crate) const PURGED_TXT: &str = include_str!("purged.txt");

/// Values substituted into a template.
#[derive(Debug, Clone)]
pub(crate) struct TemplateContext<'a> {
    pub organization: &'a str,
    pub space: &'a str,
    pub days: u32,
    pub purge_date: NaiveDate,
}

/// A rendered mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub subject: String,
    pub body: String,
}

/// Fill in placeholders and split off the subject line.
pub(crate) fn render(template: &str, ctx: &TemplateContext<'_>) -> Rendered {
    let filled = template
        .replace("{organization}", ctx.organization)
        .replace("{space}", ctx.space)
        .replace("{days}", &ctx.days.to_string())
        .replace("{purge_date}", &ctx.purge_date.format("%Y-%m-%d").to_string());

    let (first, body) = filled.split_once('\n').unwrap_or((filled.as_str(), ""));
    match first.strip_prefix("Subject:") {
        Some(subject) => Rendered {
            subject: subject.trim().to_string(),
            body: body.to_string(),
        },
        None => Rendered {
            subject: String::new(),
            body: filled.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext<'static> {
        TemplateContext {
            organization: "sandbox-agency",
            space: "jane.doe",
            days: 90,
            purge_date: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
        }
    }

    #[test]
    fn test_render_notify() {
        let mail = render(NOTIFY_TXT, &ctx());
        assert_eq!(
            mail.subject,
            "Your sandbox space jane.doe will be reset on 2024-07-04"
        );
        assert!(mail.body.contains("\"sandbox-agency\""));
        assert!(mail.body.contains("90 days"));
        assert!(!mail.body.contains('{'));
    }

    #[test]
    fn test_render_purged() {
        let mail = render(PURGED_TXT, &ctx());
        assert_eq!(mail.subject, "Your sandbox space jane.doe has been reset");
        assert!(mail.body.contains("reset on 2024-07-04"));
        assert!(!mail.body.contains('{'));
    }

    #[test]
    fn test_render_without_subject_line() {
        let mail = render("Space {space} only", &ctx());
        assert!(mail.subject.is_empty());
        assert_eq!(mail.body, "Space jane.doe only");
    }
}
