// src/formatting/messages.rs
//! Slack messages for each report.

use super::{escape_mrkdwn, TemplateSet};
use crate::error::AppError;
use crate::model::PageSummary;
use crate::slack::ChatMessage;
use serde_json::json;

/// A Block Kit card announcing one page, with a plain-text fallback.
pub fn announcement(templates: &TemplateSet, summary: &PageSummary) -> Result<ChatMessage, AppError> {
    let title = escape_mrkdwn(summary.title());
    let author = escape_mrkdwn(&summary.author);
    let text = templates.render(
        "announcement",
        &json!({ "title": title, "author": author, "url": summary.url() }),
    )?;

    let blocks = vec![
        json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": "📄 *New article published!*" }
        }),
        json!({
            "type": "section",
            "fields": [
                { "type": "mrkdwn", "text": format!("*📝 Article:*\n<{}|{}>", summary.url(), title) },
                { "type": "mrkdwn", "text": format!("*✍️ Author:*\n{}", author) }
            ]
        }),
        json!({ "type": "divider" }),
    ];

    Ok(ChatMessage::text(text.trim_end()).with_blocks(blocks))
}

/// One message listing every page created inside the window, or a notice
/// that there were none.
pub fn digest(
    templates: &TemplateSet,
    pages: &[PageSummary],
    min_age_days: i64,
    max_age_days: i64,
) -> Result<ChatMessage, AppError> {
    let text = if pages.is_empty() {
        templates.render(
            "nothing_found",
            &json!({ "min_age": min_age_days, "max_age": max_age_days }),
        )?
    } else {
        let entries: Vec<_> = pages
            .iter()
            .map(|p| {
                json!({
                    "title": escape_mrkdwn(p.title()),
                    "url": p.url(),
                    "author": escape_mrkdwn(&p.author),
                })
            })
            .collect();
        templates.render(
            "digest",
            &json!({ "min_age": min_age_days, "max_age": max_age_days, "pages": entries }),
        )?
    };
    Ok(ChatMessage::text(text.trim_end()))
}

pub fn error_notice(templates: &TemplateSet, error: &str) -> Result<ChatMessage, AppError> {
    let text = templates.render("error_notice", &json!({ "error": escape_mrkdwn(error) }))?;
    Ok(ChatMessage::text(text.trim_end()))
}

/// How many stale pages were found, with a link to the full report.
pub fn stale_count(
    templates: &TemplateSet,
    count: usize,
    months: i64,
    artifact_url: Option<&str>,
) -> Result<ChatMessage, AppError> {
    let period = if months == 12 {
        "a year".to_string()
    } else {
        format!("{} months", months)
    };
    let text = templates.render(
        "stale_count",
        &json!({ "count": count, "period": period, "artifact_url": artifact_url }),
    )?;
    Ok(ChatMessage::text(text.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Page;
    use crate::types::NotionId;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn summary(n: u32, title: &str, author: &str) -> PageSummary {
        PageSummary {
            page: Page::new(NotionId::parse(&format!("{:032x}", n)).unwrap(), title, Utc::now()),
            author: author.into(),
            last_editor: author.into(),
        }
    }

    #[test]
    fn announcement_is_a_block_kit_card() {
        let templates = TemplateSet::new().unwrap();
        let message = announcement(&templates, &summary(1, "Q3 <Plan>", "Ada")).unwrap();

        let blocks = message.blocks.unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["text"]["text"], "📄 *New article published!*");
        assert_eq!(
            blocks[1]["fields"][0]["text"],
            "*📝 Article:*\n<https://www.notion.so/00000000000000000000000000000001|Q3 &lt;Plan&gt;>"
        );
        assert_eq!(blocks[1]["fields"][1]["text"], "*✍️ Author:*\nAda");
        assert_eq!(blocks[2]["type"], "divider");
        assert!(message.text.contains("Q3 &lt;Plan&gt;"));
    }

    #[test]
    fn digest_lists_every_page() {
        let templates = TemplateSet::new().unwrap();
        let pages = vec![summary(1, "Alpha", "Ada"), summary(2, "Beta", "Grace")];
        let message = digest(&templates, &pages, 7, 21).unwrap();

        assert!(message
            .text
            .starts_with("🆕 *Pages created 7-21 days ago (biweekly report):*"));
        assert!(message.text.contains(
            "📘 *Alpha*\n🔗 https://www.notion.so/00000000000000000000000000000001\n✍️ Ada"
        ));
        assert!(message.text.contains("📘 *Beta*"));
        assert!(message.blocks.is_none());
    }

    #[test]
    fn empty_digest_says_so() {
        let templates = TemplateSet::new().unwrap();
        let message = digest(&templates, &[], 7, 21).unwrap();
        assert_eq!(
            message.text,
            "❗ No pages found created between 7 and 21 days ago."
        );
    }

    #[test]
    fn stale_count_links_the_report_when_given() {
        let templates = TemplateSet::new().unwrap();
        let with_link = stale_count(&templates, 4, 12, Some("https://ci/run/1")).unwrap();
        assert_eq!(
            with_link.text,
            "📄 Found *4* pages in Notion that haven't been edited for over a year.\n📎 Full report: https://ci/run/1"
        );

        let without = stale_count(&templates, 2, 6, None).unwrap();
        assert_eq!(
            without.text,
            "📄 Found *2* pages in Notion that haven't been edited for over 6 months."
        );
    }

    #[test]
    fn error_notice_wraps_the_message() {
        let templates = TemplateSet::new().unwrap();
        let message = error_notice(&templates, "boom").unwrap();
        assert_eq!(message.text, "❌ Script error: boom");
    }
}
