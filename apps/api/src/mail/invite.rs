//! Interview invitation content and attachment screening.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use super::{MailAttachment, OutgoingMail};

const DEFAULT_CANDIDATE_NAME: &str = "Candidate";
const DEFAULT_ATTACHMENT_TYPE: &str = "application/pdf";

/// Attachment as sent by the HR frontend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAttachment {
    pub name: Option<String>,
    pub content_base64: Option<String>,
    pub content_type: Option<String>,
}

/// Reads the raw `attachments` value leniently: anything but an array yields
/// nothing, and array entries that are not well-formed attachment objects
/// are skipped.
pub fn parse_attachments(raw: Option<&Value>) -> Vec<EmailAttachment> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|entry| entry.is_object())
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect()
}

/// Keeps attachments that carry a name and valid standard base64 content.
pub fn accepted_attachments(attachments: &[EmailAttachment]) -> Vec<MailAttachment> {
    attachments
        .iter()
        .filter_map(|a| {
            let name = a.name.as_deref().filter(|n| !n.trim().is_empty())?;
            let content = a.content_base64.as_deref().filter(|c| !c.is_empty())?;
            STANDARD.decode(content).ok()?;
            Some(MailAttachment {
                file_name: name.to_string(),
                content_base64: content.to_string(),
                content_type: a
                    .content_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ATTACHMENT_TYPE.to_string()),
            })
        })
        .collect()
}

pub fn invite_subject(organization: &str) -> String {
    format!("AI Video Interview Invitation – {organization}")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

pub fn invite_html(candidate_name: Option<&str>, interview_link: &str, organization: &str) -> String {
    let name = candidate_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_CANDIDATE_NAME);
    let name = escape_html(name);
    let link = escape_html(interview_link);
    let org = escape_html(organization);

    format!(
        r#"<p>Hello {name},</p>

<p>Thank you for applying to <b>{org}</b>.</p>

<p>We would like to invite you to complete your interview with our <b>AI-powered interview assistant</b>,
an interactive, proctored, real-time voice-based experience you can take at your convenience.</p>

<p><b>Start your interview:</b><br/>
<a href="{link}" target="_blank" rel="noopener noreferrer">{link}</a></p>

<p><b>Note:</b> This link will remain active for the next <b>72 hours</b>.<br/>
Please complete your interview before the link expires.
The interview needs to be taken on a <b>desktop or laptop</b>, not on a mobile phone.</p>

<p><b>Before you begin</b></p>
<ul>
  <li>Be alone in a quiet, well-lit room where you will not be interrupted.</li>
  <li>Use a stable internet connection and keep your device charged.</li>
  <li>Test your camera and microphone before starting.</li>
  <li>Allow full screen sharing with system audio when prompted.</li>
  <li>Do not refresh or close the browser once the interview has started.</li>
  <li>Complete the interview in one continuous session.</li>
</ul>

<p>Regards,<br/>
<b>{org}</b></p>
"#
    )
}

/// Assembles the complete invitation message.
pub fn build_invite(
    to: &str,
    candidate_name: Option<&str>,
    interview_link: &str,
    organization: &str,
    attachments: &[EmailAttachment],
) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: invite_subject(organization),
        html_body: invite_html(candidate_name, interview_link, organization),
        attachments: accepted_attachments(attachments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attachment(name: Option<&str>, content: Option<&str>) -> EmailAttachment {
        EmailAttachment {
            name: name.map(str::to_string),
            content_base64: content.map(str::to_string),
            content_type: None,
        }
    }

    #[test]
    fn test_subject_names_organization() {
        assert_eq!(
            invite_subject("Acme"),
            "AI Video Interview Invitation – Acme"
        );
    }

    #[test]
    fn test_blank_name_greets_candidate() {
        let html = invite_html(Some("  "), "https://x.test/i/1", "Acme");
        assert!(html.starts_with("<p>Hello Candidate,</p>"));
        let html = invite_html(None, "https://x.test/i/1", "Acme");
        assert!(html.starts_with("<p>Hello Candidate,</p>"));
    }

    #[test]
    fn test_body_contains_link_and_validity() {
        let html = invite_html(Some("Jane Doe"), "https://x.test/i/1?a=1&b=2", "Acme");
        assert!(html.contains("Hello Jane Doe,"));
        assert!(html.contains(r#"href="https://x.test/i/1?a=1&amp;b=2""#));
        assert!(html.contains("72 hours"));
        assert!(html.contains("<b>Acme</b></p>"));
    }

    #[test]
    fn test_name_is_escaped() {
        let html = invite_html(Some("<script>"), "https://x.test", "Acme");
        assert!(html.contains("Hello &lt;script&gt;,"));
    }

    #[test]
    fn test_invalid_attachments_are_dropped() {
        let kept = accepted_attachments(&[
            attachment(Some("JD.pdf"), Some("JVBERi0xLjQ=")),
            attachment(None, Some("JVBERi0xLjQ=")),
            attachment(Some("CV.pdf"), None),
            attachment(Some("bad.pdf"), Some("not base64!!")),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].file_name, "JD.pdf");
        assert_eq!(kept[0].content_type, "application/pdf");
    }

    #[test]
    fn test_malformed_attachment_entries_are_skipped() {
        let raw = json!([
            null,
            "JD.pdf",
            {"name": 7, "contentBase64": "JVBERi0xLjQ="},
            {"name": "CV.pdf", "contentBase64": "JVBERi0xLjQ=", "contentType": "application/pdf"}
        ]);
        let parsed = parse_attachments(Some(&raw));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name.as_deref(), Some("CV.pdf"));
        assert_eq!(accepted_attachments(&parsed).len(), 1);
    }

    #[test]
    fn test_non_array_attachments_are_ignored() {
        assert!(parse_attachments(None).is_empty());
        assert!(parse_attachments(Some(&Value::Null)).is_empty());
        assert!(parse_attachments(Some(&json!({"name": "JD.pdf"}))).is_empty());
    }

    #[test]
    fn test_build_invite() {
        let mail = build_invite("c@example.com", Some("Sam"), "https://x.test", "Acme", &[]);
        assert_eq!(mail.to, "c@example.com");
        assert!(mail.attachments.is_empty());
        assert!(mail.html_body.contains("Hello Sam,"));
    }
}
