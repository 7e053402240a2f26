use handlebars::{Handlebars, no_escape};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::error::{NotificationError, NotificationResult};

/// Rendered email content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Serialize)]
struct LayoutData<'a> {
    app_name: &'a str,
    title: &'a str,
    message: &'a str,
    link_url: Option<&'a str>,
}

/// Wraps a notification's title, message and link in the standard email body.
#[derive(Clone)]
pub struct EmailLayout {
    html: Arc<Handlebars<'static>>,
    text: Arc<Handlebars<'static>>,
}

impl EmailLayout {
    pub fn new() -> NotificationResult<Self> {
        let mut html = Handlebars::new();
        html.register_template_string("notification", NOTIFICATION_HTML_TEMPLATE)
            .map_err(|e| NotificationError::Template(format!("Failed to register notification_html: {}", e)))?;

        let mut text = Handlebars::new();
        text.register_escape_fn(no_escape);
        text.register_template_string("notification", NOTIFICATION_TEXT_TEMPLATE)
            .map_err(|e| NotificationError::Template(format!("Failed to register notification_text: {}", e)))?;

        Ok(Self {
            html: Arc::new(html),
            text: Arc::new(text),
        })
    }

    pub fn render(
        &self,
        app_name: &str,
        title: &str,
        message: &str,
        link_url: Option<&str>,
    ) -> NotificationResult<RenderedEmail> {
        debug!(title, "Rendering notification email");
        let data = LayoutData {
            app_name,
            title,
            message,
            link_url,
        };

        let html = self
            .html
            .render("notification", &data)
            .map_err(|e| NotificationError::Template(e.to_string()))?;
        let text = self
            .text
            .render("notification", &data)
            .map_err(|e| NotificationError::Template(e.to_string()))?;

        Ok(RenderedEmail {
            subject: title.to_string(),
            html,
            text,
        })
    }
}

const NOTIFICATION_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{{title}}</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background-color: #f4f4f5;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto; padding: 40px 20px;">
    <tr>
      <td style="background-color: #ffffff; border-radius: 8px; padding: 40px;">
        <p style="color: #71717a; font-size: 12px; text-transform: uppercase; margin: 0 0 8px 0;">{{app_name}}</p>
        <h1 style="color: #18181b; font-size: 22px; font-weight: 600; margin: 0 0 16px 0;">{{title}}</h1>
        <p style="color: #52525b; font-size: 16px; line-height: 24px; margin: 0 0 24px 0; white-space: pre-line;">{{message}}</p>
        {{#if link_url}}
        <a href="{{link_url}}" style="display: inline-block; background-color: #2563eb; color: #ffffff; font-size: 15px; padding: 10px 24px; text-decoration: none; border-radius: 6px;">View details</a>
        {{/if}}
      </td>
    </tr>
    <tr>
      <td style="color: #a1a1aa; font-size: 12px; text-align: center; padding-top: 16px;">
        You received this email because of your notification preferences in {{app_name}}.
      </td>
    </tr>
  </table>
</body>
</html>
"#;

const NOTIFICATION_TEXT_TEMPLATE: &str = r#"{{title}}

{{message}}
{{#if link_url}}

View details: {{link_url}}
{{/if}}

--
You received this email because of your notification preferences in {{app_name}}.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_body_escapes_and_text_body_does_not() {
        let layout = EmailLayout::new().unwrap();
        let email = layout
            .render("Acme", "Invoice <7> created", "Total: 5 & 6", Some("https://acme.test/i/7"))
            .unwrap();

        assert_eq!(email.subject, "Invoice <7> created");
        assert!(email.html.contains("Invoice &lt;7&gt; created"));
        assert!(email.html.contains("href=\"https://acme.test/i/7\""));
        assert!(email.text.contains("Invoice <7> created"));
        assert!(email.text.contains("Total: 5 & 6"));
        assert!(email.text.contains("View details: https://acme.test/i/7"));
    }

    #[test]
    fn link_block_is_omitted_without_link() {
        let layout = EmailLayout::new().unwrap();
        let email = layout.render("Acme", "Hello", "Body", None).unwrap();
        assert!(!email.html.contains("View details"));
        assert!(!email.text.contains("View details"));
    }
}
