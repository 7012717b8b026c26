//! Notification template builders.
//!
//! Each builder is a pure function: given the notification data and the
//! current time it produces an [`EmailTemplate`] with a subject line, a
//! plain-text body and an HTML variant. Builders never fail — a missing
//! optional field degrades to an empty substitution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable content handed to the delivery queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
    /// HTML body variant (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Kinds of notifications the portal sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    VisaExpiryReminder,
    DocumentUploaded,
    Welcome,
}

/// Visa application fields the reminder template substitutes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisaApplication {
    pub applicant_name: String,
    pub visa_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visa_number: Option<String>,
    pub expiry_date: DateTime<Utc>,
}

/// Kind-specific input for [`build`]
#[derive(Debug, Clone)]
pub enum TemplateData {
    VisaExpiryReminder { application: VisaApplication },
    DocumentUploaded {
        document_name: String,
        document_type: Option<String>,
        uploaded_by: Option<String>,
    },
    Welcome { name: Option<String> },
}

impl TemplateData {
    pub fn kind(&self) -> NotificationKind {
        match self {
            TemplateData::VisaExpiryReminder { .. } => NotificationKind::VisaExpiryReminder,
            TemplateData::DocumentUploaded { .. } => NotificationKind::DocumentUploaded,
            TemplateData::Welcome { .. } => NotificationKind::Welcome,
        }
    }
}

/// Build the template for the given notification data.
pub fn build(data: &TemplateData, now: DateTime<Utc>) -> EmailTemplate {
    match data {
        TemplateData::VisaExpiryReminder { application } => visa_expiry_reminder(application, now),
        TemplateData::DocumentUploaded {
            document_name,
            document_type,
            uploaded_by,
        } => document_uploaded(
            document_name,
            document_type.as_deref(),
            uploaded_by.as_deref(),
            now,
        ),
        TemplateData::Welcome { name } => welcome(name.as_deref()),
    }
}

/// Whole calendar days between `now` and `expiry` (negative once expired).
pub fn days_until_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expiry.date_naive() - now.date_naive()).num_days()
}

fn expiry_phrase(days: i64) -> String {
    if days > 0 {
        format!("expires in {} days", days)
    } else if days == 0 {
        "expires today".to_string()
    } else {
        format!("expired {} days ago", -days)
    }
}

/// Visa expiry reminder for an application.
pub fn visa_expiry_reminder(application: &VisaApplication, now: DateTime<Utc>) -> EmailTemplate {
    let days = days_until_expiry(application.expiry_date, now);
    let phrase = expiry_phrase(days);
    let visa_number = application.visa_number.clone().unwrap_or_default();
    let expiry = application.expiry_date.format("%Y-%m-%d");

    let subject = format!("Visa Expiry Reminder: {} visa {}", application.visa_type, phrase);

    let body = format!(
        "Dear {},\n\nThis is a reminder that your {} visa (number: {}) {}.\n\
         Expiry date: {}\n\nPlease contact your HR administrator to begin the renewal process.\n\n\
         VisaHub Administration",
        application.applicant_name, application.visa_type, visa_number, phrase, expiry,
    );

    let html = render_html(
        "#f39c12",
        &subject,
        &format!(
            "Dear {},<br><br>This is a reminder that your <strong>{}</strong> visa \
             (number: {}) <strong>{}</strong>.<br>Expiry date: {}<br><br>\
             Please contact your HR administrator to begin the renewal process.",
            application.applicant_name, application.visa_type, visa_number, phrase, expiry,
        ),
    );

    EmailTemplate {
        subject,
        body,
        html: Some(html),
    }
}

/// Notice that a document was uploaded to an employee's file.
pub fn document_uploaded(
    document_name: &str,
    document_type: Option<&str>,
    uploaded_by: Option<&str>,
    now: DateTime<Utc>,
) -> EmailTemplate {
    let document_type = document_type.unwrap_or_default();
    let uploaded_by = uploaded_by.unwrap_or_default();
    let uploaded_at = now.to_rfc3339();

    let subject = format!("New Document Uploaded: {}", document_name);

    let body = format!(
        "A new document has been uploaded to your file.\n\n\
         Document: {}\nType: {}\nUploaded by: {}\nUploaded at: {}\n\n\
         You can review it from the Documents page of the portal.\n\n\
         VisaHub Administration",
        document_name, document_type, uploaded_by, uploaded_at,
    );

    let html = render_html(
        "#3498db",
        &subject,
        &format!(
            "A new document has been uploaded to your file.<br><br>\
             Document: <strong>{}</strong><br>Type: {}<br>Uploaded by: {}<br>Uploaded at: {}<br><br>\
             You can review it from the Documents page of the portal.",
            document_name, document_type, uploaded_by, uploaded_at,
        ),
    );

    EmailTemplate {
        subject,
        body,
        html: Some(html),
    }
}

/// Welcome message for a newly registered employee.
pub fn welcome(name: Option<&str>) -> EmailTemplate {
    let name = name.unwrap_or_default();

    let subject = "Welcome to VisaHub".to_string();

    let body = format!(
        "Hello {},\n\nYour VisaHub account has been created. You can now sign in to manage \
         your employee profile, visa applications and documents.\n\n\
         VisaHub Administration",
        name,
    );

    let html = render_html(
        "#2ecc71",
        &subject,
        &format!(
            "Hello {},<br><br>Your VisaHub account has been created. You can now sign in to \
             manage your employee profile, visa applications and documents.",
            name,
        ),
    );

    EmailTemplate {
        subject,
        body,
        html: Some(html),
    }
}

fn render_html(accent_color: &str, title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .header {{ background-color: {}; color: white; padding: 15px; border-radius: 5px; }}
        .content {{ padding: 20px; background-color: #f9f9f9; border-radius: 5px; margin-top: 10px; }}
        .footer {{ color: #666; font-size: 12px; margin-top: 20px; }}
    </style>
</head>
<body>
    <div class="header">
        <h2>{}</h2>
    </div>
    <div class="content">
        <p>{}</p>
    </div>
    <div class="footer">
        <p>VisaHub Administration</p>
    </div>
</body>
</html>"#,
        accent_color, title, content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn application_expiring_in(days: i64, now: DateTime<Utc>) -> VisaApplication {
        VisaApplication {
            applicant_name: "Jordan Lee".to_string(),
            visa_type: "H-1B".to_string(),
            visa_number: Some("V-2024-0042".to_string()),
            expiry_date: now + Duration::days(days),
        }
    }

    #[test]
    fn test_days_until_expiry() {
        let now = Utc::now();
        assert_eq!(days_until_expiry(now + Duration::days(10), now), 10);
        assert_eq!(days_until_expiry(now, now), 0);
        assert_eq!(days_until_expiry(now - Duration::days(3), now), -3);
    }

    #[test]
    fn test_visa_reminder_subject_contains_days() {
        let now = Utc::now();
        let application = application_expiring_in(10, now);

        let template = visa_expiry_reminder(&application, now);

        assert!(template.subject.contains("10 days"));
        assert!(template.subject.contains("H-1B"));
        assert!(!template.body.is_empty());
        assert!(template.html.is_some());
    }

    #[test]
    fn test_visa_reminder_expired() {
        let now = Utc::now();
        let application = application_expiring_in(-5, now);

        let template = visa_expiry_reminder(&application, now);

        assert!(template.subject.contains("expired 5 days ago"));
    }

    #[test]
    fn test_visa_reminder_missing_number_degrades_to_empty() {
        let now = Utc::now();
        let mut application = application_expiring_in(7, now);
        application.visa_number = None;

        let template = visa_expiry_reminder(&application, now);

        assert!(template.body.contains("number: )"));
    }

    #[test]
    fn test_document_uploaded() {
        let now = Utc::now();
        let template = document_uploaded("passport.pdf", Some("passport"), Some("hr-admin"), now);

        assert_eq!(template.subject, "New Document Uploaded: passport.pdf");
        assert!(template.body.contains("passport"));
        assert!(template.body.contains("hr-admin"));
        assert!(template.html.is_some());
    }

    #[test]
    fn test_document_uploaded_missing_fields() {
        let now = Utc::now();
        let template = document_uploaded("offer.pdf", None, None, now);

        assert!(template.body.contains("Type: \n"));
        assert!(template.body.contains("Uploaded by: \n"));
    }

    #[test]
    fn test_welcome() {
        let template = welcome(Some("Alice"));

        assert_eq!(template.subject, "Welcome to VisaHub");
        assert!(template.body.contains("Hello Alice"));
        assert!(template.html.is_some());
    }

    #[test]
    fn test_build_dispatches_on_kind() {
        let now = Utc::now();
        let data = TemplateData::Welcome {
            name: Some("Bob".to_string()),
        };

        assert_eq!(data.kind(), NotificationKind::Welcome);

        let template = build(&data, now);
        assert_eq!(template.subject, "Welcome to VisaHub");
    }

    #[test]
    fn test_builders_are_deterministic() {
        let now = Utc::now();
        let application = application_expiring_in(30, now);

        let a = visa_expiry_reminder(&application, now);
        let b = visa_expiry_reminder(&application, now);
        assert_eq!(a, b);
    }
}
