use lettre::{
    Message, SmtpTransport, Transport,
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
};
use log::{info, error, warn};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::models::{HireRequest, User};

/// Outbound notifications about hire request activity. Delivery is best effort:
/// implementations log failures and never report them to the caller.
#[rocket::async_trait]
pub trait Notifier: Send + Sync {
    async fn hire_request_received(&self, provider: &User, request: &HireRequest);

    async fn hire_status_changed(&self, request: &HireRequest);
}

pub struct EmailService;

/// Escapes text interpolated into an HTML email body.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl EmailService {
    /// Sends in the background; the returned handle is only awaited in tests.
    fn send(to: String, subject: String, body: String) -> JoinHandle<()> {
        tokio::spawn(async move {
            if !Config::is_mail_enabled() {
                warn!("Email credentials not configured. Skipping email to {}", to);
                return;
            }

            let recipient = to.clone();
            let outcome = tokio::task::spawn_blocking(move || Self::try_send(&to, &subject, body)).await;

            match outcome {
                Ok(Ok(())) => info!("Email sent to {}", recipient),
                Ok(Err(e)) => error!("Failed to send email to {}: {}", recipient, e),
                Err(e) => error!("Email task for {} did not complete: {}", recipient, e),
            }
        })
    }

    fn try_send(to: &str, subject: &str, body: String) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let from_mailbox: Mailbox = Config::mail_from().parse()?;
        let to_mailbox: Mailbox = to.parse()?;

        let email_message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        let creds = Credentials::new(Config::mail_user(), Config::mail_password());
        let mailer = SmtpTransport::starttls_relay(&Config::mail_host())?
            .port(Config::mail_port())
            .credentials(creds)
            .build();

        mailer.send(&email_message)?;
        Ok(())
    }

    fn request_link(request: &HireRequest) -> String {
        format!(
            "{}/requests/{}",
            Config::frontend_url(),
            request.id.map(|id| id.to_hex()).unwrap_or_default()
        )
    }

    fn request_received_body(provider: &User, request: &HireRequest) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html>
            <body>
                <h2>New hire request on Wifmart</h2>
                <p>Hi {},</p>
                <p>You have a new request: <strong>{}</strong></p>
                <p>{}</p>
                <p>Budget: {}<br>Location: {}</p>
                <p><a href="{}">View and respond to the request</a></p>
                <p>Best regards,<br><strong>Wifmart Team</strong></p>
            </body>
            </html>
            "#,
            escape_html(provider.name.as_deref().unwrap_or("there")),
            escape_html(&request.title),
            escape_html(&request.message),
            escape_html(request.budget.as_deref().unwrap_or("Not specified")),
            escape_html(request.location.as_deref().unwrap_or("Not specified")),
            Self::request_link(request),
        )
    }

    fn status_changed_body(request: &HireRequest) -> String {
        format!(
            r#"
            <!DOCTYPE html>
            <html>
            <body>
                <h2>Your hire request was updated</h2>
                <p>Your request <strong>{}</strong> is now <strong>{}</strong>.</p>
                <p><a href="{}">Open the request</a></p>
                <p>Best regards,<br><strong>Wifmart Team</strong></p>
            </body>
            </html>
            "#,
            escape_html(&request.title),
            request.status,
            Self::request_link(request),
        )
    }
}

#[rocket::async_trait]
impl Notifier for EmailService {
    async fn hire_request_received(&self, provider: &User, request: &HireRequest) {
        let _ = Self::send(
            provider.email.clone(),
            format!("New hire request: {}", request.title),
            Self::request_received_body(provider, request),
        );
    }

    async fn hire_status_changed(&self, request: &HireRequest) {
        let _ = Self::send(
            request.email.clone(),
            format!("Hire request {}: {}", request.status, request.title),
            Self::status_changed_body(request),
        );
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Records notifications instead of sending them.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub received: Mutex<Vec<String>>,
        pub status_changes: Mutex<Vec<(String, String)>>,
    }

    #[rocket::async_trait]
    impl Notifier for RecordingNotifier {
        async fn hire_request_received(&self, provider: &User, request: &HireRequest) {
            self.received
                .lock()
                .await
                .push(format!("{}:{}", provider.email, request.title));
        }

        async fn hire_status_changed(&self, request: &HireRequest) {
            self.status_changes
                .lock()
                .await
                .push((request.email.clone(), request.status.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{oid::ObjectId, DateTime};

    use crate::models::{test_user, HireStatus, UserRole};

    fn request(title: &str, message: &str) -> HireRequest {
        HireRequest {
            id: Some(ObjectId::new()),
            client_id: ObjectId::new(),
            provider_id: ObjectId::new(),
            title: title.to_string(),
            event_date: None,
            location: Some("Lekki & Ikoyi".to_string()),
            budget: None,
            phone: "08031234567".to_string(),
            email: "client@example.com".to_string(),
            message: message.to_string(),
            attachment: None,
            status: HireStatus::Pending,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">it's</a> & more"#),
            "&lt;a href=&quot;x&quot;&gt;it&#x27;s&lt;/a&gt; &amp; more"
        );
        assert_eq!(escape_html("Wedding Photoshoot"), "Wedding Photoshoot");
    }

    #[test]
    fn client_text_cannot_inject_markup() {
        let provider = test_user(UserRole::Provider);
        let request = request(
            "<script>alert(1)</script>",
            r#"<a href="https://phish.example">Claim payment</a>"#,
        );

        let body = EmailService::request_received_body(&provider, &request);
        assert!(!body.contains("<script>"));
        assert!(!body.contains("phish.example\">"));
        assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(body.contains("Lekki &amp; Ikoyi"));

        let body = EmailService::status_changed_body(&request);
        assert!(body.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn sending_runs_in_the_background() {
        let handle = EmailService::send(
            "nobody@example.com".to_string(),
            "subject".to_string(),
            "body".to_string(),
        );
        // Returns before delivery; the task itself still completes.
        handle.await.unwrap();
    }
}
