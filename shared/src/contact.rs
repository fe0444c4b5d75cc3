use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::{Deserialize, Serialize};

use vst_atoms::web::{error_response, json_response};

use crate::email::{Mailer, OutgoingMail};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
struct ContactResponse {
    ok: bool,
    message: String,
}

impl ContactRequest {
    fn validate(&self) -> Result<(), &'static str> {
        if self.first_name.trim().is_empty() {
            return Err("Please provide your first name");
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("Please provide a valid email address");
        }
        if self.message.trim().is_empty() {
            return Err("Please provide a message");
        }
        Ok(())
    }

    fn full_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name.trim(), last),
            _ => self.first_name.trim().to_string(),
        }
    }

    /// Builds the notification sent to the trust's inbox.
    pub fn to_mail(&self, to: &str, from: &str) -> OutgoingMail {
        let phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("Not provided");
        let body = format!(
            "You have a new contact form submission:\n\nName: {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}\n",
            self.full_name(),
            self.email.trim(),
            phone,
            self.message.trim()
        );

        OutgoingMail {
            to: to.to_string(),
            from: from.to_string(),
            reply_to: Some(self.email.trim().to_string()),
            subject: format!("New Contact Form Submission from {}", self.first_name.trim()),
            body,
        }
    }
}

/// Handle contact form submission
pub async fn handle_contact(
    mailer: &dyn Mailer,
    to_address: Option<&str>,
    from_address: Option<&str>,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    tracing::info!("Contact form submission received");

    let contact_request: ContactRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Failed to parse contact request: {}", e);
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e));
        }
    };

    if let Err(message) = contact_request.validate() {
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let (Some(to), Some(from)) = (to_address, from_address) else {
        tracing::error!("CONTACT_TO_ADDRESS and CONTACT_FROM_ADDRESS must be set to deliver mail");
        return error_response(StatusCode::BAD_GATEWAY, "Contact form is not configured");
    };

    match mailer.send(&contact_request.to_mail(to, from)).await {
        Ok(()) => {
            tracing::info!("Contact email sent successfully from: {}", contact_request.email);
            json_response(
                StatusCode::OK,
                &ContactResponse {
                    ok: true,
                    message: "Message sent successfully".to_string(),
                },
            )
        }
        Err(e) => {
            tracing::error!("Failed to send contact email: {}", e);
            error_response(
                StatusCode::BAD_GATEWAY,
                "Failed to send message. Please try again later.",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::test_support::RecordingMailer;
    use serde_json::{json, Value};

    const TO: Option<&str> = Some("office@vst.example");
    const FROM: Option<&str> = Some("no-reply@vst.example");

    fn body_json(resp: &Response<Body>) -> Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn sends_mail_with_reply_to_the_submitter() {
        let mailer = RecordingMailer::default();
        let body = json!({
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "asha@example.com",
            "message": "Can I volunteer on weekends?"
        });
        let resp = handle_contact(&mailer, TO, FROM, body.to_string().as_bytes())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(&resp)["ok"], json!(true));

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let mail = &sent[0];
        assert_eq!(mail.to, "office@vst.example");
        assert_eq!(mail.from, "no-reply@vst.example");
        assert_eq!(mail.reply_to.as_deref(), Some("asha@example.com"));
        assert_eq!(mail.subject, "New Contact Form Submission from Asha");
        assert!(mail.body.contains("Name: Asha Rao"));
        assert!(mail.body.contains("Phone: Not provided"));
        assert!(mail.body.contains("Can I volunteer on weekends?"));
    }

    #[tokio::test]
    async fn validation_failures_are_bad_requests() {
        let mailer = RecordingMailer::default();
        for body in [
            json!({"email": "a@b.c", "message": "hi"}),
            json!({"firstName": "A", "email": "not-an-email", "message": "hi"}),
            json!({"firstName": "A", "email": "a@b.c", "message": "   "}),
        ] {
            let resp = handle_contact(&mailer, TO, FROM, body.to_string().as_bytes())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        let resp = handle_contact(&mailer, TO, FROM, b"not json").await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_a_bad_gateway() {
        let mailer = RecordingMailer {
            failing: true,
            ..Default::default()
        };
        let body = json!({"firstName": "A", "email": "a@b.c", "message": "hi"});
        let resp = handle_contact(&mailer, TO, FROM, body.to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = handle_contact(&RecordingMailer::default(), None, FROM, body.to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
