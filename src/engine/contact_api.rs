use super::Engine;

use async_trait::async_trait;

use crate::{
    api::ContactAPI,
    entities::{ContactMessage, ContactOutcome, ContactRequest},
    error::{internal_error, Error},
    external::OutgoingMail,
};

fn compose(message: &ContactMessage, from: &str, to: &str) -> OutgoingMail {
    let mut body = message.message.clone();

    if let Some(dates) = &message.dates {
        body.push_str("\n\nDates: ");
        body.push_str(dates);
    }

    body.push_str(&format!("\n\n--\n{} <{}>", message.name, message.email));

    OutgoingMail {
        from: from.into(),
        to: to.into(),
        reply_to_name: message.name.clone(),
        reply_to: message.email.clone(),
        subject: format!("Casa Pin contact: {}", message.name),
        body,
    }
}

#[async_trait]
impl ContactAPI for Engine {
    #[tracing::instrument(skip_all)]
    async fn submit_contact(&self, request: ContactRequest) -> Result<ContactOutcome, Error> {
        let message = request.into_message()?;

        let (to, mailer) = match (&self.contact.to, &self.mailer) {
            (Some(to), Some(mailer)) => (to, mailer),
            _ => {
                tracing::info!("no contact recipient configured, message not sent");
                return Ok(ContactOutcome::Skipped("CONTACT_TO not configured".into()));
            }
        };

        let from = self.contact.from.as_deref().unwrap_or(to);

        if let Err(err) = mailer.send(compose(&message, from, to)).await {
            tracing::error!(error = %err, "contact mail failed");
            return Err(internal_error("failed to send message"));
        }

        Ok(ContactOutcome::Sent)
    }
}
