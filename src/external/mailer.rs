use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::{internal_error, Error};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub reply_to_name: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), Error>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, Error> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| internal_error(format!("smtp relay {}: {}", config.host, e)))?
            .port(config.port);

        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, Error> {
    value
        .parse()
        .map_err(|e| internal_error(format!("invalid {} address {:?}: {}", field, value, e)))
}

pub fn build_message(mail: &OutgoingMail) -> Result<Message, Error> {
    let reply_to = Mailbox::new(
        Some(mail.reply_to_name.clone()),
        parse_address("reply-to", &mail.reply_to)?,
    );

    Message::builder()
        .from(Mailbox::new(None, parse_address("from", &mail.from)?))
        .to(Mailbox::new(None, parse_address("to", &mail.to)?))
        .reply_to(reply_to)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())
        .map_err(Error::from)
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip_all, fields(to = %mail.to))]
    async fn send(&self, mail: OutgoingMail) -> Result<(), Error> {
        let message = build_message(&mail)?;

        self.transport.send(message).await?;

        Ok(())
    }
}
