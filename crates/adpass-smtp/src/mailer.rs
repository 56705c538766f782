//! [`SmtpMailer`] — the SMTP implementation of [`Mailer`].

use std::time::Duration;

use adpass_core::source::{Mailer, OutgoingMail};
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
};
use tracing::info;

use crate::{Error, Result};

/// Relay settings shared by every message of a run.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
  pub host:         String,
  pub port:         u16,
  pub from:         String,
  pub timeout_secs: u64,
}

/// Plain SMTP without authentication or TLS.
pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpMailer {
  pub fn new(settings: &SmtpSettings) -> Result<Self> {
    let from = parse_mailbox(&settings.from)?;
    let transport =
      AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        .port(settings.port)
        .timeout(Some(Duration::from_secs(settings.timeout_secs)))
        .build();
    Ok(Self { transport, from })
  }

  /// Build the message without sending it. All recipients share one message.
  pub fn build_message(&self, mail: &OutgoingMail) -> Result<Message> {
    if mail.to.is_empty() {
      return Err(Error::NoRecipients);
    }

    let mut builder = Message::builder()
      .from(self.from.clone())
      .subject(mail.subject.as_str())
      .header(ContentType::TEXT_PLAIN);
    for address in &mail.to {
      builder = builder.to(parse_mailbox(address)?);
    }

    Ok(builder.body(mail.body.clone())?)
  }
}

impl Mailer for SmtpMailer {
  type Error = Error;

  async fn send(&self, mail: OutgoingMail) -> Result<()> {
    let message = self.build_message(&mail)?;
    info!(subject = %mail.subject, recipients = ?mail.to, "sending mail");
    self.transport.send(message).await?;
    Ok(())
  }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
  address.parse::<Mailbox>().map_err(|source| Error::Address {
    address: address.to_string(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn mailer() -> SmtpMailer {
    SmtpMailer::new(&SmtpSettings {
      host:         "localhost".into(),
      port:         25,
      from:         "adpass@example.com".into(),
      timeout_secs: 1,
    })
    .unwrap()
  }

  fn mail(to: &[&str]) -> OutgoingMail {
    OutgoingMail {
      to:      to.iter().map(|s| s.to_string()).collect(),
      subject: "Accounts with expired password".into(),
      body:    "sAMAccountName: alice\n---\n".into(),
    }
  }

  #[test]
  fn builds_plain_text_message() {
    let message = mailer()
      .build_message(&mail(&["ops@example.com", "sec@example.com"]))
      .unwrap();

    let recipients: Vec<String> =
      message.envelope().to().iter().map(ToString::to_string).collect();
    assert_eq!(recipients, ["ops@example.com", "sec@example.com"]);

    let raw = String::from_utf8(message.formatted()).unwrap();
    assert!(raw.contains("Subject: Accounts with expired password"));
    assert!(raw.contains("Content-Type: text/plain"));
    assert!(raw.contains("sAMAccountName: alice"));
  }

  #[test]
  fn rejects_bad_recipient() {
    let err = mailer().build_message(&mail(&["not an address"])).unwrap_err();
    assert!(matches!(err, Error::Address { ref address, .. } if address == "not an address"));
  }

  #[test]
  fn rejects_empty_recipient_list() {
    assert!(matches!(
      mailer().build_message(&mail(&[])),
      Err(Error::NoRecipients)
    ));
  }

  #[test]
  fn rejects_bad_sender() {
    let result = SmtpMailer::new(&SmtpSettings {
      host:         "localhost".into(),
      port:         25,
      from:         "@@".into(),
      timeout_secs: 1,
    });
    assert!(matches!(result, Err(Error::Address { .. })));
  }

  #[tokio::test]
  async fn unreachable_relay_is_a_transport_error() {
    let mailer = SmtpMailer::new(&SmtpSettings {
      host:         "127.0.0.1".into(),
      port:         1,
      from:         "adpass@example.com".into(),
      timeout_secs: 2,
    })
    .unwrap();
    let err = mailer.send(mail(&["ops@example.com"])).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
  }
}
