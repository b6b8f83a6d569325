use crate::error::CostReportError;
use crate::report::ReportDocument;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use rusoto_core::Region;
use rusoto_ses::{
    Body, Content, Destination, Message, RawMessage, SendEmailRequest, SendRawEmailRequest, Ses,
    SesClient,
};
use tracing::{error, info};

pub const FAILURE_SUBJECT: &str = "ERROR: AWS Cost Report Generation Failed";
const CHARSET: &str = "UTF-8";
const LINE_LENGTH: usize = 76;

/// Outbound mail; both operations return the provider's message id.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_raw(&self, from: &str, to: &str, raw: String) -> Result<String, CostReportError>;

    async fn send_text(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, CostReportError>;
}

pub struct SesMailer {
    client: SesClient,
}

impl SesMailer {
    pub fn new(region: Region) -> Self {
        Self::new_with_client(SesClient::new(region))
    }

    pub fn new_with_client(client: SesClient) -> Self {
        SesMailer { client }
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send_raw(&self, from: &str, to: &str, raw: String) -> Result<String, CostReportError> {
        let response = self
            .client
            .send_raw_email(SendRawEmailRequest {
                raw_message: RawMessage {
                    data: Bytes::from(raw),
                },
                source: Some(from.to_string()),
                destinations: Some(vec![to.to_string()]),
                ..Default::default()
            })
            .await?;
        Ok(response.message_id)
    }

    async fn send_text(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, CostReportError> {
        let response = self
            .client
            .send_email(SendEmailRequest {
                source: from.to_string(),
                destination: Destination {
                    to_addresses: Some(vec![to.to_string()]),
                    ..Default::default()
                },
                message: Message {
                    subject: content(subject),
                    body: Body {
                        text: Some(content(body)),
                        html: None,
                    },
                },
                ..Default::default()
            })
            .await?;
        Ok(response.message_id)
    }
}

fn content(data: &str) -> Content {
    Content {
        data: data.to_string(),
        charset: Some(CHARSET.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl MailMessage {
    /// A `multipart/alternative` message, plain text first so clients prefer
    /// the HTML part.
    pub fn to_mime(&self, boundary: &str) -> String {
        let mut mime = String::new();
        mime.push_str(&format!("From: {}\r\n", self.from));
        mime.push_str(&format!("To: {}\r\n", self.to));
        mime.push_str(&format!("Subject: {}\r\n", encode_header(&self.subject)));
        mime.push_str("MIME-Version: 1.0\r\n");
        mime.push_str(&format!(
            "Content-Type: multipart/alternative; boundary=\"{}\"\r\n\r\n",
            boundary
        ));
        for (content_type, body) in [("text/plain", &self.text_body), ("text/html", &self.html_body)].iter() {
            mime.push_str(&format!("--{}\r\n", boundary));
            mime.push_str(&format!("Content-Type: {}; charset={}\r\n", content_type, CHARSET));
            mime.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
            mime.push_str(&encode_body(body));
        }
        mime.push_str(&format!("--{}--\r\n", boundary));
        mime
    }
}

fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?{}?B?{}?=", CHARSET, STANDARD.encode(value))
    }
}

fn encode_body(body: &str) -> String {
    let encoded: Vec<char> = STANDARD.encode(body).chars().collect();
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / LINE_LENGTH * 2 + 2);
    for line in encoded.chunks(LINE_LENGTH) {
        wrapped.extend(line);
        wrapped.push_str("\r\n");
    }
    wrapped
}

fn boundary() -> String {
    format!("=_cost_report_{:016x}", rand::random::<u64>())
}

pub struct NotificationDispatcher<M> {
    mailer: M,
    sender: String,
    recipient: String,
}

impl<M: Mailer> NotificationDispatcher<M> {
    pub fn new(mailer: M, sender: &str, recipient: &str) -> Self {
        NotificationDispatcher {
            mailer,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Sends the report once; errors are returned to the caller untouched.
    pub async fn dispatch(&self, document: &ReportDocument) -> Result<String, CostReportError> {
        let message = MailMessage {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject: document.subject.clone(),
            text_body: document.plain_text_body.clone(),
            html_body: document.html_body.clone(),
        };
        let message_id = self
            .mailer
            .send_raw(&self.sender, &self.recipient, message.to_mime(&boundary()))
            .await?;
        info!(recipient = %self.recipient, %message_id, "report sent");
        Ok(message_id)
    }

    /// Best effort: a failure here is logged and dropped.
    pub async fn notify_failure(&self, failure: &CostReportError) {
        let body = format!("Failed to generate weekly cost report.\n\nError: {}", failure);
        match self
            .mailer
            .send_text(&self.sender, &self.recipient, FAILURE_SUBJECT, &body)
            .await
        {
            Ok(message_id) => info!(recipient = %self.recipient, %message_id, "failure notification sent"),
            Err(error) => error!(%error, "failed to send error notification"),
        }
    }
}
