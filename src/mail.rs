//! Mail relay client: sends a rendered act as a PDF attachment

use crate::Result;
use crate::composer::{RenderedAct, TIMESTAMP_FORMAT};
use crate::error::ActError;
use crate::model::DocumentRecord;
use crate::settings::{EmailSettings, MailRelayConfig};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// Message shown when the relay fails without saying why
pub const RELAY_FALLBACK_ERROR: &str = "Kļūda e-pasta sūtīšanā";

const TEST_SUBJECT: &str = "E-pasta konfigurācijas tests";

/// Body posted to the relay endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailRequest {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MailAttachment>,
    pub smtp: SmtpParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailAttachment {
    pub filename: String,
    /// Base64 file content
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub disposition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmtpParams {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub auth: SmtpAuth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmtpAuth {
    pub user: String,
    pub pass: String,
}

impl From<&EmailSettings> for SmtpParams {
    fn from(settings: &EmailSettings) -> Self {
        Self {
            host: settings.smtp_host.clone(),
            port: settings.smtp_port,
            secure: settings.secure(),
            auth: SmtpAuth {
                user: settings.smtp_user.clone(),
                pass: settings.smtp_password.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RelayError {
    error: Option<String>,
}

/// Relay request carrying the rendered act to `recipient`
pub fn build_act_email(
    recipient: &str,
    settings: &EmailSettings,
    record: &DocumentRecord,
    pdf: &[u8],
) -> MailRequest {
    let subject = if record.act_number.is_empty() {
        "Pieņemšanas-nodošanas akts".to_string()
    } else {
        format!("Pieņemšanas-nodošanas akts Nr. {}", record.act_number)
    };
    MailRequest {
        to: recipient.to_string(),
        from: settings.sender().to_string(),
        subject,
        html: email_html(record),
        attachments: vec![MailAttachment {
            filename: record.attachment_filename(),
            content: STANDARD.encode(pdf),
            content_type: "application/pdf".to_string(),
            disposition: "attachment".to_string(),
        }],
        smtp: settings.into(),
    }
}

/// Relay request that mails the SMTP user to check the settings
pub fn build_test_email(settings: &EmailSettings) -> MailRequest {
    let now = Local::now().format(TIMESTAMP_FORMAT);
    MailRequest {
        to: settings.smtp_user.clone(),
        from: settings.sender().to_string(),
        subject: TEST_SUBJECT.to_string(),
        html: format!(
            "<h2>{TEST_SUBJECT}</h2>\n\
             <p>Ja jūs saņemat šo e-pastu, tad e-pasta iestatījumi ir konfigurēti pareizi.</p>\n\
             <p>Datums: {now}</p>\n"
        ),
        attachments: Vec::new(),
        smtp: settings.into(),
    }
}

/// Escape text for HTML element content
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// HTML summary of the act used as the mail body
pub fn email_html(record: &DocumentRecord) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>Pieņemšanas-nodošanas akts</title>\n</head>\n<body>\n\
         <div class=\"header\">\n<h1>Pieņemšanas-nodošanas akts</h1>\n",
    );
    if !record.act_number.is_empty() {
        html.push_str(&format!(
            "<p><strong>Nr. {}</strong></p>\n",
            escape(&record.act_number)
        ));
    }
    html.push_str(&format!(
        "<p>{}</p>\n</div>\n<div class=\"content\">\n",
        escape(&record.date_and_location())
    ));

    for (label, party) in [
        ("Nododējs:", &record.handover_party),
        ("Pieņēmējs:", &record.receiving_party),
    ] {
        html.push_str(&format!(
            "<div class=\"info-section\">\n<div class=\"info-label\">{label}</div>\n<p>{}</p>\n",
            escape(&party.name)
        ));
        if !party.registration_number.is_empty() {
            html.push_str(&format!(
                "<p>Reģ. Nr.: {}</p>\n",
                escape(&party.registration_number)
            ));
        }
        html.push_str("</div>\n");
    }

    if !record.contract_reference.is_empty() {
        html.push_str(&format!(
            "<div class=\"info-section\">\n<div class=\"info-label\">Pamatojums:</div>\n<p>{}</p>\n</div>\n",
            escape(&record.contract_reference)
        ));
    }

    html.push_str(
        "<div class=\"info-section\">\n<div class=\"info-label\">Nododamās lietas:</div>\n<ul>\n",
    );
    for item in &record.items {
        html.push_str(&format!("<li><strong>{}</strong>", escape(&item.name)));
        if !item.manufacturer.is_empty() {
            html.push_str(&format!("<br>Ražotājs: {}", escape(&item.manufacturer)));
        }
        if !item.model.is_empty() {
            html.push_str(&format!("<br>Modelis: {}", escape(&item.model)));
        }
        if !item.serial_number.is_empty() {
            html.push_str(&format!("<br>Sērijas Nr.: {}", escape(&item.serial_number)));
        }
        if item.quantity > 1 {
            html.push_str(&format!("<br>Skaits: {}", item.quantity));
        }
        html.push_str("</li>\n");
    }
    html.push_str(
        "</ul>\n</div>\n</div>\n<div class=\"footer\">\n\
         <p>Šis e-pasts satur pieņemšanas-nodošanas aktu PDF formātā.</p>\n\
         <p>Lūdzu, saglabājiet šo dokumentu savos arhīvos.</p>\n\
         </div>\n</body>\n</html>\n",
    );
    html
}

/// Blocking client for the HTTP mail relay
#[derive(Debug, Clone)]
pub struct MailRelay {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl MailRelay {
    pub fn new(config: &MailRelayConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("handover-act/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one request; a non-2xx answer becomes [`ActError::Mail`]
    #[instrument(skip_all, fields(to = %request.to, endpoint = %self.endpoint))]
    pub fn send(&self, request: &MailRequest) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .inspect_err(|e| error!("Mail relay unreachable: {}", e))?;

        let status = response.status();
        if status.is_success() {
            info!("Mail sent to {}", request.to);
            return Ok(());
        }

        let message = response
            .json::<RelayError>()
            .ok()
            .and_then(|body| body.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| RELAY_FALLBACK_ERROR.to_string());
        error!("Mail relay answered {}: {}", status, message);
        Err(ActError::Mail(message))
    }

    /// Validate settings and record, then mail the rendered act
    pub fn send_act(
        &self,
        recipient: &str,
        settings: &EmailSettings,
        record: &DocumentRecord,
        act: &RenderedAct,
    ) -> Result<()> {
        settings.validate()?;
        record.validate()?;
        if recipient.trim().is_empty() {
            return Err(ActError::Validation("Recipient address is empty".to_string()));
        }
        let request = build_act_email(recipient, settings, record, act.bytes());
        self.send(&request)
    }

    /// Send a test mail to the SMTP user; failures are logged, not returned
    pub fn test_configuration(&self, settings: &EmailSettings) -> bool {
        if let Err(e) = settings.validate() {
            error!("Mail settings incomplete: {}", e);
            return false;
        }
        match self.send(&build_test_email(settings)) {
            Ok(()) => true,
            Err(e) => {
                error!("Mail configuration test failed: {}", e);
                false
            }
        }
    }
}
