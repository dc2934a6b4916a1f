//! Minimal TwiML assembly for the voice IVR webhooks.
//!
//! Twilio consumes an XML document per webhook response; the handful of
//! verbs we use (Say/Play/Gather/Redirect) does not justify a full XML
//! dependency, so the document is built by hand with escaping.

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Input mode for a `<Gather>` verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherInput {
    Dtmf,
    Speech,
}

impl GatherInput {
    fn as_str(&self) -> &'static str {
        match self {
            GatherInput::Dtmf => "dtmf",
            GatherInput::Speech => "speech",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gather {
    input: GatherInput,
    action: String,
    timeout: u32,
    num_digits: Option<u32>,
    language: Option<String>,
    body: String,
}

impl Gather {
    pub fn new(input: GatherInput, action: &str, timeout: u32) -> Self {
        Self {
            input,
            action: action.to_string(),
            timeout,
            num_digits: None,
            language: None,
            body: String::new(),
        }
    }

    pub fn num_digits(mut self, n: u32) -> Self {
        self.num_digits = Some(n);
        self
    }

    pub fn language(mut self, lang: &str) -> Self {
        self.language = Some(lang.to_string());
        self
    }

    pub fn say(mut self, text: &str) -> Self {
        self.body
            .push_str(&format!("<Say>{}</Say>", escape(text)));
        self
    }

    pub fn play(mut self, url: &str) -> Self {
        self.body
            .push_str(&format!("<Play>{}</Play>", escape(url)));
        self
    }

    /// Plays the audio URL when synthesis produced one, otherwise
    /// falls back to provider-native `<Say>`.
    pub fn prompt(self, text: &str, audio_url: Option<&str>) -> Self {
        match audio_url {
            Some(url) => self.play(url),
            None => self.say(text),
        }
    }

    fn to_xml(&self) -> String {
        let mut attrs = format!(
            r#"input="{}" action="{}" method="GET" timeout="{}""#,
            self.input.as_str(),
            escape(&self.action),
            self.timeout
        );
        if let Some(n) = self.num_digits {
            attrs.push_str(&format!(r#" numDigits="{}""#, n));
        }
        if let Some(ref lang) = self.language {
            attrs.push_str(&format!(r#" language="{}""#, escape(lang)));
        }
        format!("<Gather {}>{}</Gather>", attrs, self.body)
    }
}

/// A `<Response>` document for Twilio voice webhooks.
#[derive(Debug, Default)]
pub struct VoiceResponse {
    body: String,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: &str) -> Self {
        self.body
            .push_str(&format!("<Say>{}</Say>", escape(text)));
        self
    }

    pub fn play(mut self, url: &str) -> Self {
        self.body
            .push_str(&format!("<Play>{}</Play>", escape(url)));
        self
    }

    pub fn prompt(self, text: &str, audio_url: Option<&str>) -> Self {
        match audio_url {
            Some(url) => self.play(url),
            None => self.say(text),
        }
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.body.push_str(&gather.to_xml());
        self
    }

    /// Twilio only requests a Gather's action URL when input was
    /// captured; a trailing Redirect catches the silent fall-through.
    pub fn redirect(mut self, url: &str) -> Self {
        self.body.push_str(&format!(
            r#"<Redirect method="GET">{}</Redirect>"#,
            escape(url)
        ));
        self
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Response>{}</Response>"#,
            self.body
        )
    }
}
