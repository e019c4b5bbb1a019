use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::viewport::Viewport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSource(String);

impl ImageSource {
    pub fn from_pasted_text(text: &str) -> Option<Self> {
        parse_absolute_url(text).map(|url| Self(url.to_string()))
    }

    pub fn from_file(mime: &str, bytes: &[u8]) -> Self {
        let mime = if mime.trim().is_empty() {
            "application/octet-stream"
        } else {
            mime.trim()
        };
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct BackgroundImage {
    active: Option<ImageSource>,
    pending: Option<ImageSource>,
    pub x: f64,
    pub y: f64,
}

impl BackgroundImage {
    pub fn source(&self) -> Option<&ImageSource> {
        self.active.as_ref()
    }

    pub fn pending(&self) -> Option<&ImageSource> {
        self.pending.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn set_source(&mut self, source: ImageSource) {
        self.pending = Some(source);
    }

    pub fn on_loaded(
        &mut self,
        source: &ImageSource,
        width: f64,
        height: f64,
        viewport: &Viewport,
    ) -> bool {
        if self.pending.as_ref() != Some(source) {
            return false;
        }
        self.active = self.pending.take();
        self.x = (viewport.width - width) * 0.5;
        self.y = (viewport.height - height) * 0.5;
        true
    }

    pub fn on_failed(&mut self, source: &ImageSource) -> bool {
        if self.pending.as_ref() != Some(source) {
            return false;
        }
        self.pending = None;
        true
    }
}

pub fn parse_absolute_url(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return None;
    }
    let (scheme, rest) = text.split_once(':')?;
    let mut chars = scheme.chars();
    if !chars.next()?.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    if rest.is_empty() {
        return None;
    }
    let scheme = scheme.to_ascii_lowercase();
    if matches!(scheme.as_str(), "http" | "https" | "ws" | "wss" | "ftp") {
        let authority = rest.strip_prefix("//")?;
        let host = authority.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() {
            return None;
        }
    }
    Some(text)
}
