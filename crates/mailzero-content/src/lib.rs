use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE as BASE64_URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::{debug, warn};

use mailzero_core::{
    FALLBACK_HEADER, MessageEnvelope, NormalizedMessage, NormalizedSummary, Part, Sender,
    UNREAD_LABEL,
};

mod policy;

pub use policy::{
    ALLOWED_HTML_ATTRIBUTES, ALLOWED_HTML_STYLES, ALLOWED_HTML_TAGS, ALLOWED_URL_SCHEMES,
    CONTENT_PLACEHOLDER, DROPPED_CONTENT_TAGS, EMAIL_HTML_TEMPLATE,
};

// Mirrors the browser's atob: padding optional, stray trailing bits tolerated.
const TRANSPORT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Sanitized document plus the data URL that renders it in isolation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBody {
    pub processed_html: String,
    pub blob_url: String,
}

pub fn summarize(envelope: &MessageEnvelope) -> NormalizedSummary {
    let received_on = required_header(envelope, "Date");
    let from = required_header(envelope, "From");
    let subject = required_header(envelope, "Subject");

    NormalizedSummary {
        id: envelope.id.clone(),
        title: html_escape::decode_html_entities(&envelope.snippet).into_owned(),
        tags: envelope.label_ids.clone(),
        sender: parse_sender(&from),
        subject,
        unread: envelope.label_ids.iter().any(|label| label == UNREAD_LABEL),
        received_on,
    }
}

fn required_header(envelope: &MessageEnvelope, name: &str) -> String {
    envelope
        .header(name)
        .filter(|value| !value.is_empty())
        .unwrap_or(FALLBACK_HEADER)
        .to_string()
}

/// Splits a `From` value on its first `<`.
///
/// The address keeps the leading `<` but loses the closing `>`. A value without `<` is used whole, as
/// the name and, prefixed with `<`, as the address.
pub fn parse_sender(raw: &str) -> Sender {
    match raw.split_once('<') {
        Some((name, address)) => Sender {
            name: clean_display_name(name),
            email: format!("<{}", address.trim().trim_end_matches('>').trim_end()),
        },
        None => {
            let name = clean_display_name(raw);
            Sender {
                email: format!("<{}", name),
                name,
            }
        }
    }
}

fn clean_display_name(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

/// Depth-first, pre-order search for the first `text/html` leaf with data.
pub fn find_html_body(parts: &[Part]) -> Option<&str> {
    for part in parts {
        if is_html(part) {
            if let Some(data) = part.inline_data() {
                return Some(data);
            }
        }
        if let Some(found) = find_html_body(part.children()) {
            return Some(found);
        }
    }
    None
}

fn is_html(part: &Part) -> bool {
    part.mime_type().eq_ignore_ascii_case(mime::TEXT_HTML.essence_str())
}

/// Encoded body to display: the first HTML part, else the top-level inline
/// body, else the first child's inline body, else empty.
pub fn locate_body(envelope: &MessageEnvelope) -> &str {
    if let Some(html) = find_html_body(&envelope.parts) {
        debug!(id = %envelope.id, "found HTML content in message part");
        return html;
    }
    debug!(id = %envelope.id, "no HTML content found in message parts");
    envelope
        .inline_body()
        .or_else(|| envelope.parts.first().and_then(Part::inline_data))
        .unwrap_or("")
}

/// Decodes a provider body: URL-safe base64 whose bytes are UTF-8 text.
///
/// Each decoded byte goes through a `%xx` escape and is percent-decoded back,
/// so multi-byte sequences are reassembled before UTF-8 validation.
pub fn decode_body(data: &str) -> Result<String, DecodeError> {
    let standard: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    let bytes = TRANSPORT.decode(standard)?;
    let escaped: String = bytes.iter().map(|b| format!("%{:02x}", b)).collect();
    let text = urlencoding::decode(&escaped)?;
    Ok(text.into_owned())
}

/// Inverse of [`decode_body`].
pub fn encode_body(text: &str) -> String {
    BASE64_URL_SAFE.encode(text.as_bytes())
}

pub fn sanitize_html(html: &str) -> String {
    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut generic_attributes: HashSet<&str> = HashSet::new();
    for (tag, attributes) in ALLOWED_HTML_ATTRIBUTES {
        if *tag == "*" {
            generic_attributes.extend(attributes.iter().copied());
        } else {
            tag_attributes
                .entry(*tag)
                .or_default()
                .extend(attributes.iter().copied());
        }
    }

    let mut builder = ammonia::Builder::default();
    builder
        .tags(ALLOWED_HTML_TAGS.iter().copied().collect())
        .clean_content_tags(DROPPED_CONTENT_TAGS.iter().copied().collect())
        .tag_attributes(tag_attributes)
        .generic_attributes(generic_attributes)
        .url_schemes(ALLOWED_URL_SCHEMES.iter().copied().collect())
        .link_rel(Some("noopener noreferrer"))
        .attribute_filter(filter_style_attribute);
    builder.clean(html).to_string()
}

fn filter_style_attribute<'u>(
    _element: &str,
    attribute: &str,
    value: &'u str,
) -> Option<Cow<'u, str>> {
    if !attribute.eq_ignore_ascii_case("style") {
        return Some(Cow::Borrowed(value));
    }
    let kept = allowed_declarations(value);
    if kept.is_empty() {
        None
    } else {
        Some(Cow::Owned(kept))
    }
}

fn allowed_declarations(style: &str) -> String {
    let mut kept: Vec<String> = Vec::new();
    for declaration in split_declarations(style) {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() || !ALLOWED_HTML_STYLES.contains(&property.as_str()) {
            continue;
        }
        let lowered = value.to_ascii_lowercase();
        if lowered.contains("url(") || lowered.contains("expression(") {
            continue;
        }
        kept.push(format!("{}: {}", property, value));
    }
    kept.join("; ")
}

/// Splits on `;` outside quoted strings. A declaration whose quote never
/// closes is dropped.
fn split_declarations(style: &str) -> Vec<&str> {
    let mut declarations = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, c) in style.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ';') => {
                declarations.push(&style[start..idx]);
                start = idx + 1;
            }
            (None, _) => {}
        }
    }
    if quote.is_none() {
        declarations.push(&style[start..]);
    }
    declarations
}

/// Places an already sanitized fragment into the email document template.
pub fn render_email_html(sanitized: &str) -> String {
    EMAIL_HTML_TEMPLATE.replacen(CONTENT_PLACEHOLDER, sanitized, 1)
}

pub fn to_data_url(document: &str) -> String {
    format!(
        "data:{};charset=utf-8,{}",
        mime::TEXT_HTML,
        encode_uri_component(document)
    )
}

// `encodeURIComponent` leaves these unescaped; `urlencoding` does not.
const URI_COMPONENT_MARKS: &[char] = &['!', '\'', '(', ')', '*'];

fn encode_uri_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(URI_COMPONENT_MARKS) {
        out.push_str(&urlencoding::encode(&rest[..pos]));
        out.push_str(&rest[pos..pos + 1]);
        rest = &rest[pos + 1..];
    }
    out.push_str(&urlencoding::encode(rest));
    out
}

/// Decode, sanitize and wrap a located body. Never fails: an empty body or
/// one that cannot be decoded yields empty output.
pub fn process_body(encoded: &str) -> RenderedBody {
    if encoded.is_empty() {
        debug!("no email body data found");
        return RenderedBody::default();
    }
    let decoded = match decode_body(encoded) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!("failed to decode email body: {err}");
            return RenderedBody::default();
        }
    };
    let processed_html = render_email_html(&sanitize_html(&decoded));
    let blob_url = to_data_url(&processed_html);
    debug!(
        decoded_len = decoded.len(),
        processed_len = processed_html.len(),
        blob_url_len = blob_url.len(),
        "email processing complete"
    );
    RenderedBody {
        processed_html,
        blob_url,
    }
}

/// Full-content shape of one message.
pub fn normalize_message(envelope: &MessageEnvelope, total_replies: usize) -> NormalizedMessage {
    let body = locate_body(envelope);
    let rendered = process_body(body);
    NormalizedMessage {
        summary: summarize(envelope),
        body: body.to_string(),
        processed_html: rendered.processed_html,
        blob_url: rendered.blob_url,
        total_replies,
    }
}

/// Plain-text rendering of an encoded body for terminals.
pub fn display_text(encoded: &str, width_cols: usize) -> Result<String, DecodeError> {
    if encoded.is_empty() {
        return Ok(String::new());
    }
    let sanitized = sanitize_html(&decode_body(encoded)?);
    let text = html2text::from_read(sanitized.as_bytes(), width_cols);
    Ok(html_escape::decode_html_entities(&text).trim().to_string())
}
