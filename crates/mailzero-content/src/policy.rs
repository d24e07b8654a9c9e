//! Static sanitizer configuration: what survives cleaning, and the document
//! the cleaned fragment is placed into.

pub const ALLOWED_HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "b", "blockquote", "br", "caption", "center", "code", "col",
    "colgroup", "dd", "div", "dl", "dt", "em", "font", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "i", "img", "li", "ol", "p", "pre", "s", "small", "span", "strike", "strong", "sub", "sup",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

/// Attributes kept per tag. The `"*"` entry applies to every allowed tag.
pub const ALLOWED_HTML_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("*", &["style", "align", "dir", "title"]),
    ("a", &["href", "name", "target"]),
    ("img", &["src", "alt", "width", "height"]),
    ("font", &["color", "face", "size"]),
    ("table", &["width", "border", "cellpadding", "cellspacing", "bgcolor"]),
    ("td", &["width", "colspan", "rowspan", "valign", "bgcolor"]),
    ("th", &["width", "colspan", "rowspan", "valign", "bgcolor"]),
    ("tr", &["valign", "bgcolor"]),
    ("col", &["span", "width"]),
    ("ol", &["start", "type"]),
];

/// CSS properties kept inside `style` attributes.
pub const ALLOWED_HTML_STYLES: &[&str] = &[
    "background-color",
    "border",
    "border-bottom",
    "border-collapse",
    "border-left",
    "border-right",
    "border-top",
    "color",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "height",
    "line-height",
    "margin",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "margin-top",
    "max-width",
    "padding",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "padding-top",
    "text-align",
    "text-decoration",
    "vertical-align",
    "white-space",
    "width",
];

pub const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "cid"];

/// Tags removed together with everything inside them.
pub const DROPPED_CONTENT_TAGS: &[&str] = &["script", "style", "title"];

pub const CONTENT_PLACEHOLDER: &str = "{{content}}";

pub const EMAIL_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <style>
      body {
        margin: 0;
        padding: 16px;
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
        font-size: 14px;
        line-height: 1.5;
        color: #1f2937;
        background: #ffffff;
        overflow-wrap: break-word;
      }
      img { max-width: 100%; height: auto; }
      table { max-width: 100%; }
      blockquote { margin: 0 0 0 8px; padding-left: 8px; border-left: 2px solid #d1d5db; }
      pre { white-space: pre-wrap; }
    </style>
  </head>
  <body>{{content}}</body>
</html>
"#;
