//! Built-in functions the model may call.
//!
//! ```rust
//! use parley::functions::HtmlStripper;
//!
//! let stripper = HtmlStripper::new().expect("patterns compile");
//! let text = stripper.to_text("<p>Hello <b>world</b></p><script>track()</script>");
//! assert_eq!(text, "Hello world");
//! ```

use std::sync::Arc;

use ptooling::{ToolError, ToolExecutionContext, ToolRegistry, parse_json_object, required_string};
use regex::Regex;
use reqwest::Client;

use crate::FunctionDefinition;

pub const HTTP_GET: &str = "http_get";

pub fn http_get_definition() -> FunctionDefinition {
    crate::parley_function!(
        HTTP_GET,
        "Load data from the Internet, HTML is converted to text",
        {
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL to load data from"
                }
            },
            "required": ["url"]
        }
    )
}

/// Regex-based HTML to plain text conversion.
#[derive(Debug, Clone)]
pub struct HtmlStripper {
    hidden: Regex,
    comments: Regex,
    breaks: Regex,
    tags: Regex,
    spaces: Regex,
    blank_lines: Regex,
}

impl HtmlStripper {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            hidden: Regex::new(
                r"(?is)<(?:script|style|noscript|head|template)\b[^>]*>.*?</(?:script|style|noscript|head|template)\s*>",
            )?,
            comments: Regex::new(r"(?s)<!--.*?-->")?,
            breaks: Regex::new(
                r"(?i)<\s*(?:br|hr|/?p|/?div|/?h[1-6]|/?li|/?tr|/?ul|/?ol|/?table|/?section|/?article|/?blockquote|/?pre)\b[^>]*>",
            )?,
            tags: Regex::new(r"(?s)<[^>]*>")?,
            spaces: Regex::new(r"[ \t\r\x0C\u{A0}]+")?,
            blank_lines: Regex::new(r"\n\s*\n\s*")?,
        })
    }

    pub fn to_text(&self, html: &str) -> String {
        let text = self.hidden.replace_all(html, "");
        let text = self.comments.replace_all(&text, "");
        let text = self.breaks.replace_all(&text, "\n");
        let text = self.tags.replace_all(&text, "");
        let text = decode_entities(&text);
        let text = self.spaces.replace_all(&text, " ");

        let lines = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
        self.blank_lines
            .replace_all(&lines, "\n\n")
            .trim()
            .to_string()
    }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Fetches `url` and returns `{"output": <text>}`.
pub async fn http_get(
    client: &Client,
    stripper: &HtmlStripper,
    args_json: &str,
) -> Result<String, ToolError> {
    let args = parse_json_object(args_json)?;
    let url = required_string(&args, "url")?;
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ToolError::invalid_arguments(format!(
            "url must start with http:// or https://, got '{url}'"
        )));
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| ToolError::execution(format!("GET {url} failed: {err}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::execution(format!("GET {url} returned {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|err| ToolError::execution(format!("reading {url} failed: {err}")))?;

    Ok(serde_json::json!({ "output": stripper.to_text(&body) }).to_string())
}

pub fn register_http_get(registry: &mut ToolRegistry, client: Client) -> Result<(), ToolError> {
    let stripper = HtmlStripper::new()
        .map_err(|err| ToolError::other(format!("html patterns failed to compile: {err}")))?;
    let stripper = Arc::new(stripper);

    registry.register_fn(
        http_get_definition(),
        move |args_json: String, _context: ToolExecutionContext| {
            let client = client.clone();
            let stripper = Arc::clone(&stripper);
            async move { http_get(&client, &stripper, &args_json).await }
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use ptooling::{ToolErrorKind, ToolExecutionContext, ToolRegistry};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::{HTTP_GET, HtmlStripper, http_get_definition, register_http_get};

    #[test]
    fn strips_markup_scripts_and_entities() {
        let stripper = HtmlStripper::new().expect("patterns compile");
        let html = r#"
            <html><head><title>ignored</title><style>p { color: red }</style></head>
            <body>
              <h1>Title</h1>
              <!-- hidden -->
              <p>Fish &amp; chips &lt;3</p>
              <script type="text/javascript">alert("x")</script>
              <ul><li>one</li><li>two</li></ul>
            </body></html>
        "#;

        let text = stripper.to_text(html);

        assert_eq!(text, "Title\n\nFish & chips <3\n\none\n\ntwo");
    }

    #[test]
    fn definition_declares_required_url() {
        let definition = http_get_definition();
        let schema: serde_json::Value =
            serde_json::from_str(&definition.parameters).expect("schema is json");

        assert_eq!(definition.name, HTTP_GET);
        assert_eq!(schema["required"][0], "url");
        assert_eq!(schema["properties"]["url"]["type"], "string");
    }

    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("address");
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = [0_u8; 1024];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.expect("write");
        });
        format!("http://{address}/page")
    }

    #[tokio::test]
    async fn registered_function_fetches_and_converts_html() {
        let url = serve_once("<p>Hello <i>relay</i></p>").await;
        let mut registry = ToolRegistry::new();
        register_http_get(&mut registry, reqwest::Client::new()).expect("register");

        let output = registry
            .invoke(
                HTTP_GET,
                &format!("{{\"url\":\"{url}\""),
                &ToolExecutionContext::new("chat-1"),
            )
            .await
            .expect("fetch should succeed");

        let value: serde_json::Value = serde_json::from_str(&output).expect("json output");
        assert_eq!(value["output"], "Hello relay");
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let mut registry = ToolRegistry::new();
        register_http_get(&mut registry, reqwest::Client::new()).expect("register");

        let err = registry
            .invoke(
                HTTP_GET,
                "{\"url\":\"file:///etc/passwd\"}",
                &ToolExecutionContext::new("chat-1"),
            )
            .await
            .expect_err("file url should be rejected");

        assert_eq!(err.kind, ToolErrorKind::InvalidArguments);
    }
}
