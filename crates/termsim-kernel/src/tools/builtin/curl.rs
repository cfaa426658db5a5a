//! curl, wget — Fetch a URL over the real network.
//!
//! The request itself is blocking `ureq`, so it runs on a blocking task.
//! The session waits on it under `tokio::time::timeout` and also watches
//! the interrupt flag; whichever finishes first decides the result. A
//! request abandoned by a timeout or Ctrl-C finishes in the background
//! and its response is dropped.

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use crate::interpreter::{push_line, ExecResult};
use crate::scheduler::InterruptHandle;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

use super::sleep::INTERRUPTED;

const USER_AGENT: &str = "curl/7.81.0";
const WGET_AGENT: &str = "Wget/1.21.2";
const MAX_REDIRECTS: u32 = 10;
/// Bodies beyond this are cut off.
const MAX_BODY: u64 = 10 * 1024 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A parsed `http` or `https` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    url: Url,
    host: String,
    port: u16,
    /// Path plus query, as sent on the request line.
    path: String,
}

impl Target {
    /// Parse a URL the way curl does, assuming `http://` when no scheme
    /// is given.
    fn parse(raw: &str) -> Result<Self, FetchError> {
        let text = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };
        let (scheme, rest) = text.split_once("://").ok_or(FetchError::BadUrl)?;
        let scheme = scheme.to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(FetchError::UnsupportedProtocol(scheme));
        }
        // The url crate reads `http:///x` as host `x`; curl calls it malformed
        if rest.is_empty() || rest.starts_with('/') {
            return Err(FetchError::BadUrl);
        }

        let url = Url::parse(&text).map_err(|_| FetchError::BadUrl)?;
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or(FetchError::BadUrl)?
            .to_string();
        let port = url.port_or_known_default().ok_or(FetchError::BadUrl)?;
        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        Ok(Self { url, host, port, path })
    }

    /// Last path segment.
    fn remote_name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum FetchError {
    #[error("URL using bad/illegal format or missing URL")]
    BadUrl,
    #[error("protocol {0} not supported")]
    UnsupportedProtocol(String),
    #[error("could not resolve host {0}")]
    Resolve(String),
    #[error("failed to connect to {0}")]
    Connect(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("interrupted")]
    Interrupted,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone)]
struct FetchRequest {
    target: Target,
    method: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
    follow_redirects: bool,
    user_agent: &'static str,
}

impl FetchRequest {
    fn get(target: Target, user_agent: &'static str) -> Self {
        Self {
            target,
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
            follow_redirects: false,
            user_agent,
        }
    }

    /// Blocking half of a fetch; runs on the blocking pool.
    fn perform(self, timeout: Duration) -> Result<FetchResponse, FetchError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(if self.follow_redirects { MAX_REDIRECTS } else { 0 })
            .user_agent(self.user_agent)
            .build();

        let mut call = agent.request(&self.method, self.target.url.as_str());
        for (name, value) in &self.headers {
            call = call.set(name, value);
        }
        let outcome = match &self.body {
            Some(data) => call.send_string(data),
            None => call.call(),
        };
        let response = match outcome {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(classify(&transport, &self.target.host, timeout))
            }
        };
        FetchResponse::read(response, timeout)
    }
}

fn classify(transport: &ureq::Transport, host: &str, timeout: Duration) -> FetchError {
    let message = transport.to_string();
    if message.contains("timed out") {
        return FetchError::Timeout(timeout);
    }
    match transport.kind() {
        ureq::ErrorKind::Dns => FetchError::Resolve(host.to_string()),
        ureq::ErrorKind::ConnectionFailed => FetchError::Connect(host.to_string()),
        ureq::ErrorKind::InvalidUrl => FetchError::BadUrl,
        ureq::ErrorKind::UnknownScheme => FetchError::UnsupportedProtocol(message),
        _ => FetchError::Other(message),
    }
}

#[derive(Debug, Clone, Default)]
struct FetchResponse {
    version: String,
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl FetchResponse {
    fn read(response: ureq::Response, timeout: Duration) -> Result<Self, FetchError> {
        let headers = response
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = response.header(&name)?.to_string();
                Some((name, value))
            })
            .collect();
        let mut fetched = Self {
            version: response.http_version().to_string(),
            status: response.status(),
            status_text: response.status_text().to_string(),
            headers,
            body: Vec::new(),
        };
        response
            .into_reader()
            .take(MAX_BODY)
            .read_to_end(&mut fetched.body)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => FetchError::Timeout(timeout),
                _ => FetchError::Other(e.to_string()),
            })?;
        Ok(fetched)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status line plus headers, CRLF-terminated like the wire.
    fn head_text(&self) -> String {
        let mut text = format!("{} {} {}\r\n", self.version, self.status, self.status_text);
        for (name, value) in &self.headers {
            text.push_str(&format!("{name}: {value}\r\n"));
        }
        text.push_str("\r\n");
        text
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Run a request off the session thread, bounded by `timeout` and the
/// interrupt flag.
async fn fetch(
    request: FetchRequest,
    timeout: Duration,
    interrupt: &InterruptHandle,
) -> Result<FetchResponse, FetchError> {
    if interrupt.is_set() {
        return Err(FetchError::Interrupted);
    }
    tracing::debug!(url = %request.target.url, host = %request.target.host, path = %request.target.path, method = %request.method, "fetch");

    let interrupt = interrupt.clone();
    let task = tokio::task::spawn_blocking(move || request.perform(timeout));
    let watch = async move {
        while !interrupt.is_set() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    tokio::select! {
        joined = tokio::time::timeout(timeout, task) => match joined {
            Err(_) => Err(FetchError::Timeout(timeout)),
            Ok(Err(join)) => Err(FetchError::Other(join.to_string())),
            Ok(Ok(outcome)) => outcome,
        },
        () = watch => Err(FetchError::Interrupted),
    }
}

fn timeout_override(args: &ToolArgs, key: &str, ctx: &ExecContext) -> Result<Duration, String> {
    match args.get_named(key) {
        None => Ok(ctx.fetch_timeout),
        Some(text) => text
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or_else(|| text.to_string()),
    }
}

/// curl's `(code) message` for a failed transfer.
fn curl_error(error: &FetchError, target: Option<&Target>) -> (i64, String) {
    let host = target.map(|t| t.host.as_str()).unwrap_or_default();
    match error {
        FetchError::BadUrl => (3, "curl: (3) URL using bad/illegal format or missing URL".to_string()),
        FetchError::UnsupportedProtocol(scheme) => (
            1,
            format!("curl: (1) Protocol \"{scheme}\" not supported or disabled in libcurl"),
        ),
        FetchError::Resolve(host) => (6, format!("curl: (6) Could not resolve host: {host}")),
        FetchError::Connect(host) => {
            let port = target.map(|t| t.port).unwrap_or(80);
            (
                7,
                format!("curl: (7) Failed to connect to {host} port {port} after 0 ms: Connection refused"),
            )
        }
        FetchError::Timeout(after) => (
            28,
            format!(
                "curl: (28) Operation timed out after {} milliseconds with 0 bytes received",
                after.as_millis()
            ),
        ),
        FetchError::Interrupted => (INTERRUPTED, String::new()),
        FetchError::Other(message) => (56, format!("curl: (56) Failure when receiving data from {host}: {message}")),
    }
}

/// Curl tool: transfer a URL.
pub struct Curl;

#[async_trait]
impl Tool for Curl {
    fn name(&self) -> &str {
        "curl"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("curl", "Transfer a URL")
            .param(ParamSchema::flag("silent", "Silent mode").with_aliases(["-s"]))
            .param(ParamSchema::flag("show-error", "Show error even when -s is used").with_aliases(["-S"]))
            .param(ParamSchema::flag("head", "Show document info only").with_aliases(["-I"]))
            .param(ParamSchema::flag("include", "Include protocol response headers in the output").with_aliases(["-i"]))
            .param(ParamSchema::flag("location", "Follow redirects").with_aliases(["-L"]))
            .param(ParamSchema::flag("fail", "Fail silently on HTTP errors").with_aliases(["-f"]))
            .param(ParamSchema::option("output", "Write to file instead of stdout").with_aliases(["-o"]))
            .param(ParamSchema::flag("remote-name", "Write output to a file named as the remote file").with_aliases(["-O"]))
            .param(ParamSchema::option("request", "Specify request method to use").with_aliases(["-X"]))
            .param(ParamSchema::option("data", "HTTP POST data").with_aliases(["-d"]))
            .param(ParamSchema::option("header", "Pass custom header to server").with_aliases(["-H"]))
            .param(ParamSchema::option("max-time", "Maximum time allowed for transfer, in seconds").with_aliases(["-m"]))
            .example("Print a page", "curl -s https://example.com")
            .example("Headers only", "curl -I https://example.com")
            .example("Save to a file", "curl -o page.html https://example.com")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(raw) = args.get_positional(0) else {
            return ExecResult::failure(
                2,
                "curl: try 'curl --help' or 'curl --manual' for more information",
            );
        };
        let silent = args.has_flag("silent") && !args.has_flag("show-error");
        let fail = |error: &FetchError, target: Option<&Target>| {
            let (code, message) = curl_error(error, target);
            ExecResult::failure(code, if silent { String::new() } else { message })
        };

        let target = match Target::parse(raw) {
            Ok(target) => target,
            Err(e) => return fail(&e, None),
        };
        let timeout = match timeout_override(&args, "max-time", ctx) {
            Ok(timeout) => timeout,
            Err(bad) => {
                return ExecResult::failure(2, format!("curl: option --max-time: expected a proper numerical parameter: {bad}"))
            }
        };

        let mut request = FetchRequest::get(target.clone(), USER_AGENT);
        request.follow_redirects = args.has_flag("location");
        if let Some(data) = args.get_named("data") {
            request.method = "POST".to_string();
            request.body = Some(data.to_string());
            request
                .headers
                .push(("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string()));
        }
        if args.has_flag("head") {
            request.method = "HEAD".to_string();
        }
        if let Some(method) = args.get_named("request") {
            request.method = method.to_ascii_uppercase();
        }
        if let Some((name, value)) = args.get_named("header").and_then(|h| h.split_once(':')) {
            request.headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let response = match fetch(request, timeout, &ctx.interrupt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "curl failed");
                return fail(&e, Some(&target));
            }
        };

        if args.has_flag("fail") && response.status >= 400 {
            let message = format!("curl: (22) The requested URL returned error: {}", response.status);
            return ExecResult::failure(22, if silent { String::new() } else { message });
        }

        let mut out = String::new();
        if args.has_flag("head") || args.has_flag("include") {
            out.push_str(&response.head_text());
        }
        if !args.has_flag("head") {
            out.push_str(&response.body_text());
        }

        let destination = if args.has_flag("remote-name") {
            match target.remote_name() {
                "" => return ExecResult::failure(23, "curl: Remote file name has no length!"),
                name => Some(name.to_string()),
            }
        } else {
            args.get_named("output").map(str::to_string)
        };
        match destination {
            Some(name) if name != "-" => {
                let resolved = ctx.resolve_path(&name);
                let data = if args.has_flag("head") { out.as_bytes() } else { &response.body };
                match ctx.vfs.write(&resolved, data, false) {
                    Ok(()) => ExecResult::success(""),
                    Err(e) => {
                        tracing::debug!(error = %e, file = %name, "curl could not write output");
                        ExecResult::failure(23, "curl: (23) Failure writing output to destination")
                    }
                }
            }
            _ => ExecResult::success(out),
        }
    }
}

/// A file name under cwd that does not exist yet: `name`, `name.1`, ...
fn unique_name(ctx: &ExecContext, name: &str) -> String {
    if !ctx.vfs.exists(&ctx.resolve_path(name)) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}.{n}"))
        .find(|candidate| !ctx.vfs.exists(&ctx.resolve_path(candidate)))
        .unwrap_or_else(|| name.to_string())
}

/// wget's last words for a failed retrieval.
fn wget_error(error: &FetchError, shown: &str, port: u16) -> (i64, String) {
    match error {
        FetchError::BadUrl => (1, format!("{shown}: Invalid URL.")),
        FetchError::UnsupportedProtocol(scheme) => (1, format!("{shown}: Unsupported scheme ‘{scheme}’.")),
        FetchError::Resolve(host) => (4, format!("wget: unable to resolve host address ‘{host}’")),
        FetchError::Connect(host) => (
            4,
            format!("Connecting to {host} ({host})|:{port}... failed: Connection refused."),
        ),
        FetchError::Timeout(_) => (4, "Read error (Connection timed out) in headers.".to_string()),
        FetchError::Interrupted => (INTERRUPTED, String::new()),
        FetchError::Other(message) => (4, format!("wget: {message}")),
    }
}

/// Wget tool: non-interactive download into the VFS.
pub struct Wget;

#[async_trait]
impl Tool for Wget {
    fn name(&self) -> &str {
        "wget"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("wget", "The non-interactive network downloader")
            .param(ParamSchema::option("output-document", "Write documents to FILE ('-' for stdout)").with_aliases(["-O"]))
            .param(ParamSchema::flag("quiet", "Quiet (no output)").with_aliases(["-q"]))
            .param(ParamSchema::option("timeout", "Set all timeout values to SECONDS").with_aliases(["-T"]))
            .example("Download a page", "wget https://example.com/index.html")
            .example("Print to stdout", "wget -qO- https://example.com")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(raw) = args.get_positional(0) else {
            return ExecResult::failure(
                1,
                "wget: missing URL\nUsage: wget [OPTION]... [URL]...\n\nTry `wget --help' for more options.",
            );
        };
        let quiet = args.has_flag("quiet");
        let timeout = match timeout_override(&args, "timeout", ctx) {
            Ok(timeout) => timeout,
            Err(bad) => return ExecResult::failure(2, format!("wget: --timeout: Invalid time period ‘{bad}’")),
        };

        let target = match Target::parse(raw) {
            Ok(target) => target,
            Err(e) => {
                let (code, message) = wget_error(&e, raw, 80);
                return ExecResult::failure(code, message);
            }
        };

        let mut transcript = String::new();
        let stamp = || Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        push_line(&mut transcript, &format!("--{}--  {}", stamp(), target.url));
        push_line(&mut transcript, &format!("Resolving {0} ({0})... ", target.host));

        let response = match fetch(FetchRequest::get(target.clone(), WGET_AGENT), timeout, &ctx.interrupt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "wget failed");
                let (code, message) = wget_error(&e, target.url.as_str(), target.port);
                push_line(&mut transcript, &message);
                return ExecResult::failure(code, if quiet { String::new() } else { transcript });
            }
        };

        push_line(
            &mut transcript,
            &format!("Connecting to {0} ({0})|:{1}... connected.", target.host, target.port),
        );
        push_line(
            &mut transcript,
            &format!("HTTP request sent, awaiting response... {} {}", response.status, response.status_text),
        );
        if response.status >= 400 {
            push_line(
                &mut transcript,
                &format!("{} ERROR {}: {}.", stamp(), response.status, response.status_text),
            );
            return ExecResult::failure(8, if quiet { String::new() } else { transcript });
        }

        let kind = response.header("content-type").unwrap_or("application/octet-stream");
        push_line(&mut transcript, &format!("Length: {} [{kind}]", response.body.len()));

        let name = match args.get_named("output-document") {
            Some("-") => {
                push_line(&mut transcript, "Saving to: ‘STDOUT’");
                return ExecResult::from_output(0, response.body_text(), if quiet { String::new() } else { transcript });
            }
            Some(name) => name.to_string(),
            None => unique_name(ctx, default_name(&target)),
        };
        push_line(&mut transcript, &format!("Saving to: ‘{name}’\n\n"));

        let resolved = ctx.resolve_path(&name);
        if let Err(e) = ctx.vfs.write(&resolved, &response.body, false) {
            return ExecResult::failure(3, format!("{name}: {}", e.reason()));
        }
        push_line(
            &mut transcript,
            &format!("{} - ‘{name}’ saved [{1}/{1}]\n", stamp(), response.body.len()),
        );
        ExecResult::from_output(0, "", if quiet { String::new() } else { transcript })
    }
}

fn default_name(target: &Target) -> &str {
    match target.remote_name() {
        "" => "index.html",
        name => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};
    use rstest::rstest;

    #[rstest]
    #[case("http://example.com", "example.com", 80, "/")]
    #[case("https://example.com/a/b.txt?x=1", "example.com", 443, "/a/b.txt?x=1")]
    #[case("example.com:8080/x", "example.com", 8080, "/x")]
    #[case("http://user@host.local:81", "host.local", 81, "/")]
    #[case("HTTP://Example.COM/Docs/", "example.com", 80, "/Docs/")]
    #[case("https://example.com:8443/a%20b?q=1#frag", "example.com", 8443, "/a%20b?q=1")]
    fn urls(#[case] raw: &str, #[case] host: &str, #[case] port: u16, #[case] path: &str) {
        let target = Target::parse(raw).unwrap();
        assert_eq!((target.host.as_str(), target.port, target.path.as_str()), (host, port, path));
    }

    #[rstest]
    #[case("ftp://example.com/file", FetchError::UnsupportedProtocol("ftp".to_string()))]
    #[case("http://", FetchError::BadUrl)]
    #[case("http:///path", FetchError::BadUrl)]
    #[case("http://exa mple.com/", FetchError::BadUrl)]
    #[case("http://example.com:99999/", FetchError::BadUrl)]
    fn bad_urls(#[case] raw: &str, #[case] expected: FetchError) {
        assert_eq!(Target::parse(raw), Err(expected));
    }

    #[rstest]
    #[case("http://example.com", "index.html")]
    #[case("http://example.com/", "index.html")]
    #[case("http://example.com/files/report.pdf?dl=1", "report.pdf")]
    fn download_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(default_name(&Target::parse(raw).unwrap()), expected);
    }

    #[test]
    fn curl_error_messages() {
        let target = Target::parse("http://nowhere.invalid").unwrap();
        assert_eq!(
            curl_error(&FetchError::Resolve("nowhere.invalid".into()), Some(&target)),
            (6, "curl: (6) Could not resolve host: nowhere.invalid".to_string())
        );
        assert_eq!(
            curl_error(&FetchError::Timeout(Duration::from_secs(2)), Some(&target)).1,
            "curl: (28) Operation timed out after 2000 milliseconds with 0 bytes received"
        );
        assert_eq!(curl_error(&FetchError::Connect("nowhere.invalid".into()), Some(&target)).0, 7);
    }

    #[test]
    fn head_text_is_crlf() {
        let response = FetchResponse {
            version: "HTTP/1.1".to_string(),
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: b"<html></html>".to_vec(),
        };
        assert_eq!(response.head_text(), "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\n\r\n");
        assert_eq!(response.header("Content-Type"), Some("text/html"));
    }

    #[test]
    fn downloads_never_overwrite() {
        let mut ctx = make_ctx();
        assert_eq!(unique_name(&ctx, "index.html"), "index.html");
        ctx.vfs.write("/home/user/index.html", b"", false).unwrap();
        ctx.vfs.write("/home/user/index.html.1", b"", false).unwrap();
        assert_eq!(unique_name(&ctx, "index.html"), "index.html.2");
    }

    #[tokio::test]
    async fn curl_rejects_unsupported_protocols() {
        let mut ctx = make_ctx();
        let result = run_tool(&Curl, &mut ctx, &["ftp://example.com/file"]).await;
        assert_eq!(result.code, 1);
        assert_eq!(result.err, "curl: (1) Protocol \"ftp\" not supported or disabled in libcurl");

        let silent = run_tool(&Curl, &mut ctx, &["-s", "ftp://example.com/file"]).await;
        assert_eq!(silent.code, 1);
        assert_eq!(silent.err, "");
    }

    #[tokio::test]
    async fn curl_without_url() {
        let mut ctx = make_ctx();
        let result = run_tool(&Curl, &mut ctx, &[]).await;
        assert_eq!(result.code, 2);
    }

    #[tokio::test]
    async fn interrupted_before_connecting() {
        let mut ctx = make_ctx();
        ctx.interrupt.interrupt();
        assert_eq!(run_tool(&Curl, &mut ctx, &["http://example.com"]).await.code, INTERRUPTED);
        assert_eq!(run_tool(&Wget, &mut ctx, &["http://example.com"]).await.code, INTERRUPTED);
        assert!(!ctx.vfs.exists("/home/user/index.html"));
    }

    #[tokio::test]
    async fn wget_rejects_unsupported_schemes() {
        let mut ctx = make_ctx();
        let result = run_tool(&Wget, &mut ctx, &["ftp://example.com/x"]).await;
        assert_eq!(result.code, 1);
        assert_eq!(result.err, "ftp://example.com/x: Unsupported scheme ‘ftp’.");
    }

    #[tokio::test]
    async fn wget_without_url() {
        let mut ctx = make_ctx();
        let result = run_tool(&Wget, &mut ctx, &[]).await;
        assert!(result.err.starts_with("wget: missing URL"));
    }
}
