//! Chrome DevTools Protocol surface.
//!
//! Drives one browser tab through `chromiumoxide`. Elements live in a
//! page-side registry (`window.__librarian`) stamped with the surface epoch.
//! An element is interned once, so re-querying it yields the same id, and
//! the registry only holds weak references. Navigation installs a fresh
//! registry under a new epoch. A registry that vanished or carries another
//! stamp (the document reloaded on its own) bumps the epoch too, and every
//! older handle reports `Detached`.
//!
//! Two ways in:
//!
//! - [`CdpSurface::attach`]: connect to a browser already started with
//!   `--remote-debugging-port`
//! - [`CdpSurface::launch`]: start a browser on a persistent profile
//!   directory and connect to it

use async_trait::async_trait;
use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{LibrarianError, Result, SurfaceError, SurfaceResult};
use crate::traits::surface::DocumentSurface;
use crate::types::summary::ElementHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Script prefix binding `L`, `get` and `intern`, or bailing out with
/// `reset` when the registry is not the one installed for `epoch`.
fn prelude(epoch: u64) -> String {
    format!(
        r#"const L = window.__librarian;
if (!L || L.epoch !== {epoch}) return {{ reset: true }};
const get = (id) => {{ const ref = L.handles[id]; const el = ref && ref.deref(); return el && el.isConnected ? el : null; }};
const intern = (el) => {{
  let id = L.ids.get(el);
  if (id === undefined) {{ id = L.handles.length; L.handles.push(new WeakRef(el)); L.ids.set(el, id); }}
  return id;
}};"#
    )
}

fn install_registry_script(epoch: u64) -> String {
    format!(
        "(() => {{ window.__librarian = {{ epoch: {epoch}, handles: [], ids: new WeakMap(), pointer: null }}; return true; }})()"
    )
}

/// Options for launching a browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Persistent profile; keeps the user logged in between runs
    pub profile_dir: PathBuf,

    /// Show a window (needed for the first manual login)
    pub visible: bool,

    /// Debugging port the launched browser listens on
    pub port: u16,

    /// Browser binary; found on `PATH` when `None`
    pub executable: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn new(profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            profile_dir: profile_dir.into(),
            visible: false,
            port: 9222,
            executable: None,
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }
}

/// Reply envelope every page script returns.
#[derive(Debug, Deserialize)]
struct Reply<T> {
    #[serde(default)]
    reset: bool,
    #[serde(default)]
    detached: bool,
    #[serde(default)]
    error: Option<String>,
    value: Option<T>,
}

/// A browser tab as a document surface.
pub struct CdpSurface {
    browser: Mutex<Browser>,
    page: Page,
    epoch: AtomicU64,
    handler_task: tokio::task::JoinHandle<()>,
    child: Option<Child>,
}

impl CdpSurface {
    /// Attach to a running browser on `port`.
    pub async fn attach(port: u16) -> Result<Self> {
        info!(port, "Connecting to existing browser");
        let (browser, handler) = connect(port).await?;
        Self::from_parts(browser, handler, None).await
    }

    /// Launch a browser with a persistent profile and attach to it.
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let executable = match &options.executable {
            Some(path) => path.clone(),
            None => find_browser()?,
        };
        std::fs::create_dir_all(&options.profile_dir).map_err(|e| {
            LibrarianError::Browser(format!(
                "cannot create profile dir {}: {e}",
                options.profile_dir.display()
            ))
        })?;

        let mut args = vec![
            format!("--remote-debugging-port={}", options.port),
            format!("--user-data-dir={}", options.profile_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if !options.visible {
            args.push("--headless=new".to_string());
        }

        info!(
            executable = %executable.display(),
            profile = %options.profile_dir.display(),
            visible = options.visible,
            "Launching browser"
        );
        let child = Command::new(&executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LibrarianError::Browser(format!("failed to start browser: {e}")))?;

        let (browser, handler) = connect(options.port).await?;
        Self::from_parts(browser, handler, Some(child)).await
    }

    async fn from_parts(browser: Browser, handler: Handler, child: Option<Child>) -> Result<Self> {
        let handler_task = spawn_handler(handler);
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| LibrarianError::Browser(format!("cannot open tab: {e}")))?;

        let surface = Self {
            browser: Mutex::new(browser),
            page,
            epoch: AtomicU64::new(0),
            handler_task,
            child,
        };
        surface
            .eval::<bool>(install_registry_script(0))
            .await
            .map_err(|e| LibrarianError::Browser(format!("cannot prepare tab: {e}")))?;
        Ok(surface)
    }

    /// Close the tab, and the browser too if this surface launched it.
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.page.clone().close().await {
            debug!(error = %e, "Tab already closed");
        }
        if let Some(mut child) = self.child.take() {
            let mut browser = self.browser.lock().await;
            if let Err(e) = browser.close().await {
                warn!(error = %e, "Browser did not close cleanly");
            }
            if let Err(e) = child.kill() {
                debug!(error = %e, "Browser process already gone");
            }
        }
        self.handler_task.abort();
        Ok(())
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn check_epoch(&self, handle: ElementHandle) -> SurfaceResult<()> {
        if handle.epoch() != self.current_epoch() {
            return Err(SurfaceError::Detached { id: handle.id() });
        }
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> SurfaceResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| SurfaceError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| SurfaceError::Script(e.to_string()))
    }

    /// Install a fresh registry under a new epoch. Returns the new epoch.
    async fn reset_registry(&self) -> SurfaceResult<u64> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.eval::<bool>(install_registry_script(epoch)).await?;
        Ok(epoch)
    }

    async fn run<T: DeserializeOwned>(&self, body: &str) -> SurfaceResult<Reply<T>> {
        let script = format!("(() => {{ {}\n{body} }})()", prelude(self.current_epoch()));
        self.eval(script).await
    }

    /// Run a script that returns a [`Reply`].
    ///
    /// When the page lost its registry, a call on behalf of a handle fails
    /// with `Detached`; a document-level call is retried on the fresh
    /// registry.
    async fn call<T: DeserializeOwned>(&self, body: String, id: Option<u64>) -> SurfaceResult<Option<T>> {
        let mut reply: Reply<T> = self.run(&body).await?;
        if reply.reset {
            let epoch = self.reset_registry().await?;
            warn!(epoch, "Page reloaded outside navigation, element handles invalidated");
            if let Some(id) = id {
                return Err(SurfaceError::Detached { id });
            }
            reply = self.run(&body).await?;
            if reply.reset {
                return Err(SurfaceError::Script("page registry could not be installed".into()));
            }
        }
        if reply.detached {
            return Err(SurfaceError::Detached { id: id.unwrap_or(0) });
        }
        if let Some(error) = reply.error {
            return Err(SurfaceError::Script(error));
        }
        Ok(reply.value)
    }

    /// Run `body` with `el` bound to the element behind `handle`.
    async fn on_element<T: DeserializeOwned>(&self, handle: ElementHandle, body: &str) -> SurfaceResult<Option<T>> {
        self.check_epoch(handle)?;
        let id = handle.id();
        let script = format!(
            "const el = get({id});\nif (!el) return {{ detached: true }};\n{body}"
        );
        self.call(script, Some(id)).await
    }

    async fn on_element_value<T: DeserializeOwned>(&self, handle: ElementHandle, body: &str) -> SurfaceResult<T> {
        self.on_element(handle, body)
            .await?
            .ok_or_else(|| SurfaceError::Script("script returned no value".into()))
    }

    fn scope_expr(&self, scope: Option<ElementHandle>) -> SurfaceResult<String> {
        match scope {
            Some(handle) => {
                self.check_epoch(handle)?;
                Ok(format!("get({})", handle.id()))
            }
            None => Ok("document".to_string()),
        }
    }
}

impl Drop for CdpSurface {
    fn drop(&mut self) {
        self.handler_task.abort();
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
        }
    }
}

/// Embed a Rust string as a JS string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn spawn_handler(mut handler: Handler) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!(error = %e, "Browser handler event error");
            }
        }
    })
}

async fn discover_ws_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{port}/json/version");
    let response = reqwest::get(&url)
        .await
        .map_err(|e| LibrarianError::Browser(format!("cannot reach {url}: {e}")))?;
    let json: serde_json::Value = response
        .json()
        .await
        .map_err(|e| LibrarianError::Browser(format!("bad response from {url}: {e}")))?;
    json["webSocketDebuggerUrl"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LibrarianError::Browser("no webSocketDebuggerUrl in response".into()))
}

async fn connect(port: u16) -> Result<(Browser, Handler)> {
    let mut last_error = None;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match discover_ws_url(port).await {
            Ok(ws_url) => {
                debug!(ws_url = %ws_url, "Discovered CDP endpoint");
                match Browser::connect(ws_url).await {
                    Ok(parts) => return Ok(parts),
                    Err(e) => last_error = Some(LibrarianError::Browser(format!("connect failed: {e}"))),
                }
            }
            Err(e) => last_error = Some(e),
        }
        if attempt < CONNECT_ATTEMPTS {
            debug!(attempt, "CDP connection attempt failed, retrying");
            tokio::time::sleep(CONNECT_RETRY_DELAY).await;
        }
    }
    Err(last_error.unwrap_or_else(|| LibrarianError::Browser("could not connect".into())))
}

fn find_browser() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROME_EXECUTABLE") {
        return Ok(PathBuf::from(path));
    }
    [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
        "chrome",
    ]
    .iter()
    .find_map(|name| which::which(name).ok())
    .or_else(|| {
        let mac = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        mac.exists().then_some(mac)
    })
    .ok_or_else(|| LibrarianError::Browser("no Chrome or Chromium executable found".into()))
}

#[async_trait]
impl DocumentSurface for CdpSurface {
    async fn navigate(&self, url: &str) -> SurfaceResult<()> {
        info!(url, "Navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| SurfaceError::Script(format!("navigation failed: {e}")))?;
        let epoch = self.reset_registry().await?;
        debug!(epoch, "Element registry reset");
        Ok(())
    }

    async fn query(&self, scope: Option<ElementHandle>, selector: &str) -> SurfaceResult<Vec<ElementHandle>> {
        let root = self.scope_expr(scope)?;
        let selector_js = js_string(selector);
        let body = format!(
            r#"const root = {root};
if (!root) return {{ detached: true }};
let found;
try {{ found = Array.from(root.querySelectorAll({selector_js})); }}
catch (e) {{ return {{ error: "invalid selector" }}; }}
return {{ value: found.map(intern) }};"#
        );
        let ids: Vec<u64> = self
            .call(body, scope.map(|s| s.id()))
            .await
            .map_err(|e| match e {
                SurfaceError::Script(msg) if msg == "invalid selector" => SurfaceError::InvalidSelector {
                    selector: selector.to_string(),
                },
                other => other,
            })?
            .unwrap_or_default();
        let epoch = self.current_epoch();
        Ok(ids.into_iter().map(|id| ElementHandle::new(id, epoch)).collect())
    }

    async fn count(&self, scope: Option<ElementHandle>, selector: &str) -> SurfaceResult<usize> {
        let root = self.scope_expr(scope)?;
        let selector_js = js_string(selector);
        let body = format!(
            r#"const root = {root};
if (!root) return {{ detached: true }};
try {{ return {{ value: root.querySelectorAll({selector_js}).length }}; }}
catch (e) {{ return {{ error: "invalid selector" }}; }}"#
        );
        self.call(body, scope.map(|s| s.id()))
            .await
            .map(Option::unwrap_or_default)
    }

    async fn inner_text(&self, element: ElementHandle) -> SurfaceResult<String> {
        self.on_element_value(element, "return { value: el.innerText || '' };")
            .await
    }

    async fn inner_html(&self, element: ElementHandle) -> SurfaceResult<String> {
        self.on_element_value(element, "return { value: el.innerHTML };")
            .await
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> SurfaceResult<Option<String>> {
        let body = format!("return {{ value: el.getAttribute({}) }};", js_string(name));
        self.on_element(element, &body).await
    }

    async fn vertical_offset(&self, element: ElementHandle) -> SurfaceResult<Option<f64>> {
        self.on_element(
            element,
            r#"const r = el.getBoundingClientRect();
return { value: (r.width === 0 && r.height === 0) ? null : r.top + window.scrollY };"#,
        )
        .await
    }

    async fn page_text(&self) -> SurfaceResult<String> {
        self.eval("document.body ? document.body.innerText : ''".to_string())
            .await
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> SurfaceResult<ElementHandle> {
        let started = Instant::now();
        loop {
            if self.count(None, selector).await? > 0 {
                if let Some(first) = self.query(None, selector).await?.into_iter().next() {
                    return Ok(first);
                }
            }
            if started.elapsed() >= timeout {
                return Err(SurfaceError::Timeout {
                    what: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> SurfaceResult<()> {
        let body = format!(
            r#"let node = L.pointer && L.pointer.isConnected ? L.pointer : null;
while (node && node !== document.body) {{
  const style = getComputedStyle(node);
  if (/(auto|scroll)/.test(style.overflowY) && node.scrollHeight > node.clientHeight) {{
    node.scrollBy({dx}, {dy});
    return {{ value: true }};
  }}
  node = node.parentElement;
}}
window.scrollBy({dx}, {dy});
return {{ value: false }};"#
        );
        let scrolled_region: Option<bool> = self.call(body, None).await?;
        debug!(dy, region = scrolled_region.unwrap_or(false), "Scrolled");
        Ok(())
    }

    async fn hover_or_focus(&self, element: ElementHandle) -> SurfaceResult<()> {
        self.on_element_value::<bool>(
            element,
            r#"el.scrollIntoView({ block: 'end' });
for (const type of ['mouseover', 'mouseenter', 'mousemove']) {
  el.dispatchEvent(new MouseEvent(type, { bubbles: true }));
}
if (typeof el.focus === 'function') el.focus({ preventScroll: true });
L.pointer = el;
return { value: true };"#,
        )
        .await
        .map(|_| ())
    }

    async fn click(&self, element: ElementHandle) -> SurfaceResult<()> {
        self.on_element_value::<bool>(element, "el.click(); return { value: true };")
            .await
            .map(|_| ())
    }

    fn name(&self) -> &str {
        "cdp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a[href^="/c/"]"#), r#""a[href^=\"/c/\"]""#);
        assert_eq!(js_string("div[role='button']"), r#""div[role='button']""#);
    }

    #[test]
    fn test_reply_parsing() {
        let reply: Reply<Vec<u64>> = serde_json::from_str(r#"{"value":[0,1]}"#).unwrap();
        assert!(!reply.detached);
        assert_eq!(reply.value, Some(vec![0, 1]));

        let reply: Reply<String> = serde_json::from_str(r#"{"detached":true}"#).unwrap();
        assert!(reply.detached);

        let reply: Reply<String> = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert_eq!(reply.value, None);
    }

    #[test]
    fn test_reset_reply_parses() {
        let reply: Reply<Vec<u64>> = serde_json::from_str(r#"{"reset":true}"#).unwrap();
        assert!(reply.reset);
        assert!(reply.value.is_none());

        let reply: Reply<Vec<u64>> = serde_json::from_str(r#"{"value":[]}"#).unwrap();
        assert!(!reply.reset);
    }

    #[test]
    fn test_prelude_checks_registry_stamp() {
        let script = prelude(7);
        assert!(script.contains("L.epoch !== 7"));
        assert!(script.contains("return { reset: true }"));
        assert!(install_registry_script(7).contains("epoch: 7"));
    }

    #[test]
    fn test_registry_interns_weakly() {
        let script = prelude(1);
        assert!(script.contains("L.ids.get(el)"));
        assert!(script.contains("new WeakRef(el)"));
        assert!(install_registry_script(1).contains("ids: new WeakMap()"));
    }

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new("/tmp/profile")
            .with_visible(true)
            .with_port(9333);
        assert!(opts.visible);
        assert_eq!(opts.port, 9333);
        assert!(opts.executable.is_none());

        let opts = opts.with_executable("/opt/chromium/chrome");
        assert_eq!(opts.executable, Some(PathBuf::from("/opt/chromium/chrome")));
    }
}
