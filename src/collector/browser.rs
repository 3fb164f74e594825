//! Scripted-browser rendering with liveness probing and restart

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::collector::config::CollectorConfig;
use crate::error::Error as CrateError;

/// Error type for scripted-browser operations
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// A command to a running browser failed
    #[error("Browser session error: {0}")]
    Session(String),

    /// The page could not be loaded
    #[error("Failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },
}

impl From<BrowserError> for CrateError {
    fn from(err: BrowserError) -> Self {
        CrateError::Browser(err.to_string())
    }
}

/// A browser that renders a page after interacting with it
pub trait ScriptedBrowser: Send + Sync {
    /// Load `url`, scroll to, click and hover elements matching `selectors`,
    /// and return the final markup.
    fn render(
        &self,
        url: &str,
        selectors: &[String],
    ) -> impl Future<Output = Result<String, BrowserError>> + Send;

    /// Whether the session still answers commands
    fn is_alive(&self) -> impl Future<Output = bool> + Send;

    /// Replace the session with a fresh one
    fn restart(&self) -> impl Future<Output = Result<(), BrowserError>> + Send;
}

/// Wraps a [`ScriptedBrowser`] so a dead session never ends collection.
///
/// Before each render the session is probed; a failed probe or a failed
/// render restarts it and the render is tried once more.
#[derive(Debug)]
pub struct ResilientBrowser<B: ScriptedBrowser> {
    inner: B,
    restarts: AtomicUsize,
}

impl<B: ScriptedBrowser> ResilientBrowser<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Number of restarts performed so far
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    async fn restart(&self, why: &str) -> Result<(), BrowserError> {
        warn!("restarting browser session: {}", why);
        self.restarts.fetch_add(1, Ordering::SeqCst);
        self.inner.restart().await
    }

    pub async fn render(&self, url: &str, selectors: &[String]) -> Result<String, BrowserError> {
        if !self.inner.is_alive().await {
            self.restart("liveness probe failed").await?;
        }

        match self.inner.render(url, selectors).await {
            Ok(html) => Ok(html),
            Err(e) => {
                self.restart(&e.to_string()).await?;
                self.inner.render(url, selectors).await
            }
        }
    }
}

#[derive(Debug, Clone)]
struct ChromeSettings {
    user_agent: String,
    page_load_timeout: Duration,
    settle: Duration,
    interaction_pause: Duration,
    interaction_limit: usize,
}

struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    async fn launch(settings: &ChromeSettings) -> Result<Self, BrowserError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .request_timeout(settings.page_load_timeout)
            .build()
            .map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        // The CDP connection only makes progress while its handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?;
        page.set_user_agent(settings.user_agent.as_str())
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?;

        info!("browser session started");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    async fn render(&self, url: &str, selectors: &[String], settings: &ChromeSettings) -> Result<String, BrowserError> {
        let navigation_error = |reason: String| BrowserError::Navigation {
            url: url.to_string(),
            reason,
        };

        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, CdpError>(())
        };
        tokio::time::timeout(settings.page_load_timeout, navigation)
            .await
            .map_err(|_| navigation_error("page load timed out".to_string()))?
            .map_err(|e| navigation_error(e.to_string()))?;
        tokio::time::sleep(settings.settle).await;

        for selector in selectors {
            let Ok(elements) = self.page.find_elements(selector.as_str()).await else {
                continue;
            };
            for element in elements.iter().take(settings.interaction_limit) {
                // Interaction failures are expected on hidden or detached elements
                if element.scroll_into_view().await.is_err() {
                    continue;
                }
                tokio::time::sleep(settings.interaction_pause).await;
                let _ = element.click().await;
                tokio::time::sleep(settings.interaction_pause).await;
                let _ = element.hover().await;
            }
        }
        tokio::time::sleep(settings.settle).await;

        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))
    }

    async fn is_alive(&self) -> bool {
        !self.handler.is_finished() && self.page.evaluate("document.readyState").await.is_ok()
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!(error = %e, "browser close failed");
        }
        self.handler.abort();
    }
}

/// Headless Chromium driven over the DevTools protocol.
///
/// The browser process starts lazily on first render. Clones share one
/// session, and renders are serialized on it.
#[derive(Clone)]
pub struct ChromeBrowser {
    session: Arc<Mutex<Option<ChromeSession>>>,
    settings: ChromeSettings,
}

impl std::fmt::Debug for ChromeBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeBrowser")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChromeBrowser {
    pub fn new(config: &CollectorConfig, user_agent: impl Into<String>) -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            settings: ChromeSettings {
                user_agent: user_agent.into(),
                page_load_timeout: config.page_load_timeout(),
                settle: config.settle(),
                interaction_pause: config.interaction_pause(),
                interaction_limit: config.interaction_limit,
            },
        }
    }
}

impl ScriptedBrowser for ChromeBrowser {
    async fn render(&self, url: &str, selectors: &[String]) -> Result<String, BrowserError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            *session = Some(ChromeSession::launch(&self.settings).await?);
        }
        match session.as_ref() {
            Some(active) => active.render(url, selectors, &self.settings).await,
            None => Err(BrowserError::Session("no browser session".to_string())),
        }
    }

    async fn is_alive(&self) -> bool {
        // A session that was never started is not dead; render starts it
        match self.session.lock().await.as_ref() {
            Some(active) => active.is_alive().await,
            None => true,
        }
    }

    async fn restart(&self) -> Result<(), BrowserError> {
        let mut session = self.session.lock().await;
        if let Some(previous) = session.take() {
            previous.close().await;
            debug!("closed previous browser session");
        }
        *session = Some(ChromeSession::launch(&self.settings).await?);
        Ok(())
    }
}
