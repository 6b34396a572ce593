//! Headless-browser pool: one Chrome process, short-lived page contexts,
//! lazily launched. The browser handle itself never escapes this module.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{EnableParams, RequestPattern};
use chromiumoxide::cdp::browser_protocol::network::{ResourceType, SetUserAgentOverrideParams};
use futures_util::StreamExt;
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::BrowserPoolError;

const NAV_TIMEOUT: Duration = Duration::from_secs(45);
const HYDRATION_SETTLE: Duration = Duration::from_secs(2);
const BLOCKED_RESOURCE_TYPES: &[ResourceType] = &[
    ResourceType::Image,
    ResourceType::Stylesheet,
    ResourceType::Font,
    ResourceType::Media,
];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.0.0",
];

struct BrowserHandle {
    browser: Browser,
    _handler_task: JoinHandle<()>,
}

/// Owns the single headless-browser process for the whole service.
pub struct BrowserPool {
    inner: Mutex<Option<BrowserHandle>>,
    executable_path: Option<String>,
}

impl BrowserPool {
    pub fn new(executable_path: Option<String>) -> Self {
        Self {
            inner: Mutex::new(None),
            executable_path,
        }
    }

    /// Fetch a page's post-hydration HTML. Launches the browser on first
    /// use; re-launches automatically after a crash is detected.
    pub async fn fetch(&self, url: &str) -> Result<String, BrowserPoolError> {
        let mut guard = self.inner.lock().await;

        if guard.is_none() {
            *guard = Some(self.launch().await?);
        }

        let browser = &guard.as_ref().unwrap().browser;
        match Self::fetch_with(browser, url).await {
            Ok(html) => Ok(html),
            Err(err) => {
                if BrowserPoolError::indicates_dead_session(&err.to_string()) {
                    warn!(url, "browser session appears dead, will relaunch on next call");
                    *guard = None;
                    return Err(BrowserPoolError::BrowserCrashed);
                }
                Err(err)
            }
        }
    }

    async fn launch(&self) -> Result<BrowserHandle, BrowserPoolError> {
        let mut builder = BrowserConfig::builder()
            .viewport(None) // per-page viewport is set explicitly below
            .window_size(1920, 1080);

        if let Some(path) = &self.executable_path {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| BrowserPoolError::LaunchFailed(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserPoolError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "chromiumoxide handler event error");
                }
            }
        });

        info!("headless browser launched");

        Ok(BrowserHandle {
            browser,
            _handler_task: handler_task,
        })
    }

    async fn fetch_with(browser: &Browser, url: &str) -> Result<String, BrowserPoolError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserPoolError::NavigationFailed(e.to_string()))?;

        let result = Self::navigate_and_capture(&page, url).await;

        // Page context is always released, regardless of outcome.
        let _ = page.close().await;

        result
    }

    async fn navigate_and_capture(
        page: &chromiumoxide::Page,
        url: &str,
    ) -> Result<String, BrowserPoolError> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let _ = page
            .execute(SetUserAgentOverrideParams::new(user_agent))
            .await;

        let _ = page
            .execute(
                SetDeviceMetricsOverrideParams::builder()
                    .width(1920)
                    .height(1080)
                    .device_scale_factor(1.0)
                    .mobile(false)
                    .build()
                    .unwrap(),
            )
            .await;

        let block_patterns: Vec<RequestPattern> = BLOCKED_RESOURCE_TYPES
            .iter()
            .map(|rt| {
                RequestPattern::builder()
                    .url_pattern("*")
                    .resource_type(*rt)
                    .build()
            })
            .collect();
        let _ = page
            .execute(EnableParams::builder().patterns(block_patterns).build())
            .await;

        timeout(NAV_TIMEOUT, async {
            page.goto(url)
                .await
                .map_err(|e| BrowserPoolError::NavigationFailed(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| BrowserPoolError::NavigationFailed(e.to_string()))?;
            tokio::time::sleep(HYDRATION_SETTLE).await;
            page.content()
                .await
                .map_err(|e| BrowserPoolError::NavigationFailed(e.to_string()))
        })
        .await
        .map_err(|_| BrowserPoolError::FetchTimeout)?
    }
}
