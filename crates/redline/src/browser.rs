//! Browser control for headless testing.
//!
//! Real browser control goes through the Chrome `DevTools` Protocol via
//! chromiumoxide when the `browser` feature is enabled. One browser process
//! is shared by a run; every test case gets its own page.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{PageDriver, Session};
    use crate::locator::{ElementProbe, Selector};
    use crate::result::{RedlineError, RedlineResult};
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams, EventFrameStartedLoading,
    };
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::{Stream, StreamExt};
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// How long a click may take to start a main-frame navigation
    const CLICK_NAVIGATION_GRACE: Duration = Duration::from_millis(2_000);

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Mutex<CdpBrowser>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance with real CDP
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> RedlineResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| RedlineError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                RedlineError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::debug!(headless = config.headless, "browser launched");

            Ok(Self {
                config,
                inner: Mutex::new(browser),
                handle,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> RedlineResult<()> {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| RedlineError::BrowserLaunchError {
                    message: e.to_string(),
                })?;
            self.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl Session for Browser {
        async fn new_page(&self) -> RedlineResult<Box<dyn PageDriver>> {
            let browser = self.inner.lock().await;
            let inner = browser
                .new_page("about:blank")
                .await
                .map_err(|e| RedlineError::PageError {
                    message: e.to_string(),
                })?;
            Ok(Box::new(Page { inner }))
        }

        fn name(&self) -> &'static str {
            "cdp"
        }
    }

    /// A browser page with real CDP connection
    #[derive(Debug)]
    pub struct Page {
        inner: CdpPage,
    }

    impl Page {
        async fn eval_json<T: serde::de::DeserializeOwned>(&self, expr: &str) -> RedlineResult<T> {
            // JSON.stringify keeps `null` distinguishable from "no value"
            let wrapped = format!("JSON.stringify({expr})");
            let raw: String = self
                .inner
                .evaluate(wrapped)
                .await
                .map_err(page_error)?
                .into_value()?;
            Ok(serde_json::from_str(&raw)?)
        }
    }

    #[async_trait]
    impl PageDriver for Page {
        async fn goto(&mut self, url: &str) -> RedlineResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| RedlineError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn click(&mut self, selector: &Selector) -> RedlineResult<()> {
            // Subscribe before clicking: the navigation starts after the
            // click script has already returned
            let main_frame = self.inner.mainframe().await.map_err(page_error)?;
            let loads = self
                .inner
                .event_listener::<EventFrameStartedLoading>()
                .await
                .map_err(page_error)?;

            let expr = format!(
                "(() => {{ const el = {}[0]; if (!el) return false; el.click(); return true; }})()",
                selector.to_all_query()
            );
            let clicked: bool = self.eval_json(&expr).await?;
            if !clicked {
                return Err(RedlineError::InputError {
                    message: format!("no element matches '{selector}'"),
                });
            }
            let frames = loads.map(|event| event.frame_id.clone());
            if main_frame_started(frames, main_frame.as_ref(), CLICK_NAVIGATION_GRACE).await {
                self.inner
                    .wait_for_navigation()
                    .await
                    .map_err(|e| RedlineError::InputError {
                        message: e.to_string(),
                    })?;
            } else {
                tracing::debug!(%selector, "click started no navigation");
            }
            Ok(())
        }

        async fn title(&self) -> RedlineResult<String> {
            let title = self.inner.get_title().await.map_err(page_error)?;
            Ok(title.unwrap_or_default())
        }

        async fn url(&self) -> RedlineResult<String> {
            let url = self.inner.url().await.map_err(page_error)?;
            Ok(url.unwrap_or_default())
        }

        async fn count(&self, selector: &Selector) -> RedlineResult<usize> {
            self.eval_json(&selector.to_count_query()).await
        }

        async fn probe(&self, selector: &Selector) -> RedlineResult<Option<ElementProbe>> {
            self.eval_json(&selector.to_probe_query()).await
        }

        async fn screenshot(&self) -> RedlineResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                self.inner
                    .execute(params)
                    .await
                    .map_err(|e| RedlineError::ScreenshotError {
                        message: e.to_string(),
                    })?;

            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| RedlineError::ScreenshotError {
                    message: e.to_string(),
                })
        }

        async fn close(self: Box<Self>) -> RedlineResult<()> {
            self.inner.close().await.map_err(page_error)
        }
    }

    fn page_error(e: chromiumoxide::error::CdpError) -> RedlineError {
        RedlineError::PageError {
            message: e.to_string(),
        }
    }

    /// Wait up to `grace` for a load in the main frame
    ///
    /// With no known main frame any load counts.
    async fn main_frame_started<S, F>(frames: S, main_frame: Option<&F>, grace: Duration) -> bool
    where
        S: Stream<Item = F>,
        F: PartialEq,
    {
        let mut frames = std::pin::pin!(frames);
        let started = async {
            while let Some(frame) = frames.next().await {
                if main_frame.map_or(true, |main| *main == frame) {
                    return true;
                }
            }
            false
        };
        tokio::time::timeout(grace, started).await.unwrap_or(false)
    }

}

#[cfg(feature = "browser")]
pub use cdp::{Browser, Page};
