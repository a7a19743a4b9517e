//! Chrome DevTools Protocol renderer (uses the `headless_chrome` crate)

use crate::{CaptureConfig, Error, Renderer, RequestPolicy, Result, Viewport};
use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision, Tab};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::FailRequest;
use headless_chrome::protocol::cdp::Network::ErrorReason;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Headless Chrome renderer
///
/// Launches one browser with a single tab. Requests denied by the configured
/// [`RequestPolicy`] are failed with `BlockedByClient` before they leave the
/// browser; everything else continues untouched.
pub struct CdpRenderer {
    browser: Browser,
    tab: Arc<Tab>,
    config: CaptureConfig,
}

fn policy_interceptor(policy: RequestPolicy) -> Arc<dyn RequestInterceptor + Send + Sync> {
    Arc::new(move |_transport, _session_id, event: RequestPausedEvent| {
        let url = &event.params.request.url;
        if policy.allows(url) {
            RequestPausedDecision::Continue(None)
        } else {
            info!("Blocking request to {}", url);
            RequestPausedDecision::Fail(FailRequest {
                request_id: event.params.request_id.clone(),
                error_reason: ErrorReason::BlockedByClient,
            })
        }
    })
}

impl CdpRenderer {
    fn settle(&self) {
        std::thread::sleep(Duration::from_millis(self.config.settle_ms));
    }
}

impl Renderer for CdpRenderer {
    fn new(config: CaptureConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .path(config.chrome_path.clone())
            .window_size(Some((config.desktop.width, config.desktop.height)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_millis(config.navigation_timeout_ms));

        if !config.policy.blocked_hosts().is_empty() {
            tab.enable_fetch(None, Some(false))
                .map_err(|e| Error::InitializationError(format!("Failed to enable fetch domain: {}", e)))?;
            tab.enable_request_interception(policy_interceptor(config.policy.clone()))
                .map_err(|e| Error::InitializationError(format!("Failed to enable request interception: {}", e)))?;
            debug!("Request policy active for {:?}", config.policy.blocked_hosts());
        }

        Ok(Self {
            browser,
            tab,
            config,
        })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        // Let late network activity finish before the first screenshot
        self.settle();
        Ok(())
    }

    fn render_png(&mut self, viewport: Viewport) -> Result<Vec<u8>> {
        self.tab
            .call_method(Emulation::SetDeviceMetricsOverride {
                width: viewport.width,
                height: viewport.height,
                device_scale_factor: 1.0,
                mobile: false,
                scale: None,
                screen_width: None,
                screen_height: None,
                position_x: None,
                position_y: None,
                dont_set_visible_size: None,
                screen_orientation: None,
                viewport: None,
                display_feature: None,
                device_posture: None,
            })
            .map_err(|e| Error::RenderError(format!("Failed to set viewport {}x{}: {}", viewport.width, viewport.height, e)))?;
        self.settle();

        let png = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))?;
        debug!("Captured {}x{} screenshot ({} bytes)", viewport.width, viewport.height, png.len());
        Ok(png)
    }

    fn close(self) -> Result<()> {
        // Dropping the browser terminates the child process
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
