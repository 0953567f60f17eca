use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            error::{BrowserError, Result}};
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Keep pages from detecting automation and behaving differently under test
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A run with retries can stay idle between commands for longer than the 30s default
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        browser.new_tab().map_err(|e| BrowserError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::debug!(
            "Launched browser ({}, {}x{})",
            if options.headless { "headless" } else { "headed" },
            options.window_width,
            options.window_height
        );

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url, Duration::from_millis(options.timeout))
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| BrowserError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // First pass: visible and focused
        for tab in &tabs {
            match tab.evaluate("document.visibilityState === 'visible' && document.hasFocus()", false) {
                Ok(remote_object) => {
                    if remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                        return Ok(tab.clone());
                    }
                }
                Err(e) => {
                    log::debug!("Failed to check tab status: {}", e);
                    continue;
                }
            }
        }

        // Second pass: visible only
        for tab in &tabs {
            if let Ok(remote_object) = tab.evaluate("document.visibilityState === 'visible'", false) {
                if remote_object.value.and_then(|v| v.as_bool()).unwrap_or(false) {
                    return Ok(tab.clone());
                }
            }
        }

        // A freshly launched headless browser may report no focus at all
        tabs.into_iter()
            .next()
            .ok_or_else(|| BrowserError::TabOperationFailed("No active tab found".to_string()))
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Close every tab; the browser process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        for tab in self.get_tabs()? {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab: {}", e);
            }
        }
        Ok(())
    }
}
