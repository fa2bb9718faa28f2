//! The web environment: browser and tab lifecycle, the observe pipeline
//! (capture → reduce → stamp), and identifier-based action dispatch.
//!
//! Every element-targeting action resolves its identifier against the live
//! page before any DOM mutation is attempted; zero or multiple matches is a
//! usage error reported on the next observation, never a crash. The `&mut
//! self` methods serialize observations and actions per environment, so at
//! most one traversal is ever in flight against a page.

use eoka::{Browser, Page, StealthConfig};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::config::EnvConfig;
use crate::observe::{Observation, TabRecord};
use crate::parser::{
    reduce_document, stamp_script, PageContent, SourceNode, CAPTURE_JS, HOVER_INSTRUMENT_JS,
};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// A browser session exposing the observe/act loop.
pub struct WebEnv {
    browser: Browser,
    tabs: Vec<Page>,
    active: usize,
    config: EnvConfig,
    terminated: bool,
    answer: Option<String>,
}

impl WebEnv {
    /// Launch a browser and open the first tab (on `start_url` if configured).
    pub async fn launch(config: EnvConfig) -> Result<Self> {
        let stealth = StealthConfig {
            headless: config.browser.headless,
            proxy: config.browser.proxy.clone(),
            user_agent: config.browser.user_agent.clone(),
            viewport_width: config.browser.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.browser.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };
        debug!(
            "launching browser (headless: {}, proxy: {:?})",
            config.browser.headless, config.browser.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = match &config.start_url {
            Some(url) => browser.new_page(url).await?,
            None => browser.new_blank_page().await?,
        };
        let env = Self {
            browser,
            tabs: vec![page],
            active: 0,
            config,
            terminated: false,
            answer: None,
        };
        env.install_instrumentation().await;
        Ok(env)
    }

    /// The active tab.
    pub fn page(&self) -> &Page {
        &self.tabs[self.active]
    }

    /// Navigate the active tab and return the resulting observation.
    pub async fn goto(&mut self, url: &str) -> Result<Observation> {
        info!("goto: {url}");
        self.page().goto(url).await?;
        self.install_instrumentation().await;
        self.observation().await
    }

    /// Close all tabs and reopen the configured start URL.
    pub async fn reset(&mut self) -> Result<Observation> {
        let fresh = match &self.config.start_url {
            Some(url) => self.browser.new_page(url).await?,
            None => self.browser.new_blank_page().await?,
        };
        for page in self.tabs.drain(..) {
            let target = page.target_id().to_string();
            if let Err(e) = self.browser.close_tab(&target).await {
                warn!("failed to close tab {target}: {e}");
            }
        }
        let target = fresh.target_id().to_string();
        self.tabs.push(fresh);
        self.active = 0;
        self.browser.activate_tab(&target).await?;
        self.terminated = false;
        self.answer = None;
        self.install_instrumentation().await;
        self.observation().await
    }

    /// Snapshot the active tab and assemble an observation.
    ///
    /// Waits for quiescence first, then captures the DOM, reduces it, and
    /// mirrors the assigned identifiers onto the live page so subsequent
    /// actions can resolve them.
    pub async fn observation(&mut self) -> Result<Observation> {
        self.wait_for_stable().await;
        self.install_instrumentation().await;
        let mut obs = match self.capture_and_reduce().await {
            Ok(content) => Observation::from_content(content),
            Err(Error::Capture(msg)) => {
                warn!("snapshot capture failed: {msg}");
                Observation {
                    error: Some(format!("snapshot capture failed: {msg}")),
                    ..Observation::default()
                }
            }
            Err(e) => return Err(e),
        };
        obs.tabs = self.tabs_info().await;
        obs.terminated = self.terminated;
        obs.answer = self.answer.clone();
        Ok(obs)
    }

    /// Execute one JSON action and return the next observation.
    ///
    /// Malformed requests, identifier-resolution failures, and driver
    /// failures while acting are all recovered here and surfaced through
    /// `observation.error`: the agent receives a well-formed observation
    /// every step regardless of the action's outcome.
    pub async fn step(&mut self, action_json: &str) -> Result<Observation> {
        let action_error = match Action::parse(action_json) {
            Ok(action) => {
                debug!("executing action: {}", action.name());
                self.dispatch(action).await.err()
            }
            Err(e) => Some(e),
        };
        if let Some(ref e) = action_error {
            warn!("action failed: {e}");
        }
        let mut obs = self.observation().await?;
        if let Some(e) = action_error {
            obs.error = Some(e.to_string());
        }
        Ok(obs)
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }

    // =========================================================================
    // Action dispatch
    // =========================================================================

    async fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Click { target } => {
                let selector = self.resolve(&target).await?;
                self.scroll_into_view(&selector).await?;
                info!("click: {target}");
                self.page().click(&selector).await?;
            }
            Action::Type {
                target,
                text,
                enter,
            } => {
                let selector = self.resolve(&target).await?;
                self.scroll_into_view(&selector).await?;
                info!("type into {target}: {text:?}");
                self.page().fill(&selector, &text).await?;
                if enter {
                    self.focus(&selector).await?;
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    self.page().human().press_key("Enter").await?;
                }
            }
            Action::Hover { target } => {
                let selector = self.resolve(&target).await?;
                self.scroll_into_view(&selector).await?;
                info!("hover: {target}");
                let rect = self.bounding_rect(&selector).await?;
                let cx = rect.x + rect.width / 2.0;
                let cy = rect.y + rect.height / 2.0;
                self.page()
                    .session()
                    .dispatch_mouse_event(eoka::cdp::MouseEventType::MouseMoved, cx, cy, None, None)
                    .await?;
            }
            Action::Select { target, value } => {
                let selector = self.resolve(&target).await?;
                self.scroll_into_view(&selector).await?;
                info!("select in {target}: {value:?}");
                self.select_option(&selector, &target, &value).await?;
            }
            Action::Clear { target } => {
                let selector = self.resolve(&target).await?;
                self.scroll_into_view(&selector).await?;
                info!("clear: {target}");
                self.page().fill(&selector, "").await?;
            }
            Action::KeyPress { key, target } => {
                if let Some(target) = target {
                    let selector = self.resolve(&target).await?;
                    self.scroll_into_view(&selector).await?;
                    self.focus(&selector).await?;
                    info!("key_press on {target}: {key}");
                } else {
                    info!("key_press: {key}");
                }
                self.page().human().press_key(&key).await?;
            }
            Action::GotoUrl { url } => {
                info!("goto_url: {url}");
                self.page().goto(&url).await?;
                self.install_instrumentation().await;
            }
            Action::Back => {
                info!("back");
                self.page().back().await?;
                self.install_instrumentation().await;
            }
            Action::Forward => {
                info!("forward");
                self.page().forward().await?;
                self.install_instrumentation().await;
            }
            Action::Refresh => {
                info!("refresh");
                self.page().reload().await?;
                self.install_instrumentation().await;
            }
            Action::NewTab { url } => {
                info!("new_tab: {url:?}");
                let page = match url {
                    Some(url) => self.browser.new_page(&url).await?,
                    None => self.browser.new_blank_page().await?,
                };
                let target = page.target_id().to_string();
                self.tabs.push(page);
                self.active = self.tabs.len() - 1;
                self.browser.activate_tab(&target).await?;
                self.install_instrumentation().await;
            }
            Action::SwitchTab { tab_id } => {
                info!("switch_tab: {tab_id}");
                let page = self
                    .tabs
                    .get(tab_id)
                    .ok_or_else(|| Error::Action(format!("invalid tab id: {tab_id}")))?;
                let target = page.target_id().to_string();
                self.browser.activate_tab(&target).await?;
                self.active = tab_id;
            }
            Action::CloseTab { tab_id } => {
                info!("close_tab: {tab_id}");
                if tab_id >= self.tabs.len() {
                    return Err(Error::Action(format!("invalid tab id: {tab_id}")));
                }
                if self.tabs.len() <= 1 {
                    return Err(Error::Action("cannot close the last tab".into()));
                }
                let target = self.tabs[tab_id].target_id().to_string();
                self.browser.close_tab(&target).await?;
                self.tabs.remove(tab_id);
                if self.active == tab_id {
                    self.active = self.tabs.len() - 1;
                    let new_target = self.tabs[self.active].target_id().to_string();
                    self.browser.activate_tab(&new_target).await?;
                } else if self.active > tab_id {
                    self.active -= 1;
                }
            }
            Action::Terminate { answer } => {
                info!("terminate: {answer:?}");
                self.terminated = true;
                self.answer = answer;
            }
        }
        let settle = self.config.timeouts.action_settle_ms;
        if settle > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(settle)).await;
        }
        Ok(())
    }

    // =========================================================================
    // Identifier resolution
    // =========================================================================

    /// Resolve a semantic identifier to a selector matching exactly one live
    /// element.
    async fn resolve(&self, id: &str) -> Result<String> {
        let well_formed = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !well_formed {
            return Err(Error::Resolve(format!("malformed identifier \"{id}\"")));
        }
        let selector = format!("[data-semantic-id=\"{id}\"]");
        let js = format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(&selector).unwrap()
        );
        let count: f64 = self.page().evaluate(&js).await?;
        match count as u64 {
            0 => Err(Error::Resolve(format!(
                "no element carries identifier \"{id}\" — it may be stale; observe again"
            ))),
            1 => Ok(selector),
            n => Err(Error::Resolve(format!(
                "identifier \"{id}\" matches {n} elements"
            ))),
        }
    }

    // =========================================================================
    // Observation pipeline
    // =========================================================================

    async fn capture_and_reduce(&self) -> Result<PageContent> {
        let page = self.page();
        let json: String = page.evaluate(CAPTURE_JS).await?;
        let mut root: SourceNode =
            serde_json::from_str(&json).map_err(|e| Error::Capture(e.to_string()))?;
        let reduced = reduce_document(&mut root);
        if !reduced.stamps.is_empty() {
            page.execute(&stamp_script(&reduced.stamps)).await?;
        }
        debug!(
            clickable = reduced.content.clickable_elements.len(),
            inputs = reduced.content.input_elements.len(),
            selects = reduced.content.select_elements.len(),
            "observation assembled"
        );
        Ok(reduced.content)
    }

    /// Best-effort quiescence: bounded network-idle wait plus a short settle.
    /// Sites that poll forever still observe after the cap.
    async fn wait_for_stable(&self) {
        let timeouts = &self.config.timeouts;
        let _ = self
            .page()
            .wait_for_network_idle(timeouts.idle_window_ms, timeouts.network_idle_ms)
            .await;
        self.page().wait(timeouts.settle_ms).await;
    }

    async fn install_instrumentation(&self) {
        if let Err(e) = self.page().execute(HOVER_INSTRUMENT_JS).await {
            warn!("hover instrumentation install failed: {e}");
        }
    }

    async fn tabs_info(&self) -> Vec<TabRecord> {
        let mut records = Vec::with_capacity(self.tabs.len());
        for (i, page) in self.tabs.iter().enumerate() {
            records.push(TabRecord {
                id: i,
                title: page.title().await.unwrap_or_default(),
                url: page.url().await.unwrap_or_default(),
                is_active: i == self.active,
            });
        }
        records
    }

    // =========================================================================
    // Element helpers (all JS-side, selector already validated)
    // =========================================================================

    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        let js = format!(
            "document.querySelector({})?.scrollIntoView({{block:'center'}})",
            serde_json::to_string(selector).unwrap()
        );
        self.page().execute(&js).await?;
        Ok(())
    }

    async fn focus(&self, selector: &str) -> Result<()> {
        let js = format!(
            "document.querySelector({})?.focus()",
            serde_json::to_string(selector).unwrap()
        );
        self.page().execute(&js).await?;
        Ok(())
    }

    async fn bounding_rect(&self, selector: &str) -> Result<Rect> {
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return {{x: 0, y: 0, width: 0, height: 0}};
                const r = el.getBoundingClientRect();
                return {{x: r.x, y: r.y, width: r.width, height: r.height}};
            }})()"#,
            serde_json::to_string(selector).unwrap()
        );
        let rect: Rect = self.page().evaluate(&js).await?;
        Ok(rect)
    }

    async fn select_option(&self, selector: &str, target: &str, value: &str) -> Result<()> {
        let arg = serde_json::json!({ "sel": selector, "val": value });
        let js = format!(
            r#"(() => {{
                const arg = {arg};
                const sel = document.querySelector(arg.sel);
                if (!sel || !sel.options) return false;
                const opt = Array.from(sel.options).find(o => o.value === arg.val || o.text === arg.val);
                if (!opt) return false;
                sel.value = opt.value;
                sel.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            arg = serde_json::to_string(&arg).unwrap()
        );
        let selected: bool = self.page().evaluate(&js).await?;
        if !selected {
            return Err(Error::Action(format!(
                "option {value:?} not found in \"{target}\""
            )));
        }
        Ok(())
    }
}
