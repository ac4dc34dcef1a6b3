//! User stylesheet injected into the player.

use std::fs;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use tracing::{info, warn};
use ytmd_host::Subscription;

use crate::integrations::{Integration, IntegrationContext, IntegrationError};
use crate::services::{ConfigStore, CssKey, YtmViewManager};

const CSS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::custom_css");
const CSS_PATH_KEY: &str = "appearance.customCSSPath";

type CssSlot = Arc<Mutex<Option<CssKey>>>;

/// Integration injecting the stylesheet named by `appearance.customCSSPath`.
///
/// Changing the path while enabled restarts the integration, which swaps the
/// old stylesheet for the new one.
pub struct CustomCss {
    context: IntegrationContext,
    inserted: CssSlot,
    recreated: Option<Subscription>,
}

impl CustomCss {
    /// Name reported to the manager.
    pub const NAME: &'static str = "CustomCSS";

    /// Builds the integration.
    #[must_use]
    pub fn new(context: IntegrationContext) -> Self {
        Self {
            context,
            inserted: Arc::new(Mutex::new(None)),
            recreated: None,
        }
    }
}

/// Reads the configured stylesheet. A missing setting or file yields `None`.
fn read_stylesheet(config: &ConfigStore) -> Result<Option<String>, IntegrationError> {
    let Some(path) = config.get_as::<Utf8PathBuf>(CSS_PATH_KEY)? else {
        return Ok(None);
    };
    if path.as_str().is_empty() {
        return Ok(None);
    }
    if !path.exists() {
        warn!(target: CSS_TARGET, path = %path, "custom stylesheet not found");
        return Ok(None);
    }
    fs::read_to_string(&path)
        .map(Some)
        .map_err(|source| IntegrationError::Io { path, source })
}

fn inject(context: &IntegrationContext, inserted: &CssSlot) -> Result<(), IntegrationError> {
    let Some(css) = read_stylesheet(context.config_store()?.as_ref())? else {
        return Ok(());
    };
    let slot = Arc::clone(inserted);
    context.when_view_ready(move |view: &YtmViewManager| {
        let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_none() {
            *current = Some(view.view()?.insert_css(&css)?);
            info!(target: CSS_TARGET, "custom stylesheet injected");
        }
        Ok(())
    })
}

#[async_trait]
impl Integration for CustomCss {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn gating_key(&self) -> &'static str {
        "appearance.customCSSEnabled"
    }

    fn dependent_keys(&self) -> &'static [&'static str] {
        &[CSS_PATH_KEY]
    }

    fn on_enabled(&mut self) -> Result<(), IntegrationError> {
        let view = self.context.ytm_view()?;
        let context = self.context.clone();
        let inserted = Arc::clone(&self.inserted);
        self.recreated = Some(view.on_view_recreated(move || {
            inserted.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Err(error) = inject(&context, &inserted) {
                warn!(target: CSS_TARGET, error = %error, "failed to reinject custom stylesheet");
            }
        }));
        inject(&self.context, &self.inserted)
    }

    async fn on_disabled(&mut self) -> Result<(), IntegrationError> {
        self.recreated.take();
        let key = self
            .inserted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(key) = key else {
            return Ok(());
        };
        let view = self.context.ytm_view()?;
        view.ready().await?;
        view.view()?.remove_inserted_css(&key)?;
        info!(target: CSS_TARGET, "custom stylesheet removed");
        Ok(())
    }
}
