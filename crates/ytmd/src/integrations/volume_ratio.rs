//! Perceptual volume curve for the player.
//!
//! The player maps its slider linearly onto the media element volume. While
//! enabled, a script installed in the page squares the slider value so equal
//! slider steps sound like equal loudness steps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::warn;
use ytmd_host::Subscription;

use crate::integrations::{Integration, IntegrationContext, IntegrationError};
use crate::services::YtmViewManager;

const VOLUME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::volume_ratio");

const ENABLE_SCRIPT: &str = r"(function () {
  if (window.__ytmdVolumeRatio) { return; }
  const descriptor = Object.getOwnPropertyDescriptor(HTMLMediaElement.prototype, 'volume');
  window.__ytmdVolumeRatio = descriptor;
  Object.defineProperty(HTMLMediaElement.prototype, 'volume', {
    configurable: true,
    get() { return Math.sqrt(descriptor.get.call(this)); },
    set(value) { descriptor.set.call(this, value * value); },
  });
})();";

const DISABLE_SCRIPT: &str = r"(function () {
  const descriptor = window.__ytmdVolumeRatio;
  if (!descriptor) { return; }
  Object.defineProperty(HTMLMediaElement.prototype, 'volume', descriptor);
  delete window.__ytmdVolumeRatio;
})();";

const FORCE_VOLUME_SCRIPT: &str = r"(function () {
  const player = document.querySelector('#movie_player');
  if (player && player.getVolume) { player.setVolume(player.getVolume()); }
})();";

/// Integration installing the volume curve.
pub struct VolumeRatio {
    context: IntegrationContext,
    injected: Arc<AtomicBool>,
    recreated: Option<Subscription>,
}

impl VolumeRatio {
    /// Name reported to the manager.
    pub const NAME: &'static str = "VolumeRatio";

    /// Builds the integration.
    #[must_use]
    pub fn new(context: IntegrationContext) -> Self {
        Self {
            context,
            injected: Arc::new(AtomicBool::new(false)),
            recreated: None,
        }
    }
}

fn inject(
    context: &IntegrationContext,
    injected: &Arc<AtomicBool>,
) -> Result<(), IntegrationError> {
    let flag = Arc::clone(injected);
    context.when_view_ready(move |view: &YtmViewManager| {
        view.execute_script(ENABLE_SCRIPT)?;
        view.execute_script(FORCE_VOLUME_SCRIPT)?;
        flag.store(true, Ordering::Release);
        Ok(())
    })
}

#[async_trait]
impl Integration for VolumeRatio {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn gating_key(&self) -> &'static str {
        "playback.ratioVolume"
    }

    fn on_enabled(&mut self) -> Result<(), IntegrationError> {
        let view = self.context.ytm_view()?;
        let context = self.context.clone();
        let injected = Arc::clone(&self.injected);
        self.recreated = Some(view.on_view_recreated(move || {
            injected.store(false, Ordering::Release);
            if let Err(error) = inject(&context, &injected) {
                warn!(target: VOLUME_TARGET, error = %error, "failed to reinstall volume curve");
            }
        }));

        if self.injected.load(Ordering::Acquire) {
            return Ok(());
        }
        inject(&self.context, &self.injected)
    }

    async fn on_disabled(&mut self) -> Result<(), IntegrationError> {
        self.recreated.take();
        if !self.injected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let view = self.context.ytm_view()?;
        view.ready().await?;
        view.execute_script(DISABLE_SCRIPT)?;
        view.execute_script(FORCE_VOLUME_SCRIPT)?;
        Ok(())
    }
}
