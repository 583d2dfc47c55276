//! Cycle driver: one timer task plus the on-demand command path.
//!
//! Each cycle is compose → publish with nothing carried over. Timer cycles
//! never overlap each other (the loop awaits each one); command cycles may
//! interleave with them unless `serialize_cycles` is set, in which case every
//! cycle waits on a single-permit gate.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{
    composer::StatusComposer,
    config::Config,
    domain::{Destination, MessageRef},
    errors::Error,
    messaging::types::EditOutcome,
    publish::PublishTarget,
    Result,
};

pub const INTERACTIVE_FAILURE_REPLY: &str = "⚠️ nowplay failed";

#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// `None` disables the timer.
    pub scheduled_target: Option<MessageRef>,
    pub interval: Duration,
    pub serialize_cycles: bool,
}

impl From<&Config> for SyncOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            scheduled_target: if cfg.use_channel_nowplay {
                cfg.nowplay_target
            } else {
                None
            },
            interval: cfg.poll_interval,
            serialize_cycles: cfg.serialize_cycles,
        }
    }
}

pub struct SyncDriver {
    composer: StatusComposer,
    publisher: PublishTarget,
    opts: SyncOptions,
    gate: Option<Mutex<()>>,
}

impl SyncDriver {
    pub fn new(composer: StatusComposer, publisher: PublishTarget, opts: SyncOptions) -> Self {
        let gate = opts.serialize_cycles.then(|| Mutex::new(()));
        Self {
            composer,
            publisher,
            opts,
            gate,
        }
    }

    /// Fetch, compose and publish once.
    pub async fn run_cycle(&self, destination: Destination) -> Result<EditOutcome> {
        let _permit = self.permit().await;

        let text = self.composer.compose().await?;
        self.publisher.publish(destination, &text).await
    }

    /// Command path: edit the triggering message in place.
    ///
    /// When the platform will not let us edit it (a bot cannot edit a user's
    /// message), the status is posted as a new message instead. Any other
    /// failure is logged and answered with a short failure reply.
    pub async fn run_interactive(&self, trigger: MessageRef) {
        if let Err(e) = self.interactive_cycle(trigger).await {
            tracing::warn!(chat_id = trigger.chat_id.0, "nowplay command failed: {e}");
            let _ = self
                .publisher
                .messenger()
                .send_text(trigger.chat_id, INTERACTIVE_FAILURE_REPLY, None)
                .await;
        }
    }

    async fn interactive_cycle(&self, trigger: MessageRef) -> Result<()> {
        let _permit = self.permit().await;

        let text = self.composer.compose().await?;
        match self
            .publisher
            .publish(Destination::Interactive(trigger), &text)
            .await
        {
            Ok(_) => Ok(()),
            Err(Error::NotEditable(reason)) => {
                tracing::debug!(
                    chat_id = trigger.chat_id.0,
                    "trigger not editable ({reason}), posting status"
                );
                self.publisher.reply(trigger.chat_id, &text).await.map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    async fn permit(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.gate {
            Some(g) => Some(g.lock().await),
            None => None,
        }
    }

    /// Start the periodic task, if a scheduled target is configured.
    ///
    /// The first cycle runs immediately; late ticks are skipped, not bunched.
    pub fn spawn_timer(self: &Arc<Self>, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let target = self.opts.scheduled_target?;
        let period = self.opts.interval;
        let driver = Arc::clone(self);

        tracing::info!(
            chat_id = target.chat_id.0,
            message_id = target.message_id.0,
            "scheduled status every {}s",
            period.as_secs_f64()
        );

        Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                  _ = cancel.cancelled() => break,
                  _ = tick.tick() => {
                    if let Err(e) = driver.run_cycle(Destination::Scheduled(target)).await {
                      tracing::warn!("scheduled cycle failed: {e}");
                    }
                  }
                }
            }
            tracing::info!("scheduled status stopped");
        }))
    }
}
