//! HMI node runtime.

use std::time::Duration;

use doorlock_core::{
    Timing,
    env::Environment,
    hmi::{HmiAction, HmiEvent, HmiMachine},
    tick::{ElapsedSeconds, TickSource},
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{
    NodeError,
    link::{self, Inbound},
    peripherals::{Display, Keypad},
};

/// Default time a transient message stays on screen.
pub const DEFAULT_MESSAGE_HOLD: Duration = Duration::from_secs(2);

/// HMI node settings.
#[derive(Debug, Clone, Copy)]
pub struct HmiNodeConfig {
    /// Protocol timing, shared with Control by convention.
    pub timing: Timing,
    /// How long transient messages stay up before the next screen.
    pub message_hold: Duration,
}

impl Default for HmiNodeConfig {
    fn default() -> Self {
        Self { timing: Timing::default(), message_hold: DEFAULT_MESSAGE_HOLD }
    }
}

/// Drives an [`HmiMachine`] over a byte link.
pub struct HmiNode<K: Keypad, D: Display, E: Environment> {
    machine: HmiMachine,
    elapsed: ElapsedSeconds,
    keypad: K,
    display: D,
    env: E,
    message_hold: Duration,
}

impl<K: Keypad, D: Display, E: Environment> HmiNode<K, D, E> {
    /// Assemble a node from its peripherals.
    pub fn new(config: HmiNodeConfig, keypad: K, display: D, env: E) -> Self {
        Self {
            machine: HmiMachine::new(config.timing),
            elapsed: ElapsedSeconds::new(),
            keypad,
            display,
            env,
            message_hold: config.message_hold,
        }
    }

    /// Announce readiness, then run until the link or the keypad closes.
    ///
    /// # Errors
    ///
    /// Returns `NodeError` if the link or the state machine fails.
    pub async fn run<S, T>(mut self, link: S, mut ticks: T) -> Result<(), NodeError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
        T: TickSource,
    {
        ticks.subscribe(self.elapsed.observer());

        let (reader, mut writer) = tokio::io::split(link);
        let mut inbound: Inbound = link::spawn_reader(reader);
        let elapsed = self.elapsed.clone();

        self.dispatch(HmiEvent::Start, &mut writer).await?;

        loop {
            tokio::select! {
                biased;

                chunk = inbound.recv() => {
                    let Some(chunk) = chunk else {
                        tracing::info!("link closed, hmi node stopping");
                        break;
                    };
                    for &byte in &chunk {
                        self.dispatch(HmiEvent::Byte(byte), &mut writer).await?;
                    }
                },
                () = elapsed.changed() => {
                    let seconds = elapsed.seconds();
                    self.dispatch(HmiEvent::Tick { elapsed: seconds }, &mut writer).await?;
                },
                key = self.keypad.next_key() => {
                    let Some(key) = key else {
                        tracing::info!("keypad closed, hmi node stopping");
                        break;
                    };
                    self.dispatch(HmiEvent::Key(key), &mut writer).await?;
                },
            }
        }

        let _ = writer.shutdown().await;
        Ok(())
    }

    async fn dispatch<W>(&mut self, event: HmiEvent, writer: &mut W) -> Result<(), NodeError>
    where
        W: AsyncWrite + Unpin,
    {
        for action in self.machine.handle(event)? {
            match action {
                HmiAction::Send(outbound) => link::send(writer, &outbound).await?,
                HmiAction::Show(screen) => {
                    tracing::debug!(%screen, "display");
                    self.display.show(&screen);
                    if screen.is_transient() {
                        self.env.sleep(self.message_hold).await;
                    }
                },
                HmiAction::EchoMask => self.display.echo_mask(),
                HmiAction::ResetElapsed => self.elapsed.reset(),
            }
        }
        Ok(())
    }
}
