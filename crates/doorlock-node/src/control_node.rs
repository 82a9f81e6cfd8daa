//! Control node runtime.

use std::collections::VecDeque;

use doorlock_core::{
    Timing,
    control::{ControlAction, ControlEvent, ControlMachine},
    env::Environment,
    store::{CredentialVault, Eeprom, VaultConfig},
    tick::{ElapsedSeconds, TickSource},
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{
    NodeError,
    link::{self, Inbound},
    peripherals::{Actuator, Alarm},
};

/// Control node settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlNodeConfig {
    /// Protocol timing, shared with the HMI by convention.
    pub timing: Timing,
    /// Credential placement and EEPROM settle delay.
    pub vault: VaultConfig,
}

/// Drives a [`ControlMachine`] over a byte link.
pub struct ControlNode<R, A, L, E>
where
    R: Eeprom,
    A: Actuator,
    L: Alarm,
    E: Environment,
{
    machine: ControlMachine,
    vault: CredentialVault<R, E>,
    elapsed: ElapsedSeconds,
    actuator: A,
    alarm: L,
}

impl<R, A, L, E> ControlNode<R, A, L, E>
where
    R: Eeprom,
    A: Actuator,
    L: Alarm,
    E: Environment,
{
    /// Assemble a node from its peripherals.
    pub fn new(config: ControlNodeConfig, eeprom: R, actuator: A, alarm: L, env: E) -> Self {
        Self {
            machine: ControlMachine::new(config.timing),
            vault: CredentialVault::with_config(eeprom, env, config.vault),
            elapsed: ElapsedSeconds::new(),
            actuator,
            alarm,
        }
    }

    /// Run until the link closes.
    ///
    /// The tick source is subscribed to this node's elapsed counter and kept
    /// alive for the whole run.
    ///
    /// # Errors
    ///
    /// Returns `NodeError` if the link, the credential store or the state
    /// machine fails. A peer closing the link is a clean shutdown.
    pub async fn run<S, T>(mut self, link: S, mut ticks: T) -> Result<(), NodeError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
        T: TickSource,
    {
        ticks.subscribe(self.elapsed.observer());

        let (reader, mut writer) = tokio::io::split(link);
        let mut inbound: Inbound = link::spawn_reader(reader);
        let elapsed = self.elapsed.clone();

        tracing::info!("control node waiting for hmi");

        loop {
            tokio::select! {
                biased;

                chunk = inbound.recv() => {
                    let Some(chunk) = chunk else {
                        tracing::info!("link closed, control node stopping");
                        break;
                    };
                    for &byte in &chunk {
                        self.dispatch(ControlEvent::Byte(byte), &mut writer).await?;
                    }
                },
                () = elapsed.changed() => {
                    let seconds = elapsed.seconds();
                    self.dispatch(ControlEvent::Tick { elapsed: seconds }, &mut writer).await?;
                },
            }
        }

        let _ = writer.shutdown().await;
        Ok(())
    }

    /// Feed one event and execute everything it causes, in order.
    async fn dispatch<W>(&mut self, event: ControlEvent, writer: &mut W) -> Result<(), NodeError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut queue: VecDeque<ControlAction> = self.machine.handle(event)?.into();

        while let Some(action) = queue.pop_front() {
            match action {
                ControlAction::Send(outbound) => link::send(writer, &outbound).await?,
                ControlAction::PersistCredential(password) => {
                    self.vault.persist(&password).await?;
                    tracing::info!("credential stored");
                },
                ControlAction::LoadCredential => {
                    let record = self.vault.load().await?;
                    queue.extend(self.machine.handle(ControlEvent::CredentialLoaded(record))?);
                },
                ControlAction::ResetElapsed => self.elapsed.reset(),
                ControlAction::Drive(command) => self.actuator.drive(command),
                ControlAction::Alarm(on) => self.alarm.set(on),
            }
        }

        Ok(())
    }
}
