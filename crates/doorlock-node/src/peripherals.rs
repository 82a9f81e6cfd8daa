//! Keypad, display, actuator and alarm.
//!
//! Each peripheral is a small trait so the node runtimes can run against the
//! console, against tracing output, or against channels in tests.

use std::{
    collections::VecDeque,
    io::{self, Write},
};

use doorlock_core::{
    actuator::{Direction, DriveCommand},
    hmi::{Key, Screen},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::mpsc,
};

/// Source of key presses.
pub trait Keypad: Send {
    /// Next key, or `None` once the keypad is closed.
    ///
    /// Must be cancel safe: the runtime polls it inside `select!`.
    fn next_key(&mut self) -> impl Future<Output = Option<Key>> + Send;
}

/// Two-line character display.
pub trait Display: Send {
    /// Clear and show `screen`.
    fn show(&mut self, screen: &Screen);

    /// Append one `*` to the input line.
    fn echo_mask(&mut self);
}

/// Door motor.
pub trait Actuator: Send {
    /// Apply `command` until the next one.
    fn drive(&mut self, command: DriveCommand);
}

/// Buzzer.
pub trait Alarm: Send {
    /// Switch the buzzer on or off.
    fn set(&mut self, on: bool);
}

/// Keypad reading lines from standard input; every character is one key.
pub struct ConsoleKeypad {
    lines: Lines<BufReader<Stdin>>,
    pending: VecDeque<Key>,
}

impl ConsoleKeypad {
    /// Keypad over the process's standard input.
    pub fn new() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines(), pending: VecDeque::new() }
    }
}

impl Default for ConsoleKeypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Keypad for ConsoleKeypad {
    fn next_key(&mut self) -> impl Future<Output = Option<Key>> + Send {
        async move {
            loop {
                if let Some(key) = self.pending.pop_front() {
                    return Some(key);
                }
                match self.lines.next_line().await {
                    Ok(Some(line)) => {
                        self.pending.extend(line.trim().chars().map(Key::from_char));
                    },
                    Ok(None) => return None,
                    Err(error) => {
                        tracing::error!(%error, "keypad read failed");
                        return None;
                    },
                }
            }
        }
    }
}

/// Display writing each screen to standard output.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl ConsoleDisplay {
    fn write(args: std::fmt::Arguments<'_>) {
        let mut out = io::stdout().lock();
        if let Err(error) = out.write_fmt(args).and_then(|()| out.flush()) {
            tracing::warn!(%error, "display write failed");
        }
    }
}

impl Display for ConsoleDisplay {
    fn show(&mut self, screen: &Screen) {
        let [top, bottom] = screen.lines();
        Self::write(format_args!("\n+----------------+\n{top}\n{bottom}"));
    }

    fn echo_mask(&mut self) {
        Self::write(format_args!("*"));
    }
}

/// Actuator that only logs its commands.
#[derive(Debug, Default)]
pub struct LoggedActuator;

impl Actuator for LoggedActuator {
    fn drive(&mut self, command: DriveCommand) {
        match command.direction {
            Direction::Stop => tracing::info!("motor stop"),
            direction => tracing::info!(?direction, duty = command.duty.percent(), "motor drive"),
        }
    }
}

/// Alarm that only logs its state.
#[derive(Debug, Default)]
pub struct LoggedAlarm;

impl Alarm for LoggedAlarm {
    fn set(&mut self, on: bool) {
        if on {
            tracing::warn!("alarm on");
        } else {
            tracing::info!("alarm off");
        }
    }
}

/// Keypad fed from a channel. Closing the sender closes the keypad.
#[derive(Debug)]
pub struct ChannelKeypad(mpsc::Receiver<Key>);

impl ChannelKeypad {
    /// Keypad and the sender that feeds it.
    pub fn new(buffer: usize) -> (mpsc::Sender<Key>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self(rx))
    }
}

impl Keypad for ChannelKeypad {
    fn next_key(&mut self) -> impl Future<Output = Option<Key>> + Send {
        self.0.recv()
    }
}

/// What a [`ChannelDisplay`] was asked to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// A full screen.
    Show(Screen),
    /// One `*`.
    Mask,
}

/// Display that forwards everything to a channel.
#[derive(Debug, Clone)]
pub struct ChannelDisplay(mpsc::UnboundedSender<DisplayEvent>);

impl ChannelDisplay {
    /// Display and the receiver of its events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DisplayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl Display for ChannelDisplay {
    fn show(&mut self, screen: &Screen) {
        let _ = self.0.send(DisplayEvent::Show(*screen));
    }

    fn echo_mask(&mut self) {
        let _ = self.0.send(DisplayEvent::Mask);
    }
}

/// Actuator that forwards commands to a channel.
#[derive(Debug, Clone)]
pub struct ChannelActuator(mpsc::UnboundedSender<DriveCommand>);

impl ChannelActuator {
    /// Actuator and the receiver of its commands.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DriveCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl Actuator for ChannelActuator {
    fn drive(&mut self, command: DriveCommand) {
        let _ = self.0.send(command);
    }
}

/// Alarm that forwards state changes to a channel.
#[derive(Debug, Clone)]
pub struct ChannelAlarm(mpsc::UnboundedSender<bool>);

impl ChannelAlarm {
    /// Alarm and the receiver of its state changes.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<bool>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl Alarm for ChannelAlarm {
    fn set(&mut self, on: bool) {
        let _ = self.0.send(on);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use doorlock_core::actuator::DutyCycle;

    use super::*;

    #[tokio::test]
    async fn channel_keypad_closes_with_sender() {
        let (tx, mut keypad) = ChannelKeypad::new(4);
        tx.send(Key::Digit(b'1')).await.unwrap();
        drop(tx);

        assert_eq!(keypad.next_key().await, Some(Key::Digit(b'1')));
        assert_eq!(keypad.next_key().await, None);
    }

    #[test]
    fn channel_peripherals_forward_in_order() {
        let (mut display, mut screens) = ChannelDisplay::new();
        let (mut actuator, mut drives) = ChannelActuator::new();
        let (mut alarm, mut alarms) = ChannelAlarm::new();

        display.show(&Screen::EnterPassword);
        display.echo_mask();
        actuator.drive(DriveCommand::new(Direction::Forward, DutyCycle::new(50)));
        actuator.drive(DriveCommand::STOP);
        alarm.set(true);

        assert_eq!(screens.try_recv().unwrap(), DisplayEvent::Show(Screen::EnterPassword));
        assert_eq!(screens.try_recv().unwrap(), DisplayEvent::Mask);
        assert_eq!(drives.try_recv().unwrap().direction, Direction::Forward);
        assert_eq!(drives.try_recv().unwrap(), DriveCommand::STOP);
        assert!(alarms.try_recv().unwrap());
    }
}
