//! Command channel between the cognitive layer and the tick driver

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Create a connected sender/queue pair
pub fn command_channel() -> (CommandSender, CommandQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandQueue { rx })
}

/// Cloneable handle used to submit commands from any task
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<String>,
}

impl CommandSender {
    /// Enqueue a command; returns false once the queue has been dropped
    pub fn send(&self, command: impl Into<String>) -> bool {
        self.tx.send(command.into()).is_ok()
    }
}

/// Receiving end, drained once per tick
#[derive(Debug)]
pub struct CommandQueue {
    rx: mpsc::UnboundedReceiver<String>,
}

impl CommandQueue {
    /// Take every command queued so far, oldest first, without waiting
    pub fn drain(&mut self) -> Vec<String> {
        let mut commands = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        commands
    }
}
