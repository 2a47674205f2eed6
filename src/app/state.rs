//! Requests that reach the controller from callbacks
//!
//! Shortcut activations and settings notifications fire while some other
//! part of the controller is borrowed. They only queue an [`AppCommand`];
//! the controller drains the queue on the loop thread.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Work queued for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// The global shortcut was pressed
    OpenMenu,
    /// A settings key changed
    SettingChanged(String),
    Quit,
}

/// Single-consumer command queue
pub struct CommandQueue {
    sender: Sender<AppCommand>,
    receiver: Receiver<AppCommand>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// A handle callbacks can send through
    pub fn sender(&self) -> Sender<AppCommand> {
        self.sender.clone()
    }

    /// Next queued command, if any
    pub fn try_next(&self) -> Option<AppCommand> {
        match self.receiver.try_recv() {
            Ok(command) => Some(command),
            // the queue owns a sender, so it never disconnects
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_come_out_in_order() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        sender.send(AppCommand::OpenMenu).unwrap();
        sender.send(AppCommand::SettingChanged("shortcut".into())).unwrap();

        assert_eq!(queue.try_next(), Some(AppCommand::OpenMenu));
        assert_eq!(
            queue.try_next(),
            Some(AppCommand::SettingChanged("shortcut".into()))
        );
        assert_eq!(queue.try_next(), None);
    }

    #[test]
    fn dropped_senders_do_not_close_the_queue() {
        let queue = CommandQueue::new();
        drop(queue.sender());
        assert_eq!(queue.try_next(), None);
        queue.sender().send(AppCommand::Quit).unwrap();
        assert_eq!(queue.try_next(), Some(AppCommand::Quit));
    }
}
