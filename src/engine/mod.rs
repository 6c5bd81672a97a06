//! The game engine seen from outside: started once with flags at a mount
//! point, then heard from only through its commit channel.

pub mod elm;

use futures::channel::mpsc;

use crate::error::Result;
use crate::model::{History, SessionFlags};

pub use elm::ElmEngine;

pub type CommitSender = mpsc::UnboundedSender<History>;
pub type CommitReceiver = mpsc::UnboundedReceiver<History>;

/// Unbounded and in-order; one message per finished game.
pub fn commit_channel() -> (CommitSender, CommitReceiver) {
    mpsc::unbounded()
}

pub trait EngineHandle {
    /// The commit stream can be taken once; later calls return `None`.
    fn take_commits(&mut self) -> Option<CommitReceiver>;
}

pub trait Engine {
    type Handle: EngineHandle;

    /// Fails with `MountPointMissing` when `mount_id` resolves to nothing.
    fn start(&self, mount_id: &str, flags: SessionFlags) -> Result<Self::Handle>;
}
