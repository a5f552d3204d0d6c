use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Content attached to a selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Pending,
    Loaded(String),
    Failed(String),
}

/// Identifies one content request. Only the newest ticket for a path is honoured.
pub type Ticket = u64;

/// A finished read, as handed back to [`crate::engine::SelectionEngine::on_content`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReply {
    pub ticket: Ticket,
    pub path: String,
    pub result: Result<String, String>,
}

/// Receives the engine's content notices. Replies come back later, possibly out of
/// order, and must carry the ticket of the request they answer.
pub trait ContentLoader {
    fn request(&mut self, ticket: Ticket, root: &Path, path: &str);
    fn release(&mut self, ticket: Ticket, path: &str);
}

/// Reads requested files on short-lived worker threads. Replies arrive in the paired
/// [`ContentInbox`].
pub struct ThreadedContentLoader {
    tx: Sender<ContentReply>,
}

/// Receiving end of a [`ThreadedContentLoader`].
pub struct ContentInbox {
    rx: Receiver<ContentReply>,
}

impl ThreadedContentLoader {
    pub fn new() -> (Self, ContentInbox) {
        let (tx, rx) = mpsc::channel();
        (ThreadedContentLoader { tx }, ContentInbox { rx })
    }
}

impl ContentLoader for ThreadedContentLoader {
    fn request(&mut self, ticket: Ticket, root: &Path, path: &str) {
        let full_path = root.join(path);
        let tx = self.tx.clone();
        let rel = path.to_string();
        thread::spawn(move || {
            let result = fs::read_to_string(&full_path).map_err(|e| e.to_string());
            if let Err(e) = &result {
                tracing::warn!(path = %full_path.display(), "could not read file: {}", e);
            }
            // receiver gone means the session ended
            let _ = tx.send(ContentReply {
                ticket,
                path: rel,
                result,
            });
        });
    }

    fn release(&mut self, ticket: Ticket, path: &str) {
        // nothing is cached here; a read still in flight is discarded by the engine
        tracing::trace!(ticket, path, "content released");
    }
}

impl ContentInbox {
    /// Finished reads since the last call, without blocking.
    pub fn drain(&self) -> Vec<ContentReply> {
        self.rx.try_iter().collect()
    }

    /// Blocks until every ticket in `tickets` has produced a reply or the workers hang up.
    pub fn wait_for(&self, tickets: &HashSet<Ticket>) -> Vec<ContentReply> {
        let mut remaining = tickets.clone();
        let mut replies = Vec::new();
        while !remaining.is_empty() {
            match self.rx.recv() {
                Ok(reply) => {
                    remaining.remove(&reply.ticket);
                    replies.push(reply);
                }
                Err(_) => break,
            }
        }
        replies
    }
}
