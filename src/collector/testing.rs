//! Scripted endpoints and sinks for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{SinkError, StreamError};
use crate::sink::Sink;

use super::transport::{StreamConnection, StreamConnector};

/// Behaviour of one connection attempt.
#[derive(Debug, Clone)]
pub enum Script {
    RefuseConnect,
    FailSubscribe,
    Stream { messages: Vec<String>, hang: bool },
}

impl Script {
    /// Delivers `messages`, then the peer drops the connection.
    pub fn stream(messages: &[&str]) -> Self {
        Self::Stream {
            messages: messages.iter().map(|m| m.to_string()).collect(),
            hang: false,
        }
    }

    /// Delivers `messages`, then stays silent forever.
    pub fn stream_then_hang(messages: &[&str]) -> Self {
        Self::Stream {
            messages: messages.iter().map(|m| m.to_string()).collect(),
            hang: true,
        }
    }
}

pub struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
    repeat: bool,
    connects: AtomicUsize,
    open: Arc<AtomicUsize>,
    peak_open: Arc<AtomicUsize>,
    subscriptions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    /// Plays `scripts` once; later attempts are refused.
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Self::build(scripts, false)
    }

    /// Plays `scripts` in a loop.
    pub fn repeating(scripts: Vec<Script>) -> Arc<Self> {
        Self::build(scripts, true)
    }

    fn build(scripts: Vec<Script>, repeat: bool) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            repeat,
            connects: AtomicUsize::new(0),
            open: Arc::new(AtomicUsize::new(0)),
            peak_open: Arc::new(AtomicUsize::new(0)),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn peak_open_connections(&self) -> usize {
        self.peak_open.load(Ordering::SeqCst)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().clone()
    }

    fn next_script(&self) -> Script {
        let mut scripts = self.scripts.lock();
        match scripts.pop_front() {
            Some(script) => {
                if self.repeat {
                    scripts.push_back(script.clone());
                }
                script
            }
            None => Script::RefuseConnect,
        }
    }
}

#[async_trait::async_trait]
impl StreamConnector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn StreamConnection>, StreamError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst) + 1;

        let (messages, hang, fail_subscribe): (VecDeque<String>, bool, bool) =
            match self.next_script() {
                Script::RefuseConnect => {
                    return Err(StreamError::Connect(format!("refused attempt {attempt}")));
                }
                Script::FailSubscribe => (VecDeque::new(), false, true),
                Script::Stream { messages, hang } => (messages.into(), hang, false),
            };

        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open.fetch_max(now_open, Ordering::SeqCst);

        Ok(Box::new(ScriptedConnection {
            messages,
            hang,
            fail_subscribe,
            open: self.open.clone(),
            subscriptions: self.subscriptions.clone(),
        }))
    }
}

struct ScriptedConnection {
    messages: VecDeque<String>,
    hang: bool,
    fail_subscribe: bool,
    open: Arc<AtomicUsize>,
    subscriptions: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl StreamConnection for ScriptedConnection {
    async fn send_text(&mut self, text: String) -> Result<(), StreamError> {
        if self.fail_subscribe {
            return Err(StreamError::Subscribe("broken pipe".into()));
        }
        self.subscriptions.lock().push(text);
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Vec<u8>, StreamError> {
        // Let other tasks interleave between messages
        tokio::task::yield_now().await;

        match self.messages.pop_front() {
            Some(msg) => Ok(msg.into_bytes()),
            None if self.hang => std::future::pending().await,
            None => Err(StreamError::Closed),
        }
    }

    async fn close(&mut self) {}
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Records every accepted payload.
pub struct RecordingSink {
    payloads: Mutex<Vec<String>>,
    fail_first: u32,
    calls: AtomicU32,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Self::failing_first(0)
    }

    /// Rejects the first `n` calls.
    pub fn failing_first(n: u32) -> Arc<Self> {
        Arc::new(Self {
            payloads: Mutex::new(Vec::new()),
            fail_first: n,
            calls: AtomicU32::new(0),
        })
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().clone()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Sink for RecordingSink {
    async fn publish(&self, payload: &[u8]) -> Result<(), SinkError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_first {
            return Err(SinkError::Unavailable(format!("call {n}")));
        }
        self.payloads
            .lock()
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(())
    }
}
