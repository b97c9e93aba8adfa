use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use crate::client::OracleTransport;

/// Transport that replays canned replies in order and records every prompt.
///
/// `Err` entries simulate transport failures. Clones share the same script,
/// so a test can keep a handle after moving one into an `OracleClient`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<String, String>>,
    prompts: Vec<String>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Script {
                replies: replies.into_iter().collect(),
                prompts: Vec::new(),
            })),
        }
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.inner
            .lock()
            .map(|script| script.prompts.len())
            .unwrap_or_default()
    }

    /// User prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|script| script.prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OracleTransport for ScriptedTransport {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        let mut script = self
            .inner
            .lock()
            .map_err(|_| anyhow!("scripted transport poisoned"))?;
        script.prompts.push(user_prompt.to_string());
        match script.replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => bail!("{message}"),
            None => bail!("scripted transport has no reply left"),
        }
    }
}
