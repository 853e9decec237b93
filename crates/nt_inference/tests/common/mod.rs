#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nt_core::{Error, GenerationOptions, Result, TextGenerator};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const ARTICLE: &str = "Company X, led by CEO Jane Doe, announced record profits. \
                           Doe said the results reflect strong demand.";

pub const SUMMARY_JSON: &str = r#"{"headline": "Record profits", "summary": "Company X did well.", "topics": ["Business", "Earnings"], "keywords": ["Company", "profits", "demand"]}"#;
pub const REFERENCES_JSON: &str = r#"{"sent_lst": ["Doe said the results reflect strong demand."]}"#;
pub const ANSWER_JSON: &str = r#"{"answer": "Jane Doe", "evidence": ["CEO Jane Doe"]}"#;

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Transport,
    Service,
    Config,
}

impl Reply {
    pub fn text(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

/// Fake generator that plays back scripted replies and records prompts.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    prompts: Mutex<Vec<String>>,
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel").finish()
    }
}

impl ScriptedModel {
    pub fn new(replies: Vec<Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with `text`.
    pub fn always(text: &str) -> Arc<Self> {
        Self::new(Vec::new(), Reply::text(text))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn generate(&self, _model_id: &str, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Transport => Err(Error::Transport("connection refused".to_string())),
            Reply::Service => Err(Error::Service("500: internal".to_string())),
            Reply::Config => Err(Error::Config("bad key".to_string())),
        }
    }
}

struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub struct WarnCount {
    count: Arc<AtomicUsize>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl WarnCount {
    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Counts WARN events emitted on this thread while the handle is alive.
pub fn count_warnings() -> WarnCount {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(count.clone()));
    WarnCount {
        count,
        _guard: tracing::subscriber::set_default(subscriber),
    }
}
