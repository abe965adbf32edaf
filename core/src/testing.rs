//! Canned collaborators and a throwaway upstream server for unit tests.

use crate::config::SamplingConfig;
use crate::error::{Error, Result};
use crate::traits::{
    Completion, CompletionRequest, Message, ModelClient, SearchProvider, ToolCallRequest,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::net::TcpListener;

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

pub(crate) struct FakeSearch {
    outcome: std::result::Result<String, ErrorFactory>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            outcome: Ok(answer.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Self {
            outcome: Err(Box::new(error)),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str) -> Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.outcome {
            Ok(answer) => Ok(answer.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub messages: Vec<Message>,
    pub offered_tools: Option<Vec<String>>,
    pub sampling: SamplingConfig,
}

pub(crate) struct FakeModel {
    replies: Mutex<VecDeque<Result<Completion>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeModel {
    pub fn new(replies: Vec<Result<Completion>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: request.messages.to_vec(),
            offered_tools: request
                .tools
                .map(|tools| tools.iter().map(|t| t.name.clone()).collect()),
            sampling: request.sampling,
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::malformed("fake model", "no scripted reply left")))
    }
}

pub(crate) fn text(reply: &str) -> Result<Completion> {
    Ok(Completion::Text(reply.to_string()))
}

pub(crate) fn tool_call(call_id: &str, tool_name: &str, arguments: &str) -> Result<Completion> {
    Ok(Completion::ToolCall {
        call: ToolCallRequest {
            call_id: call_id.to_string(),
            tool_name: tool_name.to_string(),
            arguments: arguments.to_string(),
        },
        content: String::new(),
    })
}

pub(crate) async fn spawn_upstream(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
