use crate::agent::ConversationHistory;
use crate::config::SamplingConfig;
use crate::error::{Error, Result};
use crate::providers::azure;
use crate::tools::{self, ToolInvocation};
use crate::traits::{
    Completion, CompletionRequest, Message, ModelClient, SearchProvider, ToolCallRequest,
    ToolDefinition,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const EXIT_COMMAND: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingUserInput,
    AwaitingModelReply,
    AwaitingToolExecution,
    AwaitingModelReplyPostTool,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Reply(String),
    Ended,
}

pub fn is_exit_command(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Drives one chat session: ask the model, run at most one tool, ask again.
pub struct ConversationLoop {
    model: Arc<dyn ModelClient>,
    search: Arc<dyn SearchProvider>,
    sampling: SamplingConfig,
    history: ConversationHistory,
    state: LoopState,
    turn_path: Vec<LoopState>,
    session_id: Uuid,
}

impl ConversationLoop {
    pub fn new(
        model: Arc<dyn ModelClient>,
        search: Arc<dyn SearchProvider>,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            model,
            search,
            sampling,
            history: ConversationHistory::new(),
            state: LoopState::AwaitingUserInput,
            turn_path: Vec::new(),
            session_id: Uuid::new_v4(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.history.push(Message::system(prompt));
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn last_turn_path(&self) -> &[LoopState] {
        &self.turn_path
    }

    pub async fn handle_input(&mut self, input: &str) -> Result<TurnOutcome> {
        if self.state == LoopState::Ended {
            return Ok(TurnOutcome::Ended);
        }

        self.turn_path.clear();

        if is_exit_command(input) {
            self.transition(LoopState::Ended);
            info!(session = %self.session_id, messages = self.history.len(), "conversation ended");
            return Ok(TurnOutcome::Ended);
        }

        self.history.push(Message::user(input));
        self.transition(LoopState::AwaitingModelReply);

        let result = self.run_turn().await;
        if let Err(e) = &result {
            warn!(session = %self.session_id, "turn failed: {}", e);
        }
        self.transition(LoopState::AwaitingUserInput);

        result.map(TurnOutcome::Reply)
    }

    async fn run_turn(&mut self) -> Result<String> {
        let completion = self.ask(Some(tools::catalog())).await?;

        let (call, content) = match completion {
            Completion::Text(text) => return Ok(self.finish(text)),
            Completion::ToolCall { call, content } => (call, content),
        };

        self.transition(LoopState::AwaitingToolExecution);
        let output = self.execute_tool(call, content).await?;
        debug!(session = %self.session_id, bytes = output.len(), "tool finished");

        self.transition(LoopState::AwaitingModelReplyPostTool);
        match self.ask(None).await? {
            Completion::Text(text) => Ok(self.finish(text)),
            Completion::ToolCall { call, .. } => Err(Error::malformed(
                azure::SERVICE,
                format!(
                    "tool call '{}' requested after the tool round was used",
                    call.tool_name
                ),
            )),
        }
    }

    async fn ask(&self, tools: Option<&[ToolDefinition]>) -> Result<Completion> {
        let request = CompletionRequest {
            messages: self.history.as_slice(),
            tools,
            sampling: self.sampling,
        };
        self.model.complete(request).await
    }

    async fn execute_tool(&mut self, call: ToolCallRequest, content: String) -> Result<String> {
        // A rejected call must not leave a dangling tool turn in history.
        let invocation = ToolInvocation::from_call(&call)?;

        info!(
            session = %self.session_id,
            tool = %call.tool_name,
            call_id = %call.call_id,
            "executing tool"
        );

        let call_id = call.call_id.clone();
        let tool_name = call.tool_name.clone();
        self.history.push(Message::assistant_with_tool_call(content, call));

        let output = invocation.execute(self.search.as_ref()).await;
        self.history.push(Message::tool_result(call_id, tool_name, output.clone()));

        Ok(output)
    }

    fn finish(&mut self, text: String) -> String {
        self.history.push(Message::assistant(text.clone()));
        text
    }

    fn transition(&mut self, next: LoopState) {
        debug!(session = %self.session_id, from = ?self.state, to = ?next, "loop transition");
        self.state = next;
        self.turn_path.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeModel, FakeSearch, text, tool_call};
    use crate::traits::Role;

    fn conversation(
        replies: Vec<Result<Completion>>,
        search: FakeSearch,
    ) -> (ConversationLoop, Arc<FakeModel>, Arc<FakeSearch>) {
        let model = Arc::new(FakeModel::new(replies));
        let search = Arc::new(search);
        let convo = ConversationLoop::new(model.clone(), search.clone(), SamplingConfig::chat())
            .with_system_prompt("persona");
        (convo, model, search)
    }

    #[tokio::test]
    async fn direct_reply_skips_tool() {
        let (mut convo, model, search) =
            conversation(vec![text("Pack sunscreen.")], FakeSearch::answering("unused"));

        let outcome = convo.handle_input("Beach trip tips?").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Reply("Pack sunscreen.".into()));
        assert!(search.queries().is_empty());
        assert_eq!(model.calls().len(), 1);
        assert_eq!(
            model.calls()[0].offered_tools,
            Some(vec!["search_perplexity".to_string()])
        );
        assert_eq!(model.calls()[0].sampling, SamplingConfig::chat());

        let roles: Vec<Role> = convo.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(
            convo.last_turn_path(),
            &[LoopState::AwaitingModelReply, LoopState::AwaitingUserInput]
        );
    }

    #[tokio::test]
    async fn tool_round_trip() {
        let (mut convo, model, search) = conversation(
            vec![
                tool_call("call_42", "search_perplexity", r#"{"query": "X"}"#),
                text("Here is what I found."),
            ],
            FakeSearch::answering("search says hi"),
        );

        let outcome = convo.handle_input("Find X").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Reply("Here is what I found.".into()));

        assert_eq!(search.queries(), vec!["X".to_string()]);

        let tool_messages: Vec<&Message> = convo
            .history()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 1);
        assert_eq!(tool_messages[0].name.as_deref(), Some("search_perplexity"));
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("call_42"));
        assert_eq!(tool_messages[0].content, "search says hi");

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].offered_tools.is_some());
        assert!(calls[1].offered_tools.is_none());
        // The second request sees the assistant tool call and its result.
        assert_eq!(calls[1].messages.len(), 4);
        let replayed = calls[1].messages[2].tool_calls.as_ref().unwrap();
        assert_eq!(replayed[0].call_id, "call_42");

        assert_eq!(
            convo.last_turn_path(),
            &[
                LoopState::AwaitingModelReply,
                LoopState::AwaitingToolExecution,
                LoopState::AwaitingModelReplyPostTool,
                LoopState::AwaitingUserInput,
            ]
        );
        assert_eq!(convo.history().last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn exit_is_case_insensitive_and_final() {
        let (mut convo, model, _) = conversation(vec![], FakeSearch::answering("unused"));
        let before = convo.history().len();

        assert_eq!(convo.handle_input("Exit").await.unwrap(), TurnOutcome::Ended);
        assert_eq!(convo.state(), LoopState::Ended);
        assert_eq!(
            convo.handle_input("are you there?").await.unwrap(),
            TurnOutcome::Ended
        );

        assert_eq!(convo.history().len(), before);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_fails_the_turn() {
        let (mut convo, model, search) = conversation(
            vec![
                tool_call("call_1", "book_hotel", r#"{"city": "Rome"}"#),
                text("Rome it is."),
            ],
            FakeSearch::answering("unused"),
        );

        let err = convo.handle_input("Book me a hotel").await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(ref name) if name == "book_hotel"));
        assert_eq!(convo.state(), LoopState::AwaitingUserInput);
        assert!(search.queries().is_empty());
        assert_eq!(convo.history().last().unwrap().role, Role::User);

        let outcome = convo.handle_input("Just tell me about Rome").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Reply("Rome it is.".into()));
        assert_eq!(model.calls().len(), 2);
    }

    #[tokio::test]
    async fn malformed_arguments_fail_the_turn() {
        let (mut convo, _, search) = conversation(
            vec![tool_call("call_1", "search_perplexity", "{not json")],
            FakeSearch::answering("unused"),
        );

        let err = convo.handle_input("Search something").await.unwrap_err();
        assert!(matches!(err, Error::InvalidToolArguments { .. }));
        assert!(search.queries().is_empty());
    }

    #[tokio::test]
    async fn search_failure_is_fed_back_to_model() {
        let (mut convo, model, _) = conversation(
            vec![
                tool_call("call_7", "search_perplexity", r#"{"query": "Oslo events"}"#),
                text("I could not search, but here are ideas."),
            ],
            FakeSearch::failing(|| Error::upstream("Perplexity", "connection refused")),
        );

        let outcome = convo.handle_input("Events in Oslo?").await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Reply("I could not search, but here are ideas.".into())
        );

        let second = &model.calls()[1];
        let tool_message = second.messages.last().unwrap();
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(
            tool_message.content,
            "Error during Perplexity search: connection refused"
        );
    }

    #[tokio::test]
    async fn second_tool_call_in_one_turn_is_refused() {
        let (mut convo, model, search) = conversation(
            vec![
                tool_call("call_1", "search_perplexity", r#"{"query": "Kyoto temples"}"#),
                tool_call("call_2", "search_perplexity", r#"{"query": "Kyoto ryokan"}"#),
            ],
            FakeSearch::answering("Kinkaku-ji has a ramp."),
        );

        let err = convo.handle_input("Plan Kyoto with grandma").await.unwrap_err();

        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert_eq!(search.queries().len(), 1);
        assert_eq!(model.calls().len(), 2);
        assert_eq!(convo.state(), LoopState::AwaitingUserInput);

        let last = convo.history().last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
        let assistants = convo
            .history()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count();
        assert_eq!(assistants, 1);
    }

    #[tokio::test]
    async fn model_error_keeps_loop_usable() {
        let (mut convo, _, _) = conversation(
            vec![
                Err(Error::upstream("Azure OpenAI", "429 Too Many Requests")),
                text("Back again."),
            ],
            FakeSearch::answering("unused"),
        );

        let err = convo.handle_input("hello").await.unwrap_err();
        assert!(err.to_string().contains("429"));
        assert_eq!(convo.state(), LoopState::AwaitingUserInput);

        let outcome = convo.handle_input("hello again").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Reply("Back again.".into()));
    }

    #[test]
    fn exit_detection_trims_input() {
        assert!(is_exit_command("  EXIT \n"));
        assert!(!is_exit_command("exit now"));
    }
}
