//! Tests for the decision engine and the executor loop.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{Recorder, ScriptedModel};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use toolloop::agent::*;
use toolloop::callbacks::{Callback, CallbackManager};
use toolloop::error::{AgentError, Result};
use toolloop::history::{ChatMessageHistory, InMemoryChatHistory};
use toolloop::model::ChatModel;
use toolloop::tools::{AgentToolParameters, FnTool, Tool, ToolRegistry};
use toolloop::types::{ChatMessage, FunctionCall};

fn search_tool(invocations: Arc<AtomicUsize>) -> Arc<dyn Tool> {
    Arc::new(FnTool::structured(
        "search",
        "Search the web",
        AgentToolParameters::object()
            .string("query", "Search query", true)
            .build(),
        move |args, _ctx| {
            let invocations = invocations.clone();
            async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                Ok(format!("results for {}", args.get_str("query")?))
            }
        },
    ))
}

fn registry(tools: Vec<Arc<dyn Tool>>) -> ToolRegistry {
    ToolRegistry::from_tools(tools).unwrap()
}

fn executor(model: &Arc<ScriptedModel>, tools: ToolRegistry, config: ExecutorConfig) -> Executor {
    FunctionsAgent::executor(
        model.clone() as Arc<dyn ChatModel>,
        tools,
        FunctionsAgentConfig::default(),
        config,
    )
    .unwrap()
}

fn inputs(input: &str) -> ChainValues {
    ChainValues::from([("input".to_string(), json!(input))])
}

#[tokio::test]
async fn plain_answer_finishes_after_one_plan() {
    let model = Arc::new(ScriptedModel::new().reply_text("Paris"));
    let executor = executor(&model, ToolRegistry::new(), ExecutorConfig::default());

    let outputs = executor.call(inputs("Capital of France?")).await.unwrap();

    assert_eq!(outputs, ChainValues::from([("output".to_string(), json!("Paris"))]));
    assert_eq!(model.calls(), 1);
    assert_eq!(
        model.prompts()[0],
        vec![
            ChatMessage::system("You are a helpful AI assistant."),
            ChatMessage::human("Capital of France?"),
        ]
    );
}

#[tokio::test]
async fn tool_call_then_answer_records_one_step() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let model = Arc::new(
        ScriptedModel::new()
            .reply_call("search", r#"{"query":"weather"}"#)
            .reply_text("It is sunny"),
    );
    let executor = executor(
        &model,
        registry(vec![search_tool(invocations.clone())]),
        ExecutorConfig {
            return_intermediate_steps: true,
            ..Default::default()
        },
    );

    let outputs = executor.call(inputs("Weather?")).await.unwrap();

    assert_eq!(outputs["output"], json!("It is sunny"));
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(model.calls(), 2);

    let steps = outputs[INTERMEDIATE_STEPS_KEY].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["observation"], json!("results for weather"));

    let second_prompt = &model.prompts()[1];
    assert_eq!(
        second_prompt[second_prompt.len() - 2..],
        [
            ChatMessage::ai_with_call("", FunctionCall::new("search", r#"{"query":"weather"}"#)),
            ChatMessage::function("search", "results for weather"),
        ]
    );
    assert_eq!(model.offered_functions()[0], vec!["search".to_string()]);
}

#[tokio::test]
async fn run_returns_the_answer_text() {
    let model = Arc::new(ScriptedModel::new().reply_text("Paris"));
    let executor = executor(&model, ToolRegistry::new(), ExecutorConfig::default());

    assert_eq!(executor.run("Capital of France?").await.unwrap(), "Paris");
}

#[tokio::test]
async fn iteration_limit_stops_a_model_that_never_finishes() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let model = Arc::new(ScriptedModel::new().reply_call("search", r#"{"query":"weather"}"#));
    let executor = executor(
        &model,
        registry(vec![search_tool(invocations.clone())]),
        ExecutorConfig {
            max_iterations: 1,
            ..Default::default()
        },
    );

    let err = executor.call(inputs("Weather?")).await.unwrap_err();

    match err {
        AgentError::MaxIterationsReached { steps } => {
            assert_eq!(steps.len(), 1);
            assert_eq!(steps[0].action.tool, "search");
            assert_eq!(
                steps[0].action.log,
                "\nInvoking `search` with `{\"query\":\"weather\"}`\n\n"
            );
        }
        other => panic!("expected MaxIterationsReached, got {other:?}"),
    }
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn never_exceeds_the_iteration_limit() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let model = Arc::new(ScriptedModel::new().reply_call("search", r#"{"query":"again"}"#));
    let executor = executor(
        &model,
        registry(vec![search_tool(invocations.clone())]),
        ExecutorConfig::default(),
    );

    let err = executor.call(inputs("Loop forever")).await.unwrap_err();

    assert!(matches!(err, AgentError::MaxIterationsReached { ref steps } if steps.len() == 5));
    assert_eq!(model.calls(), 5);
    assert_eq!(invocations.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn malformed_tool_input_aborts_without_recording_a_step() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let recorder = Recorder::new();
    let model = Arc::new(
        ScriptedModel::new()
            .reply_call("search", r#"{"query":"#)
            .reply_text("unreachable"),
    );
    let executor = executor(
        &model,
        registry(vec![search_tool(invocations.clone())]),
        ExecutorConfig::default(),
    )
    .with_callbacks(CallbackManager::default().with_handler(recorder.clone()));

    let err = executor.call(inputs("Weather?")).await.unwrap_err();

    match err {
        AgentError::InputShapeMismatch { tool_name, .. } => assert_eq!(tool_name, "search"),
        other => panic!("expected InputShapeMismatch, got {other:?}"),
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert_eq!(model.calls(), 1);
    assert_eq!(
        recorder.events(),
        vec![
            "model_end".to_string(),
            "action:search".to_string(),
            "tool_start:search:{\"query\":".to_string(),
            "tool_error:search".to_string(),
        ]
    );
}

#[tokio::test]
async fn lifecycle_events_share_one_run_id() {
    let recorder = Recorder::new();
    let model = Arc::new(
        ScriptedModel::new()
            .reply_call("search", r#"{"query":"weather"}"#)
            .reply_text("It is sunny"),
    );
    let executor = executor(
        &model,
        registry(vec![search_tool(Arc::new(AtomicUsize::new(0)))]),
        ExecutorConfig::default(),
    )
    .with_callbacks(CallbackManager::default().with_handler(recorder.clone()));

    executor.call(inputs("Weather?")).await.unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            "model_end".to_string(),
            "action:search".to_string(),
            "tool_start:search:{\"query\":\"weather\"}".to_string(),
            "tool_end:search:results for weather".to_string(),
            "model_end".to_string(),
            "finish".to_string(),
        ]
    );
    let run_ids = recorder.run_ids();
    assert!(run_ids.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn tool_failure_is_fatal_and_reported() {
    let recorder = Recorder::new();
    let failing: Arc<dyn Tool> =
        Arc::new(FnTool::text("lookup", "Look up a word", |_text, _ctx| async {
            Err(AgentError::InvalidArgument("dictionary offline".into()))
        }));
    let model = Arc::new(ScriptedModel::new().reply_call("lookup", r#"{"__arg1":"rust"}"#));
    let executor = executor(&model, registry(vec![failing]), ExecutorConfig::default())
        .with_callbacks(CallbackManager::default().with_handler(recorder.clone()));

    let err = executor.call(inputs("Define rust")).await.unwrap_err();

    match err {
        AgentError::ToolExecution { tool_name, message } => {
            assert_eq!(tool_name, "lookup");
            assert!(message.contains("dictionary offline"));
        }
        other => panic!("expected ToolExecution, got {other:?}"),
    }
    assert!(recorder.events().contains(&"tool_error:lookup".to_string()));
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn text_tools_receive_the_single_argument() {
    let echo: Arc<dyn Tool> =
        Arc::new(FnTool::text("echo", "Echo the input", |text, _ctx| async move {
            Ok(text.to_uppercase())
        }));
    let model = Arc::new(
        ScriptedModel::new()
            .reply_call("echo", r#"{"__arg1":"hello"}"#)
            .reply_text("done"),
    );
    let executor = executor(&model, registry(vec![echo]), ExecutorConfig::default());

    executor.call(inputs("Echo hello")).await.unwrap();

    let second_prompt = &model.prompts()[1];
    assert_eq!(
        second_prompt.last(),
        Some(&ChatMessage::function("echo", "HELLO"))
    );
}

#[tokio::test]
async fn unknown_tool_is_fatal() {
    let model = Arc::new(ScriptedModel::new().reply_call("missing", "{}"));
    let executor = executor(&model, ToolRegistry::new(), ExecutorConfig::default());

    let err = executor.call(inputs("Hi")).await.unwrap_err();

    assert!(matches!(err, AgentError::ToolNotFound(ref name) if name == "missing"));
}

#[tokio::test]
async fn non_ai_reply_is_a_protocol_error() {
    let model = Arc::new(ScriptedModel::new().reply(ChatMessage::human("not an answer")));
    let executor = executor(&model, ToolRegistry::new(), ExecutorConfig::default());

    let err = executor.call(inputs("Hi")).await.unwrap_err();

    match err {
        AgentError::UnexpectedMessageType { got } => assert_eq!(got, "human"),
        other => panic!("expected UnexpectedMessageType, got {other:?}"),
    }
}

#[tokio::test]
async fn model_errors_propagate_unchanged() {
    let model = Arc::new(ScriptedModel::new().fail(AgentError::api(503, "unavailable")));
    let executor = executor(&model, ToolRegistry::new(), ExecutorConfig::default());

    let err = executor.call(inputs("Hi")).await.unwrap_err();

    assert!(matches!(err, AgentError::Api { status: 503, .. }));
}

#[tokio::test]
async fn canceled_before_start_makes_no_model_call() {
    let model = Arc::new(ScriptedModel::new().reply_text("Paris"));
    let executor = executor(&model, ToolRegistry::new(), ExecutorConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = executor
        .call_with_cancel(inputs("Capital of France?"), cancel)
        .await
        .unwrap_err();

    assert!(err.is_canceled());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn cancellation_during_a_tool_unwinds_the_run() {
    let slow: Arc<dyn Tool> =
        Arc::new(FnTool::text("slow", "Never finishes", |_text, ctx| async move {
            ctx.cancel.cancel();
            futures::future::pending::<()>().await;
            Ok(String::new())
        }));
    let model = Arc::new(
        ScriptedModel::new()
            .reply_call("slow", r#"{"__arg1":"x"}"#)
            .reply_text("unreachable"),
    );
    let executor = executor(&model, registry(vec![slow]), ExecutorConfig::default());

    let err = executor.call(inputs("Go")).await.unwrap_err();

    assert!(matches!(err, AgentError::Canceled));
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn history_store_replaces_templates() {
    let history = Arc::new(InMemoryChatHistory::with_messages(vec![
        ChatMessage::human("My name is Ada."),
        ChatMessage::ai("Hello Ada."),
    ]));
    let model = Arc::new(ScriptedModel::new().reply_text("Your name is Ada."));
    let executor = FunctionsAgent::executor(
        model.clone() as Arc<dyn ChatModel>,
        ToolRegistry::new(),
        FunctionsAgentConfig {
            chat_history: Some(history.clone() as Arc<dyn ChatMessageHistory>),
            ..Default::default()
        },
        ExecutorConfig::default(),
    )
    .unwrap();

    let answer = executor.run("What is my name?").await.unwrap();

    assert_eq!(answer, "Your name is Ada.");
    assert_eq!(
        model.prompts()[0],
        vec![
            ChatMessage::human("My name is Ada."),
            ChatMessage::ai("Hello Ada."),
            ChatMessage::human("What is my name?"),
        ]
    );
}

#[tokio::test]
async fn custom_output_key_and_extra_messages() {
    let model = Arc::new(ScriptedModel::new().reply_text("42"));
    let executor = FunctionsAgent::executor(
        model.clone() as Arc<dyn ChatModel>,
        ToolRegistry::new(),
        FunctionsAgentConfig {
            output_key: "answer".into(),
            extra_messages: vec![toolloop::prompt::MessageTemplate::system("Answer in {{.unit}}.")],
            ..Default::default()
        },
        ExecutorConfig::default(),
    )
    .unwrap();

    let mut values = inputs("How many?");
    values.insert("unit".into(), json!("digits"));
    let outputs = executor.call(values).await.unwrap();

    assert_eq!(outputs["answer"], json!("42"));
    assert_eq!(model.prompts()[0][1], ChatMessage::system("Answer in digits."));
}

#[tokio::test]
async fn missing_input_key_is_rejected() {
    let model = Arc::new(ScriptedModel::new().reply_text("Paris"));
    let executor = executor(&model, ToolRegistry::new(), ExecutorConfig::default());

    let err = executor.call(ChainValues::new()).await.unwrap_err();

    assert!(matches!(err, AgentError::InvalidArgument(ref m) if m.contains("input")));
    assert_eq!(model.calls(), 0);
}

#[test]
fn models_without_function_calling_are_rejected() {
    let model: Arc<dyn ChatModel> = Arc::new(ScriptedModel::without_function_calling());

    let err = FunctionsAgent::new(model, &ToolRegistry::new(), FunctionsAgentConfig::default())
        .unwrap_err();

    assert!(matches!(err, AgentError::Configuration(_)));
}

struct VetoActions;

impl Callback for VetoActions {
    fn on_agent_action(&self, _run_id: uuid::Uuid, action: &AgentAction) -> Result<()> {
        Err(AgentError::Callback(format!("vetoed {}", action.tool)))
    }
}

#[tokio::test]
async fn hook_errors_abort_the_step() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let model = Arc::new(ScriptedModel::new().reply_call("search", r#"{"query":"weather"}"#));
    let executor = executor(
        &model,
        registry(vec![search_tool(invocations.clone())]),
        ExecutorConfig::default(),
    )
    .with_callbacks(CallbackManager::default().with_handler(Arc::new(VetoActions)));

    let err = executor.call(inputs("Weather?")).await.unwrap_err();

    assert!(matches!(err, AgentError::Callback(ref m) if m == "vetoed search"));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn plan_yields_action_with_originating_message() {
    let model = Arc::new(ScriptedModel::new().reply(ChatMessage::ai_with_call(
        "Let me check.",
        FunctionCall::new("search", r#"{ "query": "weather" }"#),
    )));
    let agent = FunctionsAgent::new(
        model.clone() as Arc<dyn ChatModel>,
        &registry(vec![search_tool(Arc::new(AtomicUsize::new(0)))]),
        FunctionsAgentConfig::default(),
    )
    .unwrap();

    let decision = agent
        .plan(&RunContext::default(), &[], &inputs("Weather?"))
        .await
        .unwrap();

    match decision {
        AgentDecision::Action(action) => {
            assert_eq!(action.tool, "search");
            assert_eq!(
                action.log,
                "\nInvoking `search` with `{\"query\":\"weather\"}`\nresponded: Let me check.\n"
            );
            assert_eq!(action.message_log.len(), 1);
            assert_eq!(action.message_log[0].text(), "Let me check.");
        }
        other => panic!("expected action, got {other:?}"),
    }
    assert_eq!(agent.input_keys(), vec!["input".to_string()]);
    assert_eq!(agent.output_keys(), vec!["output".to_string()]);
}
