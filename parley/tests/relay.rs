use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{StreamExt, stream};
use parley::prelude::*;
use parley::relay::{ACCESS_DENIED_REPLY, SYSTEM_PROMPT_SET_REPLY};
use parley::{
    BoxedDeltaStream, ChatRequest, DeltaChunk, FinishReason, MemorySink, ProviderFuture, SinkCall,
};

/// Replays scripted deltas; a `hang` script never finishes after its last
/// chunk so a test can pre-empt the turn mid-stream.
#[derive(Default)]
struct ScriptedBackend {
    scripts: Mutex<VecDeque<(Vec<DeltaChunk>, bool)>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    fn then_finish(self, chunks: Vec<DeltaChunk>) -> Self {
        self.scripts.lock().expect("scripts lock").push_back((chunks, false));
        self
    }

    fn then_hang(self, chunks: Vec<DeltaChunk>) -> Self {
        self.scripts.lock().expect("scripts lock").push_back((chunks, true));
        self
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl ChatBackend for ScriptedBackend {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn stream_chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let (chunks, hang) = self
                .scripts
                .lock()
                .expect("scripts lock")
                .pop_front()
                .unwrap_or_else(|| (vec![DeltaChunk::finished(FinishReason::Stop)], false));

            let replay = stream::iter(chunks.into_iter().map(Ok));
            let stream: BoxedDeltaStream<'a> = if hang {
                Box::pin(replay.chain(stream::pending()))
            } else {
                Box::pin(replay)
            };
            Ok(stream)
        })
    }
}

struct Harness {
    relay: Arc<Relay>,
    backend: Arc<ScriptedBackend>,
    sink: Arc<MemorySink>,
}

fn harness(config_toml: &str, backend: ScriptedBackend) -> Harness {
    let config = ParleyConfig::from_toml_str(config_toml).expect("config should parse");
    let backend = Arc::new(backend);
    let sink = Arc::new(MemorySink::new());
    let bundle = build_runtime_with_hooks(
        &config,
        Arc::clone(&backend) as Arc<dyn ChatBackend>,
        ToolRegistry::new(),
        RuntimeHooks::noop(),
    )
    .expect("runtime should build");
    let relay = Arc::new(Relay::from_bundle(
        bundle,
        Arc::clone(&sink) as Arc<dyn MessageSink>,
    ));

    Harness {
        relay,
        backend,
        sink,
    }
}

fn finished_text(text: &str) -> Vec<DeltaChunk> {
    vec![DeltaChunk::content(text).with_finish_reason(FinishReason::Stop)]
}

fn delivered(outcome: HandleOutcome) -> DeliveryReport {
    match outcome {
        HandleOutcome::Delivered(report) => *report,
        other => panic!("expected a delivered turn, got {other:?}"),
    }
}

fn turn_outcome(report: &DeliveryReport) -> TurnOutcome {
    report
        .summary
        .as_ref()
        .map(|summary| summary.outcome.clone())
        .expect("turn should complete")
}

async fn wait_for_calls(sink: &MemorySink, count: usize) {
    for _ in 0..100 {
        if sink.call_count() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("sink never reached {count} calls");
}

#[tokio::test(start_paused = true)]
async fn plain_message_streams_reply_under_the_inbound_message() {
    let harness = harness(
        "",
        ScriptedBackend::default().then_finish(vec![
            DeltaChunk::content("2+2"),
            DeltaChunk::content(" = 4").with_finish_reason(FinishReason::Stop),
        ]),
    );

    let outcome = harness
        .relay
        .handle(InboundMessage::new(7_i64, "2+2?").with_message_id(100_i64))
        .await;
    let report = delivered(outcome);

    assert_eq!(turn_outcome(&report), TurnOutcome::Completed);
    assert_eq!(report.windows.len(), 1);
    assert_eq!(
        harness.sink.text_of(&report.windows[0].message_id).as_deref(),
        Some("2+2 = 4")
    );
    match &harness.sink.calls()[0] {
        SinkCall::Create {
            reply_to,
            formatted,
            ..
        } => {
            assert_eq!(reply_to.as_ref(), Some(&MessageId::from(100_i64)));
            assert!(*formatted);
        }
        other => panic!("first call should create a window, got {other:?}"),
    }

    let request = &harness.backend.requests()[0];
    assert_eq!(request.model, "gpt-4-1106-preview");
    assert_eq!(request.messages[0], Message::system("You are a helpful AI assistant."));
    assert_eq!(request.messages[1], Message::user("2+2?"));
}

#[tokio::test]
async fn senders_outside_the_allow_list_are_refused() {
    let harness = harness("allowed_users = [\"alice\"]", ScriptedBackend::default());

    let outcome = harness
        .relay
        .handle(InboundMessage::new(7_i64, "hello").with_sender("mallory"))
        .await;

    assert_eq!(outcome, HandleOutcome::Refused);
    assert_eq!(harness.sink.calls().len(), 1);
    assert_eq!(harness.sink.calls()[0].text(), ACCESS_DENIED_REPLY);
    assert!(!harness.sink.calls()[0].is_formatted());
    assert!(harness.backend.requests().is_empty());
}

#[tokio::test]
async fn commands_reply_in_plain_text_without_a_backend_call() {
    let harness = harness("", ScriptedBackend::default());
    let id = SessionId::from(7_i64);

    let outcome = harness
        .relay
        .handle(InboundMessage::new(7_i64, "/gpt35").with_sender("alice"))
        .await;

    assert_eq!(outcome, HandleOutcome::Command(Command::Gpt35));
    assert_eq!(
        harness.relay.service().store().get(&id).model,
        "gpt-3.5-turbo-16k"
    );
    let calls = harness.sink.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].text().contains("gpt-3.5-turbo-16k"));
    assert!(!calls[0].is_formatted());
    assert!(harness.backend.requests().is_empty());
}

#[tokio::test]
async fn bare_system_prompt_command_captures_the_next_message() {
    let harness = harness("", ScriptedBackend::default().then_finish(finished_text("Bonjour")));
    let id = SessionId::from(7_i64);

    harness
        .relay
        .handle(InboundMessage::new(7_i64, "/system_prompt"))
        .await;
    let captured = harness
        .relay
        .handle(InboundMessage::new(7_i64, "Answer in French."))
        .await;

    assert_eq!(captured, HandleOutcome::SystemPromptSet);
    assert_eq!(
        harness.relay.service().store().get(&id).system_prompt,
        "Answer in French."
    );
    assert_eq!(
        harness.sink.calls().last().map(|call| call.text().to_string()),
        Some(SYSTEM_PROMPT_SET_REPLY.to_string())
    );
    assert!(harness.backend.requests().is_empty());

    let report = delivered(harness.relay.handle(InboundMessage::new(7_i64, "hi")).await);
    assert_eq!(turn_outcome(&report), TurnOutcome::Completed);
    assert_eq!(
        harness.backend.requests()[0].messages[0],
        Message::system("Answer in French.")
    );
}

#[tokio::test(start_paused = true)]
async fn new_message_preempts_the_running_turn() {
    let harness = harness(
        "",
        ScriptedBackend::default()
            .then_hang(vec![DeltaChunk::content("Hel")])
            .then_finish(finished_text("World")),
    );
    let id = SessionId::from(7_i64);

    let first = harness.relay.spawn(InboundMessage::new(7_i64, "first"));
    wait_for_calls(&harness.sink, 1).await;

    let second = delivered(harness.relay.handle(InboundMessage::new(7_i64, "second")).await);
    let first = delivered(first.await.expect("first task should join"));

    assert_eq!(turn_outcome(&first), TurnOutcome::Cancelled);
    assert_eq!(turn_outcome(&second), TurnOutcome::Completed);
    assert_eq!(
        harness.relay.service().store().history(&id),
        vec![
            Message::user("first"),
            Message::assistant("Hel"),
            Message::user("second"),
            Message::assistant("World"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_command_cancels_silently() {
    let harness = harness(
        "",
        ScriptedBackend::default().then_hang(vec![DeltaChunk::content("Partial answer")]),
    );
    let id = SessionId::from(7_i64);

    let running = harness.relay.spawn(InboundMessage::new(7_i64, "long question"));
    wait_for_calls(&harness.sink, 1).await;

    let outcome = harness.relay.handle(InboundMessage::new(7_i64, "/stop")).await;
    let report = delivered(running.await.expect("turn task should join"));

    assert_eq!(outcome, HandleOutcome::Command(Command::Stop));
    assert_eq!(turn_outcome(&report), TurnOutcome::Cancelled);
    assert!(
        harness
            .sink
            .calls()
            .iter()
            .all(|call| call.text().starts_with("Partial answer"))
    );
    assert_eq!(
        harness.relay.service().store().history(&id).last(),
        Some(&Message::assistant("Partial answer"))
    );
}

#[tokio::test]
async fn blank_messages_are_rejected() {
    let harness = harness("", ScriptedBackend::default());

    let outcome = harness.relay.handle(InboundMessage::new(7_i64, "   ")).await;

    match outcome {
        HandleOutcome::Rejected(err) => assert_eq!(err.kind, ChatErrorKind::InvalidRequest),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(harness.sink.call_count(), 0);
}
