//! Per-turn orchestration of the chat client.
//!
//! The `ConversationController` owns the in-memory transcript and drives
//! each user turn: append the user message, exchange it, append the reply,
//! persist both. A turn always ends with exactly one bot message.

use chatembed_core::{Message, MessageExchange, SessionInfo, TranscriptStore};
use chatembed_session::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use crate::state::{ConversationSnapshot, DebugSnapshot, TurnState};

/// Upper bound on a single transcript save before the turn moves on.
pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reasons a submission is refused before a turn starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("message is empty")]
    EmptyInput,

    #[error("a reply is still pending")]
    Busy,
}

/// Returns the controller to `Idle` when a turn ends, including when the
/// submitting future is dropped mid-exchange.
struct TurnGuard<'a> {
    state: &'a watch::Sender<ConversationSnapshot>,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|snapshot| {
            let was_loading = snapshot.state.is_loading();
            snapshot.state = TurnState::Idle;
            was_loading
        });
    }
}

/// Conversation state machine for one widget instance.
pub struct ConversationController<E = Arc<dyn MessageExchange>, S = Arc<dyn TranscriptStore>>
where
    E: Send + Sync,
    S: Send + Sync,
{
    exchange: E,
    store: S,
    sessions: Arc<SessionManager>,
    state: watch::Sender<ConversationSnapshot>,
    initialized: OnceCell<()>,
    save_timeout: Duration,
}

impl<E, S> ConversationController<E, S>
where
    E: MessageExchange + Send + Sync,
    S: TranscriptStore + Send + Sync,
{
    pub fn new(exchange: E, store: S, sessions: Arc<SessionManager>) -> Self {
        let (state, _) = watch::channel(ConversationSnapshot::default());
        Self {
            exchange,
            store,
            sessions,
            state,
            initialized: OnceCell::new(),
            save_timeout: DEFAULT_SAVE_TIMEOUT,
        }
    }

    /// Bound each transcript save. A save that overruns is abandoned so a
    /// stalled history backend cannot hold back the reply.
    #[must_use]
    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout = timeout;
        self
    }

    /// Seed the transcript with messages supplied by the host.
    #[must_use]
    pub fn with_initial_messages(self, messages: Vec<Message>) -> Self {
        self.state.send_modify(|snapshot| snapshot.transcript = messages);
        self
    }

    /// Establish the session and merge the stored history in front of the
    /// transcript. Runs at most once; later calls wait for the first.
    pub async fn initialize(&self) {
        self.initialized.get_or_init(|| self.load_history()).await;
    }

    async fn load_history(&self) {
        let session = self.sessions.ensure_session().await;
        let history = self.store.load(Some(&session.id)).await;
        info!(
            "Initialized conversation for session {} ({} stored messages)",
            session.id,
            history.len()
        );

        if !history.is_empty() {
            self.state.send_modify(|snapshot| {
                let seeded = std::mem::replace(&mut snapshot.transcript, history);
                snapshot.transcript.extend(seeded);
            });
        }
    }

    /// Run one user turn and return the bot message that ended it.
    ///
    /// The reply may be a degraded or fallback message (`error` set); the
    /// only refusals are blank input and a turn already in progress.
    pub async fn submit(&self, text: &str) -> Result<Message, ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyInput);
        }

        self.initialize().await;

        let user_message = Message::user(text);
        let mut accepted = false;
        self.state.send_if_modified(|snapshot| {
            if snapshot.state.is_loading() {
                return false;
            }
            snapshot.transcript.push(user_message.clone());
            snapshot.state = TurnState::AwaitingResponse;
            accepted = true;
            true
        });
        if !accepted {
            debug!("Rejected submission while awaiting a reply");
            return Err(ConversationError::Busy);
        }
        let _turn = TurnGuard { state: &self.state };

        let session = SessionInfo::from(&self.sessions.ensure_session().await);
        let history = self.transcript();

        // The save is polled first, so it is dispatched before the exchange request.
        let ((), reply) = tokio::join!(
            self.persist(&user_message, &session),
            self.exchange.send(&user_message, &history),
        );

        if reply.error {
            info!("Turn ended with a degraded reply: {}", reply.id);
        }
        self.state
            .send_modify(|snapshot| snapshot.transcript.push(reply.clone()));
        self.persist(&reply, &session).await;

        Ok(reply)
    }

    async fn persist(&self, message: &Message, session: &SessionInfo) {
        if tokio::time::timeout(self.save_timeout, self.store.save(message, session))
            .await
            .is_err()
        {
            warn!(
                "Gave up saving message {} after {:?}",
                message.id, self.save_timeout
            );
        }
    }

    /// Append a message supplied by the host. It is not persisted.
    pub fn add_message(&self, message: Message) {
        self.state
            .send_modify(|snapshot| snapshot.transcript.push(message));
    }

    /// Forget the session; the next turn starts a new one.
    pub async fn reset_session(&self) {
        self.sessions.reset().await;
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    #[must_use]
    pub fn transcript(&self) -> Vec<Message> {
        self.state.borrow().transcript.clone()
    }

    /// Receive a snapshot after every transcript or loading change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.state.subscribe()
    }

    pub async fn debug_snapshot(&self) -> DebugSnapshot {
        let (state, message_count) = {
            let snapshot = self.state.borrow();
            (snapshot.state, snapshot.transcript.len())
        };

        DebugSnapshot {
            session: self.sessions.info().await,
            state,
            message_count,
            initialized: self.initialized.initialized(),
            persistence_enabled: self.store.is_enabled(),
            endpoint: self.exchange.endpoint().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chatembed_core::{EndpointConfig, Sender};
    use chatembed_session::build_client;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Replies `echo: <text>`, optionally holding the reply until released.
    #[derive(Default)]
    struct EchoExchange {
        gated: bool,
        entered: Notify,
        release: Notify,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl EchoExchange {
        fn gated() -> Self {
            Self {
                gated: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl MessageExchange for EchoExchange {
        async fn send(&self, message: &Message, history: &[Message]) -> Message {
            self.calls
                .lock()
                .unwrap()
                .push((message.text.clone(), history.len()));
            if self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Message::bot(format!("echo: {}", message.text), None)
        }

        fn endpoint(&self) -> &str {
            "memory://echo"
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        history: Vec<Message>,
        saved: Mutex<Vec<(Message, SessionInfo)>>,
        loads: Mutex<usize>,
    }

    #[async_trait]
    impl TranscriptStore for RecordingStore {
        async fn load(&self, _session_id: Option<&str>) -> Vec<Message> {
            *self.loads.lock().unwrap() += 1;
            self.history.clone()
        }

        async fn save(&self, message: &Message, session: &SessionInfo) {
            self.saved
                .lock()
                .unwrap()
                .push((message.clone(), session.clone()));
        }

        fn is_enabled(&self) -> bool {
            true
        }
    }

    /// Never finishes a save.
    struct StalledStore;

    #[async_trait]
    impl TranscriptStore for StalledStore {
        async fn load(&self, _session_id: Option<&str>) -> Vec<Message> {
            Vec::new()
        }

        async fn save(&self, _message: &Message, _session: &SessionInfo) {
            std::future::pending::<()>().await;
        }

        fn is_enabled(&self) -> bool {
            true
        }
    }

    fn sessions() -> Arc<SessionManager> {
        let config = EndpointConfig::new("memory://echo");
        Arc::new(SessionManager::new(build_client(&config).unwrap(), &config))
    }

    fn controller(
        exchange: Arc<EchoExchange>,
        store: Arc<RecordingStore>,
    ) -> ConversationController<Arc<EchoExchange>, Arc<RecordingStore>> {
        ConversationController::new(exchange, store, sessions())
    }

    #[tokio::test]
    async fn turn_appends_user_then_bot() {
        let store = Arc::new(RecordingStore::default());
        let chat = controller(Arc::new(EchoExchange::default()), store.clone());

        let reply = chat.submit("  hello  ").await.unwrap();

        let transcript = chat.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].sender, Sender::User);
        assert_eq!(transcript[0].text, "hello");
        assert_eq!(transcript[1], reply);
        assert_eq!(reply.text, "echo: hello");
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn stalled_store_does_not_hold_back_the_reply() {
        let chat = ConversationController::new(
            Arc::new(EchoExchange::default()),
            Arc::new(StalledStore),
            sessions(),
        )
        .with_save_timeout(Duration::from_millis(50));

        let reply = tokio::time::timeout(Duration::from_secs(5), chat.submit("hello"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.text, "echo: hello");
        assert_eq!(chat.transcript().len(), 2);
        assert!(!chat.is_loading());
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let chat = controller(
            Arc::new(EchoExchange::default()),
            Arc::new(RecordingStore::default()),
        );
        assert_eq!(chat.submit("   ").await, Err(ConversationError::EmptyInput));
        assert!(chat.transcript().is_empty());
    }

    #[tokio::test]
    async fn both_messages_are_persisted_in_order() {
        let store = Arc::new(RecordingStore::default());
        let chat = controller(Arc::new(EchoExchange::default()), store.clone());

        chat.submit("one").await.unwrap();
        chat.submit("two").await.unwrap();

        let saved = store.saved.lock().unwrap();
        let texts: Vec<_> = saved.iter().map(|(m, _)| m.text.as_str()).collect();
        assert_eq!(texts, ["one", "echo: one", "two", "echo: two"]);
        let session_id = saved[0].1.session_id.clone();
        assert!(session_id.is_some());
        assert!(saved.iter().all(|(_, s)| s.session_id == session_id));
    }

    #[tokio::test]
    async fn loading_spans_the_exchange_and_rejects_reentry() {
        let exchange = Arc::new(EchoExchange::gated());
        let chat = Arc::new(controller(
            exchange.clone(),
            Arc::new(RecordingStore::default()),
        ));
        assert!(!chat.is_loading());

        let turn = tokio::spawn({
            let chat = chat.clone();
            async move { chat.submit("hello").await }
        });

        exchange.entered.notified().await;
        assert!(chat.is_loading());
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.submit("again").await, Err(ConversationError::Busy));
        assert_eq!(chat.transcript().len(), 1);

        exchange.release.notify_one();
        let reply = turn.await.unwrap().unwrap();

        assert!(!chat.is_loading());
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(reply.text, "echo: hello");
    }

    #[tokio::test]
    async fn dropped_turn_returns_to_idle() {
        let exchange = Arc::new(EchoExchange::gated());
        let chat = Arc::new(controller(
            exchange.clone(),
            Arc::new(RecordingStore::default()),
        ));

        let turn = tokio::spawn({
            let chat = chat.clone();
            async move { chat.submit("hello").await }
        });
        exchange.entered.notified().await;
        turn.abort();
        let _ = turn.await;

        assert!(!chat.is_loading());
        assert_eq!(chat.transcript().len(), 1);

        exchange.release.notify_one();
        assert!(chat.submit("retry").await.is_ok());
    }

    #[tokio::test]
    async fn exchange_sees_transcript_including_the_new_message() {
        let exchange = Arc::new(EchoExchange::default());
        let chat = controller(exchange.clone(), Arc::new(RecordingStore::default()));

        chat.submit("one").await.unwrap();
        chat.submit("two").await.unwrap();

        let calls = exchange.calls.lock().unwrap();
        assert_eq!(*calls, [("one".to_string(), 1), ("two".to_string(), 3)]);
    }

    #[tokio::test]
    async fn initialize_prepends_history_once() {
        let store = Arc::new(RecordingStore {
            history: vec![Message::user("earlier"), Message::bot("earlier reply", None)],
            ..RecordingStore::default()
        });
        let chat = controller(Arc::new(EchoExchange::default()), store.clone())
            .with_initial_messages(vec![Message::bot("Welcome!", None)]);

        tokio::join!(chat.initialize(), chat.initialize());
        chat.initialize().await;

        let texts: Vec<_> = chat.transcript().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["earlier", "earlier reply", "Welcome!"]);
        assert_eq!(*store.loads.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn submit_initializes_first() {
        let store = Arc::new(RecordingStore {
            history: vec![Message::user("earlier")],
            ..RecordingStore::default()
        });
        let chat = controller(Arc::new(EchoExchange::default()), store);

        chat.submit("now").await.unwrap();

        let texts: Vec<_> = chat.transcript().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["earlier", "now", "echo: now"]);
    }

    #[tokio::test]
    async fn subscribers_observe_each_change() {
        let exchange = Arc::new(EchoExchange::gated());
        let chat = Arc::new(controller(
            exchange.clone(),
            Arc::new(RecordingStore::default()),
        ));
        let mut updates = chat.subscribe();

        let turn = tokio::spawn({
            let chat = chat.clone();
            async move { chat.submit("hello").await }
        });

        exchange.entered.notified().await;
        updates.changed().await.unwrap();
        {
            let snapshot = updates.borrow_and_update();
            assert!(snapshot.is_loading());
            assert_eq!(snapshot.transcript.len(), 1);
        }

        exchange.release.notify_one();
        turn.await.unwrap().unwrap();

        updates.changed().await.unwrap();
        let snapshot = updates.borrow_and_update();
        assert!(!snapshot.is_loading());
        assert_eq!(snapshot.transcript.len(), 2);
    }

    #[tokio::test]
    async fn reset_starts_a_new_session() {
        let store = Arc::new(RecordingStore::default());
        let chat = controller(Arc::new(EchoExchange::default()), store.clone());

        chat.submit("one").await.unwrap();
        let first = chat.debug_snapshot().await.session.session_id;
        chat.reset_session().await;
        assert_eq!(chat.debug_snapshot().await.session, SessionInfo::default());

        chat.submit("two").await.unwrap();
        let second = chat.debug_snapshot().await.session.session_id;

        assert!(first.is_some());
        assert!(second.is_some());
        assert_ne!(first, second);
        assert_eq!(chat.transcript().len(), 4);
    }

    #[tokio::test]
    async fn added_messages_are_not_persisted() {
        let store = Arc::new(RecordingStore::default());
        let chat = controller(Arc::new(EchoExchange::default()), store.clone());

        chat.add_message(Message::bot("You said: \"hi\"", None));

        assert_eq!(chat.transcript().len(), 1);
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn debug_snapshot_reports_state() {
        let chat = controller(
            Arc::new(EchoExchange::default()),
            Arc::new(RecordingStore::default()),
        );

        let before = chat.debug_snapshot().await;
        assert!(!before.initialized);
        assert_eq!(before.state, TurnState::Idle);
        assert_eq!(before.endpoint, "memory://echo");

        chat.submit("hello").await.unwrap();

        let after = chat.debug_snapshot().await;
        assert!(after.initialized);
        assert!(after.persistence_enabled);
        assert_eq!(after.message_count, 2);
        assert!(after.session.session_id.is_some());
    }
}
