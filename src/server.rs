use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::accounts::AccountStore;
use crate::commands::{parse_command, AdminCommand, ParsedCommand, HELP_TEXT};
use crate::error::ChatError;
use crate::history::{LogEntry, MessageLog, MAX_MESSAGES_COUNT, SYSTEM_SENDER};
use crate::messages::{ClientMessage, ServerMessage};
use crate::mute::MuteRegistry;
use crate::render::{self, MessageRenderer};

/// Capacity of the fan-out channel. A viewer that falls this far behind
/// starts losing messages (warned, not fatal).
const BROADCAST_CAPACITY: usize = 100;

type Connections = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>>;

/// Per-connection state, owned by that connection's read loop.
struct Session {
    connection_id: String,
    user: Option<SessionUser>,
}

struct SessionUser {
    nickname: String,
    is_admin: bool,
    delivery: JoinHandle<()>,
}

#[derive(Clone)]
pub struct Server {
    accounts: Arc<RwLock<AccountStore>>,
    muted: Arc<RwLock<MuteRegistry>>,
    history: Arc<RwLock<MessageLog>>,
    online: Arc<RwLock<HashSet<String>>>,
    connections: Connections,
    broadcast_tx: broadcast::Sender<LogEntry>,
    renderer: Arc<MessageRenderer>,
}

impl Server {
    pub fn new(account_path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let accounts = AccountStore::load(account_path.as_ref())?;
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        Ok(Server {
            accounts: Arc::new(RwLock::new(accounts)),
            muted: Arc::new(RwLock::new(MuteRegistry::new())),
            history: Arc::new(RwLock::new(MessageLog::new(MAX_MESSAGES_COUNT))),
            online: Arc::new(RwLock::new(HashSet::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            broadcast_tx,
            renderer: Arc::new(MessageRenderer::new()),
        })
    }

    pub async fn handle_connection(&self, ws: WebSocket) {
        let connection_id = Uuid::new_v4().to_string();
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();

        {
            let mut connections = self.connections.write().await;
            connections.insert(connection_id.clone(), tx);
        }
        log::info!("connection {connection_id} opened");

        let server = self.clone();
        tokio::spawn(async move {
            let mut session = Session {
                connection_id,
                user: None,
            };

            while let Some(result) = ws_rx.next().await {
                match result {
                    Ok(msg) => {
                        let Ok(text) = msg.to_str() else { continue };
                        let Ok(client_msg) = serde_json::from_str::<ClientMessage>(text) else {
                            continue;
                        };
                        if let Err(e) = server.handle_client_message(&mut session, client_msg).await
                        {
                            log::error!("session {}: {e}", session.connection_id);
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("websocket error on {}: {e}", session.connection_id);
                        break;
                    }
                }
            }

            server.teardown_session(&mut session).await;
            let mut connections = server.connections.write().await;
            connections.remove(&session.connection_id);
            log::info!("connection {} closed", session.connection_id);
        });

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = ws_tx.send(message).await {
                    log::warn!("failed to send websocket message: {e}");
                    break;
                }
            }
        });
    }

    async fn handle_client_message(
        &self,
        session: &mut Session,
        message: ClientMessage,
    ) -> Result<(), ChatError> {
        match message {
            ClientMessage::Register { nickname, password } => {
                let result = {
                    let mut accounts = self.accounts.write().await;
                    accounts.register(&nickname, &password)
                };
                match result {
                    Ok(()) => {
                        log::info!("registered account `{nickname}`");
                        self.send_to_connection(
                            &session.connection_id,
                            ServerMessage::Registered { nickname },
                        )
                        .await;
                    }
                    Err(e @ ChatError::DuplicateName) => {
                        self.send_error(&session.connection_id, &e.to_string()).await;
                    }
                    // A failed account-file write is fatal to this session.
                    Err(e) => return Err(e),
                }
            }
            ClientMessage::Login { nickname, password } => {
                self.handle_login(session, nickname, password).await;
            }
            ClientMessage::ChatMessage { content } => {
                self.handle_chat_message(session, content).await;
            }
            ClientMessage::Leave => {
                self.teardown_session(session).await;
                self.send_to_connection(&session.connection_id, ServerMessage::Left)
                    .await;
            }
        }
        Ok(())
    }

    async fn handle_login(&self, session: &mut Session, nickname: String, password: String) {
        if session.user.is_some() {
            self.send_error(&session.connection_id, "already logged in").await;
            return;
        }

        let is_admin = {
            let accounts = self.accounts.read().await;
            match accounts.authenticate(&nickname, &password) {
                Ok(account) => account.admin,
                Err(e) => {
                    self.send_error(&session.connection_id, &e.to_string()).await;
                    return;
                }
            }
        };

        let Some(sender) = self.connection_sender(&session.connection_id).await else {
            return;
        };

        self.online.write().await.insert(nickname.clone());

        // Subscribe before taking the replay cursor so nothing appended in
        // between is lost; the cursor then bounds the live stream below.
        let subscriber = self.broadcast_tx.subscribe();
        let (backlog, cursor) = self.history.read().await.read_since(0);

        self.send_to_connection(
            &session.connection_id,
            ServerMessage::LoggedIn {
                nickname: nickname.clone(),
                is_admin,
            },
        )
        .await;

        for entry in backlog {
            if entry.sender == nickname {
                continue;
            }
            let content = self.renderer.personalize(&entry.body, &nickname);
            self.send_to_connection(
                &session.connection_id,
                ServerMessage::ChatMessage {
                    sender: entry.sender,
                    content,
                },
            )
            .await;
        }

        let delivery = tokio::spawn(Self::deliver_messages(
            nickname.clone(),
            cursor,
            subscriber,
            sender,
            Arc::clone(&self.renderer),
        ));

        session.user = Some(SessionUser {
            nickname: nickname.clone(),
            is_admin,
            delivery,
        });

        let notice = if is_admin {
            format!("Administrator `{nickname}` joined the chat!")
        } else {
            format!("`{nickname}` joined the chat!")
        };
        self.append_system(&notice).await;
        log::info!("`{nickname}` logged in");
    }

    /// Forward broadcast entries to one viewer: skip anything already shown
    /// by the login replay, skip the viewer's own messages, and personalize
    /// mention highlighting before sending.
    async fn deliver_messages(
        nickname: String,
        cursor: u64,
        mut subscriber: broadcast::Receiver<LogEntry>,
        sender: mpsc::UnboundedSender<Message>,
        renderer: Arc<MessageRenderer>,
    ) {
        loop {
            match subscriber.recv().await {
                Ok(entry) => {
                    if entry.seq < cursor || entry.sender == nickname {
                        continue;
                    }
                    let content = renderer.personalize(&entry.body, &nickname);
                    let reply = ServerMessage::ChatMessage {
                        sender: entry.sender,
                        content,
                    };
                    let Ok(text) = serde_json::to_string(&reply) else { continue };
                    if sender.send(Message::text(text)).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("`{nickname}` fell behind, {missed} messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    async fn handle_chat_message(&self, session: &mut Session, content: String) {
        let Some(user) = &session.user else {
            self.send_error(&session.connection_id, "log in before sending messages")
                .await;
            return;
        };
        let nickname = user.nickname.clone();
        let is_admin = user.is_admin;

        if self.muted.read().await.is_muted(&nickname) {
            self.send_error(
                &session.connection_id,
                "You are temporarily muted and cannot send messages.",
            )
            .await;
            return;
        }

        // Only admins get the command interpreter; everyone else's
        // slash-text is an ordinary message.
        if content.starts_with('/') && is_admin {
            let outcome = self.run_admin_command(&content).await;
            self.append_system(&outcome).await;
            return;
        }

        let body = {
            let online = self.online.read().await;
            self.renderer.render_message(&content, &online)
        };
        let html = render::user_html(&nickname, &body);
        self.append_user(&nickname, html.clone()).await;

        // The sender sees their own message right away; the delivery task
        // skips self-authored entries.
        self.send_to_connection(
            &session.connection_id,
            ServerMessage::ChatMessage {
                sender: nickname,
                content: html,
            },
        )
        .await;
    }

    async fn run_admin_command(&self, text: &str) -> String {
        match parse_command(text) {
            ParsedCommand::Command(AdminCommand::Mute { username, seconds }) => {
                let duration = Duration::from_secs(u64::try_from(seconds).unwrap_or(0));
                self.muted.write().await.mute(&username, duration);
                format!("User `{username}` is muted for {seconds} seconds.")
            }
            ParsedCommand::Command(AdminCommand::Unmute { username }) => {
                if self.muted.write().await.unmute(&username) {
                    format!("User `{username}` is unmuted.")
                } else {
                    format!("Error: user `{username}` was not muted.")
                }
            }
            ParsedCommand::Command(AdminCommand::Help) => HELP_TEXT.to_string(),
            ParsedCommand::BadMuteDuration => "Error: invalid mute duration.".to_string(),
            ParsedCommand::Unknown => "Error: unknown command.".to_string(),
        }
    }

    /// Append a platform notice and fan it out to every viewer.
    async fn append_system(&self, text: &str) {
        let body = render::system_html(text);
        let entry = self.history.write().await.append(SYSTEM_SENDER, body);
        let _ = self.broadcast_tx.send(entry);
    }

    async fn append_user(&self, nickname: &str, body: String) {
        let entry = self.history.write().await.append(nickname, body);
        let _ = self.broadcast_tx.send(entry);
    }

    /// Shared teardown for explicit leave and socket drop. Safe to call when
    /// the session never authenticated.
    async fn teardown_session(&self, session: &mut Session) {
        let Some(user) = session.user.take() else { return };
        user.delivery.abort();
        self.online.write().await.remove(&user.nickname);
        self.append_system(&format!("`{}` left the chat!", user.nickname))
            .await;
        log::info!("`{}` left", user.nickname);
    }

    async fn connection_sender(
        &self,
        connection_id: &str,
    ) -> Option<mpsc::UnboundedSender<Message>> {
        self.connections.read().await.get(connection_id).cloned()
    }

    async fn send_to_connection(&self, connection_id: &str, message: ServerMessage) {
        if let Ok(text) = serde_json::to_string(&message) {
            let connections = self.connections.read().await;
            if let Some(sender) = connections.get(connection_id) {
                let _ = sender.send(Message::text(text));
            }
        }
    }

    async fn send_error(&self, connection_id: &str, message: &str) {
        self.send_to_connection(
            connection_id,
            ServerMessage::Error {
                message: message.to_string(),
            },
        )
        .await;
    }
}
