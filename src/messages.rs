use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "register")]
    Register { nickname: String, password: String },
    #[serde(rename = "login")]
    Login { nickname: String, password: String },
    #[serde(rename = "chat_message")]
    ChatMessage { content: String },
    #[serde(rename = "leave")]
    Leave,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "registered")]
    Registered { nickname: String },
    #[serde(rename = "logged_in")]
    LoggedIn { nickname: String, is_admin: bool },
    #[serde(rename = "chat_message")]
    ChatMessage { sender: String, content: String },
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "error")]
    Error { message: String },
}
