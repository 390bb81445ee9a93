use lobby_core::ChatMessage;
use tokio::sync::{mpsc, oneshot};

use crate::peer::LinkSnapshot;
use crate::{Result, VoiceError};

/// Requests from the host application into the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    Mute(bool),
    SendChat(String),
    Links(oneshot::Sender<Vec<LinkSnapshot>>),
    Timeline(oneshot::Sender<Vec<ChatMessage>>),
    /// Completes once every link is closed and every channel unsubscribed.
    Leave(oneshot::Sender<()>),
}

/// Cloneable handle to a running session. Dropping every handle makes the
/// session leave the room.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    pub async fn mute(&self, muted: bool) -> Result<()> {
        self.send(SessionCommand::Mute(muted)).await
    }

    pub async fn send_chat(&self, text: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::SendChat(text.into())).await
    }

    /// Current links, ordered by peer id.
    pub async fn links(&self) -> Result<Vec<LinkSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Links(reply)).await?;
        rx.await.map_err(|_| VoiceError::SessionClosed)
    }

    /// Chat messages received so far, oldest first.
    pub async fn timeline(&self) -> Result<Vec<ChatMessage>> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Timeline(reply)).await?;
        rx.await.map_err(|_| VoiceError::SessionClosed)
    }

    /// Leaves the room and waits for the teardown to finish.
    pub async fn leave(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(SessionCommand::Leave(done)).await?;
        rx.await.map_err(|_| VoiceError::SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, cmd: SessionCommand) -> Result<()> {
        self.tx.send(cmd).await.map_err(|_| VoiceError::SessionClosed)
    }
}
