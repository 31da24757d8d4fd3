//! Client handle for a running engine.

use crate::engine::command::EngineCommand;
use crate::engine::config::DisplayMode;
use crate::engine::status::EngineStatus;
use crate::engine::EngineError;
use crate::entity::{EntityKey, GeoEntity, LayerKind};
use tokio::sync::{mpsc, oneshot};

/// Cheap, cloneable handle submitting commands to the engine task.
///
/// Fire-and-forget methods resolve once the command is queued; their
/// outcomes surface as notices. Methods with a return value wait for the
/// engine's reply. Every method fails with [`EngineError::Stopped`] once
/// the engine has shut down.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub(crate) fn new(tx: mpsc::Sender<EngineCommand>) -> Self {
        Self { tx }
    }

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.tx.send(command).await.map_err(|_| EngineError::Stopped)
    }

    /// Refreshes all layers now instead of waiting for the next tick.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Refresh).await
    }

    /// Shows or hides one layer.
    pub async fn set_filter(&self, layer: LayerKind, visible: bool) -> Result<(), EngineError> {
        self.send(EngineCommand::SetFilter { layer, visible }).await
    }

    /// Selects an entity, exactly as clicking its marker would.
    pub async fn select(&self, entity: GeoEntity) -> Result<(), EngineError> {
        self.send(EngineCommand::MarkerClicked(entity)).await
    }

    /// Clears the selection. Any planned route stays drawn.
    pub async fn deselect(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Deselect).await
    }

    /// Saves the selected entity to favorites.
    ///
    /// Returns false when it was already saved. Fails with
    /// [`EngineError::NoSelection`] when nothing is selected.
    pub async fn add_favorite(&self) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::AddFavorite { reply }).await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Removes a favorite by identity. Returns false when it was not saved.
    pub async fn remove_favorite(&self, key: EntityKey) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::RemoveFavorite { key, reply }).await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Submits a search, superseding any search still in flight.
    ///
    /// Resolves once the query is accepted; the result arrives as a
    /// notice. Fails with [`EngineError::EmptyQuery`] for blank queries.
    pub async fn search(&self, query: impl Into<String>) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Search {
            query: query.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Plans a route from home to the selected entity.
    ///
    /// Resolves once planning starts; the outcome arrives as a notice.
    /// Fails with [`EngineError::NoSelection`] when nothing is selected.
    pub async fn plan_route(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::PlanRoute { reply }).await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Switches the presentation theme.
    pub async fn set_display_mode(&self, mode: DisplayMode) -> Result<(), EngineError> {
        self.send(EngineCommand::SetDisplayMode(mode)).await
    }

    /// Captures a snapshot of the engine's current state.
    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Status { reply }).await?;
        rx.await.map_err(|_| EngineError::Stopped)
    }
}
