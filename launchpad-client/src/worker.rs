//! The persistence worker: one tokio task draining a FIFO of commands.
//!
//! Commands run strictly one at a time in the order the UI sent them, so an
//! index inside a command always refers to the list as the UI had it at
//! dispatch. Every command produces exactly one [`UiEvent::WriteSettled`].

use std::{path::PathBuf, sync::Arc};

use launchpad_core::{Backend, BackendError, InstalledClient, LanguageId, ProfileField, ServerProfile};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WriteTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistCommand {
    AddProfile(ServerProfile),
    RemoveProfile {
        index: usize,
    },
    ReorderProfiles {
        old_index: usize,
        new_index: usize,
    },
    SetProfileField {
        index: usize,
        field: ProfileField,
        value: String,
    },
    SetLanguage(LanguageId),
    AddClient(PathBuf),
}

impl PersistCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PersistCommand::AddProfile(_) => "add_profile",
            PersistCommand::RemoveProfile { .. } => "remove_profile",
            PersistCommand::ReorderProfiles { .. } => "reorder_profiles",
            PersistCommand::SetProfileField { .. } => "set_profile_field",
            PersistCommand::SetLanguage(_) => "set_language",
            PersistCommand::AddClient(_) => "add_client",
        }
    }

    /// Lookup key of the message shown when this command fails.
    pub fn failure_key(&self) -> &'static str {
        match self {
            PersistCommand::AddProfile(_) => "error.add_failed",
            PersistCommand::RemoveProfile { .. } => "error.remove_failed",
            PersistCommand::ReorderProfiles { .. } => "error.reorder_failed",
            PersistCommand::SetProfileField { .. } => "error.update_failed",
            PersistCommand::SetLanguage(_) => "error.language_failed",
            PersistCommand::AddClient(_) => "error.client_failed",
        }
    }
}

#[derive(Debug)]
pub struct PersistRequest {
    pub ticket: WriteTicket,
    pub command: PersistCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Saved,
    ClientAdded(InstalledClient),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    WriteSettled {
        ticket: WriteTicket,
        result: Result<WriteOutcome, BackendError>,
    },
}

pub async fn execute<B: Backend>(
    backend: &B,
    command: PersistCommand,
) -> Result<WriteOutcome, BackendError> {
    match command {
        PersistCommand::AddProfile(profile) => backend.add_profile(profile).await?,
        PersistCommand::RemoveProfile { index } => backend.remove_profile(index).await?,
        PersistCommand::ReorderProfiles {
            old_index,
            new_index,
        } => backend.reorder_profiles(old_index, new_index).await?,
        PersistCommand::SetProfileField {
            index,
            field,
            value,
        } => backend.set_profile_field(index, field, value).await?,
        PersistCommand::SetLanguage(language) => backend.set_language(language).await?,
        PersistCommand::AddClient(path) => {
            let version = backend.add_client(path.clone()).await?;
            return Ok(WriteOutcome::ClientAdded(InstalledClient { version, path }));
        }
    }
    Ok(WriteOutcome::Saved)
}

/// Run until the command channel closes or the UI stops listening.
pub async fn run_persistence_worker<B: Backend>(
    backend: Arc<B>,
    mut commands: mpsc::UnboundedReceiver<PersistRequest>,
    ui_tx: std::sync::mpsc::Sender<UiEvent>,
) {
    info!("persistence worker started");
    while let Some(PersistRequest { ticket, command }) = commands.recv().await {
        let name = command.name();
        debug!(ticket = ticket.0, command = name, "persisting");
        let result = execute(backend.as_ref(), command).await;
        match &result {
            Ok(_) => debug!(ticket = ticket.0, command = name, "persisted"),
            Err(err) => warn!(ticket = ticket.0, command = name, %err, "persistence failed"),
        }
        if ui_tx.send(UiEvent::WriteSettled { ticket, result }).is_err() {
            debug!("ui channel closed");
            break;
        }
    }
    info!("persistence worker stopped");
}
