//! Launcher state: the view, the profile store and everything that keeps
//! them and the persistence worker in step.
//!
//! All entry points run on the UI thread. Writes are optimistic: the view and
//! store change first, the worker is told second, and a failed write only
//! raises an error modal.

use std::{
    collections::HashMap,
    path::PathBuf,
    time::Instant,
};

use launchpad_core::{
    EventKind, InstalledClient, LanguageId, NodeId, ProfileField, ProfileId, ProfileStore,
    ServerProfile, StoreError, TranslateError, Translator, ViewError, ViewTree,
    clients::{append_client_row, render_clients},
    debounce::{Debouncer, FIELD_EDIT_DEBOUNCE},
    drag::{DragController, DragError},
    i18n::{bind_text, render_translations},
    rows::{self, ProfileRow, RowAction, UNSAVED_CLASS, VALUE_ATTR},
    tabs::{PANEL_ATTR, TAB_ATTR, TabError, TabSwitcher},
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    dispatch::{WriteOrigin, WriteThrough},
    worker::{PersistCommand, PersistRequest, UiEvent, WriteOutcome},
};

pub const TABS: [&str; 3] = ["servers", "clients", "settings"];
pub const MODAL_CLASS: &str = "modal";

const DEFAULT_NICKNAME_KEY: &str = "servers.default_nickname";
const ERROR_TITLE_KEY: &str = "error.title";
const DISMISS_KEY: &str = "common.dismiss";

/// What a listener in the launcher's view asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Row(RowAction),
    SelectTab(String),
    AddProfile,
    SelectLanguage,
    AddClient,
    DismissModal,
}

impl From<RowAction> for UiAction {
    fn from(action: RowAction) -> Self {
        UiAction::Row(action)
    }
}

/// Input from the host, addressed to view nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Click(NodeId),
    Input { node: NodeId, value: String },
    Change { node: NodeId, value: String },
    DragStart(NodeId),
    DragOver { pointer_y: f32 },
    DragEnd(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherContext {
    pub language: LanguageId,
}

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Tab(#[from] TabError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Drag(#[from] DragError),
}

/// Fixed nodes of the launcher shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub server_list: NodeId,
    pub add_profile: NodeId,
    pub client_list: NodeId,
    pub client_path: NodeId,
    pub add_client: NodeId,
    pub language_select: NodeId,
}

type FieldKey = (ProfileId, ProfileField);

pub struct Launcher<T: Translator> {
    context: LauncherContext,
    translator: T,
    tree: ViewTree<UiAction>,
    layout: Layout,
    tabs: TabSwitcher,
    store: ProfileStore,
    rows: HashMap<ProfileId, ProfileRow>,
    drag: DragController,
    edits: Debouncer<FieldKey, String>,
    /// Newer values waiting for the field's in-flight write to settle.
    held: HashMap<FieldKey, String>,
    writes: WriteThrough,
    clients: Vec<InstalledClient>,
    modals: Vec<NodeId>,
}

impl<T: Translator> Launcher<T> {
    pub fn new(
        context: LauncherContext,
        translator: T,
        profiles: Vec<ServerProfile>,
        clients: Vec<InstalledClient>,
        persist_tx: mpsc::UnboundedSender<PersistRequest>,
    ) -> Result<Self, LauncherError> {
        if !translator.has_language(&context.language) {
            return Err(TranslateError::UnknownLanguage(context.language).into());
        }
        let language = context.language.as_str();

        let mut tree = ViewTree::new("main");
        let layout = build_shell(&mut tree, &translator, language)?;
        let tabs = TabSwitcher::new(&TABS, TABS[0])?;
        tabs.sync(&mut tree)?;

        let store = ProfileStore::from_profiles(profiles);
        let mut rendered = HashMap::with_capacity(store.len());
        for (id, profile) in store.iter() {
            let row = rows::build_row(
                &mut tree,
                layout.server_list,
                None,
                id,
                profile,
                &translator,
                language,
            )?;
            rendered.insert(id, row);
        }
        tree.layout_column(layout.server_list)?;
        render_clients(&mut tree, layout.client_list, &clients, &translator, language)?;

        info!(
            profiles = store.len(),
            clients = clients.len(),
            language,
            "launcher ready"
        );
        Ok(Self {
            context,
            translator,
            tree,
            layout,
            tabs,
            store,
            rows: rendered,
            drag: DragController::new(layout.server_list),
            edits: Debouncer::new(FIELD_EDIT_DEBOUNCE),
            held: HashMap::new(),
            writes: WriteThrough::new(persist_tx),
            clients,
            modals: Vec::new(),
        })
    }

    pub fn context(&self) -> &LauncherContext {
        &self.context
    }

    pub fn tree(&self) -> &ViewTree<UiAction> {
        &self.tree
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn clients(&self) -> &[InstalledClient] {
        &self.clients
    }

    pub fn modals(&self) -> &[NodeId] {
        &self.modals
    }

    pub fn active_tab(&self) -> &str {
        self.tabs.active()
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.translator.has_language(language)
    }

    pub fn row(&self, id: ProfileId) -> Option<&ProfileRow> {
        self.rows.get(&id)
    }

    /// Row currently rendered at `index` in the server list.
    pub fn row_at(&self, index: usize) -> Option<&ProfileRow> {
        let node = self.tree.children(self.layout.server_list).get(index)?;
        self.rows.values().find(|row| row.root == *node)
    }

    pub fn tab_button(&self, name: &str) -> Option<NodeId> {
        self.tree.find_by_attr(self.tree.root(), TAB_ATTR, name)
    }

    pub fn is_unsaved(&self, id: ProfileId) -> bool {
        self.rows
            .get(&id)
            .is_some_and(|row| self.tree.has_class(row.root, UNSAVED_CLASS))
    }

    /// Writes not yet settled, including edits held behind them.
    pub fn pending_writes(&self) -> usize {
        self.writes.in_flight() + self.held.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.edits.next_deadline()
    }

    pub fn handle_event(&mut self, event: ViewEvent, now: Instant) -> Result<(), LauncherError> {
        match event {
            ViewEvent::Click(node) => match self.tree.listener(node, EventKind::Click).cloned() {
                Some(action) => self.run_action(action, node),
                None => Ok(()),
            },
            ViewEvent::Input { node, value } => {
                if rows::is_read_only(&self.tree, node) {
                    debug!(?node, "input on read-only field ignored");
                    return Ok(());
                }
                self.tree.set_attr(node, VALUE_ATTR, value.as_str())?;
                match self.tree.listener(node, EventKind::Input) {
                    Some(UiAction::Row(RowAction::Edit(id, field))) => {
                        let (id, field) = (*id, *field);
                        self.queue_edit(id, field, value, now)
                    }
                    _ => Ok(()),
                }
            }
            ViewEvent::Change { node, value } => {
                self.tree.set_attr(node, VALUE_ATTR, value.as_str())?;
                match self.tree.listener(node, EventKind::Change) {
                    Some(UiAction::SelectLanguage) => self.select_language(&value),
                    _ => Ok(()),
                }
            }
            ViewEvent::DragStart(node) => match self.tree.listener(node, EventKind::DragStart) {
                Some(UiAction::Row(RowAction::DragStart(id))) => {
                    let id = *id;
                    self.start_drag(id)
                }
                _ => Ok(()),
            },
            ViewEvent::DragOver { pointer_y } => {
                self.drag.over(&mut self.tree, pointer_y)?;
                Ok(())
            }
            ViewEvent::DragEnd(node) => match self.tree.listener(node, EventKind::DragEnd) {
                Some(UiAction::Row(RowAction::DragEnd(_))) => self.end_drag(),
                _ => Ok(()),
            },
        }
    }

    fn run_action(&mut self, action: UiAction, node: NodeId) -> Result<(), LauncherError> {
        match action {
            UiAction::Row(RowAction::ToggleEdit(id)) => self.toggle_edit(id),
            UiAction::Row(RowAction::Remove(id)) => self.remove_profile(id),
            UiAction::Row(RowAction::Play(id)) => {
                self.play(id);
                Ok(())
            }
            UiAction::Row(_) | UiAction::SelectLanguage => Ok(()),
            UiAction::AddProfile => self.add_profile(),
            UiAction::SelectTab(name) => self.select_tab(&name),
            UiAction::AddClient => self.add_client_from_input(),
            UiAction::DismissModal => self.dismiss_modal(node),
        }
    }

    /// Fire debounced edits whose quiet window has elapsed.
    pub fn tick(&mut self, now: Instant) -> Result<(), LauncherError> {
        for ((id, field), value) in self.edits.poll(now) {
            self.commit_edit(id, field, value)?;
        }
        Ok(())
    }

    /// Fire every debounced edit now, e.g. before shutting down.
    pub fn flush_edits(&mut self) -> Result<(), LauncherError> {
        while let Some(deadline) = self.edits.next_deadline() {
            self.tick(deadline)?;
        }
        Ok(())
    }

    pub fn handle_ui_event(&mut self, event: UiEvent) -> Result<(), LauncherError> {
        match event {
            UiEvent::WriteSettled { ticket, result } => {
                let Some(entry) = self.writes.settle(ticket) else {
                    warn!(ticket = ticket.0, "settle for an unknown write");
                    return Ok(());
                };
                match result {
                    Ok(WriteOutcome::Saved) => {}
                    Ok(WriteOutcome::ClientAdded(client)) => {
                        append_client_row(&mut self.tree, self.layout.client_list, &client)?;
                        info!(version = %client.version, path = %client.path.display(), "client registered");
                        self.clients.push(client);
                    }
                    Err(err) => self.show_error(entry.failure_key, &err.to_string())?,
                }

                if let WriteOrigin::Field(id, field) = entry.origin
                    && let Some(value) = self.held.remove(&(id, field))
                {
                    self.commit_edit(id, field, value)?;
                }
                if let Some(id) = entry.origin.profile() {
                    self.refresh_unsaved(id)?;
                }
                Ok(())
            }
        }
    }

    pub fn add_profile(&mut self) -> Result<(), LauncherError> {
        let nickname = self
            .translator
            .translate(&self.context.language, DEFAULT_NICKNAME_KEY)?;
        let profile = ServerProfile::named(nickname);
        let id = self.store.insert_front(profile.clone());

        let list = self.layout.server_list;
        let before = self.tree.children(list).first().copied();
        let row = rows::build_row(
            &mut self.tree,
            list,
            before,
            id,
            &profile,
            &self.translator,
            &self.context.language,
        )?;
        self.rows.insert(id, row);
        self.tree.layout_column(list)?;

        info!(%id, "profile added");
        self.submit(WriteOrigin::Profile(id), PersistCommand::AddProfile(profile))
    }

    pub fn remove_profile(&mut self, id: ProfileId) -> Result<(), LauncherError> {
        let (Some(index), Some(row)) = (self.store.index_of(id), self.rows.remove(&id)) else {
            debug!(%id, "remove for an unknown profile");
            return Ok(());
        };
        if self.drag.dragged() == Some(row.root) {
            self.drag.abandon(&mut self.tree);
        }
        self.store.remove_at(index)?;
        self.tree.remove(row.root)?;
        self.edits.cancel_where(|(pid, _)| *pid == id);
        self.held.retain(|(pid, _), _| *pid != id);
        self.tree.layout_column(self.layout.server_list)?;

        info!(%id, index, "profile removed");
        self.submit(WriteOrigin::Profile(id), PersistCommand::RemoveProfile { index })
    }

    pub fn toggle_edit(&mut self, id: ProfileId) -> Result<(), LauncherError> {
        let Some(row) = self.rows.get(&id).copied() else {
            return Ok(());
        };
        let editing =
            rows::toggle_editing(&mut self.tree, &row, &self.translator, &self.context.language)?;
        debug!(%id, editing, "edit toggled");
        Ok(())
    }

    pub fn play(&self, id: ProfileId) {
        let Some(profile) = self.store.by_id(id) else {
            return;
        };
        info!(
            %id,
            nickname = %profile.nickname,
            udp = %profile.udp_endpoint,
            https = %profile.https_endpoint,
            "launch requested"
        );
    }

    pub fn select_tab(&mut self, name: &str) -> Result<(), LauncherError> {
        self.tabs.switch_to(&mut self.tree, name)?;
        debug!(tab = name, "tab selected");
        Ok(())
    }

    /// Re-render every tagged element in `language` and persist the choice.
    pub fn select_language(&mut self, language: &str) -> Result<(), LauncherError> {
        let root = self.tree.root();
        render_translations(&mut self.tree, root, &self.translator, language)?;
        self.context.language = language.to_owned();
        self.tree
            .set_attr(self.layout.language_select, VALUE_ATTR, language)?;

        info!(language, "language switched");
        self.submit(
            WriteOrigin::Language,
            PersistCommand::SetLanguage(language.to_owned()),
        )
    }

    pub fn add_client(&mut self, path: PathBuf) -> Result<(), LauncherError> {
        info!(path = %path.display(), "registering client");
        self.submit(WriteOrigin::Client, PersistCommand::AddClient(path))
    }

    fn add_client_from_input(&mut self) -> Result<(), LauncherError> {
        let input = self.layout.client_path;
        let raw = self
            .tree
            .attr(input, VALUE_ATTR)
            .unwrap_or_default()
            .trim()
            .to_owned();
        if raw.is_empty() {
            debug!("add client with an empty path ignored");
            return Ok(());
        }
        self.tree.set_attr(input, VALUE_ATTR, "")?;
        self.add_client(PathBuf::from(raw))
    }

    fn queue_edit(
        &mut self,
        id: ProfileId,
        field: ProfileField,
        value: String,
        now: Instant,
    ) -> Result<(), LauncherError> {
        self.edits.push((id, field), value, now);
        self.refresh_unsaved(id)
    }

    /// Push a settled edit into the store and the worker, resolving the
    /// row's index now rather than when the edit was typed.
    fn commit_edit(
        &mut self,
        id: ProfileId,
        field: ProfileField,
        value: String,
    ) -> Result<(), LauncherError> {
        if self.writes.field_in_flight(id, field) {
            debug!(%id, %field, "holding edit behind an in-flight write");
            self.held.insert((id, field), value);
            return self.refresh_unsaved(id);
        }
        let Some(index) = self.store.index_of(id) else {
            debug!(%id, %field, "dropping edit for a removed profile");
            return Ok(());
        };
        self.store.update_field(index, field, value.clone())?;

        debug!(%id, index, %field, "field edit committed");
        self.submit(
            WriteOrigin::Field(id, field),
            PersistCommand::SetProfileField {
                index,
                field,
                value,
            },
        )
    }

    fn start_drag(&mut self, id: ProfileId) -> Result<(), LauncherError> {
        let Some(row) = self.rows.get(&id).copied() else {
            return Ok(());
        };
        match self.drag.start(&mut self.tree, row.root) {
            Ok(()) => {
                debug!(%id, "drag started");
                Ok(())
            }
            Err(DragError::View(err)) => Err(err.into()),
            Err(err) => {
                warn!(%id, %err, "drag start rejected");
                Ok(())
            }
        }
    }

    fn end_drag(&mut self) -> Result<(), LauncherError> {
        let Some(commit) = self.drag.end(&mut self.tree)? else {
            return Ok(());
        };
        let Some(id) = self
            .rows
            .values()
            .find(|row| row.root == commit.node)
            .map(|row| row.id)
        else {
            return Ok(());
        };
        // The store is the authority on where the row came from: rows may
        // have been added or removed while the pointer was down.
        let Some(old_index) = self.store.index_of(id) else {
            return Ok(());
        };
        if old_index != commit.previous_index {
            debug!(%id, captured = commit.previous_index, old_index, "list changed during drag");
        }
        let new_index = commit.new_index;
        self.store.move_to(old_index, new_index)?;
        self.tree.layout_column(self.layout.server_list)?;

        info!(%id, old_index, new_index, "profile reordered");
        self.submit(
            WriteOrigin::Profile(id),
            PersistCommand::ReorderProfiles {
                old_index,
                new_index,
            },
        )
    }

    fn submit(&mut self, origin: WriteOrigin, command: PersistCommand) -> Result<(), LauncherError> {
        let failure_key = command.failure_key();
        if let Err(err) = self.writes.submit(origin, command) {
            error!(%err, "write not dispatched");
            self.show_error(failure_key, &err.to_string())?;
        }
        match origin.profile() {
            Some(id) => self.refresh_unsaved(id),
            None => Ok(()),
        }
    }

    fn refresh_unsaved(&mut self, id: ProfileId) -> Result<(), LauncherError> {
        let Some(row) = self.rows.get(&id).copied() else {
            return Ok(());
        };
        let unsaved = self.writes.row_in_flight(id)
            || ProfileField::ALL.iter().any(|field| {
                self.edits.is_pending(&(id, *field)) || self.held.contains_key(&(id, *field))
            });
        rows::set_unsaved(&mut self.tree, &row, unsaved)?;
        Ok(())
    }

    /// Stack an error modal: localized title and message, raw detail.
    fn show_error(&mut self, failure_key: &str, detail: &str) -> Result<(), LauncherError> {
        warn!(failure_key, detail, "showing error");
        let language = self.context.language.as_str();
        let root = self.tree.root();

        let modal = self.tree.element(root, "div")?;
        self.tree.add_class(modal, MODAL_CLASS)?;
        let title = self.tree.element(modal, "h2")?;
        bind_text(&mut self.tree, title, ERROR_TITLE_KEY, &self.translator, language)?;
        let message = self.tree.element(modal, "p")?;
        self.tree.add_class(message, "message")?;
        bind_text(&mut self.tree, message, failure_key, &self.translator, language)?;
        let raw = self.tree.element(modal, "pre")?;
        self.tree.add_class(raw, "detail")?;
        self.tree.set_text(raw, detail)?;
        let dismiss = self.tree.element(modal, "button")?;
        self.tree.add_class(dismiss, "dismiss")?;
        self.tree
            .listen(dismiss, EventKind::Click, UiAction::DismissModal)?;
        bind_text(&mut self.tree, dismiss, DISMISS_KEY, &self.translator, language)?;

        self.modals.push(modal);
        Ok(())
    }

    fn dismiss_modal(&mut self, from: NodeId) -> Result<(), LauncherError> {
        let mut cursor = Some(from);
        while let Some(node) = cursor {
            if self.tree.has_class(node, MODAL_CLASS) {
                self.tree.remove(node)?;
                self.modals.retain(|modal| *modal != node);
                return Ok(());
            }
            cursor = self.tree.parent(node);
        }
        Ok(())
    }
}

fn build_shell<T>(
    tree: &mut ViewTree<UiAction>,
    translator: &T,
    language: &str,
) -> Result<Layout, LauncherError>
where
    T: Translator + ?Sized,
{
    let root = tree.root();
    let nav = tree.element(root, "nav")?;
    for name in TABS {
        let tab = tree.element(nav, "button")?;
        tree.set_attr(tab, TAB_ATTR, name)?;
        tree.listen(tab, EventKind::Click, UiAction::SelectTab(name.to_owned()))?;
        bind_text(tree, tab, &format!("tabs.{name}"), translator, language)?;
    }

    let servers = panel(tree, "servers")?;
    let add_profile = tree.element(servers, "button")?;
    tree.add_class(add_profile, "add-server")?;
    tree.listen(add_profile, EventKind::Click, UiAction::AddProfile)?;
    bind_text(tree, add_profile, "servers.add", translator, language)?;
    let server_list = tree.element(servers, "ul")?;
    tree.add_class(server_list, "server-list")?;

    let clients = panel(tree, "clients")?;
    let heading = tree.element(clients, "h2")?;
    bind_text(tree, heading, "clients.title", translator, language)?;
    let client_list = tree.element(clients, "ul")?;
    tree.add_class(client_list, "client-list")?;
    let client_path = tree.element(clients, "input")?;
    tree.add_class(client_path, "client-path")?;
    tree.set_attr(client_path, VALUE_ATTR, "")?;
    let add_client = tree.element(clients, "button")?;
    tree.add_class(add_client, "add-client")?;
    tree.listen(add_client, EventKind::Click, UiAction::AddClient)?;
    bind_text(tree, add_client, "clients.add", translator, language)?;

    let settings = panel(tree, "settings")?;
    let label = tree.element(settings, "label")?;
    bind_text(tree, label, "settings.language", translator, language)?;
    let language_select = tree.element(settings, "select")?;
    tree.add_class(language_select, "language")?;
    tree.set_attr(language_select, VALUE_ATTR, language)?;
    tree.listen(language_select, EventKind::Change, UiAction::SelectLanguage)?;
    // Each option names its language in that language, so none are tagged.
    for option_language in translator.languages() {
        let option = tree.element(language_select, "option")?;
        let name = translator.translate(&option_language, "meta.label")?;
        tree.set_text(option, name)?;
        tree.set_attr(option, VALUE_ATTR, option_language)?;
    }

    Ok(Layout {
        server_list,
        add_profile,
        client_list,
        client_path,
        add_client,
        language_select,
    })
}

fn panel(tree: &mut ViewTree<UiAction>, name: &str) -> Result<NodeId, ViewError> {
    let root = tree.root();
    let section = tree.element(root, "section")?;
    tree.set_attr(section, PANEL_ATTR, name)?;
    Ok(section)
}
