//! View rows for saved servers.
//!
//! A row is keyed by its [`ProfileId`], never by the index it was built at.
//! Listeners carry the id too, so a handler that fires after the list was
//! reordered still names the right profile; the caller turns the id into an
//! index only when it dispatches.

use crate::i18n::{TranslateError, Translator, bind_text};
use crate::profile::{ProfileField, ProfileId, ServerProfile};
use crate::view::{EventKind, NodeId, ViewError, ViewTree};

pub const ROW_CLASS: &str = "saved-server";
pub const EDITING_CLASS: &str = "editing";
pub const UNSAVED_CLASS: &str = "unsaved";
pub const PROFILE_ATTR: &str = "data-profile";
pub const VALUE_ATTR: &str = "value";
pub const READONLY_ATTR: &str = "readonly";
pub const ROW_HEIGHT: f32 = 96.0;

const EDIT_KEY: &str = "server.edit";
const DONE_KEY: &str = "server.done";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    ToggleEdit(ProfileId),
    Edit(ProfileId, ProfileField),
    Remove(ProfileId),
    Play(ProfileId),
    DragStart(ProfileId),
    DragEnd(ProfileId),
}

/// Handles to the nodes of one rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileRow {
    pub id: ProfileId,
    pub root: NodeId,
    pub nickname: NodeId,
    pub udp_endpoint: NodeId,
    pub https_endpoint: NodeId,
    pub edit_toggle: NodeId,
    pub remove: NodeId,
    pub play: NodeId,
}

impl ProfileRow {
    pub fn field_node(&self, field: ProfileField) -> NodeId {
        match field {
            ProfileField::Nickname => self.nickname,
            ProfileField::UdpEndpoint => self.udp_endpoint,
            ProfileField::HttpsEndpoint => self.https_endpoint,
        }
    }

    pub fn is_editing<A>(&self, tree: &ViewTree<A>) -> bool {
        tree.has_class(self.root, EDITING_CLASS)
    }

    /// Current position among the list's rows.
    pub fn index<A>(&self, tree: &ViewTree<A>) -> Option<usize> {
        tree.sibling_index(self.root)
    }

    pub fn field_value<'a, A>(&self, tree: &'a ViewTree<A>, field: ProfileField) -> Option<&'a str> {
        tree.attr(self.field_node(field), VALUE_ATTR)
    }
}

/// Render `profile` as a row under `list`, before `before` (or last).
pub fn build_row<A, T>(
    tree: &mut ViewTree<A>,
    list: NodeId,
    before: Option<NodeId>,
    id: ProfileId,
    profile: &ServerProfile,
    translator: &T,
    language: &str,
) -> Result<ProfileRow, TranslateError>
where
    A: From<RowAction>,
    T: Translator + ?Sized,
{
    let root = tree.create("li");
    tree.add_class(root, ROW_CLASS)?;
    tree.set_attr(root, PROFILE_ATTR, id.to_string())?;
    tree.set_draggable(root, true)?;
    tree.set_height(root, ROW_HEIGHT)?;
    tree.listen(root, EventKind::DragStart, RowAction::DragStart(id).into())?;
    tree.listen(root, EventKind::DragEnd, RowAction::DragEnd(id).into())?;

    let header = tree.element(root, "div")?;
    tree.add_class(header, "row-header")?;
    let nickname = field_input(tree, header, id, ProfileField::Nickname, &profile.nickname)?;
    tree.set_attr(nickname, READONLY_ATTR, "true")?;
    let edit_toggle = button(tree, header, "edit-toggle", RowAction::ToggleEdit(id))?;
    bind_text(tree, edit_toggle, EDIT_KEY, translator, language)?;

    let udp_label = tree.element(root, "label")?;
    bind_text(tree, udp_label, "server.udp_endpoint", translator, language)?;
    let udp_endpoint =
        field_input(tree, root, id, ProfileField::UdpEndpoint, &profile.udp_endpoint)?;

    let https_label = tree.element(root, "label")?;
    bind_text(tree, https_label, "server.https_endpoint", translator, language)?;
    let https_endpoint = field_input(
        tree,
        root,
        id,
        ProfileField::HttpsEndpoint,
        &profile.https_endpoint,
    )?;

    let actions = tree.element(root, "div")?;
    tree.add_class(actions, "row-actions")?;
    let remove = button(tree, actions, "remove", RowAction::Remove(id))?;
    bind_text(tree, remove, "server.remove", translator, language)?;
    let play = button(tree, actions, "play", RowAction::Play(id))?;
    bind_text(tree, play, "server.play", translator, language)?;

    tree.insert_before(list, root, before)?;

    Ok(ProfileRow {
        id,
        root,
        nickname,
        udp_endpoint,
        https_endpoint,
        edit_toggle,
        remove,
        play,
    })
}

/// Flip the nickname between read-only and editable. Returns the new state.
pub fn toggle_editing<A, T>(
    tree: &mut ViewTree<A>,
    row: &ProfileRow,
    translator: &T,
    language: &str,
) -> Result<bool, TranslateError>
where
    T: Translator + ?Sized,
{
    let editing = !row.is_editing(tree);
    tree.set_class(row.root, EDITING_CLASS, editing)?;
    if editing {
        tree.remove_attr(row.nickname, READONLY_ATTR)?;
    } else {
        tree.set_attr(row.nickname, READONLY_ATTR, "true")?;
    }
    let key = if editing { DONE_KEY } else { EDIT_KEY };
    bind_text(tree, row.edit_toggle, key, translator, language)?;
    Ok(editing)
}

pub fn is_read_only<A>(tree: &ViewTree<A>, node: NodeId) -> bool {
    tree.attr(node, READONLY_ATTR).is_some()
}

pub fn set_unsaved<A>(tree: &mut ViewTree<A>, row: &ProfileRow, unsaved: bool) -> Result<(), ViewError> {
    tree.set_class(row.root, UNSAVED_CLASS, unsaved)
}

fn field_input<A>(
    tree: &mut ViewTree<A>,
    parent: NodeId,
    id: ProfileId,
    field: ProfileField,
    value: &str,
) -> Result<NodeId, ViewError>
where
    A: From<RowAction>,
{
    let input = tree.element(parent, "input")?;
    tree.add_class(input, field.as_str())?;
    tree.set_attr(input, VALUE_ATTR, value)?;
    tree.listen(input, EventKind::Input, RowAction::Edit(id, field).into())?;
    Ok(input)
}

fn button<A>(
    tree: &mut ViewTree<A>,
    parent: NodeId,
    class: &str,
    action: RowAction,
) -> Result<NodeId, ViewError>
where
    A: From<RowAction>,
{
    let node = tree.element(parent, "button")?;
    tree.add_class(node, class)?;
    tree.listen(node, EventKind::Click, action.into())?;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, LOOKUP_KEY_ATTR};

    const CATALOG: &str = r#"{
        "en-US": { "server": {
            "edit": "Edit", "done": "Done", "remove": "Remove", "play": "Play",
            "udp_endpoint": "UDP endpoint", "https_endpoint": "HTTPS endpoint"
        } }
    }"#;

    fn setup() -> (ViewTree<RowAction>, NodeId, Catalog) {
        let mut tree = ViewTree::new("main");
        let list = tree.element(tree.root(), "ul").unwrap();
        (tree, list, Catalog::from_json(CATALOG).unwrap())
    }

    fn profile() -> ServerProfile {
        ServerProfile {
            nickname: "Home".to_owned(),
            udp_endpoint: "127.0.0.1:20042".to_owned(),
            https_endpoint: "https://127.0.0.1".to_owned(),
        }
    }

    #[test]
    fn row_carries_values_and_id_keyed_listeners() {
        let (mut tree, list, catalog) = setup();
        let id = ProfileId(4);
        let row = build_row(&mut tree, list, None, id, &profile(), &catalog, "en-US").unwrap();

        assert_eq!(row.index(&tree), Some(0));
        assert!(tree.is_draggable(row.root));
        assert_eq!(row.field_value(&tree, ProfileField::Nickname), Some("Home"));
        assert_eq!(
            row.field_value(&tree, ProfileField::UdpEndpoint),
            Some("127.0.0.1:20042")
        );
        assert_eq!(
            tree.listener(row.https_endpoint, EventKind::Input),
            Some(&RowAction::Edit(id, ProfileField::HttpsEndpoint))
        );
        assert_eq!(
            tree.listener(row.remove, EventKind::Click),
            Some(&RowAction::Remove(id))
        );
        assert_eq!(tree.text(row.play), Some("Play"));
        assert_eq!(tree.attr(row.play, LOOKUP_KEY_ATTR), Some("server.play"));
    }

    #[test]
    fn nickname_is_read_only_until_edit_is_toggled() {
        let (mut tree, list, catalog) = setup();
        let row =
            build_row(&mut tree, list, None, ProfileId(0), &profile(), &catalog, "en-US").unwrap();
        assert!(is_read_only(&tree, row.nickname));
        assert!(!is_read_only(&tree, row.udp_endpoint));

        assert!(toggle_editing(&mut tree, &row, &catalog, "en-US").unwrap());
        assert!(!is_read_only(&tree, row.nickname));
        assert_eq!(tree.text(row.edit_toggle), Some("Done"));

        assert!(!toggle_editing(&mut tree, &row, &catalog, "en-US").unwrap());
        assert!(is_read_only(&tree, row.nickname));
        assert_eq!(tree.text(row.edit_toggle), Some("Edit"));
    }

    #[test]
    fn rows_insert_before_a_reference_row() {
        let (mut tree, list, catalog) = setup();
        let first =
            build_row(&mut tree, list, None, ProfileId(0), &profile(), &catalog, "en-US").unwrap();
        let front = build_row(
            &mut tree,
            list,
            Some(first.root),
            ProfileId(1),
            &ServerProfile::named("New"),
            &catalog,
            "en-US",
        )
        .unwrap();
        assert_eq!(front.index(&tree), Some(0));
        assert_eq!(first.index(&tree), Some(1));
    }
}
