use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::i18n::{TranslateError, Translator, bind_text};
use crate::view::{NodeId, ViewError, ViewTree};

pub const CLIENT_ROW_CLASS: &str = "installed-client";
const EMPTY_KEY: &str = "clients.empty";

/// A game-client executable the launcher knows about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstalledClient {
    pub version: String,
    pub path: PathBuf,
}

/// Replace the contents of `list` with one row per client, or the localized
/// empty-state line when there are none.
pub fn render_clients<A, T>(
    tree: &mut ViewTree<A>,
    list: NodeId,
    clients: &[InstalledClient],
    translator: &T,
    language: &str,
) -> Result<(), TranslateError>
where
    T: Translator + ?Sized,
{
    tree.clear_children(list)?;
    if clients.is_empty() {
        let empty = tree.element(list, "li")?;
        tree.add_class(empty, "empty")?;
        bind_text(tree, empty, EMPTY_KEY, translator, language)?;
        return Ok(());
    }
    for client in clients {
        append_client_row(tree, list, client)?;
    }
    Ok(())
}

/// Add one client row, dropping the empty-state line if it is showing.
pub fn append_client_row<A>(
    tree: &mut ViewTree<A>,
    list: NodeId,
    client: &InstalledClient,
) -> Result<NodeId, ViewError> {
    for placeholder in tree.find_all_by_class(list, "empty") {
        tree.remove(placeholder)?;
    }
    let row = tree.element(list, "li")?;
    tree.add_class(row, CLIENT_ROW_CLASS)?;
    let version = tree.element(row, "span")?;
    tree.add_class(version, "version")?;
    tree.set_text(version, client.version.as_str())?;
    let path = tree.element(row, "span")?;
    tree.add_class(path, "path")?;
    tree.set_text(path, client.path.display().to_string())?;
    Ok(row)
}
