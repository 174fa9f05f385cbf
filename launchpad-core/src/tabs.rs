use thiserror::Error;

use crate::view::{NodeId, ViewError, ViewTree};

pub const ACTIVE_CLASS: &str = "active";
pub const TAB_ATTR: &str = "data-tab";
pub const PANEL_ATTR: &str = "data-panel";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TabError {
    #[error("`{0}` is not one of the configured tabs")]
    UnknownTab(String),
    #[error("tab button for `{0}` is missing from the view")]
    MissingTab(String),
    #[error("panel for `{0}` is missing from the view")]
    MissingPanel(String),
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Exactly one active tab out of a fixed set.
///
/// A tab is a node tagged `data-tab=<name>`, its panel a node tagged
/// `data-panel=<name>`; both carry [`ACTIVE_CLASS`] while selected.
#[derive(Debug, Clone)]
pub struct TabSwitcher {
    tabs: Vec<String>,
    active: String,
}

impl TabSwitcher {
    pub fn new(tabs: &[&str], initial: &str) -> Result<Self, TabError> {
        if !tabs.contains(&initial) {
            return Err(TabError::UnknownTab(initial.to_owned()));
        }
        Ok(Self {
            tabs: tabs.iter().map(|tab| (*tab).to_owned()).collect(),
            active: initial.to_owned(),
        })
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn tabs(&self) -> &[String] {
        &self.tabs
    }

    /// Put the markers on the active pair and off every other pair.
    pub fn sync<A>(&self, tree: &mut ViewTree<A>) -> Result<(), TabError> {
        for name in &self.tabs {
            let (tab, panel) = locate(tree, name)?;
            let on = *name == self.active;
            tree.set_class(tab, ACTIVE_CLASS, on)?;
            tree.set_class(panel, ACTIVE_CLASS, on)?;
        }
        Ok(())
    }

    /// Both pairs are looked up before anything changes, so a broken view
    /// is reported without leaving two tabs (or none) marked.
    pub fn switch_to<A>(&mut self, tree: &mut ViewTree<A>, name: &str) -> Result<(), TabError> {
        if !self.tabs.iter().any(|tab| tab == name) {
            return Err(TabError::UnknownTab(name.to_owned()));
        }
        let (old_tab, old_panel) = locate(tree, &self.active)?;
        let (new_tab, new_panel) = locate(tree, name)?;

        tree.remove_class(old_tab, ACTIVE_CLASS)?;
        tree.remove_class(old_panel, ACTIVE_CLASS)?;
        tree.add_class(new_tab, ACTIVE_CLASS)?;
        tree.add_class(new_panel, ACTIVE_CLASS)?;
        self.active = name.to_owned();
        Ok(())
    }
}

fn locate<A>(tree: &ViewTree<A>, name: &str) -> Result<(NodeId, NodeId), TabError> {
    let root = tree.root();
    let tab = tree
        .find_by_attr(root, TAB_ATTR, name)
        .ok_or_else(|| TabError::MissingTab(name.to_owned()))?;
    let panel = tree
        .find_by_attr(root, PANEL_ATTR, name)
        .ok_or_else(|| TabError::MissingPanel(name.to_owned()))?;
    Ok((tab, panel))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabbed(names: &[&str]) -> ViewTree<()> {
        let mut tree = ViewTree::new("main");
        let root = tree.root();
        let nav = tree.element(root, "nav").unwrap();
        for name in names {
            let tab = tree.element(nav, "button").unwrap();
            tree.set_attr(tab, TAB_ATTR, *name).unwrap();
            let panel = tree.element(root, "section").unwrap();
            tree.set_attr(panel, PANEL_ATTR, *name).unwrap();
        }
        tree
    }

    fn active_pairs(tree: &ViewTree<()>) -> Vec<String> {
        tree.find_all_by_class(tree.root(), ACTIVE_CLASS)
            .into_iter()
            .map(|id| {
                tree.attr(id, TAB_ATTR)
                    .or_else(|| tree.attr(id, PANEL_ATTR))
                    .unwrap()
                    .to_owned()
            })
            .collect()
    }

    #[test]
    fn switching_moves_the_marker_pair() {
        let mut tree = tabbed(&["servers", "clients"]);
        let mut tabs = TabSwitcher::new(&["servers", "clients"], "servers").unwrap();
        tabs.sync(&mut tree).unwrap();
        assert_eq!(active_pairs(&tree), ["servers", "servers"]);

        tabs.switch_to(&mut tree, "clients").unwrap();
        assert_eq!(tabs.active(), "clients");
        assert_eq!(active_pairs(&tree), ["clients", "clients"]);
    }

    #[test]
    fn missing_panel_fails_before_mutating() {
        let mut tree = tabbed(&["servers"]);
        let nav = tree.children(tree.root())[0];
        let orphan = tree.element(nav, "button").unwrap();
        tree.set_attr(orphan, TAB_ATTR, "settings").unwrap();

        let mut tabs = TabSwitcher::new(&["servers", "settings"], "servers").unwrap();
        assert_eq!(
            tabs.switch_to(&mut tree, "settings"),
            Err(TabError::MissingPanel("settings".to_owned()))
        );
        assert_eq!(tabs.active(), "servers");
    }

    #[test]
    fn unknown_tab_is_rejected() {
        let mut tree = tabbed(&["servers"]);
        let mut tabs = TabSwitcher::new(&["servers"], "servers").unwrap();
        assert_eq!(
            tabs.switch_to(&mut tree, "mods"),
            Err(TabError::UnknownTab("mods".to_owned()))
        );
        assert!(TabSwitcher::new(&["servers"], "clients").is_err());
    }
}
