//! The navigation bar: fetched descriptor, active-link marking, rendering and
//! confirmation-guarded action buttons.

use std::fmt;

use itertools::Itertools;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::Result;
use crate::transcript::escape_html;
use crate::transport::Transport;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

/// What the nav endpoint describes. Link maps keep the server's order.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavDescriptor {
    pub app_name: String,
    pub app_version: String,
    #[serde(default, deserialize_with = "ordered_links")]
    pub nav_items: Vec<NavLink>,
    #[serde(default, deserialize_with = "ordered_links")]
    pub nav_buttons: Vec<NavLink>,
}

/// Older servers hand out a ready-made `<nav>` block instead of JSON.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NavPayload {
    Descriptor(NavDescriptor),
    Fragment(String),
}

impl NavPayload {
    pub fn parse(body: &str) -> Result<Self> {
        if body.trim_start().starts_with('<') {
            return Ok(NavPayload::Fragment(body.to_string()));
        }
        Ok(NavPayload::Descriptor(serde_json::from_str(body)?))
    }
}

#[tracing::instrument(skip(transport), fields(url = %url))]
pub fn fetch(transport: &dyn Transport, url: &Url) -> Result<NavPayload> {
    let body = transport.get(url)?;
    let payload = NavPayload::parse(&body)?;
    tracing::debug!(
        fragment = matches!(payload, NavPayload::Fragment(_)),
        "nav descriptor fetched"
    );
    Ok(payload)
}

fn ordered_links<'de, D>(deserializer: D) -> std::result::Result<Vec<NavLink>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LinksVisitor;

    impl<'de> Visitor<'de> for LinksVisitor {
        type Value = Vec<NavLink>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of label to link")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut links = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((label, href)) = map.next_entry::<String, String>()? {
                links.push(NavLink { label, href });
            }
            Ok(links)
        }
    }

    deserializer.deserialize_map(LinksVisitor)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntryKind {
    Item,
    /// Destructive actions (e.g. shutdown) that must be confirmed.
    Button,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NavEntry {
    pub kind: EntryKind,
    pub link: NavLink,
    pub active: bool,
}

/// Asks the user whether a guarded action should go ahead.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, question: &str) -> bool {
        self(question)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NavBar {
    pub app_name: String,
    pub app_version: String,
    pub entries: Vec<NavEntry>,
}

impl NavBar {
    /// Items whose link equals `current_path` exactly are marked active.
    /// Buttons are actions, not pages, and never are.
    pub fn build(descriptor: NavDescriptor, current_path: &str) -> Self {
        let items = descriptor
            .nav_items
            .into_iter()
            .map(|link| (EntryKind::Item, link));
        let buttons = descriptor
            .nav_buttons
            .into_iter()
            .map(|link| (EntryKind::Button, link));
        let entries = items
            .chain(buttons)
            .map(|(kind, link)| NavEntry {
                kind,
                active: kind == EntryKind::Item && link.href == current_path,
                link,
            })
            .collect();
        Self {
            app_name: descriptor.app_name,
            app_version: descriptor.app_version,
            entries,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &NavEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Item)
    }

    pub fn buttons(&self) -> impl Iterator<Item = &NavEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Button)
    }

    pub fn find(&self, label: &str) -> Option<&NavEntry> {
        self.entries.iter().find(|e| e.link.label == label)
    }

    /// The link to follow for `label`. Buttons only yield their link once
    /// `confirm` agrees; unknown labels yield nothing.
    #[tracing::instrument(skip(self, confirm))]
    pub fn activate(&self, label: &str, confirm: &mut impl Confirm) -> Option<&str> {
        let entry = self.find(label)?;
        if entry.kind == EntryKind::Button {
            let question = format!("Are you sure you want to {}?", entry.link.label);
            if !confirm.confirm(&question) {
                tracing::debug!("action declined");
                return None;
            }
        }
        tracing::debug!(href = %entry.link.href, "following nav link");
        Some(&entry.link.href)
    }

    pub fn render_html(&self) -> String {
        let items = self
            .items()
            .map(|e| {
                format!(
                    "<li class=\"nav-item\"><a class=\"nav-link{}\" href=\"{}\">{}</a></li>",
                    if e.active { " active" } else { "" },
                    escape_html(&e.link.href),
                    escape_html(&e.link.label)
                )
            })
            .join("");
        let buttons = self
            .buttons()
            .map(|e| {
                format!(
                    "<button class=\"btn btn-outline-danger\" type=\"button\" data-href=\"{}\" data-confirm=\"true\">{}</button>",
                    escape_html(&e.link.href),
                    escape_html(&e.link.label)
                )
            })
            .join("");
        format!(
            "<nav class=\"navbar navbar-expand-lg\">\
             <a class=\"navbar-brand\" href=\"#\">{name}</a>\
             <button class=\"navbar-toggler\" type=\"button\" data-toggle=\"collapse\" data-target=\"#navbarNav\">\
             <span class=\"navbar-toggler-icon\"></span></button>\
             <div class=\"collapse navbar-collapse\" id=\"navbarNav\">\
             <ul class=\"navbar-nav\">{items}</ul>{buttons}</div>\
             <span class=\"navbar-text ml-auto\">{version}</span>\
             </nav>",
            name = escape_html(&self.app_name),
            version = escape_html(&self.app_version),
        )
    }

    /// One line per entry, for the terminal.
    pub fn render_plain(&self) -> String {
        let mut out = format!("{} {}\n", self.app_name, self.app_version);
        for entry in &self.entries {
            let marker = if entry.active { '*' } else { ' ' };
            let tag = match entry.kind {
                EntryKind::Item => "",
                EntryKind::Button => " [action]",
            };
            out.push_str(&format!(
                "{marker} {}{tag} -> {}\n",
                entry.link.label, entry.link.href
            ));
        }
        out
    }
}
