//! Callback payloads
//!
//! Fixed actions are short literals; anything addressing templates is a
//! navigation token (`prefix#fingerprint#positions`) decoded here with the
//! arity its prefix requires.

use crate::core::error::{AppError, AppResult};
use crate::navigation::token::{decode, Address};

pub const NOOP: &str = "noop";

pub mod menu {
    pub const BACK: &str = "menu:back";
    pub const CREATE: &str = "menu:create";
    pub const READY: &str = "menu:ready";
    pub const MANAGE: &str = "menu:manage";
    pub const SETTINGS: &str = "menu:settings";
}

/// Post draft idle menu
pub mod compose {
    pub const ADD_BUTTON: &str = "compose:add_btn";
    pub const NEW_ROW: &str = "compose:add_row";
    pub const ADD_PHOTO: &str = "compose:add_photo";
    pub const REMOVE_PHOTO: &str = "compose:del_photo";
    pub const PREVIEW: &str = "compose:preview";
    pub const SEND: &str = "compose:send";
}

/// Button menu shared by both flows
pub mod buttons {
    pub const ADD_TO_ROW: &str = "btn:row";
    pub const NEW_ROW: &str = "btn:newrow";
    pub const FINISH: &str = "btn:done";
}

/// Template browsing (tokens)
pub mod browse {
    pub const ROOT: &str = "tpl:bg";
    pub const CATEGORY: &str = "tpl:c";
    pub const SUBCATEGORY: &str = "tpl:s";
    pub const VIEW: &str = "tpl:v";
    pub const PREVIEW: &str = "tpl:p";
    pub const SEND: &str = "tpl:x";
}

pub mod manage {
    /// Shared prefix of every template management payload
    pub const NAMESPACE: &str = "m:";
    pub const ADD: &str = "m:add";
    pub const DELETE: &str = "m:del";
    pub const LIST: &str = "m:list";
    pub const EXPORT: &str = "m:export";
    pub const IMPORT: &str = "m:import";
    /// token: page number
    pub const DELETE_PAGE: &str = "m:dp";
    /// token: flat index
    pub const DELETE_ITEM: &str = "m:dx";
}

pub mod settings {
    pub const CONNECT: &str = "set:connect";
    pub const VIA_FORWARD: &str = "set:fwd";
    pub const VIA_USERNAME: &str = "set:user";
    pub const TEST: &str = "set:test";
    pub const CLEAR: &str = "set:clear";
}

pub mod owner {
    pub const PANEL: &str = "own:panel";
    pub const ADD_ADMIN: &str = "own:add";
    pub const REMOVE_ADMIN: &str = "own:del";
    pub const LIST_ADMINS: &str = "own:list";
    pub const AUDIT: &str = "own:audit";
}

/// What a browse token points at and what to do with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseOp {
    /// list subcategories of a category
    Category,
    /// list names of a subcategory
    Subcategory,
    View,
    Preview,
    Send,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Noop,
    MainMenu,
    CreatePost,
    Browse,
    Manage,
    Settings,

    AddButton,
    NewRow,
    AddPhoto,
    RemovePhoto,
    PreviewDraft,
    SendDraft,

    ButtonAddToRow,
    ButtonNewRow,
    ButtonFinish,

    BrowseNode(BrowseOp, Address),

    AddTemplate,
    DeleteMenu,
    ListTemplates,
    Export,
    Import,
    DeletePage(Address),
    DeleteItem(Address),

    Connect,
    ConnectViaForward,
    ConnectViaUsername,
    TestChannel,
    ClearChannel,

    OwnerPanel,
    AddAdmin,
    RemoveAdmin,
    ListAdmins,
    Audit,
}

impl Action {
    pub fn parse(data: &str) -> AppResult<Action> {
        let fixed = match data {
            NOOP => Some(Action::Noop),
            menu::BACK => Some(Action::MainMenu),
            menu::CREATE => Some(Action::CreatePost),
            menu::READY | browse::ROOT => Some(Action::Browse),
            menu::MANAGE => Some(Action::Manage),
            menu::SETTINGS => Some(Action::Settings),
            compose::ADD_BUTTON => Some(Action::AddButton),
            compose::NEW_ROW => Some(Action::NewRow),
            compose::ADD_PHOTO => Some(Action::AddPhoto),
            compose::REMOVE_PHOTO => Some(Action::RemovePhoto),
            compose::PREVIEW => Some(Action::PreviewDraft),
            compose::SEND => Some(Action::SendDraft),
            buttons::ADD_TO_ROW => Some(Action::ButtonAddToRow),
            buttons::NEW_ROW => Some(Action::ButtonNewRow),
            buttons::FINISH => Some(Action::ButtonFinish),
            manage::ADD => Some(Action::AddTemplate),
            manage::DELETE => Some(Action::DeleteMenu),
            manage::LIST => Some(Action::ListTemplates),
            manage::EXPORT => Some(Action::Export),
            manage::IMPORT => Some(Action::Import),
            settings::CONNECT => Some(Action::Connect),
            settings::VIA_FORWARD => Some(Action::ConnectViaForward),
            settings::VIA_USERNAME => Some(Action::ConnectViaUsername),
            settings::TEST => Some(Action::TestChannel),
            settings::CLEAR => Some(Action::ClearChannel),
            owner::PANEL => Some(Action::OwnerPanel),
            owner::ADD_ADMIN => Some(Action::AddAdmin),
            owner::REMOVE_ADMIN => Some(Action::RemoveAdmin),
            owner::LIST_ADMINS => Some(Action::ListAdmins),
            owner::AUDIT => Some(Action::Audit),
            _ => None,
        };
        if let Some(action) = fixed {
            return Ok(action);
        }

        let prefix = data.split('#').next().unwrap_or_default();
        let browse_op = match prefix {
            browse::CATEGORY => Some((BrowseOp::Category, 1)),
            browse::SUBCATEGORY => Some((BrowseOp::Subcategory, 2)),
            browse::VIEW => Some((BrowseOp::View, 3)),
            browse::PREVIEW => Some((BrowseOp::Preview, 3)),
            browse::SEND => Some((BrowseOp::Send, 3)),
            _ => None,
        };
        if let Some((op, arity)) = browse_op {
            return Ok(Action::BrowseNode(op, decode(data, prefix, arity)?));
        }
        match prefix {
            manage::DELETE_PAGE => Ok(Action::DeletePage(decode(data, prefix, 1)?)),
            manage::DELETE_ITEM => Ok(Action::DeleteItem(decode(data, prefix, 1)?)),
            _ => Err(AppError::MalformedToken(data.to_string())),
        }
    }

    /// Prefix used to issue a browse token for `op`
    pub fn browse_prefix(op: BrowseOp) -> &'static str {
        match op {
            BrowseOp::Category => browse::CATEGORY,
            BrowseOp::Subcategory => browse::SUBCATEGORY,
            BrowseOp::View => browse::VIEW,
            BrowseOp::Preview => browse::PREVIEW,
            BrowseOp::Send => browse::SEND,
        }
    }
}
