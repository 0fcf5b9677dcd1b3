//! Corrective actions and their outcomes

use serde::{Deserialize, Serialize};

use crate::value_objects::{ReportLocale, Snowflake};

/// One corrective change to a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    AddRole { role_id: Snowflake },
    RemoveRole { role_id: Snowflake },
    /// `None` clears the nickname
    SetNickname { nickname: Option<String> },
}

impl Action {
    pub fn role_id(&self) -> Option<Snowflake> {
        match self {
            Self::AddRole { role_id } | Self::RemoveRole { role_id } => Some(*role_id),
            Self::SetNickname { .. } => None,
        }
    }
}

/// Classification of a recorded action, as it appears in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    RoleAdded,
    RoleRemoved,
    NicknameChanged,
    ActionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded,
    Failed { error: String },
}

/// Outcome of applying one [`Action`] to one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub user_id: Snowflake,
    pub member_name: String,
    pub action: Action,
    /// Role name or new nickname, whichever the action touches
    pub subject: String,
    pub outcome: ActionOutcome,
}

impl ActionResult {
    #[inline]
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ActionOutcome::Succeeded)
    }

    pub fn kind(&self) -> ResultKind {
        if !self.succeeded() {
            return ResultKind::ActionFailed;
        }
        match self.action {
            Action::AddRole { .. } => ResultKind::RoleAdded,
            Action::RemoveRole { .. } => ResultKind::RoleRemoved,
            Action::SetNickname { .. } => ResultKind::NicknameChanged,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ActionOutcome::Succeeded => None,
            ActionOutcome::Failed { error } => Some(error),
        }
    }

    /// Human-readable line, `✅` for success and `❌` with the error otherwise
    pub fn describe(&self, locale: ReportLocale) -> String {
        let member = &self.member_name;
        let subject = &self.subject;

        match (locale, &self.action, self.error()) {
            (ReportLocale::Pt, Action::AddRole { .. }, None) => {
                format!("✅ Role '{subject}' adicionada a '{member}'")
            }
            (ReportLocale::Pt, Action::RemoveRole { .. }, None) => {
                format!("✅ Role '{subject}' removida de '{member}'")
            }
            (ReportLocale::Pt, Action::SetNickname { nickname: Some(_) }, None) => {
                format!("✅ Apelido de '{member}' alterado para '{subject}'")
            }
            (ReportLocale::Pt, Action::SetNickname { nickname: None }, None) => {
                format!("✅ Apelido de '{member}' removido")
            }
            (ReportLocale::Pt, Action::AddRole { .. }, Some(err)) => {
                format!("❌ Falha ao adicionar role '{subject}' a '{member}': {err}")
            }
            (ReportLocale::Pt, Action::RemoveRole { .. }, Some(err)) => {
                format!("❌ Falha ao remover role '{subject}' de '{member}': {err}")
            }
            (ReportLocale::Pt, Action::SetNickname { .. }, Some(err)) => {
                format!("❌ Falha ao alterar apelido de '{member}': {err}")
            }

            (ReportLocale::En, Action::AddRole { .. }, None) => {
                format!("✅ Role '{subject}' added to '{member}'")
            }
            (ReportLocale::En, Action::RemoveRole { .. }, None) => {
                format!("✅ Role '{subject}' removed from '{member}'")
            }
            (ReportLocale::En, Action::SetNickname { nickname: Some(_) }, None) => {
                format!("✅ Nickname of '{member}' set to '{subject}'")
            }
            (ReportLocale::En, Action::SetNickname { nickname: None }, None) => {
                format!("✅ Nickname of '{member}' cleared")
            }
            (ReportLocale::En, Action::AddRole { .. }, Some(err)) => {
                format!("❌ Failed to add role '{subject}' to '{member}': {err}")
            }
            (ReportLocale::En, Action::RemoveRole { .. }, Some(err)) => {
                format!("❌ Failed to remove role '{subject}' from '{member}': {err}")
            }
            (ReportLocale::En, Action::SetNickname { .. }, Some(err)) => {
                format!("❌ Failed to change nickname of '{member}': {err}")
            }
        }
    }
}
