//! Client-side form validation.
//!
//! Both validators are pure: they look at raw field strings and report every
//! failing field at once. A form only reaches the network when its result is
//! valid.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{NewTask, NewUser, Priority, Status, TaskPatch, UserId};

pub const NAME: &str = "name";
pub const EMAIL: &str = "email";
pub const USER_ID: &str = "userId";
pub const DESCRIPTION: &str = "description";
pub const SECTOR_NAME: &str = "sectorName";
pub const PRIORITY: &str = "priority";

const NAME_MAX: usize = 150;
const DESCRIPTION_MIN: usize = 5;
const DESCRIPTION_MAX: usize = 255;
const SECTOR_MAX: usize = 120;
const EMAIL_MAX: usize = 254;

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\s']+$").unwrap());
static SECTOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\s-]+$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r"@([A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$"
    ))
    .unwrap()
});

/// Per-field messages from a validation run. Valid when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    field_errors: BTreeMap<&'static str, String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn field_errors(&self) -> &BTreeMap<&'static str, String> {
        &self.field_errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    fn reject(&mut self, field: &'static str, message: &str) {
        self.field_errors.insert(field, message.to_string());
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .field_errors
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        f.write_str(&messages.join("; "))
    }
}

/// Raw fields of the user registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
}

impl UserForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        UserForm {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let name = self.name.trim();
        let name_len = name.chars().count();
        if name_len < 2 {
            result.reject(NAME, "Nome deve ter pelo menos 2 caracteres");
        } else if !NAME_RE.is_match(name) {
            result.reject(NAME, "Nome deve conter apenas letras e espaços");
        } else if name_len > NAME_MAX {
            result.reject(NAME, "Nome deve ter no máximo 150 caracteres");
        }

        if !is_email(self.email.trim()) {
            result.reject(EMAIL, "Email inválido");
        }

        result
    }

    /// Validates and produces the trimmed request body.
    pub fn into_new_user(self) -> Result<NewUser, ValidationResult> {
        let result = self.validate();
        if !result.is_valid() {
            return Err(result);
        }
        Ok(NewUser {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        })
    }
}

/// Raw fields of the task form. `user_id` is kept as text because it comes
/// from a free input or a selector that may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub user_id: String,
    pub description: String,
    pub sector_name: String,
    pub priority: String,
}

impl TaskForm {
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.user_id.trim().is_empty() || parse_user_id(&self.user_id).is_none() {
            result.reject(USER_ID, "Selecione o usuário");
        }

        let description_len = self.description.trim().chars().count();
        if description_len < DESCRIPTION_MIN {
            result.reject(DESCRIPTION, "Descrição deve ter no mínimo 5 caracteres");
        } else if description_len > DESCRIPTION_MAX {
            result.reject(DESCRIPTION, "Descrição deve ter no máximo 255 caracteres");
        }

        let sector = self.sector_name.trim();
        if sector.is_empty() {
            result.reject(SECTOR_NAME, "Setor é obrigatório");
        } else if !SECTOR_RE.is_match(sector) {
            result.reject(
                SECTOR_NAME,
                "Setor deve conter apenas letras, espaços e hífens",
            );
        } else if sector.chars().count() > SECTOR_MAX {
            result.reject(SECTOR_NAME, "Setor deve ter no máximo 120 caracteres");
        }

        if self.priority.parse::<Priority>().is_err() {
            result.reject(PRIORITY, "Selecione a prioridade");
        }

        result
    }

    /// Validates and produces the body for creating a task in `status`.
    pub fn to_new_task(&self, status: Status) -> Result<NewTask, ValidationResult> {
        let (user, priority) = self.checked()?;
        Ok(NewTask {
            user,
            description: self.description.trim().to_string(),
            sector_name: self.sector_name.trim().to_string(),
            priority,
            status,
        })
    }

    /// Validates and produces a patch carrying every form field. The status is
    /// left untouched.
    pub fn to_patch(&self) -> Result<TaskPatch, ValidationResult> {
        let (user, priority) = self.checked()?;
        Ok(TaskPatch {
            user: Some(user),
            description: Some(self.description.trim().to_string()),
            sector_name: Some(self.sector_name.trim().to_string()),
            priority: Some(priority),
            status: None,
        })
    }

    fn checked(&self) -> Result<(UserId, Priority), ValidationResult> {
        let result = self.validate();
        match (
            result.is_valid(),
            parse_user_id(&self.user_id),
            self.priority.parse::<Priority>(),
        ) {
            (true, Some(user), Ok(priority)) => Ok((user, priority)),
            _ => Err(result),
        }
    }
}

fn parse_user_id(raw: &str) -> Option<UserId> {
    raw.trim().parse().ok()
}

/// Email shape check: dot-atom local part, dotted domain with an alphabetic TLD.
pub fn is_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= EMAIL_MAX && EMAIL_RE.is_match(email)
}
