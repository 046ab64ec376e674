//! Student profile fields used to fill template placeholders.

use serde::{Deserialize, Serialize};

/// Profile data as stored by the backend.
///
/// Accepts both the backend's snake_case user JSON (`group_name`) and the editor's
/// camelCase profile form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "middleName")]
    pub middle_name: Option<String>,
    #[serde(default, alias = "group_name")]
    pub group: Option<String>,
    #[serde(default, alias = "studentId")]
    pub student_card: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn first_letter(value: &str) -> Option<char> {
    value.chars().next()
}

impl ProfileFields {
    pub fn group(&self) -> Option<&str> {
        non_blank(&self.group)
    }

    pub fn student_card(&self) -> Option<&str> {
        non_blank(&self.student_card)
    }

    pub fn department(&self) -> Option<&str> {
        non_blank(&self.department)
    }

    /// Surname followed by initials: `Иванов И.П.`, `Петров А.`, or just `Сидорова`.
    ///
    /// Empty when there is no surname.
    pub fn initials(&self) -> String {
        let Some(last) = non_blank(&self.last_name) else {
            return String::new();
        };
        let mut out = last.to_string();
        if let Some(c) = non_blank(&self.first_name).and_then(first_letter) {
            out.push(' ');
            out.push(c);
            out.push('.');
        }
        if let Some(c) = non_blank(&self.middle_name).and_then(first_letter) {
            if !out.ends_with('.') {
                out.push(' ');
            }
            out.push(c);
            out.push('.');
        }
        out
    }

    /// Surname, given name and patronymic, whichever are present.
    pub fn full_name(&self) -> String {
        [&self.last_name, &self.first_name, &self.middle_name]
            .into_iter()
            .filter_map(non_blank)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
