use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role of whoever is acting on the gradebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "lecturer" => Ok(Role::Lecturer),
            "admin" => Ok(Role::Admin),
            other => Err(format!(
                "unknown role '{}' (expected student, lecturer or admin)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadRecords,
    ManageStudents,
    ManageCourses,
    WriteGrades,
    WriteReview,
    ManageEnrollment,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::ReadRecords => "read another student's records",
            Action::ManageStudents => "manage students",
            Action::ManageCourses => "manage courses",
            Action::WriteGrades => "write grades",
            Action::WriteReview => "write reviews",
            Action::ManageEnrollment => "change another student's enrollment",
        };
        f.write_str(name)
    }
}

/// The caller behind a write: a role, plus the student record it owns when
/// the role is `Student`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub role: Role,
    pub student_id: Option<u64>,
}

impl Actor {
    pub fn student(student_id: u64) -> Self {
        Self {
            role: Role::Student,
            student_id: Some(student_id),
        }
    }

    pub fn lecturer() -> Self {
        Self {
            role: Role::Lecturer,
            student_id: None,
        }
    }

    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            student_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("role '{role}' may not {action}")]
pub struct AccessDenied {
    pub role: Role,
    pub action: Action,
}

/// Role matrix for gradebook operations.
pub fn is_allowed(role: Role, action: Action) -> bool {
    match action {
        Action::ReadRecords | Action::ManageEnrollment => true,
        Action::ManageStudents | Action::ManageCourses | Action::WriteGrades => {
            matches!(role, Role::Lecturer | Role::Admin)
        }
        Action::WriteReview => role == Role::Student,
    }
}

pub fn authorize(actor: &Actor, action: Action) -> Result<(), AccessDenied> {
    if is_allowed(actor.role, action) {
        Ok(())
    } else {
        Err(AccessDenied {
            role: actor.role,
            action,
        })
    }
}

/// Authorize an action that concerns one student's records. Staff may act
/// on any student; a student only on their own record.
pub fn authorize_for_student(
    actor: &Actor,
    action: Action,
    student_id: u64,
) -> Result<(), AccessDenied> {
    authorize(actor, action)?;
    if actor.role == Role::Student && actor.student_id != Some(student_id) {
        return Err(AccessDenied {
            role: actor.role,
            action,
        });
    }
    Ok(())
}

/// Only the student who wrote a review may change or delete it.
pub fn owns_record(actor: &Actor, owner_student_id: u64) -> bool {
    actor.role == Role::Student && actor.student_id == Some(owner_student_id)
}
