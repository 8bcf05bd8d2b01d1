//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full platform administrator.
    Admin,
    /// Can create and publish courses, view queue statistics.
    Instructor,
    /// Can enroll in published courses.
    Student,
}

impl UserRole {
    /// Check if this role is a student.
    pub fn is_student(&self) -> bool {
        matches!(self, Self::Student)
    }

    /// Check if this role is an instructor or admin.
    pub fn is_instructor_or_admin(&self) -> bool {
        matches!(self, Self::Instructor | Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Instructor => "instructor",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = learnhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "instructor" => Ok(Self::Instructor),
            "student" => Ok(Self::Student),
            _ => Err(learnhub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, instructor, student"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks() {
        assert!(UserRole::Student.is_student());
        assert!(!UserRole::Instructor.is_student());
        assert!(UserRole::Instructor.is_instructor_or_admin());
        assert!(UserRole::Admin.is_instructor_or_admin());
        assert!(!UserRole::Student.is_instructor_or_admin());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("student".parse::<UserRole>().unwrap(), UserRole::Student);
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("viewer".parse::<UserRole>().is_err());
    }
}
