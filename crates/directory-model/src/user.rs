use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::options::UnknownOption;
use crate::validation::{
    DESIGNATION_REQUIRED, FAVORITES_REQUIRED, Field, FieldErrors, GENDER_INVALID,
    GENDER_REQUIRED, NAME_REQUIRED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            other => Err(UnknownOption(other.to_string())),
        }
    }
}

/// The validated field set of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFields {
    pub name: String,
    pub gender: Gender,
    pub designation: String,
    pub favorites: Vec<String>,
}

/// A stored user record as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(flatten)]
    pub fields: UserFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated create payload. Missing fields deserialize to empty values so
/// they show up as validation errors rather than decode failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDraft {
    pub name: String,
    pub gender: Option<String>,
    pub designation: String,
    pub favorites: Vec<String>,
}

impl UserDraft {
    /// Checks every invariant and trims `name` and `designation`.
    pub fn validate(self) -> Result<UserFields, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.insert(Field::Name, NAME_REQUIRED);
        }

        let gender = match self.gender.as_deref().map(str::trim) {
            None | Some("") => {
                errors.insert(Field::Gender, GENDER_REQUIRED);
                None
            }
            Some(raw) => match raw.parse::<Gender>() {
                Ok(gender) => Some(gender),
                Err(_) => {
                    errors.insert(Field::Gender, GENDER_INVALID);
                    None
                }
            },
        };

        let designation = self.designation.trim().to_string();
        if designation.is_empty() {
            errors.insert(Field::Designation, DESIGNATION_REQUIRED);
        }

        if self.favorites.is_empty() {
            errors.insert(Field::Favorites, FAVORITES_REQUIRED);
        }

        match gender {
            Some(gender) if errors.is_empty() => Ok(UserFields {
                name,
                gender,
                designation,
                favorites: self.favorites,
            }),
            _ => Err(errors),
        }
    }
}

impl From<UserFields> for UserDraft {
    fn from(fields: UserFields) -> Self {
        Self {
            name: fields.name,
            gender: Some(fields.gender.as_str().to_string()),
            designation: fields.designation,
            favorites: fields.favorites,
        }
    }
}

/// Update payload: absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub designation: Option<String>,
    pub favorites: Option<Vec<String>>,
}

impl UserPatch {
    /// Overlays the patch on `current` and re-validates the result.
    pub fn apply(self, current: &UserFields) -> Result<UserFields, FieldErrors> {
        let mut draft = UserDraft::from(current.clone());
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(gender) = self.gender {
            draft.gender = Some(gender);
        }
        if let Some(designation) = self.designation {
            draft.designation = designation;
        }
        if let Some(favorites) = self.favorites {
            draft.favorites = favorites;
        }
        draft.validate()
    }
}

impl From<UserFields> for UserPatch {
    fn from(fields: UserFields) -> Self {
        Self {
            name: Some(fields.name),
            gender: Some(fields.gender.as_str().to_string()),
            designation: Some(fields.designation),
            favorites: Some(fields.favorites),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ann() -> UserDraft {
        UserDraft {
            name: "Ann".to_string(),
            gender: Some("Female".to_string()),
            designation: "Developer".to_string(),
            favorites: vec!["Music".to_string()],
        }
    }

    #[test]
    fn valid_draft_is_trimmed() {
        let draft = UserDraft {
            name: "  Ann ".to_string(),
            designation: " Developer".to_string(),
            ..ann()
        };

        let fields = draft.validate().unwrap();
        assert_eq!(fields.name, "Ann");
        assert_eq!(fields.designation, "Developer");
        assert_eq!(fields.gender, Gender::Female);
    }

    #[rstest]
    #[case::blank_name(UserDraft { name: "   ".into(), ..ann() }, Field::Name, NAME_REQUIRED)]
    #[case::missing_gender(UserDraft { gender: None, ..ann() }, Field::Gender, GENDER_REQUIRED)]
    #[case::unknown_gender(UserDraft { gender: Some("Other".into()), ..ann() }, Field::Gender, GENDER_INVALID)]
    #[case::blank_designation(UserDraft { designation: "".into(), ..ann() }, Field::Designation, DESIGNATION_REQUIRED)]
    #[case::no_favorites(UserDraft { favorites: vec![], ..ann() }, Field::Favorites, FAVORITES_REQUIRED)]
    fn invalid_field_is_reported(#[case] draft: UserDraft, #[case] field: Field, #[case] message: &str) {
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(field), Some(message));
    }

    #[test]
    fn empty_draft_reports_every_field() {
        let errors = UserDraft::default().validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn missing_json_fields_become_validation_errors() {
        let draft: UserDraft = serde_json::from_str(r#"{"name":"Ann"}"#).unwrap();
        let errors = draft.validate().unwrap_err();
        assert!(errors.contains(Field::Gender));
        assert!(errors.contains(Field::Favorites));
        assert!(!errors.contains(Field::Name));
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let current = ann().validate().unwrap();
        let patch = UserPatch {
            designation: Some("Manager".to_string()),
            ..UserPatch::default()
        };

        let updated = patch.apply(&current).unwrap();
        assert_eq!(updated.designation, "Manager");
        assert_eq!(updated.name, "Ann");
        assert_eq!(updated.favorites, vec!["Music".to_string()]);
    }

    #[test]
    fn patch_applied_twice_is_stable() {
        let current = ann().validate().unwrap();
        let patch = UserPatch {
            name: Some("Annie".to_string()),
            favorites: Some(vec!["Travel".to_string(), "Music".to_string()]),
            ..UserPatch::default()
        };

        let once = patch.clone().apply(&current).unwrap();
        let twice = patch.apply(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn patch_cannot_empty_favorites() {
        let current = ann().validate().unwrap();
        let patch = UserPatch {
            favorites: Some(vec![]),
            ..UserPatch::default()
        };

        let errors = patch.apply(&current).unwrap_err();
        assert_eq!(errors.get(Field::Favorites), Some(FAVORITES_REQUIRED));
    }

    #[test]
    fn user_serializes_flat_camel_case() {
        let now = Utc::now();
        let user = User {
            id: "abc".to_string(),
            fields: ann().validate().unwrap(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["gender"], "Female");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("fields").is_none());
    }
}
