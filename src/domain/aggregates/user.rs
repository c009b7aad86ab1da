//! User Aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, UserEvent};
use crate::domain::value_objects::{Email, Phone};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: Email,
    #[serde(skip_serializing)]
    pub(crate) password_hash: String,
    pub(crate) birthdate: Option<NaiveDate>,
    pub(crate) gender: Gender,
    pub(crate) phone: Phone,
    pub(crate) is_admin: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender { Male, Female, Other }

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Male => "male", Self::Female => "female", Self::Other => "other" }
    }
}

impl FromStr for Gender {
    type Err = UserError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(UserError::InvalidGender),
        }
    }
}

/// Everything needed to open an account, already validated at the edge.
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub birthdate: NaiveDate,
    pub gender: Gender,
    pub phone: Phone,
}

impl User {
    pub fn register(new: NewUser) -> Result<Self, UserError> {
        let name = new.name.trim().to_string();
        if name.is_empty() { return Err(UserError::MissingName); }
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut user = Self {
            id, name, email: new.email, password_hash: new.password_hash, birthdate: Some(new.birthdate),
            gender: new.gender, phone: new.phone, is_admin: false, created_at: now, updated_at: now, events: vec![],
        };
        user.events.push(DomainEvent::User(UserEvent::Registered { user_id: id }));
        Ok(user)
    }

    /// Back-office account. Does not trigger a welcome message.
    pub fn admin(name: impl Into<String>, email: Email, password_hash: String, phone: Phone) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name: name.into(), email, password_hash, birthdate: None,
            gender: Gender::Other, phone, is_admin: true, created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn email(&self) -> &Email { &self.email }
    pub fn phone(&self) -> &Phone { &self.phone }
    pub fn password_hash(&self) -> &str { &self.password_hash }
    pub fn is_admin(&self) -> bool { self.is_admin }

    /// First word of the name, and the remainder (or `-` when there is none).
    pub fn split_name(&self) -> (&str, &str) {
        let trimmed = self.name.trim();
        match trimmed.split_once(char::is_whitespace) {
            Some((first, rest)) if !rest.trim().is_empty() => (first, rest.trim()),
            _ => (trimmed, "-"),
        }
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum UserError { MissingName, InvalidGender, InvalidBirthdate }
impl std::error::Error for UserError {}
impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "Name is required"),
            Self::InvalidGender => write!(f, "Gender must be male, female or other"),
            Self::InvalidBirthdate => write!(f, "Birthdate must be formatted YYYY-MM-DD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.into(), email: Email::parse("sari@example.com").unwrap(), password_hash: "hash".into(),
            birthdate: NaiveDate::from_ymd_opt(1999, 4, 1).unwrap(), gender: Gender::Female,
            phone: Phone::parse("081234567890").unwrap(),
        }
    }

    #[test]
    fn test_register_raises_event() {
        let mut user = User::register(new_user(" Sari Dewi ")).unwrap();
        assert_eq!(user.name(), "Sari Dewi");
        assert!(!user.is_admin());
        let events = user.take_events();
        assert_eq!(events, vec![DomainEvent::User(UserEvent::Registered { user_id: user.id() })]);
        assert!(user.take_events().is_empty());
    }

    #[test]
    fn test_password_never_serialized() {
        let user = User::register(new_user("Sari")).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["gender"], "female");
        assert_eq!(json["birthdate"], "1999-04-01");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(User::register(new_user("Sari Dewi Lestari")).unwrap().split_name(), ("Sari", "Dewi Lestari"));
        assert_eq!(User::register(new_user("Sari")).unwrap().split_name(), ("Sari", "-"));
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
        assert!("x".parse::<Gender>().is_err());
    }
}
