//! Form fields and consent flags

use serde::{Deserialize, Serialize};

/// Free-text fields of the entry form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Email,
    Phone,
    SocialHandle,
}

/// Checkbox-style consent flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsentFlag {
    /// Video may be featured on social media
    PermissionGranted,
    /// Already follows the campaign's social page
    AlreadyFollowing,
    /// Opened the social page from the form
    HasSharedPage,
}

/// What the user has typed and ticked so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    pub name: String,
    /// Optional
    pub email: String,
    pub phone: String,
    /// Stored without the leading `@`
    pub social_handle: String,
    pub permission_granted: bool,
    pub already_following: bool,
    pub has_shared_page: bool,
}

impl FormData {
    pub fn update_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Email => self.email = value,
            FormField::Phone => self.phone = value,
            // Only the first '@' goes, wherever it sits
            FormField::SocialHandle => self.social_handle = value.replacen('@', "", 1),
        }
    }

    pub fn consent(&self, flag: ConsentFlag) -> bool {
        match flag {
            ConsentFlag::PermissionGranted => self.permission_granted,
            ConsentFlag::AlreadyFollowing => self.already_following,
            ConsentFlag::HasSharedPage => self.has_shared_page,
        }
    }

    pub fn set_consent(&mut self, flag: ConsentFlag, value: bool) {
        match flag {
            ConsentFlag::PermissionGranted => self.permission_granted = value,
            ConsentFlag::AlreadyFollowing => self.already_following = value,
            ConsentFlag::HasSharedPage => self.has_shared_page = value,
        }
    }

    /// Flip a flag, returning its new value
    pub fn toggle_consent(&mut self, flag: ConsentFlag) -> bool {
        let value = !self.consent(flag);
        self.set_consent(flag, value);
        value
    }

    /// Following already, or at least visited the page
    pub fn meets_follow_requirement(&self) -> bool {
        self.already_following || self.has_shared_page
    }
}
