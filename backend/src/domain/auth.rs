//! Login, signup and profile-change payloads validated before they reach a
//! service.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::{Email, UserValidationError, Username};

/// Minimum accepted password length at signup.
pub const PASSWORD_MIN: usize = 8;

/// Validation failures for login and signup payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password shorter than [`PASSWORD_MIN`] at signup.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },
    /// Avatar URL was blank once trimmed.
    #[error("avatar must not be blank")]
    BlankAvatar,
    /// A profile change named no field.
    #[error("provide at least one of avatar, email or password")]
    EmptyUpdate,
    /// Username or email failed field validation.
    #[error(transparent)]
    Field(#[from] UserValidationError),
}

fn check_new_password(password: &str) -> Result<(), AuthValidationError> {
    if password.is_empty() {
        return Err(AuthValidationError::EmptyPassword);
    }
    if password.chars().count() < PASSWORD_MIN {
        return Err(AuthValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    Ok(())
}

/// Credentials presented at login.
///
/// ## Invariants
/// - `username` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller whitespace.
///
/// # Examples
/// ```
/// use tsuki::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada ", "hunter22").expect("valid");
/// assert_eq!(creds.username(), "ada");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, AuthValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(AuthValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username used for the account lookup.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Plaintext password supplied by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Details for a new local account.
#[derive(Clone, PartialEq, Eq)]
pub struct SignupDetails {
    username: Username,
    email: Option<Email>,
    password: Zeroizing<String>,
}

impl SignupDetails {
    /// Validate raw signup inputs. A blank email is treated as absent.
    pub fn try_from_parts(
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<Self, AuthValidationError> {
        if username.trim().is_empty() {
            return Err(AuthValidationError::EmptyUsername);
        }
        check_new_password(password)?;
        let email = email
            .filter(|raw| !raw.trim().is_empty())
            .map(Email::new)
            .transpose()?;
        Ok(Self {
            username: Username::new(username)?,
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Requested handle.
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Optional contact address.
    #[must_use]
    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Plaintext password to hash.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for SignupDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupDetails")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Changes a signed-in user requests to their own account.
///
/// ## Invariants
/// - At least one field is present.
/// - `avatar` is trimmed and non-blank.
/// - `password` satisfies the signup rules.
#[derive(Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    avatar: Option<String>,
    email: Option<Email>,
    password: Option<Zeroizing<String>>,
}

impl ProfileUpdate {
    /// Validate raw profile changes.
    ///
    /// # Examples
    /// ```
    /// use tsuki::domain::ProfileUpdate;
    ///
    /// let update = ProfileUpdate::try_from_parts(None, Some("ada@example.org"), None)
    ///     .expect("valid");
    /// assert_eq!(update.email().map(AsRef::as_ref), Some("ada@example.org"));
    /// assert!(ProfileUpdate::try_from_parts(None, None, None).is_err());
    /// ```
    pub fn try_from_parts(
        avatar: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, AuthValidationError> {
        if avatar.is_none() && email.is_none() && password.is_none() {
            return Err(AuthValidationError::EmptyUpdate);
        }
        let avatar = avatar
            .map(|raw| match raw.trim() {
                "" => Err(AuthValidationError::BlankAvatar),
                trimmed => Ok(trimmed.to_owned()),
            })
            .transpose()?;
        let email = email.map(Email::new).transpose()?;
        if let Some(password) = password {
            check_new_password(password)?;
        }
        Ok(Self {
            avatar,
            email,
            password: password.map(|raw| Zeroizing::new(raw.to_owned())),
        })
    }

    /// Replacement avatar URL.
    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Replacement contact address.
    #[must_use]
    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Replacement plaintext password to hash.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|password| password.as_str())
    }
}

impl fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("avatar", &self.avatar)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
