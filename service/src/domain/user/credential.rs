//! [`Credential`] definitions.
//!
//! Passwords are never stored. A [`User`] keeps a random [`Salt`] generated
//! once on account creation and a [`PasswordHash`] of the salted password,
//! computed with [bcrypt].
//!
//! Hashing is deliberately slow, so callers on an async runtime should run
//! [`Credential::new()`] and [`Credential::verify()`] on a blocking thread.
//!
//! [bcrypt]: https://en.wikipedia.org/wiki/Bcrypt

use derive_more::{AsRef, Display, Error as StdError, From};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rand::{rngs::OsRng, RngCore as _};
use secrecy::zeroize::Zeroizing;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;

use super::Password;

/// Number of random bytes in a [`Salt`].
pub const SALT_LENGTH: usize = 16;

/// Maximum number of bytes [bcrypt] hashes, including the hex-encoded
/// [`Salt`].
///
/// Longer inputs are rejected rather than truncated.
///
/// [bcrypt]: https://en.wikipedia.org/wiki/Bcrypt
pub const MAX_INPUT_LENGTH: usize = 72;

/// [bcrypt] cost factor of a [`PasswordHash`].
///
/// [bcrypt]: https://en.wikipedia.org/wiki/Bcrypt
pub const HASH_COST: u32 = 12;

/// Credential of a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credential {
    /// [`PasswordHash`] of the salted [`Password`].
    pub hash: PasswordHash,

    /// [`Salt`] the [`Password`] is salted with.
    pub salt: Salt,
}

impl Credential {
    /// Creates a new [`Credential`] for the provided [`Password`] with a
    /// freshly generated [`Salt`].
    ///
    /// # Errors
    ///
    /// If the entropy source fails or hashing fails.
    pub fn new(password: &Password) -> Result<Self, Traced<Error>> {
        let salt = Salt::generate().map_err(tracerr::wrap!())?;
        let hash =
            PasswordHash::new(password, &salt).map_err(tracerr::wrap!())?;
        Ok(Self { hash, salt })
    }

    /// Checks whether the provided [`Password`] matches this [`Credential`].
    ///
    /// Never matches a [`Password`] whose salted form exceeds
    /// [`MAX_INPUT_LENGTH`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        self.hash.verify(password, &self.salt)
    }
}

/// Random salt of a [`Credential`], hex-encoded.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Salt(String);

impl Salt {
    /// Generates a new random [`Salt`] of [`SALT_LENGTH`] bytes.
    ///
    /// # Errors
    ///
    /// If the OS entropy source fails.
    pub fn generate() -> Result<Self, Traced<Error>> {
        let mut bytes = [0; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Creates a [`Salt`] from its hex-encoded representation, if it's valid.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn new(encoded: impl Into<String>) -> Option<Self> {
        let encoded = encoded.into();
        let valid = hex::decode(&encoded)
            .is_ok_and(|bytes| bytes.len() == SALT_LENGTH);
        valid.then_some(Self(encoded))
    }
}

/// [bcrypt] hash of a salted [`Password`].
///
/// [bcrypt]: https://en.wikipedia.org/wiki/Bcrypt
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the provided [`Password`] salted with the provided [`Salt`].
    ///
    /// # Errors
    ///
    /// If the salted [`Password`] exceeds [`MAX_INPUT_LENGTH`], or the
    /// underlying hashing primitive fails.
    pub fn new(password: &Password, salt: &Salt) -> Result<Self, Traced<Error>> {
        let input = salted(password, salt);
        bcrypt::non_truncating_hash(input.as_bytes(), HASH_COST)
            .map(Self)
            .map_err(tracerr::from_and_wrap!(=> Error))
    }

    /// Wraps an already computed hash.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Checks whether the provided [`Password`] salted with the provided
    /// [`Salt`] produces this [`PasswordHash`].
    #[must_use]
    pub fn verify(&self, password: &Password, salt: &Salt) -> bool {
        let input = salted(password, salt);
        bcrypt::non_truncating_verify(input.as_bytes(), &self.0)
            .unwrap_or(false)
    }
}

/// Concatenates the [`Password`] with the [`Salt`], wiping the result from
/// memory once dropped.
fn salted(password: &Password, salt: &Salt) -> Zeroizing<String> {
    let password: &str = password.as_ref();
    let salt: &str = salt.as_ref();
    Zeroizing::new(format!("{password}{salt}"))
}

/// Error of producing a [`Credential`].
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// OS entropy source failed.
    #[display("Failed to generate a `Salt`: {_0}")]
    Entropy(rand::Error),

    /// [bcrypt] failed, or the salted [`Password`] is too long to be hashed
    /// without truncation.
    ///
    /// [bcrypt]: https://en.wikipedia.org/wiki/Bcrypt
    #[display("Failed to hash a `Password`: {_0}")]
    Hashing(bcrypt::BcryptError),
}

#[cfg(test)]
mod spec {
    use super::{
        Credential, Error, Password, PasswordHash, Salt, MAX_INPUT_LENGTH,
        SALT_LENGTH,
    };

    fn password(s: &str) -> Password {
        Password::new(s).unwrap()
    }

    #[test]
    fn salt_is_hex_of_fixed_length() {
        let salt = Salt::generate().unwrap();
        let encoded: &str = salt.as_ref();

        assert_eq!(encoded.len(), SALT_LENGTH * 2);
        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(Salt::new(encoded), Some(salt));
    }

    #[test]
    fn salts_are_not_reused() {
        assert_ne!(Salt::generate().unwrap(), Salt::generate().unwrap());
    }

    #[test]
    fn salt_rejects_malformed_encoding() {
        assert!(Salt::new("").is_none());
        assert!(Salt::new("7da8aa7388bbe6e8").is_none());
        assert!(Salt::new("zz".repeat(SALT_LENGTH)).is_none());
        assert!(Salt::new("7da8aa7388bbe6e878064f084ac736a4").is_some());
    }

    #[test]
    fn hash_verifies_same_password_and_salt() {
        let salt = Salt::generate().unwrap();
        let hash = PasswordHash::new(&password("pw123456"), &salt).unwrap();

        assert!(hash.verify(&password("pw123456"), &salt));
        assert!(!hash.verify(&password("wrong"), &salt));
    }

    #[test]
    fn hash_depends_on_salt() {
        let (salt1, salt2) = (Salt::generate().unwrap(), Salt::generate().unwrap());
        let hash1 = PasswordHash::new(&password("pw123456"), &salt1).unwrap();
        let hash2 = PasswordHash::new(&password("pw123456"), &salt2).unwrap();

        assert_ne!(hash1, hash2);
        assert!(!hash1.verify(&password("pw123456"), &salt2));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let salt = Salt::generate().unwrap();
        let hash = PasswordHash::from_stored("not a bcrypt hash");

        assert!(!hash.verify(&password("pw123456"), &salt));
    }

    #[test]
    fn credential_round_trip() {
        let credential = Credential::new(&password("pw123456")).unwrap();

        assert!(credential.verify(&password("pw123456")));
        assert!(!credential.verify(&password("pw1234567")));
    }

    #[test]
    fn longest_password_is_fully_hashed() {
        let salt = Salt::generate().unwrap();
        let longest = "a".repeat(Password::MAX_LENGTH);
        let hash = PasswordHash::new(&password(&longest), &salt).unwrap();

        let mut other = "a".repeat(Password::MAX_LENGTH - 1);
        other.push('b');
        assert!(hash.verify(&password(&longest), &salt));
        assert!(!hash.verify(&password(&other), &salt));
    }

    #[test]
    fn every_salt_byte_matters() {
        let salt = Salt::generate().unwrap();
        let longest = password(&"a".repeat(Password::MAX_LENGTH));
        let hash = PasswordHash::new(&longest, &salt).unwrap();

        let encoded: &str = salt.as_ref();
        let last = if encoded.ends_with('0') { '1' } else { '0' };
        let other = Salt::new(format!(
            "{}{last}",
            &encoded[..encoded.len() - 1],
        ))
        .unwrap();

        assert!(!hash.verify(&longest, &other));
    }

    #[test]
    fn overlong_input_is_rejected_not_truncated() {
        let salt = Salt::generate().unwrap();
        let prefix = "a".repeat(MAX_INPUT_LENGTH);
        let overlong = Password(format!("{prefix}X"));

        let err = PasswordHash::new(&overlong, &salt).unwrap_err();
        assert!(matches!(err.as_ref(), Error::Hashing(_)));

        let stored = PasswordHash::from_stored(
            bcrypt::hash(format!("{prefix}X{salt}"), 4).unwrap(),
        );
        assert!(!stored.verify(&Password(format!("{prefix}Y-other")), &salt));
    }
}
