//! [`Query`] collection related to a single [`User`].

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

/// Queries a [`User`] by its [`user::Email`].
pub type ByEmail<'e> = DatabaseQuery<By<Option<User>, &'e user::Email>>;

#[cfg(test)]
mod spec {
    use crate::{infra::mock, query::Query as _};

    use super::{ByEmail, ById};

    #[tokio::test]
    async fn selects_existing_user() {
        let user = mock::user("alice@example.com", "pw123456");
        let svc = mock::service(mock::Database::with([user.clone()]));

        let by_id = svc.execute(ById::by(user.id)).await.unwrap().unwrap();
        let by_email =
            svc.execute(ByEmail::by(&user.email)).await.unwrap().unwrap();

        assert_eq!(by_id.id, user.id);
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn selects_nothing_for_unknown_user() {
        let svc = mock::service(mock::Database::default());
        let other = mock::user("bob@example.com", "pw123456");

        assert!(svc.execute(ById::by(other.id)).await.unwrap().is_none());
        assert!(svc
            .execute(ByEmail::by(&other.email))
            .await
            .unwrap()
            .is_none());
    }
}
