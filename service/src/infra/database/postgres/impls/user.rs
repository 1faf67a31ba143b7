//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{user, user::StoredSignature, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, phone, \
                   signature_image, signature_kind, signature_is_active, \
                   created_at \
            FROM users \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| {
                let signature = row
                    .get::<_, Option<_>>("signature_image")
                    .map(|image| StoredSignature {
                        image,
                        kind: row.get("signature_kind"),
                        is_active: row.get("signature_is_active"),
                    });
                User {
                    id: row.get("id"),
                    name: row.get("name"),
                    email: row.get("email"),
                    phone: row.get("phone"),
                    signature,
                    created_at: row.get("created_at"),
                }
            }))
    }
}
