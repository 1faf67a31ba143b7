//! [`Property`]-related [`Database`] implementations.

use common::{
    operations::{By, Lock, Select},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, owner_id, agent_id, title, address, \
                   daily_price_amount, daily_price_currency, \
                   created_at \
            FROM properties \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Property {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                agent_id: row.get("agent_id"),
                title: row.get("title"),
                address: row.get("address"),
                daily_price: Money {
                    amount: row.get("daily_price_amount"),
                    currency: row.get("daily_price_currency"),
                },
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        self.query(&super::row_lock_sql("properties_lock"), &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
