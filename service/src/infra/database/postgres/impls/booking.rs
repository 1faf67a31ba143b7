//! [`Booking`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    DateRange, Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        booking::{self, ContactInfo, Metadata},
        Booking,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Reconstructs a [`Booking`] from its table row.
fn from_row(row: &Row) -> Booking {
    Booking {
        id: row.get("id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        owner_id: row.get("owner_id"),
        range: DateRange::new(row.get("start_date"), row.get("end_date"))
            .expect("`end_date >= start_date` enforced by schema"),
        guest_count: row.get("guest_count"),
        total_amount: Money {
            amount: row.get("total_amount"),
            currency: row.get("total_currency"),
        },
        extra_guest_surcharge: row
            .get::<_, Option<_>>("surcharge_amount")
            .map(|amount| Money {
                amount,
                currency: row.get("surcharge_currency"),
            }),
        status: row.get("status"),
        payment_status: row.get("payment_status"),
        reservation_type: row.get("reservation_type"),
        payment_deadline: row.get("payment_deadline"),
        contact_info: ContactInfo {
            full_name: row.get("contact_full_name"),
            email: row.get("contact_email"),
            phone: row.get("contact_phone"),
            id_number: row.get("contact_id_number"),
        },
        metadata: Metadata {
            contract_id: row.get("contract_id"),
            contract_generated: row.get("contract_generated"),
            contract_sent_to_email: row.get("contract_sent_to_email"),
            gateway_session_id: row.get("gateway_session_id"),
        },
        created_at: row.get("created_at"),
    }
}

/// Columns of the `bookings` table, in [`from_row`] order.
const COLUMNS: &str = "\
    id, property_id, tenant_id, owner_id, \
    start_date, end_date, guest_count, \
    total_amount, total_currency, \
    surcharge_amount, surcharge_currency, \
    status, payment_status, reservation_type, payment_deadline, \
    contact_full_name, contact_email, contact_phone, contact_id_number, \
    contract_id, contract_generated, contract_sent_to_email, \
    gateway_session_id, \
    created_at";

impl<C> Database<Select<By<Option<Booking>, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Booking>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C> Database<Select<By<Vec<Booking>, read::booking::OfTenant>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, read::booking::OfTenant>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::OfTenant(tenant_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE tenant_id = $1::UUID \
             ORDER BY created_at DESC",
        );
        Ok(self
            .query(&sql, &[&tenant_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Booking>, read::booking::OfAgent>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, read::booking::OfAgent>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::OfAgent(agent_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE property_id IN (SELECT id \
                                   FROM properties \
                                   WHERE agent_id = $1::UUID) \
             ORDER BY created_at DESC",
        );
        Ok(self
            .query(&sql, &[&agent_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C>
    Database<
        Select<
            By<read::booking::Occupying<Vec<DateRange>>, read::booking::OfProperty>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::Occupying<Vec<DateRange>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::Occupying<Vec<DateRange>>, read::booking::OfProperty>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::OfProperty(property_id) = by.into_inner();

        const SQL: &str = "\
            SELECT start_date, end_date \
            FROM bookings \
            WHERE property_id = $1::UUID \
              AND (status = $2::INT2 OR status = $3::INT2)";
        Ok(read::booking::Occupying(
            self.query(
                SQL,
                &[
                    &property_id,
                    &booking::Status::Pending,
                    &booking::Status::Confirmed,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                DateRange::new(row.get("start_date"), row.get("end_date"))
                    .expect("`end_date >= start_date` enforced by schema")
            })
            .collect(),
        ))
    }
}

impl<C>
    Database<
        Select<
            By<read::booking::Occupying<Vec<DateRange>>, read::booking::Overlapping>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::booking::Occupying<Vec<DateRange>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::booking::Occupying<Vec<DateRange>>, read::booking::Overlapping>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::Overlapping { property_id, range } = by.into_inner();

        // Inclusive boundaries on both sides: ranges sharing a single
        // calendar day do overlap.
        const SQL: &str = "\
            SELECT start_date, end_date \
            FROM bookings \
            WHERE property_id = $1::UUID \
              AND (status = $2::INT2 OR status = $3::INT2) \
              AND start_date <= $4::DATE \
              AND end_date >= $5::DATE";
        Ok(read::booking::Occupying(
            self.query(
                SQL,
                &[
                    &property_id,
                    &booking::Status::Pending,
                    &booking::Status::Confirmed,
                    &range.end(),
                    &range.start(),
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                DateRange::new(row.get("start_date"), row.get("end_date"))
                    .expect("`end_date >= start_date` enforced by schema")
            })
            .collect(),
        ))
    }
}

impl<C> Database<Select<By<Vec<Booking>, read::booking::Sweepable>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Booking>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Booking>, read::booking::Sweepable>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::Sweepable { now } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM bookings \
             WHERE reservation_type = $1::INT2 \
               AND payment_status = $2::INT2 \
               AND payment_deadline < $3::TIMESTAMPTZ \
               AND status != $4::INT2 \
               AND status != $5::INT2",
        );
        Ok(self
            .query(
                &sql,
                &[
                    &booking::ReservationType::Offline,
                    &booking::PaymentStatus::Pending,
                    &now,
                    &booking::Status::Cancelled,
                    &booking::Status::Completed,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Booking>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Booking>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(booking): Insert<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(booking)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Booking>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(booking): Update<Booking>,
    ) -> Result<Self::Ok, Self::Err> {
        let Booking {
            id,
            property_id,
            tenant_id,
            owner_id,
            range,
            guest_count,
            total_amount,
            extra_guest_surcharge,
            status,
            payment_status,
            reservation_type,
            payment_deadline,
            contact_info,
            metadata,
            created_at,
        } = booking;

        let surcharge_amount = extra_guest_surcharge.map(|m| m.amount);
        let surcharge_currency = extra_guest_surcharge.map(|m| m.currency);

        const SQL: &str = "\
            INSERT INTO bookings (\
                id, property_id, tenant_id, owner_id, \
                start_date, end_date, guest_count, \
                total_amount, total_currency, \
                surcharge_amount, surcharge_currency, \
                status, payment_status, reservation_type, payment_deadline, \
                contact_full_name, contact_email, contact_phone, \
                contact_id_number, \
                contract_id, contract_generated, contract_sent_to_email, \
                gateway_session_id, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::DATE, $6::DATE, $7::INT4, \
                $8::NUMERIC, $9::INT2, \
                $10::NUMERIC, $11::INT2, \
                $12::INT2, $13::INT2, $14::INT2, $15::TIMESTAMPTZ, \
                $16::VARCHAR, $17::VARCHAR, $18::VARCHAR, $19::VARCHAR, \
                $20::UUID, $21::BOOLEAN, $22::BOOLEAN, \
                $23::VARCHAR, \
                $24::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                payment_status = EXCLUDED.payment_status, \
                payment_deadline = EXCLUDED.payment_deadline, \
                contract_id = EXCLUDED.contract_id, \
                contract_generated = EXCLUDED.contract_generated, \
                contract_sent_to_email = EXCLUDED.contract_sent_to_email, \
                gateway_session_id = EXCLUDED.gateway_session_id";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &tenant_id,
                &owner_id,
                &range.start(),
                &range.end(),
                &guest_count,
                &total_amount.amount,
                &total_amount.currency,
                &surcharge_amount,
                &surcharge_currency,
                &status,
                &payment_status,
                &reservation_type,
                &payment_deadline,
                &contact_info.full_name,
                &contact_info.email,
                &contact_info.phone,
                &contact_info.id_number,
                &metadata.contract_id,
                &metadata.contract_generated,
                &metadata.contract_sent_to_email,
                &metadata.gateway_session_id,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

/// Statement of the [`read::booking::Metadata`] projection update.
const METADATA_SQL: &str = "\
    UPDATE bookings \
    SET contract_id = $2::UUID, \
        contract_generated = $3::BOOLEAN, \
        contract_sent_to_email = $4::BOOLEAN, \
        gateway_session_id = $5::VARCHAR \
    WHERE id = $1::UUID";

impl<C> Database<Update<read::booking::Metadata>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(patch): Update<read::booking::Metadata>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::booking::Metadata { id, metadata } = patch;

        self.exec(
            METADATA_SQL,
            &[
                &id,
                &metadata.contract_id,
                &metadata.contract_generated,
                &metadata.contract_sent_to_email,
                &metadata.gateway_session_id,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<read::booking::Sweep>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(read::booking::Sweep(id)): Update<read::booking::Sweep>,
    ) -> Result<Self::Ok, Self::Err> {
        // Conditional write: a payment confirmed between candidate listing
        // and this statement leaves the row untouched.
        const SQL: &str = "\
            UPDATE bookings \
            SET status = $2::INT2, \
                payment_status = $3::INT2 \
            WHERE id = $1::UUID \
              AND reservation_type = $4::INT2 \
              AND payment_status = $5::INT2 \
              AND payment_deadline < NOW() \
              AND status != $6::INT2 \
              AND status != $7::INT2";
        self.exec(
            SQL,
            &[
                &id,
                &booking::Status::Cancelled,
                &booking::PaymentStatus::Failed,
                &booking::ReservationType::Offline,
                &booking::PaymentStatus::Pending,
                &booking::Status::Cancelled,
                &booking::Status::Completed,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|affected| affected > 0)
    }
}

impl<C> Database<Lock<By<Booking, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Booking, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: booking::Id = by.into_inner();

        self.query(&super::row_lock_sql("bookings_lock"), &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

#[cfg(test)]
mod spec {
    use super::METADATA_SQL;

    #[test]
    fn metadata_patch_leaves_lifecycle_columns_alone() {
        let (set, _) = METADATA_SQL.split_once(" WHERE").unwrap();
        for column in ["status", "payment_deadline", "start_date", "end_date"] {
            assert!(!set.contains(column), "column: {column}");
        }
    }
}
