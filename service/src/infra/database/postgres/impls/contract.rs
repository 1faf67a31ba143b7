//! [`Contract`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    DateRange, Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        booking,
        contract::{self, signature, RentalDetails, Signature},
        Contract,
    },
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Reconstructs a [`Signature`] from the given `columns` of a table row.
///
/// `columns` are the kind, image, signing time, IP and user agent columns,
/// in that order.
fn signature_from_row(row: &Row, columns: [&str; 5]) -> Option<Signature> {
    let [kind, image, signed_at, ip, user_agent] = columns;
    row.get::<_, Option<signature::Kind>>(kind).map(|kind| Signature {
        kind,
        image: row.get(image),
        signed_at: row.get(signed_at),
        ip: row.get(ip),
        user_agent: row.get(user_agent),
    })
}

/// Reconstructs a [`Contract`] from its table row.
///
/// All monetary figures of one [`Contract`] share a single currency column.
fn from_row(row: &Row) -> Contract {
    let currency = row.get("currency");
    Contract {
        id: row.get("id"),
        kind: row.get("kind"),
        agent_id: row.get("agent_id"),
        client_id: row.get("client_id"),
        property_id: row.get("property_id"),
        booking_id: row.get("booking_id"),
        title: row.get("title"),
        description: row.get("description"),
        terms: row.get("terms"),
        amount: Money {
            amount: row.get("amount"),
            currency,
        },
        commission_rate: row.get("commission_rate"),
        commission: Money {
            amount: row.get("commission_amount"),
            currency,
        },
        security_deposit: Money {
            amount: row.get("security_deposit_amount"),
            currency,
        },
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        reservation_type: row.get("reservation_type"),
        agent_signature: signature_from_row(
            row,
            [
                "agent_sig_kind",
                "agent_sig_image",
                "agent_sig_signed_at",
                "agent_sig_ip",
                "agent_sig_user_agent",
            ],
        ),
        client_signature: signature_from_row(
            row,
            [
                "client_sig_kind",
                "client_sig_image",
                "client_sig_signed_at",
                "client_sig_ip",
                "client_sig_user_agent",
            ],
        ),
        rental_details: RentalDetails {
            landlord_name: row.get("landlord_name"),
            tenant_name: row.get("tenant_name"),
            property_address: row.get("property_address"),
            period: DateRange::new(
                row.get("period_start"),
                row.get("period_end"),
            )
            .expect("`period_end >= period_start` enforced by schema"),
            rent: Money {
                amount: row.get("rental_rent_amount"),
                currency,
            },
            security_deposit: Money {
                amount: row.get("rental_deposit_amount"),
                currency,
            },
            payment_frequency: row.get("payment_frequency"),
            obligations: row.get("obligations"),
            restrictions: row.get("restrictions"),
            dispute_resolution: row.get("dispute_resolution"),
        },
        signed_document_url: row.get("signed_document_url"),
        revocation_reason: row.get("revocation_reason"),
        created_at: row.get("created_at"),
    }
}

/// Columns of the `contracts` table, in [`from_row`] order.
const COLUMNS: &str = "\
    id, kind, agent_id, client_id, property_id, booking_id, \
    title, description, terms, \
    amount, currency, commission_rate, commission_amount, \
    security_deposit_amount, \
    start_date, end_date, status, reservation_type, \
    agent_sig_kind, agent_sig_image, agent_sig_signed_at, \
    agent_sig_ip, agent_sig_user_agent, \
    client_sig_kind, client_sig_image, client_sig_signed_at, \
    client_sig_ip, client_sig_user_agent, \
    landlord_name, tenant_name, property_address, \
    period_start, period_end, \
    rental_rent_amount, rental_deposit_amount, payment_frequency, \
    obligations, restrictions, dispute_resolution, \
    signed_document_url, revocation_reason, \
    created_at";

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
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

impl<C> Database<Select<By<Option<Contract>, booking::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, booking::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let booking_id: booking::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE booking_id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&booking_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Contract>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(contract))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            kind,
            agent_id,
            client_id,
            property_id,
            booking_id,
            title,
            description,
            terms,
            amount,
            commission_rate,
            commission,
            security_deposit,
            start_date,
            end_date,
            status,
            reservation_type,
            agent_signature,
            client_signature,
            rental_details,
            signed_document_url,
            revocation_reason,
            created_at,
        } = contract;

        let agent_sig_kind = agent_signature.as_ref().map(|s| s.kind);
        let agent_sig_image =
            agent_signature.as_ref().map(|s| s.image.clone());
        let agent_sig_signed_at = agent_signature.as_ref().map(|s| s.signed_at);
        let agent_sig_ip =
            agent_signature.as_ref().and_then(|s| s.ip.clone());
        let agent_sig_user_agent =
            agent_signature.as_ref().and_then(|s| s.user_agent.clone());

        let client_sig_kind = client_signature.as_ref().map(|s| s.kind);
        let client_sig_image =
            client_signature.as_ref().map(|s| s.image.clone());
        let client_sig_signed_at =
            client_signature.as_ref().map(|s| s.signed_at);
        let client_sig_ip =
            client_signature.as_ref().and_then(|s| s.ip.clone());
        let client_sig_user_agent =
            client_signature.as_ref().and_then(|s| s.user_agent.clone());

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, kind, agent_id, client_id, property_id, booking_id, \
                title, description, terms, \
                amount, currency, commission_rate, commission_amount, \
                security_deposit_amount, \
                start_date, end_date, status, reservation_type, \
                agent_sig_kind, agent_sig_image, agent_sig_signed_at, \
                agent_sig_ip, agent_sig_user_agent, \
                client_sig_kind, client_sig_image, client_sig_signed_at, \
                client_sig_ip, client_sig_user_agent, \
                landlord_name, tenant_name, property_address, \
                period_start, period_end, \
                rental_rent_amount, rental_deposit_amount, \
                payment_frequency, \
                obligations, restrictions, dispute_resolution, \
                signed_document_url, revocation_reason, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::INT2, $3::UUID, $4::UUID, $5::UUID, $6::UUID, \
                $7::VARCHAR, $8::VARCHAR, $9::VARCHAR, \
                $10::NUMERIC, $11::INT2, $12::NUMERIC, $13::NUMERIC, \
                $14::NUMERIC, \
                $15::DATE, $16::DATE, $17::INT2, $18::INT2, \
                $19::INT2, $20::VARCHAR, $21::TIMESTAMPTZ, \
                $22::VARCHAR, $23::VARCHAR, \
                $24::INT2, $25::VARCHAR, $26::TIMESTAMPTZ, \
                $27::VARCHAR, $28::VARCHAR, \
                $29::VARCHAR, $30::VARCHAR, $31::VARCHAR, \
                $32::DATE, $33::DATE, \
                $34::NUMERIC, $35::NUMERIC, \
                $36::INT2, \
                $37::VARCHAR[], $38::VARCHAR[], $39::VARCHAR, \
                $40::VARCHAR, $41::VARCHAR, \
                $42::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                agent_sig_kind = EXCLUDED.agent_sig_kind, \
                agent_sig_image = EXCLUDED.agent_sig_image, \
                agent_sig_signed_at = EXCLUDED.agent_sig_signed_at, \
                agent_sig_ip = EXCLUDED.agent_sig_ip, \
                agent_sig_user_agent = EXCLUDED.agent_sig_user_agent, \
                client_sig_kind = EXCLUDED.client_sig_kind, \
                client_sig_image = EXCLUDED.client_sig_image, \
                client_sig_signed_at = EXCLUDED.client_sig_signed_at, \
                client_sig_ip = EXCLUDED.client_sig_ip, \
                client_sig_user_agent = EXCLUDED.client_sig_user_agent, \
                signed_document_url = EXCLUDED.signed_document_url, \
                revocation_reason = EXCLUDED.revocation_reason";
        self.exec(
            SQL,
            &[
                &id,
                &kind,
                &agent_id,
                &client_id,
                &property_id,
                &booking_id,
                &title,
                &description,
                &terms,
                &amount.amount,
                &amount.currency,
                &commission_rate,
                &commission.amount,
                &security_deposit.amount,
                &start_date,
                &end_date,
                &status,
                &reservation_type,
                &agent_sig_kind,
                &agent_sig_image,
                &agent_sig_signed_at,
                &agent_sig_ip,
                &agent_sig_user_agent,
                &client_sig_kind,
                &client_sig_image,
                &client_sig_signed_at,
                &client_sig_ip,
                &client_sig_user_agent,
                &rental_details.landlord_name,
                &rental_details.tenant_name,
                &rental_details.property_address,
                &rental_details.period.start(),
                &rental_details.period.end(),
                &rental_details.rent.amount,
                &rental_details.security_deposit.amount,
                &rental_details.payment_frequency,
                &rental_details.obligations,
                &rental_details.restrictions,
                &rental_details.dispute_resolution,
                &signed_document_url,
                &revocation_reason,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

/// Statement of the [`read::contract::Sweep`] conditional cancellation.
const SWEEP_SQL: &str = "\
    UPDATE contracts \
    SET status = $2::INT2 \
    WHERE id = $1::UUID \
      AND status != $3::INT2 \
      AND status != $4::INT2 \
      AND status != $5::INT2";

impl<C> Database<Update<read::contract::Sweep>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(read::contract::Sweep(id)): Update<read::contract::Sweep>,
    ) -> Result<Self::Ok, Self::Err> {
        // Conditional status-only write: a terminal `Contract` stays as is,
        // and signatures captured meanwhile are left untouched.
        self.exec(
            SWEEP_SQL,
            &[
                &id,
                &contract::Status::Cancelled,
                &contract::Status::Completed,
                &contract::Status::Cancelled,
                &contract::Status::Expired,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|affected| affected > 0)
    }
}

/// Statement of the [`read::contract::Document`] projection update.
const DOCUMENT_SQL: &str = "\
    UPDATE contracts \
    SET signed_document_url = $2::VARCHAR \
    WHERE id = $1::UUID";

impl<C> Database<Update<read::contract::Document>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(doc): Update<read::contract::Document>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::Document { id, url } = doc;

        self.exec(DOCUMENT_SQL, &[&id, &url])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        self.query(&super::row_lock_sql("contracts_lock"), &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::contract::list::Page, read::contract::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::list::Selector {
            arguments,
            filter:
                read::contract::list::Filter {
                    title,
                    status,
                    kind,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let kind_idx = kind.as_ref().map(|k| {
            ps.push(k);
            ps.len()
        });
        let title_idx = title.as_ref().map(|t| {
            ps.push(t);
            ps.len()
        });

        let title_pattern = title.as_ref().map(|t| FuzzPattern::new(t.as_ref()));
        let title_pattern_idx = title_pattern.as_ref().map(|t| {
            ps.push(t);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM contracts \
             WHERE true \
                   {cursor} \
                   {status_filtering} \
                   {kind_filtering} \
                   {title_filtering} \
             ORDER BY {title_ordering} \
                      id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.kind().order().sql(),
            status_filtering =
                status_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND status = ${idx}::INT2"))
                }),
            kind_filtering = kind_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND kind = ${idx}::INT2"))
            }),
            title_filtering =
                title_pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND LOWER(title) SIMILAR TO LOWER(${idx}::VARCHAR)"
                    ))
                }),
            title_ordering =
                title_idx.into_iter().format_with("", |idx, f| {
                    let order = arguments.kind().order().sql();
                    f(&format_args!(
                        "LEVENSHTEIN(title, ${idx}::VARCHAR, 1, 1, 0) \
                         {order},"
                    ))
                })
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let id = row.get("id");
                (id, id)
            })
            .collect::<Vec<_>>();

        Ok(read::contract::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<read::contract::list::TotalCount, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::contract::list::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM contracts";
        self.query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}

impl<C> Database<Select<By<read::contract::Statistics, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::Statistics;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<read::contract::Statistics, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT COUNT(*)::INT4 AS total, \
                   (COUNT(*) FILTER (WHERE status = $1::INT2))::INT4 \
                       AS draft, \
                   (COUNT(*) FILTER (WHERE status = $2::INT2))::INT4 \
                       AS pending, \
                   (COUNT(*) FILTER (WHERE status = $3::INT2))::INT4 \
                       AS active, \
                   (COUNT(*) FILTER (WHERE status = $4::INT2))::INT4 \
                       AS completed, \
                   (COUNT(*) FILTER (WHERE status = $5::INT2))::INT4 \
                       AS cancelled, \
                   (COUNT(*) FILTER (WHERE status = $6::INT2))::INT4 \
                       AS expired, \
                   SUM(commission_amount) \
                       FILTER (WHERE status = $3::INT2 \
                                  OR status = $4::INT2) \
                       AS commission_total \
            FROM contracts";
        self.query_opt(
            SQL,
            &[
                &contract::Status::Draft,
                &contract::Status::Pending,
                &contract::Status::Active,
                &contract::Status::Completed,
                &contract::Status::Cancelled,
                &contract::Status::Expired,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|row| {
            let row = row.expect("always exists");
            read::contract::Statistics {
                total: row.get("total"),
                draft: row.get("draft"),
                pending: row.get("pending"),
                active: row.get("active"),
                completed: row.get("completed"),
                cancelled: row.get("cancelled"),
                expired: row.get("expired"),
                commission_total: row
                    .get::<_, Option<Decimal>>("commission_total")
                    .unwrap_or_default(),
            }
        })
    }
}

#[cfg(test)]
mod spec {
    use super::{DOCUMENT_SQL, SWEEP_SQL};

    #[test]
    fn sweep_cancellation_writes_the_status_column_only() {
        let (set, _) = SWEEP_SQL.split_once(" WHERE").unwrap();
        assert_eq!(set, "UPDATE contracts SET status = $2::INT2");
    }

    #[test]
    fn document_patch_writes_the_url_column_only() {
        let (set, _) = DOCUMENT_SQL.split_once(" WHERE").unwrap();
        assert_eq!(
            set,
            "UPDATE contracts SET signed_document_url = $2::VARCHAR",
        );
    }
}
