//! [`Query`] collection related to a single [`Contract`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, contract, user, Contract, User},
    infra::{database, Database},
    read,
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Contract`] by its [`contract::Id`].
pub type ById = DatabaseQuery<By<Option<Contract>, contract::Id>>;

/// Queries a [`Contract`] by the [`booking::Id`] it was derived from.
pub type ByBooking = DatabaseQuery<By<Option<Contract>, booking::Id>>;

/// [`Query`] re-deriving validity of the signatures captured on a
/// [`Contract`].
#[derive(Clone, Copy, Debug)]
pub struct VerifySignatures {
    /// ID of the [`Contract`] to verify.
    pub contract_id: contract::Id,
}

impl<Db> Query<VerifySignatures> for Service<Db>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = read::contract::SignatureValidity;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        VerifySignatures { contract_id }: VerifySignatures,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let contract = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;

        let agent = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(contract.agent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(contract.agent_id))
            .map_err(tracerr::wrap!())?;

        Ok(read::contract::SignatureValidity::evaluate(&contract, &agent))
    }
}

/// Error of [`VerifySignatures`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
