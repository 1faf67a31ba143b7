//! [`Command`] for signing a [`Contract`] as its client party.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contract::{self, signature, Signature},
        user, Contract,
    },
    infra::{database, Database},
    read, Service,
};

use super::{sign_contract_as_agent::finalize_document, Command};

/// [`Command`] for signing a [`Contract`] as its client party.
///
/// Unlike agents, clients submit a fresh signature payload every time.
#[derive(Clone, Debug)]
pub struct SignContractAsClient {
    /// ID of the [`Contract`] to sign.
    pub contract_id: contract::Id,

    /// ID of the [`User`] signing as the client party.
    pub client_id: user::Id,

    /// [`Kind`] of the submitted signature.
    ///
    /// [`Kind`]: signature::Kind
    pub kind: signature::Kind,

    /// Image (or typed text) of the submitted signature.
    pub image: signature::Image,

    /// IP address the signing request originated from.
    pub ip: Option<signature::IpAddress>,

    /// User agent the signing request originated from.
    pub user_agent: Option<signature::UserAgent>,
}

impl<Db> Command<SignContractAsClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Update<read::contract::Document>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SignContractAsClient,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignContractAsClient {
            contract_id,
            client_id,
            kind,
            image,
            ip,
            user_agent,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize with the other party's signing and the sweeper.
        tx.execute(Lock(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;
        if contract.client_id != client_id {
            return Err(tracerr::new!(E::NotClientOfContract(client_id)));
        }

        let activation = contract
            .sign_as_client(Signature {
                kind,
                image,
                signed_at: DateTime::now().coerce(),
                ip,
                user_agent,
            })
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if activation.is_triggered() {
            finalize_document(self, &mut contract).await;
        }

        Ok(contract)
    }
}

/// Error of [`SignContractAsClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not the client party of the [`Contract`].
    #[display("`User(id: {_0})` is not the client party of the `Contract`")]
    NotClientOfContract(#[error(not(source))] user::Id),

    /// [`Contract`] cannot be signed anymore.
    #[display("`Contract` cannot be signed: {_0}")]
    #[from]
    Signing(contract::SigningError),
}
