//! [`Command`] for signing a [`Contract`] as its agent party.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract::{self, signature, Signature},
        user, Contract, User,
    },
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for signing a [`Contract`] as its agent party.
///
/// Agents don't submit a signature payload: the one stored in their profile
/// is applied by reference.
#[derive(Clone, Debug)]
pub struct SignContractAsAgent {
    /// ID of the [`Contract`] to sign.
    pub contract_id: contract::Id,

    /// ID of the [`User`] signing as the agent party.
    pub agent_id: user::Id,

    /// IP address the signing request originated from.
    pub ip: Option<signature::IpAddress>,

    /// User agent the signing request originated from.
    pub user_agent: Option<signature::UserAgent>,
}

impl<Db> Command<SignContractAsAgent> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
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
        cmd: SignContractAsAgent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignContractAsAgent {
            contract_id,
            agent_id,
            ip,
            user_agent,
        } = cmd;

        let agent = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(agent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(agent_id))
            .map_err(tracerr::wrap!())?;
        let stored = agent
            .active_signature()
            .ok_or(E::SignatureNotConfigured(agent_id))
            .map_err(tracerr::wrap!())?;

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
        if contract.agent_id != agent_id {
            return Err(tracerr::new!(E::NotAgentOfContract(agent_id)));
        }

        let activation = contract
            .sign_as_agent(Signature {
                kind: stored.kind,
                image: stored.image.clone(),
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

/// Renders the final signed document of the just activated [`Contract`] and
/// stores its URL, best-effort.
pub(super) async fn finalize_document<Db>(
    service: &Service<Db>,
    contract: &mut Contract,
) where
    Db: Database<
        Update<read::contract::Document>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    match service
        .collaborators()
        .document_renderer
        .render(contract)
        .await
    {
        Ok(url) => {
            contract.signed_document_url = Some(url.clone());
            // URL-only patch: signatures and status may have moved on since
            // the snapshot was committed.
            if let Err(e) = service
                .database()
                .execute(Update(read::contract::Document {
                    id: contract.id,
                    url,
                }))
                .await
            {
                log::warn!(
                    "failed to store the signed document URL of \
                     `Contract(id: {id})`: {e}",
                    id = contract.id,
                );
            }
        }
        Err(e) => {
            log::warn!(
                "failed to render the signed document of \
                 `Contract(id: {id})`: {e}",
                id = contract.id,
            );
        }
    }
}

/// Error of [`SignContractAsAgent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not the agent party of the [`Contract`].
    #[display("`User(id: {_0})` is not the agent party of the `Contract`")]
    NotAgentOfContract(#[error(not(source))] user::Id),

    /// [`User`] has no active profile signature.
    #[display("`User(id: {_0})` has no active profile signature")]
    SignatureNotConfigured(#[error(not(source))] user::Id),

    /// [`Contract`] cannot be signed anymore.
    #[display("`Contract` cannot be signed: {_0}")]
    #[from]
    Signing(contract::SigningError),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
