//! [`Command`] for registering a new [`Guarantor`].

use common::operations::{By, Commit, Insert, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{guarantor, user, Guarantor},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for registering a new [`Guarantor`] in the catalog.
#[derive(Clone, Debug)]
pub struct CreateGuarantor {
    /// Full [`guarantor::Name`] of the [`Guarantor`].
    pub name: guarantor::Name,

    /// [`user::Email`] of the [`Guarantor`].
    pub email: user::Email,

    /// [`guarantor::Phone`] of the [`Guarantor`].
    pub phone: guarantor::Phone,
}

impl<Db, Ntf> Command<CreateGuarantor> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Guarantor>, user::Email>>,
            Ok = Option<Guarantor>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Guarantor>, guarantor::Phone>>,
            Ok = Option<Guarantor>,
            Err = Traced<database::Error>,
        > + Database<Insert<Guarantor>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Guarantor;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateGuarantor,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateGuarantor { name, email, phone } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let taken = tx
            .execute(Select(By::<Option<Guarantor>, _>::new(email.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if taken.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let taken = tx
            .execute(Select(By::<Option<Guarantor>, _>::new(phone.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if taken.is_some() {
            return Err(tracerr::new!(E::PhoneOccupied(phone)));
        }

        let guarantor = Guarantor {
            id: guarantor::Id::new(),
            name,
            email,
            phone,
        };
        tx.execute(Insert(guarantor.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(guarantor)
    }
}

/// Error of [`CreateGuarantor`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is occupied by another [`Guarantor`].
    #[display("`Guarantor(email: {_0})` already exists")]
    EmailOccupied(#[error(not(source))] user::Email),

    /// [`guarantor::Phone`] is occupied by another [`Guarantor`].
    #[display("`Guarantor(phone: {_0})` already exists")]
    PhoneOccupied(#[error(not(source))] guarantor::Phone),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::EmailOccupied(_) | Self::PhoneOccupied(_) => {
                Failure::BadRequest
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod spec {
    use crate::{
        domain::{guarantor, user, Guarantor},
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::CreateGuarantor;

    pub(crate) fn request(email: &str, phone: &str) -> CreateGuarantor {
        CreateGuarantor {
            name: guarantor::Name::new("Luis Pérez").unwrap(),
            email: user::Email::new(email).unwrap(),
            phone: guarantor::Phone::new(phone).unwrap(),
        }
    }

    /// Registers a new [`Guarantor`] with the provided contacts.
    pub(crate) async fn seed_guarantor(
        f: &Fixture,
        email: &str,
        phone: &str,
    ) -> Guarantor {
        f.service.execute(request(email, phone)).await.unwrap()
    }

    #[tokio::test]
    async fn registers_guarantor() {
        let f = Fixture::new().await;

        let g =
            seed_guarantor(&f, "luis@mail.example", "+54 11 5555-0001").await;

        assert_eq!(f.state().await.guarantors.get(&g.id), Some(&g));
    }

    #[tokio::test]
    async fn contacts_are_unique() {
        let f = Fixture::new().await;
        _ = seed_guarantor(&f, "luis@mail.example", "+54 11 5555-0001").await;

        let err = f
            .service
            .execute(request("luis@mail.example", "+54 11 5555-0002"))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        let err = f
            .service
            .execute(request("other@mail.example", "+54 11 5555-0001"))
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        assert_eq!(f.state().await.guarantors.len(), 1);
    }
}
