//! [`Command`] for replacing an existing [`Guarantor`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{guarantor, user, Guarantor},
    infra::{database, Database},
    Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for replacing the details of an existing [`Guarantor`].
#[derive(Clone, Debug)]
pub struct UpdateGuarantor {
    /// ID of the [`Guarantor`] to be updated.
    pub guarantor_id: guarantor::Id,

    /// New full [`guarantor::Name`].
    pub name: guarantor::Name,

    /// New [`user::Email`].
    pub email: user::Email,

    /// New [`guarantor::Phone`].
    pub phone: guarantor::Phone,
}

impl<Db, Ntf> Command<UpdateGuarantor> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Guarantor, guarantor::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Guarantor>, guarantor::Id>>,
            Ok = Option<Guarantor>,
            Err = Traced<database::Error>,
        > + Database<
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
        cmd: UpdateGuarantor,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateGuarantor {
            guarantor_id: id,
            name,
            email,
            phone,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications.
        tx.execute(Lock(By::<Guarantor, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Select(By::<Option<Guarantor>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::GuarantorNotExists(id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let taken = tx
            .execute(Select(By::<Option<Guarantor>, _>::new(email.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if taken.is_some_and(|g| g.id != id) {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let taken = tx
            .execute(Select(By::<Option<Guarantor>, _>::new(phone.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if taken.is_some_and(|g| g.id != id) {
            return Err(tracerr::new!(E::PhoneOccupied(phone)));
        }

        let guarantor = Guarantor {
            id,
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

/// Error of [`UpdateGuarantor`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is occupied by another [`Guarantor`].
    #[display("`Guarantor(email: {_0})` already exists")]
    EmailOccupied(#[error(not(source))] user::Email),

    /// [`Guarantor`] with the provided ID does not exist.
    #[display("`Guarantor(id: {_0})` does not exist")]
    GuarantorNotExists(#[error(not(source))] guarantor::Id),

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
            Self::GuarantorNotExists(_) => Failure::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::create_guarantor::spec::seed_guarantor,
        domain::{guarantor, user},
        spec::Fixture,
        Classified as _, Command as _, Failure,
    };

    use super::UpdateGuarantor;

    #[tokio::test]
    async fn keeps_own_contacts() {
        let f = Fixture::new().await;
        let g = seed_guarantor(&f, "luis@mail.example", "1111").await;

        let updated = f
            .service
            .execute(UpdateGuarantor {
                guarantor_id: g.id,
                name: guarantor::Name::new("Luis A. Pérez").unwrap(),
                email: g.email.clone(),
                phone: g.phone.clone(),
            })
            .await
            .unwrap();

        assert_eq!(updated.name.to_string(), "Luis A. Pérez");
        assert_eq!(f.state().await.guarantors.get(&g.id), Some(&updated));
    }

    #[tokio::test]
    async fn rejects_contacts_of_others() {
        let f = Fixture::new().await;
        let g = seed_guarantor(&f, "luis@mail.example", "1111").await;
        let other = seed_guarantor(&f, "eva@mail.example", "2222").await;

        let err = f
            .service
            .execute(UpdateGuarantor {
                guarantor_id: g.id,
                name: g.name.clone(),
                email: other.email.clone(),
                phone: g.phone.clone(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        let err = f
            .service
            .execute(UpdateGuarantor {
                guarantor_id: g.id,
                name: g.name.clone(),
                email: g.email.clone(),
                phone: other.phone.clone(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        let err = f
            .service
            .execute(UpdateGuarantor {
                guarantor_id: guarantor::Id::new(),
                name: g.name.clone(),
                email: user::Email::new("new@mail.example").unwrap(),
                phone: guarantor::Phone::new("3333").unwrap(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        assert_eq!(f.state().await.guarantors.get(&g.id), Some(&g));
    }
}
