//! [`Command`] for creating a new [`Contract`].

use common::{
    operations::{
        By, Commit, Insert, Notify, Select, Transact, Transacted, Update,
    },
    Money,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{
        contract, index, property, user, Contract, Index, Note, Property, User,
    },
    infra::{database, notifier, Database, Notifier},
    notice, Classified, Failure, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Contract`].
#[derive(Clone, Debug)]
pub struct CreateContract {
    /// ID of the tenant [`User`].
    pub user_id: user::Id,

    /// ID of the rented [`Property`].
    pub property_id: Option<property::Id>,

    /// [`contract::Kind`] of the new [`Contract`].
    pub kind: contract::Kind,

    /// [`Date`] the new [`Contract`] starts at.
    ///
    /// [`Date`]: common::Date
    pub start_date: contract::StartDate,

    /// [`Date`] the new [`Contract`] ends at.
    ///
    /// [`Date`]: common::Date
    pub end_date: contract::EndDate,

    /// Rent amount the new [`Contract`] starts with.
    pub initial_amount: Money,

    /// ID of the [`Index`] rent adjustments are computed from.
    pub adjustment_index_id: index::Id,

    /// Number of months between rent adjustments.
    pub adjustment_frequency: contract::Frequency,

    /// Amount of the last recorded rent payment.
    pub last_paid_amount: Option<Decimal>,

    /// [`Date`] of the last recorded rent payment.
    ///
    /// [`Date`]: common::Date
    pub last_paid_date: Option<contract::PaymentDate>,

    /// Free-text [`Note`] about the new [`Contract`].
    pub note: Option<Note>,

    /// Indicator whether a security deposit is taken.
    pub has_deposit: bool,

    /// Amount of the security deposit.
    pub deposit_amount: Option<Decimal>,

    /// Free-text [`Note`] about the security deposit.
    pub deposit_note: Option<Note>,
}

impl<Db, Ntf> Command<CreateContract> for Service<Db, Ntf>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Index>, index::Id>>,
            Ok = Option<Index>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Insert<user::RoleBinding>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Ntf: Notifier<
        Notify<notice::NewContract>,
        Ok = (),
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            user_id,
            property_id,
            kind,
            start_date,
            end_date,
            initial_amount,
            adjustment_index_id,
            adjustment_frequency,
            last_paid_amount,
            last_paid_date,
            note,
            has_deposit,
            deposit_amount,
            deposit_note,
        } = cmd;

        let property_id = property_id
            .ok_or(E::PropertyMissing)
            .map_err(tracerr::wrap!())?;
        let deposit = contract::Deposit::from_parts(
            has_deposit,
            deposit_amount,
            deposit_note,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let contract = Contract {
            id: contract::Id::new(),
            user_id,
            property_id,
            kind,
            start_date,
            end_date,
            status: contract::Status::Active,
            initial_amount,
            adjustment_index_id,
            adjustment_frequency,
            last_paid_amount,
            last_paid_date,
            note,
            deposit,
        };
        contract
            .validate()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Select(By::<Option<Index>, _>::new(adjustment_index_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::IndexNotExists(adjustment_index_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tenant = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if property.status != property::Status::Available {
            return Err(tracerr::new!(E::PropertyNotAvailable(
                property_id,
                property.status,
            )));
        }
        property.status = property::Status::Rented;

        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Update(property))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Insert(user::RoleBinding::tenant(tenant.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = self
            .notify(notice::NewContract {
                to: tenant.email,
                first_name: tenant.first_name,
                contract_id: contract.id,
                start_date: contract.start_date.coerce(),
                end_date: contract.end_date.coerce(),
                initial_amount: contract.initial_amount,
                adjustment_frequency: contract.adjustment_frequency.months(),
            })
            .await;

        Ok(contract)
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Index`] with the provided ID does not exist.
    #[display("`Index(id: {_0})` does not exist")]
    IndexNotExists(#[error(not(source))] index::Id),

    /// [`Contract`] violates its invariants.
    #[display("Invalid `Contract`: {_0}")]
    #[from]
    Invalid(contract::Violation),

    /// [`Property`] is not available for renting.
    #[display("`Property(id: {_0})` is not available, but `{_1}`")]
    PropertyNotAvailable(property::Id, property::Status),

    /// [`Property`] ID is not provided.
    #[display("`Property` ID is required")]
    PropertyMissing,

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

impl Classified for ExecutionError {
    fn failure(&self) -> Failure {
        match self {
            Self::Db(e) => e.failure(),
            Self::IndexNotExists(_)
            | Self::PropertyNotExists(_)
            | Self::UserNotExists(_) => Failure::NotFound,
            Self::Invalid(_)
            | Self::PropertyMissing
            | Self::PropertyNotAvailable(..) => Failure::BadRequest,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};
    use rust_decimal::Decimal;

    use crate::{
        domain::{contract, index, property, user},
        spec::{date, Fixture},
        Classified as _, Command as _, Failure,
    };

    use super::CreateContract;

    fn request(f: &Fixture) -> CreateContract {
        CreateContract {
            user_id: f.tenant.id,
            property_id: Some(f.property.id),
            kind: contract::Kind::Housing,
            start_date: date("2024-03-01").coerce(),
            end_date: date("2026-03-01").coerce(),
            initial_amount: Money {
                amount: Decimal::from(350_000),
                currency: Currency::Ars,
            },
            adjustment_index_id: f.index.id,
            adjustment_frequency: contract::Frequency::new(3).unwrap(),
            last_paid_amount: None,
            last_paid_date: None,
            note: None,
            has_deposit: true,
            deposit_amount: Some(Decimal::from(1000)),
            deposit_note: None,
        }
    }

    #[tokio::test]
    async fn creates_contract_with_deposit() {
        let f = Fixture::new().await;

        let c = f.service.execute(request(&f)).await.unwrap();

        assert_eq!(c.status, contract::Status::Active);
        assert_eq!(
            c.deposit.as_ref().map(|d| d.amount),
            Some(Decimal::from(1000)),
        );
        assert_eq!(f.stored(c.id).await, Some(c.clone()));
        assert_eq!(f.property_status().await, property::Status::Rented);
        assert!(f.is_tenant(f.tenant.id).await);

        let sent = f.notifier.sent_with("contract.created").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, f.tenant.email);
    }

    #[tokio::test]
    async fn rejects_inconsistent_deposit() {
        let f = Fixture::new().await;

        let missing = CreateContract {
            deposit_amount: None,
            ..request(&f)
        };
        let err = f.service.execute(missing).await.unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        let unexpected = CreateContract {
            has_deposit: false,
            ..request(&f)
        };
        let err = f.service.execute(unexpected).await.unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        assert!(f.state().await.contracts.is_empty());
        assert!(f.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_inverted_period() {
        let f = Fixture::new().await;

        let req = CreateContract {
            end_date: date("2024-03-01").coerce(),
            ..request(&f)
        };
        let err = f.service.execute(req).await.unwrap_err();

        assert_eq!(err.failure(), Failure::BadRequest);
        assert!(f.state().await.contracts.is_empty());
    }

    #[tokio::test]
    async fn requires_property() {
        let f = Fixture::new().await;

        let req = CreateContract {
            property_id: None,
            ..request(&f)
        };
        let err = f.service.execute(req).await.unwrap_err();
        assert_eq!(err.failure(), Failure::BadRequest);

        let req = CreateContract {
            property_id: Some(property::Id::new()),
            ..request(&f)
        };
        let err = f.service.execute(req).await.unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);
    }

    #[tokio::test]
    async fn requires_existing_references() {
        let f = Fixture::new().await;

        let req = CreateContract {
            adjustment_index_id: index::Id::new(),
            ..request(&f)
        };
        let err = f.service.execute(req).await.unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        let req = CreateContract {
            user_id: user::Id::new(),
            ..request(&f)
        };
        let err = f.service.execute(req).await.unwrap_err();
        assert_eq!(err.failure(), Failure::NotFound);

        assert!(f.state().await.contracts.is_empty());
        assert_eq!(f.property_status().await, property::Status::Available);
    }

    #[tokio::test]
    async fn requires_available_property() {
        let f = Fixture::new().await;
        _ = f.service.execute(request(&f)).await.unwrap();

        let err = f.service.execute(request(&f)).await.unwrap_err();

        assert_eq!(err.failure(), Failure::BadRequest);
        assert_eq!(f.state().await.contracts.len(), 1);
    }
}
