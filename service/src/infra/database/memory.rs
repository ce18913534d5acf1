//! In-memory [`Database`] implementation.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::Arc,
};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        commission, contract, contract_utility, guarantor, increase, index,
        payment, property, user, utility, Commission, Contract,
        ContractUtility, Guarantor, Increase, Index, Payment, Property, User,
        Utility,
    },
    infra::{database, Database},
    read::Referenced,
};

/// In-memory [`Database`].
///
/// Transactions operate on a snapshot of the whole [`State`], written back on
/// [`Commit`], while holding the exclusive access to it.
#[derive(Clone, Debug, Default)]
pub struct Memory<S = NonTx>(S);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Memory`] database holding the provided [`State`].
    #[must_use]
    pub fn with_state(state: State) -> Self {
        Self(NonTx(Arc::new(Mutex::new(state))))
    }

    /// Returns a snapshot of the current [`State`] of this [`Memory`] database.
    pub async fn state(&self) -> State {
        self.0 .0.lock().await.clone()
    }

    /// Modifies the current [`State`] of this [`Memory`] database directly.
    pub async fn seed(&self, f: impl FnOnce(&mut State)) {
        f(&mut *self.0 .0.lock().await);
    }
}

/// Data stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Known [`User`]s.
    pub users: HashMap<user::Id, User>,

    /// Granted [`user::Role`]s.
    pub roles: HashSet<user::RoleBinding>,

    /// Known [`Property`]s.
    pub properties: HashMap<property::Id, Property>,

    /// Adjustment [`Index`] catalog.
    pub indices: HashMap<index::Id, Index>,

    /// [`Utility`] catalog.
    pub utilities: HashMap<utility::Id, Utility>,

    /// Stored [`Contract`]s.
    pub contracts: HashMap<contract::Id, Contract>,

    /// Stored [`Increase`]s.
    pub increases: HashMap<increase::Id, Increase>,

    /// Stored [`ContractUtility`]s.
    pub contract_utilities: HashMap<contract_utility::Id, ContractUtility>,

    /// Stored [`contract_utility::Increase`]s.
    pub utility_increases:
        HashMap<contract_utility::increase::Id, contract_utility::Increase>,

    /// Stored [`Commission`]s.
    pub commissions: HashMap<commission::Id, Commission>,

    /// Stored [`Payment`]s.
    pub payments: HashMap<payment::Id, Payment>,

    /// Stored [`Guarantor`]s.
    pub guarantors: HashMap<guarantor::Id, Guarantor>,

    /// Links between [`Guarantor`]s and [`Contract`]s.
    pub links: HashSet<guarantor::Link>,

    /// [`User`]s whose lookups fail with [`Error::UserUnreachable`].
    pub unreachable_users: HashSet<user::Id>,
}

impl State {
    /// Removes the [`Contract`] with the provided ID along with everything it
    /// owns.
    fn remove_contract(&mut self, id: contract::Id) {
        _ = self.contracts.remove(&id);
        _ = remove_where(&mut self.increases, |i| i.contract_id == id);
        _ = self.remove_contract_utilities(id);
        _ = remove_where(&mut self.commissions, |c| c.contract_id == id);
        _ = remove_where(&mut self.payments, |p| p.contract_id == id);
        self.links.retain(|l| l.contract_id != id);
    }

    /// Removes all the [`ContractUtility`]s of the [`Contract`] with the
    /// provided ID along with everything they own, returning their number.
    fn remove_contract_utilities(&mut self, id: contract::Id) -> u64 {
        let ids = self
            .contract_utilities
            .values()
            .filter(|u| u.contract_id == id)
            .map(|u| u.id)
            .collect::<Vec<_>>();
        ids.iter().map(|id| self.remove_contract_utility(*id)).sum()
    }

    /// Removes the [`ContractUtility`] with the provided ID along with
    /// everything it owns, returning the number of removed
    /// [`ContractUtility`]s.
    fn remove_contract_utility(&mut self, id: contract_utility::Id) -> u64 {
        _ = remove_where(&mut self.utility_increases, |i| {
            i.contract_utility_id == id
        });
        _ = remove_where(&mut self.payments, |p| {
            p.concept.contract_utility_id() == Some(id)
        });
        u64::from(self.contract_utilities.remove(&id).is_some())
    }

    /// Removes the [`Commission`] with the provided ID along with its
    /// [`Payment`]s.
    fn remove_commission(&mut self, id: commission::Id) {
        _ = remove_where(&mut self.payments, |p| {
            p.concept.commission_id() == Some(id)
        });
        _ = self.commissions.remove(&id);
    }
}

/// Removes the values matching the provided predicate from the `map`,
/// returning their number.
fn remove_where<K, V>(
    map: &mut HashMap<K, V>,
    mut pred: impl FnMut(&V) -> bool,
) -> u64 {
    let mut removed = 0;
    map.retain(|_, v| {
        let hit = pred(v);
        if hit {
            removed += 1;
        }
        !hit
    });
    removed
}

/// Clones the provided values sorted by the given key.
fn sorted<'a, T, K, I>(values: I, key: impl FnMut(&T) -> K) -> Vec<T>
where
    T: Clone + 'a,
    K: Ord,
    I: IntoIterator<Item = &'a T>,
{
    let mut values = values.into_iter().cloned().collect::<Vec<_>>();
    values.sort_by_key(key);
    values
}

/// Non-transactional access to a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct NonTx(Arc<Mutex<State>>);

/// Transactional access to a [`Memory`] database.
#[derive(Clone, Debug)]
pub struct Tx(Arc<Mutex<Option<Staged>>>);

/// Snapshot of a [`State`] modified by a [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusive access to the committed [`State`].
    committed: OwnedMutexGuard<State>,

    /// Modified copy of the committed [`State`].
    state: State,
}

/// Storage of a [`Memory`] database.
pub trait Store {
    /// Executes the provided function upon the stored [`State`].
    ///
    /// # Errors
    ///
    /// If the [`State`] is not accessible anymore.
    fn with<F, R>(
        &self,
        f: F,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>
    where
        F: FnOnce(&mut State) -> R;
}

impl Store for NonTx {
    async fn with<F, R>(&self, f: F) -> Result<R, Traced<database::Error>>
    where
        F: FnOnce(&mut State) -> R,
    {
        Ok(f(&mut *self.0.lock().await))
    }
}

impl Store for Tx {
    async fn with<F, R>(&self, f: F) -> Result<R, Traced<database::Error>>
    where
        F: FnOnce(&mut State) -> R,
    {
        let mut staged = self.0.lock().await;
        let staged = staged
            .as_mut()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)?;
        Ok(f(&mut staged.state))
    }
}

/// [`Memory`] database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Tx`] is used after being committed.
    #[display("Transaction is already finished")]
    TxFinished,

    /// [`User`] is listed in [`State::unreachable_users`].
    #[display("`User(id: {_0})` is unreachable")]
    UserUnreachable(#[error(not(source))] user::Id),
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let committed = Arc::clone(&self.0 .0).lock_owned().await;
        let state = committed.clone();
        Ok(Memory(Tx(Arc::new(Mutex::new(Some(Staged {
            committed,
            state,
        }))))))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Staged {
            mut committed,
            state,
        } = self
            .0
             .0
            .lock()
            .await
            .take()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)?;
        *committed = state;
        Ok(())
    }
}

impl<S: Store> Database<Select<By<Option<User>, user::Id>>> for Memory<S> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|s| {
                if s.unreachable_users.contains(&id) {
                    return Err(Error::UserUnreachable(id));
                }
                Ok(s.users.get(&id).cloned())
            })
            .await?
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)
    }
}

/// Implements [`Database`] operations for [`Memory`] with the provided
/// closures over its [`State`].
macro_rules! impl_memory {
    ($(
        $op:ty => $ok:ty, |$state:ident, $arg:pat_param| $body:expr;
    )*) => {$(
        impl<S: Store> Database<$op> for Memory<S> {
            type Ok = $ok;
            type Err = Traced<database::Error>;

            async fn execute(&self, $arg: $op) -> Result<Self::Ok, Self::Err> {
                self.0.with(move |$state| $body).await
            }
        }
    )*};
}

impl_memory! {
    // Users and properties.
    Insert<user::RoleBinding> => (), |s, Insert(binding)| {
        _ = s.roles.insert(binding);
    };
    Delete<user::RoleBinding> => (), |s, Delete(binding)| {
        _ = s.roles.remove(&binding);
    };
    Select<By<Option<Property>, property::Id>> => Option<Property>,
    |s, Select(by)| {
        s.properties.get(&by.into_inner()).copied()
    };
    Update<Property> => (), |s, Update(property)| {
        _ = s.properties.insert(property.id, property);
    };

    // Catalogs.
    Select<By<Option<Index>, index::Id>> => Option<Index>, |s, Select(by)| {
        s.indices.get(&by.into_inner()).cloned()
    };
    Select<By<Option<Index>, index::Code>> => Option<Index>,
    |s, Select(by)| {
        let code = by.into_inner();
        s.indices.values().find(|i| i.code == code).cloned()
    };
    Select<By<Referenced<Index>, index::Id>> => bool, |s, Select(by)| {
        let id = by.into_inner();
        s.contracts.values().any(|c| c.adjustment_index_id == id)
            || s.increases.values().any(|i| i.index_id == id)
    };
    Insert<Index> => (), |s, Insert(index)| {
        _ = s.indices.insert(index.id, index);
    };
    Delete<By<Index, index::Id>> => (), |s, Delete(by)| {
        _ = s.indices.remove(&by.into_inner());
    };
    Select<By<Option<Utility>, utility::Id>> => Option<Utility>,
    |s, Select(by)| {
        s.utilities.get(&by.into_inner()).cloned()
    };
    Select<By<Option<Utility>, utility::Name>> => Option<Utility>,
    |s, Select(by)| {
        let name = by.into_inner();
        s.utilities.values().find(|u| u.name.eq_ignore_case(&name)).cloned()
    };
    Select<By<Referenced<Utility>, utility::Id>> => bool, |s, Select(by)| {
        let id = by.into_inner();
        s.contract_utilities.values().any(|u| u.utility_id == id)
    };
    Insert<Utility> => (), |s, Insert(utility)| {
        _ = s.utilities.insert(utility.id, utility);
    };
    Delete<By<Utility, utility::Id>> => (), |s, Delete(by)| {
        _ = s.utilities.remove(&by.into_inner());
    };

    // Contracts.
    Select<By<Option<Contract>, contract::Id>> => Option<Contract>,
    |s, Select(by)| {
        s.contracts.get(&by.into_inner()).cloned()
    };
    Select<By<Vec<Contract>, user::Id>> => Vec<Contract>, |s, Select(by)| {
        let id = by.into_inner();
        sorted(
            s.contracts.values().filter(|c| c.user_id == id),
            |c| c.start_date,
        )
    };
    Select<By<Vec<Contract>, contract::Status>> => Vec<Contract>,
    |s, Select(by)| {
        let status = by.into_inner();
        sorted(
            s.contracts.values().filter(|c| c.status == status),
            |c| c.end_date,
        )
    };
    Select<By<Vec<Contract>, property::Id>> => Vec<Contract>,
    |s, Select(by)| {
        let id = by.into_inner();
        sorted(
            s.contracts.values().filter(|c| c.property_id == id),
            |c| c.start_date,
        )
    };
    Select<By<Vec<Contract>, contract::Kind>> => Vec<Contract>,
    |s, Select(by)| {
        let kind = by.into_inner();
        sorted(
            s.contracts.values().filter(|c| c.kind == kind),
            |c| c.start_date,
        )
    };
    Select<By<Vec<Contract>, contract::Period>> => Vec<Contract>,
    |s, Select(by)| {
        let period = by.into_inner();
        sorted(
            s.contracts.values().filter(|c| period.contains(c)),
            |c| c.start_date,
        )
    };
    Insert<Contract> => (), |s, Insert(contract)| {
        _ = s.contracts.insert(contract.id, contract);
    };
    Delete<By<Contract, contract::Id>> => (), |s, Delete(by)| {
        s.remove_contract(by.into_inner());
    };
    Lock<By<Contract, contract::Id>> => (), |_s, Lock(_)| ();

    // Increases.
    Select<By<Option<Increase>, increase::Id>> => Option<Increase>,
    |s, Select(by)| {
        s.increases.get(&by.into_inner()).cloned()
    };
    Select<By<Vec<Increase>, contract::Id>> => Vec<Increase>,
    |s, Select(by)| {
        let id = by.into_inner();
        sorted(s.increases.values().filter(|i| i.contract_id == id), |i| i.date)
    };
    Insert<Increase> => (), |s, Insert(increase)| {
        _ = s.increases.insert(increase.id, increase);
    };
    Delete<By<Increase, increase::Id>> => (), |s, Delete(by)| {
        _ = s.increases.remove(&by.into_inner());
    };
    Delete<By<Vec<Increase>, contract::Id>> => u64, |s, Delete(by)| {
        let id = by.into_inner();
        remove_where(&mut s.increases, |i| i.contract_id == id)
    };

    // Contract utilities.
    Select<By<Option<ContractUtility>, contract_utility::Id>>
        => Option<ContractUtility>,
    |s, Select(by)| {
        s.contract_utilities.get(&by.into_inner()).cloned()
    };
    Select<By<Vec<ContractUtility>, contract::Id>> => Vec<ContractUtility>,
    |s, Select(by)| {
        let id = by.into_inner();
        sorted(
            s.contract_utilities.values().filter(|u| u.contract_id == id),
            |u| u.last_paid_date,
        )
    };
    Select<By<Vec<ContractUtility>, ()>> => Vec<ContractUtility>,
    |s, Select(_)| {
        sorted(s.contract_utilities.values(), |u| u.last_paid_date)
    };
    Insert<ContractUtility> => (), |s, Insert(utility)| {
        _ = s.contract_utilities.insert(utility.id, utility);
    };
    Delete<By<ContractUtility, contract_utility::Id>> => (),
    |s, Delete(by)| {
        _ = s.remove_contract_utility(by.into_inner());
    };
    Delete<By<Vec<ContractUtility>, contract::Id>> => u64, |s, Delete(by)| {
        s.remove_contract_utilities(by.into_inner())
    };
    Select<By<
        Option<contract_utility::Increase>,
        contract_utility::increase::Id,
    >> => Option<contract_utility::Increase>,
    |s, Select(by)| {
        s.utility_increases.get(&by.into_inner()).cloned()
    };
    Select<By<Vec<contract_utility::Increase>, contract_utility::Id>>
        => Vec<contract_utility::Increase>,
    |s, Select(by)| {
        let id = by.into_inner();
        sorted(
            s.utility_increases
                .values()
                .filter(|i| i.contract_utility_id == id),
            |i| i.date,
        )
    };
    Insert<contract_utility::Increase> => (), |s, Insert(increase)| {
        _ = s.utility_increases.insert(increase.id, increase);
    };
    Delete<By<contract_utility::Increase, contract_utility::increase::Id>>
        => (),
    |s, Delete(by)| {
        _ = s.utility_increases.remove(&by.into_inner());
    };

    // Commissions.
    Select<By<Option<Commission>, commission::Id>> => Option<Commission>,
    |s, Select(by)| {
        s.commissions.get(&by.into_inner()).cloned()
    };
    Select<By<Vec<Commission>, contract::Id>> => Vec<Commission>,
    |s, Select(by)| {
        let id = by.into_inner();
        sorted(
            s.commissions.values().filter(|c| c.contract_id == id),
            |c| c.date,
        )
    };
    Select<By<Vec<Commission>, commission::Filter>> => Vec<Commission>,
    |s, Select(by)| {
        let filter = by.into_inner();
        sorted(
            s.commissions.values().filter(|c| c.matches(&filter)),
            |c| c.date,
        )
    };
    Insert<Commission> => (), |s, Insert(commission)| {
        _ = s.commissions.insert(commission.id, commission);
    };
    Delete<By<Commission, commission::Id>> => (), |s, Delete(by)| {
        s.remove_commission(by.into_inner());
    };
    Delete<By<Vec<Commission>, contract::Id>> => u64, |s, Delete(by)| {
        let id = by.into_inner();
        let ids = s
            .commissions
            .values()
            .filter(|c| c.contract_id == id)
            .map(|c| c.id)
            .collect::<Vec<_>>();
        for id in &ids {
            s.remove_commission(*id);
        }
        ids.len() as u64
    };

    // Payments.
    Select<By<Option<Payment>, payment::Id>> => Option<Payment>,
    |s, Select(by)| {
        s.payments.get(&by.into_inner()).cloned()
    };
    Select<By<Vec<Payment>, contract::Id>> => Vec<Payment>, |s, Select(by)| {
        let id = by.into_inner();
        sorted(s.payments.values().filter(|p| p.contract_id == id), |p| p.date)
    };
    Insert<Payment> => (), |s, Insert(payment)| {
        _ = s.payments.insert(payment.id, payment);
    };
    Delete<By<Payment, payment::Id>> => (), |s, Delete(by)| {
        _ = s.payments.remove(&by.into_inner());
    };

    // Guarantors.
    Select<By<Option<Guarantor>, guarantor::Id>> => Option<Guarantor>,
    |s, Select(by)| {
        s.guarantors.get(&by.into_inner()).cloned()
    };
    Select<By<Option<Guarantor>, user::Email>> => Option<Guarantor>,
    |s, Select(by)| {
        let email = by.into_inner();
        s.guarantors.values().find(|g| g.email == email).cloned()
    };
    Select<By<Option<Guarantor>, guarantor::Phone>> => Option<Guarantor>,
    |s, Select(by)| {
        let phone = by.into_inner();
        s.guarantors.values().find(|g| g.phone == phone).cloned()
    };
    Select<By<Vec<Guarantor>, contract::Id>> => Vec<Guarantor>,
    |s, Select(by)| {
        let id = by.into_inner();
        sorted(
            s.links
                .iter()
                .filter(|l| l.contract_id == id)
                .filter_map(|l| s.guarantors.get(&l.guarantor_id)),
            |g| g.name.to_string(),
        )
    };
    Select<By<Referenced<Guarantor>, guarantor::Id>> => bool,
    |s, Select(by)| {
        let id = by.into_inner();
        s.links.iter().any(|l| l.guarantor_id == id)
    };
    Insert<Guarantor> => (), |s, Insert(guarantor)| {
        _ = s.guarantors.insert(guarantor.id, guarantor);
    };
    Delete<By<Guarantor, guarantor::Id>> => (), |s, Delete(by)| {
        let id = by.into_inner();
        s.links.retain(|l| l.guarantor_id != id);
        _ = s.guarantors.remove(&id);
    };
    Lock<By<Guarantor, guarantor::Id>> => (), |_s, Lock(_)| ();
    Insert<guarantor::Link> => bool, |s, Insert(link)| s.links.insert(link);
    Delete<guarantor::Link> => bool, |s, Delete(link)| s.links.remove(&link);
}
