//! [`Notifier`] implementation storing [`Notice`]s into the `notices` outbox
//! table, to be delivered by an external mailer.

use common::operations::Notify;
use postgres_types::Json;
use tracerr::Traced;

use crate::{
    infra::{
        database::{postgres::Connection, Postgres},
        notifier, Notifier,
    },
    notice::Notice,
};

impl<C, N> Notifier<Notify<N>> for Postgres<C>
where
    C: Connection,
    N: Notice,
{
    type Ok = ();
    type Err = Traced<notifier::Error>;

    async fn execute(
        &self,
        Notify(notice): Notify<N>,
    ) -> Result<Self::Ok, Self::Err> {
        let payload = serde_json::to_value(&notice)
            .map_err(tracerr::from_and_wrap!(=> notifier::Error))?;

        const SQL: &str = "\
            INSERT INTO notices (template, recipient, payload) \
            VALUES ($1::VARCHAR, $2::VARCHAR, $3::JSONB)";
        self.exec(SQL, &[&N::TEMPLATE, notice.recipient(), &Json(payload)])
            .await
            .map_err(tracerr::map_from_and_wrap!(=> notifier::Error))
            .map(drop)
    }
}
