//! Session transaction control.
//!
//! A session is either idle or holds one open transaction. While one is open every
//! statement the session runs goes through it.
//!
//! For ergonomic commit/rollback handling, use the [`transaction!`](crate::transaction) macro.

use super::Session;
use crate::client::{Connection, Transaction};
use crate::error::{OrmError, OrmResult};

impl<C: Connection> Session<C> {
    /// Open a transaction.
    ///
    /// Fails if one is already open; the session stays idle if the driver cannot start one.
    pub async fn begin(&mut self) -> OrmResult<()> {
        if self.tx.is_some() {
            return Err(OrmError::Transaction(
                "a transaction is already active".to_string(),
            ));
        }
        tracing::info!(target: "tinyorm.tx", "transaction begin");
        let tx = self.conn.begin().await.inspect_err(|err| {
            tracing::error!(target: "tinyorm.tx", error = %err, "transaction begin failed");
        })?;
        self.tx = Some(tx);
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// If the server rejects the commit and keeps the transaction open, the session stays
    /// in it; call [`rollback`](Self::rollback) (or retry) to leave it.
    pub async fn commit(&mut self) -> OrmResult<()> {
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| OrmError::Transaction("no active transaction to commit".to_string()))?;
        tracing::info!(target: "tinyorm.tx", "transaction commit");
        let result = tx.commit().await;
        self.release_finished_tx();
        result.inspect_err(|err| {
            tracing::error!(target: "tinyorm.tx", error = %err, "transaction commit failed");
        })
    }

    /// Roll back the open transaction.
    pub async fn rollback(&mut self) -> OrmResult<()> {
        let tx = self.tx.as_mut().ok_or_else(|| {
            OrmError::Transaction("no active transaction to roll back".to_string())
        })?;
        tracing::info!(target: "tinyorm.tx", "transaction rollback");
        let result = tx.rollback().await;
        self.release_finished_tx();
        result.inspect_err(|err| {
            tracing::error!(target: "tinyorm.tx", error = %err, "transaction rollback failed");
        })
    }

    fn release_finished_tx(&mut self) {
        if self.tx.as_ref().is_some_and(|tx| !tx.is_active()) {
            self.tx = None;
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }
}

/// Runs the given block inside a session transaction.
///
/// - Begins a transaction via `$session.begin().await`.
/// - Commits on `Ok(_)`; if the commit fails and the transaction is still open, rolls back.
/// - Rolls back on `Err(_)`.
///
/// `$session` must be a `&mut Session`; it is reborrowed as `$s` inside the block.
/// The block must evaluate to `tinyorm::OrmResult<T>`.
///
/// # Example
///
/// ```ignore
/// let count = tinyorm::transaction!(&mut session, s, {
///     s.raw("DELETE FROM User WHERE Age < ?", tinyorm::params![18]).exec().await?;
///     s.model::<User>()?.count().await
/// })?;
/// ```
#[macro_export]
macro_rules! transaction {
    ($session:expr, $s:ident, $body:block) => {{
        let $s = &mut *($session);
        $s.begin().await?;

        let __tinyorm_tx_body_result = async { $body }.await;
        match __tinyorm_tx_body_result {
            Ok(value) => match $s.commit().await {
                Ok(()) => Ok(value),
                Err(error) if $s.in_transaction() => match $s.rollback().await {
                    Ok(()) => Err(error),
                    Err(rollback_err) => Err($crate::OrmError::Other(format!(
                        "{error} (rollback failed: {rollback_err})"
                    ))),
                },
                Err(error) => Err(error),
            },
            Err(error) => match $s.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::dialect::Sqlite3;
    use crate::sqlite::SqliteConnection;
    use std::sync::Arc;

    fn session() -> crate::Session<SqliteConnection> {
        let conn = SqliteConnection::open_in_memory().unwrap();
        crate::Session::new(Arc::new(conn), Arc::new(Sqlite3))
    }

    #[tokio::test]
    async fn state_machine_rejects_misuse() {
        let mut s = session();
        assert!(!s.in_transaction());
        assert!(matches!(s.commit().await, Err(OrmError::Transaction(_))));
        assert!(matches!(s.rollback().await, Err(OrmError::Transaction(_))));

        s.begin().await.unwrap();
        assert!(s.in_transaction());
        assert!(matches!(s.begin().await, Err(OrmError::Transaction(_))));

        s.commit().await.unwrap();
        assert!(!s.in_transaction());
        assert!(matches!(s.commit().await, Err(OrmError::Transaction(_))));
    }

    #[tokio::test]
    async fn macro_commits_and_rolls_back() {
        let mut session = session();
        session
            .raw("CREATE TABLE t (a integer)", [])
            .exec()
            .await
            .unwrap();

        let result: OrmResult<()> = async {
            crate::transaction!(&mut session, s, {
                s.raw("INSERT INTO t (a) VALUES (1)", []).exec().await?;
                Err(OrmError::Other("boom".into()))
            })
        }
        .await;
        assert!(result.is_err());
        assert!(!session.in_transaction());

        let inserted: OrmResult<u64> = async {
            crate::transaction!(&mut session, s, {
                s.raw("INSERT INTO t (a) VALUES (2)", []).exec().await
            })
        }
        .await;
        assert_eq!(inserted.unwrap(), 1);

        let row = session
            .raw("SELECT count(*) FROM t", [])
            .query_row()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get::<i64>(0).unwrap(), 1);
    }
}
