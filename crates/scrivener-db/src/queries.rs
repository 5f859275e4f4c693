use crate::Database;
use crate::models::{CreateOutcome, CredentialRow, TextRow};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, ToSql, Transaction, TransactionBehavior};
use scrivener_crypto::keys::generate_technical_token;
use scrivener_crypto::unix_now;
use scrivener_types::models::TextKind;
use tracing::{debug, info};

const USER_COLUMNS: &str = "id, login, email, password, technical_token, role";

impl Database {
    // -- Users --

    /// Register a login. The existence check and the insert run in one
    /// immediate transaction under the connection lock, so two concurrent
    /// registrations of the same login cannot both succeed.
    pub fn create_user(&self, login: &str, email: &str, password: &str) -> Result<CreateOutcome> {
        let token = generate_technical_token();
        let now = unix_now();

        self.with_conn_mut(|conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

            if query_user(&tx, "login", &login)?.is_some() {
                return Ok(CreateOutcome::DuplicateLogin);
            }

            // Ids are creation seconds, bumped past the newest id so that
            // same-second registrations stay unique.
            let last: Option<i64> = tx.query_row("SELECT MAX(id) FROM users", [], |row| row.get(0))?;
            let id = last.map_or(now, |last| now.max(last + 1));

            let inserted = tx.execute(
                "INSERT INTO users (id, login, email, password, technical_token) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, login, email, password, &token],
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation
                        && query_user(&tx, "login", &login)?.is_some() =>
                {
                    return Ok(CreateOutcome::DuplicateLogin);
                }
                Err(e) => return Err(e.into()),
            }

            let row = query_user(&tx, "id", &id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", id))?;
            tx.commit()?;

            info!("Registered user {} ({})", row.login, row.id);
            Ok(CreateOutcome::Created(row))
        })
    }

    pub fn find_user_by_login(&self, login: &str) -> Result<Option<CredentialRow>> {
        self.with_conn(|conn| query_user(conn, "login", &login))
    }

    pub fn find_user_by_token(&self, token: &str) -> Result<Option<CredentialRow>> {
        self.with_conn(|conn| query_user(conn, "technical_token", &token))
    }

    /// Every credential, oldest first. Signature schemes that hash the
    /// technical token can only be resolved by trying each one.
    pub fn list_users(&self) -> Result<Vec<CredentialRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Texts --

    pub fn put_text(&self, owner_id: i64, kind: TextKind, content: &str) -> Result<i64> {
        self.put_text_at(owner_id, kind, content, unix_now())
    }

    /// Store a text with an explicit creation second, which becomes its id.
    pub fn put_text_at(&self, owner_id: i64, kind: TextKind, content: &str, created_at: i64) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO texts (id, owner_id, kind, content) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![created_at, owner_id, kind.as_str(), content],
            )?;
            debug!("Stored {} text {} for user {}", kind, created_at, owner_id);
            Ok(created_at)
        })
    }

    /// Content of the first text with this id (lowest insertion order).
    pub fn get_text(&self, owner_id: i64, kind: TextKind, id: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT content FROM texts
                 WHERE owner_id = ?1 AND kind = ?2 AND id = ?3
                 ORDER BY seq LIMIT 1",
                rusqlite::params![owner_id, kind.as_str(), id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// All texts of one kind for an owner, ordered by id.
    pub fn list_texts(&self, owner_id: i64, kind: TextKind) -> Result<Vec<TextRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, id, owner_id, kind, content FROM texts
                 WHERE owner_id = ?1 AND kind = ?2
                 ORDER BY id, seq",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![owner_id, kind.as_str()], |row| {
                    Ok(TextRow {
                        seq: row.get(0)?,
                        id: row.get(1)?,
                        owner_id: row.get(2)?,
                        kind: row.get(3)?,
                        content: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Remove the first text with this id. Returns whether anything was removed.
    pub fn delete_text(&self, owner_id: i64, kind: TextKind, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM texts WHERE seq = (
                     SELECT seq FROM texts
                     WHERE owner_id = ?1 AND kind = ?2 AND id = ?3
                     ORDER BY seq LIMIT 1
                 )",
                rusqlite::params![owner_id, kind.as_str(), id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Replace the content of the first text with this id.
    pub fn update_text(&self, owner_id: i64, kind: TextKind, id: i64, content: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE texts SET content = ?4 WHERE seq = (
                     SELECT seq FROM texts
                     WHERE owner_id = ?1 AND kind = ?2 AND id = ?3
                     ORDER BY seq LIMIT 1
                 )",
                rusqlite::params![owner_id, kind.as_str(), id, content],
            )?;
            Ok(changed > 0)
        })
    }
}

/// `column` is always one of our own literals, never user input.
fn query_user(conn: &Connection, column: &str, value: &dyn ToSql) -> Result<Option<CredentialRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM users WHERE {} = ?1",
        USER_COLUMNS, column
    ))?;

    stmt.query_row([value], map_user).optional()
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRow> {
    Ok(CredentialRow {
        id: row.get(0)?,
        login: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        technical_token: row.get(4)?,
        role: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn register(db: &Database, login: &str) -> CredentialRow {
        match db.create_user(login, &format!("{}@example.com", login), "Secret-pass1").unwrap() {
            CreateOutcome::Created(row) => row,
            CreateOutcome::DuplicateLogin => panic!("{} already registered", login),
        }
    }

    #[test]
    fn duplicate_login_is_rejected() {
        let db = db();
        let alice = register(&db, "alice");
        assert_eq!(alice.role, "user");
        assert_eq!(alice.password, "Secret-pass1");

        let again = db.create_user("alice", "other@example.com", "x").unwrap();
        assert_eq!(again, CreateOutcome::DuplicateLogin);

        // Logins are case-sensitive.
        register(&db, "Alice");
    }

    #[test]
    fn concurrent_registrations_yield_one_winner() {
        let db = Arc::new(db());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let db = db.clone();
                thread::spawn(move || db.create_user("alice", "a@example.com", "pw").unwrap())
            })
            .collect();

        let outcomes: Vec<CreateOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let created = outcomes
            .iter()
            .filter(|o| matches!(o, CreateOutcome::Created(_)))
            .count();
        assert_eq!(created, 1);
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn ids_and_tokens_are_unique_across_many_registrations() {
        let db = db();
        let rows: Vec<CredentialRow> = (0..1000).map(|i| register(&db, &format!("user{}", i))).collect();

        let tokens: HashSet<&str> = rows.iter().map(|r| r.technical_token.as_str()).collect();
        assert_eq!(tokens.len(), 1000);

        let ids: HashSet<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 1000);
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn lookups_by_login_and_token() {
        let db = db();
        let bob = register(&db, "bob");

        assert_eq!(db.find_user_by_login("bob").unwrap(), Some(bob.clone()));
        assert_eq!(db.find_user_by_token(&bob.technical_token).unwrap(), Some(bob));
        assert_eq!(db.find_user_by_login("nobody").unwrap(), None);
        assert_eq!(db.find_user_by_token("0").unwrap(), None);
    }

    #[test]
    fn text_crud() {
        let db = db();
        let owner = register(&db, "carol").id;

        let id = db.put_text_at(owner, TextKind::Plain, "hello", 100).unwrap();
        assert_eq!(id, 100);
        assert_eq!(db.get_text(owner, TextKind::Plain, 100).unwrap().as_deref(), Some("hello"));

        // Kinds are separate namespaces.
        assert_eq!(db.get_text(owner, TextKind::Encrypted, 100).unwrap(), None);

        assert!(db.update_text(owner, TextKind::Plain, 100, "bye").unwrap());
        assert_eq!(db.get_text(owner, TextKind::Plain, 100).unwrap().as_deref(), Some("bye"));

        assert!(db.delete_text(owner, TextKind::Plain, 100).unwrap());
        assert!(!db.delete_text(owner, TextKind::Plain, 100).unwrap());
        assert!(!db.update_text(owner, TextKind::Plain, 100, "x").unwrap());
        assert_eq!(db.get_text(owner, TextKind::Plain, 100).unwrap(), None);
    }

    #[test]
    fn texts_are_scoped_to_owner() {
        let db = db();
        let alice = register(&db, "alice").id;
        let bob = register(&db, "bob").id;

        db.put_text_at(alice, TextKind::Plain, "mine", 5).unwrap();
        assert_eq!(db.get_text(bob, TextKind::Plain, 5).unwrap(), None);
        assert!(!db.delete_text(bob, TextKind::Plain, 5).unwrap());
        assert!(db.list_texts(bob, TextKind::Plain).unwrap().is_empty());
    }

    #[test]
    fn same_second_texts_resolve_to_first() {
        let db = db();
        let owner = register(&db, "dave").id;

        db.put_text_at(owner, TextKind::Encrypted, "first", 42).unwrap();
        db.put_text_at(owner, TextKind::Encrypted, "second", 42).unwrap();
        db.put_text_at(owner, TextKind::Encrypted, "earlier", 41).unwrap();

        assert_eq!(db.get_text(owner, TextKind::Encrypted, 42).unwrap().as_deref(), Some("first"));

        let listed: Vec<(i64, String)> = db
            .list_texts(owner, TextKind::Encrypted)
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.content))
            .collect();
        assert_eq!(
            listed,
            vec![(41, "earlier".into()), (42, "first".into()), (42, "second".into())]
        );

        // Deleting removes only the first match.
        assert!(db.delete_text(owner, TextKind::Encrypted, 42).unwrap());
        assert_eq!(db.get_text(owner, TextKind::Encrypted, 42).unwrap().as_deref(), Some("second"));
    }
}
