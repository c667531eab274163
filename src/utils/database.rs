//! Provides the SQLite-backed store for users' named playlists.
//! The scheduler never talks to it directly: commands load a user's mapping,
//! edit it in memory and write the whole mapping back.

use rusqlite::{Connection, params};
use serenity::async_trait;
use serenity::model::id::UserId;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// The default filename for the SQLite database.
pub const APPDATA_DB: &str = "application_data.db";

/// Playlist name to ordered track references.
pub type Playlists = BTreeMap<String, Vec<String>>;

/// Errors raised by playlist storage.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database task failed: {0}")]
    Task(String),

    #[error("Database connection is poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable per-user playlists with load/replace semantics.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// All playlists of `user_id`; empty when the user has none.
    async fn load(&self, user_id: UserId) -> StorageResult<Playlists>;

    /// Replace every playlist of `user_id` with `playlists`, atomically.
    async fn save(&self, user_id: UserId, playlists: &Playlists) -> StorageResult<()>;
}

/// `PlaylistStore` on a single SQLite connection.
#[derive(Clone)]
pub struct SqlitePlaylistStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlaylistStore {
    /// Open (or create) the database file and make sure the tables exist.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened playlist database at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        create_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run blocking SQLite work off the async executor.
    async fn with_conn<T, F>(&self, work: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StorageError::Poisoned)?;
            work(&mut conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

/// Creates the `playlists` and `playlist_tracks` tables if they don't exist.
fn create_tables(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS playlists (
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY (user_id, name)
        );
        CREATE TABLE IF NOT EXISTS playlist_tracks (
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            position INTEGER NOT NULL,
            reference TEXT NOT NULL,
            PRIMARY KEY (user_id, name, position)
        );",
    )?;
    Ok(())
}

fn load_playlists(conn: &Connection, user_id: &str) -> StorageResult<Playlists> {
    let mut playlists = Playlists::new();

    let mut names = conn.prepare("SELECT name FROM playlists WHERE user_id = ?1")?;
    for name in names.query_map([user_id], |row| row.get::<_, String>(0))? {
        playlists.insert(name?, Vec::new());
    }

    let mut tracks = conn.prepare(
        "SELECT name, reference FROM playlist_tracks WHERE user_id = ?1 ORDER BY name, position",
    )?;
    let rows = tracks.query_map([user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (name, reference) = row?;
        playlists.entry(name).or_default().push(reference);
    }

    Ok(playlists)
}

fn replace_playlists(conn: &mut Connection, user_id: &str, playlists: &Playlists) -> StorageResult<()> {
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM playlist_tracks WHERE user_id = ?1", [user_id])?;
    tx.execute("DELETE FROM playlists WHERE user_id = ?1", [user_id])?;

    {
        let mut insert_playlist =
            tx.prepare("INSERT INTO playlists (user_id, name) VALUES (?1, ?2)")?;
        let mut insert_track = tx.prepare(
            "INSERT INTO playlist_tracks (user_id, name, position, reference) VALUES (?1, ?2, ?3, ?4)",
        )?;

        for (name, references) in playlists {
            insert_playlist.execute(params![user_id, name])?;
            for (position, reference) in references.iter().enumerate() {
                insert_track.execute(params![user_id, name, position as i64, reference])?;
            }
        }
    }

    tx.commit()?;
    Ok(())
}

#[async_trait]
impl PlaylistStore for SqlitePlaylistStore {
    async fn load(&self, user_id: UserId) -> StorageResult<Playlists> {
        let user = user_id.to_string();
        self.with_conn(move |conn| load_playlists(conn, &user)).await
    }

    async fn save(&self, user_id: UserId, playlists: &Playlists) -> StorageResult<()> {
        let user = user_id.to_string();
        let playlists = playlists.clone();
        debug!("Saving {} playlists for user {}", playlists.len(), user);
        self.with_conn(move |conn| replace_playlists(conn, &user, &playlists))
            .await
    }
}
