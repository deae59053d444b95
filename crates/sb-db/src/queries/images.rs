//! Image record CRUD operations.

use chrono::Utc;
use rusqlite::Connection;
use sb_core::{Error, Result};

use crate::models::{ImageFields, ImageRecord};

const COLS: &str = "id, name, path, image, created_at, updated_at";

/// Create a new image record.
pub fn create_image(conn: &Connection, fields: &ImageFields) -> Result<ImageRecord> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO images (name, path, image, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![fields.name, fields.path, fields.image, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ImageRecord {
        id: conn.last_insert_rowid(),
        name: fields.name.clone(),
        path: fields.path.clone(),
        image: fields.image.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get an image record by ID.
pub fn get_image(conn: &Connection, id: i64) -> Result<Option<ImageRecord>> {
    let q = format!("SELECT {COLS} FROM images WHERE id = ?1");
    let result = conn.query_row(&q, [id], ImageRecord::from_row);
    match result {
        Ok(img) => Ok(Some(img)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all image records in insertion order.
pub fn list_images(conn: &Connection) -> Result<Vec<ImageRecord>> {
    let q = format!("SELECT {COLS} FROM images ORDER BY id");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], ImageRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Apply `fields` to an image record and bump `updated_at`.
///
/// Columns whose field is `None` keep their stored value.
pub fn update_image(conn: &Connection, id: i64, fields: &ImageFields) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let n = conn
        .execute(
            "UPDATE images
             SET name = COALESCE(?1, name),
                 path = COALESCE(?2, path),
                 image = COALESCE(?3, image),
                 updated_at = ?4
             WHERE id = ?5",
            rusqlite::params![fields.name, fields.path, fields.image, now, id],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Count records other than `excluding_id` whose `path` is `path`.
pub fn count_images_by_path(conn: &Connection, path: &str, excluding_id: i64) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM images WHERE path = ?1 AND id != ?2",
        rusqlite::params![path, excluding_id],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as u64)
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete an image record by ID.
pub fn delete_image(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM images WHERE id = ?1", [id])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    fn setup() -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        let pool = init_memory_pool().unwrap();
        pool.get().unwrap()
    }

    #[test]
    fn create_get_list_delete() {
        let conn = setup();
        let fields = ImageFields::for_stored_file("a.png", "images/a.png");
        let img = create_image(&conn, &fields).unwrap();
        assert_eq!(img.id, 1);
        assert_eq!(img.created_at, img.updated_at);

        let fetched = get_image(&conn, img.id).unwrap().unwrap();
        assert_eq!(fetched, img);

        let list = list_images(&conn).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].path.as_deref(), Some("images/a.png"));

        assert!(delete_image(&conn, img.id).unwrap());
        assert!(get_image(&conn, img.id).unwrap().is_none());
        assert!(!delete_image(&conn, img.id).unwrap());
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = setup();
        assert!(get_image(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn update_keeps_unset_columns() {
        let conn = setup();
        let img = create_image(&conn, &ImageFields::for_stored_file("a.png", "images/a.png")).unwrap();

        let patch = ImageFields {
            name: Some("renamed.png".into()),
            ..Default::default()
        };
        assert!(update_image(&conn, img.id, &patch).unwrap());

        let updated = get_image(&conn, img.id).unwrap().unwrap();
        assert_eq!(updated.name.as_deref(), Some("renamed.png"));
        assert_eq!(updated.path.as_deref(), Some("images/a.png"));
        assert_eq!(updated.image.as_deref(), Some("images/a.png"));
        assert_eq!(updated.created_at, img.created_at);
    }

    #[test]
    fn update_missing_returns_false() {
        let conn = setup();
        assert!(!update_image(&conn, 9, &ImageFields::default()).unwrap());
    }

    #[test]
    fn ids_are_not_reused() {
        let conn = setup();
        let first = create_image(&conn, &ImageFields::default()).unwrap();
        delete_image(&conn, first.id).unwrap();
        let second = create_image(&conn, &ImageFields::default()).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn count_by_path_excludes_given_id() {
        let conn = setup();
        let shared = ImageFields::for_stored_file("s.png", "images/s.png");
        let a = create_image(&conn, &shared).unwrap();
        let b = create_image(&conn, &shared).unwrap();
        create_image(&conn, &ImageFields::for_stored_file("o.png", "images/o.png")).unwrap();

        assert_eq!(count_images_by_path(&conn, "images/s.png", a.id).unwrap(), 1);
        assert_eq!(count_images_by_path(&conn, "images/s.png", 0).unwrap(), 2);

        delete_image(&conn, b.id).unwrap();
        assert_eq!(count_images_by_path(&conn, "images/s.png", a.id).unwrap(), 0);
        assert_eq!(count_images_by_path(&conn, "images/none.png", a.id).unwrap(), 0);
    }

    #[test]
    fn list_is_ordered_by_id() {
        let conn = setup();
        for i in 0..3 {
            let name = format!("{i}.png");
            create_image(&conn, &ImageFields::for_stored_file(name.clone(), format!("images/{name}")))
                .unwrap();
        }
        let ids: Vec<i64> = list_images(&conn).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
