//! SQLite cache of the last successful scrape
//!
//! The scrape core is stateless; this table is the one shared resource,
//! replaced wholesale after every successful run so `/cars/cached` can
//! answer without touching the browser.

use crate::models::Listing;
use rusqlite::{params, Connection};

pub fn init_db(path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    Ok(conn)
}

fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price TEXT,
            image_url TEXT,
            detail_url TEXT,
            scraped_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;
    Ok(())
}

/// Replace the cached snapshot with `listings`, preserving their order.
pub fn replace_listings(conn: &mut Connection, listings: &[Listing]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM listings", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO listings (name, price, image_url, detail_url) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for listing in listings {
            stmt.execute(params![
                listing.name,
                listing.price,
                listing.image_url,
                listing.detail_url
            ])?;
        }
    }
    tx.commit()
}

/// Load the cached snapshot in the order it was scraped.
pub fn load_listings(conn: &Connection) -> rusqlite::Result<Vec<Listing>> {
    let mut stmt =
        conn.prepare("SELECT name, price, image_url, detail_url FROM listings ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Listing {
            name: row.get(0)?,
            price: row.get(1)?,
            image_url: row.get(2)?,
            detail_url: row.get(3)?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Listing> {
        vec![
            Listing {
                name: "Fiat Panda".to_string(),
                price: Some("€29/day".to_string()),
                image_url: Some("https://cdn.example.com/panda.jpg".to_string()),
                detail_url: Some("https://example.com/cars/panda".to_string()),
            },
            Listing {
                name: "VW Golf".to_string(),
                price: None,
                image_url: None,
                detail_url: None,
            },
        ]
    }

    #[test]
    fn test_replace_then_load_round_trip() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        replace_listings(&mut conn, &sample()).unwrap();
        let loaded = load_listings(&conn).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        replace_listings(&mut conn, &sample()).unwrap();
        let smaller = vec![Listing {
            name: "Toyota Aygo".to_string(),
            price: None,
            image_url: None,
            detail_url: None,
        }];
        replace_listings(&mut conn, &smaller).unwrap();

        let loaded = load_listings(&conn).unwrap();
        assert_eq!(loaded, smaller);
    }

    #[test]
    fn test_empty_snapshot_clears_cache() {
        let mut conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        replace_listings(&mut conn, &sample()).unwrap();
        replace_listings(&mut conn, &[]).unwrap();
        assert!(load_listings(&conn).unwrap().is_empty());
    }
}
