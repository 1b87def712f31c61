use crate::types::Vehicle;
use log::info;
use rand::seq::SliceRandom;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::time::{SystemTime, UNIX_EPOCH};

const MAKES: &[(&str, &[&str])] = &[
    ("Chevrolet", &["Onix", "Tracker", "S10"]),
    ("Fiat", &["Uno", "Strada", "Toro"]),
    ("Ford", &["Ka", "Ranger", "Fiesta"]),
    ("Honda", &["Civic", "Fit", "HR-V"]),
    ("Hyundai", &["HB20", "Creta"]),
    ("Renault", &["Kwid", "Sandero", "Duster"]),
    ("Toyota", &["Corolla", "Hilux", "Etios"]),
    ("Volkswagen", &["Gol", "Polo", "T-Cross"]),
];

const COLORS: &[&str] = &[
    "black", "white", "silver", "gray", "red", "blue", "green", "yellow", "maroon",
];

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS customer (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS vehicle_type (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS vehicle (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    license_plate TEXT NOT NULL UNIQUE,
    vehicle_type_id INTEGER REFERENCES vehicle_type(id),
    owner_id INTEGER REFERENCES customer(id),
    brand TEXT,
    model TEXT,
    color TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
";

#[derive(Debug, Fail)]
pub enum StoreError {
    #[fail(display = "license plate is required")]
    MissingPlate,
    #[fail(display = "the specified customer or vehicle type was not found")]
    NotFound,
    #[fail(display = "database error: {}", _0)]
    Database(#[cause] rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> StoreError {
        StoreError::Database(e)
    }
}

pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    info!("Opened vehicle database at {}", path);
    Ok(conn)
}

/// Finds the vehicle for `plate`, creating it if needed. Supplied owner and
/// type ids must exist; when they differ from an existing vehicle's they
/// replace the stored values.
pub fn get_or_create_vehicle(
    conn: &Connection,
    plate: &str,
    owner: Option<i64>,
    vehicle_type: Option<i64>,
) -> std::result::Result<Vehicle, StoreError> {
    if plate.is_empty() {
        return Err(StoreError::MissingPlate);
    }
    if let Some(id) = owner {
        if !row_exists(conn, "customer", id)? {
            return Err(StoreError::NotFound);
        }
    }
    if let Some(id) = vehicle_type {
        if !row_exists(conn, "vehicle_type", id)? {
            return Err(StoreError::NotFound);
        }
    }

    let now = now();
    match find_vehicle(conn, plate)? {
        None => {
            let (brand, model, color) = random_details();
            conn.execute(
                "INSERT INTO vehicle (license_plate, vehicle_type_id, owner_id, brand, model, color, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![plate, vehicle_type, owner, brand, model, color, now],
            )?;
            info!("Created vehicle for plate {}", plate);
        }
        Some(existing) => {
            let owner_changed = owner.map_or(false, |id| existing.owner != Some(id));
            let type_changed = vehicle_type.map_or(false, |id| existing.vehicle_type != Some(id));
            if owner_changed || type_changed {
                conn.execute(
                    "UPDATE vehicle SET owner_id = ?1, vehicle_type_id = ?2, updated_at = ?3 WHERE id = ?4",
                    params![
                        owner.or(existing.owner),
                        vehicle_type.or(existing.vehicle_type),
                        now,
                        existing.id
                    ],
                )?;
                info!("Updated vehicle {} for plate {}", existing.id, plate);
            }
        }
    }

    find_vehicle(conn, plate)?
        .ok_or_else(|| StoreError::Database(rusqlite::Error::QueryReturnedNoRows))
}

pub fn find_vehicle(conn: &Connection, plate: &str) -> Result<Option<Vehicle>> {
    conn.query_row(
        "SELECT id, license_plate, vehicle_type_id, owner_id, brand, model, color, created_at, updated_at
         FROM vehicle WHERE license_plate = ?1",
        &[&plate],
        |row| {
            Ok(Vehicle {
                id: row.get(0)?,
                license_plate: row.get(1)?,
                vehicle_type: row.get(2)?,
                owner: row.get(3)?,
                brand: row.get(4)?,
                model: row.get(5)?,
                color: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
            })
        },
    )
    .optional()
}

// `table` is always one of our own table names.
fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {} WHERE id = ?1", table),
            &[&id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Placeholder make, model and colour for a vehicle first seen by plate.
fn random_details() -> (&'static str, &'static str, &'static str) {
    let mut rng = rand::thread_rng();
    let (brand, models) = MAKES.choose(&mut rng).copied().unwrap_or(MAKES[0]);
    let model = models.choose(&mut rng).copied().unwrap_or("Uno");
    let color = COLORS.choose(&mut rng).copied().unwrap_or("white");
    (brand, model, color)
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

#[cfg(test)]
pub fn add_customer(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO customer (name) VALUES (?1)", &[&name])?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
pub fn add_vehicle_type(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO vehicle_type (name) VALUES (?1)", &[&name])?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_vehicle() {
        let conn = open_in_memory().unwrap();
        let vehicle = get_or_create_vehicle(&conn, "NEW1234", None, None).unwrap();
        assert_eq!(vehicle.license_plate, "NEW1234");
        assert_eq!(vehicle.owner, None);
        assert_eq!(find_vehicle(&conn, "NEW1234").unwrap(), Some(vehicle));
    }

    #[test]
    fn created_vehicle_gets_make_model_and_color() {
        let conn = open_in_memory().unwrap();
        let vehicle = get_or_create_vehicle(&conn, "NEWFAKER1", None, None).unwrap();
        let brand = vehicle.brand.clone().unwrap();
        let model = vehicle.model.clone().unwrap();
        let color = vehicle.color.clone().unwrap();

        let (_, models) = MAKES.iter().find(|(make, _)| *make == brand).unwrap();
        assert!(models.contains(&model.as_str()));
        assert!(COLORS.contains(&color.as_str()));
    }

    #[test]
    fn existing_vehicle_keeps_its_make() {
        let conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO vehicle (license_plate, brand, created_at, updated_at) VALUES (?1, ?2, 1, 1)",
            &[&"EXIST123", &"Original Make"],
        )
        .unwrap();
        let owner = add_customer(&conn, "Maria").unwrap();

        let vehicle = get_or_create_vehicle(&conn, "EXIST123", Some(owner), None).unwrap();
        assert_eq!(vehicle.brand.as_deref(), Some("Original Make"));
        assert_eq!(vehicle.model, None);
        assert_eq!(vehicle.owner, Some(owner));
    }

    #[test]
    fn creates_with_owner_and_type() {
        let conn = open_in_memory().unwrap();
        let owner = add_customer(&conn, "Maria").unwrap();
        let truck = add_vehicle_type(&conn, "Truck").unwrap();
        let vehicle = get_or_create_vehicle(&conn, "TRK0001", Some(owner), Some(truck)).unwrap();
        assert_eq!(vehicle.owner, Some(owner));
        assert_eq!(vehicle.vehicle_type, Some(truck));
    }

    #[test]
    fn returns_existing_vehicle_untouched() {
        let conn = open_in_memory().unwrap();
        let owner = add_customer(&conn, "Maria").unwrap();
        let original = get_or_create_vehicle(&conn, "EXIST12", Some(owner), None).unwrap();
        let again = get_or_create_vehicle(&conn, "EXIST12", None, None).unwrap();
        assert_eq!(again, original);
    }

    #[test]
    fn updates_owner_of_existing_vehicle() {
        let conn = open_in_memory().unwrap();
        let first = add_customer(&conn, "Maria").unwrap();
        let second = add_customer(&conn, "Joao").unwrap();
        let truck = add_vehicle_type(&conn, "Truck").unwrap();
        let original = get_or_create_vehicle(&conn, "UPD1234", Some(first), Some(truck)).unwrap();

        let updated = get_or_create_vehicle(&conn, "UPD1234", Some(second), None).unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.owner, Some(second));
        assert_eq!(updated.vehicle_type, Some(truck));
    }

    #[test]
    fn requires_plate() {
        let conn = open_in_memory().unwrap();
        match get_or_create_vehicle(&conn, "", None, None) {
            Err(StoreError::MissingPlate) => {}
            other => panic!("expected MissingPlate, got {:?}", other),
        }
    }

    #[test]
    fn unknown_owner_or_type_is_not_found() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(
            get_or_create_vehicle(&conn, "BAD0001", Some(999), None),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            get_or_create_vehicle(&conn, "BAD0001", None, Some(999)),
            Err(StoreError::NotFound)
        ));
        assert_eq!(find_vehicle(&conn, "BAD0001").unwrap(), None);
    }
}
