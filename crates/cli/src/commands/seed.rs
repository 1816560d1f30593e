//! Seed the database with demo stores, services, products, promotions and
//! one demo customer holding a voucher.
//!
//! Every insert is `ON CONFLICT DO NOTHING`, so seeding twice is harmless.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use super::{CommandError, connect};

struct DemoStore {
    name: &'static str,
    address: &'static str,
    city: &'static str,
    state: &'static str,
    zip_code: &'static str,
    latitude: f64,
    longitude: f64,
    rating: f64,
    has_parking: bool,
    has_wifi: bool,
    is_featured: bool,
}

const STORES: [DemoStore; 3] = [
    DemoStore {
        name: "Downtown Flagship",
        address: "100 Market Street",
        city: "San Francisco",
        state: "CA",
        zip_code: "94105",
        latitude: 37.7936,
        longitude: -122.3965,
        rating: 4.8,
        has_parking: false,
        has_wifi: true,
        is_featured: true,
    },
    DemoStore {
        name: "Mission Bay",
        address: "455 Mission Bay Blvd",
        city: "San Francisco",
        state: "CA",
        zip_code: "94158",
        latitude: 37.7706,
        longitude: -122.3910,
        rating: 4.5,
        has_parking: true,
        has_wifi: true,
        is_featured: false,
    },
    DemoStore {
        name: "Oakland Uptown",
        address: "2100 Broadway",
        city: "Oakland",
        state: "CA",
        zip_code: "94612",
        latitude: 37.8121,
        longitude: -122.2680,
        rating: 4.2,
        has_parking: true,
        has_wifi: false,
        is_featured: false,
    },
];

/// Opening hours shared by every demo store.
const STORE_HOURS: &str = r#"{"mon-fri": "08:00-18:00", "sat": "09:00-17:00"}"#;

/// (name, category, minutes, price)
const SERVICES: [(&str, &str, i32, &str); 3] = [
    ("Consultation", "advice", 30, "0.00"),
    ("Device Setup", "setup", 45, "49.00"),
    ("Repair Drop-off", "repair", 15, "0.00"),
];

/// (sku, name, category, brand, price, stock)
const PRODUCTS: [(&str, &str, &str, &str, &str, i32); 5] = [
    ("DEMO-001", "Cold Brew Concentrate", "Beverages", "Harbor Roasters", "14.99", 42),
    ("DEMO-002", "Ceramic Pour-Over Set", "Equipment", "Harbor Roasters", "39.00", 8),
    ("DEMO-003", "Single Origin Beans 1kg", "Beverages", "Ridge Line", "28.50", 0),
    ("DEMO-004", "Insulated Travel Mug", "Accessories", "Trailhead", "24.00", 120),
    ("DEMO-005", "Milk Frother", "Equipment", "Trailhead", "59.99", 5),
];

/// (name, display name, enrollment required, point factor)
const PROMOTIONS: [(&str, &str, bool, &str); 2] = [
    ("double-points-weekend", "Double Points Weekend", true, "2.00"),
    ("welcome-bonus", "Welcome Bonus", false, "1.00"),
];

/// Customer without a login account; owns `DEMO_VOUCHER_CODE`.
const DEMO_CUSTOMER_EMAIL: &str = "demo-member@example.com";

/// A $10 value voucher, valid for a year from seeding.
const DEMO_VOUCHER_CODE: &str = "DEMO-VALUE-10";

/// Rows inserted per table.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub stores: u64,
    pub services: u64,
    pub products: u64,
    pub promotions: u64,
    pub vouchers: u64,
}

async fn seed_stores(tx: &mut Transaction<'_, Postgres>) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for store in &STORES {
        inserted += sqlx::query(
            r"
            INSERT INTO store_locations
                (name, address, city, state, zip_code, latitude, longitude, rating,
                 has_parking, has_wifi, is_featured, hours)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12::jsonb)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(store.name)
        .bind(store.address)
        .bind(store.city)
        .bind(store.state)
        .bind(store.zip_code)
        .bind(store.latitude)
        .bind(store.longitude)
        .bind(store.rating)
        .bind(store.has_parking)
        .bind(store.has_wifi)
        .bind(store.is_featured)
        .bind(STORE_HOURS)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

async fn seed_services(tx: &mut Transaction<'_, Postgres>) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for (name, category, minutes, price) in SERVICES {
        inserted += sqlx::query(
            r"
            INSERT INTO store_services (store_id, name, category, duration_minutes, price)
            SELECT id, $1, $2, $3, $4::NUMERIC FROM store_locations
            ON CONFLICT (store_id, name) DO NOTHING
            ",
        )
        .bind(name)
        .bind(category)
        .bind(minutes)
        .bind(price)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

async fn seed_products(tx: &mut Transaction<'_, Postgres>) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for (sku, name, category, brand, price, stock) in PRODUCTS {
        inserted += sqlx::query(
            r"
            INSERT INTO products (sku, name, category, brand, price, stock_quantity, description)
            VALUES ($1, $2, $3, $4, $5::NUMERIC, $6, $2 || ' from ' || $4)
            ON CONFLICT (sku) DO NOTHING
            ",
        )
        .bind(sku)
        .bind(name)
        .bind(category)
        .bind(brand)
        .bind(price)
        .bind(stock)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

async fn seed_promotions(tx: &mut Transaction<'_, Postgres>) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;
    for (name, display_name, enrollment_required, factor) in PROMOTIONS {
        inserted += sqlx::query(
            r"
            INSERT INTO promotions
                (name, display_name, is_enrollment_required, point_factor, end_date)
            VALUES ($1, $2, $3, $4::NUMERIC, NOW() + INTERVAL '90 days')
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(name)
        .bind(display_name)
        .bind(enrollment_required)
        .bind(factor)
        .execute(&mut **tx)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

async fn seed_vouchers(tx: &mut Transaction<'_, Postgres>) -> Result<u64, sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO customers (name, email, points, tier)
        VALUES ('Demo Member', $1, 320, 'Silver')
        ON CONFLICT (email) DO NOTHING
        ",
    )
    .bind(DEMO_CUSTOMER_EMAIL)
    .execute(&mut **tx)
    .await?;

    let inserted = sqlx::query(
        r"
        INSERT INTO customer_vouchers
            (customer_id, voucher_code, name, voucher_type, face_value,
             remaining_value, expiration_date)
        SELECT id, $2, 'Ten Dollars Off', 'Value', 10.00, 10.00, NOW() + INTERVAL '365 days'
        FROM customers WHERE email = $1
        ON CONFLICT (voucher_code) DO NOTHING
        ",
    )
    .bind(DEMO_CUSTOMER_EMAIL)
    .bind(DEMO_VOUCHER_CODE)
    .execute(&mut **tx)
    .await?
    .rows_affected();
    Ok(inserted)
}

/// Insert all demo data in one transaction.
///
/// # Errors
///
/// Returns `sqlx::Error` if any insert fails; nothing is committed then.
pub async fn seed_all(pool: &PgPool) -> Result<SeedSummary, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let summary = SeedSummary {
        stores: seed_stores(&mut tx).await?,
        services: seed_services(&mut tx).await?,
        products: seed_products(&mut tx).await?,
        promotions: seed_promotions(&mut tx).await?,
        vouchers: seed_vouchers(&mut tx).await?,
    };
    tx.commit().await?;
    Ok(summary)
}

/// Seed demo data.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let summary = seed_all(&pool).await?;

    info!("Seeding complete!");
    info!("  Stores inserted: {}", summary.stores);
    info!("  Services inserted: {}", summary.services);
    info!("  Products inserted: {}", summary.products);
    info!("  Promotions inserted: {}", summary.promotions);
    info!("  Vouchers inserted: {}", summary.vouchers);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_skus_are_unique() {
        let mut skus: Vec<_> = PRODUCTS.iter().map(|p| p.0).collect();
        skus.sort_unstable();
        skus.dedup();
        assert_eq!(skus.len(), PRODUCTS.len());
    }

    #[test]
    fn test_store_hours_are_a_json_object() {
        let hours: serde_json::Value = serde_json::from_str(STORE_HOURS).unwrap();
        assert_eq!(hours["mon-fri"], "08:00-18:00");
        assert_eq!(hours["sat"], "09:00-17:00");
    }

    #[test]
    fn test_demo_stores_have_valid_coordinates() {
        for store in &STORES {
            assert!(loyalty_core::Coordinates::new(store.latitude, store.longitude).is_ok());
        }
    }
}
