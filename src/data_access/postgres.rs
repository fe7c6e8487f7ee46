//! # PostgreSQL Store
//!
//! Repository implementations over a `sqlx` connection pool, against the schema
//! in `migrations/0001_premises_core.sql`.
//!
//! Single-row writes run straight against the pool. Multi-row writes go through
//! a unit of work that owns one transaction from `begin` to `save_changes`;
//! dropping it uncommitted rolls everything back. The partial unique indexes on
//! open parking records and open repair orders close the check-then-act window
//! between concurrent callers, and a violation surfaces as
//! [`DataAccessError::Conflict`].

use super::errors::{DataAccessError, DataAccessResult};
use super::models::{
    EquipmentRecord, EventArea, NewReservation, ParkingRecord, ParkingSpace, Reservation,
    RetailArea, StatusApplication, StoreRecord,
};
use super::repositories::{
    EquipmentRepository, EquipmentUnitOfWork, ParkingRepository, ParkingUnitOfWork,
    RetailAreaRepository, StaffRepository, StoreRepository, StoreUnitOfWork, VenueRepository,
};
use crate::config::DatabaseConfig;
use crate::state_machine::{SettlementRecord, VenueEventState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

const SCHEMA: &str = include_str!("../../migrations/0001_premises_core.sql");

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> DataAccessResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create any missing tables and indexes.
    pub async fn apply_schema(&self) -> DataAccessResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn health_check(&self) -> DataAccessResult<bool> {
        let row = sqlx::query("SELECT 1 as health")
            .fetch_one(&self.pool)
            .await?;
        let health: i32 = row.try_get("health")?;
        Ok(health == 1)
    }
}

/// Unique violations become conflicts; everything else stays a database error.
fn map_write_error(err: sqlx::Error) -> DataAccessError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DataAccessError::Conflict(db_err.message().to_string())
        }
        _ => DataAccessError::Database(err),
    }
}

/// One open transaction; `None` once committed.
struct PgWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgWork {
    async fn begin(pool: &PgPool) -> DataAccessResult<Self> {
        let tx = pool.begin().await?;
        Ok(Self { tx: Some(tx) })
    }

    fn conn(&mut self) -> DataAccessResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| DataAccessError::Backend("unit of work was already saved".to_string()))
    }

    async fn commit(&mut self) -> DataAccessResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DataAccessError::Backend("unit of work was already saved".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}

fn expect_one_row(affected: u64, entity: &'static str, id: impl ToString) -> DataAccessResult<()> {
    if affected == 0 {
        Err(DataAccessError::not_found(entity, id))
    } else {
        Ok(())
    }
}

fn parking_record_from_row(row: &PgRow) -> Result<ParkingRecord, sqlx::Error> {
    Ok(ParkingRecord {
        record_id: row.try_get("record_id")?,
        vehicle_id: row.try_get("vehicle_id")?,
        space_id: row.try_get("space_id")?,
        license_plate: row.try_get("license_plate")?,
        entry_time: row.try_get("entry_time")?,
        exit_time: row.try_get("exit_time")?,
    })
}

fn reservation_from_row(row: &PgRow) -> Result<Reservation, sqlx::Error> {
    let settled_at: Option<DateTime<Utc>> = row.try_get("settled_at")?;
    let settlement = match settled_at {
        Some(settled_at) => Some(SettlementRecord {
            venue_fee_cents: row.try_get::<Option<i64>, _>("venue_fee_cents")?.unwrap_or(0),
            additional_service_fee_cents: row
                .try_get::<Option<i64>, _>("additional_service_fee_cents")?
                .unwrap_or(0),
            total_fee_cents: row.try_get::<Option<i64>, _>("total_fee_cents")?.unwrap_or(0),
            settled_at,
        }),
        None => None,
    };
    Ok(Reservation {
        reservation_id: row.try_get("reservation_id")?,
        area_id: row.try_get("area_id")?,
        collaboration_id: row.try_get("collaboration_id")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        expected_headcount: row.try_get("expected_headcount")?,
        status: row.try_get("status")?,
        settlement,
    })
}

fn status_application_from_row(row: &PgRow) -> Result<StatusApplication, sqlx::Error> {
    Ok(StatusApplication {
        application_no: row.try_get("application_no")?,
        store_id: row.try_get("store_id")?,
        requested_status: row.try_get("requested_status")?,
        reason: row.try_get("reason")?,
        requested_by: row.try_get("requested_by")?,
        requested_at: row.try_get("requested_at")?,
        approved: row.try_get("approved")?,
        resolved_by: row.try_get("resolved_by")?,
    })
}

#[async_trait]
impl ParkingRepository for PgStore {
    async fn find_space(&self, space_id: i64) -> DataAccessResult<Option<ParkingSpace>> {
        let row = sqlx::query(
            "SELECT space_id, space_no, occupied FROM parking_spaces WHERE space_id = $1",
        )
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(ParkingSpace {
                space_id: row.try_get("space_id")?,
                space_no: row.try_get("space_no")?,
                occupied: row.try_get("occupied")?,
            }),
            None => None,
        })
    }

    async fn has_open_parking_record(&self, license_plate: &str) -> DataAccessResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM parking_records
                WHERE license_plate = $1 AND exit_time IS NULL
            ) AS open
            "#,
        )
        .bind(license_plate)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("open")?)
    }

    async fn find_open_parking_record(
        &self,
        license_plate: &str,
    ) -> DataAccessResult<Option<ParkingRecord>> {
        let row = sqlx::query(
            r#"
            SELECT record_id, vehicle_id, space_id, license_plate, entry_time, exit_time
            FROM parking_records
            WHERE license_plate = $1 AND exit_time IS NULL
            LIMIT 1
            "#,
        )
        .bind(license_plate)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(parking_record_from_row).transpose()?)
    }

    async fn find_occupying_plate(&self, space_id: i64) -> DataAccessResult<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT pr.license_plate
            FROM parking_records pr
            JOIN parking_spaces ps ON ps.space_id = pr.space_id
            WHERE ps.space_id = $1 AND pr.exit_time IS NULL
            LIMIT 1
            "#,
        )
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|row| row.try_get::<String, _>("license_plate"))
            .transpose()?)
    }

    async fn begin(&self) -> DataAccessResult<Box<dyn ParkingUnitOfWork + '_>> {
        Ok(Box::new(PgParkingWork(PgWork::begin(&self.pool).await?)))
    }
}

struct PgParkingWork(PgWork);

#[async_trait]
impl ParkingUnitOfWork for PgParkingWork {
    async fn insert_vehicle(
        &mut self,
        license_plate: &str,
        registered_at: DateTime<Utc>,
    ) -> DataAccessResult<i64> {
        let row = sqlx::query(
            "INSERT INTO vehicles (license_plate, registered_at) VALUES ($1, $2) RETURNING vehicle_id",
        )
        .bind(license_plate)
        .bind(registered_at)
        .fetch_one(self.0.conn()?)
        .await
        .map_err(map_write_error)?;
        Ok(row.try_get("vehicle_id")?)
    }

    async fn insert_parking_record(
        &mut self,
        vehicle_id: i64,
        space_id: i64,
        license_plate: &str,
        entry_time: DateTime<Utc>,
    ) -> DataAccessResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO parking_records (vehicle_id, space_id, license_plate, entry_time)
            VALUES ($1, $2, $3, $4)
            RETURNING record_id
            "#,
        )
        .bind(vehicle_id)
        .bind(space_id)
        .bind(license_plate)
        .bind(entry_time)
        .fetch_one(self.0.conn()?)
        .await
        .map_err(map_write_error)?;
        Ok(row.try_get("record_id")?)
    }

    async fn close_parking_record(
        &mut self,
        record_id: i64,
        exit_time: DateTime<Utc>,
    ) -> DataAccessResult<()> {
        let result = sqlx::query(
            "UPDATE parking_records SET exit_time = $2 WHERE record_id = $1 AND exit_time IS NULL",
        )
        .bind(record_id)
        .bind(exit_time)
        .execute(self.0.conn()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DataAccessError::Conflict(format!(
                "parking record {record_id} is missing or already closed"
            )));
        }
        Ok(())
    }

    async fn set_space_occupied(&mut self, space_id: i64, occupied: bool) -> DataAccessResult<()> {
        let result = sqlx::query("UPDATE parking_spaces SET occupied = $2 WHERE space_id = $1")
            .bind(space_id)
            .bind(occupied)
            .execute(self.0.conn()?)
            .await?;
        expect_one_row(result.rows_affected(), "parking_space", space_id)
    }

    async fn save_changes(&mut self) -> DataAccessResult<()> {
        self.0.commit().await
    }
}

#[async_trait]
impl VenueRepository for PgStore {
    async fn find_event_area(&self, area_id: i64) -> DataAccessResult<Option<EventArea>> {
        let row = sqlx::query("SELECT area_id, name, capacity FROM event_areas WHERE area_id = $1")
            .bind(area_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(EventArea {
                area_id: row.try_get("area_id")?,
                name: row.try_get("name")?,
                capacity: row.try_get("capacity")?,
            }),
            None => None,
        })
    }

    async fn has_overlapping_reservation(
        &self,
        area_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DataAccessResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM venue_reservations
                WHERE area_id = $1
                  AND status <> $4
                  AND start_time < $3
                  AND end_time > $2
            ) AS overlapping
            "#,
        )
        .bind(area_id)
        .bind(start)
        .bind(end)
        .bind(VenueEventState::Cancelled.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("overlapping")?)
    }

    async fn collaboration_exists(&self, collaboration_id: i64) -> DataAccessResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM collaborations WHERE collaboration_id = $1) AS found",
        )
        .bind(collaboration_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("found")?)
    }

    async fn insert_reservation(&self, reservation: NewReservation) -> DataAccessResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO venue_reservations
                (area_id, collaboration_id, start_time, end_time, expected_headcount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING reservation_id
            "#,
        )
        .bind(reservation.area_id)
        .bind(reservation.collaboration_id)
        .bind(reservation.start_time)
        .bind(reservation.end_time)
        .bind(reservation.expected_headcount)
        .bind(&reservation.status)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(row.try_get("reservation_id")?)
    }

    async fn find_reservation(&self, reservation_id: i64) -> DataAccessResult<Option<Reservation>> {
        let row = sqlx::query(
            r#"
            SELECT reservation_id, area_id, collaboration_id, start_time, end_time,
                   expected_headcount, status, venue_fee_cents,
                   additional_service_fee_cents, total_fee_cents, settled_at
            FROM venue_reservations
            WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(reservation_from_row).transpose()?)
    }

    async fn update_reservation_status(
        &self,
        reservation_id: i64,
        status: &str,
    ) -> DataAccessResult<()> {
        let result =
            sqlx::query("UPDATE venue_reservations SET status = $2 WHERE reservation_id = $1")
                .bind(reservation_id)
                .bind(status)
                .execute(&self.pool)
                .await?;
        expect_one_row(result.rows_affected(), "reservation", reservation_id)
    }

    async fn save_settlement(
        &self,
        reservation_id: i64,
        settlement: &SettlementRecord,
    ) -> DataAccessResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE venue_reservations
            SET venue_fee_cents = $2,
                additional_service_fee_cents = $3,
                total_fee_cents = $4,
                settled_at = $5
            WHERE reservation_id = $1 AND settled_at IS NULL
            "#,
        )
        .bind(reservation_id)
        .bind(settlement.venue_fee_cents)
        .bind(settlement.additional_service_fee_cents)
        .bind(settlement.total_fee_cents)
        .bind(settlement.settled_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DataAccessError::Conflict(format!(
                "reservation {reservation_id} is missing or already settled"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EquipmentRepository for PgStore {
    async fn find_equipment(&self, equipment_id: i64) -> DataAccessResult<Option<EquipmentRecord>> {
        let row = sqlx::query(
            "SELECT equipment_id, name, equipment_type, status FROM equipment WHERE equipment_id = $1",
        )
        .bind(equipment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(EquipmentRecord {
                equipment_id: row.try_get("equipment_id")?,
                name: row.try_get("name")?,
                equipment_type: row.try_get("equipment_type")?,
                status: row.try_get("status")?,
            }),
            None => None,
        })
    }

    async fn has_open_repair_order(&self, equipment_id: i64) -> DataAccessResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM repair_orders WHERE equipment_id = $1 AND closed_at IS NULL
            ) AS open
            "#,
        )
        .bind(equipment_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("open")?)
    }

    async fn begin(&self) -> DataAccessResult<Box<dyn EquipmentUnitOfWork + '_>> {
        Ok(Box::new(PgEquipmentWork(PgWork::begin(&self.pool).await?)))
    }
}

struct PgEquipmentWork(PgWork);

#[async_trait]
impl EquipmentUnitOfWork for PgEquipmentWork {
    async fn update_equipment_status(
        &mut self,
        equipment_id: i64,
        status: &str,
    ) -> DataAccessResult<()> {
        let result = sqlx::query("UPDATE equipment SET status = $2 WHERE equipment_id = $1")
            .bind(equipment_id)
            .bind(status)
            .execute(self.0.conn()?)
            .await?;
        expect_one_row(result.rows_affected(), "equipment", equipment_id)
    }

    async fn insert_repair_order(
        &mut self,
        equipment_id: i64,
        description: &str,
        opened_at: DateTime<Utc>,
    ) -> DataAccessResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO repair_orders (equipment_id, description, opened_at)
            VALUES ($1, $2, $3)
            RETURNING repair_order_id
            "#,
        )
        .bind(equipment_id)
        .bind(description)
        .bind(opened_at)
        .fetch_one(self.0.conn()?)
        .await
        .map_err(map_write_error)?;
        Ok(row.try_get("repair_order_id")?)
    }

    async fn close_repair_order(
        &mut self,
        equipment_id: i64,
        successful: bool,
        closed_at: DateTime<Utc>,
    ) -> DataAccessResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE repair_orders
            SET closed_at = $3, successful = $2
            WHERE equipment_id = $1 AND closed_at IS NULL
            "#,
        )
        .bind(equipment_id)
        .bind(successful)
        .bind(closed_at)
        .execute(self.0.conn()?)
        .await?;
        expect_one_row(result.rows_affected(), "open repair order", equipment_id)
    }

    async fn save_changes(&mut self) -> DataAccessResult<()> {
        self.0.commit().await
    }
}

#[async_trait]
impl StoreRepository for PgStore {
    async fn find_store(&self, store_id: i64) -> DataAccessResult<Option<StoreRecord>> {
        let row = sqlx::query("SELECT store_id, name, status FROM stores WHERE store_id = $1")
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) => Some(StoreRecord {
                store_id: row.try_get("store_id")?,
                name: row.try_get("name")?,
                status: row.try_get("status")?,
            }),
            None => None,
        })
    }

    async fn insert_status_application(
        &self,
        application: &StatusApplication,
    ) -> DataAccessResult<()> {
        sqlx::query(
            r#"
            INSERT INTO store_status_applications
                (application_no, store_id, requested_status, reason, requested_by,
                 requested_at, approved, resolved_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&application.application_no)
        .bind(application.store_id)
        .bind(&application.requested_status)
        .bind(&application.reason)
        .bind(application.requested_by)
        .bind(application.requested_at)
        .bind(application.approved)
        .bind(application.resolved_by)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn find_status_application(
        &self,
        application_no: &str,
    ) -> DataAccessResult<Option<StatusApplication>> {
        let row = sqlx::query(
            r#"
            SELECT application_no, store_id, requested_status, reason, requested_by,
                   requested_at, approved, resolved_by
            FROM store_status_applications
            WHERE application_no = $1
            "#,
        )
        .bind(application_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(status_application_from_row).transpose()?)
    }

    async fn begin(&self) -> DataAccessResult<Box<dyn StoreUnitOfWork + '_>> {
        Ok(Box::new(PgStoreWork(PgWork::begin(&self.pool).await?)))
    }
}

struct PgStoreWork(PgWork);

#[async_trait]
impl StoreUnitOfWork for PgStoreWork {
    async fn update_store_status(&mut self, store_id: i64, status: &str) -> DataAccessResult<()> {
        let result = sqlx::query("UPDATE stores SET status = $2 WHERE store_id = $1")
            .bind(store_id)
            .bind(status)
            .execute(self.0.conn()?)
            .await?;
        expect_one_row(result.rows_affected(), "store", store_id)
    }

    async fn resolve_status_application(
        &mut self,
        application_no: &str,
        approved: bool,
        resolved_by: i64,
    ) -> DataAccessResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE store_status_applications
            SET approved = $2, resolved_by = $3
            WHERE application_no = $1 AND approved IS NULL
            "#,
        )
        .bind(application_no)
        .bind(approved)
        .bind(resolved_by)
        .execute(self.0.conn()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DataAccessError::Conflict(format!(
                "application {application_no} is missing or already resolved"
            )));
        }
        Ok(())
    }

    async fn save_changes(&mut self) -> DataAccessResult<()> {
        self.0.commit().await
    }
}

#[async_trait]
impl RetailAreaRepository for PgStore {
    async fn find_retail_area(&self, area_id: i64) -> DataAccessResult<Option<RetailArea>> {
        let row = sqlx::query(
            "SELECT area_id, base_rent_cents, status, tenant FROM retail_areas WHERE area_id = $1",
        )
        .bind(area_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(RetailArea {
                area_id: row.try_get("area_id")?,
                base_rent_cents: row.try_get("base_rent_cents")?,
                status: row.try_get("status")?,
                tenant: row.try_get("tenant")?,
            }),
            None => None,
        })
    }

    async fn update_retail_area(&self, area: &RetailArea) -> DataAccessResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE retail_areas
            SET base_rent_cents = $2, status = $3, tenant = $4
            WHERE area_id = $1
            "#,
        )
        .bind(area.area_id)
        .bind(area.base_rent_cents)
        .bind(&area.status)
        .bind(&area.tenant)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), "retail_area", area.area_id)
    }
}

#[async_trait]
impl StaffRepository for PgStore {
    async fn find_staff_level(&self, staff_id: i64) -> DataAccessResult<Option<i32>> {
        let row = sqlx::query("SELECT authority_level FROM staff WHERE staff_id = $1")
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .map(|row| row.try_get::<i32, _>("authority_level"))
            .transpose()?)
    }
}
