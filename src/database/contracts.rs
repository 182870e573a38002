use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use sqlx::FromRow;
use uuid::Uuid;

use super::{DatabaseError, DatabaseManager, PgStore};
use crate::filter::{ContractFilter, SqlParam};
use crate::models::{Contract, ContractStatus};

/// Listing storage
#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// Matching listings, newest first.
    async fn list(&self, filter: &ContractFilter) -> Result<Vec<Contract>, DatabaseError>;

    async fn insert(&self, contract: Contract) -> Result<Contract, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>, DatabaseError>;

    /// Replace a stored listing; `NotFound` if it was deleted meanwhile.
    async fn update(&self, contract: Contract) -> Result<Contract, DatabaseError>;

    /// `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Backing store reachability, used by /health.
    async fn ping(&self) -> Result<(), DatabaseError>;
}

#[derive(Debug, FromRow)]
struct ContractRow {
    id: Uuid,
    crop_name: String,
    crop_variety: Option<String>,
    crop_category: String,
    quantity: f64,
    quantity_unit: String,
    expected_yield_date: NaiveDate,
    sowing_date: Option<NaiveDate>,
    address: String,
    state: String,
    district: String,
    village: String,
    pin_code: String,
    farm_area: f64,
    area_unit: String,
    latitude: Option<String>,
    longitude: Option<String>,
    expected_price: f64,
    min_price: f64,
    requires_advance: bool,
    advance_amount: Option<f64>,
    payment_mode: String,
    preferred_buyer_type: String,
    contract_duration: String,
    delivery_responsibility: String,
    delivery_location: String,
    penalty_clauses: Option<String>,
    images: Vec<String>,
    id_proof_document: String,
    land_proof_document: Option<String>,
    status: String,
    created_by: Uuid,
    allow_visibility: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = DatabaseError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        let status: ContractStatus = row
            .status
            .parse()
            .map_err(|_| DatabaseError::Corrupt(format!("contracts.status '{}' for {}", row.status, row.id)))?;

        Ok(Contract {
            id: row.id,
            crop_name: row.crop_name,
            crop_variety: row.crop_variety,
            crop_category: row.crop_category,
            quantity: row.quantity,
            quantity_unit: row.quantity_unit,
            expected_yield_date: row.expected_yield_date,
            sowing_date: row.sowing_date,
            address: row.address,
            state: row.state,
            district: row.district,
            village: row.village,
            pin_code: row.pin_code,
            farm_area: row.farm_area,
            area_unit: row.area_unit,
            latitude: row.latitude,
            longitude: row.longitude,
            expected_price: row.expected_price,
            min_price: row.min_price,
            requires_advance: row.requires_advance,
            advance_amount: row.advance_amount,
            payment_mode: row.payment_mode,
            preferred_buyer_type: row.preferred_buyer_type,
            contract_duration: row.contract_duration,
            delivery_responsibility: row.delivery_responsibility,
            delivery_location: row.delivery_location,
            penalty_clauses: row.penalty_clauses,
            images: row.images,
            id_proof_document: row.id_proof_document,
            land_proof_document: row.land_proof_document,
            status,
            created_by: row.created_by,
            allow_visibility: row.allow_visibility,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column order shared by INSERT, UPDATE and SELECT.
const COLUMNS: [&str; 35] = [
    "id",
    "crop_name",
    "crop_variety",
    "crop_category",
    "quantity",
    "quantity_unit",
    "expected_yield_date",
    "sowing_date",
    "address",
    "state",
    "district",
    "village",
    "pin_code",
    "farm_area",
    "area_unit",
    "latitude",
    "longitude",
    "expected_price",
    "min_price",
    "requires_advance",
    "advance_amount",
    "payment_mode",
    "preferred_buyer_type",
    "contract_duration",
    "delivery_responsibility",
    "delivery_location",
    "penalty_clauses",
    "images",
    "id_proof_document",
    "land_proof_document",
    "status",
    "created_by",
    "allow_visibility",
    "created_at",
    "updated_at",
];

type ContractQuery<'q> = QueryAs<'q, Postgres, ContractRow, PgArguments>;

/// Binds every column value in `COLUMNS` order.
fn bind_contract<'q>(q: ContractQuery<'q>, c: &'q Contract) -> ContractQuery<'q> {
    q.bind(c.id)
        .bind(&c.crop_name)
        .bind(&c.crop_variety)
        .bind(&c.crop_category)
        .bind(c.quantity)
        .bind(&c.quantity_unit)
        .bind(c.expected_yield_date)
        .bind(c.sowing_date)
        .bind(&c.address)
        .bind(&c.state)
        .bind(&c.district)
        .bind(&c.village)
        .bind(&c.pin_code)
        .bind(c.farm_area)
        .bind(&c.area_unit)
        .bind(&c.latitude)
        .bind(&c.longitude)
        .bind(c.expected_price)
        .bind(c.min_price)
        .bind(c.requires_advance)
        .bind(c.advance_amount)
        .bind(&c.payment_mode)
        .bind(&c.preferred_buyer_type)
        .bind(&c.contract_duration)
        .bind(&c.delivery_responsibility)
        .bind(&c.delivery_location)
        .bind(&c.penalty_clauses)
        .bind(&c.images)
        .bind(&c.id_proof_document)
        .bind(&c.land_proof_document)
        .bind(c.status.as_str())
        .bind(c.created_by)
        .bind(c.allow_visibility)
        .bind(c.created_at)
        .bind(c.updated_at)
}

fn bind_param<'q>(q: ContractQuery<'q>, param: &'q SqlParam) -> ContractQuery<'q> {
    match param {
        SqlParam::Text(s) => q.bind(s),
        SqlParam::TextList(values) => q.bind(values),
        SqlParam::Number(n) => q.bind(*n),
        SqlParam::Uuid(id) => q.bind(*id),
    }
}

fn select_sql(where_clause: &str) -> String {
    format!(
        "SELECT {} FROM contracts WHERE {} ORDER BY created_at DESC, id",
        COLUMNS.join(", "),
        where_clause
    )
}

fn insert_sql() -> String {
    let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO contracts ({}) VALUES ({}) RETURNING {}",
        COLUMNS.join(", "),
        placeholders.join(", "),
        COLUMNS.join(", ")
    )
}

/// `$1` is the id; every other column is overwritten except identity,
/// owner and creation time.
fn update_sql() -> String {
    let assignments: Vec<String> = COLUMNS
        .iter()
        .enumerate()
        .filter(|(_, column)| !matches!(**column, "id" | "created_by" | "created_at"))
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect();
    format!(
        "UPDATE contracts SET {} WHERE id = $1 RETURNING {}",
        assignments.join(", "),
        COLUMNS.join(", ")
    )
}

#[async_trait]
impl ContractRepository for PgStore {
    async fn list(&self, filter: &ContractFilter) -> Result<Vec<Contract>, DatabaseError> {
        let where_sql = filter.to_sql();
        let sql = select_sql(&where_sql.clause);
        tracing::debug!("listing contracts: {}", sql);

        let mut query = sqlx::query_as::<_, ContractRow>(&sql);
        for param in &where_sql.params {
            query = bind_param(query, param);
        }
        let rows = query.fetch_all(self.pool()).await?;
        rows.into_iter().map(Contract::try_from).collect()
    }

    async fn insert(&self, contract: Contract) -> Result<Contract, DatabaseError> {
        let sql = insert_sql();
        let row = bind_contract(sqlx::query_as::<_, ContractRow>(&sql), &contract)
            .fetch_one(self.pool())
            .await
            .map_err(|e| DatabaseError::on_unique_violation(e, "Contract already exists"))?;
        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>, DatabaseError> {
        let sql = select_sql("id = $1");
        let row = sqlx::query_as::<_, ContractRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.map(Contract::try_from).transpose()
    }

    async fn update(&self, contract: Contract) -> Result<Contract, DatabaseError> {
        let sql = update_sql();
        let row = bind_contract(sqlx::query_as::<_, ContractRow>(&sql), &contract)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Contract not found".to_string()))?;
        row.try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(self.pool()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_keeps_identity_owner_and_creation_time() {
        let sql = update_sql();
        assert!(sql.starts_with("UPDATE contracts SET crop_name = $2, "));
        assert!(sql.contains("updated_at = $35"));
        assert!(!sql.contains("created_by = $"));
        assert!(!sql.contains("created_at = $"));
        assert!(sql.contains("WHERE id = $1"));
    }

    #[test]
    fn insert_has_one_placeholder_per_column() {
        let sql = insert_sql();
        assert!(sql.contains("$35)"));
        assert!(!sql.contains("$36"));
    }

    #[test]
    fn select_orders_newest_first() {
        assert!(select_sql("1=1").ends_with("WHERE 1=1 ORDER BY created_at DESC, id"));
    }
}
